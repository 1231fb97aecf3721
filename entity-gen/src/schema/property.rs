use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Closed set of property types accepted in an entity document.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    JsonSchema,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[schemars(title = "Property Type")]
pub enum PropertyType {
    /// Short string, at most 255 characters
    String,
    /// Unbounded text
    Text,
    /// 32-bit signed integer
    Integer,
    /// Double precision floating point
    Float,
    Boolean,
    /// Timestamp with time zone
    Datetime,
    Uuid,
}

impl PropertyType {
    /// PostgreSQL column type.
    pub fn sql_type(self) -> &'static str {
        match self {
            PropertyType::String => "VARCHAR(255)",
            PropertyType::Text => "TEXT",
            PropertyType::Integer => "INTEGER",
            PropertyType::Float => "DOUBLE PRECISION",
            PropertyType::Boolean => "BOOLEAN",
            PropertyType::Datetime => "TIMESTAMPTZ",
            PropertyType::Uuid => "UUID",
        }
    }

    /// Rust type used by both the model and the request/response schemas.
    pub fn rust_type(self) -> &'static str {
        match self {
            PropertyType::String | PropertyType::Text => "String",
            PropertyType::Integer => "i32",
            PropertyType::Float => "f64",
            PropertyType::Boolean => "bool",
            PropertyType::Datetime => "DateTime<Utc>",
            PropertyType::Uuid => "Uuid",
        }
    }

    /// Maximum length enforced by the schema validator.
    pub fn max_length(self) -> Option<usize> {
        match self {
            PropertyType::String => Some(255),
            _ => None,
        }
    }

    /// Whether lookups take the value by reference.
    pub fn is_borrowed(self) -> bool {
        matches!(self, PropertyType::String | PropertyType::Text)
    }
}

/// ### Property definition
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(title = "Property Definition")]
pub struct PropertyDef {
    /// ### Name
    pub name: String,
    /// ### Type
    #[serde(rename = "type")]
    #[schemars(with = "PropertyType")]
    pub type_def: String,
    #[serde(default, skip_serializing_if = "super::is_false")]
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "super::is_false")]
    pub is_unique: bool,
    #[serde(default, skip_serializing_if = "super::is_false")]
    pub is_indexed: bool,
    /// ### Default value
    /// Must be representable for the declared type: a string for string, text, datetime (RFC 3339)
    /// and uuid, a number for integer and float, a boolean for boolean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDef {
    pub fn new(name: &str, type_def: PropertyType) -> Self {
        PropertyDef {
            name: name.to_string(),
            type_def: type_def.to_string(),
            is_nullable: false,
            is_unique: false,
            is_indexed: false,
            default_value: None,
            description: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn type_names() {
        for ty in PropertyType::iter() {
            assert_eq!(PropertyType::from_str(ty.as_ref()).unwrap(), ty);
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty));
        }
        assert_eq!(PropertyType::Datetime.to_string(), "datetime");
        assert!(PropertyType::from_str("money").is_err());
    }

    #[test]
    fn type_mapping() {
        assert_eq!(PropertyType::Datetime.sql_type(), "TIMESTAMPTZ");
        assert_eq!(PropertyType::Datetime.rust_type(), "DateTime<Utc>");
        assert_eq!(PropertyType::Text.rust_type(), "String");
        assert_eq!(PropertyType::String.max_length(), Some(255));
        assert_eq!(PropertyType::Text.max_length(), None);
    }
}

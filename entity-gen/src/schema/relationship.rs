use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[schemars(title = "Relationship Type")]
pub enum RelationshipType {
    /// The target stores a foreign key to this entity
    OneToMany,
    /// This entity stores a foreign key to the target
    ManyToOne,
    /// Both sides are linked through an association table
    ManyToMany,
    /// The side with `foreign_key_column` stores the key
    OneToOne,
}

impl RelationshipType {
    /// The kind the mirrored relationship on the target must have.
    pub fn complement(self) -> RelationshipType {
        match self {
            RelationshipType::OneToMany => RelationshipType::ManyToOne,
            RelationshipType::ManyToOne => RelationshipType::OneToMany,
            RelationshipType::ManyToMany => RelationshipType::ManyToMany,
            RelationshipType::OneToOne => RelationshipType::OneToOne,
        }
    }
}

/// ### Relationship definition
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(title = "Relationship Definition")]
pub struct RelationshipDef {
    /// ### Name
    /// Attribute name of the relationship on this entity.
    pub name: String,
    /// ### Type
    #[serde(rename = "type")]
    #[schemars(with = "RelationshipType")]
    pub type_def: String,
    /// ### Target entity
    /// Name of another entity of the same document.
    pub target_entity: String,
    /// ### Back populates
    /// Name of the mirrored relationship on the target entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_populates: Option<String>,
    /// ### Foreign key column
    /// many-to-one: defaults to `<target>_id`.
    /// one-to-one: marks the side that stores the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key_column: Option<String>,
    /// ### Association table name
    /// many-to-many only. Defaults to both entity names in alphabetical order joined by `_`,
    /// followed by `_association`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_table_name: Option<String>,
    /// ### Nullable foreign key
    /// Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RelationshipDef {
    pub fn new(
        name: &str,
        type_def: RelationshipType,
        target_entity: &str,
        back_populates: Option<&str>,
    ) -> Self {
        RelationshipDef {
            name: name.to_string(),
            type_def: type_def.to_string(),
            target_entity: target_entity.to_string(),
            back_populates: back_populates.map(str::to_string),
            foreign_key_column: None,
            association_table_name: None,
            is_nullable: None,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn kebab_case_names() {
        assert_eq!(RelationshipType::OneToMany.to_string(), "one-to-many");
        assert_eq!(
            RelationshipType::from_str("many-to-many").unwrap(),
            RelationshipType::ManyToMany
        );
        assert_eq!(
            serde_json::to_string(&RelationshipType::ManyToOne).unwrap(),
            "\"many-to-one\""
        );
        assert!(RelationshipType::from_str("one_to_many").is_err());
    }

    #[test]
    fn complements_are_involutive() {
        for kind in RelationshipType::iter() {
            assert_eq!(kind.complement().complement(), kind);
        }
    }
}

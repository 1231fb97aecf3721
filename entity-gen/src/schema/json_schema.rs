use std::path::Path;

use schemars::r#gen::SchemaSettings;
use serde_json::Value;

use crate::common::fs_write;
use crate::error::Result;
use crate::schema::EntityDef;

const NAME_PATTERN: &str = r"^[A-Za-z][-_0-9A-Za-z]*$";

pub fn write_schema(path: &Path) -> Result<()> {
    let schema = whole_schema();
    fs_write(path, schema)?;
    Ok(())
}

/// JSON Schema (draft-07) of an entity document.
pub fn whole_schema() -> String {
    let settings = SchemaSettings::draft07().with(|s| {
        s.option_nullable = false;
        s.option_add_null_type = true;
    });
    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<Vec<EntityDef>>();
    let mut schema = serde_json::to_value(&schema).unwrap_or(Value::Null);
    for def in ["Entity Definition", "Property Definition", "Relationship Definition"] {
        add_name_pattern(&mut schema, def);
    }
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

fn add_name_pattern(schema: &mut Value, title: &str) {
    let Some(definitions) = schema.get_mut("definitions").and_then(Value::as_object_mut) else {
        return;
    };
    let name = definitions
        .values_mut()
        .find(|def| def.get("title").and_then(Value::as_str) == Some(title))
        .and_then(|def| def.get_mut("properties"))
        .and_then(|props| props.get_mut("name"))
        .and_then(Value::as_object_mut);
    if let Some(name) = name {
        name.insert("pattern".to_string(), Value::from(NAME_PATTERN));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_closed_enumerations() {
        let schema: Value = serde_json::from_str(&whole_schema()).unwrap();
        assert_eq!(schema["type"], "array");
        let text = schema.to_string();
        for value in ["datetime", "uuid", "one-to-many", "many-to-many"] {
            assert!(text.contains(&format!("\"{}\"", value)), "{}", value);
        }
        assert!(text.contains(NAME_PATTERN));
    }
}

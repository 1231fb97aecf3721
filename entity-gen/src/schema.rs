use format_serde_error::SerdeError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{GenerateError, Result};

pub mod json_schema;
pub mod property;
pub use property::*;
pub mod relationship;
pub use relationship::*;

/// ### Entity definition
/// One data type to scaffold into model, schema, router, service and repository sources.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(title = "Entity Definition")]
pub struct EntityDef {
    /// ### Name
    /// Normalized to PascalCase for type names and snake_case for files, tables and modules.
    pub name: String,
    /// ### Description
    /// Copied verbatim into the generated doc comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ### Properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDef>,
    /// ### Relationships
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipDef>,
}

pub fn is_false(val: &bool) -> bool {
    !(*val)
}

/// Parses an entity document: a JSON array of entity objects.
pub fn parse_str(content: &str) -> Result<Vec<EntityDef>> {
    serde_json::from_str(content)
        .map_err(|err| GenerateError::Malformed(SerdeError::new(content.to_string(), err).to_string()))
}

pub fn parse_file(path: &Path) -> Result<Vec<EntityDef>> {
    let content = fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;
    parse_str(&content)
}

/// Starter document written by `entity-gen init`.
pub fn sample_document() -> Vec<EntityDef> {
    vec![
        EntityDef {
            name: "Project".to_string(),
            description: Some("A project groups tasks.".to_string()),
            properties: vec![
                PropertyDef::new("title", PropertyType::String)
                    .unique()
                    .indexed()
                    .describe("Project title"),
                PropertyDef::new("description", PropertyType::Text).nullable(),
                PropertyDef::new("is_active", PropertyType::Boolean)
                    .default_value(serde_json::Value::Bool(true)),
            ],
            relationships: vec![RelationshipDef::new(
                "tasks",
                RelationshipType::OneToMany,
                "Task",
                Some("project"),
            )],
        },
        EntityDef {
            name: "Task".to_string(),
            description: Some("A unit of work inside a project.".to_string()),
            properties: vec![
                PropertyDef::new("summary", PropertyType::String),
                PropertyDef::new("priority", PropertyType::Integer)
                    .default_value(serde_json::Value::from(1)),
                PropertyDef::new("due_at", PropertyType::Datetime).nullable(),
            ],
            relationships: vec![
                RelationshipDef {
                    is_nullable: Some(false),
                    ..RelationshipDef::new(
                        "project",
                        RelationshipType::ManyToOne,
                        "Project",
                        Some("tasks"),
                    )
                },
                RelationshipDef::new("tags", RelationshipType::ManyToMany, "Tag", Some("tasks")),
            ],
        },
        EntityDef {
            name: "Tag".to_string(),
            description: None,
            properties: vec![PropertyDef::new("label", PropertyType::String).unique()],
            relationships: vec![RelationshipDef::new(
                "tasks",
                RelationshipType::ManyToMany,
                "Task",
                Some("tags"),
            )],
        },
    ]
}

//! Scaffolds the CRUD layers of an axum + sqlx application from a JSON list of
//! entity definitions.
//!
//! Every entity yields a model, a schema, a router, a service and a repository
//! source file; the batch yields one SQL script seeding the `<entity>:<action>`
//! privileges. Existing files at the computed paths are overwritten.

use serde::Serialize;
use strum_macros::{Display, EnumIter};

pub mod analyzer;
pub(crate) mod common;
pub mod config;
pub mod ddl;
pub mod error;
pub(crate) mod filters;
pub mod generator;
pub mod schema;

pub use config::GeneratorConfig;
pub use error::{GenerateError, Result};
pub use generator::{check, generate, generate_from_str, GenerationResult, SkippedEntity};

pub const MODELS_PATH: &str = "models";
pub const SCHEMAS_PATH: &str = "schemas";
pub const ROUTERS_PATH: &str = "routers";
pub const SERVICES_PATH: &str = "services";
pub const REPOSITORIES_PATH: &str = "repositories";
pub const PRIVILEGES_FILE: &str = "generated_privileges.sql";
pub const REGISTRY_FILE: &str = "mod.rs";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ArtifactKind {
    Model,
    Schema,
    Router,
    Service,
    Repository,
    PrivilegeSql,
}

impl ArtifactKind {
    /// The per-entity kinds, in the order they are written.
    pub const PER_ENTITY: [ArtifactKind; 5] = [
        ArtifactKind::Model,
        ArtifactKind::Schema,
        ArtifactKind::Router,
        ArtifactKind::Service,
        ArtifactKind::Repository,
    ];

    /// Directory under the output root, `None` for the batch-level script.
    pub fn dir(self) -> Option<&'static str> {
        match self {
            ArtifactKind::Model => Some(MODELS_PATH),
            ArtifactKind::Schema => Some(SCHEMAS_PATH),
            ArtifactKind::Router => Some(ROUTERS_PATH),
            ArtifactKind::Service => Some(SERVICES_PATH),
            ArtifactKind::Repository => Some(REPOSITORIES_PATH),
            ArtifactKind::PrivilegeSql => None,
        }
    }
}

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::ArtifactKind;

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The input document is not a JSON array of entity objects.
    #[error("malformed entity document:\n{0}")]
    Malformed(String),

    #[error("the entity document contains no entities")]
    Empty,

    #[error("entity `{entity}`, field `{field}`: {message}")]
    Invalid {
        entity: String,
        field: String,
        message: String,
    },

    #[error("entity `{entity}`, relationship `{relationship}`: {message}")]
    Inconsistent {
        entity: String,
        relationship: String,
        message: String,
    },

    #[error("entity `{entity}`: cannot render the {kind} artifact: {source}")]
    Render {
        entity: String,
        kind: ArtifactKind,
        #[source]
        source: askama::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    pub fn invalid(entity: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        GenerateError::Invalid {
            entity: entity.to_owned(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn inconsistent(
        entity: &str,
        relationship: &str,
        message: impl Into<String>,
    ) -> Self {
        GenerateError::Inconsistent {
            entity: entity.to_owned(),
            relationship: relationship.to_owned(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }

    /// The entity the error belongs to, when it is tied to one.
    pub fn entity(&self) -> Option<&str> {
        match self {
            GenerateError::Invalid { entity, .. }
            | GenerateError::Inconsistent { entity, .. }
            | GenerateError::Render { entity, .. } => Some(entity),
            _ => None,
        }
    }
}

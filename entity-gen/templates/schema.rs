// @generated by entity-gen. Changes are overwritten on the next run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::@{ e.module }@::@{ e.pascal }@;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

/// Request body of `POST /@{ e.plural }@`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct @{ e.pascal }@Create {
@%- for f in e.fields %@
@{ f.create_prefix() }@    pub @{ f.name }@: @{ f.ty }@,
@%- endfor %@
}

/// Request body of `PUT /@{ e.plural }@/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct @{ e.pascal }@Update {
@%- for f in e.fields %@
@{ f.update_prefix() }@    pub @{ f.name }@: @{ f.update_ty }@,
@%- endfor %@
}

@{ e.entity.description|doc("") }@#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct @{ e.pascal }@Response {
    pub id: Uuid,
@%- for f in e.fields %@
@{ f.doc_prefix() }@    pub @{ f.name }@: @{ f.ty }@,
@%- endfor %@
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<@{ e.pascal }@> for @{ e.pascal }@Response {
    fn from(row: @{ e.pascal }@) -> Self {
        @{ e.pascal }@Response {
            id: row.id,
@%- for f in e.fields %@
            @{ f.name }@: row.@{ f.name }@,
@%- endfor %@
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Query string of the list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct @{ e.pascal }@ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl @{ e.pascal }@ListParams {
    /// `(limit, offset)` clamped to the accepted range.
    pub fn bounds(&self) -> (i64, i64) {
        (
            self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            self.offset.unwrap_or(0).max(0),
        )
    }
}

/// Query string of `DELETE /@{ e.plural }@/:id`. Rows are soft deleted unless `hard` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct @{ e.pascal }@DeleteParams {
    #[serde(default)]
    pub hard: bool,
}
@%- for func in e.default_fns %@

@{ func }@
@%- endfor %@

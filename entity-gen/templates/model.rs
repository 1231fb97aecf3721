// @generated by entity-gen. Changes are overwritten on the next run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const TABLE_NAME: &str = @{ e.snake()|str_lit }@;

pub const CREATE_TABLE: &str = @{ e.sql.create_table()|raw_str }@;

pub const CREATE_INDEXES: &[&str] = &[
@%- for index in e.sql.create_indexes() %@
    @{ index|raw_str }@,
@%- endfor %@
];

@{ e.entity.description|doc("") }@#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct @{ e.pascal }@ {
@%- for f in e.columns %@
@{ f.doc_prefix() }@    pub @{ f.name }@: @{ f.ty }@,
@%- endfor %@
}

/// One module per relationship of `@{ e.pascal }@`.
pub mod relationships {
@%- for r in e.relationships %@
@{ r.doc }@    pub mod @{ r.module }@ {
@%- for (name, value) in r.consts %@
        pub const @{ name }@: &str = @{ value }@;
@%- endfor %@
    }
@%- endfor %@
}

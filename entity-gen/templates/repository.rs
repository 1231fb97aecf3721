// @generated by entity-gen. Changes are overwritten on the next run.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::@{ e.module }@::@{ e.pascal }@;
use crate::schemas::@{ e.module }@::{@{ e.pascal }@Create, @{ e.pascal }@Update};

const SELECT_BY_ID: &str = @{ e.sql.select_by_id()|raw_str }@;
const SELECT_LIST: &str = @{ e.sql.select_list()|raw_str }@;
const INSERT: &str = @{ e.sql.insert()|raw_str }@;
const UPDATE: &str = @{ e.sql.update()|raw_str }@;
const SOFT_DELETE: &str = @{ e.sql.soft_delete()|raw_str }@;
const HARD_DELETE: &str = @{ e.sql.hard_delete()|raw_str }@;
@%- for l in e.lookups %@
const SELECT_BY_@{ l.field.const_name }@: &str = @{ e.sql.select_by(l.field.column)|raw_str }@;
@%- endfor %@
@%- for f in e.foreign_keys %@
const SELECT_LIST_BY_@{ f.const_name }@: &str = @{ e.sql.select_list_by(f.column)|raw_str }@;
@%- endfor %@
@%- for assoc in e.associations() %@
const SELECT_@{ assoc.const_name }@_IDS: &str = @{ e.sql.linked_ids(assoc.association)|raw_str }@;
const LINK_@{ assoc.const_name }@: &str = @{ e.sql.link(assoc.association)|raw_str }@;
const UNLINK_@{ assoc.const_name }@: &str = @{ e.sql.unlink(assoc.association)|raw_str }@;
@%- endfor %@

/// Row access for the `@{ e.snake() }@` table. Soft-deleted rows are invisible to every query
/// but `hard_delete`.
#[derive(Debug, Clone)]
pub struct @{ e.pascal }@Repository {
    pool: PgPool,
}

impl @{ e.pascal }@Repository {
    pub fn new(pool: PgPool) -> Self {
        @{ e.pascal }@Repository { pool }
    }

    pub async fn get(&self, id: Uuid) -> sqlx::Result<Option<@{ e.pascal }@>> {
        sqlx::query_as::<_, @{ e.pascal }@>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list(&self, limit: i64, offset: i64) -> sqlx::Result<Vec<@{ e.pascal }@>> {
        sqlx::query_as::<_, @{ e.pascal }@>(SELECT_LIST)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create(&self, id: Uuid, input: &@{ e.pascal }@Create) -> sqlx::Result<@{ e.pascal }@> {
        sqlx::query_as::<_, @{ e.pascal }@>(INSERT)
            .bind(id)
@%- for f in e.fields %@
            .bind(&input.@{ f.name }@)
@%- endfor %@
            .fetch_one(&self.pool)
            .await
    }

    /// `None` when no live row has this id.
    pub async fn update(
        &self,
        id: Uuid,
        input: &@{ e.pascal }@Update,
    ) -> sqlx::Result<Option<@{ e.pascal }@>> {
        sqlx::query_as::<_, @{ e.pascal }@>(UPDATE)
            .bind(id)
@%- for f in e.fields %@
            .bind(&input.@{ f.name }@)
@%- endfor %@
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn soft_delete(&self, id: Uuid) -> sqlx::Result<Option<@{ e.pascal }@>> {
        sqlx::query_as::<_, @{ e.pascal }@>(SOFT_DELETE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn hard_delete(&self, id: Uuid) -> sqlx::Result<Option<@{ e.pascal }@>> {
        sqlx::query_as::<_, @{ e.pascal }@>(HARD_DELETE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
@%- for l in e.lookups %@

    pub async fn get_by_@{ l.field.column }@(&self, value: @{ l.field.param_ty }@) -> sqlx::Result<Option<@{ e.pascal }@>> {
        sqlx::query_as::<_, @{ e.pascal }@>(SELECT_BY_@{ l.field.const_name }@)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
    }
@%- endfor %@
@%- for f in e.foreign_keys %@

    pub async fn list_by_@{ f.column }@(
        &self,
        value: Uuid,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<@{ e.pascal }@>> {
        sqlx::query_as::<_, @{ e.pascal }@>(SELECT_LIST_BY_@{ f.const_name }@)
            .bind(value)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }
@%- endfor %@
@%- for assoc in e.associations() %@

    /// Ids linked through `@{ assoc.association.table }@`.
    pub async fn @{ assoc.name }@_ids(&self, id: Uuid) -> sqlx::Result<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(SELECT_@{ assoc.const_name }@_IDS)
            .bind(id)
            .fetch_all(&self.pool)
            .await
    }

    /// `false` when the pair was already linked.
    pub async fn link_@{ assoc.name }@(&self, id: Uuid, target_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query(LINK_@{ assoc.const_name }@)
            .bind(id)
            .bind(target_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `false` when the pair was not linked.
    pub async fn unlink_@{ assoc.name }@(&self, id: Uuid, target_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query(UNLINK_@{ assoc.const_name }@)
            .bind(id)
            .bind(target_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
@%- endfor %@
}

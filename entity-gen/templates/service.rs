// @generated by entity-gen. Changes are overwritten on the next run.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::repositories::@{ e.module }@::@{ e.pascal }@Repository;
use crate::schemas::@{ e.module }@::{
    @{ e.pascal }@Create, @{ e.pascal }@ListParams, @{ e.pascal }@Response, @{ e.pascal }@Update,
};

#[derive(Debug, Clone)]
pub struct @{ e.pascal }@Service {
    pool: PgPool,
}

impl @{ e.pascal }@Service {
    pub fn new(pool: PgPool) -> Self {
        @{ e.pascal }@Service { pool }
    }

    fn repository(&self) -> @{ e.pascal }@Repository {
        @{ e.pascal }@Repository::new(self.pool.clone())
    }

    pub async fn get(&self, id: Uuid) -> Result<@{ e.pascal }@Response, ApiError> {
        let row = self.repository().get(id).await?.ok_or_else(|| not_found(id))?;
        Ok(row.into())
    }

    pub async fn list(&self, params: @{ e.pascal }@ListParams) -> Result<Vec<@{ e.pascal }@Response>, ApiError> {
        let (limit, offset) = params.bounds();
        let rows = self.repository().list(limit, offset).await?;
        Ok(rows.into_iter().map(@{ e.pascal }@Response::from).collect())
    }

    pub async fn create(&self, input: @{ e.pascal }@Create) -> Result<@{ e.pascal }@Response, ApiError> {
        input.validate()?;
        let repository = self.repository();
@%- for l in e.lookups %@
        if let Some(value) = @{ l.create_value }@ {
            if repository.get_by_@{ l.field.column }@(value).await?.is_some() {
                return Err(conflict(@{ l.field.column|str_lit }@, value));
            }
        }
@%- endfor %@
@%- for p in e.parents %@
        if let Some(value) = @{ p.create_value() }@ {
            self.require_@{ p.name }@(value).await?;
        }
@%- endfor %@
        let row = repository.create(Uuid::new_v4(), &input).await?;
        tracing::info!(id = %row.id, @{ "created {}"|format(e.snake())|str_lit }@);
        Ok(row.into())
    }

    pub async fn update(&self, id: Uuid, input: @{ e.pascal }@Update) -> Result<@{ e.pascal }@Response, ApiError> {
        input.validate()?;
        let repository = self.repository();
@%- for l in e.lookups %@
        if let Some(value) = @{ l.update_value }@ {
            if let Some(existing) = repository.get_by_@{ l.field.column }@(value).await? {
                if existing.id != id {
                    return Err(conflict(@{ l.field.column|str_lit }@, value));
                }
            }
        }
@%- endfor %@
@%- for p in e.parents %@
        if let Some(value) = @{ p.update_value() }@ {
            self.require_@{ p.name }@(value).await?;
        }
@%- endfor %@
        let row = repository.update(id, &input).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(id = %row.id, @{ "updated {}"|format(e.snake())|str_lit }@);
        Ok(row.into())
    }

    /// Soft delete unless `hard` is set.
    pub async fn delete(&self, id: Uuid, hard: bool) -> Result<(), ApiError> {
        let repository = self.repository();
        let deleted = if hard {
            repository.hard_delete(id).await?
        } else {
            repository.soft_delete(id).await?
        };
        deleted.ok_or_else(|| not_found(id))?;
        tracing::info!(%id, hard, @{ "deleted {}"|format(e.snake())|str_lit }@);
        Ok(())
    }
@%- for p in e.parents %@

    async fn require_@{ p.name }@(&self, id: Uuid) -> Result<(), ApiError> {
        let found = crate::repositories::@{ p.target_module }@::@{ p.target_pascal }@Repository::new(self.pool.clone())
            .get(id)
            .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound(format!(@{ "{} {{}} not found"|format(p.target_pascal)|str_lit }@, id))),
        }
    }

    pub async fn get_@{ p.name }@(&self, id: Uuid) -> Result<crate::schemas::@{ p.target_module }@::@{ p.target_pascal }@Response, ApiError> {
        let row = self.repository().get(id).await?.ok_or_else(|| not_found(id))?;
@%- if p.nullable %@
        let target_id = row.@{ p.field }@.ok_or_else(|| {
            ApiError::NotFound(format!(@{ "{} {{}} has no {}"|format(e.pascal, p.name)|str_lit }@, id))
        })?;
@%- else %@
        let target_id = row.@{ p.field }@;
@%- endif %@
        crate::services::@{ p.target_module }@::@{ p.target_pascal }@Service::new(self.pool.clone())
            .get(target_id)
            .await
    }
@%- endfor %@
@%- for c in e.children %@

    pub async fn list_@{ c.name }@(
        &self,
        id: Uuid,
        params: @{ e.pascal }@ListParams,
    ) -> Result<Vec<crate::schemas::@{ c.target_module }@::@{ c.target_pascal }@Response>, ApiError> {
        self.repository().get(id).await?.ok_or_else(|| not_found(id))?;
        let (limit, offset) = params.bounds();
        let rows = crate::repositories::@{ c.target_module }@::@{ c.target_pascal }@Repository::new(self.pool.clone())
            .list_by_@{ c.column }@(id, limit, offset)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
@%- endfor %@
@%- for s in e.singles %@

    pub async fn get_@{ s.name }@(&self, id: Uuid) -> Result<crate::schemas::@{ s.target_module }@::@{ s.target_pascal }@Response, ApiError> {
        self.repository().get(id).await?.ok_or_else(|| not_found(id))?;
        let row = crate::repositories::@{ s.target_module }@::@{ s.target_pascal }@Repository::new(self.pool.clone())
            .get_by_@{ s.column }@(id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!(@{ "{} {{}} has no {}"|format(e.pascal, s.name)|str_lit }@, id))
            })?;
        Ok(row.into())
    }
@%- endfor %@
@%- for l in e.linked %@

    pub async fn @{ l.name }@_ids(&self, id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        let repository = self.repository();
        repository.get(id).await?.ok_or_else(|| not_found(id))?;
        Ok(repository.@{ l.name }@_ids(id).await?)
    }

    pub async fn link_@{ l.name }@(&self, id: Uuid, target_id: Uuid) -> Result<(), ApiError> {
        let repository = self.repository();
        repository.get(id).await?.ok_or_else(|| not_found(id))?;
        crate::services::@{ l.target_module }@::@{ l.target_pascal }@Service::new(self.pool.clone())
            .get(target_id)
            .await?;
        if repository.link_@{ l.name }@(id, target_id).await? {
            tracing::info!(%id, %target_id, @{ "linked {} {}"|format(e.snake(), l.name)|str_lit }@);
        }
        Ok(())
    }

    pub async fn unlink_@{ l.name }@(&self, id: Uuid, target_id: Uuid) -> Result<(), ApiError> {
        if !self.repository().unlink_@{ l.name }@(id, target_id).await? {
            return Err(ApiError::NotFound(format!(
                @{ "{} {{}} is not linked to {} {{}}"|format(e.pascal, l.target_pascal)|str_lit }@,
                id, target_id
            )));
        }
        tracing::info!(%id, %target_id, @{ "unlinked {} {}"|format(e.snake(), l.name)|str_lit }@);
        Ok(())
    }
@%- endfor %@
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!(@{ "{} {{}} not found"|format(e.pascal)|str_lit }@, id))
}
@%- if !e.lookups.is_empty() %@

fn conflict(field: &str, value: impl std::fmt::Debug) -> ApiError {
    ApiError::Conflict(format!(@{ "{} with {{}} {{:?}} already exists"|format(e.pascal)|str_lit }@, field, value))
}
@%- endif %@

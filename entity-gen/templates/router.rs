// @generated by entity-gen. Changes are overwritten on the next run.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::schemas::@{ e.module }@::{
    @{ e.pascal }@Create, @{ e.pascal }@DeleteParams, @{ e.pascal }@ListParams, @{ e.pascal }@Response,
    @{ e.pascal }@Update,
};
use crate::services::@{ e.module }@::@{ e.pascal }@Service;
use crate::AppState;

pub const PRIVILEGE_CREATE: &str = @{ e.privilege("create") }@;
pub const PRIVILEGE_READ: &str = @{ e.privilege("read") }@;
pub const PRIVILEGE_UPDATE: &str = @{ e.privilege("update") }@;
pub const PRIVILEGE_DELETE: &str = @{ e.privilege("delete") }@;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/@{ e.plural }@", get(list).post(create))
        .route("/@{ e.plural }@/:id", get(read).put(update).delete(delete))
@%- for p in e.parents %@
        .route("/@{ e.plural }@/:id/@{ p.name }@", get(get_@{ p.name }@))
@%- endfor %@
@%- for c in e.children %@
        .route("/@{ e.plural }@/:id/@{ c.name }@", get(list_@{ c.name }@))
@%- endfor %@
@%- for s in e.singles %@
        .route("/@{ e.plural }@/:id/@{ s.name }@", get(get_@{ s.name }@))
@%- endfor %@
@%- for l in e.linked %@
        .route("/@{ e.plural }@/:id/@{ l.name }@", get(@{ l.name }@_ids))
        .route(
            "/@{ e.plural }@/:id/@{ l.name }@/:target_id",
            axum::routing::put(link_@{ l.name }@).delete(unlink_@{ l.name }@),
        )
@%- endfor %@
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<@{ e.pascal }@ListParams>,
) -> Result<Json<Vec<@{ e.pascal }@Response>>, ApiError> {
    user.require(PRIVILEGE_READ)?;
    let rows = @{ e.pascal }@Service::new(state.pool).list(params).await?;
    Ok(Json(rows))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<@{ e.pascal }@Create>,
) -> Result<(StatusCode, Json<@{ e.pascal }@Response>), ApiError> {
    user.require(PRIVILEGE_CREATE)?;
    let row = @{ e.pascal }@Service::new(state.pool).create(input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<@{ e.pascal }@Response>, ApiError> {
    user.require(PRIVILEGE_READ)?;
    let row = @{ e.pascal }@Service::new(state.pool).get(id).await?;
    Ok(Json(row))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<@{ e.pascal }@Update>,
) -> Result<Json<@{ e.pascal }@Response>, ApiError> {
    user.require(PRIVILEGE_UPDATE)?;
    let row = @{ e.pascal }@Service::new(state.pool).update(id, input).await?;
    Ok(Json(row))
}

async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(params): Query<@{ e.pascal }@DeleteParams>,
) -> Result<StatusCode, ApiError> {
    user.require(PRIVILEGE_DELETE)?;
    @{ e.pascal }@Service::new(state.pool).delete(id, params.hard).await?;
    Ok(StatusCode::NO_CONTENT)
}
@%- for p in e.parents %@

async fn get_@{ p.name }@(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::schemas::@{ p.target_module }@::@{ p.target_pascal }@Response>, ApiError> {
    user.require(PRIVILEGE_READ)?;
    user.require(@{ p.target_privilege }@)?;
    let row = @{ e.pascal }@Service::new(state.pool).get_@{ p.name }@(id).await?;
    Ok(Json(row))
}
@%- endfor %@
@%- for c in e.children %@

async fn list_@{ c.name }@(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(params): Query<@{ e.pascal }@ListParams>,
) -> Result<Json<Vec<crate::schemas::@{ c.target_module }@::@{ c.target_pascal }@Response>>, ApiError> {
    user.require(PRIVILEGE_READ)?;
    user.require(@{ c.target_privilege }@)?;
    let rows = @{ e.pascal }@Service::new(state.pool).list_@{ c.name }@(id, params).await?;
    Ok(Json(rows))
}
@%- endfor %@
@%- for s in e.singles %@

async fn get_@{ s.name }@(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::schemas::@{ s.target_module }@::@{ s.target_pascal }@Response>, ApiError> {
    user.require(PRIVILEGE_READ)?;
    user.require(@{ s.target_privilege }@)?;
    let row = @{ e.pascal }@Service::new(state.pool).get_@{ s.name }@(id).await?;
    Ok(Json(row))
}
@%- endfor %@
@%- for l in e.linked %@

async fn @{ l.name }@_ids(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    user.require(PRIVILEGE_READ)?;
    let ids = @{ e.pascal }@Service::new(state.pool).@{ l.name }@_ids(id).await?;
    Ok(Json(ids))
}

async fn link_@{ l.name }@(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, target_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    user.require(PRIVILEGE_UPDATE)?;
    @{ e.pascal }@Service::new(state.pool).link_@{ l.name }@(id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unlink_@{ l.name }@(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, target_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    user.require(PRIVILEGE_UPDATE)?;
    @{ e.pascal }@Service::new(state.pool).unlink_@{ l.name }@(id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
@%- endfor %@

use askama::Template;
use uuid::Uuid;

use super::template::{PrivilegeRow, PrivilegesTemplate, ACTIONS};
use crate::analyzer::Entity;
use crate::error::{GenerateError, Result};
use crate::ArtifactKind;

/// Deterministic id of a privilege, so that reruns produce the same script.
pub fn privilege_id(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

pub fn rows<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Vec<PrivilegeRow> {
    entities
        .into_iter()
        .flat_map(|entity| {
            ACTIONS.iter().map(move |action| {
                let name = entity.privilege(action);
                PrivilegeRow {
                    id: privilege_id(&name).to_string(),
                    description: format!("Allows to {} {} entities.", action, entity.snake),
                    entity: entity.snake.clone(),
                    action: action.to_string(),
                    name,
                }
            })
        })
        .collect()
}

pub fn render(rows: &[PrivilegeRow]) -> Result<String> {
    let tpl = PrivilegesTemplate { rows };
    let sql = tpl.render().map_err(|source| GenerateError::Render {
        entity: "*".to_string(),
        kind: ArtifactKind::PrivilegeSql,
        source,
    })?;
    Ok(super::finish(sql))
}

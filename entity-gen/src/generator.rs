use askama::Template;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub mod privileges;
pub mod registry;
pub mod template;

pub use crate::analyzer::SkippedEntity;

use self::template::{
    EntityView, ModelTemplate, RepositoryTemplate, RouterTemplate, SchemaTemplate, ServiceTemplate,
};
use crate::analyzer::{analyze, Entity};
use crate::common::fs_write;
use crate::config::{GeneratorConfig, DEFAULT_OUTPUT};
use crate::error::{GenerateError, Result};
use crate::schema::{parse_str, EntityDef};
use crate::{ArtifactKind, PRIVILEGES_FILE, REGISTRY_FILE};

/// Manifest of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationResult {
    /// Entity name → model, schema, router, service and repository paths.
    pub artifacts: IndexMap<String, Vec<PathBuf>>,
    pub privileges: PathBuf,
    pub registry: Vec<PathBuf>,
    pub skipped: Vec<SkippedEntity>,
    pub warnings: Vec<String>,
    /// Files whose content changed. Always 0 for a dry run.
    pub written: usize,
}

impl GenerationResult {
    /// Every planned path, in write order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.artifacts
            .values()
            .flatten()
            .chain(std::iter::once(&self.privileges))
            .chain(self.registry.iter())
    }
}

#[derive(Debug)]
struct RenderedFile {
    path: PathBuf,
    content: String,
}

/// Renders every artifact of `entities` under `output_root`.
///
/// The whole batch is analyzed and rendered before the first write, so a failure aborts
/// with nothing written unless `config.keep_going` is set.
pub fn generate(
    entities: &[EntityDef],
    output_root: &Path,
    config: &GeneratorConfig,
) -> Result<GenerationResult> {
    let (mut result, files) = plan(entities, output_root, config)?;
    if config.dry_run {
        log::info!("dry run: {} files planned", files.len());
        return Ok(result);
    }
    for file in &files {
        if fs_write(&file.path, &file.content)? {
            result.written += 1;
        }
    }
    log::info!(
        "generated {} entities into {} ({} files changed)",
        result.artifacts.len(),
        output_root.display(),
        result.written
    );
    Ok(result)
}

pub fn generate_from_str(
    json: &str,
    output_root: &Path,
    config: &GeneratorConfig,
) -> Result<GenerationResult> {
    let entities = parse_str(json)?;
    generate(&entities, output_root, config)
}

/// Analysis and rendering without writing.
pub fn check(entities: &[EntityDef], config: &GeneratorConfig) -> Result<GenerationResult> {
    let (result, _) = plan(entities, Path::new(DEFAULT_OUTPUT), config)?;
    Ok(result)
}

fn plan(
    entities: &[EntityDef],
    output_root: &Path,
    config: &GeneratorConfig,
) -> Result<(GenerationResult, Vec<RenderedFile>)> {
    let analysis = analyze(entities, config)?;
    let mut result = GenerationResult {
        skipped: analysis.skipped,
        warnings: analysis.warnings,
        ..Default::default()
    };
    let mut files = Vec::new();
    let mut generated = Vec::new();
    for entity in &analysis.entities {
        match render_entity(entity, output_root) {
            Ok(rendered) => {
                result.artifacts.insert(
                    entity.name.clone(),
                    rendered.iter().map(|f| f.path.clone()).collect(),
                );
                files.extend(rendered);
                generated.push(entity);
            }
            Err(err) if config.keep_going => {
                log::warn!("skipping entity `{}`: {}", entity.name, err);
                result.skipped.push(SkippedEntity {
                    entity: entity.name.clone(),
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
    if generated.is_empty() {
        return Err(GenerateError::Empty);
    }

    let rows = privileges::rows(generated.iter().copied());
    result.privileges = output_root.join(PRIVILEGES_FILE);
    files.push(RenderedFile {
        path: result.privileges.clone(),
        content: privileges::render(&rows)?,
    });

    if config.registry {
        let batch: BTreeSet<_> = generated.iter().map(|e| e.snake.clone()).collect();
        for kind in ArtifactKind::PER_ENTITY {
            let Some(dir) = kind.dir() else { continue };
            let path = output_root.join(dir).join(REGISTRY_FILE);
            let mut modules = registry::existing_modules(&path)?;
            modules.extend(batch.iter().cloned());
            files.push(RenderedFile {
                content: registry::render(kind, &modules)?,
                path: path.clone(),
            });
            result.registry.push(path);
        }
    }
    Ok((result, files))
}

fn render_entity(entity: &Entity, output_root: &Path) -> Result<Vec<RenderedFile>> {
    let view = EntityView::new(entity);
    let mut files = Vec::with_capacity(ArtifactKind::PER_ENTITY.len());
    for kind in ArtifactKind::PER_ENTITY {
        let rendered = match kind {
            ArtifactKind::Model => ModelTemplate { e: &view }.render(),
            ArtifactKind::Schema => SchemaTemplate { e: &view }.render(),
            ArtifactKind::Router => RouterTemplate { e: &view }.render(),
            ArtifactKind::Service => ServiceTemplate { e: &view }.render(),
            ArtifactKind::Repository => RepositoryTemplate { e: &view }.render(),
            ArtifactKind::PrivilegeSql => continue,
        };
        let content = rendered.map_err(|source| GenerateError::Render {
            entity: entity.name.clone(),
            kind,
            source,
        })?;
        let Some(dir) = kind.dir() else { continue };
        files.push(RenderedFile {
            path: output_root.join(dir).join(format!("{}.rs", entity.snake)),
            content: finish(content),
        });
    }
    Ok(files)
}

/// Exactly one trailing newline.
pub(crate) fn finish(mut content: String) -> String {
    let len = content.trim_end().len();
    content.truncate(len);
    content.push('\n');
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sample_document;
    use std::collections::{HashMap, HashSet};
    use std::fs;

    const PROJECT_TASK: &str = r#"[
        {"name": "Project",
         "properties": [{"name": "title", "type": "string", "is_nullable": false}],
         "relationships": [{"name": "tasks", "type": "one-to-many", "target_entity": "Task", "back_populates": "project"}]},
        {"name": "Task",
         "properties": [],
         "relationships": [{"name": "project", "type": "many-to-one", "target_entity": "Project", "back_populates": "tasks", "is_nullable": false}]}
    ]"#;

    const TAG_TASK: &str = r#"[
        {"name": "Tag",
         "properties": [{"name": "label", "type": "string", "is_unique": true}],
         "relationships": [{"name": "tasks", "type": "many-to-many", "target_entity": "Task", "back_populates": "tags"}]},
        {"name": "Task",
         "properties": [{"name": "summary", "type": "text", "description": "What to do."}],
         "relationships": [{"name": "tags", "type": "many-to-many", "target_entity": "Tag", "back_populates": "tasks"}]}
    ]"#;

    fn read(root: &Path, dir: &str, snake: &str) -> String {
        fs::read_to_string(root.join(dir).join(format!("{}.rs", snake))).unwrap()
    }

    fn parse(path: &Path) -> syn::File {
        let content = fs::read_to_string(path).unwrap();
        syn::parse_file(&content).unwrap_or_else(|e| panic!("{}: {}\n{}", path.display(), e, content))
    }

    fn struct_fields(file: &syn::File, name: &str) -> Vec<(String, syn::Type)> {
        file.items
            .iter()
            .find_map(|item| match item {
                syn::Item::Struct(s) if s.ident == name => Some(s),
                _ => None,
            })
            .unwrap_or_else(|| panic!("struct {} not found", name))
            .fields
            .iter()
            .map(|f| (f.ident.as_ref().unwrap().to_string(), f.ty.clone()))
            .collect()
    }

    #[test]
    fn five_files_per_entity_plus_one_script() {
        let dir = tempfile::tempdir().unwrap();
        let entities = sample_document();
        let result = generate(&entities, dir.path(), &GeneratorConfig::default()).unwrap();
        assert_eq!(result.artifacts.len(), entities.len());
        for paths in result.artifacts.values() {
            assert_eq!(paths.len(), 5);
        }
        assert_eq!(result.paths().count(), 5 * entities.len() + 1 + 5);
        for path in result.paths() {
            assert!(path.exists(), "{}", path.display());
            if path.extension().is_some_and(|e| e == "rs") {
                parse(path);
            }
        }
        assert_eq!(result.written, result.paths().count());
    }

    #[test]
    fn rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::default();
        let first = generate(&sample_document(), dir.path(), &config).unwrap();
        let before: Vec<_> = first.paths().map(|p| fs::read(p).unwrap()).collect();
        let second = generate(&sample_document(), dir.path(), &config).unwrap();
        let after: Vec<_> = second.paths().map(|p| fs::read(p).unwrap()).collect();
        assert_eq!(before, after);
        assert_eq!(second.written, 0);
    }

    #[test]
    fn project_task_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            generate_from_str(PROJECT_TASK, dir.path(), &GeneratorConfig::default()).unwrap();
        assert_eq!(
            result.artifacts.keys().collect::<Vec<_>>(),
            ["Project", "Task"]
        );

        let sql = fs::read_to_string(&result.privileges).unwrap();
        assert_eq!(sql.matches("INSERT INTO privilege").count(), 8);
        for entity in ["project", "task"] {
            for action in ["create", "read", "update", "delete"] {
                assert!(sql.contains(&format!("'{}:{}'", entity, action)));
            }
        }

        let model = read(dir.path(), "models", "task");
        assert!(model.contains("    pub project_id: Uuid,\n"));
        assert!(model.contains(r#""project_id" UUID NOT NULL REFERENCES "project" ("id")"#));
        let project = read(dir.path(), "models", "project");
        assert!(project.contains(r#"pub const LINK_COLUMN: &str = "project_id";"#));

        let router = read(dir.path(), "routers", "project");
        assert!(router.contains(r#".route("/projects/:id/tasks", get(list_tasks))"#));
        let service = read(dir.path(), "services", "task");
        assert!(service.contains("self.require_project(value).await?;"));
        let repository = read(dir.path(), "repositories", "task");
        assert!(repository.contains("pub async fn list_by_project_id("));
    }

    #[test]
    fn default_foreign_key_is_target_id() {
        let json = r#"[
            {"name": "Author"},
            {"name": "BlogPost", "relationships": [{"name": "writer", "type": "many-to-one", "target_entity": "Author"}]}
        ]"#;
        let dir = tempfile::tempdir().unwrap();
        generate_from_str(json, dir.path(), &GeneratorConfig::default()).unwrap();
        let model = read(dir.path(), "models", "blog_post");
        assert!(model.contains("    pub author_id: Option<Uuid>,\n"));
        let schema = read(dir.path(), "schemas", "blog_post");
        assert!(schema.contains("    #[serde(default)]\n    pub author_id: Option<Uuid>,\n"));
    }

    #[test]
    fn many_to_many_association_from_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        generate_from_str(TAG_TASK, dir.path(), &GeneratorConfig::default()).unwrap();
        let tag = read(dir.path(), "models", "tag");
        let task = read(dir.path(), "models", "task");
        let table = r#"pub const ASSOCIATION_TABLE: &str = "tag_task_association";"#;
        assert!(tag.contains(table));
        assert!(task.contains(table));
        assert!(task.contains("    /// What to do.\n    pub summary: String,\n"));

        let repository = read(dir.path(), "repositories", "task");
        assert!(repository.contains("pub async fn link_tags(&self, id: Uuid, target_id: Uuid)"));
        assert!(repository.contains(r#"INSERT INTO "tag_task_association" ("task_id", "tag_id")"#));
        let service = read(dir.path(), "services", "tag");
        assert!(service.contains("repository.get_by_label(value).await?"));
    }

    #[test]
    fn model_and_schema_types_agree() {
        let json = r#"[{"name": "Sample", "properties": [
            {"name": "a", "type": "string"},
            {"name": "b", "type": "text", "is_nullable": true},
            {"name": "c", "type": "integer", "default_value": 7},
            {"name": "d", "type": "float"},
            {"name": "e", "type": "boolean", "default_value": false},
            {"name": "f", "type": "datetime", "is_nullable": true},
            {"name": "g", "type": "uuid", "is_unique": true},
            {"name": "type", "type": "string", "is_indexed": true}
        ]}]"#;
        let dir = tempfile::tempdir().unwrap();
        generate_from_str(json, dir.path(), &GeneratorConfig::default()).unwrap();
        let model = parse(&dir.path().join("models/sample.rs"));
        let schema = parse(&dir.path().join("schemas/sample.rs"));
        let model_fields: HashMap<_, _> = struct_fields(&model, "Sample").into_iter().collect();
        let response = struct_fields(&schema, "SampleResponse");
        let create = struct_fields(&schema, "SampleCreate");
        assert_eq!(response.len(), 8 + 3);
        assert_eq!(create.len(), 8);
        for (name, ty) in response.iter().chain(create.iter()) {
            assert_eq!(model_fields.get(name), Some(ty), "{}", name);
        }
        assert!(model_fields.contains_key("r#type"));
    }

    #[test]
    fn privilege_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let entities = sample_document();
        let result = generate(&entities, dir.path(), &GeneratorConfig::default()).unwrap();
        let sql = fs::read_to_string(&result.privileges).unwrap();
        let names: Vec<_> = sql
            .lines()
            .filter(|l| l.starts_with("INSERT"))
            .map(|l| l.split(", ").nth(8).unwrap().to_string())
            .collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), 4 * entities.len());
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn invalid_entity_aborts_without_writing() {
        let json = r#"[
            {"name": "Good", "properties": [{"name": "x", "type": "string"}]},
            {"name": "Bad", "properties": [{"name": "y", "type": "money"}]}
        ]"#;
        let dir = tempfile::tempdir().unwrap();
        let err = generate_from_str(json, dir.path(), &GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, GenerateError::Invalid { ref entity, .. } if entity == "Bad"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let err = generate_from_str("{\"name\": 1}", dir.path(), &GeneratorConfig::default())
            .unwrap_err();
        assert!(matches!(err, GenerateError::Malformed(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn write_failure_names_the_path_and_keeps_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("repositories").join("task.rs");
        fs::create_dir_all(&blocked).unwrap();
        let err = generate_from_str(PROJECT_TASK, dir.path(), &GeneratorConfig::default())
            .unwrap_err();
        match err {
            GenerateError::Io { path, .. } => assert_eq!(path, blocked),
            other => panic!("unexpected error: {}", other),
        }
        for layer in ["models", "schemas", "routers", "services", "repositories"] {
            assert!(dir.path().join(layer).join("project.rs").is_file(), "{}", layer);
        }
        assert!(dir.path().join("models").join("task.rs").is_file());
        assert!(!dir.path().join(PRIVILEGES_FILE).exists());
    }

    #[test]
    fn keep_going_generates_the_rest() {
        let json = r#"[
            {"name": "Good"},
            {"name": "Bad", "properties": [{"name": "y", "type": "money"}]}
        ]"#;
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            keep_going: true,
            ..GeneratorConfig::default()
        };
        let result = generate_from_str(json, dir.path(), &config).unwrap();
        assert_eq!(result.artifacts.keys().collect::<Vec<_>>(), ["Good"]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].entity, "Bad");
        assert!(!dir.path().join("models/bad.rs").exists());
        let sql = fs::read_to_string(&result.privileges).unwrap();
        assert_eq!(sql.matches("INSERT INTO privilege").count(), 4);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            dry_run: true,
            ..GeneratorConfig::default()
        };
        let result = generate(&sample_document(), dir.path(), &config).unwrap();
        assert_eq!(result.written, 0);
        assert!(result.paths().count() > 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let checked = check(&sample_document(), &GeneratorConfig::default()).unwrap();
        assert_eq!(checked.artifacts.len(), result.artifacts.len());
    }

    #[test]
    fn registry_accumulates_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("routers")).unwrap();
        fs::write(dir.path().join("routers/mod.rs"), "pub mod legacy;\n").unwrap();
        let config = GeneratorConfig::default();
        generate_from_str(PROJECT_TASK, dir.path(), &config).unwrap();
        generate_from_str(r#"[{"name": "Alpha"}]"#, dir.path(), &config).unwrap();

        let routers = fs::read_to_string(dir.path().join("routers/mod.rs")).unwrap();
        assert!(routers.contains("pub mod alpha;\npub mod legacy;\npub mod project;\npub mod task;\n"));
        assert!(routers.contains(".merge(alpha::router())"));
        let models = fs::read_to_string(dir.path().join("models/mod.rs")).unwrap();
        assert!(models.contains("pub mod alpha;\npub mod project;\npub mod task;\n"));
        assert!(!models.contains("routes"));

        let no_registry = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            registry: false,
            ..GeneratorConfig::default()
        };
        let result = generate_from_str(PROJECT_TASK, no_registry.path(), &config).unwrap();
        assert!(result.registry.is_empty());
        assert!(!no_registry.path().join("models/mod.rs").exists());
    }

    #[test]
    fn lenient_mode_skips_unresolved_navigation() {
        let json = r#"[{"name": "Task", "relationships": [{"name": "owner", "type": "many-to-one", "target_entity": "User"}]}]"#;
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            strict: false,
            ..GeneratorConfig::default()
        };
        let result = generate_from_str(json, dir.path(), &config).unwrap();
        assert_eq!(result.warnings.len(), 1);
        let service = read(dir.path(), "services", "task");
        assert!(!service.contains("require_owner"));
        let repository = read(dir.path(), "repositories", "task");
        assert!(repository.contains("pub async fn list_by_user_id("));
        for path in result.paths().filter(|p| p.extension().is_some_and(|e| e == "rs")) {
            parse(path);
        }
    }
}

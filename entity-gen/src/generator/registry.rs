use askama::Template;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use super::template::RegistryTemplate;
use crate::error::{GenerateError, Result};
use crate::ArtifactKind;

/// Module names declared as `pub mod <name>;` in an existing registry file.
pub fn existing_modules(path: &Path) -> Result<BTreeSet<String>> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^\s*pub\s+mod\s+(?:r#)?([a-z][_0-9a-z]*)\s*;").unwrap()
    });
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(GenerateError::io(path, e)),
    };
    Ok(RE
        .captures_iter(&content)
        .map(|c| c[1].to_string())
        .collect())
}

/// Registry of one layer. The router layer also gets `routes()`.
pub fn render(kind: ArtifactKind, modules: &BTreeSet<String>) -> Result<String> {
    let modules: Vec<_> = modules.iter().cloned().collect();
    let tpl = RegistryTemplate {
        modules: &modules,
        routes: kind == ArtifactKind::Router,
    };
    let content = tpl.render().map_err(|source| GenerateError::Render {
        entity: "*".to_string(),
        kind,
        source,
    })?;
    Ok(super::finish(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_declared_modules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.rs");
        assert!(existing_modules(&path).unwrap().is_empty());
        fs::write(&path, "// notes\npub mod legacy;\npub mod r#type;\nmod private;\n").unwrap();
        let modules = existing_modules(&path).unwrap();
        assert_eq!(
            modules.into_iter().collect::<Vec<_>>(),
            ["legacy".to_string(), "type".to_string()]
        );
    }

    #[test]
    fn router_registry_merges_routes() {
        let modules: BTreeSet<_> = ["task", "project"].iter().map(|s| s.to_string()).collect();
        let content = render(ArtifactKind::Router, &modules).unwrap();
        assert!(content.contains("pub mod project;\npub mod task;\n"));
        assert!(content.contains(".merge(project::router())\n        .merge(task::router())"));
        syn::parse_file(&content).unwrap();

        let content = render(ArtifactKind::Model, &modules).unwrap();
        assert!(!content.contains("routes"));
        assert!(content.ends_with("pub mod project;\npub mod task;\n"));
    }
}

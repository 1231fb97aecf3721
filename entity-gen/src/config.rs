use std::env;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT: &str = ".";

/// Options of one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Unresolved targets and mismatched relationship pairs are errors instead of warnings.
    pub strict: bool,
    /// Skip entities that fail instead of aborting the batch.
    pub keep_going: bool,
    /// Maintain the per-layer `mod.rs` registry files.
    pub registry: bool,
    /// Render everything but write nothing.
    pub dry_run: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            strict: true,
            keep_going: false,
            registry: true,
            dry_run: false,
        }
    }
}

impl GeneratorConfig {
    /// Defaults overridden by `ENTITY_GEN_STRICT`, `ENTITY_GEN_KEEP_GOING` and
    /// `ENTITY_GEN_REGISTRY`.
    pub fn from_env() -> Self {
        let default = GeneratorConfig::default();
        GeneratorConfig {
            strict: env_flag("ENTITY_GEN_STRICT").unwrap_or(default.strict),
            keep_going: env_flag("ENTITY_GEN_KEEP_GOING").unwrap_or(default.keep_going),
            registry: env_flag("ENTITY_GEN_REGISTRY").unwrap_or(default.registry),
            dry_run: default.dry_run,
        }
    }
}

/// Output root from `ENTITY_GEN_OUTPUT`, or the current directory.
pub fn output_from_env() -> PathBuf {
    env::var_os("ENTITY_GEN_OUTPUT")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn defaults() {
        let config = GeneratorConfig::default();
        assert!(config.strict);
        assert!(!config.keep_going);
        assert!(config.registry);
        assert!(!config.dry_run);
    }
}

use fancy_regex::Regex;
use once_cell::sync::Lazy;
use std::{fs, path::Path};

use crate::error::{GenerateError, Result};

/// Names that cannot be used even as raw identifiers.
pub static BAD_KEYWORDS: &[&str] = &["super", "self", "Self", "extern", "crate", "_"];

pub static KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

/// Types the generated files import or name unqualified.
pub static RESERVED_TYPES: &[&str] = &[
    "ApiError", "AppState", "CurrentUser", "DateTime", "Deserialize", "FromRow", "Json",
    "Option", "Path", "PgPool", "Query", "Result", "Router", "Serialize", "State", "StatusCode",
    "String", "Utc", "Uuid", "Validate", "Vec",
];

/// Checks a normalized snake_case name. Returns the reason when it is unusable.
pub fn check_name(name: &str) -> Result<(), String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][_0-9a-z]*(?<!_)$").unwrap());
    if !RE.is_match(name).unwrap_or(false) {
        return Err(format!("{:?} is not a valid identifier", name));
    }
    if BAD_KEYWORDS.iter().any(|&x| x == name) {
        return Err(format!("{:?} is a reserved word", name));
    }
    Ok(())
}

pub fn check_type_name(name: &str) -> Result<(), String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][0-9A-Za-z]*$").unwrap());
    if !RE.is_match(name).unwrap_or(false) || BAD_KEYWORDS.iter().any(|&x| x == name) {
        return Err(format!("{:?} is not a valid type name", name));
    }
    if RESERVED_TYPES.iter().any(|&x| x == name) {
        return Err(format!(
            "{:?} clashes with a type used by the generated code",
            name
        ));
    }
    Ok(())
}

/// `HelloHTMLWorld` -> `hello_html_world`, `Already_Snake` -> `already_snake`.
pub fn to_snake(name: &str) -> String {
    static LOWER_UPPER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?<=[a-z0-9])(?=[A-Z])").unwrap());
    static ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?<=[A-Z])(?=[A-Z][a-z])").unwrap());
    static UNDERSCORES: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r"_+").unwrap());
    let name = name.trim().replace(['-', ' '], "_");
    let name = LOWER_UPPER.replace_all(&name, "_");
    let name = ACRONYM.replace_all(&name, "_");
    UNDERSCORES
        .replace_all(&name.to_lowercase(), "_")
        .to_string()
}

/// `hello_world` -> `HelloWorld`. Names that already look like PascalCase are kept.
pub fn to_pascal(name: &str) -> String {
    let name = name.trim();
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !name.contains(['_', '-', ' ']) && first.is_uppercase() {
            if name.chars().all(|c| !c.is_lowercase()) {
                return format!("{}{}", first, chars.as_str().to_lowercase());
            }
            if chars.any(|c| c.is_lowercase()) {
                return name.to_owned();
            }
        }
    }
    name.replace(['-', ' '], "_")
        .split('_')
        .map(capitalize)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// Route segment for an entity: `task` -> `tasks`, `category` -> `categories`.
pub fn to_plural(name: &str) -> String {
    static RE: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^(.+[^_0-9])([_0-9]+)$").unwrap());
    if let Some(c) = RE.captures(name) {
        format!(
            "{}{}",
            inflector::string::pluralize::to_plural(&c[1]),
            &c[2]
        )
    } else {
        inflector::string::pluralize::to_plural(name)
    }
}

/// Writes `contents` unless the file already holds exactly those bytes.
/// Returns whether the file was (re)written.
pub fn fs_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<bool> {
    fn inner(path: &Path, contents: &[u8]) -> Result<bool> {
        let update = if let Ok(buf) = fs::read(path) {
            !buf.eq(contents)
        } else {
            true
        };
        if update {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
            }
            fs::write(path, contents).map_err(|e| GenerateError::io(path, e))?;
            log::debug!("wrote {}", path.display());
        } else {
            log::debug!("unchanged {}", path.display());
        }
        Ok(update)
    }
    inner(path.as_ref(), contents.as_ref())
}

/// SQL string literal with single quotes doubled.
pub fn sql_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Double-quoted SQL identifier.
pub fn sql_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case() {
        assert_eq!(to_snake("HelloWorld"), "hello_world");
        assert_eq!(to_snake("HelloHTMLWorld"), "hello_html_world");
        assert_eq!(to_snake("Already_Snake_Case"), "already_snake_case");
        assert_eq!(to_snake("ProductItem"), "product_item");
        assert_eq!(to_snake("order-line"), "order_line");
        assert_eq!(to_snake("Task"), "task");
    }

    #[test]
    fn pascal_case() {
        assert_eq!(to_pascal("hello_world"), "HelloWorld");
        assert_eq!(to_pascal("hello_html_world"), "HelloHtmlWorld");
        assert_eq!(to_pascal("ProductItem"), "ProductItem");
        assert_eq!(to_pascal("project"), "Project");
        assert_eq!(to_pascal("UUID"), "Uuid");
        assert_eq!(to_pascal("order-line"), "OrderLine");
    }

    #[test]
    fn plural() {
        assert_eq!(to_plural("task"), "tasks");
        assert_eq!(to_plural("category"), "categories");
        assert_eq!(to_plural("order_line"), "order_lines");
    }

    #[test]
    fn names() {
        assert!(check_name("task").is_ok());
        assert!(check_name("order_line2").is_ok());
        assert!(check_name("type").is_ok());
        assert!(check_name("self").is_err());
        assert!(check_name("trailing_").is_err());
        assert!(check_name("2fast").is_err());
        assert!(check_name("Task").is_err());
        assert!(check_type_name("Task").is_ok());
        assert!(check_type_name("Self").is_err());
        for clash in ["Uuid", "DateTime", "Utc", "String", "Router"] {
            let err = check_type_name(clash).unwrap_err();
            assert!(err.contains("clashes"), "{}", err);
        }
        assert!(check_type_name("UuidMapping").is_ok());
    }

    #[test]
    fn sql_quoting() {
        assert_eq!(sql_str("it's"), "'it''s'");
        assert_eq!(sql_ident("task"), "\"task\"");
    }

    #[test]
    fn write_only_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b.rs");
        assert!(fs_write(&path, "x").unwrap());
        assert!(!fs_write(&path, "x").unwrap());
        assert!(fs_write(&path, "y").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "y");
    }
}

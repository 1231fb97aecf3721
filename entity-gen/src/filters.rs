use crate::common::{self, BAD_KEYWORDS, KEYWORDS};

pub fn _to_var_name(s: &str) -> String {
    if BAD_KEYWORDS.iter().any(|&x| x == s) {
        format!("{}_", s)
    } else if KEYWORDS.iter().any(|&x| x == s) {
        format!("r#{}", s)
    } else {
        s.to_owned()
    }
}

/// Field or module name, raw-escaped when it is a keyword.
pub fn to_var_name<S: AsRef<str>>(s: S) -> ::askama::Result<String> {
    Ok(_to_var_name(s.as_ref()))
}

/// Raw string literal with enough `#` to hold `s` as is.
pub fn raw_str<S: AsRef<str>>(s: S) -> ::askama::Result<String> {
    Ok(_raw_str(s.as_ref()))
}

pub fn _raw_str(s: &str) -> String {
    let mut hashes = 1;
    while s.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let hashes = "#".repeat(hashes);
    format!("r{0}\"{1}\"{0}", hashes, s)
}

/// Ordinary string literal.
pub fn str_lit<S: AsRef<str>>(s: S) -> ::askama::Result<String> {
    Ok(format!("{:?}", s.as_ref()))
}

pub fn sql_str<S: AsRef<str>>(s: S) -> ::askama::Result<String> {
    Ok(common::sql_str(s.as_ref()))
}

/// `///` lines of an optional description, each followed by a newline.
pub fn doc<S: AsRef<str>>(s: &Option<S>, indent: &str) -> ::askama::Result<String> {
    Ok(_doc(s.as_ref().map(AsRef::as_ref), indent))
}

pub fn _doc(s: Option<&str>, indent: &str) -> String {
    let Some(s) = s else {
        return String::new();
    };
    s.trim()
        .lines()
        .map(|l| {
            let l = l.trim_end();
            if l.is_empty() {
                format!("{}///\n", indent)
            } else {
                format!("{}/// {}\n", indent, l)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_names() {
        assert_eq!(_to_var_name("type"), "r#type");
        assert_eq!(_to_var_name("self"), "self_");
        assert_eq!(_to_var_name("title"), "title");
    }

    #[test]
    fn raw_strings() {
        assert_eq!(_raw_str(r#"SELECT "id""#), "r#\"SELECT \"id\"\"#");
        assert_eq!(_raw_str("a\"#b"), "r##\"a\"#b\"##");
    }

    #[test]
    fn doc_lines() {
        assert_eq!(doc(&Some("one\n\ntwo "), "    ").unwrap(), "    /// one\n    ///\n    /// two\n");
        assert_eq!(doc::<String>(&None, "").unwrap(), "");
    }
}

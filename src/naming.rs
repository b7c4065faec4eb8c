//! naming helpers
//!
//! case conversion and identifier rules for emitted rust code.

use crate::error::{Error, Result};
use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

/// PascalCase form of a schema name
pub fn pascal_case(name: &str) -> String {
    name.to_upper_camel_case()
}

/// snake_case form of a schema name, raw-escaped when it is a keyword
pub fn field_name(name: &str) -> String {
    escape_keyword(name.to_snake_case())
}

/// SCREAMING_SNAKE_CASE form, used for constants and statics
pub fn constant_name(name: &str) -> String {
    let out = name.to_shouty_snake_case();
    if out.starts_with(|ch: char| ch.is_ascii_digit()) {
        format!("_{out}")
    } else {
        out
    }
}

/// snake_case module name, suffixed when it is a keyword
pub fn module_name(name: &str) -> String {
    let out = name.to_snake_case();
    if is_rust_keyword(&out) {
        format!("{out}_")
    } else {
        out
    }
}

/// the identifier without a raw prefix, for use inside other names
pub fn unraw(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

fn escape_keyword(name: String) -> String {
    if !is_rust_keyword(&name) {
        return name;
    }
    // these keywords cannot be raw identifiers
    if matches!(name.as_str(), "self" | "Self" | "super" | "crate") {
        format!("{name}_")
    } else {
        format!("r#{name}")
    }
}

/// PascalCase variant name, suffixed when it is `Self`
pub fn variant_name(name: &str) -> String {
    let out = pascal_case(name);
    if out == "Self" || out.is_empty() {
        format!("{out}_")
    } else {
        out
    }
}

/// prelude names emitted code relies on, never usable as a generated type
pub fn is_prelude_type(name: &str) -> bool {
    matches!(
        name,
        "Self" | "Option" | "Some" | "None" | "Box" | "Vec" | "String" | "Result" | "Ok" | "Err"
    )
}

/// check that `name` is a legal, non-keyword rust identifier
pub fn ensure_identifier(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("identifier is empty")
    } else if name.starts_with(|ch: char| ch.is_ascii_digit()) {
        Some("identifier starts with a digit")
    } else if !name.chars().all(|ch| ch == '_' || ch.is_alphanumeric()) {
        Some("identifier contains characters other than letters, digits, and underscores")
    } else if name == "_" {
        Some("`_` is not a type name")
    } else if is_rust_keyword(name) {
        Some("identifier is a reserved keyword")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::Identifier {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// like [`ensure_identifier`], but accepts raw identifiers such as `r#type`
pub fn ensure_member_identifier(ident: &str) -> Result<()> {
    match ident.strip_prefix("r#") {
        Some(raw) if is_rust_keyword(raw) && !matches!(raw, "self" | "Self" | "super" | "crate") => Ok(()),
        _ => ensure_identifier(ident),
    }
}

pub fn is_rust_keyword(name: &str) -> bool {
    matches!(
        name,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
            | "try"
            | "gen"
    )
}

/// escape text for a rust string literal
pub fn string_literal(text: &str) -> String {
    format!("{text:?}")
}

//! query document serializer
//!
//! renders a [`Selection`] as query text. compact mode puts everything on
//! one line with no optional spaces; indented mode puts one field per line.
//! options are passed explicitly to every call.

use super::value::{Argument, InputValue, Temporal, Variable};
use super::{DirectiveClause, FieldSelection, OperationKind, Selection};
use chrono::SecondsFormat;
use std::collections::HashSet;
use std::fmt::Write;

/// layout of the rendered document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Formatting {
    /// single line, no optional whitespace
    #[default]
    None,
    /// one field per line, nested levels indented
    Indented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerOptions {
    pub formatting: Formatting,
    /// spaces per nesting level in indented mode
    pub indent_size: usize,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            formatting: Formatting::None,
            indent_size: 2,
        }
    }
}

impl SerializerOptions {
    pub fn new(formatting: Formatting) -> Self {
        Self {
            formatting,
            ..Self::default()
        }
    }

    pub fn with_indent_size(mut self, indent_size: usize) -> Self {
        self.indent_size = indent_size;
        self
    }

    fn indented(&self) -> bool {
        self.formatting == Formatting::Indented
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(self.indent_size * level)
    }

    /// `name:value` or `name: value`
    fn pair_separator(&self) -> &'static str {
        if self.indented() {
            ": "
        } else {
            ":"
        }
    }

    /// between arguments and variable definitions
    fn list_separator(&self) -> &'static str {
        if self.indented() {
            ", "
        } else {
            ","
        }
    }
}

/// operation keyword and optional name of a root builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHeader {
    pub kind: OperationKind,
    pub name: Option<String>,
}

/// render a whole document
///
/// with a header, the operation keyword, name, and the definitions of every
/// variable referenced anywhere in the tree precede the selection set.
pub fn build_document(
    header: Option<&OperationHeader>,
    selection: &Selection,
    options: &SerializerOptions,
) -> String {
    let mut out = String::new();
    if let Some(header) = header {
        out.push_str(header.kind.keyword());
        if let Some(name) = &header.name {
            out.push(' ');
            out.push_str(name);
        }
        let variables = collect_variables(selection);
        if !variables.is_empty() {
            let definitions: Vec<String> = variables
                .iter()
                .map(|variable| variable_definition(variable, options))
                .collect();
            out.push('(');
            out.push_str(&definitions.join(options.list_separator()));
            out.push(')');
        }
        if options.indented() {
            out.push(' ');
        }
    }
    let items = selection_items(selection, options, 1);
    out.push_str(&wrap_items(&items, options, 1));
    out
}

fn variable_definition(variable: &Variable, options: &SerializerOptions) -> String {
    let mut out = format!(
        "${}{}{}",
        variable.name,
        options.pair_separator(),
        variable.graphql_type
    );
    if let Some(default) = &variable.default_value {
        if !variable.graphql_type.ends_with('!') && !default.is_null() {
            out.push_str(if options.indented() { " = " } else { "=" });
            encode_value(default, None, options, 0, &mut out);
        }
    }
    out
}

/// every referenced variable, first seen wins
pub fn collect_variables(selection: &Selection) -> Vec<Variable> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_from_selection(selection, &mut seen, &mut out);
    out
}

fn collect_from_selection(selection: &Selection, seen: &mut HashSet<String>, out: &mut Vec<Variable>) {
    for field in selection.fields() {
        collect_from_arguments(&field.arguments, seen, out);
        for directive in &field.directives {
            collect_from_arguments(&directive.arguments, seen, out);
        }
        if let Some(child) = &field.selection {
            collect_from_selection(child, seen, out);
        }
    }
    for fragment in selection.fragments() {
        collect_from_selection(&fragment.selection, seen, out);
    }
}

fn collect_from_arguments(arguments: &[Argument], seen: &mut HashSet<String>, out: &mut Vec<Variable>) {
    for argument in arguments {
        collect_from_value(&argument.value, seen, out);
    }
}

fn collect_from_value(value: &InputValue, seen: &mut HashSet<String>, out: &mut Vec<Variable>) {
    match value {
        InputValue::Variable(variable) => {
            if seen.insert(variable.name.clone()) {
                out.push(variable.clone());
            }
        }
        InputValue::List(items) => {
            for item in items {
                collect_from_value(item, seen, out);
            }
        }
        InputValue::Object(properties) => collect_from_arguments(properties, seen, out),
        _ => {}
    }
}

/// rendered entries of a selection set whose entries sit at `level`
fn selection_items(selection: &Selection, options: &SerializerOptions, level: usize) -> Vec<String> {
    let fragments: Vec<String> = selection
        .fragments()
        .iter()
        .filter_map(|fragment| {
            let items = selection_items(&fragment.selection, options, level + 1);
            if items.is_empty() {
                return None;
            }
            let space = if options.indented() { " " } else { "" };
            Some(format!(
                "... on {}{space}{}",
                fragment.type_condition,
                wrap_items(&items, options, level + 1)
            ))
        })
        .collect();

    let mut items = Vec::new();
    if !fragments.is_empty() && !selection.contains("__typename") {
        items.push("__typename".to_string());
    }
    items.extend(
        selection
            .fields()
            .iter()
            .filter_map(|field| field_item(field, options, level)),
    );
    items.extend(fragments);
    items
}

fn field_item(field: &FieldSelection, options: &SerializerOptions, level: usize) -> Option<String> {
    let nested = match &field.selection {
        Some(child) => {
            let items = selection_items(child, options, level + 1);
            if items.is_empty() {
                // an object field without subfields is not a valid selection
                return None;
            }
            Some(wrap_items(&items, options, level + 1))
        }
        None => None,
    };

    let mut out = String::new();
    if let Some(alias) = &field.alias {
        out.push_str(alias);
        out.push_str(options.pair_separator());
    }
    out.push_str(&field.name);
    write_arguments(&field.arguments, options, level, &mut out);
    write_directives(&field.directives, options, level, &mut out);
    if let Some(nested) = nested {
        if options.indented() {
            out.push(' ');
        }
        out.push_str(&nested);
    }
    Some(out)
}

fn write_arguments(arguments: &[Argument], options: &SerializerOptions, level: usize, out: &mut String) {
    if arguments.is_empty() {
        return;
    }
    out.push('(');
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            out.push_str(options.list_separator());
        }
        out.push_str(&argument.name);
        out.push_str(options.pair_separator());
        encode_value(&argument.value, argument.format_mask.as_deref(), options, level, out);
    }
    out.push(')');
}

fn write_directives(directives: &[DirectiveClause], options: &SerializerOptions, level: usize, out: &mut String) {
    if directives.is_empty() {
        return;
    }
    if options.indented() {
        out.push(' ');
    }
    for directive in directives {
        out.push('@');
        out.push_str(&directive.name);
        write_arguments(&directive.arguments, options, level, out);
    }
}

/// `{...}` around items at `level`; the closing brace sits one level out
fn wrap_items(items: &[String], options: &SerializerOptions, level: usize) -> String {
    if !options.indented() {
        return format!("{{{}}}", items.join(","));
    }
    if items.is_empty() {
        return "{}".to_string();
    }
    let indent = options.indent(level);
    let body: Vec<String> = items.iter().map(|item| format!("{indent}{item}")).collect();
    format!("{{\n{}\n{}}}", body.join(",\n"), options.indent(level.saturating_sub(1)))
}

/// append the literal text of `value`, which starts on a line at `level`
pub fn encode_value(
    value: &InputValue,
    format_mask: Option<&str>,
    options: &SerializerOptions,
    level: usize,
    out: &mut String,
) {
    match value {
        InputValue::Null => out.push_str("null"),
        InputValue::Boolean(value) => out.push_str(if *value { "true" } else { "false" }),
        InputValue::Int(value) => out.push_str(&value.to_string()),
        InputValue::UInt(value) => out.push_str(&value.to_string()),
        // graphql has no literal for nan or infinity
        InputValue::Float(value) if !value.is_finite() => out.push_str("null"),
        // debug formatting keeps the fraction of integral values (`1.0`)
        InputValue::Float(value) => out.push_str(&format!("{value:?}")),
        InputValue::Decimal(text) => out.push_str(text),
        InputValue::String(text) | InputValue::Id(text) => quote_into(text, out),
        InputValue::Enum(name) => out.push_str(name),
        InputValue::Temporal(temporal) => quote_into(&format_temporal(temporal, format_mask), out),
        InputValue::Variable(variable) => {
            out.push('$');
            out.push_str(&variable.name);
        }
        InputValue::List(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| {
                    let mut text = String::new();
                    encode_value(item, format_mask, options, level + 1, &mut text);
                    text
                })
                .collect();
            out.push_str(&wrap_values('[', ']', &rendered, options, level));
        }
        InputValue::Object(properties) => {
            let rendered: Vec<String> = properties
                .iter()
                .map(|property| {
                    let mut text = format!("{}{}", property.name, options.pair_separator());
                    encode_value(
                        &property.value,
                        property.format_mask.as_deref(),
                        options,
                        level + 1,
                        &mut text,
                    );
                    text
                })
                .collect();
            out.push_str(&wrap_values('{', '}', &rendered, options, level));
        }
    }
}

fn wrap_values(open: char, close: char, items: &[String], options: &SerializerOptions, level: usize) -> String {
    if items.is_empty() {
        return format!("{open}{close}");
    }
    if !options.indented() {
        return format!("{open}{}{close}", items.join(","));
    }
    let indent = options.indent(level + 1);
    let body: Vec<String> = items.iter().map(|item| format!("{indent}{item}")).collect();
    format!("{open}\n{}\n{}{close}", body.join(",\n"), options.indent(level))
}

fn format_temporal(temporal: &Temporal, format_mask: Option<&str>) -> String {
    if let Some(mask) = format_mask {
        let mut text = String::new();
        let written = match temporal {
            Temporal::DateTime(value) => write!(text, "{}", value.format(mask)),
            Temporal::Date(value) => write!(text, "{}", value.format(mask)),
            Temporal::Time(value) => write!(text, "{}", value.format(mask)),
        };
        if written.is_ok() {
            return text;
        }
    }
    match temporal {
        Temporal::DateTime(value) => value.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        Temporal::Date(value) => value.format("%Y-%m-%d").to_string(),
        Temporal::Time(value) => value.format("%H:%M:%S%.f").to_string(),
    }
}

/// quoted graphql string literal
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    quote_into(text, &mut out);
    out
}

fn quote_into(text: &str, out: &mut String) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '/' => out.push_str("\\/"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(ch));
            }
            ch => out.push(ch),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{FieldOptions, FragmentSelection, ToInputValue};
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use graphql_parser::query::{Definition, OperationDefinition, Selection as ParsedSelection, Value};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn id_name() -> Selection {
        let mut selection = Selection::default();
        selection.insert_field(FieldSelection::scalar("id"));
        selection.insert_field(FieldSelection::scalar("name"));
        selection
    }

    fn compact() -> SerializerOptions {
        SerializerOptions::new(Formatting::None)
    }

    fn indented() -> SerializerOptions {
        SerializerOptions::new(Formatting::Indented).with_indent_size(2)
    }

    fn encode(value: &InputValue) -> String {
        let mut out = String::new();
        encode_value(value, None, &compact(), 0, &mut out);
        out
    }

    #[test]
    fn test_two_fields_compact_and_indented() {
        let selection = id_name();
        assert_eq!(build_document(None, &selection, &compact()), "{id,name}");
        assert_eq!(build_document(None, &selection, &indented()), "{\n  id,\n  name\n}");

        let four = SerializerOptions::new(Formatting::Indented).with_indent_size(4);
        assert_eq!(build_document(None, &selection, &four), "{\n    id,\n    name\n}");
    }

    #[test]
    fn test_nested_indented_document() {
        let mut hero = id_name();
        hero.insert_fragment(FragmentSelection {
            type_condition: "Droid".to_string(),
            selection: {
                let mut droid = Selection::default();
                droid.insert_field(FieldSelection::scalar("primaryFunction"));
                droid
            },
        });
        let mut root = Selection::default();
        root.insert_field(
            FieldSelection::object("hero", hero)
                .with_arguments(vec![Argument::new("episode", &InputValue::Enum("JEDI".to_string()))])
                .with_options(FieldOptions::new().with_alias("main")),
        );
        let header = OperationHeader {
            kind: OperationKind::Query,
            name: Some("Hero".to_string()),
        };

        let expected = indoc! {"
            query Hero {
              main: hero(episode: JEDI) {
                __typename,
                id,
                name,
                ... on Droid {
                  primaryFunction
                }
              }
            }"};
        assert_eq!(build_document(Some(&header), &root, &indented()), expected);
        assert_eq!(
            build_document(Some(&header), &root, &compact()),
            "query Hero{main:hero(episode:JEDI){__typename,id,name,... on Droid{primaryFunction}}}"
        );
    }

    #[test]
    fn test_value_encoding() {
        assert_eq!(encode(&InputValue::Null), "null");
        assert_eq!(encode(&false.to_input_value()), "false");
        assert_eq!(encode(&(-42i64).to_input_value()), "-42");
        assert_eq!(encode(&1234567.5f64.to_input_value()), "1234567.5");
        assert_eq!(encode(&1.0f64.to_input_value()), "1.0");
        assert_eq!(encode(&2f32.to_input_value()), "2.0");
        assert_eq!(encode(&InputValue::Enum("ACTIVE".to_string())), "ACTIVE");
        assert_eq!(
            encode(&"a\"b\\c/d\n\t\u{08}\u{0c}\r\u{01}".to_input_value()),
            r#""a\"b\\c\/d\n\t\b\f\r\u0001""#
        );
        assert_eq!(
            encode(&uuid::Uuid::nil().to_input_value()),
            "\"00000000-0000-0000-0000-000000000000\""
        );
        assert_eq!(
            encode(&InputValue::List(vec![InputValue::Int(1), InputValue::Int(2)])),
            "[1,2]"
        );
        assert_eq!(
            encode(&InputValue::Object(vec![
                Argument::new("a", &1),
                Argument::new("b", &InputValue::Variable(Variable::new("b", "Int"))),
            ])),
            "{a:1,b:$b}"
        );
    }

    #[test]
    fn test_temporal_encoding() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let at = offset.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
        assert_eq!(encode(&at.to_input_value()), "\"2024-05-17T08:30:00+01:00\"");

        let mut out = String::new();
        let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        encode_value(&date.to_input_value(), Some("%d/%m/%Y"), &compact(), 0, &mut out);
        assert_eq!(out, "\"17\\/05\\/2024\"");
    }

    #[test]
    fn test_indented_values() {
        let mut root = Selection::default();
        root.insert_field(
            FieldSelection::scalar("search").with_arguments(vec![Argument::new(
                "filter",
                &InputValue::Object(vec![
                    Argument::new("tags", &vec!["a", "b"]),
                    Argument::new("limit", &5),
                ]),
            )]),
        );
        let expected = indoc! {r#"
            {
              search(filter: {
                tags: [
                  "a",
                  "b"
                ],
                limit: 5
              })
            }"#};
        assert_eq!(build_document(None, &root, &indented()), expected);
    }

    #[test]
    fn test_operation_signature_collects_variables() {
        let id = Variable::new("id", "ID!");
        let first = Variable::new("first", "Int").with_default(&10);
        let show = Variable::new("show", "Boolean!").with_default(&true);
        let mut user = Selection::default();
        user.insert_field(FieldSelection::scalar("name").with_options(
            FieldOptions::new().with_directive(crate::runtime::DirectiveClause::new(
                "include",
                vec![Argument::new("if", &show)],
            )),
        ));
        let mut root = Selection::default();
        root.insert_field(FieldSelection::object("user", user.clone()).with_arguments(vec![
            Argument::new("id", &id),
            Argument::new("first", &first),
        ]));
        root.insert_field(
            FieldSelection::object("again", user).with_arguments(vec![Argument::new("id", &id)]),
        );
        let header = OperationHeader {
            kind: OperationKind::Query,
            name: Some("User".to_string()),
        };
        let text = build_document(Some(&header), &root, &compact());
        assert_eq!(
            text,
            "query User($id:ID!,$first:Int=10,$show:Boolean!){user(id:$id,first:$first){name@include(if:$show)},again(id:$id){name@include(if:$show)}}"
        );

        let text = build_document(Some(&header), &root, &indented());
        assert!(text.starts_with("query User($id: ID!, $first: Int = 10, $show: Boolean!) {\n"));
        assert!(text.contains("name @include(if: $show)"));
    }

    #[test]
    fn test_anonymous_operation_and_mutation_keyword() {
        let header = OperationHeader {
            kind: OperationKind::Mutation,
            name: None,
        };
        assert_eq!(build_document(Some(&header), &id_name(), &compact()), "mutation{id,name}");
        assert_eq!(
            build_document(Some(&header), &id_name(), &indented()),
            "mutation {\n  id,\n  name\n}"
        );
    }

    #[test]
    fn test_empty_fragments_and_objects_are_suppressed() {
        let mut root = Selection::default();
        root.insert_field(FieldSelection::scalar("id"));
        root.insert_field(FieldSelection::object("empty", Selection::default()));
        root.insert_fragment(FragmentSelection {
            type_condition: "Human".to_string(),
            selection: Selection::default(),
        });
        assert_eq!(build_document(None, &root, &compact()), "{id}");
    }

    #[test]
    fn test_typename_not_duplicated() {
        let mut root = Selection::default();
        root.insert_field(FieldSelection::scalar("__typename"));
        root.insert_fragment(FragmentSelection {
            type_condition: "Human".to_string(),
            selection: id_name(),
        });
        assert_eq!(build_document(None, &root, &compact()), "{__typename,... on Human{id,name}}");
    }

    /// parse `literal` as an argument value and compare it with `value`
    fn round_trips(literal: &str, value: &InputValue) -> bool {
        let text = format!("{{f(a:{literal})}}");
        let document = graphql_parser::parse_query::<String>(&text).unwrap();
        let Some(Definition::Operation(OperationDefinition::SelectionSet(set))) =
            document.definitions.first()
        else {
            panic!("expected a selection set");
        };
        let Some(ParsedSelection::Field(field)) = set.items.first() else {
            panic!("expected a field");
        };
        equivalent(&field.arguments[0].1, value)
    }

    fn equivalent(parsed: &Value<'_, String>, value: &InputValue) -> bool {
        match (parsed, value) {
            (Value::Null, InputValue::Null) => true,
            (Value::Boolean(a), InputValue::Boolean(b)) => a == b,
            (Value::Int(a), InputValue::Int(b)) => a.as_i64() == Some(*b),
            (Value::Float(a), InputValue::Float(b)) => a == b,
            (Value::String(a), InputValue::String(b)) => a == b,
            (Value::Enum(a), InputValue::Enum(b)) => a == b,
            (Value::Variable(a), InputValue::Variable(b)) => *a == b.name,
            (Value::List(a), InputValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| equivalent(a, b))
            }
            (Value::Object(a), InputValue::Object(b)) => {
                a.len() == b.len()
                    && b.iter().all(|property| {
                        a.get(&property.name)
                            .is_some_and(|parsed| equivalent(parsed, &property.value))
                    })
            }
            _ => false,
        }
    }

    #[test]
    fn test_non_finite_floats_encode_as_null() {
        assert_eq!(encode(&f64::NAN.to_input_value()), "null");
        assert_eq!(encode(&f64::INFINITY.to_input_value()), "null");
        assert_eq!(encode(&f32::NEG_INFINITY.to_input_value()), "null");
    }

    #[test]
    fn test_literals_round_trip_through_parser() {
        let values = vec![
            InputValue::String("line\nbreak \"quoted\" back\\slash\ttab".to_string()),
            InputValue::Int(-17),
            InputValue::Float(2.5),
            InputValue::Float(1.0),
            InputValue::Float(-3e20),
            InputValue::Boolean(true),
            InputValue::Null,
            InputValue::Enum("ACTIVE".to_string()),
            InputValue::List(vec![InputValue::Int(1), InputValue::String("two".to_string())]),
            InputValue::Object(vec![
                Argument::new("stars", &5),
                Argument::new(
                    "nested",
                    &InputValue::Object(vec![Argument::new("tags", &vec!["x", "y"])]),
                ),
            ]),
        ];
        for options in [compact(), indented()] {
            for value in &values {
                let mut literal = String::new();
                encode_value(value, None, &options, 1, &mut literal);
                assert!(round_trips(&literal, value), "{literal} did not round-trip");
            }
        }
    }
}

//! selection builder members
//!
//! every complex type gets a builder struct holding a runtime selection, a
//! static metadata record the planner walks, and one family of `with_*`
//! methods per field.

use super::{ArgumentField, Code, Context, Member};
use crate::error::Result;
use crate::naming;
use crate::schema::{Field, RootOperation, SchemaType, TypeKind};
use std::collections::HashSet;

/// names the builder already gets from the runtime trait or its own impl
const RESERVED_METHODS: [&str; 15] = [
    "new",
    "metadata",
    "selection",
    "selection_mut",
    "into_selection",
    "operation_name",
    "with_operation_name",
    "with_all_fields",
    "with_all_scalar_fields",
    "with_scalar_field",
    "with_object_field",
    "with_fragment",
    "except_field",
    "with_type_name",
    "build",
];

/// parameter names used by the generated method bodies
const RESERVED_PARAMS: [&str; 5] = ["self", "builder", "options", "arguments", "value"];

pub(super) fn emit_builder(ctx: &Context<'_>, ty: &SchemaType) -> Result<Member> {
    let rt = ctx.rt;
    let name = ctx.builder_name(&ty.name)?;
    let metadata = ctx.metadata_static(&ty.name)?;
    let operation = ctx.index.schema().root_operation(&ty.name);

    // unions select through fragments only
    let fields = match ty.kind {
        TypeKind::Union => Vec::new(),
        _ => ctx.selected_fields(ty)?,
    };
    let fragments = match ty.kind {
        TypeKind::Interface | TypeKind::Union => ctx.index.possible_types(ty)?,
        _ => Vec::new(),
    };

    let mut methods = MethodNames::default();
    let mut code = ctx.code();

    match ty.description.as_deref() {
        Some(description) if !description.trim().is_empty() => code.doc(0, Some(description)),
        _ => code.line(0, format!("/// selection builder for `{}`", ty.name)),
    }
    code.line(0, "#[derive(Debug, Clone, Default)]");
    code.line(0, format!("pub struct {name} {{"));
    code.line(1, format!("selection: {rt}::Selection,"));
    if operation.is_some() {
        code.line(1, "operation_name: Option<String>,");
    }
    code.line(0, "}");
    code.blank();

    code.line(0, format!("pub static {metadata}: {rt}::TypeMetadata = {rt}::TypeMetadata {{"));
    code.line(1, format!("type_name: {},", naming::string_literal(&ty.name)));
    match operation {
        Some(kind) => code.line(
            1,
            format!("operation: Some({rt}::OperationKind::{}),", operation_variant(kind)),
        ),
        None => code.line(1, "operation: None,"),
    }
    if fields.is_empty() {
        code.line(1, "fields: &[],");
    } else {
        code.line(1, "fields: &[");
        for field in &fields {
            code.line(2, format!("{},", field_metadata(ctx, ty, field)?));
        }
        code.line(1, "],");
    }
    if fragments.is_empty() {
        code.line(1, "fragments: &[],");
    } else {
        code.line(1, "fragments: &[");
        for fragment in &fragments {
            code.line(
                2,
                format!("<{} as {rt}::QueryBuilder>::metadata,", ctx.builder_name(&fragment.name)?),
            );
        }
        code.line(1, "],");
    }
    code.line(0, "};");
    code.blank();

    code.line(0, format!("impl {rt}::QueryBuilder for {name} {{"));
    code.line(1, format!("fn metadata() -> &'static {rt}::TypeMetadata {{"));
    code.line(2, format!("&{metadata}"));
    code.line(1, "}");
    code.blank();
    code.line(1, format!("fn selection(&self) -> &{rt}::Selection {{"));
    code.line(2, "&self.selection");
    code.line(1, "}");
    code.blank();
    code.line(1, format!("fn selection_mut(&mut self) -> &mut {rt}::Selection {{"));
    code.line(2, "&mut self.selection");
    code.line(1, "}");
    code.blank();
    code.line(1, format!("fn into_selection(self) -> {rt}::Selection {{"));
    code.line(2, "self.selection");
    code.line(1, "}");
    if operation.is_some() {
        code.blank();
        code.line(1, "fn operation_name(&self) -> Option<&str> {");
        code.line(2, "self.operation_name.as_deref()");
        code.line(1, "}");
    }
    code.line(0, "}");
    code.blank();

    code.line(0, format!("impl {name} {{"));
    code.line(1, "pub fn new() -> Self {");
    code.line(2, "Self::default()");
    code.line(1, "}");
    if operation.is_some() {
        code.blank();
        code.line(1, "/// name emitted in the operation signature");
        code.line(1, "pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {");
        code.line(2, "self.operation_name = Some(name.into());");
        code.line(2, "self");
        code.line(1, "}");
    }

    let idents = super::member_idents(fields.iter().map(|field| field.name.as_str()))?;
    for (field, ident) in fields.iter().zip(&idents) {
        let stem = methods.field_stem(naming::unraw(ident));
        field_methods(ctx, &mut code, ty, field, &stem)?;
    }

    for fragment in &fragments {
        let snake = naming::module_name(&fragment.name);
        let method = methods.unique(&format!("with_{}_fragment", snake.trim_end_matches('_')));
        let builder = ctx.builder_name(&fragment.name)?;
        code.blank();
        code.line(1, format!("/// select fields of `{}` when the value is one", fragment.name));
        code.line(1, format!("pub fn {method}(self, builder: {builder}) -> Self {{"));
        code.line(2, format!("{rt}::QueryBuilder::with_fragment(self, builder)"));
        code.line(1, "}");
    }
    code.line(0, "}");

    Ok(Member {
        name,
        content: code.finish(),
    })
}

fn operation_variant(kind: RootOperation) -> &'static str {
    match kind {
        RootOperation::Query => "Query",
        RootOperation::Mutation => "Mutation",
        RootOperation::Subscription => "Subscription",
    }
}

fn field_metadata(ctx: &Context<'_>, owner: &SchemaType, field: &Field) -> Result<String> {
    let rt = ctx.rt;
    let target = ctx.index.resolve_ref(&owner.name, &field.name, &field.field_type)?;
    let name = naming::string_literal(&field.name);
    let mut out = if target.kind.is_complex() {
        format!(
            "{rt}::FieldMetadata::object({name}, <{} as {rt}::QueryBuilder>::metadata)",
            ctx.builder_name(&target.name)?
        )
    } else if field.field_type.is_list() {
        format!("{rt}::FieldMetadata::scalar_list({name})")
    } else {
        format!("{rt}::FieldMetadata::scalar({name})")
    };
    if field.requires_arguments() {
        out.push_str(".requiring_parameters()");
    }
    Ok(out)
}

/// `with_x`, `with_x_options`, and `except_x` for one field
fn field_methods(
    ctx: &Context<'_>,
    code: &mut Code,
    owner: &SchemaType,
    field: &Field,
    stem: &str,
) -> Result<()> {
    let rt = ctx.rt;
    let target = ctx.index.resolve_ref(&owner.name, &field.name, &field.field_type)?;
    let builder = if target.kind.is_complex() {
        Some(ctx.builder_name(&target.name)?)
    } else {
        None
    };
    let arguments = ctx.argument_fields(&owner.name, &field.args)?;
    let params = parameter_idents(&arguments);

    let mut signature = Vec::new();
    let mut forward = Vec::new();
    if let Some(builder) = &builder {
        signature.push(format!("builder: {builder}"));
        forward.push("builder".to_string());
    }
    for (argument, param) in arguments.iter().zip(&params) {
        let ty = argument.parameter_type(rt);
        if argument.is_required() {
            signature.push(format!("{param}: impl Into<{ty}>"));
        } else {
            signature.push(format!("{param}: Option<{ty}>"));
        }
        forward.push(param.clone());
    }
    forward.push(format!("{rt}::FieldOptions::new()"));

    code.blank();
    code.doc(1, field.description.as_deref());
    if field.is_deprecated {
        let reason = field.deprecation_reason.as_deref().unwrap_or("no longer supported");
        code.line(1, format!("/// deprecated: {reason}"));
    }
    code.line(
        1,
        format!("pub fn with_{stem}({}) -> Self {{", receiver_and(&signature)),
    );
    code.line(2, format!("self.with_{stem}_options({})", forward.join(", ")));
    code.line(1, "}");

    signature.push(format!("options: {rt}::FieldOptions"));
    code.blank();
    code.line(
        1,
        format!("pub fn with_{stem}_options({}) -> Self {{", receiver_and(&signature)),
    );
    let args_expr = if arguments.is_empty() {
        "Vec::new()"
    } else {
        code.line(2, "let mut arguments = Vec::new();");
        for (argument, param) in arguments.iter().zip(&params) {
            if argument.is_required() {
                code.line(
                    2,
                    format!("let {param}: {} = {param}.into();", argument.parameter_type(rt)),
                );
                code.line(
                    2,
                    format!("arguments.push({});", argument.argument_expr(rt, &format!("&{param}"))),
                );
            } else {
                code.line(2, format!("if let Some(value) = &{param} {{"));
                code.line(3, format!("arguments.push({});", argument.argument_expr(rt, "value")));
                code.line(2, "}");
            }
        }
        "arguments"
    };
    let name = naming::string_literal(&field.name);
    match builder {
        Some(_) => code.line(
            2,
            format!("{rt}::QueryBuilder::with_object_field(self, {name}, builder, options, {args_expr})"),
        ),
        None => code.line(
            2,
            format!("{rt}::QueryBuilder::with_scalar_field(self, {name}, options, {args_expr})"),
        ),
    }
    code.line(1, "}");

    code.blank();
    code.line(1, format!("pub fn except_{stem}(self) -> Self {{"));
    code.line(2, format!("{rt}::QueryBuilder::except_field(self, {name})"));
    code.line(1, "}");
    Ok(())
}

fn receiver_and(params: &[String]) -> String {
    std::iter::once("self".to_string())
        .chain(params.iter().cloned())
        .collect::<Vec<_>>()
        .join(", ")
}

/// argument identifiers that cannot shadow the method body's own names
fn parameter_idents(arguments: &[ArgumentField<'_>]) -> Vec<String> {
    let mut used: HashSet<String> = RESERVED_PARAMS.iter().map(|name| name.to_string()).collect();
    arguments
        .iter()
        .map(|argument| {
            let raw = naming::unraw(&argument.ident).trim_end_matches('_');
            let mut ident = if RESERVED_PARAMS.contains(&raw) {
                format!("{raw}_arg")
            } else {
                argument.ident.clone()
            };
            let mut n = 2;
            while !used.insert(naming::unraw(&ident).to_string()) {
                ident = format!("{raw}_arg{n}");
                n += 1;
            }
            ident
        })
        .collect()
}

/// tracks method names of one builder impl
#[derive(Default)]
struct MethodNames {
    used: HashSet<String>,
}

impl MethodNames {
    /// a stem whose `with_`, `with_*_options`, and `except_` forms are all free
    fn field_stem(&mut self, base: &str) -> String {
        let mut stem = base.to_string();
        let mut n = 2;
        loop {
            let names = [
                format!("with_{stem}"),
                format!("with_{stem}_options"),
                format!("except_{stem}"),
            ];
            let free = names.iter().all(|name| {
                !self.used.contains(name) && !RESERVED_METHODS.contains(&name.as_str())
            });
            if free {
                self.used.extend(names);
                return stem;
            }
            stem = if n == 2 {
                format!("{base}_field")
            } else {
                format!("{base}_field{n}")
            };
            n += 1;
        }
    }

    fn unique(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 2;
        while RESERVED_METHODS.contains(&name.as_str()) || !self.used.insert(name.clone()) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::emit::tests::render_member;
    use crate::emit::Phase;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const SDL: &str = r#"
        type Query {
            "look up a hero"
            hero(episode: Episode, id: ID!): Character
            search(text: String!): [SearchResult!]!
            typeName: String
        }

        enum Episode { NEWHOPE EMPIRE }

        interface Character { id: ID! name: String friends: [Character] }

        type Human implements Character { id: ID! name: String friends: [Character] height(unit: String = "METER"): Float }

        type Droid implements Character { id: ID! name: String friends: [Character] tags: [String!] }

        union SearchResult = Human | Droid
    "#;

    fn builder(name: &str) -> String {
        render_member(SDL, &GeneratorConfig::default(), Phase::QueryBuilders, name)
    }

    #[test]
    fn test_object_builder_member() {
        let member = builder("DroidQueryBuilder");
        assert_eq!(
            member,
            indoc! {r#"
                /// selection builder for `Droid`
                #[derive(Debug, Clone, Default)]
                pub struct DroidQueryBuilder {
                    selection: ::gqlforge::runtime::Selection,
                }

                pub static DROID_QUERY_BUILDER_METADATA: ::gqlforge::runtime::TypeMetadata = ::gqlforge::runtime::TypeMetadata {
                    type_name: "Droid",
                    operation: None,
                    fields: &[
                        ::gqlforge::runtime::FieldMetadata::scalar("id"),
                        ::gqlforge::runtime::FieldMetadata::scalar("name"),
                        ::gqlforge::runtime::FieldMetadata::object("friends", <CharacterQueryBuilder as ::gqlforge::runtime::QueryBuilder>::metadata),
                        ::gqlforge::runtime::FieldMetadata::scalar_list("tags"),
                    ],
                    fragments: &[],
                };

                impl ::gqlforge::runtime::QueryBuilder for DroidQueryBuilder {
                    fn metadata() -> &'static ::gqlforge::runtime::TypeMetadata {
                        &DROID_QUERY_BUILDER_METADATA
                    }

                    fn selection(&self) -> &::gqlforge::runtime::Selection {
                        &self.selection
                    }

                    fn selection_mut(&mut self) -> &mut ::gqlforge::runtime::Selection {
                        &mut self.selection
                    }

                    fn into_selection(self) -> ::gqlforge::runtime::Selection {
                        self.selection
                    }
                }

                impl DroidQueryBuilder {
                    pub fn new() -> Self {
                        Self::default()
                    }

                    pub fn with_id(self) -> Self {
                        self.with_id_options(::gqlforge::runtime::FieldOptions::new())
                    }

                    pub fn with_id_options(self, options: ::gqlforge::runtime::FieldOptions) -> Self {
                        ::gqlforge::runtime::QueryBuilder::with_scalar_field(self, "id", options, Vec::new())
                    }

                    pub fn except_id(self) -> Self {
                        ::gqlforge::runtime::QueryBuilder::except_field(self, "id")
                    }

                    pub fn with_name(self) -> Self {
                        self.with_name_options(::gqlforge::runtime::FieldOptions::new())
                    }

                    pub fn with_name_options(self, options: ::gqlforge::runtime::FieldOptions) -> Self {
                        ::gqlforge::runtime::QueryBuilder::with_scalar_field(self, "name", options, Vec::new())
                    }

                    pub fn except_name(self) -> Self {
                        ::gqlforge::runtime::QueryBuilder::except_field(self, "name")
                    }

                    pub fn with_friends(self, builder: CharacterQueryBuilder) -> Self {
                        self.with_friends_options(builder, ::gqlforge::runtime::FieldOptions::new())
                    }

                    pub fn with_friends_options(self, builder: CharacterQueryBuilder, options: ::gqlforge::runtime::FieldOptions) -> Self {
                        ::gqlforge::runtime::QueryBuilder::with_object_field(self, "friends", builder, options, Vec::new())
                    }

                    pub fn except_friends(self) -> Self {
                        ::gqlforge::runtime::QueryBuilder::except_field(self, "friends")
                    }

                    pub fn with_tags(self) -> Self {
                        self.with_tags_options(::gqlforge::runtime::FieldOptions::new())
                    }

                    pub fn with_tags_options(self, options: ::gqlforge::runtime::FieldOptions) -> Self {
                        ::gqlforge::runtime::QueryBuilder::with_scalar_field(self, "tags", options, Vec::new())
                    }

                    pub fn except_tags(self) -> Self {
                        ::gqlforge::runtime::QueryBuilder::except_field(self, "tags")
                    }
                }
            "#}
        );
    }

    #[test]
    fn test_root_builder_arguments() {
        let member = builder("QueryQueryBuilder");
        assert!(member.contains("operation_name: Option<String>,"));
        assert!(member.contains("operation: Some(::gqlforge::runtime::OperationKind::Query),"));
        assert!(member.contains(
            "::gqlforge::runtime::FieldMetadata::object(\"hero\", <CharacterQueryBuilder as ::gqlforge::runtime::QueryBuilder>::metadata).requiring_parameters(),"
        ));
        assert!(member.contains(
            "pub fn with_hero(self, builder: CharacterQueryBuilder, episode: Option<::gqlforge::runtime::Parameter<Episode>>, id: impl Into<::gqlforge::runtime::Parameter<String>>) -> Self {"
        ));
        assert!(member.contains("self.with_hero_options(builder, episode, id, ::gqlforge::runtime::FieldOptions::new())"));
        assert!(member.contains("    /// look up a hero\n    pub fn with_hero("));
        assert!(member.contains(concat!(
            "        let mut arguments = Vec::new();\n",
            "        if let Some(value) = &episode {\n",
            "            arguments.push(::gqlforge::runtime::Argument::new(\"episode\", value));\n",
            "        }\n",
            "        let id: ::gqlforge::runtime::Parameter<String> = id.into();\n",
            "        arguments.push(::gqlforge::runtime::Argument::new(\"id\", &id));\n",
        )));
        assert!(member.contains("pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {"));
        // `with_type_name` belongs to the runtime trait
        assert!(member.contains("pub fn with_type_name_field(self) -> Self {"));
        assert!(member.contains("pub fn except_type_name_field(self) -> Self {"));
    }

    #[test]
    fn test_abstract_builders_use_fragments() {
        let member = builder("CharacterQueryBuilder");
        assert!(member.contains(concat!(
            "    fragments: &[\n",
            "        <HumanQueryBuilder as ::gqlforge::runtime::QueryBuilder>::metadata,\n",
            "        <DroidQueryBuilder as ::gqlforge::runtime::QueryBuilder>::metadata,\n",
            "    ],\n",
        )));
        assert!(member.contains("pub fn with_human_fragment(self, builder: HumanQueryBuilder) -> Self {"));
        assert!(member.contains("pub fn with_id(self) -> Self {"));

        let member = builder("SearchResultQueryBuilder");
        assert!(member.contains("fields: &[],"));
        assert!(!member.contains("pub fn with_id"));
        assert!(member.contains("pub fn with_droid_fragment(self, builder: DroidQueryBuilder) -> Self {"));
    }

    #[test]
    fn test_reserved_parameter_names() {
        let sdl = "type Query { item(value: Int, builder: String, options: Int!): Int }";
        let member = render_member(sdl, &GeneratorConfig::default(), Phase::QueryBuilders, "QueryQueryBuilder");
        assert!(member.contains(
            "pub fn with_item(self, value_arg: Option<::gqlforge::runtime::Parameter<i32>>, builder_arg: Option<::gqlforge::runtime::Parameter<String>>, options_arg: impl Into<::gqlforge::runtime::Parameter<i32>>) -> Self {"
        ));
        assert!(member.contains("if let Some(value) = &value_arg {"));
    }
}

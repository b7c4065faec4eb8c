//! shared runtime registry and type-name constants

use super::{Context, Member};
use crate::error::Result;
use crate::naming;
use std::collections::HashSet;

/// static lookup from schema type name to builder metadata
pub(super) fn emit_runtime(ctx: &Context<'_>) -> Result<Member> {
    let mut code = ctx.code();
    code.line(0, "/// builder metadata of a complex type, by schema name");
    code.line(
        0,
        format!(
            "pub fn query_builder_metadata(type_name: &str) -> Option<&'static {}::TypeMetadata> {{",
            ctx.rt
        ),
    );
    code.line(1, "match type_name {");
    for ty in &ctx.complex {
        code.line(
            2,
            format!(
                "{} => Some(&{}),",
                naming::string_literal(&ty.name),
                ctx.metadata_static(&ty.name)?
            ),
        );
    }
    code.line(2, "_ => None,");
    code.line(1, "}");
    code.line(0, "}");

    Ok(Member {
        name: "runtime".to_string(),
        content: code.finish(),
    })
}

/// one string constant per generated schema type
pub(super) fn emit_type_names(ctx: &Context<'_>) -> Result<Member> {
    let mut code = ctx.code();
    code.line(0, "/// schema names of the generated types");
    code.line(0, "pub struct GraphQlTypes;");
    code.blank();
    code.line(0, "impl GraphQlTypes {");

    let mut used = HashSet::new();
    for ty in ctx.index.schema().generated_types() {
        let base = naming::constant_name(&ty.name);
        let mut constant = base.clone();
        let mut n = 2;
        while !used.insert(constant.clone()) {
            constant = format!("{base}_{n}");
            n += 1;
        }
        naming::ensure_identifier(&constant)?;
        code.line(
            1,
            format!(
                "pub const {constant}: &'static str = {};",
                naming::string_literal(&ty.name)
            ),
        );
    }
    code.line(0, "}");

    Ok(Member {
        name: "type_names".to_string(),
        content: code.finish(),
    })
}

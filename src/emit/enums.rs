//! enum members

use super::{Context, Member};
use crate::error::Result;
use crate::naming;
use crate::schema::SchemaType;
use std::collections::HashSet;

pub(super) fn emit_enum(ctx: &Context<'_>, ty: &SchemaType) -> Result<Member> {
    let name = ctx.class_name(&ty.name)?;
    let rt = ctx.rt;

    let values: Vec<_> = ty
        .enum_values()
        .iter()
        .filter(|value| ctx.config.include_deprecated || !value.is_deprecated)
        .collect();

    let mut used = HashSet::new();
    let mut variants = Vec::with_capacity(values.len());
    for value in &values {
        let base = naming::variant_name(&value.name);
        let mut variant = base.clone();
        let mut n = 2;
        while !used.insert(variant.clone()) {
            variant = format!("{base}{n}");
            n += 1;
        }
        naming::ensure_identifier(&variant)?;
        variants.push(variant);
    }

    let mut code = ctx.code();
    code.doc(0, ty.description.as_deref());
    code.line(
        0,
        "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]",
    );
    code.line(0, format!("pub enum {name} {{"));
    for (value, variant) in values.iter().zip(&variants) {
        code.doc(1, value.description.as_deref());
        if value.is_deprecated {
            let reason = value.deprecation_reason.as_deref().unwrap_or("no longer supported");
            code.line(1, format!("/// deprecated: {reason}"));
        }
        if variant != &value.name {
            code.line(
                1,
                format!("#[serde(rename = {})]", naming::string_literal(&value.name)),
            );
        }
        code.line(1, format!("{variant},"));
    }
    code.line(0, "}");
    code.blank();

    code.line(0, format!("impl {name} {{"));
    code.line(1, "/// the value as it appears on the wire");
    code.line(1, "pub fn wire_name(self) -> &'static str {");
    code.line(2, "match self {");
    for (value, variant) in values.iter().zip(&variants) {
        code.line(
            3,
            format!("Self::{variant} => {},", naming::string_literal(&value.name)),
        );
    }
    code.line(2, "}");
    code.line(1, "}");
    code.line(0, "}");
    code.blank();

    code.line(0, format!("impl {rt}::ToInputValue for {name} {{"));
    code.line(1, format!("fn to_input_value(&self) -> {rt}::InputValue {{"));
    code.line(2, format!("{rt}::InputValue::Enum(self.wire_name().to_string())"));
    code.line(1, "}");
    code.line(0, "}");

    Ok(Member {
        name,
        content: code.finish(),
    })
}

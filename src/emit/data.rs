//! response data members

use super::{member_idents, Context, Member};
use crate::error::Result;
use crate::naming;
use crate::scalar::Usage;
use crate::schema::SchemaType;

/// member holding the concrete type name of an abstract value
const TYPE_NAME_MEMBER: &str = "graphql_type_name";

pub(super) fn emit_data(ctx: &Context<'_>, ty: &SchemaType) -> Result<Member> {
    let rt = ctx.rt;
    let name = ctx.class_name(&ty.name)?;
    let is_abstract = ty.kind.is_abstract();
    let fields: Vec<_> = ctx
        .index
        .data_fields(ty)?
        .into_iter()
        .filter(|field| ctx.config.include_deprecated || !field.is_deprecated)
        .collect();

    let reserved = is_abstract.then_some(TYPE_NAME_MEMBER);
    let mut idents = member_idents(reserved.into_iter().chain(fields.iter().map(|field| field.name.as_str())))?;
    if is_abstract {
        idents.remove(0);
    }

    let mut code = ctx.code();
    code.doc(0, ty.description.as_deref());
    code.line(
        0,
        "#[derive(Debug, Clone, Default, ::serde::Serialize, ::serde::Deserialize)]",
    );
    code.line(0, format!("pub struct {name} {{"));
    if is_abstract {
        code.line(1, "/// concrete type of the value, when `__typename` was selected");
        code.line(1, "#[serde(rename = \"__typename\")]");
        code.line(1, format!("pub {TYPE_NAME_MEMBER}: Option<String>,"));
    }
    for (field, ident) in fields.iter().zip(&idents) {
        let rendered = ctx
            .mapper
            .rust_type(&ty.name, &field.name, &field.field_type, Usage::Data)?;
        code.doc(1, field.description.as_deref());
        if field.is_deprecated {
            let reason = field.deprecation_reason.as_deref().unwrap_or("no longer supported");
            code.line(1, format!("/// deprecated: {reason}"));
        }
        if naming::unraw(ident) != field.name {
            code.line(1, format!("#[serde(rename = {})]", naming::string_literal(&field.name)));
        }
        if !rendered.nullable {
            code.line(
                1,
                format!("#[serde(default, deserialize_with = \"{rt}::null_as_default\")]"),
            );
        }
        code.line(1, format!("pub {ident}: {},", rendered.type_name));
    }
    code.line(0, "}");

    Ok(Member {
        name,
        content: code.finish(),
    })
}

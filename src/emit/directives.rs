//! directive members
//!
//! each directive usable on a selection becomes a small value type that
//! converts into a runtime clause.

use super::{Context, Member};
use crate::error::Result;
use crate::naming;
use crate::schema::Directive;

pub(super) fn emit_directive(ctx: &Context<'_>, directive: &Directive) -> Result<Member> {
    let name = format!("{}Directive", naming::pascal_case(&directive.name));
    naming::ensure_identifier(&name)?;
    let rt = ctx.rt;
    let owner = format!("@{}", directive.name);
    let fields = ctx.argument_fields(&owner, &directive.args)?;

    let mut code = ctx.code();
    code.doc(0, directive.description.as_deref());
    code.line(0, format!("/// `@{}`", directive.name));
    code.line(0, "#[derive(Debug, Clone)]");
    code.line(0, format!("pub struct {name} {{"));
    for field in &fields {
        code.doc(1, field.arg.description.as_deref());
        let ty = field.parameter_type(rt);
        if field.is_required() {
            code.line(1, format!("pub {}: {ty},", field.ident));
        } else {
            code.line(1, format!("pub {}: Option<{ty}>,", field.ident));
        }
    }
    code.line(0, "}");
    code.blank();

    let params: Vec<_> = fields
        .iter()
        .filter(|field| field.is_required())
        .map(|field| format!("{}: impl Into<{}>", field.ident, field.parameter_type(rt)))
        .collect();
    code.line(0, format!("impl {name} {{"));
    code.line(1, format!("pub fn new({}) -> Self {{", params.join(", ")));
    code.line(2, "Self {");
    for field in &fields {
        if field.is_required() {
            code.line(3, format!("{0}: {0}.into(),", field.ident));
        } else {
            code.line(3, format!("{}: None,", field.ident));
        }
    }
    code.line(2, "}");
    code.line(1, "}");
    for field in fields.iter().filter(|field| !field.is_required()) {
        code.blank();
        code.line(
            1,
            format!(
                "pub fn with_{}(mut self, value: impl Into<{}>) -> Self {{",
                naming::unraw(&field.ident),
                field.parameter_type(rt)
            ),
        );
        code.line(2, format!("self.{} = Some(value.into());", field.ident));
        code.line(2, "self");
        code.line(1, "}");
    }
    code.line(0, "}");
    code.blank();

    code.line(0, format!("impl {rt}::QueryDirective for {name} {{"));
    code.line(1, format!("fn into_clause(self) -> {rt}::DirectiveClause {{"));
    if fields.is_empty() {
        code.line(2, format!("{rt}::DirectiveClause::new({}, Vec::new())", naming::string_literal(&directive.name)));
    } else {
        code.line(2, "let mut arguments = Vec::new();");
        for field in &fields {
            if field.is_required() {
                code.line(
                    2,
                    format!("arguments.push({});", field.argument_expr(rt, &format!("&self.{}", field.ident))),
                );
            } else {
                code.line(2, format!("if let Some(value) = &self.{} {{", field.ident));
                code.line(3, format!("arguments.push({});", field.argument_expr(rt, "value")));
                code.line(2, "}");
            }
        }
        code.line(
            2,
            format!("{rt}::DirectiveClause::new({}, arguments)", naming::string_literal(&directive.name)),
        );
    }
    code.line(1, "}");
    code.line(0, "}");

    Ok(Member {
        name,
        content: code.finish(),
    })
}

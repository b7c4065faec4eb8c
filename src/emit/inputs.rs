//! input object members

use super::{argument_expr, member_idents, Context, Member};
use crate::error::Result;
use crate::scalar::Usage;
use crate::schema::SchemaType;

pub(super) fn emit_input(ctx: &Context<'_>, ty: &SchemaType) -> Result<Member> {
    let rt = ctx.rt;
    let name = ctx.class_name(&ty.name)?;
    let fields = ty.input_fields();
    let idents = member_idents(fields.iter().map(|field| field.name.as_str()))?;

    let mut properties = Vec::with_capacity(fields.len());
    for (field, ident) in fields.iter().zip(idents) {
        let rendered = ctx
            .mapper
            .rust_type(&ty.name, &field.name, &field.value_type, Usage::Input)?;
        // unset is modelled by the outer option of the member itself
        let value_type = match rendered.nullable {
            true => strip_option(&rendered.type_name).to_string(),
            false => rendered.type_name,
        };
        properties.push((field, ident, value_type, rendered.format_mask));
    }

    let mut code = ctx.code();
    code.doc(0, ty.description.as_deref());
    code.line(0, "#[derive(Debug, Clone, Default)]");
    code.line(0, format!("pub struct {name} {{"));
    for (field, ident, value_type, _) in &properties {
        code.doc(1, field.description.as_deref());
        code.line(1, format!("pub {ident}: Option<{rt}::Parameter<{value_type}>>,"));
    }
    code.line(0, "}");
    code.blank();

    code.line(0, format!("impl {name} {{"));
    code.line(1, "pub fn new() -> Self {");
    code.line(2, "Self::default()");
    code.line(1, "}");
    for (_, ident, value_type, _) in &properties {
        code.blank();
        code.line(
            1,
            format!(
                "pub fn with_{}(mut self, value: impl Into<{rt}::Parameter<{value_type}>>) -> Self {{",
                crate::naming::unraw(ident)
            ),
        );
        code.line(2, format!("self.{ident} = Some(value.into());"));
        code.line(2, "self");
        code.line(1, "}");
    }
    code.line(0, "}");
    code.blank();

    code.line(0, format!("impl {rt}::InputObject for {name} {{"));
    code.line(1, format!("fn properties(&self) -> Vec<{rt}::Argument> {{"));
    if properties.is_empty() {
        code.line(2, "Vec::new()");
    } else {
        code.line(2, "let mut properties = Vec::new();");
        for (field, ident, _, mask) in &properties {
            code.line(2, format!("if let Some(value) = &self.{ident} {{"));
            code.line(
                3,
                format!(
                    "properties.push({});",
                    argument_expr(rt, &field.name, "value", mask.as_deref())
                ),
            );
            code.line(2, "}");
        }
        code.line(2, "properties");
    }
    code.line(1, "}");
    code.line(0, "}");
    code.blank();

    code.line(0, format!("impl {rt}::ToInputValue for {name} {{"));
    code.line(1, format!("fn to_input_value(&self) -> {rt}::InputValue {{"));
    code.line(2, format!("{rt}::InputValue::Object({rt}::InputObject::properties(self))"));
    code.line(1, "}");
    code.line(0, "}");

    Ok(Member {
        name,
        content: code.finish(),
    })
}

fn strip_option(type_name: &str) -> &str {
    type_name
        .strip_prefix("Option<")
        .and_then(|inner| inner.strip_suffix('>'))
        .unwrap_or(type_name)
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
        type Query { reviews(filter: ReviewFilter): [String] }

        "a review to submit"
        input ReviewInput {
            stars: Int!
            "optional text"
            commentary: String
            createdAt: String
            tags: [String!]
        }

        input ReviewFilter { and: ReviewFilter type: String }
    "#;

    #[test]
    fn test_input_member() {
        let member = render_member(SDL, &GeneratorConfig::default(), Phase::InputObjects, "ReviewInput");
        assert_eq!(
            member,
            indoc! {r#"
                /// a review to submit
                #[derive(Debug, Clone, Default)]
                pub struct ReviewInput {
                    pub stars: Option<::gqlforge::runtime::Parameter<i32>>,
                    /// optional text
                    pub commentary: Option<::gqlforge::runtime::Parameter<String>>,
                    pub created_at: Option<::gqlforge::runtime::Parameter<::chrono::DateTime<::chrono::FixedOffset>>>,
                    pub tags: Option<::gqlforge::runtime::Parameter<Vec<String>>>,
                }

                impl ReviewInput {
                    pub fn new() -> Self {
                        Self::default()
                    }

                    pub fn with_stars(mut self, value: impl Into<::gqlforge::runtime::Parameter<i32>>) -> Self {
                        self.stars = Some(value.into());
                        self
                    }

                    pub fn with_commentary(mut self, value: impl Into<::gqlforge::runtime::Parameter<String>>) -> Self {
                        self.commentary = Some(value.into());
                        self
                    }

                    pub fn with_created_at(mut self, value: impl Into<::gqlforge::runtime::Parameter<::chrono::DateTime<::chrono::FixedOffset>>>) -> Self {
                        self.created_at = Some(value.into());
                        self
                    }

                    pub fn with_tags(mut self, value: impl Into<::gqlforge::runtime::Parameter<Vec<String>>>) -> Self {
                        self.tags = Some(value.into());
                        self
                    }
                }

                impl ::gqlforge::runtime::InputObject for ReviewInput {
                    fn properties(&self) -> Vec<::gqlforge::runtime::Argument> {
                        let mut properties = Vec::new();
                        if let Some(value) = &self.stars {
                            properties.push(::gqlforge::runtime::Argument::new("stars", value));
                        }
                        if let Some(value) = &self.commentary {
                            properties.push(::gqlforge::runtime::Argument::new("commentary", value));
                        }
                        if let Some(value) = &self.created_at {
                            properties.push(::gqlforge::runtime::Argument::new("createdAt", value));
                        }
                        if let Some(value) = &self.tags {
                            properties.push(::gqlforge::runtime::Argument::new("tags", value));
                        }
                        properties
                    }
                }

                impl ::gqlforge::runtime::ToInputValue for ReviewInput {
                    fn to_input_value(&self) -> ::gqlforge::runtime::InputValue {
                        ::gqlforge::runtime::InputValue::Object(::gqlforge::runtime::InputObject::properties(self))
                    }
                }
            "#}
        );
    }

    #[test]
    fn test_self_referencing_input_is_boxed() {
        let member = render_member(SDL, &GeneratorConfig::default(), Phase::InputObjects, "ReviewFilter");
        assert!(member.contains("pub and: Option<::gqlforge::runtime::Parameter<Box<ReviewFilter>>>,"));
        assert!(member.contains("pub r#type: Option<::gqlforge::runtime::Parameter<String>>,"));
        assert!(member.contains("pub fn with_type(mut self"));
        assert!(member.contains("self.r#type = Some(value.into());"));
    }

    #[test]
    fn test_strip_option() {
        assert_eq!(strip_option("Option<Vec<Option<i32>>>"), "Vec<Option<i32>>");
        assert_eq!(strip_option("String"), "String");
    }
}

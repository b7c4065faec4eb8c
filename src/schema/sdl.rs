//! sdl front end
//!
//! builds the schema model from schema definition text, so a checked-in
//! `schema.graphql` works as well as an introspection result.

use super::{
    Argument, Directive, DirectiveLocation, EnumValue, Field, FieldTypeRef, NamedRef, Schema,
    SchemaType, TypeKind, BUILTIN_DIRECTIVES, BUILTIN_SCALARS,
};
use crate::error::{Error, Result};
use graphql_parser::schema::{
    parse_schema, Definition, Document, InputValue, Type, TypeDefinition, TypeExtension,
};
use std::collections::{BTreeMap, HashMap};

/// parse sdl text into a schema model
pub fn parse(sdl: &str) -> Result<Schema> {
    let document = parse_schema::<String>(sdl).map_err(|err| Error::Sdl(err.to_string()))?;
    from_document(&document)
}

/// convert a parsed sdl document
pub fn from_document(document: &Document<'_, String>) -> Result<Schema> {
    let mut kinds: HashMap<String, TypeKind> = BUILTIN_SCALARS
        .iter()
        .map(|name| (name.to_string(), TypeKind::Scalar))
        .collect();
    let mut roots = (None, None, None);

    for def in &document.definitions {
        match def {
            Definition::TypeDefinition(ty) => {
                let (name, kind) = match ty {
                    TypeDefinition::Scalar(t) => (&t.name, TypeKind::Scalar),
                    TypeDefinition::Object(t) => (&t.name, TypeKind::Object),
                    TypeDefinition::Interface(t) => (&t.name, TypeKind::Interface),
                    TypeDefinition::Union(t) => (&t.name, TypeKind::Union),
                    TypeDefinition::Enum(t) => (&t.name, TypeKind::Enum),
                    TypeDefinition::InputObject(t) => (&t.name, TypeKind::InputObject),
                };
                kinds.insert(name.clone(), kind);
            }
            Definition::SchemaDefinition(schema) => {
                roots = (
                    schema.query.clone(),
                    schema.mutation.clone(),
                    schema.subscription.clone(),
                );
            }
            _ => {}
        }
    }

    let converter = Converter { kinds: &kinds };
    let mut types: Vec<SchemaType> = Vec::new();
    let mut implementors: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for def in &document.definitions {
        let Definition::TypeDefinition(ty) = def else { continue };
        let converted = match ty {
            TypeDefinition::Scalar(t) => {
                let mut out = SchemaType::new(TypeKind::Scalar, &t.name);
                out.description = t.description.clone();
                out
            }
            TypeDefinition::Object(t) => {
                let mut out = SchemaType::new(TypeKind::Object, &t.name);
                out.description = t.description.clone();
                out.fields = Some(converter.fields(&t.name, &t.fields)?);
                out.interfaces = Some(
                    t.implements_interfaces
                        .iter()
                        .map(|name| FieldTypeRef::named(TypeKind::Interface, name))
                        .collect(),
                );
                for interface in &t.implements_interfaces {
                    implementors
                        .entry(interface.clone())
                        .or_default()
                        .push(t.name.clone());
                }
                out
            }
            TypeDefinition::Interface(t) => {
                let mut out = SchemaType::new(TypeKind::Interface, &t.name);
                out.description = t.description.clone();
                out.fields = Some(converter.fields(&t.name, &t.fields)?);
                out.interfaces = Some(
                    t.implements_interfaces
                        .iter()
                        .map(|name| FieldTypeRef::named(TypeKind::Interface, name))
                        .collect(),
                );
                out
            }
            TypeDefinition::Union(t) => {
                let mut out = SchemaType::new(TypeKind::Union, &t.name);
                out.description = t.description.clone();
                out.possible_types = Some(
                    t.types
                        .iter()
                        .map(|name| converter.named(&t.name, name, name))
                        .collect::<Result<_>>()?,
                );
                out
            }
            TypeDefinition::Enum(t) => {
                let mut out = SchemaType::new(TypeKind::Enum, &t.name);
                out.description = t.description.clone();
                out.enum_values = Some(
                    t.values
                        .iter()
                        .map(|value| {
                            let reason = deprecation(&value.directives);
                            EnumValue {
                                name: value.name.clone(),
                                description: value.description.clone(),
                                is_deprecated: reason.is_some(),
                                deprecation_reason: reason.flatten(),
                            }
                        })
                        .collect(),
                );
                out
            }
            TypeDefinition::InputObject(t) => {
                let mut out = SchemaType::new(TypeKind::InputObject, &t.name);
                out.description = t.description.clone();
                out.input_fields = Some(converter.arguments(&t.name, &t.fields)?);
                out
            }
        };
        types.push(converted);
    }

    for def in &document.definitions {
        let Definition::TypeExtension(TypeExtension::Object(ext)) = def else {
            if let Definition::TypeExtension(_) = def {
                tracing::warn!("ignoring non-object type extension in sdl");
            }
            continue;
        };
        let fields = converter.fields(&ext.name, &ext.fields)?;
        let target = types
            .iter_mut()
            .find(|ty| ty.name == ext.name)
            .ok_or_else(|| Error::schema(&ext.name, "", "extension of an undefined type"))?;
        target.fields.get_or_insert_with(Vec::new).extend(fields);
    }

    for ty in types.iter_mut().filter(|ty| ty.kind == TypeKind::Interface) {
        let objects = implementors.remove(&ty.name).unwrap_or_default();
        ty.possible_types = Some(
            objects
                .into_iter()
                .map(|name| FieldTypeRef::named(TypeKind::Object, name))
                .collect(),
        );
    }

    for builtin in BUILTIN_SCALARS {
        if !types.iter().any(|ty| ty.name == builtin) {
            types.push(SchemaType::new(TypeKind::Scalar, builtin));
        }
    }

    let mut directives = document
        .definitions
        .iter()
        .filter_map(|def| match def {
            Definition::DirectiveDefinition(d) => Some(d),
            _ => None,
        })
        .map(|d| {
            Ok(Directive {
                name: d.name.clone(),
                description: d.description.clone(),
                locations: d
                    .locations
                    .iter()
                    .map(|loc| DirectiveLocation::from_name(loc.as_str()))
                    .collect(),
                args: converter.arguments(&format!("@{}", d.name), &d.arguments)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    for builtin in BUILTIN_DIRECTIVES {
        if !directives.iter().any(|directive| directive.name == builtin) {
            directives.push(Directive::builtin(builtin));
        }
    }

    let default_root = |explicit: Option<String>, conventional: &str| {
        explicit
            .or_else(|| kinds.contains_key(conventional).then(|| conventional.to_string()))
            .map(|name| NamedRef { name })
    };

    Ok(Schema {
        query_type: default_root(roots.0, "Query"),
        mutation_type: default_root(roots.1, "Mutation"),
        subscription_type: default_root(roots.2, "Subscription"),
        types,
        directives,
    })
}

struct Converter<'k> {
    kinds: &'k HashMap<String, TypeKind>,
}

impl Converter<'_> {
    fn named(&self, owner: &str, member: &str, name: &str) -> Result<FieldTypeRef> {
        let kind = self
            .kinds
            .get(name)
            .copied()
            .ok_or_else(|| Error::schema(owner, member, format!("unknown type `{name}`")))?;
        Ok(FieldTypeRef::named(kind, name))
    }

    fn type_ref(&self, owner: &str, member: &str, ty: &Type<'_, String>) -> Result<FieldTypeRef> {
        Ok(match ty {
            Type::NamedType(name) => self.named(owner, member, name)?,
            Type::ListType(inner) => FieldTypeRef::list(self.type_ref(owner, member, inner)?),
            Type::NonNullType(inner) => FieldTypeRef::non_null(self.type_ref(owner, member, inner)?),
        })
    }

    fn fields(&self, owner: &str, fields: &[graphql_parser::schema::Field<'_, String>]) -> Result<Vec<Field>> {
        fields
            .iter()
            .map(|field| {
                let reason = deprecation(&field.directives);
                Ok(Field {
                    name: field.name.clone(),
                    description: field.description.clone(),
                    args: self.arguments(owner, &field.arguments)?,
                    field_type: self.type_ref(owner, &field.name, &field.field_type)?,
                    is_deprecated: reason.is_some(),
                    deprecation_reason: reason.flatten(),
                })
            })
            .collect()
    }

    fn arguments(&self, owner: &str, args: &[InputValue<'_, String>]) -> Result<Vec<Argument>> {
        args.iter()
            .map(|arg| {
                Ok(Argument {
                    name: arg.name.clone(),
                    description: arg.description.clone(),
                    value_type: self.type_ref(owner, &arg.name, &arg.value_type)?,
                    default_value: arg.default_value.as_ref().map(|value| value.to_string()),
                })
            })
            .collect()
    }
}

/// `Some(reason)` when a `@deprecated` directive is present
fn deprecation(directives: &[graphql_parser::schema::Directive<'_, String>]) -> Option<Option<String>> {
    let directive = directives.iter().find(|d| d.name == "deprecated")?;
    let reason = directive
        .arguments
        .iter()
        .find(|(name, _)| name == "reason")
        .and_then(|(_, value)| match value {
            graphql_parser::schema::Value::String(reason) => Some(reason.clone()),
            _ => None,
        });
    Some(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        schema { query: Root }

        interface Node { id: ID! }

        type Root {
            node(id: ID!): Node
            users(first: Int = 10): [User!]!
        }

        type User implements Node {
            id: ID!
            name: String @deprecated(reason: "use fullName")
            fullName: String
        }

        union Entity = User

        enum Role { ADMIN VIEWER @deprecated }

        input UserFilter { role: Role, nameContains: String }

        directive @cached(ttl: Int!) on FIELD | QUERY
    "#;

    #[test]
    fn test_parse_sdl_types_and_roots() {
        let schema = parse(SDL).unwrap();
        assert_eq!(schema.query_type_name(), Some("Root"));
        assert_eq!(schema.mutation_type_name(), None);

        let user = schema.type_by_name("User").unwrap();
        assert_eq!(user.kind, TypeKind::Object);
        let name = user.fields().iter().find(|f| f.name == "name").unwrap();
        assert!(name.is_deprecated);
        assert_eq!(name.deprecation_reason.as_deref(), Some("use fullName"));

        let node = schema.type_by_name("Node").unwrap();
        assert_eq!(node.possible_types()[0].name.as_deref(), Some("User"));

        let root = schema.type_by_name("Root").unwrap();
        let users = &root.fields()[1];
        assert_eq!(users.field_type.graphql_type(), "[User!]!");
        assert_eq!(users.args[0].default_value.as_deref(), Some("10"));

        let role = schema.type_by_name("Role").unwrap();
        assert!(role.enum_values()[1].is_deprecated);

        assert!(schema.type_by_name("String").is_some());
        assert_eq!(schema.directives[0].locations, vec![DirectiveLocation::Field, DirectiveLocation::Query]);
        schema.validate().unwrap();
    }

    #[test]
    fn test_parse_sdl_adds_builtin_directives() {
        let schema = parse("type Query { id: ID }").unwrap();
        let names: Vec<_> = schema.directives.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["include", "skip"]);
        assert_eq!(schema.directives[0], Directive::builtin("include"));
        assert_eq!(schema.directives[1].args[0].value_type.graphql_type(), "Boolean!");

        // a declared directive is kept as written
        let schema = parse(
            "type Query { id: ID } directive @skip(if: Boolean!, reason: String) on FIELD",
        )
        .unwrap();
        let names: Vec<_> = schema.directives.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["skip", "include"]);
        assert_eq!(schema.directives[0].args.len(), 2);
    }

    #[test]
    fn test_parse_sdl_unknown_type() {
        let err = parse("type Query { me: Missing }").unwrap_err();
        assert!(matches!(err, Error::Schema { ref member, .. } if member == "me"));
    }

    #[test]
    fn test_parse_sdl_syntax_error() {
        assert!(matches!(parse("type {"), Err(Error::Sdl(_))));
    }
}

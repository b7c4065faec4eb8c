//! schema model
//!
//! in-memory representation of an introspected graphql schema. the model
//! deserializes straight from the introspection result and is read-only
//! once loaded. [`sdl`] builds the same model from schema definition text.

pub mod sdl;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// prefix reserved for introspection types (`__Type`, `__Schema`, ...)
pub const BUILTIN_PREFIX: &str = "__";

/// the five scalars every schema carries
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// executable directives every server supports without declaring them
pub const BUILTIN_DIRECTIVES: [&str; 2] = ["include", "skip"];

/// type kind as reported by introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    /// object, interface, and union types carry a selection set
    pub fn is_complex(self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }

    /// interface and union types select concrete types through fragments
    pub fn is_abstract(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Union)
    }
}

/// reference to a named root operation type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// a field or argument type, possibly wrapped in non-null and list
///
/// wrappers are kinds around an inner ref, never flags. equality is
/// structural: kind, name, and the whole `of_type` chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<FieldTypeRef>>,
}

impl FieldTypeRef {
    /// a named (unwrapped) type reference
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            of_type: None,
        }
    }

    /// wrap in non-null
    pub fn non_null(inner: FieldTypeRef) -> Self {
        Self {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    /// wrap in list
    pub fn list(inner: FieldTypeRef) -> Self {
        Self {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    /// strip one non-null wrapper, if present
    ///
    /// a non-null wrapper without an inner type is returned unchanged.
    pub fn unwrap_non_null(&self) -> &FieldTypeRef {
        match (&self.kind, &self.of_type) {
            (TypeKind::NonNull, Some(inner)) => inner,
            _ => self,
        }
    }

    /// true if the outermost wrapper is non-null
    pub fn is_non_null(&self) -> bool {
        self.kind == TypeKind::NonNull
    }

    /// element type of a list (after stripping non-null)
    pub fn list_element(&self) -> Option<&FieldTypeRef> {
        let inner = self.unwrap_non_null();
        match inner.kind {
            TypeKind::List => inner.of_type.as_deref(),
            _ => None,
        }
    }

    /// true if any wrapper in the chain is a list
    pub fn is_list(&self) -> bool {
        let mut current = self;
        loop {
            match current.kind {
                TypeKind::List => return true,
                TypeKind::NonNull => match &current.of_type {
                    Some(inner) => current = inner,
                    None => return false,
                },
                _ => return false,
            }
        }
    }

    /// the innermost named type, or `None` if a wrapper has no inner type
    pub fn innermost(&self) -> Option<&FieldTypeRef> {
        let mut current = self;
        loop {
            match current.kind {
                TypeKind::List | TypeKind::NonNull => current = current.of_type.as_deref()?,
                _ => return current.name.is_some().then_some(current),
            }
        }
    }

    /// name of the innermost named type
    pub fn type_name(&self) -> Option<&str> {
        self.innermost().and_then(|ty| ty.name.as_deref())
    }

    /// graphql type literal, e.g. `[ID!]!`
    pub fn graphql_type(&self) -> String {
        match (&self.kind, &self.of_type) {
            (TypeKind::NonNull, Some(inner)) => format!("{}!", inner.graphql_type()),
            (TypeKind::List, Some(inner)) => format!("[{}]", inner.graphql_type()),
            _ => self.name.clone().unwrap_or_default(),
        }
    }
}

/// field of an object or interface type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<Argument>,
    #[serde(rename = "type")]
    pub field_type: FieldTypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

impl Field {
    /// true if at least one argument is non-null without a default
    pub fn requires_arguments(&self) -> bool {
        self.args.iter().any(Argument::is_required)
    }
}

/// field argument, input object field, or directive argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub value_type: FieldTypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl Argument {
    /// non-null and no default value
    pub fn is_required(&self) -> bool {
        self.value_type.is_non_null() && self.default_value.is_none()
    }
}

/// enum member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

/// where a directive may be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
    #[serde(other)]
    Unknown,
}

impl DirectiveLocation {
    /// parse an sdl / introspection location name
    pub fn from_name(name: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(name.to_string()))
            .unwrap_or(DirectiveLocation::Unknown)
    }

    /// locations that can be attached to a field selection
    pub fn is_executable_selection(self) -> bool {
        matches!(
            self,
            DirectiveLocation::Field
                | DirectiveLocation::FragmentSpread
                | DirectiveLocation::InlineFragment
        )
    }
}

/// directive definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub locations: Vec<DirectiveLocation>,
    #[serde(default)]
    pub args: Vec<Argument>,
}

impl Directive {
    /// `@include(if: Boolean!)` or `@skip(if: Boolean!)` as introspection
    /// reports them
    pub fn builtin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            locations: vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            args: vec![Argument {
                name: "if".to_string(),
                description: None,
                value_type: FieldTypeRef::non_null(FieldTypeRef::named(TypeKind::Scalar, "Boolean")),
                default_value: None,
            }],
        }
    }
}

/// a named schema type
///
/// list-valued members are `None` when they do not apply to the kind,
/// exactly as introspection reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaType {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
    #[serde(default)]
    pub input_fields: Option<Vec<Argument>>,
    #[serde(default)]
    pub interfaces: Option<Vec<FieldTypeRef>>,
    #[serde(default)]
    pub enum_values: Option<Vec<EnumValue>>,
    #[serde(default)]
    pub possible_types: Option<Vec<FieldTypeRef>>,
}

impl SchemaType {
    /// empty type of the given kind
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            fields: None,
            input_fields: None,
            interfaces: None,
            enum_values: None,
            possible_types: None,
        }
    }

    /// introspection types are never generated
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with(BUILTIN_PREFIX)
    }

    pub fn fields(&self) -> &[Field] {
        self.fields.as_deref().unwrap_or_default()
    }

    pub fn input_fields(&self) -> &[Argument] {
        self.input_fields.as_deref().unwrap_or_default()
    }

    pub fn interfaces(&self) -> &[FieldTypeRef] {
        self.interfaces.as_deref().unwrap_or_default()
    }

    pub fn enum_values(&self) -> &[EnumValue] {
        self.enum_values.as_deref().unwrap_or_default()
    }

    pub fn possible_types(&self) -> &[FieldTypeRef] {
        self.possible_types.as_deref().unwrap_or_default()
    }
}

/// the whole introspected schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub query_type: Option<NamedRef>,
    #[serde(default)]
    pub mutation_type: Option<NamedRef>,
    #[serde(default)]
    pub subscription_type: Option<NamedRef>,
    #[serde(default)]
    pub types: Vec<SchemaType>,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

/// root operation a type serves as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootOperation {
    Query,
    Mutation,
    Subscription,
}

impl Schema {
    pub fn query_type_name(&self) -> Option<&str> {
        self.query_type.as_ref().map(|r| r.name.as_str())
    }

    pub fn mutation_type_name(&self) -> Option<&str> {
        self.mutation_type.as_ref().map(|r| r.name.as_str())
    }

    pub fn subscription_type_name(&self) -> Option<&str> {
        self.subscription_type.as_ref().map(|r| r.name.as_str())
    }

    /// which root operation `type_name` is, if any
    pub fn root_operation(&self, type_name: &str) -> Option<RootOperation> {
        if self.query_type_name() == Some(type_name) {
            Some(RootOperation::Query)
        } else if self.mutation_type_name() == Some(type_name) {
            Some(RootOperation::Mutation)
        } else if self.subscription_type_name() == Some(type_name) {
            Some(RootOperation::Subscription)
        } else {
            None
        }
    }

    /// types that take part in generation, in schema order
    pub fn generated_types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.iter().filter(|ty| !ty.is_builtin())
    }

    /// linear lookup; use [`SchemaIndex`] for repeated lookups
    pub fn type_by_name(&self, name: &str) -> Option<&SchemaType> {
        self.types.iter().find(|ty| ty.name == name)
    }

    /// check the consistency the generator relies on
    ///
    /// type names must be unique, root types must exist and be objects,
    /// every wrapper chain must end in a known named type, and possible
    /// types must name object types.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for ty in &self.types {
            if !seen.insert(ty.name.as_str()) {
                return Err(Error::schema(&ty.name, "", "duplicate type name"));
            }
        }

        let index = SchemaIndex::new(self);
        for (label, root) in [
            ("query", self.query_type_name()),
            ("mutation", self.mutation_type_name()),
            ("subscription", self.subscription_type_name()),
        ] {
            let Some(root) = root else { continue };
            match index.get(root) {
                Some(ty) if ty.kind == TypeKind::Object => {}
                Some(_) => {
                    return Err(Error::schema("schema", label, format!("`{root}` is not an object type")))
                }
                None => {
                    return Err(Error::schema("schema", label, format!("unknown root type `{root}`")))
                }
            }
        }

        for ty in self.generated_types() {
            for field in ty.fields() {
                index.check_ref(&ty.name, &field.name, &field.field_type)?;
                for arg in &field.args {
                    index.check_ref(&ty.name, &format!("{}({})", field.name, arg.name), &arg.value_type)?;
                }
            }
            for field in ty.input_fields() {
                index.check_ref(&ty.name, &field.name, &field.value_type)?;
            }
            for possible in ty.possible_types() {
                let name = possible.type_name().unwrap_or_default();
                match index.get(name) {
                    Some(target) if target.kind == TypeKind::Object => {}
                    _ => {
                        return Err(Error::schema(
                            &ty.name,
                            name,
                            "possible type is not a known object type",
                        ))
                    }
                }
            }
        }

        Ok(())
    }
}

/// name-keyed view over a schema, built once per generation run
#[derive(Debug)]
pub struct SchemaIndex<'a> {
    schema: &'a Schema,
    by_name: HashMap<&'a str, &'a SchemaType>,
}

impl<'a> SchemaIndex<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        let by_name = schema
            .types
            .iter()
            .map(|ty| (ty.name.as_str(), ty))
            .collect();
        Self { schema, by_name }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn get(&self, name: &str) -> Option<&'a SchemaType> {
        self.by_name.get(name).copied()
    }

    /// the named type a wrapper chain ends in
    pub fn resolve_ref(&self, owner: &str, member: &str, ty: &FieldTypeRef) -> Result<&'a SchemaType> {
        let name = ty
            .type_name()
            .ok_or_else(|| Error::schema(owner, member, "type reference has no named type"))?;
        self.get(name)
            .ok_or_else(|| Error::schema(owner, member, format!("unknown type `{name}`")))
    }

    fn check_ref(&self, owner: &str, member: &str, ty: &FieldTypeRef) -> Result<()> {
        if ty.is_list() && ty.innermost().is_none() {
            return Err(Error::schema(owner, member, "list element type cannot be resolved"));
        }
        self.resolve_ref(owner, member, ty).map(|_| ())
    }

    /// concrete object types of an interface or union
    pub fn possible_types(&self, ty: &SchemaType) -> Result<Vec<&'a SchemaType>> {
        ty.possible_types()
            .iter()
            .map(|possible| {
                let target = self.resolve_ref(&ty.name, "possibleTypes", possible)?;
                if target.kind != TypeKind::Object {
                    return Err(Error::schema(
                        &ty.name,
                        &target.name,
                        "expected a concrete object type",
                    ));
                }
                Ok(target)
            })
            .collect()
    }

    /// fields used for code generation
    ///
    /// objects and interfaces use their own fields. a union has none of its
    /// own, so its effective set merges the fields of every member type by
    /// name, first seen wins.
    pub fn effective_fields(&self, ty: &'a SchemaType) -> Result<Vec<&'a Field>> {
        match ty.kind {
            TypeKind::Object | TypeKind::Interface => Ok(ty.fields().iter().collect()),
            TypeKind::Union => {
                let mut names = BTreeSet::new();
                let mut fields = Vec::new();
                for member in self.possible_types(ty)? {
                    for field in member.fields() {
                        if names.insert(field.name.as_str()) {
                            fields.push(field);
                        }
                    }
                }
                Ok(fields)
            }
            _ => Err(Error::schema(&ty.name, "", "expected an object, interface, or union type")),
        }
    }

    /// own fields followed by concrete-type fields not already present
    ///
    /// data types of abstract types use this so fragment selections have a
    /// member to land in.
    pub fn data_fields(&self, ty: &'a SchemaType) -> Result<Vec<&'a Field>> {
        let mut fields = self.effective_fields(ty)?;
        if ty.kind == TypeKind::Interface {
            let mut names: BTreeSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
            for member in self.possible_types(ty)? {
                for field in member.fields() {
                    if names.insert(field.name.as_str()) {
                        fields.push(field);
                    }
                }
            }
        }
        Ok(fields)
    }
}

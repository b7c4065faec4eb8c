//! query-builder runtime
//!
//! generated builders hold a [`Selection`] and describe their type with a
//! static [`TypeMetadata`]. [`planner`] expands "select everything" requests
//! over that metadata and [`serialize`] renders the finished tree as query
//! text.
//!
//! ```
//! use gqlforge::runtime::{build_document, FieldSelection, Formatting, Selection, SerializerOptions};
//!
//! let mut selection = Selection::default();
//! selection.insert_field(FieldSelection::scalar("id"));
//! selection.insert_field(FieldSelection::scalar("name"));
//! let text = build_document(None, &selection, &SerializerOptions::new(Formatting::None));
//! assert_eq!(text, "{id,name}");
//! ```

pub mod planner;
pub mod serialize;
pub mod value;

pub use planner::{select_all, SelectionDepthMap};
pub use serialize::{build_document, Formatting, OperationHeader, SerializerOptions};
pub use value::{
    Argument, InputObject, InputValue, Parameter, Temporal, ToInputValue, Variable,
};

use serde::{Deserialize, Deserializer};

/// root operation of a builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

/// one field of a builder's type
#[derive(Debug, Clone, Copy)]
pub struct FieldMetadata {
    pub name: &'static str,
    /// object-typed or list-typed
    pub is_complex: bool,
    /// has a non-null argument without default
    pub requires_parameters: bool,
    /// builder metadata of the field's type, for object-typed fields
    pub query_builder: Option<fn() -> &'static TypeMetadata>,
}

impl FieldMetadata {
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            is_complex: false,
            requires_parameters: false,
            query_builder: None,
        }
    }

    pub const fn scalar_list(name: &'static str) -> Self {
        Self {
            name,
            is_complex: true,
            requires_parameters: false,
            query_builder: None,
        }
    }

    pub const fn object(name: &'static str, query_builder: fn() -> &'static TypeMetadata) -> Self {
        Self {
            name,
            is_complex: true,
            requires_parameters: false,
            query_builder: Some(query_builder),
        }
    }

    pub const fn requiring_parameters(self) -> Self {
        Self {
            requires_parameters: true,
            ..self
        }
    }
}

/// static description of a builder type
///
/// builders refer to each other through factory functions, so the whole
/// registry is plain static data.
#[derive(Debug)]
pub struct TypeMetadata {
    pub type_name: &'static str,
    pub operation: Option<OperationKind>,
    pub fields: &'static [FieldMetadata],
    /// builder metadata of each concrete type, for interfaces and unions
    pub fragments: &'static [fn() -> &'static TypeMetadata],
}

impl TypeMetadata {
    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// `@name(args)` attached to a field
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveClause {
    pub name: String,
    pub arguments: Vec<Argument>,
}

impl DirectiveClause {
    pub fn new(name: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// generated directive types turn into a clause
pub trait QueryDirective {
    fn into_clause(self) -> DirectiveClause;
}

impl QueryDirective for DirectiveClause {
    fn into_clause(self) -> DirectiveClause {
        self
    }
}

/// alias and directives of one selected field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    pub alias: Option<String>,
    pub directives: Vec<DirectiveClause>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_directive(mut self, directive: impl QueryDirective) -> Self {
        self.directives.push(directive.into_clause());
        self
    }
}

/// a selected field, with a child selection for object-typed fields
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Vec<Argument>,
    pub directives: Vec<DirectiveClause>,
    pub selection: Option<Selection>,
}

impl FieldSelection {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: Vec::new(),
            directives: Vec::new(),
            selection: None,
        }
    }

    pub fn object(name: impl Into<String>, selection: Selection) -> Self {
        Self {
            selection: Some(selection),
            ..Self::scalar(name)
        }
    }

    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.alias = options.alias;
        self.directives = options.directives;
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<Argument>) -> Self {
        self.arguments = arguments;
        self
    }

    /// response key: the alias when set, else the field name
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `... on Type { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSelection {
    pub type_condition: String,
    pub selection: Selection,
}

/// ordered selection set
///
/// fields are keyed by alias-or-name and fragments by type condition;
/// inserting an existing key replaces the entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    fields: Vec<FieldSelection>,
    fragments: Vec<FragmentSelection>,
}

impl Selection {
    pub fn fields(&self) -> &[FieldSelection] {
        &self.fields
    }

    pub fn fragments(&self) -> &[FragmentSelection] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.fragments.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|field| field.key() == key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldSelection> {
        self.fields.iter().find(|field| field.key() == key)
    }

    pub fn insert_field(&mut self, field: FieldSelection) {
        match self.fields.iter_mut().find(|existing| existing.key() == field.key()) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn remove_field(&mut self, key: &str) -> Option<FieldSelection> {
        let position = self.fields.iter().position(|field| field.key() == key)?;
        Some(self.fields.remove(position))
    }

    pub fn insert_fragment(&mut self, fragment: FragmentSelection) {
        match self
            .fragments
            .iter_mut()
            .find(|existing| existing.type_condition == fragment.type_condition)
        {
            Some(existing) => *existing = fragment,
            None => self.fragments.push(fragment),
        }
    }

    /// insert every entry of `other`, replacing entries with the same key
    pub fn merge(&mut self, other: Selection) {
        for field in other.fields {
            self.insert_field(field);
        }
        for fragment in other.fragments {
            self.insert_fragment(fragment);
        }
    }
}

/// shared behavior of generated selection builders
pub trait QueryBuilder: Default + Sized {
    fn metadata() -> &'static TypeMetadata;

    fn selection(&self) -> &Selection;

    fn selection_mut(&mut self) -> &mut Selection;

    fn into_selection(self) -> Selection;

    /// name emitted in the operation signature of root builders
    fn operation_name(&self) -> Option<&str> {
        None
    }

    /// every field not requiring arguments, expanded with cycle bounding
    fn with_all_fields(mut self) -> Self {
        let planned = select_all(Self::metadata());
        self.selection_mut().merge(planned);
        self
    }

    /// every scalar field not requiring arguments
    fn with_all_scalar_fields(mut self) -> Self {
        for field in Self::metadata().fields {
            if field.query_builder.is_none() && !field.requires_parameters {
                self.selection_mut().insert_field(FieldSelection::scalar(field.name));
            }
        }
        self
    }

    fn with_scalar_field(mut self, name: &str, options: FieldOptions, arguments: Vec<Argument>) -> Self {
        let field = FieldSelection::scalar(name)
            .with_options(options)
            .with_arguments(arguments);
        self.selection_mut().insert_field(field);
        self
    }

    fn with_object_field<B: QueryBuilder>(
        mut self,
        name: &str,
        builder: B,
        options: FieldOptions,
        arguments: Vec<Argument>,
    ) -> Self {
        let field = FieldSelection::object(name, builder.into_selection())
            .with_options(options)
            .with_arguments(arguments);
        self.selection_mut().insert_field(field);
        self
    }

    fn with_fragment<B: QueryBuilder>(mut self, builder: B) -> Self {
        self.selection_mut().insert_fragment(FragmentSelection {
            type_condition: B::metadata().type_name.to_string(),
            selection: builder.into_selection(),
        });
        self
    }

    /// remove a field by alias-or-name
    fn except_field(mut self, key: &str) -> Self {
        self.selection_mut().remove_field(key);
        self
    }

    fn with_type_name(mut self) -> Self {
        self.selection_mut().insert_field(FieldSelection::scalar("__typename"));
        self
    }

    /// render the selection as query text
    fn build(&self, formatting: Formatting, indent_size: usize) -> String {
        let header = Self::metadata().operation.map(|kind| OperationHeader {
            kind,
            name: self.operation_name().map(str::to_string),
        });
        let options = SerializerOptions::new(formatting).with_indent_size(indent_size);
        build_document(header.as_ref(), self.selection(), &options)
    }
}

/// deserialize `null` as the type's default, for non-optional data fields
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

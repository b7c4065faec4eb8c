//! name resolution
//!
//! computes the final rust type name of every generated schema type. the
//! table is built once per run, before any emission, and only records names
//! that differ from the plain PascalCase form.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::naming;
use crate::schema::{Schema, SchemaIndex, SchemaType, TypeKind};
use std::collections::{BTreeSet, HashMap, HashSet};

const DATA_SUFFIXES: [&str; 3] = ["Data", "Record", "DataRecord"];

/// how a type's name deviates from its PascalCase form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedName {
    /// caller-supplied name, emitted without prefix or suffix
    Override(String),
    /// disambiguated base name; prefix and suffix still apply
    Renamed(String),
}

/// schema type name to emitted rust type name
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: HashMap<String, ResolvedName>,
    prefix: String,
    suffix: String,
}

impl NameTable {
    /// resolve every generated type in schema order
    pub fn build(index: &SchemaIndex<'_>, config: &GeneratorConfig) -> Result<Self> {
        let schema = index.schema();
        let pascal_names: HashSet<String> = schema
            .generated_types()
            .map(|ty| naming::pascal_case(&ty.name))
            .collect();

        let mut table = NameTable {
            entries: HashMap::new(),
            prefix: config.class_prefix.clone(),
            suffix: config.class_suffix.clone(),
        };
        // names of emitted items that do not come from a schema type
        let mut taken: HashSet<String> = fixed_item_names(schema);
        // builder and metadata names derived from the names already taken
        let mut derived: HashSet<String> = HashSet::new();

        for ty in schema.generated_types().filter(|ty| is_named_kind(ty.kind)) {
            if let Some(name) = config.type_name_overrides.get(&ty.name) {
                naming::ensure_identifier(name).map_err(|err| {
                    Error::Config(format!("invalid name override for `{}`: {err}", ty.name))
                })?;
                let clashes = derived.contains(name)
                    || (ty.kind.is_complex()
                        && derived_item_names(name)
                            .iter()
                            .any(|item| taken.contains(item) || derived.contains(item)));
                if clashes || !taken.insert(name.clone()) {
                    return Err(Error::Config(format!(
                        "name override `{name}` for `{}` is already in use",
                        ty.name
                    )));
                }
                if ty.kind.is_complex() {
                    derived.extend(derived_item_names(name));
                }
                table
                    .entries
                    .insert(ty.name.clone(), ResolvedName::Override(name.clone()));
                continue;
            }

            let pascal = naming::pascal_case(&ty.name);
            let members = member_names(index, ty, config.include_deprecated)?;
            let collides = |candidate: &str| {
                let full = table.affixed(candidate);
                members.contains(&full)
                    || taken.contains(&full)
                    || derived.contains(&full)
                    || naming::is_prelude_type(&full)
                    || (candidate != pascal && pascal_names.contains(candidate))
                    || (ty.kind.is_complex()
                        && derived_item_names(&full)
                            .iter()
                            .any(|item| taken.contains(item) || derived.contains(item)))
            };

            let mut candidate = pascal.clone();
            if collides(&candidate) {
                let suffixes: &[&str] = if ty.kind == TypeKind::InputObject {
                    if pascal.ends_with("Input") {
                        &["InputObject"]
                    } else {
                        &["Input"]
                    }
                } else {
                    &DATA_SUFFIXES
                };
                let first = suffixes[0];
                candidate = match suffixes
                    .iter()
                    .map(|suffix| format!("{pascal}{suffix}"))
                    .find(|name| !collides(name))
                {
                    Some(name) => name,
                    None => (1..)
                        .map(|n| format!("{pascal}{first}{n}"))
                        .find(|name| !collides(name))
                        .unwrap_or_default(),
                };
            }

            let full = table.affixed(&candidate);
            if ty.kind.is_complex() {
                derived.extend(derived_item_names(&full));
            }
            taken.insert(full);
            if candidate != pascal {
                tracing::debug!(schema_name = %ty.name, rust_name = %candidate, "renamed type");
                table
                    .entries
                    .insert(ty.name.clone(), ResolvedName::Renamed(candidate));
            }
        }

        Ok(table)
    }

    fn affixed(&self, base: &str) -> String {
        format!("{}{base}{}", self.prefix, self.suffix)
    }

    /// the emitted rust name of a schema type
    pub fn class_name(&self, schema_name: &str) -> String {
        match self.entries.get(schema_name) {
            Some(ResolvedName::Override(name)) => name.clone(),
            Some(ResolvedName::Renamed(base)) => self.affixed(base),
            None => self.affixed(&naming::pascal_case(schema_name)),
        }
    }

    /// the recorded deviation, if any
    pub fn entry(&self, schema_name: &str) -> Option<&ResolvedName> {
        self.entries.get(schema_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// the builder struct and metadata static emitted next to a complex type
pub fn derived_item_names(class_name: &str) -> [String; 2] {
    [
        format!("{class_name}QueryBuilder"),
        format!("{}_QUERY_BUILDER_METADATA", naming::constant_name(class_name)),
    ]
}

/// shared items and directive types
fn fixed_item_names(schema: &Schema) -> HashSet<String> {
    let mut names: HashSet<String> = ["GraphQlTypes", "query_builder_metadata"]
        .into_iter()
        .map(str::to_string)
        .collect();
    for directive in &schema.directives {
        if directive
            .locations
            .iter()
            .any(|location| location.is_executable_selection())
        {
            names.insert(format!("{}Directive", naming::pascal_case(&directive.name)));
        }
    }
    names
}

fn is_named_kind(kind: TypeKind) -> bool {
    kind.is_complex() || matches!(kind, TypeKind::Enum | TypeKind::InputObject)
}

/// PascalCase names of the members a type's container will hold
fn member_names(
    index: &SchemaIndex<'_>,
    ty: &SchemaType,
    include_deprecated: bool,
) -> Result<BTreeSet<String>> {
    let names = match ty.kind {
        TypeKind::InputObject => ty
            .input_fields()
            .iter()
            .map(|field| naming::pascal_case(&field.name))
            .collect(),
        TypeKind::Object | TypeKind::Interface | TypeKind::Union => {
            let ty = index
                .get(&ty.name)
                .ok_or_else(|| Error::schema(&ty.name, "", "type is not indexed"))?;
            index
                .effective_fields(ty)?
                .into_iter()
                .filter(|field| include_deprecated || !field.is_deprecated)
                .map(|field| naming::pascal_case(&field.name))
                .collect()
        }
        _ => BTreeSet::new(),
    };
    Ok(names)
}

/// every named type reachable from `start` through fields, arguments, and
/// input fields
///
/// names are added to `found`; types already present are not walked again.
pub fn find_all_referenced_object_types(
    index: &SchemaIndex<'_>,
    start: &SchemaType,
    found: &mut BTreeSet<String>,
) {
    let mut stack = vec![start.name.clone()];
    while let Some(name) = stack.pop() {
        let Some(ty) = index.get(&name) else { continue };
        let references = ty
            .fields()
            .iter()
            .flat_map(|field| {
                std::iter::once(&field.field_type).chain(field.args.iter().map(|arg| &arg.value_type))
            })
            .chain(ty.input_fields().iter().map(|field| &field.value_type))
            .chain(ty.possible_types().iter())
            .filter_map(|reference| reference.type_name());

        for target in references {
            let Some(target) = index.get(target) else { continue };
            if target.kind == TypeKind::Scalar || target.is_builtin() {
                continue;
            }
            if found.insert(target.name.clone()) {
                stack.push(target.name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Argument, Directive, DirectiveLocation, Field, FieldTypeRef, Schema};

    fn field(name: &str, ty: FieldTypeRef) -> Field {
        Field {
            name: name.to_string(),
            description: None,
            args: vec![],
            field_type: ty,
            is_deprecated: false,
            deprecation_reason: None,
        }
    }

    fn object(name: &str, fields: Vec<Field>) -> SchemaType {
        let mut ty = SchemaType::new(TypeKind::Object, name);
        ty.fields = Some(fields);
        ty
    }

    fn input(name: &str, fields: Vec<(&str, FieldTypeRef)>) -> SchemaType {
        let mut ty = SchemaType::new(TypeKind::InputObject, name);
        ty.input_fields = Some(
            fields
                .into_iter()
                .map(|(name, value_type)| Argument {
                    name: name.to_string(),
                    description: None,
                    value_type,
                    default_value: None,
                })
                .collect(),
        );
        ty
    }

    fn schema(types: Vec<SchemaType>) -> Schema {
        Schema {
            query_type: None,
            mutation_type: None,
            subscription_type: None,
            types,
            directives: vec![],
        }
    }

    fn string() -> FieldTypeRef {
        FieldTypeRef::named(TypeKind::Scalar, "String")
    }

    fn build(schema: &Schema, config: &GeneratorConfig) -> Result<NameTable> {
        NameTable::build(&SchemaIndex::new(schema), config)
    }

    #[test]
    fn test_no_collision_is_pascal_case() {
        let schema = schema(vec![
            object("user_profile", vec![field("id", string())]),
            object("Human", vec![field("name", string())]),
        ]);
        let table = build(&schema, &GeneratorConfig::default()).unwrap();
        assert_eq!(table.class_name("user_profile"), "UserProfile");
        assert_eq!(table.class_name("Human"), "Human");
        assert!(table.is_empty());
    }

    #[test]
    fn test_same_pascal_case_names_stay_distinct() {
        let schema = schema(vec![
            object("user", vec![field("id", string())]),
            object("User", vec![field("id", string())]),
            object("USER_", vec![field("id", string())]),
        ]);
        let table = build(&schema, &GeneratorConfig::default()).unwrap();
        let names: BTreeSet<_> = ["user", "User", "USER_"]
            .iter()
            .map(|name| table.class_name(name))
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(table.class_name("user"), "User");
        assert_eq!(table.class_name("User"), "UserData");
    }

    #[test]
    fn test_member_collision_appends_suffix() {
        let schema = schema(vec![
            object("Name", vec![field("name", string())]),
            input("Filter", vec![("filter", string())]),
            input("UserInput", vec![("userInput", string())]),
        ]);
        let table = build(&schema, &GeneratorConfig::default()).unwrap();
        assert_eq!(table.class_name("Name"), "NameData");
        assert_eq!(table.class_name("Filter"), "FilterInput");
        assert_eq!(table.class_name("UserInput"), "UserInputInputObject");
        assert_eq!(
            table.entry("Name"),
            Some(&ResolvedName::Renamed("NameData".to_string()))
        );
    }

    #[test]
    fn test_suffix_escalation() {
        let schema = schema(vec![
            object("Item", vec![field("item", string())]),
            object("ItemData", vec![field("id", string())]),
            object("ItemRecord", vec![field("id", string())]),
        ]);
        let table = build(&schema, &GeneratorConfig::default()).unwrap();
        assert_eq!(table.class_name("Item"), "ItemDataRecord");
        assert_eq!(table.class_name("ItemData"), "ItemData");
        assert_eq!(table.class_name("ItemRecord"), "ItemRecord");
    }

    #[test]
    fn test_prelude_names_are_renamed() {
        let schema = schema(vec![object("Option", vec![field("id", string())])]);
        let table = build(&schema, &GeneratorConfig::default()).unwrap();
        assert_eq!(table.class_name("Option"), "OptionData");
    }

    #[test]
    fn test_builder_names_are_reserved() {
        let types = || {
            vec![
                object("A", vec![field("id", string())]),
                object("AQueryBuilder", vec![field("id", string())]),
            ]
        };
        let table = build(&schema(types()), &GeneratorConfig::default()).unwrap();
        assert_eq!(table.class_name("A"), "A");
        assert_eq!(table.class_name("AQueryBuilder"), "AQueryBuilderData");

        let mut reversed = types();
        reversed.reverse();
        let table = build(&schema(reversed), &GeneratorConfig::default()).unwrap();
        assert_eq!(table.class_name("AQueryBuilder"), "AQueryBuilder");
        assert_eq!(table.class_name("A"), "AData");
    }

    #[test]
    fn test_shared_and_directive_names_are_reserved() {
        let mut schema = schema(vec![
            object("GraphQlTypes", vec![field("id", string())]),
            object("IncludeDirective", vec![field("id", string())]),
            object("DeprecatedDirective", vec![field("id", string())]),
        ]);
        schema.directives = vec![Directive::builtin("include"), {
            let mut deprecated = Directive::builtin("deprecated");
            deprecated.locations = vec![DirectiveLocation::FieldDefinition];
            deprecated
        }];
        let table = build(&schema, &GeneratorConfig::default()).unwrap();
        assert_eq!(table.class_name("GraphQlTypes"), "GraphQlTypesData");
        assert_eq!(table.class_name("IncludeDirective"), "IncludeDirectiveData");
        // schema-only directives emit no type
        assert_eq!(table.class_name("DeprecatedDirective"), "DeprecatedDirective");
    }

    #[test]
    fn test_override_clashing_with_builder_name_is_rejected() {
        let schema = schema(vec![
            object("Human", vec![field("id", string())]),
            object("Droid", vec![field("id", string())]),
        ]);
        let config = GeneratorConfig::default().with_type_name_override("Droid", "HumanQueryBuilder");
        let err = build(&schema, &config).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_prefix_suffix_and_overrides() {
        let schema = schema(vec![
            object("Human", vec![field("id", string())]),
            object("Droid", vec![field("id", string())]),
        ]);
        let config = GeneratorConfig::default()
            .with_class_prefix("Sw")
            .with_type_name_override("Droid", "Robot");
        let table = build(&schema, &config).unwrap();
        assert_eq!(table.class_name("Human"), "SwHuman");
        assert_eq!(table.class_name("Droid"), "Robot");
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let schema = schema(vec![object("Human", vec![field("id", string())])]);
        let config = GeneratorConfig::default().with_type_name_override("Human", "not valid");
        let err = build(&schema, &config).unwrap_err();
        assert!(err.is_config_error());

        let schema = self::schema(vec![
            object("Human", vec![field("id", string())]),
            object("Droid", vec![field("id", string())]),
        ]);
        let config = GeneratorConfig::default().with_type_name_override("Droid", "Human");
        assert!(build(&schema, &config).is_err());
    }

    #[test]
    fn test_find_all_referenced_object_types() {
        let color = input("ColorInput", vec![("red", FieldTypeRef::named(TypeKind::Scalar, "Int"))]);
        let review = input(
            "ReviewInput",
            vec![
                ("stars", FieldTypeRef::named(TypeKind::Scalar, "Int")),
                ("favoriteColor", FieldTypeRef::named(TypeKind::InputObject, "ColorInput")),
                ("tags", FieldTypeRef::list(FieldTypeRef::named(TypeKind::Enum, "Tag"))),
            ],
        );
        let schema = schema(vec![
            review,
            color,
            SchemaType::new(TypeKind::Enum, "Tag"),
            SchemaType::new(TypeKind::Scalar, "Int"),
            object("Unrelated", vec![field("id", string())]),
        ]);
        let index = SchemaIndex::new(&schema);
        let mut found = BTreeSet::new();
        find_all_referenced_object_types(&index, index.get("ReviewInput").unwrap(), &mut found);
        let found: Vec<_> = found.iter().map(String::as_str).collect();
        assert_eq!(found, vec!["ColorInput", "Tag"]);
    }

    #[test]
    fn test_find_referenced_types_through_cycles() {
        let schema = schema(vec![
            object("A", vec![field("b", FieldTypeRef::named(TypeKind::Object, "B"))]),
            object("B", vec![field("a", FieldTypeRef::named(TypeKind::Object, "A"))]),
        ]);
        let index = SchemaIndex::new(&schema);
        let mut found = BTreeSet::new();
        find_all_referenced_object_types(&index, index.get("A").unwrap(), &mut found);
        assert_eq!(found.len(), 2);
    }
}

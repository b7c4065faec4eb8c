//! scalar type mapping
//!
//! decides which rust type a schema member is emitted as. a
//! [`ScalarMappingProvider`] is consulted first; the built-in fallback
//! handles temporal field names, the five builtin scalars according to the
//! configured mapping modes, and a few well-known custom scalars.

use crate::config::{
    BooleanTypeMapping, FloatTypeMapping, GeneratorConfig, IdTypeMapping, IntegerTypeMapping,
};
use crate::error::{Error, Result};
use crate::naming;
use crate::resolve::NameTable;
use crate::schema::{FieldTypeRef, SchemaIndex, TypeKind};
use regex::Regex;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;

const DATE_TIME: &str = "::chrono::DateTime<::chrono::FixedOffset>";
const NAIVE_DATE: &str = "::chrono::NaiveDate";
const NAIVE_TIME: &str = "::chrono::NaiveTime";
const JSON_VALUE: &str = "::serde_json::Value";

/// member names treated as date-times whatever their declared scalar
const TEMPORAL_MEMBER_NAMES: [&str; 8] = [
    "From",
    "ValidFrom",
    "To",
    "ValidTo",
    "CreatedAt",
    "UpdatedAt",
    "ModifiedAt",
    "DeletedAt",
];

/// what a provider sees when asked about one member
#[derive(Debug, Clone, Copy)]
pub struct ScalarContext<'a> {
    /// schema name of the type declaring the member
    pub owner: &'a str,
    /// field, argument, or input field name as declared
    pub member: &'a str,
    /// the member type with non-null stripped
    pub value_type: &'a FieldTypeRef,
    /// kind of the named value type (scalar or enum)
    pub kind: TypeKind,
}

impl ScalarContext<'_> {
    /// name of the scalar or enum the member holds
    pub fn value_type_name(&self) -> &str {
        self.value_type.type_name().unwrap_or_default()
    }
}

/// a concrete target type for one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarMapping {
    /// rust type path as emitted
    pub type_name: String,
    /// format string applied when the value is encoded as an argument
    pub format_mask: Option<String>,
    /// heap or reference-like type, subject to nullable reference mode
    pub is_reference: bool,
}

impl ScalarMapping {
    pub fn value(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            format_mask: None,
            is_reference: false,
        }
    }

    pub fn reference(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            format_mask: None,
            is_reference: true,
        }
    }

    pub fn with_format_mask(mut self, mask: impl Into<String>) -> Self {
        self.format_mask = Some(mask.into());
        self
    }
}

/// pluggable strategy for scalar and enum members
///
/// returning `None` falls through to the built-in mapping.
pub trait ScalarMappingProvider: Send + Sync {
    fn resolve(&self, context: &ScalarContext<'_>) -> Option<ScalarMapping>;
}

/// one rule of a [`RuleBasedScalarMappingProvider`]
///
/// every pattern must match the whole name; a missing pattern matches
/// anything.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarRule {
    #[serde(default)]
    pub member_name: Option<String>,
    #[serde(default)]
    pub owner_type: Option<String>,
    #[serde(default)]
    pub value_type: Option<String>,
    pub target_type: String,
    #[serde(default)]
    pub format_mask: Option<String>,
    #[serde(default)]
    pub reference: bool,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<ScalarRule>,
}

#[derive(Debug)]
struct CompiledRule {
    member_name: Option<Regex>,
    owner_type: Option<Regex>,
    value_type: Option<Regex>,
    mapping: ScalarMapping,
}

impl CompiledRule {
    fn matches(&self, context: &ScalarContext<'_>) -> bool {
        let check = |pattern: &Option<Regex>, text: &str| {
            pattern.as_ref().map_or(true, |regex| regex.is_match(text))
        };
        check(&self.member_name, context.member)
            && check(&self.owner_type, context.owner)
            && check(&self.value_type, context.value_type_name())
    }
}

/// ordered pattern rules, first match wins
///
/// ```
/// use gqlforge::RuleBasedScalarMappingProvider;
///
/// let provider = RuleBasedScalarMappingProvider::from_json(
///     r#"{"rules": [{"valueType": "Money", "targetType": "::rust_decimal::Decimal"}]}"#,
/// )
/// .unwrap();
/// assert_eq!(provider.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RuleBasedScalarMappingProvider {
    rules: Vec<CompiledRule>,
}

impl RuleBasedScalarMappingProvider {
    /// compile a rule file of the form `{"rules": [...]}`
    pub fn from_json(text: &str) -> Result<Self> {
        let file: RuleFile = serde_json::from_str(text)
            .map_err(|err| Error::Config(format!("invalid scalar rule file: {err}")))?;
        Self::from_rules(file.rules)
    }

    pub fn from_rules(rules: Vec<ScalarRule>) -> Result<Self> {
        let compile = |index: usize, pattern: Option<String>| {
            pattern
                .map(|pattern| {
                    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
                        Error::Config(format!("invalid pattern in scalar rule {index}: {err}"))
                    })
                })
                .transpose()
        };

        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                if rule.target_type.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "scalar rule {index} has an empty target type"
                    )));
                }
                Ok(CompiledRule {
                    member_name: compile(index, rule.member_name)?,
                    owner_type: compile(index, rule.owner_type)?,
                    value_type: compile(index, rule.value_type)?,
                    mapping: ScalarMapping {
                        type_name: rule.target_type,
                        format_mask: rule.format_mask,
                        is_reference: rule.reference,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl ScalarMappingProvider for RuleBasedScalarMappingProvider {
    fn resolve(&self, context: &ScalarContext<'_>) -> Option<ScalarMapping> {
        self.rules
            .iter()
            .find(|rule| rule.matches(context))
            .map(|rule| rule.mapping.clone())
    }
}

/// how a member type is used in emitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// response data field, nullable whatever the schema says
    Data,
    /// input object property
    Input,
    /// field or directive argument
    Argument,
}

/// a fully rendered member type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustType {
    /// rust type as emitted, including `Option`, `Vec`, and `Box`
    pub type_name: String,
    /// format mask of the innermost scalar, if any
    pub format_mask: Option<String>,
    /// true if the outermost type is an `Option`
    pub nullable: bool,
}

/// resolves member types against the configuration and name table
pub struct TypeMapper<'a> {
    config: &'a GeneratorConfig,
    names: &'a NameTable,
    index: &'a SchemaIndex<'a>,
    warned: RefCell<BTreeSet<String>>,
}

impl fmt::Debug for TypeMapper<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapper")
            .field("provider", &self.config.scalar_provider.is_some())
            .finish()
    }
}

impl<'a> TypeMapper<'a> {
    pub fn new(config: &'a GeneratorConfig, names: &'a NameTable, index: &'a SchemaIndex<'a>) -> Self {
        Self {
            config,
            names,
            index,
            warned: RefCell::new(BTreeSet::new()),
        }
    }

    /// target type of a scalar or enum member
    ///
    /// `field_type` may still carry its non-null wrapper; nullability is
    /// taken from it unless `always_nullable` is set.
    pub fn resolve_scalar_type(
        &self,
        owner: &str,
        member: &str,
        field_type: &FieldTypeRef,
        always_nullable: bool,
    ) -> Result<RustType> {
        let mapping = self.scalar_mapping(owner, member, field_type.unwrap_non_null())?;
        let nullable = self.is_nullable(
            !field_type.is_non_null() || always_nullable,
            mapping.is_reference,
        );
        Ok(RustType {
            type_name: wrap_option(mapping.type_name, nullable),
            format_mask: mapping.format_mask,
            nullable,
        })
    }

    /// render the full wrapper chain of a member type
    pub fn rust_type(
        &self,
        owner: &str,
        member: &str,
        field_type: &FieldTypeRef,
        usage: Usage,
    ) -> Result<RustType> {
        let always_nullable = usage == Usage::Data;
        let (type_name, format_mask, is_reference) =
            self.render(owner, member, field_type.unwrap_non_null(), usage, false)?;
        let nullable = match usage {
            // the outer option of an argument marks it as omitted
            Usage::Argument => false,
            _ => self.is_nullable(!field_type.is_non_null() || always_nullable, is_reference),
        };
        Ok(RustType {
            type_name: wrap_option(type_name, nullable),
            format_mask,
            nullable,
        })
    }

    fn is_nullable(&self, nullable: bool, is_reference: bool) -> bool {
        nullable && (!is_reference || self.config.nullable_references)
    }

    /// `ty` has its non-null wrapper already stripped
    fn render(
        &self,
        owner: &str,
        member: &str,
        ty: &FieldTypeRef,
        usage: Usage,
        in_list: bool,
    ) -> Result<(String, Option<String>, bool)> {
        match ty.kind {
            TypeKind::List => {
                let element = ty
                    .of_type
                    .as_deref()
                    .ok_or_else(|| Error::schema(owner, member, "list element type cannot be resolved"))?;
                let (inner, mask, is_reference) =
                    self.render(owner, member, element.unwrap_non_null(), usage, true)?;
                let nullable = self.is_nullable(!element.is_non_null(), is_reference);
                Ok((format!("Vec<{}>", wrap_option(inner, nullable)), mask, true))
            }
            TypeKind::NonNull => Err(Error::schema(owner, member, "doubly wrapped non-null type")),
            TypeKind::Scalar | TypeKind::Enum => {
                let mapping = self.scalar_mapping(owner, member, ty)?;
                Ok((mapping.type_name, mapping.format_mask, mapping.is_reference))
            }
            TypeKind::Object | TypeKind::Interface | TypeKind::Union | TypeKind::InputObject => {
                let target = self.index.resolve_ref(owner, member, ty)?;
                let class = self.names.class_name(&target.name);
                let boxed = !in_list && usage != Usage::Argument;
                let type_name = if boxed { format!("Box<{class}>") } else { class };
                Ok((type_name, None, true))
            }
        }
    }

    fn scalar_mapping(&self, owner: &str, member: &str, ty: &FieldTypeRef) -> Result<ScalarMapping> {
        let target = self.index.resolve_ref(owner, member, ty)?;
        let context = ScalarContext {
            owner,
            member,
            value_type: ty,
            kind: target.kind,
        };

        if let Some(provider) = &self.config.scalar_provider {
            if let Some(mapping) = provider.resolve(&context) {
                return Ok(mapping);
            }
        }

        match target.kind {
            TypeKind::Enum => return Ok(ScalarMapping::value(self.names.class_name(&target.name))),
            TypeKind::Scalar => {}
            _ => {
                return Err(Error::schema(
                    owner,
                    member,
                    format!("`{}` is not a scalar or enum type", target.name),
                ))
            }
        }

        if is_temporal_member(member) {
            return Ok(ScalarMapping::value(DATE_TIME));
        }

        let custom = |scalar: &str| {
            Error::Config(format!(
                "custom {scalar} mapping selected but no provider mapped {owner}.{member}"
            ))
        };

        let mapping = match target.name.as_str() {
            "Int" => match self.config.integer_type {
                IntegerTypeMapping::Int16 => ScalarMapping::value("i16"),
                IntegerTypeMapping::Int32 => ScalarMapping::value("i32"),
                IntegerTypeMapping::Int64 => ScalarMapping::value("i64"),
                IntegerTypeMapping::Custom => return Err(custom("Int")),
            },
            "Float" => match self.config.float_type {
                FloatTypeMapping::Decimal => ScalarMapping::value("::rust_decimal::Decimal"),
                FloatTypeMapping::Float => ScalarMapping::value("f32"),
                FloatTypeMapping::Double => ScalarMapping::value("f64"),
                FloatTypeMapping::Custom => return Err(custom("Float")),
            },
            "Boolean" => match self.config.boolean_type {
                BooleanTypeMapping::Boolean => ScalarMapping::value("bool"),
                BooleanTypeMapping::Custom => return Err(custom("Boolean")),
            },
            "ID" => match self.config.id_type {
                IdTypeMapping::String => ScalarMapping::reference("String"),
                IdTypeMapping::Guid => ScalarMapping::value("::uuid::Uuid"),
                IdTypeMapping::Object => ScalarMapping::reference(JSON_VALUE),
                IdTypeMapping::Custom => return Err(custom("ID")),
            },
            "String" => ScalarMapping::reference("String"),
            "DateTime" => ScalarMapping::value(DATE_TIME),
            "Date" => ScalarMapping::value(NAIVE_DATE),
            "Time" => ScalarMapping::value(NAIVE_TIME),
            other => {
                if self.warned.borrow_mut().insert(other.to_string()) {
                    tracing::warn!(scalar = other, "no mapping for custom scalar, using serde_json::Value");
                }
                ScalarMapping::reference(JSON_VALUE)
            }
        };
        Ok(mapping)
    }
}

/// well-known temporal names, compared in PascalCase
fn is_temporal_member(member: &str) -> bool {
    let pascal = naming::pascal_case(member);
    TEMPORAL_MEMBER_NAMES.contains(&pascal.as_str()) || pascal.ends_with("Timestamp")
}

fn wrap_option(type_name: String, nullable: bool) -> String {
    if nullable {
        format!("Option<{type_name}>")
    } else {
        type_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, NamedRef, Schema, SchemaType};
    use std::sync::Arc;

    fn scalar(name: &str) -> FieldTypeRef {
        FieldTypeRef::named(TypeKind::Scalar, name)
    }

    fn schema() -> Schema {
        let mut me = SchemaType::new(TypeKind::Object, "Me");
        me.fields = Some(vec![Field {
            name: "name".to_string(),
            description: None,
            args: vec![],
            field_type: scalar("String"),
            is_deprecated: false,
            deprecation_reason: None,
        }]);
        let mut types = vec![me, SchemaType::new(TypeKind::Enum, "Status")];
        for name in ["Int", "Float", "String", "Boolean", "ID", "Money", "DateTime"] {
            types.push(SchemaType::new(TypeKind::Scalar, name));
        }
        Schema {
            query_type: Some(NamedRef { name: "Me".to_string() }),
            mutation_type: None,
            subscription_type: None,
            types,
            directives: vec![],
        }
    }

    fn with_mapper<T>(config: GeneratorConfig, f: impl FnOnce(&TypeMapper<'_>) -> T) -> T {
        let schema = schema();
        let index = SchemaIndex::new(&schema);
        let names = NameTable::build(&index, &config).unwrap();
        let mapper = TypeMapper::new(&config, &names, &index);
        f(&mapper)
    }

    #[test]
    fn test_nullable_string_on_me() {
        let ty = with_mapper(GeneratorConfig::default(), |mapper| {
            mapper.rust_type("Me", "name", &scalar("String"), Usage::Data).unwrap()
        });
        assert_eq!(ty.type_name, "Option<String>");
        assert!(ty.nullable);
    }

    #[test]
    fn test_nullable_references_disabled() {
        let config = GeneratorConfig::default().with_nullable_references(false);
        let ty = with_mapper(config, |mapper| {
            mapper.rust_type("Me", "name", &scalar("String"), Usage::Data).unwrap()
        });
        assert_eq!(ty.type_name, "String");
        let ty = with_mapper(GeneratorConfig::default().with_nullable_references(false), |mapper| {
            mapper.rust_type("Me", "age", &scalar("Int"), Usage::Data).unwrap()
        });
        assert_eq!(ty.type_name, "Option<i32>");
    }

    #[test]
    fn test_builtin_modes() {
        let config = GeneratorConfig::default()
            .with_integer_type(IntegerTypeMapping::Int64)
            .with_float_type(FloatTypeMapping::Decimal)
            .with_id_type(IdTypeMapping::Guid);
        with_mapper(config, |mapper| {
            let non_null = |name| FieldTypeRef::non_null(scalar(name));
            let int = mapper.resolve_scalar_type("Me", "count", &non_null("Int"), false).unwrap();
            assert_eq!(int.type_name, "i64");
            let float = mapper.resolve_scalar_type("Me", "price", &scalar("Float"), false).unwrap();
            assert_eq!(float.type_name, "Option<::rust_decimal::Decimal>");
            let id = mapper.resolve_scalar_type("Me", "id", &non_null("ID"), false).unwrap();
            assert_eq!(id.type_name, "::uuid::Uuid");
            let forced = mapper.resolve_scalar_type("Me", "id", &non_null("ID"), true).unwrap();
            assert_eq!(forced.type_name, "Option<::uuid::Uuid>");
        });
    }

    #[test]
    fn test_temporal_heuristic_and_well_known() {
        with_mapper(GeneratorConfig::default(), |mapper| {
            for member in ["createdAt", "validFrom", "to", "lastSeenTimestamp"] {
                let ty = mapper
                    .resolve_scalar_type("Me", member, &FieldTypeRef::non_null(scalar("String")), false)
                    .unwrap();
                assert_eq!(ty.type_name, DATE_TIME, "{member}");
            }
            let ty = mapper
                .resolve_scalar_type("Me", "at", &FieldTypeRef::non_null(scalar("DateTime")), false)
                .unwrap();
            assert_eq!(ty.type_name, DATE_TIME);
            let ty = mapper
                .resolve_scalar_type("Me", "total", &scalar("Money"), false)
                .unwrap();
            assert_eq!(ty.type_name, "Option<::serde_json::Value>");
        });
    }

    #[test]
    fn test_custom_mode_requires_provider() {
        let config = GeneratorConfig::default().with_integer_type(IntegerTypeMapping::Custom);
        let err = with_mapper(config, |mapper| {
            mapper.resolve_scalar_type("Me", "count", &scalar("Int"), false).unwrap_err()
        });
        assert!(err.is_config_error());

        let provider = RuleBasedScalarMappingProvider::from_json(
            r#"{"rules": [{"valueType": "Int", "targetType": "u64"}]}"#,
        )
        .unwrap();
        let config = GeneratorConfig::default()
            .with_integer_type(IntegerTypeMapping::Custom)
            .with_scalar_provider(Arc::new(provider));
        let ty = with_mapper(config, |mapper| {
            mapper.resolve_scalar_type("Me", "count", &scalar("Int"), false).unwrap()
        });
        assert_eq!(ty.type_name, "Option<u64>");
    }

    #[test]
    fn test_rule_provider_first_match_wins() {
        let provider = RuleBasedScalarMappingProvider::from_json(
            r#"{"rules": [
                {"ownerType": "Invoice", "valueType": "Money", "targetType": "i64"},
                {"memberName": "birth.*", "targetType": "::chrono::NaiveDate", "formatMask": "%Y-%m-%d"},
                {"valueType": "Money", "targetType": "::rust_decimal::Decimal"}
            ]}"#,
        )
        .unwrap();
        let money = scalar("Money");
        let context = |owner, member| ScalarContext {
            owner,
            member,
            value_type: &money,
            kind: TypeKind::Scalar,
        };
        assert_eq!(provider.resolve(&context("Invoice", "total")).unwrap().type_name, "i64");
        assert_eq!(
            provider.resolve(&context("Order", "total")).unwrap().type_name,
            "::rust_decimal::Decimal"
        );
        let birth = provider.resolve(&context("Person", "birthday")).unwrap();
        assert_eq!(birth.format_mask.as_deref(), Some("%Y-%m-%d"));

        let string = scalar("String");
        let other = ScalarContext {
            owner: "Person",
            member: "name",
            value_type: &string,
            kind: TypeKind::Scalar,
        };
        assert!(provider.resolve(&other).is_none());
    }

    #[test]
    fn test_invalid_rule_file() {
        let err = RuleBasedScalarMappingProvider::from_json(r#"{"rules": [{"memberName": "(", "targetType": "x"}]}"#)
            .unwrap_err();
        assert!(err.is_config_error());
        assert!(RuleBasedScalarMappingProvider::from_json("[]").is_err());
    }

    #[test]
    fn test_enum_and_list_rendering() {
        with_mapper(GeneratorConfig::default(), |mapper| {
            let list = FieldTypeRef::non_null(FieldTypeRef::list(FieldTypeRef::named(TypeKind::Enum, "Status")));
            let ty = mapper.rust_type("Me", "states", &list, Usage::Input).unwrap();
            assert_eq!(ty.type_name, "Vec<Option<Status>>");
            let arg = mapper
                .rust_type("Me", "owner", &FieldTypeRef::named(TypeKind::Object, "Me"), Usage::Argument)
                .unwrap();
            assert_eq!(arg.type_name, "Me");
            let data = mapper
                .rust_type("Me", "me", &FieldTypeRef::named(TypeKind::Object, "Me"), Usage::Data)
                .unwrap();
            assert_eq!(data.type_name, "Option<Box<Me>>");
        });
    }
}

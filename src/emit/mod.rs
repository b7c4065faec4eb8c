//! emission pipeline
//!
//! generation runs a fixed sequence of phases. every member is rendered to
//! text first and only then handed to an [`OutputTarget`], so a failing run
//! never exposes partial output and both packaging strategies receive the
//! exact same member text.

mod builders;
mod data;
mod directives;
mod enums;
mod inputs;
mod shared;
mod target;

pub use target::{
    FileDescriptor, GeneratedFile, GeneratedFiles, MultiFileTarget, OutputTarget,
    SingleStreamTarget,
};

use crate::config::{GeneratorConfig, OutputMode};
use crate::error::Result;
use crate::naming;
use crate::resolve::{derived_item_names, find_all_referenced_object_types, NameTable};
use crate::scalar::{TypeMapper, Usage};
use crate::schema::{Argument, Field, Schema, SchemaIndex, SchemaType, TypeKind};
use std::collections::{BTreeSet, HashSet};

/// generation phases, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    SharedRuntime,
    TypeNames,
    Enums,
    Directives,
    QueryBuilders,
    InputObjects,
    DataClasses,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::SharedRuntime,
        Phase::TypeNames,
        Phase::Enums,
        Phase::Directives,
        Phase::QueryBuilders,
        Phase::InputObjects,
        Phase::DataClasses,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Phase::SharedRuntime => "shared runtime",
            Phase::TypeNames => "type names",
            Phase::Enums => "enums",
            Phase::Directives => "directives",
            Phase::QueryBuilders => "query builders",
            Phase::InputObjects => "input objects",
            Phase::DataClasses => "data classes",
        }
    }

    /// phases whose members carry nullable member types
    pub fn uses_nullable_references(self) -> bool {
        matches!(self, Phase::InputObjects | Phase::DataClasses)
    }
}

/// one named unit of generated code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// rust name of the member's main item
    pub name: String,
    pub content: String,
}

/// run-wide settings a target may need before the first phase
#[derive(Debug, Clone)]
pub struct GenerationInfo {
    pub namespace: String,
    pub nullable_references: bool,
    pub crate_name: Option<String>,
    pub runtime_dependency: Option<String>,
}

/// output of [`generate_output`], shaped by the configured mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedOutput {
    Single(String),
    Files(GeneratedFiles),
}

/// generate into one source text
pub fn generate_single(schema: &Schema, config: &GeneratorConfig) -> Result<String> {
    let mut target = SingleStreamTarget::new();
    generate(schema, config, &mut target)?;
    Ok(target.into_output())
}

/// generate into one file per member
pub fn generate_files(schema: &Schema, config: &GeneratorConfig) -> Result<GeneratedFiles> {
    let mut target = MultiFileTarget::new();
    generate(schema, config, &mut target)?;
    Ok(target.into_output())
}

/// generate with the packaging selected by `config`
pub fn generate_output(schema: &Schema, config: &GeneratorConfig) -> Result<GeneratedOutput> {
    match config.output {
        OutputMode::SingleStream => generate_single(schema, config).map(GeneratedOutput::Single),
        OutputMode::MultiFile => generate_files(schema, config).map(GeneratedOutput::Files),
    }
}

/// run every phase against `target`
///
/// configuration and schema are validated, names resolved, and all members
/// rendered before the target sees its first call.
pub fn generate(schema: &Schema, config: &GeneratorConfig, target: &mut dyn OutputTarget) -> Result<()> {
    config.validate()?;
    schema.validate()?;

    let index = SchemaIndex::new(schema);
    let names = NameTable::build(&index, config)?;
    let mapper = TypeMapper::new(config, &names, &index);
    let ctx = Context::new(config, &index, &names, &mapper);

    let mut rendered = Vec::with_capacity(Phase::ALL.len());
    for phase in Phase::ALL {
        let members = ctx.render_phase(phase)?;
        tracing::debug!(phase = phase.label(), members = members.len(), "rendered phase");
        rendered.push((phase, members));
    }

    target.before_generation(&GenerationInfo {
        namespace: config.namespace.clone(),
        nullable_references: config.nullable_references,
        crate_name: config.crate_name.clone(),
        runtime_dependency: config.runtime_dependency.clone(),
    })?;
    for (phase, members) in rendered {
        target.before_phase(phase)?;
        for member in members {
            target.begin_member(&member.name)?;
            target.write(&member.content)?;
            target.end_member()?;
        }
        target.after_phase(phase)?;
    }
    target.after_generation()
}

/// read-only state shared by the member emitters of one run
pub(crate) struct Context<'a> {
    pub(crate) config: &'a GeneratorConfig,
    pub(crate) index: &'a SchemaIndex<'a>,
    pub(crate) names: &'a NameTable,
    pub(crate) mapper: &'a TypeMapper<'a>,
    /// runtime path as written in emitted code
    pub(crate) rt: &'a str,
    /// complex types that get builders and data types, in schema order
    pub(crate) complex: Vec<&'a SchemaType>,
}

impl<'a> Context<'a> {
    fn new(
        config: &'a GeneratorConfig,
        index: &'a SchemaIndex<'a>,
        names: &'a NameTable,
        mapper: &'a TypeMapper<'a>,
    ) -> Self {
        let schema = index.schema();
        let reachable = config
            .prune_unreachable_types
            .then(|| reachable_types(index));
        let complex = schema
            .generated_types()
            .filter(|ty| ty.kind.is_complex())
            .filter(|ty| reachable.as_ref().map_or(true, |set| set.contains(&ty.name)))
            .collect();
        Self {
            config,
            index,
            names,
            mapper,
            rt: &config.runtime_path,
            complex,
        }
    }

    fn render_phase(&self, phase: Phase) -> Result<Vec<Member>> {
        let schema = self.index.schema();
        match phase {
            Phase::SharedRuntime => Ok(vec![shared::emit_runtime(self)?]),
            Phase::TypeNames => Ok(vec![shared::emit_type_names(self)?]),
            Phase::Enums => schema
                .generated_types()
                .filter(|ty| ty.kind == TypeKind::Enum)
                .map(|ty| enums::emit_enum(self, ty))
                .collect(),
            Phase::Directives => schema
                .directives
                .iter()
                .filter(|directive| {
                    directive
                        .locations
                        .iter()
                        .any(|location| location.is_executable_selection())
                })
                .map(|directive| directives::emit_directive(self, directive))
                .collect(),
            Phase::QueryBuilders => self
                .complex
                .iter()
                .map(|ty| builders::emit_builder(self, ty))
                .collect(),
            Phase::InputObjects => schema
                .generated_types()
                .filter(|ty| ty.kind == TypeKind::InputObject)
                .map(|ty| inputs::emit_input(self, ty))
                .collect(),
            Phase::DataClasses => self
                .complex
                .iter()
                .map(|ty| data::emit_data(self, ty))
                .collect(),
        }
    }

    pub(crate) fn class_name(&self, schema_name: &str) -> Result<String> {
        let name = self.names.class_name(schema_name);
        naming::ensure_identifier(&name)?;
        Ok(name)
    }

    pub(crate) fn builder_name(&self, schema_name: &str) -> Result<String> {
        let [builder, _] = derived_item_names(&self.class_name(schema_name)?);
        Ok(builder)
    }

    pub(crate) fn metadata_static(&self, schema_name: &str) -> Result<String> {
        let [_, metadata] = derived_item_names(&self.class_name(schema_name)?);
        Ok(metadata)
    }

    /// fields of a complex type after the deprecation filter
    pub(crate) fn selected_fields(&self, ty: &'a SchemaType) -> Result<Vec<&'a Field>> {
        Ok(self
            .index
            .effective_fields(ty)?
            .into_iter()
            .filter(|field| self.config.include_deprecated || !field.is_deprecated)
            .collect())
    }

    pub(crate) fn code(&self) -> Code {
        Code::new(self.config.indent())
    }

    /// argument members of a field or directive, in declared order
    pub(crate) fn argument_fields<'s>(
        &self,
        owner: &str,
        args: &'s [Argument],
    ) -> Result<Vec<ArgumentField<'s>>> {
        let idents = member_idents(args.iter().map(|arg| arg.name.as_str()))?;
        args.iter()
            .zip(idents)
            .map(|(arg, ident)| {
                let ty = self
                    .mapper
                    .rust_type(owner, &arg.name, &arg.value_type, Usage::Argument)?;
                Ok(ArgumentField {
                    arg,
                    ident,
                    value_type: ty.type_name,
                    format_mask: ty.format_mask,
                })
            })
            .collect()
    }
}

/// one argument as a rust member
pub(crate) struct ArgumentField<'s> {
    pub(crate) arg: &'s Argument,
    pub(crate) ident: String,
    /// value type without the parameter wrapper
    pub(crate) value_type: String,
    pub(crate) format_mask: Option<String>,
}

impl ArgumentField<'_> {
    pub(crate) fn is_required(&self) -> bool {
        self.arg.is_required()
    }

    /// `Parameter<T>` for this argument
    pub(crate) fn parameter_type(&self, rt: &str) -> String {
        format!("{rt}::Parameter<{}>", self.value_type)
    }

    /// expression building the runtime argument from `source`
    pub(crate) fn argument_expr(&self, rt: &str, source: &str) -> String {
        argument_expr(rt, &self.arg.name, source, self.format_mask.as_deref())
    }
}

/// `Argument::new(..)` with an optional format mask
pub(crate) fn argument_expr(rt: &str, name: &str, source: &str, mask: Option<&str>) -> String {
    let mut expr = format!("{rt}::Argument::new({}, {source})", naming::string_literal(name));
    if let Some(mask) = mask {
        expr.push_str(&format!(".with_format_mask({})", naming::string_literal(mask)));
    }
    expr
}

/// complex types reachable from the root operations or from input objects
fn reachable_types(index: &SchemaIndex<'_>) -> BTreeSet<String> {
    let schema = index.schema();
    let mut found = BTreeSet::new();
    let roots = [
        schema.query_type_name(),
        schema.mutation_type_name(),
        schema.subscription_type_name(),
    ];
    for root in roots.into_iter().flatten() {
        if let Some(ty) = index.get(root) {
            found.insert(ty.name.clone());
            find_all_referenced_object_types(index, ty, &mut found);
        }
    }
    for ty in schema
        .generated_types()
        .filter(|ty| ty.kind == TypeKind::InputObject)
    {
        find_all_referenced_object_types(index, ty, &mut found);
    }
    found
}

/// unique member identifiers for a list of schema names, in order
pub(crate) fn member_idents<'n>(names: impl IntoIterator<Item = &'n str>) -> Result<Vec<String>> {
    let mut used = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let base = naming::field_name(name);
            let mut ident = base.clone();
            let mut n = 2;
            while !used.insert(naming::unraw(&ident).to_string()) {
                ident = format!("{}_{n}", naming::unraw(&base));
                n += 1;
            }
            naming::ensure_member_identifier(&ident)?;
            Ok(ident)
        })
        .collect()
}

/// line-oriented text buffer for emitted source
pub(crate) struct Code {
    out: String,
    indent: String,
}

impl Code {
    pub(crate) fn new(indent: String) -> Self {
        Self {
            out: String::new(),
            indent,
        }
    }

    pub(crate) fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..depth {
                self.out.push_str(&self.indent);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `///` lines for a schema description
    pub(crate) fn doc(&mut self, depth: usize, text: Option<&str>) {
        let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
            return;
        };
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                self.line(depth, "///");
            } else {
                self.line(depth, format!("/// {line}"));
            }
        }
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

//! generate a typed graphql client from a schema
//!
//! the schema comes from a live endpoint (`--url`) or a file (`--schema`).
//! `.json` files hold an introspection result, anything else is read as
//! sdl. nothing is written unless the whole run succeeded.

use anyhow::{bail, Context as _, Result};
use clap::{Parser, ValueEnum};
use gqlforge::{
    generate_output, schema, BooleanTypeMapping, Client, ClientConfig, FloatTypeMapping,
    GeneratedOutput, GeneratorConfig, IdTypeMapping, IntegerTypeMapping, IntrospectionResponse,
    OutputMode, RuleBasedScalarMappingProvider, Schema,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// generate selection builders and data types from a graphql schema
#[derive(Parser, Debug)]
#[command(name = "gqlforge-codegen", version)]
struct Args {
    /// graphql endpoint to introspect
    #[arg(long, required_unless_present = "schema", conflicts_with = "schema")]
    url: Option<String>,

    /// extra request header as `name: value`; repeatable
    #[arg(long = "header", value_name = "NAME: VALUE")]
    headers: Vec<String>,

    /// bearer token for the endpoint
    #[arg(long)]
    token: Option<String>,

    /// request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// skip tls certificate verification
    #[arg(long)]
    insecure: bool,

    /// introspection json or sdl file
    #[arg(long)]
    schema: Option<PathBuf>,

    /// output file, or output directory with --multi-file
    #[arg(long, short)]
    out: PathBuf,

    /// module wrapping single-file output
    #[arg(long, default_value = "graphql")]
    namespace: String,

    /// prefix for every generated type name
    #[arg(long, default_value = "")]
    prefix: String,

    /// suffix for every generated type name
    #[arg(long, default_value = "")]
    suffix: String,

    /// explicit type name as `SchemaName=RustName`; repeatable
    #[arg(long = "override", value_name = "SCHEMA=RUST")]
    overrides: Vec<String>,

    #[arg(long, value_enum, default_value_t = IntegerMode::Int32)]
    integer_type: IntegerMode,

    #[arg(long, value_enum, default_value_t = FloatMode::Double)]
    float_type: FloatMode,

    #[arg(long, value_enum, default_value_t = BooleanMode::Boolean)]
    boolean_type: BooleanMode,

    #[arg(long, value_enum, default_value_t = IdMode::String)]
    id_type: IdMode,

    /// json rule file for scalar mapping
    #[arg(long)]
    scalar_rules: Option<PathBuf>,

    /// emit non-null reference types without `Option`
    #[arg(long)]
    no_nullable_references: bool,

    /// leave out deprecated fields and enum values
    #[arg(long)]
    exclude_deprecated: bool,

    /// only emit types reachable from the root operations or input objects
    #[arg(long)]
    prune: bool,

    /// one file per generated member
    #[arg(long)]
    multi_file: bool,

    /// write a Cargo.toml with this package name (multi-file only)
    #[arg(long, requires = "multi_file")]
    crate_name: Option<String>,

    /// dependency value for gqlforge in the generated Cargo.toml
    #[arg(long, requires = "crate_name")]
    runtime_dependency: Option<String>,

    /// path of the runtime module in generated code
    #[arg(long)]
    runtime_path: Option<String>,

    /// indent width of generated code
    #[arg(long, default_value_t = 4)]
    indent: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IntegerMode {
    Int16,
    Int32,
    Int64,
    Custom,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FloatMode {
    Decimal,
    Float,
    Double,
    Custom,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BooleanMode {
    Boolean,
    Custom,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IdMode {
    String,
    Guid,
    Object,
    Custom,
}

impl From<IntegerMode> for IntegerTypeMapping {
    fn from(mode: IntegerMode) -> Self {
        match mode {
            IntegerMode::Int16 => IntegerTypeMapping::Int16,
            IntegerMode::Int32 => IntegerTypeMapping::Int32,
            IntegerMode::Int64 => IntegerTypeMapping::Int64,
            IntegerMode::Custom => IntegerTypeMapping::Custom,
        }
    }
}

impl From<FloatMode> for FloatTypeMapping {
    fn from(mode: FloatMode) -> Self {
        match mode {
            FloatMode::Decimal => FloatTypeMapping::Decimal,
            FloatMode::Float => FloatTypeMapping::Float,
            FloatMode::Double => FloatTypeMapping::Double,
            FloatMode::Custom => FloatTypeMapping::Custom,
        }
    }
}

impl From<BooleanMode> for BooleanTypeMapping {
    fn from(mode: BooleanMode) -> Self {
        match mode {
            BooleanMode::Boolean => BooleanTypeMapping::Boolean,
            BooleanMode::Custom => BooleanTypeMapping::Custom,
        }
    }
}

impl From<IdMode> for IdTypeMapping {
    fn from(mode: IdMode) -> Self {
        match mode {
            IdMode::String => IdTypeMapping::String,
            IdMode::Guid => IdTypeMapping::Guid,
            IdMode::Object => IdTypeMapping::Object,
            IdMode::Custom => IdTypeMapping::Custom,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = generator_config(&args)?;
    let schema = load_schema(&args).await?;
    tracing::info!(types = schema.types.len(), "schema loaded");

    let output = generate_output(&schema, &config).context("code generation failed")?;
    write_output(&args.out, &output)?;
    Ok(())
}

fn generator_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = GeneratorConfig::new()
        .with_namespace(&args.namespace)
        .with_class_prefix(&args.prefix)
        .with_class_suffix(&args.suffix)
        .with_nullable_references(!args.no_nullable_references)
        .with_integer_type(args.integer_type.into())
        .with_float_type(args.float_type.into())
        .with_boolean_type(args.boolean_type.into())
        .with_id_type(args.id_type.into())
        .with_deprecated(!args.exclude_deprecated)
        .with_indent_width(args.indent)
        .with_unreachable_types_pruned(args.prune);

    for raw in &args.overrides {
        let (schema_name, rust_name) = parse_override(raw)?;
        config = config.with_type_name_override(schema_name, rust_name);
    }
    if args.multi_file {
        config = config.with_output(OutputMode::MultiFile);
    }
    if let Some(name) = &args.crate_name {
        config = config.with_crate_name(name);
    }
    if let Some(dependency) = &args.runtime_dependency {
        config = config.with_runtime_dependency(dependency);
    }
    if let Some(path) = &args.runtime_path {
        config = config.with_runtime_path(path);
    }
    if let Some(path) = &args.scalar_rules {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let provider = RuleBasedScalarMappingProvider::from_json(&text)?;
        tracing::debug!(rules = provider.len(), "scalar rules loaded");
        config = config.with_scalar_provider(Arc::new(provider));
    }

    config.validate()?;
    Ok(config)
}

fn parse_override(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((schema_name, rust_name)) if !schema_name.trim().is_empty() => {
            Ok((schema_name.trim(), rust_name.trim()))
        }
        _ => bail!("override must be `SchemaName=RustName`: {raw}"),
    }
}

async fn load_schema(args: &Args) -> Result<Schema> {
    if let Some(path) = &args.schema {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let schema = if is_json {
            IntrospectionResponse::from_json(&text)?.into_schema()?
        } else {
            schema::sdl::parse(&text)?
        };
        return Ok(schema);
    }

    let Some(url) = &args.url else {
        bail!("--url or --schema is required");
    };
    let mut config = ClientConfig::new(url)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_ssl_verification(!args.insecure);
    if let Some(token) = &args.token {
        config = config.with_token(token);
    }
    for header in &args.headers {
        config = config.with_raw_header(header)?;
    }

    let client = Client::new(config)?;
    client
        .fetch_schema()
        .await
        .with_context(|| format!("failed to introspect {url}"))
}

fn write_output(out: &Path, output: &GeneratedOutput) -> Result<()> {
    match output {
        GeneratedOutput::Single(text) => {
            write_file(out, text)?;
            tracing::info!(path = %out.display(), bytes = text.len(), "wrote client");
        }
        GeneratedOutput::Files(files) => {
            for file in &files.files {
                write_file(&out.join(&file.name), &file.content)?;
            }
            for descriptor in files.manifest() {
                tracing::debug!(file = %descriptor.name, bytes = descriptor.size, "wrote file");
            }
            tracing::info!(dir = %out.display(), files = files.files.len(), "wrote client");
        }
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

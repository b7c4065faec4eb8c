//! configuration
//!
//! [`GeneratorConfig`] drives code generation; [`ClientConfig`] drives the
//! introspection client. both are built with chained `with_*` calls and
//! checked with `validate()` before use.

use crate::error::{Error, Result};
use crate::naming;
use crate::scalar::ScalarMappingProvider;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// rust type emitted for `Int`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegerTypeMapping {
    Int16,
    #[default]
    Int32,
    Int64,
    /// defer to the scalar provider
    Custom,
}

/// rust type emitted for `Float`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FloatTypeMapping {
    Decimal,
    Float,
    #[default]
    Double,
    /// defer to the scalar provider
    Custom,
}

/// rust type emitted for `Boolean`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BooleanTypeMapping {
    #[default]
    Boolean,
    /// defer to the scalar provider
    Custom,
}

/// rust type emitted for `ID`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdTypeMapping {
    #[default]
    String,
    Guid,
    Object,
    /// defer to the scalar provider
    Custom,
}

/// packaging of the generated code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// one source file wrapping everything in a module
    #[default]
    SingleStream,
    /// one source file per member plus a `lib.rs`
    MultiFile,
}

/// configuration for one generation run
#[derive(Clone)]
pub struct GeneratorConfig {
    /// module wrapping single-stream output
    pub(crate) namespace: String,

    /// prepended to every generated type name
    pub(crate) class_prefix: String,

    /// appended to every generated type name
    pub(crate) class_suffix: String,

    /// schema type name to rust type name, used verbatim
    pub(crate) type_name_overrides: BTreeMap<String, String>,

    /// whether reference-like types become `Option` when nullable
    pub(crate) nullable_references: bool,

    pub(crate) integer_type: IntegerTypeMapping,
    pub(crate) float_type: FloatTypeMapping,
    pub(crate) boolean_type: BooleanTypeMapping,
    pub(crate) id_type: IdTypeMapping,

    /// whether deprecated fields and enum values are generated
    pub(crate) include_deprecated: bool,

    pub(crate) output: OutputMode,

    /// indent unit of the emitted source
    pub(crate) indent_width: u8,

    /// consulted before the built-in scalar mapping
    pub(crate) scalar_provider: Option<Arc<dyn ScalarMappingProvider>>,

    /// path of the query-builder runtime in emitted code
    pub(crate) runtime_path: String,

    /// package name of a generated `Cargo.toml` (multi-file only)
    pub(crate) crate_name: Option<String>,

    /// dependency line for the runtime crate in a generated `Cargo.toml`
    pub(crate) runtime_dependency: Option<String>,

    /// only emit complex types reachable from roots and input objects
    pub(crate) prune_unreachable_types: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: "graphql".to_string(),
            class_prefix: String::new(),
            class_suffix: String::new(),
            type_name_overrides: BTreeMap::new(),
            nullable_references: true,
            integer_type: IntegerTypeMapping::default(),
            float_type: FloatTypeMapping::default(),
            boolean_type: BooleanTypeMapping::default(),
            id_type: IdTypeMapping::default(),
            include_deprecated: true,
            output: OutputMode::default(),
            indent_width: 4,
            scalar_provider: None,
            runtime_path: "::gqlforge::runtime".to_string(),
            crate_name: None,
            runtime_dependency: None,
            prune_unreachable_types: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// module name for single-stream output
    ///
    /// default: `graphql`
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    pub fn with_class_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.class_suffix = suffix.into();
        self
    }

    /// emit `schema_name` as `rust_name`, bypassing collision handling
    pub fn with_type_name_override(
        mut self,
        schema_name: impl Into<String>,
        rust_name: impl Into<String>,
    ) -> Self {
        self.type_name_overrides
            .insert(schema_name.into(), rust_name.into());
        self
    }

    /// default: enabled
    pub fn with_nullable_references(mut self, enabled: bool) -> Self {
        self.nullable_references = enabled;
        self
    }

    pub fn with_integer_type(mut self, mapping: IntegerTypeMapping) -> Self {
        self.integer_type = mapping;
        self
    }

    pub fn with_float_type(mut self, mapping: FloatTypeMapping) -> Self {
        self.float_type = mapping;
        self
    }

    pub fn with_boolean_type(mut self, mapping: BooleanTypeMapping) -> Self {
        self.boolean_type = mapping;
        self
    }

    pub fn with_id_type(mut self, mapping: IdTypeMapping) -> Self {
        self.id_type = mapping;
        self
    }

    /// default: enabled
    pub fn with_deprecated(mut self, include: bool) -> Self {
        self.include_deprecated = include;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// default: 4
    pub fn with_indent_width(mut self, width: u8) -> Self {
        self.indent_width = width;
        self
    }

    pub fn with_scalar_provider(mut self, provider: Arc<dyn ScalarMappingProvider>) -> Self {
        self.scalar_provider = Some(provider);
        self
    }

    /// default: `::gqlforge::runtime`
    pub fn with_runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// emit a `Cargo.toml` for multi-file output
    pub fn with_crate_name(mut self, name: impl Into<String>) -> Self {
        self.crate_name = Some(name.into());
        self
    }

    /// dependency value written for `gqlforge`, e.g. `{ path = "../gqlforge" }`
    pub fn with_runtime_dependency(mut self, value: impl Into<String>) -> Self {
        self.runtime_dependency = Some(value.into());
        self
    }

    pub fn with_unreachable_types_pruned(mut self, prune: bool) -> Self {
        self.prune_unreachable_types = prune;
        self
    }

    pub fn output(&self) -> OutputMode {
        self.output
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// one indent unit of emitted source
    pub(crate) fn indent(&self) -> String {
        " ".repeat(usize::from(self.indent_width))
    }

    /// validate the configuration
    pub fn validate(&self) -> Result<()> {
        naming::ensure_identifier(&self.namespace)
            .map_err(|err| Error::Config(format!("invalid namespace: {err}")))?;

        for (label, affix) in [("prefix", &self.class_prefix), ("suffix", &self.class_suffix)] {
            if !affix.chars().all(|ch| ch == '_' || ch.is_alphanumeric()) {
                return Err(Error::Config(format!("invalid class {label}: {affix}")));
            }
        }
        if self.class_prefix.starts_with(|ch: char| ch.is_ascii_digit()) {
            return Err(Error::Config(format!(
                "class prefix cannot start with a digit: {}",
                self.class_prefix
            )));
        }

        for (schema_name, rust_name) in &self.type_name_overrides {
            naming::ensure_identifier(rust_name).map_err(|err| {
                Error::Config(format!("invalid name override for `{schema_name}`: {err}"))
            })?;
        }

        if self.indent_width == 0 {
            return Err(Error::Config("indent width must be at least 1".to_string()));
        }

        if self.runtime_path.is_empty()
            || !self
                .runtime_path
                .trim_start_matches("::")
                .split("::")
                .all(|segment| naming::ensure_identifier(segment).is_ok() || segment == "crate")
        {
            return Err(Error::Config(format!(
                "invalid runtime path: {}",
                self.runtime_path
            )));
        }

        if let Some(name) = &self.crate_name {
            if self.output != OutputMode::MultiFile {
                return Err(Error::Config(
                    "a crate name requires multi-file output".to_string(),
                ));
            }
            if name.is_empty()
                || !name
                    .chars()
                    .all(|ch| ch == '_' || ch == '-' || ch.is_ascii_alphanumeric())
            {
                return Err(Error::Config(format!("invalid crate name: {name}")));
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("namespace", &self.namespace)
            .field("class_prefix", &self.class_prefix)
            .field("class_suffix", &self.class_suffix)
            .field("type_name_overrides", &self.type_name_overrides)
            .field("nullable_references", &self.nullable_references)
            .field("integer_type", &self.integer_type)
            .field("float_type", &self.float_type)
            .field("boolean_type", &self.boolean_type)
            .field("id_type", &self.id_type)
            .field("include_deprecated", &self.include_deprecated)
            .field("output", &self.output)
            .field("indent_width", &self.indent_width)
            .field("scalar_provider", &self.scalar_provider.is_some())
            .field("runtime_path", &self.runtime_path)
            .field("crate_name", &self.crate_name)
            .field("prune_unreachable_types", &self.prune_unreachable_types)
            .finish()
    }
}

/// configuration for the introspection client
#[derive(Clone)]
pub struct ClientConfig {
    /// original endpoint input
    pub(crate) raw_url: String,

    /// graphql endpoint (e.g., "<https://api.example.com/graphql>"), if it parsed
    pub(crate) url: Option<Url>,

    /// bearer token sent as `authorization`
    pub(crate) token: Option<String>,

    /// request timeout duration
    pub(crate) timeout: Duration,

    /// user agent string
    pub(crate) user_agent: String,

    /// whether to verify ssl certificates
    pub(crate) verify_ssl: bool,

    /// additional headers to send with every request
    pub(crate) extra_headers: HeaderMap,

    /// prebuilt http client, used as-is
    pub(crate) http_client: Option<reqwest::Client>,
}

impl ClientConfig {
    /// create a new client configuration
    ///
    /// # example
    ///
    /// ```
    /// use gqlforge::ClientConfig;
    ///
    /// let config = ClientConfig::new("https://api.example.com/graphql");
    /// ```
    pub fn new(url: impl AsRef<str>) -> Self {
        let raw = url.as_ref();
        let url = Url::parse(raw)
            .or_else(|_| Url::parse(&format!("https://{raw}")))
            .ok();

        Self {
            raw_url: raw.to_string(),
            url,
            token: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("gqlforge/{} (Rust)", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            extra_headers: HeaderMap::new(),
            http_client: None,
        }
    }

    /// send `authorization: Bearer <token>`
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// set the request timeout
    ///
    /// default: 30 seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// set a custom user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// disable ssl certificate verification (not recommended for production)
    ///
    /// default: enabled
    pub fn with_ssl_verification(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// add a header to every request
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.insert(name, value);
        self
    }

    /// add a header from `name: value` text, as given on a command line
    pub fn with_raw_header(self, raw: &str) -> Result<Self> {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| Error::Config(format!("header must be `name: value`: {raw}")))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|err| Error::Config(format!("invalid header name in `{raw}`: {err}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|err| Error::Config(format!("invalid header value in `{raw}`: {err}")))?;
        Ok(self.with_header(name, value))
    }

    /// access extra headers configured on this client
    pub fn extra_headers(&self) -> &HeaderMap {
        &self.extra_headers
    }

    /// inject a prebuilt http client
    ///
    /// all transport settings then come from that client; headers, timeout,
    /// user agent, and ssl options of this config are ignored.
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// the endpoint, validated
    pub(crate) fn endpoint(&self) -> Result<Url> {
        self.validate()?;
        self.url
            .clone()
            .ok_or_else(|| Error::Config(format!("invalid url: {}", self.raw_url)))
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// validate the configuration
    pub(crate) fn validate(&self) -> Result<()> {
        let url = self
            .url
            .as_ref()
            .ok_or_else(|| Error::Config(format!("invalid url: {}", self.raw_url)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "invalid url scheme: {}. must be http or https",
                url.scheme()
            )));
        }

        if matches!(&self.token, Some(token) if token.is_empty()) {
            return Err(Error::Config("token cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("verify_ssl", &self.verify_ssl)
            .field("extra_headers", &self.extra_headers.len())
            .field("http_client", &self.http_client.is_some())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

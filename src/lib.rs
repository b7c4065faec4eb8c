//! graphql client generator
//!
//! this crate turns an introspected graphql schema into rust source for a
//! typed client: one selection builder and one data type per object,
//! interface, and union, plus enums, input objects, and directive types.
//! generated code links against [`runtime`], which holds the selection tree,
//! the cycle-bounded "select everything" planner, and the query serializer.
//!
//! ## quick start
//!
//! ```
//! use gqlforge::{generate_single, schema, GeneratorConfig};
//!
//! # fn example() -> Result<(), gqlforge::Error> {
//! let schema = schema::sdl::parse("type Query { me: User } type User { id: ID! name: String }")?;
//! let source = generate_single(&schema, &GeneratorConfig::new().with_namespace("api"))?;
//! assert!(source.contains("pub struct UserQueryBuilder"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## retrieving a schema
//!
//! ```no_run
//! use gqlforge::{Client, ClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::new("https://api.example.com/graphql").with_token("token"))?;
//! let schema = client.fetch_schema().await?;
//! println!("{} types", schema.types.len());
//! # Ok(())
//! # }
//! ```
//!
//! the `gqlforge-codegen` binary wraps both steps and writes the result to
//! disk.

mod client;
mod config;
mod error;
mod graphql;

pub mod emit;
pub mod naming;
pub mod resolve;
pub mod runtime;
pub mod scalar;
pub mod schema;

pub use client::Client;
pub use config::{
    BooleanTypeMapping, ClientConfig, FloatTypeMapping, GeneratorConfig, IdTypeMapping,
    IntegerTypeMapping, OutputMode,
};
pub use emit::{
    generate, generate_files, generate_output, generate_single, FileDescriptor, GeneratedFile,
    GeneratedFiles, GeneratedOutput, MultiFileTarget, OutputTarget, Phase, SingleStreamTarget,
};
pub use error::{Error, Result};
pub use graphql::{
    GraphQlError, GraphQlLocation, GraphQlResponse, IntrospectionResponse, SchemaContainer,
    INTROSPECTION_QUERY,
};
pub use resolve::{find_all_referenced_object_types, NameTable, ResolvedName};
pub use scalar::{
    RuleBasedScalarMappingProvider, ScalarContext, ScalarMapping, ScalarMappingProvider,
    ScalarRule,
};
pub use schema::{Schema, SchemaIndex};

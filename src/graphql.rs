//! graphql types
//!
//! wrappers for graphql responses, errors, and the introspection envelope.

use crate::error::{Error, Result};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};

/// graphql response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
    /// response data or null if errors
    pub data: Option<T>,
    /// graphql errors array
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl<T> GraphQlResponse<T> {
    /// true if the response contains graphql errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// graphql error entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlError {
    /// error message
    pub message: String,
    /// error locations in the query
    #[serde(default)]
    pub locations: Vec<GraphQlLocation>,
    /// response path
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
    /// optional extensions payload
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

/// graphql error location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlLocation {
    /// line number (1-based)
    pub line: i64,
    /// column number (1-based)
    pub column: i64,
}

/// `{ "__schema": ... }` payload
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaContainer {
    #[serde(rename = "__schema")]
    pub schema: Schema,
}

/// an introspection document as stored on disk or returned over http
///
/// both the full response (`{"data": {"__schema": ...}}`) and the bare
/// payload (`{"__schema": ...}`) are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IntrospectionResponse {
    Bare(SchemaContainer),
    Full(GraphQlResponse<SchemaContainer>),
}

impl IntrospectionResponse {
    /// parse an introspection json document
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// extract the schema, failing on graphql errors or missing data
    pub fn into_schema(self) -> Result<Schema> {
        match self {
            IntrospectionResponse::Bare(container) => Ok(container.schema),
            IntrospectionResponse::Full(response) => {
                if let Some(first) = response.errors.first() {
                    return Err(Error::GraphQl {
                        status: None,
                        message: first.message.clone(),
                        errors: response.errors,
                        body: String::new(),
                    });
                }
                response
                    .data
                    .map(|container| container.schema)
                    .ok_or_else(|| Error::Transport {
                        status: None,
                        body: String::new(),
                        message: "introspection response has no data".to_string(),
                    })
            }
        }
    }
}

/// full introspection query sent by the schema retrieval client
pub const INTROSPECTION_QUERY: &str = r#"query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType { kind name }
            }
          }
        }
      }
    }
  }
}"#;

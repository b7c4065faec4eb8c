//! error types
//!
//! structured errors for configuration, schema consistency, identifiers,
//! transport, and graphql responses.

use crate::graphql::GraphQlError;
use std::fmt;

/// library result type
pub type Result<T> = std::result::Result<T, Error>;

/// error type for schema loading, generation, and retrieval
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("schema error at {owner}.{member}: {message}")]
    Schema {
        /// owning schema type name
        owner: String,
        /// member (field, argument, value) name
        member: String,
        /// what is inconsistent
        message: String,
    },

    #[error("invalid identifier `{name}`: {reason}")]
    Identifier {
        /// the offending name
        name: String,
        /// why it is rejected
        reason: String,
    },

    #[error("sdl error: {0}")]
    Sdl(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("format error")]
    Fmt(#[from] fmt::Error),

    #[error("transport error: {message}")]
    Transport {
        /// http status if available
        status: Option<u16>,
        /// raw response body
        body: String,
        /// top-level message
        message: String,
    },

    #[error("graphql error: {message}")]
    GraphQl {
        /// http status if available
        status: Option<u16>,
        /// graphql error list
        errors: Vec<GraphQlError>,
        /// raw response body
        body: String,
        /// top-level message
        message: String,
    },
}

impl Error {
    /// schema inconsistency located at `owner.member`
    pub(crate) fn schema(
        owner: impl Into<String>,
        member: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Schema {
            owner: owner.into(),
            member: member.into(),
            message: message.into(),
        }
    }

    /// true if the error was raised before generation produced any output
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// true if the error looks like an auth failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::GraphQl { status: Some(401 | 403), .. }
                | Error::Transport { status: Some(401 | 403), .. }
        ) || matches!(self, Error::Http(err) if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED))
    }
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

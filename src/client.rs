//! introspection client
//!
//! retrieves a schema over http by posting the standard introspection query.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::graphql::{GraphQlResponse, SchemaContainer, INTROSPECTION_QUERY};
use crate::schema::Schema;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// http client for schema retrieval
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
}

impl Client {
    /// create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = match &config.http_client {
            Some(http) => http.clone(),
            None => {
                let mut headers = HeaderMap::new();
                if let Some(token) = &config.token {
                    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                        .map_err(|err| Error::Config(format!("invalid token header value: {err}")))?;
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                headers.extend(config.extra_headers.clone());

                reqwest::Client::builder()
                    .default_headers(headers)
                    .user_agent(config.user_agent.clone())
                    .timeout(config.timeout)
                    .danger_accept_invalid_certs(!config.verify_ssl)
                    .build()?
            }
        };

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// access the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// fetch and decode the introspection schema
    pub async fn fetch_schema(&self) -> Result<Schema> {
        self.fetch_schema_with(|url, body| async move {
            let response = self.http.post(url).json(&body).send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok((status, text))
        })
        .await
    }
}

impl Client {
    pub(crate) async fn fetch_schema_with<F, Fut>(&self, send: F) -> Result<Schema>
    where
        F: FnOnce(Url, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let url = self.config.endpoint()?;
        let body = serde_json::json!({
            "query": INTROSPECTION_QUERY,
            "operationName": "IntrospectionQuery",
        });

        tracing::debug!(url = %url, "fetching introspection schema");
        let (status, text) = send(url, body).await?;
        parse_introspection_response(status, text)
    }
}

fn parse_introspection_response(status: StatusCode, text: String) -> Result<Schema> {
    if !status.is_success() {
        return Err(Error::Transport {
            status: Some(status.as_u16()),
            body: text,
            message: format!("introspection http error: {status}"),
        });
    }
    if text.trim().is_empty() {
        return Err(Error::Transport {
            status: Some(status.as_u16()),
            body: text,
            message: "introspection response is empty".to_string(),
        });
    }

    let parsed: GraphQlResponse<SchemaContainer> = serde_json::from_str(&text)?;
    if !parsed.errors.is_empty() {
        let message = parsed
            .errors
            .first()
            .map(|err| err.message.clone())
            .unwrap_or_else(|| "graphql error".to_string());
        return Err(Error::GraphQl {
            status: Some(status.as_u16()),
            errors: parsed.errors,
            body: text,
            message,
        });
    }

    match parsed.data {
        Some(container) => Ok(container.schema),
        None => Err(Error::Transport {
            status: Some(status.as_u16()),
            body: text,
            message: "introspection response has no data".to_string(),
        }),
    }
}

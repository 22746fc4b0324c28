//! HTTP implementation of the control-plane API.

use serde_json::Value;
use tracing::debug;

use crate::config::{ConfigError, ConsoleConfig};

use super::{ApiCommand, ApiError, ApiFuture, ControlPlane, unwrap_envelope};

#[derive(Clone, Debug)]
enum Credentials {
    Session(String),
    ApiKey(String),
}

/// Talks to the management server with `GET ?command=...&response=json`.
#[derive(Clone, Debug)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpControlPlane {
    /// Builds a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let credentials = match (&config.session_key, &config.api_key) {
            (Some(session), _) if !session.trim().is_empty() => {
                Credentials::Session(session.trim().to_owned())
            }
            (_, Some(key)) => Credentials::ApiKey(key.trim().to_owned()),
            _ => {
                return Err(ConfigError::MissingField(String::from(
                    "missing API credentials",
                )));
            }
        };
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim().to_owned(),
            credentials,
        })
    }

    fn query(&self, command: &ApiCommand) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(command.params().len() + 3);
        query.push((String::from("command"), command.name().to_owned()));
        query.push((String::from("response"), String::from("json")));
        query.extend(command.params().iter().cloned());
        match &self.credentials {
            Credentials::Session(key) => query.push((String::from("sessionkey"), key.clone())),
            Credentials::ApiKey(key) => query.push((String::from("apiKey"), key.clone())),
        }
        query
    }

    async fn send(&self, command: &ApiCommand) -> Result<Value, ApiError> {
        debug!(command = command.name(), params = ?command.params(), "issuing command");
        let transport = |err: reqwest::Error| ApiError::Transport {
            command: command.name().to_owned(),
            message: err.to_string(),
        };

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query(command))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        let document: Value = serde_json::from_slice(&body).map_err(|err| {
            if status.is_success() {
                ApiError::malformed(command.name(), err.to_string())
            } else {
                ApiError::Rejected {
                    command: command.name().to_owned(),
                    code: u32::from(status.as_u16()),
                    message: String::from_utf8_lossy(&body).into_owned(),
                }
            }
        })?;
        debug!(command = command.name(), status = status.as_u16(), "command answered");
        unwrap_envelope(command, status.is_success(), document)
    }
}

impl ControlPlane for HttpControlPlane {
    fn call<'a>(&'a self, command: &'a ApiCommand) -> ApiFuture<'a, Value> {
        Box::pin(self.send(command))
    }
}

//! Control-plane API abstraction.
//!
//! Every interaction with the management server goes through the
//! [`ControlPlane`] trait: a command name plus query parameters goes in, the
//! unwrapped `<command>response` object comes out. The HTTP implementation
//! lives in [`http`]; tests substitute a scripted double.

mod error;
mod http;
mod types;

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::ApiError;
pub use http::HttpControlPlane;
pub use types::{
    DiskOffering, Network, SecurityGroup, ServiceOffering, Template, VirtualMachine, Zone,
};

use crate::jobs::JobId;

/// Future returned by control-plane calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// A single API command with its query parameters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiCommand {
    name: String,
    params: Vec<(String, String)>,
}

impl ApiCommand {
    /// Starts a command with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Appends a parameter when a value is present.
    #[must_use]
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(inner) => self.param(key, inner),
            None => self,
        }
    }

    /// Command name as sent in the `command` query parameter.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query parameters in insertion order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns the value of a parameter, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Key of the envelope wrapping this command's response.
    #[must_use]
    pub fn response_key(&self) -> String {
        format!("{}response", self.name.to_ascii_lowercase())
    }
}

/// Minimal interface to the management server.
pub trait ControlPlane: Send + Sync {
    /// Issues a command and returns the body of its response envelope.
    fn call<'a>(&'a self, command: &'a ApiCommand) -> ApiFuture<'a, Value>;
}

impl<T: ControlPlane + ?Sized> ControlPlane for &T {
    fn call<'a>(&'a self, command: &'a ApiCommand) -> ApiFuture<'a, Value> {
        (**self).call(command)
    }
}

impl<T: ControlPlane + ?Sized> ControlPlane for std::sync::Arc<T> {
    fn call<'a>(&'a self, command: &'a ApiCommand) -> ApiFuture<'a, Value> {
        (**self).call(command)
    }
}

/// Unwraps a raw response document into the body of its envelope.
///
/// Rejections are recognised either by a non-success HTTP status or by an
/// `errorcode` inside the envelope; both surface the service's `errortext`.
///
/// # Errors
///
/// Returns [`ApiError::Rejected`] for service errors and
/// [`ApiError::MalformedResponse`] when no envelope can be found.
pub fn unwrap_envelope(
    command: &ApiCommand,
    status_ok: bool,
    document: Value,
) -> Result<Value, ApiError> {
    let Value::Object(mut root) = document else {
        return Err(ApiError::malformed(
            command.name(),
            "response is not a JSON object",
        ));
    };

    let body = root
        .remove(&command.response_key())
        .or_else(|| root.remove("errorresponse"))
        .or_else(|| {
            let key = root.keys().next().cloned()?;
            root.remove(&key)
        })
        .ok_or_else(|| ApiError::malformed(command.name(), "empty response document"))?;

    if let Some(code) = body.get("errorcode").and_then(Value::as_u64) {
        let message = body
            .get("errortext")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_owned();
        return Err(ApiError::Rejected {
            command: command.name().to_owned(),
            code: u32::try_from(code).unwrap_or(u32::MAX),
            message,
        });
    }

    if !status_ok {
        return Err(ApiError::Rejected {
            command: command.name().to_owned(),
            code: 0,
            message: String::from("request rejected without error text"),
        });
    }

    Ok(body)
}

/// Extracts a named collection from a list response body. A missing
/// collection means the list is empty.
///
/// # Errors
///
/// Returns [`ApiError::MalformedResponse`] when items do not match `T`.
pub fn collection<T: DeserializeOwned>(
    command: &ApiCommand,
    body: &Value,
    key: &str,
) -> Result<Vec<T>, ApiError> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => serde_json::from_value(items.clone())
            .map_err(|err| ApiError::malformed(command.name(), format!("{key}: {err}"))),
    }
}

/// Extracts the job identifier from a mutating command's response body.
///
/// # Errors
///
/// Returns [`ApiError::MalformedResponse`] when no `jobid` is present.
pub fn job_id(command: &ApiCommand, body: &Value) -> Result<JobId, ApiError> {
    match body.get("jobid") {
        Some(Value::String(id)) if !id.is_empty() => Ok(JobId::new(id.clone())),
        Some(Value::Number(id)) => Ok(JobId::new(id.to_string())),
        _ => Err(ApiError::malformed(command.name(), "missing jobid")),
    }
}

/// Issues a list command and deserialises the named collection.
///
/// # Errors
///
/// Propagates [`ApiError`] from the call or from deserialisation.
pub async fn list<C, T>(api: &C, command: &ApiCommand, key: &str) -> Result<Vec<T>, ApiError>
where
    C: ControlPlane + ?Sized,
    T: DeserializeOwned,
{
    let body = api.call(command).await?;
    collection(command, &body, key)
}

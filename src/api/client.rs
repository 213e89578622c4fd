use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::ApiError;
use crate::config::Config;

/// Blocking client for the platform backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let request = self
            .agent
            .request(method, &self.url(path))
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    pub(crate) fn get_value(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let mut request = self.request("GET", path);
        for (key, value) in query {
            request = request.query(key, value);
        }
        debug!(path, "GET");
        read_body(path, request.call())
    }

    pub(crate) fn send_value<B: Serialize + ?Sized>(
        &self,
        method: &str,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        debug!(method, path, "sending json");
        read_body(path, self.request(method, path).send_json(body))
    }

    pub(crate) fn send_raw(
        &self,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<Value, ApiError> {
        debug!(path, size = bytes.len(), "POST raw body");
        read_body(
            path,
            self.request("POST", path)
                .set("Content-Type", content_type)
                .send_bytes(bytes),
        )
    }

    pub(crate) fn delete(&self, path: &str) -> Result<(), ApiError> {
        debug!(path, "DELETE");
        read_body(path, self.request("DELETE", path).call()).map(|_| ())
    }
}

fn read_body(path: &str, result: Result<ureq::Response, ureq::Error>) -> Result<Value, ApiError> {
    let response = result.map_err(|e| match e {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let err = ApiError::from_status(code, &body);
            warn!(path, status = code, %err, "backend returned an error");
            err
        }
        other => ApiError::Http(other),
    })?;

    let body = response.into_string()?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Unwraps `{"data": ...}` envelopes.
pub(crate) fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(unwrap_data(body))?)
}

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST, PUT and PATCH carry a JSON body.
    pub fn accepts_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(ConfigError::UnsupportedMethod { value: s.to_owned() }),
        }
    }
}

/// The effective configuration of one request slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl RequestConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Self::default() }
    }

    /// The token, unless it is missing or blank.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// The body that goes on the wire: only for body-carrying methods, never `null`.
    pub fn wire_body(&self) -> Option<&Value> {
        if !self.method.accepts_body() {
            return None;
        }
        self.body.as_ref().filter(|b| !b.is_null())
    }

    /// Shallow, field-by-field merge. Set fields of `layer` win.
    pub fn merged(&self, layer: &ConfigOverride) -> RequestConfig {
        RequestConfig {
            endpoint: layer.endpoint.clone().unwrap_or_else(|| self.endpoint.clone()),
            method: layer.method.unwrap_or(self.method),
            token: match &layer.token {
                Some(t) if t.trim().is_empty() => None,
                Some(t) => Some(t.clone()),
                None => self.token.clone(),
            },
            body: match &layer.body {
                Some(Value::Null) => None,
                Some(b) => Some(b.clone()),
                None => self.body.clone(),
            },
        }
    }
}

/// One override layer. Unset fields fall through to the layer below.
///
/// A blank `token` clears the inherited token and a `null` body clears the
/// inherited body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "explicit_value", skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

// Keeps an explicit `"body": null` as `Some(Value::Null)` so it can clear a lower layer.
fn explicit_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ConfigOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Stack `other` on top of `self`.
    pub fn then(&self, other: &ConfigOverride) -> ConfigOverride {
        ConfigOverride {
            endpoint: other.endpoint.clone().or_else(|| self.endpoint.clone()),
            method: other.method.or(self.method),
            token: other.token.clone().or_else(|| self.token.clone()),
            body: other.body.clone().or_else(|| self.body.clone()),
        }
    }
}

//! HTTP oracle transport
//!
//! Sends one request per pattern. The pattern is substituted into a request template
//! and placed in a query or form parameter; the response is judged against a
//! [`PassRule`]. Anything that is not a clean pass or fail becomes an [`OracleError`].

use crate::error::OracleError;
use crate::oracle::syntax::SyntaxConfig;
use crate::oracle::Oracle;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::trace;

/// Placeholder replaced by the encoded pattern in [`HttpOracleConfig::template`].
pub const PATTERN_PLACEHOLDER: &str = "{pattern}";

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// How a response is turned into a boolean answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassRule {
    /// Pass iff the body of a 2xx response contains `text`
    BodyContains { text: String },
    /// Pass iff the body of a 2xx response does not contain `text`
    BodyLacks { text: String },
    /// Pass on status `pass`, fail on status `fail`; any other status is an error
    Status { pass: u16, fail: u16 },
}

impl Default for PassRule {
    fn default() -> Self {
        PassRule::BodyLacks {
            text: "not found".to_string(),
        }
    }
}

/// Oracle section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOracleConfig {
    /// Endpoint URL
    #[serde(default)]
    pub url: String,

    /// Request method: get (query string) or post (form body)
    #[serde(default)]
    pub method: HttpMethod,

    /// Name of the parameter carrying the rendered template
    #[serde(default = "default_param")]
    pub param: String,

    /// Parameter value; `{pattern}` is replaced by the encoded pattern
    #[serde(default = "default_template")]
    pub template: String,

    /// Additional static parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Additional request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Response interpretation
    #[serde(default)]
    pub pass_rule: PassRule,

    /// Pattern syntax of the injected query
    #[serde(default)]
    pub syntax: SyntaxConfig,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_param() -> String {
    "q".to_string()
}

fn default_template() -> String {
    PATTERN_PLACEHOLDER.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for HttpOracleConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::default(),
            param: default_param(),
            template: default_template(),
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            pass_rule: PassRule::default(),
            syntax: SyntaxConfig::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl HttpOracleConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("url is required".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(format!("url must be http(s): {}", self.url));
        }
        if !self.template.contains(PATTERN_PLACEHOLDER) {
            return Err(format!("template must contain {}", PATTERN_PLACEHOLDER));
        }
        if self.param.trim().is_empty() {
            return Err("param cannot be empty".to_string());
        }
        if let PassRule::Status { pass, fail } = self.pass_rule {
            if pass == fail {
                return Err("status pass rule needs distinct pass and fail codes".to_string());
            }
        }
        Ok(())
    }

    /// The template with `pattern` substituted.
    pub fn render(&self, pattern: &str) -> String {
        self.template.replace(PATTERN_PLACEHOLDER, pattern)
    }
}

fn map_http_error(error: reqwest::Error) -> OracleError {
    if error.is_timeout() {
        OracleError::Timeout(error.to_string())
    } else if error.is_connect() {
        OracleError::Connection(error.to_string())
    } else if let Some(status) = error.status() {
        OracleError::UnexpectedStatus {
            status: status.as_u16(),
            body: error.to_string(),
        }
    } else {
        OracleError::RequestFailed(error.to_string())
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

/// Judge a response. Split out of the transport so it can be tested without a server.
pub fn judge(rule: &PassRule, status: StatusCode, body: &str) -> Result<bool, OracleError> {
    match rule {
        PassRule::Status { pass, fail } => match status.as_u16() {
            code if code == *pass => Ok(true),
            code if code == *fail => Ok(false),
            code => Err(OracleError::UnexpectedStatus {
                status: code,
                body: truncate(body),
            }),
        },
        _ if !status.is_success() => Err(OracleError::UnexpectedStatus {
            status: status.as_u16(),
            body: truncate(body),
        }),
        PassRule::BodyContains { text } => Ok(body.contains(text.as_str())),
        PassRule::BodyLacks { text } => Ok(!body.contains(text.as_str())),
    }
}

/// reqwest-backed oracle.
pub struct HttpOracle {
    client: Client,
    config: HttpOracleConfig,
}

impl HttpOracle {
    pub fn new(config: HttpOracleConfig) -> Result<Self, OracleError> {
        config.validate().map_err(OracleError::Unavailable)?;

        let mut headers = reqwest::header::HeaderMap::new();
        for (name, value) in &config.headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| OracleError::Unavailable(format!("Invalid header name: {}", e)))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| OracleError::Unavailable(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OracleError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpOracleConfig {
        &self.config
    }

    fn request_params(&self, pattern: &str) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .config
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push((self.config.param.clone(), self.config.render(pattern)));
        params
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn test(&self, pattern: &str) -> Result<bool, OracleError> {
        let params = self.request_params(pattern);
        let request = match self.config.method {
            HttpMethod::Get => self.client.get(&self.config.url).query(&params),
            HttpMethod::Post => self.client.post(&self.config.url).form(&params),
        };

        let response = request.send().await.map_err(map_http_error)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::MalformedResponse(format!("Failed to read body: {}", e)))?;

        let verdict = judge(&self.config.pass_rule, status, &body);
        trace!(pattern, status = status.as_u16(), ?verdict, "Oracle response");
        verdict
    }

    fn name(&self) -> &str {
        "http"
    }
}

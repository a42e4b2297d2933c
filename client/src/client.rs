/// Trex API client
use crate::config::ClientConfig;
use crate::grammar::{Grammar, JSON_GRAMMAR};
use crate::{ClientError, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{instrument, Span};

/// Token budget used when a call does not set one
pub const DEFAULT_MAX_TOKENS: u32 = 512;

const API_KEY_HEADER: &str = "X-API-Key";
const INVALID_GRAMMAR: &str = "Invalid grammar";
const INVALID_REGEX: &str = "Invalid regex";

/// Text produced by a successful call
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GenerationResult {
    #[serde(rename = "response")]
    pub text: String,
    #[serde(rename = "tokens")]
    pub token_count: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    grammar: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<&'a str>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// What the server can blame a failed request on, besides the API key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Constraint {
    None,
    Grammar,
    Pattern,
}

/// Trex API client
///
/// Cheap to clone. Holds no per call state so a single instance can serve
/// any number of concurrent calls.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    pub(crate) check_patterns_locally: bool,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("check_patterns_locally", &self.check_patterns_locally)
            .finish()
    }
}

impl Client {
    /// Returns a client for the hosted API. Without an explicit key, `TREX_API_KEY` is read.
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        let config = match api_key {
            Some(api_key) => ClientConfig::new().with_api_key(api_key),
            None => ClientConfig::new(),
        };
        Self::from_config(config)
    }

    /// Returns a client for the given configuration. Does not touch the network.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().map_err(|err| {
            tracing::error!("{err}");
            err
        })?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            check_patterns_locally: config.check_patterns_locally,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate text from a prompt without constraints
    #[instrument(skip(self, prompt), fields(status))]
    pub async fn generate(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<GenerationResult> {
        let request = GenerateRequest {
            prompt,
            grammar: None,
            language: None,
            pattern: None,
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };
        self.send_generate(&request, Constraint::None).await
    }

    /// Generate text that parses under `grammar`, a Lark context free grammar
    #[instrument(skip(self, prompt, grammar), fields(status))]
    pub async fn generate_with_grammar(
        &self,
        prompt: &str,
        grammar: &str,
        language: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<GenerationResult> {
        let request = GenerateRequest {
            prompt,
            grammar: Some(grammar),
            language,
            pattern: None,
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };
        self.send_generate(&request, Constraint::Grammar).await
    }

    /// Generate text that parses under a built in or caller defined [`Grammar`]
    #[instrument(
        skip(self, prompt, grammar),
        fields(grammar = grammar.name, version = grammar.version)
    )]
    pub async fn generate_with(
        &self,
        prompt: &str,
        grammar: &Grammar,
        max_tokens: Option<u32>,
    ) -> Result<GenerationResult> {
        self.generate_with_grammar(prompt, grammar.source, grammar.language, max_tokens)
            .await
    }

    /// Generate a JSON document
    pub async fn generate_json(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<GenerationResult> {
        self.generate_with(prompt, &JSON_GRAMMAR, max_tokens).await
    }

    /// Generate text that fully matches the regular expression `pattern`
    #[instrument(skip(self, prompt), fields(status))]
    pub async fn generate_with_regex(
        &self,
        prompt: &str,
        pattern: &str,
        max_tokens: Option<u32>,
    ) -> Result<GenerationResult> {
        if self.check_patterns_locally {
            check_pattern(pattern)?;
        }

        let request = GenerateRequest {
            prompt,
            grammar: None,
            language: None,
            pattern: Some(pattern),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };
        self.send_generate(&request, Constraint::Pattern).await
    }

    /// POST to `path` below the base url with the API key attached
    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/{path}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
    }

    async fn send_generate(
        &self,
        request: &GenerateRequest<'_>,
        constraint: Constraint,
    ) -> Result<GenerationResult> {
        tracing::debug!(max_tokens = request.max_tokens, "Sending generate request");
        let response = self.post("generate").json(request).send().await?;

        let status = response.status();
        Span::current().record("status", status.as_u16());

        if status == StatusCode::CREATED {
            let result: GenerationResult = response.json().await?;
            tracing::debug!(tokens = result.token_count, "Generation succeeded");
            return Ok(result);
        }

        let body = response.text().await?;
        let err = classify(status, body, constraint, &self.api_key);
        tracing::error!("{err}");
        Err(err)
    }
}

/// Compile `pattern` locally, before it is sent anywhere
pub(crate) fn check_pattern(pattern: &str) -> Result<()> {
    regex::Regex::new(pattern).map(|_| ()).map_err(|err| {
        let err = ClientError::InvalidPattern(err.to_string());
        tracing::error!("{err}");
        err
    })
}

/// Turn a failed `/generate` response into the matching error
fn classify(
    status: StatusCode,
    body: String,
    constraint: Constraint,
    api_key: &str,
) -> ClientError {
    if let Some(detail) = error_detail(&body) {
        match constraint {
            Constraint::Grammar if detail.contains(INVALID_GRAMMAR) => {
                return ClientError::InvalidGrammar(detail)
            }
            Constraint::Pattern if detail.contains(INVALID_REGEX) => {
                return ClientError::InvalidPattern(detail)
            }
            _ => {}
        }
    }

    if status == StatusCode::UNAUTHORIZED {
        return ClientError::InvalidApiKey(api_key.to_string());
    }
    ClientError::Http { status, body }
}

/// `detail` field of an error body. Non string details are rendered as JSON.
fn error_detail(body: &str) -> Option<String> {
    let response: ErrorResponse = serde_json::from_str(body).ok()?;
    match response.detail? {
        serde_json::Value::String(detail) => Some(detail),
        detail => Some(detail.to_string()),
    }
}

//! Legacy `/restructure` endpoint
//!
//! Reshapes caller supplied data instead of generating from a prompt alone.
//! Responses are returned as raw JSON and every failure is a transport error.
use crate::client::{check_pattern, Client};
use crate::{ClientError, Result};
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Serialize)]
struct RestructureRequest<'a> {
    data: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cfg: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    regex: Option<&'a str>,
}

impl Client {
    /// Restructure `data` to conform to a Lark context free grammar
    #[deprecated(note = "use `generate_with_grammar`")]
    #[instrument(skip_all)]
    pub async fn restructure_to_grammar(
        &self,
        data: &str,
        prompt: &str,
        grammar: &str,
    ) -> Result<serde_json::Value> {
        self.send_restructure(&RestructureRequest {
            data,
            prompt,
            cfg: Some(grammar),
            regex: None,
        })
        .await
    }

    /// Restructure `data` to conform to a regular expression
    #[deprecated(note = "use `generate_with_regex`")]
    #[instrument(skip_all)]
    pub async fn restructure_to_regex(
        &self,
        data: &str,
        prompt: &str,
        pattern: &str,
    ) -> Result<serde_json::Value> {
        if self.check_patterns_locally {
            check_pattern(pattern)?;
        }

        self.send_restructure(&RestructureRequest {
            data,
            prompt,
            cfg: None,
            regex: Some(pattern),
        })
        .await
    }

    async fn send_restructure(
        &self,
        request: &RestructureRequest<'_>,
    ) -> Result<serde_json::Value> {
        tracing::debug!("Sending restructure request");
        let response = self.post("restructure").json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let err = ClientError::Http {
                status,
                body: response.text().await?,
            };
            tracing::error!("{err}");
            return Err(err);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_legacy_keys() {
        let request = RestructureRequest {
            data: "a,b",
            prompt: "as json",
            cfg: None,
            regex: Some("[a-z]+"),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"data": "a,b", "prompt": "as json", "regex": "[a-z]+"})
        );
    }
}

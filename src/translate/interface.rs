use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One element of the request body array
#[derive(Debug, Clone, Serialize)]
pub struct TranslateRequest {
    #[serde(rename = "Text")]
    pub text: String,
}

/// One element of the response array, holding a translation per requested target
#[derive(Debug, Clone, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Translation {
    pub text: String,
    pub to: String,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("request to translator failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translator returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse translator response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Translator interface
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into a single target language.
    ///
    /// Blank input is returned unchanged without contacting the service, and a
    /// response carrying no translation yields the input as well.
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError>;

    /// Translate `text` into every language in `targets` with a single request.
    ///
    /// Returns one [`Translation`] per language the service answered for, in
    /// response order. Blank input yields an empty list.
    async fn translate_many(
        &self,
        text: &str,
        from: &str,
        targets: &[String],
    ) -> Result<Vec<Translation>, TranslateError>;
}

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::interface::{TranslateError, TranslateRequest, TranslateResponse, Translation, Translator};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const SUBSCRIPTION_REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";

/// Client for the Azure Translator text API (v3)
///
/// One instance owns one `reqwest::Client`, so every request of a run shares
/// the same connection pool.
#[derive(Debug, Clone)]
pub struct AzureTranslator {
    client: Client,
    endpoint: String,
    api_version: String,
    api_key: String,
    region: String,
}

impl AzureTranslator {
    pub fn new(endpoint: String, api_version: String, api_key: String, region: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_version,
            api_key,
            region,
        }
    }

    /// POST a single text and return the translations of the first response entry
    async fn request(
        &self,
        text: &str,
        from: &str,
        targets: &[String],
    ) -> Result<Vec<Translation>, TranslateError> {
        let url = format!("{}/translate", self.endpoint.trim_end_matches('/'));

        let mut query = vec![("api-version", self.api_version.as_str()), ("from", from)];
        query.extend(targets.iter().map(|to| ("to", to.as_str())));

        let body = vec![TranslateRequest {
            text: text.to_string(),
        }];

        debug!("Sending translation request: from={}, to={:?}, chars={}", from, targets, text.chars().count());

        let response = self
            .client
            .post(&url)
            .query(&query)
            .header(SUBSCRIPTION_KEY_HEADER, self.api_key.as_str())
            .header(SUBSCRIPTION_REGION_HEADER, self.region.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let content = response.text().await?;
        if !status.is_success() {
            return Err(TranslateError::Status {
                status,
                body: content,
            });
        }

        let parsed: Vec<TranslateResponse> = serde_json::from_str(&content)?;
        Ok(parsed
            .into_iter()
            .next()
            .map(|entry| entry.translations)
            .unwrap_or_default())
    }
}

#[async_trait]
impl Translator for AzureTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let translations = self.request(text, from, &[to.to_string()]).await?;
        match translations.into_iter().next() {
            Some(translation) => Ok(translation.text),
            None => {
                warn!("Translator returned no translation for {} -> {}", from, to);
                Ok(text.to_string())
            }
        }
    }

    async fn translate_many(
        &self,
        text: &str,
        from: &str,
        targets: &[String],
    ) -> Result<Vec<Translation>, TranslateError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.request(text, from, targets).await
    }
}

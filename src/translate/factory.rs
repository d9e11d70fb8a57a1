use std::sync::Arc;
use tracing::info;

use crate::config::TranslatorSettings;
use super::client::AzureTranslator;
use super::interface::Translator;

/// Factory for creating translator clients
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the translator for this run.
    ///
    /// The returned client is shared by every request the run makes.
    pub fn create_translator(settings: &TranslatorSettings) -> Arc<dyn Translator> {
        info!(
            "Initializing Azure translator: endpoint={}, region={}",
            settings.endpoint, settings.region
        );

        Arc::new(AzureTranslator::new(
            settings.endpoint.clone(),
            settings.api_version.clone(),
            settings.api_key.clone(),
            settings.region.clone(),
        ))
    }
}

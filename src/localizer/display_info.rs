use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::translate::Translator;

/// Name and description of an item, as shown to users in one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DisplayInformation {
    pub language_code: String,
    pub name: String,
    pub description: String,
}

/// Display information keyed by language code, source language first
pub type LocalizedDisplayInfo = IndexMap<String, DisplayInformation>;

#[derive(Debug, Clone)]
pub struct DisplayInfoOutcome {
    pub results: LocalizedDisplayInfo,
    /// The service call failed and only the source entry is present
    pub failed: bool,
}

/// Translate the `Name` of a serialized [`DisplayInformation`] into every target language.
///
/// The source record is kept unchanged under `from`. Each translation the
/// service returns adds an entry keyed by its language code, unless that key
/// is already present.
pub async fn localize_display_info(
    serialized: &str,
    translator: &dyn Translator,
    from: &str,
    targets: &[String],
) -> Result<DisplayInfoOutcome, serde_json::Error> {
    let info: DisplayInformation = serde_json::from_str(serialized)?;
    let name = info.name.clone();

    let mut results = LocalizedDisplayInfo::new();
    results.insert(from.to_string(), info);

    if name.trim().is_empty() {
        debug!("Display info has no name to translate");
        return Ok(DisplayInfoOutcome {
            results,
            failed: false,
        });
    }

    let translations = match translator.translate_many(&name, from, targets).await {
        Ok(translations) => translations,
        Err(e) => {
            warn!("Failed to translate display info {:?}: {}", name, e);
            return Ok(DisplayInfoOutcome {
                results,
                failed: true,
            });
        }
    };

    for translation in translations {
        results
            .entry(translation.to.clone())
            .or_insert_with(|| DisplayInformation {
                name: translation.text,
                ..Default::default()
            });
    }

    Ok(DisplayInfoOutcome {
        results,
        failed: false,
    })
}

/// Indented JSON with non-ASCII characters written as is
pub fn to_pretty_json(results: &LocalizedDisplayInfo) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}

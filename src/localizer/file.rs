use std::path::Path;
use tracing::{debug, info, warn};

use crate::translate::Translator;
use crate::xliff::{XliffDocument, XliffError};

const TRANSLATED_STATE: &str = "translated";

/// What happened to the selected units of one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Targets whose state was `new` when the run started
    pub selected: usize,
    pub translated: usize,
    /// The service returned the source text as is
    pub unchanged: usize,
    /// Blank targets, never sent to the service
    pub skipped: usize,
    pub failed: usize,
}

/// Translate every `new` target of the file at `path` and write the file back.
///
/// The file is left untouched when it has no `new` targets. Failed units keep
/// their text and `new` state and are counted in the summary.
pub async fn localize_file(
    path: &Path,
    translator: &dyn Translator,
    from: &str,
    to: &str,
) -> Result<RunSummary, XliffError> {
    let mut document = XliffDocument::load(path)?;
    let summary = translate_document(&mut document, translator, from, to).await?;

    if summary.selected == 0 {
        info!("No untranslated units in {}", path.display());
        return Ok(summary);
    }

    document.save(path)?;
    info!(
        "Localized {}: {} translated, {} unchanged, {} skipped, {} failed",
        path.display(),
        summary.translated,
        summary.unchanged,
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}

/// Translate the `new` targets of `document` one at a time, in document order.
pub async fn translate_document(
    document: &mut XliffDocument,
    translator: &dyn Translator,
    from: &str,
    to: &str,
) -> Result<RunSummary, XliffError> {
    let selected = document.untranslated_targets();
    let mut summary = RunSummary {
        selected: selected.len(),
        ..RunSummary::default()
    };

    for idx in selected {
        let Some(target) = document.target_mut(idx) else {
            continue;
        };
        let unit = target.unit_id().unwrap_or("<no id>").to_string();
        let original = target.inner_text().to_string();

        if original.trim().is_empty() {
            debug!("Skipping blank unit {}", unit);
            summary.skipped += 1;
            continue;
        }

        match translator.translate(&original, from, to).await {
            Ok(translated) if translated != original => {
                target.set_state(TRANSLATED_STATE)?;
                target.set_text(&translated);
                summary.translated += 1;
                debug!("Translated unit {}", unit);
            }
            Ok(_) => {
                debug!("Unit {} came back unchanged, leaving it as new", unit);
                summary.unchanged += 1;
            }
            Err(e) => {
                warn!("Failed to translate unit {}: {}", unit, e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

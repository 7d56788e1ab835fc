//! Backfill: fan one source locale's payload out to many target locales.
//!
//! Targets are processed strictly in order, one at a time, which bounds the
//! load on the external engine at the cost of throughput. Progress is not
//! transactional: locales completed before a failure stay persisted, and
//! the error identifies the locale that broke the run.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Stage, TranslationVersion};
use crate::store::TranslationStore;
use crate::translator::TemplateTranslator;

/// Translate (component, `source_locale`, `stage`) into every listed target
/// locale, saving each result as it completes.
///
/// Returns the saved rows in target-locale order. Fails with `NotFound` when
/// the source has nothing saved, or with [`Error::Backfill`] naming the
/// first target locale whose translation or save failed.
pub async fn backfill(
    store: &TranslationStore,
    translator: &TemplateTranslator,
    component: Uuid,
    source_locale: &str,
    target_locales: &[String],
    stage: &Stage,
    actor: Option<Uuid>,
) -> Result<Vec<TranslationVersion>> {
    let source = store.get(component, source_locale, stage).await?;

    let mut saved = Vec::with_capacity(target_locales.len());
    for target_locale in target_locales {
        let translated = translator
            .translate_payload(&source.payload, source_locale, target_locale)
            .await
            .map_err(|e| {
                warn!(
                    "backfill of {} aborted at {}: {}",
                    component, target_locale, e
                );
                Error::Backfill {
                    locale: target_locale.clone(),
                    source: Box::new(e),
                }
            })?;

        let version = store
            .save(component, target_locale, stage, translated, actor)
            .await
            .map_err(|e| Error::Backfill {
                locale: target_locale.clone(),
                source: Box::new(e),
            })?;

        info!(
            "backfilled {} {} -> {} at {}",
            component, source_locale, target_locale, stage
        );
        saved.push(version);
    }

    Ok(saved)
}

//! Stage pipeline: promote a payload between deployment environments.
//!
//! Deployment is a read-then-save: the effective payload at the source
//! stage becomes a fresh save at the target stage (so the target gets its
//! own two-slot history). The engine imposes no ordering on stage labels;
//! a caller that wants draft → staging → production, and nothing else, must
//! enforce that policy itself.

use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Stage, TranslationVersion};
use crate::store::TranslationStore;

/// Copy the effective payload of (component, locale, `from`) into a save at
/// (component, locale, `to`).
///
/// Fails with `NotFound` when the source stage has nothing saved.
pub async fn deploy(
    store: &TranslationStore,
    component: Uuid,
    locale: &str,
    from: &Stage,
    to: &Stage,
    actor: Option<Uuid>,
) -> Result<TranslationVersion> {
    let source = store.get(component, locale, from).await?;

    let deployed = store
        .save(component, locale, to, source.payload, actor)
        .await?;

    info!(
        "deployed {}/{} from {} to {}",
        component, locale, from, to
    );
    Ok(deployed)
}

//! Versioned multi-locale translation store.
//!
//! Structured translation content ("payloads") is keyed by component,
//! locale and deployment stage. Each key carries a fixed two-slot history:
//! the frozen first-saved snapshot and the current payload. On top of that
//! sit a cache-aside read path with a batched bulk fast path, a
//! stage-to-stage deployment pipeline, and a template-preserving
//! auto-translation pipeline over an external engine.
//!
//! # Architecture
//!
//! - `model`: domain types (components, stages, slots, versions, payloads)
//! - `entity`: entity-store contract, PostgreSQL and in-memory backends
//! - `cache`: best-effort TTL cache contract and in-process implementation
//! - `store`: the versioned translation store (reads, saves, reverts)
//! - `deploy`: stage pipeline built on the store
//! - `template` / `engine` / `translator`: placeholder-preserving
//!   translation over the external engine
//! - `backfill`: sequential multi-locale fan-out
//! - `catalog`: application/component administration
//!
//! # Example
//!
//! ```rust,ignore
//! use i18n_center::{cache::MemoryCache, entity::PgEntityStore, store::TranslationStore};
//!
//! let entities = Arc::new(PgEntityStore::connect(&config.database_url).await?);
//! let store = TranslationStore::new(entities, Arc::new(MemoryCache::new()));
//! let version = store.get(component_id, "en", &Stage::production()).await?;
//! ```

pub mod backfill;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod deploy;
pub mod engine;
pub mod entity;
pub mod error;
pub mod model;
pub mod retry;
pub mod store;
pub mod template;
pub mod translator;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{Application, Component, Payload, Slot, Stage, TranslationVersion, VersionKey};
pub use store::TranslationStore;
pub use translator::TemplateTranslator;

/// Initialize tracing with an env-filter, defaulting this crate to `info`.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("i18n_center=info".parse()?),
        )
        .init();
    Ok(())
}

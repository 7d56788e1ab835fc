//! The versioned translation store.
//!
//! Each (component, locale, stage) key carries a two-slot history: slot 1
//! is the frozen first-saved snapshot, slot 2 the current payload. Reads go
//! cache-aside with a slot-2 → slot-1 fallback; writes are serialized per
//! key and invalidate the cache before returning.
//!
//! Revert restores the payload from the very first save of the key, not
//! the previous edit: slot 1 never rolls forward once written.

use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{self, Cache};
use crate::config::DEFAULT_CACHE_TTL;
use crate::entity::EntityStore;
use crate::error::{Error, Result};
use crate::model::{Payload, Slot, Stage, TranslationVersion, VersionKey};

/// One async mutex per translation key, so concurrent saves cannot
/// interleave their existence checks and double-create slot rows.
#[derive(Default)]
struct KeyLocks {
    inner: StdMutex<HashMap<VersionKey, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &VersionKey) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().unwrap();
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Versioned translation store over an injected entity store and cache.
///
/// The cache is best-effort: every cache failure is logged and absorbed,
/// falling through to the entity store.
#[derive(Clone)]
pub struct TranslationStore {
    entities: Arc<dyn EntityStore>,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
    locks: Arc<KeyLocks>,
}

impl TranslationStore {
    pub fn new(entities: Arc<dyn EntityStore>, cache: Arc<dyn Cache>) -> Self {
        Self {
            entities,
            cache,
            cache_ttl: DEFAULT_CACHE_TTL,
            locks: Arc::new(KeyLocks::default()),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn entities(&self) -> &Arc<dyn EntityStore> {
        &self.entities
    }

    // ==================== Cache helpers ====================

    async fn cache_lookup(&self, cache_key: &str) -> Option<TranslationVersion> {
        match self.cache.get(cache_key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(version) => Some(version),
                Err(e) => {
                    warn!("discarding undecodable cache entry {}: {}", cache_key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("cache read failed for {}, falling through: {}", cache_key, e);
                None
            }
        }
    }

    async fn cache_store(&self, cache_key: &str, version: &TranslationVersion) {
        match serde_json::to_string(version) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(cache_key, raw, self.cache_ttl).await {
                    warn!("cache write failed for {}: {}", cache_key, e);
                }
            }
            Err(e) => warn!("failed to serialize version for cache: {}", e),
        }
    }

    async fn cache_evict(&self, cache_key: &str) {
        if let Err(e) = self.cache.delete(cache_key).await {
            warn!("cache invalidation failed for {}: {}", cache_key, e);
        }
    }

    // ==================== Reads ====================

    /// Effective translation for one key: the current slot, falling back to
    /// the frozen original when no current row exists.
    pub async fn get(
        &self,
        component: Uuid,
        locale: &str,
        stage: &Stage,
    ) -> Result<TranslationVersion> {
        let key = VersionKey::new(component, locale, stage.clone());
        let cache_key = cache::translation_key(&key);

        if let Some(cached) = self.cache_lookup(&cache_key).await {
            return Ok(cached);
        }

        let version = match self.entities.version(&key, Slot::Current, true).await? {
            Some(current) => current,
            None => self
                .entities
                .version(&key, Slot::Original, true)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no translation saved for {}", key)))?,
        };

        self.cache_store(&cache_key, &version).await;
        Ok(version)
    }

    /// Bulk read across many components at one locale/stage.
    ///
    /// Three passes: independent cache probes, one batched query for
    /// current rows across all misses, one batched original-slot query for
    /// the remainder. Components with nothing saved are simply absent from
    /// the result; that is not an error.
    pub async fn get_bulk(
        &self,
        components: &[Uuid],
        locale: &str,
        stage: &Stage,
    ) -> Result<HashMap<Uuid, TranslationVersion>> {
        let mut results = HashMap::new();

        let probes = join_all(components.iter().map(|&component| {
            let cache_key =
                cache::translation_key(&VersionKey::new(component, locale, stage.clone()));
            async move { (component, self.cache_lookup(&cache_key).await) }
        }))
        .await;

        let mut missing = Vec::new();
        for (component, hit) in probes {
            match hit {
                Some(version) => {
                    results.insert(component, version);
                }
                None => missing.push(component),
            }
        }

        if !missing.is_empty() {
            let found = self
                .entities
                .versions_for(&missing, locale, stage, Slot::Current)
                .await?;
            for version in found {
                self.cache_store(&cache::translation_key(&version.key()), &version)
                    .await;
                results.insert(version.component_id, version);
            }

            let still_missing: Vec<Uuid> = missing
                .into_iter()
                .filter(|component| !results.contains_key(component))
                .collect();
            if !still_missing.is_empty() {
                let found = self
                    .entities
                    .versions_for(&still_missing, locale, stage, Slot::Original)
                    .await?;
                for version in found {
                    self.cache_store(&cache::translation_key(&version.key()), &version)
                        .await;
                    results.insert(version.component_id, version);
                }
            }
        }

        Ok(results)
    }

    /// Bulk read addressed by component code, scoped to one application.
    ///
    /// Rejects the whole call when any requested code does not resolve.
    pub async fn get_bulk_by_codes(
        &self,
        application_code: &str,
        component_codes: &[String],
        locale: &str,
        stage: &Stage,
    ) -> Result<HashMap<String, TranslationVersion>> {
        let application = self
            .entities
            .application_by_code(application_code)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("application {} not found", application_code))
            })?;

        let components = self
            .entities
            .components_by_codes(application.id, component_codes)
            .await?;

        let mut id_to_code: HashMap<Uuid, String> = HashMap::new();
        for component in &components {
            id_to_code.insert(component.id, component.code.clone());
        }

        let unresolved: Vec<&String> = component_codes
            .iter()
            .filter(|code| !components.iter().any(|c| &&c.code == code))
            .collect();
        if !unresolved.is_empty() {
            return Err(Error::NotFound(format!(
                "component codes not found: {:?}",
                unresolved
            )));
        }

        let ids: Vec<Uuid> = components.iter().map(|c| c.id).collect();
        let by_id = self.get_bulk(&ids, locale, stage).await?;

        Ok(by_id
            .into_iter()
            .filter_map(|(id, version)| id_to_code.remove(&id).map(|code| (code, version)))
            .collect())
    }

    /// Both history slots for a key, for side-by-side comparison. Either
    /// side may be absent.
    pub async fn versions(
        &self,
        component: Uuid,
        locale: &str,
        stage: &Stage,
    ) -> Result<(Option<TranslationVersion>, Option<TranslationVersion>)> {
        let key = VersionKey::new(component, locale, stage.clone());
        let original = self.entities.version(&key, Slot::Original, false).await?;
        let current = self.entities.version(&key, Slot::Current, false).await?;
        Ok((original, current))
    }

    // ==================== Writes ====================

    /// Save a payload for a key.
    ///
    /// The current slot is created or overwritten in place. The original
    /// slot is written exactly once, on the first save of the key, with
    /// this same payload, and never touched by later saves.
    pub async fn save(
        &self,
        component: Uuid,
        locale: &str,
        stage: &Stage,
        payload: Payload,
        actor: Option<Uuid>,
    ) -> Result<TranslationVersion> {
        let key = VersionKey::new(component, locale, stage.clone());
        let _guard = self.locks.acquire(&key).await;

        let current = match self.entities.version(&key, Slot::Current, false).await? {
            Some(mut existing) => {
                let now = Utc::now();
                self.entities
                    .update_version_payload(existing.id, &payload, actor, now)
                    .await?;
                existing.payload = payload.clone();
                existing.updated_by = actor;
                existing.updated_at = now;
                existing
            }
            None => {
                let version = TranslationVersion::new(&key, Slot::Current, payload.clone(), actor);
                self.entities.insert_version(&version).await?;
                version
            }
        };

        if self
            .entities
            .version(&key, Slot::Original, false)
            .await?
            .is_none()
        {
            let original = TranslationVersion::new(&key, Slot::Original, payload, actor);
            self.entities.insert_version(&original).await?;
        }

        // Invalidate before returning so staleness is bounded by the
        // invalidation race window, not the TTL.
        self.cache_evict(&cache::translation_key(&key)).await;
        self.cache_evict(&cache::component_key(key.component)).await;

        self.spawn_slot_sweep();

        debug!("saved translation for {}", key);
        Ok(current)
    }

    /// Restore the current slot from the frozen original snapshot.
    pub async fn revert(
        &self,
        component: Uuid,
        locale: &str,
        stage: &Stage,
        actor: Option<Uuid>,
    ) -> Result<TranslationVersion> {
        let key = VersionKey::new(component, locale, stage.clone());
        let _guard = self.locks.acquire(&key).await;

        let original = self
            .entities
            .version(&key, Slot::Original, false)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("no original version to revert to for {}", key))
            })?;

        let current = match self.entities.version(&key, Slot::Current, false).await? {
            Some(mut existing) => {
                let now = Utc::now();
                self.entities
                    .update_version_payload(existing.id, &original.payload, actor, now)
                    .await?;
                existing.payload = original.payload.clone();
                existing.updated_by = actor;
                existing.updated_at = now;
                existing
            }
            None => {
                let version =
                    TranslationVersion::new(&key, Slot::Current, original.payload.clone(), actor);
                self.entities.insert_version(&version).await?;
                version
            }
        };

        self.cache_evict(&cache::translation_key(&key)).await;

        debug!("reverted translation for {}", key);
        Ok(current)
    }

    /// Fire-and-forget maintenance: purge any rows above slot 2, detached
    /// from save latency. Failures are logged and dropped.
    fn spawn_slot_sweep(&self) {
        let entities = Arc::clone(&self.entities);
        tokio::spawn(async move {
            match entities.purge_extra_slots().await {
                Ok(0) => {}
                Ok(purged) => warn!("slot sweep removed {} rows above slot 2", purged),
                Err(e) => warn!("slot sweep failed: {}", e),
            }
        });
    }
}

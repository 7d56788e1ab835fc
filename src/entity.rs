//! Entity store contract and implementations.
//!
//! The store layer talks to persistence exclusively through [`EntityStore`]:
//! point lookups by (component, locale, stage, slot), batched `IN (set)`
//! lookups for the bulk read path, inserts, in-place payload updates and the
//! defensive slot>2 purge, plus application/component records.
//!
//! Two implementations ship: [`PgEntityStore`] over PostgreSQL and
//! [`MemoryEntityStore`], a mutex-guarded in-process store used by the test
//! suite and embeddable deployments. Both enforce uniqueness of active
//! (component, locale, stage, slot) rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Application, Component, Payload, Slot, Stage, TranslationVersion, VersionKey};

/// Persistence contract consumed by the versioned translation store.
#[async_trait]
pub trait EntityStore: Send + Sync {
    // Applications

    async fn insert_application(&self, application: &Application) -> Result<()>;

    async fn application_by_code(&self, code: &str) -> Result<Option<Application>>;

    // Components

    async fn insert_component(&self, component: &Component) -> Result<()>;

    /// Overwrite the mutable fields of a component. Identity (id,
    /// application, code) is immutable once created.
    async fn update_component(&self, component: &Component) -> Result<()>;

    /// Returns false if the component was already deleted or never existed.
    async fn soft_delete_component(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<bool>;

    async fn component(&self, id: Uuid) -> Result<Option<Component>>;

    /// Resolve codes within one application. Unknown codes are simply
    /// absent from the result; the caller decides whether that is fatal.
    async fn components_by_codes(
        &self,
        application_id: Uuid,
        codes: &[String],
    ) -> Result<Vec<Component>>;

    async fn list_components(&self, application_id: Uuid) -> Result<Vec<Component>>;

    // Translation versions

    /// Point lookup for one slot of one key.
    async fn version(
        &self,
        key: &VersionKey,
        slot: Slot,
        active_only: bool,
    ) -> Result<Option<TranslationVersion>>;

    /// Batched lookup: active rows at `slot` for every listed component at
    /// a fixed locale/stage. One round trip regardless of set size.
    async fn versions_for(
        &self,
        components: &[Uuid],
        locale: &str,
        stage: &Stage,
        slot: Slot,
    ) -> Result<Vec<TranslationVersion>>;

    async fn insert_version(&self, version: &TranslationVersion) -> Result<()>;

    /// In-place payload overwrite preserving row identity.
    async fn update_version_payload(
        &self,
        id: Uuid,
        payload: &Payload,
        updated_by: Option<Uuid>,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Delete any rows with slot > 2. A no-op under current write logic,
    /// kept as a safety net should slot semantics ever be extended.
    async fn purge_extra_slots(&self) -> Result<u64>;
}

// ==================== PostgreSQL ====================

const VERSION_COLUMNS: &str = "id, component_id, locale, stage, slot, payload, is_active, \
     created_by, updated_by, created_at, updated_at";

const COMPONENT_COLUMNS: &str = "id, application_id, name, code, description, structure, \
     default_locale, created_by, updated_by, created_at, updated_at, deleted_at";

/// PostgreSQL-backed entity store.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    /// Connect and bootstrap the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool. The schema is assumed to be in place.
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS applications (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                code TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                enabled_locales TEXT[] NOT NULL DEFAULT '{}',
                created_by UUID,
                updated_by UUID,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                deleted_at TIMESTAMPTZ
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS components (
                id UUID PRIMARY KEY,
                application_id UUID NOT NULL REFERENCES applications(id),
                name TEXT NOT NULL,
                code TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                structure JSONB,
                default_locale TEXT NOT NULL,
                created_by UUID,
                updated_by UUID,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                deleted_at TIMESTAMPTZ
            )",
        )
        .execute(&self.pool)
        .await?;

        // Codes are unique per application among live components only, so a
        // deleted component's code can be reused.
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_component_app_code
                 ON components (application_id, code) WHERE deleted_at IS NULL",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS translation_versions (
                id UUID PRIMARY KEY,
                component_id UUID NOT NULL REFERENCES components(id),
                locale TEXT NOT NULL,
                stage TEXT NOT NULL,
                slot SMALLINT NOT NULL,
                payload JSONB NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_by UUID,
                updated_by UUID,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // At most one active row per (key, slot). Backstops the per-key
        // write serialization in the store layer.
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_version_key_slot
                 ON translation_versions (component_id, locale, stage, slot) WHERE is_active",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn payload_from_value(value: serde_json::Value, column: &str) -> Result<Payload> {
    serde_json::from_value(value)
        .map_err(|e| Error::Persistence(format!("malformed {} json: {}", column, e)))
}

fn version_from_row(row: &PgRow) -> Result<TranslationVersion> {
    let slot_number: i16 = row.try_get("slot")?;
    let slot = Slot::from_number(slot_number)
        .ok_or_else(|| Error::Persistence(format!("unexpected slot number {}", slot_number)))?;
    let stage: String = row.try_get("stage")?;

    Ok(TranslationVersion {
        id: row.try_get("id")?,
        component_id: row.try_get("component_id")?,
        locale: row.try_get("locale")?,
        stage: Stage::new(stage),
        slot,
        payload: payload_from_value(row.try_get("payload")?, "payload")?,
        is_active: row.try_get("is_active")?,
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn component_from_row(row: &PgRow) -> Result<Component> {
    let structure: Option<serde_json::Value> = row.try_get("structure")?;
    let structure = match structure {
        Some(value) => Some(payload_from_value(value, "structure")?),
        None => None,
    };

    Ok(Component {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        description: row.try_get("description")?,
        structure,
        default_locale: row.try_get("default_locale")?,
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn application_from_row(row: &PgRow) -> Result<Application> {
    Ok(Application {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        description: row.try_get("description")?,
        enabled_locales: row.try_get("enabled_locales")?,
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn insert_application(&self, application: &Application) -> Result<()> {
        sqlx::query(
            "INSERT INTO applications
                 (id, name, code, description, enabled_locales, created_by, updated_by,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(application.id)
        .bind(&application.name)
        .bind(&application.code)
        .bind(&application.description)
        .bind(&application.enabled_locales)
        .bind(application.created_by)
        .bind(application.updated_by)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn application_by_code(&self, code: &str) -> Result<Option<Application>> {
        let row = sqlx::query(
            "SELECT id, name, code, description, enabled_locales, created_by, updated_by,
                    created_at, updated_at, deleted_at
             FROM applications WHERE code = $1 AND deleted_at IS NULL",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(application_from_row).transpose()
    }

    async fn insert_component(&self, component: &Component) -> Result<()> {
        let structure = component
            .structure
            .as_ref()
            .map(|s| serde_json::Value::Object(s.clone()));

        sqlx::query(
            "INSERT INTO components
                 (id, application_id, name, code, description, structure, default_locale,
                  created_by, updated_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(component.id)
        .bind(component.application_id)
        .bind(&component.name)
        .bind(&component.code)
        .bind(&component.description)
        .bind(structure)
        .bind(&component.default_locale)
        .bind(component.created_by)
        .bind(component.updated_by)
        .bind(component.created_at)
        .bind(component.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_component(&self, component: &Component) -> Result<()> {
        let structure = component
            .structure
            .as_ref()
            .map(|s| serde_json::Value::Object(s.clone()));

        sqlx::query(
            "UPDATE components
             SET name = $2, description = $3, structure = $4, default_locale = $5,
                 updated_by = $6, updated_at = $7
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(component.id)
        .bind(&component.name)
        .bind(&component.description)
        .bind(structure)
        .bind(&component.default_locale)
        .bind(component.updated_by)
        .bind(component.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn soft_delete_component(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE components SET deleted_at = $2, updated_at = $2
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn component(&self, id: Uuid) -> Result<Option<Component>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM components WHERE id = $1 AND deleted_at IS NULL",
            COMPONENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(component_from_row).transpose()
    }

    async fn components_by_codes(
        &self,
        application_id: Uuid,
        codes: &[String],
    ) -> Result<Vec<Component>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM components
             WHERE application_id = $1 AND code = ANY($2) AND deleted_at IS NULL",
            COMPONENT_COLUMNS
        ))
        .bind(application_id)
        .bind(codes.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(component_from_row).collect()
    }

    async fn list_components(&self, application_id: Uuid) -> Result<Vec<Component>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM components
             WHERE application_id = $1 AND deleted_at IS NULL ORDER BY code",
            COMPONENT_COLUMNS
        ))
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(component_from_row).collect()
    }

    async fn version(
        &self,
        key: &VersionKey,
        slot: Slot,
        active_only: bool,
    ) -> Result<Option<TranslationVersion>> {
        let mut sql = format!(
            "SELECT {} FROM translation_versions
             WHERE component_id = $1 AND locale = $2 AND stage = $3 AND slot = $4",
            VERSION_COLUMNS
        );
        if active_only {
            sql.push_str(" AND is_active");
        }

        let row = sqlx::query(&sql)
            .bind(key.component)
            .bind(&key.locale)
            .bind(key.stage.as_str())
            .bind(slot.number())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(version_from_row).transpose()
    }

    async fn versions_for(
        &self,
        components: &[Uuid],
        locale: &str,
        stage: &Stage,
        slot: Slot,
    ) -> Result<Vec<TranslationVersion>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM translation_versions
             WHERE component_id = ANY($1) AND locale = $2 AND stage = $3
               AND slot = $4 AND is_active",
            VERSION_COLUMNS
        ))
        .bind(components.to_vec())
        .bind(locale)
        .bind(stage.as_str())
        .bind(slot.number())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(version_from_row).collect()
    }

    async fn insert_version(&self, version: &TranslationVersion) -> Result<()> {
        sqlx::query(
            "INSERT INTO translation_versions
                 (id, component_id, locale, stage, slot, payload, is_active,
                  created_by, updated_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(version.id)
        .bind(version.component_id)
        .bind(&version.locale)
        .bind(version.stage.as_str())
        .bind(version.slot.number())
        .bind(serde_json::Value::Object(version.payload.clone()))
        .bind(version.is_active)
        .bind(version.created_by)
        .bind(version.updated_by)
        .bind(version.created_at)
        .bind(version.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_version_payload(
        &self,
        id: Uuid,
        payload: &Payload,
        updated_by: Option<Uuid>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE translation_versions
             SET payload = $2, updated_by = $3, updated_at = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(serde_json::Value::Object(payload.clone()))
        .bind(updated_by)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_extra_slots(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM translation_versions WHERE slot > 2")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ==================== In-memory ====================

#[derive(Default)]
struct MemoryState {
    applications: Vec<Application>,
    components: Vec<Component>,
    versions: Vec<TranslationVersion>,
}

/// In-process entity store guarded by a mutex.
///
/// Enforces the same active-row uniqueness as the PostgreSQL schema. The
/// domain `Slot` type cannot represent slot numbers above 2, so the purge
/// sweep has nothing to do here.
#[derive(Default)]
pub struct MemoryEntityStore {
    state: Mutex<MemoryState>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored version rows matching `key` and `slot`, active or
    /// not. Test/diagnostic helper.
    pub fn version_row_count(&self, key: &VersionKey, slot: Slot) -> usize {
        let state = self.state.lock().unwrap();
        state
            .versions
            .iter()
            .filter(|v| {
                v.component_id == key.component
                    && v.locale == key.locale
                    && v.stage == key.stage
                    && v.slot == slot
            })
            .count()
    }

    /// Remove a version row outright. Test helper for simulating rows that
    /// vanished behind a warm cache.
    pub fn remove_version_rows(&self, key: &VersionKey) {
        let mut state = self.state.lock().unwrap();
        state.versions.retain(|v| {
            !(v.component_id == key.component && v.locale == key.locale && v.stage == key.stage)
        });
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn insert_application(&self, application: &Application) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state
            .applications
            .iter()
            .any(|a| a.code == application.code && a.deleted_at.is_none())
        {
            return Err(Error::Persistence(format!(
                "duplicate application code {}",
                application.code
            )));
        }
        state.applications.push(application.clone());
        Ok(())
    }

    async fn application_by_code(&self, code: &str) -> Result<Option<Application>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .applications
            .iter()
            .find(|a| a.code == code && a.deleted_at.is_none())
            .cloned())
    }

    async fn insert_component(&self, component: &Component) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.components.iter().any(|c| {
            c.application_id == component.application_id
                && c.code == component.code
                && c.deleted_at.is_none()
        }) {
            return Err(Error::Persistence(format!(
                "duplicate component code {} in application {}",
                component.code, component.application_id
            )));
        }
        state.components.push(component.clone());
        Ok(())
    }

    async fn update_component(&self, component: &Component) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .components
            .iter_mut()
            .find(|c| c.id == component.id && c.deleted_at.is_none())
        {
            existing.name = component.name.clone();
            existing.description = component.description.clone();
            existing.structure = component.structure.clone();
            existing.default_locale = component.default_locale.clone();
            existing.updated_by = component.updated_by;
            existing.updated_at = component.updated_at;
        }
        Ok(())
    }

    async fn soft_delete_component(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .components
            .iter_mut()
            .find(|c| c.id == id && c.deleted_at.is_none())
        {
            existing.deleted_at = Some(deleted_at);
            existing.updated_at = deleted_at;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn component(&self, id: Uuid) -> Result<Option<Component>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .components
            .iter()
            .find(|c| c.id == id && c.deleted_at.is_none())
            .cloned())
    }

    async fn components_by_codes(
        &self,
        application_id: Uuid,
        codes: &[String],
    ) -> Result<Vec<Component>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .components
            .iter()
            .filter(|c| {
                c.application_id == application_id
                    && c.deleted_at.is_none()
                    && codes.contains(&c.code)
            })
            .cloned()
            .collect())
    }

    async fn list_components(&self, application_id: Uuid) -> Result<Vec<Component>> {
        let state = self.state.lock().unwrap();
        let mut components: Vec<Component> = state
            .components
            .iter()
            .filter(|c| c.application_id == application_id && c.deleted_at.is_none())
            .cloned()
            .collect();
        components.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(components)
    }

    async fn version(
        &self,
        key: &VersionKey,
        slot: Slot,
        active_only: bool,
    ) -> Result<Option<TranslationVersion>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .versions
            .iter()
            .find(|v| {
                v.component_id == key.component
                    && v.locale == key.locale
                    && v.stage == key.stage
                    && v.slot == slot
                    && (!active_only || v.is_active)
            })
            .cloned())
    }

    async fn versions_for(
        &self,
        components: &[Uuid],
        locale: &str,
        stage: &Stage,
        slot: Slot,
    ) -> Result<Vec<TranslationVersion>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .versions
            .iter()
            .filter(|v| {
                components.contains(&v.component_id)
                    && v.locale == locale
                    && &v.stage == stage
                    && v.slot == slot
                    && v.is_active
            })
            .cloned()
            .collect())
    }

    async fn insert_version(&self, version: &TranslationVersion) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if version.is_active
            && state.versions.iter().any(|v| {
                v.is_active
                    && v.component_id == version.component_id
                    && v.locale == version.locale
                    && v.stage == version.stage
                    && v.slot == version.slot
            })
        {
            return Err(Error::Persistence(format!(
                "duplicate active slot {} for {}",
                version.slot.number(),
                version.key()
            )));
        }
        state.versions.push(version.clone());
        Ok(())
    }

    async fn update_version_payload(
        &self,
        id: Uuid,
        payload: &Payload,
        updated_by: Option<Uuid>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(version) = state.versions.iter_mut().find(|v| v.id == id) {
            version.payload = payload.clone();
            version.updated_by = updated_by;
            version.updated_at = updated_at;
        }
        Ok(())
    }

    async fn purge_extra_slots(&self) -> Result<u64> {
        // Slot is a closed two-value enum; rows above slot 2 cannot exist
        // in this store.
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_with(key: &str, value: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert(key.to_string(), json!(value));
        payload
    }

    fn test_component(application_id: Uuid, code: &str) -> Component {
        let now = Utc::now();
        Component {
            id: Uuid::new_v4(),
            application_id,
            name: code.to_string(),
            code: code.to_string(),
            description: String::new(),
            structure: None,
            default_locale: "en".to_string(),
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    // ==================== Version Row Tests ====================

    #[tokio::test]
    async fn test_insert_then_point_lookup() {
        let store = MemoryEntityStore::new();
        let key = VersionKey::new(Uuid::new_v4(), "en", Stage::draft());
        let version =
            TranslationVersion::new(&key, Slot::Current, payload_with("k", "v"), None);

        store.insert_version(&version).await.expect("Should insert");

        let found = store
            .version(&key, Slot::Current, true)
            .await
            .expect("Should query")
            .expect("Should find");
        assert_eq!(found.id, version.id);
        assert_eq!(found.payload, version.payload);

        let other_slot = store
            .version(&key, Slot::Original, true)
            .await
            .expect("Should query");
        assert!(other_slot.is_none());
    }

    #[tokio::test]
    async fn test_active_only_filter() {
        let store = MemoryEntityStore::new();
        let key = VersionKey::new(Uuid::new_v4(), "en", Stage::draft());
        let mut version =
            TranslationVersion::new(&key, Slot::Current, payload_with("k", "v"), None);
        version.is_active = false;

        store.insert_version(&version).await.expect("Should insert");

        assert!(store
            .version(&key, Slot::Current, true)
            .await
            .expect("Should query")
            .is_none());
        assert!(store
            .version(&key, Slot::Current, false)
            .await
            .expect("Should query")
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_active_slot_rejected() {
        let store = MemoryEntityStore::new();
        let key = VersionKey::new(Uuid::new_v4(), "en", Stage::draft());

        let first = TranslationVersion::new(&key, Slot::Current, payload_with("k", "a"), None);
        let second = TranslationVersion::new(&key, Slot::Current, payload_with("k", "b"), None);

        store.insert_version(&first).await.expect("Should insert");
        let result = store.insert_version(&second).await;
        assert!(matches!(result, Err(Error::Persistence(_))));
    }

    #[tokio::test]
    async fn test_batched_lookup_scopes_by_locale_stage_slot() {
        let store = MemoryEntityStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        for (component, locale) in [(a, "en"), (b, "en"), (c, "es")] {
            let key = VersionKey::new(component, locale, Stage::draft());
            let version =
                TranslationVersion::new(&key, Slot::Current, payload_with("k", locale), None);
            store.insert_version(&version).await.expect("Should insert");
        }

        let found = store
            .versions_for(&[a, b, c], "en", &Stage::draft(), Slot::Current)
            .await
            .expect("Should query");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|v| v.locale == "en"));
    }

    #[tokio::test]
    async fn test_update_payload_in_place() {
        let store = MemoryEntityStore::new();
        let key = VersionKey::new(Uuid::new_v4(), "en", Stage::draft());
        let version =
            TranslationVersion::new(&key, Slot::Current, payload_with("k", "old"), None);
        store.insert_version(&version).await.expect("Should insert");

        let actor = Some(Uuid::new_v4());
        store
            .update_version_payload(version.id, &payload_with("k", "new"), actor, Utc::now())
            .await
            .expect("Should update");

        let found = store
            .version(&key, Slot::Current, true)
            .await
            .expect("Should query")
            .expect("Should find");
        assert_eq!(found.id, version.id, "row identity preserved");
        assert_eq!(found.payload, payload_with("k", "new"));
        assert_eq!(found.updated_by, actor);
    }

    // ==================== Component Tests ====================

    #[tokio::test]
    async fn test_components_by_codes_scoped_to_application() {
        let store = MemoryEntityStore::new();
        let app_a = Uuid::new_v4();
        let app_b = Uuid::new_v4();

        store
            .insert_component(&test_component(app_a, "header"))
            .await
            .expect("Should insert");
        store
            .insert_component(&test_component(app_b, "header"))
            .await
            .expect("Should insert");

        let found = store
            .components_by_codes(app_a, &["header".to_string()])
            .await
            .expect("Should query");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].application_id, app_a);
    }

    #[tokio::test]
    async fn test_duplicate_component_code_rejected_per_application() {
        let store = MemoryEntityStore::new();
        let app = Uuid::new_v4();

        store
            .insert_component(&test_component(app, "header"))
            .await
            .expect("Should insert");
        let result = store.insert_component(&test_component(app, "header")).await;
        assert!(matches!(result, Err(Error::Persistence(_))));

        // Same code in another application is fine
        store
            .insert_component(&test_component(Uuid::new_v4(), "header"))
            .await
            .expect("Should insert");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_component() {
        let store = MemoryEntityStore::new();
        let app = Uuid::new_v4();
        let component = test_component(app, "footer");
        store
            .insert_component(&component)
            .await
            .expect("Should insert");

        let deleted = store
            .soft_delete_component(component.id, Utc::now())
            .await
            .expect("Should delete");
        assert!(deleted);

        assert!(store
            .component(component.id)
            .await
            .expect("Should query")
            .is_none());
        assert!(store
            .components_by_codes(app, &["footer".to_string()])
            .await
            .expect("Should query")
            .is_empty());

        // Second delete is a no-op
        let again = store
            .soft_delete_component(component.id, Utc::now())
            .await
            .expect("Should not error");
        assert!(!again);
    }

    #[tokio::test]
    async fn test_list_components_sorted_by_code() {
        let store = MemoryEntityStore::new();
        let app = Uuid::new_v4();
        for code in ["zeta", "alpha", "mid"] {
            store
                .insert_component(&test_component(app, code))
                .await
                .expect("Should insert");
        }

        let listed = store.list_components(app).await.expect("Should list");
        let codes: Vec<&str> = listed.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["alpha", "mid", "zeta"]);
    }
}

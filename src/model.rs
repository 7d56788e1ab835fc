use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Nested key/value translation content for one (component, locale, stage).
///
/// No schema is enforced; values may be strings, nested objects, numbers,
/// booleans, arrays or null.
pub type Payload = serde_json::Map<String, Value>;

/// A named deployment environment label.
///
/// The engine treats stages as opaque: any label may be passed to save,
/// deploy or revert. The conventional pipeline is draft → staging →
/// production, but ordering is a caller-side policy, never enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(String);

impl Stage {
    pub fn new(label: impl Into<String>) -> Self {
        Stage(label.into())
    }

    pub fn draft() -> Self {
        Stage::new("draft")
    }

    pub fn staging() -> Self {
        Stage::new("staging")
    }

    pub fn production() -> Self {
        Stage::new("production")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Stage {
    fn from(label: &str) -> Self {
        Stage::new(label)
    }
}

/// Version position within a translation key's two-slot history.
///
/// `Original` (slot 1) is the frozen first-saved snapshot; `Current`
/// (slot 2) is overwritten on every save. Slot numbers outside 1–2 cannot
/// be represented; the entity store purges any such rows defensively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Original,
    Current,
}

impl Slot {
    /// Wire/storage slot number (1 or 2).
    pub fn number(self) -> i16 {
        match self {
            Slot::Original => 1,
            Slot::Current => 2,
        }
    }

    pub fn from_number(n: i16) -> Option<Slot> {
        match n {
            1 => Some(Slot::Original),
            2 => Some(Slot::Current),
            _ => None,
        }
    }
}

/// The lookup key for a translation: one component, one locale, one stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionKey {
    pub component: Uuid,
    pub locale: String,
    pub stage: Stage,
}

impl VersionKey {
    pub fn new(component: Uuid, locale: impl Into<String>, stage: Stage) -> Self {
        VersionKey {
            component,
            locale: locale.into(),
            stage,
        }
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.component, self.locale, self.stage)
    }
}

/// An application that owns translatable components (e.g. a product surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub name: String,
    /// Stable unique identifier used by API consumers.
    pub code: String,
    pub description: String,
    /// Advisory list of locales the application intends to serve.
    pub enabled_locales: Vec<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A named translatable content unit within an application (e.g. pdp_form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub id: Uuid,
    pub application_id: Uuid,
    pub name: String,
    /// Unique per application; identity is immutable once created.
    pub code: String,
    pub description: String,
    /// Advisory shape template for payloads; never enforced against saves.
    pub structure: Option<Payload>,
    pub default_locale: String,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One slot of a translation key's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationVersion {
    pub id: Uuid,
    pub component_id: Uuid,
    pub locale: String,
    pub stage: Stage,
    pub slot: Slot,
    pub payload: Payload,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranslationVersion {
    /// Build a fresh active row for `key` at `slot`.
    pub fn new(key: &VersionKey, slot: Slot, payload: Payload, actor: Option<Uuid>) -> Self {
        let now = Utc::now();
        TranslationVersion {
            id: Uuid::new_v4(),
            component_id: key.component,
            locale: key.locale.clone(),
            stage: key.stage.clone(),
            slot,
            payload,
            is_active: true,
            created_by: actor,
            updated_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> VersionKey {
        VersionKey::new(self.component_id, self.locale.clone(), self.stage.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_conventional_labels() {
        assert_eq!(Stage::draft().as_str(), "draft");
        assert_eq!(Stage::staging().as_str(), "staging");
        assert_eq!(Stage::production().as_str(), "production");
    }

    #[test]
    fn test_stage_accepts_arbitrary_labels() {
        let stage = Stage::new("canary");
        assert_eq!(stage.as_str(), "canary");
        assert_eq!(stage.to_string(), "canary");
    }

    #[test]
    fn test_stage_equality_is_label_equality() {
        assert_eq!(Stage::from("draft"), Stage::draft());
        assert_ne!(Stage::draft(), Stage::production());
    }

    #[test]
    fn test_slot_numbers() {
        assert_eq!(Slot::Original.number(), 1);
        assert_eq!(Slot::Current.number(), 2);
    }

    #[test]
    fn test_slot_from_number() {
        assert_eq!(Slot::from_number(1), Some(Slot::Original));
        assert_eq!(Slot::from_number(2), Some(Slot::Current));
        assert_eq!(Slot::from_number(3), None);
        assert_eq!(Slot::from_number(0), None);
    }

    #[test]
    fn test_version_new_carries_key_fields() {
        let key = VersionKey::new(Uuid::new_v4(), "en", Stage::draft());
        let mut payload = Payload::new();
        payload.insert("greeting".to_string(), json!("Hello"));

        let actor = Some(Uuid::new_v4());
        let version = TranslationVersion::new(&key, Slot::Current, payload.clone(), actor);

        assert_eq!(version.component_id, key.component);
        assert_eq!(version.locale, "en");
        assert_eq!(version.stage, Stage::draft());
        assert_eq!(version.slot, Slot::Current);
        assert_eq!(version.payload, payload);
        assert!(version.is_active);
        assert_eq!(version.created_by, actor);
        assert_eq!(version.key(), key);
    }

    #[test]
    fn test_version_serde_roundtrip() {
        let key = VersionKey::new(Uuid::new_v4(), "es", Stage::production());
        let mut payload = Payload::new();
        payload.insert("title".to_string(), json!("Hola [name]"));

        let version = TranslationVersion::new(&key, Slot::Original, payload, None);
        let raw = serde_json::to_string(&version).expect("serialize");
        let restored: TranslationVersion = serde_json::from_str(&raw).expect("deserialize");

        assert_eq!(restored.id, version.id);
        assert_eq!(restored.slot, Slot::Original);
        assert_eq!(restored.stage, version.stage);
        assert_eq!(restored.payload, version.payload);
    }
}

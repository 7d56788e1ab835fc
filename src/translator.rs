//! Template-preserving translation of strings and structured payloads.
//!
//! Wraps a [`TranslationEngine`] with placeholder protection: tokens are
//! extracted from the source text before the engine call and restored
//! (best-effort, by position) afterwards. Structured payloads are walked
//! depth-first; a failure on any leaf aborts the whole translation with the
//! failing key path; no partial structure is ever returned.

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

use crate::engine::TranslationEngine;
use crate::error::{Error, Result};
use crate::model::Payload;
use crate::template;

/// Translator that shields bracketed template values from the engine.
#[derive(Clone)]
pub struct TemplateTranslator {
    engine: Arc<dyn TranslationEngine>,
}

impl TemplateTranslator {
    pub fn new(engine: Arc<dyn TranslationEngine>) -> Self {
        Self { engine }
    }

    /// Translate a single string, restoring any placeholder tokens the
    /// engine mangled.
    pub async fn translate_text(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String> {
        let translated = self
            .engine
            .translate(text, source_locale, target_locale)
            .await?;
        Ok(template::restore_placeholders(text, &translated))
    }

    /// Translate a nested payload depth-first.
    ///
    /// String leaves go through the engine; nested objects recurse; every
    /// other value (numbers, booleans, arrays, null) passes through
    /// untouched. The first failing leaf aborts the whole call, with its
    /// dotted key path folded into the error.
    pub async fn translate_payload(
        &self,
        payload: &Payload,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<Payload> {
        self.translate_map(payload, source_locale, target_locale, "")
            .await
    }

    fn translate_map<'a>(
        &'a self,
        map: &'a Payload,
        source_locale: &'a str,
        target_locale: &'a str,
        path: &'a str,
    ) -> BoxFuture<'a, Result<Payload>> {
        Box::pin(async move {
            let mut result = Payload::new();

            for (key, value) in map {
                let key_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };

                let translated = match value {
                    Value::String(text) => {
                        let translated = self
                            .translate_text(text, source_locale, target_locale)
                            .await
                            .map_err(|e| match e {
                                Error::Engine(detail) => {
                                    Error::Engine(format!("key {}: {}", key_path, detail))
                                }
                                other => other,
                            })?;
                        Value::String(translated)
                    }
                    Value::Object(nested) => Value::Object(
                        self.translate_map(nested, source_locale, target_locale, &key_path)
                            .await?,
                    ),
                    other => other.clone(),
                };

                result.insert(key.clone(), translated);
            }

            Ok(result)
        })
    }
}

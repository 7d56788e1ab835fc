//! Administrative catalog of applications and their components.
//!
//! Component structure templates are advisory: they describe the expected
//! payload shape for editors and are never enforced against saved data.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{self, Cache};
use crate::entity::EntityStore;
use crate::error::{Error, Result};
use crate::model::{Application, Component, Payload};

/// Fields for a new application.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub name: String,
    pub code: String,
    pub description: String,
    pub enabled_locales: Vec<String>,
}

/// Fields for a new component.
#[derive(Debug, Clone)]
pub struct NewComponent {
    pub application_id: Uuid,
    pub name: String,
    pub code: String,
    pub description: String,
    pub structure: Option<Payload>,
    pub default_locale: String,
}

/// Partial update of a component's mutable fields. `None` leaves a field
/// unchanged; identity (id, application, code) cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct ComponentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub structure: Option<Payload>,
    pub default_locale: Option<String>,
}

/// Administrative operations on applications and components.
#[derive(Clone)]
pub struct Catalog {
    entities: Arc<dyn EntityStore>,
    cache: Arc<dyn Cache>,
}

impl Catalog {
    pub fn new(entities: Arc<dyn EntityStore>, cache: Arc<dyn Cache>) -> Self {
        Self { entities, cache }
    }

    pub async fn create_application(
        &self,
        new: NewApplication,
        actor: Option<Uuid>,
    ) -> Result<Application> {
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            name: new.name,
            code: new.code,
            description: new.description,
            enabled_locales: new.enabled_locales,
            created_by: actor,
            updated_by: actor,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.entities.insert_application(&application).await?;
        info!("created application {}", application.code);
        Ok(application)
    }

    pub async fn application_by_code(&self, code: &str) -> Result<Application> {
        self.entities
            .application_by_code(code)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {} not found", code)))
    }

    pub async fn create_component(
        &self,
        new: NewComponent,
        actor: Option<Uuid>,
    ) -> Result<Component> {
        let now = Utc::now();
        let component = Component {
            id: Uuid::new_v4(),
            application_id: new.application_id,
            name: new.name,
            code: new.code,
            description: new.description,
            structure: new.structure,
            default_locale: new.default_locale,
            created_by: actor,
            updated_by: actor,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.entities.insert_component(&component).await?;
        info!("created component {}", component.code);
        Ok(component)
    }

    pub async fn component(&self, id: Uuid) -> Result<Component> {
        self.entities
            .component(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("component {} not found", id)))
    }

    pub async fn list_components(&self, application_id: Uuid) -> Result<Vec<Component>> {
        self.entities.list_components(application_id).await
    }

    pub async fn update_component(
        &self,
        id: Uuid,
        update: ComponentUpdate,
        actor: Option<Uuid>,
    ) -> Result<Component> {
        let mut component = self.component(id).await?;

        if let Some(name) = update.name {
            component.name = name;
        }
        if let Some(description) = update.description {
            component.description = description;
        }
        if let Some(structure) = update.structure {
            component.structure = Some(structure);
        }
        if let Some(default_locale) = update.default_locale {
            component.default_locale = default_locale;
        }
        component.updated_by = actor;
        component.updated_at = Utc::now();

        self.entities.update_component(&component).await?;
        self.evict_component(id).await;
        Ok(component)
    }

    /// Soft-delete: the component disappears from lookups and code
    /// resolution; its translation rows are left in place.
    pub async fn delete_component(&self, id: Uuid) -> Result<()> {
        let deleted = self.entities.soft_delete_component(id, Utc::now()).await?;
        if !deleted {
            return Err(Error::NotFound(format!("component {} not found", id)));
        }

        self.evict_component(id).await;
        info!("deleted component {}", id);
        Ok(())
    }

    async fn evict_component(&self, id: Uuid) {
        if let Err(e) = self.cache.delete(&cache::component_key(id)).await {
            warn!("cache invalidation failed for component {}: {}", id, e);
        }
    }
}

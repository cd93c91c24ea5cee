//! Gallery and user templates behind one view, with "in use" status against
//! the session baseline.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::bridge::HostBridge;
use crate::config::Configuration;
use crate::error::{EditorError, EditorResult};
use crate::fingerprint::{Fingerprint, FingerprintCache, FingerprintKey};
use crate::selection::SelectionController;
use crate::session::EditSession;
use crate::template::{NewUserTemplate, Template, TemplateRef, UserTemplate};

pub struct TemplateCatalog {
    bridge: Arc<dyn HostBridge>,
    session: Arc<EditSession>,
    gallery: RwLock<Vec<Template>>,
    user_templates: RwLock<Vec<UserTemplate>>,
    fingerprints: FingerprintCache,
    baseline_rx: Mutex<watch::Receiver<u64>>,
}

impl TemplateCatalog {
    pub fn new(bridge: Arc<dyn HostBridge>, session: Arc<EditSession>) -> Self {
        let baseline_rx = Mutex::new(session.subscribe());
        Self {
            bridge,
            session,
            gallery: RwLock::new(Vec::new()),
            user_templates: RwLock::new(Vec::new()),
            fingerprints: FingerprintCache::new(),
            baseline_rx,
        }
    }

    pub fn gallery(&self) -> Vec<Template> {
        self.gallery.read().clone()
    }

    pub fn user_templates(&self) -> Vec<UserTemplate> {
        self.user_templates.read().clone()
    }

    pub fn find_user_template(&self, id: &str) -> Option<UserTemplate> {
        self.user_templates
            .read()
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Every item, gallery first.
    pub fn items(&self) -> Vec<TemplateRef> {
        let gallery = self.gallery.read();
        let user = self.user_templates.read();
        gallery
            .iter()
            .cloned()
            .map(TemplateRef::Gallery)
            .chain(user.iter().cloned().map(TemplateRef::User))
            .collect()
    }

    /// Re-fetch the gallery. On failure the previous list is kept.
    pub async fn refresh_gallery(&self) -> EditorResult<()> {
        match self.bridge.list_gallery_templates().await {
            Ok(templates) => {
                tracing::debug!("Loaded {} gallery templates", templates.len());
                let names: HashSet<String> = templates.iter().map(|t| t.name.clone()).collect();
                *self.gallery.write() = templates;
                self.fingerprints.retain(|key| match key {
                    FingerprintKey::Gallery(name) => names.contains(name),
                    _ => true,
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load gallery templates: {}", e);
                Err(e)
            }
        }
    }

    /// Re-fetch user templates. On failure the previous list is kept.
    pub async fn refresh_user_templates(&self) -> EditorResult<()> {
        match self.bridge.list_user_templates().await {
            Ok(templates) => {
                tracing::debug!("Loaded {} user templates", templates.len());
                let ids: HashSet<String> = templates.iter().map(|t| t.id.clone()).collect();
                *self.user_templates.write() = templates;
                self.fingerprints.retain(|key| match key {
                    FingerprintKey::User(id) => ids.contains(id),
                    _ => true,
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load user templates: {}", e);
                Err(e)
            }
        }
    }

    /// True when `item` hashes the same as the session baseline and both
    /// fingerprints are known.
    pub async fn is_in_use(&self, item: &TemplateRef) -> bool {
        let baseline = self.baseline_fingerprint().await;
        if !baseline.is_known() {
            return false;
        }
        let candidate = self
            .fingerprints
            .get_or_compute(self.bridge.as_ref(), item.fingerprint_key(), item.config())
            .await;
        candidate.matches(&baseline)
    }

    async fn baseline_fingerprint(&self) -> Fingerprint {
        {
            let mut rx = self.baseline_rx.lock();
            if rx.has_changed().unwrap_or(false) {
                let _ = rx.borrow_and_update();
                self.fingerprints.invalidate(&FingerprintKey::Baseline);
            }
        }
        let baseline = self.session.baseline();
        self.fingerprints
            .get_or_compute(self.bridge.as_ref(), FingerprintKey::Baseline, &baseline)
            .await
    }

    /// Save a new user template. Name and description are trimmed here, at
    /// submission; an empty name is rejected before reaching the host.
    pub async fn save_user_template(
        &self,
        name: &str,
        description: &str,
        config: Configuration,
    ) -> EditorResult<UserTemplate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::InvalidTemplateName);
        }

        let created = self
            .bridge
            .save_user_template(NewUserTemplate {
                name: name.to_string(),
                description: description.trim().to_string(),
                config,
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to save template {}: {}", name, e);
                e
            })?;
        tracing::info!("Saved user template {} ({})", created.name, created.id);

        if self.refresh_user_templates().await.is_err() {
            self.user_templates.write().push(created.clone());
        }
        Ok(created)
    }

    /// Save the last-persisted configuration as a user template.
    pub async fn save_current_as_template(
        &self,
        name: &str,
        description: &str,
    ) -> EditorResult<UserTemplate> {
        self.save_user_template(name, description, self.session.baseline())
            .await
    }

    /// Delete a user template. A selection pointing at it is cleared first.
    pub async fn delete_user_template(
        &self,
        id: &str,
        selection: &SelectionController,
    ) -> EditorResult<()> {
        if selection.clear_if_user(id) {
            tracing::debug!("Cleared selection of template {} before delete", id);
        }

        self.bridge.delete_user_template(id).await.map_err(|e| {
            tracing::error!("Failed to delete template {}: {}", id, e);
            e
        })?;
        self.fingerprints
            .invalidate(&FingerprintKey::User(id.to_string()));
        tracing::info!("Deleted user template {}", id);

        if self.refresh_user_templates().await.is_err() {
            self.user_templates.write().retain(|t| t.id != id);
        }
        Ok(())
    }
}

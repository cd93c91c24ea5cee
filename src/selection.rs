//! Select-then-confirm workflow for applying a template.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bridge::HostBridge;
use crate::catalog::TemplateCatalog;
use crate::error::{EditorError, EditorResult};
use crate::session::EditSession;
use crate::template::TemplateRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    /// Highlighted but not yet applied.
    Armed(TemplateRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The armed template already matches the baseline; nothing was persisted.
    AlreadyInUse,
    NothingArmed,
}

#[derive(Debug)]
struct Inner {
    state: SelectionState,
    /// Bumped on every select/cancel so in-flight applies can tell they were
    /// overtaken.
    ticket: u64,
}

pub struct SelectionController {
    bridge: Arc<dyn HostBridge>,
    session: Arc<EditSession>,
    catalog: Arc<TemplateCatalog>,
    inner: Mutex<Inner>,
}

impl SelectionController {
    pub fn new(
        bridge: Arc<dyn HostBridge>,
        session: Arc<EditSession>,
        catalog: Arc<TemplateCatalog>,
    ) -> Self {
        Self {
            bridge,
            session,
            catalog,
            inner: Mutex::new(Inner {
                state: SelectionState::Idle,
                ticket: 0,
            }),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.inner.lock().state.clone()
    }

    pub fn armed(&self) -> Option<TemplateRef> {
        match &self.inner.lock().state {
            SelectionState::Armed(item) => Some(item.clone()),
            SelectionState::Idle => None,
        }
    }

    /// Arm `item`. Allowed from any state, including for an item already in use.
    pub fn select(&self, item: TemplateRef) {
        tracing::debug!("Armed template {}", item.name());
        let mut inner = self.inner.lock();
        inner.state = SelectionState::Armed(item);
        inner.ticket = inner.ticket.wrapping_add(1);
    }

    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        inner.state = SelectionState::Idle;
        inner.ticket = inner.ticket.wrapping_add(1);
    }

    pub fn is_armed_user(&self, id: &str) -> bool {
        matches!(
            &self.inner.lock().state,
            SelectionState::Armed(item) if item.user_id() == Some(id)
        )
    }

    /// Drop the selection if it points at user template `id`. Returns whether
    /// anything was cleared.
    pub fn clear_if_user(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        let armed = matches!(
            &inner.state,
            SelectionState::Armed(item) if item.user_id() == Some(id)
        );
        if armed {
            inner.state = SelectionState::Idle;
            inner.ticket = inner.ticket.wrapping_add(1);
        }
        armed
    }

    /// Whether the confirm control should be enabled.
    pub async fn can_apply(&self) -> bool {
        match self.armed() {
            Some(item) => !self.catalog.is_in_use(&item).await,
            None => false,
        }
    }

    /// Apply the armed template.
    ///
    /// On failure the selection stays armed so the user can retry. If the
    /// selection changes while the host is working, the result is dropped and
    /// [`EditorError::StaleOperation`] is returned.
    pub async fn confirm_apply(&self) -> EditorResult<ApplyOutcome> {
        let (item, ticket) = {
            let inner = self.inner.lock();
            match &inner.state {
                SelectionState::Armed(item) => (item.clone(), inner.ticket),
                SelectionState::Idle => return Ok(ApplyOutcome::NothingArmed),
            }
        };

        if self.catalog.is_in_use(&item).await {
            tracing::debug!("Template {} is already in use", item.name());
            return Ok(ApplyOutcome::AlreadyInUse);
        }
        self.ensure_current(ticket)?;

        let config = match &item {
            TemplateRef::User(template) => {
                let resolved = self
                    .bridge
                    .resolve_user_template(&template.id)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to resolve template {}: {}", template.id, e);
                        e
                    })?;
                self.ensure_current(ticket)?;
                resolved
            }
            TemplateRef::Gallery(template) => template.config.clone(),
        };

        self.session
            .apply_external_configuration_if(config, || self.is_current(ticket))
            .await?;

        {
            let mut inner = self.inner.lock();
            inner.state = SelectionState::Idle;
            inner.ticket = inner.ticket.wrapping_add(1);
        }
        tracing::info!("Applied template {}", item.name());

        if let TemplateRef::User(template) = &item {
            // The host stamped last_used_at; pick it up.
            if let Err(e) = self.catalog.refresh_user_templates().await {
                tracing::warn!(
                    "Applied template {} but could not refresh user templates: {}",
                    template.id,
                    e
                );
            }
        }

        Ok(ApplyOutcome::Applied)
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.inner.lock().ticket == ticket
    }

    fn ensure_current(&self, ticket: u64) -> EditorResult<()> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            tracing::debug!("Dropping apply for superseded selection");
            Err(EditorError::StaleOperation)
        }
    }
}

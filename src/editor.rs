//! Wires the session, catalog and selection together over one host.

use std::sync::Arc;

use crate::bridge::HostBridge;
use crate::catalog::TemplateCatalog;
use crate::error::EditorResult;
use crate::selection::SelectionController;
use crate::session::EditSession;

/// Outcome of the initial load. Each source fails on its own.
#[derive(Debug)]
pub struct LoadReport {
    pub configuration: EditorResult<()>,
    pub gallery: EditorResult<()>,
    pub user_templates: EditorResult<()>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.configuration.is_ok() && self.gallery.is_ok() && self.user_templates.is_ok()
    }
}

pub struct Editor {
    bridge: Arc<dyn HostBridge>,
    session: Arc<EditSession>,
    catalog: Arc<TemplateCatalog>,
    selection: SelectionController,
}

impl Editor {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        let session = Arc::new(EditSession::new(Arc::clone(&bridge)));
        let catalog = Arc::new(TemplateCatalog::new(
            Arc::clone(&bridge),
            Arc::clone(&session),
        ));
        let selection = SelectionController::new(
            Arc::clone(&bridge),
            Arc::clone(&session),
            Arc::clone(&catalog),
        );
        Self {
            bridge,
            session,
            catalog,
            selection,
        }
    }

    pub fn bridge(&self) -> &Arc<dyn HostBridge> {
        &self.bridge
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Fetch the configuration and both template lists concurrently.
    pub async fn load(&self) -> LoadReport {
        let (configuration, gallery, user_templates) = tokio::join!(
            self.session.load(),
            self.catalog.refresh_gallery(),
            self.catalog.refresh_user_templates(),
        );

        let report = LoadReport {
            configuration,
            gallery,
            user_templates,
        };
        if !report.is_complete() {
            tracing::warn!("Editor loaded with errors: {:?}", report);
        }
        report
    }

    pub async fn delete_user_template(&self, id: &str) -> EditorResult<()> {
        self.catalog.delete_user_template(id, &self.selection).await
    }
}

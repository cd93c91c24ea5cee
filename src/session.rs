//! The working copy the form edits and the baseline it is compared against.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::bridge::HostBridge;
use crate::config::Configuration;
use crate::error::{EditorError, EditorResult};

#[derive(Debug)]
struct SessionState {
    baseline: Configuration,
    working: Configuration,
    /// Bumped every time `baseline` is replaced.
    revision: u64,
}

/// Owns `baseline` and `working` and is the only caller of the host's persist
/// command. Local edits are synchronous; saves and applies suspend on the host
/// and re-check the baseline revision before committing.
pub struct EditSession {
    bridge: Arc<dyn HostBridge>,
    state: Mutex<SessionState>,
    revision_tx: watch::Sender<u64>,
}

impl EditSession {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            bridge,
            state: Mutex::new(SessionState {
                baseline: Configuration::default(),
                working: Configuration::default(),
                revision: 0,
            }),
            revision_tx,
        }
    }

    /// Receiver that changes whenever a load, save or apply replaces the baseline.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    pub fn baseline(&self) -> Configuration {
        self.state.lock().baseline.clone()
    }

    pub fn working(&self) -> Configuration {
        self.state.lock().working.clone()
    }

    pub fn initialize(&self, loaded: Configuration) {
        let mut state = self.state.lock();
        state.working = loaded.clone();
        state.baseline = loaded;
        self.bump(&mut state);
    }

    /// Fetch the host's current configuration and start editing it.
    pub async fn load(&self) -> EditorResult<()> {
        let issued = self.revision();
        let loaded = self.bridge.get_configuration().await.map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;

        let mut state = self.state.lock();
        if state.revision != issued {
            tracing::debug!("Dropping configuration load issued at revision {}", issued);
            return Err(EditorError::StaleOperation);
        }
        state.working = loaded.clone();
        state.baseline = loaded;
        self.bump(&mut state);
        tracing::debug!("Configuration loaded");
        Ok(())
    }

    /// Apply a pure transformation to the working copy.
    pub fn update(&self, mutator: impl FnOnce(Configuration) -> Configuration) {
        let mut state = self.state.lock();
        state.working = mutator(state.working.clone());
    }

    pub fn is_dirty(&self) -> bool {
        let state = self.state.lock();
        state.working != state.baseline
    }

    pub fn discard(&self) {
        let mut state = self.state.lock();
        state.working = state.baseline.clone();
    }

    /// Persist the working copy. The baseline only moves once the host confirms.
    pub async fn save(&self) -> EditorResult<()> {
        let (snapshot, issued) = {
            let state = self.state.lock();
            (state.working.clone(), state.revision)
        };

        self.bridge
            .persist_configuration(&snapshot)
            .await
            .map_err(|e| {
                tracing::error!("Failed to save configuration: {}", e);
                e
            })?;

        let mut state = self.state.lock();
        if state.revision != issued {
            tracing::debug!("Dropping save issued at revision {}", issued);
            return Err(EditorError::StaleOperation);
        }
        // Edits typed while the save was in flight stay in `working`.
        state.baseline = snapshot;
        self.bump(&mut state);
        tracing::info!("Configuration saved");
        Ok(())
    }

    /// Persist a configuration coming from a template and make it both the
    /// baseline and the working copy.
    pub async fn apply_external_configuration(&self, config: Configuration) -> EditorResult<()> {
        self.apply_external_configuration_if(config, || true).await
    }

    /// Like [`apply_external_configuration`](Self::apply_external_configuration),
    /// but the result is dropped unless `is_current` still holds when the host
    /// answers.
    pub async fn apply_external_configuration_if<F>(
        &self,
        config: Configuration,
        is_current: F,
    ) -> EditorResult<()>
    where
        F: Fn() -> bool + Send,
    {
        let issued = self.revision();

        self.bridge
            .persist_configuration(&config)
            .await
            .map_err(|e| {
                tracing::error!("Failed to apply configuration: {}", e);
                e
            })?;

        let mut state = self.state.lock();
        if state.revision != issued || !is_current() {
            tracing::debug!("Dropping apply issued at revision {}", issued);
            return Err(EditorError::StaleOperation);
        }
        state.working = config.clone();
        state.baseline = config;
        self.bump(&mut state);
        tracing::info!("Applied external configuration");
        Ok(())
    }

    fn bump(&self, state: &mut SessionState) {
        state.revision = state.revision.wrapping_add(1);
        self.revision_tx.send_replace(state.revision);
    }
}

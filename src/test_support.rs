//! In-memory `HostBridge` with call counters and failure switches.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::bridge::HostBridge;
use crate::config::Configuration;
use crate::error::{EditorError, EditorResult};
use crate::fingerprint::sha256_hex;
use crate::template::{NewUserTemplate, Template, UserTemplate};

#[derive(Default)]
struct Counters {
    persist: AtomicUsize,
    fingerprint: AtomicUsize,
    resolve: AtomicUsize,
    delete: AtomicUsize,
    list_user: AtomicUsize,
    saved: AtomicUsize,
}

#[derive(Default)]
struct Failures {
    persist: AtomicBool,
    fingerprint: AtomicBool,
    gallery: AtomicBool,
    user_list: AtomicBool,
    resolve: AtomicBool,
    daemon: AtomicBool,
}

pub struct MockHost {
    config: Mutex<Configuration>,
    persisted: Mutex<Option<Configuration>>,
    gallery: Mutex<Vec<Template>>,
    user_templates: Mutex<Vec<UserTemplate>>,
    daemon_running: AtomicBool,
    persist_gate: Mutex<Option<Arc<Notify>>>,
    resolve_gate: Mutex<Option<Arc<Notify>>>,
    calls: Counters,
    fail: Failures,
}

impl MockHost {
    pub fn new(config: Configuration) -> Self {
        Self {
            config: Mutex::new(config),
            persisted: Mutex::new(None),
            gallery: Mutex::new(Vec::new()),
            user_templates: Mutex::new(Vec::new()),
            daemon_running: AtomicBool::new(false),
            persist_gate: Mutex::new(None),
            resolve_gate: Mutex::new(None),
            calls: Counters::default(),
            fail: Failures::default(),
        }
    }

    pub fn with_gallery(self, gallery: Vec<Template>) -> Self {
        *self.gallery.lock() = gallery;
        self
    }

    pub fn with_user_templates(self, templates: Vec<UserTemplate>) -> Self {
        *self.user_templates.lock() = templates;
        self
    }

    pub fn set_user_templates(&self, templates: Vec<UserTemplate>) {
        *self.user_templates.lock() = templates;
    }

    pub fn persisted(&self) -> Option<Configuration> {
        self.persisted.lock().clone()
    }

    pub fn persist_calls(&self) -> usize {
        self.calls.persist.load(Ordering::SeqCst)
    }

    pub fn fingerprint_calls(&self) -> usize {
        self.calls.fingerprint.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.calls.resolve.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.calls.delete.load(Ordering::SeqCst)
    }

    pub fn list_user_calls(&self) -> usize {
        self.calls.list_user.load(Ordering::SeqCst)
    }

    pub fn fail_persist(&self, fail: bool) {
        self.fail.persist.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fingerprints(&self, fail: bool) {
        self.fail.fingerprint.store(fail, Ordering::SeqCst);
    }

    pub fn fail_gallery(&self, fail: bool) {
        self.fail.gallery.store(fail, Ordering::SeqCst);
    }

    pub fn fail_user_list(&self, fail: bool) {
        self.fail.user_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_resolve(&self, fail: bool) {
        self.fail.resolve.store(fail, Ordering::SeqCst);
    }

    pub fn fail_daemon(&self, fail: bool) {
        self.fail.daemon.store(fail, Ordering::SeqCst);
    }

    pub fn daemon_running(&self) -> bool {
        self.daemon_running.load(Ordering::SeqCst)
    }

    /// Make every persist call wait for a permit on the returned gate.
    pub fn hold_persist(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.persist_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Make every resolve call wait for a permit on the returned gate.
    pub fn hold_resolve(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.resolve_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub async fn wait_for_persist_calls(&self, n: usize) {
        while self.persist_calls() < n {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_resolve_calls(&self, n: usize) {
        while self.resolve_calls() < n {
            tokio::task::yield_now().await;
        }
    }

    fn unavailable(what: &str) -> EditorError {
        EditorError::BridgeUnavailable(format!("mock host refused {what}"))
    }
}

#[async_trait]
impl HostBridge for MockHost {
    async fn get_configuration(&self) -> EditorResult<Configuration> {
        Ok(self.config.lock().clone())
    }

    async fn persist_configuration(&self, config: &Configuration) -> EditorResult<()> {
        self.calls.persist.fetch_add(1, Ordering::SeqCst);
        let gate = self.persist_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail.persist.load(Ordering::SeqCst) {
            return Err(Self::unavailable("persist"));
        }
        *self.config.lock() = config.clone();
        *self.persisted.lock() = Some(config.clone());
        Ok(())
    }

    async fn compute_fingerprint(&self, config: &Configuration) -> EditorResult<String> {
        self.calls.fingerprint.fetch_add(1, Ordering::SeqCst);
        if self.fail.fingerprint.load(Ordering::SeqCst) {
            return Err(Self::unavailable("fingerprint"));
        }
        sha256_hex(config).map_err(|e| EditorError::RejectedByHost(e.to_string()))
    }

    async fn list_gallery_templates(&self) -> EditorResult<Vec<Template>> {
        if self.fail.gallery.load(Ordering::SeqCst) {
            return Err(Self::unavailable("gallery"));
        }
        Ok(self.gallery.lock().clone())
    }

    async fn list_user_templates(&self) -> EditorResult<Vec<UserTemplate>> {
        self.calls.list_user.fetch_add(1, Ordering::SeqCst);
        if self.fail.user_list.load(Ordering::SeqCst) {
            return Err(Self::unavailable("user templates"));
        }
        Ok(self.user_templates.lock().clone())
    }

    async fn resolve_user_template(&self, id: &str) -> EditorResult<Configuration> {
        self.calls.resolve.fetch_add(1, Ordering::SeqCst);
        let gate = self.resolve_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail.resolve.load(Ordering::SeqCst) {
            return Err(Self::unavailable("resolve"));
        }
        let mut templates = self.user_templates.lock();
        let template = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| EditorError::RejectedByHost(format!("unknown template {id}")))?;
        template.last_used_at = Utc::now() + Duration::seconds(1);
        Ok(template.config.clone())
    }

    async fn save_user_template(&self, template: NewUserTemplate) -> EditorResult<UserTemplate> {
        let n = self.calls.saved.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let created = UserTemplate {
            id: format!("mock-{n}"),
            name: template.name,
            description: template.description,
            config: template.config,
            created_at: now,
            last_used_at: now,
        };
        self.user_templates.lock().push(created.clone());
        Ok(created)
    }

    async fn delete_user_template(&self, id: &str) -> EditorResult<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        let mut templates = self.user_templates.lock();
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Err(EditorError::RejectedByHost(format!("unknown template {id}")));
        }
        Ok(())
    }

    async fn is_daemon_running(&self) -> EditorResult<bool> {
        if self.fail.daemon.load(Ordering::SeqCst) {
            return Err(Self::unavailable("daemon status"));
        }
        Ok(self.daemon_running.load(Ordering::SeqCst))
    }

    async fn start_daemon(&self) -> EditorResult<()> {
        if self.fail.daemon.load(Ordering::SeqCst) {
            return Err(Self::unavailable("start"));
        }
        self.daemon_running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_daemon(&self) -> EditorResult<()> {
        if self.fail.daemon.load(Ordering::SeqCst) {
            return Err(Self::unavailable("stop"));
        }
        self.daemon_running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub fn gallery_template(name: &str, details: &str) -> Template {
    Template {
        name: name.to_string(),
        description: format!("{name} preset"),
        config: Configuration {
            client_id: "gallery".to_string(),
            details: details.to_string(),
            ..Configuration::default()
        },
    }
}

pub fn user_template(id: &str, name: &str, details: &str) -> UserTemplate {
    let now = Utc::now();
    UserTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        config: Configuration {
            client_id: "user".to_string(),
            details: details.to_string(),
            ..Configuration::default()
        },
        created_at: now,
        last_used_at: now,
    }
}

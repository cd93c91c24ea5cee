//! The host command surface the editor talks to.

use async_trait::async_trait;

use crate::config::Configuration;
use crate::error::EditorResult;
use crate::template::{NewUserTemplate, Template, UserTemplate};

/// Commands exposed by the host application shell.
///
/// Every call is fallible. Implementations report an unreachable host as
/// [`EditorError::BridgeUnavailable`](crate::error::EditorError::BridgeUnavailable)
/// and domain failures as
/// [`EditorError::RejectedByHost`](crate::error::EditorError::RejectedByHost).
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn get_configuration(&self) -> EditorResult<Configuration>;

    async fn persist_configuration(&self, config: &Configuration) -> EditorResult<()>;

    /// Identical configurations must always produce identical strings.
    async fn compute_fingerprint(&self, config: &Configuration) -> EditorResult<String>;

    async fn list_gallery_templates(&self) -> EditorResult<Vec<Template>>;

    async fn list_user_templates(&self) -> EditorResult<Vec<UserTemplate>>;

    /// Returns the fully resolved configuration and stamps `last_used_at`.
    async fn resolve_user_template(&self, id: &str) -> EditorResult<Configuration>;

    async fn save_user_template(&self, template: NewUserTemplate) -> EditorResult<UserTemplate>;

    async fn delete_user_template(&self, id: &str) -> EditorResult<()>;

    async fn is_daemon_running(&self) -> EditorResult<bool>;

    async fn start_daemon(&self) -> EditorResult<()>;

    async fn stop_daemon(&self) -> EditorResult<()>;
}

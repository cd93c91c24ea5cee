mod bridge;
mod catalog;
mod config;
mod daemon;
mod editor;
mod error;
mod fingerprint;
mod host;
pub mod logging;
mod preview;
mod selection;
mod session;
pub mod settings;
mod template;

#[cfg(test)]
mod test_support;

pub use bridge::HostBridge;
pub use catalog::TemplateCatalog;
pub use config::{
    add_button, remove_button, set_button_field, set_field, set_show_timestamps, Button,
    ButtonField, ConfigField, Configuration, MAX_BUTTONS,
};
pub use daemon::{check as check_daemon, spawn_status_poll, toggle as toggle_daemon, DaemonStatus};
pub use editor::{Editor, LoadReport};
pub use error::{EditorError, EditorResult};
pub use fingerprint::{fingerprint, sha256_hex, Fingerprint, FingerprintCache, FingerprintKey};
pub use host::LocalHost;
pub use preview::{ImageSource, PresencePreview};
pub use selection::{ApplyOutcome, SelectionController, SelectionState};
pub use session::EditSession;
pub use template::{NewUserTemplate, Template, TemplateRef, UserTemplate};

use std::sync::Arc;

/// Build an editor over the on-disk host, using settings from the user's
/// config directory.
pub fn local_editor() -> Result<Editor, settings::SettingsError> {
    let app_dir = settings::app_dir()?;
    let settings = settings::load_settings(&app_dir);
    let host: Arc<dyn HostBridge> = Arc::new(LocalHost::from_settings(&app_dir, &settings));
    Ok(Editor::new(host))
}

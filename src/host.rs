//! File-backed host: the configuration file the daemon reads, a JSON store of
//! user templates, the built-in gallery and the `dstatus` daemon binary.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::bridge::HostBridge;
use crate::config::{Button, Configuration};
use crate::error::{EditorError, EditorResult};
use crate::fingerprint::sha256_hex;
use crate::settings::EditorSettings;
use crate::template::{NewUserTemplate, Template, UserTemplate};

/// The daemon refuses a configuration without `countdown_start`; this is the
/// value it writes itself on first setup.
const DEFAULT_COUNTDOWN_START: i64 = 3600;

pub struct LocalHost {
    config_path: PathBuf,
    templates_path: PathBuf,
    daemon_binary: String,
    /// Serializes read-merge-write cycles on the configuration file.
    config_lock: Mutex<()>,
    /// Serializes read-modify-write cycles on the template store.
    store_lock: Mutex<()>,
}

impl LocalHost {
    pub fn new(config_path: PathBuf, templates_path: PathBuf, daemon_binary: String) -> Self {
        Self {
            config_path,
            templates_path,
            daemon_binary,
            config_lock: Mutex::new(()),
            store_lock: Mutex::new(()),
        }
    }

    pub fn from_settings(app_dir: &Path, settings: &EditorSettings) -> Self {
        Self::new(
            settings.config_path(app_dir),
            settings.templates_path(app_dir),
            settings.daemon_binary.clone(),
        )
    }

    async fn read_configuration(&self) -> EditorResult<Configuration> {
        let contents = match fs::read_to_string(&self.config_path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No configuration file yet, starting unconfigured");
                return Ok(Configuration::default());
            }
            Err(e) => return Err(io_error("read configuration", &e)),
        };

        toml::from_str(&contents).map_err(|e| {
            EditorError::RejectedByHost(format!("Failed to parse configuration: {}", e))
        })
    }

    async fn read_store(&self) -> EditorResult<Vec<UserTemplate>> {
        let contents = match fs::read_to_string(&self.templates_path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("read templates", &e)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            EditorError::RejectedByHost(format!("Failed to parse templates: {}", e))
        })
    }

    async fn write_store(&self, templates: &[UserTemplate]) -> EditorResult<()> {
        let contents = serde_json::to_string_pretty(templates).map_err(|e| {
            EditorError::RejectedByHost(format!("Failed to serialize templates: {}", e))
        })?;
        write_atomic(&self.templates_path, contents.as_bytes()).await
    }

    async fn run_daemon_command(&self, arg: &str) -> EditorResult<()> {
        let output: Output = Command::new(&self.daemon_binary)
            .arg(arg)
            .output()
            .await
            .map_err(|e| {
                EditorError::BridgeUnavailable(format!(
                    "Failed to run {} {}: {}",
                    self.daemon_binary, arg, e
                ))
            })?;

        if output.status.success() {
            tracing::info!("{} {} succeeded", self.daemon_binary, arg);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!("{} {} failed: {}", self.daemon_binary, arg, stderr);
            Err(EditorError::RejectedByHost(stderr))
        }
    }
}

fn io_error(action: &str, e: &io::Error) -> EditorError {
    EditorError::BridgeUnavailable(format!("Failed to {}: {}", action, e))
}

async fn write_atomic(path: &Path, contents: &[u8]) -> EditorResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error("create config directory", &e))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)
        .await
        .map_err(|e| io_error("write file", &e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| io_error("replace file", &e))
}

/// Overlay `config` onto the existing TOML document so keys the daemon owns
/// (e.g. `countdown_start`) survive an editor save. A missing
/// `countdown_start` gets the daemon's default.
fn merge_configuration(existing: Option<&str>, config: &Configuration) -> EditorResult<String> {
    let mut table: toml::Table = match existing {
        Some(contents) => toml::from_str(contents).unwrap_or_else(|e| {
            tracing::warn!("Existing configuration is not valid TOML, replacing it: {}", e);
            toml::Table::new()
        }),
        None => toml::Table::new(),
    };

    let serialized = toml::Value::try_from(config)
        .map_err(|e| EditorError::RejectedByHost(format!("Failed to encode configuration: {}", e)))?;
    let toml::Value::Table(fields) = serialized else {
        return Err(EditorError::RejectedByHost(
            "Configuration did not encode as a table".to_string(),
        ));
    };

    if config.buttons.is_empty() {
        table.remove("buttons");
    }
    for (key, value) in fields {
        table.insert(key, value);
    }
    if !table.contains_key("countdown_start") {
        table.insert(
            "countdown_start".to_string(),
            toml::Value::Integer(DEFAULT_COUNTDOWN_START),
        );
    }

    toml::to_string(&table)
        .map_err(|e| EditorError::RejectedByHost(format!("Failed to encode configuration: {}", e)))
}

/// Fill fields a template leaves blank from the current configuration.
fn resolve_against(mut config: Configuration, current: &Configuration) -> Configuration {
    if config.client_id.is_empty() {
        config.client_id.clone_from(&current.client_id);
    }
    config
}

fn builtin_gallery() -> Vec<Template> {
    vec![
        Template {
            name: "Coding".to_string(),
            description: "Show off what you're building".to_string(),
            config: Configuration {
                details: "Writing code".to_string(),
                state: "In the editor".to_string(),
                large_image: "code".to_string(),
                large_image_text: "Coding".to_string(),
                show_timestamps: true,
                ..Configuration::default()
            },
        },
        Template {
            name: "Gaming".to_string(),
            description: "Let friends know you're up for a match".to_string(),
            config: Configuration {
                details: "Playing a match".to_string(),
                state: "Looking for group".to_string(),
                large_image: "controller".to_string(),
                large_image_text: "Gaming".to_string(),
                party_size: 1,
                max_party_size: 4,
                show_timestamps: true,
                ..Configuration::default()
            },
        },
        Template {
            name: "Listening".to_string(),
            description: "Share what's on your playlist".to_string(),
            config: Configuration {
                details: "Listening to music".to_string(),
                state: "Vibing".to_string(),
                large_image: "headphones".to_string(),
                large_image_text: "Music".to_string(),
                ..Configuration::default()
            },
        },
        Template {
            name: "Streaming".to_string(),
            description: "Point people at your stream".to_string(),
            config: Configuration {
                details: "Live now".to_string(),
                state: "Come say hi".to_string(),
                large_image: "live".to_string(),
                large_image_text: "Streaming".to_string(),
                small_image: "mic".to_string(),
                small_image_text: "On air".to_string(),
                show_timestamps: true,
                buttons: vec![Button {
                    label: "Watch".to_string(),
                    url: "https://twitch.tv".to_string(),
                }],
                ..Configuration::default()
            },
        },
        Template {
            name: "Studying".to_string(),
            description: "Heads down, do not disturb".to_string(),
            config: Configuration {
                details: "Studying".to_string(),
                state: "Focus mode".to_string(),
                large_image: "books".to_string(),
                large_image_text: "Studying".to_string(),
                show_timestamps: true,
                ..Configuration::default()
            },
        },
    ]
}

#[async_trait]
impl HostBridge for LocalHost {
    async fn get_configuration(&self) -> EditorResult<Configuration> {
        tracing::debug!("Loading configuration from {}", self.config_path.display());
        self.read_configuration().await
    }

    async fn persist_configuration(&self, config: &Configuration) -> EditorResult<()> {
        tracing::debug!("Saving configuration to {}", self.config_path.display());
        let _guard = self.config_lock.lock().await;
        let existing = match fs::read_to_string(&self.config_path).await {
            Ok(c) => Some(c),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_error("read configuration", &e)),
        };
        let merged = merge_configuration(existing.as_deref(), config)?;
        write_atomic(&self.config_path, merged.as_bytes()).await
    }

    async fn compute_fingerprint(&self, config: &Configuration) -> EditorResult<String> {
        sha256_hex(config)
            .map_err(|e| EditorError::RejectedByHost(format!("Failed to hash configuration: {}", e)))
    }

    async fn list_gallery_templates(&self) -> EditorResult<Vec<Template>> {
        let current = self.read_configuration().await?;
        Ok(builtin_gallery()
            .into_iter()
            .map(|mut t| {
                t.config = resolve_against(t.config, &current);
                t
            })
            .collect())
    }

    async fn list_user_templates(&self) -> EditorResult<Vec<UserTemplate>> {
        let _guard = self.store_lock.lock().await;
        self.read_store().await
    }

    async fn resolve_user_template(&self, id: &str) -> EditorResult<Configuration> {
        let current = self.read_configuration().await?;

        let _guard = self.store_lock.lock().await;
        let mut templates = self.read_store().await?;
        let template = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| EditorError::RejectedByHost(format!("Template {} not found", id)))?;

        template.last_used_at = Utc::now();
        let resolved = resolve_against(template.config.clone(), &current);
        self.write_store(&templates).await?;

        tracing::debug!("Resolved user template {}", id);
        Ok(resolved)
    }

    async fn save_user_template(&self, template: NewUserTemplate) -> EditorResult<UserTemplate> {
        let now = Utc::now();
        let created = UserTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            name: template.name,
            description: template.description,
            config: template.config,
            created_at: now,
            last_used_at: now,
        };

        let _guard = self.store_lock.lock().await;
        let mut templates = self.read_store().await?;
        templates.push(created.clone());
        self.write_store(&templates).await?;
        Ok(created)
    }

    async fn delete_user_template(&self, id: &str) -> EditorResult<()> {
        let _guard = self.store_lock.lock().await;
        let mut templates = self.read_store().await?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Err(EditorError::RejectedByHost(format!(
                "Template {} not found",
                id
            )));
        }
        self.write_store(&templates).await
    }

    async fn is_daemon_running(&self) -> EditorResult<bool> {
        let name = Path::new(&self.daemon_binary)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.daemon_binary)
            .to_string();

        tokio::task::spawn_blocking(move || {
            use sysinfo::System;

            let s = System::new_all();
            s.processes().values().any(|p| {
                p.name()
                    .to_str()
                    .map(|n| n == name || n == format!("{}.exe", name))
                    .unwrap_or(false)
            })
        })
        .await
        .map_err(|e| EditorError::BridgeUnavailable(format!("Process check failed: {}", e)))
    }

    async fn start_daemon(&self) -> EditorResult<()> {
        self.run_daemon_command("on").await
    }

    async fn stop_daemon(&self) -> EditorResult<()> {
        self.run_daemon_command("off").await
    }
}

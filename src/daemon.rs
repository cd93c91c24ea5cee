//! Daemon status polling and start/stop toggling.
//!
//! Runs on its own timer and only reads daemon state; it never touches the
//! edit session.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bridge::HostBridge;
use crate::error::EditorResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonStatus {
    Running,
    Stopped,
    /// The status check itself failed, e.g. the daemon binary is missing.
    Unreachable,
}

impl DaemonStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "Daemon is running",
            Self::Stopped => "Daemon is stopped",
            Self::Unreachable => "Daemon not running",
        }
    }
}

pub async fn check(bridge: &dyn HostBridge) -> DaemonStatus {
    match bridge.is_daemon_running().await {
        Ok(true) => DaemonStatus::Running,
        Ok(false) => DaemonStatus::Stopped,
        Err(e) => {
            tracing::warn!("Failed to check daemon status: {}", e);
            DaemonStatus::Unreachable
        }
    }
}

/// Stop the daemon if it is running, otherwise start it, then re-check.
pub async fn toggle(bridge: &dyn HostBridge, current: DaemonStatus) -> EditorResult<DaemonStatus> {
    if current == DaemonStatus::Running {
        tracing::info!("Stopping daemon");
        bridge.stop_daemon().await?;
    } else {
        tracing::info!("Starting daemon");
        bridge.start_daemon().await?;
    }
    Ok(check(bridge).await)
}

/// Poll the daemon status every `interval`. The first check runs immediately.
/// The task ends once every receiver has been dropped.
pub fn spawn_status_poll(
    bridge: Arc<dyn HostBridge>,
    interval: Duration,
) -> (watch::Receiver<Option<DaemonStatus>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(None);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let status = check(bridge.as_ref()).await;

            let changed = tx.send_if_modified(|prev| {
                if *prev == Some(status) {
                    false
                } else {
                    *prev = Some(status);
                    true
                }
            });
            if changed {
                tracing::debug!("Daemon status: {:?}", status);
            }
            if tx.is_closed() {
                break;
            }
        }
    });

    (rx, handle)
}

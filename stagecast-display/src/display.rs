//! Renders session activity to the log for the life of the process.

use anyhow::Result;
use colored::Colorize;
use stagecast_core::SyncSession;
use stagecast_types::{AuthoritativeState, ConnectionStatus, SessionEvent, Severity, SyncError};
use tokio::sync::broadcast::{self, error::RecvError};

/// Follow the session until Ctrl-C (or until the session goes away).
pub async fn follow(session: &SyncSession, mut events: broadcast::Receiver<SessionEvent>) -> Result<()> {
    let mut state = session.subscribe_state();
    let mut status = session.subscribe_status();
    let mut last_phase: Option<String> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                tracing::info!("[Session] Ctrl-C received");
                return Ok(());
            }
            changed = state.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = state.borrow_and_update().clone();
                if let Some(current) = current {
                    render_state(&current, &mut last_phase);
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = *status.borrow_and_update();
                tracing::info!("[Push] Status: {}", describe_status(&current));
            }
            event = events.recv() => match event {
                Ok(event) => render_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "[Session] Event stream lagged");
                },
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}

fn render_state(state: &AuthoritativeState, last_phase: &mut Option<String>) {
    if last_phase.as_deref() == Some(state.phase.as_str()) {
        tracing::debug!(version = %state.source_version, "[Reconcile] State refreshed");
        return;
    }
    tracing::info!(
        phase = %state.phase,
        channel = %state.source_channel,
        version = %state.source_version,
        "[Reconcile] Phase is now '{}'",
        state.phase
    );
    *last_phase = Some(state.phase.clone());
}

fn render_event(event: &SessionEvent) {
    match event {
        SessionEvent::Error(SyncError::LiveUpdatesLost) => {
            eprintln!("{}", "connection lost, please refresh".red().bold());
        },
        SessionEvent::Error(error) => match error.severity() {
            Severity::Info => tracing::debug!("[Session] {}", error),
            Severity::Warning => tracing::warn!("[Session] {}", error),
            Severity::Fatal | Severity::Critical => tracing::error!("[Session] {}", error),
        },
        SessionEvent::MissingState { document_id } => {
            tracing::warn!(%document_id, "[Fallback] Shared document does not exist yet");
        },
        SessionEvent::Connection(_)
        | SessionEvent::CredentialRenewed { .. }
        | SessionEvent::FallbackSubscribed => {
            tracing::trace!(event = ?event, "[Session] Event");
        },
    }
}

/// One-line connectivity summary for the status indicator.
pub fn describe_status(status: &ConnectionStatus) -> String {
    if status.connected {
        "live".to_string()
    } else if status.attempt == 0 {
        "connecting".to_string()
    } else {
        format!("reconnecting (attempt {}/{})", status.attempt, status.max_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_status() {
        let live = ConnectionStatus { connected: true, attempt: 0, max_attempts: 10 };
        assert_eq!(describe_status(&live), "live");

        let starting = ConnectionStatus { connected: false, attempt: 0, max_attempts: 10 };
        assert_eq!(describe_status(&starting), "connecting");

        let retrying = ConnectionStatus { connected: false, attempt: 3, max_attempts: 10 };
        assert_eq!(describe_status(&retrying), "reconnecting (attempt 3/10)");
    }
}

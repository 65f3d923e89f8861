//! Wire payload decoding shared by the push and fallback adapters.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use stagecast_core::{DocumentChange, PushMessage};
use stagecast_types::{ChannelError, GameStateSnapshot, SourceVersion};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum PushFrame {
    #[serde(alias = "phase-changed")]
    State {
        state: Value,
        #[serde(default)]
        version: Option<Value>,
    },
    Ping,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct SnapshotData {
    document: Value,
    #[serde(default)]
    version: Option<Value>,
}

/// Decode one push text frame. `Ok(None)` means the frame carries nothing
/// for the sync core (unknown message type).
pub fn decode_push_frame(text: &str) -> Result<Option<PushMessage>, ChannelError> {
    let frame: PushFrame = serde_json::from_str(text).map_err(decode_error)?;
    match frame {
        PushFrame::State { state, version } => Ok(Some(PushMessage::State {
            snapshot: GameStateSnapshot::new(state),
            version: version_marker(version)?,
        })),
        PushFrame::Ping => Ok(Some(PushMessage::Heartbeat)),
        PushFrame::Unknown => Ok(None),
    }
}

/// Decode the data of an SSE `snapshot` event.
pub fn decode_document_snapshot(data: &str) -> Result<DocumentChange, ChannelError> {
    let data: SnapshotData = serde_json::from_str(data).map_err(decode_error)?;
    Ok(DocumentChange::Snapshot {
        snapshot: GameStateSnapshot::new(data.document),
        version: version_marker(data.version)?,
    })
}

/// Sources send revisions as strings or numbers; a missing one is replaced
/// by the local receive time.
fn version_marker(raw: Option<Value>) -> Result<SourceVersion, ChannelError> {
    match raw {
        Some(Value::String(marker)) => Ok(SourceVersion::new(marker)),
        Some(Value::Number(n)) => Ok(SourceVersion::new(n.to_string())),
        None | Some(Value::Null) => {
            Ok(SourceVersion::new(format!("local-{}", Utc::now().timestamp_micros())))
        },
        Some(other) => Err(ChannelError::Decode {
            message: format!("unsupported version marker: {}", other),
        }),
    }
}

fn decode_error(e: serde_json::Error) -> ChannelError {
    ChannelError::Decode { message: e.to_string() }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_and_phase_changed_frames() {
        let msg = decode_push_frame(
            r#"{"type":"phase-changed","state":{"phase":"results"},"version":"r9"}"#,
        )
        .unwrap();
        let Some(PushMessage::State { snapshot, version }) = msg else {
            panic!("expected state message, got {:?}", msg);
        };
        assert_eq!(snapshot.phase(), Some("results"));
        assert_eq!(version.as_str(), "r9");

        let msg = decode_push_frame(r#"{"type":"state","state":{"phase":"lobby"},"version":42}"#)
            .unwrap();
        assert!(matches!(msg, Some(PushMessage::State { version, .. }) if version.as_str() == "42"));
    }

    #[test]
    fn test_ping_and_unknown_frames_carry_no_state() {
        assert_eq!(decode_push_frame(r#"{"type":"ping"}"#).unwrap(), Some(PushMessage::Heartbeat));
        assert_eq!(decode_push_frame(r#"{"type":"presence","count":3}"#).unwrap(), None);
    }

    #[test]
    fn test_garbage_frame_is_decode_error() {
        let err = decode_push_frame("not json").unwrap_err();
        assert!(matches!(err, ChannelError::Decode { .. }));
        assert!(!err.is_disconnect());

        let err = decode_push_frame(r#"{"type":"state","state":{},"version":[1]}"#).unwrap_err();
        assert!(matches!(err, ChannelError::Decode { .. }));
    }

    #[test]
    fn test_document_snapshot() {
        let change =
            decode_document_snapshot(r#"{"version":"2024-05-01T10:00:00Z","document":{"phase":"question","n":3}}"#)
                .unwrap();
        let DocumentChange::Snapshot { snapshot, version } = change else {
            panic!("expected snapshot");
        };
        assert_eq!(snapshot.document(), &json!({"phase": "question", "n": 3}));
        assert_eq!(version.as_str(), "2024-05-01T10:00:00Z");
    }

    #[test]
    fn test_missing_version_gets_local_marker() {
        let change = decode_document_snapshot(r#"{"document":{"phase":"lobby"}}"#).unwrap();
        let DocumentChange::Snapshot { version, .. } = change else {
            panic!("expected snapshot");
        };
        assert!(version.as_str().starts_with("local-"));
    }
}

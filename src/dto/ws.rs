use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::room::{LeaderboardEntry, ParticipantSummary, QuestionView, RoomStatusDto};

/// Messages accepted from room WebSocket clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomInboundMessage {
    /// Subscribe this connection to a room's event stream. Admission into the
    /// room happens over REST; this only wires up realtime delivery.
    Join { room_code: String, user_id: Uuid },
    /// Unsubscribe, and when `user_id` is given also withdraw that
    /// participant from the room.
    Leave {
        room_code: String,
        #[serde(default)]
        user_id: Option<Uuid>,
    },
    #[serde(other)]
    Unknown,
}

/// Snapshot of the room sent privately to a connection right after it joins
/// the stream. When the quiz is already running it carries everything needed
/// to catch up: the questions, the per-question budget, and the start basis.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSnapshot {
    pub room_code: String,
    pub status: RoomStatusDto,
    pub participants: Vec<ParticipantSummary>,
    pub total_participants: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<QuestionView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_per_question: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

/// Events published to a room's subscribers (and, for `room.joined` and
/// `error`, to a single connection).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "event")]
pub enum RoomOutboundEvent {
    /// Private reply confirming the stream subscription.
    #[serde(rename = "room.joined")]
    RoomJoined { room: RoomSnapshot },
    /// Progress notice while the shared quiz is being generated.
    #[serde(rename = "quiz.generating")]
    QuizGenerating { message: String },
    /// Authoritative quiz-start signal; sent exactly once per room.
    #[serde(rename = "quiz.started")]
    QuizStarted {
        questions: Vec<QuestionView>,
        seconds_per_question: u16,
    },
    /// Somebody joined or left the room.
    #[serde(rename = "participants.changed")]
    ParticipantsChanged {
        participants: Vec<ParticipantSummary>,
        total_participants: usize,
    },
    /// Fresh standings after an accepted submission.
    #[serde(rename = "leaderboard.changed")]
    LeaderboardChanged { leaderboard: Vec<LeaderboardEntry> },
    /// Quiz generation failed beyond recovery (the fallback bank itself
    /// could not supply the configured question count).
    #[serde(rename = "quiz.generation_failed")]
    QuizGenerationFailed { message: String },
    /// Private failure notice scoped to the connection that caused it.
    #[serde(rename = "error")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_join_parses() {
        let raw = r#"{"type":"join","room_code":"AB12CD","user_id":"7f8e2b74-8f4f-4a80-9df5-6d50e75f1d8a"}"#;
        let message: RoomInboundMessage = serde_json::from_str(raw).unwrap();
        match message {
            RoomInboundMessage::Join { room_code, .. } => assert_eq!(room_code, "AB12CD"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn inbound_leave_user_is_optional() {
        let raw = r#"{"type":"leave","room_code":"AB12CD"}"#;
        let message: RoomInboundMessage = serde_json::from_str(raw).unwrap();
        match message {
            RoomInboundMessage::Leave { user_id, .. } => assert!(user_id.is_none()),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_inbound_types_are_tolerated() {
        let raw = r#"{"type":"ping"}"#;
        let message: RoomInboundMessage = serde_json::from_str(raw).unwrap();
        assert!(matches!(message, RoomInboundMessage::Unknown));
    }

    #[test]
    fn outbound_events_are_tagged_by_name() {
        let event = RoomOutboundEvent::QuizGenerating {
            message: "working".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "quiz.generating");
        assert_eq!(value["message"], "working");
    }
}

//! Constructors for the events published onto a room's broadcast channel.
//!
//! The lifecycle engine calls these after a mutation has been persisted; the
//! hub resolves which connections actually receive them.

use crate::{
    dto::{
        room::{LeaderboardEntry, participant_summaries, question_views},
        ws::RoomOutboundEvent,
    },
    state::{SharedState, room::Room},
};

/// Progress notice while a room's quiz is being generated.
pub fn broadcast_generating(state: &SharedState, code: &str, message: &str) {
    state.hub().broadcast(
        code,
        RoomOutboundEvent::QuizGenerating {
            message: message.to_owned(),
        },
    );
}

/// Authoritative quiz-start signal carrying the full question list and the
/// per-question time budget.
pub fn broadcast_started(state: &SharedState, room: &Room) {
    state.hub().broadcast(
        &room.code,
        RoomOutboundEvent::QuizStarted {
            questions: question_views(room),
            seconds_per_question: room.settings.seconds_per_question,
        },
    );
}

/// Updated participant list after a join or leave.
pub fn broadcast_participants_changed(state: &SharedState, room: &Room) {
    state.hub().broadcast(
        &room.code,
        RoomOutboundEvent::ParticipantsChanged {
            participants: participant_summaries(room),
            total_participants: room.participants.len(),
        },
    );
}

/// Fresh standings after an accepted submission.
pub fn broadcast_leaderboard(state: &SharedState, code: &str, leaderboard: &[LeaderboardEntry]) {
    state.hub().broadcast(
        code,
        RoomOutboundEvent::LeaderboardChanged {
            leaderboard: leaderboard.to_vec(),
        },
    );
}

/// Unrecoverable generation failure (fallback bank empty or misconfigured).
pub fn broadcast_generation_failed(state: &SharedState, code: &str, message: &str) {
    state.hub().broadcast(
        code,
        RoomOutboundEvent::QuizGenerationFailed {
            message: message.to_owned(),
        },
    );
}

//! Pure leaderboard derivation. Standings are computed from the participant
//! records on demand and never persisted.

use std::time::SystemTime;

use crate::{
    dto::{format_system_time, room::LeaderboardEntry},
    state::room::Room,
};

/// Derive the ranked standings for a room.
///
/// Only finished participants appear. The sort key is score descending with
/// completion time ascending as the tie-break; ranks are strictly positional
/// starting at 1 (full ties share nothing). Side-effect free: identical input
/// always yields identical output.
pub fn rank(room: &Room) -> Vec<LeaderboardEntry> {
    let mut finished: Vec<_> = room
        .participants
        .values()
        .filter(|participant| participant.finished)
        .collect();

    finished.sort_by(|a, b| {
        let score_a = a.score.unwrap_or(0);
        let score_b = b.score.unwrap_or(0);
        score_b.cmp(&score_a).then_with(|| {
            let done_a = a.completed_at.unwrap_or(SystemTime::UNIX_EPOCH);
            let done_b = b.completed_at.unwrap_or(SystemTime::UNIX_EPOCH);
            done_a.cmp(&done_b)
        })
    });

    finished
        .into_iter()
        .enumerate()
        .map(|(index, participant)| {
            let completed_at = participant.completed_at.unwrap_or(SystemTime::UNIX_EPOCH);
            LeaderboardEntry {
                rank: index + 1,
                user_id: participant.user_id,
                username: participant.username.clone(),
                score: participant.score.unwrap_or(0),
                correct_count: participant.correct_count,
                total_questions: participant.total_questions,
                completed_at: format_system_time(completed_at),
                time_taken_seconds: room
                    .started_at
                    .and_then(|started| time_taken(started, completed_at)),
            }
        })
        .collect()
}

/// Whole seconds between quiz start and submission, rounded.
fn time_taken(started_at: SystemTime, completed_at: SystemTime) -> Option<u64> {
    completed_at
        .duration_since(started_at)
        .ok()
        .map(|elapsed| elapsed.as_secs_f64().round() as u64)
}

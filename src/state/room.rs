use std::time::SystemTime;

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

/// Recorded in a participant's answer sheet when a question was left blank.
pub const NO_ANSWER: &str = "No answer";

/// Difficulty level a room's quiz is generated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Lifecycle status of a room. Transitions are monotonic:
/// waiting → active → finished, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    /// Accepting participants, quiz not yet generated.
    Waiting,
    /// Quiz generated and running; submissions are open.
    Active,
    /// Every participant has submitted; the room is read-only.
    Finished,
}

/// Immutable per-room quiz configuration, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSettings {
    /// Topic tags the quiz draws from (non-empty, ordered).
    pub categories: Vec<String>,
    pub difficulty: Difficulty,
    /// Number of questions the generated quiz must contain (5..=50).
    pub question_count: u8,
    /// Answer options per question (2..=6).
    pub options_per_question: u8,
    /// Time budget per question, broadcast with the quiz start (10..=120).
    pub seconds_per_question: u16,
    /// Admission cap including the creator (2..=100).
    pub max_participants: u8,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    /// Ordered answer options; `correct_option` is one of them.
    pub options: Vec<String>,
    pub correct_option: String,
}

/// The room's shared quiz. Empty until generated, then immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quiz {
    pub questions: Vec<Question>,
    pub generated: bool,
}

/// One graded answer in a participant's sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantAnswer {
    pub question_index: usize,
    /// The selected option, or [`NO_ANSWER`] when the question was skipped.
    pub selected_option: String,
    pub is_correct: bool,
}

/// A user enrolled in a room, tracked individually for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: Uuid,
    pub username: String,
    /// Percentage score, set once at submission (0 until then).
    pub score: Option<u8>,
    pub correct_count: u32,
    pub total_questions: u32,
    /// Graded answers, filled exactly once at submission.
    pub answers: Vec<ParticipantAnswer>,
    /// Monotonic false → true; set once when the answer sheet is accepted.
    pub finished: bool,
    pub joined_at: SystemTime,
    pub completed_at: Option<SystemTime>,
}

impl Participant {
    /// Enroll a fresh participant with an empty answer sheet.
    pub fn new(user_id: Uuid, username: String, joined_at: SystemTime) -> Self {
        Self {
            user_id,
            username,
            score: Some(0),
            correct_count: 0,
            total_questions: 0,
            answers: Vec::new(),
            finished: false,
            joined_at,
            completed_at: None,
        }
    }
}

/// Why a join request was rejected. Checked in this order: a closed room wins
/// over a full one, a full one over a duplicate join.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("room is closed and no longer accepts participants")]
    Closed,
    #[error("room is full ({max} participants maximum)")]
    Full { max: u8 },
    #[error("user is already a participant of this room")]
    AlreadyJoined,
}

/// Why installing the generated quiz was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("quiz can only start while the room is waiting (status is {status:?})")]
    NotWaiting { status: RoomStatus },
    #[error("generated quiz has {actual} questions, expected {expected}")]
    WrongQuestionCount { expected: u8, actual: usize },
}

/// Why an answer submission was rejected. Precondition order is fixed:
/// quiz readiness, answer count, membership, then double-submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("quiz has not been generated yet")]
    NotReady,
    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },
    #[error("user is not a participant of this room")]
    NotAParticipant,
    #[error("answers already submitted")]
    AlreadySubmitted,
}

/// Result of an accepted answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub score: u8,
    pub correct_count: u32,
    pub total_questions: u32,
}

/// Aggregated state of a multiplayer quiz session, persisted as one document
/// keyed by its unique `code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Unique six-character uppercase alphanumeric identifier.
    pub code: String,
    pub name: String,
    pub creator_id: Uuid,
    pub creator_name: String,
    pub settings: RoomSettings,
    /// Participants in join order, keyed by user id.
    pub participants: IndexMap<Uuid, Participant>,
    pub quiz: Quiz,
    pub status: RoomStatus,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub started_at: Option<SystemTime>,
    pub finished_at: Option<SystemTime>,
}

impl Room {
    /// Build a fresh waiting room with the creator enrolled as the first
    /// participant.
    pub fn new(
        code: String,
        name: String,
        creator_id: Uuid,
        creator_name: String,
        settings: RoomSettings,
        now: SystemTime,
    ) -> Self {
        let mut participants = IndexMap::new();
        participants.insert(
            creator_id,
            Participant::new(creator_id, creator_name.clone(), now),
        );

        Self {
            code,
            name,
            creator_id,
            creator_name,
            settings,
            participants,
            quiz: Quiz::default(),
            status: RoomStatus::Waiting,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    /// Admit a new participant, enforcing the admission policy in order:
    /// closed room, capacity, duplicate membership.
    pub fn join(
        &mut self,
        user_id: Uuid,
        username: String,
        now: SystemTime,
    ) -> Result<(), AdmissionError> {
        if self.status == RoomStatus::Finished {
            return Err(AdmissionError::Closed);
        }
        if self.participants.len() >= usize::from(self.settings.max_participants) {
            return Err(AdmissionError::Full {
                max: self.settings.max_participants,
            });
        }
        if self.participants.contains_key(&user_id) {
            return Err(AdmissionError::AlreadyJoined);
        }

        self.participants
            .insert(user_id, Participant::new(user_id, username, now));
        self.updated_at = now;
        Ok(())
    }

    /// Remove a participant, preserving the join order of the rest.
    /// Returns whether anything was removed so callers can skip the persist
    /// and broadcast on a no-op.
    pub fn remove_participant(&mut self, user_id: &Uuid, now: SystemTime) -> bool {
        let removed = self.participants.shift_remove(user_id).is_some();
        if removed {
            self.updated_at = now;
        }
        removed
    }

    /// Install the generated quiz and activate the room.
    ///
    /// The quiz is set at most once: this only succeeds from the waiting
    /// status, and the question list must match the configured count exactly.
    pub fn start(&mut self, questions: Vec<Question>, now: SystemTime) -> Result<(), StartError> {
        if self.status != RoomStatus::Waiting {
            return Err(StartError::NotWaiting {
                status: self.status,
            });
        }
        if questions.len() != usize::from(self.settings.question_count) {
            return Err(StartError::WrongQuestionCount {
                expected: self.settings.question_count,
                actual: questions.len(),
            });
        }

        self.quiz = Quiz {
            questions,
            generated: true,
        };
        self.status = RoomStatus::Active;
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Grade and record a participant's answer sheet.
    ///
    /// Accepted exactly once per participant; a second submission is rejected
    /// without touching the stored score or answers. `None` entries are
    /// recorded with the [`NO_ANSWER`] sentinel and graded incorrect.
    pub fn submit(
        &mut self,
        user_id: &Uuid,
        answers: &[Option<String>],
        now: SystemTime,
    ) -> Result<SubmissionOutcome, SubmitError> {
        if !self.quiz.generated || self.quiz.questions.is_empty() {
            return Err(SubmitError::NotReady);
        }

        let expected = self.quiz.questions.len();
        if answers.len() != expected {
            return Err(SubmitError::AnswerCountMismatch {
                expected,
                actual: answers.len(),
            });
        }

        let Some(participant) = self.participants.get_mut(user_id) else {
            return Err(SubmitError::NotAParticipant);
        };
        if participant.finished {
            return Err(SubmitError::AlreadySubmitted);
        }

        let mut correct_count: u32 = 0;
        let mut sheet = Vec::with_capacity(expected);
        for (index, question) in self.quiz.questions.iter().enumerate() {
            let selected = answers[index].as_deref();
            let is_correct = selected == Some(question.correct_option.as_str());
            if is_correct {
                correct_count += 1;
            }
            sheet.push(ParticipantAnswer {
                question_index: index,
                selected_option: selected.unwrap_or(NO_ANSWER).to_owned(),
                is_correct,
            });
        }

        let total = expected as u32;
        let score = ((f64::from(correct_count) / f64::from(total)) * 100.0).round() as u8;

        participant.score = Some(score);
        participant.correct_count = correct_count;
        participant.total_questions = total;
        participant.answers = sheet;
        participant.finished = true;
        participant.completed_at = Some(now);
        self.updated_at = now;

        Ok(SubmissionOutcome {
            score,
            correct_count,
            total_questions: total,
        })
    }

    /// Whether every enrolled participant has submitted.
    pub fn all_finished(&self) -> bool {
        !self.participants.is_empty() && self.participants.values().all(|p| p.finished)
    }

    /// Close the room permanently. Idempotent: the first call wins and later
    /// calls keep the original `finished_at`.
    pub fn finish(&mut self, now: SystemTime) {
        if self.status == RoomStatus::Finished {
            return;
        }
        self.status = RoomStatus::Finished;
        self.finished_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn settings() -> RoomSettings {
        RoomSettings {
            categories: vec!["science".into()],
            difficulty: Difficulty::Medium,
            question_count: 5,
            options_per_question: 4,
            seconds_per_question: 30,
            max_participants: 2,
        }
    }

    fn questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| Question {
                text: format!("Question {i}?"),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_option: "A".into(),
            })
            .collect()
    }

    fn room() -> Room {
        Room::new(
            "AB12CD".into(),
            "friday night".into(),
            Uuid::new_v4(),
            "alice".into(),
            settings(),
            SystemTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn creator_is_enrolled_first() {
        let room = room();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.participants.len(), 1);
        let first = room.participants.values().next().unwrap();
        assert_eq!(first.user_id, room.creator_id);
        assert_eq!(first.username, "alice");
        assert_eq!(first.score, Some(0));
        assert!(!first.finished);
    }

    #[test]
    fn join_rejected_once_full() {
        let mut room = room();
        room.join(Uuid::new_v4(), "bob".into(), SystemTime::UNIX_EPOCH)
            .unwrap();
        let err = room
            .join(Uuid::new_v4(), "carol".into(), SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert_eq!(err, AdmissionError::Full { max: 2 });
        assert_eq!(room.participants.len(), 2);
    }

    #[test]
    fn join_rejected_when_finished_even_if_full() {
        let mut room = room();
        room.join(Uuid::new_v4(), "bob".into(), SystemTime::UNIX_EPOCH)
            .unwrap();
        room.finish(SystemTime::UNIX_EPOCH);
        // A closed room reports Closed, not Full, regardless of capacity.
        let err = room
            .join(Uuid::new_v4(), "carol".into(), SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert_eq!(err, AdmissionError::Closed);
    }

    #[test]
    fn duplicate_join_rejected() {
        let mut room = room();
        let creator = room.creator_id;
        let err = room
            .join(creator, "alice".into(), SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert_eq!(err, AdmissionError::AlreadyJoined);
    }

    #[test]
    fn start_requires_waiting_status() {
        let mut room = room();
        room.start(questions(5), SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(room.status, RoomStatus::Active);
        assert!(room.quiz.generated);
        assert!(room.started_at.is_some());

        let err = room.start(questions(5), SystemTime::UNIX_EPOCH).unwrap_err();
        assert_eq!(
            err,
            StartError::NotWaiting {
                status: RoomStatus::Active
            }
        );
    }

    #[test]
    fn start_rejects_wrong_question_count() {
        let mut room = room();
        let err = room.start(questions(3), SystemTime::UNIX_EPOCH).unwrap_err();
        assert_eq!(
            err,
            StartError::WrongQuestionCount {
                expected: 5,
                actual: 3
            }
        );
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(!room.quiz.generated);
    }

    #[test]
    fn submit_preconditions_checked_in_order() {
        let mut room = room();
        let creator = room.creator_id;

        // Before generation even a malformed sheet reports NotReady.
        let err = room
            .submit(&creator, &[], SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert_eq!(err, SubmitError::NotReady);

        room.start(questions(5), SystemTime::UNIX_EPOCH).unwrap();

        let short = vec![Some("A".to_owned()); 3];
        let err = room
            .submit(&creator, &short, SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert_eq!(
            err,
            SubmitError::AnswerCountMismatch {
                expected: 5,
                actual: 3
            }
        );

        let full = vec![Some("A".to_owned()); 5];
        let err = room
            .submit(&Uuid::new_v4(), &full, SystemTime::UNIX_EPOCH)
            .unwrap_err();
        assert_eq!(err, SubmitError::NotAParticipant);
    }

    #[test]
    fn scoring_is_exact() {
        let mut room = room();
        let creator = room.creator_id;
        let quiz = vec![
            Question {
                text: "q1".into(),
                options: vec!["A".into(), "B".into()],
                correct_option: "A".into(),
            },
            Question {
                text: "q2".into(),
                options: vec!["B".into(), "C".into()],
                correct_option: "B".into(),
            },
        ];
        let mut settings = settings();
        settings.question_count = 2;
        room.settings = settings;
        room.start(quiz, SystemTime::UNIX_EPOCH).unwrap();

        let outcome = room
            .submit(
                &creator,
                &[Some("A".to_owned()), Some("C".to_owned())],
                SystemTime::UNIX_EPOCH,
            )
            .unwrap();
        assert_eq!(outcome.correct_count, 1);
        assert_eq!(outcome.score, 50);

        let sheet = &room.participants[&creator].answers;
        assert_eq!(sheet.len(), 2);
        assert!(sheet[0].is_correct);
        assert!(!sheet[1].is_correct);
    }

    #[test]
    fn missing_answers_use_sentinel_and_count_incorrect() {
        let mut room = room();
        let creator = room.creator_id;
        room.start(questions(5), SystemTime::UNIX_EPOCH).unwrap();

        let answers = vec![Some("A".to_owned()), None, None, None, None];
        let outcome = room
            .submit(&creator, &answers, SystemTime::UNIX_EPOCH)
            .unwrap();
        assert_eq!(outcome.correct_count, 1);
        assert_eq!(outcome.score, 20);

        let sheet = &room.participants[&creator].answers;
        assert_eq!(sheet[1].selected_option, NO_ANSWER);
        assert!(!sheet[1].is_correct);
    }

    #[test]
    fn resubmission_rejected_without_mutation() {
        let mut room = room();
        let creator = room.creator_id;
        room.start(questions(5), SystemTime::UNIX_EPOCH).unwrap();

        let all_right = vec![Some("A".to_owned()); 5];
        let first = room
            .submit(&creator, &all_right, SystemTime::UNIX_EPOCH)
            .unwrap();
        assert_eq!(first.score, 100);

        let all_wrong = vec![Some("B".to_owned()); 5];
        let later = SystemTime::UNIX_EPOCH + Duration::from_secs(60);
        let err = room.submit(&creator, &all_wrong, later).unwrap_err();
        assert_eq!(err, SubmitError::AlreadySubmitted);

        let participant = &room.participants[&creator];
        assert_eq!(participant.score, Some(100));
        assert_eq!(participant.completed_at, Some(SystemTime::UNIX_EPOCH));
        assert!(participant.answers.iter().all(|a| a.is_correct));
    }

    #[test]
    fn finish_is_monotonic() {
        let mut room = room();
        let first = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let second = SystemTime::UNIX_EPOCH + Duration::from_secs(20);
        room.finish(first);
        room.finish(second);
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.finished_at, Some(first));
    }

    #[test]
    fn all_finished_tracks_every_participant() {
        let mut room = room();
        let creator = room.creator_id;
        let other = Uuid::new_v4();
        room.join(other, "bob".into(), SystemTime::UNIX_EPOCH).unwrap();
        room.start(questions(5), SystemTime::UNIX_EPOCH).unwrap();
        assert!(!room.all_finished());

        let answers = vec![Some("A".to_owned()); 5];
        room.submit(&creator, &answers, SystemTime::UNIX_EPOCH)
            .unwrap();
        assert!(!room.all_finished());
        room.submit(&other, &answers, SystemTime::UNIX_EPOCH)
            .unwrap();
        assert!(room.all_finished());
    }
}

//! Room lifecycle engine: creation, admission, quiz start, answer
//! submission, and withdrawal.
//!
//! The room store is a plain load/mutate/save document store, so every
//! mutating operation here acquires the per-room lock and holds it across the
//! whole read-modify-write span. Quiz generation and submission acceptance
//! stay at-most-once under concurrent requests.

use std::time::SystemTime;

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::room_store::RoomStore,
    dto::room::{
        CreateRoomRequest, RoomSummary, RoomView, StartQuizResponse, SubmitAnswersRequest,
        SubmitAnswersResponse, question_views,
    },
    error::ServiceError,
    services::{leaderboard, question_source::GenerationSpec, room_events},
    state::{
        SharedState,
        room::{Room, RoomSettings, RoomStatus},
    },
};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROOM_CODE_LENGTH: usize = 6;

/// Create a new quiz room with the requester enrolled as its creator.
pub async fn create_room(
    state: &SharedState,
    creator_id: Uuid,
    creator_name: String,
    request: CreateRoomRequest,
) -> Result<RoomSummary, ServiceError> {
    request.validate()?;

    let store = state.require_room_store().await?;
    let code = allocate_room_code(store.as_ref()).await?;

    let settings = RoomSettings {
        categories: request.categories,
        difficulty: request.difficulty.into(),
        question_count: request.question_count,
        options_per_question: request.options_per_question,
        seconds_per_question: request.seconds_per_question,
        max_participants: request.max_participants,
    };

    let room = Room::new(
        code,
        request.name,
        creator_id,
        creator_name,
        settings,
        SystemTime::now(),
    );

    let summary = RoomSummary::from(&room);
    store.save_room(room.clone().into()).await?;
    info!(code = %room.code, creator = %room.creator_name, "quiz room created");

    Ok(summary)
}

/// Admit a user into a room and notify its subscribers.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
    username: String,
) -> Result<RoomSummary, ServiceError> {
    let _guard = state.room_locks().acquire(code).await;
    let store = state.require_room_store().await?;
    let mut room = load_room(store.as_ref(), code).await?;

    room.join(user_id, username, SystemTime::now())?;
    store.save_room(room.clone().into()).await?;

    room_events::broadcast_participants_changed(state, &room);
    info!(code = %room.code, %user_id, total = room.participants.len(), "participant joined");

    Ok(RoomSummary::from(&room))
}

/// Start a room's quiz: generate the shared question list once, activate the
/// room, and broadcast the start signal.
///
/// Only the creator may start, and only from the waiting status. A concurrent
/// second start serializes behind the room lock, observes the quiz already
/// generated, and gets the started state back without re-invoking the
/// question source.
pub async fn start_quiz(
    state: &SharedState,
    code: &str,
    requester_id: Uuid,
) -> Result<StartQuizResponse, ServiceError> {
    let _guard = state.room_locks().acquire(code).await;
    let store = state.require_room_store().await?;
    let mut room = load_room(store.as_ref(), code).await?;

    if room.creator_id != requester_id {
        return Err(ServiceError::Forbidden(
            "only the room creator can start the quiz".into(),
        ));
    }

    match room.status {
        RoomStatus::Waiting => {}
        RoomStatus::Active if room.quiz.generated => {
            info!(code = %room.code, "start requested on an already running quiz");
            return Ok(StartQuizResponse {
                questions: question_views(&room),
                seconds_per_question: room.settings.seconds_per_question,
            });
        }
        status => {
            return Err(ServiceError::InvalidState(format!(
                "quiz cannot start while the room is {status:?}"
            )));
        }
    }

    room_events::broadcast_generating(state, code, "Quiz is being generated, please wait...");

    let spec = GenerationSpec {
        difficulty: room.settings.difficulty,
        categories: room.settings.categories.clone(),
        question_count: room.settings.question_count,
        options_per_question: room.settings.options_per_question,
    };

    let questions = match state.question_source().generate(spec).await {
        Ok(questions) => {
            room_events::broadcast_generating(state, code, "Questions ready, starting quiz...");
            questions
        }
        Err(err) => {
            warn!(code = %room.code, error = %err, "question source failed; using fallback bank");
            room_events::broadcast_generating(
                state,
                code,
                "Question service unavailable, using backup questions...",
            );
            state
                .config()
                .fallback_bank
                .questions(room.settings.difficulty, room.settings.question_count)
        }
    };

    if questions.len() != usize::from(room.settings.question_count) {
        let message = format!(
            "quiz generation produced {} questions instead of {}",
            questions.len(),
            room.settings.question_count
        );
        room_events::broadcast_generation_failed(state, code, &message);
        return Err(ServiceError::ExternalService(message));
    }

    room.start(questions, SystemTime::now())?;
    store.save_room(room.clone().into()).await?;

    room_events::broadcast_started(state, &room);
    info!(
        code = %room.code,
        questions = room.quiz.questions.len(),
        "quiz started"
    );

    Ok(StartQuizResponse {
        questions: question_views(&room),
        seconds_per_question: room.settings.seconds_per_question,
    })
}

/// Accept a participant's answer sheet exactly once, persist the graded
/// result, and broadcast the refreshed leaderboard.
///
/// When the submission leaves every participant finished the room itself
/// transitions to finished within the same persisted mutation.
pub async fn submit_answers(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
    request: SubmitAnswersRequest,
) -> Result<SubmitAnswersResponse, ServiceError> {
    let _guard = state.room_locks().acquire(code).await;
    let store = state.require_room_store().await?;
    let mut room = load_room(store.as_ref(), code).await?;

    let now = SystemTime::now();
    let outcome = room.submit(&user_id, &request.answers, now)?;
    if room.all_finished() {
        room.finish(now);
        info!(code = %room.code, "all participants finished; room closed");
    }
    store.save_room(room.clone().into()).await?;

    let leaderboard = leaderboard::rank(&room);
    room_events::broadcast_leaderboard(state, code, &leaderboard);
    info!(code = %room.code, %user_id, score = outcome.score, "answers submitted");

    Ok(SubmitAnswersResponse {
        score: outcome.score,
        correct_count: outcome.correct_count,
        total_questions: outcome.total_questions,
        leaderboard,
    })
}

/// Withdraw a participant from a room and notify the remaining subscribers.
///
/// Idempotent: an unknown room or a user that already left is a no-op, so the
/// realtime layer can run this for both an explicit leave and the transport
/// disconnect that may follow it.
pub async fn leave_room(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    let _guard = state.room_locks().acquire(code).await;
    let store = state.require_room_store().await?;

    let Some(entity) = store.find_room(code.to_owned()).await? else {
        return Ok(());
    };
    let mut room: Room = entity.into();

    if !room.remove_participant(&user_id, SystemTime::now()) {
        return Ok(());
    }

    store.save_room(room.clone().into()).await?;
    room_events::broadcast_participants_changed(state, &room);
    info!(code = %room.code, %user_id, remaining = room.participants.len(), "participant left");

    Ok(())
}

/// Full room view including the computed leaderboard.
pub async fn room_view(state: &SharedState, code: &str) -> Result<RoomView, ServiceError> {
    let room = fetch_room(state, code).await?;
    let leaderboard = leaderboard::rank(&room);
    Ok(RoomView::assemble(&room, leaderboard))
}

/// Load a room for read-only use (views, stream subscriptions).
pub(crate) async fn fetch_room(state: &SharedState, code: &str) -> Result<Room, ServiceError> {
    let store = state.require_room_store().await?;
    load_room(store.as_ref(), code).await
}

async fn load_room(store: &dyn RoomStore, code: &str) -> Result<Room, ServiceError> {
    let entity = store
        .find_room(code.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))?;
    Ok(entity.into())
}

/// Draw random codes until one is unused in the store.
async fn allocate_room_code(store: &dyn RoomStore) -> Result<String, ServiceError> {
    loop {
        let code = random_room_code();
        if store.find_room(code.clone()).await?.is_none() {
            return Ok(code);
        }
        warn!(%code, "room code collision; drawing again");
    }
}

fn random_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            char::from(ROOM_CODE_ALPHABET[index])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::InMemoryRoomStore,
        dto::room::DifficultyDto,
        dto::ws::RoomOutboundEvent,
        services::question_source::{QuestionSource, QuestionSourceError},
        state::{AppState, room::Question},
    };

    /// Scripted question source counting its invocations.
    struct ScriptedSource {
        calls: AtomicUsize,
        behavior: Behavior,
    }

    enum Behavior {
        Fail,
        Supply { delay: Duration },
    }

    impl ScriptedSource {
        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                behavior: Behavior::Fail,
            })
        }

        fn supplying(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                behavior: Behavior::Supply { delay },
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl QuestionSource for ScriptedSource {
        fn generate(
            &self,
            spec: GenerationSpec,
        ) -> BoxFuture<'static, Result<Vec<Question>, QuestionSourceError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let behavior = match &self.behavior {
                Behavior::Fail => None,
                Behavior::Supply { delay } => Some(*delay),
            };
            Box::pin(async move {
                match behavior {
                    None => Err(QuestionSourceError::EmptyCompletion),
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        Ok((0..spec.question_count)
                            .map(|i| Question {
                                text: format!("Generated question {i}?"),
                                options: (0..spec.options_per_question)
                                    .map(|o| format!("option-{o}"))
                                    .collect(),
                                correct_option: "option-0".into(),
                            })
                            .collect())
                    }
                }
            })
        }
    }

    async fn test_state(source: Arc<ScriptedSource>) -> SharedState {
        let state = AppState::new(AppConfig::default(), source);
        state
            .install_room_store(Arc::new(InMemoryRoomStore::new()))
            .await;
        state
    }

    fn create_request(question_count: u8, max_participants: u8) -> CreateRoomRequest {
        CreateRoomRequest {
            name: "friday night".into(),
            categories: vec!["science".into(), "history".into()],
            difficulty: DifficultyDto::Medium,
            question_count,
            options_per_question: 4,
            seconds_per_question: 30,
            max_participants,
        }
    }

    #[tokio::test]
    async fn created_room_has_a_valid_code_and_the_creator_enrolled() {
        let state = test_state(ScriptedSource::failing()).await;
        let creator = Uuid::new_v4();

        let summary = create_room(&state, creator, "alice".into(), create_request(5, 4))
            .await
            .unwrap();

        assert_eq!(summary.room_code.len(), 6);
        assert!(
            summary
                .room_code
                .bytes()
                .all(|b| ROOM_CODE_ALPHABET.contains(&b))
        );
        assert_eq!(summary.total_participants, 1);
        assert_eq!(summary.participants[0].user_id, creator);

        let view = room_view(&state, &summary.room_code).await.unwrap();
        assert_eq!(view.participants[0].username, "alice");
        assert!(view.leaderboard.is_empty());
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let state = test_state(ScriptedSource::failing()).await;

        let mut request = create_request(5, 4);
        request.question_count = 3;
        let err = create_room(&state, Uuid::new_v4(), "alice".into(), request)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let mut request = create_request(5, 4);
        request.categories = Vec::new();
        let err = create_room(&state, Uuid::new_v4(), "alice".into(), request)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn join_is_rejected_by_policy_in_order() {
        let state = test_state(ScriptedSource::failing()).await;
        let creator = Uuid::new_v4();
        let summary = create_room(&state, creator, "alice".into(), create_request(5, 2))
            .await
            .unwrap();
        let code = summary.room_code;

        join_room(&state, &code, Uuid::new_v4(), "bob".into())
            .await
            .unwrap();

        let err = join_room(&state, &code, Uuid::new_v4(), "carol".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "room_full");

        let err = join_room(&state, &code, creator, "alice".into())
            .await
            .unwrap_err();
        // Capacity is checked before duplicate membership.
        assert_eq!(err.kind(), "room_full");
    }

    #[tokio::test]
    async fn duplicate_join_is_flagged_as_already_joined() {
        let state = test_state(ScriptedSource::failing()).await;
        let creator = Uuid::new_v4();
        let summary = create_room(&state, creator, "alice".into(), create_request(5, 4))
            .await
            .unwrap();

        let err = join_room(&state, &summary.room_code, creator, "alice".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "already_joined");
    }

    #[tokio::test]
    async fn only_the_creator_can_start() {
        let state = test_state(ScriptedSource::failing()).await;
        let summary = create_room(&state, Uuid::new_v4(), "alice".into(), create_request(5, 4))
            .await
            .unwrap();

        let err = start_quiz(&state, &summary.room_code, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }

    #[tokio::test]
    async fn failed_generation_falls_back_to_exactly_the_configured_count() {
        let source = ScriptedSource::failing();
        let state = test_state(source.clone()).await;
        let creator = Uuid::new_v4();
        let summary = create_room(&state, creator, "alice".into(), create_request(7, 4))
            .await
            .unwrap();

        let response = start_quiz(&state, &summary.room_code, creator)
            .await
            .unwrap();
        assert_eq!(response.questions.len(), 7);
        assert_eq!(source.calls(), 1);

        let view = room_view(&state, &summary.room_code).await.unwrap();
        assert!(view.quiz_generated);
        assert_eq!(view.questions.len(), 7);
        assert!(view.started_at.is_some());
    }

    #[tokio::test]
    async fn concurrent_starts_invoke_the_source_exactly_once() {
        let source = ScriptedSource::supplying(Duration::from_millis(50));
        let state = test_state(source.clone()).await;
        let creator = Uuid::new_v4();
        let summary = create_room(&state, creator, "alice".into(), create_request(5, 4))
            .await
            .unwrap();
        let code = summary.room_code;

        let first = tokio::spawn({
            let state = state.clone();
            let code = code.clone();
            async move { start_quiz(&state, &code, creator).await }
        });
        let second = tokio::spawn({
            let state = state.clone();
            let code = code.clone();
            async move { start_quiz(&state, &code, creator).await }
        });

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first.questions.len(), 5);
        // The late starter sees the same already-generated quiz.
        assert_eq!(
            second
                .questions
                .iter()
                .map(|q| q.question.clone())
                .collect::<Vec<_>>(),
            first
                .questions
                .iter()
                .map(|q| q.question.clone())
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn start_events_preserve_their_order() {
        let source = ScriptedSource::failing();
        let state = test_state(source).await;
        let creator = Uuid::new_v4();
        let summary = create_room(&state, creator, "alice".into(), create_request(5, 4))
            .await
            .unwrap();
        let mut events = state.hub().subscribe(&summary.room_code);

        start_quiz(&state, &summary.room_code, creator)
            .await
            .unwrap();

        // Generating notices strictly precede the start signal.
        let mut saw_generating = false;
        loop {
            match events.try_recv().unwrap() {
                RoomOutboundEvent::QuizGenerating { .. } => saw_generating = true,
                RoomOutboundEvent::QuizStarted { questions, .. } => {
                    assert!(saw_generating);
                    assert_eq!(questions.len(), 5);
                    break;
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn submission_validates_the_answer_count_both_ways() {
        let source = ScriptedSource::failing();
        let state = test_state(source).await;
        let creator = Uuid::new_v4();
        let summary = create_room(&state, creator, "alice".into(), create_request(5, 4))
            .await
            .unwrap();
        let code = summary.room_code;
        start_quiz(&state, &code, creator).await.unwrap();

        for wrong in [3usize, 8] {
            let request = SubmitAnswersRequest {
                answers: vec![None; wrong],
            };
            let err = submit_answers(&state, &code, creator, request)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "validation_error");
            assert!(
                err.to_string().contains("expected 5 answers"),
                "{err}"
            );
        }
    }

    #[tokio::test]
    async fn resubmission_is_rejected_and_nothing_moves() {
        let source = ScriptedSource::supplying(Duration::ZERO);
        let state = test_state(source).await;
        let creator = Uuid::new_v4();
        let summary = create_room(&state, creator, "alice".into(), create_request(5, 4))
            .await
            .unwrap();
        let code = summary.room_code;
        let started = start_quiz(&state, &code, creator).await.unwrap();

        let all_right: Vec<_> = started
            .questions
            .iter()
            .map(|q| Some(q.correct_answer.clone()))
            .collect();
        let first = submit_answers(
            &state,
            &code,
            creator,
            SubmitAnswersRequest {
                answers: all_right,
            },
        )
        .await
        .unwrap();
        assert_eq!(first.score, 100);

        let err = submit_answers(
            &state,
            &code,
            creator,
            SubmitAnswersRequest {
                answers: vec![None; 5],
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "already_submitted");

        let view = room_view(&state, &code).await.unwrap();
        assert_eq!(view.leaderboard.len(), 1);
        assert_eq!(view.leaderboard[0].score, 100);
    }

    #[tokio::test]
    async fn leave_is_idempotent_and_ignores_unknown_rooms() {
        let state = test_state(ScriptedSource::failing()).await;
        let creator = Uuid::new_v4();
        let summary = create_room(&state, creator, "alice".into(), create_request(5, 4))
            .await
            .unwrap();
        let code = summary.room_code;
        let bob = Uuid::new_v4();
        join_room(&state, &code, bob, "bob".into()).await.unwrap();

        leave_room(&state, &code, bob).await.unwrap();
        // Explicit leave followed by the disconnect cleanup must not fail.
        leave_room(&state, &code, bob).await.unwrap();
        leave_room(&state, "ZZZZZZ", bob).await.unwrap();

        let view = room_view(&state, &code).await.unwrap();
        assert_eq!(view.participants.len(), 1);
    }

    #[tokio::test]
    async fn full_match_from_creation_to_final_leaderboard() {
        let source = ScriptedSource::failing();
        let state = test_state(source.clone()).await;
        let creator = Uuid::new_v4();

        let summary = create_room(&state, creator, "alice".into(), create_request(5, 2))
            .await
            .unwrap();
        let code = summary.room_code;

        let bob = Uuid::new_v4();
        join_room(&state, &code, bob, "bob".into()).await.unwrap();
        let err = join_room(&state, &code, Uuid::new_v4(), "carol".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "room_full");

        // Question source fails; the fallback supplies exactly five questions.
        let started = start_quiz(&state, &code, creator).await.unwrap();
        assert_eq!(started.questions.len(), 5);
        assert_eq!(source.calls(), 1);

        let all_right: Vec<_> = started
            .questions
            .iter()
            .map(|q| Some(q.correct_answer.clone()))
            .collect();
        let mut all_wrong = vec![Some("definitely not it".to_owned()); 5];
        all_wrong[4] = None;

        let mut events = state.hub().subscribe(&code);
        submit_answers(
            &state,
            &code,
            bob,
            SubmitAnswersRequest { answers: all_wrong },
        )
        .await
        .unwrap();
        let final_result = submit_answers(
            &state,
            &code,
            creator,
            SubmitAnswersRequest {
                answers: all_right,
            },
        )
        .await
        .unwrap();

        assert_eq!(final_result.leaderboard.len(), 2);
        assert_eq!(final_result.leaderboard[0].username, "alice");
        assert_eq!(final_result.leaderboard[0].rank, 1);
        assert_eq!(final_result.leaderboard[0].score, 100);
        assert_eq!(final_result.leaderboard[1].username, "bob");
        assert_eq!(final_result.leaderboard[1].score, 0);

        // Both submissions were broadcast as leaderboard updates.
        let mut updates = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, RoomOutboundEvent::LeaderboardChanged { .. }) {
                updates += 1;
            }
        }
        assert_eq!(updates, 2);

        // Everyone finished, so the room closed and admits nobody.
        let view = room_view(&state, &code).await.unwrap();
        assert!(matches!(
            view.status,
            crate::dto::room::RoomStatusDto::Finished
        ));
        let err = join_room(&state, &code, Uuid::new_v4(), "late".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "room_closed");
    }
}

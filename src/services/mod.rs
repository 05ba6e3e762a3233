/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Pure leaderboard derivation.
pub mod leaderboard;
/// Built-in fallback question bank.
pub mod question_bank;
/// External question generator and its strict response parsing.
pub mod question_source;
/// Broadcast event constructors for room streams.
pub mod room_events;
/// Room lifecycle engine: create, join, start, submit, leave.
pub mod room_service;
/// Storage persistence supervisor with reconnect and degraded mode.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;

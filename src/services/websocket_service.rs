//! Per-connection handling for the room event stream.
//!
//! A connection joins a room's broadcast group, gets a private snapshot to
//! catch up, and from then on receives whatever the lifecycle engine
//! publishes for that room. Engine failures triggered by this connection are
//! reported privately and never tear down the socket or disturb the rest of
//! the room.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        format_system_time,
        room::{participant_summaries, question_views},
        ws::{RoomInboundMessage, RoomOutboundEvent, RoomSnapshot},
    },
    error::ServiceError,
    services::{room_events, room_service},
    state::{SharedState, room::Room},
};

/// The room stream a connection is currently attached to.
struct StreamAttachment {
    room_code: String,
    user_id: Uuid,
    forward: JoinHandle<()>,
}

#[derive(Debug, Error)]
enum StreamError {
    /// Writer channel closed; the connection is gone.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Handle the full lifecycle of one room-stream WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut attachment: Option<StreamAttachment> = None;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<RoomInboundMessage>(&text) {
                Ok(RoomInboundMessage::Join { room_code, user_id }) => {
                    if let Err(err) =
                        handle_join(&state, &outbound_tx, &mut attachment, room_code, user_id)
                            .await
                    {
                        warn!(error = %err, "room stream join failed");
                        send_error(&outbound_tx, &err);
                    }
                }
                Ok(RoomInboundMessage::Leave { room_code, user_id }) => {
                    if let Err(err) =
                        handle_leave(&state, &mut attachment, &room_code, user_id).await
                    {
                        warn!(error = %err, "room stream leave failed");
                        send_error(&outbound_tx, &err);
                    }
                }
                Ok(RoomInboundMessage::Unknown) => {
                    warn!("ignoring unknown room stream message");
                }
                Err(err) => {
                    warn!(error = %err, "failed to parse room stream message");
                    let _ = send_event(
                        &outbound_tx,
                        &RoomOutboundEvent::Error {
                            message: "malformed message".into(),
                        },
                    );
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(error = %err, "websocket error");
                break;
            }
        }
    }

    // Transport disconnect counts as a leave for whatever room the connection
    // was attached to. The engine call is idempotent, so an explicit leave
    // followed by this cleanup is harmless.
    if let Some(attached) = attachment.take() {
        detach(&state, &attached);
        if let Err(err) =
            room_service::leave_room(&state, &attached.room_code, attached.user_id).await
        {
            warn!(code = %attached.room_code, error = %err, "disconnect cleanup failed");
        }
        info!(code = %attached.room_code, user_id = %attached.user_id, "connection disconnected");
    }

    finalize(writer_task, outbound_tx).await;
}

/// Subscribe the connection to a room's stream and reply with the snapshot.
async fn handle_join(
    state: &SharedState,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    attachment: &mut Option<StreamAttachment>,
    room_code: String,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    let room = room_service::fetch_room(state, &room_code).await?;

    // Re-joining from the same connection switches streams; the participant
    // record is untouched, only the subscription moves.
    if let Some(previous) = attachment.take() {
        detach(state, &previous);
    }

    // Reply to the caller alone with the current state, then tell existing
    // subscribers about the presence change. Subscribing only afterwards
    // keeps the joiner from hearing its own notice.
    let _ = send_event(
        outbound_tx,
        &RoomOutboundEvent::RoomJoined {
            room: room_snapshot(&room),
        },
    );
    room_events::broadcast_participants_changed(state, &room);

    let receiver = state.hub().subscribe(&room_code);
    let forward = spawn_forwarder(receiver, outbound_tx.clone());

    info!(code = %room_code, %user_id, "connection joined room stream");
    *attachment = Some(StreamAttachment {
        room_code,
        user_id,
        forward,
    });
    Ok(())
}

/// Unsubscribe the connection and, when a user is named, withdraw that
/// participant from the room.
async fn handle_leave(
    state: &SharedState,
    attachment: &mut Option<StreamAttachment>,
    room_code: &str,
    user_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    if attachment
        .as_ref()
        .is_some_and(|current| current.room_code == room_code)
    {
        let current = attachment.take().expect("attachment checked above");
        detach(state, &current);
        info!(code = %room_code, "connection left room stream");
    }

    if let Some(user_id) = user_id {
        room_service::leave_room(state, room_code, user_id).await?;
    }
    Ok(())
}

/// Stop forwarding a room's events to this connection and drop the channel
/// if nobody else is listening.
fn detach(state: &SharedState, attachment: &StreamAttachment) {
    attachment.forward.abort();
    state.hub().prune(&attachment.room_code);
}

/// Pump events from a room's broadcast channel onto the connection's writer.
fn spawn_forwarder(
    mut receiver: broadcast::Receiver<RoomOutboundEvent>,
    tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if send_event(&tx, &event).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "room stream subscriber lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Serialize an event and push it onto the connection's writer channel.
///
/// Serialization failure is a permanent error (a bug, not a network issue),
/// so it is logged and swallowed; a closed writer means the connection is
/// gone and is reported to the caller.
fn send_event(
    tx: &mpsc::UnboundedSender<Message>,
    event: &RoomOutboundEvent,
) -> Result<(), StreamError> {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize room event");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| StreamError::ConnectionClosed)
}

/// Report an engine failure privately to the connection that caused it.
fn send_error(tx: &mpsc::UnboundedSender<Message>, err: &ServiceError) {
    let _ = send_event(
        tx,
        &RoomOutboundEvent::Error {
            message: err.to_string(),
        },
    );
}

/// Build the private catch-up snapshot sent right after a stream join. An
/// active room includes the quiz and the timing basis so late subscribers can
/// resume mid-game.
fn room_snapshot(room: &Room) -> RoomSnapshot {
    let running = room.quiz.generated;
    RoomSnapshot {
        room_code: room.code.clone(),
        status: room.status.into(),
        participants: participant_summaries(room),
        total_participants: room.participants.len(),
        questions: running.then(|| question_views(room)),
        seconds_per_question: running.then_some(room.settings.seconds_per_question),
        started_at: room.started_at.map(format_system_time),
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

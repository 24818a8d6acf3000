//! WebSocket room relay
//!
//! The relay protocol (`/ws/rooms/{room}`) keeps the members of a room in
//! touch:
//!
//! - on connect the server sends one binary frame, a sync update carrying the
//!   full reconstructed state of the room
//! - text frames carry JSON [`RoomEvent`]s and are relayed to every other
//!   member of the room
//! - binary frames (Yjs sync / awareness envelopes) are relayed unchanged;
//!   sync updates are appended to the room's stream first, so the next
//!   reconstruction includes them
//!
//! A new member subscribes to the room before its state is reconstructed.
//! Frames relayed in the meantime are delivered after the initial frame; any
//! overlap with the reconstructed state merges away.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use umlsync_sync::payload::{StreamPayload, encode_sync_update};

use crate::prelude::*;
use crate::room::RoomMessage;

/// Room level events exchanged as JSON text frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum RoomEvent {
	/// A document was added to the room
	CreateDocument { name: Box<str> },
	/// A document of the room was renamed
	RenameDocument { id: i64, name: Box<str> },
	/// Document content changed
	Change { id: i64 },
}

/// GET /ws/rooms/{room}
pub async fn get_ws_room(
	ws: WebSocketUpgrade,
	State(app): State<App>,
	Path(room): Path<String>,
) -> Response {
	let room = RoomId::from(room);
	ws.on_upgrade(move |socket| handle_room_connection(socket, room, app))
}

/// Room membership of a freshly joined connection
struct RoomJoin {
	tx: broadcast::Sender<RoomMessage>,
	rx: broadcast::Receiver<RoomMessage>,
	/// Full state as a sync update, to be sent first
	initial: Message,
}

/// Initial frame for a new member: the full state as a sync update
async fn initial_frame(app: &App, room: &RoomId) -> UsResult<Message> {
	let state = app.reconstructor.get_doc(room).await?.encode_state();
	Ok(Message::Binary(encode_sync_update(&state).into()))
}

/// Subscribe to `room`, then reconstruct its state.
async fn join_room(app: &App, room: &RoomId) -> UsResult<RoomJoin> {
	let (tx, rx) = app.rooms.join(room).await;
	match initial_frame(app, room).await {
		Ok(initial) => Ok(RoomJoin { tx, rx, initial }),
		Err(e) => {
			drop(rx);
			app.rooms.leave(room).await;
			Err(e)
		}
	}
}

/// Validate an incoming frame and turn it into a relayed one.
///
/// Returns `None` for frames that are not relayed.
fn relay_frame(conn_id: u64, msg: Message) -> Option<Message> {
	match msg {
		Message::Text(text) => match serde_json::from_str::<RoomEvent>(text.as_str()) {
			Ok(event) => {
				trace!("Room event from connection {}: {:?}", conn_id, event);
				Some(Message::Text(text))
			}
			Err(e) => {
				warn!("Dropping invalid room event from connection {}: {}", conn_id, e);
				None
			}
		},
		Message::Binary(data) if data.is_empty() => {
			warn!("Dropping empty binary frame from connection {}", conn_id);
			None
		}
		Message::Binary(data) => Some(Message::Binary(data)),
		Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
	}
}

/// Filter an incoming frame and persist it if it carries a document update.
///
/// Returns the frame to relay. A failed append is an error: the update must
/// not reach other members without being in the stream.
async fn publish_frame(
	app: &App,
	room: &RoomId,
	conn_id: u64,
	msg: Message,
) -> UsResult<Option<Message>> {
	let Some(msg) = relay_frame(conn_id, msg) else {
		return Ok(None);
	};
	let Message::Binary(data) = &msg else {
		return Ok(Some(msg));
	};

	match StreamPayload::decode(data) {
		Ok(payload @ StreamPayload::SyncUpdate(_)) => {
			if let Some(encoded) = payload.encode() {
				let doc = &app.opts.reconstructor.doc_name;
				let id = app.stream_writer.append(room, doc, &encoded).await?;
				trace!("Connection {} appended update {} to {}/{}", conn_id, id, room, doc);
			}
			Ok(Some(msg))
		}
		Ok(_) => Ok(Some(msg)),
		Err(e) => {
			warn!("Dropping undecodable frame from connection {}: {}", conn_id, e);
			Ok(None)
		}
	}
}

/// Handle a relay connection
pub async fn handle_room_connection(ws: WebSocket, room: RoomId, app: App) {
	let conn_id = app.next_conn_id();
	let (mut ws_tx, mut ws_rx) = ws.split();

	let RoomJoin { tx: room_tx, rx: mut room_rx, initial } = match join_room(&app, &room).await {
		Ok(join) => join,
		Err(e) => {
			warn!("Cannot reconstruct room {} for connection {}: {}", room, conn_id, e);
			let close = CloseFrame { code: close_code::ERROR, reason: "internal error".into() };
			let _ = ws_tx.send(Message::Close(Some(close))).await;
			return;
		}
	};
	info!(
		"Room connection {} joined {} ({} members)",
		conn_id,
		room,
		app.rooms.member_count(&room).await
	);

	if ws_tx.send(initial).await.is_err() {
		debug!("Connection {} closed before the initial state was sent", conn_id);
		drop(room_rx);
		app.rooms.leave(&room).await;
		return;
	}

	// WebSocket receive task - persists and relays incoming frames
	let recv_app = app.clone();
	let recv_room = room.clone();
	let mut recv_task = tokio::spawn(async move {
		while let Some(msg) = ws_rx.next().await {
			let msg = match msg {
				Ok(Message::Close(_)) => break,
				Ok(msg) => msg,
				Err(e) => {
					warn!("Room connection {} error: {}", conn_id, e);
					break;
				}
			};
			match publish_frame(&recv_app, &recv_room, conn_id, msg).await {
				Ok(Some(msg)) => {
					// Fails only when nobody else listens
					let _ = room_tx.send(RoomMessage { from: conn_id, msg });
				}
				Ok(None) => {}
				Err(e) => {
					// Closing makes the client reconnect and resync
					warn!("Cannot persist update of connection {}: {}", conn_id, e);
					break;
				}
			}
		}
	});

	// Forward other members' frames until either side goes away
	loop {
		tokio::select! {
			_ = &mut recv_task => {
				debug!("Receive task of connection {} ended", conn_id);
				break;
			}
			res = room_rx.recv() => match res {
				Ok(RoomMessage { from, msg }) => {
					if from == conn_id {
						continue;
					}
					if ws_tx.send(msg).await.is_err() {
						debug!("Connection {} disconnected while forwarding", conn_id);
						break;
					}
				}
				Err(broadcast::error::RecvError::Lagged(n)) => {
					warn!("Connection {} lagged behind by {} frames", conn_id, n);
				}
				Err(broadcast::error::RecvError::Closed) => break,
			}
		}
	}
	recv_task.abort();

	drop(room_rx);
	app.rooms.leave(&room).await;
	info!("Room connection {} left {}", conn_id, room);
}


// vim: ts=4

//! Room projection handlers

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::prelude::*;

/// GET /api/rooms/{room}/uml
pub async fn get_room_uml(
	State(app): State<App>,
	Path(room): Path<String>,
) -> UsResult<impl IntoResponse> {
	let room = RoomId::from(room);
	let text = app.reconstructor.get_text(&room).await?;
	debug!("Projected {} chars of {}", text.chars().count(), room);

	Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

/// GET /api/rooms/{room}/state
pub async fn get_room_state(
	State(app): State<App>,
	Path(room): Path<String>,
) -> UsResult<impl IntoResponse> {
	let room = RoomId::from(room);
	let state = app.reconstructor.get_doc(&room).await?.encode_state();

	Ok(([(header::CONTENT_TYPE, "application/octet-stream")], state))
}

// vim: ts=4

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::App;
use crate::{uml, websocket};

pub fn init(state: App) -> Router {
	Router::new()
		.route("/health", get(async || "ok\n"))
		.route("/api/rooms/{room}/uml", get(uml::get_room_uml))
		.route("/api/rooms/{room}/state", get(uml::get_room_state))
		.route("/ws/rooms/{room}", get(websocket::get_ws_room))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

// vim: ts=4

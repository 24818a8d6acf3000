//! Room membership for the relay
//!
//! Each active room owns one broadcast channel. Members subscribe on join;
//! the channel is dropped once the last member has left.

use axum::extract::ws::Message;
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};

use crate::prelude::*;

/// A frame relayed to the other members of a room
#[derive(Debug, Clone)]
pub struct RoomMessage {
	/// Connection the frame came from, never echoed back to it
	pub from: u64,
	pub msg: Message,
}

#[derive(Debug)]
pub struct RoomRegistry {
	rooms: RwLock<HashMap<RoomId, broadcast::Sender<RoomMessage>>>,
	capacity: usize,
}

impl RoomRegistry {
	pub fn new(capacity: usize) -> Self {
		Self { rooms: RwLock::new(HashMap::new()), capacity }
	}

	/// Join `room`, creating its channel if needed.
	pub async fn join(
		&self,
		room: &RoomId,
	) -> (broadcast::Sender<RoomMessage>, broadcast::Receiver<RoomMessage>) {
		// Subscribe under the write lock so a concurrent leave cannot drop the
		// channel between lookup and subscription
		let mut rooms = self.rooms.write().await;
		let tx = rooms
			.entry(room.clone())
			.or_insert_with(|| {
				debug!("Opening room {}", room);
				broadcast::channel(self.capacity).0
			})
			.clone();
		let rx = tx.subscribe();
		(tx, rx)
	}

	/// Drop the channel of `room` if nobody is subscribed anymore.
	///
	/// Call after the leaving member's receiver has been dropped.
	pub async fn leave(&self, room: &RoomId) {
		let mut rooms = self.rooms.write().await;
		if rooms.get(room).is_some_and(|tx| tx.receiver_count() == 0) {
			rooms.remove(room);
			debug!("Closing room {}", room);
		}
	}

	pub async fn member_count(&self, room: &RoomId) -> usize {
		self.rooms.read().await.get(room).map_or(0, broadcast::Sender::receiver_count)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_join_and_relay() {
		let rooms = RoomRegistry::new(16);
		let room: RoomId = "room1".into();

		let (tx, mut rx1) = rooms.join(&room).await;
		let (_, mut rx2) = rooms.join(&room).await;
		assert_eq!(rooms.member_count(&room).await, 2);

		tx.send(RoomMessage { from: 1, msg: Message::Text("hello".into()) }).expect("send");
		for rx in [&mut rx1, &mut rx2] {
			let got = rx.recv().await.expect("recv");
			assert_eq!(got.from, 1);
			assert!(matches!(got.msg, Message::Text(t) if t.as_str() == "hello"));
		}
	}

	#[tokio::test]
	async fn test_rooms_are_isolated() {
		let rooms = RoomRegistry::new(16);
		let (tx_a, _rx_a) = rooms.join(&"a".into()).await;
		let (_, mut rx_b) = rooms.join(&"b".into()).await;

		tx_a.send(RoomMessage { from: 1, msg: Message::Binary(vec![1, 2].into()) }).expect("send");
		assert!(matches!(rx_b.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
		assert_eq!(rooms.rooms.read().await.len(), 2);
	}

	#[tokio::test]
	async fn test_last_member_closes_room() {
		let rooms = RoomRegistry::new(16);
		let room: RoomId = "room1".into();

		let (_, rx1) = rooms.join(&room).await;
		let (_, rx2) = rooms.join(&room).await;

		drop(rx1);
		rooms.leave(&room).await;
		assert_eq!(rooms.rooms.read().await.len(), 1);

		drop(rx2);
		rooms.leave(&room).await;
		assert!(rooms.rooms.read().await.is_empty());
		assert_eq!(rooms.member_count(&room).await, 0);
	}
}

// vim: ts=4

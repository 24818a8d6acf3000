//! App state type

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use umlsync_sync::{Reconstructor, ReconstructorOpts};
use umlsync_types::stream_reader::{StreamReader, StreamWriter};
use umlsync_types::update_store::UpdateStore;

use crate::prelude::*;
use crate::{room, routes};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub reconstructor: Reconstructor,
	pub stream_writer: Arc<dyn StreamWriter>,
	pub rooms: room::RoomRegistry,
	pub opts: AppBuilderOpts,
	next_conn_id: AtomicU64,
}

impl AppState {
	/// Allocate the id of a new relay connection
	pub fn next_conn_id(&self) -> u64 {
		self.next_conn_id.fetch_add(1, Ordering::Relaxed) + 1
	}
}

pub type App = Arc<AppState>;

pub struct Adapters {
	pub update_store: Option<Arc<dyn UpdateStore>>,
	pub stream_reader: Option<Arc<dyn StreamReader>>,
	pub stream_writer: Option<Arc<dyn StreamWriter>>,
}

#[derive(Debug)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	pub reconstructor: ReconstructorOpts,
	/// Relay frames buffered per room before slow members start lagging
	pub room_capacity: usize,
}

pub struct AppBuilder {
	opts: AppBuilderOpts,
	adapters: Adapters,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			opts: AppBuilderOpts {
				listen: "127.0.0.1:3002".into(),
				reconstructor: ReconstructorOpts::default(),
				room_capacity: 256,
			},
			adapters: Adapters { update_store: None, stream_reader: None, stream_writer: None },
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn doc_name(&mut self, doc_name: impl Into<Box<str>>) -> &mut Self {
		self.opts.reconstructor.doc_name = doc_name.into();
		self
	}
	pub fn text_field(&mut self, text_field: impl Into<Box<str>>) -> &mut Self {
		self.opts.reconstructor.text_field = text_field.into();
		self
	}
	pub fn room_capacity(&mut self, room_capacity: usize) -> &mut Self {
		self.opts.room_capacity = room_capacity.max(1);
		self
	}

	// Adapters
	pub fn update_store(&mut self, update_store: Arc<dyn UpdateStore>) -> &mut Self {
		self.adapters.update_store = Some(update_store);
		self
	}
	pub fn stream_reader(&mut self, stream_reader: Arc<dyn StreamReader>) -> &mut Self {
		self.adapters.stream_reader = Some(stream_reader);
		self
	}
	pub fn stream_writer(&mut self, stream_writer: Arc<dyn StreamWriter>) -> &mut Self {
		self.adapters.stream_writer = Some(stream_writer);
		self
	}

	/// Assemble the shared state. All adapters are required.
	pub fn build(self) -> UsResult<App> {
		let update_store = self
			.adapters
			.update_store
			.ok_or_else(|| Error::Config("no update store configured".into()))?;
		let stream_reader = self
			.adapters
			.stream_reader
			.ok_or_else(|| Error::Config("no stream reader configured".into()))?;
		let stream_writer = self
			.adapters
			.stream_writer
			.ok_or_else(|| Error::Config("no stream writer configured".into()))?;

		Ok(Arc::new(AppState {
			reconstructor: Reconstructor::new(
				update_store,
				stream_reader,
				self.opts.reconstructor.clone(),
			),
			stream_writer,
			rooms: room::RoomRegistry::new(self.opts.room_capacity),
			opts: self.opts,
			next_conn_id: AtomicU64::new(0),
		}))
	}

	/// Serve the app. Call [`init_tracing`] first to see its logs.
	pub async fn run(self) -> UsResult<()> {
		info!("umlsync V{}", VERSION);

		let app = self.build()?;
		let router = routes::init(app.clone());

		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
		info!("Listening on {}", app.opts.listen);
		axum::serve(listener, router).await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Install the global log subscriber, filtered by `RUST_LOG`.
///
/// Fails if a subscriber is already installed.
pub fn init_tracing() -> UsResult<()> {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.try_init()
		.map_err(|e| Error::Internal(format!("cannot install log subscriber: {}", e)))
}


// vim: ts=4

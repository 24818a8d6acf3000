//! Server configuration from environment variables

use std::path::PathBuf;

use crate::prelude::*;

/// Durable update store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
	Postgres,
	Redb,
}

impl std::str::FromStr for StoreKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"postgres" | "postgresql" => Ok(StoreKind::Postgres),
			"redb" => Ok(StoreKind::Redb),
			other => Err(Error::Config(format!("unknown STORE {:?}", other))),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Config {
	pub listen: Box<str>,
	pub store: StoreKind,
	pub database_url: Box<str>,
	pub db_max_connections: u32,
	pub db_dir: PathBuf,
	pub redis_url: Box<str>,
	pub redis_prefix: Box<str>,
	pub text_field: Box<str>,
}

impl Config {
	pub fn from_env() -> UsResult<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Build the configuration from an arbitrary variable lookup.
	///
	/// Unset and empty variables fall back to their defaults.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> UsResult<Self> {
		let var = |name: &str, default: &str| -> Box<str> {
			lookup(name).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string()).into()
		};

		let db_max_connections = match var("DB_MAX_CONNECTIONS", "5").parse::<u32>() {
			Ok(n) if n > 0 => n,
			_ => {
				return Err(Error::Config(
					"DB_MAX_CONNECTIONS must be a positive integer".into(),
				));
			}
		};

		Ok(Self {
			listen: var("LISTEN", "127.0.0.1:3002"),
			store: var("STORE", "postgres").parse()?,
			database_url: var("DATABASE_URL", "postgres://localhost/umlsync"),
			db_max_connections,
			db_dir: PathBuf::from(&*var("DB_DIR", "./data")),
			redis_url: var("REDIS_URL", "redis://127.0.0.1:6379"),
			redis_prefix: var("REDIS_PREFIX", "y"),
			text_field: var("TEXT_FIELD", umlsync_sync::projection::DEFAULT_TEXT_FIELD),
		})
	}
}


// vim: ts=4

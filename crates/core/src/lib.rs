//! Lumly Core - Usage-limit cooldown queue.
//!
//! This crate implements the quota/cooldown business logic behind the Lumly
//! AI generation feature:
//!
//! - [`UsageCounter`] - per-customer consumption counts
//! - [`MarkerStore`] - timestamped "limit reached" markers
//! - [`UsageLimiter`] - the consumption event (increment + threshold check)
//! - [`CooldownSweeper`] - resets customers whose cooldown has elapsed
//! - [`QueueInspector`] - read-only diagnostic view over the cooldown queue
//!
//! # Architecture
//!
//! All state lives behind the [`store::KvStore`] capability - the components
//! themselves hold no mutable state and are safe to invoke concurrently.
//! Production injects a Redis-backed store; tests inject
//! [`store::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod inspector;
pub mod limiter;
pub mod marker;
pub mod markers;
pub mod store;
pub mod sweeper;
pub mod types;
pub mod usage;

pub use config::LimitConfig;
pub use inspector::{QueueEntry, QueueInspector, QueueReport};
pub use limiter::{Consumption, UsageLimiter};
pub use marker::{LimitError, LimitMarker};
pub use markers::MarkerStore;
pub use store::{KvStore, MemoryStore, StoreError};
pub use sweeper::{CooldownSweeper, SweepSummary};
pub use types::CustomerId;
pub use usage::UsageCounter;

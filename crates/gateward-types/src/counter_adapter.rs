//! Adapter contract for the shared counter store backing admission control.
//!
//! The counter store is the only place quota state lives. Service processes
//! hold no counters of their own, so every replica that talks to the same
//! store agrees on the same windows.

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

use crate::prelude::*;

/// Composes the store key for one client in one tier.
pub fn quota_key(tier: &str, client: &ClientKey) -> Box<str> {
	format!("quota:{}:{}", tier, client).into()
}

/// Outcome of a single atomic consume call against one quota window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterOutcome {
	/// A point was taken; `remaining` is what is left in the window
	Admitted { remaining: u32, reset_in: Duration },
	/// The window is empty; `retry_after` is the time until it resets
	Exhausted { retry_after: Duration },
}

/// A Gateward counter adapter.
///
/// Implementations serialize concurrent `consume` calls per key. The whole
/// decrement-or-init decision happens inside the one call; there is no
/// read-then-write seam for concurrent callers to race through.
#[async_trait]
pub trait CounterAdapter: Debug + Send + Sync {
	/// Atomically takes one point from the window behind `key`.
	///
	/// A missing or expired window is initialized to `max_points` before
	/// the point is taken.
	async fn consume(
		&self,
		key: &str,
		max_points: u32,
		window: Duration,
	) -> GwResult<CounterOutcome>;
}


// vim: ts=4

//! In-memory counter adapter
//!
//! Single-process counter store for standalone deployments and tests. The
//! whole decrement-or-init decision runs under one mutex, so concurrent
//! consume calls serialize exactly as they would against a shared store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use gateward::counter_adapter::{CounterAdapter, CounterOutcome};
use gateward::prelude::*;

#[derive(Debug)]
struct Window {
	remaining: u32,
	reset_at: Instant,
}

#[derive(Debug, Default)]
pub struct CounterAdapterMemory {
	windows: Mutex<HashMap<Box<str>, Window>>,
}

impl CounterAdapterMemory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Drops windows that have already reset
	pub fn prune(&self) {
		let now = Instant::now();
		self.windows.lock().retain(|_, window| window.reset_at > now);
	}

	pub fn len(&self) -> usize {
		self.windows.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.windows.lock().is_empty()
	}
}

#[async_trait]
impl CounterAdapter for CounterAdapterMemory {
	async fn consume(
		&self,
		key: &str,
		max_points: u32,
		window: Duration,
	) -> GwResult<CounterOutcome> {
		let now = Instant::now();
		let mut windows = self.windows.lock();
		let entry = windows
			.entry(key.into())
			.and_modify(|entry| {
				// An elapsed window starts over at full budget
				if entry.reset_at <= now {
					entry.remaining = max_points;
					entry.reset_at = now + window;
				}
			})
			.or_insert_with(|| Window { remaining: max_points, reset_at: now + window });

		if entry.remaining == 0 {
			Ok(CounterOutcome::Exhausted {
				retry_after: entry.reset_at.saturating_duration_since(now),
			})
		} else {
			entry.remaining -= 1;
			Ok(CounterOutcome::Admitted {
				remaining: entry.remaining,
				reset_in: entry.reset_at.saturating_duration_since(now),
			})
		}
	}
}


// vim: ts=4

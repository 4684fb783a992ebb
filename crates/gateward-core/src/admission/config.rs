//! Admission tier configuration
//!
//! Each tier is an independent windowed budget. The global tier applies to
//! every request; route tiers apply on top for sensitive route classes.

use std::time::Duration;

/// What to do with a request when the counter store cannot answer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPolicy {
	/// Admit the request without charging it
	Open,
	/// Reject the request
	Closed,
}

/// Budget and window for a single tier
#[derive(Clone, Debug)]
pub struct TierConfig {
	pub name: Box<str>,
	pub window: Duration,
	pub max_points: u32,
	pub fail_policy: FailPolicy,
}

impl TierConfig {
	pub fn new(
		name: impl Into<Box<str>>,
		window: Duration,
		max_points: u32,
		fail_policy: FailPolicy,
	) -> Self {
		Self { name: name.into(), window, max_points, fail_policy }
	}
}

/// The full tier table: one global tier plus named route tiers
#[derive(Clone, Debug)]
pub struct AdmissionConfig {
	pub global: TierConfig,
	pub tiers: Vec<TierConfig>,
}

impl AdmissionConfig {
	/// Looks up a tier by name. The global tier resolves too, for route
	/// classes with no sensitive tier of their own
	pub fn tier(&self, name: &str) -> Option<&TierConfig> {
		if &*self.global.name == name {
			return Some(&self.global);
		}
		self.tiers.iter().find(|tier| &*tier.name == name)
	}
}

impl Default for AdmissionConfig {
	fn default() -> Self {
		Self {
			global: TierConfig::new("global", Duration::from_secs(900), 100, FailPolicy::Open),
			tiers: vec![
				// Auth: strict limits to prevent credential stuffing
				TierConfig::new("auth", Duration::from_secs(900), 50, FailPolicy::Closed),
				// Media: uploads are heavier than reads
				TierConfig::new("media-upload", Duration::from_secs(60), 50, FailPolicy::Open),
				TierConfig::new("media-read", Duration::from_secs(60), 20, FailPolicy::Open),
			],
		}
	}
}


// vim: ts=4

//! Admission controller
//!
//! Charges each request against the global tier and its route tier, in that
//! order, through single atomic consume calls against the shared counter
//! store. The controller holds no counter state; replicas sharing a store
//! share windows.

use std::sync::Arc;
use std::time::Duration;

use gateward_types::counter_adapter::{quota_key, CounterAdapter, CounterOutcome};

use super::config::{AdmissionConfig, FailPolicy, TierConfig};
use crate::prelude::*;
use crate::settings::GatewaySettings;

/// The outcome of one admission check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmitDecision {
	pub allowed: bool,
	/// The tier that decided: the exhausted one on denial, the route tier on
	/// admission
	pub tier: Box<str>,
	pub retry_after: Option<Duration>,
}

#[derive(Debug)]
pub struct AdmissionController {
	store: Arc<dyn CounterAdapter>,
	config: AdmissionConfig,
	store_timeout: Duration,
}

impl AdmissionController {
	pub fn new(store: Arc<dyn CounterAdapter>, settings: &GatewaySettings) -> Self {
		Self {
			store,
			config: settings.admission.clone(),
			store_timeout: settings.store_timeout,
		}
	}

	/// Checks one request against the global tier, then `tier_name`.
	/// The first exhausted tier denies; points already taken are not refunded.
	pub async fn admit(&self, client: &ClientKey, tier_name: &str) -> GwResult<AdmitDecision> {
		let route_tier = self.config.tier(tier_name).ok_or_else(|| {
			Error::ConfigError(format!("unknown admission tier: {}", tier_name).into())
		})?;

		// Route classes without a sensitive tier of their own resolve to the
		// global tier; charge it once, not twice
		let mut sequence = vec![&self.config.global];
		if route_tier.name != self.config.global.name {
			sequence.push(route_tier);
		}

		for tier in sequence {
			match self.consume_tier(client, tier).await {
				Ok(CounterOutcome::Admitted { remaining, .. }) => {
					debug!("admit {} on tier {}, {} points left", client, tier.name, remaining);
				}
				Ok(CounterOutcome::Exhausted { retry_after }) => {
					warn!("IP {} exceeded {} rate limit", client, tier.name);
					return Ok(AdmitDecision {
						allowed: false,
						tier: tier.name.clone(),
						retry_after: Some(retry_after),
					});
				}
				Err(_) => match tier.fail_policy {
					FailPolicy::Open => {
						warn!("counter store unavailable, admitting {} on tier {}", client, tier.name);
					}
					FailPolicy::Closed => {
						error!("counter store unavailable, rejecting {} on tier {}", client, tier.name);
						return Err(Error::StoreUnavailable);
					}
				},
			}
		}

		Ok(AdmitDecision { allowed: true, tier: route_tier.name.clone(), retry_after: None })
	}

	async fn consume_tier(&self, client: &ClientKey, tier: &TierConfig) -> GwResult<CounterOutcome> {
		let key = quota_key(&tier.name, client);
		let consume = self.store.consume(&key, tier.max_points, tier.window);
		match tokio::time::timeout(self.store_timeout, consume).await {
			Ok(Ok(outcome)) => Ok(outcome),
			Ok(Err(err)) => {
				warn!("counter store error on tier {}: {}", tier.name, err);
				Err(Error::StoreUnavailable)
			}
			Err(_) => {
				warn!("counter store timed out after {:?} on tier {}", self.store_timeout, tier.name);
				Err(Error::StoreUnavailable)
			}
		}
	}
}


// vim: ts=4

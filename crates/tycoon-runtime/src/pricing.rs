//! Periodic bounded random walk over the whole catalog.

use chrono::{DateTime, Utc};
use tycoon_core::{Catalog, MarketEvent, PriceHistoryEntry};
use tycoon_econ::{evolve_price, price_seed, variation_percent, RandomSource};

use crate::schedule::IntervalGate;

/// Outcome of one price tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTick {
    pub seed: u64,
    /// Per item, in catalog order.
    pub changes: Vec<(String, PriceHistoryEntry)>,
    /// Name of the event applied during this tick, if any.
    pub consumed_event: Option<String>,
}

/// Step every item once with the noise drawn for `seed`.
///
/// The pending event is applied to the first item whose subtype it targets
/// and is cleared right away, so at most one item per event feels the shock.
pub fn evolve_catalog(
    catalog: &mut Catalog,
    pending_event: &mut Option<MarketEvent>,
    rng: &mut dyn RandomSource,
    seed: u64,
) -> PriceTick {
    let mut tick = PriceTick {
        seed,
        ..PriceTick::default()
    };
    for item in catalog.items_mut() {
        let noise = rng.price_noise(seed);
        let hit = pending_event
            .as_ref()
            .is_some_and(|event| event.affects(&item.subtype));
        let impact = if hit {
            pending_event.take().map(|event| {
                tick.consumed_event = Some(event.name);
                event.impact
            })
        } else {
            None
        };
        let percent = variation_percent(noise, impact);
        let next = evolve_price(item.price, item.lower_limit, item.upper_limit, percent);
        let entry = item.set_price(next);
        tick.changes.push((item.name.clone(), entry));
    }
    tick
}

/// Runs [`evolve_catalog`] whenever the price interval elapses.
#[derive(Clone, Debug)]
pub struct PricingEngine {
    gate: IntervalGate,
}

impl PricingEngine {
    pub fn new(interval_secs: u64, start: DateTime<Utc>) -> Self {
        Self {
            gate: IntervalGate::new(interval_secs, start),
        }
    }

    pub fn advance(
        &mut self,
        now: DateTime<Utc>,
        catalog: &mut Catalog,
        pending_event: &mut Option<MarketEvent>,
        rng: &mut dyn RandomSource,
    ) -> Option<PriceTick> {
        if !self.gate.try_fire(now) {
            return None;
        }
        Some(evolve_catalog(catalog, pending_event, rng, price_seed(now)))
    }
}

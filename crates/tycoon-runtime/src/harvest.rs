use chrono::{DateTime, Utc};
use persistence::Store;
use tracing::{debug, info};
use tycoon_core::{EconomyError, EntityKind};

use crate::ledger::ContainerId;
use crate::schedule::interval_elapsed;
use crate::Economy;

pub const INVENTORY_FULL: &str = "You can't carry more item on you !";

/// An ongoing harvest at one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Harvest {
    pub source: String,
    pub last_yield: DateTime<Utc>,
}

impl<S: Store> Economy<S> {
    /// Start harvesting at `source`; the first unit arrives one cooldown later.
    pub fn start_harvest(&mut self, source: &str, now: DateTime<Utc>) -> Result<(), EconomyError> {
        if !self.harvest_sources.iter().any(|h| h.name == source) {
            return Err(EconomyError::not_found(EntityKind::HarvestSource, source));
        }
        info!(source, "harvest started");
        self.harvest = Some(Harvest {
            source: source.to_string(),
            last_yield: now,
        });
        Ok(())
    }

    /// Stop the current harvest. Returns whether one was running.
    pub fn stop_harvest(&mut self) -> bool {
        self.harvest.take().is_some()
    }

    pub fn harvesting(&self) -> Option<&Harvest> {
        self.harvest.as_ref()
    }

    /// Yield one unit into the player inventory once the cooldown elapses.
    /// A full inventory stops the harvest.
    pub(crate) fn advance_harvest(&mut self, now: DateTime<Utc>) -> Option<String> {
        let cooldown = self.config.harvest_cooldown_secs;
        let harvest = self.harvest.as_mut()?;
        if !interval_elapsed(harvest.last_yield, now, cooldown) {
            return None;
        }
        harvest.last_yield = now;
        let source = harvest.source.clone();
        let item = self
            .harvest_sources
            .iter()
            .find(|h| h.name == source)?
            .item
            .clone();
        match self.move_goods(None, Some(&ContainerId::Player), &item, 1) {
            Ok(()) => {
                debug!(source = %source, item = %item, "harvested");
                self.notify(format!("+1 {item}"));
                self.persist_player();
                Some(item)
            }
            Err(e) => {
                debug!(source = %source, error = %e, "harvest stopped");
                self.harvest = None;
                if matches!(e, EconomyError::CapacityExceeded { .. }) {
                    self.notify(INVENTORY_FULL);
                }
                None
            }
        }
    }
}

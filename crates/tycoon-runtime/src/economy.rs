//! The root aggregate owning every table, timer and the notification outbox.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use persistence::{Store, StoreError};
use tracing::{debug, info, warn};
use tycoon_core::{
    validate_tables, Business, Catalog, CraftingLocation, DealershipEntry, EconomyConfig,
    EconomyError, EntityKind, HarvestSource, Item, MarketEvent, PlayerLedger, Recipe, Tables,
};
use tycoon_econ::{format_event_notice, ChaChaSource, RandomSource};

use crate::business::{self, Sale};
use crate::events::EventGenerator;
use crate::harvest::Harvest;
use crate::pricing::{PriceTick, PricingEngine};
use crate::schedule::interval_elapsed;

pub const PRICES_EVOLVED: &str = "Every price has evolved!";

/// What fired during one [`Economy::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Item yielded by the active harvest.
    pub harvested: Option<String>,
    pub prices: Option<PriceTick>,
    /// Name of the newly drawn market event.
    pub event: Option<String>,
    /// Sales per business name.
    pub sales: Vec<(String, Sale)>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.harvested.is_none()
            && self.prices.is_none()
            && self.event.is_none()
            && self.sales.is_empty()
    }
}

/// Market and ledger state for one player.
pub struct Economy<S: Store> {
    pub(crate) store: S,
    pub(crate) config: EconomyConfig,
    pub(crate) catalog: Catalog,
    pub(crate) businesses: Vec<Business>,
    pub(crate) player: PlayerLedger,
    pub(crate) recipes: Vec<Recipe>,
    pub(crate) crafting_locations: Vec<CraftingLocation>,
    pub(crate) harvest_sources: Vec<HarvestSource>,
    pub(crate) dealership: Vec<DealershipEntry>,
    pub(crate) pricing: PricingEngine,
    pub(crate) events: EventGenerator,
    pub(crate) revenue_timers: BTreeMap<String, DateTime<Utc>>,
    pub(crate) harvest: Option<Harvest>,
    pub(crate) rng: Box<dyn RandomSource>,
    notifications: Vec<String>,
}

fn configuration(e: StoreError) -> EconomyError {
    EconomyError::Configuration(e.to_string())
}

impl<S: Store> Economy<S> {
    /// Load with the ChaCha source seeded from `config.rng_seed` (entropy when absent).
    pub fn open(store: S, config: EconomyConfig, now: DateTime<Utc>) -> Result<Self, EconomyError> {
        let rng: Box<dyn RandomSource> = match config.rng_seed {
            Some(seed) => Box::new(ChaChaSource::seeded(seed)),
            None => Box::new(ChaChaSource::from_entropy()),
        };
        Self::load(store, config, now, rng)
    }

    /// Load every table from `store` and start all timers at `now`.
    ///
    /// Malformed static tables, unknown item references and an empty event
    /// table abort the load. Unusable catalog rows are skipped and reported
    /// through the outbox.
    pub fn load(
        store: S,
        config: EconomyConfig,
        now: DateTime<Utc>,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, EconomyError> {
        let tables = store.load_static().map_err(configuration)?;
        let catalog_load = store.load_catalog().map_err(configuration)?;
        let businesses = store.load_businesses().map_err(configuration)?;
        let stored_player = store.load_player().map_err(configuration)?;

        let types: BTreeSet<&str> = businesses.iter().map(|b| b.business_type.as_str()).collect();
        let mut player = match stored_player {
            Some(player) => player,
            None => {
                info!(money = %config.starting_money, "no player ledger, creating a fresh one");
                PlayerLedger::new(config.starting_money, config.player_capacity, types.iter().copied())
            }
        };
        player.inventory.set_capacity(config.player_capacity);
        for t in &types {
            player.business_upgrades.entry(t.to_string()).or_insert(0);
        }

        let catalog = Catalog::new(catalog_load.items);
        validate_tables(&Tables {
            catalog: &catalog,
            businesses: &businesses,
            recipes: &tables.recipes,
            crafting_locations: &tables.crafting_locations,
            harvest_sources: &tables.harvest_sources,
            player: &player,
        })?;
        let events = EventGenerator::new(tables.events, config.event_interval_secs, now)?;

        let revenue_timers = businesses
            .iter()
            .filter(|b| b.purchased)
            .map(|b| (b.name.clone(), now))
            .collect();
        let mut economy = Self {
            store,
            pricing: PricingEngine::new(config.price_interval_secs, now),
            config,
            catalog,
            businesses,
            player,
            recipes: tables.recipes,
            crafting_locations: tables.crafting_locations,
            harvest_sources: tables.harvest_sources,
            dealership: tables.dealership,
            events,
            revenue_timers,
            harvest: None,
            rng,
            notifications: Vec::new(),
        };
        for reason in catalog_load.skipped {
            economy.notify(format!("Skipped catalog entry: {reason}"));
        }
        economy.resync_weights()?;
        info!(
            items = economy.catalog.len(),
            businesses = economy.businesses.len(),
            events = economy.events.table().len(),
            money = %economy.player.money,
            "economy loaded"
        );
        Ok(economy)
    }

    /// Recompute every cached container weight from its records.
    fn resync_weights(&mut self) -> Result<(), EconomyError> {
        let catalog = &self.catalog;
        let check = |owner: &str, inv: &mut tycoon_core::Inventory| -> Result<(), EconomyError> {
            let before = inv.resync_weight(catalog).map_err(|e| {
                EconomyError::Configuration(format!("{owner} inventory weight: {e}"))
            })?;
            if before != inv.weight() {
                warn!(owner, stored = %before, measured = %inv.weight(), "container weight resynced");
            }
            Ok(())
        };
        check("player", &mut self.player.inventory)?;
        for v in &mut self.player.stored_vehicles {
            check(&v.model_name, &mut v.inventory)?;
        }
        for b in &mut self.businesses {
            check(&b.name, &mut b.inventory)?;
        }
        Ok(())
    }

    /// Advance every timer to `now`: harvest, prices, events, then revenue.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport {
            harvested: self.advance_harvest(now),
            ..TickReport::default()
        };

        if let Some(prices) = self.pricing.advance(
            now,
            &mut self.catalog,
            self.events.pending_mut(),
            self.rng.as_mut(),
        ) {
            info!(
                seed = prices.seed,
                items = prices.changes.len(),
                event = ?prices.consumed_event,
                "prices evolved"
            );
            self.persist_catalog();
            self.notify(PRICES_EVOLVED);
            report.prices = Some(prices);
        }

        let drawn = self
            .events
            .advance(now, self.rng.as_mut())
            .map(|event| (event.name.clone(), format_event_notice(event)));
        if let Some((name, notice)) = drawn {
            info!(event = %name, "market event drawn");
            self.notify(notice);
            report.event = Some(name);
        }

        report.sales = self.generate_revenue(now);
        if !report.sales.is_empty() {
            self.persist_businesses();
        }
        report
    }

    fn generate_revenue(&mut self, now: DateTime<Utc>) -> Vec<(String, Sale)> {
        let mut sales = Vec::new();
        for b in self.businesses.iter_mut().filter(|b| b.purchased) {
            let last = *self.revenue_timers.entry(b.name.clone()).or_insert(now);
            if !interval_elapsed(last, now, u64::from(b.interval_secs)) {
                continue;
            }
            self.revenue_timers.insert(b.name.clone(), now);
            if let Some(sale) = business::generate_revenue(b, &self.catalog, self.rng.as_mut()) {
                debug!(business = %b.name, item = %sale.item, quantity = sale.quantity, revenue = %sale.revenue, "sale");
                sales.push((b.name.clone(), sale));
            }
        }
        sales
    }

    pub(crate) fn notify(&mut self, message: impl Into<String>) {
        self.notifications.push(message.into());
    }

    /// Drain the user notices queued since the last call.
    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }

    fn storage_failure(&mut self, table: &str, err: StoreError) {
        let err = EconomyError::Persistence(format!("{table} could not be saved ({err})"));
        warn!(table, error = %err, "keeping in-memory state");
        self.notify(format!("Warning: {err}"));
    }

    pub(crate) fn persist_catalog(&mut self) {
        if let Err(e) = self.store.save_catalog(self.catalog.items()) {
            self.storage_failure("catalog", e);
        }
    }

    pub(crate) fn persist_player(&mut self) {
        if let Err(e) = self.store.save_player(&self.player) {
            self.storage_failure("player ledger", e);
        }
    }

    pub(crate) fn persist_businesses(&mut self) {
        if let Err(e) = self.store.save_businesses(&self.businesses) {
            self.storage_failure("business table", e);
        }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn item(&self, name: &str) -> Result<&Item, EconomyError> {
        self.catalog.require(name)
    }

    pub fn player(&self) -> &PlayerLedger {
        &self.player
    }

    pub fn businesses(&self) -> &[Business] {
        &self.businesses
    }

    pub fn business(&self, name: &str) -> Result<&Business, EconomyError> {
        self.businesses
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Business, name))
    }

    pub(crate) fn business_index(&self, name: &str) -> Result<usize, EconomyError> {
        self.businesses
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Business, name))
    }

    pub fn current_event(&self) -> Option<&MarketEvent> {
        self.events.current()
    }

    pub fn market_events(&self) -> &[MarketEvent] {
        self.events.table()
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn crafting_locations(&self) -> &[CraftingLocation] {
        &self.crafting_locations
    }

    pub fn harvest_sources(&self) -> &[HarvestSource] {
        &self.harvest_sources
    }

    pub fn dealership(&self) -> &[DealershipEntry] {
        &self.dealership
    }
}

#![deny(warnings)]

//! Persistence layer: file-backed tables for the catalog, businesses, the
//! player ledger and the static world data.

pub mod codec;
mod file;

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;
use tycoon_core::{
    validate_item, Business, CraftingLocation, DealershipEntry, HarvestSource, Item, MarketEvent,
    PlayerLedger, Recipe,
};

pub use codec::CatalogLoad;
pub use file::{
    FileStore, BUSINESS_FILE, CATALOG_FILE, DEALERSHIP_FILE, EVENTS_FILE, LOCATIONS_FILE,
    PLAYER_FILE, RECIPES_FILE, SELLERS_FILE,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid json in {file}: {source}")]
    Json {
        file: String,
        source: serde_json::Error,
    },
    #[error("{file}:{line}: {reason}")]
    Malformed {
        file: String,
        line: usize,
        reason: String,
    },
    #[error("required table {0} is missing")]
    Missing(String),
    #[error("cannot encode {0}: contains a field delimiter")]
    Delimiter(String),
    #[error("store rejected the write")]
    WriteRejected,
}

/// Tables loaded once at startup and never written back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticTables {
    pub events: Vec<MarketEvent>,
    pub recipes: Vec<Recipe>,
    pub crafting_locations: Vec<CraftingLocation>,
    pub harvest_sources: Vec<HarvestSource>,
    pub dealership: Vec<DealershipEntry>,
}

/// Durable storage behind the economy.
///
/// Loads happen once at startup; each save replaces the whole table.
pub trait Store {
    fn load_catalog(&self) -> Result<CatalogLoad, StoreError>;
    fn save_catalog(&mut self, items: &[Item]) -> Result<(), StoreError>;
    fn load_businesses(&self) -> Result<Vec<Business>, StoreError>;
    fn save_businesses(&mut self, businesses: &[Business]) -> Result<(), StoreError>;
    /// `None` when no ledger has been saved yet.
    fn load_player(&self) -> Result<Option<PlayerLedger>, StoreError>;
    fn save_player(&mut self, player: &PlayerLedger) -> Result<(), StoreError>;
    fn load_static(&self) -> Result<StaticTables, StoreError>;
}

/// In-memory store for tests and embedding hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    pub items: Vec<Item>,
    pub businesses: Vec<Business>,
    pub player: Option<PlayerLedger>,
    pub tables: StaticTables,
    /// Reject every save with [`StoreError::WriteRejected`].
    pub fail_writes: bool,
    /// Successful saves so far.
    pub writes: usize,
}

impl MemoryStore {
    fn accept_write(&mut self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteRejected);
        }
        self.writes += 1;
        Ok(())
    }
}

impl Store for MemoryStore {
    fn load_catalog(&self) -> Result<CatalogLoad, StoreError> {
        let mut load = CatalogLoad::default();
        for item in &self.items {
            match validate_item(item) {
                Ok(()) => load.items.push(item.clone()),
                Err(e) => {
                    warn!(item = %item.name, error = %e, "skipping catalog row");
                    load.skipped.push(e.to_string());
                }
            }
        }
        Ok(load)
    }

    fn save_catalog(&mut self, items: &[Item]) -> Result<(), StoreError> {
        self.accept_write()?;
        self.items = items.to_vec();
        Ok(())
    }

    fn load_businesses(&self) -> Result<Vec<Business>, StoreError> {
        Ok(self.businesses.clone())
    }

    fn save_businesses(&mut self, businesses: &[Business]) -> Result<(), StoreError> {
        self.accept_write()?;
        self.businesses = businesses.to_vec();
        Ok(())
    }

    fn load_player(&self) -> Result<Option<PlayerLedger>, StoreError> {
        Ok(self.player.clone())
    }

    fn save_player(&mut self, player: &PlayerLedger) -> Result<(), StoreError> {
        self.accept_write()?;
        self.player = Some(player.clone());
        Ok(())
    }

    fn load_static(&self) -> Result<StaticTables, StoreError> {
        Ok(self.tables.clone())
    }
}

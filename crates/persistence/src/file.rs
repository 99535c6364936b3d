use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use tycoon_core::{Business, Item, PlayerLedger};

use crate::codec::{self, CatalogLoad};
use crate::{StaticTables, Store, StoreError};

pub const CATALOG_FILE: &str = "items.json";
pub const BUSINESS_FILE: &str = "businessdata.csv";
pub const PLAYER_FILE: &str = "playerData.json";
pub const EVENTS_FILE: &str = "marketevents.csv";
pub const RECIPES_FILE: &str = "crafting_recipes.csv";
pub const LOCATIONS_FILE: &str = "crafting_locations.csv";
pub const SELLERS_FILE: &str = "marketsellers.csv";
pub const DEALERSHIP_FILE: &str = "vehicles.json";

/// Tables stored as files under one data directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn read_optional(&self, file: &str) -> Result<Option<String>, StoreError> {
        let path = self.path(file);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn read_required(&self, file: &str) -> Result<String, StoreError> {
        self.read_optional(file)?
            .ok_or_else(|| StoreError::Missing(file.to_string()))
    }

    /// Replace `file` atomically: write a sibling temp file, then rename it over.
    fn write_atomic(&self, file: &str, contents: &str) -> Result<(), StoreError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        let target = self.path(file);
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err(&self.root))?;
        tmp.write_all(contents.as_bytes())
            .map_err(io_err(tmp.path()))?;
        tmp.as_file().sync_all().map_err(io_err(&target))?;
        tmp.persist(&target).map_err(|e| StoreError::Io {
            path: target.clone(),
            source: e.error,
        })?;
        debug!(file, bytes = contents.len(), "table written");
        Ok(())
    }
}

impl Store for FileStore {
    fn load_catalog(&self) -> Result<CatalogLoad, StoreError> {
        match self.read_optional(CATALOG_FILE)? {
            Some(text) => codec::decode_catalog(&text),
            None => {
                warn!(path = %self.path(CATALOG_FILE).display(), "catalog missing, starting empty");
                Ok(CatalogLoad::default())
            }
        }
    }

    fn save_catalog(&mut self, items: &[Item]) -> Result<(), StoreError> {
        let text = codec::encode_catalog(items)?;
        self.write_atomic(CATALOG_FILE, &text)
    }

    fn load_businesses(&self) -> Result<Vec<Business>, StoreError> {
        codec::decode_business_table(&self.read_required(BUSINESS_FILE)?)
    }

    fn save_businesses(&mut self, businesses: &[Business]) -> Result<(), StoreError> {
        let text = codec::encode_business_table(businesses)?;
        self.write_atomic(BUSINESS_FILE, &text)
    }

    fn load_player(&self) -> Result<Option<PlayerLedger>, StoreError> {
        self.read_optional(PLAYER_FILE)?
            .map(|text| {
                serde_json::from_str(&text).map_err(|source| StoreError::Json {
                    file: PLAYER_FILE.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn save_player(&mut self, player: &PlayerLedger) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(player).map_err(|source| StoreError::Json {
            file: PLAYER_FILE.to_string(),
            source,
        })?;
        self.write_atomic(PLAYER_FILE, &text)
    }

    fn load_static(&self) -> Result<StaticTables, StoreError> {
        let dealership = match self.read_optional(DEALERSHIP_FILE)? {
            Some(text) => codec::decode_dealership(&text)?,
            None => Vec::new(),
        };
        Ok(StaticTables {
            events: codec::decode_events(&self.read_required(EVENTS_FILE)?)?,
            recipes: codec::decode_recipes(&self.read_required(RECIPES_FILE)?)?,
            crafting_locations: codec::decode_crafting_locations(
                &self.read_required(LOCATIONS_FILE)?,
            )?,
            harvest_sources: codec::decode_harvest_sources(&self.read_required(SELLERS_FILE)?)?,
            dealership,
        })
    }
}

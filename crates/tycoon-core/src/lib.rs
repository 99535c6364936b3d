#![deny(warnings)]

//! Core domain models and invariants for the tycoon market & ledger engine.
//!
//! This crate defines the serializable types shared by the pricing, business,
//! inventory and persistence layers, together with validation helpers that
//! guard the invariants static tables must satisfy at load time.

mod error;
pub mod inventory;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use error::{EconomyError, EntityKind, ValidationError};
pub use inventory::{transfer, Inventory, InventoryRecord};

/// Integral monetary amount. Fractions only appear transiently inside
/// formulas and are floored or truncated before they are stored.
pub type Money = Decimal;

/// Number of price history entries kept per item (oldest evicted first).
pub const PRICE_HISTORY_DEPTH: usize = 7;

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// One recorded price change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceHistoryEntry {
    /// Price after the change.
    pub price: Money,
    /// Signed difference with the previous price.
    pub change: Money,
}

/// A tradeable catalog item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    /// Unique item name.
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Coarse category (menu grouping).
    #[serde(rename = "Type")]
    pub item_type: String,
    /// Fine category targeted by market events and business sell lists.
    #[serde(rename = "SubType")]
    pub subtype: String,
    /// Current price, always within `[lower_limit, upper_limit]`.
    pub price: Money,
    /// Weight per unit (>= 0).
    pub weight: Decimal,
    pub lower_limit: Money,
    pub upper_limit: Money,
    /// Most recent changes, newest last, at most [`PRICE_HISTORY_DEPTH`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_history: Vec<PriceHistoryEntry>,
}

impl Item {
    /// Weight of `quantity` units.
    pub fn load_of(&self, quantity: u32) -> Result<Decimal, EconomyError> {
        self.weight
            .checked_mul(Decimal::from(quantity))
            .ok_or(EconomyError::Overflow)
    }

    /// Set a new price, appending to the bounded history.
    pub fn set_price(&mut self, new_price: Money) -> PriceHistoryEntry {
        let entry = PriceHistoryEntry {
            price: new_price,
            change: new_price - self.price,
        };
        self.price_history.push(entry.clone());
        while self.price_history.len() > PRICE_HISTORY_DEPTH {
            self.price_history.remove(0);
        }
        self.price = new_price;
        entry
    }
}

/// Ordered item catalog with name lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.name == name)
    }

    /// Lookup that reports unknown names as [`EconomyError::NotFound`].
    pub fn require(&self, name: &str) -> Result<&Item, EconomyError> {
        self.get(name)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Item, name))
    }

    /// Items whose subtype appears in `subtypes`, in catalog order.
    pub fn with_subtypes<'a>(&'a self, subtypes: &'a [String]) -> impl Iterator<Item = &'a Item> {
        self.items
            .iter()
            .filter(move |i| subtypes.iter().any(|s| s == &i.subtype))
    }
}

/// A market event that shocks the prices of some subtypes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub name: String,
    pub affected_subtypes: Vec<String>,
    /// Signed percentage added to the next matching price variation.
    pub impact: Decimal,
    pub news_message: String,
}

impl MarketEvent {
    pub fn affects(&self, subtype: &str) -> bool {
        self.affected_subtypes.iter().any(|s| s == subtype)
    }
}

/// World position, opaque to the economy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// The three per-business upgrade tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// +10 max stored weight.
    Stock,
    /// +0.05 price multiplier.
    ItemPrice,
    /// -1 revenue interval, floored at 1.
    Interval,
}

/// An ownable business.
#[derive(Clone, Debug, PartialEq)]
pub struct Business {
    pub name: String,
    pub position: Position,
    pub icon: i32,
    pub purchased: bool,
    pub price: Money,
    /// Accrued, uncollected revenue.
    pub revenue: Money,
    /// Stock; its weight is the stored weight and its capacity the max stored weight.
    pub inventory: Inventory,
    pub price_multiplier: Decimal,
    /// Seconds between revenue generations (>= 1).
    pub interval_secs: u32,
    pub stock_level: u32,
    pub item_price_level: u32,
    pub interval_level: u32,
    pub business_type: String,
    pub sellable_subtypes: Vec<String>,
    pub automatic_refill: bool,
    pub tier: u32,
}

impl Business {
    pub fn sells(&self, subtype: &str) -> bool {
        self.sellable_subtypes.iter().any(|s| s == subtype)
    }

    pub fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Stock => self.stock_level,
            UpgradeKind::ItemPrice => self.item_price_level,
            UpgradeKind::Interval => self.interval_level,
        }
    }
}

/// Vehicle classes; each determines the storage granted at acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleClass {
    Compacts,
    Sedans,
    SUVs,
    Coupes,
    Muscle,
    Sports,
    Super,
    Motorcycles,
    OffRoad,
    Commercial,
    SportsClassics,
    OpenWheel,
    Service,
    Other,
}

impl VehicleClass {
    pub fn storage_capacity(self) -> Decimal {
        let units: i64 = match self {
            VehicleClass::Compacts => 125,
            VehicleClass::Sedans => 250,
            VehicleClass::SUVs => 300,
            VehicleClass::Coupes => 150,
            VehicleClass::Muscle => 200,
            VehicleClass::Sports => 100,
            VehicleClass::Super => 75,
            VehicleClass::Motorcycles => 50,
            VehicleClass::OffRoad => 400,
            VehicleClass::Commercial => 1000,
            VehicleClass::SportsClassics => 100,
            VehicleClass::OpenWheel => 25,
            VehicleClass::Service => 750,
            VehicleClass::Other => 0,
        };
        Decimal::from(units)
    }
}

/// A dealership offer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DealershipEntry {
    pub model_name: String,
    #[serde(default)]
    pub category: String,
    pub class: VehicleClass,
    pub price: Money,
}

/// A vehicle owned by the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VehicleRecord {
    pub model_name: String,
    pub price: Money,
    pub in_use: bool,
    pub is_destroyed: bool,
    /// Cargo; capacity is the vehicle's storage.
    pub inventory: Inventory,
    /// Applied modification option per mod slot.
    #[serde(default)]
    pub mods: BTreeMap<u32, i32>,
    #[serde(default)]
    pub primary_color: i32,
    #[serde(default)]
    pub secondary_color: i32,
    #[serde(default)]
    pub pearlescent_color: i32,
}

/// The player's balance, goods, upgrades and vehicles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerLedger {
    pub money: Money,
    /// Shared upgrade level per business type.
    #[serde(default, deserialize_with = "null_as_default")]
    pub business_upgrades: BTreeMap<String, u32>,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stored_vehicles: Vec<VehicleRecord>,
}

impl PlayerLedger {
    /// Fresh ledger with a zero upgrade level for every known business type.
    pub fn new<'a>(
        money: Money,
        capacity: Decimal,
        business_types: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            money,
            business_upgrades: business_types
                .into_iter()
                .map(|t| (t.to_string(), 0))
                .collect(),
            inventory: Inventory::new(capacity),
            stored_vehicles: Vec::new(),
        }
    }

    pub fn type_level(&self, business_type: &str) -> u32 {
        self.business_upgrades
            .get(business_type)
            .copied()
            .unwrap_or(0)
    }

    /// Fail with [`EconomyError::InsufficientFunds`] unless `amount` is covered.
    pub fn ensure_funds(&self, amount: Money) -> Result<(), EconomyError> {
        if self.money < amount {
            return Err(EconomyError::InsufficientFunds {
                needed: amount,
                available: self.money,
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, amount: Money) -> Result<(), EconomyError> {
        self.ensure_funds(amount)?;
        self.money = self
            .money
            .checked_sub(amount)
            .ok_or(EconomyError::Overflow)?;
        Ok(())
    }

    /// Add `amount`; the balance is unchanged when the sum is out of range.
    pub fn credit(&mut self, amount: Money) -> Result<(), EconomyError> {
        self.money = self
            .money
            .checked_add(amount)
            .ok_or(EconomyError::Overflow)?;
        Ok(())
    }
}

/// One ingredient line of a recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: String,
    pub quantity: u32,
}

/// Converts ingredients into one unit of `result`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub result: String,
    pub ingredients: Vec<Ingredient>,
}

/// A place where a subset of recipes can be crafted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CraftingLocation {
    pub name: String,
    pub position: Position,
    pub icon: i32,
    pub tier: u32,
    pub recipes: Vec<String>,
}

impl CraftingLocation {
    pub fn offers(&self, recipe: &str) -> bool {
        self.recipes.iter().any(|r| r == recipe)
    }
}

/// A free production point yielding one item per harvest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarvestSource {
    pub name: String,
    pub position: Position,
    pub item: String,
    pub icon: i32,
    pub anim_dict: String,
    pub anim_name: String,
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Seconds between price updates (1/8 in-game day).
    pub price_interval_secs: u64,
    /// Seconds between market events (1/4 in-game day).
    pub event_interval_secs: u64,
    /// Seconds between two harvest yields.
    pub harvest_cooldown_secs: u64,
    /// Fixed player weight capacity.
    pub player_capacity: Decimal,
    /// Balance of a freshly created player ledger.
    pub starting_money: Money,
    /// Seed for the non-price RNG; entropy when absent.
    pub rng_seed: Option<u64>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            price_interval_secs: 450,
            event_interval_secs: 900,
            harvest_cooldown_secs: 10,
            player_capacity: Decimal::new(50, 0),
            starting_money: Decimal::new(5500, 0),
            rng_seed: None,
        }
    }
}

/// Validate an item's bounds and weight.
pub fn validate_item(item: &Item) -> Result<(), ValidationError> {
    if item.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if item.weight < Decimal::ZERO {
        return Err(ValidationError::NegativeWeight(item.name.clone()));
    }
    if item.lower_limit < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney(item.name.clone()));
    }
    if item.lower_limit > item.upper_limit {
        return Err(ValidationError::InvertedBounds(item.name.clone()));
    }
    if item.price < item.lower_limit || item.price > item.upper_limit {
        return Err(ValidationError::PriceOutOfBounds(item.name.clone()));
    }
    Ok(())
}

/// Validate a market event row.
pub fn validate_event(event: &MarketEvent) -> Result<(), ValidationError> {
    if event.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Validate a recipe's shape.
pub fn validate_recipe(recipe: &Recipe) -> Result<(), ValidationError> {
    if recipe.result.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if recipe.ingredients.is_empty() {
        return Err(ValidationError::EmptyRecipe(recipe.result.clone()));
    }
    if recipe.ingredients.iter().any(|i| i.quantity == 0) {
        return Err(ValidationError::ZeroQuantity(recipe.result.clone()));
    }
    Ok(())
}

/// Validate a business row.
pub fn validate_business(b: &Business) -> Result<(), ValidationError> {
    if b.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if b.price < Decimal::ZERO || b.revenue < Decimal::ZERO || b.price_multiplier < Decimal::ZERO
    {
        return Err(ValidationError::NegativeMoney(b.name.clone()));
    }
    if b.interval_secs == 0 {
        return Err(ValidationError::ZeroInterval(b.name.clone()));
    }
    if b.inventory.capacity() < Decimal::ZERO || b.inventory.weight() < Decimal::ZERO {
        return Err(ValidationError::NegativeWeight(b.name.clone()));
    }
    if b.inventory.records().iter().any(|r| r.quantity == 0) {
        return Err(ValidationError::ZeroQuantity(b.name.clone()));
    }
    Ok(())
}

/// Borrowed view over every table, used for cross-reference validation.
pub struct Tables<'a> {
    pub catalog: &'a Catalog,
    pub businesses: &'a [Business],
    pub recipes: &'a [Recipe],
    pub crafting_locations: &'a [CraftingLocation],
    pub harvest_sources: &'a [HarvestSource],
    pub player: &'a PlayerLedger,
}

fn check_item(catalog: &Catalog, context: &str, item: &str) -> Result<(), ValidationError> {
    if catalog.get(item).is_none() {
        return Err(ValidationError::UnknownItem {
            context: context.to_string(),
            item: item.to_string(),
        });
    }
    Ok(())
}

/// Validate the tables, including cross-references to catalog items and recipes.
pub fn validate_tables(t: &Tables<'_>) -> Result<(), ValidationError> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for b in t.businesses {
        validate_business(b)?;
        if !names.insert(&b.name) {
            return Err(ValidationError::Duplicate(b.name.clone()));
        }
        for r in b.inventory.records() {
            check_item(t.catalog, &b.name, &r.item)?;
        }
    }
    for recipe in t.recipes {
        validate_recipe(recipe)?;
        check_item(t.catalog, &recipe.result, &recipe.result)?;
        for ing in &recipe.ingredients {
            check_item(t.catalog, &recipe.result, &ing.item)?;
        }
    }
    for loc in t.crafting_locations {
        for r in &loc.recipes {
            if !t.recipes.iter().any(|x| &x.result == r) {
                return Err(ValidationError::UnknownRecipe {
                    location: loc.name.clone(),
                    recipe: r.clone(),
                });
            }
        }
    }
    for h in t.harvest_sources {
        check_item(t.catalog, &h.name, &h.item)?;
    }
    for r in t.player.inventory.records() {
        check_item(t.catalog, "player inventory", &r.item)?;
    }
    for v in &t.player.stored_vehicles {
        for r in v.inventory.records() {
            check_item(t.catalog, &v.model_name, &r.item)?;
        }
    }
    Ok(())
}

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::Money;

/// Kind of entity referenced by a [`EconomyError::NotFound`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Item,
    Recipe,
    Business,
    BusinessType,
    CraftingLocation,
    HarvestSource,
    Vehicle,
    DealershipModel,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Item => "item",
            EntityKind::Recipe => "recipe",
            EntityKind::Business => "business",
            EntityKind::BusinessType => "business type",
            EntityKind::CraftingLocation => "crafting location",
            EntityKind::HarvestSource => "harvest source",
            EntityKind::Vehicle => "vehicle",
            EntityKind::DealershipModel => "dealership model",
        };
        f.write_str(label)
    }
}

/// Errors returned by every player-facing economic action.
///
/// Apart from [`EconomyError::Persistence`], an error means the action left
/// the economy untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EconomyError {
    /// The player's balance does not cover the cost.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Money, available: Money },
    /// The destination container cannot take the extra weight.
    #[error("capacity exceeded: need {needed}, only {free} free")]
    CapacityExceeded { needed: Decimal, free: Decimal },
    /// The player lacks an ingredient for the recipe.
    #[error("missing ingredients for {recipe}: not enough {item}")]
    MissingIngredients { recipe: String, item: String },
    /// A business only accepts items from its sell list.
    #[error("{business} does not sell {subtype} items")]
    UnsupportedItemType { business: String, subtype: String },
    /// Unknown entity name or index.
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },
    /// The source container holds fewer units than requested.
    #[error("not enough {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: u32,
        available: u32,
    },
    #[error("quantity must be positive")]
    InvalidQuantity,
    /// An amount, weight or quantity would leave the representable range.
    #[error("amount out of range")]
    Overflow,
    #[error("source and destination are the same container")]
    SameContainer,
    /// Lower tiers still have unpurchased businesses.
    #[error("{business} is locked until every business below tier {tier} is purchased")]
    TierLocked { business: String, tier: u32 },
    #[error("{0} is already purchased")]
    AlreadyPurchased(String),
    #[error("{0} has not been purchased")]
    NotPurchased(String),
    #[error("{0} already refills automatically")]
    AlreadyAutomatic(String),
    #[error("vehicle {0} is destroyed")]
    VehicleUnavailable(String),
    #[error("vehicle {0} is not destroyed")]
    VehicleIntact(String),
    /// Static tables are missing or malformed; fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Durable storage could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl EconomyError {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        EconomyError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Validation errors for load-time invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("entity name must not be empty")]
    EmptyName,
    #[error("weight of {0} must be >= 0")]
    NegativeWeight(String),
    #[error("price bounds of {0} are inverted")]
    InvertedBounds(String),
    #[error("price of {0} lies outside its bounds")]
    PriceOutOfBounds(String),
    #[error("negative monetary value in {0}")]
    NegativeMoney(String),
    #[error("interval of {0} must be >= 1")]
    ZeroInterval(String),
    #[error("{0} has no ingredients")]
    EmptyRecipe(String),
    #[error("{0} requires a positive quantity")]
    ZeroQuantity(String),
    #[error("{context} references unknown item {item}")]
    UnknownItem { context: String, item: String },
    #[error("{location} offers unknown recipe {recipe}")]
    UnknownRecipe { location: String, recipe: String },
    #[error("duplicate name: {0}")]
    Duplicate(String),
}

impl From<ValidationError> for EconomyError {
    fn from(e: ValidationError) -> Self {
        EconomyError::Configuration(e.to_string())
    }
}

#![deny(warnings)]

//! Runtime for the market & ledger engine: the [`Economy`] aggregate, its
//! timers and every inward action a host can invoke.
//!
//! Hosts call [`Economy::tick`] from their frame loop, dispatch player
//! actions directly or through [`Command`], and drain user notices with
//! [`Economy::take_notifications`].

mod business;
pub mod commands;
pub mod config;
mod crafting;
mod economy;
pub mod events;
mod harvest;
mod ledger;
pub mod pricing;
pub mod schedule;
mod vehicles;

pub use business::{active_tier, generate_revenue, tier_unlocked, Sale};
pub use commands::{Command, Outcome};
pub use config::{load_config, parse_config};
pub use economy::{Economy, TickReport, PRICES_EVOLVED};
pub use harvest::{Harvest, INVENTORY_FULL};
pub use ledger::ContainerId;
pub use pricing::{evolve_catalog, PriceTick, PricingEngine};
pub use schedule::{Clock, IntervalGate, ManualClock, SystemClock};

#[cfg(test)]
mod tests;

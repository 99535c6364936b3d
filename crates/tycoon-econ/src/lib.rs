#![deny(warnings)]

//! Economic formulas for the tycoon market & ledger engine.
//!
//! This crate provides the pure arithmetic behind the engines:
//! - Bounded random-walk price steps with one-shot event shocks
//! - Upgrade, purchase, revenue and vehicle cost formulas
//! - Money and market-event formatting for user notices
//!
//! Every function returning [`Money`] yields an integral amount.

pub mod random;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tycoon_core::{EconomyError, MarketEvent, Money};

pub use random::{ChaChaSource, RandomSource, ScriptedSource};

/// Noise percentages are drawn from `[-MAX_VARIATION_PERCENT, MAX_VARIATION_PERCENT)`.
pub const MAX_VARIATION_PERCENT: i64 = 10;
/// Units sold per generation by a manually restocked business.
pub const MANUAL_SALE_RANGE: (u32, u32) = (1, 3);
/// Units sold per generation by an automatic-refill business.
pub const AUTOMATIC_SALE_RANGE: (u32, u32) = (1, 5);
/// Extra max stored weight per stock upgrade.
pub const STOCK_UPGRADE_STEP: i64 = 10;
/// Extra vehicle storage per storage upgrade.
pub const VEHICLE_STORAGE_STEP: i64 = 10;
/// Mod slots priced as performance parts (engine, brakes, transmission, suspension).
pub const PERFORMANCE_MOD_SLOTS: [u32; 4] = [11, 12, 13, 15];

/// Price multiplier gained per item-price upgrade (0.05).
pub fn item_price_upgrade_step() -> Decimal {
    Decimal::new(5, 2)
}

/// Price multiplier gained by every business of a type per type upgrade (0.25).
pub fn type_upgrade_step() -> Decimal {
    Decimal::new(25, 2)
}

/// Seed for the price noise of one tick: the timestamp in 100 ns ticks,
/// truncated to 16 bits. All items evolved within the same tick share it.
pub fn price_seed(now: DateTime<Utc>) -> u64 {
    let ticks = now
        .timestamp_nanos_opt()
        .map(|n| n / 100)
        .unwrap_or_else(|| now.timestamp().wrapping_mul(10_000_000));
    (ticks & 0xFFFF) as u64
}

/// Integral variation percentage: noise plus optional event impact,
/// truncated toward zero.
pub fn variation_percent(noise: Decimal, event_impact: Option<Decimal>) -> Decimal {
    (noise + event_impact.unwrap_or(Decimal::ZERO)).trunc()
}

/// `price × percent / 100`, truncated toward zero. `None` when the product
/// leaves the decimal range even after scaling the price down first.
pub fn price_delta(price: Money, percent: Decimal) -> Option<Money> {
    price
        .checked_mul(percent)
        .map(|p| p / Decimal::ONE_HUNDRED)
        .or_else(|| (price / Decimal::ONE_HUNDRED).checked_mul(percent))
        .map(|d| d.trunc())
}

/// Apply a variation and clamp the result into `[lower, upper]`. A step that
/// cannot be represented lands on the bound it moves toward.
///
/// Example:
/// let p = evolve_price(Decimal::new(100, 0), Decimal::new(50, 0), Decimal::new(500, 0), Decimal::new(8, 0));
/// assert_eq!(p, Decimal::new(108, 0));
pub fn evolve_price(price: Money, lower: Money, upper: Money, percent: Decimal) -> Money {
    match price_delta(price, percent).and_then(|d| price.checked_add(d)) {
        Some(next) => next.clamp(lower, upper),
        None if percent < Decimal::ZERO => lower,
        None => upper,
    }
}

fn checked(value: Option<Money>) -> Result<Money, EconomyError> {
    value.ok_or(EconomyError::Overflow)
}

/// Cost of the next level of a per-business upgrade:
/// `floor(price × 0.5 × (1 + 10 × level))`.
///
/// Example:
/// assert_eq!(upgrade_cost(Decimal::new(1000, 0), 1), Ok(Decimal::new(5500, 0)));
pub fn upgrade_cost(business_price: Money, level: u32) -> Result<Money, EconomyError> {
    let factor = Decimal::ONE + Decimal::TEN * Decimal::from(level);
    let base = business_price * Decimal::new(5, 1);
    checked(base.checked_mul(factor)).map(|c| c.floor())
}

/// Cost of a business-type upgrade: `10 × total_price × (1 + level)`.
pub fn type_upgrade_cost(total_type_price: Money, level: u32) -> Result<Money, EconomyError> {
    let factor = Decimal::ONE + Decimal::from(level);
    checked(
        total_type_price
            .checked_mul(Decimal::TEN)
            .and_then(|t| t.checked_mul(factor)),
    )
}

/// Cost of buying `quantity` units from a seller at half the market price.
pub fn seller_cost(price: Money, quantity: u32) -> Result<Money, EconomyError> {
    checked(price.checked_mul(Decimal::from(quantity))).map(|c| (c / Decimal::TWO).trunc())
}

/// Revenue of a sale: `floor(quantity × price × multiplier)`.
///
/// Example:
/// assert_eq!(sale_revenue(Decimal::new(50, 0), 3, Decimal::new(12, 1)), Ok(Decimal::new(180, 0)));
pub fn sale_revenue(price: Money, quantity: u32, multiplier: Decimal) -> Result<Money, EconomyError> {
    checked(
        price
            .checked_mul(Decimal::from(quantity))
            .and_then(|gross| gross.checked_mul(multiplier)),
    )
    .map(|r| r.floor())
}

/// One-off cost of switching a business to automatic refill.
pub fn automatic_refill_cost(business_price: Money) -> Result<Money, EconomyError> {
    checked(business_price.checked_mul(Decimal::ONE_THOUSAND))
}

/// Cost of one vehicle storage upgrade (a fifth of its price).
pub fn vehicle_storage_upgrade_cost(vehicle_price: Money) -> Money {
    (vehicle_price / Decimal::from(5)).trunc()
}

/// Insurance cost to recover a destroyed vehicle (a tenth of its price).
pub fn insurance_cost(vehicle_price: Money) -> Money {
    (vehicle_price / Decimal::TEN).trunc()
}

/// Cost of applying mod `option` in `slot`. Option -1 restores the stock
/// part for free; performance parts double in price per option.
pub fn vehicle_mod_cost(slot: u32, option: i32) -> Money {
    if option < 0 {
        return Decimal::ZERO;
    }
    if PERFORMANCE_MOD_SLOTS.contains(&slot) {
        let factor = 1u64 << option.min(40) as u32;
        Decimal::from(10_000u64) * Decimal::from(factor)
    } else {
        Decimal::from(2_500u64)
    }
}

/// Stock fill level of a manually restocked business.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestockLevel {
    /// Nothing stored.
    Empty,
    /// At most half full.
    Low,
    /// More than half full.
    Stocked,
}

pub fn restock_level(stored: Decimal, max: Decimal) -> RestockLevel {
    if stored <= Decimal::ZERO {
        RestockLevel::Empty
    } else if stored <= max / Decimal::TWO {
        RestockLevel::Low
    } else {
        RestockLevel::Stocked
    }
}

const MONEY_SUFFIXES: [&str; 21] = [
    "", "K", "M", "B", "T", "q", "Q", "s", "S", "O", "N", "D", "Ud", "Dd", "Td", "qd", "Qd", "sd",
    "Sd", "Od", "Nd",
];

/// Short money label with two decimals and a magnitude suffix, e.g. `5.50K`.
pub fn format_money(amount: Money) -> String {
    let sign = if amount < Decimal::ZERO { "-" } else { "" };
    let thousand = Decimal::ONE_THOUSAND;
    let mut value = amount.abs();
    let mut idx = 0;
    while value >= thousand && idx < MONEY_SUFFIXES.len() - 1 {
        value /= thousand;
        idx += 1;
    }
    let value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{sign}{value:.2}{}", MONEY_SUFFIXES[idx])
}

/// User notice announcing a market event, impact colored by sign.
pub fn format_event_notice(event: &MarketEvent) -> String {
    let subtypes = event.affected_subtypes.join(", ");
    let (color, sign) = if event.impact < Decimal::ZERO {
        ("#CC7272", "")
    } else {
        ("#72CC72", "+")
    };
    format!(
        "{} Variation on {} = <font color=\"{}\">{}{}%</font>",
        event.news_message,
        subtypes,
        color,
        sign,
        event.impact.normalize()
    )
}

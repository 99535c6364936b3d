//! Business purchase, tier gating, revenue and upgrades.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use tycoon_core::{
    transfer, Business, Catalog, EconomyError, EntityKind, Item, Money, UpgradeKind,
};
use tycoon_econ::{
    automatic_refill_cost, format_money, item_price_upgrade_step, restock_level, sale_revenue,
    type_upgrade_cost, type_upgrade_step, upgrade_cost, RandomSource, RestockLevel,
    AUTOMATIC_SALE_RANGE, MANUAL_SALE_RANGE, STOCK_UPGRADE_STEP,
};

use crate::Economy;
use persistence::Store;

/// One revenue generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Sale {
    pub item: String,
    pub quantity: u32,
    pub revenue: Money,
}

/// Lowest tier that still has an unpurchased business, or the highest tier
/// once everything is bought. `None` without businesses.
pub fn active_tier(businesses: &[Business]) -> Option<u32> {
    businesses
        .iter()
        .filter(|b| !b.purchased)
        .map(|b| b.tier)
        .min()
        .or_else(|| businesses.iter().map(|b| b.tier).max())
}

/// Whether every business below `tier` is purchased.
pub fn tier_unlocked(businesses: &[Business], tier: u32) -> bool {
    businesses.iter().all(|b| b.tier >= tier || b.purchased)
}

/// Sell once from `business`, accruing revenue.
///
/// Manually stocked businesses sell 1..=3 units of a random stored record and
/// lose the matching weight; automatic ones sell 1..=5 units of a random
/// catalog item they are allowed to sell and never touch their stock.
pub fn generate_revenue(
    business: &mut Business,
    catalog: &Catalog,
    rng: &mut dyn RandomSource,
) -> Option<Sale> {
    let automatic = business.automatic_refill;
    let (item, quantity) = if automatic {
        let candidates: Vec<&Item> = catalog.with_subtypes(&business.sellable_subtypes).collect();
        if candidates.is_empty() {
            return None;
        }
        let item = candidates[rng.pick(candidates.len())];
        let (min, max) = AUTOMATIC_SALE_RANGE;
        (item, rng.between(min, max))
    } else {
        if business.inventory.is_empty() || business.inventory.weight() <= Decimal::ZERO {
            return None;
        }
        let records = business.inventory.records();
        let record = &records[rng.pick(records.len())];
        let item = catalog.get(&record.item)?;
        let (min, max) = MANUAL_SALE_RANGE;
        (item, rng.between(min, max).min(record.quantity))
    };
    let accrued = sale_revenue(item.price, quantity, business.price_multiplier).and_then(|revenue| {
        business
            .revenue
            .checked_add(revenue)
            .map(|total| (revenue, total))
            .ok_or(EconomyError::Overflow)
    });
    let (revenue, total) = match accrued {
        Ok(v) => v,
        Err(e) => {
            warn!(business = %business.name, item = %item.name, error = %e, "sale skipped");
            return None;
        }
    };
    if !automatic {
        transfer(Some(&mut business.inventory), None, item, quantity).ok()?;
    }
    business.revenue = total;
    Some(Sale {
        item: item.name.clone(),
        quantity,
        revenue,
    })
}

fn apply_upgrade(business: &mut Business, kind: UpgradeKind) -> Result<(), EconomyError> {
    match kind {
        UpgradeKind::Stock => {
            let capacity = business
                .inventory
                .capacity()
                .checked_add(Decimal::from(STOCK_UPGRADE_STEP))
                .ok_or(EconomyError::Overflow)?;
            business.stock_level += 1;
            business.inventory.set_capacity(capacity);
        }
        UpgradeKind::ItemPrice => {
            business.price_multiplier = business
                .price_multiplier
                .checked_add(item_price_upgrade_step())
                .ok_or(EconomyError::Overflow)?;
            business.item_price_level += 1;
        }
        UpgradeKind::Interval => {
            business.interval_level += 1;
            business.interval_secs = business.interval_secs.saturating_sub(1).max(1);
        }
    }
    Ok(())
}

impl<S: Store> Economy<S> {
    fn owned_index(&self, name: &str) -> Result<usize, EconomyError> {
        let idx = self.business_index(name)?;
        if !self.businesses[idx].purchased {
            return Err(EconomyError::NotPurchased(name.to_string()));
        }
        Ok(idx)
    }

    pub fn active_tier(&self) -> Option<u32> {
        active_tier(&self.businesses)
    }

    /// Businesses of the active tier, the ones a menu would list.
    pub fn visible_businesses(&self) -> impl Iterator<Item = &Business> {
        let tier = self.active_tier();
        self.businesses
            .iter()
            .filter(move |b| Some(b.tier) == tier)
    }

    pub fn buy_business(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), EconomyError> {
        let idx = self.business_index(name)?;
        let business = &self.businesses[idx];
        if business.purchased {
            return Err(EconomyError::AlreadyPurchased(name.to_string()));
        }
        if !tier_unlocked(&self.businesses, business.tier) {
            return Err(EconomyError::TierLocked {
                business: name.to_string(),
                tier: business.tier,
            });
        }
        let price = business.price;
        self.player.debit(price)?;
        self.businesses[idx].purchased = true;
        self.revenue_timers.insert(name.to_string(), now);
        info!(business = name, price = %price, "business purchased");
        self.notify(format!("You bought {name} for ${}", format_money(price)));
        self.persist_player();
        self.persist_businesses();
        Ok(())
    }

    /// Move the accrued revenue to the player. Returns the amount collected.
    pub fn collect_revenue(&mut self, name: &str) -> Result<Money, EconomyError> {
        let idx = self.owned_index(name)?;
        let amount = self.businesses[idx].revenue;
        self.player.credit(amount)?;
        self.businesses[idx].revenue = Decimal::ZERO;
        info!(business = name, amount = %amount, "revenue collected");
        self.persist_player();
        self.persist_businesses();
        Ok(amount)
    }

    /// Cost of the next level of `kind` for a business.
    pub fn upgrade_quote(&self, name: &str, kind: UpgradeKind) -> Result<Money, EconomyError> {
        let business = self.business(name)?;
        upgrade_cost(business.price, business.level(kind))
    }

    pub fn upgrade_business(&mut self, name: &str, kind: UpgradeKind) -> Result<Money, EconomyError> {
        let idx = self.owned_index(name)?;
        let cost = self.upgrade_quote(name, kind)?;
        let mut upgraded = self.businesses[idx].clone();
        apply_upgrade(&mut upgraded, kind)?;
        self.player.debit(cost)?;
        self.businesses[idx] = upgraded;
        info!(business = name, ?kind, cost = %cost, "business upgraded");
        self.persist_player();
        self.persist_businesses();
        Ok(cost)
    }

    /// Cost of the next shared upgrade for every business of `business_type`.
    pub fn type_upgrade_quote(&self, business_type: &str) -> Result<Money, EconomyError> {
        let mut members = self
            .businesses
            .iter()
            .filter(|b| b.business_type == business_type)
            .peekable();
        if members.peek().is_none() {
            return Err(EconomyError::not_found(EntityKind::BusinessType, business_type));
        }
        let total = members
            .try_fold(Decimal::ZERO, |acc, b| acc.checked_add(b.price))
            .ok_or(EconomyError::Overflow)?;
        type_upgrade_cost(total, self.player.type_level(business_type))
    }

    pub fn upgrade_business_type(&mut self, business_type: &str) -> Result<Money, EconomyError> {
        let cost = self.type_upgrade_quote(business_type)?;
        let raised = self
            .businesses
            .iter()
            .enumerate()
            .filter(|(_, b)| b.business_type == business_type)
            .map(|(idx, b)| {
                b.price_multiplier
                    .checked_add(type_upgrade_step())
                    .map(|m| (idx, m))
                    .ok_or(EconomyError::Overflow)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.player.debit(cost)?;
        for (idx, multiplier) in raised {
            self.businesses[idx].price_multiplier = multiplier;
        }
        *self
            .player
            .business_upgrades
            .entry(business_type.to_string())
            .or_insert(0) += 1;
        info!(business_type, cost = %cost, "business type upgraded");
        self.persist_player();
        self.persist_businesses();
        Ok(cost)
    }

    /// Switch a business to selling from unlimited virtual stock.
    pub fn enable_automatic_refill(&mut self, name: &str) -> Result<Money, EconomyError> {
        let idx = self.owned_index(name)?;
        if self.businesses[idx].automatic_refill {
            return Err(EconomyError::AlreadyAutomatic(name.to_string()));
        }
        let cost = automatic_refill_cost(self.businesses[idx].price)?;
        self.player.debit(cost)?;
        self.businesses[idx].automatic_refill = true;
        info!(business = name, cost = %cost, "automatic refill enabled");
        self.persist_player();
        self.persist_businesses();
        Ok(cost)
    }

    pub fn restock_level(&self, name: &str) -> Result<RestockLevel, EconomyError> {
        let b = self.business(name)?;
        Ok(restock_level(b.inventory.weight(), b.inventory.capacity()))
    }
}

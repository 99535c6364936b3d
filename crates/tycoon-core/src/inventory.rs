//! Weight-constrained containers shared by the player, vehicles and businesses.
//!
//! Every movement of goods goes through [`transfer`]; callers layer currency
//! checks and sell-list gates on top but never touch weights themselves.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Catalog, EconomyError, Item};

/// A quantity of one catalog item held by exactly one container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InventoryRecord {
    /// Catalog item name.
    pub item: String,
    /// Units held (> 0 while the record exists).
    pub quantity: u32,
}

/// A container with a cached total weight and a declared capacity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Inventory {
    #[serde(default)]
    records: Vec<InventoryRecord>,
    #[serde(default)]
    weight: Decimal,
    #[serde(default)]
    capacity: Decimal,
}

impl Inventory {
    pub fn new(capacity: Decimal) -> Self {
        Self {
            records: Vec::new(),
            weight: Decimal::ZERO,
            capacity,
        }
    }

    /// Rebuild a container from persisted fields as-is.
    pub fn from_parts(records: Vec<InventoryRecord>, weight: Decimal, capacity: Decimal) -> Self {
        Self {
            records,
            weight,
            capacity,
        }
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn weight(&self) -> Decimal {
        self.weight
    }

    pub fn capacity(&self) -> Decimal {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: Decimal) {
        self.capacity = capacity;
    }

    /// Remaining weight this container can accept.
    pub fn free(&self) -> Decimal {
        (self.capacity - self.weight).max(Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn quantity_of(&self, item: &str) -> u32 {
        self.records
            .iter()
            .find(|r| r.item == item)
            .map(|r| r.quantity)
            .unwrap_or(0)
    }

    /// Whether `load` more weight fits without exceeding capacity.
    pub fn can_hold(&self, load: Decimal) -> bool {
        self.weight
            .checked_add(load)
            .is_some_and(|total| total <= self.capacity)
    }

    /// Sum of `quantity × weight` over the records, ignoring unknown items.
    pub fn measured_weight(&self, catalog: &Catalog) -> Result<Decimal, EconomyError> {
        self.records
            .iter()
            .filter_map(|r| catalog.get(&r.item).map(|item| item.load_of(r.quantity)))
            .try_fold(Decimal::ZERO, |total, load| {
                total.checked_add(load?).ok_or(EconomyError::Overflow)
            })
    }

    /// Replace the cached weight with the measured one, returning the old value.
    pub fn resync_weight(&mut self, catalog: &Catalog) -> Result<Decimal, EconomyError> {
        let previous = self.weight;
        self.weight = self.measured_weight(catalog)?;
        Ok(previous)
    }

    fn put(&mut self, item: &Item, quantity: u32, load: Decimal) {
        match self.records.iter_mut().find(|r| r.item == item.name) {
            Some(record) => record.quantity += quantity,
            None => self.records.push(InventoryRecord {
                item: item.name.clone(),
                quantity,
            }),
        }
        self.weight += load;
    }

    fn take(&mut self, item: &Item, quantity: u32, load: Decimal) {
        if let Some(pos) = self.records.iter().position(|r| r.item == item.name) {
            let record = &mut self.records[pos];
            record.quantity -= quantity;
            if record.quantity == 0 {
                self.records.remove(pos);
            }
            self.weight -= load;
        }
    }
}

/// Move `quantity` units of `item` between two containers.
///
/// `None` stands for the void: external production when used as source,
/// consumption or sale when used as destination. All checks run before any
/// mutation, so an error leaves both containers untouched.
pub fn transfer(
    source: Option<&mut Inventory>,
    destination: Option<&mut Inventory>,
    item: &Item,
    quantity: u32,
) -> Result<(), EconomyError> {
    if quantity == 0 {
        return Err(EconomyError::InvalidQuantity);
    }
    let load = item.load_of(quantity)?;
    if let Some(dest) = destination.as_deref() {
        if dest.quantity_of(&item.name).checked_add(quantity).is_none() {
            return Err(EconomyError::Overflow);
        }
        if !dest.can_hold(load) {
            return Err(EconomyError::CapacityExceeded {
                needed: load,
                free: dest.free(),
            });
        }
    }
    if let Some(src) = source.as_deref() {
        let available = src.quantity_of(&item.name);
        if available < quantity {
            return Err(EconomyError::InsufficientStock {
                item: item.name.clone(),
                requested: quantity,
                available,
            });
        }
    }
    if let Some(src) = source {
        src.take(item, quantity, load);
    }
    if let Some(dest) = destination {
        dest.put(item, quantity, load);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(name: &str, weight: Decimal) -> Item {
        Item {
            name: name.to_string(),
            description: String::new(),
            item_type: "Raw".to_string(),
            subtype: "Wood".to_string(),
            price: Decimal::new(100, 0),
            weight,
            lower_limit: Decimal::new(50, 0),
            upper_limit: Decimal::new(500, 0),
            price_history: vec![],
        }
    }

    #[test]
    fn transfer_moves_record_and_weight() {
        let wood = item("Wood", Decimal::new(15, 1));
        let mut player = Inventory::new(Decimal::new(50, 0));
        let mut truck = Inventory::new(Decimal::new(100, 0));
        transfer(None, Some(&mut player), &wood, 4).unwrap();
        assert_eq!(player.weight(), Decimal::new(6, 0));

        transfer(Some(&mut player), Some(&mut truck), &wood, 4).unwrap();
        assert!(player.is_empty());
        assert_eq!(player.weight(), Decimal::ZERO);
        assert_eq!(truck.quantity_of("Wood"), 4);
        assert_eq!(truck.weight(), Decimal::new(6, 0));
    }

    #[test]
    fn capacity_exceeded_leaves_both_untouched() {
        let rock = item("Rock", Decimal::new(10, 0));
        let mut player = Inventory::new(Decimal::new(50, 0));
        transfer(None, Some(&mut player), &rock, 3).unwrap();
        let mut small = Inventory::new(Decimal::new(25, 0));
        let before = (player.clone(), small.clone());

        let err = transfer(Some(&mut player), Some(&mut small), &rock, 3).unwrap_err();
        assert_eq!(
            err,
            EconomyError::CapacityExceeded {
                needed: Decimal::new(30, 0),
                free: Decimal::new(25, 0)
            }
        );
        assert_eq!((player, small), before);
    }

    #[test]
    fn exact_fill_is_accepted() {
        let rock = item("Rock", Decimal::new(10, 0));
        let mut player = Inventory::new(Decimal::new(50, 0));
        transfer(None, Some(&mut player), &rock, 5).unwrap();
        assert_eq!(player.free(), Decimal::ZERO);
        assert!(transfer(None, Some(&mut player), &rock, 1).is_err());
    }

    #[test]
    fn rejects_overdraw_and_zero_quantity() {
        let wood = item("Wood", Decimal::ONE);
        let mut player = Inventory::new(Decimal::new(50, 0));
        transfer(None, Some(&mut player), &wood, 2).unwrap();
        assert!(matches!(
            transfer(Some(&mut player), None, &wood, 3),
            Err(EconomyError::InsufficientStock { available: 2, .. })
        ));
        assert_eq!(
            transfer(Some(&mut player), None, &wood, 0),
            Err(EconomyError::InvalidQuantity)
        );
        assert_eq!(player.quantity_of("Wood"), 2);
    }

    #[test]
    fn quantity_overflow_is_rejected_before_mutation() {
        let feather = item("Feather", Decimal::ZERO);
        let mut sack = Inventory::new(Decimal::new(10, 0));
        transfer(None, Some(&mut sack), &feather, u32::MAX).unwrap();
        let before = sack.clone();
        assert_eq!(
            transfer(None, Some(&mut sack), &feather, 1),
            Err(EconomyError::Overflow)
        );
        assert_eq!(sack, before);
        assert_eq!(sack.quantity_of("Feather"), u32::MAX);
    }

    #[test]
    fn load_beyond_decimal_range_is_rejected() {
        let anvil = item("Anvil", Decimal::MAX);
        let mut cart = Inventory::new(Decimal::MAX);
        assert_eq!(
            transfer(None, Some(&mut cart), &anvil, 2),
            Err(EconomyError::Overflow)
        );
        transfer(None, Some(&mut cart), &anvil, 1).unwrap();
        assert!(!cart.can_hold(Decimal::ONE));
        assert_eq!(cart.quantity_of("Anvil"), 1);
    }

    proptest! {
        #[test]
        fn weight_matches_records_and_stays_within_capacity(
            ops in proptest::collection::vec((0usize..3, any::<bool>(), 1u32..6), 1..60)
        ) {
            let items = [
                item("Wood", Decimal::new(15, 1)),
                item("Ore", Decimal::new(4, 0)),
                item("Cloth", Decimal::new(25, 2)),
            ];
            let catalog = Catalog::new(items.to_vec());
            let mut a = Inventory::new(Decimal::new(40, 0));
            let mut b = Inventory::new(Decimal::new(25, 0));
            for (idx, a_to_b, qty) in ops {
                let it = &items[idx];
                let _ = transfer(None, Some(&mut a), it, qty);
                let _ = if a_to_b {
                    transfer(Some(&mut a), Some(&mut b), it, qty)
                } else {
                    transfer(Some(&mut b), Some(&mut a), it, qty)
                };
                for inv in [&a, &b] {
                    prop_assert_eq!(Ok(inv.weight()), inv.measured_weight(&catalog));
                    prop_assert!(inv.weight() <= inv.capacity());
                    prop_assert!(inv.records().iter().all(|r| r.quantity > 0));
                }
            }
        }
    }
}

//! Player-facing goods movements, all routed through [`tycoon_core::transfer`].

use persistence::Store;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tycoon_core::{transfer, EconomyError, EntityKind, Inventory, Money};
use tycoon_econ::seller_cost;

use crate::Economy;

/// A container the player can move goods between.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerId {
    Player,
    /// Index into the player's stored vehicles.
    Vehicle(usize),
    Business(String),
}

impl<S: Store> Economy<S> {
    /// Resolve a container, rejecting destroyed vehicles and unowned businesses.
    fn inventory_slot(&mut self, id: &ContainerId) -> Result<&mut Inventory, EconomyError> {
        match id {
            ContainerId::Player => Ok(&mut self.player.inventory),
            ContainerId::Vehicle(idx) => {
                let vehicle = self
                    .player
                    .stored_vehicles
                    .get_mut(*idx)
                    .ok_or_else(|| EconomyError::not_found(EntityKind::Vehicle, idx.to_string()))?;
                if vehicle.is_destroyed {
                    return Err(EconomyError::VehicleUnavailable(vehicle.model_name.clone()));
                }
                Ok(&mut vehicle.inventory)
            }
            ContainerId::Business(name) => {
                let business = self
                    .businesses
                    .iter_mut()
                    .find(|b| &b.name == name)
                    .ok_or_else(|| EconomyError::not_found(EntityKind::Business, name.as_str()))?;
                if !business.purchased {
                    return Err(EconomyError::NotPurchased(name.clone()));
                }
                Ok(&mut business.inventory)
            }
        }
    }

    /// Move goods; `None` on either side is the void (production or consumption).
    ///
    /// The source inventory is detached while the destination is borrowed and
    /// reattached afterwards, so a failed transfer leaves both untouched.
    pub(crate) fn move_goods(
        &mut self,
        from: Option<&ContainerId>,
        to: Option<&ContainerId>,
        item: &str,
        quantity: u32,
    ) -> Result<(), EconomyError> {
        if from.is_some() && from == to {
            return Err(EconomyError::SameContainer);
        }
        let item = self.catalog.require(item)?.clone();
        if let Some(id) = to {
            self.inventory_slot(id)?;
        }
        let mut detached = match from {
            Some(id) => Some(std::mem::take(self.inventory_slot(id)?)),
            None => None,
        };
        let outcome = match to {
            Some(id) => self
                .inventory_slot(id)
                .and_then(|dest| transfer(detached.as_mut(), Some(dest), &item, quantity)),
            None => transfer(detached.as_mut(), None, &item, quantity),
        };
        if let (Some(id), Some(inventory)) = (from, detached) {
            *self.inventory_slot(id)? = inventory;
        }
        outcome
    }

    fn persist_container(&mut self, id: &ContainerId) {
        match id {
            ContainerId::Player | ContainerId::Vehicle(_) => self.persist_player(),
            ContainerId::Business(_) => self.persist_businesses(),
        }
    }

    /// Move goods between two owned containers. Deposits into a business are
    /// limited to the subtypes it sells.
    pub fn transfer(
        &mut self,
        from: &ContainerId,
        to: &ContainerId,
        item: &str,
        quantity: u32,
    ) -> Result<(), EconomyError> {
        if let ContainerId::Business(name) = to {
            let subtype = &self.catalog.require(item)?.subtype;
            let business = self.business(name)?;
            if !business.sells(subtype) {
                return Err(EconomyError::UnsupportedItemType {
                    business: name.clone(),
                    subtype: subtype.clone(),
                });
            }
        }
        self.move_goods(Some(from), Some(to), item, quantity)?;
        debug!(?from, ?to, item, quantity, "goods transferred");
        self.persist_container(from);
        let same_table = matches!(
            (from, to),
            (ContainerId::Business(_), ContainerId::Business(_))
                | (
                    ContainerId::Player | ContainerId::Vehicle(_),
                    ContainerId::Player | ContainerId::Vehicle(_)
                )
        );
        if !same_table {
            self.persist_container(to);
        }
        Ok(())
    }

    pub fn deposit_into_business(
        &mut self,
        business: &str,
        item: &str,
        quantity: u32,
    ) -> Result<(), EconomyError> {
        self.transfer(
            &ContainerId::Player,
            &ContainerId::Business(business.to_string()),
            item,
            quantity,
        )
    }

    pub fn withdraw_from_business(
        &mut self,
        business: &str,
        item: &str,
        quantity: u32,
    ) -> Result<(), EconomyError> {
        self.transfer(
            &ContainerId::Business(business.to_string()),
            &ContainerId::Player,
            item,
            quantity,
        )
    }

    pub fn deposit_into_vehicle(
        &mut self,
        vehicle: usize,
        item: &str,
        quantity: u32,
    ) -> Result<(), EconomyError> {
        self.transfer(&ContainerId::Player, &ContainerId::Vehicle(vehicle), item, quantity)
    }

    pub fn withdraw_from_vehicle(
        &mut self,
        vehicle: usize,
        item: &str,
        quantity: u32,
    ) -> Result<(), EconomyError> {
        self.transfer(&ContainerId::Vehicle(vehicle), &ContainerId::Player, item, quantity)
    }

    /// Buy from a market seller at half the market price. Returns the cost.
    pub fn buy_from_seller(&mut self, item: &str, quantity: u32) -> Result<Money, EconomyError> {
        let cost = seller_cost(self.catalog.require(item)?.price, quantity)?;
        self.player.ensure_funds(cost)?;
        self.move_goods(None, Some(&ContainerId::Player), item, quantity)?;
        self.player.debit(cost)?;
        debug!(item, quantity, cost = %cost, "bought from seller");
        self.persist_player();
        Ok(cost)
    }
}

use std::collections::BTreeMap;

use persistence::Store;
use rust_decimal::Decimal;
use tracing::info;
use tycoon_core::{EconomyError, EntityKind, Inventory, Money, VehicleRecord};
use tycoon_econ::{
    format_money, insurance_cost, vehicle_mod_cost, vehicle_storage_upgrade_cost,
    VEHICLE_STORAGE_STEP,
};

use crate::Economy;

impl<S: Store> Economy<S> {
    pub fn vehicle(&self, idx: usize) -> Result<&VehicleRecord, EconomyError> {
        self.player
            .stored_vehicles
            .get(idx)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Vehicle, idx.to_string()))
    }

    fn vehicle_mut(&mut self, idx: usize) -> Result<&mut VehicleRecord, EconomyError> {
        self.player
            .stored_vehicles
            .get_mut(idx)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Vehicle, idx.to_string()))
    }

    /// A vehicle that is not destroyed.
    fn usable_vehicle(&self, idx: usize) -> Result<&VehicleRecord, EconomyError> {
        let vehicle = self.vehicle(idx)?;
        if vehicle.is_destroyed {
            return Err(EconomyError::VehicleUnavailable(vehicle.model_name.clone()));
        }
        Ok(vehicle)
    }

    /// Buy a dealership model. Returns the new vehicle's index.
    pub fn buy_vehicle(&mut self, model: &str) -> Result<usize, EconomyError> {
        let entry = self
            .dealership
            .iter()
            .find(|d| d.model_name == model)
            .ok_or_else(|| EconomyError::not_found(EntityKind::DealershipModel, model))?
            .clone();
        self.player.debit(entry.price)?;
        self.player.stored_vehicles.push(VehicleRecord {
            model_name: entry.model_name.clone(),
            price: entry.price,
            in_use: false,
            is_destroyed: false,
            inventory: Inventory::new(entry.class.storage_capacity()),
            mods: BTreeMap::new(),
            primary_color: 0,
            secondary_color: 0,
            pearlescent_color: 0,
        });
        info!(model, class = ?entry.class, price = %entry.price, "vehicle bought");
        self.notify(format!("You bought a {model} for ${}", format_money(entry.price)));
        self.persist_player();
        Ok(self.player.stored_vehicles.len() - 1)
    }

    /// +10 storage for a fifth of the vehicle price.
    pub fn upgrade_vehicle_storage(&mut self, idx: usize) -> Result<Money, EconomyError> {
        let vehicle = self.usable_vehicle(idx)?;
        let cost = vehicle_storage_upgrade_cost(vehicle.price);
        let capacity = vehicle
            .inventory
            .capacity()
            .checked_add(Decimal::from(VEHICLE_STORAGE_STEP))
            .ok_or(EconomyError::Overflow)?;
        self.player.debit(cost)?;
        self.vehicle_mut(idx)?.inventory.set_capacity(capacity);
        self.persist_player();
        Ok(cost)
    }

    pub fn report_vehicle_destroyed(&mut self, idx: usize) -> Result<(), EconomyError> {
        let vehicle = self.vehicle_mut(idx)?;
        vehicle.is_destroyed = true;
        vehicle.in_use = false;
        info!(vehicle = idx, "vehicle destroyed");
        self.persist_player();
        Ok(())
    }

    /// Pay the insurance (a tenth of the price) to get a destroyed vehicle back.
    pub fn recover_vehicle(&mut self, idx: usize) -> Result<Money, EconomyError> {
        let vehicle = self.vehicle(idx)?;
        if !vehicle.is_destroyed {
            return Err(EconomyError::VehicleIntact(vehicle.model_name.clone()));
        }
        let cost = insurance_cost(vehicle.price);
        self.player.debit(cost)?;
        self.vehicle_mut(idx)?.is_destroyed = false;
        self.persist_player();
        Ok(cost)
    }

    pub fn set_vehicle_in_use(&mut self, idx: usize, in_use: bool) -> Result<(), EconomyError> {
        self.usable_vehicle(idx)?;
        self.vehicle_mut(idx)?.in_use = in_use;
        self.persist_player();
        Ok(())
    }

    /// Apply `option` in mod `slot`; -1 restores the stock part for free.
    pub fn apply_vehicle_mod(
        &mut self,
        idx: usize,
        slot: u32,
        option: i32,
    ) -> Result<Money, EconomyError> {
        self.usable_vehicle(idx)?;
        let cost = vehicle_mod_cost(slot, option);
        self.player.debit(cost)?;
        self.vehicle_mut(idx)?.mods.insert(slot, option);
        self.persist_player();
        Ok(cost)
    }

    pub fn set_vehicle_colors(
        &mut self,
        idx: usize,
        primary: i32,
        secondary: i32,
        pearlescent: i32,
    ) -> Result<(), EconomyError> {
        self.usable_vehicle(idx)?;
        let vehicle = self.vehicle_mut(idx)?;
        vehicle.primary_color = primary;
        vehicle.secondary_color = secondary;
        vehicle.pearlescent_color = pearlescent;
        self.persist_player();
        Ok(())
    }
}

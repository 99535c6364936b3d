//! Serializable action table for hosts that dispatch menu selections.

use chrono::{DateTime, Utc};
use persistence::Store;
use serde::{Deserialize, Serialize};
use tycoon_core::{EconomyError, Money, UpgradeKind};

use crate::ledger::ContainerId;
use crate::Economy;

/// One inward action, keyed by entity and action kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    BuyFromSeller {
        item: String,
        quantity: u32,
    },
    Craft {
        recipe: String,
        #[serde(default)]
        location: Option<String>,
    },
    StartHarvest {
        source: String,
    },
    StopHarvest,
    Transfer {
        from: ContainerId,
        to: ContainerId,
        item: String,
        quantity: u32,
    },
    DepositIntoBusiness {
        business: String,
        item: String,
        quantity: u32,
    },
    WithdrawFromBusiness {
        business: String,
        item: String,
        quantity: u32,
    },
    DepositIntoVehicle {
        vehicle: usize,
        item: String,
        quantity: u32,
    },
    WithdrawFromVehicle {
        vehicle: usize,
        item: String,
        quantity: u32,
    },
    BuyBusiness {
        business: String,
    },
    CollectRevenue {
        business: String,
    },
    UpgradeBusiness {
        business: String,
        kind: UpgradeKind,
    },
    UpgradeBusinessType {
        business_type: String,
    },
    EnableAutomaticRefill {
        business: String,
    },
    BuyVehicle {
        model: String,
    },
    UpgradeVehicleStorage {
        vehicle: usize,
    },
    ReportVehicleDestroyed {
        vehicle: usize,
    },
    RecoverVehicle {
        vehicle: usize,
    },
    SetVehicleInUse {
        vehicle: usize,
        in_use: bool,
    },
    ApplyVehicleMod {
        vehicle: usize,
        slot: u32,
        option: i32,
    },
    SetVehicleColors {
        vehicle: usize,
        primary: i32,
        secondary: i32,
        pearlescent: i32,
    },
}

/// Result of a successful [`Command`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Outcome {
    Done,
    Spent(Money),
    Collected(Money),
    Vehicle(usize),
}

impl<S: Store> Economy<S> {
    pub fn execute(&mut self, command: Command, now: DateTime<Utc>) -> Result<Outcome, EconomyError> {
        use Command::*;
        let outcome = match command {
            BuyFromSeller { item, quantity } => Outcome::Spent(self.buy_from_seller(&item, quantity)?),
            Craft { recipe, location } => {
                self.craft(&recipe, location.as_deref())?;
                Outcome::Done
            }
            StartHarvest { source } => {
                self.start_harvest(&source, now)?;
                Outcome::Done
            }
            StopHarvest => {
                self.stop_harvest();
                Outcome::Done
            }
            Transfer {
                from,
                to,
                item,
                quantity,
            } => {
                self.transfer(&from, &to, &item, quantity)?;
                Outcome::Done
            }
            DepositIntoBusiness {
                business,
                item,
                quantity,
            } => {
                self.deposit_into_business(&business, &item, quantity)?;
                Outcome::Done
            }
            WithdrawFromBusiness {
                business,
                item,
                quantity,
            } => {
                self.withdraw_from_business(&business, &item, quantity)?;
                Outcome::Done
            }
            DepositIntoVehicle {
                vehicle,
                item,
                quantity,
            } => {
                self.deposit_into_vehicle(vehicle, &item, quantity)?;
                Outcome::Done
            }
            WithdrawFromVehicle {
                vehicle,
                item,
                quantity,
            } => {
                self.withdraw_from_vehicle(vehicle, &item, quantity)?;
                Outcome::Done
            }
            BuyBusiness { business } => {
                let price = self.business(&business)?.price;
                self.buy_business(&business, now)?;
                Outcome::Spent(price)
            }
            CollectRevenue { business } => Outcome::Collected(self.collect_revenue(&business)?),
            UpgradeBusiness { business, kind } => {
                Outcome::Spent(self.upgrade_business(&business, kind)?)
            }
            UpgradeBusinessType { business_type } => {
                Outcome::Spent(self.upgrade_business_type(&business_type)?)
            }
            EnableAutomaticRefill { business } => {
                Outcome::Spent(self.enable_automatic_refill(&business)?)
            }
            BuyVehicle { model } => Outcome::Vehicle(self.buy_vehicle(&model)?),
            UpgradeVehicleStorage { vehicle } => {
                Outcome::Spent(self.upgrade_vehicle_storage(vehicle)?)
            }
            ReportVehicleDestroyed { vehicle } => {
                self.report_vehicle_destroyed(vehicle)?;
                Outcome::Done
            }
            RecoverVehicle { vehicle } => Outcome::Spent(self.recover_vehicle(vehicle)?),
            SetVehicleInUse { vehicle, in_use } => {
                self.set_vehicle_in_use(vehicle, in_use)?;
                Outcome::Done
            }
            ApplyVehicleMod {
                vehicle,
                slot,
                option,
            } => Outcome::Spent(self.apply_vehicle_mod(vehicle, slot, option)?),
            SetVehicleColors {
                vehicle,
                primary,
                secondary,
                pearlescent,
            } => {
                self.set_vehicle_colors(vehicle, primary, secondary, pearlescent)?;
                Outcome::Done
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_read_from_json_lines() {
        let cmd: Command =
            serde_json::from_str(r#"{"action":"upgrade_business","business":"Farm1","kind":"Stock"}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::UpgradeBusiness {
                business: "Farm1".to_string(),
                kind: UpgradeKind::Stock
            }
        );
        let cmd: Command = serde_json::from_str(
            r#"{"action":"transfer","from":"Player","to":{"Business":"Farm1"},"item":"Wood","quantity":2}"#,
        )
        .unwrap();
        assert!(matches!(cmd, Command::Transfer { to: ContainerId::Business(_), .. }));
        let cmd: Command = serde_json::from_str(r#"{"action":"craft","recipe":"Plank"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Craft {
                recipe: "Plank".to_string(),
                location: None
            }
        );
        let cmd: Command = serde_json::from_str(r#"{"action":"stop_harvest"}"#).unwrap();
        assert_eq!(cmd, Command::StopHarvest);
    }
}

use std::collections::BTreeMap;

use persistence::Store;
use rust_decimal::Decimal;
use tracing::info;
use tycoon_core::{transfer, EconomyError, EntityKind, Recipe};

use crate::Economy;

impl<S: Store> Economy<S> {
    pub fn recipe(&self, result: &str) -> Result<&Recipe, EconomyError> {
        self.recipes
            .iter()
            .find(|r| r.result == result)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Recipe, result))
    }

    /// Ingredient totals per item; a recipe may list an item more than once.
    fn requirements(recipe: &Recipe) -> BTreeMap<&str, u32> {
        let mut needs: BTreeMap<&str, u32> = BTreeMap::new();
        for ing in &recipe.ingredients {
            *needs.entry(ing.item.as_str()).or_insert(0) += ing.quantity;
        }
        needs
    }

    /// Checks everything [`Economy::craft`] checks, without changing state.
    pub fn check_craft(&self, result: &str, location: Option<&str>) -> Result<(), EconomyError> {
        let recipe = self.recipe(result)?;
        if let Some(name) = location {
            let loc = self
                .crafting_locations
                .iter()
                .find(|l| l.name == name)
                .ok_or_else(|| EconomyError::not_found(EntityKind::CraftingLocation, name))?;
            if !loc.offers(result) {
                return Err(EconomyError::not_found(EntityKind::Recipe, result));
            }
        }
        let inventory = &self.player.inventory;
        let mut freed = Decimal::ZERO;
        for (item, qty) in Self::requirements(recipe) {
            if inventory.quantity_of(item) < qty {
                return Err(EconomyError::MissingIngredients {
                    recipe: result.to_string(),
                    item: item.to_string(),
                });
            }
            freed = freed
                .checked_add(self.catalog.require(item)?.load_of(qty)?)
                .ok_or(EconomyError::Overflow)?;
        }
        let produced = self.catalog.require(&recipe.result)?.weight;
        let free = inventory
            .free()
            .checked_add(freed)
            .ok_or(EconomyError::Overflow)?;
        if produced > free {
            return Err(EconomyError::CapacityExceeded {
                needed: produced,
                free,
            });
        }
        Ok(())
    }

    pub fn can_craft(&self, result: &str) -> bool {
        self.check_craft(result, None).is_ok()
    }

    /// Consume the ingredients of `result` and produce one unit of it.
    ///
    /// Works on a copy of the player inventory that is swapped in
    /// only when every step succeeded.
    pub fn craft(&mut self, result: &str, location: Option<&str>) -> Result<(), EconomyError> {
        self.check_craft(result, location)?;
        let recipe = self.recipe(result)?;
        let mut working = self.player.inventory.clone();
        for (item, qty) in Self::requirements(recipe) {
            transfer(Some(&mut working), None, self.catalog.require(item)?, qty)?;
        }
        transfer(None, Some(&mut working), self.catalog.require(result)?, 1)?;
        self.player.inventory = working;
        info!(recipe = result, ?location, "crafted");
        self.notify(format!("+1 {result}"));
        self.persist_player();
        Ok(())
    }
}

use chrono::{DateTime, Duration, TimeZone, Utc};
use persistence::{MemoryStore, StaticTables};
use rust_decimal::Decimal;
use tycoon_core::{
    Business, CraftingLocation, DealershipEntry, EconomyConfig, EconomyError, HarvestSource,
    Ingredient, Inventory, InventoryRecord, Item, MarketEvent, PlayerLedger, Position, Recipe,
    UpgradeKind, VehicleClass,
};
use tycoon_econ::{RestockLevel, ScriptedSource};

use crate::*;

fn d(v: i64) -> Decimal {
    Decimal::new(v, 0)
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

fn item(name: &str, subtype: &str, price: i64, weight: Decimal) -> Item {
    Item {
        name: name.to_string(),
        description: String::new(),
        item_type: "Goods".to_string(),
        subtype: subtype.to_string(),
        price: d(price),
        weight,
        lower_limit: d(price / 2),
        upper_limit: d(price * 5),
        price_history: vec![],
    }
}

fn business(name: &str, kind: &str, tier: u32, price: i64, sells: &str) -> Business {
    Business {
        name: name.to_string(),
        position: Position::default(),
        icon: 1,
        purchased: false,
        price: d(price),
        revenue: Decimal::ZERO,
        inventory: Inventory::new(d(100)),
        price_multiplier: Decimal::ONE,
        interval_secs: 30,
        stock_level: 0,
        item_price_level: 0,
        interval_level: 0,
        business_type: kind.to_string(),
        sellable_subtypes: vec![sells.to_string()],
        automatic_refill: false,
        tier,
    }
}

fn fixture() -> MemoryStore {
    MemoryStore {
        items: vec![
            item("Wood", "Lumber", 100, d(1)),
            item("Plank", "Lumber", 300, d(2)),
            item("Ore", "Metal", 80, d(2)),
            item("Bread", "Food", 20, Decimal::new(5, 1)),
        ],
        businesses: vec![
            business("Farm1", "Farm", 1, 1000, "Food"),
            business("Farm2", "Farm", 1, 1000, "Food"),
            business("Foundry", "Foundry", 2, 10_000, "Metal"),
        ],
        player: None,
        tables: StaticTables {
            events: vec![MarketEvent {
                name: "Storm".to_string(),
                affected_subtypes: vec!["Lumber".to_string()],
                impact: d(-15),
                news_message: "A storm flattened the forests.".to_string(),
            }],
            recipes: vec![Recipe {
                result: "Plank".to_string(),
                ingredients: vec![Ingredient {
                    item: "Wood".to_string(),
                    quantity: 2,
                }],
            }],
            crafting_locations: vec![CraftingLocation {
                name: "Workshop".to_string(),
                position: Position::default(),
                icon: 566,
                tier: 1,
                recipes: vec!["Plank".to_string()],
            }],
            harvest_sources: vec![HarvestSource {
                name: "Forest".to_string(),
                position: Position::default(),
                item: "Wood".to_string(),
                icon: 77,
                anim_dict: "dict".to_string(),
                anim_name: "anim".to_string(),
            }],
            dealership: vec![DealershipEntry {
                model_name: "Mule".to_string(),
                category: "Vans".to_string(),
                class: VehicleClass::Commercial,
                price: d(27_000),
            }],
        },
        ..MemoryStore::default()
    }
}

fn rich(store: &mut MemoryStore, money: i64) {
    store.player = Some(PlayerLedger::new(d(money), d(50), ["Farm", "Foundry"]));
}

fn open(store: MemoryStore, rng: ScriptedSource) -> Economy<MemoryStore> {
    Economy::load(store, EconomyConfig::default(), t0(), Box::new(rng)).unwrap()
}

#[test]
fn load_creates_fresh_ledger() {
    let eco = open(fixture(), ScriptedSource::new());
    let player = eco.player();
    assert_eq!(player.money, d(5500));
    assert_eq!(player.inventory.capacity(), d(50));
    assert_eq!(player.business_upgrades.get("Farm"), Some(&0));
    assert_eq!(player.business_upgrades.get("Foundry"), Some(&0));
    assert_eq!(eco.active_tier(), Some(1));
    assert_eq!(eco.visible_businesses().count(), 2);
}

#[test]
fn load_rejects_bad_tables() {
    let mut store = fixture();
    store.tables.events.clear();
    let err = Economy::load(store, EconomyConfig::default(), t0(), Box::new(ScriptedSource::new()));
    assert!(matches!(err, Err(EconomyError::Configuration(_))));

    let mut store = fixture();
    store.businesses[0].inventory = Inventory::from_parts(
        vec![InventoryRecord {
            item: "Gold".to_string(),
            quantity: 1,
        }],
        d(1),
        d(100),
    );
    let err = Economy::load(store, EconomyConfig::default(), t0(), Box::new(ScriptedSource::new()));
    assert!(matches!(err, Err(EconomyError::Configuration(_))));
}

#[test]
fn load_skips_bad_items_and_resyncs_weights() {
    let mut store = fixture();
    let mut broken = item("Gold", "Metal", 100, d(1));
    broken.price = d(10_000);
    store.items.push(broken);
    store.businesses[0].inventory = Inventory::from_parts(
        vec![InventoryRecord {
            item: "Bread".to_string(),
            quantity: 2,
        }],
        d(99),
        d(100),
    );
    let mut eco = open(store, ScriptedSource::new());
    assert!(eco.item("Gold").is_err());
    assert_eq!(eco.business("Farm1").unwrap().inventory.weight(), d(1));
    let notes = eco.take_notifications();
    assert!(notes.iter().any(|n| n.starts_with("Skipped catalog entry")));
    assert!(eco.take_notifications().is_empty());
}

#[test]
fn buying_a_business_conserves_money() {
    let mut eco = open(fixture(), ScriptedSource::new());
    eco.buy_business("Farm1", t0()).unwrap();
    assert_eq!(eco.player().money, d(4500));
    assert!(eco.business("Farm1").unwrap().purchased);
    assert_eq!(
        eco.buy_business("Farm1", t0()),
        Err(EconomyError::AlreadyPurchased("Farm1".to_string()))
    );
    assert_eq!(eco.player().money, d(4500));
    let store = eco.store();
    assert!(store.businesses.iter().any(|b| b.name == "Farm1" && b.purchased));
    assert_eq!(store.player.as_ref().unwrap().money, d(4500));
}

#[test]
fn higher_tiers_wait_for_lower_ones() {
    let mut store = fixture();
    rich(&mut store, 100_000);
    let mut eco = open(store, ScriptedSource::new());
    assert!(matches!(
        eco.buy_business("Foundry", t0()),
        Err(EconomyError::TierLocked { tier: 2, .. })
    ));
    eco.buy_business("Farm1", t0()).unwrap();
    assert_eq!(eco.active_tier(), Some(1));
    eco.buy_business("Farm2", t0()).unwrap();
    assert_eq!(eco.active_tier(), Some(2));
    eco.buy_business("Foundry", t0()).unwrap();
    assert_eq!(eco.active_tier(), Some(2));
    assert_eq!(eco.player().money, d(88_000));
}

#[test]
fn insufficient_funds_leave_state_untouched() {
    let mut store = fixture();
    rich(&mut store, 999);
    let mut eco = open(store, ScriptedSource::new());
    assert!(matches!(
        eco.buy_business("Farm1", t0()),
        Err(EconomyError::InsufficientFunds { .. })
    ));
    assert!(!eco.business("Farm1").unwrap().purchased);
    assert_eq!(eco.store().writes, 0);
}

#[test]
fn upgrade_costs_scale_with_level() {
    let mut store = fixture();
    rich(&mut store, 100_000);
    let mut eco = open(store, ScriptedSource::new());
    eco.buy_business("Farm1", t0()).unwrap();
    assert_eq!(eco.upgrade_quote("Farm1", UpgradeKind::Stock).unwrap(), d(500));
    assert_eq!(eco.upgrade_business("Farm1", UpgradeKind::Stock).unwrap(), d(500));
    assert_eq!(eco.upgrade_quote("Farm1", UpgradeKind::Stock).unwrap(), d(5500));
    assert_eq!(eco.business("Farm1").unwrap().inventory.capacity(), d(110));
    assert_eq!(
        eco.upgrade_business("Farm2", UpgradeKind::Interval),
        Err(EconomyError::NotPurchased("Farm2".to_string()))
    );
}

#[test]
fn type_upgrade_raises_every_member() {
    let mut store = fixture();
    rich(&mut store, 100_000);
    let mut eco = open(store, ScriptedSource::new());
    assert_eq!(eco.type_upgrade_quote("Farm").unwrap(), d(20_000));
    eco.upgrade_business_type("Farm").unwrap();
    assert_eq!(eco.type_upgrade_quote("Farm").unwrap(), d(40_000));
    assert_eq!(eco.player().type_level("Farm"), 1);
    for name in ["Farm1", "Farm2"] {
        assert_eq!(eco.business(name).unwrap().price_multiplier, Decimal::new(125, 2));
    }
    assert_eq!(eco.business("Foundry").unwrap().price_multiplier, Decimal::ONE);
    assert!(eco.type_upgrade_quote("Bank").is_err());
}

#[test]
fn stocked_business_sells_and_revenue_is_collected() {
    let mut eco = open(fixture(), ScriptedSource::new().with_quantities([2]));
    eco.buy_business("Farm1", t0()).unwrap();
    assert_eq!(eco.buy_from_seller("Bread", 4).unwrap(), d(40));
    eco.deposit_into_business("Farm1", "Bread", 4).unwrap();
    assert_eq!(eco.player().inventory.weight(), Decimal::ZERO);
    assert_eq!(eco.restock_level("Farm1").unwrap(), RestockLevel::Low);

    assert!(eco.tick(at(29)).sales.is_empty());
    let report = eco.tick(at(30));
    assert_eq!(report.sales.len(), 1);
    assert_eq!(report.sales[0].1.quantity, 2);
    let farm = eco.business("Farm1").unwrap();
    assert_eq!(farm.revenue, d(40));
    assert_eq!(farm.inventory.quantity_of("Bread"), 2);
    assert_eq!(farm.inventory.weight(), d(1));

    assert_eq!(eco.collect_revenue("Farm1").unwrap(), d(40));
    assert_eq!(eco.business("Farm1").unwrap().revenue, Decimal::ZERO);
    assert_eq!(eco.player().money, d(4500));
}

#[test]
fn empty_manual_business_earns_nothing_but_timer_restarts() {
    let mut eco = open(fixture(), ScriptedSource::new());
    eco.buy_business("Farm1", t0()).unwrap();
    assert!(eco.tick(at(30)).sales.is_empty());
    eco.buy_from_seller("Bread", 2).unwrap();
    eco.deposit_into_business("Farm1", "Bread", 2).unwrap();
    assert!(eco.tick(at(45)).sales.is_empty());
    assert_eq!(eco.tick(at(60)).sales.len(), 1);
}

#[test]
fn automatic_refill_sells_without_stock() {
    let mut store = fixture();
    rich(&mut store, 2_000_000);
    let mut eco = open(store, ScriptedSource::new().with_quantities([5]));
    eco.buy_business("Farm1", t0()).unwrap();
    assert_eq!(eco.enable_automatic_refill("Farm1").unwrap(), d(1_000_000));
    assert_eq!(
        eco.enable_automatic_refill("Farm1"),
        Err(EconomyError::AlreadyAutomatic("Farm1".to_string()))
    );
    let report = eco.tick(at(30));
    assert_eq!(report.sales[0].1.item, "Bread");
    assert_eq!(eco.business("Farm1").unwrap().revenue, d(100));
    assert_eq!(eco.restock_level("Farm1").unwrap(), RestockLevel::Empty);
}

#[test]
fn deposits_respect_sell_list_and_capacity() {
    let mut eco = open(fixture(), ScriptedSource::new());
    eco.buy_business("Farm1", t0()).unwrap();
    eco.buy_from_seller("Wood", 3).unwrap();
    assert_eq!(
        eco.deposit_into_business("Farm1", "Wood", 1),
        Err(EconomyError::UnsupportedItemType {
            business: "Farm1".to_string(),
            subtype: "Lumber".to_string()
        })
    );
    assert!(matches!(
        eco.deposit_into_business("Farm2", "Bread", 1),
        Err(EconomyError::UnsupportedItemType { .. }) | Err(EconomyError::NotPurchased(_))
    ));
    let money = eco.player().money;
    assert!(matches!(
        eco.buy_from_seller("Wood", 48),
        Err(EconomyError::CapacityExceeded { .. })
    ));
    assert_eq!(eco.player().money, money);
    assert_eq!(eco.player().inventory.quantity_of("Wood"), 3);
    assert_eq!(
        eco.transfer(&ContainerId::Player, &ContainerId::Player, "Wood", 1),
        Err(EconomyError::SameContainer)
    );
}

#[test]
fn crafting_is_all_or_nothing() {
    let mut eco = open(fixture(), ScriptedSource::new());
    eco.buy_from_seller("Wood", 3).unwrap();
    assert!(eco.can_craft("Plank"));
    eco.craft("Plank", Some("Workshop")).unwrap();
    let inv = &eco.player().inventory;
    assert_eq!(inv.quantity_of("Wood"), 1);
    assert_eq!(inv.quantity_of("Plank"), 1);
    assert_eq!(inv.weight(), d(3));

    let before = eco.player().clone();
    assert_eq!(
        eco.craft("Plank", None),
        Err(EconomyError::MissingIngredients {
            recipe: "Plank".to_string(),
            item: "Wood".to_string()
        })
    );
    assert_eq!(eco.player(), &before);
    assert!(eco.craft("Chair", None).is_err());
    assert!(eco.craft("Plank", Some("Kitchen")).is_err());
}

#[test]
fn crafting_checks_room_for_the_result() {
    let mut eco = open(fixture(), ScriptedSource::new());
    eco.buy_from_seller("Wood", 2).unwrap();
    eco.buy_from_seller("Ore", 24).unwrap();
    assert_eq!(eco.player().inventory.free(), Decimal::ZERO);
    eco.craft("Plank", None).unwrap();
    assert_eq!(eco.player().inventory.weight(), d(50));
}

#[test]
fn harvest_yields_until_inventory_is_full() {
    let mut store = fixture();
    rich(&mut store, 100_000);
    let mut eco = open(store, ScriptedSource::new());
    eco.buy_from_seller("Ore", 24).unwrap();
    eco.start_harvest("Forest", t0()).unwrap();
    assert_eq!(eco.tick(at(9)).harvested, None);
    assert_eq!(eco.tick(at(10)).harvested.as_deref(), Some("Wood"));
    assert_eq!(eco.tick(at(20)).harvested.as_deref(), Some("Wood"));
    assert_eq!(eco.tick(at(30)).harvested, None);
    assert!(eco.harvesting().is_none());
    let notes = eco.take_notifications();
    assert!(notes.iter().any(|n| n == "+1 Wood"));
    assert_eq!(notes.last().map(String::as_str), Some(INVENTORY_FULL));
    assert!(eco.start_harvest("Quarry", at(30)).is_err());
}

#[test]
fn price_and_event_timers_fire_in_order() {
    let mut eco = open(fixture(), ScriptedSource::new().with_picks([0]));
    let report = eco.tick(at(450));
    assert!(report.prices.is_some());
    assert!(report.event.is_none());
    assert!(eco.take_notifications().contains(&PRICES_EVOLVED.to_string()));
    assert_eq!(eco.store().items.len(), 4);

    let report = eco.tick(at(900));
    assert_eq!(report.event.as_deref(), Some("Storm"));
    assert_eq!(report.prices.unwrap().consumed_event, None);
    assert_eq!(eco.current_event().unwrap().name, "Storm");
    let notes = eco.take_notifications();
    assert!(notes.iter().any(|n| n.contains("#CC7272") && n.contains("-15%")));

    let report = eco.tick(at(1350));
    assert_eq!(report.prices.unwrap().consumed_event.as_deref(), Some("Storm"));
    assert!(eco.current_event().is_none());
    assert_eq!(eco.item("Wood").unwrap().price, d(85));
    assert_eq!(eco.item("Plank").unwrap().price, d(300));
    assert_eq!(eco.item("Wood").unwrap().price_history.len(), 3);
}

#[test]
fn storage_failure_warns_without_rollback() {
    let mut eco = open(fixture(), ScriptedSource::new());
    eco.store_mut().fail_writes = true;
    eco.buy_business("Farm1", t0()).unwrap();
    assert_eq!(eco.player().money, d(4500));
    let notes = eco.take_notifications();
    assert!(notes
        .iter()
        .any(|n| n.starts_with("Warning: persistence error: player ledger could not be saved")));
}

#[test]
fn refill_cost_beyond_decimal_range_is_refused() {
    let mut store = fixture();
    store.businesses[0].purchased = true;
    store.businesses[0].price = Decimal::from_i128_with_scale(10i128.pow(28), 0);
    rich(&mut store, 1_000_000);
    let mut eco = open(store, ScriptedSource::new());
    assert_eq!(
        eco.enable_automatic_refill("Farm1"),
        Err(EconomyError::Overflow)
    );
    assert!(!eco.business("Farm1").unwrap().automatic_refill);
    assert_eq!(eco.player().money, d(1_000_000));
    assert_eq!(
        eco.upgrade_business_type("Farm"),
        Err(EconomyError::Overflow)
    );
}

#[test]
fn collecting_past_the_balance_limit_keeps_both_sides() {
    let mut store = fixture();
    store.businesses[0].purchased = true;
    store.businesses[0].revenue = Decimal::MAX;
    store.player = Some(PlayerLedger::new(Decimal::MAX, d(50), ["Farm", "Foundry"]));
    let mut eco = open(store, ScriptedSource::new());
    assert_eq!(eco.collect_revenue("Farm1"), Err(EconomyError::Overflow));
    assert_eq!(eco.business("Farm1").unwrap().revenue, Decimal::MAX);
    assert_eq!(eco.player().money, Decimal::MAX);
}

#[test]
fn vehicle_lifecycle() {
    let mut store = fixture();
    rich(&mut store, 200_000);
    let mut eco = open(store, ScriptedSource::new());
    let idx = eco.buy_vehicle("Mule").unwrap();
    assert_eq!(eco.vehicle(idx).unwrap().inventory.capacity(), d(1000));
    assert_eq!(eco.upgrade_vehicle_storage(idx).unwrap(), d(5400));
    assert_eq!(eco.vehicle(idx).unwrap().inventory.capacity(), d(1010));

    eco.buy_from_seller("Wood", 5).unwrap();
    eco.deposit_into_vehicle(idx, "Wood", 5).unwrap();
    eco.withdraw_from_vehicle(idx, "Wood", 2).unwrap();
    assert_eq!(eco.vehicle(idx).unwrap().inventory.quantity_of("Wood"), 3);
    assert_eq!(eco.player().inventory.quantity_of("Wood"), 2);

    assert_eq!(
        eco.recover_vehicle(idx),
        Err(EconomyError::VehicleIntact("Mule".to_string()))
    );
    eco.report_vehicle_destroyed(idx).unwrap();
    assert_eq!(
        eco.deposit_into_vehicle(idx, "Wood", 1),
        Err(EconomyError::VehicleUnavailable("Mule".to_string()))
    );
    assert_eq!(eco.recover_vehicle(idx).unwrap(), d(2700));

    assert_eq!(eco.apply_vehicle_mod(idx, 11, 2).unwrap(), d(40_000));
    assert_eq!(eco.apply_vehicle_mod(idx, 11, -1).unwrap(), Decimal::ZERO);
    assert_eq!(eco.apply_vehicle_mod(idx, 0, 3).unwrap(), d(2500));
    eco.set_vehicle_colors(idx, 1, 2, 3).unwrap();
    let v = eco.vehicle(idx).unwrap();
    assert_eq!(v.mods.get(&11), Some(&-1));
    assert_eq!((v.primary_color, v.secondary_color, v.pearlescent_color), (1, 2, 3));
    assert!(eco.buy_vehicle("Tank").is_err());
}

#[test]
fn execute_dispatches_commands() {
    let mut eco = open(fixture(), ScriptedSource::new());
    let out = eco
        .execute(
            Command::BuyBusiness {
                business: "Farm1".to_string(),
            },
            t0(),
        )
        .unwrap();
    assert_eq!(out, Outcome::Spent(d(1000)));
    let out = eco
        .execute(
            Command::BuyFromSeller {
                item: "Bread".to_string(),
                quantity: 2,
            },
            t0(),
        )
        .unwrap();
    assert_eq!(out, Outcome::Spent(d(20)));
    eco.execute(
        Command::Transfer {
            from: ContainerId::Player,
            to: ContainerId::Business("Farm1".to_string()),
            item: "Bread".to_string(),
            quantity: 2,
        },
        t0(),
    )
    .unwrap();
    assert_eq!(eco.business("Farm1").unwrap().inventory.quantity_of("Bread"), 2);
    let out = eco
        .execute(
            Command::CollectRevenue {
                business: "Farm1".to_string(),
            },
            t0(),
        )
        .unwrap();
    assert_eq!(out, Outcome::Collected(Decimal::ZERO));
}

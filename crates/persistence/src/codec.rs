//! Text codecs for the catalog, the business table and the static tables.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;
use tycoon_core::{
    validate_event, validate_item, Business, CraftingLocation, DealershipEntry, HarvestSource,
    Ingredient, Inventory, InventoryRecord, Item, MarketEvent, Position, Recipe,
};

use crate::StoreError;

/// Header line of the business table.
pub const BUSINESS_HEADER: &str = "Name,X,Y,Z,BlipSprite,Purchased,Price,Revenues,StoreInventory,\
MaxStoreInventory,PriceMultiplier,Interval,StockUpgradeLevel,ItemPriceUpgradeLevel,\
IntervalUpgradeLevel,Type,BusinessInventory,SubTypeItemThatCanBeSold,IsAutomaticRefill,Tier";

/// Number of fields in a business row.
pub const BUSINESS_FIELDS: usize = 20;

const FORBIDDEN: [char; 5] = [',', '|', ':', '\n', '\r'];

/// Catalog rows that parsed, plus a reason for every row that did not.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogLoad {
    pub items: Vec<Item>,
    pub skipped: Vec<String>,
}

struct Row<'a> {
    file: &'a str,
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
    fn new(file: &'a str, line: usize, text: &'a str) -> Self {
        Self {
            file,
            line,
            fields: text.split(',').collect(),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Malformed {
            file: self.file.to_string(),
            line: self.line,
            reason: reason.into(),
        }
    }

    fn expect_len(&self, min: usize) -> Result<(), StoreError> {
        if self.fields.len() < min {
            return Err(self.malformed(format!(
                "expected at least {min} fields, found {}",
                self.fields.len()
            )));
        }
        Ok(())
    }

    fn text(&self, idx: usize) -> Result<&'a str, StoreError> {
        self.fields
            .get(idx)
            .map(|s| s.trim())
            .ok_or_else(|| self.malformed(format!("missing field {idx}")))
    }

    fn parse<T: FromStr>(&self, idx: usize, what: &str) -> Result<T, StoreError> {
        let raw = self.text(idx)?;
        raw.parse()
            .map_err(|_| self.malformed(format!("invalid {what}: {raw:?}")))
    }

    fn decimal(&self, idx: usize, what: &str) -> Result<Decimal, StoreError> {
        let raw = self.text(idx)?;
        Decimal::from_str(raw).map_err(|_| self.malformed(format!("invalid {what}: {raw:?}")))
    }

    fn flag(&self, idx: usize, what: &str) -> Result<bool, StoreError> {
        let raw = self.text(idx)?;
        if raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(self.malformed(format!("invalid {what}: {raw:?}")))
        }
    }

    fn position(&self, first: usize) -> Result<Position, StoreError> {
        Ok(Position {
            x: self.parse(first, "x")?,
            y: self.parse(first + 1, "y")?,
            z: self.parse(first + 2, "z")?,
        })
    }
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('|').map(|s| s.trim().to_string()).collect()
}

fn checked<'a>(value: &'a str, what: &str) -> Result<&'a str, StoreError> {
    if value.contains(FORBIDDEN) {
        return Err(StoreError::Delimiter(format!("{what} {value:?}")));
    }
    Ok(value)
}

fn flag_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Encode one business as a table row (no trailing newline).
pub fn encode_business(b: &Business) -> Result<String, StoreError> {
    let inventory = b
        .inventory
        .records()
        .iter()
        .map(|r| checked(&r.item, "item").map(|name| format!("{name}:{}", r.quantity)))
        .collect::<Result<Vec<_>, _>>()?
        .join("|");
    let subtypes = b
        .sellable_subtypes
        .iter()
        .map(|s| checked(s, "subtype"))
        .collect::<Result<Vec<_>, _>>()?
        .join("|");
    let fields = [
        checked(&b.name, "business name")?.to_string(),
        b.position.x.to_string(),
        b.position.y.to_string(),
        b.position.z.to_string(),
        b.icon.to_string(),
        flag_text(b.purchased).to_string(),
        b.price.to_string(),
        b.revenue.to_string(),
        b.inventory.weight().to_string(),
        b.inventory.capacity().to_string(),
        b.price_multiplier.to_string(),
        b.interval_secs.to_string(),
        b.stock_level.to_string(),
        b.item_price_level.to_string(),
        b.interval_level.to_string(),
        checked(&b.business_type, "business type")?.to_string(),
        inventory,
        subtypes,
        flag_text(b.automatic_refill).to_string(),
        b.tier.to_string(),
    ];
    Ok(fields.join(","))
}

/// Decode one business row; `line` is only used for error context.
pub fn decode_business(text: &str, line: usize) -> Result<Business, StoreError> {
    let row = Row::new("businessdata.csv", line, text);
    if row.fields.len() != BUSINESS_FIELDS {
        return Err(row.malformed(format!(
            "expected {BUSINESS_FIELDS} fields, found {}",
            row.fields.len()
        )));
    }
    let mut records = Vec::new();
    for entry in split_list(row.text(16)?) {
        let (name, qty) = entry
            .rsplit_once(':')
            .ok_or_else(|| row.malformed(format!("inventory entry {entry:?} lacks ':'")))?;
        let quantity = qty
            .trim()
            .parse()
            .map_err(|_| row.malformed(format!("invalid quantity in {entry:?}")))?;
        records.push(InventoryRecord {
            item: name.trim().to_string(),
            quantity,
        });
    }
    Ok(Business {
        name: row.text(0)?.to_string(),
        position: row.position(1)?,
        icon: row.parse(4, "icon")?,
        purchased: row.flag(5, "purchased flag")?,
        price: row.decimal(6, "price")?,
        revenue: row.decimal(7, "revenue")?,
        inventory: Inventory::from_parts(
            records,
            row.decimal(8, "stored weight")?,
            row.decimal(9, "max stored weight")?,
        ),
        price_multiplier: row.decimal(10, "price multiplier")?,
        interval_secs: row.parse(11, "interval")?,
        stock_level: row.parse(12, "stock level")?,
        item_price_level: row.parse(13, "item price level")?,
        interval_level: row.parse(14, "interval level")?,
        business_type: row.text(15)?.to_string(),
        sellable_subtypes: split_list(row.text(17)?),
        automatic_refill: row.flag(18, "automatic refill flag")?,
        tier: row.parse(19, "tier")?,
    })
}

/// Encode the whole business table, header first.
pub fn encode_business_table(businesses: &[Business]) -> Result<String, StoreError> {
    let mut out = String::from(BUSINESS_HEADER);
    out.push('\n');
    for b in businesses {
        out.push_str(&encode_business(b)?);
        out.push('\n');
    }
    Ok(out)
}

/// Decode the business table; the first line is the header.
pub fn decode_business_table(text: &str) -> Result<Vec<Business>, StoreError> {
    data_lines(text)
        .skip(1)
        .map(|(line, row)| decode_business(row, line))
        .collect()
}

/// Decode the catalog, skipping rows that are unparseable, out of bounds or duplicated.
pub fn decode_catalog(text: &str) -> Result<CatalogLoad, StoreError> {
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(text).map_err(|e| StoreError::Json {
            file: "items.json".to_string(),
            source: e,
        })?;
    let mut load = CatalogLoad::default();
    for (idx, value) in rows.into_iter().enumerate() {
        let verdict = serde_json::from_value::<Item>(value)
            .map_err(|e| e.to_string())
            .and_then(|item| validate_item(&item).map(|_| item).map_err(|e| e.to_string()))
            .and_then(|item| {
                if load.items.iter().any(|i| i.name == item.name) {
                    Err(format!("duplicate item {}", item.name))
                } else {
                    Ok(item)
                }
            });
        match verdict {
            Ok(item) => load.items.push(item),
            Err(reason) => {
                warn!(row = idx, %reason, "skipping catalog row");
                load.skipped.push(format!("item #{idx}: {reason}"));
            }
        }
    }
    Ok(load)
}

pub fn encode_catalog(items: &[Item]) -> Result<String, StoreError> {
    serde_json::to_string_pretty(items).map_err(|e| StoreError::Json {
        file: "items.json".to_string(),
        source: e,
    })
}

/// `name, subtype|subtype, impact, message`; commas in the message are kept.
pub fn decode_events(text: &str) -> Result<Vec<MarketEvent>, StoreError> {
    data_lines(text)
        .map(|(line, raw)| {
            let row = Row::new("marketevents.csv", line, raw);
            row.expect_len(4)?;
            let event = MarketEvent {
                name: row.text(0)?.to_string(),
                affected_subtypes: split_list(row.text(1)?),
                impact: row.decimal(2, "impact")?,
                news_message: row.fields[3..].join(",").trim().to_string(),
            };
            validate_event(&event).map_err(|e| row.malformed(e.to_string()))?;
            Ok(event)
        })
        .collect()
}

/// `result, item, qty, item, qty, ...`
pub fn decode_recipes(text: &str) -> Result<Vec<Recipe>, StoreError> {
    data_lines(text)
        .map(|(line, raw)| {
            let row = Row::new("crafting_recipes.csv", line, raw);
            row.expect_len(3)?;
            if row.fields.len() % 2 == 0 {
                return Err(row.malformed("ingredients must come in item,quantity pairs"));
            }
            let mut ingredients = Vec::new();
            for idx in (1..row.fields.len()).step_by(2) {
                ingredients.push(Ingredient {
                    item: row.text(idx)?.to_string(),
                    quantity: row.parse(idx + 1, "ingredient quantity")?,
                });
            }
            Ok(Recipe {
                result: row.text(0)?.to_string(),
                ingredients,
            })
        })
        .collect()
}

/// `name, x, y, z, icon, tier, recipe, recipe, ...`
pub fn decode_crafting_locations(text: &str) -> Result<Vec<CraftingLocation>, StoreError> {
    data_lines(text)
        .map(|(line, raw)| {
            let row = Row::new("crafting_locations.csv", line, raw);
            row.expect_len(6)?;
            let recipes = (6..row.fields.len())
                .map(|idx| row.text(idx).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CraftingLocation {
                name: row.text(0)?.to_string(),
                position: row.position(1)?,
                icon: row.parse(4, "icon")?,
                tier: row.parse(5, "tier")?,
                recipes,
            })
        })
        .collect()
}

/// `name, x, y, z, item, icon, animDict, animName`
pub fn decode_harvest_sources(text: &str) -> Result<Vec<HarvestSource>, StoreError> {
    data_lines(text)
        .map(|(line, raw)| {
            let row = Row::new("marketsellers.csv", line, raw);
            row.expect_len(8)?;
            Ok(HarvestSource {
                name: row.text(0)?.to_string(),
                position: row.position(1)?,
                item: row.text(4)?.to_string(),
                icon: row.parse(5, "icon")?,
                anim_dict: row.text(6)?.to_string(),
                anim_name: row.text(7)?.to_string(),
            })
        })
        .collect()
}

pub fn decode_dealership(text: &str) -> Result<Vec<DealershipEntry>, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::Json {
        file: "vehicles.json".to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn business(records: Vec<InventoryRecord>, subtypes: Vec<String>) -> Business {
        Business {
            name: "Farm1".to_string(),
            position: Position {
                x: -157.25,
                y: 604.5,
                z: 48.24,
            },
            icon: 85,
            purchased: true,
            price: Decimal::new(1000, 0),
            revenue: Decimal::new(42, 0),
            inventory: Inventory::from_parts(records, Decimal::new(75, 1), Decimal::new(100, 0)),
            price_multiplier: Decimal::new(125, 2),
            interval_secs: 30,
            stock_level: 1,
            item_price_level: 2,
            interval_level: 0,
            business_type: "Farm".to_string(),
            sellable_subtypes: subtypes,
            automatic_refill: false,
            tier: 1,
        }
    }

    #[test]
    fn business_row_has_twenty_fields_in_order() {
        let b = business(
            vec![InventoryRecord {
                item: "Wood".to_string(),
                quantity: 5,
            }],
            vec!["Lumber".to_string(), "Ore".to_string()],
        );
        let row = encode_business(&b).unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), BUSINESS_FIELDS);
        assert_eq!(fields[0], "Farm1");
        assert_eq!(fields[5], "True");
        assert_eq!(fields[10], "1.25");
        assert_eq!(fields[16], "Wood:5");
        assert_eq!(fields[17], "Lumber|Ore");
        assert_eq!(fields[18], "False");
        assert_eq!(decode_business(&row, 2).unwrap(), b);
    }

    #[test]
    fn empty_inventory_and_sell_list_survive() {
        let b = business(vec![], vec![]);
        let table = encode_business_table(&[b.clone()]).unwrap();
        assert!(table.starts_with(BUSINESS_HEADER));
        let back = decode_business_table(&table).unwrap();
        assert_eq!(back, vec![b]);
    }

    #[test]
    fn legacy_lowercase_flags_are_accepted() {
        let row = "Shop,1,2,3,52,false,500,0,0,50,1,10,0,0,0,Retail,,Food,true,2";
        let b = decode_business(row, 2).unwrap();
        assert!(!b.purchased);
        assert!(b.automatic_refill);
        assert!(b.inventory.is_empty());
        assert_eq!(b.sellable_subtypes, vec!["Food".to_string()]);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let err = decode_business("Shop,1,2,3", 7).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { line: 7, .. }));
    }

    #[test]
    fn delimiters_in_names_are_refused() {
        let mut b = business(vec![], vec![]);
        b.name = "Bob's, Farm".to_string();
        assert!(matches!(encode_business(&b), Err(StoreError::Delimiter(_))));
    }

    #[test]
    fn catalog_skips_bad_rows() {
        let text = r#"[
            {"Name":"Wood","Type":"Raw","SubType":"Lumber","Price":100,"Weight":1,"LowerLimit":50,"UpperLimit":500},
            {"Name":"Gold","Type":"Raw","SubType":"Metal","Price":9000,"Weight":1,"LowerLimit":50,"UpperLimit":500},
            {"Name":"Broken"},
            {"Name":"Wood","Type":"Raw","SubType":"Lumber","Price":100,"Weight":1,"LowerLimit":50,"UpperLimit":500}
        ]"#;
        let load = decode_catalog(text).unwrap();
        assert_eq!(load.items.len(), 1);
        assert_eq!(load.skipped.len(), 3);
        let again = decode_catalog(&encode_catalog(&load.items).unwrap()).unwrap();
        assert_eq!(again.items, load.items);
    }

    #[test]
    fn static_tables_parse() {
        let events = decode_events("Storm,Lumber|Ore,-15,Storm hits, ports closed\n").unwrap();
        assert_eq!(events[0].affected_subtypes.len(), 2);
        assert_eq!(events[0].impact, Decimal::new(-15, 0));
        assert_eq!(events[0].news_message, "Storm hits, ports closed");

        let recipes = decode_recipes("Plank,Wood,2,Nails,1\n").unwrap();
        assert_eq!(recipes[0].ingredients.len(), 2);
        assert_eq!(recipes[0].ingredients[1].quantity, 1);
        assert!(decode_recipes("Plank,Wood\n").is_err());

        let locs = decode_crafting_locations("Workshop,1,2,3,566,1,Plank,Chair\n").unwrap();
        assert_eq!(locs[0].recipes, vec!["Plank".to_string(), "Chair".to_string()]);

        let sources = decode_harvest_sources("Forest,1,2,3,Wood,77,dict,anim\n").unwrap();
        assert_eq!(sources[0].item, "Wood");
    }

    proptest! {
        #[test]
        fn business_rows_preserve_fields(
            price in 0i64..10_000_000,
            revenue in 0i64..10_000_000,
            mult in 0i64..1000,
            qty in 1u32..500,
            interval in 1u32..120,
            tier in 1u32..6,
            purchased in any::<bool>(),
            refill in any::<bool>(),
        ) {
            let mut b = business(
                vec![InventoryRecord { item: "Wood".to_string(), quantity: qty }],
                vec!["Lumber".to_string()],
            );
            b.price = Decimal::new(price, 0);
            b.revenue = Decimal::new(revenue, 0);
            b.price_multiplier = Decimal::new(mult, 2);
            b.interval_secs = interval;
            b.tier = tier;
            b.purchased = purchased;
            b.automatic_refill = refill;
            let row = encode_business(&b).unwrap();
            prop_assert_eq!(decode_business(&row, 1).unwrap(), b);
        }
    }
}

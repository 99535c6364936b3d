#![deny(warnings)]

use anyhow::{bail, Context};
use persistence::{FileStore, Store};
use tycoon_core::{validate_tables, Catalog, PlayerLedger, Tables};

fn main() -> anyhow::Result<()> {
    let dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/data".to_string());
    let store = FileStore::new(&dir);

    let catalog = store.load_catalog().context("loading catalog")?;
    let businesses = store.load_businesses().context("loading businesses")?;
    let tables = store.load_static().context("loading static tables")?;
    let player = match store.load_player().context("loading player ledger")? {
        Some(player) => player,
        None => PlayerLedger::new(Default::default(), Default::default(), Vec::<&str>::new()),
    };
    for reason in &catalog.skipped {
        println!("skipped: {reason}");
    }
    let catalog = Catalog::new(catalog.items);
    validate_tables(&Tables {
        catalog: &catalog,
        businesses: &businesses,
        recipes: &tables.recipes,
        crafting_locations: &tables.crafting_locations,
        harvest_sources: &tables.harvest_sources,
        player: &player,
    })
    .with_context(|| format!("validating {dir}"))?;
    if tables.events.is_empty() {
        bail!("{dir}: market events table is empty");
    }
    println!(
        "{dir}: {} items, {} businesses, {} events, {} recipes, {} crafting locations, {} harvest sources, {} dealership models",
        catalog.len(),
        businesses.len(),
        tables.events.len(),
        tables.recipes.len(),
        tables.crafting_locations.len(),
        tables.harvest_sources.len(),
        tables.dealership.len()
    );
    Ok(())
}

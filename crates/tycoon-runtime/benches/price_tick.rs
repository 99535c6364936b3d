use criterion::{criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use tycoon_core::{Catalog, Item, MarketEvent};
use tycoon_econ::ChaChaSource;

fn large_catalog(n: usize) -> Catalog {
    let items = (0..n)
        .map(|i| Item {
            name: format!("Item{i}"),
            description: String::new(),
            item_type: "Goods".into(),
            subtype: format!("Sub{}", i % 16),
            price: Decimal::new(1_000, 0),
            weight: Decimal::new(15, 1),
            lower_limit: Decimal::new(100, 0),
            upper_limit: Decimal::new(100_000, 0),
            price_history: vec![],
        })
        .collect();
    Catalog::new(items)
}

fn bench_price_tick(c: &mut Criterion) {
    let mut catalog = large_catalog(5_000);
    let mut rng = ChaChaSource::seeded(42);
    let event = MarketEvent {
        name: "Boom".into(),
        affected_subtypes: vec!["Sub7".into()],
        impact: Decimal::new(20, 0),
        news_message: "Boom".into(),
    };
    let mut seed = 0u64;
    c.bench_function("price_tick_5k_items", |b| {
        b.iter(|| {
            let mut pending = Some(event.clone());
            seed = (seed + 1) & 0xFFFF;
            tycoon_runtime::evolve_catalog(&mut catalog, &mut pending, &mut rng, seed)
        })
    });
}

criterion_group!(benches, bench_price_tick);
criterion_main!(benches);

/// Benchmarks for dashboard filter passes.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use salary_dashboard::coordinator::{CoordinatorConfig, Strategy};
use salary_dashboard::dashboard;
use salary_dashboard::models::{Record, RANKS, SEXES};
use salary_dashboard::store::RecordStore;
use salary_dashboard::types::{Filter, Key};

fn get_test_records(size: usize) -> Vec<Record> {
    (0..size)
        .map(|i| {
            let phd = (i % 50) as u32;
            Record::new(
                RANKS[i % RANKS.len()],
                if i % 3 == 0 { "A" } else { "B" },
                phd,
                phd.saturating_sub((i % 7) as u32),
                SEXES[(i / 5) % SEXES.len()],
                60000 + (i * 7919 % 170000) as u32,
            )
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    for size in [400, 4000, 40000] {
        let records = get_test_records(size);
        for strategy in [Strategy::Incremental, Strategy::Full] {
            let config = CoordinatorConfig {
                strategy,
                verify: false,
            };
            let mut dashboard =
                dashboard::build(RecordStore::new(records.clone()), config).unwrap();
            let name = format!("select({}, {})", size, strategy);
            c.bench_function(&name, |b| {
                b.iter(|| {
                    dashboard
                        .select(black_box("gender-balance"), Key::from("Female"))
                        .unwrap();
                    dashboard
                        .select(black_box("gender-balance"), Key::from("Female"))
                        .unwrap();
                })
            });
            let name = format!("range({}, {})", size, strategy);
            c.bench_function(&name, |b| {
                b.iter(|| {
                    let filter = Filter::range(Key::Int(10), Key::Int(20)).unwrap();
                    dashboard.filter_by_name("yrs-service", filter).unwrap();
                    dashboard.clear_all().unwrap();
                })
            });
        }
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

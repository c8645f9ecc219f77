/// Benchmarks for group reductions.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use salary_dashboard::crossfilter::Crossfilter;
use salary_dashboard::models::{pluck, Field, Record, RANKS, SEXES};
use salary_dashboard::reducers::{Count, CountWhere, RunningAverage, Sum};
use salary_dashboard::store::RecordStore;
use salary_dashboard::types::{Filter, Key};

fn get_test_crossfilter(size: usize) -> Crossfilter<Record> {
    let records = (0..size)
        .map(|i| {
            Record::new(
                RANKS[i % RANKS.len()],
                "A",
                (i % 40) as u32,
                (i % 30) as u32,
                SEXES[i % SEXES.len()],
                50000 + (i % 1000) as u32 * 100,
            )
        })
        .collect();
    Crossfilter::new(RecordStore::new(records))
}

fn criterion_benchmark(c: &mut Criterion) {
    for size in [1000, 10000, 100000] {
        let mut crossfilter = get_test_crossfilter(size);
        let sex = crossfilter.dimension("sex", pluck(Field::Sex)).unwrap();
        let rank = crossfilter.dimension("rank", pluck(Field::Rank)).unwrap();
        crossfilter.group(sex, Count {}).unwrap();
        crossfilter
            .group(sex, Sum::new(|r: &Record| r.salary.into()))
            .unwrap();
        crossfilter
            .group(sex, RunningAverage::new(|r: &Record| r.salary.into()))
            .unwrap();
        crossfilter
            .group(sex, CountWhere::matching(|r: &Record| r.rank == "Prof"))
            .unwrap();
        let name = format!("filter({})", size);
        c.bench_function(&name, |b| {
            b.iter(|| {
                crossfilter
                    .filter(rank, Filter::Exact(black_box(Key::from("Prof"))))
                    .unwrap();
                crossfilter.filter(rank, Filter::All).unwrap();
            })
        });
        let name = format!("recompute({})", size);
        c.bench_function(&name, |b| b.iter(|| crossfilter.recompute().unwrap()));
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

//! The salary dashboard: the charts over a store of salary records and the dimensions and groups
//! behind them.
//!
//! Every chart owns its dimension, so selecting on one chart filters all the others but not
//! itself.

use tracing::{event, Level};

use crate::charts::{percent, BarChart, ChartConsumer, NumberDisplay, ScatterPlot, SelectMenu};
use crate::coordinator::{CoordinatorConfig, FilterCoordinator};
use crate::crossfilter::Crossfilter;
use crate::error::DashboardError;
use crate::models::{pluck, pluck_all, Field, Record, RANKS};
use crate::reducers::{Average, Count, CountWhere, Proportion, RunningAverage};
use crate::store::RecordStore;
use crate::types::Key;

type Chart = Box<dyn ChartConsumer<Record>>;

/// Build the dashboard over `store` and draw every chart.
pub fn build(
    store: RecordStore<Record>,
    config: CoordinatorConfig,
) -> Result<FilterCoordinator<Record>, DashboardError> {
    let records = store.len();
    let mut crossfilter = Crossfilter::new(store);
    let charts = vec![
        show_discipline_selector(&mut crossfilter)?,
        show_percent_that_are_professors(
            &mut crossfilter,
            "Female",
            "percentage-of-women-professors",
        )?,
        show_percent_that_are_professors(
            &mut crossfilter,
            "Male",
            "percentage-of-men-professors",
        )?,
        show_gender_balance(&mut crossfilter)?,
        show_average_salary(&mut crossfilter)?,
        show_rank_distribution(&mut crossfilter)?,
        show_service_to_salary_correlation(&mut crossfilter)?,
        show_phd_to_salary_correlation(&mut crossfilter)?,
    ];
    let mut coordinator = FilterCoordinator::new(crossfilter, config);
    for chart in charts {
        coordinator.register_boxed(chart)?;
    }
    coordinator.render_all()?;
    event!(
        Level::INFO,
        records,
        charts = coordinator.chart_names().len(),
        strategy = %config.strategy,
        verify = config.verify,
        "built dashboard"
    );
    Ok(coordinator)
}

fn count(value: &u64) -> f64 {
    *value as f64
}

fn show_discipline_selector(
    crossfilter: &mut Crossfilter<Record>,
) -> Result<Chart, DashboardError> {
    let dimension = crossfilter.dimension("discipline-selector", pluck(Field::Discipline))?;
    let group = crossfilter.group(dimension, Count {})?;
    Ok(Box::new(SelectMenu::new(
        "discipline-selector",
        dimension,
        group,
    )))
}

/// Proportion of the records of one sex that are professors.
fn show_percent_that_are_professors(
    crossfilter: &mut Crossfilter<Record>,
    gender: &'static str,
    name: &str,
) -> Result<Chart, DashboardError> {
    let group = crossfilter.group_all(CountWhere::new(
        move |record: &Record| record.sex == gender,
        |record: &Record| record.rank == "Prof",
    ))?;
    Ok(Box::new(NumberDisplay::new(
        name,
        group,
        Proportion::ratio,
        percent,
    )))
}

fn show_gender_balance(crossfilter: &mut Crossfilter<Record>) -> Result<Chart, DashboardError> {
    let dimension = crossfilter.dimension("gender-balance", pluck(Field::Sex))?;
    let group = crossfilter.group(dimension, Count {})?;
    Ok(Box::new(BarChart::new(
        "gender-balance",
        dimension,
        group,
        count,
    )))
}

/// Average to the cent.
fn rounded_average(value: &Average) -> f64 {
    (value.average * 100.0).round() / 100.0
}

fn show_average_salary(crossfilter: &mut Crossfilter<Record>) -> Result<Chart, DashboardError> {
    let dimension = crossfilter.dimension("average-salary", pluck(Field::Sex))?;
    let group = crossfilter.group(
        dimension,
        RunningAverage::new(|record: &Record| record.salary.into()),
    )?;
    event!(
        Level::DEBUG,
        groups = ?crossfilter.all(&group)?,
        "average salary by sex"
    );
    Ok(Box::new(BarChart::new(
        "average-salary",
        dimension,
        group,
        rounded_average,
    )))
}

/// Percentage of each sex at each rank, stacked.
fn show_rank_distribution(
    crossfilter: &mut Crossfilter<Record>,
) -> Result<Chart, DashboardError> {
    let dimension = crossfilter.dimension("rank-distribution", pluck(Field::Sex))?;
    let mut by_rank = Vec::new();
    for rank in RANKS {
        let group = crossfilter.group(
            dimension,
            CountWhere::matching(move |record: &Record| record.rank == rank),
        )?;
        by_rank.push(group);
    }
    let chart = BarChart::new(
        "rank-distribution",
        dimension,
        by_rank[0],
        Proportion::percentage,
    )
    .label("Prof")
    .stack(by_rank[1], "Asst Prof")
    .stack(by_rank[2], "Assoc Prof");
    Ok(Box::new(chart))
}

fn title(key: &Key) -> String {
    let element = |position| key.element(position).map(Key::to_string).unwrap_or_default();
    format!("{} earned {}", element(2), element(1))
}

fn series(key: &Key) -> String {
    key.element(3).map(Key::to_string).unwrap_or_default()
}

fn yrs_service(record: &Record) -> f64 {
    record.yrs_service.into()
}

fn yrs_since_phd(record: &Record) -> f64 {
    record.yrs_since_phd.into()
}

fn show_service_to_salary_correlation(
    crossfilter: &mut Crossfilter<Record>,
) -> Result<Chart, DashboardError> {
    let years = crossfilter.dimension("yrs-service", pluck(Field::YrsService))?;
    let dimension = crossfilter.dimension(
        "service-salary",
        pluck_all(&[Field::YrsService, Field::Salary, Field::Rank, Field::Sex]),
    )?;
    let group = crossfilter.group(dimension, Count {})?;
    Ok(Box::new(ScatterPlot::new(
        "service-salary",
        group,
        years,
        yrs_service,
        title,
        series,
    )))
}

fn show_phd_to_salary_correlation(
    crossfilter: &mut Crossfilter<Record>,
) -> Result<Chart, DashboardError> {
    let years = crossfilter.dimension("yrs-since-phd", pluck(Field::YrsSincePhd))?;
    let dimension = crossfilter.dimension(
        "phd-salary",
        pluck_all(&[Field::YrsSincePhd, Field::Salary, Field::Rank, Field::Sex]),
    )?;
    let group = crossfilter.group(dimension, Count {})?;
    Ok(Box::new(ScatterPlot::new(
        "phd-salary",
        group,
        years,
        yrs_since_phd,
        title,
        series,
    )))
}

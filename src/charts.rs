//! Chart consumers.
//!
//! A chart consumer reads group aggregates and dimension state after every filter change and
//! keeps a [ChartSnapshot]: the data a renderer needs to draw the chart. Drawing itself is not
//! done here.

use std::marker::PhantomData;

use serde::Serialize;

use crate::crossfilter::Crossfilter;
use crate::dimension::DimensionId;
use crate::error::DashboardError;
use crate::group::GroupHandle;
use crate::reducer::Reducer;
use crate::reducers::Count;
use crate::types::Key;

/// Trait for chart consumers.
///
/// This forms the contract between the filter coordinator and the charts it redraws.
pub trait ChartConsumer<T> {
    /// Unique name of the chart.
    fn name(&self) -> &str;

    /// Dimension filtered by selections on this chart, if it accepts selections.
    fn selection_dimension(&self) -> Option<DimensionId>;

    /// Recompute the chart snapshot from the current state of the crossfilter.
    fn redraw(&mut self, crossfilter: &Crossfilter<T>) -> Result<(), DashboardError>;

    /// Returns the latest snapshot, or `None` before the first redraw.
    fn snapshot(&self) -> Option<&ChartSnapshot>;
}

/// Data needed to render a chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSnapshot {
    /// Bar chart, stacked when there is more than one series
    Bar {
        name: String,
        filter: String,
        series: Vec<Series>,
    },
    /// Single formatted number
    Number {
        name: String,
        value: f64,
        formatted: String,
    },
    /// Select menu
    Menu {
        name: String,
        filter: String,
        options: Vec<MenuOption>,
    },
    /// Scatter plot
    Scatter {
        name: String,
        domain: Option<Domain>,
        points: Vec<Point>,
    },
}

impl ChartSnapshot {
    /// Name of the chart the snapshot belongs to.
    pub fn name(&self) -> &str {
        match self {
            ChartSnapshot::Bar { name, .. }
            | ChartSnapshot::Number { name, .. }
            | ChartSnapshot::Menu { name, .. }
            | ChartSnapshot::Scatter { name, .. } => name,
        }
    }
}

/// One layer of a bar chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub bars: Vec<Bar>,
}

/// A bar: a key and its displayed value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bar {
    pub key: Key,
    pub value: f64,
}

/// A select menu option with the number of records behind it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MenuOption {
    pub key: Key,
    pub count: u64,
}

/// Closed interval of an axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

/// A scatter plot point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: Key,
    pub y: Key,
    pub title: String,
    pub series: String,
}

/// Value accessor: maps an accumulator to the value drawn.
pub type Accessor<A> = fn(&A) -> f64;

struct Layer<T, R: Reducer<T>> {
    label: String,
    group: GroupHandle<R>,
    value: Accessor<R::Accumulator>,
    _record: PhantomData<fn(&T)>,
}

/// Bar chart over the groups of one dimension.
///
/// Each layer is a group on the chart's dimension; several layers make a stacked bar chart.
pub struct BarChart<T, R: Reducer<T>> {
    name: String,
    dimension: DimensionId,
    layers: Vec<Layer<T, R>>,
    snapshot: Option<ChartSnapshot>,
}

impl<T, R: Reducer<T>> BarChart<T, R> {
    /// Returns a BarChart with a single layer.
    ///
    /// # Arguments
    ///
    /// * `name`: Unique chart name
    /// * `dimension`: Dimension of `group`, filtered when a bar is selected
    /// * `group`: Group providing the bars
    /// * `value`: Maps each accumulator to the bar height
    pub fn new(
        name: &str,
        dimension: DimensionId,
        group: GroupHandle<R>,
        value: Accessor<R::Accumulator>,
    ) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            layers: vec![Layer {
                label: name.to_string(),
                group,
                value,
                _record: PhantomData,
            }],
            snapshot: None,
        }
    }

    /// Rename the first layer.
    pub fn label(mut self, label: &str) -> Self {
        if let Some(layer) = self.layers.first_mut() {
            layer.label = label.to_string();
        }
        self
    }

    /// Add a layer stacked on the previous ones.
    pub fn stack(mut self, group: GroupHandle<R>, label: &str) -> Self {
        let value = self.layers[0].value;
        self.layers.push(Layer {
            label: label.to_string(),
            group,
            value,
            _record: PhantomData,
        });
        self
    }
}

impl<T: 'static, R: Reducer<T> + 'static> ChartConsumer<T> for BarChart<T, R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn selection_dimension(&self) -> Option<DimensionId> {
        Some(self.dimension)
    }

    fn redraw(&mut self, crossfilter: &Crossfilter<T>) -> Result<(), DashboardError> {
        let series = self
            .layers
            .iter()
            .map(|layer| {
                let bars = crossfilter
                    .all(&layer.group)?
                    .iter()
                    .map(|entry| Bar {
                        key: entry.key.clone(),
                        value: (layer.value)(&entry.value),
                    })
                    .collect();
                Ok(Series {
                    label: layer.label.clone(),
                    bars,
                })
            })
            .collect::<Result<Vec<Series>, DashboardError>>()?;
        self.snapshot = Some(ChartSnapshot::Bar {
            name: self.name.clone(),
            filter: crossfilter.filter_of(self.dimension)?.to_string(),
            series,
        });
        Ok(())
    }

    fn snapshot(&self) -> Option<&ChartSnapshot> {
        self.snapshot.as_ref()
    }
}

/// Number display over a group of all records.
pub struct NumberDisplay<T, R: Reducer<T>> {
    name: String,
    group: GroupHandle<R>,
    value: Accessor<R::Accumulator>,
    format: fn(f64) -> String,
    snapshot: Option<ChartSnapshot>,
    _record: PhantomData<fn(&T)>,
}

impl<T, R: Reducer<T>> NumberDisplay<T, R> {
    /// Returns a NumberDisplay.
    ///
    /// # Arguments
    ///
    /// * `name`: Unique chart name
    /// * `group`: Group created with [Crossfilter::group_all]
    /// * `value`: Maps the accumulator to the displayed value
    /// * `format`: Formats the displayed value
    pub fn new(
        name: &str,
        group: GroupHandle<R>,
        value: Accessor<R::Accumulator>,
        format: fn(f64) -> String,
    ) -> Self {
        Self {
            name: name.to_string(),
            group,
            value,
            format,
            snapshot: None,
            _record: PhantomData,
        }
    }
}

/// Format a fraction as a percentage with two decimals.
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

impl<T: 'static, R: Reducer<T> + 'static> ChartConsumer<T> for NumberDisplay<T, R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn selection_dimension(&self) -> Option<DimensionId> {
        None
    }

    fn redraw(&mut self, crossfilter: &Crossfilter<T>) -> Result<(), DashboardError> {
        let value = (self.value)(crossfilter.value(&self.group)?);
        self.snapshot = Some(ChartSnapshot::Number {
            name: self.name.clone(),
            value,
            formatted: (self.format)(value),
        });
        Ok(())
    }

    fn snapshot(&self) -> Option<&ChartSnapshot> {
        self.snapshot.as_ref()
    }
}

/// Select menu listing the keys of a dimension with their record counts.
pub struct SelectMenu {
    name: String,
    dimension: DimensionId,
    group: GroupHandle<Count>,
    snapshot: Option<ChartSnapshot>,
}

impl SelectMenu {
    /// Returns a SelectMenu over a counting group of `dimension`.
    pub fn new(name: &str, dimension: DimensionId, group: GroupHandle<Count>) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            group,
            snapshot: None,
        }
    }
}

impl<T: 'static> ChartConsumer<T> for SelectMenu {
    fn name(&self) -> &str {
        &self.name
    }

    fn selection_dimension(&self) -> Option<DimensionId> {
        Some(self.dimension)
    }

    fn redraw(&mut self, crossfilter: &Crossfilter<T>) -> Result<(), DashboardError> {
        let options = crossfilter
            .all(&self.group)?
            .iter()
            .map(|entry| MenuOption {
                key: entry.key.clone(),
                count: entry.value,
            })
            .collect();
        self.snapshot = Some(ChartSnapshot::Menu {
            name: self.name.clone(),
            filter: crossfilter.filter_of(self.dimension)?.to_string(),
            options,
        });
        Ok(())
    }

    fn snapshot(&self) -> Option<&ChartSnapshot> {
        self.snapshot.as_ref()
    }
}

/// Scatter plot over a counting group with composite keys.
///
/// Keys are tuples whose first two elements are the x and y coordinates. Keys without visible
/// records are not plotted. The x domain spans the bottom and top records of a separate
/// dimension; it is `None` when no record is visible.
pub struct ScatterPlot<T> {
    name: String,
    group: GroupHandle<Count>,
    domain_dimension: DimensionId,
    domain_value: fn(&T) -> f64,
    title: fn(&Key) -> String,
    series: fn(&Key) -> String,
    snapshot: Option<ChartSnapshot>,
}

impl<T> ScatterPlot<T> {
    /// Returns a ScatterPlot.
    ///
    /// # Arguments
    ///
    /// * `name`: Unique chart name
    /// * `group`: Counting group keyed by `[x, y, ...]` tuples
    /// * `domain_dimension`: Dimension ordering records by x
    /// * `domain_value`: x value of a record
    /// * `title`: Hover title of a point
    /// * `series`: Colour series of a point
    pub fn new(
        name: &str,
        group: GroupHandle<Count>,
        domain_dimension: DimensionId,
        domain_value: fn(&T) -> f64,
        title: fn(&Key) -> String,
        series: fn(&Key) -> String,
    ) -> Self {
        Self {
            name: name.to_string(),
            group,
            domain_dimension,
            domain_value,
            title,
            series,
            snapshot: None,
        }
    }
}

impl<T: 'static> ChartConsumer<T> for ScatterPlot<T> {
    fn name(&self) -> &str {
        &self.name
    }

    // Brushing is off.
    fn selection_dimension(&self) -> Option<DimensionId> {
        None
    }

    fn redraw(&mut self, crossfilter: &Crossfilter<T>) -> Result<(), DashboardError> {
        let bottom = crossfilter.bottom(self.domain_dimension, 1)?;
        let top = crossfilter.top(self.domain_dimension, 1)?;
        let domain = match (bottom.first(), top.first()) {
            (Some(min), Some(max)) => Some(Domain {
                min: (self.domain_value)(min),
                max: (self.domain_value)(max),
            }),
            _ => None,
        };
        let points = crossfilter
            .all(&self.group)?
            .iter()
            .filter(|entry| entry.value > 0)
            .filter_map(|entry| {
                let x = entry.key.element(0)?.clone();
                let y = entry.key.element(1)?.clone();
                Some(Point {
                    x,
                    y,
                    title: (self.title)(&entry.key),
                    series: (self.series)(&entry.key),
                })
            })
            .collect();
        self.snapshot = Some(ChartSnapshot::Scatter {
            name: self.name.clone(),
            domain,
            points,
        });
        Ok(())
    }

    fn snapshot(&self) -> Option<&ChartSnapshot> {
        self.snapshot.as_ref()
    }
}

//! Filter coordination.
//!
//! The [FilterCoordinator] is the session object of a dashboard. It owns the crossfilter and the
//! chart consumers, and after every filter change it brings the groups up to date and redraws
//! every consumer in registration order.

use tracing::{event, Level};

use crate::charts::{ChartConsumer, ChartSnapshot};
use crate::crossfilter::{Crossfilter, FilterChange};
use crate::dimension::DimensionId;
use crate::error::DashboardError;
use crate::types::{Filter, Key};

/// How groups are brought up to date after a filter change.
#[derive(Clone, Copy, Debug, Default, PartialEq, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Strategy {
    /// Apply only the records whose acceptance changed
    #[default]
    Incremental,
    /// Update only the filter masks, then discard and recompute every group
    Full,
}

/// Filter coordinator configuration
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoordinatorConfig {
    /// Group update strategy
    pub strategy: Strategy,
    /// Whether to check every group against a full recompute after each filter change
    pub verify: bool,
}

/// Session object linking a crossfilter to its chart consumers.
pub struct FilterCoordinator<T> {
    crossfilter: Crossfilter<T>,
    consumers: Vec<Box<dyn ChartConsumer<T>>>,
    config: CoordinatorConfig,
    /// Message of the fatal error that halted the coordinator
    halted: Option<String>,
    /// Number of completed redraw passes
    passes: u64,
}

impl<T: 'static> FilterCoordinator<T> {
    /// Returns a new FilterCoordinator with no consumers.
    ///
    /// # Arguments
    ///
    /// * `crossfilter`: Crossfilter with its dimensions and groups already created
    /// * `config`: Coordinator configuration
    pub fn new(crossfilter: Crossfilter<T>, config: CoordinatorConfig) -> Self {
        Self {
            crossfilter,
            consumers: Vec::new(),
            config,
            halted: None,
            passes: 0,
        }
    }

    /// Register a chart consumer. Consumers are redrawn in registration order.
    pub fn register<C>(&mut self, consumer: C) -> Result<(), DashboardError>
    where
        C: ChartConsumer<T> + 'static,
    {
        self.register_boxed(Box::new(consumer))
    }

    /// Register a boxed chart consumer.
    pub fn register_boxed(
        &mut self,
        consumer: Box<dyn ChartConsumer<T>>,
    ) -> Result<(), DashboardError> {
        if self.consumers.iter().any(|c| c.name() == consumer.name()) {
            return Err(DashboardError::DuplicateChart {
                name: consumer.name().to_string(),
            });
        }
        self.consumers.push(consumer);
        Ok(())
    }

    pub fn crossfilter(&self) -> &Crossfilter<T> {
        &self.crossfilter
    }

    pub fn config(&self) -> CoordinatorConfig {
        self.config
    }

    /// Number of completed redraw passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Whether a fatal error halted the coordinator.
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Look up a consumer by name.
    pub fn consumer(&self, name: &str) -> Result<&dyn ChartConsumer<T>, DashboardError> {
        self.consumers
            .iter()
            .find(|consumer| consumer.name() == name)
            .map(|consumer| consumer.as_ref())
            .ok_or_else(|| DashboardError::UnknownChart {
                name: name.to_string(),
            })
    }

    /// Returns the names of the consumers in registration order.
    pub fn chart_names(&self) -> Vec<&str> {
        self.consumers.iter().map(|consumer| consumer.name()).collect()
    }

    /// Returns the latest snapshot of every consumer that has been drawn.
    pub fn snapshots(&self) -> Vec<&ChartSnapshot> {
        self.consumers
            .iter()
            .filter_map(|consumer| consumer.snapshot())
            .collect()
    }

    /// Draw every consumer.
    pub fn render_all(&mut self) -> Result<(), DashboardError> {
        self.check_halted()?;
        let result = self.redraw_all();
        result.map_err(|error| self.fail(error))
    }

    /// Replace the filter of a dimension and redraw.
    pub fn filter(
        &mut self,
        dimension: DimensionId,
        filter: Filter,
    ) -> Result<FilterChange, DashboardError> {
        self.check_halted()?;
        let result = match self.config.strategy {
            Strategy::Incremental => self.crossfilter.filter(dimension, filter),
            Strategy::Full => self.crossfilter.filter_masks(dimension, filter),
        };
        let change = result.map_err(|error| self.fail(error))?;
        self.on_filter_changed(dimension)?;
        Ok(change)
    }

    /// Replace the filter of a dimension, looked up by name, and redraw.
    pub fn filter_by_name(
        &mut self,
        name: &str,
        filter: Filter,
    ) -> Result<FilterChange, DashboardError> {
        let dimension = self.crossfilter.dimension_id(name)?;
        self.filter(dimension, filter)
    }

    /// Clear the filter of a dimension and redraw.
    pub fn clear(&mut self, dimension: DimensionId) -> Result<FilterChange, DashboardError> {
        self.filter(dimension, Filter::All)
    }

    /// Clear every filter and redraw once.
    pub fn clear_all(&mut self) -> Result<Vec<DimensionId>, DashboardError> {
        self.check_halted()?;
        let result = match self.config.strategy {
            Strategy::Incremental => self.crossfilter.filter_all(),
            Strategy::Full => self.crossfilter.filter_all_masks(),
        };
        let cleared = result.map_err(|error| self.fail(error))?;
        match cleared.first() {
            Some(dimension) => self.on_filter_changed(*dimension)?,
            None => self.render_all()?,
        }
        Ok(cleared)
    }

    /// Toggle the selection of `key` on a chart.
    ///
    /// Selecting a key narrows the chart's dimension to it, or adds it to the keys already
    /// selected; selecting a selected key again removes it.
    pub fn select(&mut self, chart: &str, key: Key) -> Result<FilterChange, DashboardError> {
        self.check_halted()?;
        let consumer = self.consumer(chart)?;
        let dimension =
            consumer
                .selection_dimension()
                .ok_or_else(|| DashboardError::NotSelectable {
                    name: chart.to_string(),
                })?;
        let filter = self.crossfilter.filter_of(dimension)?.toggled(&key);
        self.filter(dimension, filter)
    }

    /// Bring every group to the state of the current filters and redraw every consumer.
    ///
    /// Called after the filter of `dimension` changed.
    pub fn on_filter_changed(&mut self, dimension: DimensionId) -> Result<(), DashboardError> {
        self.check_halted()?;
        let result = self.update_groups();
        result.map_err(|error| self.fail(error))?;
        event!(
            Level::DEBUG,
            dimension = self.crossfilter.dimension_name(dimension).unwrap_or("?"),
            strategy = %self.config.strategy,
            visible = self.crossfilter.visible_count(),
            "filter pass"
        );
        self.render_all()
    }

    fn update_groups(&mut self) -> Result<(), DashboardError> {
        if self.config.strategy == Strategy::Full {
            self.crossfilter.recompute()?;
        }
        if self.config.verify {
            self.crossfilter.verify()?;
        }
        Ok(())
    }

    fn redraw_all(&mut self) -> Result<(), DashboardError> {
        for consumer in self.consumers.iter_mut() {
            consumer.redraw(&self.crossfilter)?;
        }
        self.passes += 1;
        Ok(())
    }

    fn check_halted(&self) -> Result<(), DashboardError> {
        match &self.halted {
            Some(cause) => Err(DashboardError::Halted {
                cause: cause.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Halt on fatal errors, passing the error through.
    fn fail(&mut self, error: DashboardError) -> DashboardError {
        if error.is_fatal() && self.halted.is_none() {
            error.log();
            self.halted = Some(error.to_string());
        }
        error
    }
}

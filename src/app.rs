//! Salary dashboard application: loads the dataset, builds the dashboard and prints its charts.

use std::io;

use tracing::{event, Level};

use crate::cli::CommandLineArgs;
use crate::coordinator::CoordinatorConfig;
use crate::dashboard;
use crate::error::DashboardError;
use crate::loader::{self, LoadPolicy};
use crate::session::{Command, Session};
use crate::types::Filter;

/// Run the dashboard as configured by the command line.
///
/// Without `--interactive` the snapshot of every chart is printed once, after the startup
/// filters are applied.
pub fn run(args: &CommandLineArgs) -> Result<(), DashboardError> {
    let path = expanduser::expanduser(&args.data)?;
    let policy = if args.skip_malformed {
        LoadPolicy::Skip
    } else {
        LoadPolicy::Strict
    };
    let store = loader::load_path(&path, policy)?;
    let config = CoordinatorConfig {
        strategy: args.strategy,
        verify: args.verify,
    };
    let mut dashboard = dashboard::build(store, config)?;
    for filter in &args.filters {
        let change = dashboard
            .filter_by_name(&filter.dimension, Filter::Exact(filter.value.clone()))?;
        event!(
            Level::INFO,
            dimension = filter.dimension.as_str(),
            value = %filter.value,
            rejected = change.rejected,
            "applied startup filter"
        );
    }

    let stdout = io::stdout();
    let mut session = Session::new(&mut dashboard, stdout.lock(), args.pretty);
    if args.interactive {
        session.run(io::stdin().lock())
    } else {
        session.execute(Command::Show { chart: None })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn missing_dataset() {
        let args = CommandLineArgs::try_parse_from([
            "salary-dashboard",
            "--data",
            "/nonexistent/Salaries.csv",
        ])
        .unwrap();
        assert!(matches!(run(&args), Err(DashboardError::Io(_))));
    }

    #[test]
    fn bundled_dataset() {
        let data = concat!(env!("CARGO_MANIFEST_DIR"), "/data/Salaries.csv");
        let args = CommandLineArgs::try_parse_from([
            "salary-dashboard",
            "--data",
            data,
            "--verify",
            "--filter",
            "gender-balance=Female",
        ])
        .unwrap();
        run(&args).unwrap();
    }
}

//! Command Line Interface (CLI) arguments.

use clap::Parser;

use crate::coordinator::Strategy;
use crate::types::Key;

/// A `NAME=VALUE` filter applied before the first snapshot is printed.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterArg {
    /// Dimension name
    pub dimension: String,
    /// Key to keep
    pub value: Key,
}

/// Parse a `NAME=VALUE` filter argument.
fn parse_filter(text: &str) -> Result<FilterArg, String> {
    match text.split_once('=') {
        Some((dimension, value)) if !dimension.is_empty() && !value.is_empty() => Ok(FilterArg {
            dimension: dimension.to_string(),
            value: Key::parse(value),
        }),
        _ => Err(format!("expected NAME=VALUE, got {:?}", text)),
    }
}

/// Salary dashboard command line interface
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct CommandLineArgs {
    /// Path to the salaries CSV dataset
    #[arg(long, default_value = "data/Salaries.csv", env = "SALARY_DASHBOARD_DATA")]
    pub data: String,
    /// Drop malformed rows with a warning instead of failing
    #[arg(long, default_value_t = false, env = "SALARY_DASHBOARD_SKIP_MALFORMED")]
    pub skip_malformed: bool,
    /// Filter to apply at startup, as NAME=VALUE where NAME is a dimension. May be repeated.
    #[arg(long = "filter", value_name = "NAME=VALUE", value_parser = parse_filter)]
    pub filters: Vec<FilterArg>,
    /// How groups are brought up to date after a filter change
    #[arg(
        long,
        value_enum,
        default_value_t = Strategy::Incremental,
        env = "SALARY_DASHBOARD_STRATEGY"
    )]
    pub strategy: Strategy,
    /// Check every group against a full recompute after each filter change
    #[arg(long, default_value_t = false, env = "SALARY_DASHBOARD_VERIFY")]
    pub verify: bool,
    /// Read commands from stdin after the dashboard is built
    #[arg(long, default_value_t = false, env = "SALARY_DASHBOARD_INTERACTIVE")]
    pub interactive: bool,
    /// Pretty-print JSON output
    #[arg(long, default_value_t = false, env = "SALARY_DASHBOARD_PRETTY")]
    pub pretty: bool,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CommandLineArgs::try_parse_from(["salary-dashboard"]).unwrap();
        assert_eq!("data/Salaries.csv", args.data);
        assert_eq!(Strategy::Incremental, args.strategy);
        assert!(args.filters.is_empty());
        assert!(!args.verify);
    }

    #[test]
    fn repeated_filters() {
        let args = CommandLineArgs::try_parse_from([
            "salary-dashboard",
            "--filter",
            "gender-balance=Female",
            "--filter",
            "yrs-service=3",
            "--strategy",
            "full",
        ])
        .unwrap();
        assert_eq!(
            vec![
                FilterArg {
                    dimension: "gender-balance".to_string(),
                    value: Key::from("Female"),
                },
                FilterArg {
                    dimension: "yrs-service".to_string(),
                    value: Key::Int(3),
                },
            ],
            args.filters
        );
        assert_eq!(Strategy::Full, args.strategy);
    }

    #[test]
    fn malformed_filter() {
        assert!(CommandLineArgs::try_parse_from(["salary-dashboard", "--filter", "sex"]).is_err());
        assert!(CommandLineArgs::try_parse_from(["salary-dashboard", "--filter", "=x"]).is_err());
    }
}

//! Interactive command session.
//!
//! Reads one command per line and writes one JSON document per command. Errors are written as
//! [ErrorReport]s; a fatal error ends the session.

use std::io::{BufRead, Write};
use std::str::FromStr;

use serde::Serialize;
use tracing::{event, Level};

use crate::charts::ChartSnapshot;
use crate::coordinator::FilterCoordinator;
use crate::error::{DashboardError, ErrorReport};
use crate::models::Record;
use crate::types::{Filter, Key};

const HELP: [&str; 10] = [
    "filter DIMENSION VALUE...  keep records whose key is any of the values",
    "range DIMENSION LO HI      keep records whose key lies in [LO, HI)",
    "clear DIMENSION            clear the filter of a dimension",
    "reset                      clear every filter",
    "select CHART KEY           toggle the selection of a key on a chart",
    "show [CHART]               print chart snapshots",
    "top DIMENSION N            print the N visible records with the largest keys",
    "bottom DIMENSION N         print the N visible records with the smallest keys",
    "help                       print this help",
    "quit                       end the session",
];

/// A session command
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Filter { dimension: String, values: Vec<Key> },
    Range { dimension: String, lo: Key, hi: Key },
    Clear { dimension: String },
    Reset,
    Select { chart: String, key: Key },
    Show { chart: Option<String> },
    Top { dimension: String, n: usize },
    Bottom { dimension: String, n: usize },
    Help,
    Quit,
}

fn invalid(command: &str, reason: &str) -> DashboardError {
    DashboardError::InvalidCommand {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for Command {
    type Err = DashboardError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((name, args)) = words.split_first() else {
            return Err(invalid(line, "empty command"));
        };
        let arity = |count: usize| {
            if args.len() == count {
                Ok(())
            } else {
                Err(invalid(line, &format!("expected {} argument(s)", count)))
            }
        };
        let number = |text: &str| {
            text.parse::<usize>()
                .map_err(|_| invalid(line, "count must be a non-negative integer"))
        };
        let command = match *name {
            "filter" => {
                if args.len() < 2 {
                    return Err(invalid(line, "expected a dimension and at least one value"));
                }
                Command::Filter {
                    dimension: args[0].to_string(),
                    values: args[1..].iter().map(|value| Key::parse(value)).collect(),
                }
            }
            "range" => {
                arity(3)?;
                Command::Range {
                    dimension: args[0].to_string(),
                    lo: Key::parse(args[1]),
                    hi: Key::parse(args[2]),
                }
            }
            "clear" => {
                arity(1)?;
                Command::Clear {
                    dimension: args[0].to_string(),
                }
            }
            "reset" => {
                arity(0)?;
                Command::Reset
            }
            "select" => {
                arity(2)?;
                Command::Select {
                    chart: args[0].to_string(),
                    key: Key::parse(args[1]),
                }
            }
            "show" => {
                if args.len() > 1 {
                    return Err(invalid(line, "expected at most one chart"));
                }
                Command::Show {
                    chart: args.first().map(|chart| chart.to_string()),
                }
            }
            "top" | "bottom" => {
                arity(2)?;
                let dimension = args[0].to_string();
                let n = number(args[1])?;
                if *name == "top" {
                    Command::Top { dimension, n }
                } else {
                    Command::Bottom { dimension, n }
                }
            }
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(invalid(line, "unknown command")),
        };
        Ok(command)
    }
}

/// Whether the session continues after a command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output<'a> {
    Snapshots(Vec<&'a ChartSnapshot>),
    Snapshot(&'a ChartSnapshot),
    Records(Vec<&'a Record>),
    Help { commands: &'static [&'static str] },
}

/// Write a value as a single JSON document.
fn write_json<W: Write, S: Serialize>(
    output: &mut W,
    pretty: bool,
    value: &S,
) -> Result<(), DashboardError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *output, value)?;
    } else {
        serde_json::to_writer(&mut *output, value)?;
    }
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

/// A command session over a dashboard.
pub struct Session<'a, W: Write> {
    dashboard: &'a mut FilterCoordinator<Record>,
    output: W,
    pretty: bool,
}

impl<'a, W: Write> Session<'a, W> {
    /// Returns a new Session.
    ///
    /// # Arguments
    ///
    /// * `dashboard`: Dashboard to operate on
    /// * `output`: Destination of the JSON documents
    /// * `pretty`: Whether to pretty-print JSON
    pub fn new(dashboard: &'a mut FilterCoordinator<Record>, output: W, pretty: bool) -> Self {
        Self {
            dashboard,
            output,
            pretty,
        }
    }

    /// Execute a command and write its output.
    pub fn execute(&mut self, command: Command) -> Result<Flow, DashboardError> {
        event!(Level::DEBUG, ?command, "executing command");
        match command {
            Command::Filter {
                dimension,
                mut values,
            } => {
                let filter = if values.len() == 1 {
                    Filter::Exact(values.remove(0))
                } else {
                    Filter::Set(values)
                };
                self.dashboard.filter_by_name(&dimension, filter)?;
                self.show_all()?;
            }
            Command::Range { dimension, lo, hi } => {
                let filter = Filter::range(lo, hi)?;
                self.dashboard.filter_by_name(&dimension, filter)?;
                self.show_all()?;
            }
            Command::Clear { dimension } => {
                self.dashboard.filter_by_name(&dimension, Filter::All)?;
                self.show_all()?;
            }
            Command::Reset => {
                self.dashboard.clear_all()?;
                self.show_all()?;
            }
            Command::Select { chart, key } => {
                self.dashboard.select(&chart, key)?;
                self.show_all()?;
            }
            Command::Show { chart: None } => self.show_all()?,
            Command::Show { chart: Some(chart) } => {
                let consumer = self.dashboard.consumer(&chart)?;
                if let Some(snapshot) = consumer.snapshot() {
                    write_json(&mut self.output, self.pretty, &Output::Snapshot(snapshot))?;
                }
            }
            Command::Top { dimension, n } => {
                let crossfilter = self.dashboard.crossfilter();
                let records = crossfilter.top(crossfilter.dimension_id(&dimension)?, n)?;
                write_json(&mut self.output, self.pretty, &Output::Records(records))?;
            }
            Command::Bottom { dimension, n } => {
                let crossfilter = self.dashboard.crossfilter();
                let records = crossfilter.bottom(crossfilter.dimension_id(&dimension)?, n)?;
                write_json(&mut self.output, self.pretty, &Output::Records(records))?;
            }
            Command::Help => {
                let help = Output::Help { commands: &HELP };
                write_json(&mut self.output, self.pretty, &help)?;
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Write the snapshot of every chart.
    pub fn show_all(&mut self) -> Result<(), DashboardError> {
        let snapshots = Output::Snapshots(self.dashboard.snapshots());
        write_json(&mut self.output, self.pretty, &snapshots)
    }

    /// Execute commands read from `input` until it is exhausted, `quit` is read, or a fatal
    /// error occurs.
    ///
    /// Blank lines and lines starting with `#` are ignored. Non-fatal errors are reported and
    /// the session continues.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<(), DashboardError> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let result = line.parse::<Command>().and_then(|command| self.execute(command));
            match result {
                Ok(Flow::Continue) => (),
                Ok(Flow::Quit) => break,
                Err(error) => {
                    write_json(&mut self.output, self.pretty, &ErrorReport::from(&error))?;
                    if error.is_fatal() {
                        return Err(error);
                    }
                    event!(Level::WARN, error = %error, "command failed");
                }
            }
        }
        Ok(())
    }
}

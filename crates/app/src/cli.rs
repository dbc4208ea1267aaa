use std::fmt;
use std::path::PathBuf;

use slm_core::model::{ParseIdError, WorkOrderId};

pub const DB_URL_ENV: &str = "SLM_DB_URL";
pub const CONFIG_ENV: &str = "SLM_CONFIG";
pub const DEFAULT_DB_URL: &str = "sqlite://slm_data.sqlite3";

#[derive(Debug, PartialEq)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingRequired { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    MissingWorkOrderId,
    InvalidWorkOrderId(ParseIdError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "a subcommand is required"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingRequired { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingWorkOrderId => write!(f, "delete requires a work order id"),
            ArgsError::InvalidWorkOrderId(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteArgs {
    pub material: String,
    pub weight_g: f64,
    pub difficulty: u8,
    pub risk: f64,
    pub post_hours: f64,
    pub post_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordArgs {
    pub material: String,
    pub weight_g: f64,
    pub hours: f64,
    pub minutes: f64,
    pub lattice: bool,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quote(QuoteArgs),
    Materials,
    Stats,
    Costs,
    Machine {
        select: Option<String>,
        years: Option<u32>,
    },
    Record(RecordArgs),
    Orders {
        limit: Option<u32>,
    },
    Delete(WorkOrderId),
    Seed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub db_url: String,
    pub config_path: Option<PathBuf>,
    pub command: Command,
}

/// Outcome of parsing: either a command to run or a request for help.
#[derive(Debug, PartialEq)]
pub enum Parsed {
    Run(Cli),
    Help,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  slm-quoter [--db <sqlite_url>] [--config <file.toml>] <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  quote --material <name> --weight <g> [--difficulty <1|2|3>] [--risk <r>]");
    eprintln!("        [--post-hours <h>] [--post-rate <amount/h>]");
    eprintln!("  materials                    Current efficiency per material");
    eprintln!("  stats                        Work order counts");
    eprintln!("  costs                        Machine x depreciation cost table");
    eprintln!("  machine [--select <name> [--years <n>]]");
    eprintln!("  record --material <name> --weight <g> [--hours <h>] [--minutes <m>]");
    eprintln!("         [--lattice] [--note <text>]");
    eprintln!("  orders [--limit <n>]         Most recent work orders (default 20)");
    eprintln!("  delete <id>                  Remove a work order");
    eprintln!("  seed                         Report what cold-start seeding wrote");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DB_URL_ENV}, {CONFIG_ENV}, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: value })
}

impl Cli {
    /// Parse process arguments with environment fallbacks.
    pub fn parse() -> Result<Parsed, ArgsError> {
        Self::parse_from(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Parse `args` (without the program name), reading fallbacks through `env`.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed, ArgsError> {
        let mut db_url =
            env(DB_URL_ENV).map_or_else(|| DEFAULT_DB_URL.to_owned(), normalize_sqlite_url);
        let mut config_path = env(CONFIG_ENV).filter(|p| !p.trim().is_empty()).map(PathBuf::from);

        let mut args = args.into_iter();
        let command_name = loop {
            let Some(arg) = args.next() else {
                return Err(ArgsError::MissingCommand);
            };
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--config" => {
                    config_path = Some(PathBuf::from(require_value(&mut args, "--config")?));
                }
                "--help" | "-h" | "help" => return Ok(Parsed::Help),
                _ if arg.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ => break arg,
            }
        };

        let command = match command_name.as_str() {
            "quote" => Command::Quote(parse_quote(&mut args)?),
            "record" => Command::Record(parse_record(&mut args)?),
            "machine" => parse_machine(&mut args)?,
            "orders" => parse_orders(&mut args)?,
            "delete" => parse_delete(&mut args)?,
            "materials" => no_options(&mut args, Command::Materials)?,
            "stats" => no_options(&mut args, Command::Stats)?,
            "costs" => no_options(&mut args, Command::Costs)?,
            "seed" => no_options(&mut args, Command::Seed)?,
            _ => return Err(ArgsError::UnknownCommand(command_name)),
        };

        Ok(Parsed::Run(Self {
            db_url,
            config_path,
            command,
        }))
    }
}

fn no_options(
    args: &mut impl Iterator<Item = String>,
    command: Command,
) -> Result<Command, ArgsError> {
    match args.next() {
        Some(arg) => Err(ArgsError::UnknownArg(arg)),
        None => Ok(command),
    }
}

fn parse_quote(args: &mut impl Iterator<Item = String>) -> Result<QuoteArgs, ArgsError> {
    let mut material = None;
    let mut weight_g = None;
    let mut difficulty = 1;
    let mut risk = 0.0;
    let mut post_hours = 0.0;
    let mut post_rate = 0.0;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--material" => material = Some(require_value(args, "--material")?),
            "--weight" => weight_g = Some(parse_number(args, "--weight")?),
            "--difficulty" => difficulty = parse_number(args, "--difficulty")?,
            "--risk" => risk = parse_number(args, "--risk")?,
            "--post-hours" => post_hours = parse_number(args, "--post-hours")?,
            "--post-rate" => post_rate = parse_number(args, "--post-rate")?,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(QuoteArgs {
        material: material.ok_or(ArgsError::MissingRequired { flag: "--material" })?,
        weight_g: weight_g.ok_or(ArgsError::MissingRequired { flag: "--weight" })?,
        difficulty,
        risk,
        post_hours,
        post_rate,
    })
}

fn parse_record(args: &mut impl Iterator<Item = String>) -> Result<RecordArgs, ArgsError> {
    let mut material = None;
    let mut weight_g = None;
    let mut hours = 0.0;
    let mut minutes = 0.0;
    let mut lattice = false;
    let mut note = String::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--material" => material = Some(require_value(args, "--material")?),
            "--weight" => weight_g = Some(parse_number(args, "--weight")?),
            "--hours" => hours = parse_number(args, "--hours")?,
            "--minutes" => minutes = parse_number(args, "--minutes")?,
            "--lattice" => lattice = true,
            "--note" => note = require_value(args, "--note")?,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(RecordArgs {
        material: material.ok_or(ArgsError::MissingRequired { flag: "--material" })?,
        weight_g: weight_g.ok_or(ArgsError::MissingRequired { flag: "--weight" })?,
        hours,
        minutes,
        lattice,
        note,
    })
}

fn parse_machine(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut select = None;
    let mut years = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--select" => select = Some(require_value(args, "--select")?),
            "--years" => years = Some(parse_number(args, "--years")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    if years.is_some() && select.is_none() {
        return Err(ArgsError::MissingRequired { flag: "--select" });
    }
    Ok(Command::Machine { select, years })
}

fn parse_orders(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut limit = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--limit" => limit = Some(parse_number(args, "--limit")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(Command::Orders { limit })
}

fn parse_delete(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let raw = args.next().ok_or(ArgsError::MissingWorkOrderId)?;
    let id = raw
        .trim_start_matches('#')
        .parse::<WorkOrderId>()
        .map_err(ArgsError::InvalidWorkOrderId)?;
    no_options(args, Command::Delete(id))
}

/// Turns a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Parsed, ArgsError> {
        Cli::parse_from(args.iter().map(|s| (*s).to_owned()), |_| None)
    }

    fn command(args: &[&str]) -> Command {
        match parse(args).unwrap() {
            Parsed::Run(cli) => cli.command,
            Parsed::Help => panic!("expected a command"),
        }
    }

    #[test]
    fn quote_defaults_to_neutral_options() {
        assert_eq!(
            command(&["quote", "--material", "TC4 Titanium Alloy", "--weight", "42.5"]),
            Command::Quote(QuoteArgs {
                material: "TC4 Titanium Alloy".into(),
                weight_g: 42.5,
                difficulty: 1,
                risk: 0.0,
                post_hours: 0.0,
                post_rate: 0.0,
            })
        );
    }

    #[test]
    fn quote_requires_weight() {
        assert_eq!(
            parse(&["quote", "--material", "TC4"]).unwrap_err(),
            ArgsError::MissingRequired { flag: "--weight" }
        );
        assert!(matches!(
            parse(&["quote", "--material", "TC4", "--weight", "abc"]).unwrap_err(),
            ArgsError::InvalidNumber { flag: "--weight", .. }
        ));
    }

    #[test]
    fn global_flags_precede_the_command() {
        let Parsed::Run(cli) =
            parse(&["--db", "sqlite::memory:", "--config", "quote.toml", "stats"]).unwrap()
        else {
            panic!("expected a command");
        };
        assert_eq!(cli.db_url, "sqlite::memory:");
        assert_eq!(cli.config_path, Some(PathBuf::from("quote.toml")));
        assert_eq!(cli.command, Command::Stats);
    }

    #[test]
    fn environment_supplies_fallbacks() {
        let parsed = Cli::parse_from(["costs".to_owned()], |key| match key {
            DB_URL_ENV => Some("sqlite://tmp/quotes.sqlite3".into()),
            CONFIG_ENV => Some("site.toml".into()),
            _ => None,
        })
        .unwrap();
        let Parsed::Run(cli) = parsed else {
            panic!("expected a command");
        };
        assert_eq!(cli.db_url, "sqlite://tmp/quotes.sqlite3");
        assert_eq!(cli.config_path, Some(PathBuf::from("site.toml")));
    }

    #[test]
    fn record_and_delete() {
        assert_eq!(
            command(&[
                "record", "--material", "316L", "--weight", "150", "--hours", "47", "--minutes",
                "10", "--lattice", "--note", "bracket",
            ]),
            Command::Record(RecordArgs {
                material: "316L".into(),
                weight_g: 150.0,
                hours: 47.0,
                minutes: 10.0,
                lattice: true,
                note: "bracket".into(),
            })
        );
        assert_eq!(command(&["delete", "#7"]), Command::Delete(WorkOrderId::new(7)));
        assert_eq!(
            parse(&["delete"]).unwrap_err(),
            ArgsError::MissingWorkOrderId
        );
    }

    #[test]
    fn machine_years_need_a_selection() {
        assert_eq!(
            command(&["machine", "--select", "DW-HP200", "--years", "2"]),
            Command::Machine {
                select: Some("DW-HP200".into()),
                years: Some(2),
            }
        );
        assert_eq!(
            parse(&["machine", "--years", "2"]).unwrap_err(),
            ArgsError::MissingRequired { flag: "--select" }
        );
    }

    #[test]
    fn help_and_unknowns() {
        assert_eq!(parse(&["--help"]).unwrap(), Parsed::Help);
        assert_eq!(parse(&[]).unwrap_err(), ArgsError::MissingCommand);
        assert_eq!(
            parse(&["launch"]).unwrap_err(),
            ArgsError::UnknownCommand("launch".into())
        );
        assert_eq!(
            parse(&["stats", "--verbose"]).unwrap_err(),
            ArgsError::UnknownArg("--verbose".into())
        );
    }

    #[test]
    fn bare_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("data/quotes.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quotes.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}

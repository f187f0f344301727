//! # Command Line
//!
//! Hand-rolled argument parsing.
//!
//! ## Usage
//! ```bash
//! billgen generate --shop-name "Shop A" --location City --item Pen:10:5:2 --print
//! billgen history --search shop
//! billgen show <id> --json
//! billgen export <id> --format text --dir ./receipts
//! billgen session
//! ```

use billgen_core::{ProductInput, ShopDetails};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};
use crate::receipt::ExportFormat;

pub const USAGE: &str = "\
Bill Generator

Usage: billgen [--config PATH] [--db PATH] <COMMAND> [OPTIONS]

Commands:
  generate    Create and save a bill
                --shop-name NAME --location PLACE [--phone P] [--email E]
                --item NAME:PRICE:GST:QTY (repeatable) [--export] [--print]
  history     List saved bills, newest first   [--search TERM] [--json]
  show ID     Show one bill                    [--json]
  delete ID   Delete a bill from history
  clear       Delete every bill
  export ID   Write a receipt file             [--format html|text] [--dir DIR]
  print ID    Print a receipt to the terminal
  config      Show the effective configuration
  session     Build bills interactively

Global options:
  --config PATH   Config file (default: platform config dir/billgen.toml)
  --db PATH       History database file
  -h, --help      Show this help message

Environment:
  RUST_LOG, BILLGEN_DB_PATH, BILLGEN_EXPORT_DIR, BILLGEN_EXPORT_FORMAT,
  BILLGEN_CURRENCY_SYMBOL, BILLGEN_SHOP_NAME, BILLGEN_SHOP_LOCATION
";

/// Parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub command: Command,
}

/// Options of `generate`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateArgs {
    /// Shop fields given on the command line; blanks fall back to config.
    pub shop: ShopDetails,
    pub items: Vec<ProductInput>,
    pub export: bool,
    pub print: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Generate(GenerateArgs),
    History {
        search: Option<String>,
        json: bool,
    },
    Show {
        id: String,
        json: bool,
    },
    Delete {
        id: String,
    },
    Clear,
    Export {
        id: String,
        format: Option<ExportFormat>,
        dir: Option<PathBuf>,
    },
    Print {
        id: String,
    },
    Config,
    Session,
    Help,
}

impl Command {
    /// Whether the command needs the history database.
    pub fn needs_history(&self) -> bool {
        !matches!(self, Command::Config | Command::Help)
    }

    /// Whether output, errors included, should be JSON.
    pub fn wants_json(&self) -> bool {
        matches!(
            self,
            Command::History { json: true, .. } | Command::Show { json: true, .. }
        )
    }
}

/// Parses `args` (including the program name at index 0).
pub fn parse(args: &[String]) -> AppResult<Cli> {
    let mut config_path = None;
    let mut db_path = None;
    let mut rest: Vec<&str> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config_path = Some(PathBuf::from(value_of(args, i, "--config")?));
                i += 1;
            }
            "--db" => {
                db_path = Some(PathBuf::from(value_of(args, i, "--db")?));
                i += 1;
            }
            "--help" | "-h" => {
                return Ok(Cli {
                    config_path,
                    db_path,
                    command: Command::Help,
                })
            }
            other => rest.push(other),
        }
        i += 1;
    }

    let command = match rest.split_first() {
        None => Command::Help,
        Some((name, options)) => parse_command(name, options)?,
    };

    Ok(Cli {
        config_path,
        db_path,
        command,
    })
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> AppResult<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| AppError::usage(format!("{} needs a value", flag)))
}

fn parse_command(name: &str, options: &[&str]) -> AppResult<Command> {
    let mut opts = Options::new(options);

    let command = match name {
        "generate" => {
            let mut args = GenerateArgs::default();
            while let Some(flag) = opts.next_flag()? {
                match flag {
                    "--shop-name" => args.shop.name = opts.value(flag)?.to_string(),
                    "--location" => args.shop.location = opts.value(flag)?.to_string(),
                    "--phone" => args.shop = args.shop.with_phone(opts.value(flag)?),
                    "--email" => args.shop = args.shop.with_email(opts.value(flag)?),
                    "--item" => args.items.push(parse_item(opts.value(flag)?)?),
                    "--export" => args.export = true,
                    "--print" => args.print = true,
                    other => return Err(unknown_option("generate", other)),
                }
            }
            Command::Generate(args)
        }
        "history" => {
            let mut search = None;
            let mut json = false;
            while let Some(flag) = opts.next_flag()? {
                match flag {
                    "--search" => search = Some(opts.value(flag)?.to_string()),
                    "--json" => json = true,
                    other => return Err(unknown_option("history", other)),
                }
            }
            Command::History { search, json }
        }
        "show" => {
            let id = opts.positional("show", "ID")?;
            let mut json = false;
            while let Some(flag) = opts.next_flag()? {
                match flag {
                    "--json" => json = true,
                    other => return Err(unknown_option("show", other)),
                }
            }
            Command::Show { id, json }
        }
        "delete" => Command::Delete {
            id: opts.positional("delete", "ID")?,
        },
        "clear" => Command::Clear,
        "export" => {
            let id = opts.positional("export", "ID")?;
            let mut format = None;
            let mut dir = None;
            while let Some(flag) = opts.next_flag()? {
                match flag {
                    "--format" => {
                        format = Some(
                            opts.value(flag)?
                                .parse::<ExportFormat>()
                                .map_err(AppError::usage)?,
                        )
                    }
                    "--dir" => dir = Some(PathBuf::from(opts.value(flag)?)),
                    other => return Err(unknown_option("export", other)),
                }
            }
            Command::Export { id, format, dir }
        }
        "print" => Command::Print {
            id: opts.positional("print", "ID")?,
        },
        "config" => Command::Config,
        "session" => Command::Session,
        "help" => Command::Help,
        other => return Err(AppError::usage(format!("Unknown command: '{}'", other))),
    };

    opts.finish(name)?;
    Ok(command)
}

fn unknown_option(command: &str, option: &str) -> AppError {
    AppError::usage(format!("Unknown option for {}: '{}'", command, option))
}

/// Cursor over a command's options.
struct Options<'a> {
    items: &'a [&'a str],
    pos: usize,
}

impl<'a> Options<'a> {
    fn new(items: &'a [&'a str]) -> Self {
        Options { items, pos: 0 }
    }

    fn next_flag(&mut self) -> AppResult<Option<&'a str>> {
        match self.items.get(self.pos) {
            None => Ok(None),
            Some(item) if item.starts_with("--") => {
                self.pos += 1;
                Ok(Some(*item))
            }
            Some(item) => Err(AppError::usage(format!("Unexpected argument: '{}'", item))),
        }
    }

    fn value(&mut self, flag: &str) -> AppResult<&'a str> {
        let value = self
            .items
            .get(self.pos)
            .copied()
            .ok_or_else(|| AppError::usage(format!("{} needs a value", flag)))?;
        self.pos += 1;
        Ok(value)
    }

    fn positional(&mut self, command: &str, name: &str) -> AppResult<String> {
        match self.items.get(self.pos) {
            Some(item) if !item.starts_with("--") => {
                self.pos += 1;
                Ok(item.to_string())
            }
            _ => Err(AppError::usage(format!("{} needs {}", command, name))),
        }
    }

    fn finish(&self, command: &str) -> AppResult<()> {
        match self.items.get(self.pos) {
            None => Ok(()),
            Some(extra) => Err(AppError::usage(format!(
                "Unexpected argument for {}: '{}'",
                command, extra
            ))),
        }
    }
}

/// Parses `NAME:PRICE:GST:QTY`. The name may itself contain `:`.
///
/// Only the syntax is checked here; value rules (price > 0, GST 0-100,
/// quantity >= 1) are the controller's.
pub fn parse_item(raw: &str) -> AppResult<ProductInput> {
    let mut parts = raw.rsplitn(4, ':');
    let (quantity, gst, price, name) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(q), Some(g), Some(p), Some(n)) => (q, g, p, n),
        _ => {
            return Err(AppError::usage(format!(
                "Item '{}' must look like NAME:PRICE:GST:QTY",
                raw
            )))
        }
    };

    let price: f64 = price
        .trim()
        .parse()
        .map_err(|_| AppError::usage(format!("Invalid price '{}' in item '{}'", price, raw)))?;
    let gst: f64 = gst
        .trim()
        .parse()
        .map_err(|_| AppError::usage(format!("Invalid GST '{}' in item '{}'", gst, raw)))?;
    let quantity: u32 = quantity
        .trim()
        .parse()
        .map_err(|_| AppError::usage(format!("Invalid quantity '{}' in item '{}'", quantity, raw)))?;

    Ok(ProductInput::new(name, price, gst, quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn args(line: &str) -> Vec<String> {
        std::iter::once("billgen")
            .chain(line.split_whitespace())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_generate() {
        let cli = parse(&args(
            "generate --shop-name ShopA --location City --phone 123 --item Pen:10:5:2 --item Ink:2.5:18:4 --print",
        ))
        .unwrap();

        let Command::Generate(generate) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(generate.shop.name, "ShopA");
        assert_eq!(generate.shop.phone.as_deref(), Some("123"));
        assert_eq!(generate.items.len(), 2);
        assert_eq!(generate.items[1], ProductInput::new("Ink", 2.5, 18.0, 4));
        assert!(generate.print);
        assert!(!generate.export);
    }

    #[test]
    fn test_parse_global_options_anywhere() {
        let cli = parse(&args("history --db /tmp/b.db --search shop --json")).unwrap();
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/b.db")));
        assert_eq!(
            cli.command,
            Command::History {
                search: Some("shop".to_string()),
                json: true
            }
        );
    }

    #[test]
    fn test_parse_export() {
        let cli = parse(&args("export b-1 --format txt --dir out")).unwrap();
        assert_eq!(
            cli.command,
            Command::Export {
                id: "b-1".to_string(),
                format: Some(ExportFormat::Text),
                dir: Some(PathBuf::from("out")),
            }
        );
    }

    #[test]
    fn test_no_command_is_help() {
        assert_eq!(parse(&args("")).unwrap().command, Command::Help);
        assert_eq!(parse(&args("show x -h")).unwrap().command, Command::Help);
        assert!(!Command::Help.needs_history());
        assert!(Command::Clear.needs_history());
    }

    #[test]
    fn test_wants_json() {
        assert!(parse(&args("show b-1 --json")).unwrap().command.wants_json());
        assert!(parse(&args("history --json")).unwrap().command.wants_json());
        assert!(!parse(&args("show b-1")).unwrap().command.wants_json());
        assert!(!Command::Clear.wants_json());
    }

    #[test]
    fn test_usage_errors() {
        for line in [
            "frobnicate",
            "show",
            "delete",
            "show b-1 extra",
            "history --search",
            "generate --item Pen:10",
            "generate --colour red",
            "export b-1 --format pdf",
            "--db",
        ] {
            let err = parse(&args(line)).unwrap_err();
            assert_eq!(err.code, ErrorCode::Usage, "{line}");
        }
    }

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("Pen:10:5:2").unwrap(), ProductInput::new("Pen", 10.0, 5.0, 2));
        assert_eq!(
            parse_item("Cable 2m:USB-C:199:18:1").unwrap().name,
            "Cable 2m:USB-C"
        );
        assert!(parse_item("Pen:ten:5:2").is_err());
        assert!(parse_item("Pen:10:5:-1").is_err());
        assert!(parse_item("Pen:10:5:1.5").is_err());
    }

    #[test]
    fn test_parse_item_leaves_value_rules_to_validation() {
        let item = parse_item("Pen:0:5:0").unwrap();
        assert_eq!(item.price.value(), 0.0);
        assert_eq!(item.quantity, 0);
    }
}

use colored::Colorize;
use dotstore::{Store, StoreConfig};
use serde_json::Value;

use crate::cli::*;

/// What the process should exit with after a command ran.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Missing,
}

pub fn run_command(cli: Cli) -> anyhow::Result<Outcome> {
    let config = StoreConfig::new(&cli.file);
    let config = if cli.compact { config.compact() } else { config.with_indent(cli.indent) };
    let mut store = Store::with_config(config)?;

    match cli.command {
        Command::Get(args) => cmd_get(&store, &args.key),
        Command::Set(args) => cmd_set(&mut store, args),
        Command::Del(args) => cmd_del(&mut store, &args.key),
        Command::Has(args) => cmd_has(&store, &args.key),
        Command::Keys => {
            for key in store.keys() {
                println!("{key}");
            }
            Ok(Outcome::Success)
        }
        Command::Dump => {
            println!("{}", serde_json::to_string_pretty(store.document())?);
            Ok(Outcome::Success)
        }
    }
}

/// Parse a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Render a value as JSON, so a string comes out quoted and stays
/// distinguishable from a number or a literal.
fn render(value: &Value) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn cmd_get(store: &Store, key: &str) -> anyhow::Result<Outcome> {
    let value = store.get(key)?;
    println!("{}", render(&value)?);
    Ok(Outcome::Success)
}

fn cmd_set(store: &mut Store, args: SetArgs) -> anyhow::Result<Outcome> {
    let value = parse_value(&args.value);
    store.set(args.key.as_str(), value)?;
    println!("{} {}", "✓ set".green(), args.key.bold());
    Ok(Outcome::Success)
}

fn cmd_del(store: &mut Store, key: &str) -> anyhow::Result<Outcome> {
    store.delete(key)?;
    println!("{} {}", "✓ deleted".green(), key.bold());
    Ok(Outcome::Success)
}

fn cmd_has(store: &Store, key: &str) -> anyhow::Result<Outcome> {
    if store.contains(key)? {
        println!("{}", "true".green());
        Ok(Outcome::Success)
    } else {
        println!("{}", "false".red());
        Ok(Outcome::Missing)
    }
}

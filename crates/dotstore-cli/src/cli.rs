use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dotstore",
    about = "Read and edit a JSON file as a dotted-path key/value store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Backing JSON file (created if missing)
    #[arg(short, long, global = true, default_value = "data.json")]
    pub file: PathBuf,

    /// Spaces per indentation level in the written file
    #[arg(
        long,
        global = true,
        default_value_t = dotstore::DEFAULT_INDENT,
        conflicts_with = "compact"
    )]
    pub indent: usize,

    /// Write the file on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the value at a dotted path
    Get(KeyArgs),
    /// Store a value at a dotted path
    Set(SetArgs),
    /// Remove the value at a dotted path
    Del(KeyArgs),
    /// Report whether a dotted path exists
    Has(KeyArgs),
    /// List top-level keys
    Keys,
    /// Print the whole document
    Dump,
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    /// A JSON literal; anything that does not parse is stored as a string
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get() {
        let cli = Cli::try_parse_from(["dotstore", "get", "user.name"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.key, "user.name");
        } else { panic!("wrong command"); }
        assert_eq!(cli.file, PathBuf::from("data.json"));
        assert_eq!(cli.indent, 2);
    }

    #[test]
    fn parse_set() {
        let cli = Cli::try_parse_from(["dotstore", "set", "user.age", "30"]).unwrap();
        if let Command::Set(args) = cli.command {
            assert_eq!(args.key, "user.age");
            assert_eq!(args.value, "30");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_file_and_format() {
        let cli =
            Cli::try_parse_from(["dotstore", "--file", "/tmp/s.json", "--compact", "dump"])
                .unwrap();
        assert_eq!(cli.file, PathBuf::from("/tmp/s.json"));
        assert!(cli.compact);
        assert!(matches!(cli.command, Command::Dump));
    }

    #[test]
    fn parse_indent() {
        let cli = Cli::try_parse_from(["dotstore", "keys", "--indent", "4"]).unwrap();
        assert_eq!(cli.indent, 4);
        assert!(matches!(cli.command, Command::Keys));
    }

    #[test]
    fn indent_conflicts_with_compact() {
        assert!(Cli::try_parse_from(["dotstore", "--indent", "4", "--compact", "keys"]).is_err());
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["dotstore", "--verbose", "has", "a"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Has(_)));
    }

    #[test]
    fn set_requires_value() {
        assert!(Cli::try_parse_from(["dotstore", "set", "a"]).is_err());
    }
}

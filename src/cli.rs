//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use spiota_core::profile::parse_size;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use, as name[:key=value,...] [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "spiota")]
#[command(author, version, about = "SPI flash programmer for USB-to-SPI bridges", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short, long, global = true, default_value = "usb", help = programmer_help())]
    pub programmer: String,

    /// Flash profile file (TOML)
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Override the program page size (hex or decimal)
    #[arg(long, global = true, value_parser = parse_hex_u32)]
    pub page_size: Option<u32>,

    /// Override the bytes fetched per read transaction (hex or decimal)
    #[arg(long, global = true, value_parser = parse_hex_u32)]
    pub read_chunk: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the requested verbosity; `RUST_LOG` still wins
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reset the bridge and read the flash JEDEC and unique IDs
    Probe,

    /// Show the flash status registers
    Status,

    /// Read flash contents to file
    Read {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to read (e.g., 0x100000 or "1 MiB")
        #[arg(long, value_parser = parse_size)]
        length: u32,
    },

    /// Erase the 64 KiB blocks covering a range
    Erase {
        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32)]
        start: u32,

        /// Length of region to erase (e.g., 0x10000 or "64 KiB")
        #[arg(long, value_parser = parse_size)]
        length: u32,
    },

    /// Write file to flash
    Write {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Don't erase before writing
        #[arg(long)]
        no_erase: bool,

        /// Don't read back and compare after writing
        #[arg(long)]
        no_verify: bool,
    },

    /// Verify flash contents against file
    Verify {
        /// Input file path to verify against
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,
    },

    /// List supported programmers
    ListProgrammers,

    /// List connected USB bridges
    ListDevices,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_sets_log_filter() {
        let filter = |args: &[&str]| Cli::try_parse_from(args).unwrap().log_filter();
        assert_eq!(filter(&["spiota", "probe"]), "info");
        assert_eq!(filter(&["spiota", "-v", "probe"]), "debug");
        assert_eq!(filter(&["spiota", "probe", "-vv"]), "trace");
        assert_eq!(filter(&["spiota", "-vvv", "probe"]), "trace");

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(filter(&["spiota", "-v", "status"]));
        let logger = builder.build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x10000"), Ok(0x10000));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_parse_write() {
        let cli = Cli::try_parse_from([
            "spiota",
            "-p",
            "dummy:size=1MiB",
            "write",
            "-i",
            "fw.bin",
            "--start",
            "0x1000",
            "--no-verify",
        ])
        .unwrap();
        assert_eq!(cli.programmer, "dummy:size=1MiB");
        match cli.command {
            Commands::Write {
                start,
                no_erase,
                no_verify,
                ..
            } => {
                assert_eq!(start, 0x1000);
                assert!(!no_erase);
                assert!(no_verify);
            }
            _ => panic!("expected write"),
        }
    }

    #[test]
    fn test_parse_read_size_suffix() {
        let cli =
            Cli::try_parse_from(["spiota", "read", "-o", "out.bin", "--length", "1 MiB"]).unwrap();
        assert_eq!(cli.programmer, "usb");
        assert!(matches!(
            cli.command,
            Commands::Read {
                start: 0,
                length: 0x100000,
                ..
            }
        ));
    }
}

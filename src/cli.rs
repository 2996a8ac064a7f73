//! Command-line surface: `monitor`, `dump`, `version`, `-r <reg>...`.

use clap::{Parser, Subcommand};

use crate::error::EcError;
use crate::protocol::RegisterRead;
use crate::render::ValueFormat;

const EXAMPLES: &str = "\
Examples:
  ecreader monitor             Monitor with 5 second updates
  ecreader monitor -i 3        Monitor with 3 second updates
  ecreader monitor -d          Monitor showing decimal values
  ecreader -r 30               Read register 0x30
  ecreader -r 30 31 32         Read multiple registers
  ecreader -r 30 -v            Read with verbose debug output
  ecreader -r 30 -d            Read register 0x30 in decimal
  ecreader dump                Dump all 256 registers
  ecreader dump -d             Dump in decimal format";

#[derive(Debug, Parser)]
#[command(
    name = "ecreader",
    about = "EC Register Reader - READ-ONLY Tool",
    long_about = "EC Register Reader - READ-ONLY Tool\n\
                  PawnIO Driver Must be Installed. Admin Privilege Required!",
    disable_version_flag = true,
    after_help = EXAMPLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Read specific register(s), hex addresses
    #[arg(short = 'r', value_name = "REG", num_args = 1.., value_parser = parse_register)]
    pub read: Option<Vec<u8>>,

    /// Update interval for monitor in seconds (default: 5, min: 2)
    #[arg(short = 'i', value_name = "SECONDS", global = true)]
    pub interval: Option<u64>,

    /// Display values in decimal instead of hex
    #[arg(short = 'd', global = true)]
    pub decimal: bool,

    /// Verbose mode (for -r command only)
    #[arg(short = 'v', global = true)]
    pub verbose: bool,

    /// Show statistics after operation
    #[arg(short = 's', global = true)]
    pub stats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Monitor all registers, show changes
    Monitor,
    /// Dump all registers in grid format
    Dump,
    /// Show version information
    Version,
}

/// What the invocation asks for, after cross-argument checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Usage,
    Version,
    Read(Vec<u8>),
    Dump,
    Monitor,
}

impl Cli {
    pub fn action(&self) -> Result<Action, String> {
        match (&self.command, &self.read) {
            (Some(_), Some(_)) => Err("-r cannot be combined with a command".into()),
            (None, None) => Ok(Action::Usage),
            (None, Some(regs)) => Ok(Action::Read(regs.clone())),
            (Some(Command::Version), None) => Ok(Action::Version),
            (Some(Command::Dump), None) => Ok(Action::Dump),
            (Some(Command::Monitor), None) => Ok(Action::Monitor),
        }
    }

    pub fn format(&self, config_decimal: bool) -> ValueFormat {
        if self.decimal || config_decimal { ValueFormat::Decimal } else { ValueFormat::Hex }
    }
}

/// Hex register number, `30` or `0x30`.
pub fn parse_register(s: &str) -> Result<u8, EcError> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u8::from_str_radix(digits, 16).map_err(|_| EcError::InvalidRegister(s.to_string()))
}

/// Read-mode line: `0x30:5A,0x31:??`.
pub fn format_reads(reads: &[RegisterRead], format: ValueFormat) -> String {
    reads
        .iter()
        .map(|r| match r.value.value() {
            Some(v) => format!("0x{:02X}:{}", r.address, format.value(v)),
            None => format!("0x{:02X}:??", r.address),
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn version_line() -> String {
    format!("ECReader v{}", env!("CARGO_PKG_VERSION"))
}

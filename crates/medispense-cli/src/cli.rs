//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use medispense_rfid::ScanProfile;

/// Card scanning and dispensing from the command line.
#[derive(Parser, Debug)]
#[command(name = "medispense")]
#[command(about = "Medispense card reader and dispenser tool", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(short, long, global = true, env = "MEDISPENSE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serial device, overrides the settings file
    #[arg(short, long, global = true, env = "MEDISPENSE_PORT")]
    pub port: Option<String>,

    /// Baud rate, overrides the settings file
    #[arg(short, long, global = true)]
    pub baud: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan one card and print its identifier.
    Scan(ScanArgs),

    /// Dispense a visit's medication.
    Dispense(VisitArgs),

    /// Print a visit's prescription.
    Details(VisitArgs),

    /// Print machine status, stock and the day's dispensing log.
    Status(StatusArgs),

    /// List serial ports on this host.
    Ports,
}

/// Arguments of `scan`.
#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Device on the other end of the link
    #[arg(long, value_enum, default_value_t = ProfileKind::Portal)]
    pub profile: ProfileKind,

    /// Give up after this many milliseconds (0 waits until Ctrl-C)
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,
}

/// Arguments of the commands that address one visit.
#[derive(clap::Args, Debug)]
pub struct VisitArgs {
    /// Patient (card) identifier
    #[arg(long)]
    pub patient: String,

    /// Visit date, `YYYY-MM-DD`
    #[arg(long)]
    pub visit: String,

    /// JSON file seeding the in-memory document store
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,
}

/// Arguments of `status`.
#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Log date, `YYYY-MM-DD` (default: today)
    #[arg(long)]
    pub date: Option<String>,

    /// JSON file seeding the in-memory document store
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,
}

/// Card reading front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileKind {
    /// Doctor-portal reader (`S` trigger, `ID:` text frames)
    Portal,
    /// Kiosk dispenser controller (`START` trigger, `PID:` binary frames)
    Kiosk,
}

impl ProfileKind {
    /// Scan profile for this front-end.
    pub fn profile(self) -> ScanProfile {
        match self {
            ProfileKind::Portal => ScanProfile::portal(),
            ProfileKind::Kiosk => ScanProfile::kiosk(),
        }
    }
}

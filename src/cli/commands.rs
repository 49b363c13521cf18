//! CLI subcommand definitions

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};

use crate::cargo::{CargoType, PackagingKind};

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Sign in by typing an employee code
    Login {
        /// Employee code, e.g. EMP001 (digits alone get the EMP prefix)
        code: String,
    },
    /// Sign in with a scanned badge; payloads are read from stdin, one per line
    Scan {
        /// Ignore a repeated payload for this many seconds
        #[arg(long, value_name = "SECS")]
        cooldown_secs: Option<u64>,
    },
    /// Show which employee code a QR payload carries
    Decode {
        payload: String,
    },
    /// Show the current session (default)
    Status,
    /// End the session and drop the unsent cargo list
    Logout,
    /// List known employees
    Employees,
    /// Add cargo to the list
    Add(AddArgs),
    /// Show every unit in the list
    List,
    /// Show the list grouped by kind
    Groups,
    /// Show list totals
    Summary,
    /// Remove one unit or a whole group
    Remove(RemoveArgs),
    /// Empty the list
    Clear,
    /// Send the list to the operator and start a new one
    Send,
    /// Show sent shipments
    History,
}

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// euro-pallet, american-pallet, box or non-standard
    #[arg(long = "type", value_name = "TYPE")]
    pub(crate) cargo_type: CargoType,

    /// Length in cm (defaults to the type's preset)
    #[arg(long, value_name = "CM")]
    pub(crate) length: Option<u32>,

    /// Width in cm (defaults to the type's preset)
    #[arg(long, value_name = "CM")]
    pub(crate) width: Option<u32>,

    /// Height in cm (defaults to the type's preset)
    #[arg(long, value_name = "CM")]
    pub(crate) height: Option<u32>,

    /// Total weight of all units in kg
    #[arg(long, value_name = "KG")]
    pub(crate) weight: f64,

    /// Number of identical units
    #[arg(long, short = 'q', default_value_t = 1)]
    pub(crate) quantity: u32,

    /// none, crate or pallet-rail
    #[arg(long, value_name = "KIND", default_value = "none")]
    pub(crate) packaging: PackagingKind,

    /// Number of packaging pieces
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub(crate) packaging_count: u32,

    /// Attach a photo (repeatable)
    #[arg(long = "photo", value_name = "PATH")]
    pub(crate) photos: Vec<PathBuf>,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["id", "group"])))]
pub(crate) struct RemoveArgs {
    /// Record id
    #[arg(long)]
    pub(crate) id: Option<u64>,

    /// Group key, as shown by `intake groups`
    #[arg(long, value_name = "KEY")]
    pub(crate) group: Option<String>,
}

//! Global options shared by every subcommand, and how config file values
//! fill the ones left unset.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{Config, ConfigColorMode, ConfigSortOrder};

use super::commands::Commands;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum SortOrder {
    /// Oldest first (default)
    #[default]
    Asc,
    /// Newest first
    Desc,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Warehouse cargo intake: employee sign-in and shipment lists", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Output as CSV (list and history)
    #[arg(long, global = true, conflicts_with = "json")]
    pub(crate) csv: bool,

    /// Filter JSON output with jq expression (requires jq installed)
    #[arg(long, global = true, value_name = "FILTER")]
    pub(crate) jq: Option<String>,

    /// Sort order for listings
    #[arg(short, long, global = true, value_enum, default_value = "asc")]
    pub(crate) order: SortOrder,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Timezone for time display (e.g., "Europe/Moscow", "UTC")
    #[arg(long, global = true, value_name = "TZ")]
    pub(crate) timezone: Option<String>,

    /// Locale for number formatting (e.g., "en", "ru", "de")
    #[arg(long, global = true, value_name = "LOCALE")]
    pub(crate) locale: Option<String>,

    /// Directory holding the intake database
    #[arg(long, global = true, value_name = "DIR")]
    pub(crate) data_dir: Option<PathBuf>,

    /// Keep all state in memory for this run only
    #[arg(long, global = true)]
    pub(crate) memory: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub(crate) debug: bool,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.no_color && config.no_color {
            self.no_color = true;
        }

        // Config enums only replace the CLI defaults
        if let Some(order) = config.order
            && self.order == SortOrder::Asc
        {
            self.order = order.into();
        }
        if let Some(color) = config.color
            && self.color == ColorMode::Auto
        {
            self.color = color.into();
        }

        // String options: only apply if CLI didn't set them
        if self.timezone.is_none() {
            self.timezone = config.timezone.clone();
        }
        if self.locale.is_none() {
            self.locale = config.locale.clone();
        }

        self
    }

    fn color_enabled(&self, is_terminal: bool) -> bool {
        match (self.no_color, self.color) {
            (true, _) | (false, ColorMode::Never) => false,
            (false, ColorMode::Always) => true,
            (false, ColorMode::Auto) => is_terminal,
        }
    }

    /// Colors for tables and listings on stdout
    pub(crate) fn use_color(&self) -> bool {
        self.color_enabled(std::io::stdout().is_terminal())
    }

    /// Colors for notifications, which go to stderr
    pub(crate) fn use_stderr_color(&self) -> bool {
        self.color_enabled(std::io::stderr().is_terminal())
    }
}

impl From<ConfigSortOrder> for SortOrder {
    fn from(order: ConfigSortOrder) -> Self {
        match order {
            ConfigSortOrder::Asc => SortOrder::Asc,
            ConfigSortOrder::Desc => SortOrder::Desc,
        }
    }
}

impl From<ConfigColorMode> for ColorMode {
    fn from(mode: ConfigColorMode) -> Self {
        match mode {
            ConfigColorMode::Auto => ColorMode::Auto,
            ConfigColorMode::Always => ColorMode::Always,
            ConfigColorMode::Never => ColorMode::Never,
        }
    }
}

use crate::preview::DEFAULT_PREVIEW_LIMIT;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "apotek-tools",
    version,
    about = "Apotek Tools - CLI for interacting with the Apotek Aulia Farma API"
)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Commands for managing price lists
    Pricelist {
        #[command(subcommand)]
        action: PricelistCommands,
    },

    /// Commands for authentication management
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },

    /// Commands for managing application configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Fetch the price list and generate an Excel file (same as `pricelist fetch`)
    Fetch(FetchArgs),

    /// Manage cookies for API authentication (same as `auth cookie`)
    Cookie(CookieArgs),

    /// Display information about the API and tool
    Info {
        /// Path to config file (default: apotek_config.json)
        #[arg(long)]
        config_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PricelistCommands {
    /// Fetch drug price list from the API and generate an Excel file
    Fetch(FetchArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommands {
    /// Manage cookies for API authentication
    Cookie(CookieArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Manage contact information shown in the Excel file
    Contact(ContactArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Cookie value to use for authentication (JSON format)
    #[arg(short, long)]
    pub cookie: Option<String>,

    /// Path to cookie file (default: `api.cookie_file` from the config, cookie.json)
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Preview the data before generating Excel (default)
    #[arg(long, overrides_with = "no_preview")]
    pub preview: bool,

    /// Skip the preview and write straight away
    #[arg(long, overrides_with = "preview")]
    pub no_preview: bool,

    /// Number of items to preview
    #[arg(long, default_value_t = DEFAULT_PREVIEW_LIMIT)]
    pub preview_limit: usize,

    /// Path to config file (default: apotek_config.json)
    #[arg(long)]
    pub config_file: Option<PathBuf>,
}

impl FetchArgs {
    pub fn preview_enabled(&self) -> bool {
        !self.no_preview
    }
}

#[derive(Args, Debug, Clone)]
pub struct CookieArgs {
    /// Set cookie value
    #[arg(long, conflicts_with_all = ["get", "delete"])]
    pub set: bool,

    /// Get cookie value
    #[arg(long, conflicts_with = "delete")]
    pub get: bool,

    /// Delete cookie file
    #[arg(long)]
    pub delete: bool,

    /// Cookie file path
    #[arg(short, long, default_value = "cookie.json")]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ContactArgs {
    /// Set WhatsApp contact number
    #[arg(long)]
    pub whatsapp: Option<String>,

    /// Set email contact address
    #[arg(long)]
    pub email: Option<String>,

    /// Show current contact info (also the default when nothing is set)
    #[arg(long)]
    pub show: bool,

    /// Path to config file (default: apotek_config.json)
    #[arg(long)]
    pub config_file: Option<PathBuf>,
}

impl ContactArgs {
    /// Whether any contact field is being changed.
    pub fn has_updates(&self) -> bool {
        self.whatsapp.is_some() || self.email.is_some()
    }
}

use clap::{Parser, Subcommand};

use crate::api::{DEFAULT_BASE_URL, DEFAULT_SECONDARY_BASE_URL, DEFAULT_TIMEOUT_MS};
use crate::billing::DEFAULT_MAX_PAGES;
use crate::display::DEFAULT_CONTEXT_LIMIT;
use crate::utils::NumberLocale;

#[derive(Parser, Debug)]
#[command(name = "plan-statusline", version, about = "Coding-plan quota and usage status line")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Debug mode: verbose logging on stderr
    #[arg(long, global = true, env = "PLAN_STATUSLINE_DEBUG")]
    pub debug: bool,

    /// Disable colored output (NO_COLOR is honored as well)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// API base URL for the primary account
    #[arg(long, global = true, env = "PLAN_STATUSLINE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// API base URL for the secondary account
    #[arg(
        long,
        global = true,
        env = "PLAN_STATUSLINE_SECONDARY_BASE_URL",
        default_value = DEFAULT_SECONDARY_BASE_URL
    )]
    pub secondary_base_url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, env = "PLAN_STATUSLINE_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Upper bound on billing pages fetched per refresh
    #[arg(long, global = true, env = "PLAN_STATUSLINE_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,

    /// Model whose quota is reported (defaults to the first one returned)
    #[arg(long, global = true, env = "PLAN_STATUSLINE_MODEL")]
    pub model: Option<String>,

    /// Number suffix style: en (K/M/B) | zh (万/亿)
    #[arg(long, global = true, value_enum, env = "PLAN_STATUSLINE_LOCALE", default_value_t = NumberLocale::En)]
    pub locale: NumberLocale,

    /// Context window size used for the context percentage
    #[arg(long, global = true, env = "PLAN_STATUSLINE_CONTEXT_LIMIT", default_value_t = DEFAULT_CONTEXT_LIMIT)]
    pub context_limit: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show quota and usage once, or continuously with --watch
    Status {
        /// Emit JSON instead of colored text
        #[arg(long)]
        json: bool,

        /// Refresh repeatedly until interrupted
        #[arg(long)]
        watch: bool,

        /// Seconds between refreshes in watch mode
        #[arg(long, env = "PLAN_STATUSLINE_INTERVAL", default_value_t = 30)]
        interval: u64,
    },
    /// Read status-line hook JSON on stdin and print one line
    Statusline,
    /// Save API credentials
    Auth {
        token: String,
        group_id: String,

        /// Store as the secondary account
        #[arg(long)]
        secondary: bool,
    },
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}

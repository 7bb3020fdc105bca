//! Clap derive structures for the `stockpile` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stockpile -- manage your product inventory from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "stockpile",
    version,
    about = "Manage a Stockpile product inventory from the command line",
    long_about = "Command-line client for the Stockpile inventory API.\n\n\
        Sign in once with `stockpile auth login`; the session cookie is kept\n\
        in your data directory until `stockpile auth logout`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// API base URL (overrides config file and STOCKPILE_API_URL)
    #[arg(long, short = 'u', global = true)]
    pub api_url: Option<String>,

    /// Config file to read instead of the platform default
    #[arg(long, env = "STOCKPILE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Session file to use instead of the platform default
    #[arg(long, env = "STOCKPILE_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STOCKPILE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: none)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register, sign in and out, show the current user
    Auth(AuthArgs),

    /// List, inspect, create, update and delete products
    #[command(alias = "p")]
    Products(ProductsArgs),

    /// Check that the API is up
    Health,

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Args)]
pub struct CredentialArgs {
    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Account password (prompted when omitted)
    #[arg(long, env = "STOCKPILE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Create an account and sign in
    Register(CredentialArgs),

    /// Sign in and keep the session for later commands
    Login(CredentialArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Me,
}

// ── Products ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List your products
    #[command(alias = "ls")]
    List,

    /// Show one product
    Get {
        /// Product ID
        id: String,
    },

    /// Create a product
    Create {
        /// Product name
        #[arg(long, short = 'n')]
        name: String,

        /// Price as a decimal string (e.g. 9.99)
        #[arg(long)]
        price: String,

        /// Optional description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Units in stock
        #[arg(long, short = 's', default_value = "0")]
        stock: i32,
    },

    /// Change fields of a product (only the given ones are sent)
    Update {
        /// Product ID
        id: String,

        #[arg(long, short = 'n')]
        name: Option<String>,

        #[arg(long)]
        price: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long, short = 's')]
        stock: Option<i32>,
    },

    /// Delete a product
    #[command(alias = "rm")]
    Delete {
        /// Product ID
        id: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration (file + env + flags)
    Show,

    /// Print the config and session file locations
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

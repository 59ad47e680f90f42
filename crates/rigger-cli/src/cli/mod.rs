//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums. No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "rigger",
    bin_name = "rigger",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{2699} Infrastructure for scaffolded applications",
    long_about = "Rigger provisions the databases, caches, queues, search engines and \
                  object stores an application needs, in containers when it can and \
                  against local installations when it cannot, then writes the \
                  connection settings into the project.",
    after_help = "EXAMPLES:\n\
        \x20 rigger provision apps/shop --database pgsql --cache redis\n\
        \x20 rigger provision apps/api  --queue rabbitmq --no-docker\n\
        \x20 rigger apply ops.json --project apps/shop\n\
        \x20 rigger completions bash > /usr/share/bash-completion/completions/rigger",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision backing services for an application.
    #[command(
        visible_alias = "p",
        about = "Provision backing services",
        after_help = "EXAMPLES:\n\
            \x20 rigger provision apps/shop --database pgsql --cache redis -y\n\
            \x20 rigger provision apps/shop --search meilisearch --storage minio\n\
            \x20 rigger provision apps/shop --plan infra.json --dry-run"
    )]
    Provision(ProvisionArgs),

    /// Apply configuration operations to project files.
    #[command(
        about = "Apply configuration operations",
        after_help = "EXAMPLES:\n\
            \x20 rigger apply ops.json\n\
            \x20 rigger apply ops.json --project apps/shop --dry-run"
    )]
    Apply(ApplyArgs),

    /// Initialise a rigger configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 rigger init           # user config directory\n\
            \x20 rigger init --local   # .rigger.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 rigger completions bash > ~/.local/share/bash-completion/completions/rigger\n\
            \x20 rigger completions zsh  > ~/.zfunc/_rigger\n\
            \x20 rigger completions fish > ~/.config/fish/completions/rigger.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect and edit the rigger configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 rigger config get provisioning.poll_attempts\n\
            \x20 rigger config set provisioning.use_containers false\n\
            \x20 rigger config list"
    )]
    Config(ConfigCommands),
}

// ── provision ─────────────────────────────────────────────────────────────────

/// Arguments for `rigger provision`.
#[derive(Debug, Args)]
pub struct ProvisionArgs {
    /// Application directory; the manifest and env file live here.
    #[arg(value_name = "DIR", default_value = ".", help = "Application directory")]
    pub dir: PathBuf,

    /// Relational database driver.
    #[arg(
        long = "database",
        visible_alias = "db",
        value_name = "DRIVER",
        help = "Database driver (sqlite, mysql, mariadb, pgsql, sqlsrv)"
    )]
    pub database: Option<String>,

    /// Cache driver.
    #[arg(
        long = "cache",
        value_name = "DRIVER",
        help = "Cache driver (array, file, database, redis, memcached)"
    )]
    pub cache: Option<String>,

    /// Queue driver.
    #[arg(
        long = "queue",
        value_name = "DRIVER",
        help = "Queue driver (sync, database, redis, rabbitmq, sqs)"
    )]
    pub queue: Option<String>,

    /// Search engine driver.
    #[arg(
        long = "search",
        value_name = "DRIVER",
        help = "Search driver (collection, database, meilisearch, typesense, elasticsearch, opensearch)"
    )]
    pub search: Option<String>,

    /// Object storage driver.
    #[arg(
        long = "storage",
        value_name = "DRIVER",
        help = "Storage driver (local, minio, s3)"
    )]
    pub storage: Option<String>,

    /// Plan file with full records per backend kind.
    #[arg(
        long = "plan",
        value_name = "FILE",
        help = "JSON plan file: {\"database\": {\"driver\": \"pgsql\", ...}, ...}"
    )]
    pub plan: Option<PathBuf>,

    /// Use local installations only.
    #[arg(long = "no-docker", help = "Never start containers")]
    pub no_docker: bool,

    /// Do not touch the environment file.
    #[arg(long = "no-env", help = "Skip writing the environment file")]
    pub no_env: bool,

    /// Environment file, relative to DIR.
    #[arg(
        long = "env-file",
        value_name = "FILE",
        help = "Environment file to write (default from config, usually .env)"
    )]
    pub env_file: Option<String>,

    /// Directory with `<service>.yml` fragments overriding the built-in ones.
    #[arg(
        long = "stubs",
        value_name = "DIR",
        help = "Directory of compose fragment overrides"
    )]
    pub stubs: Option<PathBuf>,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", help = "Skip confirmation")]
    pub yes: bool,

    /// Print the plan without starting anything or writing files.
    #[arg(long = "dry-run", help = "Show what would be provisioned")]
    pub dry_run: bool,
}

// ── apply ─────────────────────────────────────────────────────────────────────

/// Arguments for `rigger apply`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// JSON array of `{"action", "file", "values"}` objects.
    #[arg(value_name = "OPS_FILE", help = "Operations document (JSON)")]
    pub operations: PathBuf,

    /// Project root the operation paths are relative to.
    #[arg(
        short = 'p',
        long = "project",
        value_name = "DIR",
        default_value = ".",
        help = "Project root"
    )]
    pub project: PathBuf,

    /// List the operations without applying them.
    #[arg(long = "dry-run", help = "Show operations without applying")]
    pub dry_run: bool,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `rigger init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.rigger.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `rigger completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `rigger config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `provisioning.poll_attempts`.
        key: String,
    },
    /// Set a key in the active configuration file.
    Set {
        /// Dotted key path.
        key: String,
        /// New value; `true`/`false` and integers are stored typed.
        value: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

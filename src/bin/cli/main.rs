//! CLI tool for jarshade.

mod commands;
mod exit_codes;
mod output;
mod progress;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Merge Java archives into one, relocating packages
#[derive(Parser)]
#[command(name = "jarshade")]
#[command(author, version, about = "Merge Java archives into one, relocating packages", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output and informational logs
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Shade input archives into one (alias: s)
    #[command(alias = "s")]
    Shade(ShadeArgs),

    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments of the shade command.
#[derive(Args, Debug, Default)]
pub struct ShadeArgs {
    /// Input archives, in priority order
    pub inputs: Vec<PathBuf>,

    /// Output archive
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// JSON worklist; flags below add to its rules
    #[arg(short = 'c', long, conflicts_with_all = ["inputs", "output"])]
    pub config: Option<PathBuf>,

    /// Relocate a package prefix (FROM or FROM=TO)
    #[arg(short = 'r', long = "relocate", value_name = "FROM[=TO]")]
    pub relocate: Vec<String>,

    /// Class name or glob left in place by every relocation
    #[arg(long = "relocate-exclude", value_name = "CLASS")]
    pub relocate_exclude: Vec<String>,

    /// Merge META-INF/services files
    #[arg(long)]
    pub services: bool,

    /// Merge Plexus components.xml registries
    #[arg(long)]
    pub components_xml: bool,

    /// Drop bundled Apache LICENSE files
    #[arg(long)]
    pub apache_license: bool,

    /// Merge Apache NOTICE files
    #[arg(long)]
    pub apache_notice: bool,

    /// Main-Class written to the manifest
    #[arg(long, value_name = "CLASS")]
    pub main_class: Option<String>,

    /// Drop resources matching a glob
    #[arg(short = 'x', long = "exclude-resource", value_name = "GLOB")]
    pub exclude_resource: Vec<String>,

    /// Skip inputs whose file name matches a glob
    #[arg(long = "exclude-input", value_name = "GLOB")]
    pub exclude_input: Vec<String>,

    /// Store entries without compression
    #[arg(long)]
    pub store: bool,

    /// Compression level (0-9)
    #[arg(short = 'l', long)]
    pub level: Option<u32>,

    /// Leave string constants untouched
    #[arg(long)]
    pub no_string_relocation: bool,

    /// Relocate resource paths as well as classes
    #[arg(long)]
    pub relocate_resources: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();

    let exit_code = match cli.command {
        Commands::Shade(args) => commands::shade(&args, cli.format, cli.quiet),

        Commands::List { archive } => commands::list(&archive, cli.format),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}

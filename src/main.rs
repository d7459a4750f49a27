use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use sslc::config::Config;
use sslc::error::SslcResult;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON settings file; flags given on the command line take precedence
    #[arg(global = true, long = "config", value_name = "PATH")]
    config_file: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze the structs of Solidity source files
    Check(cmd::check::CheckArgs),
    /// Run the slot packer on a plain list of byte sizes
    Pack(cmd::pack::PackArgs),
}

fn resolve_config(
    path: Option<&Path>,
    cli_config: &Config,
    matches: Option<&ArgMatches>,
) -> SslcResult<Config> {
    let Some(path) = path else {
        cli_config.validate()?;
        return Ok(cli_config.clone());
    };

    info!("⚙️  Loading settings from: {}", path.display());
    let mut config = Config::load_from_file(path)?;
    if let Some(matches) = matches {
        config.merge_from_cli(cli_config, matches);
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    // Raw matches tell explicit flags apart from defaults when merging settings.
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let (cli_config, sub_matches) = match &cli.command {
        Commands::Check(args) => (&args.config, matches.subcommand_matches("check")),
        Commands::Pack(args) => (&args.config, matches.subcommand_matches("pack")),
    };

    let config = resolve_config(cli.config_file.as_deref(), cli_config, sub_matches)
        .unwrap_or_else(|e| {
            error!("❌ {}", e);
            process::exit(1);
        });

    let outcome = match cli.command {
        Commands::Check(args) => cmd::check::run(args, &config),
        Commands::Pack(args) => cmd::pack::run(args, &config),
    };

    match outcome {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("❌ {}", e);
            process::exit(1);
        }
    }
}

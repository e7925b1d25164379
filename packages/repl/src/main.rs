use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use embedlink::BridgeConfig;
use embedlink_repl::host::EDIT_MODE_ENV;
use embedlink_repl::logging::{self, LogLevel};

/// embedlink - call into an embedded runtime from the terminal
#[derive(Parser, Debug)]
#[command(name = "embedlink")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Extra module search path (repeatable)
    #[arg(long = "path", short = 'p')]
    paths: Vec<PathBuf>,

    /// Module to import at startup (repeatable)
    #[arg(long = "package")]
    packages: Vec<String>,

    /// Diagnostic verbosity, written to stderr
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Force vi editing mode
    #[arg(long, conflicts_with = "emacs")]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_with_level(args.log_level);

    if args.vi {
        std::env::set_var(EDIT_MODE_ENV, "vi");
    } else if args.emacs {
        std::env::set_var(EDIT_MODE_ENV, "emacs");
    }

    let config = match &args.config {
        Some(path) => match BridgeConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => BridgeConfig::default(),
    };
    let config = args
        .paths
        .into_iter()
        .fold(config, BridgeConfig::with_search_path);
    let config = args
        .packages
        .into_iter()
        .fold(config, BridgeConfig::with_package);

    match embedlink_repl::run(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use voxcast::app::{SynthOverrides, run_chunks_command, run_synth_command};
use voxcast::cli::{Cli, Commands, ConfigAction};
use voxcast::config::{Config, config_template};
use voxcast::tts::voices::{VOICES, format_voice_info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    log::debug!("voxcast {}", voxcast::version_string());

    match cli.command {
        Commands::Synth {
            input,
            output,
            voice,
            speed,
            max_chars,
            silence,
            split_pattern,
            workers,
            acceleration,
            engine,
            dry_run,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let overrides = SynthOverrides {
                input,
                output,
                voice,
                speed,
                max_chars,
                silence_ms: silence,
                split_pattern,
                workers,
                acceleration,
                engine,
            };
            run_synth_command(config, overrides, cli.quiet, dry_run).await?;
        }
        Commands::Chunks { input, max_chars } => {
            let config = load_config(cli.config.as_deref())?;
            let chunks = run_chunks_command(config, input, max_chars)?;
            if !cli.quiet {
                eprintln!("{} chunks", chunks.len());
            }
        }
        Commands::Voices => {
            list_voices();
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "voxcast",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Initialise `env_logger`; `RUST_LOG` takes precedence over the flags.
fn init_logging(quiet: bool, verbosity: u8) {
    let level = match (quiet, verbosity) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, _) => log::LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/voxcast/config.toml)
/// 3. Built-in defaults
///
/// Environment variable overrides are applied on top in every case.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// List the voice catalog.
fn list_voices() {
    println!("Available voices:");
    for voice in VOICES {
        let line = format_voice_info(voice);
        if voice.id == voxcast::defaults::VOICE {
            println!("  {} {}", line, "(default)".green());
        } else {
            println!("  {}", line);
        }
    }
}

/// Handle configuration commands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    let config_path = custom_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Path => {
            let marker = if config_path.exists() {
                "".to_string()
            } else {
                format!(" {}", "(not found, using defaults)".dimmed())
            };
            println!("{}{}", config_path.display(), marker);
        }
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Dump => {
            print!("{}", config_template());
        }
    }
    Ok(())
}

use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::command::{Cli, Commands, LogFormat};
use cli::decode::cmd_decode;
use cli::info::cmd_info;

mod byteorder;
mod cli;
mod input;
mod manifest;
mod tga;

/// Builds the logger for the chosen format. Per-chunk `debug!` output from the
/// decoder core is only shown at `trace`, it would drown the CLI's own lines.
fn logger(cli: &Cli) -> env_logger::Logger {
    let level = cli.loglevel.to_level_filter();

    let core_level = if level == log::LevelFilter::Trace {
        level
    } else {
        level.min(log::LevelFilter::Info)
    };

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level).filter_module("gif89", core_level);

    match cli.log_format {
        LogFormat::Plain => {
            builder.format_timestamp_millis().format_module_path(false);
        }
        LogFormat::Json => {
            builder.format(|buf, record| {
                use std::io::Write;
                writeln!(
                    buf,
                    "{{\"ts\":\"{}\",\"lvl\":\"{}\",\"target\":\"{}\",\"msg\":{:?}}}",
                    buf.timestamp_millis(),
                    record.level(),
                    record.target(),
                    record.args().to_string()
                )
            });
        }
    }

    builder.build()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let multi = MultiProgress::new();
    let logger = logger(&cli);
    let max_level = logger.filter();

    let progress = if cli.progress {
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Some(&multi)
    } else {
        log::set_boxed_logger(Box::new(logger))?;
        None
    };
    log::set_max_level(max_level);

    log::debug!(
        "gif89d {} (gif89 {}), failing on {}",
        env!("CARGO_PKG_VERSION"),
        env!("GIF89_VERSION"),
        cli.fail_level()
    );

    match cli.command {
        Commands::Decode(ref args) => cmd_decode(args, &cli, progress),
        Commands::Info(ref args) => cmd_info(args, &cli, progress),
    }
}

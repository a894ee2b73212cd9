use anyhow::Result;
use bam_mergeref::{cli, pipeline, MergeError};
use clap::Parser;
use mimalloc::MiMalloc;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Usage errors exit with 1 like every other fatal condition; help and version with 0.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(&args)?;

    // Paths need not be UTF-8; the CL field gets a lossy rendering.
    let command_line = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let result = pipeline::run(&args, &command_line);

    match &result {
        Ok(stats) => tracing::info!(
            read_groups = stats.read_groups,
            input1_records = stats.input1_records,
            input2_records = stats.input2_records,
            primary_records = stats.primary_records,
            trash_records = stats.trash_records,
            dropped_records = stats.dropped_records,
            kept = stats.kept,
            ties = stats.ties,
            conflicts = stats.conflicts,
            unmapped = stats.unmapped,
            degraded = stats.degraded,
            "bam-mergeref: processing complete"
        ),
        Err(e) if args.log_file.is_some() => tracing::error!("{e:#}"),
        Err(_) => {}
    }

    result.map(|_| ())
}

fn init_tracing(args: &cli::Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &args.log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                MergeError::Configuration(format!(
                    "could not create log file {}: {e}",
                    path.display()
                ))
            })?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

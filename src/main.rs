//! Resview CLI - browse anything addressable by a URI

use clap::Parser;
use resview::dispatch::{DispatchOptions, dispatch, dispatch_batch};
use resview::registry::default_registry_with_timeout;
use resview::render::{Format, render_error};
use resview::{config, ui};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "resview")]
#[command(version)]
#[command(about = "Universal resource browser - structural summaries for anything with a URI")]
#[command(long_about = r#"
Resview resolves a resource URI against a registry of scheme adapters and
prints a structural summary or one named element of the target.

Example usage:
  resview env://HOME
  resview sqlite:///data/app.db?table=users --format json
  resview xlsx:///tmp/sales.xlsx?sheet=0&limit=5
  resview @uris.txt --format grep
"#)]
struct Cli {
    /// Resource URI to browse, or @file with one URI per line
    #[arg(required_unless_present = "schemes")]
    resource: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Show the adapter's coarse metadata instead of extracting
    #[arg(long)]
    meta: bool,

    /// List the registered schemes and exit
    #[arg(long)]
    schemes: bool,

    /// Full error detail on unexpected failures
    #[arg(long)]
    debug: bool,

    /// Config file path (default: ./resview.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded.unwrap_or_default(),
        Err(e) => {
            ui::error(&format!("cannot read config: {e:#}"));
            return ExitCode::from(1);
        }
    };

    let format = cli
        .format
        .or_else(|| {
            config
                .format
                .as_deref()
                .and_then(|s| Format::from_str(s).ok())
        })
        .unwrap_or_default();
    let timeout = Duration::from_secs(config.http_timeout_secs.unwrap_or(5));
    let registry = default_registry_with_timeout(timeout);

    if cli.schemes {
        ui::header("Registered schemes");
        let columns = vec!["scheme".to_string(), "description".to_string()];
        let rows: Vec<Vec<String>> = registry
            .entries()
            .map(|entry| {
                let mut help = entry.help.unwrap_or("").to_string();
                if entry.renderer.supports_element() {
                    help.push_str(" [element-based]");
                }
                vec![entry.scheme().to_string(), help]
            })
            .collect();
        println!("{}", ui::rows_table(&columns, &rows));
        return ExitCode::SUCCESS;
    }

    let resource = cli.resource.expect("clap requires a resource here");
    let opts = DispatchOptions {
        format,
        show_meta: cli.meta,
    };

    if let Some(list) = resource.strip_prefix('@') {
        match dispatch_batch(&registry, Path::new(list), &opts, cli.debug) {
            Ok(0) => ExitCode::SUCCESS,
            Ok(failures) => {
                ui::warn(&format!("{failures} entries failed"));
                ExitCode::from(1)
            }
            Err(err) => {
                render_error(&err, cli.debug);
                ExitCode::from(1)
            }
        }
    } else {
        match dispatch(&registry, &resource, &opts) {
            Ok(output) => {
                println!("{output}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                render_error(&err, cli.debug);
                ExitCode::from(1)
            }
        }
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;

use holocron::config::{self, CliOverrides, Config};
use holocron::scheduler::{Scheduler, drain_until_idle};
use holocron::state::CoreState;
use holocron::transport::HttpFetcher;
use holocron::viewer;

#[derive(Parser)]
#[command(name = "holocron", about = "Terminal viewer for a lazily fetched master/apprentice chain")]
#[command(version)]
struct Cli {
    /// Base URL of the record endpoint (record id is appended)
    #[arg(long)]
    base_url: Option<String>,

    /// Id of the record shown first
    #[arg(long)]
    seed: Option<i64>,

    /// Websocket URL of the location feed
    #[arg(long)]
    location_url: Option<String>,

    /// Number of visible rows
    #[arg(long)]
    rows: Option<usize>,

    /// Rows moved per scroll action
    #[arg(long)]
    scroll_speed: Option<usize>,

    /// Load the seed and its neighbors, print the window, and exit
    #[arg(long)]
    dump: bool,

    /// Log output file path (enables logging when specified)
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log {
        let file = match std::fs::File::create(log_path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: failed to open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        };
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    } else if cli.dump {
        env_logger::init();
    }
    // viewer mode + no --log → logger not initialized (no log output)

    info!("holocron {}", env!("CARGO_PKG_VERSION"));

    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    cfg.merge_cli(&CliOverrides {
        base_url: cli.base_url,
        seed_id: cli.seed,
        location_url: cli.location_url,
        rows: cli.rows,
        scroll_speed: cli.scroll_speed,
    });
    let config = cfg.resolve();

    let result = if cli.dump {
        cmd_dump(&config)
    } else {
        viewer::run(&config)
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Headless mode: fill the window as far as the chain reaches and print it.
fn cmd_dump(config: &Config) -> anyhow::Result<()> {
    let (scheduler, completions) =
        Scheduler::new(Arc::new(HttpFetcher::new(config.transport.timeout)));
    let mut core = CoreState::new(config.window.rows, config.window.scroll_speed);

    let seed = core.seed(&viewer::seed_ref(config));
    scheduler.execute(seed);
    let settled = drain_until_idle(
        &mut core,
        &scheduler,
        &completions,
        config.transport.timeout * config.window.rows as u32,
    );

    if core.current_window().iter().all(Option::is_none) {
        anyhow::bail!("no records loaded from {}", config.seed_locator());
    }

    for (i, slot) in core.current_window().iter().enumerate() {
        let coordinate = core.cursor() + i as i64;
        match slot {
            Some(node) => println!(
                "{coordinate:>4}  {:<32} {}",
                node.name, node.homeworld.name
            ),
            None => println!("{coordinate:>4}  -"),
        }
    }
    if !settled {
        eprintln!("warning: {} request(s) still pending", core.pending_count());
    }
    Ok(())
}

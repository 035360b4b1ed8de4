// src/main.rs — smart-reminders entry point

use clap::Parser;

use smart_reminders::cli::{self, Cli, Commands};
use smart_reminders::infra::logger;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref(), cli.db.as_deref())?;

    match cli.command {
        Commands::Migrate { status, rollback } => cli::migrate::run_migrate(&config, status, rollback),
        Commands::Sweep { shard } => cli::sweep::run_sweep(&config, shard.as_deref()).await,
        Commands::Evaluate => cli::sweep::run_evaluate(&config),
        Commands::Recalc { user, goal, tz } => {
            cli::patterns::run_recalc(&config, &user, &goal, tz.as_deref())
        }
        Commands::Rescan => cli::patterns::run_rescan(&config),
        Commands::Prefs { action } => cli::prefs::run_prefs(&config, action),
        Commands::Plan { user, goal } => cli::patterns::run_plan(&config, &user, &goal),
        Commands::Daemon { shard } => cli::sweep::run_daemon(&config, shard.as_deref()).await,
    }
}

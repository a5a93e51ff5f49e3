use anyhow::Result;
use clap::{Parser, Subcommand};
use hellwatch_core::battle::Battle;
use hellwatch_core::config::WatcherConfig;
use hellwatch_core::delivery;
use hellwatch_core::feed::FeedClient;
use hellwatch_core::formats::{classify, FormatSpec};
use hellwatch_core::ledger::ReportedBattles;
use hellwatch_core::models::{BattleSummary, KillEvent};
use hellwatch_core::rendering::{clear_directory, Renderer};
use hellwatch_core::roster;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "hellwatch",
    version = "0.1.0",
    about = "Watches the match-history feed for hellgate battles and posts scorecards",
    long_about = None
)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/hellwatch.log")]
    log_file: std::path::PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed on an interval, reporting new hellgate battles
    Watch {
        /// Run a single polling cycle and exit
        #[arg(long, default_value_t = false)]
        once: bool,
    },

    /// Fetch one battle, classify it, and render its scorecard
    Report {
        /// Server name from the configuration
        #[arg(long)]
        server: String,
        /// Battle id from the feed
        #[arg(long)]
        battle_id: i64,
    },

    /// Fetch one battle and print its reconstructed rosters and ceilings
    Inspect {
        /// Server name from the configuration
        #[arg(long)]
        server: String,
        /// Battle id from the feed
        #[arg(long)]
        battle_id: i64,
    },

    /// Empty the image caches and reset the reported-battles ledger
    ClearCache,
}

fn setup_logging(
    verbose: u8,
    log_file: &std::path::Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(std::path::Path::new(".")),
        log_file
            .file_name()
            .unwrap_or(std::ffi::OsStr::new("hellwatch.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    let config = match &cli.config {
        Some(path) => WatcherConfig::from_file(path)?,
        None => WatcherConfig::default(),
    };

    match cli.command {
        Commands::Watch { once } => {
            info!("Starting hellgate watcher");
            watch(&config, once).await?;
        }
        Commands::Report { server, battle_id } => {
            report(&config, &server, battle_id).await?;
        }
        Commands::Inspect { server, battle_id } => {
            inspect(&config, &server, battle_id).await?;
        }
        Commands::ClearCache => {
            let items = clear_directory(&config.item_image_folder())?;
            let reports = clear_directory(&config.battle_report_folder())?;
            ReportedBattles::default().save(&config.ledger_path)?;
            info!(
                "cleared {} item icons, {} battle reports, reset ledger",
                items, reports
            );
        }
    }

    Ok(())
}

async fn watch(config: &WatcherConfig, once: bool) -> Result<()> {
    let feed = FeedClient::new(config)?;
    let renderer = Renderer::new(config)?;

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(
        config.check_interval_minutes * 60,
    ));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = run_cycle(config, &feed, &renderer).await {
            warn!("polling cycle failed: {}", e);
        }
        if once {
            break;
        }
    }
    Ok(())
}

/// One polling cycle: list recent battles per server, reconstruct the
/// not-yet-reported candidates, and report the ones that classify as a
/// supported hellgate format.
async fn run_cycle(config: &WatcherConfig, feed: &FeedClient, renderer: &Renderer) -> Result<()> {
    let mut ledger = ReportedBattles::load(&config.ledger_path);
    let specs = config.format_specs();
    let candidate_sizes: Vec<usize> = specs.iter().map(|s| s.roster_size()).collect();

    for (server, base_url) in &config.servers {
        let battles = match feed.recent_battles(base_url).await {
            Ok(battles) => battles,
            Err(e) => {
                warn!("failed to list battles for {}: {}", server, e);
                continue;
            }
        };
        info!("{} battles fetched for {}", battles.len(), server);

        let mut fetched: Vec<(&BattleSummary, Vec<KillEvent>)> = Vec::new();
        for summary in &battles {
            if !candidate_sizes.contains(&summary.player_count()) {
                continue;
            }
            if ledger.contains(server, summary.id) {
                continue;
            }
            match feed.battle_events(base_url, summary.id).await {
                Ok(events) if !events.is_empty() => fetched.push((summary, events)),
                Ok(_) => debug!("battle {} has no events yet", summary.id),
                Err(e) => warn!("failed to fetch events for battle {}: {}", summary.id, e),
            }
        }

        // Reconstruction and classification are pure and independent per
        // battle, so the cycle's candidates run in parallel.
        let classified: Vec<(Battle, Option<&FormatSpec>)> = fetched
            .into_par_iter()
            .map(|(summary, events)| {
                let battle = Battle::new(summary, events);
                let accepted = specs.iter().find(|spec| {
                    let verdict = classify(&battle, spec);
                    if !verdict.is_accepted() && battle.players.len() == spec.roster_size() {
                        info!("battle {} rejected for {}: {}", battle.id, spec.name, verdict);
                    }
                    verdict.is_accepted()
                });
                (battle, accepted)
            })
            .collect();

        for (battle, accepted) in &classified {
            // Processed either way; a rejected battle is never refetched.
            ledger.insert(server, battle.id);

            let Some(spec) = accepted else { continue };
            info!("battle {} on {} accepted as {}", battle.id, server, spec.name);

            feed.cache_battle_icons(&config.item_image_folder(), battle).await;
            let image_path = match renderer.battle_report(battle) {
                Ok(path) => path,
                Err(e) => {
                    warn!("failed to render battle {}: {}", battle.id, e);
                    continue;
                }
            };

            if let Some(webhook_url) = &config.webhook_url {
                if let Err(e) = delivery::post_scorecard(
                    feed.http(),
                    webhook_url,
                    battle,
                    spec.name,
                    &image_path,
                )
                .await
                {
                    warn!("delivery failed for battle {}: {}", battle.id, e);
                }
            }
        }
    }

    ledger.save(&config.ledger_path)?;
    Ok(())
}

async fn fetch_battle(
    config: &WatcherConfig,
    feed: &FeedClient,
    server: &str,
    battle_id: i64,
) -> Result<Battle> {
    let base_url = config
        .servers
        .get(server)
        .ok_or_else(|| anyhow::anyhow!("unknown server '{}'", server))?;
    let summary = feed.battle_summary(base_url, battle_id).await?;
    let events = feed.battle_events(base_url, battle_id).await?;
    Ok(Battle::new(&summary, events))
}

async fn report(config: &WatcherConfig, server: &str, battle_id: i64) -> Result<()> {
    let feed = FeedClient::new(config)?;
    let battle = fetch_battle(config, &feed, server, battle_id).await?;

    for spec in config.format_specs() {
        println!("{}: {}", spec.name, classify(&battle, &spec));
    }

    feed.cache_battle_icons(&config.item_image_folder(), &battle).await;
    let renderer = Renderer::new(config)?;
    let path = renderer.battle_report(&battle)?;
    println!("scorecard written to {}", path.display());
    println!("{}", delivery::summary_text(&battle, "hellgate"));
    Ok(())
}

async fn inspect(config: &WatcherConfig, server: &str, battle_id: i64) -> Result<()> {
    let feed = FeedClient::new(config)?;
    let battle = fetch_battle(config, &feed, server, battle_id).await?;

    // Ceilings shown under the 5v5 cap table.
    let spec = config
        .format_specs()
        .into_iter()
        .find(|s| s.name == "5v5")
        .unwrap_or_else(FormatSpec::lethal_5v5);

    println!(
        "battle {}: {} players, {} events, {} victims",
        battle.id,
        battle.players.len(),
        battle.events.len(),
        battle.victim_ids.len()
    );
    for (label, ids) in [("Team A", &battle.team_a_ids), ("Team B", &battle.team_b_ids)] {
        println!("{label}:");
        for id in ids {
            let Some(player) = battle.player(id) else { continue };
            let dead = if battle.victim_ids.contains(id) { "x" } else { " " };
            println!(
                "  {} {:<20} {:<8} reported {:>5.0}  ceiling {:>5}",
                dead,
                player.name,
                format!("{:?}", roster::role_of(player)),
                player.average_item_power,
                player.max_average_item_power(spec.ip_cap, spec.softcap_percent)
            );
        }
    }
    Ok(())
}

//! Pulseboard CLI: drive the refresh pipeline from a terminal.
//!
//! Commands:
//! - `snapshot`: run one refresh and print (or dump as JSON) the snapshot
//! - `watch`: run the refresh scheduler and report each tick
//! - `table`: query the campaign table (search, filter, sort, paginate)
//! - `export`: write the filtered campaign table as CSV, optionally the snapshot JSON
//! - `geo`: fetch the geographic weather panel

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use pulseboard_core::data::{CityPerformance, JsonTransport};
use pulseboard_core::domain::{SlotOrigin, Snapshot, Trend};
use pulseboard_core::format::{format_count, format_number, format_percent};
use pulseboard_runner::table::TablePage;
use pulseboard_runner::view_state::format_last_update;
use pulseboard_runner::{
    build_aggregator, geographic_source, http_transport, save_campaigns_csv, save_snapshot_json,
    DashboardConfig, DashboardState, Profile, RefreshScheduler, SchedulerPhase, SortDirection,
    SortField, StatusFilter, TableQuery,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pulseboard", about = "Pulseboard CLI: dashboard data refresh pipeline")]
struct Cli {
    /// Path to a TOML config file. Defaults to ./pulseboard.toml, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the source profile: classic, coincap, synthetic.
    #[arg(long, global = true)]
    profile: Option<Profile>,

    /// Override the jitter seed (reproducible synthetic and fallback data).
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one refresh and print the snapshot.
    Snapshot {
        /// Print the snapshot as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run the refresh scheduler and report every tick.
    Watch {
        /// Stop after this many ticks. Runs until Ctrl-C when omitted.
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Query the campaign table of a fresh snapshot.
    Table {
        #[command(flatten)]
        query: QueryArgs,

        /// Page to show (1-based; clamped into range).
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Export the filtered and sorted campaign table (all pages) as CSV.
    Export {
        #[command(flatten)]
        query: QueryArgs,

        /// Output directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Also write the snapshot as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch the geographic weather panel.
    Geo,
}

#[derive(Args)]
struct QueryArgs {
    /// Case-insensitive match on campaign or channel.
    #[arg(long)]
    search: Option<String>,

    /// Status filter: all, active, paused, completed.
    #[arg(long, default_value = "all")]
    status: StatusFilter,

    /// Sort column: campaign, channel, revenue, conversions, ctr, status, date.
    #[arg(long, default_value = "date")]
    sort: SortField,

    /// Sort ascending (default is descending).
    #[arg(long, default_value_t = false)]
    asc: bool,
}

impl QueryArgs {
    fn to_query(&self, page: usize, page_size: usize) -> TableQuery {
        TableQuery {
            search: self.search.clone().unwrap_or_default(),
            status: self.status,
            sort_field: self.sort,
            sort_direction: if self.asc {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            },
            page,
            ..TableQuery::default()
        }
        .with_page_size(page_size)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let transport = http_transport(&config).context("failed to build HTTP client")?;

    match cli.command {
        Commands::Snapshot { json } => run_snapshot(&config, transport, json).await,
        Commands::Watch { ticks } => run_watch(&config, transport, ticks).await,
        Commands::Table { query, page } => {
            let query = query.to_query(page, config.table.page_size);
            run_table(&config, transport, &query).await
        }
        Commands::Export { query, out, json } => {
            let query = query.to_query(1, config.table.page_size);
            run_export(&config, transport, &query, out, json).await
        }
        Commands::Geo => run_geo(&config, transport).await,
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pulseboard=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config =
        DashboardConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(profile) = cli.profile {
        config.refresh.profile = profile;
    }
    if cli.seed.is_some() {
        config.synthetic.seed = cli.seed;
    }
    config.validate().context("invalid configuration")?;
    info!(
        profile = %config.refresh.profile,
        fallback = %config.policy.fallback,
        assembly = %config.policy.assembly,
        "configuration loaded"
    );
    Ok(config)
}

async fn refresh_once(config: &DashboardConfig, transport: Arc<dyn JsonTransport>) -> Result<Snapshot> {
    let aggregator = build_aggregator(config, transport);
    aggregator.refresh().await.context("refresh failed")
}

async fn run_snapshot(
    config: &DashboardConfig,
    transport: Arc<dyn JsonTransport>,
    json: bool,
) -> Result<()> {
    let snapshot = refresh_once(config, transport).await?;
    if json {
        let text = serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;
        println!("{text}");
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

async fn run_watch(
    config: &DashboardConfig,
    transport: Arc<dyn JsonTransport>,
    ticks: Option<u64>,
) -> Result<()> {
    if ticks == Some(0) {
        bail!("--ticks must be at least 1");
    }
    let state = Arc::new(DashboardState::new());
    let scheduler = RefreshScheduler::new(
        Arc::new(build_aggregator(config, transport)),
        Arc::clone(&state),
        config.interval(),
    );
    let mut phases = scheduler.subscribe();
    scheduler.start();
    println!(
        "Watching ({} profile, every {}s). Ctrl-C to stop.",
        config.refresh.profile,
        scheduler.interval().as_secs()
    );

    let mut reported = 0;
    loop {
        tokio::select! {
            changed = phases.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
        let phase = *phases.borrow_and_update();
        if phase == SchedulerPhase::Stopped {
            break;
        }
        let completed = scheduler.completed_ticks();
        if completed > reported && phase != SchedulerPhase::Fetching {
            reported = completed;
            print_tick(completed, &state);
            if ticks.is_some_and(|n| completed >= n) {
                break;
            }
        }
    }

    scheduler.stop();
    scheduler.join().await;
    Ok(())
}

async fn run_table(
    config: &DashboardConfig,
    transport: Arc<dyn JsonTransport>,
    query: &TableQuery,
) -> Result<()> {
    let snapshot = refresh_once(config, transport).await?;
    let page = query.page(&snapshot.table);
    print_table_page(&page);
    Ok(())
}

async fn run_export(
    config: &DashboardConfig,
    transport: Arc<dyn JsonTransport>,
    query: &TableQuery,
    out: PathBuf,
    json: bool,
) -> Result<()> {
    let snapshot = refresh_once(config, transport).await?;
    let rows = query.apply(&snapshot.table);
    let path = save_campaigns_csv(&rows, &out)?;
    println!("Exported {} row(s) to: {}", rows.len(), path.display());
    if json {
        let path = save_snapshot_json(&snapshot, &out)?;
        println!("Snapshot saved to: {}", path.display());
    }
    Ok(())
}

async fn run_geo(config: &DashboardConfig, transport: Arc<dyn JsonTransport>) -> Result<()> {
    let cities = geographic_source(config, transport).fetch_geographic().await;
    print_geo(&cities);
    Ok(())
}

// ─── Output ─────────────────────────────────────────────────────────

fn print_snapshot(snapshot: &Snapshot) {
    println!();
    println!("=== Snapshot ===");
    println!("Taken:          {}", snapshot.taken_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Fingerprint:    {}", &snapshot.fingerprint()[..16]);
    if snapshot.is_degraded() {
        println!("Status:         degraded");
    }

    println!();
    println!("--- Metrics ---");
    for m in &snapshot.metrics {
        let arrow = match m.trend {
            Trend::Up => "up",
            Trend::Down => "down",
        };
        println!("{:<22} {:>12} {:>10} {arrow}", m.title, m.value, format_percent(m.change));
    }

    println!();
    println!("--- Chart ({} days) ---", snapshot.chart.len());
    println!(
        "{:<8} {:>12} {:>10} {:>12} {:>12} {:>10}",
        "Day", "Revenue", "Users", "Conversions", "Impressions", "Clicks"
    );
    for p in &snapshot.chart {
        println!(
            "{:<8} {:>12} {:>10} {:>12} {:>12} {:>10}",
            p.date,
            format_number(p.revenue),
            format_number(p.users),
            format_number(p.conversions),
            format_number(p.impressions),
            format_number(p.clicks)
        );
    }

    println!();
    println!("--- Channels ---");
    for c in &snapshot.channels {
        println!("{:<16} {:>8} {}", c.name, c.value, c.color);
    }

    println!();
    println!("--- Table ---");
    println!("{} campaign row(s); use `pulseboard table` to browse", snapshot.table.len());

    println!();
    println!("--- Slots ---");
    for slot in &snapshot.slots {
        let origin = match &slot.origin {
            SlotOrigin::Live => "live".to_string(),
            SlotOrigin::Fallback { reason } => format!("fallback ({reason})"),
            SlotOrigin::Failed { error } => format!("FAILED ({error})"),
        };
        println!("{:<9} {:<16} {:>4}  {origin}", slot.kind, slot.source, slot.len);
    }
    println!();
}

fn print_tick(tick: u64, state: &DashboardState) {
    let view = state.view();
    let rows = view.snapshot.as_ref().map_or(0, |s| s.table.len());
    let fingerprint = view
        .snapshot
        .as_ref()
        .map(|s| s.fingerprint()[..12].to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "tick {tick:>4}  {:<9} {:<10} rows {:>4}  fp {fingerprint}  updated {}",
        view.status,
        view.connection_label(),
        rows,
        format_last_update(view.last_update, Utc::now())
    );
    if let Some(err) = &view.last_error {
        println!("           error: {err}");
    }
}

fn print_table_page(page: &TablePage) {
    println!();
    println!(
        "{:<24} {:<14} {:>12} {:>12} {:>8} {:<10} {:<13}",
        "Campaign", "Channel", "Revenue", "Conversions", "CTR", "Status", "Date"
    );
    println!("{}", "-".repeat(99));
    for r in &page.rows {
        println!(
            "{:<24} {:<14} {:>12} {:>12} {:>8} {:<10} {:<13}",
            truncate(&r.campaign, 24),
            truncate(&r.channel, 14),
            format!("${}", format_number(r.revenue)),
            format_count(r.conversions.round() as u64),
            format_percent(r.ctr),
            r.status,
            r.date
        );
    }
    println!();
    println!(
        "{}  (page {} of {})",
        page.showing_label(),
        page.page,
        page.total_pages.max(1)
    );
}

fn print_geo(cities: &[CityPerformance]) {
    if cities.is_empty() {
        println!("No weather data available.");
        return;
    }
    println!();
    println!("{:<12} {:>6} {:>12}", "City", "Temp", "Performance");
    println!("{}", "-".repeat(32));
    for c in cities {
        println!("{:<12} {:>5}C {:>12}", c.city, c.temperature, c.performance);
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

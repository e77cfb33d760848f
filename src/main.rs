use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use loadwatch::athletes::{find_by_jersey, group_by_tier, normalize_athletes, AthleteSummary};
use loadwatch::config::AppConfig;
use loadwatch::dashboard::{Dashboard, DashboardView};
use loadwatch::kpi::KpiStatus;
use loadwatch::logging::init_logging;
use loadwatch::models::Position;
use loadwatch::normalize::parse_records;
use loadwatch::numeric::format_number;
use loadwatch::risk::RiskTier;
use loadwatch::window::WindowMode;
use loadwatch::error::ErrorSeverity;
use loadwatch::LoadWatchError;

/// LoadWatch - Athlete Workload Monitoring CLI
///
/// Renders the workload risk dashboard (ACWR, monotony, asymmetry) for one
/// athlete's daily time series.
#[derive(Parser)]
#[command(name = "loadwatch")]
#[command(version)]
#[command(about = "Athlete workload risk dashboard", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the dashboard for a timeseries JSON file
    Report {
        /// Timeseries JSON (array of daily records)
        #[arg(short, long)]
        input: PathBuf,

        /// Position metric set (fp, gk)
        #[arg(short, long, default_value = "fp")]
        position: Position,

        #[command(flatten)]
        window: WindowArgs,

        /// Athlete-level risk tier used when the latest record has none
        #[arg(long, value_name = "LEVEL")]
        athlete_risk: Option<String>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List a roster grouped by risk tier
    Roster {
        /// Athlete summaries JSON (array)
        #[arg(short, long)]
        input: PathBuf,

        /// Show a single athlete by jersey number
        #[arg(short, long)]
        jersey: Option<String>,
    },

    /// Configure application settings
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        list: bool,

        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
#[group(required = false, multiple = false)]
struct WindowArgs {
    /// Show the last N records
    #[arg(long, value_name = "N")]
    last: Option<usize>,

    /// Show N calendar days ending at the latest record
    #[arg(long, value_name = "N")]
    days: Option<u32>,

    /// Show the whole series
    #[arg(long)]
    all: bool,
}

impl WindowArgs {
    fn mode(&self) -> Option<WindowMode> {
        if self.all {
            Some(WindowMode::All)
        } else if let Some(n) = self.last {
            Some(WindowMode::LastN(n))
        } else {
            self.days.map(WindowMode::CalendarDays)
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    match cli.command {
        Commands::Report {
            input,
            position,
            window,
            athlete_risk,
            format,
        } => {
            let raw = read_input(&input)?;
            let records = parse_records(&raw).map_err(|e| report_error(&input, e))?;

            let dashboard = Dashboard::with_settings(config.dashboard_settings());
            let mode = window.mode().unwrap_or(config.window);
            let view = dashboard.build_with_window(&records, position, athlete_risk.as_deref(), mode);

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Table => print_dashboard(&view),
            }
        }

        Commands::Roster { input, jersey } => {
            let raw = read_input(&input)?;
            let payload: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| report_error(&input, LoadWatchError::from(e)))?;
            let athletes = normalize_athletes(&payload);

            match jersey {
                Some(jersey) => match find_by_jersey(&athletes, &jersey) {
                    Some(athlete) => print_roster_section(athlete.risk_level, std::slice::from_ref(athlete)),
                    None => println!("{}", format!("No athlete with jersey {}", jersey).yellow()),
                },
                None => {
                    let groups = group_by_tier(&athletes);
                    for (tier, members) in groups.sections() {
                        print_roster_section(tier, members);
                    }
                }
            }
        }

        Commands::Config { list, init } => {
            if init {
                let path = AppConfig::default_config_path();
                if path.exists() {
                    println!("{}", format!("Config already exists: {}", path.display()).yellow());
                } else {
                    AppConfig::default().save_default()?;
                    println!("{}", format!("✓ Wrote default config to {}", path.display()).green());
                }
            }
            if list || !init {
                let text = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration to TOML")?;
                println!("{}", text);
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path.display()))
}

fn report_error(path: &Path, error: LoadWatchError) -> anyhow::Error {
    match error.severity() {
        ErrorSeverity::Warning => tracing::warn!(path = %path.display(), error = %error, "Input rejected"),
        ErrorSeverity::Error => tracing::error!(path = %path.display(), error = %error, "Input rejected"),
    }
    anyhow::anyhow!("{}: {}", path.display(), error.user_message())
}

#[derive(Tabled)]
struct PanelRow {
    #[tabled(rename = "Metric")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Gauge")]
    bar: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Flag")]
    flag: String,
}

#[derive(Tabled)]
struct KpiRow {
    #[tabled(rename = "KPI")]
    title: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct AthleteRow {
    #[tabled(rename = "#")]
    jersey: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Pos")]
    position: String,
    #[tabled(rename = "Active")]
    active: String,
}

fn tier_colored(tier: RiskTier) -> ColoredString {
    match tier {
        RiskTier::Safety => tier.label().green().bold(),
        RiskTier::Caution => tier.label().yellow().bold(),
        RiskTier::Risky => tier.label().red().bold(),
    }
}

/// Text gauge with warn/danger ticks, `width` cells wide
fn gauge_bar(position: f64, warn: Option<f64>, danger: Option<f64>, width: usize) -> String {
    let cell = |p: f64| ((p * (width - 1) as f64).round() as usize).min(width - 1);
    let mut cells = vec!['-'; width];
    if let Some(w) = warn {
        cells[cell(w)] = '|';
    }
    if let Some(d) = danger {
        cells[cell(d)] = '!';
    }
    cells[cell(position)] = '#';
    cells.into_iter().collect()
}

fn print_dashboard(view: &DashboardView) {
    let latest = view
        .latest_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{} {}  {} {}  {} {}/{}",
        "Position:".bold(),
        view.position,
        "Latest:".bold(),
        latest,
        "Records:".bold(),
        view.windowed,
        view.normalized
    );
    println!("{} {}  {}", "Risk:".bold(), tier_colored(view.risk.tier), view.risk.tier.description().dimmed());
    for reason in &view.risk.reasons {
        println!("  • {}", reason);
    }
    println!();

    if !view.kpi_cards.is_empty() {
        let rows: Vec<KpiRow> = view
            .kpi_cards
            .iter()
            .map(|card| KpiRow {
                title: card.title.clone(),
                value: match &card.unit {
                    Some(unit) => format!("{} {}", card.value, unit),
                    None => card.value.clone(),
                },
                status: match card.status {
                    None | Some(KpiStatus::Neutral) => "-".to_string(),
                    Some(KpiStatus::Good) => "good".to_string(),
                    Some(KpiStatus::Warning) => "warning".to_string(),
                    Some(KpiStatus::Danger) => "danger".to_string(),
                },
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    let rows: Vec<PanelRow> = view
        .panels
        .iter()
        .map(|panel| PanelRow {
            label: panel.label.clone(),
            value: panel.formatted.clone(),
            bar: gauge_bar(panel.gauge.position, panel.gauge.warn_pos, panel.gauge.danger_pos, 20),
            threshold: panel.threshold.clone(),
            flag: if panel.highlight { "▲".to_string() } else { String::new() },
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    let axis = &view.acwr_axis;
    let ticks: Vec<String> = axis.y_ticks.iter().map(|t| format_number(Some(*t), 2)).collect();
    println!(
        "{} max {} ({}) ticks [{}]",
        "ACWR axis:".bold(),
        format_number(Some(axis.max_value), 1),
        if axis.exceeded_max { "expanded".yellow() } else { "reference".normal() },
        ticks.join(", ")
    );
    if !axis.date_ticks.is_empty() {
        let days: Vec<String> = axis.date_ticks.iter().map(|d| d.to_string()).collect();
        println!("{} {}", "Dates:".bold(), days.join("  "));
    }

    let over_monotony = view.monotony.bars.iter().filter(|b| b.exceeded).count();
    let over_asymmetry = view.asymmetry.bars.iter().filter(|b| b.exceeded).count();
    if over_monotony > 0 || over_asymmetry > 0 {
        println!(
            "{} monotony > {}: {} days, asymmetry > {}: {} days",
            "Condition:".bold(),
            view.monotony.threshold,
            over_monotony,
            view.asymmetry.threshold,
            over_asymmetry
        );
    }
    if !view.anomalies.is_empty() {
        let days: Vec<String> = view.anomalies.iter().map(|a| a.day.to_string()).collect();
        println!("{} {}", "Anomalies:".bold().red(), days.join(", "));
    }
}

fn print_roster_section(tier: RiskTier, athletes: &[AthleteSummary]) {
    println!("{} ({})", tier_colored(tier), athletes.len());
    if athletes.is_empty() {
        return;
    }
    let rows: Vec<AthleteRow> = athletes
        .iter()
        .map(|a| AthleteRow {
            jersey: a.jersey_number.clone(),
            name: a.display_name().to_string(),
            position: a.position.code().to_string(),
            active: if a.is_active { "yes" } else { "no" }.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use peakplan_core::plan::DATE_FORMAT;
use peakplan_core::{
    load_peakplan_config, EndurancePhase, PlanError, PlanPipeline, PlanRequest, PlanSummary,
    RaceProfile, SchedulerTables, Tier, WrittenPlan,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] peakplan_core::ConfigError),
    #[error("{0}")]
    Plan(#[from] PlanError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid --today '{value}': expected YYYY-MM-DD")]
    InvalidToday { value: String },
    #[error("{failed} of {total} tier plans failed")]
    BatchFailed { failed: usize, total: usize },
    #[error("configuration check failed")]
    CheckFailed,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Dual-track cycling and strength plan generator", long_about = None)]
pub struct Cli {
    /// Path to peakplan.toml; the built-in tables are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Log progress at info level (RUST_LOG takes precedence)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Builds one plan and writes its calendar
    Build(BuildArgs),
    /// Builds the plan for every tier at once
    Batch(BatchArgs),
    /// Shows the race profile an event resolves to
    Profile(ProfileArgs),
    /// Lists tiers with their weekly hours and strength frequencies
    Tiers,
    /// Loads and validates the configuration
    Check,
    /// Prints shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Event id, e.g. unbound_200; unknown events use the default profile
    #[arg(long)]
    pub event: String,
    /// Volume tier: ayahuasca, finisher, compete or podium
    #[arg(long)]
    pub tier: String,
    /// Plan length in weeks
    #[arg(long)]
    pub weeks: u32,
    /// Event date (YYYY-MM-DD)
    #[arg(long)]
    pub event_date: String,
    /// Output directory. When omitted the plan goes to
    /// <output.dir>/<event>/<tier>, with output.dir taken from peakplan.toml
    /// ("plans" without a config file)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Reference date for the upcoming-event check; defaults to today
    #[arg(long)]
    pub today: Option<String>,
    /// Build and print without writing anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    #[arg(long)]
    pub event: String,
    #[arg(long)]
    pub weeks: u32,
    /// Event date (YYYY-MM-DD)
    #[arg(long)]
    pub event_date: String,
    /// Root directory; each tier lands in <output-dir>/<tier>. When omitted
    /// the root is <output.dir>/<event> from peakplan.toml
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long)]
    pub today: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    pub event_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Installs the fmt subscriber on stderr. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Check => {
            let report = check_config(cli.config.as_deref());
            render(&report, cli.format)?;
            if report
                .iter()
                .any(|entry| matches!(entry.status, CheckStatus::Error))
            {
                return Err(AppError::CheckFailed);
            }
            return Ok(());
        }
        Commands::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "peakplanctl",
                &mut io::stdout(),
            );
            return Ok(());
        }
        _ => {}
    }

    let context = AppContext::new(&cli)?;
    match &cli.command {
        Commands::Build(args) => {
            let report = context.build(args)?;
            render(&report, cli.format)?;
        }
        Commands::Batch(args) => {
            let report = context.batch(args)?;
            render(&report, cli.format)?;
            let failed = report
                .rows
                .iter()
                .filter(|row| matches!(row.status, CheckStatus::Error))
                .count();
            if failed > 0 {
                return Err(AppError::BatchFailed {
                    failed,
                    total: report.rows.len(),
                });
            }
        }
        Commands::Profile(args) => {
            let report = context.profile(&args.event_id);
            render(&report, cli.format)?;
        }
        Commands::Tiers => {
            let list = context.tiers();
            render(&list, cli.format)?;
        }
        Commands::Check | Commands::Completions(_) => {}
    }

    Ok(())
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
            Ok(())
        }
    }
}

trait DisplayFallback {
    fn display(&self) -> String;
}

#[derive(Debug)]
struct AppContext {
    tables: SchedulerTables,
    output_root: PathBuf,
}

impl AppContext {
    fn new(cli: &Cli) -> Result<Self> {
        match &cli.config {
            Some(path) => {
                let config = load_peakplan_config(path)?;
                let tables = SchedulerTables::from_config(&config)?;
                let output_root = config.resolve_path(&config.output.dir);
                info!(target: "tables", path = %path.display(), "configuration loaded");
                Ok(Self {
                    tables,
                    output_root,
                })
            }
            None => Ok(Self {
                tables: SchedulerTables::builtin()?,
                output_root: PathBuf::from("plans"),
            }),
        }
    }

    fn build(&self, args: &BuildArgs) -> Result<BuildReport> {
        let request = PlanRequest::parse(&args.event, &args.tier, args.weeks, &args.event_date)?;
        let pipeline = PlanPipeline::new(&self.tables, parse_today(args.today.as_deref())?);

        if args.dry_run {
            let (calendar, table) = pipeline.preview(&request)?;
            return Ok(BuildReport {
                summary: PlanSummary::from_calendar(&calendar),
                written: None,
                table: Some(table.as_str().to_string()),
            });
        }

        let dir = args.output_dir.clone().unwrap_or_else(|| {
            self.output_root
                .join(&request.event_id)
                .join(request.tier.as_str())
        });
        let written = pipeline.run(&request, &dir)?;
        Ok(BuildReport {
            summary: written.summary.clone(),
            written: Some(written),
            table: None,
        })
    }

    fn batch(&self, args: &BatchArgs) -> Result<BatchReport> {
        let today = parse_today(args.today.as_deref())?;
        let root = args
            .output_dir
            .clone()
            .unwrap_or_else(|| self.output_root.join(&args.event));
        let requests = Tier::ALL
            .into_iter()
            .map(|tier| {
                PlanRequest::parse(&args.event, tier.as_str(), args.weeks, &args.event_date)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let pipeline = PlanPipeline::new(&self.tables, today);
        let rows = thread::scope(|scope| {
            let handles: Vec<_> = requests
                .iter()
                .map(|request| {
                    let dir = root.join(request.tier.as_str());
                    let handle = scope.spawn(move || pipeline.run(request, &dir));
                    (request.tier, handle)
                })
                .collect();
            handles
                .into_iter()
                .map(|(tier, handle)| match handle.join() {
                    Ok(Ok(written)) => BatchEntry::written(tier, written),
                    Ok(Err(err)) => {
                        warn!(target: "pipeline", tier = %tier, error = %err, "tier plan failed");
                        BatchEntry::failed(tier, err.to_string())
                    }
                    Err(_) => BatchEntry::failed(tier, "worker panicked".to_string()),
                })
                .collect()
        });
        Ok(BatchReport { rows })
    }

    fn profile(&self, event_id: &str) -> ProfileReport {
        let profile = self.tables.catalog.profile_for(event_id);
        ProfileReport {
            requested: event_id.to_string(),
            fallback: profile.is_default(),
            profile: profile.clone(),
        }
    }

    fn tiers(&self) -> TierList {
        let rows = Tier::ALL
            .into_iter()
            .map(|tier| TierRow {
                tier,
                hours: tier.hours_range().to_string(),
                frequencies: EndurancePhase::ALL
                    .into_iter()
                    .map(|phase| (phase, self.tables.frequency.frequency_for(tier, phase)))
                    .collect(),
            })
            .collect();
        TierList { rows }
    }
}

fn parse_today(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
            AppError::InvalidToday {
                value: raw.to_string(),
            }
        }),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn check_config(path: Option<&Path>) -> Vec<CheckEntry> {
    let mut results = Vec::new();
    let tables = match path {
        None => {
            results.push(CheckEntry::warn("peakplan.toml", "not given, using built-in tables"));
            SchedulerTables::builtin()
        }
        Some(path) if !path.exists() => {
            results.push(CheckEntry::error(
                "peakplan.toml",
                format!("{path} missing", path = path.display()),
            ));
            return results;
        }
        Some(path) => {
            results.push(CheckEntry::ok("peakplan.toml", format!("{}", path.display())));
            SchedulerTables::load(path)
        }
    };

    match tables {
        Ok(tables) => {
            results.push(CheckEntry::ok("tables", "alignment, frequency, templates and buckets valid"));
            let lengths: Vec<String> = tables
                .supported_plan_weeks
                .iter()
                .map(u32::to_string)
                .collect();
            results.push(CheckEntry::ok("plan lengths", lengths.join(", ")));
            results.push(CheckEntry::ok(
                "race catalog",
                format!("{} profiles", tables.catalog.event_ids().count()),
            ));
        }
        Err(err) => results.push(CheckEntry::error("tables", err.to_string())),
    }
    results
}

#[derive(Debug, Serialize)]
pub struct BuildReport {
    pub summary: PlanSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<WrittenPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl DisplayFallback for BuildReport {
    fn display(&self) -> String {
        if let Some(table) = &self.table {
            return table.trim_end().to_string();
        }
        let summary = &self.summary;
        let mut lines = vec![
            format!(
                "{} ({}) for {}, {} weeks",
                summary.event_name, summary.event, summary.tier, summary.plan_weeks
            ),
            format!("  start {} | event {}", summary.start_date, summary.event_date),
        ];
        let phases: Vec<String> = summary
            .phase_breakdown
            .iter()
            .map(|(phase, weeks)| format!("{phase}={weeks}"))
            .collect();
        lines.push(format!("  phases: {}", phases.join(" ")));
        lines.push(format!(
            "  workouts: {} cycling, {} strength",
            summary.workout_counts.cycling, summary.workout_counts.strength
        ));
        if let Some(written) = &self.written {
            lines.push(format!("  written to {}", written.dir.display()));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub rows: Vec<BatchEntry>,
}

#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub tier: Tier,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub detail: String,
}

impl BatchEntry {
    fn written(tier: Tier, written: WrittenPlan) -> Self {
        Self {
            tier,
            status: CheckStatus::Ok,
            detail: format!(
                "{} strength / {} cycling",
                written.summary.workout_counts.strength, written.summary.workout_counts.cycling
            ),
            dir: Some(written.dir),
        }
    }

    fn failed(tier: Tier, detail: String) -> Self {
        Self {
            tier,
            status: CheckStatus::Error,
            dir: None,
            detail,
        }
    }
}

impl DisplayFallback for BatchReport {
    fn display(&self) -> String {
        let mut lines = Vec::new();
        for row in &self.rows {
            let dir = row
                .dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "[{status}] {tier} {dir}: {detail}",
                status = row.status,
                tier = row.tier,
                detail = row.detail
            ));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileReport {
    pub requested: String,
    pub fallback: bool,
    pub profile: RaceProfile,
}

impl DisplayFallback for ProfileReport {
    fn display(&self) -> String {
        let profile = &self.profile;
        let mut lines = Vec::new();
        if self.fallback {
            lines.push(format!(
                "{} is not in the catalog, using {}",
                self.requested, profile.name
            ));
        } else {
            lines.push(format!("{} ({})", profile.name, profile.event_id));
        }
        let demands: Vec<String> = profile
            .primary_demands
            .iter()
            .map(ToString::to_string)
            .collect();
        lines.push(format!("  demands: {}", demands.join(", ")));
        lines.push(format!("  emphasize: {}", profile.emphasized_exercises.join(", ")));
        lines.push(format!(
            "  de-emphasize: {}",
            profile.de_emphasized_exercises.join(", ")
        ));
        if !profile.notes.is_empty() {
            lines.push(format!("  notes: {}", profile.notes));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct TierList {
    pub rows: Vec<TierRow>,
}

#[derive(Debug, Serialize)]
pub struct TierRow {
    pub tier: Tier,
    pub hours: String,
    pub frequencies: BTreeMap<EndurancePhase, u8>,
}

impl DisplayFallback for TierList {
    fn display(&self) -> String {
        let mut lines = Vec::new();
        for row in &self.rows {
            let counts: Vec<String> = row
                .frequencies
                .iter()
                .map(|(phase, count)| format!("{phase}={count}"))
                .collect();
            lines.push(format!(
                "{tier} ({hours}) | {counts}",
                tier = row.tier,
                hours = row.hours,
                counts = counts.join(" ")
            ));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct CheckEntry {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub enum CheckStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Error => "ERROR",
        };
        write!(f, "{}", label)
    }
}

impl CheckEntry {
    fn ok(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Ok,
            detail: detail.into(),
        }
    }

    fn warn(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warn,
            detail: detail.into(),
        }
    }

    fn error(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Error,
            detail: detail.into(),
        }
    }
}

impl DisplayFallback for Vec<CheckEntry> {
    fn display(&self) -> String {
        let mut lines = Vec::new();
        for entry in self {
            lines.push(format!(
                "[{status}] {name}: {detail}",
                status = entry.status,
                name = entry.name,
                detail = entry.detail
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture_config() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../configs/peakplan.toml")
    }

    fn cli(command: Commands) -> Cli {
        Cli {
            config: Some(fixture_config()),
            format: OutputFormat::Json,
            verbose: false,
            command,
        }
    }

    fn build_args(output_dir: &Path) -> BuildArgs {
        BuildArgs {
            event: "gravel_worlds".to_string(),
            tier: "compete".to_string(),
            weeks: 12,
            event_date: "2025-08-23".to_string(),
            output_dir: Some(output_dir.to_path_buf()),
            today: Some("2025-04-01".to_string()),
            dry_run: false,
        }
    }

    #[test]
    fn build_writes_outputs_from_fixture_config() {
        let temp = TempDir::new().unwrap();
        let args = build_args(temp.path());
        let context = AppContext::new(&cli(Commands::Build(args.clone()))).unwrap();
        let report = context.build(&args).unwrap();
        assert_eq!(report.summary.event_name, "Gravel Worlds");
        assert_eq!(report.summary.plan_weeks, 12);
        let written = report.written.unwrap();
        assert!(written.summary_path.exists());
        assert!(written.calendar_table_path.exists());
    }

    #[test]
    fn dry_run_leaves_directory_untouched() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("never");
        let mut args = build_args(&dir);
        args.dry_run = true;
        let context = AppContext::new(&cli(Commands::Build(args.clone()))).unwrap();
        let report = context.build(&args).unwrap();
        assert!(report.written.is_none());
        assert!(report.display().contains("## Week 12: taper / dont_lose_it"));
        assert!(!dir.exists());
    }

    #[test]
    fn past_event_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut args = build_args(temp.path());
        args.today = Some("2025-09-01".to_string());
        let context = AppContext::new(&cli(Commands::Build(args.clone()))).unwrap();
        let err = context.build(&args).unwrap_err();
        assert!(matches!(
            err,
            AppError::Plan(PlanError::Validation { field: "event_date", .. })
        ));
    }

    #[test]
    fn build_without_output_dir_uses_configured_root() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("peakplan.toml");
        fs::write(&config_path, "[output]\ndir = \"generated\"\n").unwrap();
        let mut args = build_args(temp.path());
        args.output_dir = None;
        let cli = Cli {
            config: Some(config_path),
            format: OutputFormat::Text,
            verbose: false,
            command: Commands::Build(args.clone()),
        };
        let context = AppContext::new(&cli).unwrap();
        let written = context.build(&args).unwrap().written.unwrap();
        assert_eq!(
            written.dir,
            temp.path().join("generated").join("gravel_worlds").join("compete")
        );
        assert!(written.summary_path.exists());
    }

    #[test]
    fn batch_writes_one_directory_per_tier() {
        let temp = TempDir::new().unwrap();
        let args = BatchArgs {
            event: "unbound_200".to_string(),
            weeks: 16,
            event_date: "2025-05-31".to_string(),
            output_dir: Some(temp.path().to_path_buf()),
            today: Some("2025-01-01".to_string()),
        };
        let context = AppContext::new(&cli(Commands::Batch(args.clone()))).unwrap();
        let report = context.batch(&args).unwrap();
        assert_eq!(report.rows.len(), 4);
        for tier in Tier::ALL {
            let summary = temp.path().join(tier.as_str()).join("plan_summary.json");
            let parsed: PlanSummary =
                serde_json::from_str(&fs::read_to_string(summary).unwrap()).unwrap();
            assert_eq!(parsed.tier, tier);
        }
        assert!(report
            .rows
            .iter()
            .all(|row| matches!(row.status, CheckStatus::Ok)));
    }

    #[test]
    fn unknown_event_profile_falls_back() {
        let context = AppContext::new(&cli(Commands::Tiers)).unwrap();
        let report = context.profile("local_crit");
        assert!(report.fallback);
        assert!(report.display().contains("local_crit is not in the catalog"));
        let report = context.profile("gravel_worlds");
        assert!(!report.fallback);
    }

    #[test]
    fn tier_list_covers_every_phase() {
        let context = AppContext::new(&cli(Commands::Tiers)).unwrap();
        let list = context.tiers();
        assert_eq!(list.rows.len(), 4);
        assert!(list.rows.iter().all(|row| row.frequencies.len() == 6));
        assert_eq!(list.rows[3].frequencies[&EndurancePhase::Taper], 0);
    }

    #[test]
    fn check_reports_broken_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("peakplan.toml");
        fs::write(&path, "[frequency.podium]\nbase_1 = 5\n").unwrap();
        let report = check_config(Some(&path));
        assert!(report
            .iter()
            .any(|entry| entry.name == "tables" && matches!(entry.status, CheckStatus::Error)));

        let report = check_config(Some(&fixture_config()));
        assert!(report
            .iter()
            .all(|entry| matches!(entry.status, CheckStatus::Ok)));
    }

    #[test]
    fn cli_parses_build_flags() {
        let cli = Cli::try_parse_from([
            "peakplanctl",
            "--format",
            "json",
            "build",
            "--event",
            "mid_south",
            "--tier",
            "finisher",
            "--weeks",
            "6",
            "--event-date",
            "2026-03-14",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert!(args.dry_run);
                assert_eq!(args.weeks, 6);
                assert_eq!(args.event_date, "2026-03-14");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

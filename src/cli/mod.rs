//! Top-level CLI parsing and command execution. The engine is single-
//! threaded and batch (spec.md §5), so one invocation builds a fresh
//! in-memory store, seeds it, runs whichever pipeline stages were asked
//! for, and prints a JSON report — there is no cross-invocation store
//! persistence here (see DESIGN.md).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::aggregate::{self, AntibioticAggregateRequest, VariantView};
use crate::config::Config;
use crate::entities::*;
use crate::fixtures;
use crate::ingest::{self, ColumnMapping, IngestContext, SemanticField, TenantCatalog};
use crate::ingest::source;
use crate::store::memory::InMemoryStore;
use crate::store::Store;
use crate::trend::{self, TrendRequest, TrendTarget};

mod workspace;

use workspace::Workspace;

#[derive(Parser, Debug)]
#[command(name = "amr-engine", about = "EUCAST breakpoint interpretation, cumulative resistance reporting, and temporal trend analysis for antibiogram records", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Pretty-print the JSON report instead of emitting it compact
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Command {
    /// Load the global catalog (antibiotics, organisms, EUCAST rules, ...)
    /// from a fixtures directory and report what was inserted
    Fixtures {
        /// Directory holding the per-entity JSON seed files
        #[arg(long, default_value = "fixtures")]
        dir: PathBuf,
    },
    /// Seed the catalog and a tenant workspace, ingest one or more input
    /// files, then optionally run cumulative aggregation and/or trend
    /// analysis over the result
    Run(RunArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding the per-entity global-catalog JSON seed files
    #[arg(long, default_value = "fixtures")]
    pub fixtures_dir: PathBuf,

    /// JSON file describing the tenant, its organism/antibiotic/profile
    /// setup, and its alias catalogs (see `cli::workspace::Workspace`)
    #[arg(long)]
    pub workspace: PathBuf,

    /// JSON object mapping semantic fields (nh, age, date, sex, scope,
    /// service, sample_type, observations) to the input file's column headers
    #[arg(long)]
    pub mapping: PathBuf,

    /// TenantOrganism id the input rows are recorded against
    #[arg(long)]
    pub organism_tenant: u64,

    /// CSV or XLSX files to ingest, in order
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Run antibiotic-level cumulative aggregation at this EUCAST version id
    #[arg(long)]
    pub aggregate_version: Option<u64>,

    /// Inclusive date range for aggregation/trend, `YYYY-MM-DD`
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,

    /// `base` or `variant` (default `base`) — which half of the antibiotic
    /// catalog the aggregation report shows
    #[arg(long, default_value = "base")]
    pub variant_view: String,

    /// Run trend analysis against `antibiotic:<tenant_antibiotic_id>` or
    /// `mechanism:<mechanism_id>[:<subtype_id>]`
    #[arg(long)]
    pub trend_target: Option<String>,
    #[arg(long)]
    pub trend_version: Option<u64>,
    #[arg(long, default_value = "quarter")]
    pub trend_grouping: String,
}

#[derive(Debug, Serialize)]
struct RunReport {
    fixtures: fixtures::LoadReport,
    ingest: Vec<IngestFileReport>,
    aggregate: Option<Vec<AggregateRow>>,
    trend: Option<TrendReportView>,
}

#[derive(Debug, Serialize)]
struct IngestFileReport {
    file: String,
    isolates_created: usize,
    duplicates: usize,
    rows_skipped: usize,
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AggregateRow {
    tenant_antibiotic: u64,
    s: usize,
    i: usize,
    r: usize,
    percent_r: f64,
    percent_sei: f64,
}

#[derive(Debug, Serialize)]
struct TrendReportView {
    points: Vec<TrendPointView>,
    forecast_label: String,
    linear_slope: f64,
    linear_r_squared: f64,
    linear_forecast_point: f64,
    gam_forecast_point: f64,
    cv_selected_lambda: Option<f64>,
}

#[derive(Debug, Serialize)]
struct TrendPointView {
    label: String,
    numerator: usize,
    denominator: usize,
    percent: f64,
}

/// Parses and executes a `Cli`, returning the report text to print.
pub fn run(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Command::Fixtures { dir } => {
            let mut store = InMemoryStore::new();
            let report = fixtures::load_dir(&mut store, &dir)?;
            Ok(render(&report, cli.pretty)?)
        }
        Command::Run(args) => {
            let report = run_pipeline(&args)?;
            Ok(render(&report, cli.pretty)?)
        }
    }
}

fn render<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) }
}

fn run_pipeline(args: &RunArgs) -> anyhow::Result<RunReport> {
    let config = Config::from_env()?;
    let mut store = InMemoryStore::new();

    let fixtures_report = fixtures::load_dir(&mut store, &args.fixtures_dir)?;

    let workspace: Workspace = serde_json::from_str(&std::fs::read_to_string(&args.workspace)?)?;
    let tenant = workspace.tenant.id;
    workspace.seed(&mut store);

    let mapping = load_mapping(&args.mapping)?;
    let organism_tenant = TenantOrganismId::new(args.organism_tenant);
    let catalog = TenantCatalog::build(&store, tenant);

    let mut ingest_reports = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let sheets = read_any(path)?;
        for sheet in sheets {
            let ctx = IngestContext {
                tenant,
                organism_tenant,
                mapping: &mapping,
                catalog: &catalog,
                config: &config,
                load_timestamp: unix_timestamp()?,
            };
            let report = ingest::run(&mut store, &ctx, &sheet.rows)?;
            ingest_reports.push(IngestFileReport {
                file: format!("{}:{}", path.display(), sheet.name),
                isolates_created: report.isolates_created,
                duplicates: report.duplicates,
                rows_skipped: report.rows_skipped,
                errors: report.errors.into_iter().map(|e| format!("row {}: {}", e.row, e.message)).collect(),
            });
        }
    }

    let date_range = match (&args.from, &args.to) {
        (Some(from), Some(to)) => Some((parse_date(from)?, parse_date(to)?)),
        _ => None,
    };

    let aggregate_rows = match (args.aggregate_version, date_range) {
        (Some(version), Some((from, to))) => {
            let variant_view = match args.variant_view.as_str() {
                "variant" => VariantView::VariantsOnly,
                _ => VariantView::BaseOnly,
            };
            let req = AntibioticAggregateRequest {
                tenant,
                organism_tenant,
                eucast_version: EucastVersionId::new(version),
                from,
                to,
                variant_view,
            };
            let rows = aggregate::antibiotic_level(&store, &req)?;
            Some(
                rows.into_iter()
                    .map(|row| AggregateRow {
                        tenant_antibiotic: row.tenant_antibiotic.0,
                        s: row.counts.s,
                        i: row.counts.i,
                        r: row.counts.r,
                        percent_r: row.counts.percent_r(),
                        percent_sei: row.counts.percent_sei(),
                    })
                    .collect(),
            )
        }
        _ => None,
    };

    let trend_report = match (&args.trend_target, args.trend_version, date_range) {
        (Some(target_spec), Some(version), Some((from, to))) => {
            let target = parse_trend_target(target_spec)?;
            let grouping = parse_grouping(&args.trend_grouping)?;
            let req = TrendRequest {
                tenant,
                organism_tenant,
                target,
                eucast_version: EucastVersionId::new(version),
                from,
                to,
                grouping,
            };
            let report = trend::analyze(&store, &req)?;
            Some(TrendReportView {
                points: report
                    .points
                    .iter()
                    .map(|p| TrendPointView { label: p.period.label.clone(), numerator: p.numerator, denominator: p.denominator, percent: p.percent })
                    .collect(),
                forecast_label: report.forecast_label,
                linear_slope: report.linear.slope,
                linear_r_squared: report.linear.r_squared,
                linear_forecast_point: report.linear.forecast.point,
                gam_forecast_point: report.gam.forecast.point,
                cv_selected_lambda: report.cv.ok().map(|cv| cv.selected_lambda),
            })
        }
        _ => None,
    };

    Ok(RunReport { fixtures: fixtures_report, ingest: ingest_reports, aggregate: aggregate_rows, trend: trend_report })
}

fn load_mapping(path: &PathBuf) -> anyhow::Result<ColumnMapping> {
    let raw: std::collections::HashMap<String, String> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let mut mapping = ColumnMapping::new();
    for (key, column) in raw {
        let field = match key.as_str() {
            "nh" => SemanticField::Nh,
            "age" => SemanticField::Age,
            "date" => SemanticField::Date,
            "sex" => SemanticField::Sex,
            "scope" => SemanticField::Scope,
            "service" => SemanticField::Service,
            "sample_type" => SemanticField::SampleType,
            "observations" => SemanticField::Observations,
            other => anyhow::bail!("unknown mapping field '{other}'"),
        };
        mapping.insert(field, column);
    }
    Ok(mapping)
}

fn read_any(path: &PathBuf) -> anyhow::Result<Vec<source::Sheet>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => Ok(vec![source::read_csv(path)?]),
        _ => Ok(source::read_xlsx(path)?),
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| anyhow::anyhow!("invalid date '{raw}': {e}"))
}

fn parse_grouping(raw: &str) -> anyhow::Result<trend::period::Grouping> {
    match raw {
        "quarter" => Ok(trend::period::Grouping::Quarter),
        "semester" => Ok(trend::period::Grouping::Semester),
        "year" => Ok(trend::period::Grouping::Year),
        other => anyhow::bail!("unknown trend grouping '{other}', expected quarter/semester/year"),
    }
}

fn parse_trend_target(raw: &str) -> anyhow::Result<TrendTarget> {
    let mut parts = raw.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("antibiotic"), Some(id), None) => Ok(TrendTarget::Antibiotic(TenantAntibioticId::new(id.parse()?))),
        (Some("mechanism"), Some(id), None) => Ok(TrendTarget::Mechanism { mechanism: ResistanceMechanismId::new(id.parse()?), subtype: None }),
        (Some("mechanism"), Some(id), Some(subtype)) => {
            Ok(TrendTarget::Mechanism { mechanism: ResistanceMechanismId::new(id.parse()?), subtype: Some(MechanismSubtypeId::new(subtype.parse()?)) })
        }
        _ => anyhow::bail!("trend target must be 'antibiotic:<id>' or 'mechanism:<id>[:<subtype_id>]', got '{raw}'"),
    }
}

fn unix_timestamp() -> anyhow::Result<i64> {
    Ok(std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH)?.as_secs() as i64)
}

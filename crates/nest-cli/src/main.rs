use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use nest_core::error::NestError;
use nest_core::job::{NestJob, NestJobRaw, NestParameters, PreparedPart};
use nest_core::log::{Logger, StderrLogger};
use nest_core::result::{JobStats, NestDocument, PlacementRecord, UnplacedSummary};
use nest_engine::NestOutcome;

#[derive(Parser)]
#[command(name = "nest", version, about = "Nest 2D parts with holes onto rectangular sheets")]
struct Cli {
    /// Path to the job JSON file
    job_file: PathBuf,

    /// Pretty-print the result JSON instead of emitting a single line
    #[arg(long)]
    pretty: bool,

    /// Emit an SVG path per placement (overrides the job's `emitSvg`)
    #[arg(long, conflicts_with = "no_svg")]
    svg: bool,

    /// Suppress SVG emission (overrides the job's `emitSvg`)
    #[arg(long)]
    no_svg: bool,

    /// Verbose diagnostics on stderr (reserved for a future log-level filter;
    /// `Logger` has no level gate yet, so this currently only documents intent)
    #[arg(short, long, conflicts_with = "quiet")]
    #[allow(dead_code)]
    verbose: bool,

    /// Suppress all diagnostics on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = resolve_logger(&cli);

    match run(&cli, logger.as_ref()) {
        Ok(doc) => {
            print_document(&doc, cli.pretty);
            if doc.success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
        }
        Err(err) => {
            let doc = NestDocument::fatal(err.to_string());
            print_document(&doc, cli.pretty);
            ExitCode::FAILURE
        }
    }
}

fn resolve_logger(cli: &Cli) -> Box<dyn Logger> {
    if cli.quiet {
        Box::new(nest_core::log::NullLogger)
    } else {
        Box::new(StderrLogger)
    }
}

fn print_document(doc: &NestDocument, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(doc).expect("NestDocument always serializes")
    } else {
        serde_json::to_string(doc).expect("NestDocument always serializes")
    };
    println!("{rendered}");
}

fn run(cli: &Cli, logger: &dyn Logger) -> Result<NestDocument, NestError> {
    let loading_start = Instant::now();
    let contents = std::fs::read_to_string(&cli.job_file).map_err(|source| NestError::Io {
        path: cli.job_file.display().to_string(),
        source,
    })?;
    let raw: NestJobRaw = serde_json::from_str(&contents)?;
    let loading_time_seconds = loading_start.elapsed().as_secs_f64();

    if raw.parts.is_empty() {
        return Err(NestError::EmptyParts);
    }
    if raw.sheets.is_empty() {
        return Err(NestError::EmptySheets);
    }
    for sheet in &raw.sheets {
        if sheet.width <= 0.0 || sheet.height <= 0.0 {
            return Err(NestError::InvalidDimension(format!(
                "sheet '{}' has non-positive width/height",
                sheet.id
            )));
        }
    }

    let mut parameters = NestParameters::from_raw(&raw.parameters);
    if cli.svg {
        parameters.emit_svg = true;
    }
    if cli.no_svg {
        parameters.emit_svg = false;
    }

    let prep_start = Instant::now();
    let (parts, initially_skipped) = prepare_parts(&raw, logger);
    let preparation_time_seconds = prep_start.elapsed().as_secs_f64();

    let total_parts_requested: i64 = raw.parts.iter().map(|p| p.quantity.max(0)).sum();

    let job = NestJob { parts, sheets: raw.sheets, parameters };
    let outcome: NestOutcome = nest_engine::nest(&job, logger)?;

    Ok(assemble_document(
        outcome,
        total_parts_requested,
        initially_skipped,
        loading_time_seconds,
        preparation_time_seconds,
    ))
}

/// Build, repair, simplify, and enumerate candidate angles for every part
/// definition. Parts that fail repair are dropped with a warning; their
/// quantity is tallied into `initiallySkipped` rather than silently lost.
fn prepare_parts(raw: &NestJobRaw, logger: &dyn Logger) -> (Vec<PreparedPart>, i64) {
    let mut prepared = Vec::new();
    let mut initially_skipped = 0;

    for part in &raw.parts {
        if part.quantity <= 0 {
            continue;
        }
        let Some(profile) = &part.profile2d else {
            logger.warn(&format!("part '{}' has no profile2d; skipping", part.id));
            initially_skipped += part.quantity;
            continue;
        };
        let Some(thickness) = part.thickness else {
            logger.warn(&format!("part '{}' has no thickness; skipping", part.id));
            initially_skipped += part.quantity;
            continue;
        };

        let polygon = match nest_geom::build_polygon(&profile.outer, &profile.holes) {
            Ok(p) => p,
            Err(e) => {
                logger.warn(&format!("part '{}' produced an invalid polygon: {e}", part.id));
                initially_skipped += part.quantity;
                continue;
            }
        };

        let (simplified, _tolerance, _perimeter) = nest_geom::auto_simplify(&polygon);
        let candidate_angles = nest_geom::candidate_angles(&simplified);
        let area = simplified.area();

        prepared.push(PreparedPart {
            id: part.id.clone(),
            original_name: part.original_name.clone().unwrap_or_else(|| part.id.clone()),
            thickness,
            quantity: part.quantity,
            area,
            candidate_angles,
            polygon: simplified,
            raw_profile: profile.clone(),
        });
    }

    (prepared, initially_skipped)
}

fn assemble_document(
    outcome: NestOutcome,
    total_parts_requested: i64,
    initially_skipped: i64,
    loading_time_seconds: f64,
    preparation_time_seconds: f64,
) -> NestDocument {
    let total_parts_placed = outcome.placements.len() as i64;
    let unplaced_during_nesting: i64 = outcome.unplaced.iter().map(|u| u.quantity).sum();
    let total_parts_unplaced = initially_skipped + unplaced_during_nesting;

    let placements: Vec<PlacementRecord> = outcome.placements;
    let unplaced: Vec<UnplacedSummary> = outcome.unplaced;

    NestDocument {
        success: true,
        message: "nesting complete".to_string(),
        placements,
        unplaced,
        statistics: Some(JobStats {
            total_parts_requested,
            total_parts_placed,
            total_parts_unplaced,
            initially_skipped,
            unplaced_during_nesting,
            nesting_time_seconds: outcome.nesting_time_seconds,
            preparation_time_seconds,
            loading_time_seconds,
        }),
        error_details: None,
    }
}

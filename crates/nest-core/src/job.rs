use serde::{Deserialize, Serialize};

use crate::geometry::Polygon2D;

/// Raw profile as it appears in the job JSON: an outer ring and zero or
/// more hole rings, both as plain point lists (not yet validated/closed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile2dRaw {
    pub outer: Vec<[f64; 2]>,
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDef {
    pub id: String,
    #[serde(default, rename = "originalName")]
    pub original_name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub thickness: Option<f64>,
    pub profile2d: Option<Profile2dRaw>,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDef {
    pub id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub thickness: f64,
    pub width: f64,
    pub height: f64,
}

/// The `parameters` block of the job document, before normalisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParametersRaw {
    #[serde(default, rename = "partToPartDistance")]
    pub part_to_part_distance: Option<f64>,
    #[serde(default, rename = "partToSheetDistance")]
    pub part_to_sheet_distance: Option<f64>,
    #[serde(default, rename = "allowRotation")]
    pub allow_rotation: Option<String>,
    #[serde(default, rename = "bestFitScore")]
    pub best_fit_score: Option<String>,
    #[serde(default, rename = "emitSvg")]
    pub emit_svg: Option<bool>,
}

/// The full job document as read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestJobRaw {
    pub parts: Vec<PartDef>,
    pub sheets: Vec<SheetDef>,
    #[serde(default)]
    pub parameters: ParametersRaw,
}

/// The across-sheet/rotation tie-break rule (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStrategy {
    /// Prefer lower y, ties broken by lower x.
    Yx,
    /// Prefer smaller x^2 + y^2.
    OriginDist,
    /// Prefer lower sheet index, ties fall back to Yx.
    SheetYx,
}

impl ScoreStrategy {
    /// Parses case-insensitively; anything unrecognised falls back to `Yx`,
    /// mirroring the Python driver's implicit `else` branch.
    pub fn parse(raw: &str) -> ScoreStrategy {
        match raw.to_uppercase().as_str() {
            "ORIGINDIST" => ScoreStrategy::OriginDist,
            "SHEETYX" => ScoreStrategy::SheetYx,
            _ => ScoreStrategy::Yx,
        }
    }
}

/// Parameters after normalisation: negative distances clamped to zero,
/// `bestFitScore` resolved to a strategy, `allowRotation` kept only as an
/// informational string carried through to statistics.
#[derive(Debug, Clone)]
pub struct NestParameters {
    pub part_to_part_distance: f64,
    pub part_to_sheet_distance: f64,
    pub allow_rotation: String,
    pub score_strategy: ScoreStrategy,
    pub emit_svg: bool,
}

impl NestParameters {
    pub fn from_raw(raw: &ParametersRaw) -> Self {
        Self {
            part_to_part_distance: raw.part_to_part_distance.unwrap_or(0.0).max(0.0),
            part_to_sheet_distance: raw.part_to_sheet_distance.unwrap_or(0.0).max(0.0),
            allow_rotation: raw.allow_rotation.clone().unwrap_or_else(|| "2".to_string()),
            score_strategy: raw
                .best_fit_score
                .as_deref()
                .map(ScoreStrategy::parse)
                .unwrap_or(ScoreStrategy::Yx),
            emit_svg: raw.emit_svg.unwrap_or(true),
        }
    }
}

/// A validated, repaired, simplified part definition ready for the placement
/// loop. Immutable once built.
#[derive(Debug, Clone)]
pub struct PreparedPart {
    pub id: String,
    pub original_name: String,
    pub thickness: f64,
    pub quantity: i64,
    pub polygon: Polygon2D,
    pub area: f64,
    pub candidate_angles: Vec<f64>,
    pub raw_profile: Profile2dRaw,
}

/// The fully loaded and normalised job, ready to hand to the engine.
#[derive(Debug, Clone)]
pub struct NestJob {
    pub parts: Vec<PreparedPart>,
    pub sheets: Vec<SheetDef>,
    pub parameters: NestParameters,
}

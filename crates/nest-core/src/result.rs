use serde::{Deserialize, Serialize};

use crate::geometry::BBox;
use crate::job::Profile2dRaw;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BBoxOut {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<BBox> for BBoxOut {
    fn from(b: BBox) -> Self {
        BBoxOut { x: b.min_x, y: b.min_y, width: b.width(), height: b.height() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementRecord {
    #[serde(rename = "partInstanceId")]
    pub part_instance_id: String,
    #[serde(rename = "partId")]
    pub part_id: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    #[serde(rename = "sheetId")]
    pub sheet_id: String,
    pub x_bl_bbox: f64,
    pub y_bl_bbox: f64,
    pub width_bbox: f64,
    pub height_bbox: f64,
    pub rotation: f64,
    pub profile2d: Profile2dRaw,
    pub bbox: BBoxOut,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnplacedSummary {
    pub id: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStats {
    #[serde(rename = "totalPartsRequested")]
    pub total_parts_requested: i64,
    #[serde(rename = "totalPartsPlaced")]
    pub total_parts_placed: i64,
    #[serde(rename = "totalPartsUnplaced")]
    pub total_parts_unplaced: i64,
    #[serde(rename = "initiallySkipped")]
    pub initially_skipped: i64,
    #[serde(rename = "unplacedDuringNesting")]
    pub unplaced_during_nesting: i64,
    #[serde(rename = "nestingTimeSeconds")]
    pub nesting_time_seconds: f64,
    #[serde(rename = "preparationTimeSeconds")]
    pub preparation_time_seconds: f64,
    #[serde(rename = "loadingTimeSeconds")]
    pub loading_time_seconds: f64,
}

/// The single-line JSON object written to stdout, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestDocument {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placements: Vec<PlacementRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unplaced: Vec<UnplacedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<JobStats>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "error_details")]
    pub error_details: Option<String>,
}

impl NestDocument {
    pub fn fatal(message: impl Into<String>) -> Self {
        NestDocument {
            success: false,
            message: message.into(),
            placements: Vec::new(),
            unplaced: Vec::new(),
            statistics: None,
            error_details: None,
        }
    }

    pub fn fatal_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        let mut doc = NestDocument::fatal(message);
        doc.error_details = Some(details.into());
        doc
    }
}

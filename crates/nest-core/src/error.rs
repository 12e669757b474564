use thiserror::Error;

/// Fatal errors: anything that stops the job before a result document with
/// placements can be produced. Rendered straight into the `message` field
/// of the `{"success": false, ...}` output document.
#[derive(Debug, Error)]
pub enum NestError {
    #[error("input 'parts' is empty")]
    EmptyParts,

    #[error("input 'sheets' is empty")]
    EmptySheets,

    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error(
        "no sheets available for thickness {thickness}: parts and sheets must share a thickness"
    )]
    ThicknessMismatch { thickness: f64 },

    #[error("failed to read job file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse job file as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thickness_mismatch_message_cites_thickness() {
        let err = NestError::ThicknessMismatch { thickness: 1.5 };
        assert!(err.to_string().contains("1.5"));
        assert!(err.to_string().to_lowercase().contains("thickness"));
    }

    #[test]
    fn test_empty_parts_message() {
        assert_eq!(NestError::EmptyParts.to_string(), "input 'parts' is empty");
    }
}

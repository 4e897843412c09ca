// Normalized operation request/result model
//
// Every operation the gateway accepts is one variant of `OperationRequest`;
// every success is an `OperationResult`. Provider-specific shapes never leak
// past the mappers.

use serde::{Deserialize, Serialize};

use super::image::InlineImage;

/// Instruction used when an image edit arrives without one
pub const DEFAULT_EDIT_INSTRUCTION: &str = "Enhance this image";

// ============================================================================
// Request
// ============================================================================

/// A single gateway operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationRequest {
    /// Free-text question answered with web search grounding
    TextSearch { query: String },
    /// Place lookup answered with map grounding, optionally biased to a position
    PlaceSearch {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<GeoPoint>,
    },
    /// Transform an existing image according to an instruction
    ImageEdit {
        source_image: InlineImage,
        #[serde(default)]
        instruction: String,
    },
    /// Synthesize a new image from a prompt
    ImageGenerate {
        prompt: String,
        #[serde(default)]
        target_resolution: ResolutionTier,
    },
}

impl OperationRequest {
    /// Stable, content-free label for logs and metrics
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::TextSearch { .. } => OperationKind::TextSearch,
            Self::PlaceSearch { .. } => OperationKind::PlaceSearch,
            Self::ImageEdit { .. } => OperationKind::ImageEdit,
            Self::ImageGenerate { .. } => OperationKind::ImageGenerate,
        }
    }

    /// Check field-level invariants. Runs before any network call.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::TextSearch { query } => require_text("query", query),
            Self::PlaceSearch { query, location } => {
                require_text("query", query)?;
                match location {
                    Some(point) => point.validate(),
                    None => Ok(()),
                }
            }
            Self::ImageEdit { source_image, .. } => {
                if source_image.is_empty() {
                    Err("source_image must not be empty".to_string())
                } else {
                    Ok(())
                }
            }
            Self::ImageGenerate { prompt, .. } => require_text("prompt", prompt),
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} must not be empty", field))
    } else {
        Ok(())
    }
}

/// Operation discriminant without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    TextSearch,
    PlaceSearch,
    ImageEdit,
    ImageGenerate,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextSearch => "text_search",
            Self::PlaceSearch => "place_search",
            Self::ImageEdit => "image_edit",
            Self::ImageGenerate => "image_generate",
        }
    }

    pub fn supports_grounding(&self) -> bool {
        matches!(self, Self::TextSearch | Self::PlaceSearch)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WGS84 position used to bias place searches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err("latitude must be within [-90, 90]".to_string());
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err("longitude must be within [-180, 180]".to_string());
        }
        Ok(())
    }
}

/// Coarse output size for image synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResolutionTier {
    #[default]
    Low,
    Medium,
    High,
}

impl ResolutionTier {
    /// Provider `imageSize` value
    pub fn image_size(&self) -> &'static str {
        match self {
            Self::Low => "1K",
            Self::Medium => "2K",
            Self::High => "4K",
        }
    }
}

// ============================================================================
// Result
// ============================================================================

/// Which retrieval tool produced a citation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    Web,
    Map,
}

/// One grounding reference attached to a search answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source_kind: SourceKind,
    pub uri: String,
    pub title: String,
}

/// Normalized outcome of any operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub text: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
    /// Set when an image operation succeeded upstream but produced no image
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub empty_result_warning: bool,
}

impl OperationResult {
    pub fn text(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            text: text.into(),
            citations,
            image: None,
            empty_result_warning: false,
        }
    }

    pub fn image(text: impl Into<String>, image: InlineImage) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
            image: Some(image),
            empty_result_warning: false,
        }
    }

    /// Image operation that returned no image. Not an error.
    pub fn missing_image(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
            image: None,
            empty_result_warning: true,
        }
    }

    pub fn is_soft_failure(&self) -> bool {
        self.empty_result_warning
    }
}

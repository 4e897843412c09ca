// Common request-building helpers shared by the operation mappers
// Grounding tool selection, retrieval bias and image generation config

use serde_json::{json, Value};

use crate::models::{GeoPoint, OperationKind, ResolutionTier};

/// Aspect ratio requested for every synthesized image
pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

/// Provider tool declaration enabling grounding for `kind`, if any.
///
/// Web search for text search, map search for place search, nothing for
/// image operations.
pub fn grounding_tool(kind: OperationKind) -> Option<Value> {
    match kind {
        OperationKind::TextSearch => Some(json!({ "googleSearch": {} })),
        OperationKind::PlaceSearch => Some(json!({ "googleMaps": {} })),
        OperationKind::ImageEdit | OperationKind::ImageGenerate => None,
    }
}

/// `toolConfig` biasing map retrieval towards a position
pub fn retrieval_tool_config(point: &GeoPoint) -> Value {
    json!({
        "retrievalConfig": {
            "latLng": {
                "latitude": point.latitude,
                "longitude": point.longitude
            }
        }
    })
}

/// `generationConfig.imageConfig` for a resolution tier
pub fn image_config(tier: ResolutionTier) -> Value {
    json!({
        "aspectRatio": DEFAULT_ASPECT_RATIO,
        "imageSize": tier.image_size()
    })
}

/// Insert the grounding tool for `kind` into a request body.
///
/// Replaces any search tool already present so the body never declares two.
pub fn inject_grounding_tool(body: &mut Value, kind: OperationKind) {
    let Some(tool) = grounding_tool(kind) else {
        return;
    };
    if let Some(obj) = body.as_object_mut() {
        let tools_entry = obj.entry("tools").or_insert_with(|| json!([]));
        if let Some(tools_arr) = tools_entry.as_array_mut() {
            tools_arr.retain(|t| {
                t.as_object().map_or(true, |o| {
                    !(o.contains_key("googleSearch")
                        || o.contains_key("googleSearchRetrieval")
                        || o.contains_key("googleMaps"))
                })
            });
            tools_arr.push(tool);
        }
    }
}

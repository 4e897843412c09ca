// Gemini response → normalized OperationResult
//
// The only place that knows the provider response schema.

use serde_json::Value;

use super::models::{Candidate, GenerateContentResponse, GroundingChunk};
use crate::gateway::error::GatewayError;
use crate::models::{Citation, InlineImage, OperationRequest, OperationResult, SourceKind};

pub const NO_TEXT_ANSWER: &str = "The model returned no textual answer.";
pub const EDIT_SUCCESS: &str = "Image edited successfully.";
pub const NO_IMAGE_RETURNED: &str = "The model did not return an image.";

/// Strip the `{"response": ...}` envelope some endpoints wrap results in
pub fn unwrap_response(mut value: Value) -> Value {
    match value.get_mut("response").map(Value::take) {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

/// Decode a raw provider response and map it for `request`
pub fn transform_response(
    request: &OperationRequest,
    raw: Value,
) -> Result<OperationResult, GatewayError> {
    let response: GenerateContentResponse = serde_json::from_value(unwrap_response(raw))
        .map_err(|e| GatewayError::transport(format!("decode_error: unexpected response shape: {}", e)))?;
    normalize_response(request, &response)
}

/// Map a decoded provider response into the normalized result
pub fn normalize_response(
    request: &OperationRequest,
    response: &GenerateContentResponse,
) -> Result<OperationResult, GatewayError> {
    let candidate = response.candidates.first();
    let text = candidate.map(collect_text).unwrap_or_default();

    match request {
        OperationRequest::TextSearch { .. } | OperationRequest::PlaceSearch { .. } => {
            let citations = candidate.map(collect_citations).unwrap_or_default();
            let text = if text.trim().is_empty() {
                describe_missing_text(response)
            } else {
                text
            };
            Ok(OperationResult::text(text, citations))
        }
        OperationRequest::ImageEdit { .. } => match candidate.map(first_inline_image).transpose()? {
            Some(Some(image)) => Ok(OperationResult::image(EDIT_SUCCESS, image)),
            _ => Ok(OperationResult::missing_image(describe_missing_image(&text))),
        },
        OperationRequest::ImageGenerate {
            target_resolution, ..
        } => match candidate.map(first_inline_image).transpose()? {
            Some(Some(image)) => Ok(OperationResult::image(
                format!("Image generated at {}.", target_resolution.image_size()),
                image,
            )),
            _ => Ok(OperationResult::missing_image(describe_missing_image(&text))),
        },
    }
}

/// Concatenate the answer text, skipping thought parts
fn collect_text(candidate: &Candidate) -> String {
    candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Grounding chunks in provider order. Chunks with neither `web` nor `maps`
/// are dropped.
fn collect_citations(candidate: &Candidate) -> Vec<Citation> {
    candidate
        .grounding_metadata
        .as_ref()
        .map(|g| g.grounding_chunks.iter().filter_map(chunk_to_citation).collect())
        .unwrap_or_default()
}

fn chunk_to_citation(chunk: &GroundingChunk) -> Option<Citation> {
    let (source_kind, source) = match (&chunk.web, &chunk.maps) {
        (Some(web), _) => (SourceKind::Web, web),
        (None, Some(maps)) => (SourceKind::Map, maps),
        (None, None) => return None,
    };
    let uri = source.uri.clone().unwrap_or_default();
    let title = source
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| uri.clone());
    Some(Citation {
        source_kind,
        uri,
        title,
    })
}

/// First part carrying non-empty inline image bytes
fn first_inline_image(candidate: &Candidate) -> Result<Option<InlineImage>, GatewayError> {
    let Some(content) = candidate.content.as_ref() else {
        return Ok(None);
    };
    let Some(inline) = content
        .parts
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| !d.data.is_empty())
    else {
        return Ok(None);
    };
    InlineImage::from_base64(&inline.mime_type, &inline.data)
        .map(Some)
        .map_err(|e| GatewayError::transport(format!("decode_error: inline image: {}", e)))
}

fn describe_missing_text(response: &GenerateContentResponse) -> String {
    match response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        Some(reason) => format!("The request was blocked by the provider ({}).", reason),
        None => NO_TEXT_ANSWER.to_string(),
    }
}

fn describe_missing_image(model_text: &str) -> String {
    let model_text = model_text.trim();
    if model_text.is_empty() {
        NO_IMAGE_RETURNED.to_string()
    } else {
        format!("{} Model response: {}", NO_IMAGE_RETURNED, model_text)
    }
}

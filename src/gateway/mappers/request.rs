// Normalized request → Gemini generateContent body

use serde_json::{json, Value};

use crate::gateway::common::common_utils::{
    image_config, inject_grounding_tool, retrieval_tool_config,
};
use crate::models::operation::DEFAULT_EDIT_INSTRUCTION;
use crate::models::OperationRequest;

/// Build the provider request body for one operation.
///
/// Search operations get their grounding tool (and optional location bias);
/// image edits send the raw image followed by the instruction; generation
/// sends the prompt with the tier's image config.
pub fn build_request_body(request: &OperationRequest) -> Value {
    let kind = request.kind();

    match request {
        OperationRequest::TextSearch { query } => {
            let mut body = json!({ "contents": [user_content(vec![text_part(query)])] });
            inject_grounding_tool(&mut body, kind);
            body
        }
        OperationRequest::PlaceSearch { query, location } => {
            let mut body = json!({ "contents": [user_content(vec![text_part(query)])] });
            inject_grounding_tool(&mut body, kind);
            if let Some(point) = location {
                body["toolConfig"] = retrieval_tool_config(point);
            }
            body
        }
        OperationRequest::ImageEdit {
            source_image,
            instruction,
        } => {
            let instruction = if instruction.trim().is_empty() {
                DEFAULT_EDIT_INSTRUCTION
            } else {
                instruction.as_str()
            };
            let parts = vec![
                json!({
                    "inlineData": {
                        "mimeType": source_image.mime_type,
                        "data": source_image.to_base64()
                    }
                }),
                text_part(instruction),
            ];
            json!({ "contents": [user_content(parts)] })
        }
        OperationRequest::ImageGenerate {
            prompt,
            target_resolution,
        } => json!({
            "contents": [user_content(vec![text_part(prompt)])],
            "generationConfig": {
                "imageConfig": image_config(*target_resolution)
            }
        }),
    }
}

fn text_part(text: &str) -> Value {
    json!({ "text": text.trim() })
}

fn user_content(parts: Vec<Value>) -> Value {
    json!({ "role": "user", "parts": parts })
}

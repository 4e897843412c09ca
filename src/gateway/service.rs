// GroundedRequestGateway - single entry point for all operations
//
// validate → check key → build body → one upstream call → normalize.
// Holds only immutable configuration; clones share the HTTP client.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::GatewayError;
use super::mappers::{build_request_body, transform_response};
use super::upstream::{UpstreamClient, UpstreamTransport};
use crate::models::{GatewayConfig, ModelRoutes, OperationRequest, OperationResult};

/// Provider credential. Never printed.
#[derive(Clone)]
struct ApiKey(Arc<str>);

impl ApiKey {
    fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| Self(Arc::from(k)))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Clone)]
pub struct GroundedRequestGateway {
    api_key: Option<ApiKey>,
    models: Arc<ModelRoutes>,
    transport: Arc<dyn UpstreamTransport>,
}

impl GroundedRequestGateway {
    /// Build a gateway talking to the real provider
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = UpstreamClient::new(&config.upstream)?;
        Ok(Self::with_transport(
            config.effective_api_key(),
            config.models.clone(),
            Arc::new(client),
        ))
    }

    /// Build a gateway over any transport
    pub fn with_transport(
        api_key: Option<&str>,
        models: ModelRoutes,
        transport: Arc<dyn UpstreamTransport>,
    ) -> Self {
        Self {
            api_key: ApiKey::parse(api_key),
            models: Arc::new(models),
            transport,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Execute one operation.
    ///
    /// Exactly one upstream call on the happy path; none when the key is
    /// missing or the request is invalid. No retries.
    pub async fn execute(&self, request: OperationRequest) -> Result<OperationResult, GatewayError> {
        let kind = request.kind();
        let trace_id = uuid::Uuid::new_v4().simple().to_string();

        let Some(api_key) = self.api_key.as_ref() else {
            warn!(trace_id = %trace_id, operation = %kind, error = "auth_error", "No API key configured");
            return Err(GatewayError::Auth("no API key configured".to_string()));
        };

        if let Err(reason) = request.validate() {
            debug!(trace_id = %trace_id, operation = %kind, error = "validation_error", "Request rejected");
            return Err(GatewayError::Validation(reason));
        }

        let model = self.models.model_for(kind);
        let body = build_request_body(&request);
        info!(trace_id = %trace_id, operation = %kind, model = %model, "Dispatching operation");

        let started = Instant::now();
        let outcome = match self
            .transport
            .generate_content(api_key.expose(), model, body)
            .await
        {
            Ok(raw) => transform_response(&request, raw),
            Err(e) => Err(e),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(result) => info!(
                trace_id = %trace_id,
                operation = %kind,
                elapsed_ms,
                citations = result.citations.len(),
                has_image = result.image.is_some(),
                empty_result_warning = result.is_soft_failure(),
                "Operation completed"
            ),
            Err(e) => warn!(
                trace_id = %trace_id,
                operation = %kind,
                elapsed_ms,
                error = e.kind(),
                "Operation failed"
            ),
        }

        outcome
    }

    /// Like `execute`, but resolves to `Cancelled` as soon as `token` fires.
    ///
    /// The in-flight upstream future is dropped, which aborts the HTTP call.
    pub async fn execute_with_cancellation(
        &self,
        request: OperationRequest,
        token: &CancellationToken,
    ) -> Result<OperationResult, GatewayError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Operation cancelled by caller");
                Err(GatewayError::Cancelled)
            }
            result = self.execute(request) => result,
        }
    }
}

impl std::fmt::Debug for GroundedRequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroundedRequestGateway")
            .field("api_key", &self.api_key)
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{GeoPoint, InlineImage, ResolutionTier, SourceKind};
    use futures::future::BoxFuture;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;

    pub(crate) const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[derive(Debug, Clone)]
    pub(crate) struct CapturedCall {
        pub api_key: String,
        pub model: String,
        pub body: Value,
    }

    /// Transport that records every call and replies with a canned result
    pub(crate) struct MockTransport {
        reply: Mutex<Option<Result<Value, GatewayError>>>,
        delay: Option<Duration>,
        pub calls: Mutex<Vec<CapturedCall>>,
    }

    impl MockTransport {
        pub(crate) fn replying(reply: Value) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Ok(reply))),
                delay: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn failing(error: GatewayError) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Err(error))),
                delay: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn slow(reply: Value, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Ok(reply))),
                delay: Some(delay),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub(crate) fn last_call(&self) -> CapturedCall {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl UpstreamTransport for MockTransport {
        fn generate_content<'a>(
            &'a self,
            api_key: &'a str,
            model: &'a str,
            body: Value,
        ) -> BoxFuture<'a, Result<Value, GatewayError>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(CapturedCall {
                    api_key: api_key.to_string(),
                    model: model.to_string(),
                    body,
                });
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                let mut reply = self.reply.lock().unwrap();
                match reply.as_ref() {
                    Some(Ok(value)) => Ok(value.clone()),
                    _ => reply
                        .take()
                        .unwrap_or_else(|| Err(GatewayError::transport("mock exhausted"))),
                }
            })
        }
    }

    pub(crate) fn gateway_with(transport: Arc<MockTransport>) -> GroundedRequestGateway {
        GroundedRequestGateway::with_transport(Some("test-key"), ModelRoutes::default(), transport)
    }

    fn text_reply(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    fn image_reply() -> Value {
        json!({ "candidates": [{ "content": { "parts": [
            { "inlineData": { "mimeType": "image/png", "data": PIXEL_PNG } }
        ]}}]})
    }

    fn all_requests() -> Vec<OperationRequest> {
        vec![
            OperationRequest::TextSearch {
                query: "capital of France".to_string(),
            },
            OperationRequest::PlaceSearch {
                query: "coffee shops".to_string(),
                location: None,
            },
            OperationRequest::ImageEdit {
                source_image: InlineImage::from_transport(PIXEL_PNG).unwrap(),
                instruction: "add a border".to_string(),
            },
            OperationRequest::ImageGenerate {
                prompt: "a red cube".to_string(),
                target_resolution: ResolutionTier::Low,
            },
        ]
    }

    #[tokio::test]
    async fn test_text_search_scenario() {
        let transport = MockTransport::replying(json!({ "candidates": [{
            "content": { "parts": [{ "text": "Paris is the capital of France." }] },
            "groundingMetadata": { "groundingChunks": [
                { "web": { "uri": "https://en.wikipedia.org/wiki/Paris", "title": "Paris - Wikipedia" } }
            ]}
        }]}));
        let gateway = gateway_with(transport.clone());

        let result = gateway
            .execute(OperationRequest::TextSearch {
                query: "capital of France".to_string(),
            })
            .await
            .unwrap();

        assert!(!result.text.is_empty());
        assert!(result.image.is_none());
        assert_eq!(result.citations.len(), 1);
        assert_eq!(result.citations[0].source_kind, SourceKind::Web);

        assert_eq!(transport.call_count(), 1);
        let call = transport.last_call();
        assert_eq!(call.api_key, "test-key");
        assert_eq!(call.model, "gemini-3-flash-preview");
        assert!(call.body["tools"][0].get("googleSearch").is_some());
    }

    #[tokio::test]
    async fn test_place_search_applies_location_bias() {
        let transport = MockTransport::replying(text_reply("Here are some coffee shops."));
        let gateway = gateway_with(transport.clone());

        gateway
            .execute(OperationRequest::PlaceSearch {
                query: "coffee shops".to_string(),
                location: Some(GeoPoint::new(40.7128, -74.006)),
            })
            .await
            .unwrap();

        let call = transport.last_call();
        assert_eq!(call.model, "gemini-2.5-flash");
        assert!(call.body["tools"][0].get("googleMaps").is_some());
        let lat_lng = &call.body["toolConfig"]["retrievalConfig"]["latLng"];
        assert_eq!(lat_lng["latitude"], 40.7128);
        assert_eq!(lat_lng["longitude"], -74.006);
    }

    #[tokio::test]
    async fn test_image_edit_without_image_is_not_an_error() {
        let transport = MockTransport::replying(text_reply("Sorry, I can't do that."));
        let gateway = gateway_with(transport.clone());

        let result = gateway
            .execute(OperationRequest::ImageEdit {
                source_image: InlineImage::from_transport(&format!(
                    "data:image/png;base64,{}",
                    PIXEL_PNG
                ))
                .unwrap(),
                instruction: "add a border".to_string(),
            })
            .await
            .unwrap();

        assert!(result.image.is_none());
        assert!(result.is_soft_failure());
        assert!(!result.text.is_empty());
        assert!(result.citations.is_empty());

        let call = transport.last_call();
        assert_eq!(call.model, "gemini-2.5-flash-image");
        assert_eq!(call.body["contents"][0]["parts"][0]["inlineData"]["data"], PIXEL_PNG);
    }

    #[tokio::test]
    async fn test_image_generate_roundtrips_payload() {
        let transport = MockTransport::replying(image_reply());
        let gateway = gateway_with(transport.clone());

        let result = gateway
            .execute(OperationRequest::ImageGenerate {
                prompt: "a red cube".to_string(),
                target_resolution: ResolutionTier::High,
            })
            .await
            .unwrap();

        let image = result.image.expect("image payload");
        let uri = image.to_data_uri();
        assert_eq!(uri, format!("data:image/png;base64,{}", PIXEL_PNG));
        let decoded = InlineImage::from_transport(&uri).unwrap();
        assert_eq!(decoded, image);
        assert!(result.citations.is_empty());
        assert_eq!(result.text, "Image generated at 4K.");

        let call = transport.last_call();
        assert_eq!(call.model, "gemini-3-pro-image-preview");
        assert_eq!(call.body["generationConfig"]["imageConfig"]["imageSize"], "4K");
    }

    #[tokio::test]
    async fn test_every_variant_has_text_and_image_ops_have_no_citations() {
        let grounded_image_reply = json!({ "candidates": [{
            "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": PIXEL_PNG } }
            ]},
            "groundingMetadata": { "groundingChunks": [
                { "web": { "uri": "https://x.example", "title": "x" } }
            ]}
        }]});

        for request in all_requests() {
            let kind = request.kind();
            let transport = MockTransport::replying(grounded_image_reply.clone());
            let result = gateway_with(transport).execute(request).await.unwrap();
            assert!(!result.text.is_empty(), "empty text for {}", kind);
            if !kind.supports_grounding() {
                assert!(result.citations.is_empty(), "citations on {}", kind);
                assert!(result.image.is_some());
            } else {
                assert!(result.image.is_none());
            }
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        for api_key in [None, Some(""), Some("   ")] {
            let transport = MockTransport::replying(text_reply("unused"));
            let gateway = GroundedRequestGateway::with_transport(
                api_key,
                ModelRoutes::default(),
                transport.clone(),
            );
            assert!(!gateway.has_api_key());

            for request in all_requests() {
                let err = gateway.execute(request).await.unwrap_err();
                assert_eq!(err.kind(), "auth_error");
            }
            assert_eq!(transport.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_validation_fails_before_network() {
        let transport = MockTransport::replying(text_reply("unused"));
        let gateway = gateway_with(transport.clone());

        let invalid = vec![
            OperationRequest::TextSearch { query: "".to_string() },
            OperationRequest::PlaceSearch {
                query: "cafe".to_string(),
                location: Some(GeoPoint::new(120.0, 0.0)),
            },
            OperationRequest::ImageGenerate {
                prompt: "  ".to_string(),
                target_resolution: ResolutionTier::Medium,
            },
        ];
        for request in invalid {
            let err = gateway.execute(request).await.unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)));
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_errors_propagate_unmodified() {
        let transport = MockTransport::failing(GatewayError::Auth("API key not valid".to_string()));
        let err = gateway_with(transport.clone())
            .execute(OperationRequest::TextSearch { query: "hi".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Auth(ref m) if m == "API key not valid"));
        assert_eq!(transport.call_count(), 1);

        let transport = MockTransport::failing(GatewayError::transport_status(503, "overloaded"));
        let err = gateway_with(transport)
            .execute(OperationRequest::TextSearch { query: "hi".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport { status: Some(503), .. }));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_call() {
        let transport = MockTransport::slow(text_reply("late"), Duration::from_secs(30));
        let gateway = gateway_with(transport.clone());
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = gateway
            .execute_with_cancellation(
                OperationRequest::TextSearch { query: "hi".to_string() },
                &token,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Cancelled));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_uncancelled_token_passes_result_through() {
        let transport = MockTransport::replying(text_reply("Paris"));
        let gateway = gateway_with(transport);
        let token = CancellationToken::new();
        let result = gateway
            .execute_with_cancellation(
                OperationRequest::TextSearch { query: "capital".to_string() },
                &token,
            )
            .await
            .unwrap();
        assert_eq!(result.text, "Paris");
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let transport = MockTransport::replying(text_reply("ok"));
        let gateway = gateway_with(transport.clone());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    gateway
                        .execute(OperationRequest::TextSearch { query: format!("q{}", i) })
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().text, "ok");
        }
        assert_eq!(transport.call_count(), 8);
    }

    #[test]
    fn test_debug_never_prints_key() {
        let gateway = gateway_with(MockTransport::replying(json!({})));
        let debug = format!("{:?}", gateway);
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("redacted"));
    }
}

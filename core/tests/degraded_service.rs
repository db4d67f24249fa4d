//! End-to-end behavior with the generative service unreachable: the
//! caller still receives a complete, invariant-satisfying specification.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use slidegen_chatgpt::{ChatTransport, StructuredOutputClient, TransportResponse};
use slidegen_common::Config;
use slidegen_core::enhance::ACTION_VERBS;
use slidegen_core::fallback::validate_fallback_spec;
use slidegen_core::limits::{LruBackgroundCache, WindowRateLimiter};
use slidegen_core::SlidePipeline;
use slidegen_protocol::envelope::GenerateRequest;

struct Unreachable;

#[async_trait]
impl ChatTransport for Unreachable {
    async fn send(&self, _body: Value) -> anyhow::Result<TransportResponse> {
        anyhow::bail!("connection refused")
    }
}

fn offline_pipeline() -> SlidePipeline {
    let config = Config::default();
    let client = StructuredOutputClient::with_transport(Arc::new(Unreachable), "offline", 2048)
        .with_base_delay(Duration::from_millis(1));
    SlidePipeline::with_collaborators(
        config.clone(),
        client,
        Arc::new(WindowRateLimiter::new(config.requests_per_minute)),
        Arc::new(LruBackgroundCache::default()),
    )
}

#[tokio::test]
async fn unavailable_service_yields_a_valid_fallback_spec() {
    let pipeline = offline_pipeline();
    let response = pipeline
        .generate(GenerateRequest::new("Q1 revenue growth strategy"))
        .await
        .expect("fallback path must not fail");

    let spec = &response.spec;
    assert!(validate_fallback_spec(spec));
    assert_eq!(response.model, "fallback");

    let title = &spec.content.title.text;
    assert!(
        ACTION_VERBS.iter().any(|v| title.starts_with(v)),
        "title {title:?} should start with a fixed action verb"
    );

    let palette = &spec.style_tokens.as_ref().expect("style tokens").palette;
    assert_eq!(palette.neutral.len(), 9);

    for id in spec.content_ids() {
        let count = spec
            .layout
            .anchors
            .iter()
            .filter(|a| a.content_id == id)
            .count();
        assert_eq!(count, 1, "{id} should carry exactly one anchor");
    }
    for anchor in &spec.layout.anchors {
        assert!(
            spec.layout.regions.iter().any(|r| r.name == anchor.region),
            "anchor {} points at a missing region",
            anchor.content_id
        );
    }
}

#[tokio::test]
async fn identical_requests_replay_identically_offline() {
    let pipeline = offline_pipeline();
    let mut first = GenerateRequest::new("Operational efficiency review");
    first.request_id = "fixed-id".to_string();
    let mut second = first.clone();
    second.request_id = "fixed-id".to_string();

    let a = pipeline.generate(first).await.expect("first");
    let b = pipeline.generate(second).await.expect("second");
    assert_eq!(
        serde_json::to_value(&a.spec).expect("serialize"),
        serde_json::to_value(&b.spec).expect("serialize")
    );
}

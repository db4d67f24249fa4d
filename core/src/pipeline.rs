//! The orchestrator: raw prompt in, validated specification out. Input and
//! moderation rejections surface; every other failure routes to the
//! fallback factory, so callers never see a raw transport error.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use slidegen_chatgpt::StructuredOutputClient;
use slidegen_common::Config;
use slidegen_protocol::envelope::{GenerateRequest, GenerateResponse};
use slidegen_protocol::spec::SlideSpec;

use crate::enhance;
use crate::error::{PipelineError, Result};
use crate::fallback;
use crate::generator;
use crate::limits::{
    BackgroundCache, LruBackgroundCache, RateLimiter, WindowRateLimiter,
};
use crate::planner;
use crate::rules;
use crate::sanitize;
use crate::safety;

const FALLBACK_MODEL_LABEL: &str = "fallback";

pub struct SlidePipeline {
    config: Config,
    client: StructuredOutputClient,
    rate_limiter: Arc<dyn RateLimiter>,
    background_cache: Arc<dyn BackgroundCache>,
}

impl SlidePipeline {
    pub fn new(config: Config) -> Self {
        let client = StructuredOutputClient::new(&config);
        let rate_limiter = Arc::new(WindowRateLimiter::new(config.requests_per_minute));
        Self::with_collaborators(
            config,
            client,
            rate_limiter,
            Arc::new(LruBackgroundCache::default()),
        )
    }

    pub fn with_collaborators(
        config: Config,
        client: StructuredOutputClient,
        rate_limiter: Arc<dyn RateLimiter>,
        background_cache: Arc<dyn BackgroundCache>,
    ) -> Self {
        Self {
            config,
            client,
            rate_limiter,
            background_cache,
        }
    }

    /// Read path for the decorative-background collaborator.
    pub fn background_cache(&self) -> &Arc<dyn BackgroundCache> {
        &self.background_cache
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let started = Instant::now();
        let request_id = request.request_id.clone();

        let client_key = request.user_id.as_deref().unwrap_or("anonymous");
        if !self.rate_limiter.try_acquire(client_key) {
            return Err(PipelineError::Processing(format!(
                "rate limit exceeded for {client_key}"
            )));
        }

        let sanitized = sanitize::sanitize(&request.prompt, self.config.max_prompt_len)?;
        safety::check(&sanitized)?;

        let (spec, model) = match self
            .generate_candidate(&self.client, &sanitized, &request_id)
            .await
        {
            Ok(spec) => (spec, self.client.model().to_string()),
            Err(err) => {
                warn!(
                    request_id = %request_id,
                    error = %err,
                    "primary model failed, trying the fallback model"
                );
                match self.degraded_candidate(&sanitized, &request_id).await {
                    Some(spec) => (spec, self.config.fallback_model.clone()),
                    None => {
                        warn!(
                            request_id = %request_id,
                            "generation failed, serving fallback specification"
                        );
                        (
                            fallback::fallback_spec(&sanitized, Some(&request_id)),
                            FALLBACK_MODEL_LABEL.to_string(),
                        )
                    }
                }
            }
        };

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            request_id = %request_id,
            model = %model,
            processing_time_ms,
            "specification ready"
        );
        Ok(GenerateResponse {
            spec,
            request_id,
            processing_time_ms,
            model,
        })
    }

    /// Planner then generator, sequential and dependent; enforcement and
    /// enhancement run on whatever the generator produced.
    async fn generate_candidate(
        &self,
        client: &StructuredOutputClient,
        sanitized: &str,
        request_id: &str,
    ) -> Result<SlideSpec> {
        let plan = planner::plan_intent(client, sanitized, request_id).await?;
        let mut spec = generator::generate_content(client, sanitized, &plan, request_id).await?;
        rules::enforce(&mut spec);
        enhance::enhance(&mut spec, Some(&plan), Some(sanitized));
        Ok(spec)
    }

    /// One more pass on the configured fallback model, skipped when it
    /// would repeat the model that just failed.
    async fn degraded_candidate(&self, sanitized: &str, request_id: &str) -> Option<SlideSpec> {
        if self.config.fallback_model == self.client.model() {
            return None;
        }
        let degraded = self.client.with_model(&self.config.fallback_model);
        match self.generate_candidate(&degraded, sanitized, request_id).await {
            Ok(spec) => Some(spec),
            Err(err) => {
                warn!(request_id = %request_id, error = %err, "fallback model failed");
                None
            }
        }
    }
}

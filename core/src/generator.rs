use slidegen_chatgpt::{ClientError, StructuredOutputClient};
use slidegen_protocol::intent::IntentPlan;
use slidegen_protocol::schema::{slide_spec_schema, SchemaContract};
use slidegen_protocol::spec::SlideSpec;

/// Moderate temperature: content wants some variety, the planner does not.
const GENERATOR_TEMPERATURE: f32 = 0.6;

const GENERATOR_PREFIX: &str = "Produce one presentation slide specification for the request \
below. Fill content, layout regions, anchors and style tokens. Keep the title under 60 \
characters, at most 3 bullet groups of at most 6 items, and use a chart only when the request \
calls for data.";

/// One structured-output call for the full candidate specification. The
/// planner's summary rides along as read-only context; no retries beyond
/// what the client already performs.
pub async fn generate_content(
    client: &StructuredOutputClient,
    prompt: &str,
    plan: &IntentPlan,
    request_id: &str,
) -> Result<SlideSpec, ClientError> {
    let contract = SchemaContract::<SlideSpec>::new("slide_spec", slide_spec_schema());
    let full_prompt = format!(
        "{GENERATOR_PREFIX}\n\nRequest: {prompt}\nPlanning hints: {}",
        plan.summary()
    );
    client
        .call(&full_prompt, &contract, GENERATOR_TEMPERATURE, request_id)
        .await
}

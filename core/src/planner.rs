use slidegen_chatgpt::{ClientError, StructuredOutputClient};
use slidegen_protocol::intent::IntentPlan;
use slidegen_protocol::schema::{intent_plan_schema, SchemaContract};

/// Near-deterministic: planning should not vary run to run.
const PLANNER_TEMPERATURE: f32 = 0.1;

const PLANNER_PREFIX: &str = "Extract presentation intent metadata from the user's slide request. \
Classify the communication intent, the audience, the tone, the slide pattern that fits best and \
the visual plan. List brand names the request mentions as brandHints and concrete figures or \
series as dataHints. Request:";

/// Thin structured-output call that turns the sanitized prompt into an
/// `IntentPlan`. Failures propagate; the orchestrator decides what to do.
pub async fn plan_intent(
    client: &StructuredOutputClient,
    prompt: &str,
    request_id: &str,
) -> Result<IntentPlan, ClientError> {
    let contract = SchemaContract::<IntentPlan>::new("intent_plan", intent_plan_schema());
    let full_prompt = format!("{PLANNER_PREFIX}\n{prompt}");
    let mut plan = client
        .call(&full_prompt, &contract, PLANNER_TEMPERATURE, request_id)
        .await?;
    plan.clamp();
    Ok(plan)
}

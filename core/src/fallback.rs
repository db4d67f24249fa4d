//! Degraded-service specification, built with zero external calls. Every
//! invariant the pipeline guarantees holds here by construction.

use slidegen_protocol::spec::{
    BulletGroup, BulletItem, Callout, CalloutVariant, SlideSpec, TextBlock,
};

use crate::design;
use crate::enhance::ACTION_VERBS;
use crate::rules::{truncate_ellipsis, MAX_TITLE_LEN};

const TITLE_WORDS: usize = 6;

/// Build a complete, valid specification from the prompt alone. The verb
/// choice is seeded by the request id so identical requests replay
/// identically.
pub fn fallback_spec(prompt: &str, request_id: Option<&str>) -> SlideSpec {
    let mut spec = SlideSpec::default();

    let verb = pick_seeded_verb(request_id.unwrap_or(prompt));
    let topic: String = prompt
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    let title = if topic.is_empty() {
        format!("{verb} your presentation")
    } else {
        format!("{verb} {topic}")
    };
    spec.content.title = TextBlock::new("title", truncate_ellipsis(&title, MAX_TITLE_LEN));

    spec.content.bullets = vec![BulletGroup {
        id: "bullets-1".to_string(),
        heading: None,
        items: vec![
            BulletItem::new("Situation: where things stand today", 1),
            BulletItem::new("Complication: what is changing and why it matters", 1),
            BulletItem::new("Resolution: the path forward and next steps", 1),
        ],
    }];

    spec.content.callouts = vec![Callout {
        id: "callout-1".to_string(),
        variant: CalloutVariant::Note,
        text: "Generated in degraded mode; content is a structured starting point".to_string(),
    }];

    spec.meta.theme = design::DEFAULT_THEME.to_string();
    spec.meta.locale = design::DEFAULT_LOCALE.to_string();
    spec.design.whitespace.breathing_room = design::BREATHING_ROOM;
    spec.layout.grid = design::grid();
    spec.layout.regions = design::standard_regions();
    spec.style_tokens = Some(design::style_tokens());

    crate::layout::repair(&mut spec);
    spec
}

/// Structural self-check used by tests and the orchestrator's debug
/// assertions: all required sections present, neutral ramp complete.
pub fn validate_fallback_spec(spec: &SlideSpec) -> bool {
    let tokens = match &spec.style_tokens {
        Some(tokens) => tokens,
        None => return false,
    };
    !spec.content.title.text.is_empty()
        && !spec.content.bullets.is_empty()
        && !spec.content.callouts.is_empty()
        && !spec.layout.regions.is_empty()
        && spec.layout.grid.columns > 0
        && spec.layout.grid.rows > 0
        && tokens.palette.neutral.len() == 9
        && spec
            .content_ids()
            .iter()
            .all(|id| spec.layout.anchors.iter().any(|a| &a.content_id == id))
}

fn pick_seeded_verb(seed_text: &str) -> &'static str {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in seed_text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    ACTION_VERBS[(hash % ACTION_VERBS.len() as u64) as usize]
}

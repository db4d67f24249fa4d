//! Idempotent enhancement pass. Runs after rule enforcement on a
//! well-typed document; fixes titles, splits concatenated bullet text,
//! infers callouts and image placeholders, normalizes charts and repairs
//! the palette. Layout repair lives in `layout` and runs last, once all
//! content identifiers are final.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info};

use slidegen_protocol::intent::IntentPlan;
use slidegen_protocol::spec::{
    BulletItem, Callout, CalloutVariant, ImagePlaceholder, Legend, SlideSpec, ValueFormat,
};

use crate::color;
use crate::design;
use crate::layout;
use crate::rules::{truncate_ellipsis, MAX_ITEMS_PER_GROUP, MAX_ITEM_TEXT_LEN, MAX_TITLE_LEN};

pub const ACTION_VERBS: &[&str] = &[
    "Accelerate",
    "Drive",
    "Transform",
    "Unlock",
    "Optimize",
    "Deliver",
    "Elevate",
    "Streamline",
];

const MAX_INFERRED_CALLOUTS: usize = 3;
const CALLOUT_PREVIEW_LEN: usize = 60;
const MIN_CHART_LABELS: usize = 2;
const MAX_CHART_LABELS: usize = 12;

/// Fraction rescale window: values under percent format that look like
/// 0..1 ratios get multiplied by 100. The lower bound keeps already
/// rescaled (and genuinely tiny) series from being scaled twice.
const FRACTION_MIN: f64 = 0.01;
const FRACTION_MAX: f64 = 1.0;

/// Run every sub-pass in order. Running the result through `enhance`
/// again produces the same document.
pub fn enhance(spec: &mut SlideSpec, plan: Option<&IntentPlan>, prompt: Option<&str>) {
    fix_title(spec);
    normalize_bullets(spec);
    infer_callouts(spec);
    infer_image_placeholder(spec);
    normalize_chart(spec);
    repair_palette(spec, plan, prompt);
    layout::repair(spec);
}

// ---------------------------------------------------------------------------
// Title / subtitle hygiene
// ---------------------------------------------------------------------------

fn fix_title(spec: &mut SlideSpec) {
    let title = &mut spec.content.title;
    title.text = collapse_whitespace(&title.text);
    if !starts_with_action_verb(&title.text) && !title.text.is_empty() {
        let verb = pick_verb(&title.text);
        title.text = truncate_ellipsis(&format!("{verb} {}", title.text), MAX_TITLE_LEN);
    }
    if let Some(subtitle) = &mut spec.content.subtitle {
        subtitle.text = collapse_whitespace(&subtitle.text);
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_action_verb(text: &str) -> bool {
    let lower = text.to_lowercase();
    ACTION_VERBS
        .iter()
        .any(|verb| lower.starts_with(&verb.to_lowercase()))
}

/// Keyword buckets pick the verb; a generic default covers the rest.
fn pick_verb(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let buckets: &[(&[&str], &str)] = &[
        (
            &["growth", "grow", "revenue", "sales", "expand", "market"],
            "Accelerate",
        ),
        (
            &["efficien", "cost", "optimiz", "productiv", "process"],
            "Streamline",
        ),
        (
            &["innovat", "transform", "digital", "future", "modern"],
            "Transform",
        ),
    ];
    for (keywords, verb) in buckets {
        if keywords.iter().any(|k| lower.contains(k)) {
            return verb;
        }
    }
    "Elevate"
}

// ---------------------------------------------------------------------------
// Bullet normalization
// ---------------------------------------------------------------------------

/// Pattern families for the concatenation defect, tried in priority
/// order. The first family with more than one match wins. No leading
/// word boundary on the year and month families: in glued text like
/// `independence1783` the marker follows a letter, so there is none.
fn split_families() -> &'static Vec<(&'static str, Regex)> {
    static FAMILIES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    FAMILIES.get_or_init(|| {
        [
            ("year", r"[12]\d{3}\b"),
            ("year-range", r"[12]\d{3}\s*[-–]\s*[12]\d{3}\b"),
            ("quarter", r"\bQ[1-4]\b"),
            (
                "month-year",
                r"(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+[12]\d{3}\b",
            ),
            ("numbered-list", r"\b\d+[.)]\s"),
        ]
        .iter()
        .filter_map(|(name, p)| Some((*name, Regex::new(p).ok()?)))
        .collect()
    })
}

fn normalize_bullets(spec: &mut SlideSpec) {
    let mut seen: HashSet<String> = HashSet::new();
    for group in &mut spec.content.bullets {
        let mut items = Vec::with_capacity(group.items.len());
        for item in group.items.drain(..) {
            match split_concatenated(&item.text) {
                Some((family, parts)) => {
                    debug!(family, parts = parts.len(), "split concatenated bullet");
                    items.extend(
                        parts
                            .into_iter()
                            .map(|text| BulletItem::new(text, item.level)),
                    );
                }
                None => items.push(item),
            }
        }
        for item in &mut items {
            item.level = item.level.clamp(1, 3);
            item.text = truncate_ellipsis(item.text.trim(), MAX_ITEM_TEXT_LEN);
        }
        // splitting can mint duplicates the pre-split dedup never saw
        items.retain(|item| !item.text.is_empty() && seen.insert(item.text.to_lowercase()));
        items.truncate(MAX_ITEMS_PER_GROUP);
        group.items = items;
    }
    spec.content.bullets.retain(|group| !group.items.is_empty());
    for (index, group) in spec.content.bullets.iter_mut().enumerate() {
        group.id = format!("bullets-{}", index + 1);
    }
}

/// Split text at the start of each marker occurrence when one family
/// matches more than once. Returns `None` when the item is fine as-is.
fn split_concatenated(text: &str) -> Option<(&'static str, Vec<String>)> {
    for (family, pattern) in split_families() {
        let starts: Vec<usize> = pattern.find_iter(text).map(|m| m.start()).collect();
        if starts.len() < 2 {
            continue;
        }
        let mut parts = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let begin = if i == 0 { 0 } else { start };
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            let part = text[begin..end].trim();
            if !part.is_empty() {
                parts.push(part.to_string());
            }
        }
        if parts.len() > 1 {
            return Some((family, parts));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Callout and image inference
// ---------------------------------------------------------------------------

fn insight_vocab() -> &'static Regex {
    static VOCAB: OnceLock<Regex> = OnceLock::new();
    VOCAB.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        let pattern = Regex::new(
            r"(?i)\b(growth|increase|improve|revenue|profit|margin|result|forecast|projection|record|milestone)\b",
        )
        .unwrap();
        pattern
    })
}

fn risk_vocab() -> &'static Regex {
    static VOCAB: OnceLock<Regex> = OnceLock::new();
    VOCAB.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        let pattern =
            Regex::new(r"(?i)\b(risk|challenge|threat|decline|warning|concern|obstacle|headwind)\b")
                .unwrap();
        pattern
    })
}

/// When the generator produced no callouts, surface the most callout-like
/// bullet lines instead: insights as `success`, risks as `warning`.
fn infer_callouts(spec: &mut SlideSpec) {
    if spec.content.callouts.is_empty() {
        let mut inferred = Vec::new();
        for item in spec.content.bullets.iter().flat_map(|g| &g.items) {
            if inferred.len() >= MAX_INFERRED_CALLOUTS {
                break;
            }
            let variant = if insight_vocab().is_match(&item.text) {
                CalloutVariant::Success
            } else if risk_vocab().is_match(&item.text) {
                CalloutVariant::Warning
            } else {
                continue;
            };
            inferred.push(Callout {
                id: String::new(),
                variant,
                text: truncate_ellipsis(&item.text, CALLOUT_PREVIEW_LEN),
            });
        }
        spec.content.callouts = inferred;
    }

    for (index, callout) in spec.content.callouts.iter_mut().enumerate() {
        callout.id = format!("callout-{}", index + 1);
    }
}

fn visual_vocab() -> &'static Regex {
    static VOCAB: OnceLock<Regex> = OnceLock::new();
    VOCAB.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        let pattern =
            Regex::new(r"(?i)\b(image|diagram|chart|photo|picture|illustration|visual)\b").unwrap();
        pattern
    })
}

fn infer_image_placeholder(spec: &mut SlideSpec) {
    if spec.content.image_placeholders.is_empty()
        && visual_vocab().is_match(&visible_text(spec))
    {
        spec.content.image_placeholders.push(ImagePlaceholder {
            id: String::new(),
            kind: "illustration".to_string(),
            description: format!("Illustration for: {}", spec.content.title.text),
        });
    }

    for (index, image) in spec.content.image_placeholders.iter_mut().enumerate() {
        image.id = format!("image-{}", index + 1);
    }
}

/// Reader-facing text only. Identifiers and enum tags stay out so that
/// stamped ids like the chart's never read as visual language.
fn visible_text(spec: &SlideSpec) -> String {
    let content = &spec.content;
    let mut lines = vec![content.title.text.as_str()];
    if let Some(subtitle) = &content.subtitle {
        lines.push(&subtitle.text);
    }
    for group in &content.bullets {
        if let Some(heading) = &group.heading {
            lines.push(heading);
        }
        lines.extend(group.items.iter().map(|item| item.text.as_str()));
    }
    lines.extend(content.callouts.iter().map(|c| c.text.as_str()));
    if let Some(chart) = &content.data_viz {
        lines.extend(chart.labels.iter().map(String::as_str));
        lines.extend(chart.series.iter().map(|s| s.name.as_str()));
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Chart normalization
// ---------------------------------------------------------------------------

fn normalize_chart(spec: &mut SlideSpec) {
    let Some(chart) = &mut spec.content.data_viz else {
        return;
    };
    if chart.id.is_empty() {
        chart.id = "chart".to_string();
    }

    chart.labels.truncate(MAX_CHART_LABELS);
    let mut n = chart.labels.len();
    while n < MIN_CHART_LABELS {
        n += 1;
        chart.labels.push(format!("Item {n}"));
    }

    if chart.value_format == ValueFormat::Percent {
        let all_numeric = chart
            .labels
            .iter()
            .all(|l| l.trim().parse::<f64>().is_ok());
        if all_numeric {
            info!(chart = %chart.id, "percent chart has all-numeric labels");
        }

        let max = chart
            .series
            .iter()
            .flat_map(|s| &s.values)
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if max > FRACTION_MIN && max < FRACTION_MAX {
            for series in &mut chart.series {
                for value in &mut series.values {
                    *value *= 100.0;
                }
            }
        }
    }

    let label_count = chart.labels.len();
    for series in &mut chart.series {
        series.values.resize(label_count, 0.0);
    }

    if chart.series.len() > 1 && chart.legend.is_none() {
        chart.legend = Some(Legend::default());
    }
}

// ---------------------------------------------------------------------------
// Palette synthesis & repair
// ---------------------------------------------------------------------------

fn repair_palette(spec: &mut SlideSpec, plan: Option<&IntentPlan>, prompt: Option<&str>) {
    let tokens = spec.style_tokens.get_or_insert_with(design::style_tokens);
    let palette = &mut tokens.palette;
    let context = prompt.unwrap_or(&spec.content.title.text);

    if !color::is_valid_hex(&palette.primary) || !color::is_valid_hex(&palette.accent) {
        let brand_texts = std::iter::once(context).chain(
            plan.into_iter()
                .flat_map(|p| p.brand_hints.iter().map(String::as_str)),
        );
        let (primary, accent) = color::brand_pair(brand_texts)
            .or_else(|| color::sector_pair(context))
            .unwrap_or_else(|| color::generic_pair(context));
        palette.primary = primary.to_string();
        palette.accent = accent.to_string();
    }

    let neutral_ok =
        palette.neutral.len() == 9 && palette.neutral.iter().all(|c| color::is_valid_hex(c));
    if !neutral_ok {
        palette.neutral = color::neutral_ramp(color::NEUTRAL_DARK, color::NEUTRAL_LIGHT);
    }

    if color::contrast_hex(&palette.neutral[0], &palette.neutral[8]) < 7.0 {
        palette.neutral[0] = color::format_hex(color::NEUTRAL_DARK);
        palette.neutral[8] = color::format_hex(color::NEUTRAL_LIGHT);
    }

    if color::contrast_hex(&palette.primary, &palette.accent) < 4.5 {
        palette.accent = color::repair_accent(&palette.primary, 4.5);
    }
}

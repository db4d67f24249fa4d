//! Deterministic rule enforcement: pure, total, never fails. Runs on the
//! raw generator output before any enhancement.

use std::collections::HashSet;

use slidegen_protocol::spec::SlideSpec;

use crate::design;

pub const MAX_TITLE_LEN: usize = 60;
pub const MAX_SUBTITLE_LEN: usize = 100;
pub const MAX_BULLET_GROUPS: usize = 3;
pub const MAX_ITEMS_PER_GROUP: usize = 7;
pub const MAX_ITEM_TEXT_LEN: usize = 80;
pub const MAX_CALLOUTS: usize = 4;

/// Character-cap with an ellipsis marker; stable under re-application.
pub fn truncate_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Apply every deterministic clamp and default, in order. Design
/// consistency wins over generated variety: the grid and typography are
/// overwritten unconditionally.
pub fn enforce(spec: &mut SlideSpec) {
    let content = &mut spec.content;

    if content.title.id.is_empty() {
        content.title.id = "title".to_string();
    }
    content.title.text = truncate_ellipsis(content.title.text.trim(), MAX_TITLE_LEN);
    if let Some(subtitle) = &mut content.subtitle {
        if subtitle.id.is_empty() {
            subtitle.id = "subtitle".to_string();
        }
        subtitle.text = truncate_ellipsis(subtitle.text.trim(), MAX_SUBTITLE_LEN);
    }

    content.bullets.truncate(MAX_BULLET_GROUPS);
    let mut seen: HashSet<String> = HashSet::new();
    for group in &mut content.bullets {
        group.items.truncate(MAX_ITEMS_PER_GROUP);
        for item in &mut group.items {
            item.text = truncate_ellipsis(item.text.trim(), MAX_ITEM_TEXT_LEN);
        }
        group
            .items
            .retain(|item| !item.text.is_empty() && seen.insert(item.text.to_lowercase()));
    }
    content.bullets.retain(|group| !group.items.is_empty());

    content.callouts.truncate(MAX_CALLOUTS);

    if spec.design.whitespace.breathing_room <= 0.0 {
        spec.design.whitespace.breathing_room = design::BREATHING_ROOM;
    }
    if spec.meta.theme.is_empty() {
        spec.meta.theme = design::DEFAULT_THEME.to_string();
    }
    if spec.meta.locale.is_empty() {
        spec.meta.locale = design::DEFAULT_LOCALE.to_string();
    }
    spec.meta.version = slidegen_protocol::spec::SPEC_VERSION.to_string();

    spec.layout.grid = design::grid();
    for region in &mut spec.layout.regions {
        region.row = region.row.clamp(1, design::GRID_ROWS);
        region.col = region.col.clamp(1, design::GRID_COLUMNS);
        region.row_span = region.row_span.clamp(1, design::GRID_ROWS - region.row + 1);
        region.col_span = region
            .col_span
            .clamp(1, design::GRID_COLUMNS - region.col + 1);
    }

    match &mut spec.style_tokens {
        None => spec.style_tokens = Some(design::style_tokens()),
        Some(tokens) => tokens.typography = design::typography(),
    }
}

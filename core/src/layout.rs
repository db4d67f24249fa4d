//! Layout repair: the last enhancement sub-pass, run once every content
//! identifier is final. Restores region/anchor consistency for any
//! starting layout, however inconsistent.

use std::collections::HashSet;

use slidegen_protocol::spec::{Anchor, Region, SlideSpec};

use crate::design::{GRID_COLUMNS, GRID_ROWS};

const HEADER: &str = "header";
const FOOTER: &str = "footer";
const BODY: &str = "body";
const BODY_LEFT: &str = "body-left";
const BODY_RIGHT: &str = "body-right";

/// Column width of the bullet half when the body splits; the chart takes
/// the rest.
const SPLIT_LEFT_COLS: u32 = 5;

pub fn repair(spec: &mut SlideSpec) {
    if spec.layout.regions.is_empty() {
        spec.layout.regions = vec![
            Region::new(HEADER, 1, 1, 1, GRID_COLUMNS),
            Region::new(BODY, 2, 1, GRID_ROWS - 1, GRID_COLUMNS),
        ];
    }

    grow_header_for_subtitle(spec);
    split_body_for_chart(spec);
    drop_dangling_anchors(spec);
    synthesize_missing_anchors(spec);
}

/// A subtitle under the title needs two header rows. Regions that started
/// inside the newly consumed rows move down and shrink, never below one
/// row.
fn grow_header_for_subtitle(spec: &mut SlideSpec) {
    if spec.content.subtitle.is_none() || spec.content.title.text.is_empty() {
        return;
    }
    let Some(header_index) = spec.layout.regions.iter().position(|r| r.name == HEADER) else {
        return;
    };
    let header = &spec.layout.regions[header_index];
    if header.row_span >= 2 {
        return;
    }
    let delta = 2 - header.row_span;
    let consumed_from = header.row + header.row_span;
    let consumed_to = header.row + 1;
    spec.layout.regions[header_index].row_span = 2;

    for (index, region) in spec.layout.regions.iter_mut().enumerate() {
        if index == header_index {
            continue;
        }
        if region.row >= consumed_from && region.row <= consumed_to {
            region.row = (region.row + delta).min(GRID_ROWS);
            region.row_span = region.row_span.saturating_sub(delta).max(1);
            region.row_span = region.row_span.min(GRID_ROWS - region.row + 1);
        }
    }
}

/// Chart plus bullets in a sparse layout: split the body 5/7 into
/// left/right halves and send bullets left, chart right.
fn split_body_for_chart(spec: &mut SlideSpec) {
    if spec.content.data_viz.is_none()
        || spec.content.bullets.is_empty()
        || spec.layout.regions.len() >= 3
    {
        return;
    }
    let Some(body_index) = spec.layout.regions.iter().position(|r| r.name == BODY) else {
        return;
    };
    let body = spec.layout.regions.remove(body_index);
    let right_col = body.col + SPLIT_LEFT_COLS;
    let right_span = body.col_span.saturating_sub(SPLIT_LEFT_COLS).max(1);
    spec.layout.regions.push(Region::new(
        BODY_LEFT,
        body.row,
        body.col,
        body.row_span,
        SPLIT_LEFT_COLS,
    ));
    spec.layout.regions.push(Region::new(
        BODY_RIGHT,
        body.row,
        right_col,
        body.row_span,
        right_span,
    ));

    let chart_id = spec
        .content
        .data_viz
        .as_ref()
        .map(|c| c.id.clone())
        .unwrap_or_default();
    let group_ids: HashSet<&str> = spec.content.bullets.iter().map(|g| g.id.as_str()).collect();
    for anchor in &mut spec.layout.anchors {
        if anchor.content_id == chart_id {
            anchor.region = BODY_RIGHT.to_string();
        } else if group_ids.contains(anchor.content_id.as_str()) {
            anchor.region = BODY_LEFT.to_string();
        }
    }
}

/// Anchors must reference live regions and live content, one per element.
fn drop_dangling_anchors(spec: &mut SlideSpec) {
    let region_names: HashSet<String> =
        spec.layout.regions.iter().map(|r| r.name.clone()).collect();
    let content_ids: HashSet<String> = spec.content_ids().into_iter().collect();
    let mut anchored: HashSet<String> = HashSet::new();
    spec.layout.anchors.retain(|anchor| {
        region_names.contains(&anchor.region)
            && content_ids.contains(&anchor.content_id)
            && anchored.insert(anchor.content_id.clone())
    });
}

fn synthesize_missing_anchors(spec: &mut SlideSpec) {
    let anchored: HashSet<String> = spec
        .layout
        .anchors
        .iter()
        .map(|a| a.content_id.clone())
        .collect();
    let header_exists = spec.layout.regions.iter().any(|r| r.name == HEADER);
    let body_region = primary_body_region(&spec.layout.regions);

    for content_id in spec.content_ids() {
        if anchored.contains(&content_id) {
            continue;
        }
        let target = if header_exists && (content_id == "title" || content_id == "subtitle") {
            HEADER.to_string()
        } else {
            body_region.clone()
        };
        let order = next_order(&spec.layout.anchors, &target);
        spec.layout.anchors.push(Anchor::new(content_id, &target, order));
    }
}

/// The body-like region anchors default into: `body`, then `body-left`,
/// then anything that is not the header or footer band.
fn primary_body_region(regions: &[Region]) -> String {
    for name in [BODY, BODY_LEFT] {
        if regions.iter().any(|r| r.name == name) {
            return name.to_string();
        }
    }
    regions
        .iter()
        .find(|r| r.name != HEADER && r.name != FOOTER)
        .or_else(|| regions.first())
        .map(|r| r.name.clone())
        .unwrap_or_else(|| BODY.to_string())
}

fn next_order(anchors: &[Anchor], region: &str) -> u32 {
    anchors
        .iter()
        .filter(|a| a.region == region)
        .map(|a| a.order)
        .max()
        .map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidegen_protocol::spec::{BulletGroup, BulletItem, DataViz, TextBlock};

    fn spec_with_layout(regions: Vec<Region>, anchors: Vec<Anchor>) -> SlideSpec {
        let mut spec = SlideSpec::default();
        spec.content.title = TextBlock::new("title", "Title");
        spec.layout.regions = regions;
        spec.layout.anchors = anchors;
        crate::rules::enforce(&mut spec);
        spec
    }

    fn rows(region: &Region) -> (u32, u32) {
        (region.row, region.row + region.row_span - 1)
    }

    fn overlaps(a: &Region, b: &Region) -> bool {
        let (ar0, ar1) = rows(a);
        let (br0, br1) = rows(b);
        let row_overlap = ar0 <= br1 && br0 <= ar1;
        let col_overlap =
            a.col <= b.col + b.col_span - 1 && b.col <= a.col + a.col_span - 1;
        row_overlap && col_overlap
    }

    #[test]
    fn header_grows_for_subtitle_without_region_overlap() {
        let mut spec = spec_with_layout(
            vec![
                Region::new("header", 1, 1, 1, 12),
                Region::new("body", 2, 1, 6, 12),
                Region::new("footer", 8, 1, 1, 12),
            ],
            vec![],
        );
        spec.content.subtitle = Some(TextBlock::new("subtitle", "Sub"));
        repair(&mut spec);

        let header = spec.layout.regions.iter().find(|r| r.name == "header").unwrap();
        assert!(header.row_span >= 2);
        for (i, a) in spec.layout.regions.iter().enumerate() {
            for b in spec.layout.regions.iter().skip(i + 1) {
                assert!(!overlaps(a, b), "{} overlaps {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn sparse_layout_with_chart_and_bullets_splits_the_body() {
        let mut spec = spec_with_layout(
            vec![
                Region::new("header", 1, 1, 1, 12),
                Region::new("body", 2, 1, 7, 12),
            ],
            vec![Anchor::new("chart", "body", 1), Anchor::new("bullets-1", "body", 2)],
        );
        spec.content.data_viz = Some(DataViz {
            id: "chart".to_string(),
            ..Default::default()
        });
        spec.content.bullets.push(BulletGroup {
            id: "bullets-1".to_string(),
            heading: None,
            items: vec![BulletItem::new("point", 1)],
        });
        repair(&mut spec);

        let names: Vec<&str> = spec.layout.regions.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&"body-left"));
        assert!(names.contains(&"body-right"));

        let chart_anchor = spec
            .layout
            .anchors
            .iter()
            .find(|a| a.content_id == "chart")
            .unwrap();
        assert_eq!(chart_anchor.region, "body-right");
        let group_anchor = spec
            .layout
            .anchors
            .iter()
            .find(|a| a.content_id == "bullets-1")
            .unwrap();
        assert_eq!(group_anchor.region, "body-left");

        let left = spec.layout.regions.iter().find(|r| r.name == "body-left").unwrap();
        let right = spec.layout.regions.iter().find(|r| r.name == "body-right").unwrap();
        assert_eq!(left.col_span, 5);
        assert_eq!(right.col, 6);
        assert_eq!(right.col_span, 7);
    }

    #[test]
    fn dangling_anchors_are_dropped_and_missing_ones_synthesized() {
        let mut spec = spec_with_layout(
            vec![
                Region::new("header", 1, 1, 1, 12),
                Region::new("body", 2, 1, 7, 12),
            ],
            vec![
                Anchor::new("title", "ghost-region", 1),
                Anchor::new("nobody", "body", 1),
            ],
        );
        spec.content.bullets.push(BulletGroup {
            id: "bullets-1".to_string(),
            heading: None,
            items: vec![BulletItem::new("point", 1)],
        });
        repair(&mut spec);

        let region_names: HashSet<&str> =
            spec.layout.regions.iter().map(|r| r.name.as_str()).collect();
        for anchor in &spec.layout.anchors {
            assert!(region_names.contains(anchor.region.as_str()));
        }
        for id in spec.content_ids() {
            let count = spec
                .layout
                .anchors
                .iter()
                .filter(|a| a.content_id == id)
                .count();
            assert_eq!(count, 1, "content {id} should have exactly one anchor");
        }
        assert!(!spec.layout.anchors.iter().any(|a| a.content_id == "nobody"));
    }

    #[test]
    fn empty_layout_gets_a_frame_and_full_anchor_coverage() {
        let mut spec = spec_with_layout(vec![], vec![]);
        spec.content.subtitle = Some(TextBlock::new("subtitle", "Sub"));
        repair(&mut spec);

        assert!(!spec.layout.regions.is_empty());
        for id in spec.content_ids() {
            assert!(spec.layout.anchors.iter().any(|a| a.content_id == id));
        }
        let title_anchor = spec
            .layout
            .anchors
            .iter()
            .find(|a| a.content_id == "title")
            .unwrap();
        assert_eq!(title_anchor.region, "header");
    }

    #[test]
    fn duplicate_anchors_collapse_to_one() {
        let mut spec = spec_with_layout(
            vec![Region::new("body", 2, 1, 7, 12)],
            vec![Anchor::new("title", "body", 1), Anchor::new("title", "body", 2)],
        );
        repair(&mut spec);
        let count = spec
            .layout
            .anchors
            .iter()
            .filter(|a| a.content_id == "title")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn repair_is_idempotent() {
        let mut spec = spec_with_layout(vec![], vec![]);
        spec.content.subtitle = Some(TextBlock::new("subtitle", "Sub"));
        spec.content.data_viz = Some(DataViz {
            id: "chart".to_string(),
            ..Default::default()
        });
        spec.content.bullets.push(BulletGroup {
            id: "bullets-1".to_string(),
            heading: None,
            items: vec![BulletItem::new("point", 1)],
        });
        repair(&mut spec);
        let once = serde_json::to_value(&spec).unwrap();
        repair(&mut spec);
        assert_eq!(once, serde_json::to_value(&spec).unwrap());
    }
}

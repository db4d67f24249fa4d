use serde::{Deserialize, Deserializer, Serialize};

/// Version tag stamped into every specification this pipeline emits.
pub const SPEC_VERSION: &str = "1.0";

/// One fully described presentation slide: content, layout and style
/// tokens. Produced by the content generator, then normalized by the
/// rule-enforcement and enhancement passes before hand-off to a renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlideSpec {
    pub meta: Meta,
    pub content: Content,
    pub layout: Layout,
    pub style_tokens: Option<StyleTokens>,
    pub design: Design,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Meta {
    pub version: String,
    pub locale: String,
    pub theme: String,
    pub aspect_ratio: AspectRatio,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            version: SPEC_VERSION.to_string(),
            locale: String::new(),
            theme: String::new(),
            aspect_ratio: AspectRatio::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "4:3")]
    Standard,
}

// Unknown ratios coerce to the widescreen default rather than failing the
// whole document.
impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "4:3" => AspectRatio::Standard,
            _ => AspectRatio::Wide,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Content {
    pub title: TextBlock,
    pub subtitle: Option<TextBlock>,
    pub bullets: Vec<BulletGroup>,
    pub callouts: Vec<Callout>,
    pub data_viz: Option<DataViz>,
    pub image_placeholders: Vec<ImagePlaceholder>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextBlock {
    pub id: String,
    pub text: String,
}

impl TextBlock {
    pub fn new(id: &str, text: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulletGroup {
    pub id: String,
    pub heading: Option<String>,
    pub items: Vec<BulletItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulletItem {
    pub text: String,
    pub level: u8,
}

impl Default for BulletItem {
    fn default() -> Self {
        Self {
            text: String::new(),
            level: 1,
        }
    }
}

impl BulletItem {
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Callout {
    pub id: String,
    pub variant: CalloutVariant,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutVariant {
    #[default]
    Note,
    Success,
    Warning,
    Danger,
}

// Generators occasionally invent variants ("info", "tip"); anything
// unrecognized coerces to `note`.
impl<'de> Deserialize<'de> for CalloutVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.to_ascii_lowercase().as_str() {
            "success" => CalloutVariant::Success,
            "warning" => CalloutVariant::Warning,
            "danger" => CalloutVariant::Danger,
            _ => CalloutVariant::Note,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataViz {
    pub id: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub value_format: ValueFormat,
    pub legend: Option<Legend>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Area,
}

impl<'de> Deserialize<'de> for ChartKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.to_ascii_lowercase().as_str() {
            "line" => ChartKind::Line,
            "pie" => ChartKind::Pie,
            "area" => ChartKind::Area,
            _ => ChartKind::Bar,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Number,
    Percent,
    Currency,
}

impl<'de> Deserialize<'de> for ValueFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.to_ascii_lowercase().as_str() {
            "percent" | "percentage" => ValueFormat::Percent,
            "currency" => ValueFormat::Currency,
            _ => ValueFormat::Number,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Legend {
    pub position: LegendPosition,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendPosition {
    #[default]
    BottomCenter,
    Right,
    Top,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePlaceholder {
    pub id: String,
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Layout {
    pub grid: Grid,
    pub regions: Vec<Region>,
    pub anchors: Vec<Anchor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Grid {
    pub columns: u32,
    pub rows: u32,
    pub gutter: u32,
    pub margin: u32,
}

/// A named rectangle on the grid. Rows and columns are 1-based;
/// `row + row_span - 1` never exceeds the grid extent once enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Region {
    pub name: String,
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            name: String::new(),
            row: 1,
            col: 1,
            row_span: 1,
            col_span: 1,
        }
    }
}

impl Region {
    pub fn new(name: &str, row: u32, col: u32, row_span: u32, col_span: u32) -> Self {
        Self {
            name: name.to_string(),
            row,
            col,
            row_span,
            col_span,
        }
    }
}

/// Binds a content element (by its stable identifier) to the region it
/// renders in, with an ordering key within that region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Anchor {
    pub content_id: String,
    pub region: String,
    pub order: u32,
}

impl Anchor {
    pub fn new(content_id: impl Into<String>, region: &str, order: u32) -> Self {
        Self {
            content_id: content_id.into(),
            region: region.to_string(),
            order,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleTokens {
    pub palette: Palette,
    pub typography: Typography,
    pub spacing: Vec<u32>,
    pub radii: Vec<u32>,
    pub shadows: Vec<String>,
    pub contrast: ContrastTargets,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Palette {
    pub primary: String,
    pub accent: String,
    pub neutral: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub font_family: String,
    pub size_scale: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContrastTargets {
    pub body_min: f64,
    pub heading_min: f64,
}

impl Default for ContrastTargets {
    fn default() -> Self {
        Self {
            body_min: 4.5,
            heading_min: 3.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Design {
    pub whitespace: Whitespace,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Whitespace {
    pub breathing_room: f64,
}

impl SlideSpec {
    /// Identifiers of every content element that must carry a layout anchor.
    pub fn content_ids(&self) -> Vec<String> {
        let mut ids = vec![self.content.title.id.clone()];
        if let Some(subtitle) = &self.content.subtitle {
            ids.push(subtitle.id.clone());
        }
        for group in &self.content.bullets {
            ids.push(group.id.clone());
        }
        for callout in &self.content.callouts {
            ids.push(callout.id.clone());
        }
        if let Some(chart) = &self.content.data_viz {
            ids.push(chart.id.clone());
        }
        for image in &self.content.image_placeholders {
            ids.push(image.id.clone());
        }
        ids.retain(|id| !id.is_empty());
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_callout_variant_coerces_to_note() {
        let callout: Callout =
            serde_json::from_str(r#"{"id":"c1","variant":"tip","text":"x"}"#).unwrap();
        assert_eq!(callout.variant, CalloutVariant::Note);
    }

    #[test]
    fn known_callout_variants_round_trip() {
        for (raw, expected) in [
            ("note", CalloutVariant::Note),
            ("success", CalloutVariant::Success),
            ("warning", CalloutVariant::Warning),
            ("danger", CalloutVariant::Danger),
        ] {
            let json = format!(r#"{{"variant":"{raw}"}}"#);
            let callout: Callout = serde_json::from_str(&json).unwrap();
            assert_eq!(callout.variant, expected);
        }
    }

    #[test]
    fn aspect_ratio_defaults_to_wide() {
        let meta: Meta = serde_json::from_str(r#"{"aspectRatio":"21:9"}"#).unwrap();
        assert_eq!(meta.aspect_ratio, AspectRatio::Wide);
        let meta: Meta = serde_json::from_str(r#"{"aspectRatio":"4:3"}"#).unwrap();
        assert_eq!(meta.aspect_ratio, AspectRatio::Standard);
    }

    #[test]
    fn partial_document_parses_with_defaults() {
        let spec: SlideSpec =
            serde_json::from_str(r#"{"content":{"title":{"id":"title","text":"Hi"}}}"#).unwrap();
        assert_eq!(spec.content.title.text, "Hi");
        assert!(spec.content.bullets.is_empty());
        assert!(spec.style_tokens.is_none());
    }

    #[test]
    fn content_ids_skip_empty_and_cover_all_sections() {
        let mut spec = SlideSpec::default();
        spec.content.title = TextBlock::new("title", "T");
        spec.content.bullets.push(BulletGroup {
            id: "bullets-1".to_string(),
            ..Default::default()
        });
        spec.content.bullets.push(BulletGroup::default());
        spec.content.data_viz = Some(DataViz {
            id: "chart".to_string(),
            ..Default::default()
        });
        let ids = spec.content_ids();
        assert_eq!(ids, vec!["title", "bullets-1", "chart"]);
    }
}

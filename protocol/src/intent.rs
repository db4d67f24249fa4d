use serde::{Deserialize, Deserializer, Serialize};

/// Ephemeral planning metadata extracted from the prompt before content
/// synthesis. Read-only context: never serialized into the final spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentPlan {
    pub intent: Intent,
    pub audience: String,
    pub tone: Tone,
    pub slide_pattern: SlidePattern,
    pub visual_plan: VisualPlan,
    pub brand_hints: Vec<String>,
    pub data_hints: Vec<String>,
}

pub const MAX_AUDIENCE_LEN: usize = 100;
pub const MAX_BRAND_HINTS: usize = 5;
pub const MAX_DATA_HINTS: usize = 10;

impl IntentPlan {
    /// Clamp free-text fields to their documented bounds.
    pub fn clamp(&mut self) {
        if self.audience.chars().count() > MAX_AUDIENCE_LEN {
            self.audience = self.audience.chars().take(MAX_AUDIENCE_LEN).collect();
        }
        self.brand_hints.truncate(MAX_BRAND_HINTS);
        self.data_hints.truncate(MAX_DATA_HINTS);
    }

    /// One-line rendering appended to the generator prompt.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("intent={}", self.intent.as_str()),
            format!("tone={}", self.tone.as_str()),
            format!("pattern={}", self.slide_pattern.as_str()),
            format!("visuals={}", self.visual_plan.as_str()),
        ];
        if !self.audience.is_empty() {
            parts.push(format!("audience={}", self.audience));
        }
        if !self.data_hints.is_empty() {
            parts.push(format!("data={}", self.data_hints.join(", ")));
        }
        parts.join("; ")
    }
}

macro_rules! lenient_string_enum {
    ($name:ident, $default:ident, { $($raw:literal => $variant:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            #[default]
            $default,
            $($variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    Self::$default => Self::DEFAULT_STR,
                    $(Self::$variant => $raw,)+
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(match raw.to_ascii_lowercase().as_str() {
                    $($raw => Self::$variant,)+
                    _ => Self::$default,
                })
            }
        }
    };
}

lenient_string_enum!(Intent, Explanatory, {
    "action" => Action,
    "analytical" => Analytical,
});
impl Intent {
    const DEFAULT_STR: &'static str = "explanatory";
}

lenient_string_enum!(Tone, Professional, {
    "casual" => Casual,
    "enthusiastic" => Enthusiastic,
    "authoritative" => Authoritative,
});
impl Tone {
    const DEFAULT_STR: &'static str = "professional";
}

lenient_string_enum!(SlidePattern, BulletedList, {
    "title-only" => TitleOnly,
    "split-chart" => SplitChart,
    "comparison" => Comparison,
    "timeline" => Timeline,
});
impl SlidePattern {
    const DEFAULT_STR: &'static str = "bulleted-list";
}

lenient_string_enum!(VisualPlan, TextOnly, {
    "chart" => Chart,
    "image" => Image,
    "mixed" => Mixed,
});
impl VisualPlan {
    const DEFAULT_STR: &'static str = "text-only";
}

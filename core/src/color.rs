//! WCAG luminance/contrast math and palette synthesis. Everything here is
//! pure; the enhancement pass decides when to apply it.

/// Parsed sRGB color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Accepts `#RRGGBB` or `RRGGBB`; anything else is not a valid color.
pub fn parse_hex(value: &str) -> Option<Rgb> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb { r, g, b })
}

pub fn is_valid_hex(value: &str) -> bool {
    parse_hex(value).is_some()
}

pub fn format_hex(color: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}

/// WCAG relative luminance of an sRGB color.
pub fn relative_luminance(color: Rgb) -> f64 {
    fn channel(v: u8) -> f64 {
        let s = v as f64 / 255.0;
        if s <= 0.03928 {
            s / 12.92
        } else {
            ((s + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * channel(color.r) + 0.7152 * channel(color.g) + 0.0722 * channel(color.b)
}

/// WCAG contrast ratio between two colors, in `[1.0, 21.0]`.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la > lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Contrast between two hex strings; invalid input counts as no contrast.
pub fn contrast_hex(a: &str, b: &str) -> f64 {
    match (parse_hex(a), parse_hex(b)) {
        (Some(a), Some(b)) => contrast_ratio(a, b),
        _ => 1.0,
    }
}

/// Linear 9-step interpolation from `dark` to `light`, endpoints included.
pub fn neutral_ramp(dark: Rgb, light: Rgb) -> Vec<String> {
    (0..9)
        .map(|step| {
            let t = step as f64 / 8.0;
            let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
            format_hex(Rgb {
                r: lerp(dark.r, light.r),
                g: lerp(dark.g, light.g),
                b: lerp(dark.b, light.b),
            })
        })
        .collect()
}

/// Default neutral endpoints; contrast well above the 7:1 AAA floor.
pub const NEUTRAL_DARK: Rgb = Rgb {
    r: 0x1A,
    g: 0x1A,
    b: 0x1A,
};
pub const NEUTRAL_LIGHT: Rgb = Rgb {
    r: 0xFA,
    g: 0xFA,
    b: 0xFA,
};

/// Accent used when nothing on the curated ramp clears the threshold.
pub const DEFAULT_ACCENT: &str = "#FFFFFF";

/// Curated accent candidates, tried in order during contrast repair. The
/// order is part of the design system; do not re-sort. Black closes the
/// ramp: every primary that white cannot clear at 4.5:1, black can, so
/// the two endpoints together cover mid-luminance primaries.
pub const ACCENT_RAMP: &[&str] = &[
    "#FFFFFF", "#F8FAFC", "#FDE68A", "#FCD34D", "#A7F3D0", "#93C5FD", "#1F2937", "#111827",
    "#0B1120", "#000000",
];

/// Sector keyword tables mapped to a (primary, accent) pair. Checked in
/// order; first matching sector wins.
pub const SECTOR_PALETTES: &[(&str, &[&str], (&str, &str))] = &[
    (
        "finance",
        &["finance", "financial", "bank", "invest", "revenue", "profit", "budget"],
        ("#0B3D91", "#F8FAFC"),
    ),
    (
        "tech",
        &["tech", "software", "digital", "ai", "cloud", "platform", "startup"],
        ("#4C1D95", "#F5F3FF"),
    ),
    (
        "sustainability",
        &["sustainab", "green", "climate", "renewable", "carbon", "environment"],
        ("#14532D", "#ECFDF5"),
    ),
    (
        "healthcare",
        &["health", "medical", "patient", "pharma", "clinic", "wellness"],
        ("#0C4A6E", "#F0F9FF"),
    ),
    (
        "retail",
        &["retail", "shop", "commerce", "consumer", "store", "brand"],
        ("#9D174D", "#FFF1F2"),
    ),
    (
        "energy",
        &["energy", "oil", "gas", "solar", "wind", "power", "utility"],
        ("#92400E", "#FFFBEB"),
    ),
    (
        "creative",
        &["creative", "design", "art", "media", "marketing", "campaign"],
        ("#BE185D", "#FDF2F8"),
    ),
    (
        "consulting",
        &["consult", "advisory", "strategy", "transformation", "operating model"],
        ("#1E3A5F", "#F1F5F9"),
    ),
];

/// Well-known brand names mapped to their pair; consulted before sector
/// keywords. Matching is substring, case-insensitive.
pub const BRAND_PALETTES: &[(&str, (&str, &str))] = &[
    ("coca-cola", ("#F40009", "#FFFFFF")),
    ("spotify", ("#1DB954", "#191414")),
    ("netflix", ("#E50914", "#FFFFFF")),
    ("ibm", ("#0F62FE", "#F4F4F4")),
    ("salesforce", ("#00A1E0", "#032D60")),
    ("starbucks", ("#00704A", "#F1F8F6")),
    ("nike", ("#111111", "#FFFFFF")),
    ("mcdonald", ("#FFC72C", "#DA291C")),
];

/// Brand lookup across the prompt and any planner brand hints.
pub fn brand_pair<'a>(texts: impl Iterator<Item = &'a str>) -> Option<(&'static str, &'static str)> {
    for text in texts {
        let lower = text.to_lowercase();
        for (brand, pair) in BRAND_PALETTES {
            if lower.contains(brand) {
                return Some(*pair);
            }
        }
    }
    None
}

/// Sector lookup over free text.
pub fn sector_pair(text: &str) -> Option<(&'static str, &'static str)> {
    let lower = text.to_lowercase();
    for (_, keywords, pair) in SECTOR_PALETTES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(*pair);
        }
    }
    None
}

/// Context-free generator: no brand, no sector keywords. Keyed by prompt
/// length so different prompts still vary, but deterministically.
pub fn generic_pair(text: &str) -> (&'static str, &'static str) {
    let index = text.chars().count() % SECTOR_PALETTES.len();
    SECTOR_PALETTES[index].2
}

/// First curated accent clearing `threshold` against `primary`.
pub fn repair_accent(primary: &str, threshold: f64) -> String {
    for candidate in ACCENT_RAMP {
        if contrast_hex(primary, candidate) >= threshold {
            return (*candidate).to_string();
        }
    }
    DEFAULT_ACCENT.to_string()
}

//! Fixed design-system values. Rule enforcement overwrites generated
//! output with these; the fallback factory builds from them directly.

use slidegen_protocol::spec::{
    Grid, Palette, Region, StyleTokens, Typography,
};

use crate::color::{neutral_ramp, NEUTRAL_DARK, NEUTRAL_LIGHT};

pub const GRID_COLUMNS: u32 = 12;
pub const GRID_ROWS: u32 = 8;
pub const GRID_GUTTER: u32 = 16;
pub const GRID_MARGIN: u32 = 32;

pub const DEFAULT_THEME: &str = "boardroom";
pub const DEFAULT_LOCALE: &str = "en-US";
pub const BREATHING_ROOM: f64 = 0.5;

pub const FONT_FAMILY: &str = "Inter";
pub const SIZE_SCALE: [u32; 8] = [12, 14, 16, 20, 24, 32, 40, 48];
pub const SPACING: [u32; 7] = [4, 8, 12, 16, 24, 32, 48];
pub const RADII: [u32; 3] = [4, 8, 16];

pub const DEFAULT_PRIMARY: &str = "#1E3A5F";
pub const DEFAULT_ACCENT: &str = "#F1F5F9";

pub fn grid() -> Grid {
    Grid {
        columns: GRID_COLUMNS,
        rows: GRID_ROWS,
        gutter: GRID_GUTTER,
        margin: GRID_MARGIN,
    }
}

pub fn typography() -> Typography {
    Typography {
        font_family: FONT_FAMILY.to_string(),
        size_scale: SIZE_SCALE.to_vec(),
    }
}

pub fn style_tokens() -> StyleTokens {
    StyleTokens {
        palette: Palette {
            primary: DEFAULT_PRIMARY.to_string(),
            accent: DEFAULT_ACCENT.to_string(),
            neutral: neutral_ramp(NEUTRAL_DARK, NEUTRAL_LIGHT),
        },
        typography: typography(),
        spacing: SPACING.to_vec(),
        radii: RADII.to_vec(),
        shadows: vec![
            "0 1px 2px rgba(0,0,0,0.08)".to_string(),
            "0 4px 12px rgba(0,0,0,0.12)".to_string(),
        ],
        contrast: Default::default(),
    }
}

/// The standard three-band layout: header on top, body in the middle,
/// footer along the bottom row.
pub fn standard_regions() -> Vec<Region> {
    vec![
        Region::new("header", 1, 1, 1, GRID_COLUMNS),
        Region::new("body", 2, 1, GRID_ROWS - 2, GRID_COLUMNS),
        Region::new("footer", GRID_ROWS, 1, 1, GRID_COLUMNS),
    ]
}

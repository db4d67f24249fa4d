//! Typed documents exchanged across the slide generation pipeline.
//! The spec tree is validated once at the model-output boundary and
//! manipulated as plain Rust structs everywhere else.

pub mod envelope;
pub mod intent;
pub mod schema;
pub mod spec;

pub use envelope::{GenerateRequest, GenerateResponse};
pub use intent::{Intent, IntentPlan, SlidePattern, Tone, VisualPlan};
pub use spec::{
    Anchor, AspectRatio, BulletGroup, BulletItem, Callout, CalloutVariant, ChartKind, Content,
    DataViz, Design, Grid, ImagePlaceholder, Layout, Legend, LegendPosition, Meta, Palette,
    Region, Series, SlideSpec, StyleTokens, TextBlock, Typography, ValueFormat,
};

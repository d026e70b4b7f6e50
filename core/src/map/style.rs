use serde::{Deserialize, Serialize};
use std::time::Duration;

/// RGBA colour, channels in 0-255 and alpha in 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
}

/// Text drawn above a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub text: String,
    pub font: String,
    pub fill: Rgba,
    pub outline: StrokeStyle,
    pub offset_y: f32,
}

/// Regular-polygon point marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub points: u8,
    pub radius: f32,
    pub fill: Rgba,
    pub stroke: StrokeStyle,
    /// Clockwise rotation in radians.
    pub rotation: f64,
    pub label: Option<LabelStyle>,
}

impl MarkerStyle {
    pub fn label_text(&self) -> Option<&str> {
        self.label.as_ref().map(|label| label.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub stroke: StrokeStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureStyle {
    Marker(MarkerStyle),
    Line(LineStyle),
}

impl FeatureStyle {
    pub fn as_marker(&self) -> Option<&MarkerStyle> {
        match self {
            FeatureStyle::Marker(marker) => Some(marker),
            FeatureStyle::Line(_) => None,
        }
    }
}

/// Named (radius, colour) presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualClass {
    Live,
    Report,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassStyle {
    pub radius: f32,
    pub color: Rgba,
}

/// Styling parameters of the map overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub live: ClassStyle,
    pub report: ClassStyle,
    pub selected: ClassStyle,
    pub outline: StrokeStyle,
    pub route_width: f32,
    pub label_font: String,
    pub label_offset_y: f32,
    pub pan_duration_ms: u64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            live: ClassStyle {
                radius: 10.0,
                color: Rgba::rgb(21, 127, 204),
            },
            report: ClassStyle {
                radius: 5.0,
                color: Rgba::rgb(239, 108, 0),
            },
            selected: ClassStyle {
                radius: 15.0,
                color: Rgba::rgb(211, 47, 47),
            },
            outline: StrokeStyle {
                color: Rgba::rgb(50, 50, 50),
                width: 2.0,
            },
            route_width: 5.0,
            label_font: "bold 12px sans-serif".into(),
            label_offset_y: -12.0,
            pan_duration_ms: 500,
        }
    }
}

impl StyleConfig {
    pub fn class(&self, class: VisualClass) -> ClassStyle {
        match class {
            VisualClass::Live => self.live,
            VisualClass::Report => self.report,
            VisualClass::Selected => self.selected,
        }
    }

    pub fn pan_duration(&self) -> Duration {
        Duration::from_millis(self.pan_duration_ms)
    }

    /// Marker style of a visual class.
    pub fn marker(&self, class: VisualClass, rotation_degrees: f64, label: Option<&str>) -> FeatureStyle {
        let preset = self.class(class);
        FeatureStyle::Marker(marker_style(self, preset.radius, preset.color, rotation_degrees, label))
    }

    /// Stroke-only style of a route line.
    pub fn route(&self) -> FeatureStyle {
        FeatureStyle::Line(LineStyle {
            stroke: StrokeStyle {
                color: self.outline.color,
                width: self.route_width,
            },
        })
    }
}

/// Builds a triangular marker rotated by `rotation_degrees`, labelled with
/// `label` in black text outlined in white.
pub fn marker_style(
    config: &StyleConfig,
    radius: f32,
    color: Rgba,
    rotation_degrees: f64,
    label: Option<&str>,
) -> MarkerStyle {
    MarkerStyle {
        points: 3,
        radius,
        fill: color,
        stroke: config.outline,
        rotation: rotation_degrees.to_radians(),
        label: label.map(|text| LabelStyle {
            text: text.to_owned(),
            font: config.label_font.clone(),
            fill: Rgba::BLACK,
            outline: StrokeStyle {
                color: Rgba::WHITE,
                width: 2.0,
            },
            offset_y: config.label_offset_y,
        }),
    }
}

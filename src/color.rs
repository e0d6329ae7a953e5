use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Series colours: chart series name → Color32
// ---------------------------------------------------------------------------

/// Assigns each chart series (e.g. `Revenue`, `avg_temp`) a distinct colour.
#[derive(Debug, Clone)]
pub struct SeriesColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl SeriesColors {
    pub fn new(series: &[&str]) -> Self {
        let mapping = series
            .iter()
            .zip(generate_palette(series.len()))
            .map(|(name, c)| (name.to_string(), c))
            .collect();

        SeriesColors {
            mapping,
            default_color: Color32::LIGHT_BLUE,
        }
    }

    pub fn color_for(&self, series: &str) -> Color32 {
        self.mapping
            .get(series)
            .copied()
            .unwrap_or(self.default_color)
    }
}

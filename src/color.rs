use std::collections::BTreeMap;

use churn_dashboard::RiskBand;
use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Fixed colours
// ---------------------------------------------------------------------------

pub const CHURN_YES: Color32 = Color32::from_rgb(0xFF, 0x6B, 0x6B);
pub const CHURN_NO: Color32 = Color32::from_rgb(0x4E, 0xCD, 0xC4);

/// Colour for a `Churn` value; unexpected values fall back to grey.
pub fn churn_color(value: &str) -> Color32 {
    match value {
        "Yes" => CHURN_YES,
        "No" => CHURN_NO,
        _ => Color32::GRAY,
    }
}

pub fn band_color(band: RiskBand) -> Color32 {
    match band {
        RiskBand::High => Color32::from_rgb(0xFF, 0x4C, 0x4C),
        RiskBand::Medium => Color32::from_rgb(0xFF, 0xA5, 0x00),
        RiskBand::Low => Color32::from_rgb(0x4E, 0xCD, 0xC4),
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct pastel colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.70);
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
// Category → colour mapping
// ---------------------------------------------------------------------------

/// Maps category labels of one chart to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from labels in display order.
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = labels.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .map(|(label, c)| (label.to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a category.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_color_map_lookup() {
        let map = ColorMap::new(["Month-to-Month", "One year", "Two year"]);
        assert_ne!(map.color_for("One year"), map.color_for("Two year"));
        assert_eq!(map.color_for("Unknown"), Color32::GRAY);
    }

    #[test]
    fn test_bands_have_distinct_colors() {
        assert_ne!(band_color(RiskBand::High), band_color(RiskBand::Medium));
        assert_ne!(band_color(RiskBand::Medium), band_color(RiskBand::Low));
        assert_eq!(churn_color("Yes"), CHURN_YES);
    }
}

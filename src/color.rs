use std::collections::HashMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps the labels of one chart (place sizes, cancel reasons) to distinct
/// colours, in the order given.  Hues are spread evenly around the wheel.
#[derive(Debug, Clone)]
pub struct CategoryColors {
    mapping: HashMap<String, Color32>,
    default_color: Color32,
}

impl CategoryColors {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = labels.into_iter().collect();
        let step = 360.0 / labels.len().max(1) as f32;
        let mapping = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| (label.to_string(), hue_color(i as f32 * step)))
            .collect();

        CategoryColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

fn hue_color(hue: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, 0.65, 0.55).into_color();
    let [r, g, b] = [rgb.red, rgb.green, rgb.blue].map(|c| (c * 255.0).round() as u8);
    Color32::from_rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_gets_its_own_color() {
        let labels = ["a", "b", "c", "d", "e", "f"];
        let colors = CategoryColors::new(labels);
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(colors.color_for(a), colors.color_for(b), "{a} vs {b}");
            }
            assert_ne!(colors.color_for(a), Color32::GRAY);
        }
        assert_eq!(CategoryColors::new(std::iter::empty()).color_for("a"), Color32::GRAY);
    }

    #[test]
    fn unknown_label_gets_default_color() {
        let colors = CategoryColors::new(["S", "M", "L"]);
        assert_ne!(colors.color_for("S"), colors.color_for("L"));
        assert_eq!(colors.color_for("XL"), Color32::GRAY);
    }
}

//! Pixel classifiers for leak detection.
//!
//! A classifier answers "should this pixel be hidden by clothing?". The
//! default is a table of flesh-tone RGB ranges; an HSV window is available
//! for palettes the table does not cover, and any `Fn(Rgba<u8>) -> bool`
//! can be plugged in directly.

use image::Rgba;
use palette::{Hsv, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

/// Minimum alpha for a pixel to count as visible skin.
pub const DEFAULT_MIN_ALPHA: u8 = 200;

/// Predicate over a single RGBA pixel.
pub trait PixelClassifier {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    fn matches(&self, pixel: Rgba<u8>) -> bool;
}

impl<F> PixelClassifier for F
where
    F: Fn(Rgba<u8>) -> bool,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn matches(&self, pixel: Rgba<u8>) -> bool {
        self(pixel)
    }
}

/// Inclusive per-channel RGB bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneRange {
    pub red: [u8; 2],
    pub green: [u8; 2],
    pub blue: [u8; 2],
}

impl ToneRange {
    pub const fn new(red: [u8; 2], green: [u8; 2], blue: [u8; 2]) -> Self {
        Self { red, green, blue }
    }

    pub fn contains(&self, r: u8, g: u8, b: u8) -> bool {
        within(r, self.red) && within(g, self.green) && within(b, self.blue)
    }
}

fn within(v: u8, [lo, hi]: [u8; 2]) -> bool {
    lo <= v && v <= hi
}

/// Light, medium and dark flesh tones.
pub fn default_tone_ranges() -> Vec<ToneRange> {
    vec![
        ToneRange::new([200, 255], [160, 220], [130, 190]),
        ToneRange::new([180, 230], [130, 180], [100, 160]),
        ToneRange::new([100, 180], [70, 140], [50, 120]),
    ]
}

/// Flesh-tone detector driven by a table of RGB ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneRangeClassifier {
    pub min_alpha: u8,
    /// Also require `r >= g >= 0.9 * b`, which skin tones satisfy and most
    /// greys and blues do not.
    pub require_warm_order: bool,
    pub ranges: Vec<ToneRange>,
}

impl Default for ToneRangeClassifier {
    fn default() -> Self {
        Self {
            min_alpha: DEFAULT_MIN_ALPHA,
            require_warm_order: true,
            ranges: default_tone_ranges(),
        }
    }
}

impl PixelClassifier for ToneRangeClassifier {
    fn name(&self) -> &str {
        "tone-ranges"
    }

    fn matches(&self, pixel: Rgba<u8>) -> bool {
        let [r, g, b, a] = pixel.0;
        if a < self.min_alpha {
            return false;
        }
        if self.require_warm_order && !(r >= g && g as f32 >= b as f32 * 0.9) {
            return false;
        }
        self.ranges.iter().any(|tone| tone.contains(r, g, b))
    }
}

/// Skin detector working on an HSV window instead of RGB boxes.
///
/// Hue is in degrees `[0, 360)`; saturation and value are `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsvClassifier {
    pub min_alpha: u8,
    pub hue: [f32; 2],
    pub saturation: [f32; 2],
    pub value: [f32; 2],
}

impl Default for HsvClassifier {
    fn default() -> Self {
        Self {
            min_alpha: DEFAULT_MIN_ALPHA,
            hue: [0.0, 50.0],
            saturation: [0.15, 0.68],
            value: [0.35, 1.0],
        }
    }
}

impl PixelClassifier for HsvClassifier {
    fn name(&self) -> &str {
        "hsv"
    }

    fn matches(&self, pixel: Rgba<u8>) -> bool {
        let [r, g, b, a] = pixel.0;
        if a < self.min_alpha {
            return false;
        }

        let rgb: Srgb<f32> = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        let hsv: Hsv = rgb.into_color();
        let hue = hsv.hue.into_positive_degrees();

        let in_range = |v: f32, [lo, hi]: [f32; 2]| lo <= v && v <= hi;
        in_range(hue, self.hue)
            && in_range(hsv.saturation, self.saturation)
            && in_range(hsv.value, self.value)
    }
}

/// Classifier selection as it appears in job configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierConfig {
    ToneRanges(ToneRangeClassifier),
    Hsv(HsvClassifier),
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig::ToneRanges(ToneRangeClassifier::default())
    }
}

impl ClassifierConfig {
    pub fn build(&self) -> Box<dyn PixelClassifier> {
        match self {
            ClassifierConfig::ToneRanges(c) => Box::new(c.clone()),
            ClassifierConfig::Hsv(c) => Box::new(c.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
        Rgba([r, g, b, a])
    }

    #[test]
    fn test_tone_ranges_detect_each_band() {
        let c = ToneRangeClassifier::default();
        assert!(c.matches(px(210, 170, 150, 255)));
        assert!(c.matches(px(200, 150, 120, 255)));
        assert!(c.matches(px(140, 100, 80, 255)));
    }

    #[test]
    fn test_tone_ranges_reject_translucent() {
        let c = ToneRangeClassifier::default();
        assert!(!c.matches(px(210, 170, 150, 199)));
        assert!(c.matches(px(210, 170, 150, 200)));
    }

    #[test]
    fn test_tone_ranges_reject_garment_colours() {
        let c = ToneRangeClassifier::default();
        assert!(!c.matches(px(40, 40, 58, 255)));
        assert!(!c.matches(px(26, 26, 46, 255)));
        assert!(!c.matches(px(0, 0, 0, 0)));
    }

    #[test]
    fn test_warm_order_heuristic() {
        // Inside the dark band, but green > red.
        let pixel = px(120, 130, 100, 255);
        assert!(!ToneRangeClassifier::default().matches(pixel));

        let relaxed = ToneRangeClassifier {
            require_warm_order: false,
            ..Default::default()
        };
        assert!(relaxed.matches(pixel));
    }

    #[test]
    fn test_custom_table_replaces_defaults() {
        let c = ToneRangeClassifier {
            ranges: vec![ToneRange::new([0, 10], [0, 10], [0, 10])],
            require_warm_order: false,
            ..Default::default()
        };
        assert!(c.matches(px(5, 5, 5, 255)));
        assert!(!c.matches(px(210, 170, 150, 255)));
    }

    #[test]
    fn test_hsv_classifier() {
        let c = HsvClassifier::default();
        assert!(c.matches(px(210, 170, 150, 255)));
        assert!(!c.matches(px(40, 40, 160, 255)));
        assert!(!c.matches(px(210, 170, 150, 10)));
    }

    #[test]
    fn test_closure_classifier() {
        let red_only = |p: Rgba<u8>| p[0] == 255 && p[1] == 0;
        assert_eq!(red_only.name(), "custom");
        assert!(red_only.matches(px(255, 0, 0, 255)));
        assert!(!PixelClassifier::matches(&red_only, px(0, 0, 0, 255)));
    }

    #[test]
    fn test_classifier_config_from_json() {
        let cfg: ClassifierConfig =
            serde_json::from_str(r#"{"kind": "hsv", "hue": [10.0, 40.0]}"#).unwrap();
        match &cfg {
            ClassifierConfig::Hsv(h) => {
                assert_eq!(h.hue, [10.0, 40.0]);
                assert_eq!(h.min_alpha, DEFAULT_MIN_ALPHA);
            }
            other => panic!("unexpected classifier {:?}", other),
        }
        assert_eq!(cfg.build().name(), "hsv");

        let cfg: ClassifierConfig = serde_json::from_str(r#"{"kind": "tone_ranges"}"#).unwrap();
        assert_eq!(cfg, ClassifierConfig::default());
    }
}

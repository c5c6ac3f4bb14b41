//! Accent palette extraction for pool images.
//!
//! A `-cRRGGBB` marker in the file name pins every swatch to that colour.
//! Otherwise six swatches are picked from a downsampled copy of the image by
//! scoring colour buckets against saturation/lightness targets.

use std::collections::HashMap;
use std::path::Path;

use image::{DynamicImage, GenericImageView};
use palette::{FromColor, Hsl, Srgb};

use crate::pool::AccentColors;

const SAMPLE_EDGE: u32 = 64;
const WEIGHT_SATURATION: f32 = 3.0;
const WEIGHT_LIGHTNESS: f32 = 6.5;
const WEIGHT_POPULATION: f32 = 0.5;

/// Read a `-cRRGGBB` colour override (uppercase hex) from the file stem.
pub fn color_override(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    stem.match_indices("-c").find_map(|(idx, _)| {
        let hex = stem.get(idx + 2..idx + 8)?;
        hex.bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
            .then(|| format!("#{hex}"))
    })
}

#[derive(Debug, Clone, Copy)]
struct Target {
    lightness: (f32, f32, f32),
    saturation: (f32, f32, f32),
}

impl Target {
    const fn new(lightness: (f32, f32, f32), saturation: (f32, f32, f32)) -> Self {
        Self {
            lightness,
            saturation,
        }
    }

    fn accepts(&self, hsl: &Hsl) -> bool {
        let (l_min, _, l_max) = self.lightness;
        let (s_min, _, s_max) = self.saturation;
        (l_min..=l_max).contains(&hsl.lightness) && (s_min..=s_max).contains(&hsl.saturation)
    }

    fn score(&self, hsl: &Hsl, population: f32, max_population: f32) -> f32 {
        let sat = 1.0 - (hsl.saturation - self.saturation.1).abs();
        let light = 1.0 - (hsl.lightness - self.lightness.1).abs();
        let pop = if max_population > 0.0 {
            population / max_population
        } else {
            0.0
        };
        (sat * WEIGHT_SATURATION + light * WEIGHT_LIGHTNESS + pop * WEIGHT_POPULATION)
            / (WEIGHT_SATURATION + WEIGHT_LIGHTNESS + WEIGHT_POPULATION)
    }
}

// (min, target, max) for lightness then saturation.
const VIBRANT: Target = Target::new((0.3, 0.5, 0.7), (0.35, 1.0, 1.0));
const DARK_VIBRANT: Target = Target::new((0.0, 0.26, 0.45), (0.35, 1.0, 1.0));
const LIGHT_VIBRANT: Target = Target::new((0.55, 0.74, 1.0), (0.35, 1.0, 1.0));
const MUTED: Target = Target::new((0.3, 0.5, 0.7), (0.0, 0.3, 0.4));
const DARK_MUTED: Target = Target::new((0.0, 0.26, 0.45), (0.0, 0.3, 0.4));
const LIGHT_MUTED: Target = Target::new((0.55, 0.74, 1.0), (0.0, 0.3, 0.4));

const TARGETS: [Target; 6] = [
    VIBRANT,
    DARK_VIBRANT,
    LIGHT_VIBRANT,
    MUTED,
    DARK_MUTED,
    LIGHT_MUTED,
];

struct Swatch {
    hsl: Hsl,
    population: u32,
}

/// Average colour per 5-bit-per-channel bucket.
fn quantize(image: &DynamicImage) -> Vec<Swatch> {
    let sample = if image.width() > SAMPLE_EDGE || image.height() > SAMPLE_EDGE {
        image.thumbnail(SAMPLE_EDGE, SAMPLE_EDGE)
    } else {
        image.clone()
    };
    let mut buckets: HashMap<u16, (u32, [u32; 3])> = HashMap::new();
    for (_, _, pixel) in sample.pixels() {
        let [r, g, b, a] = pixel.0;
        if a < 125 {
            continue;
        }
        let key = (u16::from(r >> 3) << 10) | (u16::from(g >> 3) << 5) | u16::from(b >> 3);
        let entry = buckets.entry(key).or_insert((0, [0; 3]));
        entry.0 += 1;
        entry.1[0] += u32::from(r);
        entry.1[1] += u32::from(g);
        entry.1[2] += u32::from(b);
    }
    buckets
        .into_values()
        .map(|(count, sum)| {
            let channel = |c: u32| (c as f32 / count as f32) / 255.0;
            Swatch {
                hsl: Hsl::from_color(Srgb::new(channel(sum[0]), channel(sum[1]), channel(sum[2]))),
                population: count,
            }
        })
        .collect()
}

fn to_hex(hsl: Hsl) -> String {
    let rgb: Srgb = Srgb::from_color(hsl);
    let rgb: Srgb<u8> = rgb.into_format();
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

/// Extract a six-swatch palette. Returns `None` when the image has no opaque pixels.
pub fn extract_palette(image: &DynamicImage) -> Option<AccentColors> {
    let swatches = quantize(image);
    let max_population = swatches.iter().map(|s| s.population).max()? as f32;

    let mut picked: [Option<Hsl>; 6] = [None; 6];
    let mut used: Vec<usize> = Vec::new();
    for (slot, target) in TARGETS.iter().enumerate() {
        let best = swatches
            .iter()
            .enumerate()
            .filter(|(idx, s)| !used.contains(idx) && target.accepts(&s.hsl))
            .map(|(idx, s)| (idx, target.score(&s.hsl, s.population as f32, max_population)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((idx, _)) = best {
            used.push(idx);
            picked[slot] = Some(swatches[idx].hsl);
        }
    }

    let fallback = swatches
        .iter()
        .max_by_key(|s| s.population)
        .map(|s| s.hsl)?;
    let resolved: Vec<String> = TARGETS
        .iter()
        .enumerate()
        .map(|(slot, target)| match picked[slot] {
            Some(hsl) => to_hex(hsl),
            None => to_hex(derive(slot, &picked, fallback, target)),
        })
        .collect();

    Some(AccentColors {
        vibrant: resolved[0].clone(),
        dark_vibrant: resolved[1].clone(),
        light_vibrant: resolved[2].clone(),
        muted: resolved[3].clone(),
        dark_muted: resolved[4].clone(),
        light_muted: resolved[5].clone(),
    })
}

/// Fill a missing swatch from a found sibling of the same family, shifted to
/// the target lightness.
fn derive(slot: usize, picked: &[Option<Hsl>; 6], fallback: Hsl, target: &Target) -> Hsl {
    let family = if slot < 3 { 0..3 } else { 3..6 };
    let source = family
        .clone()
        .chain((0..6).filter(|idx| !family.contains(idx)))
        .find_map(|idx| picked[idx])
        .unwrap_or(fallback);
    let saturation = source
        .saturation
        .clamp(target.saturation.0, target.saturation.2);
    Hsl::new(source.hue, saturation, target.lightness.1)
}

/// Palette for the image at `path`, honouring a file-name override.
pub fn accent_colors_for(path: &Path, image: &DynamicImage) -> AccentColors {
    if let Some(color) = color_override(path) {
        tracing::debug!(path = %path.display(), %color, "accent colour from file name");
        return AccentColors::uniform(color);
    }
    extract_palette(image).unwrap_or_else(|| {
        tracing::warn!(path = %path.display(), "no opaque pixels; using neutral accents");
        neutral()
    })
}

/// Grey swatches used when no palette is available.
pub fn neutral() -> AccentColors {
    AccentColors {
        vibrant: "#808080".into(),
        dark_vibrant: "#424242".into(),
        light_vibrant: "#bdbdbd".into(),
        muted: "#808080".into(),
        dark_muted: "#424242".into(),
        light_muted: "#bdbdbd".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::path::PathBuf;

    #[test]
    fn override_requires_uppercase_hex() {
        assert_eq!(
            color_override(&PathBuf::from("photos/dunes-cFF8800.jpg")),
            Some("#FF8800".to_string())
        );
        assert_eq!(
            color_override(&PathBuf::from("beach-cAB12CD-final.png")),
            Some("#AB12CD".to_string())
        );
        assert_eq!(color_override(&PathBuf::from("dunes-cff8800.jpg")), None);
        assert_eq!(color_override(&PathBuf::from("dunes-cFF88.jpg")), None);
        assert_eq!(color_override(&PathBuf::from("city-center.jpg")), None);
    }

    #[test]
    fn saturated_red_becomes_vibrant() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([230, 20, 20, 255])));
        let colors = extract_palette(&img).expect("palette");
        assert_eq!(colors.vibrant, "#e61414");
        // Light variant derived from the same hue.
        let light = u8::from_str_radix(&colors.light_vibrant[1..3], 16).unwrap();
        assert!(light > 200, "{colors:?}");
    }

    #[test]
    fn transparent_image_has_no_palette() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        assert!(extract_palette(&img).is_none());
        let colors = accent_colors_for(Path::new("clear.png"), &img);
        assert_eq!(colors, neutral());
    }

    #[test]
    fn override_wins_over_pixels() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255])));
        let colors = accent_colors_for(Path::new("sky-c00FF00.png"), &img);
        assert_eq!(colors, AccentColors::uniform("#00FF00"));
    }
}

//! Colour palette extraction.
//!
//! Pixels are quantized to 4 levels per channel (64 bins); the five most
//! populated bins, each represented by the mean of its pixels, form the
//! palette. The dominant colour is named by hue family.

use std::fmt;

use image::RgbImage;

/// Colours kept per image.
pub const PALETTE_SIZE: usize = 5;

const LEVEL_SHIFT: u8 = 6;
const BIN_COUNT: usize = 64;

/// Coarse naming of a colour by hue, or lightness for unsaturated colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorFamily {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Pink,
    Dark,
    Light,
    Neutral,
}

impl ColorFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorFamily::Red => "red",
            ColorFamily::Orange => "orange",
            ColorFamily::Yellow => "yellow",
            ColorFamily::Green => "green",
            ColorFamily::Cyan => "cyan",
            ColorFamily::Blue => "blue",
            ColorFamily::Purple => "purple",
            ColorFamily::Pink => "pink",
            ColorFamily::Dark => "dark",
            ColorFamily::Light => "light",
            ColorFamily::Neutral => "neutral",
        }
    }

    /// Classify an RGB colour.
    pub fn of(rgb: [u8; 3]) -> Self {
        let (hue, saturation, value) = to_hsv(rgb);

        if value < 0.2 {
            return ColorFamily::Dark;
        }
        if saturation < 0.18 {
            return if value > 0.85 {
                ColorFamily::Light
            } else if value < 0.35 {
                ColorFamily::Dark
            } else {
                ColorFamily::Neutral
            };
        }

        match hue {
            h if !(15.0..345.0).contains(&h) => ColorFamily::Red,
            h if h < 45.0 => ColorFamily::Orange,
            h if h < 70.0 => ColorFamily::Yellow,
            h if h < 170.0 => ColorFamily::Green,
            h if h < 200.0 => ColorFamily::Cyan,
            h if h < 260.0 => ColorFamily::Blue,
            h if h < 290.0 => ColorFamily::Purple,
            _ => ColorFamily::Pink,
        }
    }
}

impl fmt::Display for ColorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hue in degrees, saturation and value in [0, 1].
fn to_hsv([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta / max } else { 0.0 };
    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    (hue, saturation, max)
}

pub fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

#[derive(Clone, Copy, Default)]
struct Bin {
    count: u64,
    sum: [u64; 3],
}

/// Up to [`PALETTE_SIZE`] colours, most frequent first.
pub fn extract_palette(img: &RgbImage) -> Vec<[u8; 3]> {
    let mut bins = [Bin::default(); BIN_COUNT];

    for pixel in img.pixels() {
        let [r, g, b] = pixel.0;
        let index = ((r >> LEVEL_SHIFT) as usize) << 4
            | ((g >> LEVEL_SHIFT) as usize) << 2
            | (b >> LEVEL_SHIFT) as usize;
        let bin = &mut bins[index];
        bin.count += 1;
        bin.sum[0] += r as u64;
        bin.sum[1] += g as u64;
        bin.sum[2] += b as u64;
    }

    let mut order: Vec<usize> = (0..BIN_COUNT).filter(|i| bins[*i].count > 0).collect();
    order.sort_by(|a, b| bins[*b].count.cmp(&bins[*a].count).then(a.cmp(b)));

    order
        .into_iter()
        .take(PALETTE_SIZE)
        .map(|i| {
            let bin = bins[i];
            [
                (bin.sum[0] / bin.count) as u8,
                (bin.sum[1] / bin.count) as u8,
                (bin.sum[2] / bin.count) as u8,
            ]
        })
        .collect()
}

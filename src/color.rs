use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use palette::{Hsl, Hsv, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

use crate::error::{LabelError, Result};

// ---------------------------------------------------------------------------
// Qualitative palettes used for freshly created category colors
// ---------------------------------------------------------------------------

const SET1: [&str; 9] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];
const SET2: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];
const SET3: [&str; 12] = [
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];
const TAB10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];
const DARK2: [&str; 8] = [
    "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02", "#a6761d", "#666666",
];

const TAB10_NAMES: [&str; 10] = [
    "blue", "orange", "green", "red", "purple", "brown", "pink", "gray", "olive", "cyan",
];

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Srgb<u8>> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

/// Create `n` category colors as hex strings.
///
/// Colors are taken in order from the Set1, Set2, Set3, tab10 and Dark2
/// palettes; beyond those, evenly spaced hues fill the remainder.
pub fn create_categorical_colors(n: usize) -> Vec<String> {
    let mut colors: Vec<String> = SET1
        .iter()
        .chain(SET2.iter())
        .chain(SET3.iter())
        .chain(TAB10.iter())
        .chain(DARK2.iter())
        .take(n)
        .map(|c| c.to_string())
        .collect();
    if colors.len() < n {
        let extra = generate_palette(n - colors.len());
        colors.extend(extra.into_iter().map(hex_u8));
    }
    colors
}

// ---------------------------------------------------------------------------
// Parsing color-like strings
// ---------------------------------------------------------------------------

/// Interpret a color string.
///
/// Accepted forms:
/// * `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` (alpha is ignored)
/// * CSS4 color names, case-insensitive (`"red"`, `"SteelBlue"`)
/// * single-letter base colors `b g r c m y k w`
/// * `tab:<name>` Tableau colors and the `C0`..`C9` cycle
/// * a gray level `"0.0"`..`"1.0"`
pub fn parse_color(text: &str) -> Option<Srgb> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = text.to_ascii_lowercase();
    if let Some(rgb) = base_color(&lower) {
        return Some(rgb);
    }
    if let Some(name) = lower.strip_prefix("tab:") {
        let pos = TAB10_NAMES
            .iter()
            .position(|n| *n == name || (name == "grey" && *n == "gray"))?;
        return parse_hex(&TAB10[pos][1..]);
    }
    if let Some(digit) = lower.strip_prefix('c') {
        if let Ok(i) = digit.parse::<usize>() {
            return parse_hex(&TAB10[i % TAB10.len()][1..]);
        }
    }
    if let Some(rgb) = palette::named::from_str(&lower) {
        return Some(rgb.into_format());
    }
    match text.parse::<f32>() {
        Ok(level) if (0.0..=1.0).contains(&level) => Some(Srgb::new(level, level, level)),
        _ => None,
    }
}

/// Whether `text` can be interpreted as a color.
pub fn is_color_like(text: &str) -> bool {
    parse_color(text).is_some()
}

fn parse_hex(hex: &str) -> Option<Srgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = match hex.len() {
        3 | 6 => hex,
        4 => &hex[..3],
        8 => &hex[..6],
        _ => return None,
    };
    Srgb::<u8>::from_str(rgb).ok().map(|c| c.into_format())
}

fn base_color(name: &str) -> Option<Srgb> {
    let (r, g, b) = match name {
        "b" => (0.0, 0.0, 1.0),
        "g" => (0.0, 0.5, 0.0),
        "r" => (1.0, 0.0, 0.0),
        "c" => (0.0, 0.75, 0.75),
        "m" => (0.75, 0.0, 0.75),
        "y" => (0.75, 0.75, 0.0),
        "k" => (0.0, 0.0, 0.0),
        "w" => (1.0, 1.0, 1.0),
        _ => return None,
    };
    Some(Srgb::new(r, g, b))
}

/// Fail with `NotColorLike` on the first color that cannot be parsed.
pub fn check_color_like<S: AsRef<str>>(colors: &[S]) -> Result<()> {
    match colors.iter().find(|c| !is_color_like(c.as_ref())) {
        Some(bad) => Err(LabelError::NotColorLike(bad.as_ref().to_string())),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hex_f32(rgb: Srgb) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(rgb.red),
        channel(rgb.green),
        channel(rgb.blue)
    )
}

fn hex_u8(rgb: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

/// Convert a color-like string into lowercase `#rrggbb`.
pub fn to_hex(text: &str) -> Result<String> {
    parse_color(text)
        .map(hex_f32)
        .ok_or_else(|| LabelError::NotColorLike(text.to_string()))
}

/// Channel-wise sRGB mean of the given colors, as hex.
pub fn mean_color<S: AsRef<str>>(colors: &[S]) -> Result<String> {
    if colors.is_empty() {
        return Err(LabelError::InvalidColorCount(0));
    }
    let mut sum = [0.0f32; 3];
    for c in colors {
        let rgb = parse_color(c.as_ref())
            .ok_or_else(|| LabelError::NotColorLike(c.as_ref().to_string()))?;
        sum[0] += rgb.red;
        sum[1] += rgb.green;
        sum[2] += rgb.blue;
    }
    let n = colors.len() as f32;
    Ok(hex_f32(Srgb::new(sum[0] / n, sum[1] / n, sum[2] / n)))
}

// ---------------------------------------------------------------------------
// Color variations
// ---------------------------------------------------------------------------

/// Offsets applied around a base color's HSV channels when deriving
/// variations of it. `None` keeps the channel fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorShift {
    pub hue_range: Option<(f32, f32)>,
    pub saturation_range: Option<(f32, f32)>,
    pub value_range: Option<(f32, f32)>,
}

impl Default for ColorShift {
    fn default() -> Self {
        Self {
            hue_range: Some((-0.1, 0.1)),
            saturation_range: Some((-0.3, 0.3)),
            value_range: Some((-0.3, 0.3)),
        }
    }
}

fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f32;
    (0..n).map(|i| start + step * i as f32).collect()
}

/// Create `n` variations of `base` as hex strings.
///
/// Each HSV channel is spread linearly over `[c + low, c + high]` (clamped to
/// `[0, 1]`) across `2n` samples and every other sample is kept, so adjacent
/// variations stay apart. With `n == 1` the base color itself is returned.
///
/// Only the count, distinctness and hex form of the shades are stable. The
/// exact values are not those of other tools' shade generators: `("red", 2)`
/// does not give `#bb2200` / `#ee6655`.
pub fn create_colors(base: &str, n: usize, shift: &ColorShift) -> Result<Vec<String>> {
    if n == 0 {
        return Err(LabelError::InvalidColorCount(n));
    }
    let rgb = parse_color(base).ok_or_else(|| LabelError::NotColorLike(base.to_string()))?;
    if n == 1 {
        return Ok(vec![hex_f32(rgb)]);
    }

    let hsv: Hsv = rgb.into_color();
    let base_hsv = [
        hsv.hue.into_positive_degrees() / 360.0,
        hsv.saturation,
        hsv.value,
    ];
    let samples = 2 * n;
    let channels: Vec<Vec<f32>> = [shift.hue_range, shift.saturation_range, shift.value_range]
        .iter()
        .zip(base_hsv)
        .map(|(range, c)| match range {
            Some((a, b)) => {
                let (low, high) = if a <= b { (*a, *b) } else { (*b, *a) };
                linspace((c + low).max(0.0), (c + high).min(1.0), samples)
            }
            None => vec![c; samples],
        })
        .collect();

    Ok((0..samples)
        .step_by(2)
        .map(|i| {
            let hsv = Hsv::new(channels[0][i] * 360.0, channels[1][i], channels[2][i]);
            let rgb: Srgb = hsv.into_color();
            hex_f32(rgb)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Color mapping: category → color
// ---------------------------------------------------------------------------

/// Colors supplied for a categorical series: one per category, either in
/// category order or keyed by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Colors {
    List(Vec<String>),
    Mapping(BTreeMap<String, String>),
}

impl Colors {
    pub fn len(&self) -> usize {
        match self {
            Colors::List(l) => l.len(),
            Colors::Mapping(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> From<Vec<S>> for Colors {
    fn from(colors: Vec<S>) -> Self {
        Colors::List(colors.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, String>> for Colors {
    fn from(mapping: BTreeMap<String, String>) -> Self {
        Colors::Mapping(mapping)
    }
}

/// Maps categories to colors. Colors are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    mapping: BTreeMap<String, String>,
}

impl ColorMap {
    /// Build a colour map for the given categories, validating the colors.
    pub fn new(categories: &[String], colors: &Colors) -> Result<Self> {
        if categories.len() != colors.len() {
            return Err(LabelError::ColorCount {
                expected: categories.len(),
                found: colors.len(),
            });
        }
        let mapping: BTreeMap<String, String> = match colors {
            Colors::List(list) => {
                check_color_like(list)?;
                categories.iter().cloned().zip(list.iter().cloned()).collect()
            }
            Colors::Mapping(map) => {
                let keys: BTreeSet<&String> = map.keys().collect();
                let cats: BTreeSet<&String> = categories.iter().collect();
                if keys != cats {
                    return Err(LabelError::ColorKeys(
                        keys.symmetric_difference(&cats)
                            .map(|k| k.to_string())
                            .collect(),
                    ));
                }
                let values: Vec<&String> = map.values().collect();
                check_color_like(&values)?;
                map.clone()
            }
        };
        Ok(ColorMap { mapping })
    }

    /// Look up the colour for a given category.
    pub fn color_for(&self, category: &str) -> Option<&str> {
        self.mapping.get(category).map(String::as_str)
    }

    /// Overlay `other` on top of `self`: categories present in `other` take its color.
    pub fn overlay(&self, other: &ColorMap) -> ColorMap {
        let mut mapping = self.mapping.clone();
        mapping.extend(other.mapping.iter().map(|(k, v)| (k.clone(), v.clone())));
        ColorMap { mapping }
    }

    /// Colors for `categories`, in that order.
    pub fn colors_for(&self, categories: &[String]) -> Result<Vec<String>> {
        categories
            .iter()
            .map(|c| {
                self.color_for(c)
                    .map(str::to_string)
                    .ok_or_else(|| LabelError::ColorKeys(vec![c.clone()]))
            })
            .collect()
    }
}

//! Transfer functions
//!
//! A transfer function maps a normalised scalar intensity to colour and
//! opacity. It is authored as two [`TransferCurve`]s (one for colour, one for
//! opacity) and baked into a fixed-resolution RGBA [`TransferLookup`] every
//! time a frame needs it. Nothing is cached between edits.
//!
//! Curves keep the stops exactly as the editor placed them. Boundary stops,
//! hard-mode step stops and de-duplication are applied on the fly by
//! [`TransferCurve::expanded`], so toggling hard mode never moves a stored stop.

use serde::{Serialize, Deserialize};

use crate::error::CurveError;

/// Default lookup-table resolution
pub const DEFAULT_LOOKUP_RESOLUTION: u32 = 256;

/// Offset before the next stop at which hard mode holds the current colour
pub const HARD_STEP_EPSILON: f32 = 0.001;

/// Linear RGB colour with components in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0 };

    /// Create a new colour
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::from_rgb8(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Build from 8-bit channels
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Format as `#rrggbb`
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// Quantise to 8-bit channels (rounded, clamped)
    pub fn to_rgb8(self) -> [u8; 3] {
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    /// Mean of the three channels
    pub fn mean(self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }

    /// Component-wise linear interpolation
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Components as an array
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Round `v * 255` to the nearest integer and clamp to a byte
fn quantize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// A control point on a transfer curve
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Position along the intensity axis, in [0, 1]
    pub position: f32,
    /// Colour at this position
    pub color: Color,
    /// Opacity at this position, in [0, 1]
    pub alpha: f32,
}

impl Stop {
    /// Create a stop with explicit colour and opacity
    pub fn new(position: f32, color: Color, alpha: f32) -> Self {
        Self {
            position: position.clamp(0.0, 1.0),
            color,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Opaque colour stop
    pub fn color(position: f32, color: Color) -> Self {
        Self::new(position, color, 1.0)
    }

    /// Stop whose opacity is the mean of its colour channels
    ///
    /// Opacity editors author grey-scale handles; black is transparent and
    /// white is opaque.
    pub fn from_luminance(position: f32, color: Color) -> Self {
        Self::new(position, color, color.mean())
    }
}

/// An editable, ordered sequence of stops
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferCurve {
    stops: Vec<Stop>,
    #[serde(default)]
    hard: bool,
}

impl TransferCurve {
    /// Create a curve from stops in any order
    ///
    /// Stops with a non-finite position are dropped.
    pub fn new(stops: impl IntoIterator<Item = Stop>) -> Self {
        let mut curve = Self {
            stops: stops.into_iter().collect(),
            hard: false,
        };
        curve.sort();
        curve
    }

    /// Builder: set step interpolation
    pub fn with_hard(mut self, hard: bool) -> Self {
        self.hard = hard;
        self
    }

    /// Stops as placed by the editor, sorted by position
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Whether step interpolation is active
    pub fn is_hard(&self) -> bool {
        self.hard
    }

    /// Insert a stop at `position`
    ///
    /// Without an explicit colour the new stop takes the curve's current
    /// interpolated colour and opacity there. Returns the index of the new stop,
    /// or `None` (no change) when a stop already sits exactly at `position`
    /// or `position` is not finite.
    pub fn add_stop(&mut self, position: f32, color: Option<Color>) -> Option<usize> {
        if !position.is_finite() {
            return None;
        }
        let position = position.clamp(0.0, 1.0);
        if self.stops.iter().any(|s| s.position == position) {
            return None;
        }

        let stop = match color {
            Some(color) => Stop::from_luminance(position, color),
            None => {
                let (color, alpha) = self.evaluate(position);
                Stop::new(position, color, alpha)
            }
        };

        let index = self.stops.partition_point(|s| s.position < position);
        self.stops.insert(index, stop);
        Some(index)
    }

    /// Remove the stop at `index`
    ///
    /// Endpoints may be removed; boundary synthesis fills the gap.
    pub fn remove_stop(&mut self, index: usize) -> Option<Stop> {
        if index < self.stops.len() {
            Some(self.stops.remove(index))
        } else {
            None
        }
    }

    /// Drag a stop to a new position, returning its index after re-sorting
    ///
    /// A non-finite `position` leaves the curve untouched and returns `None`.
    pub fn move_stop(&mut self, index: usize, position: f32) -> Option<usize> {
        if !position.is_finite() {
            return None;
        }
        let mut stop = self.remove_stop(index)?;
        stop.position = position.clamp(0.0, 1.0);
        // Equal positions keep editor order: the moved stop goes after them
        let new_index = self.stops.partition_point(|s| s.position <= stop.position);
        self.stops.insert(new_index, stop);
        Some(new_index)
    }

    /// Replace the colour of a stop (opacity follows the colour's mean)
    pub fn set_stop_color(&mut self, index: usize, color: Color) -> bool {
        match self.stops.get_mut(index) {
            Some(stop) => {
                *stop = Stop::from_luminance(stop.position, color);
                true
            }
            None => false,
        }
    }

    /// Switch between linear and step interpolation
    ///
    /// Returns the new mode (`true` = step).
    pub fn toggle_hard_mode(&mut self) -> bool {
        self.hard = !self.hard;
        self.hard
    }

    /// Stops ready for lookup construction
    ///
    /// The result starts at position 0, ends at position 1 and is strictly
    /// increasing. An empty curve becomes flat opaque white.
    pub fn expanded(&self) -> Vec<Stop> {
        // Deserialised curves never went through `new`
        let stops: Vec<Stop> = self
            .stops
            .iter()
            .copied()
            .filter(|s| s.position.is_finite())
            .collect();
        let (first, last) = match (stops.first(), stops.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return vec![
                    Stop::color(0.0, Color::WHITE),
                    Stop::color(1.0, Color::WHITE),
                ];
            }
        };

        let mut raw = Vec::with_capacity(stops.len() * 2 + 2);
        if first.position > 0.0 {
            raw.push(Stop { position: 0.0, ..first });
        }

        for (i, stop) in stops.iter().enumerate() {
            raw.push(*stop);
            if self.hard {
                let next = stops.get(i + 1).map_or(1.0, |s| s.position);
                let step = next - HARD_STEP_EPSILON;
                if step > stop.position {
                    raw.push(Stop { position: step, ..*stop });
                }
            }
        }

        if last.position < 1.0 {
            raw.push(Stop { position: 1.0, ..last });
        }

        repair(raw)
    }

    /// Colour and opacity at `position` with linear interpolation
    pub fn evaluate(&self, position: f32) -> (Color, f32) {
        evaluate_expanded(&self.expanded(), position)
    }

    fn sort(&mut self) {
        self.stops.retain(|s| {
            let finite = s.position.is_finite();
            if !finite {
                log::warn!("Dropping transfer stop with position {}", s.position);
            }
            finite
        });
        for stop in &mut self.stops {
            stop.position = stop.position.clamp(0.0, 1.0);
        }
        self.stops.sort_by(|a, b| a.position.total_cmp(&b.position));
    }
}

/// Drop stops that break strict ordering
///
/// Among coincident stops the first wins, except at position 1 where the last
/// wins so the right boundary matches the last authored stop.
fn repair(raw: Vec<Stop>) -> Vec<Stop> {
    let mut out: Vec<Stop> = Vec::with_capacity(raw.len());
    for (index, stop) in raw.into_iter().enumerate() {
        match out.last_mut() {
            Some(prev) if stop.position <= prev.position => {
                let err = CurveError::InvalidCurveState { index, position: stop.position };
                log::debug!("{}; repairing", err);
                if stop.position >= 1.0 {
                    *prev = stop;
                }
            }
            _ => out.push(stop),
        }
    }
    out
}

/// Piecewise-linear evaluation over strictly increasing stops
fn evaluate_expanded(stops: &[Stop], position: f32) -> (Color, f32) {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return (Color::WHITE, 1.0),
    };
    if position.is_nan() || position <= first.position {
        return (first.color, first.alpha);
    }
    if position >= last.position {
        return (last.color, last.alpha);
    }

    let upper = stops.partition_point(|s| s.position <= position).max(1);
    let a = &stops[upper - 1];
    let b = &stops[upper];
    let t = (position - a.position) / (b.position - a.position);

    (a.color.lerp(b.color, t), a.alpha + (b.alpha - a.alpha) * t)
}

/// A pair of curves: colour from one, opacity from the other
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferFunction {
    pub color: TransferCurve,
    pub alpha: TransferCurve,
}

impl TransferFunction {
    pub fn new(color: TransferCurve, alpha: TransferCurve) -> Self {
        Self { color, alpha }
    }

    /// Bake both curves into an RGBA lookup table
    ///
    /// Texel `i` holds the value at `i / (resolution - 1)`. The result depends
    /// only on the curves and the resolution.
    pub fn build_lookup(&self, resolution: u32) -> TransferLookup {
        let color_stops = self.color.expanded();
        let alpha_stops = self.alpha.expanded();

        let texels = (0..resolution)
            .map(|i| {
                let position = if resolution > 1 {
                    i as f32 / (resolution - 1) as f32
                } else {
                    0.0
                };
                let (color, _) = evaluate_expanded(&color_stops, position);
                let (_, alpha) = evaluate_expanded(&alpha_stops, position);
                let [r, g, b] = color.to_rgb8();
                [r, g, b, quantize(alpha)]
            })
            .collect();

        TransferLookup { resolution, texels }
    }
}

/// Baked RGBA8 transfer-function table
#[derive(Clone, Debug, PartialEq)]
pub struct TransferLookup {
    resolution: u32,
    texels: Vec<[u8; 4]>,
}

impl TransferLookup {
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn texels(&self) -> &[[u8; 4]] {
        &self.texels
    }

    /// Tightly packed bytes, 4 per texel
    pub fn as_bytes(&self) -> &[u8] {
        self.texels.as_flattened()
    }

    /// Linearly filtered colour and opacity for a normalised intensity
    ///
    /// Intensity 0 hits texel 0 and intensity 1 hits the last texel exactly.
    pub fn sample(&self, value: f32) -> ([f32; 3], f32) {
        let texel = |i: usize| {
            let [r, g, b, a] = self.texels[i];
            [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0]
        };

        let last = match self.texels.len() {
            0 => return ([1.0; 3], 1.0),
            n => n - 1,
        };

        let f = value.clamp(0.0, 1.0) * last as f32;
        let i0 = (f.floor() as usize).min(last);
        let i1 = (i0 + 1).min(last);
        let t = f - i0 as f32;
        let (a, b) = (texel(i0), texel(i1));
        let mix = |k: usize| a[k] + (b[k] - a[k]) * t;

        ([mix(0), mix(1), mix(2)], mix(3))
    }
}

//! Volume data
//!
//! A [`Volume`] owns the raw 16-bit scalar samples of a CT-style scan along
//! with its dimensions. It is immutable once loaded; a new file replaces it
//! wholesale.
//!
//! Samples are stored x-fastest: index = `x + width * (y + height * z)`.

use std::path::Path;

use voxcast_math::Vec3;

use crate::error::{FormatError, VolumeError};
use crate::raycast::VolumeSampler;

/// Default number of histogram bins
pub const DEFAULT_HISTOGRAM_BINS: usize = 256;

/// Largest representable sample, used to normalise intensities to [0, 1]
const SAMPLE_RANGE: f32 = u16::MAX as f32;

/// A 3D scalar field of unsigned 16-bit intensities
#[derive(Clone, Debug)]
pub struct Volume {
    width: u32,
    height: u32,
    depth: u32,
    samples: Vec<u16>,
    max: u16,
}

impl Volume {
    /// Create a volume from decoded samples
    ///
    /// Fails with [`FormatError`] when `samples.len() != width * height * depth`
    /// or any dimension is zero.
    pub fn load(samples: Vec<u16>, width: u32, height: u32, depth: u32) -> Result<Self, FormatError> {
        let expected = voxel_count(width, height, depth);
        if expected == Some(0) || expected != Some(samples.len()) {
            return Err(FormatError {
                expected_bytes: expected.and_then(|n| n.checked_mul(2)).unwrap_or(usize::MAX),
                actual_bytes: samples.len() * 2,
            });
        }

        let max = samples.iter().copied().max().unwrap_or(0);

        Ok(Self {
            width,
            height,
            depth,
            samples,
            max,
        })
    }

    /// Decode a raw little-endian 16-bit stream
    ///
    /// The byte length must be exactly `2 * width * height * depth`.
    pub fn from_le_bytes(bytes: &[u8], width: u32, height: u32, depth: u32) -> Result<Self, FormatError> {
        let expected = voxel_count(width, height, depth).and_then(|n| n.checked_mul(2));
        if expected != Some(bytes.len()) || bytes.is_empty() {
            return Err(FormatError {
                expected_bytes: expected.unwrap_or(usize::MAX),
                actual_bytes: bytes.len(),
            });
        }

        let samples = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Self::load(samples, width, height, depth)
    }

    /// Read and decode a raw volume file
    pub fn load_from_file(path: impl AsRef<Path>, width: u32, height: u32, depth: u32) -> Result<Self, VolumeError> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(Self::from_le_bytes(&bytes, width, height, depth)?)
    }

    /// Dimensions as (width, height, depth)
    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth)
    }

    /// Dimensions as a world-space extent (one unit per voxel)
    pub fn extent(&self) -> Vec3 {
        Vec3::new(self.width as f32, self.height as f32, self.depth as f32)
    }

    /// Largest dimension
    pub fn max_extent(&self) -> f32 {
        self.extent().max_element()
    }

    /// Largest sample value
    pub fn max(&self) -> u16 {
        self.max
    }

    /// Raw samples in x-fastest order
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Number of voxels
    pub fn voxel_count(&self) -> usize {
        self.samples.len()
    }

    /// Samples scaled to [0, 1] for upload as a float texture
    pub fn normalized_samples(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / SAMPLE_RANGE).collect()
    }

    /// Histogram of normalised intensities
    pub fn histogram(&self, bin_count: usize) -> Histogram {
        Histogram::from_samples(&self.samples, bin_count)
    }

    /// Normalised value at integer voxel coordinates, clamped to the boundary
    fn voxel(&self, x: i64, y: i64, z: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let z = z.clamp(0, self.depth as i64 - 1) as usize;
        let w = self.width as usize;
        let h = self.height as usize;
        self.samples[x + w * (y + h * z)] as f32 / SAMPLE_RANGE
    }
}

impl VolumeSampler for Volume {
    fn sample(&self, p: Vec3) -> f32 {
        // Voxel centres sit at (i + 0.5) / n, matching texture addressing
        let fx = p.x * self.width as f32 - 0.5;
        let fy = p.y * self.height as f32 - 0.5;
        let fz = p.z * self.depth as f32 - 0.5;

        let (x0, y0, z0) = (fx.floor(), fy.floor(), fz.floor());
        let (tx, ty, tz) = (fx - x0, fy - y0, fz - z0);
        let (x0, y0, z0) = (x0 as i64, y0 as i64, z0 as i64);

        let c00 = lerp(self.voxel(x0, y0, z0), self.voxel(x0 + 1, y0, z0), tx);
        let c10 = lerp(self.voxel(x0, y0 + 1, z0), self.voxel(x0 + 1, y0 + 1, z0), tx);
        let c01 = lerp(self.voxel(x0, y0, z0 + 1), self.voxel(x0 + 1, y0, z0 + 1), tx);
        let c11 = lerp(self.voxel(x0, y0 + 1, z0 + 1), self.voxel(x0 + 1, y0 + 1, z0 + 1), tx);

        lerp(lerp(c00, c10, ty), lerp(c01, c11, ty), tz)
    }

    fn voxel_size(&self) -> Vec3 {
        Vec3::new(
            1.0 / self.width as f32,
            1.0 / self.height as f32,
            1.0 / self.depth as f32,
        )
    }
}

fn voxel_count(width: u32, height: u32, depth: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(depth as usize)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// One histogram bar
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramBin {
    /// Inclusive lower bound of normalised intensity
    pub lower: f32,
    /// Upper bound (exclusive, except for the last bin)
    pub upper: f32,
    /// Number of samples in the bin
    pub count: u64,
}

/// Equal-width histogram over normalised intensities in [0, 1]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Histogram {
    bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Count `sample / 65535` into `bin_count` equal-width bins
    ///
    /// An empty sample slice yields bins with zero counts.
    pub fn from_samples(samples: &[u16], bin_count: usize) -> Self {
        let width = 1.0 / bin_count as f32;
        let mut bins: Vec<HistogramBin> = (0..bin_count)
            .map(|i| HistogramBin {
                lower: i as f32 * width,
                upper: (i + 1) as f32 * width,
                count: 0,
            })
            .collect();

        if bin_count == 0 {
            return Self { bins };
        }

        for &sample in samples {
            let value = sample as f32 / SAMPLE_RANGE;
            let index = ((value * bin_count as f32) as usize).min(bin_count - 1);
            bins[index].count += 1;
        }

        Self { bins }
    }

    /// Bins in ascending intensity order
    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    /// Largest bin count, used to scale bars for display
    pub fn peak(&self) -> u64 {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// Total number of counted samples
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

//! Volume and transfer-function textures
//!
//! The volume is uploaded once per load as a single-channel 3D float texture
//! holding `sample / 65535`. It has no mipmaps and is read with `textureLoad`
//! on clamped integer coordinates, so out-of-range lookups return the border
//! voxel.
//!
//! The transfer-function texture is a 1D RGBA8 strip. Its contents are
//! rewritten from a freshly built lookup table every frame.

use voxcast_core::{TransferLookup, Volume};

use super::types::{TRANSFER_FORMAT, VOLUME_FORMAT};
use crate::error::RenderError;

/// A volume resident on the GPU
pub struct VolumeTexture {
    #[allow(dead_code)] // Keeps the texture alive for the view
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    dimensions: (u32, u32, u32),
}

impl VolumeTexture {
    /// Upload a volume
    ///
    /// Fails if a dimension exceeds the device's 3D texture limit.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, volume: &Volume) -> Result<Self, RenderError> {
        let (width, height, depth) = volume.dimensions();
        let limit = device.limits().max_texture_dimension_3d;
        if width > limit || height > limit || depth > limit {
            return Err(RenderError::Other(format!(
                "Volume {}x{}x{} exceeds the 3D texture limit of {}",
                width, height, depth, limit
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: depth,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Volume Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: VOLUME_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let samples = volume.normalized_samples();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&samples),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        log::info!("Uploaded {}x{}x{} volume texture", width, height, depth);

        Ok(Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            dimensions: (width, height, depth),
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.dimensions
    }
}

/// The transfer-function lookup on the GPU
pub struct TransferTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    resolution: u32,
}

impl TransferTexture {
    /// Create an (uninitialised) strip of `resolution` texels
    pub fn new(device: &wgpu::Device, resolution: u32) -> Self {
        let resolution = resolution.clamp(1, device.limits().max_texture_dimension_1d);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Transfer Function Texture"),
            size: wgpu::Extent3d {
                width: resolution,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D1,
            format: TRANSFER_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            resolution,
        }
    }

    /// Write a lookup table, recreating the texture if its size changed
    ///
    /// Returns `true` if the texture was recreated.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, lookup: &TransferLookup) -> bool {
        let recreated = lookup.resolution() != self.resolution;
        if recreated {
            *self = Self::new(device, lookup.resolution());
        }
        if lookup.resolution() != self.resolution {
            log::warn!(
                "Transfer lookup of {} texels does not fit the device; skipping upload",
                lookup.resolution()
            );
            return recreated;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            lookup.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.resolution * 4),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: self.resolution,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        recreated
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

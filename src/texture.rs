//! 2D textures.
//!
//! Every [`Texture`] is attached to a fixed texture unit, picked by the lesson and handed to the
//! shader through a `sampler2D` uniform. Texture operations activate that unit and bind the
//! texture first.

use glow::{HasContext, PixelUnpackData};
use luminance::texture::{MagFilter, MinFilter, Sampler, Wrap};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::pixel::Image;
use crate::state::GlState;
use crate::Gpu;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("cannot create texture: {0}")]
    Creation(String),

    #[error("not enough texels: expected {expected} bytes, provided {provided}")]
    NotEnoughTexels { expected: usize, provided: usize },

    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug)]
pub struct Texture {
    handle: glow::Texture,
    unit: u32,
    state: Rc<RefCell<GlState>>,
}

impl Drop for Texture {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.unbind_texture(self.handle);

        unsafe {
            state.ctx.delete_texture(self.handle);
        }
    }
}

impl Texture {
    /// Create a texture and bind it to `unit`.
    pub fn new(gpu: &Gpu, unit: u32) -> Result<Self, TextureError> {
        let handle = gpu
            .state
            .borrow_mut()
            .create_texture()
            .map_err(TextureError::Creation)?;

        let texture = Texture {
            handle,
            unit,
            state: gpu.state.clone(),
        };
        texture.bind();

        Ok(texture)
    }

    /// Create a texture on `unit` and upload `image` as its base level.
    pub fn from_image(gpu: &Gpu, unit: u32, image: &Image) -> Result<Self, TextureError> {
        let texture = Texture::new(gpu, unit)?;
        texture.upload_level(0, image)?;
        Ok(texture)
    }

    /// Texture unit the texture is bound to, as expected by a `sampler2D` uniform.
    pub fn unit(&self) -> u32 {
        self.unit
    }

    /// Activate the texture’s unit and bind the texture to it.
    pub fn bind(&self) {
        let mut state = self.state.borrow_mut();
        state.set_texture_unit(self.unit);
        state.bind_texture(glow::TEXTURE_2D, Some(self.handle));
    }

    /// Replace a mipmap level with the content of `image`.
    pub fn upload_level(&self, level: i32, image: &Image) -> Result<(), TextureError> {
        let expected = image.expected_len();
        let provided = image.texels.len();

        if provided < expected {
            return Err(TextureError::NotEnoughTexels { expected, provided });
        }

        self.bind();

        let state = self.state.borrow();
        set_unpack_alignment(&state.ctx, image.row_len());

        let (format, internal_format, encoding) = image.format.glow_pixel_format();

        unsafe {
            state.ctx.tex_image_2d(
                glow::TEXTURE_2D,
                level,
                internal_format,
                image.width as i32,
                image.height as i32,
                0,
                format,
                encoding,
                PixelUnpackData::Slice(Some(&image.texels[..expected])),
            );
        }

        Ok(())
    }

    /// Generate every level below the base level.
    pub fn generate_mipmap(&self) {
        self.bind();

        unsafe {
            self.state.borrow().ctx.generate_mipmap(glow::TEXTURE_2D);
        }
    }

    pub fn set_min_filter(&self, filter: MinFilter) {
        self.set_parameter(glow::TEXTURE_MIN_FILTER, glow_min_filter(filter));
    }

    pub fn set_mag_filter(&self, filter: MagFilter) {
        self.set_parameter(glow::TEXTURE_MAG_FILTER, glow_mag_filter(filter));
    }

    /// Set the wrapping mode along both axes.
    pub fn set_wrap(&self, wrap: Wrap) {
        self.set_parameter(glow::TEXTURE_WRAP_S, glow_wrap(wrap));
        self.set_parameter(glow::TEXTURE_WRAP_T, glow_wrap(wrap));
    }

    /// Apply the filters and the S and T wrapping modes of `sampler`.
    pub fn set_sampler(&self, sampler: &Sampler) {
        self.set_parameter(glow::TEXTURE_WRAP_S, glow_wrap(sampler.wrap_s));
        self.set_parameter(glow::TEXTURE_WRAP_T, glow_wrap(sampler.wrap_t));
        self.set_min_filter(sampler.min_filter);
        self.set_mag_filter(sampler.mag_filter);
    }

    fn set_parameter(&self, parameter: u32, value: u32) {
        self.bind();

        unsafe {
            self.state
                .borrow()
                .ctx
                .tex_parameter_i32(glow::TEXTURE_2D, parameter, value as i32);
        }
    }
}

/// Unpack alignment for rows of `row_len` bytes: the largest of 8, 4, 2 and 1 dividing it.
fn unpack_alignment(row_len: usize) -> i32 {
    match row_len % 8 {
        0 => 8,
        4 => 4,
        2 | 6 => 2,
        _ => 1,
    }
}

// set the unpack alignment for uploading tightly packed rows
fn set_unpack_alignment(ctx: &glow::Context, row_len: usize) {
    unsafe {
        ctx.pixel_store_i32(glow::UNPACK_ALIGNMENT, unpack_alignment(row_len));
    }
}

fn glow_wrap(wrap: Wrap) -> u32 {
    match wrap {
        Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        Wrap::Repeat => glow::REPEAT,
        Wrap::MirroredRepeat => glow::MIRRORED_REPEAT,
    }
}

fn glow_min_filter(filter: MinFilter) -> u32 {
    match filter {
        MinFilter::Nearest => glow::NEAREST,
        MinFilter::Linear => glow::LINEAR,
        MinFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        MinFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        MinFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        MinFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }
}

fn glow_mag_filter(filter: MagFilter) -> u32 {
    match filter {
        MagFilter::Nearest => glow::NEAREST,
        MagFilter::Linear => glow::LINEAR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_alignment_divides_row_length() {
        // 32 RGB texels
        assert_eq!(unpack_alignment(96), 8);
        // 4 RGB texels
        assert_eq!(unpack_alignment(12), 4);
        // 2 RGB texels
        assert_eq!(unpack_alignment(6), 2);
        // 1 RGB texel
        assert_eq!(unpack_alignment(3), 1);
        assert_eq!(unpack_alignment(10), 2);
    }

    #[test]
    fn min_filters_map_to_gl_enums() {
        assert_eq!(glow_min_filter(MinFilter::Nearest), glow::NEAREST);
        assert_eq!(
            glow_min_filter(MinFilter::LinearMipmapNearest),
            glow::LINEAR_MIPMAP_NEAREST
        );
        assert_eq!(
            glow_min_filter(MinFilter::NearestMipmapLinear),
            glow::NEAREST_MIPMAP_LINEAR
        );
    }

    #[test]
    fn mag_filters_and_wraps_map_to_gl_enums() {
        assert_eq!(glow_mag_filter(MagFilter::Linear), glow::LINEAR);
        assert_eq!(glow_wrap(Wrap::Repeat), glow::REPEAT);
        assert_eq!(glow_wrap(Wrap::ClampToEdge), glow::CLAMP_TO_EDGE);
    }

    #[test]
    fn texel_shortage_is_reported_in_bytes() {
        let err = TextureError::NotEnoughTexels {
            expected: 48,
            provided: 12,
        };
        assert_eq!(
            err.to_string(),
            "not enough texels: expected 48 bytes, provided 12"
        );
    }
}

//! Graphics state.

use glow::HasContext;
use luminance::blending::Factor;
use std::{fmt, marker::PhantomData};

/// The graphics state.
///
/// This type represents the current state of a given graphics context. It acts
/// as a forward-gate to the low-level API used by the lessons but adds a small
/// cache layer over it to prevent from issuing the same API call (with the same
/// parameters) twice in a row.
#[derive(Debug)]
pub struct GlState {
    _phantom: PhantomData<*const ()>, // !Send and !Sync

    // GL context
    pub(crate) ctx: glow::Context,

    // viewport
    viewport: [i32; 4],

    // clear buffers
    clear_color: [f32; 4],

    // blending
    blending_state: BlendingState,
    blending_funcs: BlendingFactors,

    // texture
    current_texture_unit: u32,
    bound_textures: Vec<(u32, Option<glow::Texture>)>,

    // array buffer
    bound_array_buffer: Option<glow::Buffer>,
    // element buffer
    bound_element_array_buffer: Option<glow::Buffer>,

    // vertex array
    bound_vertex_array: Option<glow::VertexArray>,
    // shader program
    current_program: Option<glow::Program>,
}

impl GlState {
    /// Create a new `GlState` from a freshly acquired context.
    pub(crate) fn new(ctx: glow::Context) -> Result<Self, StateQueryError> {
        Self::get_from_context(ctx)
    }

    fn get_from_context(ctx: glow::Context) -> Result<Self, StateQueryError> {
        let viewport = get_ctx_viewport(&ctx)?;
        let clear_color = get_ctx_clear_color(&ctx)?;
        let blending_state = get_ctx_blending_state(&ctx);
        let blending_funcs = get_ctx_blending_factors(&ctx)?;
        let current_texture_unit = get_ctx_texture_unit(&ctx)?;

        // 32 is the WebGL 2 minimal number of combined texture image units
        let bound_textures = vec![(glow::TEXTURE_2D, None); 32];

        Ok(GlState {
            _phantom: PhantomData,
            ctx,
            viewport,
            clear_color,
            blending_state,
            blending_funcs,
            current_texture_unit,
            bound_textures,
            bound_array_buffer: None,
            bound_element_array_buffer: None,
            bound_vertex_array: None,
            current_program: None,
        })
    }

    pub(crate) fn create_buffer(&mut self) -> Result<glow::Buffer, String> {
        unsafe { self.ctx.create_buffer() }
    }

    pub(crate) fn bind_array_buffer(&mut self, buffer: Option<glow::Buffer>, bind: Bind) {
        unsafe {
            if bind == Bind::Forced || self.bound_array_buffer != buffer {
                self.ctx.bind_buffer(glow::ARRAY_BUFFER, buffer);
                self.bound_array_buffer = buffer;
            }
        }
    }

    pub(crate) fn bind_element_array_buffer(&mut self, buffer: Option<glow::Buffer>, bind: Bind) {
        unsafe {
            if bind == Bind::Forced || self.bound_element_array_buffer != buffer {
                self.ctx.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, buffer);
                self.bound_element_array_buffer = buffer;
            }
        }
    }

    pub(crate) fn unbind_buffer(&mut self, buffer: glow::Buffer) {
        if self.bound_array_buffer == Some(buffer) {
            self.bind_array_buffer(None, Bind::Cached);
        } else if self.bound_element_array_buffer == Some(buffer) {
            self.bind_element_array_buffer(None, Bind::Cached);
        }
    }

    pub(crate) fn create_vertex_array(&mut self) -> Result<glow::VertexArray, String> {
        unsafe { self.ctx.create_vertex_array() }
    }

    pub(crate) fn bind_vertex_array(&mut self, vao: Option<glow::VertexArray>, bind: Bind) {
        unsafe {
            if bind == Bind::Forced || self.bound_vertex_array != vao {
                self.ctx.bind_vertex_array(vao);
                self.bound_vertex_array = vao;

                // the element array binding is part of the vertex array object
                self.bound_element_array_buffer = None;
            }
        }
    }

    pub(crate) fn unbind_vertex_array(&mut self, vao: glow::VertexArray) {
        if self.bound_vertex_array == Some(vao) {
            self.bind_vertex_array(None, Bind::Cached);
        }
    }

    pub(crate) fn create_texture(&mut self) -> Result<glow::Texture, String> {
        unsafe { self.ctx.create_texture() }
    }

    pub(crate) fn set_texture_unit(&mut self, unit: u32) {
        unsafe {
            if self.current_texture_unit != unit {
                self.ctx.active_texture(glow::TEXTURE0 + unit);
                self.current_texture_unit = unit;
            }
        }
    }

    pub(crate) fn bind_texture(&mut self, target: u32, handle: Option<glow::Texture>) {
        unsafe {
            let unit = self.current_texture_unit as usize;

            match self.bound_textures.get(unit) {
                Some((t, ref h)) if target != *t || handle != *h => {
                    self.ctx.bind_texture(target, handle);
                    self.bound_textures[unit] = (target, handle);
                }

                None => {
                    self.ctx.bind_texture(target, handle);

                    // not enough available texture units; let’s grow a bit more
                    self.bound_textures
                        .resize(unit + 1, (glow::TEXTURE_2D, None));
                    self.bound_textures[unit] = (target, handle);
                }

                _ => (), // cached
            }
        }
    }

    pub(crate) fn unbind_texture(&mut self, handle: glow::Texture) {
        for binding in self.bound_textures.iter_mut() {
            if binding.1 == Some(handle) {
                binding.1 = None;
            }
        }
    }

    pub(crate) fn use_program(&mut self, handle: Option<glow::Program>) {
        unsafe {
            if self.current_program != handle {
                self.ctx.use_program(handle);
                self.current_program = handle;
            }
        }
    }

    pub(crate) fn forget_program(&mut self, handle: glow::Program) {
        if self.current_program == Some(handle) {
            self.current_program = None;
        }
    }

    pub(crate) fn set_viewport(&mut self, viewport: [i32; 4]) {
        unsafe {
            if self.viewport != viewport {
                self.ctx
                    .viewport(viewport[0], viewport[1], viewport[2], viewport[3]);
                self.viewport = viewport;
            }
        }
    }

    pub(crate) fn viewport(&self) -> [i32; 4] {
        self.viewport
    }

    pub(crate) fn set_clear_color(&mut self, clear_color: [f32; 4]) {
        unsafe {
            if self.clear_color != clear_color {
                self.ctx.clear_color(
                    clear_color[0],
                    clear_color[1],
                    clear_color[2],
                    clear_color[3],
                );
                self.clear_color = clear_color;
            }
        }
    }

    pub(crate) fn set_blending_state(&mut self, state: BlendingState) {
        unsafe {
            if self.blending_state != state {
                match state {
                    BlendingState::On => self.ctx.enable(glow::BLEND),
                    BlendingState::Off => self.ctx.disable(glow::BLEND),
                }

                self.blending_state = state;
            }
        }
    }

    pub(crate) fn set_blending_func(&mut self, src: Factor, dst: Factor) {
        unsafe {
            let funcs = BlendingFactors {
                src_rgb: src,
                dst_rgb: dst,
                src_alpha: src,
                dst_alpha: dst,
            };

            if self.blending_funcs != funcs {
                self.ctx
                    .blend_func(blending_factor_to_glow(src), blending_factor_to_glow(dst));

                self.blending_funcs = funcs;
            }
        }
    }
}

/// An error that might happen when the context is queried.
#[non_exhaustive]
#[derive(Debug)]
pub enum StateQueryError {
    /// No WebGL 2 context could be obtained from the canvas.
    UnavailableGlState,
    /// Unknown viewport initial state.
    UnknownViewportInitialState,
    /// Unknown clear color initial state.
    UnknownClearColorInitialState,
    /// The active texture is not one of the `TEXTURE<n>` units.
    UnknownActiveTextureUnit(u32),
    /// Corrupted blending source factor (RGB).
    UnknownBlendingSrcFactorRGB(u32),
    /// Corrupted blending source factor (alpha).
    UnknownBlendingSrcFactorAlpha(u32),
    /// Corrupted blending destination factor (RGB).
    UnknownBlendingDstFactorRGB(u32),
    /// Corrupted blending destination factor (alpha).
    UnknownBlendingDstFactorAlpha(u32),
}

impl fmt::Display for StateQueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            StateQueryError::UnavailableGlState => write!(f, "WebGL 2 is not supported"),

            StateQueryError::UnknownViewportInitialState => {
                write!(f, "unknown viewport initial state")
            }

            StateQueryError::UnknownClearColorInitialState => {
                write!(f, "unknown clear color initial state")
            }

            StateQueryError::UnknownActiveTextureUnit(ref k) => {
                write!(f, "unknown active texture unit: {}", k)
            }

            StateQueryError::UnknownBlendingSrcFactorRGB(ref k) => {
                write!(f, "unknown blending source factor (RGB): {}", k)
            }

            StateQueryError::UnknownBlendingSrcFactorAlpha(ref k) => {
                write!(f, "unknown blending source factor (alpha): {}", k)
            }

            StateQueryError::UnknownBlendingDstFactorRGB(ref k) => {
                write!(f, "unknown blending destination factor (RGB): {}", k)
            }

            StateQueryError::UnknownBlendingDstFactorAlpha(ref k) => {
                write!(f, "unknown blending destination factor (alpha): {}", k)
            }
        }
    }
}

impl std::error::Error for StateQueryError {}

fn get_ctx_viewport(ctx: &glow::Context) -> Result<[i32; 4], StateQueryError> {
    let mut viewport = [0; 4];

    unsafe { ctx.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport) };

    if viewport[2] < 0 || viewport[3] < 0 {
        return Err(StateQueryError::UnknownViewportInitialState);
    }

    Ok(viewport)
}

fn get_ctx_clear_color(ctx: &glow::Context) -> Result<[f32; 4], StateQueryError> {
    let mut color = [0.0; 4];

    unsafe { ctx.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut color) };

    if color.iter().any(|c| c.is_nan()) {
        return Err(StateQueryError::UnknownClearColorInitialState);
    }

    Ok(color)
}

fn get_ctx_texture_unit(ctx: &glow::Context) -> Result<u32, StateQueryError> {
    let active = unsafe { ctx.get_parameter_i32(glow::ACTIVE_TEXTURE) } as u32;
    texture_unit_from_gl(active)
}

#[inline]
fn texture_unit_from_gl(active: u32) -> Result<u32, StateQueryError> {
    active
        .checked_sub(glow::TEXTURE0)
        .ok_or(StateQueryError::UnknownActiveTextureUnit(active))
}

fn get_ctx_blending_state(ctx: &glow::Context) -> BlendingState {
    unsafe {
        if ctx.is_enabled(glow::BLEND) {
            BlendingState::On
        } else {
            BlendingState::Off
        }
    }
}

fn get_ctx_blending_factors(ctx: &glow::Context) -> Result<BlendingFactors, StateQueryError> {
    unsafe {
        let src_rgb = ctx.get_parameter_i32(glow::BLEND_SRC_RGB) as u32;
        let src_rgb = from_gl_blending_factor(src_rgb)
            .map_err(StateQueryError::UnknownBlendingSrcFactorRGB)?;

        let src_alpha = ctx.get_parameter_i32(glow::BLEND_SRC_ALPHA) as u32;
        let src_alpha = from_gl_blending_factor(src_alpha)
            .map_err(StateQueryError::UnknownBlendingSrcFactorAlpha)?;

        let dst_rgb = ctx.get_parameter_i32(glow::BLEND_DST_RGB) as u32;
        let dst_rgb = from_gl_blending_factor(dst_rgb)
            .map_err(StateQueryError::UnknownBlendingDstFactorRGB)?;

        let dst_alpha = ctx.get_parameter_i32(glow::BLEND_DST_ALPHA) as u32;
        let dst_alpha = from_gl_blending_factor(dst_alpha)
            .map_err(StateQueryError::UnknownBlendingDstFactorAlpha)?;

        Ok(BlendingFactors {
            src_rgb,
            dst_rgb,
            src_alpha,
            dst_alpha,
        })
    }
}

#[inline]
fn from_gl_blending_factor(factor: u32) -> Result<Factor, u32> {
    match factor {
        glow::ONE => Ok(Factor::One),
        glow::ZERO => Ok(Factor::Zero),
        glow::SRC_COLOR => Ok(Factor::SrcColor),
        glow::ONE_MINUS_SRC_COLOR => Ok(Factor::SrcColorComplement),
        glow::DST_COLOR => Ok(Factor::DestColor),
        glow::ONE_MINUS_DST_COLOR => Ok(Factor::DestColorComplement),
        glow::SRC_ALPHA => Ok(Factor::SrcAlpha),
        glow::ONE_MINUS_SRC_ALPHA => Ok(Factor::SrcAlphaComplement),
        glow::DST_ALPHA => Ok(Factor::DstAlpha),
        glow::ONE_MINUS_DST_ALPHA => Ok(Factor::DstAlphaComplement),
        glow::SRC_ALPHA_SATURATE => Ok(Factor::SrcAlphaSaturate),
        _ => Err(factor),
    }
}

#[inline]
fn blending_factor_to_glow(factor: Factor) -> u32 {
    match factor {
        Factor::One => glow::ONE,
        Factor::Zero => glow::ZERO,
        Factor::SrcColor => glow::SRC_COLOR,
        Factor::SrcColorComplement => glow::ONE_MINUS_SRC_COLOR,
        Factor::DestColor => glow::DST_COLOR,
        Factor::DestColorComplement => glow::ONE_MINUS_DST_COLOR,
        Factor::SrcAlpha => glow::SRC_ALPHA,
        Factor::SrcAlphaComplement => glow::ONE_MINUS_SRC_ALPHA,
        Factor::DstAlpha => glow::DST_ALPHA,
        Factor::DstAlphaComplement => glow::ONE_MINUS_DST_ALPHA,
        Factor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
    }
}

/// Should the binding be cached or forced to the provided value?
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Bind {
    Forced,
    Cached,
}

/// Whether or not enable blending.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlendingState {
    /// Enable blending.
    On,
    /// Disable blending.
    Off,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct BlendingFactors {
    src_rgb: Factor,
    dst_rgb: Factor,
    src_alpha: Factor,
    dst_alpha: Factor,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORS: [Factor; 11] = [
        Factor::One,
        Factor::Zero,
        Factor::SrcColor,
        Factor::SrcColorComplement,
        Factor::DestColor,
        Factor::DestColorComplement,
        Factor::SrcAlpha,
        Factor::SrcAlphaComplement,
        Factor::DstAlpha,
        Factor::DstAlphaComplement,
        Factor::SrcAlphaSaturate,
    ];

    #[test]
    fn blending_factors_map_back_from_gl_enums() {
        for factor in FACTORS.iter().copied() {
            let gl = blending_factor_to_glow(factor);
            assert_eq!(from_gl_blending_factor(gl), Ok(factor));
        }
    }

    #[test]
    fn active_texture_unit_is_read_back_from_gl_enum() {
        assert_eq!(texture_unit_from_gl(glow::TEXTURE0).ok(), Some(0));
        assert_eq!(texture_unit_from_gl(glow::TEXTURE0 + 10).ok(), Some(10));
    }

    #[test]
    fn active_texture_below_texture0_is_rejected() {
        match texture_unit_from_gl(glow::TEXTURE_2D) {
            Err(StateQueryError::UnknownActiveTextureUnit(k)) => assert_eq!(k, glow::TEXTURE_2D),
            other => panic!("unexpected texture unit: {:?}", other),
        }
    }

    #[test]
    fn missing_context_is_reported_as_unsupported() {
        assert_eq!(
            StateQueryError::UnavailableGlState.to_string(),
            "WebGL 2 is not supported"
        );
    }

    #[test]
    fn unknown_blending_factor_is_returned_as_is() {
        assert_eq!(from_gl_blending_factor(0xDEAD), Err(0xDEAD));
    }

    #[test]
    fn alpha_blending_uses_standard_gl_enums() {
        assert_eq!(blending_factor_to_glow(Factor::SrcAlpha), glow::SRC_ALPHA);
        assert_eq!(
            blending_factor_to_glow(Factor::SrcAlphaComplement),
            glow::ONE_MINUS_SRC_ALPHA
        );
    }

    #[test]
    fn state_query_error_mentions_offending_enum() {
        let msg = StateQueryError::UnknownBlendingDstFactorAlpha(1234).to_string();
        assert!(msg.contains("1234"), "missing enum value in: {msg}");
        assert!(msg.contains("alpha"), "missing channel in: {msg}");
    }
}

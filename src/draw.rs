//! Draw calls.
//!
//! Primitives are named with luminance’s [`Mode`]. Drawing uses whatever program, vertex array
//! and textures are currently bound.

use glow::HasContext;
use luminance::tess::Mode;
use thiserror::Error;

use crate::Gpu;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum DrawError {
    #[error("unsupported primitive mode: {0:?}")]
    UnsupportedMode(Mode),
}

/// Type of the indices stored in an element buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub fn size(self) -> usize {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }

    fn to_glow(self) -> u32 {
        match self {
            IndexType::U8 => glow::UNSIGNED_BYTE,
            IndexType::U16 => glow::UNSIGNED_SHORT,
            IndexType::U32 => glow::UNSIGNED_INT,
        }
    }
}

/// Draw `count` vertices starting at `first` from the enabled arrays.
pub fn draw_arrays(gpu: &Gpu, mode: Mode, first: i32, count: i32) -> Result<(), DrawError> {
    let mode = glow_mode(mode).ok_or(DrawError::UnsupportedMode(mode))?;

    unsafe {
        gpu.state.borrow().ctx.draw_arrays(mode, first, count);
    }

    Ok(())
}

/// Draw `count` indices read from the bound element buffer, starting at index number `first`.
pub fn draw_elements(
    gpu: &Gpu,
    mode: Mode,
    count: i32,
    ty: IndexType,
    first: usize,
) -> Result<(), DrawError> {
    let mode = glow_mode(mode).ok_or(DrawError::UnsupportedMode(mode))?;

    unsafe {
        gpu.state.borrow().ctx.draw_elements(
            mode,
            count,
            ty.to_glow(),
            (first * ty.size()) as i32,
        );
    }

    Ok(())
}

fn glow_mode(mode: Mode) -> Option<u32> {
    match mode {
        Mode::Point => Some(glow::POINTS),
        Mode::Line => Some(glow::LINES),
        Mode::LineStrip => Some(glow::LINE_STRIP),
        Mode::Triangle => Some(glow::TRIANGLES),
        Mode::TriangleFan => Some(glow::TRIANGLE_FAN),
        Mode::TriangleStrip => Some(glow::TRIANGLE_STRIP),
        Mode::Patch(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_map_to_gl_primitives() {
        assert_eq!(glow_mode(Mode::Point), Some(glow::POINTS));
        assert_eq!(glow_mode(Mode::Triangle), Some(glow::TRIANGLES));
        assert_eq!(glow_mode(Mode::TriangleFan), Some(glow::TRIANGLE_FAN));
        assert_eq!(glow_mode(Mode::TriangleStrip), Some(glow::TRIANGLE_STRIP));
    }

    #[test]
    fn patches_are_not_drawable() {
        assert_eq!(glow_mode(Mode::Patch(3)), None);
    }

    #[test]
    fn index_sizes() {
        assert_eq!(IndexType::U8.size(), 1);
        assert_eq!(IndexType::U16.size(), 2);
        assert_eq!(IndexType::U32.size(), 4);
        assert_eq!(IndexType::U8.to_glow(), glow::UNSIGNED_BYTE);
    }
}

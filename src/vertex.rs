//! Vertex input: vertex arrays, attribute pointers and constant attributes.
//!
//! Attribute locations are fixed in the shaders with `layout(location = N)`, so nothing here
//! queries the program. A [`VertexLayout`] computes offsets and stride for interleaved data the
//! same way a `#[repr(C)]` struct would be laid out.

use glow::HasContext;
use luminance::vertex::Normalized;
use std::cell::RefCell;
use std::rc::Rc;

use crate::buffer::{Buffer, BufferError};
use crate::state::{Bind, GlState};
use crate::Gpu;

/// Scalar type of an attribute component, as stored in the buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttribType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl AttribType {
    /// Size in bytes of one component.
    pub fn size(self) -> usize {
        match self {
            AttribType::I8 | AttribType::U8 => 1,
            AttribType::I16 | AttribType::U16 => 2,
            AttribType::I32 | AttribType::U32 | AttribType::F32 => 4,
        }
    }

    fn to_glow(self) -> u32 {
        match self {
            AttribType::I8 => glow::BYTE,
            AttribType::U8 => glow::UNSIGNED_BYTE,
            AttribType::I16 => glow::SHORT,
            AttribType::U16 => glow::UNSIGNED_SHORT,
            AttribType::I32 => glow::INT,
            AttribType::U32 => glow::UNSIGNED_INT,
            AttribType::F32 => glow::FLOAT,
        }
    }
}

/// Where and how a float attribute reads its data from the bound array buffer.
///
/// Integer components are converted to float by the GPU; with [`Normalized::Yes`], signed
/// values map to `[-1, 1]` and unsigned ones to `[0, 1]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VertexAttrib {
    pub location: u32,
    pub components: i32,
    pub ty: AttribType,
    pub normalized: Normalized,
    pub stride: i32,
    pub offset: i32,
}

impl VertexAttrib {
    /// A tightly packed attribute with no normalization.
    pub fn new(location: u32, components: i32, ty: AttribType) -> Self {
        VertexAttrib {
            location,
            components,
            ty,
            normalized: Normalized::No,
            stride: components * ty.size() as i32,
            offset: 0,
        }
    }

    pub fn normalized(self) -> Self {
        VertexAttrib {
            normalized: Normalized::Yes,
            ..self
        }
    }

    pub fn stride(self, stride: i32) -> Self {
        VertexAttrib { stride, ..self }
    }

    pub fn offset(self, offset: i32) -> Self {
        VertexAttrib { offset, ..self }
    }

    /// Weight in bytes of the attribute within a vertex.
    fn weight(&self) -> usize {
        self.components as usize * self.ty.size()
    }
}

/// Interleaved attributes of a single buffer, in memory order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexLayout {
    attribs: Vec<(u32, i32, AttribType, Normalized)>,
}

impl VertexLayout {
    pub fn new() -> Self {
        VertexLayout::default()
    }

    pub fn attrib(mut self, location: u32, components: i32, ty: AttribType) -> Self {
        self.attribs.push((location, components, ty, Normalized::No));
        self
    }

    pub fn normalized_attrib(mut self, location: u32, components: i32, ty: AttribType) -> Self {
        self.attribs.push((location, components, ty, Normalized::Yes));
        self
    }

    /// Resolve offsets and stride.
    pub fn build(&self) -> Vec<VertexAttrib> {
        let offsets = aligned_offsets(&self.attribs);
        let stride = vertex_weight(&self.attribs, &offsets) as i32;

        self.attribs
            .iter()
            .zip(offsets)
            .map(|(&(location, components, ty, normalized), offset)| VertexAttrib {
                location,
                components,
                ty,
                normalized,
                stride,
                offset: offset as i32,
            })
            .collect()
    }
}

/// Compute offsets for all the vertex components, keeping each one aligned on its scalar size.
fn aligned_offsets(attribs: &[(u32, i32, AttribType, Normalized)]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(attribs.len());
    let mut off = 0;

    for &(_, components, ty, _) in attribs {
        off = off_align(off, ty.size());
        offsets.push(off);
        off += components as usize * ty.size();
    }

    offsets
}

/// Align an offset.
#[inline]
fn off_align(off: usize, align: usize) -> usize {
    let a = align - 1;
    (off + a) & !a
}

/// Weight in bytes of a single vertex, padded so that consecutive vertices stay aligned.
fn vertex_weight(attribs: &[(u32, i32, AttribType, Normalized)], offsets: &[usize]) -> usize {
    match (attribs.last(), offsets.last()) {
        (Some(&(_, components, ty, _)), Some(&off)) => {
            let align = attribs.iter().map(|a| a.2.size()).max().unwrap_or(1);
            off_align(off + components as usize * ty.size(), align)
        }

        _ => 0,
    }
}

/// A constant value fed to an attribute whose array is disabled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constant {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

/// Set the value an attribute takes when its array is disabled.
///
/// Constant attribute values are context state, not vertex array state.
pub fn set_constant(gpu: &Gpu, location: u32, value: Constant) {
    let state = gpu.state.borrow();

    unsafe {
        match value {
            Constant::Float(x) => state.ctx.vertex_attrib_1_f32(location, x),
            Constant::Vec2([x, y]) => state.ctx.vertex_attrib_2_f32(location, x, y),
            Constant::Vec3([x, y, z]) => state.ctx.vertex_attrib_3_f32(location, x, y, z),
            Constant::Vec4([x, y, z, w]) => state.ctx.vertex_attrib_4_f32(location, x, y, z, w),
        }
    }
}

/// A vertex array object.
///
/// WebGL 2 provides a default vertex array but core OpenGL does not, so every lesson creates its
/// own and keeps it bound.
#[derive(Debug)]
pub struct VertexArray {
    handle: glow::VertexArray,
    state: Rc<RefCell<GlState>>,
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.unbind_vertex_array(self.handle);

        unsafe {
            state.ctx.delete_vertex_array(self.handle);
        }
    }
}

impl VertexArray {
    pub fn new(gpu: &Gpu) -> Result<Self, BufferError> {
        let handle = gpu
            .state
            .borrow_mut()
            .create_vertex_array()
            .map_err(BufferError::Creation)?;

        // a fresh name may reuse the one of a deleted array
        gpu.state
            .borrow_mut()
            .bind_vertex_array(Some(handle), Bind::Forced);

        let vao = VertexArray {
            handle,
            state: gpu.state.clone(),
        };

        Ok(vao)
    }

    pub fn bind(&self) {
        self.state
            .borrow_mut()
            .bind_vertex_array(Some(self.handle), Bind::Cached);
    }

    /// Point an attribute at `buffer` and enable its array.
    pub fn attrib_pointer(&self, buffer: &Buffer, attrib: &VertexAttrib) {
        self.bind();
        buffer.bind();
        set_attrib_pointer(&self.state.borrow().ctx, attrib);
        self.enable(attrib.location);
    }

    /// Point several interleaved attributes at the same buffer.
    pub fn attrib_pointers(&self, buffer: &Buffer, attribs: &[VertexAttrib]) {
        for attrib in attribs {
            self.attrib_pointer(buffer, attrib);
        }
    }

    /// Attach an index buffer.
    pub fn index_buffer(&self, buffer: &Buffer) {
        self.bind();
        buffer.bind();
    }

    pub fn enable(&self, location: u32) {
        self.bind();

        unsafe {
            self.state
                .borrow()
                .ctx
                .enable_vertex_attrib_array(location);
        }
    }

    pub fn disable(&self, location: u32) {
        self.bind();

        unsafe {
            self.state
                .borrow()
                .ctx
                .disable_vertex_attrib_array(location);
        }
    }
}

fn set_attrib_pointer(ctx: &glow::Context, attrib: &VertexAttrib) {
    let normalized = match attrib.normalized {
        Normalized::Yes => true,
        Normalized::No => false,
    };

    unsafe {
        ctx.vertex_attrib_pointer_f32(
            attrib.location,
            attrib.components,
            attrib.ty.to_glow(),
            normalized,
            attrib.stride,
            attrib.offset,
        );
    }
}

/// Encode a float in `[-1, 1)` as a normalized signed 16-bit integer.
pub fn to_normalized_i16(v: f32) -> i16 {
    (v * (1 << 15) as f32).floor() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tightly_packed_attribute_stride_is_its_weight() {
        let attrib = VertexAttrib::new(0, 2, AttribType::F32);
        assert_eq!(attrib.stride, 8);
        assert_eq!(attrib.offset, 0);
        assert_eq!(attrib.weight(), 8);
        assert_eq!(attrib.normalized, Normalized::No);
    }

    #[test]
    fn builder_overrides_stride_offset_and_normalization() {
        let attrib = VertexAttrib::new(2, 3, AttribType::U8)
            .normalized()
            .stride(8)
            .offset(5);

        assert_eq!(attrib.stride, 8);
        assert_eq!(attrib.offset, 5);
        assert_eq!(attrib.normalized, Normalized::Yes);
    }

    #[test]
    fn float_layout_matches_coords_size_color() {
        let attribs = VertexLayout::new()
            .attrib(0, 2, AttribType::F32)
            .attrib(1, 1, AttribType::F32)
            .attrib(2, 3, AttribType::F32)
            .build();

        let offsets: Vec<i32> = attribs.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 8, 12]);
        assert!(attribs.iter().all(|a| a.stride == 24));
    }

    #[test]
    fn packed_integer_layout_is_eight_bytes() {
        let attribs = VertexLayout::new()
            .normalized_attrib(0, 2, AttribType::I16)
            .attrib(1, 1, AttribType::U8)
            .normalized_attrib(2, 3, AttribType::U8)
            .build();

        let offsets: Vec<i32> = attribs.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 4, 5]);
        assert!(attribs.iter().all(|a| a.stride == 8));
        assert_eq!(attribs[0].normalized, Normalized::Yes);
        assert_eq!(attribs[1].normalized, Normalized::No);
    }

    #[test]
    fn misaligned_component_gets_padded() {
        let attribs = VertexLayout::new()
            .attrib(0, 1, AttribType::U8)
            .attrib(1, 1, AttribType::F32)
            .build();

        assert_eq!(attribs[1].offset, 4);
        assert_eq!(attribs[1].stride, 8);
    }

    #[test]
    fn empty_layout_has_no_attributes() {
        assert!(VertexLayout::new().build().is_empty());
    }

    #[test]
    fn normalized_i16_uses_floor_of_two_to_the_fifteen() {
        assert_eq!(to_normalized_i16(0.0), 0);
        assert_eq!(to_normalized_i16(0.5), 16384);
        assert_eq!(to_normalized_i16(-0.21), -6882);
        assert_eq!(to_normalized_i16(-1.0), i16::MIN);
    }

    #[test]
    fn attrib_types_map_to_gl_enums() {
        assert_eq!(AttribType::I8.to_glow(), glow::BYTE);
        assert_eq!(AttribType::I16.to_glow(), glow::SHORT);
        assert_eq!(AttribType::U8.to_glow(), glow::UNSIGNED_BYTE);
        assert_eq!(AttribType::F32.to_glow(), glow::FLOAT);
    }
}

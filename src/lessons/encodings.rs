//! Constant attributes and integer vertex encodings.

use luminance::tess::Mode;

use super::{FrameTime, Lesson, LessonId};
use crate::buffer::{Buffer, BufferKind, Usage};
use crate::draw::draw_arrays;
use crate::error::LessonError;
use crate::shader::Program;
use crate::vertex::{
    set_constant, to_normalized_i16, AttribType, Constant, VertexArray, VertexAttrib, VertexLayout,
};
use crate::Gpu;

const COORDS: u32 = 0;
const POINT_SIZE: u32 = 1;
const COLOR: u32 = 2;

const POINT_VS: &str = r"#version 300 es
layout(location = 0) in mediump vec2 aCoords;
layout(location = 1) in mediump float aPointSize;
layout(location = 2) in mediump vec3 aColor;
out vec3 vColor;
void main()
{
  gl_Position = vec4(aCoords, 0.0, 1.0);
  gl_PointSize = aPointSize;
  vColor = aColor;
}";

const POINT_FS: &str = r"#version 300 es
in mediump vec3 vColor;
out mediump vec4 fragColor;
void main()
{
  fragColor = vec4(vColor, 1);
}";

const RGBA_POINT_VS: &str = r"#version 300 es
layout(location = 0) in mediump vec2 aCoords;
layout(location = 1) in mediump float aPointSize;
layout(location = 2) in mediump vec3 aColor;
out vec4 vColor;
void main()
{
  gl_Position = vec4(aCoords, 0.0, 1.0);
  gl_PointSize = aPointSize;
  vColor = vec4(aColor, 1.0);
}";

const RGBA_POINT_FS: &str = r"#version 300 es
in mediump vec4 vColor;
out mediump vec4 fragColor;
void main()
{
  fragColor = vColor;
}";

/// Points of the normalized encoding lessons: `(x, y)`, size in pixels and 8-bit color.
const POINTS: [([f32; 2], u8, [u8; 3]); 5] = [
    // dark green
    ([-0.21, -0.41], 10, [0, 100, 0]),
    // yellow green
    ([-0.26, 0.24], 20, [154, 205, 50]),
    // olive drab
    ([0.49, -0.51], 30, [107, 142, 35]),
    // olive
    ([0.54, 0.34], 40, [128, 128, 0]),
    // dark olive green
    ([0.09, -0.11], 50, [85, 107, 47]),
];

/// The default value of every attribute, set once, with no buffer at all.
fn set_default_point(gpu: &Gpu, size: f32) {
    set_constant(gpu, COORDS, Constant::Vec2([0.2, -0.5]));
    set_constant(gpu, POINT_SIZE, Constant::Float(size));
    set_constant(gpu, COLOR, Constant::Vec3([1., 0., 1.]));
}

/// A single point fed only by constant attribute values.
pub struct ConstantAttributes {
    program: Program,
    _vao: VertexArray,
}

impl ConstantAttributes {
    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, POINT_VS, POINT_FS)?;
        let vao = VertexArray::new(gpu)?;
        set_default_point(gpu, 30.);

        Ok(ConstantAttributes { program, _vao: vao })
    }
}

impl Lesson for ConstantAttributes {
    fn id(&self) -> LessonId {
        LessonId::ConstantAttributes
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        self.program.bind();
        draw_arrays(gpu, Mode::Point, 0, 1)?;
        Ok(())
    }
}

/// Five points with one tightly packed buffer per attribute: normalized `i16` coordinates,
/// `u8` sizes and normalized `u8` colors.
pub struct NormalizedBuffers {
    program: Program,
    _vao: VertexArray,
    _buffers: [Buffer; 3],
}

impl NormalizedBuffers {
    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, RGBA_POINT_VS, RGBA_POINT_FS)?;
        let vao = VertexArray::new(gpu)?;

        // shadowed by the arrays below
        set_default_point(gpu, 50.);

        let coords: Vec<i16> = POINTS
            .iter()
            .flat_map(|(xy, _, _)| xy.map(to_normalized_i16))
            .collect();
        let sizes: Vec<u8> = POINTS.iter().map(|(_, size, _)| *size).collect();
        let colors: Vec<u8> = POINTS.iter().flat_map(|(_, _, rgb)| *rgb).collect();

        let coords = Buffer::from_slice(gpu, BufferKind::Vertex, &coords, Usage::StaticDraw)?;
        vao.attrib_pointer(&coords, &VertexAttrib::new(COORDS, 2, AttribType::I16).normalized());

        let sizes = Buffer::from_slice(gpu, BufferKind::Vertex, &sizes, Usage::StaticDraw)?;
        vao.attrib_pointer(&sizes, &VertexAttrib::new(POINT_SIZE, 1, AttribType::U8));

        let colors = Buffer::from_slice(gpu, BufferKind::Vertex, &colors, Usage::StaticDraw)?;
        vao.attrib_pointer(&colors, &VertexAttrib::new(COLOR, 3, AttribType::U8).normalized());

        Ok(NormalizedBuffers {
            program,
            _vao: vao,
            _buffers: [coords, sizes, colors],
        })
    }
}

impl Lesson for NormalizedBuffers {
    fn id(&self) -> LessonId {
        LessonId::NormalizedBuffers
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        self.program.bind();
        draw_arrays(gpu, Mode::Point, 0, POINTS.len() as i32)?;
        Ok(())
    }
}

/// Bytes of one packed vertex: little endian `i16` x and y, then the size and the color.
pub fn pack_vertex(coords: [f32; 2], size: u8, rgb: [u8; 3]) -> [u8; 8] {
    let [x, y] = coords.map(|v| to_normalized_i16(v).to_le_bytes());
    [x[0], x[1], y[0], y[1], size, rgb[0], rgb[1], rgb[2]]
}

/// The same five points as [`NormalizedBuffers`], interleaved in a single 8-byte-stride buffer.
pub struct PackedVertices {
    program: Program,
    _vao: VertexArray,
    _vertices: Buffer,
}

impl PackedVertices {
    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, POINT_VS, POINT_FS)?;
        let vao = VertexArray::new(gpu)?;
        set_default_point(gpu, 30.);

        let bytes: Vec<u8> = POINTS
            .iter()
            .flat_map(|&(xy, size, rgb)| pack_vertex(xy, size, rgb))
            .collect();

        let mut vertices = Buffer::new(gpu, BufferKind::Vertex)?;
        vertices.upload_bytes(&bytes, Usage::StaticDraw);

        let layout = VertexLayout::new()
            .normalized_attrib(COORDS, 2, AttribType::I16)
            .attrib(POINT_SIZE, 1, AttribType::U8)
            .normalized_attrib(COLOR, 3, AttribType::U8)
            .build();
        vao.attrib_pointers(&vertices, &layout);

        Ok(PackedVertices {
            program,
            _vao: vao,
            _vertices: vertices,
        })
    }
}

impl Lesson for PackedVertices {
    fn id(&self) -> LessonId {
        LessonId::PackedVertices
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        self.program.bind();
        draw_arrays(gpu, Mode::Point, 0, POINTS.len() as i32)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_vertex_is_little_endian() {
        // -0.21 → -6882 = 0xE51E, -0.41 → -13435 = 0xCB85
        assert_eq!(
            pack_vertex([-0.21, -0.41], 10, [0, 100, 0]),
            [0x1E, 0xE5, 0x85, 0xCB, 10, 0, 100, 0]
        );
    }

    #[test]
    fn packed_buffer_has_an_eight_byte_stride() {
        let bytes: Vec<u8> = POINTS
            .iter()
            .flat_map(|&(xy, size, rgb)| pack_vertex(xy, size, rgb))
            .collect();

        assert_eq!(bytes.len(), 40);
        assert_eq!(bytes[8 + 4], 20);
        assert_eq!(&bytes[8 * 4 + 5..], &[85, 107, 47]);
    }
}

//! A pentagon drawn from plain arrays, then from an element array.

use luminance::tess::Mode;

use super::{FrameTime, Lesson, LessonId};
use crate::buffer::{Buffer, BufferKind, Usage};
use crate::draw::{draw_arrays, draw_elements, IndexType};
use crate::error::LessonError;
use crate::shader::Program;
use crate::vertex::{set_constant, AttribType, Constant, VertexArray, VertexAttrib, VertexLayout};
use crate::Gpu;

const VS: &str = r"#version 300 es
layout(location = 0) in mediump vec2 aCoords;
layout(location = 1) in mediump vec3 aColor;

out mediump vec3 vColor;

void main()
{
  gl_Position = vec4(aCoords, 0, 1);
  gl_PointSize = 30.0;
  vColor = aColor;
}";

const FS: &str = r"#version 300 es
in mediump vec3 vColor;
out mediump vec4 fColor;
void main()
{
  fColor = vec4(vColor, 1);
}";

fn pentagon_program(gpu: &Gpu) -> Result<(Program, VertexArray), LessonError> {
    let program = Program::from_sources(gpu, VS, FS)?;
    let vao = VertexArray::new(gpu)?;

    set_constant(gpu, 0, Constant::Vec2([0.5, 0.5]));
    set_constant(gpu, 1, Constant::Vec3([1., 0., 1.]));

    Ok((program, vao))
}

/// Five triangles, fifteen vertices; only the positions come from a buffer, so the color is
/// the constant magenta.
pub struct PentagonArrays {
    program: Program,
    _vao: VertexArray,
    _vertices: Buffer,
}

impl PentagonArrays {
    #[rustfmt::skip]
    const VERTICES: [f32; 30] = [
        0., 0.,    0.,    0.4,     0.4,   0.05,
        0., 0.,    0.4,   0.05,    0.25, -0.35,
        0., 0.,    0.25, -0.35,   -0.25, -0.35,
        0., 0.,   -0.25, -0.35,   -0.4,   0.05,
        0., 0.,   -0.4,   0.05,    0.,    0.4,
    ];

    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let (program, vao) = pentagon_program(gpu)?;
        let vertices =
            Buffer::from_slice(gpu, BufferKind::Vertex, &Self::VERTICES, Usage::StaticDraw)?;
        vao.attrib_pointer(&vertices, &VertexAttrib::new(0, 2, AttribType::F32));

        Ok(PentagonArrays {
            program,
            _vao: vao,
            _vertices: vertices,
        })
    }
}

impl Lesson for PentagonArrays {
    fn id(&self) -> LessonId {
        LessonId::PentagonArrays
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        self.program.bind();
        draw_arrays(gpu, Mode::Triangle, 0, (Self::VERTICES.len() / 2) as i32)?;
        Ok(())
    }
}

/// The same pentagon from six colored vertices and fifteen byte indices.
pub struct IndexedPentagon {
    program: Program,
    _vao: VertexArray,
    _vertices: Buffer,
    _indices: Buffer,
}

impl IndexedPentagon {
    #[rustfmt::skip]
    const VERTICES: [f32; 30] = [
        0.,     0.,     0., 0., 0.,
        0.,     0.4,    1., 0., 0.,
        0.4,    0.05,   0., 1., 0.,
        0.25,  -0.35,   0., 0., 1.,
        -0.25, -0.35,   1., 1., 0.,
        -0.4,   0.05,   1., 0., 1.,
    ];

    #[rustfmt::skip]
    const INDICES: [u8; 15] = [
        0, 1, 2,
        0, 2, 3,
        0, 3, 4,
        0, 4, 5,
        0, 5, 1,
    ];

    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let (program, vao) = pentagon_program(gpu)?;
        let vertices =
            Buffer::from_slice(gpu, BufferKind::Vertex, &Self::VERTICES, Usage::StaticDraw)?;
        let indices =
            Buffer::from_slice(gpu, BufferKind::Index, &Self::INDICES, Usage::StaticDraw)?;

        let layout = VertexLayout::new()
            .attrib(0, 2, AttribType::F32)
            .attrib(1, 3, AttribType::F32)
            .build();
        vao.attrib_pointers(&vertices, &layout);
        vao.index_buffer(&indices);

        Ok(IndexedPentagon {
            program,
            _vao: vao,
            _vertices: vertices,
            _indices: indices,
        })
    }
}

impl Lesson for IndexedPentagon {
    fn id(&self) -> LessonId {
        LessonId::IndexedPentagon
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        self.program.bind();
        draw_elements(gpu, Mode::Triangle, Self::INDICES.len() as i32, IndexType::U8, 0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_form_a_fan_around_the_centre() {
        for triangle in IndexedPentagon::INDICES.chunks(3) {
            assert_eq!(triangle[0], 0);
            assert!(triangle.iter().all(|&i| (i as usize) < IndexedPentagon::VERTICES.len() / 5));
        }
    }

    #[test]
    fn array_triangles_all_start_at_the_centre() {
        for triangle in PentagonArrays::VERTICES.chunks(6) {
            assert_eq!(&triangle[..2], &[0., 0.]);
        }
    }
}

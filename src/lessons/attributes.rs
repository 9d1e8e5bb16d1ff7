//! Vertex attributes read from interleaved float buffers.

use luminance::tess::Mode;

use super::{FrameTime, Lesson, LessonId};
use crate::buffer::{Buffer, BufferKind, Usage};
use crate::draw::draw_arrays;
use crate::error::LessonError;
use crate::geometry::{
    clock_hands, clock_vertices, random_squares, spinning_squares_vertices, SpinningSquare,
    COLORED_VERTEX_LEN,
};
use crate::prng::Xorshift64;
use crate::shader::Program;
use crate::vertex::{AttribType, VertexArray, VertexLayout};
use crate::Gpu;

const TRIANGLE_VS: &str = r"#version 300 es
layout(location = 0) in highp vec2 aCoords;
layout(location = 1) in mediump float aPointSize;
layout(location = 2) in mediump vec3 aColor;
out mediump vec3 vColor;
void main()
{
  gl_Position = vec4(aCoords, 0.0, 1.0);
  gl_PointSize = aPointSize;
  vColor = aColor;
}";

const TRIANGLE_FS: &str = r"#version 300 es
in mediump vec3 vColor;
out mediump vec4 fragColor;
void main()
{
  fragColor = vec4(vColor, 1.0);
}";

/// A triangle whose vertices carry `[x, y, size, r, g, b]` in a single buffer.
pub struct InterleavedTriangle {
    program: Program,
    _vao: VertexArray,
    _vertices: Buffer,
}

impl InterleavedTriangle {
    #[rustfmt::skip]
    const VERTICES: [f32; 18] = [
        0.,   -0.5,  40.,  1.,  0.5, 0.,
        -0.5,  0.5,  50.,  0.,  0.5, 1.,
        0.5,   0.5,  20.,  0.8, 0.,  0.8,
    ];

    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, TRIANGLE_VS, TRIANGLE_FS)?;
        let vao = VertexArray::new(gpu)?;
        let vertices =
            Buffer::from_slice(gpu, BufferKind::Vertex, &Self::VERTICES, Usage::StaticDraw)?;

        let layout = VertexLayout::new()
            .attrib(0, 2, AttribType::F32)
            .attrib(1, 1, AttribType::F32)
            .attrib(2, 3, AttribType::F32)
            .build();
        vao.attrib_pointers(&vertices, &layout);

        Ok(InterleavedTriangle {
            program,
            _vao: vao,
            _vertices: vertices,
        })
    }
}

impl Lesson for InterleavedTriangle {
    fn id(&self) -> LessonId {
        LessonId::InterleavedTriangle
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        self.program.bind();
        draw_arrays(gpu, Mode::Triangle, 0, 3)?;
        Ok(())
    }
}

const COLORED_VS: &str = r"#version 300 es
layout(location = 0) in highp vec2 aCoords;
layout(location = 1) in highp vec3 aColor;
out highp vec3 vColor;
void main()
{
  gl_Position = vec4(aCoords, 0.0, 1.0);
  vColor = aColor;
}";

const COLORED_FS: &str = r"#version 300 es
in highp vec3 vColor;
out highp vec4 fragColor;
void main()
{
  fragColor = vec4(vColor, 1.0);
}";

/// Program and buffer for `[r, g, b, x, y]` triangles rebuilt every frame.
struct ColoredTriangles {
    program: Program,
    vertices: Buffer,
    _vao: VertexArray,
}

impl ColoredTriangles {
    fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, COLORED_VS, COLORED_FS)?;
        let vao = VertexArray::new(gpu)?;
        let vertices = Buffer::new(gpu, BufferKind::Vertex)?;

        // color first, position second
        let layout = VertexLayout::new()
            .attrib(1, 3, AttribType::F32)
            .attrib(0, 2, AttribType::F32)
            .build();
        vao.attrib_pointers(&vertices, &layout);

        Ok(ColoredTriangles {
            program,
            vertices,
            _vao: vao,
        })
    }

    fn draw(&mut self, gpu: &Gpu, data: &[f32]) -> Result<(), LessonError> {
        self.vertices.upload(data, Usage::StreamDraw);
        self.program.bind();
        draw_arrays(gpu, Mode::Triangle, 0, (data.len() / COLORED_VERTEX_LEN) as i32)?;
        Ok(())
    }
}

/// Fifty squares spinning at speeds inversely proportional to their area.
pub struct SpinningSquares {
    triangles: ColoredTriangles,
    squares: Vec<SpinningSquare>,
}

impl SpinningSquares {
    const COUNT: usize = 50;

    pub fn new(gpu: &Gpu, seed: u64) -> Result<Self, LessonError> {
        Ok(SpinningSquares {
            triangles: ColoredTriangles::new(gpu)?,
            squares: random_squares(&mut Xorshift64::new(seed), Self::COUNT),
        })
    }
}

impl Lesson for SpinningSquares {
    fn id(&self) -> LessonId {
        LessonId::SpinningSquares
    }

    fn frame(&mut self, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError> {
        let data = spinning_squares_vertices(&self.squares, time.seconds_since_start());
        self.triangles.draw(gpu, &data)
    }
}

/// An analog clock showing the local time.
pub struct Clock {
    triangles: ColoredTriangles,
}

impl Clock {
    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        Ok(Clock {
            triangles: ColoredTriangles::new(gpu)?,
        })
    }
}

impl Lesson for Clock {
    fn id(&self) -> LessonId {
        LessonId::Clock
    }

    fn frame(&mut self, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError> {
        let clock = time.clock;
        let hands = clock_hands(clock.hours, clock.minutes, clock.seconds);
        self.triangles.draw(gpu, &clock_vertices(&hands))
    }
}

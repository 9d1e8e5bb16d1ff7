//! Points placed, sized and colored by uniforms alone.

use luminance::tess::Mode;

use super::{FrameTime, Lesson, LessonId};
use crate::draw::draw_arrays;
use crate::error::LessonError;
use crate::geometry::{random_bouncing_dots, random_orbiting_dots, BouncingDot};
use crate::prng::Xorshift64;
use crate::shader::{Program, Uniform};
use crate::vertex::VertexArray;
use crate::Gpu;

const DOT_COUNT: usize = 50;

const POINT_VS: &str = r"#version 300 es
uniform vec2 uCoords;
uniform float uSize;
void main()
{
  gl_Position = vec4(uCoords, 0.0, 1.0);
  gl_PointSize = uSize;
}";

const POINT_FS: &str = r"#version 300 es
precision mediump float;
uniform vec4 uColor;
out vec4 fragColor;
void main()
{
  fragColor = uColor;
}";

/// Shared program of the point lessons.
struct PointProgram {
    program: Program,
    coords: Uniform<[f32; 2]>,
    size: Uniform<f32>,
    color: Uniform<[f32; 4]>,
    _vao: VertexArray,
}

impl PointProgram {
    fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, POINT_VS, POINT_FS)?;
        let coords = program.uniform("uCoords");
        let size = program.uniform("uSize");
        let color = program.uniform("uColor");
        let vao = VertexArray::new(gpu)?;
        program.bind();

        Ok(PointProgram {
            program,
            coords,
            size,
            color,
            _vao: vao,
        })
    }

    fn draw(
        &self,
        gpu: &Gpu,
        coords: [f32; 2],
        size: f32,
        color: [f32; 4],
    ) -> Result<(), LessonError> {
        self.program.set(&self.coords, &coords);
        self.program.set(&self.size, &size);
        self.program.set(&self.color, &color);
        draw_arrays(gpu, Mode::Point, 0, 1)?;
        Ok(())
    }
}

/// Three points, one draw call each.
pub struct UniformPoints {
    points: PointProgram,
}

impl UniformPoints {
    const POINTS: [([f32; 2], f32, [f32; 4]); 3] = [
        ([0.4, 0.8], 20., [0., 0.9, 0.5, 0.2]),
        ([-0.8, -0.3], 40., [0.6, 0.2, 0.9, 0.5]),
        ([-0.3, 0.5], 30., [0.4, 1., 0.1, 0.8]),
    ];

    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        Ok(UniformPoints {
            points: PointProgram::new(gpu)?,
        })
    }
}

impl Lesson for UniformPoints {
    fn id(&self) -> LessonId {
        LessonId::UniformPoints
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        for (coords, size, color) in Self::POINTS {
            self.points.draw(gpu, coords, size, color)?;
        }

        Ok(())
    }
}

/// Random dots bouncing off the canvas edges; positions are computed on the CPU.
pub struct BouncingDots {
    points: PointProgram,
    dots: Vec<BouncingDot>,
}

impl BouncingDots {
    pub fn new(gpu: &Gpu, seed: u64) -> Result<Self, LessonError> {
        let dots = random_bouncing_dots(&mut Xorshift64::new(seed), DOT_COUNT);

        Ok(BouncingDots {
            points: PointProgram::new(gpu)?,
            dots,
        })
    }
}

impl Lesson for BouncingDots {
    fn id(&self) -> LessonId {
        LessonId::BouncingDots
    }

    fn frame(&mut self, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError> {
        let seconds = time.seconds_since_start();

        for dot in &self.dots {
            self.points.draw(gpu, dot.coords(seconds), dot.size, dot.color)?;
        }

        Ok(())
    }
}

const ORBIT_VS: &str = r"#version 300 es
uniform highp int uIndex;
uniform mediump float uSecondsSinceStart;
uniform mediump float uSpeed[50];
uniform mediump float uRadius[50];
uniform mediump float uSize[50];
void main()
{
  float angle = uSecondsSinceStart * uSpeed[uIndex];
  vec2 coords = vec2(sin(angle), cos(angle)) * uRadius[uIndex];
  gl_Position = vec4(coords, 0.0, 1.0);
  gl_PointSize = uSize[uIndex];
}";

const ORBIT_FS: &str = r"#version 300 es
precision mediump float;
uniform highp int uIndex;
uniform vec4 uColor[50];
out vec4 fragColor;
void main()
{
  fragColor = uColor[uIndex];
}";

/// Dots circling the centre. Their parameters are uploaded once as uniform arrays; each draw
/// only selects a dot with `uIndex`.
pub struct OrbitingDots {
    program: Program,
    index: Uniform<i32>,
    seconds: Uniform<f32>,
    _vao: VertexArray,
}

impl OrbitingDots {
    pub fn new(gpu: &Gpu, seed: u64) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, ORBIT_VS, ORBIT_FS)?;
        let vao = VertexArray::new(gpu)?;
        let dots = random_orbiting_dots(&mut Xorshift64::new(seed), DOT_COUNT);

        let speeds: Vec<f32> = dots.iter().map(|d| d.speed).collect();
        let radii: Vec<f32> = dots.iter().map(|d| d.radius).collect();
        let sizes: Vec<f32> = dots.iter().map(|d| d.size).collect();
        let colors: Vec<[f32; 4]> = dots.iter().map(|d| d.color).collect();

        program.set(&program.uniform::<[f32]>("uSpeed"), speeds.as_slice());
        program.set(&program.uniform::<[f32]>("uRadius"), radii.as_slice());
        program.set(&program.uniform::<[f32]>("uSize"), sizes.as_slice());
        program.set(&program.uniform::<[[f32; 4]]>("uColor"), colors.as_slice());

        Ok(OrbitingDots {
            index: program.uniform("uIndex"),
            seconds: program.uniform("uSecondsSinceStart"),
            program,
            _vao: vao,
        })
    }
}

impl Lesson for OrbitingDots {
    fn id(&self) -> LessonId {
        LessonId::OrbitingDots
    }

    fn frame(&mut self, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError> {
        self.program.set(&self.seconds, &time.seconds_since_start());

        for i in 0..DOT_COUNT as i32 {
            self.program.set(&self.index, &i);
            draw_arrays(gpu, Mode::Point, 0, 1)?;
        }

        Ok(())
    }
}

//! Mipmaps and filters: a tilting plane, a field of billboards and a filter playground.

use luminance::blending::Factor;
use luminance::tess::Mode;
use luminance::texture::{MagFilter, MinFilter, Wrap};

use super::{FrameTime, Lesson, LessonId};
use crate::buffer::{Buffer, BufferKind, Usage};
use crate::draw::draw_arrays;
use crate::error::LessonError;
use crate::geometry::{inset_tex_coords, tex_coord_square, tilting_plane, CactusField};
use crate::math::{aspect_ratio, mvp};
use crate::pixel::{grid_image, solid_rgb, solid_rgba, Image, PixelFormat};
use crate::prng::Xorshift64;
use crate::settings::{LessonSettings, PlaneTexture};
use crate::shader::{Program, Uniform};
use crate::state::BlendingState;
use crate::texture::Texture;
use crate::vertex::{AttribType, VertexArray, VertexAttrib, VertexLayout};
use crate::Gpu;

fn set_mvp(gpu: &Gpu, program: &Program, uniform: &Uniform<glam::Mat4>) {
    let (width, height) = gpu.viewport_size();
    program.set(uniform, &mvp(aspect_ratio(width, height)));
}

const PLANE_VS: &str = r"#version 300 es
precision highp float;
layout(location = 1) in highp vec3 aSquareCoords;
layout(location = 2) in highp vec2 aTexCoords;
uniform mat4 uMVP;
out highp vec2 vTexCoords;
void main()
{
  gl_Position = uMVP * vec4(aSquareCoords, 1.0);
  vTexCoords = aTexCoords;
}";

const PLANE_FS: &str = r"#version 300 es
precision mediump float;
in highp vec2 vTexCoords;
uniform sampler2D uSampler;
out mediump vec4 fragColor;
void main()
{
  fragColor = texture(uSampler, vTexCoords);
}";

/// Solid colors replacing grid levels 1 to 5.
const GRID_LEVEL_COLORS: [[f32; 3]; 5] = [
    [0., 1., 1.],
    [0., 1., 0.],
    [1., 1., 0.],
    [1., 0.5, 0.],
    [1., 0., 0.],
];

/// Solid colors replacing lego levels 2 to 5.
const LEGO_LEVEL_COLORS: [[f32; 3]; 4] = [[0., 1., 0.], [1., 1., 0.], [1., 0.5, 0.], [1., 0., 0.]];

/// `(level, image)` pairs overwriting the generated levels of a square texture of side `size`,
/// starting at `first_level`.
fn colorful_levels(size: u32, first_level: i32, colors: &[[f32; 3]]) -> Vec<(i32, Image)> {
    colors
        .iter()
        .zip(first_level..)
        .map(|(&rgb, level)| (level, solid_rgb((size >> level).max(1), rgb)))
        .collect()
}

/// A square tilting around the X axis in perspective, textured with the grid or the lego picture.
pub struct MipmapPlane {
    program: Program,
    mvp: Uniform<glam::Mat4>,
    sampler: Uniform<i32>,
    plane: Buffer,
    tex_coords: Buffer,
    grid: (Texture, Image),
    lego: (Texture, Image),
    _vao: VertexArray,
}

impl MipmapPlane {
    const LEGO_UNIT: u32 = 4;
    const GRID_UNIT: u32 = 5;
    const GRID_REPEAT: f32 = 8.;

    pub fn new(gpu: &Gpu, settings: &LessonSettings, lego: &Image) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, PLANE_VS, PLANE_FS)?;
        let vao = VertexArray::new(gpu)?;

        let plane = Buffer::new(gpu, BufferKind::Vertex)?;
        vao.attrib_pointer(&plane, &VertexAttrib::new(1, 3, AttribType::F32));

        let tex_coords = Buffer::new(gpu, BufferKind::Vertex)?;
        vao.attrib_pointer(&tex_coords, &VertexAttrib::new(2, 2, AttribType::F32));

        let mut lesson = MipmapPlane {
            mvp: program.uniform("uMVP"),
            sampler: program.uniform("uSampler"),
            program,
            plane,
            tex_coords,
            grid: (Texture::new(gpu, Self::GRID_UNIT)?, grid_image()),
            lego: (Texture::new(gpu, Self::LEGO_UNIT)?, lego.clone()),
            _vao: vao,
        };
        lesson.apply_settings(gpu, settings)?;

        Ok(lesson)
    }
}

impl Lesson for MipmapPlane {
    fn id(&self) -> LessonId {
        LessonId::MipmapPlane
    }

    fn frame(&mut self, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError> {
        set_mvp(gpu, &self.program, &self.mvp);
        self.plane.upload(&tilting_plane(time.since_start_ms), Usage::StreamDraw);
        draw_arrays(gpu, Mode::Triangle, 0, 6)?;
        Ok(())
    }

    fn apply_settings(&mut self, _gpu: &Gpu, settings: &LessonSettings) -> Result<(), LessonError> {
        let ((texture, image), first_level, colors, repeat) = match settings.texture {
            PlaneTexture::Grid => (&self.grid, 1, &GRID_LEVEL_COLORS[..], Self::GRID_REPEAT),
            PlaneTexture::Lego => (&self.lego, 2, &LEGO_LEVEL_COLORS[..], 1.),
        };

        texture.upload_level(0, image)?;
        texture.generate_mipmap();

        if settings.colorful_levels {
            for (level, solid) in colorful_levels(image.width, first_level, colors) {
                texture.upload_level(level, &solid)?;
            }
        }

        texture.set_min_filter(settings.min_filter);
        self.program.set(&self.sampler, &(texture.unit() as i32));
        self.tex_coords.upload(&tex_coord_square(repeat), Usage::StaticDraw);

        Ok(())
    }
}

const FIELD_VS: &str = r"#version 300 es
layout(location = 0) in highp vec3 aShapeCoord;
layout(location = 1) in highp vec2 aTexCoord;
uniform mat4 uMVP;
out highp vec2 vTexCoord;
void main()
{
  gl_Position = uMVP * vec4(aShapeCoord, 1);
  vTexCoord = aTexCoord;
}";

const FIELD_FS: &str = r"#version 300 es
precision mediump float;
in highp vec2 vTexCoord;
uniform sampler2D uSampler;
out highp vec4 fragColor;
void main()
{
  fragColor = texture(uSampler, vTexCoord);
}";

/// RGBA colors of the hand-made levels, from the 128×128 base level down to 1×1.
const SOLID_LEVEL_COLORS: [[f32; 4]; 8] = [
    [0., 0., 1., 0.25],
    [0., 1., 1., 0.25],
    [0., 1., 0., 0.5],
    [1., 1., 0., 0.5],
    [1., 0.5, 0., 1.],
    [1., 0., 0., 1.],
    [0., 0., 0., 1.],
    [0., 0., 0., 1.],
];

/// Every level of the colored billboard texture, `(level, image)`.
fn solid_levels() -> impl Iterator<Item = (i32, Image)> {
    SOLID_LEVEL_COLORS
        .iter()
        .zip(0..)
        .map(|(&rgba, level)| (level, solid_rgba(128 >> level, rgba)))
}

/// Billboards rushing toward the camera, alpha-blended over each other.
pub struct CactusFieldLesson {
    program: Program,
    mvp: Uniform<glam::Mat4>,
    sampler: Uniform<i32>,
    vertices: Buffer,
    field: CactusField,
    speed: f32,
    solid: Texture,
    cactus: Texture,
    _vao: VertexArray,
}

impl CactusFieldLesson {
    const SOLID_UNIT: u32 = 8;
    const CACTUS_UNIT: u32 = 10;

    pub fn new(
        gpu: &Gpu,
        settings: &LessonSettings,
        seed: u64,
        cactus: &Image,
    ) -> Result<Self, LessonError> {
        gpu.set_blending(BlendingState::On);
        gpu.set_blending_func(Factor::SrcAlpha, Factor::SrcAlphaComplement);

        let program = Program::from_sources(gpu, FIELD_VS, FIELD_FS)?;
        let vao = VertexArray::new(gpu)?;

        let vertices = Buffer::new(gpu, BufferKind::Vertex)?;
        let layout = VertexLayout::new()
            .attrib(0, 3, AttribType::F32)
            .attrib(1, 2, AttribType::F32)
            .build();
        vao.attrib_pointers(&vertices, &layout);

        let solid = Texture::new(gpu, Self::SOLID_UNIT)?;
        for (level, image) in solid_levels() {
            solid.upload_level(level, &image)?;
        }
        solid.set_mag_filter(MagFilter::Nearest);
        solid.set_min_filter(MinFilter::NearestMipmapNearest);

        let cactus = Texture::from_image(gpu, Self::CACTUS_UNIT, cactus)?;
        cactus.generate_mipmap();
        cactus.set_mag_filter(MagFilter::Nearest);
        cactus.set_min_filter(MinFilter::LinearMipmapLinear);

        let mut lesson = CactusFieldLesson {
            mvp: program.uniform("uMVP"),
            sampler: program.uniform("uSampler"),
            program,
            vertices,
            field: CactusField::new(Xorshift64::new(seed)),
            speed: settings.speed,
            solid,
            cactus,
            _vao: vao,
        };
        lesson.apply_settings(gpu, settings)?;

        Ok(lesson)
    }
}

impl Lesson for CactusFieldLesson {
    fn id(&self) -> LessonId {
        LessonId::CactusField
    }

    fn frame(&mut self, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError> {
        set_mvp(gpu, &self.program, &self.mvp);

        let data = self.field.advance(time.since_start_ms, self.speed);
        self.vertices.upload(&data, Usage::StreamDraw);
        draw_arrays(gpu, Mode::Triangle, 0, CactusField::VERTEX_COUNT as i32)?;

        Ok(())
    }

    fn apply_settings(&mut self, _gpu: &Gpu, settings: &LessonSettings) -> Result<(), LessonError> {
        self.speed = settings.speed;

        let texture = if settings.no_cactuses {
            &self.solid
        } else {
            &self.cactus
        };
        texture.set_min_filter(settings.min_filter);
        self.program.set(&self.sampler, &(texture.unit() as i32));

        Ok(())
    }
}

const PLAYGROUND_VS: &str = r"#version 300 es
layout(location = 0) in highp vec2 aShapeCoord;
layout(location = 1) in highp vec2 aTexCoord;
out highp vec2 vTexCoord;
void main()
{
  gl_Position = vec4(aShapeCoord, 0, 1);
  vTexCoord = aTexCoord;
}";

const PLAYGROUND_FS: &str = r"#version 300 es
uniform sampler2D uSampler;
in highp vec2 vTexCoord;
out mediump vec4 fragColor;
void main()
{
  fragColor = texture(uSampler, vTexCoord);
}";

/// A full-canvas quad sampling a repeated 2×2 checker or the grid, with adjustable filters,
/// repeat counts and inset.
pub struct FilterPlayground {
    program: Program,
    sampler: Uniform<i32>,
    tex_coords: Buffer,
    checker: Texture,
    grid: Texture,
    settings: LessonSettings,
    _shape: Buffer,
    _vao: VertexArray,
}

impl FilterPlayground {
    const CHECKER_UNIT: u32 = 3;
    const GRID_UNIT: u32 = 4;

    #[rustfmt::skip]
    const SHAPE: [i8; 12] = [
        -1, -1,
        -1,  1,
         1,  1,
        -1, -1,
         1,  1,
         1, -1,
    ];

    pub fn checker_image() -> Image {
        #[rustfmt::skip]
        let texels = vec![
            255, 255, 255,   0, 0, 0,
            0, 0, 0,         255, 255, 255,
        ];

        Image::new(2, 2, PixelFormat::Rgb8, texels)
    }

    pub fn new(gpu: &Gpu, settings: &LessonSettings) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, PLAYGROUND_VS, PLAYGROUND_FS)?;
        let vao = VertexArray::new(gpu)?;

        let checker =
            Texture::from_image(gpu, Self::CHECKER_UNIT, &Self::checker_image().flip_rows())?;
        checker.set_wrap(Wrap::Repeat);
        checker.set_min_filter(MinFilter::Nearest);
        checker.set_mag_filter(MagFilter::Nearest);

        let grid = Texture::from_image(gpu, Self::GRID_UNIT, &grid_image().flip_rows())?;
        grid.generate_mipmap();
        grid.set_wrap(Wrap::Repeat);
        grid.set_min_filter(MinFilter::Nearest);
        grid.set_mag_filter(MagFilter::Nearest);

        let shape = Buffer::from_slice(gpu, BufferKind::Vertex, &Self::SHAPE, Usage::StaticDraw)?;
        vao.attrib_pointer(&shape, &VertexAttrib::new(0, 2, AttribType::I8));

        let tex_coords = Buffer::new(gpu, BufferKind::Vertex)?;
        vao.attrib_pointer(&tex_coords, &VertexAttrib::new(1, 2, AttribType::F32));

        Ok(FilterPlayground {
            sampler: program.uniform("uSampler"),
            program,
            tex_coords,
            checker,
            grid,
            settings: settings.clone(),
            _shape: shape,
            _vao: vao,
        })
    }
}

impl Lesson for FilterPlayground {
    fn id(&self) -> LessonId {
        LessonId::FilterPlayground
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        let settings = &self.settings;

        // the checker has no levels, so it keeps its nearest minification
        let texture = if settings.use_grid {
            self.grid.set_min_filter(settings.min_filter);
            &self.grid
        } else {
            &self.checker
        };
        texture.set_mag_filter(settings.mag_filter);
        self.program.set(&self.sampler, &(texture.unit() as i32));

        let tex_coords = inset_tex_coords(settings.inset, settings.repeat_x, settings.repeat_y);
        self.tex_coords.upload(&tex_coords, Usage::StreamDraw);
        draw_arrays(gpu, Mode::Triangle, 0, 6)?;

        Ok(())
    }

    fn apply_settings(&mut self, _gpu: &Gpu, settings: &LessonSettings) -> Result<(), LessonError> {
        self.settings = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_levels_halve_from_sixteen() {
        let levels = colorful_levels(32, 1, &GRID_LEVEL_COLORS);
        let sizes: Vec<_> = levels.iter().map(|(level, image)| (*level, image.width)).collect();
        assert_eq!(sizes, vec![(1, 16), (2, 8), (3, 4), (4, 2), (5, 1)]);
        assert_eq!(levels[3].1.texels, vec![255, 128, 0].repeat(4));
    }

    #[test]
    fn lego_levels_start_at_level_two() {
        let levels = colorful_levels(512, 2, &LEGO_LEVEL_COLORS);
        let sizes: Vec<_> = levels.iter().map(|(level, image)| (*level, image.width)).collect();
        assert_eq!(sizes, vec![(2, 128), (3, 64), (4, 32), (5, 16)]);
    }

    #[test]
    fn colorful_levels_never_go_below_one_texel() {
        let levels = colorful_levels(4, 1, &GRID_LEVEL_COLORS);
        assert!(levels.iter().all(|(_, image)| image.width == 1 || image.width == 2));
    }

    #[test]
    fn solid_levels_form_a_full_chain() {
        let levels: Vec<_> = solid_levels().collect();
        assert_eq!(levels.len(), 8);
        assert_eq!(levels[0].1.width, 128);
        assert_eq!(levels[7].1.width, 1);
        assert_eq!(levels[0].1.texels[..4], [0, 0, 255, 64]);
        assert_eq!(levels[6].1.texels, vec![0, 0, 0, 255].repeat(4));
    }

    #[test]
    fn flipped_checker_swaps_rows() {
        let checker = FilterPlayground::checker_image().flip_rows();
        assert_eq!(checker.texels, vec![0, 0, 0, 255, 255, 255, 255, 255, 255, 0, 0, 0]);
    }
}

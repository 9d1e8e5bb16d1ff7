//! A single triangle sampling hand-written texels, a picture, then both at once.

use luminance::tess::Mode;
use luminance::texture::{MagFilter, MinFilter};

use super::{FrameTime, Lesson, LessonId};
use crate::buffer::{Buffer, BufferKind, Usage};
use crate::draw::draw_arrays;
use crate::error::LessonError;
use crate::geometry::blend_factor;
use crate::pixel::{Image, PixelFormat};
use crate::shader::{Program, Uniform};
use crate::texture::Texture;
use crate::vertex::{AttribType, VertexArray, VertexAttrib};
use crate::Gpu;

const VS: &str = r"#version 300 es
layout(location = 0) in highp vec2 aCoords;
layout(location = 1) in mediump vec2 aTextureCoords;
out mediump vec2 vTextureCoords;
void main()
{
  gl_Position = vec4(aCoords, 0, 1);
  vTextureCoords = aTextureCoords;
}";

const PIXEL_FS: &str = r"#version 300 es
in mediump vec2 vTextureCoords;
uniform sampler2D uSampler;
out mediump vec4 fragColor;
void main()
{
  fragColor = texture(uSampler, vTextureCoords);
}";

const KITTEN_FS: &str = r"#version 300 es
precision mediump float;
in mediump vec2 vTextureCoords;
uniform sampler2D uKittenSampler;
out vec4 fragColor;
void main()
{
  fragColor = texture(uKittenSampler, vTextureCoords);
}";

const BLEND_FS: &str = r"#version 300 es
precision mediump float;
in mediump vec2 vTextureCoords;
uniform sampler2D uPixelSampler;
uniform sampler2D uKittenSampler;
uniform mediump float uMultiplyFactor;
out mediump vec4 fragColor;
void main()
{
  vec4 image1 = texture(uPixelSampler, vTextureCoords) * uMultiplyFactor;
  vec4 image2 = texture(uKittenSampler, vTextureCoords) * (1.0 - uMultiplyFactor);
  fragColor = image1 + image2;
}";

#[rustfmt::skip]
const COORDS: [f32; 6] = [
    -0.9, -0.9,
    0.,    0.9,
    0.9,  -0.9,
];

#[rustfmt::skip]
const TEX_COORDS: [f32; 6] = [
    0.,  0.,
    0.5, 1.,
    1.,  0.,
];

/// The 4×4 RGB texels of the pixel lessons, first row first.
#[rustfmt::skip]
pub const PIXELS: [u8; 48] = [
    255, 255, 255,   230, 25, 75,     60, 180, 75,     255, 225, 25,
    67, 99, 216,     245, 130, 49,    145, 30, 180,    70, 240, 240,
    240, 50, 230,    188, 246, 12,    250, 190, 190,   0, 128, 128,
    230, 190, 255,   154, 99, 36,     255, 250, 200,   0, 0, 0,
];

pub fn pixel_image() -> Image {
    Image::new(4, 4, PixelFormat::Rgb8, PIXELS.to_vec())
}

/// Program, positions and texture coordinates of the textured triangle.
struct TexturedTriangle {
    program: Program,
    _vao: VertexArray,
    _buffers: [Buffer; 2],
}

impl TexturedTriangle {
    fn new(gpu: &Gpu, fragment: &str) -> Result<Self, LessonError> {
        let program = Program::from_sources(gpu, VS, fragment)?;
        let vao = VertexArray::new(gpu)?;

        let coords = Buffer::from_slice(gpu, BufferKind::Vertex, &COORDS, Usage::StaticDraw)?;
        vao.attrib_pointer(&coords, &VertexAttrib::new(0, 2, AttribType::F32));

        let tex_coords =
            Buffer::from_slice(gpu, BufferKind::Vertex, &TEX_COORDS, Usage::StaticDraw)?;
        vao.attrib_pointer(&tex_coords, &VertexAttrib::new(1, 2, AttribType::F32));

        Ok(TexturedTriangle {
            program,
            _vao: vao,
            _buffers: [coords, tex_coords],
        })
    }

    /// Point the `name` sampler at the unit of `texture`.
    fn sample(&self, name: &str, texture: &Texture) {
        let sampler: Uniform<i32> = self.program.uniform(name);
        self.program.set(&sampler, &(texture.unit() as i32));
    }

    fn draw(&self, gpu: &Gpu) -> Result<(), LessonError> {
        self.program.bind();
        draw_arrays(gpu, Mode::Triangle, 0, 3)?;
        Ok(())
    }
}

/// Sixteen hand-written texels stretched over the triangle.
pub struct PixelTexture {
    triangle: TexturedTriangle,
    _texture: Texture,
}

impl PixelTexture {
    pub fn new(gpu: &Gpu) -> Result<Self, LessonError> {
        let triangle = TexturedTriangle::new(gpu, PIXEL_FS)?;

        let texture = Texture::from_image(gpu, 0, &pixel_image())?;
        texture.generate_mipmap();
        triangle.sample("uSampler", &texture);

        Ok(PixelTexture {
            triangle,
            _texture: texture,
        })
    }
}

impl Lesson for PixelTexture {
    fn id(&self) -> LessonId {
        LessonId::PixelTexture
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        self.triangle.draw(gpu)
    }
}

fn kitten_texture(gpu: &Gpu, unit: u32, kitten: &Image) -> Result<Texture, LessonError> {
    let texture = Texture::from_image(gpu, unit, kitten)?;
    texture.set_min_filter(MinFilter::Linear);
    texture.set_mag_filter(MagFilter::Linear);
    texture.generate_mipmap();

    Ok(texture)
}

/// The kitten picture, smoothly filtered.
pub struct KittenTexture {
    triangle: TexturedTriangle,
    _texture: Texture,
}

impl KittenTexture {
    const UNIT: u32 = 0;

    pub fn new(gpu: &Gpu, kitten: &Image) -> Result<Self, LessonError> {
        let triangle = TexturedTriangle::new(gpu, KITTEN_FS)?;
        let texture = kitten_texture(gpu, Self::UNIT, kitten)?;
        triangle.sample("uKittenSampler", &texture);

        Ok(KittenTexture {
            triangle,
            _texture: texture,
        })
    }
}

impl Lesson for KittenTexture {
    fn id(&self) -> LessonId {
        LessonId::KittenTexture
    }

    fn frame(&mut self, gpu: &Gpu, _time: &FrameTime) -> Result<(), LessonError> {
        self.triangle.draw(gpu)
    }
}

/// Cross-fade between the pixel texture and the kitten, on two texture units.
pub struct BlendedTextures {
    triangle: TexturedTriangle,
    factor: Uniform<f32>,
    _textures: [Texture; 2],
}

impl BlendedTextures {
    const PIXEL_UNIT: u32 = 1;
    const KITTEN_UNIT: u32 = 5;

    pub fn new(gpu: &Gpu, kitten: &Image) -> Result<Self, LessonError> {
        let triangle = TexturedTriangle::new(gpu, BLEND_FS)?;

        let pixels = Texture::from_image(gpu, Self::PIXEL_UNIT, &pixel_image().flip_rows())?;
        pixels.set_min_filter(MinFilter::Linear);
        pixels.set_mag_filter(MagFilter::Nearest);
        pixels.generate_mipmap();
        triangle.sample("uPixelSampler", &pixels);

        let kitten = kitten_texture(gpu, Self::KITTEN_UNIT, kitten)?;
        triangle.sample("uKittenSampler", &kitten);

        Ok(BlendedTextures {
            factor: triangle.program.uniform("uMultiplyFactor"),
            triangle,
            _textures: [pixels, kitten],
        })
    }
}

impl Lesson for BlendedTextures {
    fn id(&self) -> LessonId {
        LessonId::BlendedTextures
    }

    fn frame(&mut self, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError> {
        self.triangle
            .program
            .set(&self.factor, &blend_factor(time.now_ms));
        self.triangle.draw(gpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_image_is_complete() {
        let image = pixel_image();
        assert_eq!(image.texels.len(), image.expected_len());
        assert_eq!(&image.texels[..3], &[255, 255, 255]);
    }

    #[test]
    fn flipped_pixels_start_with_the_last_row() {
        let flipped = pixel_image().flip_rows();
        assert_eq!(&flipped.texels[..3], &[230, 190, 255]);
        assert_eq!(&flipped.texels[45..], &[255, 225, 25]);
    }
}

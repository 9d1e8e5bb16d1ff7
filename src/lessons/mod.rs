//! The lessons.
//!
//! Every lesson owns its program, vertex array, buffers and textures, all created when the
//! lesson is built. A runner then calls [`Lesson::frame`] according to the lesson’s
//! [`Schedule`], and forwards control changes through [`Lesson::apply_settings`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::LessonError;
use crate::pixel::{Image, PixelFormat};
use crate::settings::LessonSettings;
use crate::state::BlendingState;
use crate::texture::TextureError;
use crate::Gpu;

mod attributes;
mod elements;
mod encodings;
mod mipmaps;
mod textures;
mod uniforms;

pub use attributes::{Clock, InterleavedTriangle, SpinningSquares};
pub use elements::{IndexedPentagon, PentagonArrays};
pub use encodings::{ConstantAttributes, NormalizedBuffers, PackedVertices};
pub use mipmaps::{CactusFieldLesson, FilterPlayground, MipmapPlane};
pub use textures::{BlendedTextures, KittenTexture, PixelTexture};
pub use uniforms::{BouncingDots, OrbitingDots, UniformPoints};

/// A running lesson.
pub trait Lesson {
    fn id(&self) -> LessonId;

    /// Draw one frame.
    fn frame(&mut self, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError>;

    /// React to a change of controls. Lessons without controls ignore it.
    fn apply_settings(
        &mut self,
        _gpu: &Gpu,
        _settings: &LessonSettings,
    ) -> Result<(), LessonError> {
        Ok(())
    }
}

/// When a lesson draws.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Schedule {
    /// A single frame after setup, and another one after every settings change.
    Once,
    /// A frame right away, then one every `n` milliseconds.
    Interval(u32),
    /// A frame on every display refresh.
    AnimationFrame,
}

/// Wall-clock time of day.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WallClock {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

/// Time information handed to every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    /// Milliseconds since the lesson started.
    pub since_start_ms: f64,
    /// Milliseconds since the Unix epoch.
    pub now_ms: f64,
    pub clock: WallClock,
}

impl FrameTime {
    pub fn seconds_since_start(&self) -> f32 {
        (self.since_start_ms / 1000.) as f32
    }
}

/// Images fetched before a lesson starts.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AssetId {
    Kitten,
    Lego,
    Cactus,
}

impl AssetId {
    /// Path relative to the asset base URL.
    pub fn path(self) -> &'static str {
        match self {
            AssetId::Kitten => "08.Textures%20(Part%201)/kitten.jpeg",
            AssetId::Lego => "09.Mipmaps%20(Textures%20Part%202)/lego.png",
            AssetId::Cactus => "09.Mipmaps%20(Textures%20Part%202)/cactus.png",
        }
    }

    pub fn url(self, base: &str) -> String {
        if base.ends_with('/') {
            format!("{}{}", base, self.path())
        } else {
            format!("{}/{}", base, self.path())
        }
    }

    pub fn pixel_format(self) -> PixelFormat {
        match self {
            AssetId::Kitten | AssetId::Lego => PixelFormat::Rgb8,
            AssetId::Cactus => PixelFormat::Rgba8,
        }
    }

    /// Whether the rows are uploaded bottom first, so that the picture is upright.
    pub fn flipped(self) -> bool {
        match self {
            AssetId::Kitten | AssetId::Cactus => true,
            AssetId::Lego => false,
        }
    }

    /// Decode a fetched file into texels ready to upload.
    pub fn decode(self, bytes: &[u8]) -> Result<Image, TextureError> {
        let image = Image::decode(bytes, self.pixel_format())?;

        if self.flipped() {
            Ok(image.flip_rows())
        } else {
            Ok(image)
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssetId::Kitten => f.write_str("kitten"),
            AssetId::Lego => f.write_str("lego"),
            AssetId::Cactus => f.write_str("cactus"),
        }
    }
}

/// Decoded images, by asset.
#[derive(Clone, Debug, Default)]
pub struct Assets {
    images: HashMap<AssetId, Image>,
}

impl Assets {
    pub fn new() -> Self {
        Assets::default()
    }

    pub fn insert(&mut self, id: AssetId, image: Image) {
        self.images.insert(id, image);
    }

    pub fn get(&self, id: AssetId) -> Result<&Image, LessonError> {
        self.images.get(&id).ok_or(LessonError::MissingAsset(id))
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.images.contains_key(&id)
    }
}

macro_rules! lesson_ids {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Name of every lesson.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum LessonId {
            $($variant),*
        }

        impl LessonId {
            pub const ALL: &'static [LessonId] = &[$(LessonId::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(LessonId::$variant => $name),*
                }
            }
        }

        impl FromStr for LessonId {
            type Err = LessonError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(LessonId::$variant),)*
                    _ => Err(LessonError::UnknownLesson(s.to_owned())),
                }
            }
        }
    };
}

lesson_ids! {
    UniformPoints => "uniform-points",
    BouncingDots => "bouncing-dots",
    OrbitingDots => "orbiting-dots",
    InterleavedTriangle => "interleaved-triangle",
    SpinningSquares => "spinning-squares",
    Clock => "clock",
    ConstantAttributes => "constant-attributes",
    NormalizedBuffers => "normalized-buffers",
    PackedVertices => "packed-vertices",
    PentagonArrays => "pentagon-arrays",
    IndexedPentagon => "indexed-pentagon",
    PixelTexture => "pixel-texture",
    KittenTexture => "kitten-texture",
    BlendedTextures => "blended-textures",
    MipmapPlane => "mipmap-plane",
    CactusField => "cactus-field",
    FilterPlayground => "filter-playground",
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl LessonId {
    pub fn schedule(self) -> Schedule {
        match self {
            LessonId::BouncingDots
            | LessonId::OrbitingDots
            | LessonId::SpinningSquares
            | LessonId::BlendedTextures => Schedule::Interval(10),
            LessonId::Clock => Schedule::Interval(1000),
            LessonId::MipmapPlane | LessonId::CactusField => Schedule::AnimationFrame,
            _ => Schedule::Once,
        }
    }

    /// Images that must be in [`Assets`] before [`LessonId::create`] is called.
    pub fn assets(self) -> &'static [AssetId] {
        match self {
            LessonId::KittenTexture | LessonId::BlendedTextures => &[AssetId::Kitten],
            LessonId::MipmapPlane => &[AssetId::Lego],
            LessonId::CactusField => &[AssetId::Cactus],
            _ => &[],
        }
    }

    /// Set a lesson up: compile its program, upload its data and configure its textures.
    pub fn create(
        self,
        gpu: &Gpu,
        settings: &LessonSettings,
        assets: &Assets,
    ) -> Result<Box<dyn Lesson>, LessonError> {
        let seed = settings.seed.unwrap_or_default();

        // only the cactus field blends
        gpu.set_blending(BlendingState::Off);

        let lesson: Box<dyn Lesson> = match self {
            LessonId::UniformPoints => Box::new(UniformPoints::new(gpu)?),
            LessonId::BouncingDots => Box::new(BouncingDots::new(gpu, seed)?),
            LessonId::OrbitingDots => Box::new(OrbitingDots::new(gpu, seed)?),
            LessonId::InterleavedTriangle => Box::new(InterleavedTriangle::new(gpu)?),
            LessonId::SpinningSquares => Box::new(SpinningSquares::new(gpu, seed)?),
            LessonId::Clock => Box::new(Clock::new(gpu)?),
            LessonId::ConstantAttributes => Box::new(ConstantAttributes::new(gpu)?),
            LessonId::NormalizedBuffers => Box::new(NormalizedBuffers::new(gpu)?),
            LessonId::PackedVertices => Box::new(PackedVertices::new(gpu)?),
            LessonId::PentagonArrays => Box::new(PentagonArrays::new(gpu)?),
            LessonId::IndexedPentagon => Box::new(IndexedPentagon::new(gpu)?),
            LessonId::PixelTexture => Box::new(PixelTexture::new(gpu)?),
            LessonId::KittenTexture => {
                Box::new(KittenTexture::new(gpu, assets.get(AssetId::Kitten)?)?)
            }
            LessonId::BlendedTextures => {
                Box::new(BlendedTextures::new(gpu, assets.get(AssetId::Kitten)?)?)
            }
            LessonId::MipmapPlane => {
                Box::new(MipmapPlane::new(gpu, settings, assets.get(AssetId::Lego)?)?)
            }
            LessonId::CactusField => Box::new(CactusFieldLesson::new(
                gpu,
                settings,
                seed,
                assets.get(AssetId::Cactus)?,
            )?),
            LessonId::FilterPlayground => Box::new(FilterPlayground::new(gpu, settings)?),
        };

        Ok(lesson)
    }
}

/// Clear the canvas and draw a frame of `lesson`.
pub fn render(lesson: &mut dyn Lesson, gpu: &Gpu, time: &FrameTime) -> Result<(), LessonError> {
    gpu.clear([0., 0., 0., 0.]);
    lesson.frame(gpu, time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for id in LessonId::ALL {
            assert_eq!(id.name().parse::<LessonId>().unwrap(), *id);
            assert_eq!(id.to_string(), id.name());
        }
    }

    #[test]
    fn seventeen_lessons() {
        assert_eq!(LessonId::ALL.len(), 17);
    }

    #[test]
    fn unknown_name_is_an_error() {
        match "teapot".parse::<LessonId>() {
            Err(LessonError::UnknownLesson(name)) => assert_eq!(name, "teapot"),
            other => panic!("unexpected {:?}", other.map(LessonId::name)),
        }
    }

    #[test]
    fn schedules() {
        assert_eq!(LessonId::UniformPoints.schedule(), Schedule::Once);
        assert_eq!(LessonId::BouncingDots.schedule(), Schedule::Interval(10));
        assert_eq!(LessonId::Clock.schedule(), Schedule::Interval(1000));
        assert_eq!(LessonId::CactusField.schedule(), Schedule::AnimationFrame);
        assert_eq!(LessonId::FilterPlayground.schedule(), Schedule::Once);
    }

    #[test]
    fn assets_per_lesson() {
        assert_eq!(LessonId::BlendedTextures.assets(), &[AssetId::Kitten]);
        assert_eq!(LessonId::MipmapPlane.assets(), &[AssetId::Lego]);
        assert!(LessonId::PixelTexture.assets().is_empty());
        assert!(LessonId::FilterPlayground.assets().is_empty());
    }

    #[test]
    fn asset_urls() {
        assert_eq!(
            AssetId::Cactus.url("https://example.com/lessons"),
            "https://example.com/lessons/09.Mipmaps%20(Textures%20Part%202)/cactus.png"
        );
        assert!(AssetId::Kitten
            .url(crate::settings::DEFAULT_ASSET_BASE_URL)
            .ends_with("main/08.Textures%20(Part%201)/kitten.jpeg"));
    }

    #[test]
    fn missing_asset() {
        let assets = Assets::new();
        assert!(matches!(
            assets.get(AssetId::Lego),
            Err(LessonError::MissingAsset(AssetId::Lego))
        ));
    }

    #[test]
    fn flipped_assets_are_decoded_upside_down() {
        let mut png = Vec::new();
        image::RgbaImage::from_raw(1, 2, vec![255, 0, 0, 255, 0, 0, 255, 255])
            .expect("two texels")
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("png encoding");

        let cactus = AssetId::Cactus.decode(&png).unwrap();
        assert_eq!(cactus.texels, vec![0, 0, 255, 255, 255, 0, 0, 255]);

        let lego = AssetId::Lego.decode(&png).unwrap();
        assert_eq!(lego.format, PixelFormat::Rgb8);
        assert_eq!(lego.texels, vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn seconds_since_start() {
        let time = FrameTime {
            since_start_ms: 1500.,
            ..FrameTime::default()
        };
        assert_eq!(time.seconds_since_start(), 1.5);
    }
}

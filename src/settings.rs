//! Lesson controls.
//!
//! The settings mirror the radio buttons, checkboxes and sliders shown next to the interactive
//! lessons. They are exchanged as JSON; every field is optional and lessons ignore the ones
//! they don’t use.
//!
//! ```json
//! { "min_filter": "NEAREST_MIPMAP_LINEAR", "texture": "lego", "colorful_levels": true }
//! ```

use luminance::texture::{MagFilter, MinFilter};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ASSET_BASE_URL: &str =
    "https://raw.githubusercontent.com/evpozdniakov/WebGL-2.0/refs/heads/main/";

/// Texture shown on the tilting plane.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneTexture {
    #[default]
    Grid,
    Lego,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonSettings {
    /// Seed of the randomized lessons; picked by the runner when absent.
    pub seed: Option<u64>,
    #[serde(with = "min_filter_serde")]
    pub min_filter: MinFilter,
    #[serde(with = "mag_filter_serde")]
    pub mag_filter: MagFilter,
    pub texture: PlaneTexture,
    /// Replace the smaller mipmap levels with solid colors.
    pub colorful_levels: bool,
    /// Draw the billboards with the hand-made colored levels instead of the cactus picture.
    pub no_cactuses: bool,
    /// Speed slider of the cactus field.
    pub speed: f32,
    /// Sample the grid instead of the 2×2 checker in the filter playground.
    pub use_grid: bool,
    pub repeat_x: f32,
    pub repeat_y: f32,
    /// Shrinks the sampled area towards the texture origin, in texture coordinates.
    pub inset: f32,
    pub asset_base_url: String,
}

impl Default for LessonSettings {
    fn default() -> Self {
        LessonSettings {
            seed: None,
            min_filter: MinFilter::LinearMipmapLinear,
            mag_filter: MagFilter::Nearest,
            texture: PlaneTexture::Grid,
            colorful_levels: false,
            no_cactuses: false,
            speed: 5.,
            use_grid: true,
            repeat_x: 1.,
            repeat_y: 1.,
            inset: 0.,
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_owned(),
        }
    }
}

impl LessonSettings {
    /// Parse settings from JSON; blank input gives the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            Ok(LessonSettings::default())
        } else {
            serde_json::from_str(json)
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Parse a minification filter name.
///
/// Both `MIPMAP` and the `MINMAP` spelling used by the demo pages are accepted.
pub fn parse_min_filter(name: &str) -> Option<MinFilter> {
    match name.replace("MINMAP", "MIPMAP").as_str() {
        "NEAREST" => Some(MinFilter::Nearest),
        "LINEAR" => Some(MinFilter::Linear),
        "NEAREST_MIPMAP_NEAREST" => Some(MinFilter::NearestMipmapNearest),
        "NEAREST_MIPMAP_LINEAR" => Some(MinFilter::NearestMipmapLinear),
        "LINEAR_MIPMAP_NEAREST" => Some(MinFilter::LinearMipmapNearest),
        "LINEAR_MIPMAP_LINEAR" => Some(MinFilter::LinearMipmapLinear),
        _ => None,
    }
}

pub fn min_filter_name(filter: MinFilter) -> &'static str {
    match filter {
        MinFilter::Nearest => "NEAREST",
        MinFilter::Linear => "LINEAR",
        MinFilter::NearestMipmapNearest => "NEAREST_MIPMAP_NEAREST",
        MinFilter::NearestMipmapLinear => "NEAREST_MIPMAP_LINEAR",
        MinFilter::LinearMipmapNearest => "LINEAR_MIPMAP_NEAREST",
        MinFilter::LinearMipmapLinear => "LINEAR_MIPMAP_LINEAR",
    }
}

pub fn parse_mag_filter(name: &str) -> Option<MagFilter> {
    match name {
        "NEAREST" => Some(MagFilter::Nearest),
        "LINEAR" => Some(MagFilter::Linear),
        _ => None,
    }
}

pub fn mag_filter_name(filter: MagFilter) -> &'static str {
    match filter {
        MagFilter::Nearest => "NEAREST",
        MagFilter::Linear => "LINEAR",
    }
}

mod min_filter_serde {
    use luminance::texture::MinFilter;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(filter: &MinFilter, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::min_filter_name(*filter))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MinFilter, D::Error> {
        let name = String::deserialize(deserializer)?;
        super::parse_min_filter(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown minification filter: {}", name)))
    }
}

mod mag_filter_serde {
    use luminance::texture::MagFilter;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(filter: &MagFilter, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::mag_filter_name(*filter))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MagFilter, D::Error> {
        let name = String::deserialize(deserializer)?;
        super::parse_mag_filter(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown magnification filter: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(LessonSettings::from_json("").unwrap(), LessonSettings::default());
        assert_eq!(LessonSettings::from_json("{}").unwrap(), LessonSettings::default());
    }

    #[test]
    fn defaults() {
        let settings = LessonSettings::default();
        assert_eq!(settings.speed, 5.);
        assert_eq!(settings.repeat_x, 1.);
        assert_eq!(settings.inset, 0.);
        assert_eq!(settings.min_filter, MinFilter::LinearMipmapLinear);
        assert_eq!(settings.texture, PlaneTexture::Grid);
        assert!(settings.asset_base_url.ends_with('/'));
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let settings = LessonSettings::from_json(
            r#"{ "min_filter": "NEAREST_MINMAP_LINEAR", "texture": "lego", "seed": 42 }"#,
        )
        .unwrap();

        assert_eq!(settings.min_filter, MinFilter::NearestMipmapLinear);
        assert_eq!(settings.texture, PlaneTexture::Lego);
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.mag_filter, MagFilter::Nearest);
        assert!(!settings.colorful_levels);
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let err = LessonSettings::from_json(r#"{ "mag_filter": "CUBIC" }"#).unwrap_err();
        assert!(err.to_string().contains("unknown magnification filter: CUBIC"));
    }

    #[test]
    fn filter_names() {
        assert_eq!(parse_min_filter("LINEAR_MINMAP_NEAREST"), Some(MinFilter::LinearMipmapNearest));
        assert_eq!(
            parse_min_filter("NEAREST_MIPMAP_NEAREST"),
            Some(MinFilter::NearestMipmapNearest)
        );
        assert_eq!(parse_min_filter("LINEAR"), Some(MinFilter::Linear));
        assert_eq!(parse_min_filter("linear"), None);
        assert_eq!(parse_mag_filter("LINEAR"), Some(MagFilter::Linear));
        assert_eq!(min_filter_name(MinFilter::NearestMipmapLinear), "NEAREST_MIPMAP_LINEAR");
    }

    #[test]
    fn json_round_trip() {
        let settings = LessonSettings {
            mag_filter: MagFilter::Linear,
            no_cactuses: true,
            ..LessonSettings::default()
        };

        let json = settings.to_json().unwrap();
        assert!(json.contains(r#""mag_filter":"LINEAR""#));
        assert_eq!(LessonSettings::from_json(&json).unwrap(), settings);
    }
}

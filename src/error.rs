use thiserror::Error;

use crate::buffer::BufferError;
use crate::draw::DrawError;
use crate::lessons::AssetId;
use crate::shader::ShaderError;
use crate::state::StateQueryError;
use crate::texture::TextureError;

/// Everything that can go wrong while setting up or running a lesson.
#[derive(Debug, Error)]
pub enum LessonError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error(transparent)]
    State(#[from] StateQueryError),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("asset {0} has not been loaded")]
    MissingAsset(AssetId),

    #[error("unknown lesson: {0}")]
    UnknownLesson(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            LessonError::UnknownLesson("teapot".to_owned()).to_string(),
            "unknown lesson: teapot"
        );
        assert_eq!(
            LessonError::MissingAsset(AssetId::Kitten).to_string(),
            "asset kitten has not been loaded"
        );
    }

    #[test]
    fn buffer_errors_are_forwarded() {
        let err: LessonError = BufferError::Creation("out of memory".to_owned()).into();
        assert_eq!(err.to_string(), "cannot create buffer: out of memory");
    }
}

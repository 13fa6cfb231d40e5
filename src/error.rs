use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::providers::ProviderTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Decode,
    FileIo,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("model id not currently supported: {0}")]
    UnsupportedModel(String),

    #[error("unsupported provider '{0}'")]
    UnsupportedProvider(String),

    #[error("model {0} does not support streaming; rerun with --no-stream")]
    StreamingUnsupported(String),

    #[error("model {0} does not accept image attachments")]
    VisionUnsupported(String),

    #[error("model {0} does not support image generation; please use a different model")]
    ImageGenerationUnsupported(String),

    #[error("model {0} only generates images; use the image command")]
    TextGenerationUnsupported(String),

    #[error("{0} expects a single prompt string, not structured messages")]
    StructuredInputUnsupported(ProviderTag),

    #[error("unsupported image type for '{0}'; expected png, jpg, gif or webp")]
    UnsupportedImageType(PathBuf),

    #[error("{0}")]
    Transport(String),

    #[error("unable to decode {provider} response: {source}")]
    Decode {
        provider: ProviderTag,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} response is missing {field}")]
    MissingField {
        provider: ProviderTag,
        field: &'static str,
    },

    #[error("unable to decode base64 image data: {0}")]
    ImageData(#[from] base64::DecodeError),

    #[error("unable to serialize {provider} payload: {source}")]
    Encode {
        provider: ProviderTag,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to {action} '{path}': {source}")]
    FileIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedModel(_)
            | Self::UnsupportedProvider(_)
            | Self::StreamingUnsupported(_)
            | Self::VisionUnsupported(_)
            | Self::ImageGenerationUnsupported(_)
            | Self::TextGenerationUnsupported(_)
            | Self::StructuredInputUnsupported(_)
            | Self::UnsupportedImageType(_)
            | Self::Encode { .. } => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Decode { .. } | Self::MissingField { .. } | Self::ImageData(_) => {
                ErrorKind::Decode
            }
            Self::FileIo { .. } => ErrorKind::FileIo,
        }
    }

    pub(crate) fn file_io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileIo {
            action,
            path: path.into(),
            source,
        }
    }
}

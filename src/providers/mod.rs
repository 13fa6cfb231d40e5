mod claude_legacy;
mod claude_messages;
mod command;
mod jurassic;
mod llama;
pub mod sdk_errors;
pub mod stability;
mod titan;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ChatError;
use crate::message::{Message, Role};

pub use claude_legacy::{PROMPT_PREFIX as CLAUDE_PROMPT_PREFIX, PROMPT_SUFFIX as CLAUDE_PROMPT_SUFFIX};
pub use stability::ImageParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderTag {
    ClaudeLegacy,
    ClaudeMessages,
    Command,
    Jurassic,
    Llama,
    Titan,
    StabilityImage,
}

impl ProviderTag {
    pub const ALL: [ProviderTag; 7] = [
        Self::ClaudeLegacy,
        Self::ClaudeMessages,
        Self::Command,
        Self::Jurassic,
        Self::Llama,
        Self::Titan,
        Self::StabilityImage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClaudeLegacy => "claude-legacy",
            Self::ClaudeMessages => "claude-messages",
            Self::Command => "command",
            Self::Jurassic => "jurassic",
            Self::Llama => "llama",
            Self::Titan => "titan",
            Self::StabilityImage => "stability-image",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ChatError> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == normalized)
            .ok_or_else(|| ChatError::UnsupportedProvider(raw.to_string()))
    }

    pub fn is_messages_style(&self) -> bool {
        matches!(self, Self::ClaudeMessages)
    }

    pub fn role_markers(&self) -> RoleMarkers {
        match self {
            Self::ClaudeLegacy | Self::ClaudeMessages => CLAUDE_MARKERS,
            Self::Titan => TITAN_MARKERS,
            Self::Command | Self::Jurassic | Self::Llama | Self::StabilityImage => {
                GENERIC_MARKERS
            }
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Remote models are sensitive to these exact bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleMarkers {
    pub human: &'static str,
    pub assistant: &'static str,
}

impl RoleMarkers {
    pub fn for_role(&self, role: Role) -> &'static str {
        match role {
            Role::User => self.human,
            Role::Assistant => self.assistant,
        }
    }
}

pub const CLAUDE_MARKERS: RoleMarkers = RoleMarkers {
    human: "\n\nHuman: ",
    assistant: "\n\nAssistant: ",
};

pub const TITAN_MARKERS: RoleMarkers = RoleMarkers {
    human: "\n\nUser: ",
    assistant: "\n\nBot: ",
};

pub const GENERIC_MARKERS: RoleMarkers = RoleMarkers {
    human: "\n\nUser: ",
    assistant: "\n\nAssistant: ",
};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_tokens: u32,
    pub stop_sequences: Vec<String>,
    pub stream: bool,
    pub image: ImageParams,
}

impl GenerationParams {
    pub fn defaults_for(provider: ProviderTag) -> Self {
        let (temperature, top_p, top_k, max_tokens) = match provider {
            ProviderTag::ClaudeLegacy => (1.0, 0.999, 250, 500),
            ProviderTag::ClaudeMessages => (1.0, 0.999, 250, 1000),
            ProviderTag::Command => (0.75, 0.01, 0, 400),
            ProviderTag::Jurassic => (1.0, 0.999, 0, 500),
            ProviderTag::Llama => (0.5, 0.9, 0, 512),
            ProviderTag::Titan | ProviderTag::StabilityImage => (0.7, 0.9, 0, 512),
        };
        let stop_sequences = match provider {
            ProviderTag::ClaudeLegacy => vec![CLAUDE_MARKERS.human.trim_end().to_string()],
            _ => Vec::new(),
        };

        Self {
            temperature,
            top_p,
            top_k,
            max_tokens,
            stop_sequences,
            stream: false,
            image: ImageParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PromptInput<'a> {
    Text(&'a str),
    Messages(&'a [Message]),
}

impl<'a> PromptInput<'a> {
    fn text_for(self, provider: ProviderTag) -> Result<&'a str, ChatError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Messages(_) => Err(ChatError::StructuredInputUnsupported(provider)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkContent {
    Text(String),
    MessageStart(Role),
    Empty,
}

impl ChunkContent {
    fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Text(text)
        }
    }
}

pub fn encode(
    provider: ProviderTag,
    input: PromptInput<'_>,
    params: &GenerationParams,
) -> Result<Vec<u8>, ChatError> {
    match provider {
        ProviderTag::ClaudeLegacy => claude_legacy::encode(input.text_for(provider)?, params),
        ProviderTag::ClaudeMessages => claude_messages::encode(input, params),
        ProviderTag::Command => command::encode(input.text_for(provider)?, params),
        ProviderTag::Jurassic => jurassic::encode(input.text_for(provider)?, params),
        ProviderTag::Llama => llama::encode(input.text_for(provider)?, params),
        ProviderTag::Titan => titan::encode(input.text_for(provider)?, params),
        ProviderTag::StabilityImage => {
            stability::encode(input.text_for(provider)?, &params.image)
        }
    }
}

pub fn decode_chunk(provider: ProviderTag, bytes: &[u8]) -> Result<ChunkContent, ChatError> {
    match provider {
        ProviderTag::ClaudeLegacy => claude_legacy::decode_chunk(bytes),
        ProviderTag::ClaudeMessages => claude_messages::decode_chunk(bytes),
        ProviderTag::Command => command::decode_chunk(bytes),
        ProviderTag::Llama => llama::decode_chunk(bytes),
        ProviderTag::Jurassic | ProviderTag::Titan | ProviderTag::StabilityImage => {
            Err(ChatError::StreamingUnsupported(provider.to_string()))
        }
    }
}

pub fn decode_response(provider: ProviderTag, body: &[u8]) -> Result<String, ChatError> {
    match provider {
        ProviderTag::ClaudeLegacy => claude_legacy::decode_response(body),
        ProviderTag::ClaudeMessages => claude_messages::decode_response(body),
        ProviderTag::Command => command::decode_response(body),
        ProviderTag::Jurassic => jurassic::decode_response(body),
        ProviderTag::Llama => llama::decode_response(body),
        ProviderTag::Titan => titan::decode_response(body),
        ProviderTag::StabilityImage => {
            Err(ChatError::TextGenerationUnsupported(provider.to_string()))
        }
    }
}

fn to_json<T: Serialize>(provider: ProviderTag, body: &T) -> Result<Vec<u8>, ChatError> {
    serde_json::to_vec(body).map_err(|source| ChatError::Encode { provider, source })
}

fn from_json<T: DeserializeOwned>(provider: ProviderTag, bytes: &[u8]) -> Result<T, ChatError> {
    serde_json::from_slice(bytes).map_err(|source| ChatError::Decode { provider, source })
}

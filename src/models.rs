use crate::error::ChatError;
use crate::providers::ProviderTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Image,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub model_id: &'static str,
    pub family: &'static str,
    pub provider: ProviderTag,
    pub content_type: ContentType,
    pub base_model: bool,
    pub supports_streaming: bool,
    pub supports_vision: bool,
}

const fn text_model(
    model_id: &'static str,
    family: &'static str,
    provider: ProviderTag,
    base_model: bool,
    supports_streaming: bool,
    supports_vision: bool,
) -> ModelInfo {
    ModelInfo {
        model_id,
        family,
        provider,
        content_type: ContentType::Text,
        base_model,
        supports_streaming,
        supports_vision,
    }
}

const fn image_model(model_id: &'static str, base_model: bool) -> ModelInfo {
    ModelInfo {
        model_id,
        family: "stability",
        provider: ProviderTag::StabilityImage,
        content_type: ContentType::Image,
        base_model,
        supports_streaming: false,
        supports_vision: false,
    }
}

pub const MODELS: &[ModelInfo] = &[
    text_model(
        "anthropic.claude-3-sonnet-20240229-v1:0",
        "claude3",
        ProviderTag::ClaudeMessages,
        false,
        true,
        true,
    ),
    text_model(
        "anthropic.claude-3-haiku-20240307-v1:0",
        "claude3",
        ProviderTag::ClaudeMessages,
        true,
        true,
        true,
    ),
    text_model(
        "anthropic.claude-v2:1",
        "claude",
        ProviderTag::ClaudeLegacy,
        false,
        true,
        false,
    ),
    text_model(
        "anthropic.claude-v2",
        "claude",
        ProviderTag::ClaudeLegacy,
        false,
        true,
        false,
    ),
    text_model(
        "anthropic.claude-instant-v1",
        "claude",
        ProviderTag::ClaudeLegacy,
        true,
        true,
        false,
    ),
    text_model(
        "ai21.j2-mid-v1",
        "jurassic",
        ProviderTag::Jurassic,
        true,
        false,
        false,
    ),
    text_model(
        "ai21.j2-ultra-v1",
        "jurassic",
        ProviderTag::Jurassic,
        false,
        false,
        false,
    ),
    text_model(
        "cohere.command-light-text-v14",
        "command",
        ProviderTag::Command,
        true,
        true,
        false,
    ),
    text_model(
        "cohere.command-text-v14",
        "command",
        ProviderTag::Command,
        false,
        true,
        false,
    ),
    text_model(
        "meta.llama2-13b-chat-v1",
        "llama",
        ProviderTag::Llama,
        true,
        true,
        false,
    ),
    text_model(
        "meta.llama2-70b-chat-v1",
        "llama",
        ProviderTag::Llama,
        false,
        true,
        false,
    ),
    text_model(
        "amazon.titan-text-lite-v1",
        "titan",
        ProviderTag::Titan,
        true,
        false,
        false,
    ),
    text_model(
        "amazon.titan-text-express-v1",
        "titan",
        ProviderTag::Titan,
        false,
        false,
        false,
    ),
    image_model("stability.stable-diffusion-xl-v1", true),
    image_model("stability.stable-diffusion-xl-v0", false),
];

pub fn lookup(model_id: &str) -> Result<&'static ModelInfo, ChatError> {
    let model_id = model_id.trim();
    MODELS
        .iter()
        .find(|model| model.model_id == model_id)
        .or_else(|| {
            MODELS
                .iter()
                .find(|model| model.family == model_id && model.base_model)
        })
        .ok_or_else(|| ChatError::UnsupportedModel(model_id.to_string()))
}

use std::env;
use std::path::PathBuf;

use crate::providers::{GenerationParams, ImageParams, ProviderTag};

const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";
const DEFAULT_IMAGE_MODEL_ID: &str = "stability.stable-diffusion-xl-v1";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_STREAM: bool = true;
const DEFAULT_CHATS_DIR: &str = "chats";
const DEFAULT_IMAGE_OUTPUT_DIR: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorPolicy {
    Abort,
    SkipTurn,
}

impl StreamErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::SkipTurn => "skip-turn",
        }
    }
}

// Unset fields fall back to the provider defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOverrides {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
}

impl GenerationOverrides {
    pub fn resolve(&self, provider: ProviderTag) -> GenerationParams {
        let mut params = GenerationParams::defaults_for(provider);
        if let Some(temperature) = self.temperature {
            params.temperature = temperature;
        }
        if let Some(top_p) = self.top_p {
            params.top_p = top_p;
        }
        if let Some(top_k) = self.top_k {
            params.top_k = top_k;
        }
        if let Some(max_tokens) = self.max_tokens {
            params.max_tokens = max_tokens;
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model_id: String,
    model_pinned: bool,
    pub region: String,
    pub stream: bool,
    pub generation: GenerationOverrides,
    pub image: ImageParams,
    pub chats_dir: PathBuf,
    pub image_output_dir: PathBuf,
    pub stream_error_policy: StreamErrorPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub(crate) fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let model_id = non_empty(get_var("MODEL_ID"));
        let region = non_empty(get_var("AWS_REGION"))
            .or_else(|| non_empty(get_var("AWS_DEFAULT_REGION")))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let generation = GenerationOverrides {
            temperature: parse_non_negative_f64(get_var("TEMPERATURE").as_deref()),
            top_p: parse_non_negative_f64(get_var("TOP_P").as_deref()),
            top_k: parse_u32(get_var("TOP_K").as_deref()),
            max_tokens: parse_u32(get_var("MAX_TOKENS").as_deref()).filter(|value| *value > 0),
        };

        Self {
            model_pinned: model_id.is_some(),
            model_id: model_id.unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            region,
            stream: parse_bool(get_var("STREAM").as_deref(), DEFAULT_STREAM),
            generation,
            image: ImageParams::default(),
            chats_dir: parse_dir(get_var("CHATS_DIR").as_deref(), DEFAULT_CHATS_DIR),
            image_output_dir: parse_dir(
                get_var("IMAGE_OUTPUT_DIR").as_deref(),
                DEFAULT_IMAGE_OUTPUT_DIR,
            ),
            stream_error_policy: parse_stream_error_policy(
                get_var("STREAM_ERROR_POLICY").as_deref(),
            ),
        }
    }

    pub fn pin_model(&mut self, model_id: &str) {
        self.model_id = model_id.to_string();
        self.model_pinned = true;
    }

    // Image generation has its own default; a model chosen by MODEL_ID or
    // --model-id is kept as is.
    pub fn prefer_image_model(&mut self) {
        if !self.model_pinned {
            self.model_id = DEFAULT_IMAGE_MODEL_ID.to_string();
        }
    }

    pub fn generation_params(&self, provider: ProviderTag, streaming: bool) -> GenerationParams {
        let mut params = self.generation.resolve(provider);
        params.stream = streaming;
        params.image = self.image;
        params
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_non_negative_f64(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
}

fn parse_u32(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn parse_dir(raw: Option<&str>, default: &str) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn parse_stream_error_policy(raw: Option<&str>) -> StreamErrorPolicy {
    match raw.unwrap_or("abort").trim().to_ascii_lowercase().as_str() {
        "skip-turn" | "skip_turn" | "skip" => StreamErrorPolicy::SkipTurn,
        _ => StreamErrorPolicy::Abort,
    }
}

#[cfg(test)]
pub(crate) fn test_config(model_id: &str) -> Config {
    Config::from_env_with(|key| (key == "MODEL_ID").then(|| model_id.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::{
        Config, DEFAULT_CHATS_DIR, DEFAULT_IMAGE_MODEL_ID, DEFAULT_MODEL_ID, DEFAULT_REGION, GenerationOverrides,
        StreamErrorPolicy, parse_bool, parse_non_negative_f64, parse_stream_error_policy,
        parse_u32,
    };
    use crate::providers::ProviderTag;

    fn config_from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Config::from_env_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn from_env_uses_defaults_when_vars_are_missing() {
        let cfg = config_from_pairs(&[]);
        assert_eq!(cfg.model_id, DEFAULT_MODEL_ID);
        assert_eq!(cfg.region, DEFAULT_REGION);
        assert!(cfg.stream);
        assert_eq!(cfg.generation, GenerationOverrides::default());
        assert_eq!(cfg.chats_dir, PathBuf::from(DEFAULT_CHATS_DIR));
        assert_eq!(cfg.image_output_dir, PathBuf::from("."));
        assert_eq!(cfg.stream_error_policy, StreamErrorPolicy::Abort);
    }

    #[test]
    fn from_env_reads_configured_values() {
        let cfg = config_from_pairs(&[
            ("MODEL_ID", "cohere.command-text-v14"),
            ("AWS_REGION", "eu-central-1"),
            ("STREAM", "off"),
            ("TEMPERATURE", "0.2"),
            ("TOP_P", "0.5"),
            ("TOP_K", "40"),
            ("MAX_TOKENS", "128"),
            ("CHATS_DIR", "/tmp/chats"),
            ("IMAGE_OUTPUT_DIR", "output"),
            ("STREAM_ERROR_POLICY", "skip-turn"),
        ]);

        assert_eq!(cfg.model_id, "cohere.command-text-v14");
        assert_eq!(cfg.region, "eu-central-1");
        assert!(!cfg.stream);
        assert_eq!(
            cfg.generation,
            GenerationOverrides {
                temperature: Some(0.2),
                top_p: Some(0.5),
                top_k: Some(40),
                max_tokens: Some(128),
            }
        );
        assert_eq!(cfg.chats_dir, PathBuf::from("/tmp/chats"));
        assert_eq!(cfg.image_output_dir, PathBuf::from("output"));
        assert_eq!(cfg.stream_error_policy, StreamErrorPolicy::SkipTurn);
    }

    #[test]
    fn image_default_applies_only_when_no_model_was_chosen() {
        let mut cfg = config_from_pairs(&[]);
        cfg.prefer_image_model();
        assert_eq!(cfg.model_id, DEFAULT_IMAGE_MODEL_ID);

        let mut cfg = config_from_pairs(&[("MODEL_ID", "titan-image")]);
        cfg.prefer_image_model();
        assert_eq!(cfg.model_id, "titan-image");

        let mut cfg = config_from_pairs(&[]);
        cfg.pin_model("claude");
        cfg.prefer_image_model();
        assert_eq!(cfg.model_id, "claude");
    }

    #[test]
    fn region_falls_back_to_aws_default_region() {
        let cfg = config_from_pairs(&[("AWS_DEFAULT_REGION", "ap-southeast-2")]);
        assert_eq!(cfg.region, "ap-southeast-2");
    }

    #[test]
    fn invalid_generation_values_are_ignored() {
        let cfg = config_from_pairs(&[
            ("TEMPERATURE", "hot"),
            ("TOP_P", "-1"),
            ("TOP_K", "-3"),
            ("MAX_TOKENS", "0"),
        ]);
        assert_eq!(cfg.generation, GenerationOverrides::default());
    }

    #[test]
    fn overrides_layer_on_provider_defaults() {
        let overrides = GenerationOverrides {
            temperature: Some(0.1),
            ..GenerationOverrides::default()
        };
        let params = overrides.resolve(ProviderTag::Command);
        assert_eq!(params.temperature, 0.1);
        assert_eq!(params.max_tokens, 400);
        assert_eq!(params.top_p, 0.01);
    }

    #[test]
    fn generation_params_carry_the_stream_flag() {
        let cfg = config_from_pairs(&[]);
        assert!(cfg.generation_params(ProviderTag::Command, true).stream);
        assert!(!cfg.generation_params(ProviderTag::Command, false).stream);
    }

    #[test]
    fn parse_helpers_reject_garbage() {
        assert_eq!(parse_non_negative_f64(Some("NaN")), None);
        assert_eq!(parse_non_negative_f64(Some(" 0.7 ")), Some(0.7));
        assert_eq!(parse_u32(Some("x")), None);
        assert!(parse_bool(Some(" YES "), false));
        assert!(!parse_bool(Some("off"), true));
        assert!(parse_bool(Some("maybe"), true));
        assert_eq!(
            parse_stream_error_policy(Some("whatever")),
            StreamErrorPolicy::Abort
        );
        assert_eq!(
            parse_stream_error_policy(Some(" SKIP-TURN ")),
            StreamErrorPolicy::SkipTurn
        );
    }
}

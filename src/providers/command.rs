use serde::{Deserialize, Serialize};

use super::{ChunkContent, GenerationParams, ProviderTag, from_json, to_json};
use crate::error::ChatError;

const PROVIDER: ProviderTag = ProviderTag::Command;

#[derive(Debug, Serialize)]
struct CommandRequest<'a> {
    prompt: &'a str,
    temperature: f64,
    p: f64,
    k: u32,
    max_tokens: u32,
    stop_sequences: &'a [String],
    return_likelihoods: &'static str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    text: String,
}

pub(super) fn encode(prompt: &str, params: &GenerationParams) -> Result<Vec<u8>, ChatError> {
    let body = CommandRequest {
        prompt,
        temperature: params.temperature,
        p: params.top_p,
        k: params.top_k,
        max_tokens: params.max_tokens,
        stop_sequences: &params.stop_sequences,
        return_likelihoods: "NONE",
        stream: params.stream,
    };
    to_json(PROVIDER, &body)
}

pub(super) fn decode_chunk(bytes: &[u8]) -> Result<ChunkContent, ChatError> {
    let chunk: CommandResponse = from_json(PROVIDER, bytes)?;
    // the closing chunk carries only is_finished and metrics
    Ok(chunk
        .generations
        .into_iter()
        .next()
        .map(|generation| ChunkContent::text(generation.text))
        .unwrap_or(ChunkContent::Empty))
}

pub(super) fn decode_response(body: &[u8]) -> Result<String, ChatError> {
    let response: CommandResponse = from_json(PROVIDER, body)?;
    response
        .generations
        .into_iter()
        .next()
        .map(|generation| generation.text)
        .ok_or(ChatError::MissingField {
            provider: PROVIDER,
            field: "generations[0].text",
        })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{decode_chunk, decode_response, encode};
    use crate::error::ErrorKind;
    use crate::providers::{ChunkContent, GenerationParams, ProviderTag};

    #[test]
    fn stream_flag_is_echoed_into_the_body() {
        let mut params = GenerationParams::defaults_for(ProviderTag::Command);
        params.stream = true;
        let payload: Value = serde_json::from_slice(&encode("hi", &params).unwrap()).unwrap();

        assert_eq!(payload["stream"], true);
        assert_eq!(payload["return_likelihoods"], "NONE");
        assert_eq!(payload["max_tokens"], 400);
        assert_eq!(payload["k"], 0);
    }

    #[test]
    fn first_generation_is_the_fragment() {
        let chunk = br#"{"generations":[{"text":"Hel","index":0}]}"#;
        assert_eq!(
            decode_chunk(chunk).unwrap(),
            ChunkContent::Text("Hel".to_string())
        );
        assert_eq!(
            decode_chunk(br#"{"is_finished":true,"finish_reason":"COMPLETE"}"#).unwrap(),
            ChunkContent::Empty
        );
    }

    #[test]
    fn full_response_without_generations_is_a_decode_error() {
        let err = decode_response(br#"{"generations":[]}"#).expect_err("nothing to read");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(
            decode_response(br#"{"generations":[{"id":"g1","text":"done"}]}"#).unwrap(),
            "done"
        );
    }
}

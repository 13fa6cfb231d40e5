use serde::{Deserialize, Serialize};

use super::{ChunkContent, GenerationParams, ProviderTag, from_json, to_json};
use crate::error::ChatError;

const PROVIDER: ProviderTag = ProviderTag::Llama;

#[derive(Debug, Serialize)]
struct LlamaRequest<'a> {
    prompt: &'a str,
    temperature: f64,
    top_p: f64,
    max_gen_len: u32,
}

#[derive(Debug, Deserialize)]
struct LlamaResponse {
    #[serde(default)]
    generation: String,
}

pub(super) fn encode(prompt: &str, params: &GenerationParams) -> Result<Vec<u8>, ChatError> {
    let body = LlamaRequest {
        prompt,
        temperature: params.temperature,
        top_p: params.top_p,
        max_gen_len: params.max_tokens,
    };
    to_json(PROVIDER, &body)
}

pub(super) fn decode_chunk(bytes: &[u8]) -> Result<ChunkContent, ChatError> {
    let chunk: LlamaResponse = from_json(PROVIDER, bytes)?;
    Ok(ChunkContent::text(chunk.generation))
}

pub(super) fn decode_response(body: &[u8]) -> Result<String, ChatError> {
    let response: LlamaResponse = from_json(PROVIDER, body)?;
    Ok(response.generation)
}

#[cfg(test)]
mod tests {
    use super::decode_chunk;
    use crate::providers::ChunkContent;

    #[test]
    fn generation_field_is_the_fragment() {
        let chunk = br#"{"generation":" there","prompt_token_count":null,"generation_token_count":2,"stop_reason":null}"#;
        assert_eq!(
            decode_chunk(chunk).unwrap(),
            ChunkContent::Text(" there".to_string())
        );
    }
}

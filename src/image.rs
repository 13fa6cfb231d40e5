use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ChatError, ErrorKind};
use crate::message::ContentBlock;
use crate::models::{ContentType, ModelInfo};
use crate::providers::{self, PromptInput, stability};
use crate::transport::{Invocation, InvokeRequest, Transport};

fn media_type_for(path: &Path) -> Result<&'static str, ChatError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => Ok("image/png"),
        Some("jpg" | "jpeg") => Ok("image/jpeg"),
        Some("gif") => Ok("image/gif"),
        Some("webp") => Ok("image/webp"),
        _ => Err(ChatError::UnsupportedImageType(path.to_path_buf())),
    }
}

pub fn load_attachment(path: &Path) -> Result<ContentBlock, ChatError> {
    let media_type = media_type_for(path)?;
    let data = fs::read(path).map_err(|err| ChatError::file_io("read image", path, err))?;
    info!(path = %path.display(), media_type, bytes = data.len(), "loaded image attachment");
    Ok(ContentBlock::Image {
        data,
        media_type: media_type.to_string(),
    })
}

pub fn output_path(dir: &Path, timestamp: i64) -> PathBuf {
    dir.join(format!("output-{timestamp}.jpg"))
}

pub async fn generate(
    cfg: &Config,
    transport: &dyn Transport,
    model: &'static ModelInfo,
    prompt: &str,
    dir: &Path,
) -> Result<PathBuf, ChatError> {
    if model.content_type != ContentType::Image {
        return Err(ChatError::ImageGenerationUnsupported(model.model_id.to_string()));
    }

    let provider = model.provider;
    let params = cfg.generation_params(provider, false);
    let body = providers::encode(provider, PromptInput::Text(prompt), &params)?;
    let invocation = transport
        .invoke(InvokeRequest {
            provider,
            model_id: model.model_id,
            body,
            streaming: false,
        })
        .await?;

    let response = match invocation {
        Invocation::Complete(body) => body,
        Invocation::Stream(mut source) => {
            source.close()?;
            return Err(ChatError::Transport(format!(
                "model {} answered an image request with a stream",
                model.model_id
            )));
        }
    };
    let image = stability::decode_image(&response)?;

    fs::create_dir_all(dir).map_err(|err| ChatError::file_io("create directory", dir, err))?;
    let path = output_path(dir, Utc::now().timestamp());
    fs::write(&path, &image).map_err(|err| ChatError::file_io("write image", &path, err))?;
    info!(path = %path.display(), bytes = image.len(), "saved generated image");
    Ok(path)
}

// A generated image that cannot be written is reported, not fatal.
pub fn report_saved<W: Write>(
    saved: Result<PathBuf, ChatError>,
    out: &mut W,
) -> anyhow::Result<()> {
    match saved {
        Ok(path) => writeln!(out, "image saved to {}", path.display())?,
        Err(err) if err.kind() == ErrorKind::FileIo => {
            warn!(error = %err, "generated image was not saved");
            writeln!(out, "error writing to file: {err}")?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::{Value, json};

    use super::{generate, load_attachment, media_type_for, output_path, report_saved};
    use crate::config::test_config;
    use crate::error::{ChatError, ErrorKind};
    use crate::message::ContentBlock;
    use crate::models::lookup;
    use crate::transport::testing::{Scripted, SpyTransport};

    #[test]
    fn media_type_follows_the_extension() {
        assert_eq!(media_type_for(Path::new("a.PNG")).unwrap(), "image/png");
        assert_eq!(media_type_for(Path::new("a.jpeg")).unwrap(), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.webp")).unwrap(), "image/webp");

        let err = media_type_for(Path::new("notes.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(media_type_for(Path::new("no_extension")).is_err());
    }

    #[test]
    fn attachment_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.gif");
        fs::write(&path, b"GIF89a").unwrap();

        assert_eq!(
            load_attachment(&path).unwrap(),
            ContentBlock::Image {
                data: b"GIF89a".to_vec(),
                media_type: "image/gif".to_string(),
            }
        );

        let err = load_attachment(&dir.path().join("missing.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileIo);
    }

    #[test]
    fn output_files_are_named_by_timestamp() {
        assert_eq!(
            output_path(Path::new("out"), 1_700_000_000),
            Path::new("out/output-1700000000.jpg")
        );
    }

    #[tokio::test]
    async fn generated_image_is_decoded_and_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config("stability");
        cfg.image.seed = 7;
        let body = json!({
            "artifacts": [{ "base64": STANDARD.encode(b"jpeg bytes"), "finishReason": "SUCCESS" }]
        });
        let spy = SpyTransport::new().with_reply(Scripted::Complete(body.to_string().into_bytes()));

        let out_dir = dir.path().join("images");
        let path = generate(&cfg, &spy, lookup(&cfg.model_id).unwrap(), "a lighthouse", &out_dir)
            .await
            .unwrap();

        assert!(path.starts_with(dir.path().join("images")));
        assert_eq!(fs::read(&path).unwrap(), b"jpeg bytes");

        let calls = spy.calls.borrow();
        assert!(!calls[0].streaming);
        let request: Value = serde_json::from_slice(&calls[0].body).unwrap();
        assert_eq!(request["text_prompts"][0]["text"], "a lighthouse");
        assert_eq!(request["seed"], 7);
    }

    #[tokio::test]
    async fn text_models_cannot_generate_images() {
        let cfg = test_config("anthropic.claude-v2");
        let spy = SpyTransport::new();
        let err = generate(&cfg, &spy, lookup(&cfg.model_id).unwrap(), "x", Path::new("."))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ImageGenerationUnsupported(_)));
        assert_eq!(spy.call_count(), 0);
    }

    fn stability_reply() -> Scripted {
        let body = json!({
            "artifacts": [{ "base64": STANDARD.encode(b"jpeg bytes"), "finishReason": "SUCCESS" }]
        });
        Scripted::Complete(body.to_string().into_bytes())
    }

    #[tokio::test]
    async fn unwritable_output_is_reported_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let blocking_file = dir.path().join("not-a-directory");
        fs::write(&blocking_file, "block").unwrap();
        let cfg = test_config("stability");
        let spy = SpyTransport::new().with_reply(stability_reply());

        let saved = generate(&cfg, &spy, lookup(&cfg.model_id).unwrap(), "x", &blocking_file).await;
        assert_eq!(saved.as_ref().unwrap_err().kind(), ErrorKind::FileIo);

        let mut out = Vec::new();
        report_saved(saved, &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("error writing to file:"), "{printed}");
    }

    #[test]
    fn other_image_failures_stay_fatal() {
        let mut out = Vec::new();
        let err = report_saved(Err(ChatError::Transport("throttled".to_string())), &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("throttled"));
        assert!(out.is_empty());

        report_saved(Ok(Path::new("out/output-1.jpg").to_path_buf()), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "image saved to out/output-1.jpg\n");
    }
}

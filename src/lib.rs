pub mod bedrock;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod image;
pub mod logging;
pub mod message;
pub mod models;
pub mod providers;
pub mod repl;
pub mod session;
pub mod stream;
pub mod transcript;
pub mod transport;

use std::io::{self, IsTerminal, Read, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bedrock::BedrockTransport;
use cli::{Cli, Command};
use config::Config;
use error::ChatError;
use models::{ContentType, MODELS};
use providers::ProviderTag;
use repl::run_repl;
use session::ChatSession;
use stream::WriterSink;

const PROMPT_IMAGE_DIR: &str = "output";

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let mut cfg = Config::from_env();
    cli.apply(&mut cfg);
    info!(
        model_id = %cfg.model_id,
        region = %cfg.region,
        stream = cfg.stream,
        chats_dir = %cfg.chats_dir.display(),
        stream_error_policy = cfg.stream_error_policy.as_str(),
        "loaded runtime configuration"
    );

    match &cli.command {
        Command::Version => {
            println!("chat-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Models { remote, provider } => {
            let provider = provider.as_deref().map(ProviderTag::parse).transpose()?;
            let mut out = io::stdout().lock();
            if !remote {
                return write_model_table(&mut out, provider);
            }
            let remote = bedrock::list_foundation_models(&cfg).await?;
            for model in remote {
                if !matches_provider(&model.model_id, provider) {
                    continue;
                }
                writeln!(
                    out,
                    "{:<50} {}",
                    model.model_id,
                    model.provider_name.as_deref().unwrap_or("-")
                )?;
            }
            Ok(())
        }
        Command::Chat { image: attachment } => {
            let model = models::lookup(&cfg.model_id)?;
            let transport = BedrockTransport::new(&cfg).await;
            let mut session = ChatSession::new(&cfg, &transport, model)?;
            if let Some(path) = attachment {
                session = session.with_attachment(image::load_attachment(path)?)?;
            }
            run_repl(&mut session, &cfg, io::stdin().lock(), io::stdout()).await
        }
        Command::Prompt {
            text,
            image: attachment,
        } => {
            let model = models::lookup(&cfg.model_id)?;
            if model.content_type == ContentType::Image {
                if attachment.is_some() {
                    return Err(ChatError::VisionUnsupported(model.model_id.to_string()).into());
                }
                let transport = BedrockTransport::new(&cfg).await;
                let dir = cfg.image_output_dir.join(PROMPT_IMAGE_DIR);
                let saved = image::generate(&cfg, &transport, model, text, &dir).await;
                return image::report_saved(saved, &mut io::stdout().lock());
            }
            let prompt = match read_piped_document()? {
                Some(document) => append_document(text, &document),
                None => text.clone(),
            };
            let transport = BedrockTransport::new(&cfg).await;
            let mut session = ChatSession::new(&cfg, &transport, model)?;
            if let Some(path) = attachment {
                session = session.with_attachment(image::load_attachment(path)?)?;
            }
            session
                .run_turn(&prompt, &mut WriterSink::new(io::stdout().lock()))
                .await?;
            println!();
            Ok(())
        }
        Command::Image { text, .. } => {
            let model = models::lookup(&cfg.model_id)?;
            let prompt = match read_piped_document()? {
                Some(document) => prepend_document(text, &document),
                None => text.clone(),
            };
            let transport = BedrockTransport::new(&cfg).await;
            let saved =
                image::generate(&cfg, &transport, model, &prompt, &cfg.image_output_dir).await;
            image::report_saved(saved, &mut io::stdout().lock())
        }
    }
}

fn matches_provider(model_id: &str, provider: Option<ProviderTag>) -> bool {
    match provider {
        None => true,
        Some(tag) => models::lookup(model_id).is_ok_and(|model| model.provider == tag),
    }
}

fn write_model_table<W: Write>(out: &mut W, provider: Option<ProviderTag>) -> Result<()> {
    writeln!(
        out,
        "{:<42} {:<10} {:<6} {:<9} VISION",
        "MODEL ID", "FAMILY", "TYPE", "STREAMING"
    )?;
    for model in MODELS
        .iter()
        .filter(|model| provider.is_none_or(|tag| model.provider == tag))
    {
        writeln!(
            out,
            "{:<42} {:<10} {:<6} {:<9} {}",
            model.model_id,
            model.family,
            model.content_type.as_str(),
            yes_no(model.supports_streaming),
            yes_no(model.supports_vision)
        )?;
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn read_piped_document() -> Result<Option<String>> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut document = String::new();
    stdin
        .read_to_string(&mut document)
        .context("Failed to read document from stdin")?;
    Ok((!document.trim().is_empty()).then_some(document))
}

fn append_document(prompt: &str, document: &str) -> String {
    format!("{prompt}\n\n<document>\n\n{document}\n\n</document>")
}

fn prepend_document(prompt: &str, document: &str) -> String {
    format!("<document>\n\n{document}\n\n</document>\n\n{prompt}")
}

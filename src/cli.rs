use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

/// Chat with foundation models hosted on Amazon Bedrock.
#[derive(Parser, Debug)]
#[command(name = "chat-cli", about = "Chat with foundation models hosted on Amazon Bedrock")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Model id or family shorthand, e.g. `claude3`.
    #[arg(short = 'm', long, global = true)]
    pub model_id: Option<String>,

    /// AWS region hosting the model.
    #[arg(short = 'r', long, global = true)]
    pub region: Option<String>,

    /// Wait for the complete reply instead of streaming it.
    #[arg(long, global = true)]
    pub no_stream: bool,

    #[arg(long, global = true)]
    pub temperature: Option<f64>,

    #[arg(long, global = true)]
    pub top_p: Option<f64>,

    #[arg(long, global = true)]
    pub top_k: Option<u32>,

    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Start an interactive chat session.
    Chat {
        /// Image to attach to the first message.
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Send a single prompt. Text piped on stdin is appended as a document.
    Prompt {
        text: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Generate an image from a text prompt.
    Image {
        text: String,
        /// How strictly the image follows the prompt.
        #[arg(long)]
        scale: Option<f64>,
        /// Number of diffusion steps.
        #[arg(long)]
        steps: Option<u32>,
        #[arg(long)]
        seed: Option<u32>,
    },
    /// List supported models.
    Models {
        /// Ask the service which foundation models the region offers.
        #[arg(long)]
        remote: bool,
        /// Only list models of one provider family, e.g. `claude-messages`.
        #[arg(long)]
        provider: Option<String>,
    },
    /// Print the version.
    Version,
}

impl Cli {
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(model_id) = &self.model_id {
            cfg.pin_model(model_id);
        }
        if let Some(region) = &self.region {
            cfg.region = region.clone();
        }
        if self.no_stream {
            cfg.stream = false;
        }
        if self.temperature.is_some() {
            cfg.generation.temperature = self.temperature;
        }
        if self.top_p.is_some() {
            cfg.generation.top_p = self.top_p;
        }
        if self.top_k.is_some() {
            cfg.generation.top_k = self.top_k;
        }
        if self.max_tokens.is_some() {
            cfg.generation.max_tokens = self.max_tokens;
        }
        if let Command::Image { scale, steps, seed, .. } = &self.command {
            cfg.prefer_image_model();
            if let Some(scale) = scale {
                cfg.image.cfg_scale = *scale;
            }
            if let Some(steps) = steps {
                cfg.image.steps = *steps;
            }
            if let Some(seed) = seed {
                cfg.image.seed = *seed;
            }
        }
    }
}

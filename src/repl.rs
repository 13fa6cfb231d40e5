use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::{Config, StreamErrorPolicy};
use crate::error::{ChatError, ErrorKind};
use crate::session::ChatSession;
use crate::stream::WriterSink;
use crate::transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlWord {
    Quit,
    Save,
    Load,
    Clear,
}

impl ControlWord {
    fn parse(input: &str) -> Option<Self> {
        [Self::Quit, Self::Save, Self::Load, Self::Clear]
            .into_iter()
            .find(|word| input.eq_ignore_ascii_case(word.as_str()))
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::Save => "save",
            Self::Load => "load",
            Self::Clear => "clear",
        }
    }
}

pub async fn run_repl<R, W>(
    session: &mut ChatSession<'_>,
    cfg: &Config,
    mut input: R,
    mut output: W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Hi there. You can ask me stuff!")?;
    writeln!(
        output,
        "model: {} (type 'save', 'load', 'clear' or 'quit')",
        session.model().model_id
    )?;

    loop {
        write!(output, "> ")?;
        output.flush().context("Failed to flush output")?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("Failed to read input")?;
        if read == 0 {
            break;
        }

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }

        match ControlWord::parse(prompt) {
            Some(ControlWord::Quit) => break,
            Some(ControlWord::Save) => {
                let path = transcript::todays_transcript(&cfg.chats_dir);
                match transcript::save(&path, &session.conversation().render()) {
                    Ok(()) => writeln!(output, "chat transcript saved to {}\n", path.display())?,
                    Err(err) => report(&mut output, &err)?,
                }
            }
            Some(ControlWord::Load) => {
                let path = transcript::todays_transcript(&cfg.chats_dir);
                match transcript::load(&path) {
                    Ok(text) => {
                        session.conversation_mut().restore(&text);
                        writeln!(output, "{text}\n")?;
                    }
                    Err(err) => report(&mut output, &err)?,
                }
            }
            Some(ControlWord::Clear) => {
                session.conversation_mut().reset();
                writeln!(output, "Conversation cleared.\n")?;
            }
            None => {
                let result = session
                    .run_turn(prompt, &mut WriterSink::new(&mut output))
                    .await;
                writeln!(output, "\n")?;
                if let Err(err) = result {
                    skip_or_abort(cfg.stream_error_policy, &mut output, err)?;
                }
            }
        }
    }

    Ok(())
}

fn report<W: Write>(output: &mut W, err: &ChatError) -> Result<()> {
    warn!(error = %err, "control word failed");
    writeln!(output, "error: {err}\n")?;
    Ok(())
}

fn skip_or_abort<W: Write>(
    policy: StreamErrorPolicy,
    output: &mut W,
    err: ChatError,
) -> Result<()> {
    let recoverable = matches!(err.kind(), ErrorKind::Transport | ErrorKind::Decode);
    if recoverable && policy == StreamErrorPolicy::SkipTurn {
        warn!(error = %err, policy = policy.as_str(), "turn failed; continuing");
        writeln!(output, "error: {err}; the turn was discarded\n")?;
        return Ok(());
    }
    Err(err).context("chat turn failed")
}

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

const DEFAULT_LOG_FILTER: &str = "warn,chat_cli=info";
const DEFAULT_LOG_FILE_PATH: &str = "logs/chat-cli.log";
const FALLBACK_LOG_FILE_NAME: &str = "chat-cli.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogOutput {
    Stderr,
    File,
    Both,
}

impl LogOutput {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Stderr => "stderr",
            Self::File => "file",
            Self::Both => "both",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogSettings {
    format: LogFormat,
    output: LogOutput,
    file_path: PathBuf,
}

impl LogSettings {
    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            format: parse_log_format(get_var("LOG_FORMAT").as_deref()),
            output: parse_log_output(get_var("LOG_OUTPUT").as_deref()),
            file_path: parse_log_file_path(get_var("LOG_FILE_PATH").as_deref()),
        }
    }
}

fn normalized(raw: Option<&str>) -> String {
    raw.unwrap_or_default().trim().to_ascii_lowercase()
}

fn parse_log_format(raw: Option<&str>) -> LogFormat {
    match normalized(raw).as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

fn parse_log_output(raw: Option<&str>) -> LogOutput {
    match normalized(raw).as_str() {
        "file" => LogOutput::File,
        "both" => LogOutput::Both,
        _ => LogOutput::Stderr,
    }
}

fn parse_log_file_path(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_PATH))
}

fn open_rolling_file(path: &Path) -> io::Result<(NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .unwrap_or_else(|| OsStr::new(FALLBACK_LOG_FILE_NAME));

    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn install(format: LogFormat, writer: BoxMakeWriter) -> InitResult {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer);
    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}

fn install_with_file(settings: &LogSettings) -> InitResult {
    let keep_stderr = settings.output == LogOutput::Both;
    match open_rolling_file(&settings.file_path) {
        Ok((file_writer, guard)) => {
            let writer = if keep_stderr {
                BoxMakeWriter::new(io::stderr.and(file_writer))
            } else {
                BoxMakeWriter::new(file_writer)
            };
            let result = install(settings.format, writer);
            if result.is_ok() {
                let _ = LOG_GUARD.set(guard);
            }
            result
        }
        Err(err) => {
            // The subscriber is not up yet, so this one goes straight to stderr.
            eprintln!(
                "chat-cli: failed to initialize LOG_OUTPUT={} at '{}': {}; {}",
                settings.output.as_str(),
                settings.file_path.display(),
                err,
                if keep_stderr {
                    "using stderr only"
                } else {
                    "using stderr instead"
                }
            );
            install(settings.format, BoxMakeWriter::new(io::stderr))
        }
    }
}

pub fn init() {
    let settings = LogSettings::from_env_with(|key| env::var(key).ok());
    let _ = match settings.output {
        LogOutput::Stderr => install(settings.format, BoxMakeWriter::new(io::stderr)),
        LogOutput::File | LogOutput::Both => install_with_file(&settings),
    };
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{
        DEFAULT_LOG_FILE_PATH, LogFormat, LogOutput, LogSettings, open_rolling_file,
        parse_log_file_path, parse_log_format, parse_log_output,
    };

    #[test]
    fn settings_default_to_pretty_stderr() {
        let settings = LogSettings::from_env_with(|_| None);
        assert_eq!(settings.format, LogFormat::Pretty);
        assert_eq!(settings.output, LogOutput::Stderr);
        assert_eq!(settings.file_path, PathBuf::from(DEFAULT_LOG_FILE_PATH));
    }

    #[test]
    fn settings_read_every_variable() {
        let settings = LogSettings::from_env_with(|key| match key {
            "LOG_FORMAT" => Some("JSON".to_string()),
            "LOG_OUTPUT" => Some("both".to_string()),
            "LOG_FILE_PATH" => Some("/var/log/chat.log".to_string()),
            _ => None,
        });
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.output, LogOutput::Both);
        assert_eq!(settings.file_path, PathBuf::from("/var/log/chat.log"));
    }

    #[test]
    fn unknown_values_fall_back() {
        assert_eq!(parse_log_format(Some("xml")), LogFormat::Pretty);
        assert_eq!(parse_log_output(Some("syslog")), LogOutput::Stderr);
        assert_eq!(parse_log_output(Some(" FILE ")), LogOutput::File);
        assert_eq!(
            parse_log_file_path(Some("   ")),
            PathBuf::from(DEFAULT_LOG_FILE_PATH)
        );
    }

    #[test]
    fn rolling_file_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("chat.log");
        let (_writer, _guard) = open_rolling_file(&path).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
    }
}

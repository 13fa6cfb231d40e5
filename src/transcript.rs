use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::error::ChatError;

pub fn transcript_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.txt", date.format("%Y-%m-%d")))
}

pub fn todays_transcript(dir: &Path) -> PathBuf {
    transcript_path(dir, Local::now().date_naive())
}

pub fn save(path: &Path, transcript: &str) -> Result<(), ChatError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|err| ChatError::file_io("create directory", dir, err))?;
    }
    fs::write(path, transcript).map_err(|err| ChatError::file_io("write transcript", path, err))?;
    info!(path = %path.display(), bytes = transcript.len(), "saved chat transcript");
    Ok(())
}

pub fn load(path: &Path) -> Result<String, ChatError> {
    let transcript =
        fs::read_to_string(path).map_err(|err| ChatError::file_io("read transcript", path, err))?;
    info!(path = %path.display(), bytes = transcript.len(), "loaded chat transcript");
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::NaiveDate;

    use super::{load, save, transcript_path};
    use crate::error::ErrorKind;

    #[test]
    fn path_is_named_after_the_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            transcript_path(Path::new("chats"), date),
            Path::new("chats/2024-03-07.txt")
        );
    }

    #[test]
    fn save_then_load_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("2024-03-07.txt");
        let transcript = "hi\n\nAssistant: hello\n\nHuman: trailing newline\n";

        save(&path, transcript).unwrap();
        assert_eq!(load(&path).unwrap(), transcript);
    }

    #[test]
    fn missing_file_is_a_file_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.txt")).expect_err("file does not exist");
        assert_eq!(err.kind(), ErrorKind::FileIo);
    }
}

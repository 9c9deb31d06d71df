use crate::info_log;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_WORDBANK_FILE: &str = "words.txt";
const APP_DIR: &str = "wordle-client";

#[derive(Debug, Error)]
pub enum WordbankError {
    #[error("failed to read word list '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("word list '{}' has no 5-letter words", .path.display())]
    Empty { path: PathBuf },
    #[error("no word list given and none found at {}", join_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalize(line: &str) -> Option<String> {
    let word = line.trim().to_ascii_lowercase();
    (word.len() == 5 && word.bytes().all(|b| b.is_ascii_lowercase())).then_some(word)
}

/// Keeps valid 5-letter words in file order, lowercased; everything else is skipped.
pub fn load_wordbank_from_str(data: &str) -> Vec<String> {
    data.lines().filter_map(normalize).collect()
}

pub fn load_wordbank_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, WordbankError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| WordbankError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let words = load_wordbank_from_str(&data);
    if words.is_empty() {
        return Err(WordbankError::Empty {
            path: path.to_path_buf(),
        });
    }
    info_log!("loaded {} words from {}", words.len(), path.display());
    Ok(words)
}

/// Places a word list is looked for when none is given: the working directory, then the user data dir.
pub fn default_wordbank_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(DEFAULT_WORDBANK_FILE)];
    if let Some(data_dir) = dirs::data_dir() {
        paths.push(data_dir.join(APP_DIR).join(DEFAULT_WORDBANK_FILE));
    }
    paths
}

pub fn resolve_wordbank_path(explicit: Option<&Path>) -> Result<PathBuf, WordbankError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let searched = default_wordbank_paths();
    searched
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or(WordbankError::NotFound { searched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_load_wordbank_from_str_filters_and_lowercases() {
        let words = load_wordbank_from_str("aahed\nSLATE\n  crane \nabc\ntoolong\nfo0ds\n\n");
        assert_eq!(words, vec!["aahed", "slate", "crane"]);
    }

    #[test]
    fn test_load_wordbank_from_str_keeps_order() {
        let words = load_wordbank_from_str("zunis\naahed\nmamma\n");
        assert_eq!(words, vec!["zunis", "aahed", "mamma"]);
    }

    #[test]
    fn test_load_wordbank_from_file() {
        let path = std::env::temp_dir().join("wordle_client_wordbank_test.txt");
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "aahed").unwrap();
            writeln!(file, "slate").unwrap();
            writeln!(file, "zunis").unwrap();
        }
        let words = load_wordbank_from_file(&path).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0], "aahed");
        assert_eq!(words[words.len() - 1], "zunis");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_empty_wordbank_is_an_error() {
        let path = std::env::temp_dir().join("wordle_client_empty_wordbank_test.txt");
        File::create(&path).unwrap();
        let err = load_wordbank_from_file(&path).unwrap_err();
        assert!(matches!(err, WordbankError::Empty { .. }));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_wordbank() {
        let err = load_wordbank_from_file("/definitely/not/here/words.txt").unwrap_err();
        assert!(matches!(err, WordbankError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here/words.txt"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = Path::new("/some/where.txt");
        assert_eq!(resolve_wordbank_path(Some(path)).unwrap(), path);
    }

    #[test]
    fn test_default_paths_start_with_working_directory() {
        let paths = default_wordbank_paths();
        assert_eq!(paths[0], PathBuf::from("words.txt"));
    }
}

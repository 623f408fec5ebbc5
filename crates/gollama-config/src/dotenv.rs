//! Minimal `.env` loader (KEY=VALUE lines).

use std::path::Path;

/// Parse `.env` contents into key/value pairs. Blank lines and `#`
/// comments are skipped, surrounding quotes are stripped.
pub fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Load variables from `path` into the process environment. Variables
/// that are already set are left alone. Returns how many were applied.
pub fn load_dotenv(path: impl AsRef<Path>) -> usize {
    let Ok(contents) = std::fs::read_to_string(path.as_ref()) else {
        return 0;
    };

    let mut applied = 0;
    for (key, value) in parse_dotenv(&contents) {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, value);
            applied += 1;
        }
    }
    tracing::debug!(path = %path.as_ref().display(), applied, "Loaded .env file");
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_comments_and_quotes() {
        let pairs = parse_dotenv(
            "# comment\n\nPORT=9000\nBASE_URL=\"http://llm:11434/v1\"\nGITHUB_TOKEN='ghp_x'\nnot a pair\n",
        );
        assert_eq!(
            pairs,
            vec![
                ("PORT".to_string(), "9000".to_string()),
                ("BASE_URL".to_string(), "http://llm:11434/v1".to_string()),
                ("GITHUB_TOKEN".to_string(), "ghp_x".to_string()),
            ]
        );
    }

    #[test]
    fn missing_file_applies_nothing() {
        assert_eq!(load_dotenv("/definitely/not/here/.env"), 0);
    }

    #[test]
    fn existing_variables_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "GOLLAMA_DOTENV_TEST_SET=from_file\nGOLLAMA_DOTENV_TEST_NEW=fresh\n",
        )
        .unwrap();

        std::env::set_var("GOLLAMA_DOTENV_TEST_SET", "from_process");
        let applied = load_dotenv(&path);

        assert_eq!(applied, 1);
        assert_eq!(std::env::var("GOLLAMA_DOTENV_TEST_SET").unwrap(), "from_process");
        assert_eq!(std::env::var("GOLLAMA_DOTENV_TEST_NEW").unwrap(), "fresh");
    }
}

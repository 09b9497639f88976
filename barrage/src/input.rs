//! Loaders for the auxiliary input files: POST data, url lists, user-agent
//! lists and cookies.
//!
//! The `parse_*` functions are pure; the `load_*` functions read a file and
//! hand its contents to them. Callers are expected to degrade to defaults when
//! a load fails.
use std::path::Path;

use crate::{cookie::Cookie, error::InputError};

/// One `key = value` pair per line. Blank lines, lines shorter than three
/// characters and lines without `=` are skipped.
pub fn parse_post_data(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter(|line| line.trim().len() >= 3)
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// One entry per line, trimmed, blank lines skipped.
pub fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// One cookie per line, see [`Cookie::parse_line`].
pub fn parse_cookies(contents: &str) -> Vec<Cookie> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(Cookie::parse_line)
        .collect()
}

async fn read(path: &Path) -> Result<String, InputError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InputError {
            path: path.to_path_buf(),
            source,
        })
}

pub async fn load_post_data(path: &Path) -> Result<Vec<(String, String)>, InputError> {
    Ok(parse_post_data(&read(path).await?))
}

pub async fn load_lines(path: &Path) -> Result<Vec<String>, InputError> {
    Ok(parse_lines(&read(path).await?))
}

pub async fn load_cookies(path: &Path) -> Result<Vec<Cookie>, InputError> {
    Ok(parse_cookies(&read(path).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_data_skips_short_and_malformed_lines() {
        let parsed = parse_post_data("user = alice\n\nx\npassword=s3cret=\nno separator here\n =v\n");
        assert_eq!(
            parsed,
            vec![
                ("user".to_owned(), "alice".to_owned()),
                ("password".to_owned(), "s3cret=".to_owned()),
            ]
        );
    }

    #[test]
    fn lines_are_trimmed() {
        let parsed = parse_lines("  http://a/  \n\n\thttp://b/\n   \n");
        assert_eq!(parsed, vec!["http://a/", "http://b/"]);
    }

    #[test]
    fn cookies_skip_blank_and_nameless_lines() {
        let parsed = parse_cookies("name=a~value=1\n\nvalue=2\nname=b~value=3~path=/x\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], Cookie::new("a", "1"));
        assert_eq!(parsed[1].path.as_deref(), Some("/x"));
    }

    #[tokio::test]
    async fn missing_file_is_an_input_error() {
        let err = load_lines(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.path, Path::new("/definitely/not/here.txt"));
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.txt");
        tokio::fs::write(&path, "curl/8.0\nwget/1.21\n").await.unwrap();
        assert_eq!(load_lines(&path).await.unwrap(), vec!["curl/8.0", "wget/1.21"]);
    }
}

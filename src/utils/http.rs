// src/utils/http.rs

//! HTTP client utilities.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, HeaderPair};

/// Headers sent with every request before custom headers are applied.
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8,application/json",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("DNT", "1"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let timeout = Duration::try_from_secs_f64(config.timeout_secs).map_err(|e| {
        AppError::config(format!("invalid timeout {}: {e}", config.timeout_secs))
    })?;

    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(build_headers(&config.headers)?)
        .timeout(timeout)
        .redirect(Policy::limited(config.max_redirects));

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }

    Ok(builder.build()?)
}

/// Merge default and custom headers. Later entries replace earlier ones
/// with the same (case-insensitive) name.
pub fn build_headers(custom: &[HeaderPair]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let defaults = DEFAULT_HEADERS
        .iter()
        .map(|(name, value)| (*name, *value));
    let custom = custom
        .iter()
        .map(|pair| (pair.name.as_str(), pair.value.as_str()));

    for (name, value) in defaults.chain(custom) {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("invalid value for header '{name}': {e}")))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Parse a `Name: Value` header line.
pub fn parse_header_line(line: &str) -> Option<HeaderPair> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(HeaderPair {
        name: name.to_string(),
        value: value.trim().to_string(),
    })
}

/// Parse header lines, warning about and skipping malformed ones.
pub fn parse_header_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<HeaderPair> {
    lines
        .into_iter()
        .filter_map(|line| {
            let parsed = parse_header_line(line);
            if parsed.is_none() {
                log::warn!("Invalid header format (ignoring): {}", line);
            }
            parsed
        })
        .collect()
}

/// Load headers from a file, one `Name: Value` per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn load_headers_file(path: impl AsRef<Path>) -> Result<Vec<HeaderPair>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let headers = parse_header_lines(lines);
    log::info!(
        "Loaded {} custom headers from {}",
        headers.len(),
        path.as_ref().display()
    );
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_header_line() {
        let pair = parse_header_line("Authorization: Bearer a:b").unwrap();
        assert_eq!(pair.name, "Authorization");
        assert_eq!(pair.value, "Bearer a:b");

        assert!(parse_header_line("no separator").is_none());
        assert!(parse_header_line(": value").is_none());
    }

    #[test]
    fn test_later_headers_override_earlier() {
        let custom = vec![
            HeaderPair::new("Cookie", "session=old"),
            HeaderPair::new("cookie", "session=new"),
            HeaderPair::new("Accept", "application/json"),
        ];
        let headers = build_headers(&custom).unwrap();

        assert_eq!(headers.get("cookie").unwrap(), "session=new");
        assert_eq!(headers.get("accept").unwrap(), "application/json");
        assert_eq!(headers.get("dnt").unwrap(), "1");
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let custom = vec![HeaderPair::new("Bad Header", "x")];
        assert!(build_headers(&custom).is_err());
    }

    #[test]
    fn test_load_headers_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# auth").unwrap();
        writeln!(file, "Cookie: a=1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "garbage line").unwrap();
        writeln!(file, "X-Test: yes").unwrap();

        let headers = load_headers_file(file.path()).unwrap();
        assert_eq!(
            headers,
            vec![HeaderPair::new("Cookie", "a=1"), HeaderPair::new("X-Test", "yes")]
        );
    }

    #[test]
    fn test_create_client_with_proxy() {
        let mut config = CrawlerConfig::default();
        config.proxy = Some("socks5://127.0.0.1:1080".to_string());
        assert!(create_async_client(&config).is_ok());
    }
}

//! Web page sampling adapter and URL list loading.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;

use super::http::{advertised_reset, build_client, transport_error};
use super::PageSource;
use crate::config::PageConfig;
use crate::domain::PageSample;
use crate::error::{ConfigError, FetchError, FetchResult};

pub struct HttpPageSource {
    http: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(config: &PageConfig) -> Result<Self, ConfigError> {
        let http = build_client(
            &config.user_agent,
            config.request_timeout,
            config.accept_invalid_certs,
        )?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn sample(&self, url: &str) -> FetchResult<PageSample> {
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Throttled {
                retry_at: advertised_reset(response.headers(), Utc::now()),
            });
        }
        if status.is_server_error() {
            return Err(FetchError::Transient(format!("{url} returned {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Fatal(format!("{url} returned {status}")));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        Ok(PageSample::from_body(&body, status.as_u16(), Utc::now()))
    }
}

/// Parse a URL list: one URL per line, blank lines and `#` comments skipped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_url_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::UrlList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_url_list(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_list_skips_blanks_and_comments() {
        let text = "# production\nhttps://example.com\n\n   \nhttps://api.example.com/status  \n#https://old.example.com\n";
        assert_eq!(
            parse_url_list(text),
            vec![
                "https://example.com".to_string(),
                "https://api.example.com/status".to_string()
            ]
        );
    }

    #[test]
    fn missing_url_list_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_url_list(&dir.path().join("urls.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::UrlList { .. }));
    }

    #[test]
    fn reads_url_list_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "https://example.com\n").unwrap();
        assert_eq!(read_url_list(&path).unwrap(), vec!["https://example.com".to_string()]);
    }

    #[test]
    fn source_builds_from_default_config() {
        assert!(HttpPageSource::new(&PageConfig::default()).is_ok());
    }
}

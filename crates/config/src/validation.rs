// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use url::Url;

/// An absolute http(s) URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValidUrl(Url);

impl ValidUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The URL without a trailing slash, for joining endpoint paths onto
    pub fn base(&self) -> String {
        self.0.as_str().trim_end_matches('/').to_string()
    }

    /// `base()` followed by `path`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base(), path.trim_start_matches('/'))
    }
}

impl FromStr for ValidUrl {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Unsupported URL scheme '{}' in {s}", url.scheme());
        }
        Ok(ValidUrl(url))
    }
}

impl TryFrom<String> for ValidUrl {
    type Error = anyhow::Error;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValidUrl> for String {
    fn from(value: ValidUrl) -> Self {
        value.0.to_string()
    }
}

impl fmt::Display for ValidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let url: ValidUrl = "http://192.168.1.10:5000/".parse().unwrap();
        assert_eq!(url.base(), "http://192.168.1.10:5000");
        assert_eq!(url.endpoint("/cipher"), "http://192.168.1.10:5000/cipher");
        assert_eq!(url.endpoint("ping"), "http://192.168.1.10:5000/ping");

        let nested: ValidUrl = "https://agg.example.org/api".parse().unwrap();
        assert_eq!(nested.endpoint("ping"), "https://agg.example.org/api/ping");
    }

    #[test]
    fn rejects_relative_and_non_http_urls() {
        assert!("localhost:5000".parse::<ValidUrl>().is_err());
        assert!("/cipher".parse::<ValidUrl>().is_err());
        assert!("ftp://example.org".parse::<ValidUrl>().is_err());
    }
}

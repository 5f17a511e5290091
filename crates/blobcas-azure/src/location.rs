//! Location strings of the form `scheme://host/container?<sas-token>`.
//!
//! The scheme only selects the store implementation; the container is
//! always reached over `https`. The raw query string is the shared-access
//! signature granting access to it.

use url::Url;

use blobcas_container::Credentials;
use blobcas_store::{StoreError, StoreResult};

/// Container URI and credentials extracted from a location string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub container_uri: Url,
    pub credentials: Credentials,
}

impl Location {
    /// Parse a location string.
    pub fn parse(location: &str) -> StoreResult<Self> {
        let url = Url::parse(location)
            .map_err(|e| StoreError::Config(format!("invalid store location: {e}")))?;
        Self::from_url(&url)
    }

    /// Split an already-parsed location URL.
    pub fn from_url(url: &Url) -> StoreResult<Self> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| StoreError::Config(format!("store location has no host: {url}")))?;

        let path = url.path().trim_end_matches('/');
        if path.is_empty() {
            return Err(StoreError::Config(format!(
                "store location has no container path: {url}"
            )));
        }

        let token = url.query().filter(|q| !q.is_empty()).ok_or_else(|| {
            StoreError::Config("store location is missing a shared access signature".into())
        })?;
        let credentials = Credentials::sas(token)?;

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let container_uri = Url::parse(&format!("https://{authority}{path}"))
            .map_err(|e| StoreError::Config(format!("invalid container URI: {e}")))?;

        Ok(Self {
            container_uri,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_uri_and_token() {
        let loc = Location::parse("azblob://acct.blob.example.net/blocks?sv=2021&sig=abc").unwrap();
        assert_eq!(loc.container_uri.as_str(), "https://acct.blob.example.net/blocks");
        match loc.credentials {
            Credentials::Sas(token) => assert_eq!(token.as_query(), "sv=2021&sig=abc"),
            other => panic!("expected SAS credentials, got {other:?}"),
        }
    }

    #[test]
    fn keeps_port_and_nested_path() {
        let loc = Location::parse("azblob://127.0.0.1:10000/devaccount/blocks/?sig=x").unwrap();
        assert_eq!(
            loc.container_uri.as_str(),
            "https://127.0.0.1:10000/devaccount/blocks"
        );
    }

    #[test]
    fn missing_token_is_rejected() {
        for location in ["azblob://acct.example.net/blocks", "azblob://acct.example.net/blocks?"] {
            let err = Location::parse(location).unwrap_err();
            assert!(matches!(err, StoreError::Config(_)), "{location}");
        }
    }

    #[test]
    fn missing_host_or_container_is_rejected() {
        assert!(Location::parse("azblob:///blocks?sig=x").is_err());
        assert!(Location::parse("azblob://acct.example.net/?sig=x").is_err());
        assert!(Location::parse("not a location").is_err());
    }
}

use std::fmt;

use url::form_urlencoded;

use crate::error::{ContainerError, ContainerResult};

/// Query parameter carrying the SAS signature.
const SIGNATURE_PARAM: &str = "sig";

/// Shared-access signature token: the raw query string granting access.
///
/// The token is kept verbatim so it can be appended to request URIs as-is.
/// `Debug` and `Display` redact the signature.
#[derive(Clone, PartialEq, Eq)]
pub struct SasToken(String);

impl SasToken {
    /// Wrap a raw query string. A leading `?` is stripped.
    pub fn new(query: impl Into<String>) -> ContainerResult<Self> {
        let query = query.into();
        let query = query.strip_prefix('?').unwrap_or(&query).to_string();
        if query.is_empty() {
            return Err(ContainerError::InvalidUri(
                "shared access signature is empty".into(),
            ));
        }
        Ok(Self(query))
    }

    /// The raw query string, without a leading `?`.
    pub fn as_query(&self) -> &str {
        &self.0
    }

    /// Decoded value of one query parameter.
    pub fn param(&self, key: &str) -> Option<String> {
        form_urlencoded::parse(self.0.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Returns `true` if the token carries a signature.
    pub fn is_signed(&self) -> bool {
        self.param(SIGNATURE_PARAM).is_some()
    }

    fn redacted(&self) -> String {
        self.0
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some((k, _)) if k == SIGNATURE_PARAM => format!("{k}=REDACTED"),
                _ => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Debug for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SasToken({})", self.redacted())
    }
}

impl fmt::Display for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Credentials presented to a container connector.
///
/// Opaque to the block store; only the connector interprets them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Public container, no authentication.
    #[default]
    Anonymous,
    /// Shared-access signature.
    Sas(SasToken),
}

impl Credentials {
    /// Build SAS credentials from a raw query string.
    pub fn sas(query: impl Into<String>) -> ContainerResult<Self> {
        SasToken::new(query).map(Self::Sas)
    }
}

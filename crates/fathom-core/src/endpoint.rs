//! Endpoint configuration parsed from raw URL strings.
//!
//! Two inline feature flags are detected by substring match on the raw
//! string before URL parsing: `debug` dumps request/response bytes, and
//! `nocache` bypasses the range cache for reads through that endpoint.

use url::Url;

use crate::error::Error;

/// A configured upstream endpoint: the parsed URL plus the original string
/// kept for diagnostics.
#[derive(Debug, Clone)]
pub struct Endpoint {
    provided: String,
    url: Url,
    debug: bool,
    nocache: bool,
}

impl Endpoint {
    /// Parses an endpoint string, detecting the inline feature flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the string does not parse as a URL.
    pub fn parse(provided: &str) -> Result<Self, Error> {
        let url = Url::parse(provided).map_err(|_| Error::InvalidUrl(provided.to_string()))?;
        Ok(Self {
            provided: provided.to_string(),
            debug: provided.contains("debug"),
            nocache: provided.contains("nocache"),
            url,
        })
    }

    /// The URL requests are sent to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The host portion of the URL, for diagnostics.
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// The original string the endpoint was configured with.
    #[must_use]
    pub fn provided(&self) -> &str {
        &self.provided
    }

    /// Whether request and response bytes are dumped to stdout.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Whether reads through this endpoint bypass the range cache.
    #[must_use]
    pub fn nocache(&self) -> bool {
        self.nocache
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

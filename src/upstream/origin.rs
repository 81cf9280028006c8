//! Upstream origin (scheme, authority, base path).

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Uri};
use url::Url;

use crate::upstream::RegistryError;

/// Where an upstream lives. Pre-computed at startup.
#[derive(Debug, Clone)]
pub struct Origin {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    host_header: HeaderValue,
}

impl Origin {
    /// Parse a base URL such as `https://repo.example.com/` or `http://127.0.0.1:9000/base`.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        let scheme = match url.scheme() {
            "https" => Scheme::HTTPS,
            "http" => Scheme::HTTP,
            other => return Err(invalid(format!("unsupported scheme `{}`", other))),
        };
        let host = url.host_str().ok_or_else(|| invalid("missing host".to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::try_from(authority.as_str()).map_err(|e| invalid(e.to_string()))?;
        let host_header = HeaderValue::from_str(authority.as_str()).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            scheme,
            authority,
            base_path: url.path().trim_end_matches('/').to_string(),
            host_header,
        })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Value for the outbound `Host` header.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Absolute URI for the given inbound path and query.
    ///
    /// The base path and the inbound path are joined with exactly one slash.
    pub fn target_uri(&self, path_and_query: Option<&PathAndQuery>) -> Result<Uri, axum::http::Error> {
        let inbound = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");
        let joined = if inbound.starts_with('/') {
            format!("{}{}", self.base_path, inbound)
        } else {
            format!("{}/{}", self.base_path, inbound)
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(joined)
            .build()
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_origin_with_trailing_slash() {
        let origin = Origin::parse("https://repo.blackduck.com/").unwrap();
        assert_eq!(origin.scheme(), &Scheme::HTTPS);
        assert_eq!(origin.authority().as_str(), "repo.blackduck.com");
        assert_eq!(origin.host_header(), "repo.blackduck.com");
        assert_eq!(origin.to_string(), "https://repo.blackduck.com");
    }

    #[test]
    fn keeps_explicit_port_in_authority() {
        let origin = Origin::parse("http://127.0.0.1:9000").unwrap();
        assert_eq!(origin.authority().as_str(), "127.0.0.1:9000");
        assert_eq!(origin.host_header(), "127.0.0.1:9000");
    }

    #[test]
    fn joins_base_path_and_keeps_query() {
        let origin = Origin::parse("https://mirror.example.com/base/").unwrap();
        let pq = PathAndQuery::from_static("/artifactory/a.jar?download=true");
        let uri = origin.target_uri(Some(&pq)).unwrap();
        assert_eq!(
            uri.to_string(),
            "https://mirror.example.com/base/artifactory/a.jar?download=true"
        );
    }

    #[test]
    fn missing_path_becomes_root() {
        let origin = Origin::parse("https://artifactory.tools.duckutil.net").unwrap();
        let uri = origin.target_uri(None).unwrap();
        assert_eq!(uri.to_string(), "https://artifactory.tools.duckutil.net/");
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let err = Origin::parse("ftp://files.example.com").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl { .. }));
    }
}

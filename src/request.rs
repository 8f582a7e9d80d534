use std::{collections::BTreeMap, net::Ipv6Addr, time::Duration};

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Method, Url,
};

use crate::error::{InputBuildError, ProbeFailure};

pub const DEFAULT_PORT: &str = "80";
pub const DEFAULT_PATH: &str = "/";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Request settings shared by every probe of one dispatch call.
///
/// The method is implied by the body: a non-empty body makes every probe a
/// `POST` carrying that body and `content_type`, otherwise probes are `GET`
/// requests without a body.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct RequestSpec {
    pub use_tls: bool,
    pub port: String,
    pub path: String,
    pub body: Option<Bytes>,
    pub content_type: String,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl RequestSpec {
    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    pub fn method(&self) -> Method {
        if self.payload().is_some() {
            Method::POST
        } else {
            Method::GET
        }
    }

    fn payload(&self) -> Option<&Bytes> {
        self.body.as_ref().filter(|body| !body.is_empty())
    }

    /// Composes `scheme://address:port/path` for one target.
    pub fn url_for(&self, address: &str) -> String {
        let host = match address.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{}]", address),
            Err(_) => address.to_string(),
        };
        format!("{}://{}:{}{}", self.scheme(), host, self.port, self.path)
    }

    /// Builds the concrete request sent to `address`.
    ///
    /// # Errors
    /// Returns [`ProbeFailure::RequestConstruction`] if the URL or any header
    /// is malformed.
    pub fn request_for(&self, address: &str) -> Result<ProbeRequest, ProbeFailure> {
        let url = self.url_for(address);
        let url = Url::parse(&url).map_err(|err| {
            ProbeFailure::RequestConstruction(format!("invalid url {}: {}", url, err))
        })?;

        let mut headers = HeaderMap::new();
        let body = self.payload().cloned();
        if body.is_some() {
            let content_type = HeaderValue::from_str(&self.content_type).map_err(|err| {
                ProbeFailure::RequestConstruction(format!(
                    "invalid content type {:?}: {}",
                    self.content_type, err
                ))
            })?;
            headers.insert(CONTENT_TYPE, content_type);
        }
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                ProbeFailure::RequestConstruction(format!("invalid header name {:?}: {}", name, err))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|err| {
                ProbeFailure::RequestConstruction(format!(
                    "invalid value for header {}: {}",
                    name, err
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(ProbeRequest {
            method: self.method(),
            url,
            headers,
            body,
            timeout: self.timeout,
        })
    }
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self {
            use_tls: false,
            port: DEFAULT_PORT.to_string(),
            path: DEFAULT_PATH.to_string(),
            body: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            headers: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestSpecBuilder {
    spec: RequestSpec,
}

impl RequestSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.spec.use_tls = use_tls;
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.spec.port = port.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.spec.path = path.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.spec.body = Some(body.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.spec.content_type = content_type.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.spec.headers.extend(headers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RequestSpec, InputBuildError> {
        if !self.spec.path.starts_with('/') {
            return Err(InputBuildError::InvalidPath(self.spec.path));
        }
        if self.spec.timeout.is_zero() {
            return Err(InputBuildError::InvalidTimeout);
        }
        Ok(self.spec)
    }
}

/// A fully constructed request for a single target.
#[derive(Clone, Debug)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let spec = RequestSpecBuilder::new().build().unwrap();
        assert_eq!(spec.port, "80");
        assert_eq!(spec.path, "/");
        assert!(!spec.use_tls);
        assert_eq!(spec.content_type, "application/json");
        assert_eq!(spec.timeout, Duration::from_secs(3));
        assert_eq!(spec.method(), Method::GET);
    }

    #[test]
    fn test_url_composition() {
        let spec = RequestSpecBuilder::new()
            .with_port("8443")
            .with_path("/health")
            .with_tls(true)
            .build()
            .unwrap();
        assert_eq!(spec.url_for("10.0.0.1"), "https://10.0.0.1:8443/health");
        assert_eq!(spec.url_for("::1"), "https://[::1]:8443/health");
        assert_eq!(
            spec.url_for("node-1.internal"),
            "https://node-1.internal:8443/health"
        );
    }

    #[test]
    fn test_empty_body_stays_get() {
        let spec = RequestSpecBuilder::new().with_body(Bytes::new()).build().unwrap();
        assert_eq!(spec.method(), Method::GET);
        let request = spec.request_for("10.0.0.1").unwrap();
        assert!(request.body.is_none());
        assert!(request.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_post_request_carries_body_and_content_type() {
        let spec = RequestSpecBuilder::new()
            .with_body(&b"{\"ping\":true}"[..])
            .with_content_type("application/json")
            .with_header("X-Test", "1")
            .build()
            .unwrap();
        let request = spec.request_for("10.0.0.1").unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body.as_deref(), Some(&b"{\"ping\":true}"[..]));
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request.headers["x-test"], "1");
        assert_eq!(request.url.as_str(), "http://10.0.0.1/");
    }

    #[test]
    fn test_explicit_content_type_header_wins() {
        let spec = RequestSpecBuilder::new()
            .with_body("payload")
            .with_header("Content-Type", "text/plain")
            .build()
            .unwrap();
        let request = spec.request_for("10.0.0.1").unwrap();
        assert_eq!(request.headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_invalid_header_is_construction_failure() {
        let spec = RequestSpecBuilder::new()
            .with_header("bad header", "1")
            .build()
            .unwrap();
        assert!(matches!(
            spec.request_for("10.0.0.1"),
            Err(ProbeFailure::RequestConstruction(_))
        ));
    }

    #[test]
    fn test_invalid_address_is_construction_failure() {
        let spec = RequestSpecBuilder::new().build().unwrap();
        assert!(matches!(
            spec.request_for("bad host name"),
            Err(ProbeFailure::RequestConstruction(_))
        ));
    }

    #[test]
    fn test_builder_validation() {
        assert_eq!(
            RequestSpecBuilder::new().with_path("health").build(),
            Err(InputBuildError::InvalidPath("health".into()))
        );
        assert_eq!(
            RequestSpecBuilder::new().with_timeout(Duration::ZERO).build(),
            Err(InputBuildError::InvalidTimeout)
        );
    }
}

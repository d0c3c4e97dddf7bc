//! Request/response transport to a store endpoint.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;

use crate::config::{ClientConfig, Endpoint, Scheme};
use crate::error::ClientError;

pub const REGISTER_PATH: &str = "/register";
pub const AUTHENTICATE_PATH: &str = "/authenticate";
pub const LIST_RESOURCE_PATH: &str = "/list-resource";
pub const ADD_RESOURCE_PATH: &str = "/add-resource";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Parameters go in the query string.
    Get,
    /// Parameters go in an `application/x-www-form-urlencoded` body.
    Post,
}

/// One outbound request.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub endpoint: &'a Endpoint,
    pub path: &'static str,
    pub params: Vec<(&'static str, String)>,
}

impl Request<'_> {
    /// First value of parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status line and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`ClientError::Protocol`].
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Protocol {
                status: self.status,
                reason: self.reason,
            })
        }
    }
}

/// Synchronous request/response exchange with a store.
///
/// Fails with [`ClientError::Transport`] only when no response was
/// received; any received status, success or not, is returned as a
/// [`Response`].
pub trait Transport {
    fn send(&self, request: &Request<'_>) -> Result<Response, ClientError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request<'_>) -> Result<Response, ClientError> {
        (**self).send(request)
    }
}

/// Blocking HTTP(S) transport.
pub struct HttpTransport {
    client: Client,
    scheme: Scheme,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            scheme: config.scheme,
        })
    }

    fn url(&self, endpoint: &Endpoint, path: &str) -> String {
        format!("{}://{}{}", self.scheme.as_str(), endpoint, path)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request<'_>) -> Result<Response, ClientError> {
        let url = self.url(request.endpoint, request.path);
        tracing::debug!(
            method = ?request.method,
            path = request.path,
            endpoint = %request.endpoint,
            "sending request"
        );

        let builder = match request.method {
            Method::Get => self.client.get(&url).query(&request.params),
            Method::Post => self.client.post(&url).form(&request.params),
        };
        let response = builder.header(ACCEPT, "text/plain, application/json").send()?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let body = response.text()?;
        tracing::debug!(status = status.as_u16(), path = request.path, "received response");

        Ok(Response {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> Response {
        Response {
            status,
            reason: "Reason".into(),
            body: String::new(),
        }
    }

    #[test]
    fn success_range() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(301).is_success());
        assert!(!response(401).is_success());
    }

    #[test]
    fn error_for_status_maps_to_protocol() {
        let err = response(403).error_for_status().unwrap_err();
        assert!(matches!(err, ClientError::Protocol { status: 403, .. }));
        assert_eq!(err.to_string(), "HTTP error: 403 Reason");
    }

    #[test]
    fn request_param_lookup() {
        let endpoint = Endpoint::new("localhost", 8080);
        let request = Request {
            method: Method::Get,
            endpoint: &endpoint,
            path: LIST_RESOURCE_PATH,
            params: vec![("user", "alice".into()), ("name", "abc".into())],
        };
        assert_eq!(request.param("name"), Some("abc"));
        assert_eq!(request.param("value"), None);
    }

    #[test]
    fn http_urls() {
        let config = ClientConfig::default().with_scheme(Scheme::Https);
        let transport = HttpTransport::new(&config).unwrap();
        let endpoint = Endpoint::new("store.example", 8443);
        assert_eq!(
            transport.url(&endpoint, ADD_RESOURCE_PATH),
            "https://store.example:8443/add-resource"
        );
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let config = ClientConfig::default()
            .with_connect_timeout(std::time::Duration::from_millis(200))
            .with_timeout(std::time::Duration::from_millis(500));
        let transport = HttpTransport::new(&config).unwrap();
        // Port 9 on loopback (discard) is closed on test machines.
        let endpoint = Endpoint::new("127.0.0.1", 9);
        let request = Request {
            method: Method::Post,
            endpoint: &endpoint,
            path: REGISTER_PATH,
            params: vec![],
        };
        assert!(matches!(
            transport.send(&request),
            Err(ClientError::Transport(_))
        ));
    }
}

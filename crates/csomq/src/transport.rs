//! The transport seam: how serialized batches reach the endpoint.
//!
//! The core never talks HTTP directly — [`crate::runner::Runner`] takes any
//! [`Transport`]. [`HttpTransport`] is the stock implementation; tests and
//! replay harnesses inject their own.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{CsomError, Result};

/// Path of the ProcessQuery endpoint relative to a site URL.
pub const PROCESS_QUERY_PATH: &str = "/_vti_bin/client.svc/ProcessQuery";

/// POST one serialized `<Request>` envelope and return the raw response
/// body.
///
/// Implementations report nothing about batch success — an HTTP 200 body
/// still has to pass the correlator, whose header check is the only
/// authoritative signal. Retry policy (for genuinely transient transport
/// failures) also lives behind this trait, not in the core.
pub trait Transport {
    fn send(&self, request_xml: &str) -> Result<String>;
}

/// A shared transport (e.g. one pooled HTTP client) can back several
/// runners at once.
impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request_xml: &str) -> Result<String> {
        (**self).send(request_xml)
    }
}

/// Blocking HTTP transport against a site's ProcessQuery endpoint.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    request_digest: String,
}

impl HttpTransport {
    /// `site_url` is the bare site/admin URL; `request_digest` is an
    /// already-acquired form digest. Acquiring and refreshing the digest is
    /// the caller's concern.
    pub fn new(site_url: &str, request_digest: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}{}", site_url.trim_end_matches('/'), PROCESS_QUERY_PATH),
            request_digest: request_digest.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn send(&self, request_xml: &str) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, bytes = request_xml.len(), "POST ProcessQuery");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .header("X-RequestDigest", &self.request_digest)
            .body(request_xml.to_owned())
            .send()
            .map_err(|e| CsomError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CsomError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(%status, endpoint = %self.endpoint, "ProcessQuery request rejected");
            return Err(CsomError::Transport(format!(
                "HTTP {status} from {}",
                self.endpoint
            )));
        }

        Ok(body)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_derived_from_site_url() {
        let t = HttpTransport::new("https://contoso-admin.sharepoint.com/", "ABC");
        assert_eq!(
            t.endpoint(),
            "https://contoso-admin.sharepoint.com/_vti_bin/client.svc/ProcessQuery"
        );
    }

    #[test]
    fn send_posts_xml_with_digest_and_returns_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/_vti_bin/client.svc/ProcessQuery")
            .match_header("content-type", "text/xml")
            .match_header("x-requestdigest", "ABC")
            .match_body("<Request />")
            .with_status(200)
            .with_body(r#"[{"SchemaVersion": "15.0.0.0"}]"#)
            .create();

        let t = HttpTransport::new(&server.url(), "ABC");
        let body = t.send("<Request />").unwrap();

        assert_eq!(body, r#"[{"SchemaVersion": "15.0.0.0"}]"#);
        mock.assert();
    }

    #[test]
    fn non_success_status_is_a_transport_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/_vti_bin/client.svc/ProcessQuery")
            .with_status(403)
            .with_body("Forbidden")
            .create();

        let t = HttpTransport::new(&server.url(), "expired");
        let err = t.send("<Request />").unwrap_err();
        assert!(matches!(err, CsomError::Transport(_)));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn connection_failure_is_a_transport_error() {
        // Nothing listens on this port.
        let t = HttpTransport::new("http://127.0.0.1:1", "ABC");
        assert!(matches!(
            t.send("<Request />"),
            Err(CsomError::Transport(_))
        ));
    }
}

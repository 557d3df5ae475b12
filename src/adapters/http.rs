//! Blocking HTTP client adapter.
//!
//! Implements [`HttpPort`] for the hub's cloud, weather and time requests.
//! Responses are read fully into memory; every body this firmware consumes
//! is a small JSON document.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` with global CA store
//!   TLS.
//! - **all other targets**: every request fails with a network error;
//!   host-side tests drive the domain with scripted [`HttpPort`] mocks
//!   instead.

use log::warn;

use crate::app::ports::HttpPort;
use crate::error::NetworkError;

/// Largest response body the adapter will buffer.
const MAX_BODY: usize = 4096;

pub struct HttpAdapter;

impl HttpAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl HttpAdapter {
    fn request(
        &mut self,
        method: embedded_svc::http::Method,
        url: &str,
        bearer: Option<&str>,
        body: Option<&str>,
    ) -> Result<Vec<u8>, NetworkError> {
        use embedded_svc::http::client::Client;
        use embedded_svc::io::Write as _;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let connection = EspHttpConnection::new(&Configuration {
            use_global_ca_store: true,
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|e| {
            warn!("http: connection init failed ({e})");
            NetworkError::HttpRequestFailed
        })?;
        let mut client = Client::wrap(connection);

        let mut auth = String::new();
        let mut headers: Vec<(&str, &str)> = vec![("accept", "application/json")];
        if let Some(token) = bearer {
            auth = format!("Bearer {token}");
            headers.push(("authorization", &auth));
        }
        if body.is_some() {
            headers.push(("content-type", "application/json"));
        }

        let mut request = client.request(method, url, &headers).map_err(|e| {
            warn!("http: request setup failed ({e})");
            NetworkError::HttpRequestFailed
        })?;
        if let Some(body) = body {
            request.write_all(body.as_bytes()).map_err(|e| {
                warn!("http: body write failed ({e})");
                NetworkError::HttpRequestFailed
            })?;
        }

        let mut response = request.submit().map_err(|e| {
            warn!("http: submit failed ({e})");
            NetworkError::HttpRequestFailed
        })?;
        if !(200..300).contains(&response.status()) {
            warn!("http: {url} -> status {}", response.status());
            return Err(NetworkError::HttpRequestFailed);
        }

        let mut out = Vec::new();
        let mut chunk = [0u8; 256];
        loop {
            let n = embedded_svc::io::Read::read(&mut response, &mut chunk)
                .map_err(|_| NetworkError::HttpRequestFailed)?;
            if n == 0 {
                break;
            }
            if out.len() + n > MAX_BODY {
                warn!("http: response exceeds {MAX_BODY} bytes");
                return Err(NetworkError::BadResponse);
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }
}

#[cfg(target_os = "espidf")]
impl HttpPort for HttpAdapter {
    fn get(&mut self, url: &str, bearer: Option<&str>) -> Result<Vec<u8>, NetworkError> {
        self.request(embedded_svc::http::Method::Get, url, bearer, None)
    }

    fn post_json(
        &mut self,
        url: &str,
        bearer: Option<&str>,
        body: &str,
    ) -> Result<Vec<u8>, NetworkError> {
        self.request(embedded_svc::http::Method::Post, url, bearer, Some(body))
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpPort for HttpAdapter {
    fn get(&mut self, url: &str, _bearer: Option<&str>) -> Result<Vec<u8>, NetworkError> {
        warn!("http(sim): GET {url} has no backend");
        Err(NetworkError::HttpRequestFailed)
    }

    fn post_json(
        &mut self,
        url: &str,
        _bearer: Option<&str>,
        _body: &str,
    ) -> Result<Vec<u8>, NetworkError> {
        warn!("http(sim): POST {url} has no backend");
        Err(NetworkError::HttpRequestFailed)
    }
}

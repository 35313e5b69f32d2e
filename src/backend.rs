//! Access to the codon finder service.
//!
//! [`CodonService`] is the seam between the query controller and the network:
//! the controller runs the service on a worker thread, tests substitute an
//! in-memory implementation.

use std::time::Duration;

use reqwest::blocking::{Client, Request};
use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::model::{CodonResult, ErrorBody, RequestParams};

/// Path of the codon endpoint, relative to the server URL.
pub const CODONS_ENDPOINT: &str = "codons";

/// Errors that can occur while querying the service.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{message}")]
    Server { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Could not read response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Returns the message shown to the user.
    pub fn message(&self) -> String {
        match self {
            BackendError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A service that computes codons for a query.
pub trait CodonService {
    fn find_codons(&self, params: &RequestParams) -> Result<Vec<CodonResult>, BackendError>;
}

/// Queries the service over HTTP.
pub struct HttpCodonService {
    client: Client,
    endpoint: Url,
}

impl HttpCodonService {
    /// Creates a service for the server at `server`.
    pub fn new(server: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(server, client)
    }

    /// Creates a service that sends its requests with `client`.
    pub fn with_client(server: &str, client: Client) -> Result<Self, BackendError> {
        let endpoint = endpoint_url(server)?;
        Ok(Self { client, endpoint })
    }

    /// Returns the URL of the `codons` endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the GET request for the given parameters.
    pub fn request(&self, params: &RequestParams) -> Result<Request, BackendError> {
        Ok(self
            .client
            .get(self.endpoint.clone())
            .query(&params.to_pairs())
            .build()?)
    }
}

impl CodonService for HttpCodonService {
    fn find_codons(&self, params: &RequestParams) -> Result<Vec<CodonResult>, BackendError> {
        let request = self.request(params)?;
        tracing::debug!(url = %request.url(), "sending request");
        let response = self.client.execute(request)?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(BackendError::Server { status, message });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Resolves the `codons` endpoint against the server URL.
///
/// A missing trailing slash is added so that a server path prefix is kept.
pub fn endpoint_url(server: &str) -> Result<Url, BackendError> {
    let base = if server.ends_with('/') {
        server.to_string()
    } else {
        format!("{server}/")
    };
    Url::parse(&base)
        .and_then(|url| url.join(CODONS_ENDPOINT))
        .map_err(|e| BackendError::InvalidUrl {
            url: server.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Query, QueryForm, QueryMode};

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let url = endpoint_url("http://example.org/codon-genie").unwrap();
        assert_eq!(url.as_str(), "http://example.org/codon-genie/codons");

        let url = endpoint_url("http://localhost:5000/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/codons");
    }

    #[test]
    fn test_invalid_server_url() {
        assert!(endpoint_url("not a url").is_err());
        assert!(HttpCodonService::new("::", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_request_query_string() {
        let service = HttpCodonService::new("http://localhost:5000", Duration::from_secs(1)).unwrap();
        let form = QueryForm {
            mode: QueryMode::AaSeq,
            aa_seq: "MKV".to_string(),
            edits: "M1A".to_string(),
            ..QueryForm::default()
        };
        let params = form.request_params().unwrap();
        let request = service.request(&params).unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/codons");
        assert_eq!(request.url().query(), Some("aaSeq=MKV&edits=M1A&organism=37762"));
    }

    #[test]
    fn test_request_codon_mode() {
        let service = HttpCodonService::new("http://localhost:5000", Duration::from_secs(1)).unwrap();
        let params = RequestParams {
            query: Query::Codon {
                codon: "NNK".to_string(),
            },
            organism_id: 4932,
        };
        let request = service.request(&params).unwrap();
        assert_eq!(request.url().query(), Some("codon=NNK&organism=4932"));
    }

    #[test]
    fn test_server_error_message() {
        let err = BackendError::Server {
            status: StatusCode::BAD_REQUEST,
            message: "Edit 'K1A' is invalid".to_string(),
        };
        assert_eq!(err.message(), "Edit 'K1A' is invalid");
    }
}

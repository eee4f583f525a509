// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use bytes::Bytes;

/// Transport-level failure: no HTTP response was produced
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Content type of URL-encoded form bodies
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP response with status and the complete body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST a pre-encoded body and read the whole response
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse, TransportError>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new ReqwestClient with default settings
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestClient with a custom reqwest::Client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(HttpResponse { status, body })
    }
}

/// Encode fields as an `application/x-www-form-urlencoded` body
///
/// Fields with an empty value are left out.
pub fn encode_form<K: AsRef<str>, V: AsRef<str>>(fields: &[(K, V)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in fields {
        if !value.as_ref().is_empty() {
            serializer.append_pair(name.as_ref(), value.as_ref());
        }
    }
    serializer.finish()
}

/// Join a destination base URL and an absolute path
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Scripted client for unit tests
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone)]
    pub enum MockResponse {
        Reply { status: u16, body: String },
        Fail(String),
    }

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub url: String,
        pub content_type: String,
        pub body: Vec<u8>,
    }

    impl RecordedRequest {
        /// Decode a URL-encoded body into its fields
        pub fn form(&self) -> Vec<(String, String)> {
            url::form_urlencoded::parse(&self.body)
                .into_owned()
                .collect()
        }

        pub fn field(&self, name: &str) -> Option<String> {
            self.form()
                .into_iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v)
        }
    }

    /// Answers requests with responses queued per URL path suffix
    #[derive(Clone, Default)]
    pub struct MockHttpClient {
        routes: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, path: &str, status: u16, body: &str) -> Self {
            self.push(
                path,
                MockResponse::Reply {
                    status,
                    body: body.to_string(),
                },
            )
        }

        pub fn fail(self, path: &str, message: &str) -> Self {
            self.push(path, MockResponse::Fail(message.to_string()))
        }

        fn push(self, path: &str, response: MockResponse) -> Self {
            self.routes
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push_back(response);
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.url.ends_with(path))
                .collect()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn post(
            &self,
            url: &str,
            content_type: &str,
            body: Vec<u8>,
        ) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                url: url.to_string(),
                content_type: content_type.to_string(),
                body,
            });

            let response = {
                let mut routes = self.routes.lock().unwrap();
                routes
                    .iter_mut()
                    .find(|(path, _)| url.ends_with(path.as_str()))
                    .and_then(|(_, queue)| queue.pop_front())
            };

            match response {
                Some(MockResponse::Reply { status, body }) => Ok(HttpResponse {
                    status,
                    body: Bytes::from(body),
                }),
                Some(MockResponse::Fail(message)) => Err(message.into()),
                None => Err(format!("no mock response for {}", url).into()),
            }
        }
    }
}

//! Request/response execution and server-push streaming.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use hyper::body::{HttpBody, to_bytes};
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Request, StatusCode, Uri};
use integration_primitives::{DynamicValue, Payload};
use tokio::time::timeout;
use tracing::debug;

use crate::config::ClientConfig;
use crate::endpoint::{Endpoint, sends_parameters_as_query};
use crate::error::{ApiError, ApiResult};
use crate::http_client::{HyperClient, build_transport};
use crate::sse::FrameDecoder;

const JSON_CONTENT_TYPE: &str = "application/json";
const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Lazy sequence of decoded push events returned by [`ApiClient::stream`].
///
/// Dropping the stream closes the underlying connection.
pub type EventStream = Pin<Box<dyn Stream<Item = ApiResult<Payload>> + Send>>;

/// HTTP client bound to a base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: HyperClient,
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Constructs a client from the supplied configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: build_transport(&config),
            base_url: config.base_url,
            timeout: config.timeout,
            default_headers: config.default_headers,
        }
    }

    /// Returns the base URL all endpoint paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Executes the endpoint and decodes the response into its typed result.
    ///
    /// An empty success body is decoded as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] coded `invalid_request`, `transport_error`,
    /// `timeout`, `http_error` (non-2xx status), or `decode_error`.
    pub async fn execute<E>(&self, endpoint: &E) -> ApiResult<E::Response>
    where
        E: Endpoint + ?Sized,
    {
        let bytes = self.send(endpoint).await?;
        let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(body)
            .map_err(|err| ApiError::decode(format!("failed to decode response: {err}")))
    }

    /// Executes the endpoint and returns the response as a raw key/value map.
    ///
    /// An empty body yields an empty map; a JSON value that is not an object
    /// is wrapped under the `data` key.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ApiClient::execute`].
    pub async fn execute_raw<E>(&self, endpoint: &E) -> ApiResult<Payload>
    where
        E: Endpoint + ?Sized,
    {
        let bytes = self.send(endpoint).await?;
        if bytes.is_empty() {
            return Ok(Payload::new());
        }

        let value: DynamicValue = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::decode(format!("failed to decode response: {err}")))?;

        Ok(match value {
            DynamicValue::Map(map) => map,
            other => Payload::from([("data".to_owned(), other)]),
        })
    }

    /// Opens a server-push stream for the endpoint.
    ///
    /// The returned stream first yields a synthetic `{"type": "connected"}`
    /// event, then one decoded map per `data:` line. It ends when the server
    /// closes the connection, or after yielding a `transport_error` if reading
    /// the body fails.
    ///
    /// # Errors
    ///
    /// Returns a `stream_error` [`ApiError`] when the connection cannot be
    /// established, times out, or answers with a non-2xx status.
    pub async fn stream<E>(&self, endpoint: &E) -> ApiResult<EventStream>
    where
        E: Endpoint + ?Sized,
    {
        let request = self.build_request(endpoint, EVENT_STREAM_CONTENT_TYPE)?;
        debug!(method = %request.method(), uri = %request.uri(), "opening push stream");

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ApiError::stream("stream connection timed out"))?
            .map_err(|err| ApiError::stream(format!("stream connection failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                ApiError::stream(format!("stream endpoint returned {status}"))
                    .with_status(status.as_u16()),
            );
        }

        let state = FrameState {
            body: response.into_body(),
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };

        let connected = stream::once(async { Ok(connected_event()) });
        let frames = stream::unfold(state, next_frame);
        Ok(Box::pin(connected.chain(frames)))
    }

    async fn send<E>(&self, endpoint: &E) -> ApiResult<Bytes>
    where
        E: Endpoint + ?Sized,
    {
        let request = self.build_request(endpoint, JSON_CONTENT_TYPE)?;
        debug!(method = %request.method(), uri = %request.uri(), "sending request");

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|err| ApiError::transport(format!("request failed: {err}")))?;
            let status = response.status();
            let bytes = to_bytes(response.into_body())
                .await
                .map_err(|err| ApiError::transport(format!("failed to read response: {err}")))?;
            Ok::<(StatusCode, Bytes), ApiError>((status, bytes))
        };

        let (status, bytes) = timeout(self.timeout, exchange)
            .await
            .map_err(|_| ApiError::timeout(format!("request exceeded {:?}", self.timeout)))??;

        if !status.is_success() {
            let reason = String::from_utf8_lossy(&bytes);
            return Err(ApiError::http(
                status.as_u16(),
                format!("server returned {status}: {reason}"),
            ));
        }

        Ok(bytes)
    }

    fn build_request<E>(&self, endpoint: &E, accept: &str) -> ApiResult<Request<Body>>
    where
        E: Endpoint + ?Sized,
    {
        let method = endpoint.method();
        let parameters = endpoint.parameters();
        let as_query = sends_parameters_as_query(&method);

        let mut url = self.resolve_url(&endpoint.path());
        if as_query && !parameters.is_empty() {
            let query = encode_query(&parameters)?;
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        let uri = url
            .parse::<Uri>()
            .map_err(|err| ApiError::invalid_request(format!("invalid endpoint URL: {err}")))?;

        let body = match endpoint.body() {
            Some(body) => serde_json::to_vec(&body)
                .map_err(|err| ApiError::invalid_request(format!("failed to encode body: {err}")))?,
            None if !as_query && !parameters.is_empty() => serde_json::to_vec(&parameters)
                .map_err(|err| ApiError::invalid_request(format!("failed to encode body: {err}")))?,
            None => Vec::new(),
        };

        let headers = merge_headers(&self.default_headers, endpoint.headers());
        let has_header = |name: &str| headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name));

        let mut builder = Request::builder().method(method).uri(uri);
        if !has_header(CONTENT_TYPE.as_str()) {
            builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        }
        if !has_header(ACCEPT.as_str()) {
            builder = builder.header(ACCEPT, accept);
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(Body::from(body))
            .map_err(|err| ApiError::invalid_request(format!("failed to build request: {err}")))
    }

    fn resolve_url(&self, path: &str) -> String {
        if is_absolute_url(path) {
            path.to_owned()
        } else {
            format!("{}{}", self.base_url, path.trim_start_matches('/'))
        }
    }
}

fn is_absolute_url(path: &str) -> bool {
    let path = path.trim_start();
    ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

// Endpoint headers replace configured defaults of the same name.
fn merge_headers(
    defaults: &[(String, String)],
    overrides: Vec<(String, String)>,
) -> Vec<(String, String)> {
    let mut merged = defaults.to_vec();
    for (name, value) in overrides {
        merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        merged.push((name, value));
    }
    merged
}

struct FrameState {
    body: Body,
    decoder: FrameDecoder,
    pending: VecDeque<Payload>,
    finished: bool,
}

async fn next_frame(mut state: FrameState) -> Option<(ApiResult<Payload>, FrameState)> {
    loop {
        if let Some(event) = state.pending.pop_front() {
            return Some((Ok(event), state));
        }
        if state.finished {
            return None;
        }

        match state.body.data().await {
            Some(Ok(chunk)) => {
                let events = state.decoder.push(&chunk);
                state.pending.extend(events);
            }
            Some(Err(err)) => {
                state.finished = true;
                return Some((
                    Err(ApiError::transport(format!("push stream interrupted: {err}"))),
                    state,
                ));
            }
            None => {
                state.finished = true;
                state.pending.extend(state.decoder.finish());
            }
        }
    }
}

fn connected_event() -> Payload {
    Payload::from([("type".to_owned(), DynamicValue::from("connected"))])
}

fn encode_query(parameters: &Payload) -> ApiResult<String> {
    let mut pairs = Vec::with_capacity(parameters.len());
    for (key, value) in parameters {
        let encoded = match value {
            DynamicValue::Null => continue,
            DynamicValue::Bool(flag) => flag.to_string(),
            DynamicValue::Number(number) => number.to_string(),
            DynamicValue::String(text) => text.clone(),
            nested @ (DynamicValue::List(_) | DynamicValue::Map(_)) => serde_json::to_string(nested)
                .map_err(|err| ApiError::invalid_request(format!("failed to encode `{key}`: {err}")))?,
        };
        pairs.push((key.as_str(), encoded));
    }

    serde_urlencoded::to_string(&pairs)
        .map_err(|err| ApiError::invalid_request(format!("failed to encode query: {err}")))
}

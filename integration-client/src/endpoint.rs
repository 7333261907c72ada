//! Endpoint descriptions consumed by [`ApiClient`](crate::ApiClient).

use hyper::Method;
use integration_primitives::{DynamicValue, Payload};
use serde::de::DeserializeOwned;

/// Describes a single remote operation.
///
/// Implementors supply the path relative to the client's base URL and,
/// optionally, the method, headers, parameters, and body. Parameters are sent
/// as a query string for methods without a body (`GET`, `DELETE`, `HEAD`) and
/// as the JSON body otherwise, unless [`Endpoint::body`] returns a value.
pub trait Endpoint: Send + Sync {
    /// Structured response type decoded by [`ApiClient::execute`](crate::ApiClient::execute).
    type Response: DeserializeOwned;

    /// Path relative to the base URL, e.g. `services/search`.
    ///
    /// An absolute `http://` or `https://` URL is requested as-is.
    fn path(&self) -> String;

    /// HTTP method; `GET` unless overridden.
    fn method(&self) -> Method {
        Method::GET
    }

    /// Additional request headers.
    fn headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Request parameters.
    fn parameters(&self) -> Payload {
        Payload::new()
    }

    /// Explicit JSON body.
    fn body(&self) -> Option<DynamicValue> {
        None
    }
}

/// Ad-hoc endpoint whose response is decoded as a raw key/value map.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    parameters: Payload,
    body: Option<DynamicValue>,
}

impl ApiRequest {
    /// Creates a request for the supplied method and path.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            parameters: Payload::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a request parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Sets an explicit JSON body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<DynamicValue>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl Endpoint for ApiRequest {
    type Response = Payload;

    fn path(&self) -> String {
        self.path.clone()
    }

    fn method(&self) -> Method {
        self.method.clone()
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }

    fn parameters(&self) -> Payload {
        self.parameters.clone()
    }

    fn body(&self) -> Option<DynamicValue> {
        self.body.clone()
    }
}

pub(crate) fn sends_parameters_as_query(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::DELETE | Method::HEAD)
}

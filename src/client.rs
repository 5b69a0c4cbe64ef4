use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Response};

use crate::{
    config::ClientConfig,
    error::{ConfigError, MlError, ServerError},
    params::QueryParams,
    parser::BoundedLines,
    response::ResponseAdapter,
};

/// Header asking MarkLogic to report errors in the given format.
pub const ERROR_ACCEPT: HeaderName = HeaderName::from_static("x-error-accept");

/// Sends fully buffered HTTP requests.
///
/// Implementations own connection handling and authentication; the
/// client only shapes requests and interprets responses.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the buffered response, whatever its status.
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, MlError>;
}

#[async_trait::async_trait]
impl<T> Transport for std::sync::Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, MlError> {
        (**self).send(request).await
    }
}

/// REST client bound to one server.
#[derive(Debug, Clone)]
pub struct RestClient<T> {
    config: ClientConfig,
    transport: T,
}

impl<T> RestClient<T> {
    /// Creates a client from a validated configuration.
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    /// Creates a client from a `host:port:user:password[:authtype]` environment variable.
    pub fn from_env_var(name: &str, transport: T) -> Result<Self, ConfigError> {
        Self::new(ClientConfig::from_env_var(name)?, transport)
    }

    /// Returns the connection configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the server root URL.
    pub fn base_url(&self) -> String {
        self.config.base_url()
    }

    /// Builds the full URL for a service path and its query.
    pub fn service_url(&self, service_path: &str, params: &QueryParams) -> String {
        let mut url = self.base_url();
        url.push_str(service_path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.to_query_string());
        }
        url
    }
}

impl<T> RestClient<T>
where
    T: Transport,
{
    /// Sends a request and fails with [`ServerError`] on 4xx and 5xx statuses.
    pub async fn rest_do(
        &self,
        method: Method,
        service_path: &str,
        params: &QueryParams,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response<Bytes>, MlError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(self.service_url(service_path, params));
        if let Some(request_headers) = builder.headers_mut() {
            request_headers.extend(headers);
            request_headers.insert(ERROR_ACCEPT, HeaderValue::from_static("application/json"));
        }
        let request = builder.body(body)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            "client: sending request"
        );

        let response = self.transport.send(request).await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let err = ServerError::from_response(&response);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                status = status.as_u16(),
                ml_code = err.ml_code.as_str(),
                "client: server reported an error"
            );

            return Err(err.into());
        }

        Ok(response)
    }

    /// `GET` shorthand.
    pub async fn rest_get(
        &self,
        service_path: &str,
        params: &QueryParams,
    ) -> Result<Response<Bytes>, MlError> {
        self.rest_do(Method::GET, service_path, params, HeaderMap::new(), Bytes::new())
            .await
    }

    /// `DELETE` shorthand.
    pub async fn rest_delete(
        &self,
        service_path: &str,
        params: &QueryParams,
    ) -> Result<Response<Bytes>, MlError> {
        self.rest_do(Method::DELETE, service_path, params, HeaderMap::new(), Bytes::new())
            .await
    }

    /// `POST` shorthand.
    pub async fn rest_post(
        &self,
        service_path: &str,
        params: &QueryParams,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Response<Bytes>, MlError> {
        self.rest_do(Method::POST, service_path, params, content_headers(content_type)?, body)
            .await
    }

    /// `PUT` shorthand.
    pub async fn rest_put(
        &self,
        service_path: &str,
        params: &QueryParams,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Response<Bytes>, MlError> {
        self.rest_do(Method::PUT, service_path, params, content_headers(content_type)?, body)
            .await
    }

    /// `PATCH` shorthand.
    pub async fn rest_patch(
        &self,
        service_path: &str,
        params: &QueryParams,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Response<Bytes>, MlError> {
        self.rest_do(Method::PATCH, service_path, params, content_headers(content_type)?, body)
            .await
    }

    /// Sends a request and wraps the response for multipart part iteration.
    pub async fn rest_multipart(
        &self,
        method: Method,
        service_path: &str,
        params: &QueryParams,
    ) -> Result<ResponseAdapter<BoundedLines<std::io::Cursor<Bytes>>>, MlError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("multipart/mixed"));
        let response = self
            .rest_do(method, service_path, params, headers, Bytes::new())
            .await?;
        Ok(ResponseAdapter::from_buffered(response))
    }
}

fn content_headers(content_type: Option<&str>) -> Result<HeaderMap, MlError> {
    let mut headers = HeaderMap::new();
    if let Some(content_type) = content_type {
        let value = HeaderValue::from_str(content_type).map_err(http::Error::from)?;
        headers.insert(header::CONTENT_TYPE, value);
    }
    Ok(headers)
}

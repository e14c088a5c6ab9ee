use std::marker::PhantomData;
use std::time::Duration;

use reqwest::header::{ACCEPT_CHARSET, CONTENT_TYPE, USER_AGENT};
use reqwest::multipart::Form;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::codec::{self, Entity};
use crate::config::ClientConfig;
use crate::http::error::ApiError;
use crate::http::fileupload::FileUpload;
use crate::http::response::ApiResponse;
use crate::LogLevel;

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// Body written with a request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    /// Encoded JSON object text.
    Json(String),
    Multipart(FileUpload),
}

/// A single request whose response body decodes into `T`.
///
/// Requests are plain data until an [`ApiService`](crate::http::ApiService)
/// executes them.
#[derive(Debug, Clone)]
pub struct ApiRequest<T> {
    url: String,
    method: HttpMethod,
    url_params: Vec<(String, String)>,
    body: RequestBody,
    timeout: Option<Duration>,
    charset: Option<String>,
    decode_response: bool,
    response: PhantomData<fn() -> T>,
}

impl<T: Entity> ApiRequest<T> {
    fn new(url: &str, method: HttpMethod, body: RequestBody) -> Self {
        ApiRequest {
            url: url.to_string(),
            method,
            url_params: vec![],
            body,
            timeout: None,
            charset: None,
            decode_response: true,
            response: PhantomData,
        }
    }

    /// Create a GET request for `url`.
    ///
    /// ```
    /// use entity_http_client::codec::{Entity, FieldTable};
    /// use entity_http_client::http::{ApiRequest, HttpMethod};
    ///
    /// #[derive(Default)]
    /// struct Contact {
    ///     id: i64,
    /// }
    ///
    /// impl Entity for Contact {
    ///     fn fields(table: FieldTable<Self>) -> FieldTable<Self> {
    ///         table.field("id", |c| &c.id, |c| &mut c.id)
    ///     }
    /// }
    ///
    /// let mut request = ApiRequest::<Contact>::get("https://example.com/contacts");
    /// request.add_url_param("name", "Ada Lovelace");
    /// assert_eq!(request.method(), HttpMethod::Get);
    /// assert_eq!(request.url(), "https://example.com/contacts?name=Ada%20Lovelace");
    /// ```
    pub fn get(url: &str) -> Self {
        Self::new(url, HttpMethod::Get, RequestBody::Empty)
    }

    /// Create a POST request with an empty body; add one with
    /// [`with_entity`](ApiRequest::with_entity) or
    /// [`with_raw_body`](ApiRequest::with_raw_body).
    pub fn post(url: &str) -> Self {
        Self::new(url, HttpMethod::Post, RequestBody::Empty)
    }

    /// Create a PUT request with an empty body.
    pub fn put(url: &str) -> Self {
        Self::new(url, HttpMethod::Put, RequestBody::Empty)
    }

    /// Multipart POST carrying a single file.
    pub fn upload(url: &str, file: FileUpload) -> Self {
        Self::new(url, HttpMethod::Post, RequestBody::Multipart(file))
    }

    /// Use an encoded entity as the body, replacing any raw body.
    pub fn with_entity<E: Entity>(mut self, entity: &E) -> Result<Self, ApiError> {
        self.body = RequestBody::Json(codec::encode(entity).map_err(ApiError::JsonEncode)?);
        Ok(self)
    }

    /// Use an already built JSON object as the body, replacing any entity.
    pub fn with_raw_body(mut self, body: Map<String, Value>) -> Self {
        self.body = RequestBody::Json(Value::Object(body).to_string());
        self
    }

    /// Do not decode the response body; the response carries no entity.
    pub fn without_response(mut self) -> Self {
        self.decode_response = false;
        self
    }

    /// Add a query parameter; adding a key again replaces its value.
    pub fn add_url_param(&mut self, key: &str, value: &str) {
        match self.url_params.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.url_params.push((key.to_string(), value.to_string())),
        }
    }

    /// Override the configured timeout for this request. It bounds the whole
    /// exchange, connecting included.
    pub fn set_timeout_seconds(&mut self, seconds: u64) {
        self.timeout = Some(Duration::from_secs(seconds));
    }

    /// Override the configured `Accept-Charset` for this request.
    pub fn set_charset(&mut self, charset: &str) {
        self.charset = Some(charset.to_string());
    }

    /// HTTP method the request is sent with.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Body as it will be written.
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Target URL including the encoded query string.
    pub fn url(&self) -> String {
        if self.url_params.is_empty() {
            return self.url.clone();
        }

        let query = self
            .url_params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, query)
    }

    /// Length in bytes of a JSON body, as sent in `Content-Length`.
    pub fn content_length(&self) -> Option<usize> {
        match &self.body {
            RequestBody::Empty => Some(0),
            RequestBody::Json(body) => Some(body.len()),
            RequestBody::Multipart(_) => None,
        }
    }

    pub(crate) async fn execute(
        self,
        client: &Client,
        config: &ClientConfig,
    ) -> Result<ApiResponse<T>, ApiError> {
        let url = self.url();
        let debug = matches!(config.log_level, LogLevel::Debug);

        if debug {
            log::debug!("{:?} {}", self.method, url);
        }

        let builder = match self.method {
            HttpMethod::Get => client.get(&url),
            HttpMethod::Post => client.post(&url),
            HttpMethod::Put => client.put(&url),
        }
        .timeout(self.timeout.unwrap_or_else(|| config.timeout()))
        .header(USER_AGENT, &config.user_agent)
        .header(
            ACCEPT_CHARSET,
            self.charset.as_deref().unwrap_or(&config.charset),
        );

        let builder = match self.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, &config.content_type),
            RequestBody::Json(body) => {
                if debug {
                    log::debug!("Body: {}", body);
                }
                builder.header(CONTENT_TYPE, &config.content_type).body(body)
            }
            RequestBody::Multipart(file) => {
                if debug {
                    log::debug!("Upload: {:?}", file);
                }
                builder.multipart(Form::new().part(FileUpload::FIELD_NAME, file.into_part()?))
            }
        };

        let resp = builder.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp.text().await?;
        let data = if self.decode_response {
            Some(codec::decode::<T>(&raw).map_err(ApiError::JsonDecode)?)
        } else {
            None
        };

        Ok(ApiResponse {
            data,
            raw,
            status: status.as_u16(),
        })
    }
}

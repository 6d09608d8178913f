use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Error};
use crate::Credentials;

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v1");

/// Requests hang on whatever the transport default is otherwise; the remote
/// service answers CRUD calls well within this.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed façade over the remote resource endpoints. Each operation is a
/// single round-trip request/response; resource modules under
/// [`crate::assistants`] add the per-resource verbs.
#[derive(Clone)]
pub struct AssistantClient {
    credentials: Credentials,
    client: Client,
}

impl std::fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AssistantClient")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorWrapper {
    error: ApiError,
}

/// Response body of the delete verbs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

/// One page of a paginated list; [`AssistantClient::list`] drains these.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct List<T> {
    pub first_id: Option<String>,
    pub last_id: Option<String>,
    pub data: Vec<T>,
    pub has_more: bool,
}

impl AssistantClient {
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(credentials: Credentials, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            credentials,
            client,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Confirms the credential authenticates against the remote service by
    /// listing a trivial resource. `Ok(false)` means the credential was
    /// rejected; anything else wrong (network outage, server error)
    /// propagates as `Err` and must not be read as an invalid key.
    pub async fn validate(&self) -> Result<bool, Error> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(Error::AuthenticationRejected(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    pub(crate) fn request_builder<R>(&self, method: Method, route: R) -> reqwest::RequestBuilder
    where
        R: Into<String>,
    {
        let url = format!("{}{}", self.credentials.base_url(), route.into());
        self.client
            .request(method, url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.credentials.api_key()),
            )
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    async fn request_inner<S, R>(
        &self,
        method: Method,
        route: R,
        body: Option<S>,
    ) -> Result<Response, reqwest::Error>
    where
        R: Into<String>,
        S: Serialize,
    {
        let route = route.into();
        log::debug!("Request[{method}] {route}");

        let mut request = self.request_builder(method.clone(), route.clone());
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        log::debug!("Response[{method}] {} {route}", response.status().as_str());
        Ok(response)
    }

    pub(crate) async fn request<S, R, T>(
        &self,
        method: Method,
        route: R,
        body: Option<S>,
    ) -> Result<T, Error>
    where
        R: Into<String>,
        S: Serialize,
        T: DeserializeOwned,
    {
        let response = self.request_inner(method, route, body).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        Err(classify_error(status, response.text().await?))
    }

    pub(crate) async fn get<R, T>(&self, route: R) -> Result<T, Error>
    where
        R: Into<String>,
        T: DeserializeOwned,
    {
        self.request::<(), R, T>(Method::GET, route, None).await
    }

    /// Fetches a route as raw bytes, e.g. file content.
    pub(crate) async fn get_bytes<R>(&self, route: R) -> Result<Vec<u8>, Error>
    where
        R: Into<String>,
    {
        let response = self
            .request_inner::<(), R>(Method::GET, route, None)
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }

        Err(classify_error(status, response.text().await?))
    }

    pub(crate) async fn post<S, R, T>(&self, route: R, body: S) -> Result<T, Error>
    where
        R: Into<String>,
        S: Serialize,
        T: DeserializeOwned,
    {
        self.request(Method::POST, route, Some(body)).await
    }

    pub(crate) async fn post_multipart<R, T>(&self, route: R, form: Form) -> Result<T, Error>
    where
        R: Into<String>,
        T: DeserializeOwned,
    {
        let route = route.into();
        log::debug!("Request[POST multipart] {route}");
        let response = self
            .request_builder(Method::POST, route)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        Err(classify_error(status, response.text().await?))
    }

    pub(crate) async fn delete<R>(&self, route: R) -> Result<Deleted, Error>
    where
        R: Into<String>,
    {
        self.request::<(), R, Deleted>(Method::DELETE, route, None)
            .await
    }

    /// Drains a paginated route in ascending server order. The result is a
    /// snapshot at call time, not a restartable cursor.
    pub(crate) async fn list<R, T>(&self, route: R) -> Result<Vec<T>, Error>
    where
        R: Into<String>,
        T: DeserializeOwned,
    {
        let base = route.into();
        let mut after: Option<String> = None;
        let mut data = Vec::new();

        loop {
            let page_route = match &after {
                Some(id) => format!("{base}?order=asc&after={id}"),
                None => format!("{base}?order=asc"),
            };
            let page: List<T> = self.get(page_route).await?;
            data.extend(page.data);
            if !page.has_more {
                break;
            }
            match page.last_id {
                Some(id) => after = Some(id),
                None => break,
            }
        }

        Ok(data)
    }
}

/// Maps a non-2xx response onto the error taxonomy. 401 and 404 get their own
/// variants so callers can tell a bad credential or a vanished resource apart
/// from a rejected payload; 5xx is the server failing, not the request.
fn classify_error(status: StatusCode, body: String) -> Error {
    let api_error = match serde_json::from_str::<ApiErrorWrapper>(&body) {
        Ok(wrapper) => wrapper.error,
        Err(_) => ApiError::new(body, "unknown".to_string()),
    };
    match status {
        StatusCode::UNAUTHORIZED => Error::AuthenticationRejected(api_error),
        StatusCode::NOT_FOUND => Error::NotFound(api_error),
        status if status.is_server_error() => Error::ServerError(api_error),
        _ => Error::RemoteRejected(api_error),
    }
}

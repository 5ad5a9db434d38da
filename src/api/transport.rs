//! HTTP transport: base URL resolution and bearer-token attachment

use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::error::{ClientError, ClientResult};
use crate::credentials::Credentials;

/// Thin wrapper over `reqwest::Client` shared by every domain client.
///
/// No timeout and no retry: a failed call is handed straight back to the caller.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl Transport {
    /// `api_root` is the versioned API root, e.g. `http://localhost:8000/api/v1`
    pub fn new(api_root: &str, credentials: Credentials) -> ClientResult<Self> {
        let client = Client::builder().build()?;
        Self::with_client(client, api_root, credentials)
    }

    pub fn with_client(client: Client, api_root: &str, credentials: Credentials) -> ClientResult<Self> {
        let mut root = api_root.trim_end_matches('/').to_string();
        root.push('/');
        let base_url = Url::parse(&root)?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Resolve a path relative to the API root
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let response = self.authorize(self.client.get(url)).send().await?;
        decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        let response = self
            .authorize(self.client.post(url))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    /// POST with no body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        let response = self.authorize(self.client.post(url)).send().await?;
        decode(response).await
    }

    /// POST an urlencoded form
    pub async fn post_form<F, T>(&self, path: &str, form: &F) -> ClientResult<T>
    where
        F: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {} (form)", url);
        let response = self
            .authorize(self.client.post(url))
            .form(form)
            .send()
            .await?;
        decode(response).await
    }

    /// POST with parameters in the query string
    pub async fn post_query<Q, T>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {} (query)", url);
        let response = self
            .authorize(self.client.post(url))
            .query(query)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        debug!("POST {} (multipart)", url);
        let response = self
            .authorize(self.client.post(url))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        debug!("DELETE {}", url);
        let response = self.authorize(self.client.delete(url)).send().await?;
        decode(response).await
    }
}

/// Map non-2xx responses to `ClientError::Http`, otherwise parse the JSON body
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let text = String::from_utf8_lossy(&body);
        return Err(ClientError::from_response(status, &text));
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Percent-encode an identifier for use as a single path segment
pub fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

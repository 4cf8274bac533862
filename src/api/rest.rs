use super::error::FetchError;
use super::session::Session;
use super::types::{ErrorBody, PageEnvelope};
use crate::listing::{DetailSource, Filters, Identified, ListPage, PageSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Longest plain-text error body we are willing to show verbatim.
const MAX_PLAIN_ERROR_LEN: usize = 200;

pub struct BizBookerRest {
    client: Client,
    session: Arc<Session>,
    base_url: Url,
}

impl BizBookerRest {
    pub fn new(session: Arc<Session>, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry a path: {}", base_url);
        }
        Ok(Self {
            client,
            session,
            base_url,
        })
    }

    /// Base URL with the given path segments appended (each one escaped).
    pub fn url_for(&self, segments: &[String]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments.iter().map(String::as_str));
        }
        url
    }

    /// Fetch one page of a Spring-paginated listing.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        segments: &[String],
        page_index: u32,
        page_size: u32,
        filters: &Filters,
    ) -> Result<ListPage<T>, FetchError> {
        let mut query = vec![
            ("page".to_string(), page_index.to_string()),
            ("size".to_string(), page_size.to_string()),
        ];
        query.extend(filters.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let env: PageEnvelope<T> = self.get_json(segments, &query).await?;
        Ok(env.into())
    }

    /// Authenticated GET returning JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[String],
        query: &[(String, String)],
    ) -> Result<T, FetchError> {
        let url = self.url_for(segments);
        let mut req = self.client.get(url.clone()).query(query);
        for (k, v) in self.session.headers() {
            req = req.header(k, v);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        tracing::debug!(url = %url, status = status.as_u16(), bytes = body.len(), "GET");

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: extract_error_message(status.as_u16(), &text),
            });
        }
        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Malformed(format!("{}: {}", url.path(), e)))
    }
}

/// Pull a human-readable message out of an error response body.
/// JSON `message`, `error`, `detail` win in that order; otherwise a short
/// plain-text body; otherwise a generic line naming the status code.
pub fn extract_error_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let found = [parsed.message, parsed.error, parsed.detail]
            .into_iter()
            .flatten()
            .map(|m| m.trim().to_string())
            .find(|m| !m.is_empty());
        if let Some(message) = found {
            return message;
        }
    }
    let looks_like_markup = body.starts_with('<') || body.starts_with('{') || body.starts_with('[');
    if !body.is_empty() && !looks_like_markup && body.chars().count() <= MAX_PLAIN_ERROR_LEN {
        return body.to_string();
    }
    format!("request failed with status {}", status)
}

/// Which backend collection a listing reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Businesses,
    Category(String),
    Search,
    Appointments { user_id: String },
    Bookings { business_id: i64 },
}

impl Endpoint {
    pub fn list_segments(&self) -> Vec<String> {
        let parts: Vec<&str> = match self {
            Endpoint::Businesses => vec!["api", "businesses"],
            Endpoint::Category(category) => vec!["api", "businesses", "category", category.as_str()],
            Endpoint::Search => vec!["api", "businesses", "search"],
            Endpoint::Appointments { user_id } => vec!["api", "appointments", "user", user_id.as_str()],
            Endpoint::Bookings { .. } => vec!["api", "appointments", "business"],
        };
        let mut segments: Vec<String> = parts.into_iter().map(str::to_string).collect();
        if let Endpoint::Bookings { business_id } = self {
            segments.push(business_id.to_string());
        }
        segments
    }

    pub fn detail_segments(&self, id: &str) -> Vec<String> {
        let collection = match self {
            Endpoint::Businesses | Endpoint::Category(_) | Endpoint::Search => "businesses",
            Endpoint::Appointments { .. } | Endpoint::Bookings { .. } => "appointments",
        };
        vec!["api".to_string(), collection.to_string(), id.to_string()]
    }

    pub fn label(&self) -> String {
        match self {
            Endpoint::Businesses => "Businesses".to_string(),
            Endpoint::Category(category) => format!("Category: {}", category),
            Endpoint::Search => "Search".to_string(),
            Endpoint::Appointments { .. } => "My Appointments".to_string(),
            Endpoint::Bookings { business_id } => format!("Bookings for business #{}", business_id),
        }
    }

    /// Filter the view's `/` prompt edits.
    pub fn text_filter(&self) -> &'static str {
        match self {
            Endpoint::Businesses | Endpoint::Category(_) => "city",
            Endpoint::Search => "query",
            Endpoint::Appointments { .. } | Endpoint::Bookings { .. } => "status",
        }
    }
}

/// [`PageSource`] and [`DetailSource`] backed by one REST endpoint.
pub struct RestSource<T> {
    rest: Arc<BizBookerRest>,
    endpoint: Endpoint,
    _item: PhantomData<fn() -> T>,
}

impl<T> RestSource<T> {
    pub fn new(rest: Arc<BizBookerRest>, endpoint: Endpoint) -> Self {
        Self {
            rest,
            endpoint,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T> PageSource<T> for RestSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
        filters: &Filters,
    ) -> Result<ListPage<T>, FetchError> {
        self.rest
            .get_page(&self.endpoint.list_segments(), page_index, page_size, filters)
            .await
    }
}

#[async_trait]
impl<T> DetailSource<T> for RestSource<T>
where
    T: Identified + DeserializeOwned + Send + 'static,
{
    async fn fetch_detail(&self, id: &T::Id) -> Result<T, FetchError> {
        self.rest
            .get_json(&self.endpoint.detail_segments(&id.to_string()), &[])
            .await
    }
}

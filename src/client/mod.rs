//! HTTP transport and resource client for the catalog API.
//!
//! [`ApiClient`] wraps a configured `reqwest` client (base URL, JSON content
//! type, fixed timeout) and exposes one method per API endpoint. Failures are
//! classified into [`ApiError`]; every request and its outcome is logged with
//! method, path, and status. Retry policy, if any, belongs to the caller.

mod error;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiSettings;
use crate::domain::{
    Author, AuthorDraft, AuthorPatch, Book, BookDraft, BookPatch, Category, CategoryDraft,
    CategoryPatch, Health, ListParams, Page,
};

pub use error::ApiError;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base = settings
            .base_url
            .join("/")
            .map_err(|err| ApiError::InvalidUrl {
                message: err.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(Self::user_agent())
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| ApiError::Build {
                message: err.to_string(),
            })?;

        Ok(Self { http, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio/", env!("CARGO_PKG_VERSION"))
    }

    // ========================================================================
    // Books
    // ========================================================================

    pub async fn list_books(&self, params: &ListParams) -> Result<Page<Book>, ApiError> {
        self.get("books/", Some(&params.to_query())).await
    }

    pub async fn get_book(&self, id: i64) -> Result<Book, ApiError> {
        self.get(&format!("books/{id}"), None).await
    }

    pub async fn create_book(&self, draft: &BookDraft) -> Result<Book, ApiError> {
        self.request(Method::POST, "books/", None, Some(draft))
            .await
    }

    pub async fn update_book(&self, id: i64, patch: &BookPatch) -> Result<Book, ApiError> {
        self.request(Method::PUT, &format!("books/{id}"), None, Some(patch))
            .await
    }

    pub async fn delete_book(&self, id: i64) -> Result<(), ApiError> {
        self.request_unit(Method::DELETE, &format!("books/{id}"), None)
            .await
    }

    /// Apply a signed delta to a book's stock count.
    ///
    /// The server rejects deltas that would drive stock negative; that
    /// surfaces here as [`ApiError::Validation`].
    pub async fn patch_book_stock(&self, id: i64, quantity_change: i64) -> Result<Book, ApiError> {
        let query = [("quantity_change", quantity_change.to_string())];
        self.request(
            Method::PATCH,
            &format!("books/{id}/stock"),
            Some(&query),
            None::<&()>,
        )
        .await
    }

    // ========================================================================
    // Authors
    // ========================================================================

    pub async fn list_authors(&self, params: &ListParams) -> Result<Page<Author>, ApiError> {
        self.get("authors/", Some(&params.to_query())).await
    }

    pub async fn get_author(&self, id: i64) -> Result<Author, ApiError> {
        self.get(&format!("authors/{id}"), None).await
    }

    pub async fn create_author(&self, draft: &AuthorDraft) -> Result<Author, ApiError> {
        self.request(Method::POST, "authors/", None, Some(draft))
            .await
    }

    pub async fn update_author(&self, id: i64, patch: &AuthorPatch) -> Result<Author, ApiError> {
        self.request(Method::PUT, &format!("authors/{id}"), None, Some(patch))
            .await
    }

    pub async fn delete_author(&self, id: i64) -> Result<(), ApiError> {
        self.request_unit(Method::DELETE, &format!("authors/{id}"), None)
            .await
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub async fn list_categories(&self, params: &ListParams) -> Result<Page<Category>, ApiError> {
        self.get("categories/", Some(&params.to_query())).await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, ApiError> {
        self.get(&format!("categories/{id}"), None).await
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
        self.request(Method::POST, "categories/", None, Some(draft))
            .await
    }

    pub async fn update_category(&self, id: i64, patch: &CategoryPatch) -> Result<Category, ApiError> {
        self.request(Method::PUT, &format!("categories/{id}"), None, Some(patch))
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.request_unit(Method::DELETE, &format!("categories/{id}"), None)
            .await
    }

    // ========================================================================
    // Search and health
    // ========================================================================

    /// Free-text search across books.
    pub async fn search_books(&self, query: &str) -> Result<Vec<Book>, ApiError> {
        let query = [("q", query.to_string())];
        self.get("search/books/", Some(&query)).await
    }

    pub async fn health(&self) -> Result<Health, ApiError> {
        self.get("health", None).await
    }

    // ========================================================================
    // Transport core
    // ========================================================================

    fn url(&self, path: &str, query: Option<&[(&str, String)]>) -> Result<Url, ApiError> {
        let mut url = self.base.join(path).map_err(|err| ApiError::InvalidUrl {
            message: err.to_string(),
        })?;
        if let Some(pairs) = query {
            let mut qp = url.query_pairs_mut();
            for (key, value) in pairs {
                qp.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&[(&str, String)]>,
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None::<&()>).await
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let resp = self.dispatch(method.clone(), path, query, body).await?;
        let status = resp.status().as_u16();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| ApiError::from_transport(&err))?;

        if !(200..300).contains(&status) {
            let err = ApiError::from_status(status, &bytes);
            warn!(method = %method, path, status, error = %err, "api request failed");
            return Err(err);
        }

        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode {
            message: err.to_string(),
        })
    }

    /// Like [`Self::request`], for endpoints whose response body is ignored.
    async fn request_unit(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
    ) -> Result<(), ApiError> {
        let resp = self
            .dispatch(method.clone(), path, query, None::<&()>)
            .await?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let bytes = resp.bytes().await.unwrap_or_default();
            let err = ApiError::from_status(status, &bytes);
            warn!(method = %method, path, status, error = %err, "api request failed");
            return Err(err);
        }
        Ok(())
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path, query)?;

        debug!(method = %method, path, "api request");

        let mut req = self.http.request(method.clone(), url);
        if let Some(body) = body {
            req = req.json(body);
        }

        match req.send().await {
            Ok(resp) => {
                debug!(method = %method, path, status = resp.status().as_u16(), "api response");
                Ok(resp)
            }
            Err(err) => {
                let classified = ApiError::from_transport(&err);
                warn!(method = %method, path, error = %classified, "api transport failure");
                Err(classified)
            }
        }
    }
}

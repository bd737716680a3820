//! Per-request facts the views care about

use axum::{
    extract::{FromRequestParts, OriginalUri, RawPathParams},
    http::{request::Parts, Method},
};
use std::convert::Infallible;

use crate::models::User;

/// Header value marking an asynchronous (background) request
const ASYNC_REQUEST_MARKER: &str = "XMLHttpRequest";

/// User resolved from the session, inserted by the identity middleware
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// What a view needs to know about the current request
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    /// Path and query as the client sent them, nest prefixes included
    pub path: String,
    /// `X-Requested-With: XMLHttpRequest`
    pub is_async: bool,
    /// The route's `format` path parameter
    pub format: Option<String>,
    pub user: Option<User>,
}

impl RequestMeta {
    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let format = RawPathParams::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|params| {
                params
                    .iter()
                    .find(|(key, _)| *key == "format")
                    .map(|(_, value)| value.to_string())
            });

        let is_async = parts
            .headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v.eq_ignore_ascii_case(ASYNC_REQUEST_MARKER));

        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|authenticated| authenticated.0.clone());

        Ok(Self {
            method: parts.method.clone(),
            path,
            is_async,
            format,
            user,
        })
    }
}

#[cfg(test)]
impl RequestMeta {
    /// Plain GET of `path` by an anonymous, non-async client
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            is_async: false,
            format: None,
            user: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> RequestMeta {
        let (mut parts, _) = request.into_parts();
        RequestMeta::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_detects_async_requests() {
        let meta = extract(
            Request::builder()
                .uri("/contents?page=2")
                .header("X-Requested-With", "XMLHttpRequest")
                .body(())
                .unwrap(),
        )
        .await;
        assert!(meta.is_async);
        assert_eq!(meta.path, "/contents?page=2");
        assert!(meta.format.is_none());
        assert!(meta.user.is_none());
    }

    #[tokio::test]
    async fn test_plain_request() {
        let meta = extract(
            Request::builder()
                .method("POST")
                .uri("/contents/new")
                .body(())
                .unwrap(),
        )
        .await;
        assert!(!meta.is_async);
        assert!(meta.is_post());
    }

    #[tokio::test]
    async fn test_reads_authenticated_user() {
        let mut request = Request::builder().uri("/").body(()).unwrap();
        request
            .extensions_mut()
            .insert(AuthenticatedUser(User::new("ana", "ana@example.com")));
        let meta = extract(request).await;
        assert_eq!(meta.user().unwrap().username, "ana");
    }
}

//! Fixed response headers.
//!
//! Every response, including gate rejections and 404s, gets the configured
//! headers. A configured header replaces one the handler already set.

use crate::domain::{ConfigError, HeaderEntry};
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer adding a fixed set of headers to each response
#[derive(Clone, Default)]
pub struct StaticHeadersLayer {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl StaticHeadersLayer {
    pub fn new(headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        Self {
            headers: Arc::new(headers),
        }
    }

    /// Build from configuration entries, in order.
    pub fn from_config(entries: &[HeaderEntry]) -> Result<Self, ConfigError> {
        let headers = entries
            .iter()
            .map(HeaderEntry::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(headers))
    }
}

impl<S> Layer<S> for StaticHeadersLayer {
    type Service = StaticHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StaticHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Static headers service
#[derive(Clone)]
pub struct StaticHeadersService<S> {
    inner: S,
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl<S> Service<Request<Body>> for StaticHeadersService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let headers = Arc::clone(&self.headers);

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            let target = response.headers_mut();
            for (name, value) in headers.iter() {
                target.insert(name.clone(), value.clone());
            }
            Ok(response)
        })
    }
}

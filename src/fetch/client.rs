use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a single prepared HTTP request.
///
/// Everything that talks to the network goes through this trait so the
/// transport can be swapped (for a fake in tests, or wrapped to add auth).
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}

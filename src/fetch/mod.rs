mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::{Method, Request, Response, Url};

/// Issues a GET for `url` through `client`.
///
/// The status code is not inspected here; callers decide what counts as a
/// failure for their API.
pub async fn get<C: HttpClient + ?Sized>(client: &C, url: Url) -> reqwest::Result<Response> {
    let req = Request::new(Method::GET, url);
    client.execute(req).await
}

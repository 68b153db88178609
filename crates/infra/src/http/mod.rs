//! HTTP client and wire transport

mod client;
mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use transport::HttpTransport;

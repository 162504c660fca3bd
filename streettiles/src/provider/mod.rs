//! Raw street data providers.
//!
//! A [`DataFetcher`] downloads the raw data for one index tile. The default
//! implementation, [`OverpassFetcher`], queries an Overpass API instance
//! through an [`AsyncHttpClient`], which tests replace with a mock.

mod http;
mod overpass;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_HTTP_TIMEOUT_SECS};
pub use overpass::{OverpassFetcher, DEFAULT_OVERPASS_URL, DEFAULT_QUERY_TIMEOUT_SECS};
pub use types::{DataFetcher, ProviderError};

// Adapters layer: concrete implementations of the domain ports (HTTP client, local files).

pub mod http;
pub mod storage;

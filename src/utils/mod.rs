//! Utility functions and helpers.

pub mod http;
pub mod url;

pub use self::url::{host_key, normalize_link, resolve_host, resolve_url};

//! Traits defined in `parkhub-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;

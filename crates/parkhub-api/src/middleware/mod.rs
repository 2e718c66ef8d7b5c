//! Tower layers and request middleware.

pub mod cors;
pub mod logging;

mod source;
mod wire;

pub use source::{DEFAULT_TIMEOUT, HttpFeedSource};

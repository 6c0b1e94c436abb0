//! Offline app shell cache.
//!
//! Mirrors an installable web app's cache worker:
//! - `install` copies a fixed manifest of resources into a versioned generation
//! - `activate` deletes every generation but the current one
//! - `fetch` answers from cache first, refills from the network, and hands
//!   navigations the cached shell document when the network is unusable

mod error;
mod network;
mod push;
mod storage;
mod types;
mod worker;

pub use error::ShellError;
pub use network::HttpNetwork;
pub use storage::SqliteCacheStore;
pub use types::Request;
pub use worker::ShellWorker;

//! Client protocol for Nigori stores.
//!
//! Values are stored encrypted under deterministically obscured names and
//! every request carries a single-use signed token. Secrets can also be split
//! across several stores so that any `k` of `n` recover them.

pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod resource;
pub mod split;
pub mod transport;
pub mod types;

pub use auth::AuthToken;
pub use config::{ClientConfig, Endpoint, Scheme};
pub use error::ClientError;
pub use resource::ResourceClient;
pub use split::{SplitCoordinator, SplitTopology};
pub use transport::{HttpTransport, Method, Request, Response, Transport};
pub use types::{
    StoredRecord, WireRecord, SPLIT_SERVERS_NAME, TYPE_NAMED_VALUE, TYPE_SIGNATURE_KEY,
    TYPE_SPLIT_SERVERS,
};

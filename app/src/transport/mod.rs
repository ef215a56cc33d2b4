//! [`Transport`](dashboard_state_api::Transport) implementations.

mod http;
mod in_memory;

pub use http::HttpTransport;
pub use in_memory::InMemoryBackend;

//! Helpers for driving the story crate against a mock chat-completion endpoint.

pub mod openai;

use std::net::SocketAddr;

use tokio::net::TcpListener;

pub use openai::{OpenAIMock, RecordedRequest, TEST_API_KEY, TestOpenAIServer};

/// An address on which nothing listens, for connection-refused scenarios.
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    address
}

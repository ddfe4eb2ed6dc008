//! Testing utilities for LibOS clients.

mod mock_gateway;

pub use mock_gateway::{MockGateway, Request, RoundTrip};

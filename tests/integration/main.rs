//! Integration tests with mock HTTP server

mod assistant_flow;
mod embeddings;
mod error_handling;
mod gemini;
mod mock_server;

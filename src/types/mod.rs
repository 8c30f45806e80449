//! Core chat types.

pub mod message;

pub use message::{Message, MessageRole};

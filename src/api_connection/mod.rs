pub mod connection;
pub mod endpoints;

pub use connection::{ApiConnectionError, ChatClient};
pub use endpoints::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

pub mod anthropic;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use provider::{CompletionError, CompletionProvider, CompletionRequest};

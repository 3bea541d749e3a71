pub mod calls;
pub mod client;
pub mod error;
pub mod jsonrpc;

pub use client::{McpClient, McpClientConfig};
pub use error::McpError;

pub mod gateway;
pub mod types;

pub use gateway::{ToolGateway, ToolSession};
pub use types::{ContentItem, Tool, ToolCall, ToolParameter, ToolResult, ToolSchema};

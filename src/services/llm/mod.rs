pub mod client;
pub mod prompts;

pub use client::{ChatReply, ChatService};
pub use prompts::system_prompt;

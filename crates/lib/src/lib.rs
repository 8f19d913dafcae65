//! ochat core library: configuration, model discovery, inference, and the
//! conversation state behind a chat host.

pub mod config;
pub mod host;
pub mod llm;
pub mod render;
pub mod session;

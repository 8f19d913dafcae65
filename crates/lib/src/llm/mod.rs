//! Backend clients for the local inference server.
//!
//! Supports listing models (`GET {base}/models`) and single-shot prompt
//! completion (`POST {base}/v1/chat`).

mod inference;
mod models;

pub use inference::{
    assistant_text_from_body, InferenceBackend, InferenceClient, InferenceError, CHAT_PATH,
};
pub use models::{DirectoryError, ModelDirectoryClient, ModelListing, ModelSet, MODELS_PATH};

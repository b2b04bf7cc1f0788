//! Remote review call: chat client, prompt, reply extraction and retries.

pub mod client;
pub mod json;
pub mod prompt;
pub mod retry;

pub use client::{ChatBackend, HttpChatClient};
pub use json::extract_json;
pub use prompt::{SYSTEM_INSTRUCTION, build_user_message};
pub use retry::{
    Classify, FailureClass, LinearBackoff, RetryAttempt, RetryPolicy, call_with_retry,
    call_with_retry_observed,
};

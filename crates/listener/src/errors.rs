use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Webhook delivery has no X-Event-Key header")]
    MissingEventKey,

    #[error("Webhook event key {0:?} is not handled")]
    UnknownEventKey(String),

    /// Delayed notification needs a running tokio runtime.
    #[error("No tokio runtime is available for delayed notification")]
    NoRuntime,
}

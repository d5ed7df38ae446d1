use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("No recipient for evite {0}")]
    NoRecipient(String),

    #[error("Failed to dispatch notification: {0}")]
    SendFailed(String),
}

// src/infra/errors.rs — Error types for the reminder engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    // Fallback errors (caller degrades to a default)
    #[error("Insufficient logging history for user '{user_id}' goal '{goal_id}'")]
    InsufficientData { user_id: String, goal_id: String },

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    // Caller errors
    #[error("Invalid reminder preference: {0}")]
    InvalidPreference(String),

    #[error("Goal '{goal_id}' not found")]
    GoalNotFound { goal_id: String },

    #[error("User '{user_id}' not found")]
    UserNotFound { user_id: String },

    // Collaborator errors (never fatal to a sweep)
    #[error("Delivery to user '{user_id}' for goal '{goal_id}' failed: {message}")]
    DeliveryFailure {
        user_id: String,
        goal_id: String,
        message: String,
    },

    // Infra
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReminderError {
    /// Errors that mean "use the fallback for this cycle" rather than abort.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            ReminderError::InsufficientData { .. } | ReminderError::UnknownTimezone(_)
        )
    }

    pub fn insufficient(user_id: &str, goal_id: &str) -> Self {
        ReminderError::InsufficientData {
            user_id: user_id.to_string(),
            goal_id: goal_id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ReminderError::InvalidPreference(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ReminderError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid workflow mode '{0}': expected 'solo' or '2agent'")]
    InvalidWorkflowMode(String),

    #[error("invalid task status: {0}")]
    InvalidTaskStatus(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid rule category: {0}")]
    InvalidRuleCategory(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),

    #[error("token count overflow while folding {0}")]
    Overflow(&'static str),

    #[error("{component} analysis failed: {reason}")]
    ComponentFailed { component: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

//! API request and response types

use crate::conversation::Message;
use serde::{Deserialize, Serialize};

/// Body of `POST /ask`
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful `POST /ask` reply, with the full transcript
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
    pub history: Vec<Message>,
}

/// Failed `POST /ask` reply
#[derive(Debug, Serialize)]
pub struct AskErrorResponse {
    pub reply: String,
}

/// `GET /feedback` reply: user and assistant messages only
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub history: Vec<Message>,
}

/// `POST /reset` reply
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: String,
}

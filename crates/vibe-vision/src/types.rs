//! Query endpoint wire types.

use serde::{Deserialize, Serialize};

/// Body of `POST {base}/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// `data:<mime>;base64,<payload>`
    pub image: String,
    pub question: String,
    pub response_format: String,
}

/// Query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

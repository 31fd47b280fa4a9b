//! Wire records exchanged with the journal service.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::parse_timestamp;

/// Analysis flavour requested when the caller does not pick one.
pub const DEFAULT_ANALYSIS_TYPE: &str = "general";

/// A journal record as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub id: String,
    pub date: String,
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub preview_text: Option<String>,
    pub timestamp: String,
}

impl RemoteEntry {
    /// The record's last-modified time, if it is in a recognised format.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// Body of create and update requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub entry_id: String,
    pub analysis_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub entry_id: String,
    pub analysis_type: String,
    pub analysis: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub prompt: String,
}

//! Client for the remote journal service.

mod client;
mod error;
mod types;

pub use client::{HttpJournalClient, JournalApi};
pub use error::{ApiError, ApiResult};
pub use types::{
    AnalysisRequest, AnalysisResponse, EntryContent, PromptResponse, RemoteEntry,
    DEFAULT_ANALYSIS_TYPE,
};

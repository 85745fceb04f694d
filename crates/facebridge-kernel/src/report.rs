//! Recognition report
//!
//! The face-recognition routine answers with a small JSON document:
//!
//! ```json
//! {"status": "success", "message": null, "name": "alice",
//!  "emotion": "happy", "time": "2024-05-01 10:00:00"}
//! ```
//!
//! Hosts used to pick it apart field by field. [`RecognitionReport`] does it
//! once, keeping the same fallbacks for absent fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ForeignCallError;
use crate::sentinel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionStatus {
    Success,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RecognitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognitionStatus::Success => "success",
            RecognitionStatus::Error => "error",
            RecognitionStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// The call itself failed; no document was produced.
    #[error("Call failed: {0}")]
    Call(#[from] ForeignCallError),

    /// The text was the sentinel, i.e. the bridge already reported a failure.
    #[error("Routine output is the error sentinel")]
    Sentinel,

    #[error("Malformed report: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionReport {
    #[serde(default)]
    pub status: RecognitionStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl RecognitionReport {
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        if sentinel::is_sentinel(raw) {
            return Err(ReportError::Sentinel);
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub fn is_success(&self) -> bool {
        self.status == RecognitionStatus::Success
    }

    /// Five display lines, one per field, with placeholders for absent ones.
    pub fn summary(&self) -> String {
        format!(
            "Status: {}\nMessage: {}\nName: {}\nEmotion: {}\nTime: {}",
            self.status.as_str(),
            self.message.as_deref().unwrap_or("No message"),
            self.name.as_deref().unwrap_or("No name"),
            self.emotion.as_deref().unwrap_or("No emotion"),
            self.time.as_deref().unwrap_or("No time"),
        )
    }
}

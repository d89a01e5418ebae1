use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author recorded on a pin when the commenter gave no name.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Review state of an image.
///
/// `Pending` is only ever the initial state. Transitions target `Approved` or
/// `ChangesRequested`, and either may be re-entered any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    ChangesRequested,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::ChangesRequested => "changes_requested",
        }
    }

    /// Whether a caller may request a transition into this status.
    pub fn is_transition_target(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown review status: {:?}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ReviewStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "changes_requested" => Ok(Self::ChangesRequested),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// An uploaded image and its position in the review workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Uuid,
    /// Stored blob name, served under `/uploads/`.
    pub filename: String,
    pub original_name: String,
    pub upload_date: DateTime<Utc>,
    pub status: ReviewStatus,
    /// Number of the newest history entry, 0 before the first transition.
    pub latest_version: u32,
}

impl Image {
    pub fn url(&self) -> String {
        format!("/uploads/{}", self.filename)
    }
}

/// A comment pinned to a point of an image.
///
/// `x` and `y` are in the image's natural pixel space, never display pixels,
/// so a pin stays on the same feature at any zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: Uuid,
    pub image_id: Uuid,
    pub x: f64,
    pub y: f64,
    pub comment: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of an image's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: Uuid,
    pub image_id: Uuid,
    pub version_number: u32,
    pub status: ReviewStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub status: ReviewStatus,
    pub version_number: u32,
}

/// An image together with its pins (oldest first) and history (newest first).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDetail {
    pub image: Image,
    pub annotations: Vec<Annotation>,
    pub versions: Vec<Version>,
}

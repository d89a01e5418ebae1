use crate::error::{Result, ReviewError};

/// Capability handed to gated operations.
///
/// The transport decides whether a caller is an administrator and passes the
/// verdict in; the core only enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

impl Access {
    pub fn from_authorized(authorized: bool) -> Self {
        if authorized { Self::Granted } else { Self::Denied }
    }

    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }

    pub fn require(self) -> Result<()> {
        match self {
            Self::Granted => Ok(()),
            Self::Denied => Err(ReviewError::Unauthorized),
        }
    }
}

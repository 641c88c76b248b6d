//! Typed identifier for stored images.
//!
//! Image IDs are assigned by the database (monotonic, never reused), so the
//! wrapper is over `i64` rather than a generated UUID. Keeping it a distinct
//! type stops a raw row count or offset from being passed where an ID is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Route prefix under which images are served.
pub const IMAGES_PATH: &str = "/images";

/// Unique identifier for a stored image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(i64);

impl ImageId {
    /// Return the raw integer value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }

    /// Path at which the image payload can be fetched.
    #[must_use]
    pub fn fetch_path(self) -> String {
        format!("{IMAGES_PATH}/{}", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ImageId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

impl From<i64> for ImageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ImageId> for i64 {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

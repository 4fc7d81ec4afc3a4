use serde::{Deserialize, Serialize};
use std::fmt;

use super::ArtifactId;

/// A build output stored by the CI service.
///
/// `name` is only for display; identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    #[serde(default)]
    pub name: String,
}

impl Artifact {
    pub fn new(id: impl Into<ArtifactId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// One page of the listing endpoint, as sent over the wire.
///
/// GitHub は `total_count` なども返すが、ここでは `artifacts` だけ読む。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

//! Domain identifiers.
//!
//! ArtifactId はリモート側（CI サービス）が採番する数値 ID をそのまま包む newtype。
//! 中身は不透明として扱い、比較と表示以外の意味は持たせない。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an artifact, unique within one repository.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(u64);

impl ArtifactId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ArtifactId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

//! State - 削除パイプライン上の artifact の状態
//!
//! 状態遷移:
//! - Pending → InFlight（gate の slot を取得）
//! - InFlight → Deleted | Failed（slot を返却）
//! - Pending → Skipped（shutdown 要求後、dispatch されなかったもの）
//!
//! 終端状態から Pending に戻ることはない（リトライしない）。

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteState {
    Pending,
    InFlight,
    Deleted,
    Failed,
    Skipped,
}

impl DeleteState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeleteState::Deleted | DeleteState::Failed | DeleteState::Skipped
        )
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: DeleteState) -> bool {
        use DeleteState::*;
        matches!(
            (self, next),
            (Pending, InFlight) | (Pending, Skipped) | (InFlight, Deleted) | (InFlight, Failed)
        )
    }
}

impl fmt::Display for DeleteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeleteState::Pending => "pending",
            DeleteState::InFlight => "in_flight",
            DeleteState::Deleted => "deleted",
            DeleteState::Failed => "failed",
            DeleteState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

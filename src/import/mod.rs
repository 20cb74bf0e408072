//! End-to-end import: classify a URL, fetch from its provider, normalize,
//! then upsert songs and append memberships in one transaction.

pub mod orchestrator;
pub mod radio;

pub use orchestrator::{normalize_tracks, ImportOrchestrator, NormalizedTrack};

use std::fmt;

/// Pipeline stages, used to label log lines and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Classify,
    Fetch,
    Normalize,
    Upsert,
    RankInsert,
    Committed,
    Aborted,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Classify => "classify",
            ImportStage::Fetch => "fetch",
            ImportStage::Normalize => "normalize",
            ImportStage::Upsert => "upsert",
            ImportStage::RankInsert => "rank-insert",
            ImportStage::Committed => "committed",
            ImportStage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

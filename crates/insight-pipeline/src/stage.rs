//! Names of the pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a pipeline run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Plan,
    Summarize,
    Hypothesize,
    Validate,
    Recommend,
}

impl Stage {
    /// Stages that run inside the scheduled graph, in dependency order
    pub const GRAPH: [Stage; 4] = [
        Stage::Summarize,
        Stage::Hypothesize,
        Stage::Validate,
        Stage::Recommend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Summarize => "summarize",
            Self::Hypothesize => "hypothesize",
            Self::Validate => "validate",
            Self::Recommend => "recommend",
        }
    }

    /// The stage whose output this one consumes
    pub fn upstream(&self) -> Option<Stage> {
        match self {
            Self::Plan | Self::Summarize => None,
            Self::Hypothesize => Some(Self::Summarize),
            Self::Validate => Some(Self::Hypothesize),
            Self::Recommend => Some(Self::Validate),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Plan]
            .into_iter()
            .chain(Self::GRAPH)
            .find(|s| s.as_str() == name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

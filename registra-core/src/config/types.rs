//! Alignment settings

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::tolerance::Tolerances;
use crate::travel::{TravelOptimizer, DEFAULT_MAX_PASSES};

/// What a run does after a board fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FailurePolicy {
    /// Stop the run; boards already committed stay committed
    #[default]
    AbortRun,
    /// Leave the failed board rolled back and continue with the next
    SkipBoard,
}

/// Settings for an alignment run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignmentSettings {
    pub tolerances: Tolerances,
    /// 2-opt pass budget for fiducial ordering
    pub max_optimizer_passes: u16,
    pub failure_policy: FailurePolicy,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            max_optimizer_passes: DEFAULT_MAX_PASSES,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl AlignmentSettings {
    pub fn optimizer(&self) -> TravelOptimizer {
        TravelOptimizer::new(self.max_optimizer_passes)
    }
}

//! Stages of the create-subscription workflow.
//!
//! ```text
//! Requested ─► PlanReady ─► VariationReady ─► Submitted ─► Persisted
//!     │            │              │               │
//!     └────────────┴──────────────┴───────────────┴──► Failed { at }
//! ```

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Non-terminal workflow step, recorded when a run fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStep {
    Requested,
    PlanReady,
    VariationReady,
    Submitted,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStep::Requested => "REQUESTED",
            WorkflowStep::PlanReady => "PLAN_READY",
            WorkflowStep::VariationReady => "VARIATION_READY",
            WorkflowStep::Submitted => "SUBMITTED",
        };
        write!(f, "{}", s)
    }
}

/// Position of a create-subscription run in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "stage")]
pub enum SubscriptionStage {
    Requested,
    PlanReady,
    VariationReady,
    Submitted,
    Persisted,
    Failed { at: WorkflowStep },
}

impl SubscriptionStage {
    /// The step a failure at this stage is attributed to.
    fn as_step(&self) -> Option<WorkflowStep> {
        match self {
            SubscriptionStage::Requested => Some(WorkflowStep::Requested),
            SubscriptionStage::PlanReady => Some(WorkflowStep::PlanReady),
            SubscriptionStage::VariationReady => Some(WorkflowStep::VariationReady),
            SubscriptionStage::Submitted => Some(WorkflowStep::Submitted),
            SubscriptionStage::Persisted | SubscriptionStage::Failed { .. } => None,
        }
    }

    fn next(&self) -> Option<SubscriptionStage> {
        match self {
            SubscriptionStage::Requested => Some(SubscriptionStage::PlanReady),
            SubscriptionStage::PlanReady => Some(SubscriptionStage::VariationReady),
            SubscriptionStage::VariationReady => Some(SubscriptionStage::Submitted),
            SubscriptionStage::Submitted => Some(SubscriptionStage::Persisted),
            SubscriptionStage::Persisted | SubscriptionStage::Failed { .. } => None,
        }
    }
}

impl StateMachine for SubscriptionStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        if let SubscriptionStage::Failed { at } = target {
            return self.as_step() == Some(*at);
        }
        self.next() == Some(*target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match (self.next(), self.as_step()) {
            (Some(next), Some(at)) => vec![next, SubscriptionStage::Failed { at }],
            _ => vec![],
        }
    }
}

impl fmt::Display for SubscriptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStage::Persisted => write!(f, "PERSISTED"),
            SubscriptionStage::Failed { at } => write!(f, "FAILED at {}", at),
            other => match other.as_step() {
                Some(step) => write!(f, "{}", step),
                None => Ok(()),
            },
        }
    }
}

/// Tracks one run through the workflow.
#[derive(Debug, Clone)]
pub struct SubscriptionWorkflow {
    stage: SubscriptionStage,
}

impl SubscriptionWorkflow {
    pub fn start() -> Self {
        Self {
            stage: SubscriptionStage::Requested,
        }
    }

    pub fn stage(&self) -> SubscriptionStage {
        self.stage
    }

    /// Moves to the next stage.
    pub fn advance(&mut self, target: SubscriptionStage) -> Result<(), ValidationError> {
        self.stage = self.stage.transition_to(target)?;
        Ok(())
    }

    /// Records a failure at the current stage and returns the failed stage.
    ///
    /// Calling this on a terminal stage leaves it unchanged.
    pub fn fail(&mut self) -> SubscriptionStage {
        if let Some(at) = self.stage.as_step() {
            self.stage = SubscriptionStage::Failed { at };
        }
        self.stage
    }
}

//! Four-step registration wizard.
//!
//! `Wizard` is the single owner of the canonical draft. Step handlers get a
//! `&DraftProduct`, do their collaborator calls, and hand back a `DraftPatch`; only
//! the wizard mutates the draft, and only after the calls succeeded.

use serde::{Deserialize, Serialize};

use gpsrhub_core::{DomainError, DomainResult, UserId};

use crate::product::{DraftPatch, DraftProduct};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    General,
    Compliance,
    TechnicalFiles,
    /// Read-only summary.
    Summary,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::General => 1,
            WizardStep::Compliance => 2,
            WizardStep::TechnicalFiles => 3,
            WizardStep::Summary => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(WizardStep::General),
            2 => Some(WizardStep::Compliance),
            3 => Some(WizardStep::TechnicalFiles),
            4 => Some(WizardStep::Summary),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == WizardStep::Summary
    }
}

/// Linear step state machine: no wraparound, no skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSequencer {
    current: WizardStep,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSequencer {
    pub fn new() -> Self {
        Self {
            current: WizardStep::General,
        }
    }

    /// Start at the furthest step an existing draft has completed.
    pub fn resume(draft: &DraftProduct) -> Self {
        Self {
            current: resolve_initial_step(draft),
        }
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    /// Move forward one step; no-op on the summary.
    pub fn advance(&mut self) -> WizardStep {
        if let Some(next) = WizardStep::from_number(self.current.number() + 1) {
            self.current = next;
        }
        self.current
    }

    /// Move back one step; no-op on the first step.
    pub fn retreat(&mut self) -> WizardStep {
        if let Some(previous) = WizardStep::from_number(self.current.number().saturating_sub(1)) {
            self.current = previous;
        }
        self.current
    }
}

/// One-time resume heuristic for a draft loaded from storage.
///
/// Submitted products open on the summary. Otherwise the wizard skips every step
/// whose fields are already populated, checking cumulatively from step 1.
pub fn resolve_initial_step(draft: &DraftProduct) -> WizardStep {
    if draft.review.status.is_submitted() {
        return WizardStep::Summary;
    }
    match (draft.general_complete(), draft.compliance_complete()) {
        (true, true) => WizardStep::TechnicalFiles,
        (true, false) => WizardStep::Compliance,
        (false, _) => WizardStep::General,
    }
}

fn step_of(patch: &DraftPatch) -> Option<WizardStep> {
    match patch {
        DraftPatch::General { .. } => Some(WizardStep::General),
        DraftPatch::Compliance { .. } => Some(WizardStep::Compliance),
        DraftPatch::Submitted { .. } => Some(WizardStep::TechnicalFiles),
        _ => None,
    }
}

/// Canonical draft + step position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    draft: DraftProduct,
    sequencer: StepSequencer,
}

impl Wizard {
    /// New, empty registration.
    pub fn start(owner_id: UserId) -> Self {
        Self {
            draft: DraftProduct::new(owner_id),
            sequencer: StepSequencer::new(),
        }
    }

    /// Continue an existing draft at its furthest completed step.
    pub fn resume(draft: DraftProduct) -> Self {
        let sequencer = StepSequencer::resume(&draft);
        Self { draft, sequencer }
    }

    pub fn draft(&self) -> &DraftProduct {
        &self.draft
    }

    pub fn step(&self) -> WizardStep {
        self.sequencer.current()
    }

    /// Submitting is only offered on the technical files step.
    pub fn ensure_can_submit(&self) -> DomainResult<()> {
        if self.sequencer.current() != WizardStep::TechnicalFiles {
            return Err(DomainError::conflict(format!(
                "products are submitted from step {}, not step {}",
                WizardStep::TechnicalFiles.number(),
                self.sequencer.current().number()
            )));
        }
        Ok(())
    }

    /// Merge a step result. A step-finishing patch for the current step advances.
    pub fn apply(&mut self, patch: DraftPatch) -> DomainResult<WizardStep> {
        if matches!(patch, DraftPatch::Submitted { .. }) {
            self.ensure_can_submit()?;
        }
        let advances = patch.completes_step() && step_of(&patch) == Some(self.sequencer.current());
        self.draft.apply(patch)?;
        if advances {
            self.sequencer.advance();
        }
        Ok(self.sequencer.current())
    }

    pub fn back(&mut self) -> WizardStep {
        self.sequencer.retreat()
    }

    /// Swap in a freshly fetched copy of the same product, keeping the step.
    pub fn reload(&mut self, fresh: DraftProduct) -> DomainResult<()> {
        if fresh.owner_id != self.draft.owner_id {
            return Err(DomainError::invariant("reloaded product belongs to another user"));
        }
        if self.draft.id.is_some() && fresh.id != self.draft.id {
            return Err(DomainError::invariant("reloaded product is a different product"));
        }
        self.draft = fresh;
        Ok(())
    }

    pub fn into_draft(self) -> DraftProduct {
        self.draft
    }
}

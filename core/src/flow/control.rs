// aquabulk/core/src/flow/control.rs

//! Signals for controlling flow execution and the outcome of a run.

/// Returned by a handler to let the flow proceed or halt it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  /// Halt immediately; no further handlers in this or later steps run.
  Stop,
}

/// Outcome of a full flow run that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  Completed,
  Stopped,
}

// aquabulk/core/src/flow/mod.rs

//! A small step-pipeline runner.
//!
//! Every request-level operation of the marketplace runs as a `Flow`: an
//! ordered list of named steps, each with `before`/`on`/`after` handlers that
//! share one `FlowContext<TData>`. A handler either continues or stops the
//! flow; an error aborts it. `FlowRegistry` stores one flow per context type
//! and dispatches on that type.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod registry;
pub mod step;

pub use context_data::FlowContext;
pub use control::{FlowOutcome, StepControl};
pub use definition::{Flow, Handler};
pub use registry::FlowRegistry;
pub use step::{SkipCondition, StepDef};

// aquabulk/core/src/flow/execution.rs

//! `Flow::run()`: executes steps in order against a shared context.

use crate::error::FlowError;
use crate::flow::context_data::FlowContext;
use crate::flow::control::{FlowOutcome, StepControl};
use crate::flow::definition::{Flow, Handler};
use tracing::{event, instrument, Instrument, Level};

enum Phase {
  Finished,
  Stopped,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// A non-optional step without any handler is a configuration error and is
  /// reported as `FlowError::HandlerMissing` converted into `Err`.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(
      flow_context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: FlowContext<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = tracing::info_span!(
        "flow_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_cond) = &step_def.skip_if {
        if skip_cond(ctx_data.clone()) {
          event!(parent: &step_span, Level::INFO, "Step skipped due to 'skip_if' condition.");
          continue;
        }
      }

      let has_handlers = [&self.before, &self.on, &self.after]
        .iter()
        .any(|phase| phase.get(step_name).is_some_and(|v| !v.is_empty()));

      if !has_handlers {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for (phase_name, handlers) in [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ] {
        let Some(handlers) = handlers else { continue };
        match Self::run_phase(phase_name, handlers, &ctx_data)
          .instrument(step_span.clone())
          .await?
        {
          Phase::Finished => {}
          Phase::Stopped => return Ok(FlowOutcome::Stopped),
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step processing finished successfully.");
    }

    event!(Level::DEBUG, "Flow execution completed successfully.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_phase(
    phase_name: &'static str,
    handlers: &[Handler<TData, Err>],
    ctx_data: &FlowContext<TData>,
  ) -> Result<Phase, Err> {
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      match handler_fn(ctx_data.clone()).await {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Stop) => {
          event!(Level::INFO, phase = phase_name, handler_index = handler_idx, "Flow stopped by a handler.");
          return Ok(Phase::Stopped);
        }
        Err(e) => {
          event!(Level::WARN, phase = phase_name, handler_index = handler_idx, error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(Phase::Finished)
  }
}

// aquabulk/server/src/pipelines/common_steps.rs
use crate::errors::AppError;
use crate::pipelines::contexts::PrincipalScoped;
use aquabulk::{FlowContext, StepControl};
use tracing::instrument;

/// Step name every principal-scoped flow starts with.
pub const AUTHORIZE: &str = "authorize";

/// Capability check: the principal must hold the role the context requires.
#[instrument(name = "common_step::authorize", skip(ctx_data), err(Display))]
pub async fn authorize_step<T>(ctx_data: FlowContext<T>) -> Result<StepControl, AppError>
where
  T: PrincipalScoped + Send + Sync + 'static,
{
  let (principal, required) = {
    let guard = ctx_data.read();
    (guard.principal(), guard.required_role())
  };
  principal.require(required)?;
  Ok(StepControl::Continue)
}

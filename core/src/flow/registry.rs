// aquabulk/core/src/flow/registry.rs

//! `FlowRegistry<AppErr>`: one flow per context type, dispatched by `TypeId`.
//! Flows may use their own handler error type as long as it converts into the
//! registry's application error.

use crate::error::FlowError;
use crate::flow::context_data::FlowContext;
use crate::flow::control::FlowOutcome;
use crate::flow::definition::Flow;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait AnyFlowRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// `ctx_obj` must hold a `FlowContext<TData>` for the wrapped flow's `TData`.
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr>;
}

struct FlowWrapper<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flow: Arc<Flow<TData, FlowErr>>,
  _phantom_app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, FlowErr, AppErr> AnyFlowRunner<AppErr> for FlowWrapper<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<FlowErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr> {
    let typed_ctx = match ctx_obj.downcast::<FlowContext<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<FlowContext<TData>>();
        event!(Level::ERROR, "Context object type mismatch. Expected {}.", expected_type);
        return Err(AppErr::from(FlowError::TypeMismatch {
          expected_type: expected_type.to_string(),
        }));
      }
    };
    self.flow.run(typed_ctx).await.map_err(AppErr::from)
  }
}

/// Registry of flows keyed by their context type.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: RwLock<HashMap<TypeId, Arc<dyn AnyFlowRunner<AppErr>>>>,
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `flow` for its context type, replacing any earlier registration.
  pub fn register_flow<TData, FlowErr>(&self, flow: Flow<TData, FlowErr>)
  where
    TData: 'static + Send + Sync,
    FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<FlowErr>,
  {
    event!(
      Level::DEBUG,
      context_type = %std::any::type_name::<TData>(),
      steps = ?flow.step_names(),
      "Registering flow."
    );
    let wrapper = FlowWrapper::<TData, FlowErr, AppErr> {
      flow: Arc::new(flow),
      _phantom_app_err: PhantomData,
    };
    self.flows.write().insert(TypeId::of::<TData>(), Arc::new(wrapper));
  }

  pub fn is_registered<TData: 'static + Send + Sync>(&self) -> bool {
    self.flows.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the flow registered for `TData`.
  pub async fn run<TData>(&self, ctx_data: FlowContext<TData>) -> Result<FlowOutcome, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self
      .flows
      .read()
      .get(&TypeId::of::<TData>())
      .cloned()
      .ok_or_else(|| {
        let type_name = std::any::type_name::<TData>();
        event!(Level::ERROR, "No flow registered for context type {}.", type_name);
        AppErr::from(FlowError::NotRegistered {
          type_name: type_name.to_string(),
        })
      })?;

    runner.run_erased(Box::new(ctx_data)).await
  }
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

// aquabulk/server/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use aquabulk::{FlowRegistry, Market};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub market: Market,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the market and config together and registers every flow.
  pub fn build(market: Market, config: Arc<AppConfig>) -> Self {
    let state = Self {
      market,
      flows: Arc::new(FlowRegistry::new()),
      config,
    };
    pipelines::register_all_pipelines(&state.flows, &state);
    state
  }
}

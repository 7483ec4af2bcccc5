//! Shared handler state.

use crate::service::{InterpretationService, SpreadService};
use std::sync::Arc;

/// State threaded through every handler.
///
/// Generic over the collaborator traits so the full router can run against
/// in-memory fakes in tests.
pub struct AppState<S, L, C, U, I> {
    /// Spread aggregate service.
    pub spreads: Arc<SpreadService<S, L, C, U>>,
    /// Interpretation service.
    pub interpretations: Arc<InterpretationService<S, I, U>>,
}

impl<S, L, C, U, I> Clone for AppState<S, L, C, U, I> {
    fn clone(&self) -> Self {
        Self {
            spreads: Arc::clone(&self.spreads),
            interpretations: Arc::clone(&self.interpretations),
        }
    }
}

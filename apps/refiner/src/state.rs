use std::sync::Arc;

use crate::pipeline::RefinementPipeline;
use crate::refinement::rules::RuleSet;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Immutable rule tables. The pipeline holds the same `Arc`.
    pub rules: Arc<RuleSet>,
    /// Ingest, gate, refine and persist. The refiner backend is fixed at startup.
    pub pipeline: Arc<RefinementPipeline>,
}

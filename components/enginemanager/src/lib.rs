use life_engine_core::{
    api::{DynEngine, GenerationResult},
    cell::CellSet,
    errors::SimulationResult,
};

mod session;

pub use session::{EngineInstance, EngineSessionOwned, SessionLock, SessionOwnedGuard};

/// Async facade over a simulation engine. Each call acquires the session
/// lock and offloads the (potentially long) simulation to the blocking
/// thread pool.
#[derive(Clone)]
pub struct EngineProxy {
    instance: EngineInstance,
}

impl EngineProxy {
    pub fn new(engine: DynEngine) -> Self {
        Self { instance: EngineInstance::new(SessionLock::new(), engine) }
    }

    pub fn instance(&self) -> EngineInstance {
        self.instance.clone()
    }

    pub async fn simulate(
        &self,
        live_cells: CellSet,
        generations: i64,
        is_final: bool,
    ) -> SimulationResult<GenerationResult> {
        let session = self.instance.session_owned().await;
        session.spawn_blocking(move |engine| engine.simulate(live_cells, generations, is_final)).await
    }
}

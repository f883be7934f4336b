// Repository trait for persisted generations
use crate::application::errors::StoreError;
use crate::domain::generation::GenerationId;
use crate::domain::sample::Window;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Load a persisted generation. A generation that was never written
    /// loads as an empty window.
    async fn load(&self, generation: &GenerationId) -> Result<Window, StoreError>;

    /// Persist a calibrated window. Existing generations are never replaced.
    async fn save(&self, generation: &GenerationId, window: &Window) -> Result<(), StoreError>;

    /// The highest-index generation stored under `base_name`, if any.
    async fn latest(&self, base_name: &str) -> Result<Option<GenerationId>, StoreError>;
}

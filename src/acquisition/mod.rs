//! Content acquisition: fills the scripture collection from whichever
//! source is reachable.

mod cascade;
mod context;
mod loader;
pub mod normalize;
mod source;

pub use cascade::{
    AcquisitionError, AcquisitionReport, Cascade, Endpoints, SourceFailure, DEFAULT_API_URL,
    DEFAULT_LOCAL_PATH, DEFAULT_MIRROR_URL,
};
pub use context::{Environment, ExecutionContext};
pub use loader::AssetLoader;
pub use source::{LocalAssetSource, RemoteSource, ScriptureSource, SourceError};

use crate::db::{Store, StoreError};
use crate::models::ScriptureUnit;

/// What scripture screens should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptureState {
    Ready(Vec<ScriptureUnit>),
    /// Every source failed and nothing was stored before.
    Unavailable(String),
}

/// Returns stored chapters, acquiring them first when the store is empty
/// (or always, with `force`). Previously stored chapters win over an
/// unavailable state.
pub async fn ensure_scripture(
    store: &Store,
    cascade: &Cascade,
    force: bool,
) -> Result<ScriptureState, StoreError> {
    let repo = store.scripture();
    if !force && !repo.is_empty().await? {
        return Ok(ScriptureState::Ready(repo.list().await?));
    }

    match cascade.run(store).await {
        Ok(report) => {
            tracing::info!(
                source = %report.source,
                chapters = report.chapters_written,
                "scripture acquired"
            );
            Ok(ScriptureState::Ready(repo.list().await?))
        }
        Err(AcquisitionError::Store(e)) => Err(e),
        Err(exhausted) => {
            let existing = repo.list().await?;
            if existing.is_empty() {
                Ok(ScriptureState::Unavailable(exhausted.to_string()))
            } else {
                Ok(ScriptureState::Ready(existing))
            }
        }
    }
}

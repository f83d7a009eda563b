//! Voice provider resolution and preview playback.

pub mod playback;
pub mod providers;
pub mod resolution;
pub mod types;

use thiserror::Error;

use playback::{PlaybackError, PreviewHandle, PreviewPlayer};
use resolution::{ResolutionService, ResolveError};
use types::Provider;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Resolve a voice and start its preview in one step.
///
/// This is the playback entry point the dashboard should use: it re-resolves
/// the record on every request, which keeps providers with time-limited
/// preview URLs playable instead of replaying an expired link from a cache.
/// Returns `Ok(None)` when the resolved voice has no preview.
pub async fn resolve_and_play(
    service: &ResolutionService,
    player: &PreviewPlayer,
    provider: Provider,
    voice_id: &str,
    supplied_key: Option<&str>,
) -> Result<Option<PreviewHandle>, PreviewError> {
    let record = service
        .resolve_voice(provider, voice_id, supplied_key)
        .await?;
    Ok(player.play_preview(&record).await?)
}

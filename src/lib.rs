/// Reelsmith - Video Production Pipeline Core
///
/// Core library for the Reelsmith dashboard: tracks content items through
/// the externally-driven production pipeline and resolves voice previews
/// from third-party TTS providers.

pub mod config;
pub mod core;
pub mod database;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

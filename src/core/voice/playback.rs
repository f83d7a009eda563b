//! Preview audio playback.
//!
//! rodio's `OutputStream` is `!Send`, so it must live on a single OS thread.
//! `PreviewPlayer` spawns a persistent `std::thread` that owns the audio
//! output and receives commands via `std::sync::mpsc`. Only one preview may
//! audibly play at a time: the thread's `Play` handler stops and releases
//! the previous sink before acquiring a new one, so ownership is a single
//! slot rather than a list.

use std::io::Cursor;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc as sync_mpsc;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink};
use thiserror::Error;
use tokio::sync::mpsc as tokio_mpsc;
use uuid::Uuid;

use super::types::{Provider, VoiceRecord};

// ============================================================================
// Types
// ============================================================================

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("failed to download preview: {0}")]
    Download(String),

    #[error("audio thread is no longer running")]
    ChannelClosed,
}

/// Commands sent from async callers to the audio thread.
enum PlayerCommand {
    Play(Vec<u8>),
    Stop,
    SetVolume(f32),
    Shutdown,
}

/// Events sent from the audio thread back to the UI.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Playing,
    Stopped,
    Finished,
    Error(String),
}

/// Handle to a started preview. Dropping it does not stop playback;
/// starting another preview does.
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    pub request_id: Uuid,
    pub provider: Provider,
    pub voice_id: String,
    cmd_tx: sync_mpsc::Sender<PlayerCommand>,
}

impl PreviewHandle {
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Stop);
    }
}

// ============================================================================
// PreviewPlayer
// ============================================================================

/// Non-blocking preview player backed by a dedicated OS thread.
///
/// Volume is stored as an atomic u8 (0-100) so `set_volume` can be called
/// from `&self`.
pub struct PreviewPlayer {
    cmd_tx: sync_mpsc::Sender<PlayerCommand>,
    http: reqwest::Client,
    volume_pct: Arc<AtomicU8>,
}

impl PreviewPlayer {
    /// Spawn the audio thread. Returns the player and the event stream the
    /// presentation layer may observe.
    pub fn new() -> (Self, tokio_mpsc::UnboundedReceiver<PlayerEvent>) {
        let (event_tx, event_rx) = tokio_mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = sync_mpsc::channel();

        std::thread::Builder::new()
            .name("preview-playback".into())
            .spawn(move || audio_thread(cmd_rx, event_tx))
            .expect("failed to spawn audio thread");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("Failed to build HTTP client for preview downloads");

        let player = Self {
            cmd_tx,
            http,
            volume_pct: Arc::new(AtomicU8::new(75)),
        };
        (player, event_rx)
    }

    /// Start playing a voice preview.
    ///
    /// Returns `Ok(None)` when the record has no preview — an expected
    /// condition, not an error. Any previously playing preview is stopped
    /// by the audio thread before the new one starts. Callers holding
    /// records from providers with time-limited URLs should re-resolve
    /// before calling this (see `resolve_and_play`).
    pub async fn play_preview(
        &self,
        record: &VoiceRecord,
    ) -> Result<Option<PreviewHandle>, PlaybackError> {
        let Some(url) = &record.preview_url else {
            log::debug!(
                "No preview available for {}/{}",
                record.provider,
                record.id
            );
            return Ok(None);
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PlaybackError::Download(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PlaybackError::Download(format!(
                "preview URL returned status {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlaybackError::Download(e.to_string()))?;

        self.cmd_tx
            .send(PlayerCommand::SetVolume(self.volume()))
            .map_err(|_| PlaybackError::ChannelClosed)?;
        self.cmd_tx
            .send(PlayerCommand::Play(bytes.to_vec()))
            .map_err(|_| PlaybackError::ChannelClosed)?;

        Ok(Some(PreviewHandle {
            request_id: Uuid::new_v4(),
            provider: record.provider,
            voice_id: record.id.clone(),
            cmd_tx: self.cmd_tx.clone(),
        }))
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Stop);
    }

    /// Set volume (0.0 - 1.0). Can be called from `&self`.
    pub fn set_volume(&self, vol: f32) {
        let clamped = (vol.clamp(0.0, 1.0) * 100.0) as u8;
        self.volume_pct.store(clamped, Ordering::Relaxed);
        let _ = self
            .cmd_tx
            .send(PlayerCommand::SetVolume(vol.clamp(0.0, 1.0)));
    }

    pub fn volume(&self) -> f32 {
        self.volume_pct.load(Ordering::Relaxed) as f32 / 100.0
    }
}

impl Drop for PreviewPlayer {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Shutdown);
    }
}

// ============================================================================
// Audio thread
// ============================================================================

fn send_event(tx: &tokio_mpsc::UnboundedSender<PlayerEvent>, event: PlayerEvent) {
    let _ = tx.send(event);
}

fn audio_thread(
    cmd_rx: sync_mpsc::Receiver<PlayerCommand>,
    event_tx: tokio_mpsc::UnboundedSender<PlayerEvent>,
) {
    // Initialize audio output once for the thread's lifetime.
    let output = match OutputStream::try_default() {
        Ok((stream, handle)) => Some((stream, handle)),
        Err(e) => {
            log::error!("Failed to open audio output: {e}");
            send_event(&event_tx, PlayerEvent::Error(format!("Audio output: {e}")));
            None
        }
    };

    // The single owner slot: at most one live sink.
    let mut sink: Option<Sink> = None;
    let mut was_playing = false;

    loop {
        // Receive commands with a short timeout so we can poll sink state.
        match cmd_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(PlayerCommand::Play(data)) => {
                // Stop and release any current playback before starting
                if let Some(previous) = sink.take() {
                    previous.stop();
                }

                let Some((ref _stream, ref handle)) = output else {
                    send_event(
                        &event_tx,
                        PlayerEvent::Error("No audio output available".into()),
                    );
                    continue;
                };

                match Sink::try_new(handle) {
                    Ok(new_sink) => {
                        let cursor = Cursor::new(data);
                        match Decoder::new(cursor) {
                            Ok(source) => {
                                new_sink.append(source);
                                was_playing = true;
                                sink = Some(new_sink);
                                send_event(&event_tx, PlayerEvent::Playing);
                            }
                            Err(e) => {
                                send_event(
                                    &event_tx,
                                    PlayerEvent::Error(format!("Decode error: {e}")),
                                );
                            }
                        }
                    }
                    Err(e) => {
                        send_event(&event_tx, PlayerEvent::Error(format!("Sink error: {e}")));
                    }
                }
            }

            Ok(PlayerCommand::Stop) => {
                if let Some(current) = sink.take() {
                    current.stop();
                    was_playing = false;
                    send_event(&event_tx, PlayerEvent::Stopped);
                }
            }

            Ok(PlayerCommand::SetVolume(vol)) => {
                if let Some(ref s) = sink {
                    s.set_volume(vol);
                }
            }

            Ok(PlayerCommand::Shutdown) => {
                if let Some(ref s) = sink {
                    s.stop();
                }
                return;
            }

            Err(sync_mpsc::RecvTimeoutError::Timeout) => {
                // Check if playback finished naturally
            }

            Err(sync_mpsc::RecvTimeoutError::Disconnected) => {
                return;
            }
        }

        // Detect natural playback end
        if was_playing {
            if let Some(ref s) = sink {
                if s.empty() {
                    was_playing = false;
                    send_event(&event_tx, PlayerEvent::Finished);
                    sink = None;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

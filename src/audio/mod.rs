pub mod tone;

use tone::BeepTone;

use anyhow::{anyhow, Result};
use rodio::{OutputStream, Sink};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

pub const BEEP_FREQUENCY_HZ: f32 = 880.0;
pub const BEEP_LENGTH: Duration = Duration::from_millis(150);
pub const BEEP_SPACING: Duration = Duration::from_millis(400);

/// `count` beeps, one starting every `spacing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepPattern {
    pub count: u32,
    pub spacing: Duration,
}

impl BeepPattern {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            spacing: BEEP_SPACING,
        }
    }
}

/// Plays a beep pattern to completion on the calling thread.
pub trait BeepPlayer: Send + Sync {
    fn play(&self, pattern: BeepPattern) -> Result<()>;
}

/// Beeps through the default output device.
///
/// The output stream is not `Send`, so it is opened and dropped on whichever
/// audio thread calls [`BeepPlayer::play`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioBeeper;

impl BeepPlayer for RodioBeeper {
    fn play(&self, pattern: BeepPattern) -> Result<()> {
        if pattern.count == 0 {
            return Ok(());
        }

        let (_stream, handle) = OutputStream::try_default()
            .map_err(|e| anyhow!("Failed to create audio output stream: {}", e))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| anyhow!("Failed to create audio sink: {}", e))?;

        for beep in 0..pattern.count {
            sink.append(BeepTone::new(BEEP_FREQUENCY_HZ, BEEP_LENGTH));
            sink.sleep_until_end();
            if beep + 1 < pattern.count {
                thread::sleep(pattern.spacing.saturating_sub(BEEP_LENGTH));
            }
        }
        Ok(())
    }
}

/// Start the beeps on their own thread and return at once.
///
/// The thread touches no window state. Failures are logged and end the thread.
pub fn spawn_beeps(player: Arc<dyn BeepPlayer>, pattern: BeepPattern) -> Option<JoinHandle<()>> {
    if pattern.count == 0 {
        log_debug!("beep count is zero; audio channel idle");
        return None;
    }

    let spawned = thread::Builder::new()
        .name("alert-beeps".to_string())
        .spawn(move || {
            if let Err(err) = player.play(pattern) {
                log_error!("alert beeps failed: {err:#}");
            }
        });

    match spawned {
        Ok(handle) => Some(handle),
        Err(err) => {
            log_error!("failed to spawn audio thread: {err}");
            None
        }
    }
}

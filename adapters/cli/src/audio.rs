//! Terminal bell stand-in for the game's sound cues.

use std::io::{self, Write};

use tracing::debug;
use train_mania_core::{AudioCue, AudioNotifier};

const BELL: &str = "\x07";

/// Rings the terminal bell for cues that deserve attention.
///
/// Placement clicks stay silent to keep rapid building quiet.
#[derive(Debug, Default)]
pub(crate) struct TerminalBell;

impl AudioNotifier for TerminalBell {
    fn cue(&mut self, cue: AudioCue) {
        debug!(?cue, "audio cue");
        let rings = match cue {
            AudioCue::Click => 0,
            AudioCue::Depart => 1,
            AudioCue::Win => 2,
        };
        if rings == 0 {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(BELL.repeat(rings).as_bytes());
        let _ = stdout.flush();
    }
}

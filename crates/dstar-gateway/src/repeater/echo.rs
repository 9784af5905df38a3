// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Echo/info playback: pre-canned AMBE sequences injected as if they arrived
//! from the net (`spec.md` §4.5). Only one playback is active per band at a
//! time; it races fairly against live radio input.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A single loaded announcement: an ordered sequence of 12-byte AMBE frames.
#[derive(Debug, Clone, Default)]
pub struct Announcement {
    pub frames: Vec<[u8; 12]>,
}

/// Announcements loaded once at startup from the configured language directory.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementSet {
    announcements: HashMap<String, Announcement>,
}

impl AnnouncementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.ambe` file in `dir` as a named announcement (file stem
    /// is the name, e.g. `linked.ambe` -> `"linked"`). Files whose length
    /// isn't a multiple of 12 bytes are rejected.
    pub fn load(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut announcements = HashMap::new();
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Ok(Self { announcements });
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("ambe") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = fs::read(&path)?;
            if bytes.len() % 12 != 0 {
                continue;
            }
            let frames = bytes
                .chunks_exact(12)
                .map(|c| {
                    let mut f = [0u8; 12];
                    f.copy_from_slice(c);
                    f
                })
                .collect();
            announcements.insert(stem.to_string(), Announcement { frames });
        }
        Ok(Self { announcements })
    }

    pub fn get(&self, name: &str) -> Option<&Announcement> {
        self.announcements.get(name)
    }
}

/// Tracks the playback cursor for an announcement racing against live traffic.
#[derive(Debug, Default)]
pub struct EchoPlayer {
    active: Option<(Announcement, usize)>,
}

impl EchoPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts playback, replacing whatever was playing. Only one announcement
    /// plays per band at a time.
    pub fn play(&mut self, announcement: Announcement) {
        self.active = Some((announcement, 0));
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Pulls the next frame, if any remain; clears itself when exhausted.
    pub fn next_frame(&mut self) -> Option<[u8; 12]> {
        let (announcement, idx) = self.active.as_mut()?;
        if *idx >= announcement.frames.len() {
            self.active = None;
            return None;
        }
        let frame = announcement.frames[*idx];
        *idx += 1;
        if *idx >= announcement.frames.len() {
            self.active = None;
        }
        Some(frame)
    }

    /// Live radio input interrupts any in-progress playback.
    pub fn interrupt(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_ambe_files_keyed_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("linked.ambe"), vec![0u8; 24]).unwrap();
        let set = AnnouncementSet::load(dir.path()).unwrap();
        let a = set.get("linked").unwrap();
        assert_eq!(a.frames.len(), 2);
    }

    #[test]
    fn player_plays_through_then_clears() {
        let mut player = EchoPlayer::new();
        player.play(Announcement {
            frames: vec![[1u8; 12], [2u8; 12]],
        });
        assert!(player.is_active());
        assert_eq!(player.next_frame(), Some([1u8; 12]));
        assert_eq!(player.next_frame(), Some([2u8; 12]));
        assert!(!player.is_active());
        assert_eq!(player.next_frame(), None);
    }

    #[test]
    fn live_traffic_interrupts_playback() {
        let mut player = EchoPlayer::new();
        player.play(Announcement {
            frames: vec![[1u8; 12]],
        });
        player.interrupt();
        assert!(!player.is_active());
    }
}

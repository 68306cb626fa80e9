//! Carousel selection state
//!
//! Pure state machine over the current index. Every transition that changes
//! the selection yields an [`IndexChange`] tagged with a fresh epoch, which
//! the controller uses to load the track and to recognise stale delayed work.

use super::gesture::{DragOutcome, GestureState};
use super::playback::PlaybackSnapshot;
use super::thumbnail::Thumbnail;
use crate::error::PlayerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexChange {
    pub index: usize,
    pub track_id: String,
    pub epoch: u64,
}

#[derive(Clone, Debug)]
pub struct PlaylistState {
    track_ids: Vec<String>,
    current_index: usize,
    epoch: u64,
    pub thumbnails: Vec<Thumbnail>,
    pub gesture: GestureState,
}

impl PlaylistState {
    pub fn new(track_ids: Vec<String>) -> Result<Self, PlayerError> {
        if track_ids.is_empty() {
            return Err(PlayerError::Configuration("carousel needs at least one track".into()));
        }

        let thumbnails = track_ids.iter().map(|id| Thumbnail::for_video(id)).collect();
        Ok(Self {
            track_ids,
            current_index: 0,
            epoch: 0,
            thumbnails,
            gesture: GestureState::default(),
        })
    }

    pub fn track_ids(&self) -> &[String] {
        &self.track_ids
    }

    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_id(&self) -> &str {
        &self.track_ids[self.current_index]
    }

    #[cfg(test)]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn move_to(&mut self, index: usize) -> IndexChange {
        self.current_index = index;
        self.epoch += 1;
        IndexChange {
            index,
            track_id: self.track_ids[index].clone(),
            epoch: self.epoch,
        }
    }

    /// Track ended: move on, wrapping to the first track.
    ///
    /// Always yields a change, so a single-track carousel reloads its track.
    pub fn advance(&mut self) -> IndexChange {
        let next = (self.current_index + 1) % self.track_ids.len();
        self.move_to(next)
    }

    /// Direct selection, e.g. from an indicator
    pub fn select(&mut self, index: usize) -> Option<IndexChange> {
        if index >= self.track_ids.len() {
            tracing::warn!(index, len = self.track_ids.len(), "Ignoring out-of-range selection");
            return None;
        }
        if index == self.current_index {
            return None;
        }
        Some(self.move_to(index))
    }

    pub fn next(&mut self) -> Option<IndexChange> {
        (self.current_index + 1 < self.track_ids.len()).then(|| self.move_to(self.current_index + 1))
    }

    pub fn previous(&mut self) -> Option<IndexChange> {
        (self.current_index > 0).then(|| self.move_to(self.current_index - 1))
    }

    pub fn begin_drag(&mut self, x: f64) {
        self.gesture.begin(x);
    }

    pub fn drag_to(&mut self, x: f64) {
        self.gesture.move_to(x);
    }

    /// Release the drag. Dragging never wraps around the ends.
    pub fn end_drag(&mut self) -> Option<IndexChange> {
        match self.gesture.finish() {
            DragOutcome::Previous => self.previous(),
            DragOutcome::Next => self.next(),
            DragOutcome::Stay => None,
        }
    }

    /// True while `epoch` is still the latest transition and selects `track_id`
    pub fn is_current(&self, epoch: u64, track_id: &str) -> bool {
        self.epoch == epoch && self.current_id() == track_id
    }

    /// Supersede all outstanding delayed work, e.g. on unmount
    pub fn invalidate(&mut self) {
        self.epoch += 1;
    }
}

/// Render-ready view of the carousel
#[derive(Clone, Debug)]
pub struct CarouselSnapshot {
    pub track_ids: Vec<String>,
    pub current_index: usize,
    pub thumbnails: Vec<Thumbnail>,
    pub gesture: GestureState,
    pub playback: PlaybackSnapshot,
}

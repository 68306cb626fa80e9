//! Everything the host page renders in one frame

use super::playlist::CarouselSnapshot;
use super::streaming::StreamingPlayerState;
use crate::error::Diagnostic;

#[derive(Clone, Debug)]
pub struct PageSnapshot {
    pub carousel: CarouselSnapshot,
    /// None when no streaming token is configured
    pub streaming: Option<StreamingPlayerState>,
    pub diagnostic: Option<Diagnostic>,
}

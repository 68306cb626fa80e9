//! Model module - player state and snapshots
//!
//! Pure state that the controllers mutate and the view renders:
//!
//! - `playback`: video playback snapshot (time, duration, volume, mute)
//! - `gesture`: drag/swipe tracking
//! - `thumbnail`: thumbnail URL with hq fallback
//! - `playlist`: carousel selection state machine with epochs
//! - `streaming`: streaming player state driven by SDK events
//! - `page`: per-frame snapshot for the view

mod playback;
mod gesture;
mod thumbnail;
mod playlist;
mod streaming;
mod page;

pub use playback::{PlaybackSnapshot, DEFAULT_VOLUME_PERCENT};

pub use gesture::GestureState;

pub use thumbnail::Thumbnail;

pub use playlist::{CarouselSnapshot, IndexChange, PlaylistState};

pub use streaming::StreamingPlayerState;

pub use page::PageSnapshot;

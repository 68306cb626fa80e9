//! SDK module - boundary to the external player SDKs
//!
//! - `loader`: process-wide single-shot script loading
//! - `video`: video widget capability traits and types
//! - `headless`: clock-driven video player used by the terminal host
//! - `streaming`: streaming-audio SDK traits and event payloads
//! - `connect`: librespot-backed streaming SDK
//! - `web_api`: REST calls for contextual playback

mod loader;
mod video;
mod headless;
mod streaming;
mod connect;
mod web_api;

pub use loader::ScriptRegistry;

pub use video::{
    PlayerVars, VideoData, VideoEvent, VideoHandle, VideoPlayer, VideoPlayerFactory,
    VideoPlayerOptions, VideoState,
};

pub use headless::HeadlessVideoSdk;

pub use streaming::{
    SdkEvent, SdkPlaybackState, SdkTrack, StreamingConnection, StreamingOptions, StreamingSdk,
    StreamingTransport, TokenProvider,
};

#[cfg(test)]
pub use streaming::{SdkAlbum, SdkArtist, SdkImage, TrackWindow};

pub use connect::LibrespotSdk;

pub use web_api::{ContextPlayer, WebApiClient};

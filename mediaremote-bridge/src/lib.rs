//! Bindings to the private macOS MediaRemote framework and a local media source
//! built on top of them.
//!
//! The framework is loaded at runtime, so everything that does not talk to it
//! (commands, keys, dictionary parsing, the media source state machine) builds
//! and is tested on every platform.

mod apple_script;
mod command;
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
mod completion;
mod config;
mod error;
mod keys;
mod local_source;
mod media_events;
mod media_listener;
mod now_playing;

#[cfg(test)]
mod testing;

pub use apple_script::{
    DEFAULT_SCRIPT_TIMEOUT, OsaScript, SPOTIFY_BUNDLE_ID, ScriptRunner, SystemVolume,
    spotify_now_playing,
};
pub use command::Command;
pub use config::{Config, DEFAULT_FRAMEWORK_PATH};
pub use error::{Error, Result};
pub use keys::{MediaRemoteSymbol, NowPlayingApplicationKey, NowPlayingInfoKey, NowPlayingNotification};
pub use local_source::{LocalMediaSource, NowPlayingProvider, SourceHandle, source_channel};
pub use media_events::{
    Capability, LOCAL_MEDIA_WITH_VOLUME, MediaInfo, MediaSnapshot, MediaSourceIdentifier,
    PlaybackState, SourceEvent,
};
pub use now_playing::{InfoDictionary, InfoValue, NowPlayingApplication, NowPlayingInfo};

#[cfg(target_os = "macos")]
pub use media_listener::{MediaRemote, fetch_app_name, listener};

//! Symbol names of the string constants exported by MediaRemote.
//!
//! The framework exports each key as an `NSString *` whose value is its own
//! symbol name, so the names below double as the dictionary keys. On macOS
//! `MediaRemote::resolve_constant` reads the exported value instead.

use strum::{AsRefStr, EnumIter, EnumString};

/// Keys of the dictionary returned by `MRMediaRemoteGetNowPlayingInfo`.
#[derive(AsRefStr, EnumString, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NowPlayingInfoKey {
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoTitle")]
    Title,
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoArtist")]
    Artist,
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoAlbum")]
    Album,
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoArtworkData")]
    ArtworkData,
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoDuration")]
    Duration,
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoElapsedTime")]
    ElapsedTime,
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoPlaybackRate")]
    PlaybackRate,
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoTimestamp")]
    Timestamp,
}

/// Keys of the user info attached to the now playing application notifications.
#[allow(clippy::enum_variant_names)]
#[derive(AsRefStr, EnumString, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NowPlayingApplicationKey {
    #[strum(serialize = "kMRMediaRemoteNowPlayingApplicationDisplayNameUserInfoKey")]
    DisplayName,
    #[strum(serialize = "kMRMediaRemoteNowPlayingApplicationBundleIdentifierUserInfoKey")]
    BundleIdentifier,
    #[strum(serialize = "kMRMediaRemoteNowPlayingApplicationIsPlayingUserInfoKey")]
    IsPlaying,
}

/// Notifications posted to the default notification center once registered.
#[derive(AsRefStr, EnumString, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NowPlayingNotification {
    #[strum(serialize = "kMRMediaRemoteNowPlayingInfoDidChangeNotification")]
    InfoDidChange,
    #[strum(serialize = "kMRMediaRemoteNowPlayingApplicationDidChangeNotification")]
    ApplicationDidChange,
    #[strum(serialize = "kMRMediaRemoteNowPlayingApplicationIsPlayingDidChangeNotification")]
    ApplicationIsPlayingDidChange,
}

/// Anything that names an exported MediaRemote string constant.
pub trait MediaRemoteSymbol: AsRef<str> {
    fn symbol_name(&self) -> &str {
        self.as_ref()
    }
}

impl MediaRemoteSymbol for NowPlayingInfoKey {}
impl MediaRemoteSymbol for NowPlayingApplicationKey {}
impl MediaRemoteSymbol for NowPlayingNotification {}

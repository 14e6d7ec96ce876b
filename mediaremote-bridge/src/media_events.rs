use strum::EnumString;

use crate::keys::NowPlayingNotification;

/// Which kind of player owns the local now playing session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaSourceIdentifier {
    Spotify,
    AppleMusic,
    AmazonMusic,
    PlexAmp,
    YouTube,
    Browser(String),
    Unknown(String),
}

impl Default for MediaSourceIdentifier {
    fn default() -> Self {
        MediaSourceIdentifier::Unknown("unknown".to_string())
    }
}

impl MediaSourceIdentifier {
    /// Maps a bundle id to a source. Browsers playing something with "youtube" in
    /// the title are reported as YouTube.
    pub fn from_bundle_id(bundle_id: Option<&str>, title: Option<&str>) -> Self {
        let Some(bundle_id) = bundle_id else {
            return MediaSourceIdentifier::default();
        };

        let is_youtube = title.is_some_and(|x| x.to_lowercase().contains("youtube"));
        let browser = |name: &str| {
            if is_youtube {
                MediaSourceIdentifier::YouTube
            } else {
                MediaSourceIdentifier::Browser(name.to_string())
            }
        };

        match bundle_id {
            "com.spotify.client" => MediaSourceIdentifier::Spotify,
            "com.apple.Music" => MediaSourceIdentifier::AppleMusic,
            "com.amazon.music" => MediaSourceIdentifier::AmazonMusic,
            "tv.plex.plexamp" => MediaSourceIdentifier::PlexAmp,
            id if id.contains("safari") || id.contains("Safari") => browser("Safari"),
            id if id.contains("chrome") || id.contains("Chrome") => browser("Chrome"),
            id if id.contains("firefox") || id.contains("Firefox") => browser("Firefox"),
            id => MediaSourceIdentifier::Unknown(id.to_string()),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            MediaSourceIdentifier::Spotify => "Spotify".to_string(),
            MediaSourceIdentifier::AppleMusic => "Apple Music".to_string(),
            MediaSourceIdentifier::AmazonMusic => "Amazon Music".to_string(),
            MediaSourceIdentifier::PlexAmp => "Plex Amp".to_string(),
            MediaSourceIdentifier::YouTube => "YouTube".to_string(),
            MediaSourceIdentifier::Browser(name) => name.clone(),
            MediaSourceIdentifier::Unknown(bundle_id) => bundle_id
                .rsplit('.')
                .next()
                .unwrap_or(bundle_id.as_str())
                .to_string(),
        }
    }
}

#[derive(strum::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    PlayPause,
    NextTrack,
    PreviousTrack,
    Seek,
    Volume,
    Presets,
    Eq,
}

/// Transport controls without seek, plus the system output volume.
pub const LOCAL_MEDIA_WITH_VOLUME: &[Capability] = &[
    Capability::PlayPause,
    Capability::NextTrack,
    Capability::PreviousTrack,
    Capability::Volume,
];

#[derive(EnumString, strum::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    None,
    Paused,
    Playing,
}

/// What the local source currently reports. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork_data: Option<Vec<u8>>,
    pub is_playing: bool,
    pub position: i64,
    pub duration: i64,
}

impl MediaInfo {
    pub fn has_content(&self) -> bool {
        !self.title.is_empty() || !self.artist.is_empty()
    }

    pub fn state(&self) -> PlaybackState {
        match (self.has_content(), self.is_playing) {
            (false, _) => PlaybackState::None,
            (true, true) => PlaybackState::Playing,
            (true, false) => PlaybackState::Paused,
        }
    }
}

/// Published to the consumer whenever the local source changed.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSnapshot {
    pub identifier: MediaSourceIdentifier,
    pub media_info: MediaInfo,
    pub is_available: bool,
}

/// Input of the local source loop.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    Notification(NowPlayingNotification),
    RefreshNowPlaying,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    Seek(i64),
    SetVolume(i32),
    ToggleMute,
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_bundle_ids() {
        assert_eq!(
            MediaSourceIdentifier::Spotify,
            MediaSourceIdentifier::from_bundle_id(Some("com.spotify.client"), None)
        );
        assert_eq!(
            MediaSourceIdentifier::AppleMusic,
            MediaSourceIdentifier::from_bundle_id(Some("com.apple.Music"), Some("youtube"))
        );
        assert_eq!(
            MediaSourceIdentifier::PlexAmp,
            MediaSourceIdentifier::from_bundle_id(Some("tv.plex.plexamp"), None)
        );
    }

    #[test]
    fn test_browser_bundle_ids() {
        assert_eq!(
            MediaSourceIdentifier::Browser("Safari".to_string()),
            MediaSourceIdentifier::from_bundle_id(Some("com.apple.Safari"), Some("Podcast"))
        );
        assert_eq!(
            MediaSourceIdentifier::YouTube,
            MediaSourceIdentifier::from_bundle_id(
                Some("com.google.Chrome"),
                Some("Lofi beats - YouTube")
            )
        );
        assert_eq!(
            MediaSourceIdentifier::Browser("Firefox".to_string()),
            MediaSourceIdentifier::from_bundle_id(Some("org.mozilla.firefox"), None)
        );
    }

    #[test]
    fn test_unknown_bundle_ids() {
        let identifier = MediaSourceIdentifier::from_bundle_id(Some("com.colliderli.iina"), None);

        assert_eq!(
            MediaSourceIdentifier::Unknown("com.colliderli.iina".to_string()),
            identifier
        );
        assert_eq!("iina", identifier.display_name());
        assert_eq!(
            MediaSourceIdentifier::Unknown("unknown".to_string()),
            MediaSourceIdentifier::from_bundle_id(None, Some("youtube"))
        );
    }

    #[test]
    fn test_display_names() {
        assert_eq!("Apple Music", MediaSourceIdentifier::AppleMusic.display_name());
        assert_eq!(
            "Chrome",
            MediaSourceIdentifier::Browser("Chrome".to_string()).display_name()
        );
    }

    #[test]
    fn test_media_info_state() {
        let mut info = MediaInfo::default();
        assert_eq!(PlaybackState::None, info.state());

        info.artist = "Boards of Canada".to_string();
        assert_eq!(PlaybackState::Paused, info.state());

        info.is_playing = true;
        assert_eq!(PlaybackState::Playing, info.state());
    }

    #[test]
    fn test_local_capabilities_exclude_seek() {
        assert!(LOCAL_MEDIA_WITH_VOLUME.contains(&Capability::Volume));
        assert!(!LOCAL_MEDIA_WITH_VOLUME.contains(&Capability::Seek));
        assert!(!LOCAL_MEDIA_WITH_VOLUME.contains(&Capability::Presets));
        assert!(!LOCAL_MEDIA_WITH_VOLUME.contains(&Capability::Eq));
    }

    #[test]
    fn test_capability_names() {
        assert_eq!("Presets", Capability::Presets.to_string());
        assert_eq!("Eq", Capability::Eq.to_string());
    }
}

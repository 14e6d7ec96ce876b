use std::collections::HashMap;
use std::time::SystemTime;

use crate::keys::{NowPlayingApplicationKey, NowPlayingInfoKey};

/// A value stored in a now playing dictionary.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    String(String),
    Number(f64),
    Bool(bool),
    Data(Vec<u8>),
    Date(SystemTime),
}

/// Typed lookups over a MediaRemote dictionary.
///
/// Implemented for `NSDictionary` on macOS and for plain maps everywhere, so the
/// parsing below behaves the same regardless of where the dictionary came from.
/// A value of the wrong type reads as absent.
pub trait InfoDictionary {
    fn get_string_for_key(&self, key: &str) -> Option<String>;
    fn get_f64_for_key(&self, key: &str) -> Option<f64>;
    fn get_bool_for_key(&self, key: &str) -> Option<bool>;
    fn get_data_for_key(&self, key: &str) -> Option<Vec<u8>>;
    fn get_date_for_key(&self, key: &str) -> Option<SystemTime>;
}

impl InfoDictionary for HashMap<String, InfoValue> {
    fn get_string_for_key(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(InfoValue::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn get_f64_for_key(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(InfoValue::Number(value)) => Some(*value),
            Some(InfoValue::Bool(value)) => Some(if *value { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    fn get_bool_for_key(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(InfoValue::Bool(value)) => Some(*value),
            Some(InfoValue::Number(value)) => Some(*value != 0.0),
            _ => None,
        }
    }

    fn get_data_for_key(&self, key: &str) -> Option<Vec<u8>> {
        match self.get(key) {
            Some(InfoValue::Data(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn get_date_for_key(&self, key: &str) -> Option<SystemTime> {
        match self.get(key) {
            Some(InfoValue::Date(value)) => Some(*value),
            _ => None,
        }
    }
}

/// Snapshot of the system now playing info.
///
/// Durations and times are in seconds, as the framework reports them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlayingInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork_data: Option<Vec<u8>>,
    pub duration: Option<f64>,
    pub elapsed_time: Option<f64>,
    pub playback_rate: Option<f64>,
    /// When `elapsed_time` was sampled.
    pub timestamp: Option<SystemTime>,
}

impl NowPlayingInfo {
    pub fn from_dictionary(dictionary: &impl InfoDictionary) -> Self {
        NowPlayingInfo {
            title: dictionary.get_string_for_key(NowPlayingInfoKey::Title.as_ref()),
            artist: dictionary.get_string_for_key(NowPlayingInfoKey::Artist.as_ref()),
            album: dictionary.get_string_for_key(NowPlayingInfoKey::Album.as_ref()),
            artwork_data: dictionary.get_data_for_key(NowPlayingInfoKey::ArtworkData.as_ref()),
            duration: dictionary.get_f64_for_key(NowPlayingInfoKey::Duration.as_ref()),
            elapsed_time: dictionary.get_f64_for_key(NowPlayingInfoKey::ElapsedTime.as_ref()),
            playback_rate: dictionary.get_f64_for_key(NowPlayingInfoKey::PlaybackRate.as_ref()),
            timestamp: dictionary.get_date_for_key(NowPlayingInfoKey::Timestamp.as_ref()),
        }
    }

    /// No key was present, i.e. nothing is playing.
    pub fn is_empty(&self) -> bool {
        *self == NowPlayingInfo::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playback_rate.unwrap_or_default() > 0f64
    }

    pub fn has_content(&self) -> bool {
        let non_empty = |value: &Option<String>| value.as_deref().is_some_and(|x| !x.is_empty());
        non_empty(&self.title) || non_empty(&self.artist)
    }

    /// Elapsed time extrapolated from `timestamp` to `now` at the current rate,
    /// clamped to the track duration when one is known.
    pub fn position_at(&self, now: SystemTime) -> Option<f64> {
        let elapsed = self.elapsed_time?;
        let rate = self.playback_rate.unwrap_or_default();

        let drift = match self.timestamp {
            Some(timestamp) if rate != 0f64 => {
                now.duration_since(timestamp)
                    .map(|x| x.as_secs_f64())
                    .unwrap_or_default()
                    * rate
            }
            _ => 0f64,
        };

        let mut position = (elapsed + drift).max(0f64);
        if let Some(duration) = self.duration.filter(|x| *x > 0f64) {
            position = position.min(duration);
        }

        Some(position)
    }
}

/// The application that currently owns the now playing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NowPlayingApplication {
    pub display_name: String,
    pub bundle_identifier: Option<String>,
    pub is_playing: bool,
}

impl NowPlayingApplication {
    /// Reads the descriptor from a notification's user info.
    pub fn from_user_info(user_info: &impl InfoDictionary) -> Self {
        NowPlayingApplication {
            display_name: user_info
                .get_string_for_key(NowPlayingApplicationKey::DisplayName.as_ref())
                .unwrap_or_default(),
            bundle_identifier: user_info
                .get_string_for_key(NowPlayingApplicationKey::BundleIdentifier.as_ref()),
            is_playing: user_info
                .get_bool_for_key(NowPlayingApplicationKey::IsPlaying.as_ref())
                .unwrap_or_default(),
        }
    }
}

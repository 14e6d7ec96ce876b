use strum::{EnumIter, EnumString, FromRepr, IntoStaticStr};

use crate::error::Error;

/// Transport commands understood by `MRMediaRemoteSendCommand`.
///
/// The discriminants are the framework's `MRCommand` values and must not change.
#[allow(clippy::enum_variant_names)]
#[repr(isize)]
#[derive(EnumString, EnumIter, FromRepr, IntoStaticStr, strum::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Play = 0,
    Pause = 1,
    TogglePlayPause = 2,
    Stop = 3,
    NextTrack = 4,
    PreviousTrack = 5,
    AdvanceShuffleMode = 6,
    AdvanceRepeatMode = 7,
    BeginFastForward = 8,
    EndFastForward = 9,
    BeginRewind = 10,
    EndRewind = 11,
    LikeTrack = 12,
    DislikeTrack = 13,
    BookmarkTrack = 14,
    SeekToPlaybackPosition = 45,
}

impl Command {
    /// The raw `MRCommand` value passed to the framework.
    pub fn raw(self) -> isize {
        self as isize
    }
}

impl TryFrom<isize> for Command {
    type Error = Error;

    fn try_from(value: isize) -> Result<Self, Self::Error> {
        Command::from_repr(value).ok_or(Error::UnknownCommand(value))
    }
}

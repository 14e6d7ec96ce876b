use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::process::Command;
use tokio::time;

use crate::error::{Error, Result};
use crate::now_playing::NowPlayingInfo;

const OSASCRIPT_PATH: &str = "/usr/bin/osascript";
const SPOTIFY_FIELD_SEPARATOR: &str = "|||";

pub const SPOTIFY_BUNDLE_ID: &str = "com.spotify.client";
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(5);

const SPOTIFY_NOW_PLAYING_SCRIPT: &str = r#"
tell application "System Events"
    if not (exists process "Spotify") then return ""
end tell
tell application "Spotify"
    if player state is playing then
        set stateName to "playing"
    else if player state is paused then
        set stateName to "paused"
    else
        return ""
    end if
    set trackName to name of current track
    set trackArtist to artist of current track
    set trackAlbum to album of current track
    set trackDuration to duration of current track
    set trackPosition to player position
    return trackName & "|||" & trackArtist & "|||" & trackAlbum & "|||" & (trackDuration / 1000) & "|||" & trackPosition & "|||" & stateName
end tell
"#;

/// Runs an AppleScript source and returns its trimmed standard output.
pub trait ScriptRunner {
    fn run(&self, script: &str) -> impl Future<Output = Result<String>>;
}

/// Runs scripts through `osascript`. A script that does not finish within the
/// timeout, e.g. while an Automation consent prompt is open, is killed.
#[derive(Debug, Clone)]
pub struct OsaScript {
    timeout: Duration,
}

impl Default for OsaScript {
    fn default() -> Self {
        OsaScript::with_timeout(DEFAULT_SCRIPT_TIMEOUT)
    }
}

impl OsaScript {
    pub fn with_timeout(timeout: Duration) -> Self {
        OsaScript { timeout }
    }
}

impl ScriptRunner for OsaScript {
    async fn run(&self, script: &str) -> Result<String> {
        let mut command = Command::new(OSASCRIPT_PATH);
        command.arg("-e").arg(script);
        run_with_timeout(command, self.timeout).await
    }
}

async fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<String> {
    let output = command
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = time::timeout(timeout, output)
        .await
        .map_err(|_| Error::Script(format!("script did not finish within {timeout:?}")))?
        .map_err(|e| Error::Script(e.to_string()))?;

    if !output.status.success() {
        return Err(Error::Script(format!("script exited with {}", output.status)));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// System output volume, controlled through the standard additions.
pub struct SystemVolume<S: ScriptRunner> {
    runner: S,
}

impl<S: ScriptRunner> SystemVolume<S> {
    pub const DEFAULT_VOLUME: i32 = 50;

    pub fn new(runner: S) -> Self {
        SystemVolume { runner }
    }

    pub fn runner(&self) -> &S {
        &self.runner
    }

    pub async fn volume(&self) -> i32 {
        match self.runner.run("output volume of (get volume settings)").await {
            Ok(output) => output.trim().parse().unwrap_or(Self::DEFAULT_VOLUME),
            Err(e) => {
                warn!("Failed to read the system volume, {e}");
                Self::DEFAULT_VOLUME
            }
        }
    }

    /// Sets the output volume, clamped to 0..=100. Returns the applied level.
    pub async fn set_volume(&self, level: i32) -> i32 {
        let level = level.clamp(0, 100);
        if let Err(e) = self.runner.run(&format!("set volume output volume {level}")).await {
            warn!("Failed to set the system volume to {level}, {e}");
        }
        level
    }

    pub async fn is_muted(&self) -> bool {
        match self.runner.run("output muted of (get volume settings)").await {
            Ok(output) => output.trim() == "true",
            Err(e) => {
                warn!("Failed to read the system mute state, {e}");
                false
            }
        }
    }

    pub async fn set_muted(&self, muted: bool) {
        if let Err(e) = self.runner.run(&format!("set volume output muted {muted}")).await {
            warn!("Failed to set the system mute state, {e}");
        }
    }
}

/// Queries Spotify directly. Used when MediaRemote reports nothing, which
/// happens for Spotify on some macOS releases.
pub async fn spotify_now_playing(runner: &impl ScriptRunner) -> Option<NowPlayingInfo> {
    let output = match runner.run(SPOTIFY_NOW_PLAYING_SCRIPT).await {
        Ok(output) => output,
        Err(e) => {
            debug!("Spotify fallback failed, {e}");
            return None;
        }
    };

    parse_spotify_output(&output)
}

fn parse_spotify_output(output: &str) -> Option<NowPlayingInfo> {
    let output = output.trim();
    if output.is_empty() {
        return None;
    }

    let parts: Vec<&str> = output.split(SPOTIFY_FIELD_SEPARATOR).collect();
    if parts.len() < 6 {
        warn!("Unexpected Spotify script output {output:?}");
        return None;
    }

    // AppleScript formats reals with the user's locale decimal separator
    let seconds = |value: &str| value.trim().replace(',', ".").parse::<f64>().unwrap_or_default();
    let is_playing = parts[5].trim() == "playing";

    Some(NowPlayingInfo {
        title: Some(parts[0].to_string()),
        artist: Some(parts[1].to_string()),
        album: Some(parts[2].to_string()),
        duration: Some(seconds(parts[3])),
        elapsed_time: Some(seconds(parts[4])),
        playback_rate: Some(if is_playing { 1f64 } else { 0f64 }),
        ..Default::default()
    })
}

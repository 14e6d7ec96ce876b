use std::future::Future;
use std::time::{Duration, SystemTime};

use log::{debug, info, trace, warn};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::apple_script::{SPOTIFY_BUNDLE_ID, ScriptRunner, SystemVolume, spotify_now_playing};
use crate::command::Command;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::media_events::{
    Capability, LOCAL_MEDIA_WITH_VOLUME, MediaInfo, MediaSnapshot, MediaSourceIdentifier,
    SourceEvent,
};
use crate::now_playing::NowPlayingInfo;

const SOURCE_EVENT_CAPACITY: usize = 16;
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Where the local source reads the system now playing state from.
pub trait NowPlayingProvider {
    /// Current info, empty when nothing is playing.
    fn now_playing_info(&self) -> impl Future<Output = NowPlayingInfo>;

    /// Bundle id of the app owning the now playing session.
    fn now_playing_bundle_id(&self) -> impl Future<Output = Option<String>>;

    fn send_command(&self, command: Command) -> bool;
}

impl<P: NowPlayingProvider> NowPlayingProvider for &P {
    fn now_playing_info(&self) -> impl Future<Output = NowPlayingInfo> {
        (**self).now_playing_info()
    }

    fn now_playing_bundle_id(&self) -> impl Future<Output = Option<String>> {
        (**self).now_playing_bundle_id()
    }

    fn send_command(&self, command: Command) -> bool {
        (**self).send_command(command)
    }
}

/// Sends events into a running [`LocalMediaSource::run`] loop.
#[derive(Debug, Clone)]
pub struct SourceHandle {
    tx: mpsc::Sender<SourceEvent>,
}

impl SourceHandle {
    pub async fn send(&self, event: SourceEvent) -> Result<()> {
        self.tx.send(event).await.map_err(|_| Error::SourceClosed)
    }

    /// Never blocks, for use from framework callbacks. A full channel drops the
    /// event since the poll interval catches up anyway.
    pub fn try_send(&self, event: SourceEvent) -> Result<()> {
        match self.tx.try_send(event) {
            Ok(_) => Ok(()),
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!("Source event channel is full, dropped {event:?}");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::SourceClosed),
        }
    }
}

pub fn source_channel() -> (SourceHandle, mpsc::Receiver<SourceEvent>) {
    let (tx, rx) = mpsc::channel(SOURCE_EVENT_CAPACITY);
    (SourceHandle { tx }, rx)
}

/// The locally playing media, as seen through MediaRemote.
pub struct LocalMediaSource<P: NowPlayingProvider, S: ScriptRunner> {
    provider: P,
    volume: SystemVolume<S>,
    config: Config,
    identifier: MediaSourceIdentifier,
    media_info: MediaInfo,
    is_available: bool,
    system_volume: i32,
    is_muted: bool,
}

impl<P: NowPlayingProvider, S: ScriptRunner> LocalMediaSource<P, S> {
    pub fn new(provider: P, scripts: S, mut config: Config) -> Self {
        if config.poll_interval < MIN_POLL_INTERVAL {
            warn!(
                "Poll interval {:?} is too short, using {MIN_POLL_INTERVAL:?}",
                config.poll_interval
            );
            config.poll_interval = MIN_POLL_INTERVAL;
        }

        LocalMediaSource {
            provider,
            volume: SystemVolume::new(scripts),
            config,
            identifier: MediaSourceIdentifier::default(),
            media_info: MediaInfo::default(),
            is_available: false,
            system_volume: SystemVolume::<S>::DEFAULT_VOLUME,
            is_muted: false,
        }
    }

    pub fn identifier(&self) -> &MediaSourceIdentifier {
        &self.identifier
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.media_info
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        LOCAL_MEDIA_WITH_VOLUME
    }

    pub fn system_volume(&self) -> i32 {
        self.system_volume
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    pub fn snapshot(&self) -> MediaSnapshot {
        MediaSnapshot {
            identifier: self.identifier.clone(),
            media_info: self.media_info.clone(),
            is_available: self.is_available,
        }
    }

    /// Re-reads the now playing state. Returns whether the title, artist, playing
    /// state or owning app changed.
    pub async fn refresh(&mut self) -> bool {
        let mut info = self.provider.now_playing_info().await;
        let mut from_spotify_fallback = false;

        if info.is_empty()
            && self.config.spotify_fallback
            && let Some(spotify_info) = spotify_now_playing(self.volume.runner()).await
        {
            info = spotify_info;
            from_spotify_fallback = true;
        }

        let bundle_id = if from_spotify_fallback {
            Some(SPOTIFY_BUNDLE_ID.to_string())
        } else {
            self.provider.now_playing_bundle_id().await
        };

        let is_allowed = self.config.is_app_allowed(bundle_id.as_deref());
        if !is_allowed {
            trace!("Ignoring now playing info of {bundle_id:?}");
            info = NowPlayingInfo::default();
        }

        let title = info.title.clone().unwrap_or_default();
        let identifier = if !is_allowed {
            MediaSourceIdentifier::default()
        } else if from_spotify_fallback {
            MediaSourceIdentifier::Spotify
        } else {
            MediaSourceIdentifier::from_bundle_id(bundle_id.as_deref(), Some(&title))
        };

        let media_info = MediaInfo {
            artist: info.artist.clone().unwrap_or_default(),
            album: info.album.clone().unwrap_or_default(),
            artwork_data: info.artwork_data.clone(),
            is_playing: info.is_playing(),
            position: to_millis(info.position_at(SystemTime::now())),
            duration: to_millis(info.duration),
            title,
        };

        let changed = self.media_info.title != media_info.title
            || self.media_info.artist != media_info.artist
            || self.media_info.is_playing != media_info.is_playing
            || self.identifier != identifier;

        if changed {
            debug!(
                "Now playing changed to {:?} by {:?} on {}",
                media_info.title,
                media_info.artist,
                identifier.display_name()
            );
        }

        self.is_available = media_info.has_content();
        self.media_info = media_info;
        self.identifier = identifier;

        changed
    }

    pub async fn toggle_play_pause(&mut self) -> bool {
        self.send_command(Command::TogglePlayPause);
        time::sleep(self.config.toggle_refresh_delay).await;
        self.refresh().await
    }

    pub async fn next_track(&mut self) -> bool {
        self.send_command(Command::NextTrack);
        time::sleep(self.config.skip_refresh_delay).await;
        self.refresh().await
    }

    pub async fn previous_track(&mut self) -> bool {
        self.send_command(Command::PreviousTrack);
        time::sleep(self.config.skip_refresh_delay).await;
        self.refresh().await
    }

    /// Not supported, most players ignore the MediaRemote seek command.
    pub fn seek(&mut self, seconds: i64) {
        debug!("Ignoring seek to {seconds}s, local media cannot seek");
    }

    pub async fn set_volume(&mut self, level: i32) {
        self.system_volume = self.volume.set_volume(level).await;
    }

    pub async fn toggle_mute(&mut self) {
        let muted = !self.is_muted;
        self.volume.set_muted(muted).await;
        self.is_muted = muted;
    }

    pub async fn refresh_system_volume(&mut self) {
        self.system_volume = self.volume.volume().await;
        self.is_muted = self.volume.is_muted().await;
    }

    fn send_command(&self, command: Command) {
        if !self.provider.send_command(command) {
            warn!("MediaRemote did not accept command {command}");
        }
    }

    /// Processes events until [`SourceEvent::Shutdown`] or until every handle is
    /// dropped. `on_change` receives a snapshot after each reported change.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<SourceEvent>,
        mut on_change: impl FnMut(MediaSnapshot),
    ) {
        self.refresh_system_volume().await;

        // the first tick completes immediately and doubles as the initial fetch
        let mut poll = time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Local media source started");

        loop {
            let changed = tokio::select! {
                biased;

                _ = poll.tick() => self.refresh().await,
                event = events.recv() => match event {
                    Some(SourceEvent::Notification(notification)) => {
                        trace!("Received {}", notification.as_ref());
                        self.refresh().await
                    }
                    Some(SourceEvent::RefreshNowPlaying) => self.refresh().await,
                    Some(SourceEvent::TogglePlayPause) => self.toggle_play_pause().await,
                    Some(SourceEvent::NextTrack) => self.next_track().await,
                    Some(SourceEvent::PreviousTrack) => self.previous_track().await,
                    Some(SourceEvent::Seek(seconds)) => {
                        self.seek(seconds);
                        false
                    }
                    Some(SourceEvent::SetVolume(level)) => {
                        self.set_volume(level).await;
                        false
                    }
                    Some(SourceEvent::ToggleMute) => {
                        self.toggle_mute().await;
                        false
                    }
                    Some(SourceEvent::Shutdown) | None => break,
                },
            };

            if changed {
                on_change(self.snapshot());
            }
        }

        info!("Local media source stopped");
    }
}

fn to_millis(seconds: Option<f64>) -> i64 {
    (seconds.unwrap_or_default() * 1000f64) as i64
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::apple_script::tests::FakeRunner;
    use crate::keys::NowPlayingNotification;
    use crate::testing::init_logger;

    #[derive(Default)]
    struct FakeState {
        info: NowPlayingInfo,
        bundle_id: Option<String>,
        bundle_id_queries: usize,
        commands: Vec<Command>,
    }

    #[derive(Clone, Default)]
    struct FakeProvider {
        state: Rc<RefCell<FakeState>>,
    }

    impl FakeProvider {
        fn playing(title: &str, bundle_id: &str) -> Self {
            let provider = FakeProvider::default();
            {
                let mut state = provider.state.borrow_mut();
                state.info = track(title, true);
                state.bundle_id = Some(bundle_id.to_string());
            }
            provider
        }
    }

    impl NowPlayingProvider for FakeProvider {
        fn now_playing_info(&self) -> impl Future<Output = NowPlayingInfo> {
            std::future::ready(self.state.borrow().info.clone())
        }

        fn now_playing_bundle_id(&self) -> impl Future<Output = Option<String>> {
            let mut state = self.state.borrow_mut();
            state.bundle_id_queries += 1;
            std::future::ready(state.bundle_id.clone())
        }

        fn send_command(&self, command: Command) -> bool {
            let mut state = self.state.borrow_mut();
            state.commands.push(command);
            match command {
                Command::TogglePlayPause => {
                    let playing = state.info.is_playing();
                    state.info.playback_rate = Some(if playing { 0.0 } else { 1.0 });
                }
                Command::NextTrack => state.info = track("Next", true),
                Command::PreviousTrack => state.info = track("Previous", true),
                _ => return false,
            }
            true
        }
    }

    fn track(title: &str, playing: bool) -> NowPlayingInfo {
        NowPlayingInfo {
            title: Some(title.to_string()),
            artist: Some("Artist".to_string()),
            album: Some("Album".to_string()),
            duration: Some(180.0),
            elapsed_time: Some(30.0),
            playback_rate: Some(if playing { 1.0 } else { 0.0 }),
            ..Default::default()
        }
    }

    fn no_fallback() -> Config {
        Config {
            spotify_fallback: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_refresh_reports_changes_once() {
        init_logger();
        let provider = FakeProvider::playing("Intro", "com.apple.Music");
        let mut source = LocalMediaSource::new(provider, FakeRunner::default(), no_fallback());

        assert!(source.refresh().await);
        assert!(!source.refresh().await);

        assert_eq!(&MediaSourceIdentifier::AppleMusic, source.identifier());
        assert!(source.is_available());
        assert_eq!("Intro", source.media_info().title);
        assert_eq!(30_000, source.media_info().position);
        assert_eq!(180_000, source.media_info().duration);
        assert!(source.media_info().is_playing);
    }

    #[tokio::test]
    async fn test_refresh_ignores_album_only_changes() {
        init_logger();
        let provider = FakeProvider::playing("Intro", "com.apple.Music");
        let mut source =
            LocalMediaSource::new(provider.clone(), FakeRunner::default(), no_fallback());
        source.refresh().await;

        provider.state.borrow_mut().info.album = Some("Deluxe".to_string());

        assert!(!source.refresh().await);
        assert_eq!("Deluxe", source.media_info().album);
    }

    #[tokio::test]
    async fn test_refresh_nothing_playing() {
        init_logger();
        let mut source =
            LocalMediaSource::new(FakeProvider::default(), FakeRunner::default(), no_fallback());

        assert!(!source.refresh().await);
        assert!(!source.is_available());
        assert_eq!(&MediaSourceIdentifier::default(), source.identifier());
    }

    #[tokio::test]
    async fn test_refresh_uses_spotify_fallback() {
        init_logger();
        let provider = FakeProvider::default();
        let runner = FakeRunner::with_outputs(vec![Ok(
            "Song|||Band|||Record|||200|||10|||paused".to_string()
        )]);
        let mut source = LocalMediaSource::new(provider.clone(), runner, Config::default());

        assert!(source.refresh().await);

        assert_eq!(&MediaSourceIdentifier::Spotify, source.identifier());
        assert_eq!("Song", source.media_info().title);
        assert!(!source.media_info().is_playing);
        assert_eq!(0, provider.state.borrow().bundle_id_queries);
    }

    #[tokio::test]
    async fn test_refresh_respects_allow_list() {
        init_logger();
        let provider = FakeProvider::playing("Clip", "com.google.Chrome");
        let config = Config {
            allowed_app_ids: ["com.spotify.client".to_string()].into(),
            ..no_fallback()
        };
        let mut source = LocalMediaSource::new(provider, FakeRunner::default(), config);

        assert!(!source.refresh().await);

        assert!(!source.is_available());
        assert_eq!("", source.media_info().title);
        assert_eq!(&MediaSourceIdentifier::default(), source.identifier());
    }

    #[tokio::test]
    async fn test_refresh_drops_app_leaving_allow_list() {
        init_logger();
        let provider = FakeProvider::playing("Intro", "com.spotify.client");
        let config = Config {
            allowed_app_ids: ["com.spotify.client".to_string()].into(),
            ..no_fallback()
        };
        let mut source = LocalMediaSource::new(provider.clone(), FakeRunner::default(), config);
        assert!(source.refresh().await);

        provider.state.borrow_mut().bundle_id = Some("com.google.Chrome".to_string());

        assert!(source.refresh().await);
        assert!(!source.is_available());
        assert_eq!(&MediaSourceIdentifier::default(), source.identifier());
        assert!(!source.refresh().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_refresh_after_delay() {
        init_logger();
        let provider = FakeProvider::playing("Intro", "com.spotify.client");
        let mut source =
            LocalMediaSource::new(provider.clone(), FakeRunner::default(), no_fallback());
        source.refresh().await;

        let start = time::Instant::now();
        assert!(source.toggle_play_pause().await);
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(!source.media_info().is_playing);

        let start = time::Instant::now();
        assert!(source.next_track().await);
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!("Next", source.media_info().title);

        assert_eq!(
            vec![Command::TogglePlayPause, Command::NextTrack],
            provider.state.borrow().commands
        );
    }

    #[tokio::test]
    async fn test_volume_and_mute() {
        init_logger();
        let runner =
            FakeRunner::with_outputs(vec![Ok("20".to_string()), Ok("false".to_string())]);
        let mut source = LocalMediaSource::new(FakeProvider::default(), runner, no_fallback());

        source.refresh_system_volume().await;
        assert_eq!(20, source.system_volume());
        assert!(!source.is_muted());

        source.set_volume(250).await;
        assert_eq!(100, source.system_volume());

        source.toggle_mute().await;
        assert!(source.is_muted());
        assert!(!source.capabilities().contains(&Capability::Seek));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_dispatches_events() {
        init_logger();
        let provider = FakeProvider::playing("Intro", "com.apple.Music");
        let source = LocalMediaSource::new(provider.clone(), FakeRunner::default(), no_fallback());
        let (handle, rx) = source_channel();
        let snapshots = Rc::new(RefCell::new(Vec::<MediaSnapshot>::new()));
        let collected = snapshots.clone();

        let driver = async {
            handle.send(SourceEvent::TogglePlayPause).await.unwrap();
            handle.send(SourceEvent::Seek(42)).await.unwrap();
            handle.send(SourceEvent::Shutdown).await.unwrap();
        };

        tokio::join!(
            source.run(rx, move |snapshot| collected.borrow_mut().push(snapshot)),
            driver
        );

        let snapshots = snapshots.borrow();
        assert_eq!(2, snapshots.len());
        assert!(snapshots[0].media_info.is_playing);
        assert!(!snapshots[1].media_info.is_playing);
        assert_eq!(vec![Command::TogglePlayPause], provider.state.borrow().commands);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_and_handles_notifications() {
        init_logger();
        let provider = FakeProvider::playing("Intro", "com.apple.Music");
        let source = LocalMediaSource::new(provider.clone(), FakeRunner::default(), no_fallback());
        let (handle, rx) = source_channel();
        let snapshots = Rc::new(RefCell::new(Vec::<String>::new()));
        let collected = snapshots.clone();

        let driver = async {
            time::sleep(Duration::from_millis(10)).await;
            provider.state.borrow_mut().info = track("Polled", true);
            time::sleep(Duration::from_millis(2500)).await;

            provider.state.borrow_mut().info = track("Notified", true);
            handle
                .send(SourceEvent::Notification(NowPlayingNotification::InfoDidChange))
                .await
                .unwrap();
            time::sleep(Duration::from_millis(10)).await;
            drop(handle);
        };

        tokio::join!(
            source.run(rx, move |snapshot| {
                collected.borrow_mut().push(snapshot.media_info.title)
            }),
            driver
        );

        assert_eq!(vec!["Intro", "Polled", "Notified"], *snapshots.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_zero_poll_interval() {
        init_logger();
        let config = Config {
            poll_interval: Duration::ZERO,
            ..no_fallback()
        };
        let source = LocalMediaSource::new(
            FakeProvider::playing("Intro", "com.apple.Music"),
            FakeRunner::default(),
            config,
        );
        let (handle, rx) = source_channel();
        let snapshots = Rc::new(RefCell::new(0usize));
        let collected = snapshots.clone();

        handle.send(SourceEvent::Shutdown).await.unwrap();
        source.run(rx, move |_| *collected.borrow_mut() += 1).await;

        assert_eq!(1, *snapshots.borrow());
    }

    #[tokio::test]
    async fn test_handle_reports_closed_source() {
        let (handle, rx) = source_channel();
        drop(rx);

        assert!(matches!(
            handle.send(SourceEvent::RefreshNowPlaying).await,
            Err(Error::SourceClosed)
        ));
        assert!(matches!(
            handle.try_send(SourceEvent::RefreshNowPlaying),
            Err(Error::SourceClosed)
        ));
    }
}

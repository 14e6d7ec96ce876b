use std::ptr::NonNull;

use block2::RcBlock;
use dispatch2::{DispatchQoS, DispatchQueue, GlobalQueueIdentifier};
use log::{debug, info, warn};
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, ProtocolObject};
use objc2_foundation::{NSDictionary, NSNotification, NSNotificationCenter, NSObjectProtocol, NSString};
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

use crate::apple_script::OsaScript;
use crate::config::Config;
use crate::error::Result;
use crate::keys::NowPlayingNotification;
use crate::local_source::{LocalMediaSource, SourceHandle};
use crate::media_events::{MediaSnapshot, SourceEvent};
use crate::media_listener::macos_mediaremote::mediaremote::{MediaRemote, fetch_app_name};
use crate::now_playing::NowPlayingApplication;

type Observer = Retained<ProtocolObject<dyn NSObjectProtocol>>;

fn register_notifications(
    media_remote: &MediaRemote,
    notification_center: &NSNotificationCenter,
    handle: &SourceHandle,
) -> Vec<Observer> {
    let mut observers: Vec<Observer> = Vec::new();

    for notification in NowPlayingNotification::iter() {
        let name = NSString::from_str(&media_remote.resolve_constant(&notification));
        let handle = handle.clone();

        let block = RcBlock::new(move |posted: NonNull<NSNotification>| {
            if notification != NowPlayingNotification::InfoDidChange {
                log_application(notification, unsafe { posted.as_ref() });
            }

            if let Err(e) = handle.try_send(SourceEvent::Notification(notification)) {
                warn!("Failed to forward {}, {e}", notification.as_ref());
            }
        });

        let observer = unsafe {
            notification_center.addObserverForName_object_queue_usingBlock(
                Some(&name),
                None,
                None,
                &block,
            )
        };
        observers.push(observer);
    }

    let queue = DispatchQueue::global_queue(GlobalQueueIdentifier::QualityOfService(
        DispatchQoS::Default,
    ));
    media_remote.register_for_now_playing_notifications(&queue);

    observers
}

fn unregister_notifications(
    media_remote: &MediaRemote,
    notification_center: &NSNotificationCenter,
    observers: &mut Vec<Observer>,
) {
    unsafe {
        for observer in observers.drain(..) {
            let any_object = Retained::cast_unchecked::<AnyObject>(observer);
            notification_center.removeObserver(&any_object);
        }
    }

    media_remote.unregister_for_now_playing_notifications();
}

fn log_application(notification: NowPlayingNotification, posted: &NSNotification) {
    let Some(user_info) = posted.userInfo() else {
        return;
    };

    // SAFETY: MediaRemote user info dictionaries are keyed by strings
    let user_info =
        unsafe { Retained::cast_unchecked::<NSDictionary<NSString, AnyObject>>(user_info) };
    let mut application = NowPlayingApplication::from_user_info(&*user_info);

    if application.display_name.is_empty()
        && let Some(app_name) = application.bundle_identifier.as_deref().and_then(fetch_app_name)
    {
        application.display_name = app_name;
    }

    debug!("{}: {application:?}", notification.as_ref());
}

/// Monitors the local now playing session until [`SourceEvent::Shutdown`] is sent
/// through `handle`. The notification observers keep their own handles, so
/// dropping the caller's handles does not stop the loop.
#[tokio::main(flavor = "current_thread")]
pub async fn listener(
    config: Config,
    handle: SourceHandle,
    events: mpsc::Receiver<SourceEvent>,
    on_change: impl FnMut(MediaSnapshot),
) -> Result<()> {
    let media_remote = MediaRemote::load(&config.framework_path)?;

    let notification_center = unsafe { NSNotificationCenter::defaultCenter() };
    let mut observers = register_notifications(&media_remote, &notification_center, &handle);
    drop(handle);

    let scripts = OsaScript::with_timeout(config.script_timeout);
    let source = LocalMediaSource::new(&media_remote, scripts, config);
    source.run(events, on_change).await;

    unregister_notifications(&media_remote, &notification_center, &mut observers);
    info!("Unregistered from now playing notifications");

    Ok(())
}

use std::ffi::{c_int, c_void};
use std::mem::transmute_copy;
use std::path::Path;

use block2::{Block, RcBlock};
use core_foundation::base::TCFType;
use core_foundation::bundle::CFBundle;
use core_foundation::string::CFString;
use core_foundation::url::CFURL;
use core_foundation_sys::bundle::CFBundleGetDataPointerForName;
use core_services::{CFArray, LSCopyApplicationURLsForBundleIdentifier};
use dispatch2::{DispatchQoS, DispatchQueue, DispatchRetained, GlobalQueueIdentifier};
use log::{debug, info, trace, warn};
use objc2::runtime::{AnyObject, Bool};
use objc2_foundation::{NSDictionary, NSString};
use crate::command::Command;
use crate::completion::once_completion;
use crate::error::{Error, Result};
use crate::keys::MediaRemoteSymbol;
use crate::local_source::NowPlayingProvider;
use crate::now_playing::NowPlayingInfo;

#[allow(improper_ctypes_definitions)]
type MRMediaRemoteRegisterForNowPlayingNotifications = unsafe extern "C" fn(&DispatchQueue);

#[allow(improper_ctypes_definitions)]
type MRMediaRemoteUnregisterForNowPlayingNotifications = unsafe extern "C" fn();

#[allow(improper_ctypes_definitions)]
type MRMediaRemoteGetNowPlayingInfo = unsafe extern "C" fn(
    &DispatchQueue,
    &Block<dyn Fn(*const NSDictionary<NSString, AnyObject>)>,
);

#[allow(improper_ctypes_definitions)]
type MRMediaRemoteGetNowPlayingApplicationPID =
    unsafe extern "C" fn(&DispatchQueue, &Block<dyn Fn(c_int)>);

#[allow(improper_ctypes_definitions)]
type MRMediaRemoteGetNowPlayingApplicationIsPlaying =
    unsafe extern "C" fn(&DispatchQueue, &Block<dyn Fn(Bool)>);

#[allow(improper_ctypes_definitions)]
type MRMediaRemoteSendCommand =
    unsafe extern "C" fn(isize, *const NSDictionary<NSString, AnyObject>) -> Bool;

#[allow(improper_ctypes_definitions)]
type MRMediaRemoteGetNowPlayingClient =
    unsafe extern "C" fn(&DispatchQueue, &Block<dyn Fn(*const AnyObject)>);

#[allow(improper_ctypes_definitions)]
type MRNowPlayingClientGetBundleIdentifier =
    unsafe extern "C" fn(*const AnyObject) -> *const NSString;

/// The private MediaRemote framework, loaded at runtime.
///
/// Completion based calls deliver their result on the queue passed by the
/// caller. The `async` variants bridge a completion into a future and use the
/// user initiated global queue.
pub struct MediaRemote {
    bundle: CFBundle,
    queue: DispatchRetained<DispatchQueue>,
    register_for_now_playing_notifications: MRMediaRemoteRegisterForNowPlayingNotifications,
    unregister_for_now_playing_notifications: MRMediaRemoteUnregisterForNowPlayingNotifications,
    get_now_playing_info: MRMediaRemoteGetNowPlayingInfo,
    get_now_playing_application_pid: MRMediaRemoteGetNowPlayingApplicationPID,
    get_now_playing_application_is_playing: MRMediaRemoteGetNowPlayingApplicationIsPlaying,
    send_command: MRMediaRemoteSendCommand,
    // not part of the public headers of every release
    get_now_playing_client: Option<MRMediaRemoteGetNowPlayingClient>,
    get_now_playing_client_bundle_identifier: Option<MRNowPlayingClientGetBundleIdentifier>,
}

impl MediaRemote {
    pub fn load(framework_path: &str) -> Result<Self> {
        let bundle_url = CFURL::from_path(framework_path, true)
            .ok_or_else(|| Error::FrameworkNotFound(framework_path.to_string()))?;
        let bundle = CFBundle::new(bundle_url)
            .ok_or_else(|| Error::FrameworkNotFound(framework_path.to_string()))?;

        let media_remote = MediaRemote {
            register_for_now_playing_notifications: function(
                &bundle,
                "MRMediaRemoteRegisterForNowPlayingNotifications",
            )?,
            unregister_for_now_playing_notifications: function(
                &bundle,
                "MRMediaRemoteUnregisterForNowPlayingNotifications",
            )?,
            get_now_playing_info: function(&bundle, "MRMediaRemoteGetNowPlayingInfo")?,
            get_now_playing_application_pid: function(
                &bundle,
                "MRMediaRemoteGetNowPlayingApplicationPID",
            )?,
            get_now_playing_application_is_playing: function(
                &bundle,
                "MRMediaRemoteGetNowPlayingApplicationIsPlaying",
            )?,
            send_command: function(&bundle, "MRMediaRemoteSendCommand")?,
            get_now_playing_client: function(&bundle, "MRMediaRemoteGetNowPlayingClient").ok(),
            get_now_playing_client_bundle_identifier: function(
                &bundle,
                "MRNowPlayingClientGetBundleIdentifier",
            )
            .ok(),
            queue: DispatchQueue::global_queue(GlobalQueueIdentifier::QualityOfService(
                DispatchQoS::UserInitiated,
            )),
            bundle,
        };

        info!("MediaRemote framework loaded from {framework_path}");
        Ok(media_remote)
    }

    /// The framework starts posting now playing notifications once registered.
    pub fn register_for_now_playing_notifications(&self, queue: &DispatchQueue) {
        unsafe { (self.register_for_now_playing_notifications)(queue) };
    }

    pub fn unregister_for_now_playing_notifications(&self) {
        unsafe { (self.unregister_for_now_playing_notifications)() };
    }

    pub fn get_now_playing_info(
        &self,
        queue: &DispatchQueue,
        completion: impl Fn(NowPlayingInfo) + Send + 'static,
    ) {
        let block = RcBlock::new(move |raw_info: *const NSDictionary<NSString, AnyObject>| {
            let info = unsafe { raw_info.as_ref() }
                .map(NowPlayingInfo::from_dictionary)
                .unwrap_or_default();
            completion(info);
        });

        unsafe { (self.get_now_playing_info)(queue, &block) };
    }

    pub fn get_now_playing_application_pid(
        &self,
        queue: &DispatchQueue,
        completion: impl Fn(i32) + Send + 'static,
    ) {
        let block = RcBlock::new(move |pid: c_int| completion(pid));
        unsafe { (self.get_now_playing_application_pid)(queue, &block) };
    }

    pub fn get_now_playing_application_is_playing(
        &self,
        queue: &DispatchQueue,
        completion: impl Fn(bool) + Send + 'static,
    ) {
        let block = RcBlock::new(move |is_playing: Bool| completion(is_playing.as_bool()));
        unsafe { (self.get_now_playing_application_is_playing)(queue, &block) };
    }

    /// Bundle id of the now playing client, `None` when nothing owns the session.
    pub fn get_now_playing_client_bundle_identifier(
        &self,
        queue: &DispatchQueue,
        completion: impl Fn(Option<String>) + Send + 'static,
    ) {
        let (Some(get_client), Some(get_bundle_identifier)) = (
            self.get_now_playing_client,
            self.get_now_playing_client_bundle_identifier,
        ) else {
            completion(None);
            return;
        };

        let block = RcBlock::new(move |client: *const AnyObject| {
            let bundle_identifier = if client.is_null() {
                None
            } else {
                unsafe { get_bundle_identifier(client).as_ref() }.map(|x| x.to_string())
            };
            completion(bundle_identifier);
        });

        unsafe { get_client(queue, &block) };
    }

    /// Synchronous, returns whether the framework accepted the command.
    pub fn send_command(
        &self,
        command: Command,
        options: Option<&NSDictionary<NSString, AnyObject>>,
    ) -> bool {
        let options = options.map_or(std::ptr::null(), |x| x as *const _);
        let accepted = unsafe { (self.send_command)(command.raw(), options) }.as_bool();
        debug!("MRMediaRemoteSendCommand({command}) returned {accepted}");
        accepted
    }

    pub async fn now_playing_info(&self) -> NowPlayingInfo {
        let (completion, rx) = once_completion();
        self.get_now_playing_info(&self.queue, completion);
        rx.await.unwrap_or_default()
    }

    pub async fn now_playing_application_pid(&self) -> Option<i32> {
        let (completion, rx) = once_completion();
        self.get_now_playing_application_pid(&self.queue, completion);
        rx.await.ok().filter(|pid| *pid > 0)
    }

    pub async fn now_playing_application_is_playing(&self) -> bool {
        let (completion, rx) = once_completion();
        self.get_now_playing_application_is_playing(&self.queue, completion);
        rx.await.unwrap_or_default()
    }

    pub async fn now_playing_client_bundle_identifier(&self) -> Option<String> {
        let (completion, rx) = once_completion();
        self.get_now_playing_client_bundle_identifier(&self.queue, completion);
        rx.await.ok().flatten()
    }

    /// Reads the value of an exported string constant, falling back to its symbol
    /// name when the framework does not export it.
    pub fn resolve_constant(&self, symbol: &impl MediaRemoteSymbol) -> String {
        let name = CFString::new(symbol.symbol_name());
        let pointer = unsafe {
            CFBundleGetDataPointerForName(self.bundle.as_concrete_TypeRef(), name.as_concrete_TypeRef())
        } as *const *const NSString;

        let value = if pointer.is_null() {
            None
        } else {
            unsafe { (*pointer).as_ref() }.map(|x| x.to_string())
        };

        value.unwrap_or_else(|| {
            trace!("{} is not exported, using the symbol name", symbol.symbol_name());
            symbol.symbol_name().to_string()
        })
    }
}

impl NowPlayingProvider for MediaRemote {
    async fn now_playing_info(&self) -> NowPlayingInfo {
        MediaRemote::now_playing_info(self).await
    }

    async fn now_playing_bundle_id(&self) -> Option<String> {
        self.now_playing_client_bundle_identifier().await
    }

    fn send_command(&self, command: Command) -> bool {
        MediaRemote::send_command(self, command, None)
    }
}

fn function<F: Copy>(bundle: &CFBundle, name: &'static str) -> Result<F> {
    let pointer: *const c_void =
        bundle.function_pointer_for_name(CFString::from_static_string(name));

    if pointer.is_null() {
        warn!("MediaRemote does not export {name}");
        return Err(Error::SymbolNotFound(name));
    }

    // SAFETY: F is one of the function pointer types above, matching the symbol
    Ok(unsafe { transmute_copy::<*const c_void, F>(&pointer) })
}

/// Display name of an installed app, from its bundle name on disk.
pub fn fetch_app_name(bundle_id: &str) -> Option<String> {
    let bundle_id = CFString::new(bundle_id);

    unsafe {
        let urls = LSCopyApplicationURLsForBundleIdentifier(
            bundle_id.as_concrete_TypeRef(),
            std::ptr::null_mut(),
        );

        if urls.is_null() {
            return None;
        }

        let cf_array: CFArray<CFURL> = CFArray::wrap_under_create_rule(urls);
        let first_url = cf_array.get(0)?;
        let url_string = first_url.absolute().get_string().to_string();

        Path::new(&url_string)
            .file_stem()
            .map(|file_name| file_name.to_string_lossy().into_owned())
    }
}

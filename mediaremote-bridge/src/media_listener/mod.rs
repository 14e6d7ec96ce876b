#[cfg(target_os = "macos")]
mod macos_mediaremote;

#[cfg(target_os = "macos")]
pub use macos_mediaremote::{MediaRemote, fetch_app_name, listener};

mod mediaremote;
mod mediaremote_listener;
mod ns_dictionary_extensions;

pub use mediaremote::{MediaRemote, fetch_app_name};
pub use mediaremote_listener::listener;

// User configuration

pub mod preferences;

pub use preferences::{Preferences, PreferencesError};

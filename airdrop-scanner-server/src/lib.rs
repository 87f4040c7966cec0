mod handlers;
mod run;
mod settings;
mod websocket;

pub use run::{run, AppState};
pub use settings::{RealtimeSettings, Settings};

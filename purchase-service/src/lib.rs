pub mod config;
pub mod handlers;
pub mod startup;

pub use startup::{AppState, Application, build_router};

// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod caret;
pub mod config;
pub mod input;
pub mod layout;
pub mod prompt;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod ui;
pub mod util;

//! Session client and command line front end of the arena tournament platform
pub mod api;
pub mod cli;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod paths;
pub mod render;
pub mod session;
pub mod settings;
pub mod storage;

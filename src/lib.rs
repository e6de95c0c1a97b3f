pub mod app;
pub mod audio;
pub mod bridge;
pub mod config;
pub mod logging;
pub mod model;
pub mod playlist;
pub mod resolver;
pub mod session;
pub mod sniff;
pub mod transport;
pub mod ui;

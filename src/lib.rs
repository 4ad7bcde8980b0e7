pub mod config;
pub mod loader;
pub mod player;
pub mod route;
pub mod session;
pub mod tenant;
pub mod types;
pub mod util;

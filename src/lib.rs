pub mod chain;
pub mod config;
pub mod fetch;
pub mod location;
pub mod scheduler;
pub mod scroll;
pub mod state;
pub mod tracker;
pub mod transport;
pub mod viewer;
pub mod window;
pub mod wire;

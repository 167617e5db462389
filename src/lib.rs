pub mod config;
pub mod display;
pub mod fetch;
pub mod refresh;
pub mod transit;

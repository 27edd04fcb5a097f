// Library exports for the Battlesnake decision engine
// The server binary and the integration tests both build on these modules

pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod pathfinding;
pub mod safety;
pub mod scoring;
pub mod search;
pub mod selector;
pub mod space;
pub mod state;
pub mod types;

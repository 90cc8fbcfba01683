pub mod cli;
pub mod config;
pub mod events;
pub mod interpret;
pub mod model;
pub mod shaper;
pub mod visualize;
pub mod web;

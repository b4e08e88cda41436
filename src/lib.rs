#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod car;
pub mod config;
pub mod game;
pub mod model;
pub mod render;
pub mod road;
pub mod scenery;
pub mod space;

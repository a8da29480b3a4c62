pub mod callbacks;
pub mod constants;
pub mod engine;
pub mod items;
pub mod levels;
pub mod log;
pub mod monster_state;
pub mod pathfinding;
pub mod rng;
pub mod settings;
pub mod tiles;
pub mod types;
pub mod validator;
pub mod world;

pub mod event;
pub mod hazard;
pub mod level;
pub mod plan;
pub mod step;
pub mod world;

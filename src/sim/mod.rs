pub mod event;
pub mod level;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod step;
pub mod world;

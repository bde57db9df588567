pub mod app;
pub mod core;
pub mod module;
pub mod queue;

pub mod conditions;
pub mod frame;
pub mod loader;
pub mod participant;
pub mod pipeline;

pub mod condition;
pub mod stimulus;
pub mod trial;

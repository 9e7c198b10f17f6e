pub mod project;
pub mod sprint;
pub mod task;

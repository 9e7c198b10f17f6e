pub mod post;
pub mod social;

pub mod comments;
pub mod posts;
pub mod social;

#[cfg(test)]
pub(crate) mod fake;

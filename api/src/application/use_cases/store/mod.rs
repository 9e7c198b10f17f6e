pub mod cart;
pub mod catalog;
pub mod orders;

#[cfg(test)]
pub(crate) mod fake;

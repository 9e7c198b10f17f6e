pub mod tasks;

#[cfg(test)]
pub(crate) mod fake;

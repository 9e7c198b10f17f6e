pub mod accounts;
pub mod transfers;

#[cfg(test)]
pub(crate) mod fake;

//! Names of the shared counter records and the human-readable identifiers
//! derived from their values.

use uuid::Uuid;

pub const BANK_ACCOUNT: &str = "bank.account";
pub const BANK_TRANSACTION: &str = "bank.transaction";
pub const STORE_PRODUCT: &str = "store.product";
pub const STORE_ORDER: &str = "store.order";

/// Issues and pull requests of one repository draw from the same sequence.
pub fn issue_number_counter(repository_id: Uuid) -> String {
    format!("issues.repo.{repository_id}")
}

pub fn project_task_counter(project_id: Uuid) -> String {
    format!("projects.task.{project_id}")
}

pub fn account_number(seq: i64) -> String {
    format!("ACC{:010}", seq)
}

pub fn transaction_reference(seq: i64) -> String {
    format!("TXN{:012}", seq)
}

pub fn product_sku(seq: i64) -> String {
    format!("SKU-{:06}", seq)
}

pub fn order_number(seq: i64) -> String {
    format!("ORD-{:08}", seq)
}

pub fn task_key(project_key: &str, seq: i64) -> String {
    format!("{}-{}", project_key, seq)
}

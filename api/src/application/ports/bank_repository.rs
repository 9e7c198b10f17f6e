use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::bank::account::{Account, AccountKind, Transaction, TransactionKind};

#[derive(Debug, Clone)]
pub struct Movement<'a> {
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: i64,
    pub reference: &'a str,
    pub note: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub enum MovementOutcome {
    Applied(Transaction),
    InsufficientFunds,
}

#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: i64,
    pub debit_reference: &'a str,
    pub credit_reference: &'a str,
    pub note: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub enum TransferOutcome {
    Completed { debit: Transaction, credit: Transaction },
    InsufficientFunds,
}

#[async_trait]
pub trait BankRepository: Send + Sync {
    async fn create_account(
        &self,
        owner_id: Uuid,
        account_number: &str,
        kind: AccountKind,
        currency: &str,
    ) -> anyhow::Result<Account>;
    async fn list_accounts(&self, owner_id: Uuid) -> anyhow::Result<Vec<Account>>;
    async fn get_account(&self, id: Uuid) -> anyhow::Result<Option<Account>>;
    async fn find_by_number(&self, account_number: &str) -> anyhow::Result<Option<Account>>;
    /// Deposits or withdraws in one statement; withdrawals never overdraw.
    async fn apply_movement(&self, movement: Movement<'_>) -> anyhow::Result<MovementOutcome>;
    /// Moves money between two accounts inside one database transaction.
    async fn transfer(&self, req: TransferRequest<'_>) -> anyhow::Result<TransferOutcome>;
    async fn list_transactions(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Transaction>, i64)>;
}

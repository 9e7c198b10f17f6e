use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::bank_repository::{
    BankRepository, Movement, MovementOutcome, TransferOutcome, TransferRequest,
};
use crate::domain::bank::account::{Account, AccountKind, Transaction, TransactionKind};

#[derive(Default)]
pub struct MemBank {
    accounts: Mutex<Vec<Account>>,
    txs: Mutex<Vec<Transaction>>,
}

impl MemBank {
    fn record(
        &self,
        account: &Account,
        kind: TransactionKind,
        amount: i64,
        reference: &str,
        counterparty: Option<Uuid>,
        note: Option<&str>,
    ) -> Transaction {
        let tx = Transaction {
            id: Uuid::new_v4(),
            account_id: account.id,
            kind,
            amount,
            balance_after: account.balance,
            counterparty_account_id: counterparty,
            reference: reference.to_string(),
            note: note.map(str::to_string),
            created_at: chrono::Utc::now(),
        };
        self.txs.lock().unwrap().push(tx.clone());
        tx
    }
}

#[async_trait]
impl BankRepository for MemBank {
    async fn create_account(
        &self,
        owner_id: Uuid,
        account_number: &str,
        kind: AccountKind,
        currency: &str,
    ) -> anyhow::Result<Account> {
        let acc = Account {
            id: Uuid::new_v4(),
            owner_id,
            account_number: account_number.to_string(),
            kind,
            currency: currency.to_string(),
            balance: 0,
            created_at: chrono::Utc::now(),
        };
        self.accounts.lock().unwrap().push(acc.clone());
        Ok(acc)
    }

    async fn list_accounts(&self, owner_id: Uuid) -> anyhow::Result<Vec<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_account(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        Ok(self.accounts.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_number(&self, n: &str) -> anyhow::Result<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.account_number == n)
            .cloned())
    }

    async fn apply_movement(&self, m: Movement<'_>) -> anyhow::Result<MovementOutcome> {
        let mut accounts = self.accounts.lock().unwrap();
        let acc = accounts.iter_mut().find(|a| a.id == m.account_id).unwrap();
        match m.kind {
            TransactionKind::Withdrawal if acc.balance < m.amount => {
                return Ok(MovementOutcome::InsufficientFunds);
            }
            TransactionKind::Withdrawal => acc.balance -= m.amount,
            _ => acc.balance += m.amount,
        }
        let snapshot = acc.clone();
        drop(accounts);
        Ok(MovementOutcome::Applied(self.record(
            &snapshot,
            m.kind,
            m.amount,
            m.reference,
            None,
            m.note,
        )))
    }

    async fn transfer(&self, r: TransferRequest<'_>) -> anyhow::Result<TransferOutcome> {
        let mut accounts = self.accounts.lock().unwrap();
        let from_balance = accounts
            .iter()
            .find(|a| a.id == r.from_account_id)
            .unwrap()
            .balance;
        if from_balance < r.amount {
            return Ok(TransferOutcome::InsufficientFunds);
        }
        for a in accounts.iter_mut() {
            if a.id == r.from_account_id {
                a.balance -= r.amount;
            } else if a.id == r.to_account_id {
                a.balance += r.amount;
            }
        }
        let from = accounts.iter().find(|a| a.id == r.from_account_id).cloned().unwrap();
        let to = accounts.iter().find(|a| a.id == r.to_account_id).cloned().unwrap();
        drop(accounts);
        let debit = self.record(
            &from,
            TransactionKind::TransferOut,
            r.amount,
            r.debit_reference,
            Some(to.id),
            r.note,
        );
        let credit = self.record(
            &to,
            TransactionKind::TransferIn,
            r.amount,
            r.credit_reference,
            Some(from.id),
            r.note,
        );
        Ok(TransferOutcome::Completed { debit, credit })
    }

    async fn list_transactions(
        &self,
        account_id: Uuid,
        _page: PageRequest,
    ) -> anyhow::Result<(Vec<Transaction>, i64)> {
        let items: Vec<Transaction> = self
            .txs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        let total = items.len() as i64;
        Ok((items, total))
    }
}

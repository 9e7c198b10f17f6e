use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction as PgTransaction};
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::bank_repository::{
    BankRepository, Movement, MovementOutcome, TransferOutcome, TransferRequest,
};
use crate::domain::bank::account::{Account, AccountKind, Transaction, TransactionKind};
use crate::infrastructure::db::PgPool;

const ACCOUNT_COLUMNS: &str = "id, owner_id, account_number, kind, currency, balance, created_at";
const TX_COLUMNS: &str = "id, account_id, kind, amount, balance_after, counterparty_account_id, reference, note, created_at";

pub struct SqlxBankRepository {
    pub pool: PgPool,
}

impl SqlxBankRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_account(r: &PgRow) -> anyhow::Result<Account> {
    Ok(Account {
        id: r.get("id"),
        owner_id: r.get("owner_id"),
        account_number: r.get("account_number"),
        kind: r.get::<String, _>("kind").parse::<AccountKind>()?,
        currency: r.get("currency"),
        balance: r.get("balance"),
        created_at: r.get("created_at"),
    })
}

fn map_tx(r: &PgRow) -> anyhow::Result<Transaction> {
    Ok(Transaction {
        id: r.get("id"),
        account_id: r.get("account_id"),
        kind: r.get::<String, _>("kind").parse()?,
        amount: r.get("amount"),
        balance_after: r.get("balance_after"),
        counterparty_account_id: r.get("counterparty_account_id"),
        reference: r.get("reference"),
        note: r.get("note"),
        created_at: r.get("created_at"),
    })
}

struct Ledger<'a> {
    account_id: Uuid,
    kind: TransactionKind,
    amount: i64,
    counterparty: Option<Uuid>,
    reference: &'a str,
    note: Option<&'a str>,
}

/// Adjusts the balance and writes the ledger row. Debits only apply while
/// the balance covers them; `None` means the account could not pay.
async fn post_entry(
    tx: &mut PgTransaction<'_, Postgres>,
    entry: Ledger<'_>,
) -> anyhow::Result<Option<Transaction>> {
    let delta = match entry.kind {
        TransactionKind::Deposit | TransactionKind::TransferIn => entry.amount,
        TransactionKind::Withdrawal | TransactionKind::TransferOut => -entry.amount,
    };
    let balance: Option<i64> = sqlx::query_scalar(
        r#"UPDATE bank_accounts SET balance = balance + $2
           WHERE id = $1 AND balance + $2 >= 0
           RETURNING balance"#,
    )
    .bind(entry.account_id)
    .bind(delta)
    .fetch_optional(&mut **tx)
    .await?;
    let Some(balance_after) = balance else {
        return Ok(None);
    };
    let row = sqlx::query(&format!(
        r#"INSERT INTO bank_transactions
               (account_id, kind, amount, balance_after, counterparty_account_id, reference, note)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING {TX_COLUMNS}"#
    ))
    .bind(entry.account_id)
    .bind(entry.kind.as_str())
    .bind(entry.amount)
    .bind(balance_after)
    .bind(entry.counterparty)
    .bind(entry.reference)
    .bind(entry.note)
    .fetch_one(&mut **tx)
    .await?;
    Ok(Some(map_tx(&row)?))
}

#[async_trait]
impl BankRepository for SqlxBankRepository {
    async fn create_account(
        &self,
        owner_id: Uuid,
        account_number: &str,
        kind: AccountKind,
        currency: &str,
    ) -> anyhow::Result<Account> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO bank_accounts (owner_id, account_number, kind, currency)
               VALUES ($1, $2, $3, $4)
               RETURNING {ACCOUNT_COLUMNS}"#
        ))
        .bind(owner_id)
        .bind(account_number)
        .bind(kind.as_str())
        .bind(currency)
        .fetch_one(&self.pool)
        .await?;
        map_account(&row)
    }

    async fn list_accounts(&self, owner_id: Uuid) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM bank_accounts WHERE owner_id = $1 ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_account).collect()
    }

    async fn get_account(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM bank_accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_account).transpose()
    }

    async fn find_by_number(&self, account_number: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM bank_accounts WHERE account_number = $1"
        ))
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_account).transpose()
    }

    async fn apply_movement(&self, movement: Movement<'_>) -> anyhow::Result<MovementOutcome> {
        let mut tx = self.pool.begin().await?;
        let posted = post_entry(
            &mut tx,
            Ledger {
                account_id: movement.account_id,
                kind: movement.kind,
                amount: movement.amount,
                counterparty: None,
                reference: movement.reference,
                note: movement.note,
            },
        )
        .await?;
        match posted {
            Some(t) => {
                tx.commit().await?;
                Ok(MovementOutcome::Applied(t))
            }
            None => {
                tx.rollback().await?;
                Ok(MovementOutcome::InsufficientFunds)
            }
        }
    }

    async fn transfer(&self, req: TransferRequest<'_>) -> anyhow::Result<TransferOutcome> {
        let mut tx = self.pool.begin().await?;
        // Both rows are locked in id order up front so opposite transfers
        // between the same pair of accounts cannot deadlock.
        sqlx::query("SELECT id FROM bank_accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(vec![req.from_account_id, req.to_account_id])
            .fetch_all(&mut *tx)
            .await?;
        let debit = post_entry(
            &mut tx,
            Ledger {
                account_id: req.from_account_id,
                kind: TransactionKind::TransferOut,
                amount: req.amount,
                counterparty: Some(req.to_account_id),
                reference: req.debit_reference,
                note: req.note,
            },
        )
        .await?;
        let Some(debit) = debit else {
            tx.rollback().await?;
            return Ok(TransferOutcome::InsufficientFunds);
        };
        let credit = post_entry(
            &mut tx,
            Ledger {
                account_id: req.to_account_id,
                kind: TransactionKind::TransferIn,
                amount: req.amount,
                counterparty: Some(req.from_account_id),
                reference: req.credit_reference,
                note: req.note,
            },
        )
        .await?
        .ok_or_else(|| anyhow::anyhow!("credit to account {} was not applied", req.to_account_id))?;
        tx.commit().await?;
        Ok(TransferOutcome::Completed { debit, credit })
    }

    async fn list_transactions(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Transaction>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bank_transactions WHERE account_id = $1")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;
        let rows = sqlx::query(&format!(
            r#"SELECT {TX_COLUMNS} FROM bank_transactions WHERE account_id = $1
               ORDER BY created_at DESC, reference DESC
               LIMIT $2 OFFSET $3"#
        ))
        .bind(account_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(map_tx).collect::<anyhow::Result<Vec<_>>>()?;
        Ok((items, total))
    }
}

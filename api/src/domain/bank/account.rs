use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::domain::rules::RuleViolation;

/// Upper bound for a single deposit, withdrawal or transfer, in minor units.
pub const MAX_TRANSACTION_AMOUNT: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Checking,
    Savings,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
        }
    }
}

impl FromStr for AccountKind {
    type Err = RuleViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            other => Err(RuleViolation::invalid(format!(
                "unknown account kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::TransferIn => "transfer_in",
            TransactionKind::TransferOut => "transfer_out",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "transfer_in" => Ok(TransactionKind::TransferIn),
            "transfer_out" => Ok(TransactionKind::TransferOut),
            other => anyhow::bail!("unknown transaction kind: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub account_number: String,
    pub kind: AccountKind,
    pub currency: String,
    pub balance: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: i64,
    pub balance_after: i64,
    pub counterparty_account_id: Option<Uuid>,
    pub reference: String,
    pub note: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub fn check_amount(amount: i64) -> Result<(), RuleViolation> {
    if amount <= 0 {
        return Err(RuleViolation::invalid("amount must be positive"));
    }
    if amount > MAX_TRANSACTION_AMOUNT {
        return Err(RuleViolation::invalid(format!(
            "amount must not exceed {MAX_TRANSACTION_AMOUNT}"
        )));
    }
    Ok(())
}

pub fn normalize_currency(raw: Option<&str>) -> Result<String, RuleViolation> {
    let code = raw.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("USD");
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RuleViolation::invalid("currency must be a 3-letter code"));
    }
    Ok(code.to_ascii_uppercase())
}

impl Account {
    /// Balance after taking `amount` out, refusing overdrafts.
    pub fn debit(&self, amount: i64) -> Result<i64, RuleViolation> {
        check_amount(amount)?;
        if self.balance < amount {
            return Err(RuleViolation::unprocessable("insufficient funds"));
        }
        Ok(self.balance - amount)
    }

    pub fn credit(&self, amount: i64) -> Result<i64, RuleViolation> {
        check_amount(amount)?;
        self.balance
            .checked_add(amount)
            .ok_or_else(|| RuleViolation::unprocessable("balance limit exceeded"))
    }
}

/// Checks that money may move from `from` into `to`.
pub fn check_transfer(from: &Account, to: &Account, amount: i64) -> Result<(), RuleViolation> {
    if from.id == to.id {
        return Err(RuleViolation::invalid(
            "cannot transfer to the same account",
        ));
    }
    if from.currency != to.currency {
        return Err(RuleViolation::unprocessable(format!(
            "currency mismatch: {} to {}",
            from.currency, to.currency
        )));
    }
    from.debit(amount)?;
    to.credit(amount)?;
    Ok(())
}

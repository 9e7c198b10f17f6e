use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::ports::bank_repository::{BankRepository, Movement, MovementOutcome};
use crate::application::ports::counter_repository::CounterRepository;
use crate::domain::bank::account::{
    Account, AccountKind, Transaction, TransactionKind, check_amount, normalize_currency,
};
use crate::domain::sequence;

pub struct BankAccounts<'a, R, C>
where
    R: BankRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    pub repo: &'a R,
    pub counters: &'a C,
}

impl<'a, R, C> BankAccounts<'a, R, C>
where
    R: BankRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    pub async fn open(
        &self,
        owner_id: Uuid,
        kind: AccountKind,
        currency: Option<&str>,
    ) -> ServiceResult<Account> {
        let currency = normalize_currency(currency)?;
        let seq = self.counters.next_value(sequence::BANK_ACCOUNT).await?;
        let number = sequence::account_number(seq);
        let account = self
            .repo
            .create_account(owner_id, &number, kind, &currency)
            .await?;
        tracing::info!(account_id = %account.id, owner_id = %owner_id, number = %account.account_number, "account_opened");
        Ok(account)
    }

    pub async fn list(&self, owner_id: Uuid) -> ServiceResult<Vec<Account>> {
        Ok(self.repo.list_accounts(owner_id).await?)
    }

    /// Accounts of other users are reported as missing.
    pub async fn get_owned(&self, owner_id: Uuid, id: Uuid) -> ServiceResult<Account> {
        match self.repo.get_account(id).await? {
            Some(acc) if acc.owner_id == owner_id => Ok(acc),
            _ => Err(ServiceError::NotFound("account")),
        }
    }

    pub async fn deposit(
        &self,
        owner_id: Uuid,
        id: Uuid,
        amount: i64,
        note: Option<&str>,
    ) -> ServiceResult<Transaction> {
        let account = self.get_owned(owner_id, id).await?;
        account.credit(amount)?;
        self.apply(account.id, TransactionKind::Deposit, amount, note)
            .await
    }

    pub async fn withdraw(
        &self,
        owner_id: Uuid,
        id: Uuid,
        amount: i64,
        note: Option<&str>,
    ) -> ServiceResult<Transaction> {
        let account = self.get_owned(owner_id, id).await?;
        account.debit(amount)?;
        self.apply(account.id, TransactionKind::Withdrawal, amount, note)
            .await
    }

    async fn apply(
        &self,
        account_id: Uuid,
        kind: TransactionKind,
        amount: i64,
        note: Option<&str>,
    ) -> ServiceResult<Transaction> {
        check_amount(amount)?;
        let seq = self.counters.next_value(sequence::BANK_TRANSACTION).await?;
        let reference = sequence::transaction_reference(seq);
        let outcome = self
            .repo
            .apply_movement(Movement {
                account_id,
                kind,
                amount,
                reference: &reference,
                note,
            })
            .await?;
        match outcome {
            MovementOutcome::Applied(tx) => {
                tracing::info!(account_id = %account_id, kind = %kind, amount, reference = %tx.reference, "account_movement");
                Ok(tx)
            }
            // balance changed between the check and the write
            MovementOutcome::InsufficientFunds => {
                Err(ServiceError::unprocessable("insufficient funds"))
            }
        }
    }

    pub async fn transactions(
        &self,
        owner_id: Uuid,
        id: Uuid,
        page: PageRequest,
    ) -> ServiceResult<Paginated<Transaction>> {
        let account = self.get_owned(owner_id, id).await?;
        let (items, total) = self.repo.list_transactions(account.id, page).await?;
        Ok(Paginated::new(items, page, total))
    }
}

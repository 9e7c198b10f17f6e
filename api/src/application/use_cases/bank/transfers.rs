use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::bank_repository::{
    BankRepository, TransferOutcome, TransferRequest,
};
use crate::application::ports::counter_repository::CounterRepository;
use crate::domain::bank::account::{Transaction, check_transfer};
use crate::domain::sequence;

pub struct Transfer<'a, R, C>
where
    R: BankRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    pub repo: &'a R,
    pub counters: &'a C,
}

#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub from_account_id: Uuid,
    pub to_account_number: String,
    pub amount: i64,
    pub note: Option<String>,
}

impl<'a, R, C> Transfer<'a, R, C>
where
    R: BankRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    /// Returns the debit transaction recorded on the source account.
    pub async fn execute(&self, owner_id: Uuid, cmd: &TransferCommand) -> ServiceResult<Transaction> {
        let from = match self.repo.get_account(cmd.from_account_id).await? {
            Some(a) if a.owner_id == owner_id => a,
            _ => return Err(ServiceError::NotFound("source account")),
        };
        let to = self
            .repo
            .find_by_number(cmd.to_account_number.trim())
            .await?
            .ok_or(ServiceError::NotFound("destination account"))?;
        check_transfer(&from, &to, cmd.amount)?;

        let debit_ref =
            sequence::transaction_reference(self.counters.next_value(sequence::BANK_TRANSACTION).await?);
        let credit_ref =
            sequence::transaction_reference(self.counters.next_value(sequence::BANK_TRANSACTION).await?);
        let outcome = self
            .repo
            .transfer(TransferRequest {
                from_account_id: from.id,
                to_account_id: to.id,
                amount: cmd.amount,
                debit_reference: &debit_ref,
                credit_reference: &credit_ref,
                note: cmd.note.as_deref(),
            })
            .await?;
        match outcome {
            TransferOutcome::Completed { debit, credit } => {
                tracing::info!(
                    from = %from.id,
                    to = %to.id,
                    amount = cmd.amount,
                    debit = %debit.reference,
                    credit = %credit.reference,
                    "transfer_completed"
                );
                Ok(debit)
            }
            TransferOutcome::InsufficientFunds => {
                Err(ServiceError::unprocessable("insufficient funds"))
            }
        }
    }
}

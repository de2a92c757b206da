//! Business rule validation for journal lines.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use partida_shared::types::{AccountId, TenantId};

use super::error::ValidationError;
use super::fiscal::ensure_year_open;
use super::types::{EntryTotals, LineDraft};
use crate::chart::Account;
use crate::fiscal::FiscalYear;

/// Validates a set of journal lines and returns their totals.
///
/// Checks run line by line in this order: the account exists in the tenant,
/// is postable, is active; amounts are not negative, not both zero, not both
/// positive. The entry is then rejected when the totals differ by more than
/// `tolerance` or when it moves no money at all. The first violation wins.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate_lines(
    tenant_id: TenantId,
    lines: &[LineDraft],
    accounts: &HashMap<AccountId, Account>,
    tolerance: Decimal,
) -> Result<EntryTotals, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::NoLines);
    }

    let mut totals = EntryTotals::default();

    for (idx, draft) in lines.iter().enumerate() {
        let line = idx + 1;

        let account = accounts
            .get(&draft.account_id)
            .filter(|account| account.tenant_id == tenant_id)
            .ok_or(ValidationError::AccountNotFound {
                line,
                account_id: draft.account_id,
            })?;

        if !account.postable {
            return Err(ValidationError::AccountNotPostable {
                line,
                code: account.code.clone(),
            });
        }
        if !account.is_active {
            return Err(ValidationError::AccountInactive {
                line,
                code: account.code.clone(),
            });
        }

        if draft.debit < Decimal::ZERO || draft.credit < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount { line });
        }
        if draft.debit.is_zero() && draft.credit.is_zero() {
            return Err(ValidationError::EmptyLine { line });
        }
        if draft.debit > Decimal::ZERO && draft.credit > Decimal::ZERO {
            return Err(ValidationError::BothSides { line });
        }

        totals.add(draft.debit, draft.credit);
    }

    if !totals.is_balanced(tolerance) {
        return Err(ValidationError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }
    if totals.debit.is_zero() && totals.credit.is_zero() {
        return Err(ValidationError::ZeroEntry);
    }

    Ok(totals)
}

/// Validates lines and checks that `date` is not inside a closed fiscal year.
///
/// `fiscal_year` is the year covering `date`, if any.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate_entry(
    tenant_id: TenantId,
    date: NaiveDate,
    lines: &[LineDraft],
    accounts: &HashMap<AccountId, Account>,
    fiscal_year: Option<&FiscalYear>,
    tolerance: Decimal,
) -> Result<EntryTotals, ValidationError> {
    let totals = validate_lines(tenant_id, lines, accounts, tolerance)?;
    ensure_year_open(fiscal_year, date)?;
    Ok(totals)
}

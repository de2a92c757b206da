//! Report generation service.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use partida_shared::types::AccountId;
use partida_shared::types::money::split_net;

use super::error::ReportError;
use super::types::{
    AccountLedger, BalanceGeneralLine, BalanceGeneralReport, CodeRange, JournalListing,
    JournalListingEntry, JournalListingLine, LedgerMovement, LedgerReport, PostingRecord,
    TopLevelTotal, TrialBalanceReport, TrialBalanceRow, TrialBalanceTotals,
};
use crate::chart::{Account, AccountTree};
use crate::ledger::{EntryStatus, PostedEntry};

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Lists the active entries dated inside `[from, to]` with their lines.
    pub fn journal_listing(
        from: NaiveDate,
        to: NaiveDate,
        mut entries: Vec<PostedEntry>,
        accounts: &HashMap<AccountId, Account>,
    ) -> Result<JournalListing, ReportError> {
        Self::check_range(Some(from), to)?;

        entries.retain(|e| e.status == EntryStatus::Active && e.date >= from && e.date <= to);
        entries.sort_by_key(|e| (e.date, e.number));

        let mut listed = Vec::with_capacity(entries.len());
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;

        for entry in entries {
            let totals = entry.totals();
            let lines = entry
                .lines
                .into_iter()
                .map(|line| {
                    let account = accounts
                        .get(&line.account_id)
                        .ok_or(ReportError::AccountNotFound(line.account_id))?;
                    Ok(JournalListingLine {
                        item: line.item,
                        account_id: line.account_id,
                        account_code: account.code.clone(),
                        account_name: account.name.clone(),
                        debit: line.debit,
                        credit: line.credit,
                        note: line.note,
                    })
                })
                .collect::<Result<Vec<_>, ReportError>>()?;

            total_debit += totals.debit;
            total_credit += totals.credit;

            listed.push(JournalListingEntry {
                entry_id: entry.id,
                number: entry.number,
                date: entry.date,
                description: entry.description,
                is_opening: entry.is_opening,
                lines,
                total_debit: totals.debit,
                total_credit: totals.credit,
            });
        }

        Ok(JournalListing {
            from,
            to,
            entries: listed,
            total_debit,
            total_credit,
        })
    }

    /// Builds the ledger of every active postable account in `codes`.
    ///
    /// `postings` must cover everything up to `to`; postings before `from`
    /// only feed the opening balance. Accounts without movements inside the
    /// range are left out.
    pub fn ledger_by_account(
        from: NaiveDate,
        to: NaiveDate,
        codes: &CodeRange,
        accounts: &[Account],
        postings: &[PostingRecord],
    ) -> Result<LedgerReport, ReportError> {
        Self::check_range(Some(from), to)?;

        let mut by_account: HashMap<AccountId, Vec<&PostingRecord>> = HashMap::new();
        for posting in postings.iter().filter(|p| p.date <= to) {
            by_account.entry(posting.account_id).or_default().push(posting);
        }

        let mut selected: Vec<&Account> = accounts
            .iter()
            .filter(|a| a.postable && a.is_active && codes.contains(&a.code))
            .collect();
        selected.sort_by(|a, b| a.code.cmp(&b.code));

        let mut ledgers = Vec::new();
        for account in selected {
            let Some(mut postings) = by_account.remove(&account.id) else {
                continue;
            };
            postings.sort_by_key(|p| (p.date, p.entry_number, p.item));

            let opening_balance: Decimal = postings
                .iter()
                .filter(|p| p.date < from)
                .map(|p| p.signed_amount())
                .sum();

            let mut balance = opening_balance;
            let mut total_debit = Decimal::ZERO;
            let mut total_credit = Decimal::ZERO;
            let movements: Vec<LedgerMovement> = postings
                .iter()
                .filter(|p| p.date >= from)
                .map(|p| {
                    balance += p.signed_amount();
                    total_debit += p.debit;
                    total_credit += p.credit;
                    LedgerMovement {
                        date: p.date,
                        entry_number: p.entry_number,
                        item: p.item,
                        description: p.description().map(str::to_string),
                        debit: p.debit,
                        credit: p.credit,
                        balance,
                    }
                })
                .collect();

            if movements.is_empty() {
                continue;
            }

            ledgers.push(AccountLedger {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                opening_balance,
                movements,
                total_debit,
                total_credit,
                closing_balance: balance,
            });
        }

        Ok(LedgerReport {
            from,
            to,
            accounts: ledgers,
        })
    }

    /// Builds the trial balance of active postable accounts.
    ///
    /// Accounts without any posting in the range are excluded unless
    /// `include_empty` is set.
    pub fn trial_balance(
        from: Option<NaiveDate>,
        to: NaiveDate,
        accounts: &[Account],
        postings: &[PostingRecord],
        include_empty: bool,
    ) -> Result<TrialBalanceReport, ReportError> {
        Self::check_range(from, to)?;

        let sums = Self::sum_by_account(from, to, postings);

        let mut selected: Vec<&Account> = accounts
            .iter()
            .filter(|a| a.postable && a.is_active)
            .collect();
        selected.sort_by(|a, b| a.code.cmp(&b.code));

        let mut rows = Vec::new();
        for account in selected {
            let (total_debit, total_credit) = match sums.get(&account.id) {
                Some(totals) => *totals,
                None if include_empty => (Decimal::ZERO, Decimal::ZERO),
                None => continue,
            };
            let (debit_balance, credit_balance) = split_net(total_debit - total_credit);
            rows.push(TrialBalanceRow {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                total_debit,
                total_credit,
                debit_balance,
                credit_balance,
            });
        }

        let total_debit: Decimal = rows.iter().map(|r| r.total_debit).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.total_credit).sum();
        let totals = TrialBalanceTotals {
            total_debit,
            total_credit,
            debit_balance: rows.iter().map(|r| r.debit_balance).sum(),
            credit_balance: rows.iter().map(|r| r.credit_balance).sum(),
            is_balanced: total_debit == total_credit,
        };

        Ok(TrialBalanceReport {
            from,
            to,
            rows,
            totals,
        })
    }

    /// Builds the hierarchical balance.
    ///
    /// Postable accounts report their own net; every other account reports
    /// the sum of its postable descendants. Zero balances below level 1 are
    /// omitted and each level-1 account is repeated as a top-level total.
    pub fn balance_general(
        from: Option<NaiveDate>,
        to: NaiveDate,
        tree: &AccountTree,
        postings: &[PostingRecord],
    ) -> Result<BalanceGeneralReport, ReportError> {
        Self::check_range(from, to)?;

        let own: HashMap<AccountId, Decimal> = Self::sum_by_account(from, to, postings)
            .into_iter()
            .map(|(id, (debit, credit))| (id, debit - credit))
            .collect();
        let rolled = tree.rollup(&own);

        let mut lines = Vec::new();
        let mut top_level = Vec::new();
        for account in tree.iter() {
            let balance = rolled.get(&account.id).copied().unwrap_or_default();
            if account.level <= 1 {
                top_level.push(TopLevelTotal {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    balance,
                });
            } else if balance.is_zero() {
                continue;
            }
            lines.push(BalanceGeneralLine {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                level: account.level,
                postable: account.postable,
                balance_side: account.balance_side,
                balance,
            });
        }

        Ok(BalanceGeneralReport {
            from,
            to,
            lines,
            top_level,
        })
    }

    fn check_range(from: Option<NaiveDate>, to: NaiveDate) -> Result<(), ReportError> {
        match from {
            Some(start) if start > to => Err(ReportError::InvalidDateRange { start, end: to }),
            _ => Ok(()),
        }
    }

    /// Debit and credit totals per account for postings inside the range.
    fn sum_by_account(
        from: Option<NaiveDate>,
        to: NaiveDate,
        postings: &[PostingRecord],
    ) -> BTreeMap<AccountId, (Decimal, Decimal)> {
        let mut sums: BTreeMap<AccountId, (Decimal, Decimal)> = BTreeMap::new();
        for posting in postings
            .iter()
            .filter(|p| p.date <= to && from.is_none_or(|start| p.date >= start))
        {
            let totals = sums.entry(posting.account_id).or_default();
            totals.0 += posting.debit;
            totals.1 += posting.credit;
        }
        sums
    }
}

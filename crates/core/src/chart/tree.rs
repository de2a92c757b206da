//! Materialised account hierarchy.

use std::collections::HashMap;

use rust_decimal::Decimal;
use partida_shared::types::AccountId;

use super::account::Account;

/// Chart of accounts arranged as a tree.
///
/// The parent of an account is the account with the longest code that can
/// parent it (strict code prefix on a lower level). Ancestors follow the
/// parent chain, so an account rolls up into exactly one top-level account
/// even when codes such as "1" and "10" share leading digits.
#[derive(Debug, Clone, Default)]
pub struct AccountTree {
    accounts: Vec<Account>,
    by_id: HashMap<AccountId, usize>,
    by_code: HashMap<String, usize>,
    /// Ancestor indices per account, outermost first.
    ancestors: Vec<Vec<usize>>,
}

impl AccountTree {
    /// Builds the tree. Accounts are kept in code order.
    #[must_use]
    pub fn new(mut accounts: Vec<Account>) -> Self {
        accounts.sort_by(|a, b| a.code.cmp(&b.code));

        let by_id = accounts
            .iter()
            .enumerate()
            .map(|(idx, account)| (account.id, idx))
            .collect();
        let by_code: HashMap<String, usize> = accounts
            .iter()
            .enumerate()
            .map(|(idx, account)| (account.code.clone(), idx))
            .collect();

        // A prefix sorts before the codes it prefixes, so parents are
        // resolved before their children.
        let mut ancestors: Vec<Vec<usize>> = Vec::with_capacity(accounts.len());
        for account in &accounts {
            let parent = account
                .code
                .char_indices()
                .rev()
                .filter(|&(pos, _)| pos > 0)
                .filter_map(|(pos, _)| by_code.get(&account.code[..pos]).copied())
                .find(|&idx| accounts[idx].can_parent(account));
            let chain = match parent {
                Some(parent) => {
                    let mut chain = ancestors[parent].clone();
                    chain.push(parent);
                    chain
                }
                None => Vec::new(),
            };
            ancestors.push(chain);
        }

        Self {
            accounts,
            by_id,
            by_code,
            ancestors,
        }
    }

    /// Number of accounts in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the tree holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterates over all accounts in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// Looks up an account by ID.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.by_id.get(&id).map(|&idx| &self.accounts[idx])
    }

    /// Looks up an account by code.
    #[must_use]
    pub fn get_by_code(&self, code: &str) -> Option<&Account> {
        self.by_code.get(code).map(|&idx| &self.accounts[idx])
    }

    /// Returns the nearest ancestor of an account.
    #[must_use]
    pub fn parent(&self, id: AccountId) -> Option<&Account> {
        let idx = *self.by_id.get(&id)?;
        self.ancestors[idx].last().map(|&p| &self.accounts[p])
    }

    /// Returns all ancestors of an account, outermost first.
    #[must_use]
    pub fn ancestors(&self, id: AccountId) -> Vec<&Account> {
        self.by_id
            .get(&id)
            .map(|&idx| self.ancestors[idx].iter().map(|&a| &self.accounts[a]).collect())
            .unwrap_or_default()
    }

    /// Returns true if `descendant` sits below `ancestor` on the parent chain.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: AccountId, descendant: AccountId) -> bool {
        match (self.by_id.get(&ancestor), self.by_id.get(&descendant)) {
            (Some(a), Some(d)) => self.ancestors[*d].contains(a),
            _ => false,
        }
    }

    /// Returns the accounts whose nearest ancestor is `id`.
    #[must_use]
    pub fn children(&self, id: AccountId) -> Vec<&Account> {
        let Some(&parent) = self.by_id.get(&id) else {
            return Vec::new();
        };
        self.accounts
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.ancestors[*idx].last() == Some(&parent))
            .map(|(_, account)| account)
            .collect()
    }

    /// Returns the postable descendants of an account.
    #[must_use]
    pub fn postable_descendants(&self, id: AccountId) -> Vec<&Account> {
        let Some(&root) = self.by_id.get(&id) else {
            return Vec::new();
        };
        self.accounts
            .iter()
            .enumerate()
            .filter(|(idx, account)| account.postable && self.ancestors[*idx].contains(&root))
            .map(|(_, account)| account)
            .collect()
    }

    /// Rolls postable balances up the hierarchy.
    ///
    /// Every account of the tree appears in the result. Postable accounts
    /// keep their own balance (zero when absent from `balances`); each
    /// non-postable account gets the sum of its postable descendants.
    /// Balances given for non-postable accounts are ignored.
    #[must_use]
    pub fn rollup(&self, balances: &HashMap<AccountId, Decimal>) -> HashMap<AccountId, Decimal> {
        let mut totals: HashMap<AccountId, Decimal> = self
            .accounts
            .iter()
            .map(|account| (account.id, Decimal::ZERO))
            .collect();

        for (idx, account) in self.accounts.iter().enumerate() {
            if !account.postable {
                continue;
            }
            let balance = balances.get(&account.id).copied().unwrap_or_default();
            if let Some(total) = totals.get_mut(&account.id) {
                *total += balance;
            }
            for &ancestor in &self.ancestors[idx] {
                let ancestor = &self.accounts[ancestor];
                if ancestor.postable {
                    continue;
                }
                if let Some(total) = totals.get_mut(&ancestor.id) {
                    *total += balance;
                }
            }
        }

        totals
    }
}

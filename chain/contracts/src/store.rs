//! Account storage seam between the protocol core and the ledger
//!
//! The core never owns ledger state. It reads and writes accounts through
//! `AccountStore`, and every transition runs inside a `WorkingSet`: a staged
//! overlay whose writes reach the underlying store only on `commit`. Dropping
//! a working set discards everything it staged, which is how a failed
//! instruction leaves no partial effect. Working sets nest, so a multi-leg
//! transfer can be all-or-nothing inside an instruction that is itself
//! all-or-nothing.

use std::collections::BTreeMap;
use themis_types::account::{Account, AccountData};
use themis_types::address::Address;

use crate::errors::ReserveError;

/// Read/write access to accounts by address
pub trait AccountStore {
    /// Get the account at `address`, if any.
    fn get(&self, address: &Address) -> Option<&Account>;

    /// Get a mutable handle to the account at `address`, if any.
    fn get_mut(&mut self, address: &Address) -> Option<&mut Account>;

    /// Create or replace the account at `address`.
    fn insert(&mut self, address: Address, account: Account);

    /// Delete the account at `address`, returning it.
    fn remove(&mut self, address: &Address) -> Option<Account>;

    fn contains(&self, address: &Address) -> bool {
        self.get(address).is_some()
    }
}

impl AccountStore for BTreeMap<Address, Account> {
    fn get(&self, address: &Address) -> Option<&Account> {
        BTreeMap::get(self, address)
    }

    fn get_mut(&mut self, address: &Address) -> Option<&mut Account> {
        BTreeMap::get_mut(self, address)
    }

    fn insert(&mut self, address: Address, account: Account) {
        BTreeMap::insert(self, address, account);
    }

    fn remove(&mut self, address: &Address) -> Option<Account> {
        BTreeMap::remove(self, address)
    }
}

/// Staged overlay over another store
///
/// `staged` maps an address to its pending value: `Some` for a write, `None`
/// for a deletion. Addresses absent from `staged` read through to the base.
#[derive(Debug)]
pub struct WorkingSet<'a, S: AccountStore> {
    base: &'a mut S,
    staged: BTreeMap<Address, Option<Account>>,
}

impl<'a, S: AccountStore> WorkingSet<'a, S> {
    /// Open a working set over `base`.
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            staged: BTreeMap::new(),
        }
    }

    /// Number of addresses with pending changes
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    /// Apply every staged change to the base store.
    pub fn commit(self) {
        let WorkingSet { base, staged } = self;
        for (address, slot) in staged {
            match slot {
                Some(account) => base.insert(address, account),
                None => {
                    base.remove(&address);
                }
            }
        }
    }
}

impl<'a, S: AccountStore> AccountStore for WorkingSet<'a, S> {
    fn get(&self, address: &Address) -> Option<&Account> {
        match self.staged.get(address) {
            Some(slot) => slot.as_ref(),
            None => self.base.get(address),
        }
    }

    fn get_mut(&mut self, address: &Address) -> Option<&mut Account> {
        if !self.staged.contains_key(address) {
            let current = self.base.get(address)?.clone();
            self.staged.insert(*address, Some(current));
        }
        self.staged.get_mut(address).and_then(Option::as_mut)
    }

    fn insert(&mut self, address: Address, account: Account) {
        self.staged.insert(address, Some(account));
    }

    fn remove(&mut self, address: &Address) -> Option<Account> {
        let previous = match self.staged.remove(address) {
            Some(slot) => slot,
            None => self.base.get(address).cloned(),
        };
        self.staged.insert(*address, None);
        previous
    }
}

// ───────────────────────── Native reserve moves ─────────────────────────

/// Debit `amount` native units from the account at `address`.
pub fn debit_reserve<S: AccountStore>(
    store: &mut S,
    address: &Address,
    amount: u64,
) -> Result<(), ReserveError> {
    let account = store
        .get_mut(address)
        .ok_or(ReserveError::InsufficientReserve {
            account: *address,
            required: amount,
            available: 0,
        })?;

    if account.reserve < amount {
        return Err(ReserveError::InsufficientReserve {
            account: *address,
            required: amount,
            available: account.reserve,
        });
    }

    account.reserve -= amount;
    Ok(())
}

/// Credit `amount` native units, creating a wallet account if none exists.
pub fn credit_reserve<S: AccountStore>(
    store: &mut S,
    address: &Address,
    amount: u64,
) -> Result<(), ReserveError> {
    match store.get_mut(address) {
        Some(account) => {
            account.reserve = account
                .reserve
                .checked_add(amount)
                .ok_or(ReserveError::Overflow { account: *address })?;
        }
        None => store.insert(*address, Account::wallet(amount)),
    }
    Ok(())
}

/// True when `address` holds a plain wallet (or nothing at all).
pub fn is_wallet_or_empty<S: AccountStore>(store: &S, address: &Address) -> bool {
    store
        .get(address)
        .map_or(true, |account| matches!(account.data, AccountData::Wallet))
}

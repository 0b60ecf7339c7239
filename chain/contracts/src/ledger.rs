//! In-memory reference ledger
//!
//! Owns the account map and plays the external collaborator of the protocol
//! core:
//! - verifies every transaction signature before execution
//! - runs the instruction through `OfferStateMachine` (all or nothing)
//! - stamps successful transactions with a slot, a time and a `TxId`
//! - answers read-only queries and provisions participants for tests
//!
//! `submit` takes `&mut self`, so instructions on one ledger are serialized.
//! Embedders that share a ledger between threads wrap it in a mutex.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use themis_types::account::{Account, AccountData, HoldingAccount, Mint};
use themis_types::address::Address;
use themis_types::amount::validate_decimals;
use themis_types::ids::{OfferId, TxId};
use themis_types::offer::Offer;
use tracing::{info, warn};

use crate::config::EscrowConfig;
use crate::errors::{CustodyError, EscrowError, LedgerError};
use crate::events::EscrowEvent;
use crate::instruction::Transaction;
use crate::processor::OfferStateMachine;
use crate::store::{credit_reserve, debit_reserve, AccountStore, WorkingSet};

/// Record of one committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_id: TxId,
    /// Sequence number of the transaction on this ledger
    pub slot: u64,
    /// Execution time (unix millis)
    pub executed_at: i64,
    pub event: EscrowEvent,
}

/// Single-process ledger holding every account in memory
#[derive(Debug)]
pub struct InMemoryLedger {
    accounts: BTreeMap<Address, Account>,
    machine: OfferStateMachine,
    slot: u64,
    receipts: Vec<Receipt>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    /// Create a ledger with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EscrowConfig::default())
    }

    pub fn with_config(config: EscrowConfig) -> Self {
        Self {
            accounts: BTreeMap::new(),
            machine: OfferStateMachine::new(config),
            slot: 0,
            receipts: Vec::new(),
        }
    }

    pub fn config(&self) -> &EscrowConfig {
        self.machine.config()
    }

    // ───────────────────────── Execution ─────────────────────────

    /// Verify and execute a signed transaction.
    ///
    /// On failure the ledger is left exactly as it was.
    pub fn submit(&mut self, tx: &Transaction) -> Result<Receipt, EscrowError> {
        let name = tx.instruction.name();
        let (maker, offer_id) = tx.instruction.offer_key();

        let signers = tx.verify_signers().map_err(|e| {
            warn!(instruction = name, error = %e, "Transaction signature rejected");
            e
        })?;

        let executed_at = Utc::now().timestamp_millis();
        let event = self
            .machine
            .process(&mut self.accounts, &signers, &tx.instruction, executed_at)
            .map_err(|e| {
                warn!(
                    instruction = name,
                    maker = %maker.short(),
                    offer_id = %offer_id,
                    kind = ?e.kind(),
                    error = %e,
                    "Transaction rejected"
                );
                e
            })?;

        self.slot += 1;
        let receipt = Receipt {
            tx_id: TxId::new(),
            slot: self.slot,
            executed_at,
            event,
        };
        info!(
            instruction = name,
            tx_id = %receipt.tx_id,
            slot = receipt.slot,
            "Transaction committed"
        );
        self.receipts.push(receipt.clone());
        Ok(receipt)
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Offer record for `(maker, offer_id)`.
    pub fn offer(&self, maker: &Address, offer_id: OfferId) -> Result<Offer, EscrowError> {
        Ok(self.machine.registry().read(&self.accounts, maker, offer_id)?)
    }

    /// Vault of the open offer `(maker, offer_id)`.
    pub fn vault(&self, maker: &Address, offer_id: OfferId) -> Result<HoldingAccount, EscrowError> {
        let offer = self.offer(maker, offer_id)?;
        self.accounts
            .get(&offer.vault_address)
            .and_then(|account| account.as_holding())
            .cloned()
            .ok_or_else(|| {
                CustodyError::VaultNotFound {
                    address: offer.vault_address,
                }
                .into()
            })
    }

    /// Associated holding address of `(owner, mint)`.
    pub fn holding_address(&self, owner: &Address, mint: &Address) -> Result<Address, EscrowError> {
        Ok(self.machine.deriver().associated_holding(owner, mint)?)
    }

    /// Balance of `owner`'s associated holding account for `mint`, if it exists.
    pub fn balance(&self, owner: &Address, mint: &Address) -> Option<u64> {
        let address = self.holding_address(owner, mint).ok()?;
        self.accounts
            .get(&address)
            .and_then(|account| account.as_holding())
            .map(|holding| holding.amount)
    }

    /// Native units held at `address` (zero when absent).
    pub fn reserve(&self, address: &Address) -> u64 {
        self.accounts.get(address).map_or(0, |account| account.reserve)
    }

    /// Sum of native units across every account.
    pub fn total_reserve(&self) -> u128 {
        self.accounts
            .values()
            .map(|account| u128::from(account.reserve))
            .sum()
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Take every receipt recorded so far.
    pub fn drain_receipts(&mut self) -> Vec<Receipt> {
        std::mem::take(&mut self.receipts)
    }

    // ───────────────────────── Provisioning ─────────────────────────

    /// Credit native units to `address`, creating a wallet if needed.
    pub fn fund(&mut self, address: &Address, amount: u64) -> Result<(), EscrowError> {
        credit_reserve(&mut self.accounts, address, amount)?;
        Ok(())
    }

    /// Create a new mint and return its address.
    pub fn create_mint(&mut self, authority: &Address, decimals: u8) -> Result<Address, EscrowError> {
        validate_decimals(decimals).map_err(|_| LedgerError::InvalidDecimals { decimals })?;
        let address = Address::new_unique();
        if self.accounts.contains_key(&address) {
            return Err(LedgerError::AccountExists { address }.into());
        }
        self.accounts.insert(
            address,
            Account {
                reserve: 0,
                data: AccountData::Mint(Mint {
                    authority: *authority,
                    decimals,
                    supply: 0,
                }),
            },
        );
        info!(mint = %address.short(), decimals, "Mint created");
        Ok(address)
    }

    /// Open `owner`'s associated holding account for `mint`, charging the
    /// holding reservation to `owner`.
    pub fn create_holding_account(&mut self, owner: &Address, mint: &Address) -> Result<Address, EscrowError> {
        let address = self.holding_address(owner, mint)?;
        let reserve = self.config().holding_reserve;

        let mut scope = WorkingSet::new(&mut self.accounts);
        if scope.get(mint).and_then(|account| account.as_mint()).is_none() {
            return Err(EscrowError::MintNotFound { mint: *mint });
        }
        if scope.contains(&address) {
            return Err(LedgerError::AccountExists { address }.into());
        }
        debit_reserve(&mut scope, owner, reserve)?;
        scope.insert(
            address,
            Account {
                reserve,
                data: AccountData::Holding(HoldingAccount::new(*mint, *owner)),
            },
        );
        scope.commit();
        Ok(address)
    }

    /// Issue `amount` of `mint` into `owner`'s associated holding account.
    pub fn mint_to(&mut self, mint: &Address, owner: &Address, amount: u64) -> Result<(), EscrowError> {
        let address = self.holding_address(owner, mint)?;

        let mut scope = WorkingSet::new(&mut self.accounts);
        let issuer = scope
            .get_mut(mint)
            .and_then(|account| account.as_mint_mut())
            .ok_or(EscrowError::MintNotFound { mint: *mint })?;
        issuer.supply = issuer
            .supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { address: *mint })?;

        let account = scope
            .get_mut(&address)
            .ok_or(LedgerError::AccountNotFound { address })?;
        let actual = account.kind();
        let holding = account
            .as_holding_mut()
            .ok_or(LedgerError::WrongAccountKind {
                address,
                expected: "holding",
                actual,
            })?;
        holding.amount = holding
            .amount
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { address })?;
        scope.commit();
        Ok(())
    }
}

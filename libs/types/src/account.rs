//! Ledger account variants
//!
//! Each address on the ledger holds at most one `Account`. The `reserve` is
//! the account's native-unit balance: spendable funds for a wallet, or the
//! existence reservation paid when a program-created account was opened.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::offer::Offer;

/// Asset type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub authority: Address,
    pub decimals: u8,
    pub supply: u64,
}

/// Balance of one asset held on behalf of one owner
///
/// The owner is either a participant key or a program-derived authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingAccount {
    pub mint: Address,
    pub owner: Address,
    pub amount: u64,
}

impl HoldingAccount {
    /// Create an empty holding account
    pub fn new(mint: Address, owner: Address) -> Self {
        Self {
            mint,
            owner,
            amount: 0,
        }
    }
}

/// Typed payload of a ledger account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AccountData {
    /// Participant identity holding only native units
    Wallet,
    Mint(Mint),
    Holding(HoldingAccount),
    Offer(Offer),
}

/// A ledger account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub reserve: u64,
    pub data: AccountData,
}

impl Account {
    /// Create a wallet account with the given native balance
    pub fn wallet(reserve: u64) -> Self {
        Self {
            reserve,
            data: AccountData::Wallet,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.data {
            AccountData::Wallet => "wallet",
            AccountData::Mint(_) => "mint",
            AccountData::Holding(_) => "holding",
            AccountData::Offer(_) => "offer",
        }
    }

    pub fn as_mint(&self) -> Option<&Mint> {
        match &self.data {
            AccountData::Mint(mint) => Some(mint),
            _ => None,
        }
    }

    pub fn as_mint_mut(&mut self) -> Option<&mut Mint> {
        match &mut self.data {
            AccountData::Mint(mint) => Some(mint),
            _ => None,
        }
    }

    pub fn as_holding(&self) -> Option<&HoldingAccount> {
        match &self.data {
            AccountData::Holding(holding) => Some(holding),
            _ => None,
        }
    }

    pub fn as_holding_mut(&mut self) -> Option<&mut HoldingAccount> {
        match &mut self.data {
            AccountData::Holding(holding) => Some(holding),
            _ => None,
        }
    }

    pub fn as_offer(&self) -> Option<&Offer> {
        match &self.data {
            AccountData::Offer(offer) => Some(offer),
            _ => None,
        }
    }
}

//! Vault custody
//!
//! A vault is a holding account at a derived address whose owner is the
//! vault's own authority, so no key-backed identity can move its funds.
//! Custody enforces:
//! - a vault is only opened on a vacant address (fail-closed on collision)
//! - funds leave only against the matching `VaultAuthority`
//! - a release moves the whole balance and closes the vault in one step,
//!   returning its reservation

use themis_types::account::{Account, AccountData, HoldingAccount};
use themis_types::address::Address;
use tracing::debug;

use crate::derivation::VaultAuthority;
use crate::errors::CustodyError;
use crate::security::SignerSet;
use crate::store::{credit_reserve, debit_reserve, AccountStore, WorkingSet};
use crate::transfer::{AssetTransferEngine, Leg};

/// Parameters of a closing release
#[derive(Debug)]
pub struct Release<'a> {
    /// Proof of authority over the vault
    pub authority: &'a VaultAuthority,
    /// Holding account receiving the vault balance
    pub destination: Address,
    /// Exact amount to move; must equal the vault balance
    pub amount: u64,
    /// Receives the vault's reservation when it closes
    pub reserve_recipient: Address,
    /// Legs executed atomically with the vault leg
    pub counter_legs: Vec<Leg<'a>>,
}

/// Custodian of derived vaults
#[derive(Debug, Clone, Copy)]
pub struct VaultCustody {
    /// Reservation charged per vault
    reserve: u64,
    engine: AssetTransferEngine,
}

impl VaultCustody {
    pub fn new(reserve: u64) -> Self {
        Self {
            reserve,
            engine: AssetTransferEngine::new(),
        }
    }

    // ───────────────────────── Open ─────────────────────────

    /// Open an empty vault for `mint` at the authority's address, charging
    /// the reservation to `payer`.
    pub fn open<S: AccountStore>(
        &self,
        store: &mut S,
        authority: &VaultAuthority,
        mint: &Address,
        payer: &Address,
    ) -> Result<Address, CustodyError> {
        let address = authority.address();
        if store.contains(&address) {
            return Err(CustodyError::AlreadyExists { address });
        }
        if store.get(mint).and_then(|account| account.as_mint()).is_none() {
            return Err(CustodyError::MintNotFound { mint: *mint });
        }

        debit_reserve(store, payer, self.reserve)?;
        store.insert(
            address,
            Account {
                reserve: self.reserve,
                data: AccountData::Holding(HoldingAccount::new(*mint, address)),
            },
        );

        debug!(vault = %address.short(), mint = %mint.short(), "Vault opened");
        Ok(address)
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Current balance of the vault at `address`.
    pub fn balance<S: AccountStore>(&self, store: &S, address: &Address) -> Result<u64, CustodyError> {
        store
            .get(address)
            .and_then(|account| account.as_holding())
            .map(|holding| holding.amount)
            .ok_or(CustodyError::VaultNotFound { address: *address })
    }

    // ───────────────────────── Release ─────────────────────────

    /// Move the whole vault balance to `release.destination` together with
    /// the counter legs, then close the vault.
    ///
    /// Returns the reservation credited to `release.reserve_recipient`.
    pub fn release<S: AccountStore>(
        &self,
        store: &mut S,
        signers: &SignerSet,
        release: Release<'_>,
    ) -> Result<u64, CustodyError> {
        let Release {
            authority,
            destination,
            amount,
            reserve_recipient,
            mut counter_legs,
        } = release;
        let address = authority.address();

        let vault = store
            .get(&address)
            .and_then(|account| account.as_holding())
            .ok_or(CustodyError::VaultNotFound { address })?;
        if vault.owner != address || authority.verify().is_err() {
            return Err(CustodyError::AuthorityMismatch { address });
        }
        if amount > vault.amount {
            return Err(CustodyError::InsufficientFunds {
                required: amount,
                available: vault.amount,
            });
        }
        if amount < vault.amount {
            return Err(CustodyError::VaultNotEmpty {
                address,
                remaining: vault.amount - amount,
            });
        }
        let mint = vault.mint;
        let decimals = store
            .get(&mint)
            .and_then(|account| account.as_mint())
            .map(|m| m.decimals)
            .ok_or(CustodyError::MintNotFound { mint })?;

        let mut scope = WorkingSet::new(store);
        counter_legs.push(Leg::from_vault(authority, destination, mint, amount, decimals));
        self.engine.execute(&mut scope, signers, &counter_legs)?;

        let closed = scope
            .remove(&address)
            .ok_or(CustodyError::VaultNotFound { address })?;
        credit_reserve(&mut scope, &reserve_recipient, closed.reserve)?;
        scope.commit();

        debug!(
            vault = %address.short(),
            destination = %destination.short(),
            amount,
            "Vault released and closed"
        );
        Ok(closed.reserve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::{AddressDeriver, VAULT_NAMESPACE};
    use crate::errors::ReserveError;
    use std::collections::BTreeMap;
    use themis_types::account::Mint;
    use themis_types::ids::OfferId;

    const RESERVE: u64 = 2_000;

    struct Fixture {
        store: BTreeMap<Address, Account>,
        maker: Address,
        mint: Address,
        authority: VaultAuthority,
    }

    fn fixture() -> Fixture {
        let maker = Address::new_unique();
        let mint = Address::new_unique();
        let mut store = BTreeMap::new();
        store.insert(maker, Account::wallet(10_000));
        store.insert(
            mint,
            Account {
                reserve: 0,
                data: AccountData::Mint(Mint {
                    authority: Address::new_unique(),
                    decimals: 6,
                    supply: 0,
                }),
            },
        );
        let (_, authority) = AddressDeriver::new(Address::new([7; 32]))
            .derive(VAULT_NAMESPACE, &maker, OfferId::new(1))
            .unwrap();
        Fixture {
            store,
            maker,
            mint,
            authority,
        }
    }

    fn fund_vault(fx: &mut Fixture, amount: u64) {
        let address = fx.authority.address();
        fx.store
            .get_mut(&address)
            .and_then(|account| account.as_holding_mut())
            .unwrap()
            .amount = amount;
    }

    fn maker_holding(fx: &mut Fixture) -> Address {
        let address = Address::new_unique();
        fx.store.insert(
            address,
            Account {
                reserve: 0,
                data: AccountData::Holding(HoldingAccount::new(fx.mint, fx.maker)),
            },
        );
        address
    }

    #[test]
    fn test_open_creates_empty_vault() {
        let mut fx = fixture();
        let custody = VaultCustody::new(RESERVE);
        let address = custody.open(&mut fx.store, &fx.authority, &fx.mint, &fx.maker).unwrap();

        let holding = fx.store[&address].as_holding().unwrap();
        assert_eq!(holding.owner, address);
        assert_eq!(holding.amount, 0);
        assert_eq!(fx.store[&fx.maker].reserve, 10_000 - RESERVE);
    }

    #[test]
    fn test_open_occupied_address_fails_closed() {
        let mut fx = fixture();
        let custody = VaultCustody::new(RESERVE);
        fx.store.insert(fx.authority.address(), Account::wallet(1));
        let result = custody.open(&mut fx.store, &fx.authority, &fx.mint, &fx.maker);
        assert_eq!(
            result,
            Err(CustodyError::AlreadyExists {
                address: fx.authority.address()
            })
        );
        assert_eq!(fx.store[&fx.maker].reserve, 10_000);
    }

    #[test]
    fn test_open_unknown_mint() {
        let mut fx = fixture();
        let unknown = Address::new_unique();
        let result = VaultCustody::new(RESERVE).open(&mut fx.store, &fx.authority, &unknown, &fx.maker);
        assert_eq!(result, Err(CustodyError::MintNotFound { mint: unknown }));
    }

    #[test]
    fn test_open_payer_without_reserve() {
        let mut fx = fixture();
        fx.store.insert(fx.maker, Account::wallet(1));
        let result = VaultCustody::new(RESERVE).open(&mut fx.store, &fx.authority, &fx.mint, &fx.maker);
        assert!(matches!(
            result,
            Err(CustodyError::Reserve(ReserveError::InsufficientReserve { .. }))
        ));
    }

    #[test]
    fn test_release_closes_vault_and_returns_reserve() {
        let mut fx = fixture();
        let custody = VaultCustody::new(RESERVE);
        custody.open(&mut fx.store, &fx.authority, &fx.mint, &fx.maker).unwrap();
        fund_vault(&mut fx, 500);
        let destination = maker_holding(&mut fx);

        let returned = custody
            .release(
                &mut fx.store,
                &SignerSet::default(),
                Release {
                    authority: &fx.authority,
                    destination,
                    amount: 500,
                    reserve_recipient: fx.maker,
                    counter_legs: Vec::new(),
                },
            )
            .unwrap();

        assert_eq!(returned, RESERVE);
        assert!(!fx.store.contains_key(&fx.authority.address()));
        assert_eq!(fx.store[&destination].as_holding().unwrap().amount, 500);
        assert_eq!(fx.store[&fx.maker].reserve, 10_000);
    }

    #[test]
    fn test_partial_release_rejected() {
        let mut fx = fixture();
        let custody = VaultCustody::new(RESERVE);
        custody.open(&mut fx.store, &fx.authority, &fx.mint, &fx.maker).unwrap();
        fund_vault(&mut fx, 500);
        let destination = maker_holding(&mut fx);

        let result = custody.release(
            &mut fx.store,
            &SignerSet::default(),
            Release {
                authority: &fx.authority,
                destination,
                amount: 200,
                reserve_recipient: fx.maker,
                counter_legs: Vec::new(),
            },
        );
        assert!(matches!(result, Err(CustodyError::VaultNotEmpty { remaining: 300, .. })));

        let result = custody.release(
            &mut fx.store,
            &SignerSet::default(),
            Release {
                authority: &fx.authority,
                destination,
                amount: 501,
                reserve_recipient: fx.maker,
                counter_legs: Vec::new(),
            },
        );
        assert_eq!(
            result,
            Err(CustodyError::InsufficientFunds {
                required: 501,
                available: 500
            })
        );
        assert_eq!(custody.balance(&fx.store, &fx.authority.address()), Ok(500));
    }

    #[test]
    fn test_release_with_foreign_authority() {
        let mut fx = fixture();
        let custody = VaultCustody::new(RESERVE);
        custody.open(&mut fx.store, &fx.authority, &fx.mint, &fx.maker).unwrap();
        fund_vault(&mut fx, 500);
        let destination = maker_holding(&mut fx);

        // Vault whose recorded owner is not the derived authority
        let address = fx.authority.address();
        fx.store
            .get_mut(&address)
            .and_then(|account| account.as_holding_mut())
            .unwrap()
            .owner = fx.maker;

        let result = custody.release(
            &mut fx.store,
            &SignerSet::default(),
            Release {
                authority: &fx.authority,
                destination,
                amount: 500,
                reserve_recipient: fx.maker,
                counter_legs: Vec::new(),
            },
        );
        assert_eq!(result, Err(CustodyError::AuthorityMismatch { address }));
    }

    #[test]
    fn test_release_missing_vault() {
        let mut fx = fixture();
        let destination = maker_holding(&mut fx);
        let result = VaultCustody::new(RESERVE).release(
            &mut fx.store,
            &SignerSet::default(),
            Release {
                authority: &fx.authority,
                destination,
                amount: 1,
                reserve_recipient: fx.maker,
                counter_legs: Vec::new(),
            },
        );
        assert!(matches!(result, Err(CustodyError::VaultNotFound { .. })));
    }
}

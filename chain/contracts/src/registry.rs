//! Offer registry
//!
//! Stores offer records at the derived `escrow` address of `(maker, offer_id)`.
//! Records are written once by Make and destroyed by Take or Refund; nothing
//! updates them in place. The maker pays the record's existence reservation on
//! create and gets it back on destroy.

use themis_types::account::{Account, AccountData};
use themis_types::address::Address;
use themis_types::ids::OfferId;
use themis_types::offer::Offer;
use tracing::debug;

use crate::derivation::{AddressDeriver, ESCROW_NAMESPACE};
use crate::errors::RegistryError;
use crate::store::{credit_reserve, debit_reserve, AccountStore};

/// Keyed store of offer records
#[derive(Debug, Clone, Copy)]
pub struct OfferRegistry {
    deriver: AddressDeriver,
    /// Reservation charged per record
    reserve: u64,
}

impl OfferRegistry {
    pub fn new(deriver: AddressDeriver, reserve: u64) -> Self {
        Self { deriver, reserve }
    }

    /// Address of the record for `(maker, offer_id)`.
    pub fn record_address(&self, maker: &Address, offer_id: OfferId) -> Result<Address, RegistryError> {
        let (address, _) = self.deriver.derive(ESCROW_NAMESPACE, maker, offer_id)?;
        Ok(address)
    }

    /// Fail unless the record address for `(maker, offer_id)` is free.
    pub fn ensure_vacant<S: AccountStore>(
        &self,
        store: &S,
        maker: &Address,
        offer_id: OfferId,
    ) -> Result<Address, RegistryError> {
        let address = self.record_address(maker, offer_id)?;
        match store.get(&address) {
            None => Ok(address),
            Some(account) if account.as_offer().is_some() => Err(RegistryError::DuplicateOffer {
                maker: *maker,
                offer_id,
            }),
            Some(account) => Err(RegistryError::AddressOccupied {
                address,
                kind: account.kind(),
            }),
        }
    }

    /// Store `offer`, charging the record reservation to its maker.
    pub fn create<S: AccountStore>(&self, store: &mut S, offer: Offer) -> Result<Address, RegistryError> {
        let address = self.ensure_vacant(store, &offer.maker, offer.offer_id)?;
        debit_reserve(store, &offer.maker, self.reserve)?;

        debug!(
            maker = %offer.maker.short(),
            offer_id = %offer.offer_id,
            record = %address.short(),
            "Offer record created"
        );
        store.insert(
            address,
            Account {
                reserve: self.reserve,
                data: AccountData::Offer(offer),
            },
        );
        Ok(address)
    }

    /// Read the record for `(maker, offer_id)`.
    pub fn read<S: AccountStore>(
        &self,
        store: &S,
        maker: &Address,
        offer_id: OfferId,
    ) -> Result<Offer, RegistryError> {
        let address = self.record_address(maker, offer_id)?;
        let account = store.get(&address).ok_or(RegistryError::NotFound {
            maker: *maker,
            offer_id,
        })?;
        account
            .as_offer()
            .cloned()
            .ok_or(RegistryError::AddressOccupied {
                address,
                kind: account.kind(),
            })
    }

    /// Remove the record and return its reservation to the maker.
    pub fn destroy<S: AccountStore>(
        &self,
        store: &mut S,
        maker: &Address,
        offer_id: OfferId,
    ) -> Result<Offer, RegistryError> {
        let offer = self.read(store, maker, offer_id)?;
        if !offer.is_open() {
            return Err(RegistryError::NotFound {
                maker: *maker,
                offer_id,
            });
        }
        let address = self.record_address(maker, offer_id)?;
        let account = store.remove(&address).ok_or(RegistryError::NotFound {
            maker: *maker,
            offer_id,
        })?;
        credit_reserve(store, maker, account.reserve)?;

        debug!(
            maker = %maker.short(),
            offer_id = %offer_id,
            "Offer record destroyed"
        );
        Ok(offer)
    }
}

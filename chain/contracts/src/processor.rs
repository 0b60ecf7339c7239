//! Offer state machine
//!
//! Executes the three escrow transitions over an `AccountStore`:
//! - **Make**: open the vault, lock the deposit, store the record
//! - **Take**: pay the maker, release the vault to the taker, close both
//! - **Refund**: release the vault back to the maker, close both
//!
//! Every instruction runs on its own working set. The set is committed only
//! when the transition returns `Ok`, so a failed instruction leaves the store
//! untouched. Take and Refund trust nothing from the caller beyond the offer
//! key and the verified signers: amounts, mints and the vault address are
//! read back from the record and the vault address is re-derived.

use themis_types::address::Address;
use themis_types::amount::ui_amount;
use themis_types::ids::OfferId;
use themis_types::offer::{Offer, OfferState};
use tracing::{debug, info};

use crate::config::EscrowConfig;
use crate::derivation::{AddressDeriver, VaultAuthority, VAULT_NAMESPACE};
use crate::errors::{CustodyError, EscrowError};
use crate::events::{EscrowEvent, OfferMade, OfferRefunded, OfferTaken};
use crate::instruction::EscrowInstruction;
use crate::registry::OfferRegistry;
use crate::security::SignerSet;
use crate::store::{AccountStore, WorkingSet};
use crate::transfer::{AssetTransferEngine, Leg};
use crate::vault::{Release, VaultCustody};

/// Offer lifecycle executor
#[derive(Debug, Clone)]
pub struct OfferStateMachine {
    config: EscrowConfig,
    deriver: AddressDeriver,
    registry: OfferRegistry,
    custody: VaultCustody,
    engine: AssetTransferEngine,
}

impl OfferStateMachine {
    pub fn new(config: EscrowConfig) -> Self {
        let deriver = AddressDeriver::new(config.program_id);
        Self {
            deriver,
            registry: OfferRegistry::new(deriver, config.offer_reserve),
            custody: VaultCustody::new(config.holding_reserve),
            engine: AssetTransferEngine::new(),
            config,
        }
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    pub fn registry(&self) -> &OfferRegistry {
        &self.registry
    }

    /// Execute `instruction` against `store`, all or nothing.
    ///
    /// `now` is the ledger timestamp in unix millis.
    pub fn process<S: AccountStore>(
        &self,
        store: &mut S,
        signers: &SignerSet,
        instruction: &EscrowInstruction,
        now: i64,
    ) -> Result<EscrowEvent, EscrowError> {
        signers.require(&instruction.signer())?;

        let mut scope = WorkingSet::new(store);
        let event = match instruction {
            EscrowInstruction::MakeOffer {
                maker,
                offer_id,
                deposit_mint,
                receive_mint,
                deposit_amount,
                receive_amount,
            } => self.make(
                &mut scope,
                signers,
                MakeParams {
                    maker: *maker,
                    offer_id: *offer_id,
                    deposit_mint: *deposit_mint,
                    receive_mint: *receive_mint,
                    deposit_amount: *deposit_amount,
                    receive_amount: *receive_amount,
                },
                now,
            )?,
            EscrowInstruction::TakeOffer {
                taker,
                maker,
                offer_id,
            } => self.take(&mut scope, signers, taker, maker, *offer_id)?,
            EscrowInstruction::RefundOffer {
                signer,
                maker,
                offer_id,
            } => self.refund(&mut scope, signers, signer, maker, *offer_id)?,
        };
        scope.commit();
        Ok(event)
    }

    // ───────────────────────── Make ─────────────────────────

    fn make<S: AccountStore>(
        &self,
        store: &mut S,
        signers: &SignerSet,
        params: MakeParams,
        now: i64,
    ) -> Result<EscrowEvent, EscrowError> {
        let MakeParams {
            maker,
            offer_id,
            deposit_mint,
            receive_mint,
            deposit_amount,
            receive_amount,
        } = params;

        if deposit_amount == 0 || receive_amount == 0 {
            return Err(EscrowError::InvalidParameters {
                reason: "offer amounts must be positive".to_string(),
            });
        }
        if deposit_mint == receive_mint {
            return Err(EscrowError::InvalidParameters {
                reason: "deposit and receive mints must differ".to_string(),
            });
        }
        let deposit_decimals = mint_decimals(store, &deposit_mint)?;
        let receive_decimals = mint_decimals(store, &receive_mint)?;

        self.registry.ensure_vacant(store, &maker, offer_id)?;

        let (vault_address, authority) = self.deriver.derive(VAULT_NAMESPACE, &maker, offer_id)?;
        self.custody.open(store, &authority, &deposit_mint, &maker)?;

        let source = self.deriver.associated_holding(&maker, &deposit_mint)?;
        let deposit = Leg::signed(
            maker,
            source,
            vault_address,
            deposit_mint,
            deposit_amount,
            deposit_decimals,
        );
        self.engine.execute(store, signers, &[deposit])?;

        let offer = Offer {
            maker,
            offer_id,
            deposit_mint,
            receive_mint,
            deposit_amount,
            receive_amount,
            vault_address,
            derivation_bump: authority.bump(),
            state: OfferState::Open,
            created_at: now,
        };
        self.registry.create(store, offer)?;

        info!(
            maker = %maker.short(),
            offer_id = %offer_id,
            vault = %vault_address.short(),
            deposit_amount,
            receive_amount,
            "Offer made"
        );
        Ok(EscrowEvent::OfferMade(OfferMade {
            maker,
            offer_id,
            vault: vault_address,
            deposit_mint,
            receive_mint,
            deposit_amount,
            receive_amount,
            deposit_ui_amount: scaled(deposit_amount, deposit_decimals)?,
            receive_ui_amount: scaled(receive_amount, receive_decimals)?,
        }))
    }

    // ───────────────────────── Take ─────────────────────────

    fn take<S: AccountStore>(
        &self,
        store: &mut S,
        signers: &SignerSet,
        taker: &Address,
        maker: &Address,
        offer_id: OfferId,
    ) -> Result<EscrowEvent, EscrowError> {
        let offer = self.open_offer(store, maker, offer_id)?;
        let authority = self.vault_authority(&offer)?;
        let deposit_decimals = mint_decimals(store, &offer.deposit_mint)?;
        let receive_decimals = mint_decimals(store, &offer.receive_mint)?;

        let taker_receive = self.deriver.associated_holding(taker, &offer.receive_mint)?;
        let maker_receive = self.deriver.associated_holding(maker, &offer.receive_mint)?;
        let taker_deposit = self.deriver.associated_holding(taker, &offer.deposit_mint)?;

        let payment = Leg::signed(
            *taker,
            taker_receive,
            maker_receive,
            offer.receive_mint,
            offer.receive_amount,
            receive_decimals,
        );
        self.custody.release(
            store,
            signers,
            Release {
                authority: &authority,
                destination: taker_deposit,
                amount: offer.deposit_amount,
                reserve_recipient: *maker,
                counter_legs: vec![payment],
            },
        )?;
        self.registry.destroy(store, maker, offer_id)?;

        info!(
            maker = %maker.short(),
            taker = %taker.short(),
            offer_id = %offer_id,
            state = %OfferState::Settled,
            "Offer taken"
        );
        Ok(EscrowEvent::OfferTaken(OfferTaken {
            maker: *maker,
            taker: *taker,
            offer_id,
            deposit_mint: offer.deposit_mint,
            receive_mint: offer.receive_mint,
            deposit_amount: offer.deposit_amount,
            receive_amount: offer.receive_amount,
            deposit_ui_amount: scaled(offer.deposit_amount, deposit_decimals)?,
            receive_ui_amount: scaled(offer.receive_amount, receive_decimals)?,
        }))
    }

    // ───────────────────────── Refund ─────────────────────────

    fn refund<S: AccountStore>(
        &self,
        store: &mut S,
        signers: &SignerSet,
        signer: &Address,
        maker: &Address,
        offer_id: OfferId,
    ) -> Result<EscrowEvent, EscrowError> {
        let offer = self.open_offer(store, maker, offer_id)?;
        if signer != maker {
            return Err(EscrowError::Unauthorized {
                signer: *signer,
                offer_id,
            });
        }
        let authority = self.vault_authority(&offer)?;
        let decimals = mint_decimals(store, &offer.deposit_mint)?;
        let refunded = self.custody.balance(store, &offer.vault_address)?;
        let destination = self.deriver.associated_holding(maker, &offer.deposit_mint)?;

        self.custody.release(
            store,
            signers,
            Release {
                authority: &authority,
                destination,
                amount: refunded,
                reserve_recipient: *maker,
                counter_legs: Vec::new(),
            },
        )?;
        self.registry.destroy(store, maker, offer_id)?;

        info!(
            maker = %maker.short(),
            offer_id = %offer_id,
            refunded,
            state = %OfferState::Refunded,
            "Offer refunded"
        );
        Ok(EscrowEvent::OfferRefunded(OfferRefunded {
            maker: *maker,
            offer_id,
            deposit_mint: offer.deposit_mint,
            refunded_amount: refunded,
            refunded_ui_amount: scaled(refunded, decimals)?,
        }))
    }

    // ───────────────────────── Helpers ─────────────────────────

    /// Read the record and require it to be open.
    fn open_offer<S: AccountStore>(
        &self,
        store: &S,
        maker: &Address,
        offer_id: OfferId,
    ) -> Result<Offer, EscrowError> {
        let offer = self.registry.read(store, maker, offer_id)?;
        if !offer.is_open() {
            return Err(EscrowError::OfferNotOpen {
                maker: *maker,
                offer_id,
                state: offer.state,
            });
        }
        Ok(offer)
    }

    /// Re-derive the vault authority and check it against the record.
    fn vault_authority(&self, offer: &Offer) -> Result<VaultAuthority, EscrowError> {
        let (address, authority) = self
            .deriver
            .derive(VAULT_NAMESPACE, &offer.maker, offer.offer_id)?;
        if address != offer.vault_address || authority.bump() != offer.derivation_bump {
            debug!(
                recorded = %offer.vault_address.short(),
                derived = %address.short(),
                "Vault address mismatch"
            );
            return Err(CustodyError::AuthorityMismatch {
                address: offer.vault_address,
            }
            .into());
        }
        Ok(authority)
    }
}

/// Fields of a MakeOffer instruction
struct MakeParams {
    maker: Address,
    offer_id: OfferId,
    deposit_mint: Address,
    receive_mint: Address,
    deposit_amount: u64,
    receive_amount: u64,
}

fn mint_decimals<S: AccountStore>(store: &S, mint: &Address) -> Result<u8, EscrowError> {
    store
        .get(mint)
        .and_then(|account| account.as_mint())
        .map(|m| m.decimals)
        .ok_or(EscrowError::MintNotFound { mint: *mint })
}

fn scaled(raw: u64, decimals: u8) -> Result<rust_decimal::Decimal, EscrowError> {
    ui_amount(raw, decimals).map_err(|e| EscrowError::InvalidParameters {
        reason: e.to_string(),
    })
}

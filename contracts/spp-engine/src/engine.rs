//! Engine state, valuation and the transactional executor

use std::cell::{Cell, RefCell};

use tracing::{debug, info, warn};

use spp_common::{
    config::EngineConfig,
    errors::{SppError, SppResult},
    events::{EventLog, SppEvent},
    host::{Host, PriceFeed},
    math,
    types::{AccountInformation, Address, CollateralConfig, HealthFactor, LiquidationBonus, PositionStatus},
};

use crate::guard::ReentrancyGuard;
use crate::store::EngineStore;

// ============ Engine ============

/// The collateralized-debt engine.
///
/// All state-mutating actions take `&self` and run through
/// [`SppEngine::execute`], which serializes them behind a re-entrancy flag
/// and undoes every effect of an action that fails.
#[derive(Debug)]
pub struct SppEngine {
    /// Custody address holding deposited collateral
    pub(crate) address: Address,
    /// Synthetic unit (token identity and mint/burn authority)
    pub(crate) synthetic: Address,
    /// Approved collateral in insertion order
    pub(crate) collateral: Vec<CollateralConfig>,
    pub(crate) liquidation_bonus: LiquidationBonus,
    pub(crate) store: RefCell<EngineStore>,
    pub(crate) events: RefCell<EventLog>,
    locked: Cell<bool>,
}

impl SppEngine {
    /// Build an engine from its construction-time configuration.
    ///
    /// # Errors
    /// - `ConfigurationMismatch` if assets and feeds differ in length
    /// - `DuplicateCollateral` / `InvalidAddress` for malformed lists
    pub fn new(config: EngineConfig) -> SppResult<Self> {
        let collateral = config.collateral()?;
        let address = config.engine_address();

        info!(
            engine = %address,
            synthetic = %config.synthetic,
            assets = collateral.len(),
            bonus = ?config.liquidation_bonus,
            "engine constructed"
        );

        Ok(Self {
            address,
            synthetic: config.synthetic,
            collateral,
            liquidation_bonus: config.liquidation_bonus,
            store: RefCell::new(EngineStore::new()),
            events: RefCell::new(EventLog::new()),
            locked: Cell::new(false),
        })
    }

    // ============ Configuration Queries ============

    /// Custody address of the engine
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn synthetic(&self) -> Address {
        self.synthetic
    }

    /// Approved collateral assets in insertion order
    pub fn collateral_assets(&self) -> Vec<Address> {
        self.collateral.iter().map(|c| c.asset).collect()
    }

    pub fn price_feed(&self, asset: &Address) -> Option<Address> {
        self.collateral
            .iter()
            .find(|c| c.asset == *asset)
            .map(|c| c.price_feed)
    }

    pub fn is_allowed_token(&self, asset: &Address) -> bool {
        self.price_feed(asset).is_some()
    }

    pub fn liquidation_bonus(&self) -> LiquidationBonus {
        self.liquidation_bonus
    }

    // ============ Ledger Queries ============

    pub fn collateral_balance_of(&self, user: &Address, asset: &Address) -> u128 {
        self.store.borrow().collateral_of(user, asset)
    }

    pub fn minted_spp(&self, user: &Address) -> u128 {
        self.store.borrow().minted_of(user)
    }

    /// Copy of the deposit and debt tables
    pub fn store_snapshot(&self) -> EngineStore {
        self.store.borrow().clone()
    }

    /// Events of all committed actions not yet taken
    pub fn events(&self) -> Vec<SppEvent> {
        self.events.borrow().events().to_vec()
    }

    pub fn take_events(&self) -> Vec<SppEvent> {
        self.events.borrow_mut().drain()
    }

    // ============ Valuation ============

    /// USD value (18 decimals) of `amount` units of `asset`
    pub fn get_usd_value<P>(&self, feeds: &P, asset: &Address, amount: u128) -> SppResult<u128>
    where
        P: PriceFeed + ?Sized,
    {
        let price = self.price(feeds, asset)?;
        math::usd_value(price, amount)
    }

    /// Amount of `asset` worth `usd_amount` (18 decimals)
    pub fn get_token_amount_from_usd<P>(&self, feeds: &P, asset: &Address, usd_amount: u128) -> SppResult<u128>
    where
        P: PriceFeed + ?Sized,
    {
        let price = self.price(feeds, asset)?;
        math::token_amount_from_usd(price, usd_amount)
    }

    /// Total USD value of a user's collateral, summed in asset order
    pub fn get_account_collateral_value<P>(&self, feeds: &P, user: &Address) -> SppResult<u128>
    where
        P: PriceFeed + ?Sized,
    {
        let mut total: u128 = 0;
        for config in &self.collateral {
            let amount = self.collateral_balance_of(user, &config.asset);
            // Empty deposits contribute nothing and need no feed read
            if amount == 0 {
                continue;
            }
            let value = self.get_usd_value(feeds, &config.asset, amount)?;
            total = math::safe_add(total, value)?;
        }
        Ok(total)
    }

    pub fn get_account_information<P>(&self, feeds: &P, user: &Address) -> SppResult<AccountInformation>
    where
        P: PriceFeed + ?Sized,
    {
        Ok(AccountInformation {
            total_minted: self.minted_spp(user),
            collateral_value_usd: self.get_account_collateral_value(feeds, user)?,
        })
    }

    pub fn calculate_health_factor(total_minted: u128, collateral_value_usd: u128) -> HealthFactor {
        math::calculate_health_factor(total_minted, collateral_value_usd)
    }

    /// Current health factor of `user`; `HealthFactor::MAX` without debt
    pub fn health_factor<P>(&self, feeds: &P, user: &Address) -> SppResult<HealthFactor>
    where
        P: PriceFeed + ?Sized,
    {
        let info = self.get_account_information(feeds, user)?;
        let health_factor = Self::calculate_health_factor(info.total_minted, info.collateral_value_usd);
        debug!(
            %user,
            debt = info.total_minted,
            collateral_usd = info.collateral_value_usd,
            %health_factor,
            "health factor"
        );
        Ok(health_factor)
    }

    pub fn position_status<P>(&self, feeds: &P, user: &Address) -> SppResult<PositionStatus>
    where
        P: PriceFeed + ?Sized,
    {
        if self.minted_spp(user) == 0 {
            return Ok(PositionStatus::Closed);
        }
        if self.health_factor(feeds, user)?.is_healthy() {
            Ok(PositionStatus::Solvent)
        } else {
            Ok(PositionStatus::Undercollateralized)
        }
    }

    /// Fail with `SolvencyViolation` if `user` is below the minimum
    pub(crate) fn ensure_healthy<P>(&self, feeds: &P, user: &Address) -> SppResult<()>
    where
        P: PriceFeed + ?Sized,
    {
        let health_factor = self.health_factor(feeds, user)?;
        if !health_factor.is_healthy() {
            return Err(SppError::SolvencyViolation { health_factor });
        }
        Ok(())
    }

    /// Positive feed answer for an approved asset
    fn price<P>(&self, feeds: &P, asset: &Address) -> SppResult<u128>
    where
        P: PriceFeed + ?Sized,
    {
        let feed = self
            .price_feed(asset)
            .ok_or(SppError::AssetNotApproved { asset: *asset })?;
        let answer = feeds.latest_price(&feed)?;
        if answer <= 0 {
            return Err(SppError::InvalidPrice { feed, price: answer });
        }
        u128::try_from(answer).map_err(|_| SppError::InvalidPrice { feed, price: answer })
    }

    // ============ Execution ============

    /// Run one action with all-or-nothing semantics.
    ///
    /// On failure the store, the event log and the host are restored to
    /// their state before the action and the error is returned unchanged.
    pub(crate) fn execute<H, T, F>(&self, host: &mut H, action: &'static str, f: F) -> SppResult<T>
    where
        H: Host + ?Sized,
        F: FnOnce(&Self, &mut H) -> SppResult<T>,
    {
        let _guard = ReentrancyGuard::acquire(&self.locked).map_err(|err| {
            warn!(action, code = err.code(), "re-entrant call rejected");
            err
        })?;

        let snapshot = self.store.borrow().clone();
        let mark = self.events.borrow().mark();
        host.checkpoint();

        match f(self, host) {
            Ok(value) => {
                host.commit();
                Ok(value)
            }
            Err(err) => {
                host.revert();
                *self.store.borrow_mut() = snapshot;
                self.events.borrow_mut().rollback_to(mark);
                warn!(action, code = err.code(), error = %err, "action reverted");
                Err(err)
            }
        }
    }

    pub(crate) fn emit(&self, event: SppEvent) {
        self.events.borrow_mut().emit(event);
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

//! Action Protocol
//!
//! The public state-mutating operations. Each one runs inside
//! [`SppEngine::execute`], checks its preconditions first and ends with the
//! solvency gate of the acting user, except plain deposits which can only
//! raise a health factor.

use tracing::{info, warn};

use spp_common::{
    errors::{SppError, SppResult},
    events::SppEvent,
    host::{Host, PriceFeed, SyntheticAuthority, TokenLedger},
    math::{self, safe_add},
    types::{Address, LiquidationOutcome},
};

use crate::engine::SppEngine;

impl SppEngine {
    // ============ Public Actions ============

    /// Lock `amount` of an approved asset for `user`
    pub fn deposit_collateral<H>(&self, host: &mut H, user: &Address, asset: &Address, amount: u128) -> SppResult<()>
    where
        H: Host + ?Sized,
    {
        self.execute(host, "deposit_collateral", |engine, host| {
            engine.deposit(host, user, asset, amount)
        })?;
        info!(%user, %asset, amount, "collateral deposited");
        Ok(())
    }

    /// Deposit collateral and mint against it in one action
    pub fn deposit_collateral_and_mint_spp<H>(
        &self,
        host: &mut H,
        user: &Address,
        asset: &Address,
        amount_collateral: u128,
        amount_to_mint: u128,
    ) -> SppResult<()>
    where
        H: Host + ?Sized,
    {
        self.execute(host, "deposit_collateral_and_mint_spp", |engine, host| {
            engine.deposit(host, user, asset, amount_collateral)?;
            engine.mint(host, user, amount_to_mint)
        })?;
        info!(%user, %asset, amount_collateral, amount_to_mint, "collateral deposited and SPP minted");
        Ok(())
    }

    /// Mint `amount` SPP to `user` against their collateral
    pub fn mint_spp<H>(&self, host: &mut H, user: &Address, amount: u128) -> SppResult<()>
    where
        H: Host + ?Sized,
    {
        self.execute(host, "mint_spp", |engine, host| engine.mint(host, user, amount))?;
        info!(%user, amount, "SPP minted");
        Ok(())
    }

    /// Repay `amount` of `user`'s own debt
    pub fn burn_spp<H>(&self, host: &mut H, user: &Address, amount: u128) -> SppResult<()>
    where
        H: Host + ?Sized,
    {
        self.execute(host, "burn_spp", |engine, host| {
            require_positive(amount)?;
            engine.burn_from(host, amount, user, user)?;
            engine.ensure_healthy(&*host, user)
        })?;
        info!(%user, amount, "SPP burned");
        Ok(())
    }

    /// Withdraw `amount` of `asset` back to `user`
    pub fn redeem_collateral<H>(&self, host: &mut H, user: &Address, asset: &Address, amount: u128) -> SppResult<()>
    where
        H: Host + ?Sized,
    {
        self.execute(host, "redeem_collateral", |engine, host| {
            require_positive(amount)?;
            engine.require_allowed(asset)?;
            engine.redeem_from(host, user, user, asset, amount)?;
            engine.ensure_healthy(&*host, user)
        })?;
        info!(%user, %asset, amount, "collateral redeemed");
        Ok(())
    }

    /// Repay debt first, then withdraw collateral, then check solvency
    pub fn redeem_collateral_for_spp<H>(
        &self,
        host: &mut H,
        user: &Address,
        asset: &Address,
        amount_collateral: u128,
        amount_to_burn: u128,
    ) -> SppResult<()>
    where
        H: Host + ?Sized,
    {
        self.execute(host, "redeem_collateral_for_spp", |engine, host| {
            require_positive(amount_collateral)?;
            require_positive(amount_to_burn)?;
            engine.require_allowed(asset)?;
            engine.burn_from(host, amount_to_burn, user, user)?;
            engine.redeem_from(host, user, user, asset, amount_collateral)?;
            engine.ensure_healthy(&*host, user)
        })?;
        info!(%user, %asset, amount_collateral, amount_to_burn, "collateral redeemed for SPP");
        Ok(())
    }

    /// Repay `debt_to_cover` of an unhealthy `user`'s debt and seize the
    /// equivalent collateral plus the liquidation bonus.
    ///
    /// # Errors
    /// - `LiquidationNotEligible` if `user` is solvent
    /// - `InsufficientCollateral` if the seizure exceeds `user`'s deposit
    /// - `LiquidationIneffective` if `user`'s health factor got worse
    /// - `SolvencyViolation` if `liquidator` ends up below the minimum
    pub fn liquidate<H>(
        &self,
        host: &mut H,
        liquidator: &Address,
        asset: &Address,
        user: &Address,
        debt_to_cover: u128,
    ) -> SppResult<LiquidationOutcome>
    where
        H: Host + ?Sized,
    {
        let outcome = self.execute(host, "liquidate", |engine, host| {
            engine.liquidate_position(host, liquidator, asset, user, debt_to_cover)
        })?;
        info!(
            %liquidator,
            %user,
            %asset,
            debt_covered = outcome.debt_covered,
            collateral_seized = outcome.collateral_seized(),
            starting = %outcome.starting_health_factor,
            ending = %outcome.ending_health_factor,
            "position liquidated"
        );
        Ok(outcome)
    }

    // ============ Steps ============

    fn deposit<H>(&self, host: &mut H, user: &Address, asset: &Address, amount: u128) -> SppResult<()>
    where
        H: TokenLedger + ?Sized,
    {
        require_positive(amount)?;
        self.require_allowed(asset)?;

        self.store.borrow_mut().credit_collateral(user, asset, amount)?;
        self.emit(SppEvent::CollateralDeposited {
            user: *user,
            asset: *asset,
            amount,
        });

        let pulled = host.transfer_from(asset, &self.address, user, &self.address, amount);
        self.ensure_transferred(pulled, asset, user, &self.address, amount)
    }

    fn mint<H>(&self, host: &mut H, user: &Address, amount: u128) -> SppResult<()>
    where
        H: PriceFeed + SyntheticAuthority + ?Sized,
    {
        require_positive(amount)?;

        // Debt is recorded before the solvency check so the check sees it
        self.store.borrow_mut().add_debt(user, amount)?;
        self.ensure_healthy(&*host, user)?;

        match host.mint(&self.address, user, amount) {
            Ok(true) => {}
            Ok(false) => {
                warn!(%user, amount, "synthetic authority refused to mint");
                return Err(SppError::MintFailure { to: *user, amount });
            }
            Err(err) => {
                warn!(%user, amount, code = err.code(), "synthetic mint aborted");
                return Err(SppError::MintFailure { to: *user, amount });
            }
        }
        self.emit(SppEvent::SppMinted { user: *user, amount });
        Ok(())
    }

    /// Move `amount` of `from`'s deposit out of custody to `to`
    pub(crate) fn redeem_from<H>(
        &self,
        host: &mut H,
        from: &Address,
        to: &Address,
        asset: &Address,
        amount: u128,
    ) -> SppResult<()>
    where
        H: TokenLedger + ?Sized,
    {
        self.store.borrow_mut().debit_collateral(from, asset, amount)?;
        self.emit(SppEvent::CollateralRedeemed {
            from: *from,
            to: *to,
            asset: *asset,
            amount,
        });

        let pushed = host.transfer(asset, &self.address, to, amount);
        self.ensure_transferred(pushed, asset, &self.address, to, amount)
    }

    /// Reduce `on_behalf_of`'s debt by `amount`, paid with `payer`'s units
    pub(crate) fn burn_from<H>(&self, host: &mut H, amount: u128, on_behalf_of: &Address, payer: &Address) -> SppResult<()>
    where
        H: TokenLedger + SyntheticAuthority + ?Sized,
    {
        self.store.borrow_mut().sub_debt(on_behalf_of, amount)?;

        let synthetic = self.synthetic;
        let pulled = host.transfer_from(&synthetic, &self.address, payer, &self.address, amount);
        self.ensure_transferred(pulled, &synthetic, payer, &self.address, amount)?;
        host.burn(&self.address, amount)?;

        self.emit(SppEvent::SppBurned {
            on_behalf_of: *on_behalf_of,
            payer: *payer,
            amount,
        });
        Ok(())
    }

    fn liquidate_position<H>(
        &self,
        host: &mut H,
        liquidator: &Address,
        asset: &Address,
        user: &Address,
        debt_to_cover: u128,
    ) -> SppResult<LiquidationOutcome>
    where
        H: Host + ?Sized,
    {
        // 1. Preconditions
        require_positive(debt_to_cover)?;
        self.require_allowed(asset)?;

        // 2. Only unhealthy positions can be liquidated
        let starting_health_factor = self.health_factor(&*host, user)?;
        if starting_health_factor.is_healthy() {
            return Err(SppError::LiquidationNotEligible {
                health_factor: starting_health_factor,
            });
        }

        // 3. Debt in collateral units
        let base_collateral = self.get_token_amount_from_usd(&*host, asset, debt_to_cover)?;

        // 4. Liquidator incentive
        let bonus_collateral = math::liquidation_bonus(base_collateral, self.liquidation_bonus)?;
        let total_collateral = safe_add(base_collateral, bonus_collateral)?;

        // 5. Seize collateral
        self.redeem_from(host, user, liquidator, asset, total_collateral)?;

        // 6. Repay debt with the liquidator's units
        self.burn_from(host, debt_to_cover, user, liquidator)?;

        // 7. The target must not end up worse off
        let ending_health_factor = self.health_factor(&*host, user)?;
        if ending_health_factor < starting_health_factor {
            return Err(SppError::LiquidationIneffective {
                starting: starting_health_factor,
                ending: ending_health_factor,
            });
        }

        // 8. Neither may the liquidator
        self.ensure_healthy(&*host, liquidator)?;

        self.emit(SppEvent::Liquidation {
            liquidator: *liquidator,
            user: *user,
            asset: *asset,
            debt_covered: debt_to_cover,
            collateral_seized: total_collateral,
            bonus_collateral,
        });

        Ok(LiquidationOutcome {
            debt_covered: debt_to_cover,
            base_collateral,
            bonus_collateral,
            starting_health_factor,
            ending_health_factor,
        })
    }

    // ============ Preconditions ============

    fn require_allowed(&self, asset: &Address) -> SppResult<()> {
        if !self.is_allowed_token(asset) {
            return Err(SppError::AssetNotApproved { asset: *asset });
        }
        Ok(())
    }

    /// Map a collaborator's refusal or abort to `TransferFailure`
    fn ensure_transferred(
        &self,
        result: SppResult<bool>,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> SppResult<()> {
        match result {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(%asset, %from, %to, amount, "token transfer refused");
                Err(SppError::TransferFailure {
                    asset: *asset,
                    from: *from,
                    to: *to,
                    amount,
                })
            }
            Err(err) => {
                warn!(%asset, %from, %to, amount, code = err.code(), "token transfer aborted");
                Err(SppError::TransferFailure {
                    asset: *asset,
                    from: *from,
                    to: *to,
                    amount,
                })
            }
        }
    }
}

fn require_positive(amount: u128) -> SppResult<()> {
    if amount == 0 {
        return Err(SppError::InvalidAmount);
    }
    Ok(())
}

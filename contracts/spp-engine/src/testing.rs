//! Test host wiring the reference ledger and feed registry together

use std::rc::Rc;

use spp_common::{
    config::EngineConfig,
    constants::token::ONE,
    errors::{SppError, SppResult},
    host::{Journaled, PriceFeed, SyntheticAuthority, TokenLedger},
    types::{Address, LiquidationBonus},
};
use spp_price_oracle::FeedRegistry;
use spp_token::Ledger;

use crate::SppEngine;

pub const ETH_USD_1000: i128 = 1_000_00000000;
pub const ETH_USD_700: i128 = 700_00000000;
pub const BTC_USD_30000: i128 = 30_000_00000000;

/// Starting wallet balance of every test user, per collateral asset
pub const WALLET: u128 = 1_000 * ONE;

pub fn weth() -> Address {
    Address::from_label("weth")
}

pub fn wbtc() -> Address {
    Address::from_label("wbtc")
}

pub fn spp() -> Address {
    Address::from_label("spp")
}

pub fn eth_usd() -> Address {
    Address::from_label("eth-usd")
}

pub fn btc_usd() -> Address {
    Address::from_label("btc-usd")
}

pub fn operator() -> Address {
    Address::from_label("operator")
}

pub fn alice() -> Address {
    Address::from_label("alice")
}

pub fn bob() -> Address {
    Address::from_label("bob")
}

pub fn carol() -> Address {
    Address::from_label("carol")
}

/// Faults the host injects into collaborator calls
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// `transfer_from` returns `Ok(false)`
    pub refuse_pull: bool,
    /// `transfer` returns `Ok(false)`
    pub refuse_push: bool,
    /// `transfer_from` and `transfer` abort
    pub abort_transfers: bool,
    /// `mint` returns `Ok(false)`
    pub refuse_mint: bool,
}

/// Deposit attempted from inside a token callback
pub struct Reentry {
    pub engine: Rc<SppEngine>,
    pub user: Address,
    pub asset: Address,
    pub amount: u128,
}

/// Ledger, feeds, fault injection and an optional re-entrant callback
pub struct LocalHost {
    pub ledger: Ledger,
    pub feeds: FeedRegistry,
    pub faults: Faults,
    pub reentry: Option<Reentry>,
    pub reentry_results: Vec<SppResult<()>>,
}

impl LocalHost {
    pub fn set_price(&mut self, feed: &Address, answer: i128) {
        let operator = operator();
        self.feeds
            .update_answer(&operator, feed, answer)
            .expect("operator updates feed");
    }

    fn callback(&mut self) {
        if let Some(reentry) = self.reentry.take() {
            let result = reentry
                .engine
                .deposit_collateral(self, &reentry.user, &reentry.asset, reentry.amount);
            self.reentry_results.push(result);
        }
    }

    fn aborted() -> SppError {
        SppError::InsufficientBalance {
            available: 0,
            requested: 0,
        }
    }
}

impl TokenLedger for LocalHost {
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> SppResult<bool> {
        self.callback();
        if self.faults.abort_transfers {
            return Err(Self::aborted());
        }
        if self.faults.refuse_pull {
            return Ok(false);
        }
        self.ledger.transfer_from(token, spender, from, to, amount)
    }

    fn transfer(&mut self, token: &Address, sender: &Address, to: &Address, amount: u128) -> SppResult<bool> {
        if self.faults.abort_transfers {
            return Err(Self::aborted());
        }
        if self.faults.refuse_push {
            return Ok(false);
        }
        self.ledger.transfer(token, sender, to, amount)
    }
}

impl PriceFeed for LocalHost {
    fn latest_price(&self, feed: &Address) -> SppResult<i128> {
        self.feeds.latest_price(feed)
    }
}

impl SyntheticAuthority for LocalHost {
    fn mint(&mut self, minter: &Address, to: &Address, amount: u128) -> SppResult<bool> {
        if self.faults.refuse_mint {
            return Ok(false);
        }
        self.ledger.mint(minter, to, amount)
    }

    fn burn(&mut self, burner: &Address, amount: u128) -> SppResult<()> {
        self.ledger.burn(burner, amount)
    }
}

impl Journaled for LocalHost {
    fn checkpoint(&mut self) {
        self.ledger.checkpoint();
    }

    fn commit(&mut self) {
        self.ledger.commit();
    }

    fn revert(&mut self) {
        self.ledger.revert();
    }
}

pub fn create_test_config(bonus: LiquidationBonus) -> EngineConfig {
    EngineConfig::new(vec![weth(), wbtc()], vec![eth_usd(), btc_usd()], spp()).with_liquidation_bonus(bonus)
}

/// Engine with WETH at $1000 and WBTC at $30000; alice, bob and carol each
/// hold [`WALLET`] of both assets and have approved the engine for
/// everything including SPP.
pub fn create_test_context(bonus: LiquidationBonus) -> (SppEngine, LocalHost) {
    let engine = SppEngine::new(create_test_config(bonus)).expect("valid config");
    let host = create_test_host(&engine);
    (engine, host)
}

pub fn create_test_host(engine: &SppEngine) -> LocalHost {
    let mut ledger = Ledger::new();
    ledger.register_token(weth()).expect("register weth");
    ledger.register_token(wbtc()).expect("register wbtc");
    ledger
        .register_synthetic(spp(), engine.address())
        .expect("register spp");

    for user in [alice(), bob(), carol()] {
        for asset in [weth(), wbtc()] {
            ledger.faucet(&asset, &user, WALLET).expect("faucet");
        }
        for token in [weth(), wbtc(), spp()] {
            ledger
                .approve(&token, &user, &engine.address(), u128::MAX)
                .expect("approve");
        }
    }

    let mut feeds = FeedRegistry::new();
    feeds.add_feed(eth_usd(), operator(), ETH_USD_1000).expect("eth feed");
    feeds.add_feed(btc_usd(), operator(), BTC_USD_30000).expect("btc feed");

    LocalHost {
        ledger,
        feeds,
        faults: Faults::default(),
        reentry: None,
        reentry_results: Vec::new(),
    }
}

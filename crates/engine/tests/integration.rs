//! End-to-end engine behaviour against in-memory collaborators

use rust_decimal_macros::dec;
use stablemint_core::{AccountId, Amount, AssetId};
use stablemint_engine::{
    CollateralRegistry, EngineConfig, EngineError, EngineEvent, RegistryError, RiskEngine,
};
use stablemint_oracle::{MockOracle, PriceOracle};
use stablemint_token::{
    LiabilityToken, SyntheticToken, Token, TokenError, TokenLedger, Transactional,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

fn account(s: &str) -> AccountId {
    AccountId::new(s).unwrap()
}

fn asset(s: &str) -> AssetId {
    AssetId::new(s).unwrap()
}

fn units(n: u64) -> Amount {
    Amount::from_units(n)
}

// === Collaborator doubles ===

/// Collateral whose outgoing transfers can be switched to fail
struct FlakyToken {
    ledger: TokenLedger,
    fail_transfers: AtomicBool,
}

impl FlakyToken {
    fn new(id: AssetId) -> Self {
        Self {
            ledger: TokenLedger::new(id),
            fail_transfers: AtomicBool::new(false),
        }
    }
}

impl Transactional for FlakyToken {
    fn checkpoint(&self) {
        self.ledger.checkpoint();
    }
    fn commit(&self) {
        self.ledger.commit();
    }
    fn revert(&self) {
        self.ledger.revert();
    }
}

impl Token for FlakyToken {
    fn id(&self) -> &AssetId {
        self.ledger.id()
    }
    fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }
    fn balance_of(&self, holder: &AccountId) -> Amount {
        self.ledger.balance_of(holder)
    }
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.ledger.allowance(owner, spender)
    }
    fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<(), TokenError> {
        self.ledger.approve(owner, spender, amount)
    }
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), TokenError> {
        if self.fail_transfers.load(Ordering::SeqCst) {
            return Err(TokenError::Rejected("transfers paused".to_string()));
        }
        self.ledger.transfer(from, to, amount)
    }
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.transfer_from(spender, from, to, amount)
    }
}

/// Collateral that calls back into the engine while pulling a deposit
struct HostileToken {
    ledger: TokenLedger,
    engine: Mutex<Option<Arc<RiskEngine>>>,
    /// (deposit seen by the callback, result of the reentrant mint)
    observed: Mutex<Vec<(Amount, Result<(), EngineError>)>>,
}

impl HostileToken {
    fn new(id: AssetId) -> Self {
        Self {
            ledger: TokenLedger::new(id),
            engine: Mutex::new(None),
            observed: Mutex::new(Vec::new()),
        }
    }

    fn attach(&self, engine: Arc<RiskEngine>) {
        *self.engine.lock().unwrap() = Some(engine);
    }
}

impl Transactional for HostileToken {
    fn checkpoint(&self) {
        self.ledger.checkpoint();
    }
    fn commit(&self) {
        self.ledger.commit();
    }
    fn revert(&self) {
        self.ledger.revert();
    }
}

impl Token for HostileToken {
    fn id(&self) -> &AssetId {
        self.ledger.id()
    }
    fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }
    fn balance_of(&self, holder: &AccountId) -> Amount {
        self.ledger.balance_of(holder)
    }
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.ledger.allowance(owner, spender)
    }
    fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<(), TokenError> {
        self.ledger.approve(owner, spender, amount)
    }
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), TokenError> {
        self.ledger.transfer(from, to, amount)
    }
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let engine = self.engine.lock().unwrap().clone();
        if let Some(engine) = engine {
            let seen = engine
                .collateral_deposited(from, self.ledger.id())
                .unwrap_or(Amount::ZERO);
            let reentry = engine.mint(from, Amount::ONE);
            self.observed.lock().unwrap().push((seen, reentry));
        }
        self.ledger.transfer_from(spender, from, to, amount)
    }
}

// === Fixture ===

struct System {
    engine: Arc<RiskEngine>,
    oracle: Arc<MockOracle>,
    weth: Arc<FlakyToken>,
    susd: Arc<SyntheticToken>,
}

impl System {
    /// WETH at 2000 (precision 8), threshold 50
    fn new() -> Self {
        let oracle = Arc::new(MockOracle::new());
        oracle.set_unit_price(asset("WETH"), 2000, 8);

        let weth = Arc::new(FlakyToken::new(asset("WETH")));
        let (susd, bootstrap) = SyntheticToken::new(asset("SUSD"), account("deployer")).unwrap();
        let susd = Arc::new(susd);
        let authority = susd.transfer_ownership(bootstrap, account("engine")).unwrap();

        let tokens: Vec<Arc<dyn Token>> = vec![weth.clone()];
        let oracles: Vec<Arc<dyn PriceOracle>> = vec![oracle.clone()];
        let registry = CollateralRegistry::new(
            tokens,
            oracles,
            vec![8],
            &asset("SUSD"),
            &EngineConfig::with_threshold(50),
        )
        .unwrap();
        let engine =
            Arc::new(RiskEngine::new(account("engine"), registry, susd.clone(), authority).unwrap());

        Self {
            engine,
            oracle,
            weth,
            susd,
        }
    }

    /// Give `user` collateral and approve the engine to pull it
    fn fund(&self, user: &str, amount: Amount) {
        self.weth.ledger.issue(&account(user), amount).unwrap();
        self.weth
            .approve(&account(user), &account("engine"), amount)
            .unwrap();
    }

    /// Approve the engine to pull `user`'s liability tokens
    fn approve_liability(&self, user: &str, amount: Amount) {
        self.susd
            .approve(&account(user), &account("engine"), amount)
            .unwrap();
    }

    fn assert_conserved(&self) {
        let weth = asset("WETH");
        assert_eq!(
            self.weth.balance_of(&account("engine")),
            self.engine.total_deposited(&weth).unwrap()
        );
        assert_eq!(self.susd.total_supply(), self.engine.total_debt());
    }
}

// === Scenarios ===

#[test]
fn test_mint_up_to_exact_limit() {
    let sys = System::new();
    let alice = account("alice");
    sys.fund("alice", units(10));

    sys.engine.deposit(&alice, &asset("WETH"), units(10)).unwrap();
    assert_eq!(sys.engine.deposit_value(&alice).unwrap(), units(20000));

    sys.engine.mint(&alice, units(10000)).unwrap();
    assert_eq!(sys.engine.health_factor(&alice).unwrap(), Some(dec!(1)));

    // Limits are reported for the call itself: no headroom is left
    let result = sys.engine.mint(&alice, Amount::ONE);
    assert_eq!(
        result,
        Err(EngineError::MintLimitBreached {
            account: alice.clone(),
            requested: Amount::ONE,
            max_safe: Amount::ZERO,
        })
    );
    assert_eq!(sys.engine.debt(&alice), units(10000));
}

#[test]
fn test_single_mint_above_limit_reports_max_safe() {
    let sys = System::new();
    let alice = account("alice");
    sys.fund("alice", units(10));

    sys.engine.deposit(&alice, &asset("WETH"), units(10)).unwrap();
    let result = sys.engine.mint(&alice, units(10001));
    assert_eq!(
        result,
        Err(EngineError::MintLimitBreached {
            account: alice.clone(),
            requested: units(10001),
            max_safe: units(10000),
        })
    );
    assert_eq!(sys.engine.debt(&alice), Amount::ZERO);
}

#[test]
fn test_redeem_blocked_at_threshold() {
    let sys = System::new();
    let alice = account("alice");
    sys.fund("alice", units(10));
    sys.engine
        .deposit_and_mint(&alice, &asset("WETH"), units(10), units(10000))
        .unwrap();

    let result = sys.engine.redeem(&alice, &asset("WETH"), Amount::ONE);
    assert_eq!(
        result,
        Err(EngineError::RedeemLimitBreached {
            account: alice.clone(),
            asset: asset("WETH"),
            requested: Amount::ONE,
            max_safe: Amount::ZERO,
        })
    );
    assert_eq!(
        sys.engine.collateral_deposited(&alice, &asset("WETH")).unwrap(),
        units(10)
    );
}

#[test]
fn test_liquidation_after_price_drop() -> anyhow::Result<()> {
    let sys = System::new();
    let alice = account("alice");
    let liquidator = account("liquidator");
    sys.fund("alice", units(10));
    sys.fund("liquidator", units(20));

    sys.engine
        .deposit_and_mint(&alice, &asset("WETH"), units(10), units(10000))?;
    // Liquidator sources its liability tokens through its own position
    sys.engine
        .deposit_and_mint(&liquidator, &asset("WETH"), units(20), units(10000))?;
    sys.approve_liability("liquidator", units(10000));

    sys.oracle.set_unit_price(asset("WETH"), 1800, 8);
    assert!(sys.engine.is_liquidatable(&alice)?);

    let outcome = sys.engine.liquidate(&liquidator, &alice)?;

    assert_eq!(outcome.debt_cleared, units(10000));
    assert_eq!(outcome.deposit_value_cleared, units(18000));
    assert_eq!(outcome.liquidator_gain(), units(8000));

    assert_eq!(sys.engine.debt(&alice), Amount::ZERO);
    assert_eq!(
        sys.engine.collateral_deposited(&alice, &asset("WETH"))?,
        Amount::ZERO
    );
    assert_eq!(sys.weth.balance_of(&liquidator), units(10));
    assert_eq!(sys.susd.balance_of(&liquidator), Amount::ZERO);
    assert!(!sys.engine.is_liquidatable(&alice)?);
    sys.assert_conserved();

    let last = sys.engine.events().pop().map(|record| record.event);
    assert!(matches!(
        last,
        Some(EngineEvent::Liquidated { ref target, .. }) if *target == alice
    ));
    Ok(())
}

#[test]
fn test_registry_length_mismatch() {
    let oracle: Arc<dyn PriceOracle> = Arc::new(MockOracle::new());
    let tokens: Vec<Arc<dyn Token>> = vec![
        Arc::new(TokenLedger::new(asset("WETH"))),
        Arc::new(TokenLedger::new(asset("WBTC"))),
    ];

    let result = CollateralRegistry::new(
        tokens,
        vec![oracle.clone(), oracle],
        vec![8, 8, 8],
        &asset("SUSD"),
        &EngineConfig::default(),
    );
    assert_eq!(
        result.unwrap_err(),
        RegistryError::LengthMismatch {
            collaterals: 2,
            oracles: 2,
            precisions: 3,
        }
    );
}

// === Properties ===

#[test]
fn test_liquidation_boundary() {
    let sys = System::new();
    let alice = account("alice");
    let liquidator = account("liquidator");
    sys.fund("alice", units(10));
    sys.fund("liquidator", units(20));
    sys.engine
        .deposit_and_mint(&alice, &asset("WETH"), units(10), units(10000))
        .unwrap();
    sys.engine
        .deposit_and_mint(&liquidator, &asset("WETH"), units(20), units(10000))
        .unwrap();
    sys.approve_liability("liquidator", units(10000));

    // Exactly on the line: 20000 * 50 == 10000 * 100
    let result = sys.engine.liquidate(&liquidator, &alice);
    assert_eq!(result, Err(EngineError::NotLiquidatable { target: alice.clone() }));

    // One unit of account below
    sys.oracle.set_price(asset("WETH"), dec!(199990000000), 8);
    assert!(sys.engine.liquidate(&liquidator, &alice).is_ok());
}

#[test]
fn test_conservation_across_operations() {
    let sys = System::new();
    let users = ["alice", "bob", "carol"];
    for user in users {
        sys.fund(user, units(50));
        sys.approve_liability(user, units(1_000_000));
    }

    let weth = asset("WETH");
    for (i, user) in users.iter().enumerate() {
        let id = account(user);
        let n = i as u64 + 1;
        sys.engine
            .deposit_and_mint(&id, &weth, units(10 * n), units(3000 * n))
            .unwrap();
        sys.assert_conserved();
    }

    sys.engine.burn(&account("alice"), units(1000)).unwrap();
    sys.assert_conserved();
    sys.engine
        .redeem(&account("bob"), &weth, units(2))
        .unwrap();
    sys.assert_conserved();
    sys.engine
        .burn_and_redeem(&account("carol"), units(9000), &weth, units(30))
        .unwrap();
    sys.assert_conserved();

    // Rejected operations leave everything balanced too
    assert!(sys.engine.mint(&account("bob"), units(1_000_000)).is_err());
    assert!(sys.engine.redeem(&account("alice"), &weth, units(10)).is_err());
    sys.assert_conserved();

    for user in users {
        let id = account(user);
        let info = sys.engine.account_information(&id).unwrap();
        if info.debt.is_positive() {
            assert!(info.deposit_value.value() * dec!(50) >= info.debt.value() * dec!(100));
        }
    }
}

#[test]
fn test_mint_limit_monotonic_in_debt_and_value() {
    let sys = System::new();
    let alice = account("alice");
    sys.fund("alice", units(40));
    sys.engine.deposit(&alice, &asset("WETH"), units(10)).unwrap();

    let mut previous = sys.engine.max_mintable(&alice).unwrap();
    for _ in 0..4 {
        sys.engine.mint(&alice, units(1000)).unwrap();
        let limit = sys.engine.max_mintable(&alice).unwrap();
        assert!(limit <= previous);
        previous = limit;
    }

    for _ in 0..3 {
        sys.engine.deposit(&alice, &asset("WETH"), units(10)).unwrap();
        let limit = sys.engine.max_mintable(&alice).unwrap();
        assert!(limit >= previous);
        previous = limit;
    }
}

// === Atomicity ===

#[test]
fn test_failed_transfer_rolls_back_everything() {
    let sys = System::new();
    let alice = account("alice");
    sys.fund("alice", units(10));
    sys.engine.deposit(&alice, &asset("WETH"), units(10)).unwrap();
    let events_before = sys.engine.events();

    sys.weth.fail_transfers.store(true, Ordering::SeqCst);
    let result = sys.engine.redeem(&alice, &asset("WETH"), units(4));
    assert_eq!(
        result,
        Err(EngineError::Token(TokenError::Rejected(
            "transfers paused".to_string()
        )))
    );

    assert_eq!(
        sys.engine.collateral_deposited(&alice, &asset("WETH")).unwrap(),
        units(10)
    );
    assert_eq!(sys.engine.events(), events_before);
    assert_eq!(sys.weth.balance_of(&account("engine")), units(10));
    assert_eq!(sys.weth.ledger.checkpoint_depth(), 0);

    // Sequence numbering resumes where the last committed record left off
    sys.weth.fail_transfers.store(false, Ordering::SeqCst);
    sys.engine.redeem(&alice, &asset("WETH"), units(4)).unwrap();
    let records = sys.engine.events();
    assert_eq!(records.last().map(|r| r.sequence), Some(2));
}

#[test]
fn test_unapproved_liquidator_rolls_back() {
    let sys = System::new();
    let alice = account("alice");
    let liquidator = account("liquidator");
    sys.fund("alice", units(10));
    sys.fund("liquidator", units(20));
    sys.engine
        .deposit_and_mint(&alice, &asset("WETH"), units(10), units(10000))
        .unwrap();
    sys.engine
        .deposit_and_mint(&liquidator, &asset("WETH"), units(20), units(10000))
        .unwrap();
    sys.oracle.set_unit_price(asset("WETH"), 1800, 8);

    // No liability allowance for the engine
    let result = sys.engine.liquidate(&liquidator, &alice);
    assert!(matches!(
        result,
        Err(EngineError::Token(TokenError::InsufficientAllowance { .. }))
    ));

    assert_eq!(sys.engine.debt(&alice), units(10000));
    assert_eq!(
        sys.engine.collateral_deposited(&alice, &asset("WETH")).unwrap(),
        units(10)
    );
    assert_eq!(sys.susd.balance_of(&liquidator), units(10000));
    assert_eq!(sys.engine.events().len(), 4);
    sys.assert_conserved();
}

// === Reentrancy ===

#[test]
fn test_reentrant_callback_rejected() {
    let oracle = Arc::new(MockOracle::new());
    oracle.set_unit_price(asset("EVIL"), 2000, 8);

    let evil = Arc::new(HostileToken::new(asset("EVIL")));
    let (susd, bootstrap) = SyntheticToken::new(asset("SUSD"), account("deployer")).unwrap();
    let susd = Arc::new(susd);
    let authority = susd.transfer_ownership(bootstrap, account("engine")).unwrap();

    let tokens: Vec<Arc<dyn Token>> = vec![evil.clone()];
    let oracles: Vec<Arc<dyn PriceOracle>> = vec![oracle];
    let registry = CollateralRegistry::new(
        tokens,
        oracles,
        vec![8],
        &asset("SUSD"),
        &EngineConfig::default(),
    )
    .unwrap();
    let engine =
        Arc::new(RiskEngine::new(account("engine"), registry, susd.clone(), authority).unwrap());
    evil.attach(engine.clone());

    let alice = account("alice");
    evil.ledger.issue(&alice, units(10)).unwrap();
    evil.approve(&alice, &account("engine"), units(10)).unwrap();

    engine.deposit(&alice, &asset("EVIL"), units(10)).unwrap();

    let observed = evil.observed.lock().unwrap();
    assert_eq!(observed.len(), 1);
    // The ledger already reflected the deposit when the callback ran
    assert_eq!(observed[0].0, units(10));
    assert_eq!(observed[0].1, Err(EngineError::Reentrancy));

    // The outer deposit still completed and nothing was minted
    assert_eq!(engine.collateral_deposited(&alice, &asset("EVIL")).unwrap(), units(10));
    assert_eq!(susd.total_supply(), Amount::ZERO);
    assert_eq!(engine.debt(&alice), Amount::ZERO);
}

#![allow(non_snake_case)]
use minicasino::{
    BalanceCache,
    CrashRoundEngine,
    GameConfig,
    GameError,
    GatewayError,
    crash::CrashPhase,
    test_helpers::{
        FakeGateway,
        GatewayCall,
        RecordingPresenter,
        payout,
        started,
    },
};
use std::time::Duration;

fn open_window_config() -> GameConfig {
    GameConfig {
        betting_window_secs: 0,
        ..GameConfig::default()
    }
}

async fn running_round(
    gateway: &FakeGateway,
    crash_point: f64,
    auto_cashout: Option<f64>,
    presenter: &mut RecordingPresenter,
) -> CrashRoundEngine<FakeGateway> {
    gateway.push_start(Ok(started("round-1", Some(crash_point))));
    gateway.set_default_balance(90.0);
    let mut engine = CrashRoundEngine::new(
        gateway.clone(),
        open_window_config(),
        BalanceCache::new(100.0),
    );
    engine
        .place_bet(presenter, 10.0, auto_cashout)
        .await
        .unwrap();
    engine
}

#[tokio::test]
async fn on_clock_tick__advances_the_multiplier_monotonically() {
    // given
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let mut engine = running_round(&gateway, 100.0, None, &mut presenter).await;
    let token = engine.clock_token();

    // when / then: the published multiplier never moves backwards
    let mut previous = engine.multiplier();
    for _ in 0..500 {
        engine.on_clock_tick(&mut presenter, token).await;
        let current = engine.multiplier();
        assert!(current >= previous, "{current} < {previous}");
        previous = current;
    }
    assert_eq!(engine.phase(), CrashPhase::Running);
}

#[tokio::test]
async fn on_clock_tick__auto_cashes_out_when_the_target_is_reached() {
    // given: the target sits below the crash point
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let mut engine = running_round(&gateway, 5.0, Some(1.015), &mut presenter).await;
    gateway.push_crash_cashout(Ok(payout(110.2, 10.2)));
    let token = engine.clock_token();

    // when
    engine.on_clock_tick(&mut presenter, token).await;
    assert_eq!(engine.phase(), CrashPhase::Running);
    engine.on_clock_tick(&mut presenter, token).await;

    // then
    assert_eq!(engine.phase(), CrashPhase::Cashed);
    assert!(
        gateway
            .calls()
            .iter()
            .any(|call| matches!(call, GatewayCall::CrashCashout { .. }))
    );
    let (message, _) = presenter.last_notice().unwrap();
    assert!(message.contains("$10.20"), "got {message}");
}

#[tokio::test]
async fn on_clock_tick__auto_cashout_outranks_the_crash_on_the_same_tick() {
    // given: target and crash point both land inside one increment
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let mut engine = running_round(&gateway, 1.005, Some(1.005), &mut presenter).await;
    gateway.push_crash_cashout(Ok(payout(110.0, 10.0)));
    let token = engine.clock_token();

    // when
    engine.on_clock_tick(&mut presenter, token).await;

    // then: the player's exit wins the race
    assert_eq!(engine.phase(), CrashPhase::Cashed);
}

#[tokio::test]
async fn on_clock_tick__crashes_and_clamps_to_the_crash_point() {
    // given
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let mut engine = running_round(&gateway, 1.025, None, &mut presenter).await;
    let token = engine.clock_token();

    // when
    for _ in 0..3 {
        engine.on_clock_tick(&mut presenter, token).await;
    }

    // then: the shown multiplier never exceeds where the round burst
    assert_eq!(engine.phase(), CrashPhase::Crashed);
    assert_eq!(engine.multiplier(), 1.025);
    assert!(
        !gateway
            .calls()
            .iter()
            .any(|call| matches!(call, GatewayCall::CrashCashout { .. }))
    );
}

#[tokio::test]
async fn on_clock_tick__auto_target_above_the_crash_point_still_crashes() {
    // given: the round will burst well before the target is reachable
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let mut engine = running_round(&gateway, 1.05, Some(2.0), &mut presenter).await;
    let token = engine.clock_token();

    // when
    for _ in 0..20 {
        engine.on_clock_tick(&mut presenter, token).await;
    }

    // then: crashed, clamped, and no cashout request ever went out
    assert_eq!(engine.phase(), CrashPhase::Crashed);
    assert_eq!(engine.multiplier(), 1.05);
    assert!(
        !gateway
            .calls()
            .iter()
            .any(|call| matches!(call, GatewayCall::CrashCashout { .. }))
    );
}

#[tokio::test]
async fn on_clock_tick__ignores_ticks_from_a_previous_round() {
    // given: a token minted before the bet was placed
    let gateway = FakeGateway::new();
    gateway.push_start(Ok(started("round-1", Some(5.0))));
    gateway.set_default_balance(90.0);
    let mut engine = CrashRoundEngine::new(
        gateway.clone(),
        open_window_config(),
        BalanceCache::new(100.0),
    );
    let mut presenter = RecordingPresenter::new();
    let stale = engine.clock_token();
    engine.place_bet(&mut presenter, 10.0, None).await.unwrap();

    // when
    engine.on_clock_tick(&mut presenter, stale).await;

    // then
    assert_eq!(engine.multiplier(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn on_clock_tick__resets_the_round_after_the_display_delay() {
    // given: a cashed round
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let mut engine = running_round(&gateway, 5.0, Some(1.015), &mut presenter).await;
    gateway.push_crash_cashout(Ok(payout(110.0, 10.0)));
    let token = engine.clock_token();
    for _ in 0..2 {
        engine.on_clock_tick(&mut presenter, token).await;
    }
    assert_eq!(engine.phase(), CrashPhase::Cashed);

    // when: ticks keep arriving but the delay has not elapsed
    engine.on_clock_tick(&mut presenter, token).await;
    assert_eq!(engine.phase(), CrashPhase::Cashed);

    tokio::time::advance(Duration::from_secs(3)).await;
    engine.on_clock_tick(&mut presenter, token).await;

    // then: blank round, old token retired, and the zero-length
    // countdown from the test config reopened the window immediately
    assert_eq!(engine.phase(), CrashPhase::Waiting);
    assert_eq!(engine.session_id(), None);
    assert_eq!(engine.multiplier(), 1.0);
    assert!(engine.window_is_open());
    assert_ne!(engine.clock_token(), token);
}

#[tokio::test]
async fn cashout__settles_the_round_with_the_server_payout() {
    // given
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let balance = BalanceCache::new(100.0);
    gateway.push_start(Ok(started("round-1", Some(5.0))));
    gateway.set_default_balance(90.0);
    let mut engine =
        CrashRoundEngine::new(gateway.clone(), open_window_config(), balance.clone());
    engine.place_bet(&mut presenter, 10.0, None).await.unwrap();
    let token = engine.clock_token();
    engine.on_clock_tick(&mut presenter, token).await;
    gateway.push_crash_cashout(Ok(payout(115.5, 15.5)));

    // when
    let receipt = engine.cashout(&mut presenter).await.unwrap().unwrap();

    // then: the authoritative balance replaced the cache
    assert_eq!(engine.phase(), CrashPhase::Cashed);
    assert_eq!(receipt.profit, 15.5);
    assert_eq!(receipt.new_balance, 115.5);
    assert_eq!(balance.read(), 115.5);
}

#[tokio::test]
async fn cashout__rejects_when_no_round_is_running() {
    // given
    let gateway = FakeGateway::new();
    let mut engine = CrashRoundEngine::new(
        gateway.clone(),
        open_window_config(),
        BalanceCache::new(100.0),
    );
    let mut presenter = RecordingPresenter::new();

    // when
    let err = engine.cashout(&mut presenter).await.unwrap_err();

    // then
    assert!(matches!(err, GameError::SessionState(_)));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn cashout__failure_leaves_the_round_running_for_a_retry() {
    // given
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let balance = BalanceCache::new(100.0);
    gateway.push_start(Ok(started("round-1", Some(5.0))));
    gateway.set_default_balance(90.0);
    let mut engine =
        CrashRoundEngine::new(gateway.clone(), open_window_config(), balance.clone());
    engine.place_bet(&mut presenter, 10.0, None).await.unwrap();
    gateway.push_crash_cashout(Err(GatewayError::Transport("connection reset".into())));

    // when
    let err = engine.cashout(&mut presenter).await.unwrap_err();

    // then: no state was committed and a second attempt can go through
    assert!(matches!(err, GameError::Gateway(_)));
    assert_eq!(engine.phase(), CrashPhase::Running);
    assert_eq!(balance.read(), 90.0);

    gateway.push_crash_cashout(Ok(payout(110.0, 10.0)));
    let receipt = engine.cashout(&mut presenter).await.unwrap().unwrap();
    assert_eq!(receipt.new_balance, 110.0);
    assert_eq!(engine.phase(), CrashPhase::Cashed);
}

#[tokio::test]
async fn cashout__rejects_after_the_round_already_settled() {
    // given
    let gateway = FakeGateway::new();
    let mut presenter = RecordingPresenter::new();
    let mut engine = running_round(&gateway, 5.0, None, &mut presenter).await;
    gateway.push_crash_cashout(Ok(payout(110.0, 10.0)));
    engine.cashout(&mut presenter).await.unwrap();
    let settled_calls = gateway.mutating_call_count();

    // when
    let err = engine.cashout(&mut presenter).await.unwrap_err();

    // then: no duplicate request went out
    assert!(matches!(err, GameError::SessionState(_)));
    assert_eq!(gateway.mutating_call_count(), settled_calls);
}

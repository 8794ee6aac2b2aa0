use crate::{
    balance::BalanceCache,
    config::GameConfig,
    error::GameError,
    gateway::{
        CashoutReceipt,
        GameGateway,
        GameKind,
    },
    presenter::{
        GameView,
        NoticeKind,
        Presenter,
        format_money,
        format_multiplier,
    },
    window::{
        BettingWindowTimer,
        WindowEvent,
    },
};
use std::fmt;
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CrashPhase {
    Waiting,
    Running,
    Cashed,
    Crashed,
}

impl fmt::Display for CrashPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrashPhase::Waiting => "WAITING",
            CrashPhase::Running => "RUNNING",
            CrashPhase::Cashed => "CASHED",
            CrashPhase::Crashed => "CRASHED",
        };
        write!(f, "{label}")
    }
}

/// Identifies the round a clock tick was scheduled for. Ticks carrying a
/// token from an already-reset round are ignored, so a fresh round never
/// receives a callback meant for a resolved one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundToken(u64);

#[derive(Clone, Debug)]
pub struct RoundStarted {
    pub token: RoundToken,
}

/// One Crash session. The crash point lives here from session start until
/// resolution but is deliberately absent from `Debug` output and from
/// snapshots: the player learns it only by the round ending.
struct CrashRound {
    session_id: Option<String>,
    bet_amount: f64,
    crash_point: Option<f64>,
    current_multiplier: f64,
    auto_cashout: Option<f64>,
    phase: CrashPhase,
    playing: bool,
}

impl CrashRound {
    fn idle() -> Self {
        Self {
            session_id: None,
            bet_amount: 0.0,
            crash_point: None,
            current_multiplier: 1.0,
            auto_cashout: None,
            phase: CrashPhase::Waiting,
            playing: false,
        }
    }
}

impl fmt::Debug for CrashRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrashRound")
            .field("session_id", &self.session_id)
            .field("bet_amount", &self.bet_amount)
            .field("crash_point", &"<undisclosed>")
            .field("current_multiplier", &self.current_multiplier)
            .field("auto_cashout", &self.auto_cashout)
            .field("phase", &self.phase)
            .field("playing", &self.playing)
            .finish()
    }
}

/// Player-visible Crash state, rebuilt after every transition.
#[derive(Clone, Debug)]
pub struct CrashSnapshot {
    pub phase: CrashPhase,
    pub multiplier: f64,
    pub bet_amount: f64,
    pub auto_cashout: Option<f64>,
    pub bet_live: bool,
    pub window_open: bool,
    pub window_remaining: Option<u32>,
    pub balance: f64,
}

/// Owns a single Crash session's lifecycle: arms a bet, drives the local
/// multiplier clock, races manual and automatic cashout against the
/// server-issued crash point, and resolves to a terminal outcome.
pub struct CrashRoundEngine<G> {
    gateway: G,
    config: GameConfig,
    balance: BalanceCache,
    window: BettingWindowTimer,
    round: CrashRound,
    epoch: u64,
    busy: bool,
    resolved_at: Option<Instant>,
}

impl<G: GameGateway> CrashRoundEngine<G> {
    pub fn new(gateway: G, config: GameConfig, balance: BalanceCache) -> Self {
        let window = BettingWindowTimer::new(config.betting_window_secs);
        Self {
            gateway,
            config,
            balance,
            window,
            round: CrashRound::idle(),
            epoch: 0,
            busy: false,
            resolved_at: None,
        }
    }

    pub fn phase(&self) -> CrashPhase {
        self.round.phase
    }

    pub fn multiplier(&self) -> f64 {
        self.round.current_multiplier
    }

    pub fn session_id(&self) -> Option<&str> {
        self.round.session_id.as_deref()
    }

    pub fn window_is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Token identifying the current round for clock scheduling.
    pub fn clock_token(&self) -> RoundToken {
        RoundToken(self.epoch)
    }

    pub fn snapshot(&self) -> CrashSnapshot {
        CrashSnapshot {
            phase: self.round.phase,
            multiplier: self.round.current_multiplier,
            bet_amount: self.round.bet_amount,
            auto_cashout: self.round.auto_cashout,
            bet_live: self.round.playing,
            window_open: self.window.is_open(),
            window_remaining: self.window.remaining(),
            balance: self.balance.read(),
        }
    }

    fn render(&self, presenter: &mut impl Presenter) {
        let snapshot = self.snapshot();
        presenter.render(GameView::Crash(&snapshot));
    }

    /// Arm a bet for the next round. All preconditions are checked locally
    /// before any network traffic.
    pub async fn place_bet(
        &mut self,
        presenter: &mut impl Presenter,
        bet_amount: f64,
        auto_cashout: Option<f64>,
    ) -> Result<RoundStarted, GameError> {
        if let Err(err) = self.check_bet_preconditions(bet_amount) {
            presenter.notify(&err.to_string(), NoticeKind::Failure);
            return Err(err);
        }

        presenter.set_busy(true, "Placing bet...");
        let started = self
            .gateway
            .start_game(GameKind::Crash, bet_amount, None)
            .await;
        presenter.set_busy(false, "");

        let started = match started {
            Ok(started) => started,
            Err(err) => {
                presenter.notify(&err.to_string(), NoticeKind::Failure);
                return Err(err.into());
            }
        };
        let crash_point = match started.crash_point {
            Some(point) => point,
            None => {
                let err = GameError::Gateway(crate::error::GatewayError::Payload(
                    "start response is missing the crash point".into(),
                ));
                presenter.notify(&err.to_string(), NoticeKind::Failure);
                return Err(err);
            }
        };

        self.balance.refresh(&self.gateway).await;

        self.round = CrashRound {
            session_id: Some(started.session_id),
            bet_amount,
            crash_point: Some(crash_point),
            current_multiplier: 1.0,
            auto_cashout,
            phase: CrashPhase::Running,
            playing: true,
        };
        self.window.close();
        self.epoch += 1;
        self.resolved_at = None;
        self.render(presenter);
        Ok(RoundStarted {
            token: self.clock_token(),
        })
    }

    fn check_bet_preconditions(&self, bet_amount: f64) -> Result<(), GameError> {
        if self.round.session_id.is_some() || self.round.phase == CrashPhase::Running {
            return Err(GameError::SessionState(
                "a round is already in progress".into(),
            ));
        }
        if bet_amount < self.config.min_bet {
            return Err(GameError::Validation(format!(
                "minimum bet is {}",
                format_money(self.config.min_bet)
            )));
        }
        if bet_amount > self.balance.read() {
            return Err(GameError::Validation("insufficient balance".into()));
        }
        if !self.window.is_open() {
            return Err(GameError::SessionState(
                "betting window is closed; wait for the timer".into(),
            ));
        }
        Ok(())
    }

    /// One step of the local multiplier clock, called at display-refresh
    /// cadence. Ticks arrive even outside RUNNING to keep the visual loop
    /// alive; they advance nothing then. Stale tokens are dropped.
    pub async fn on_clock_tick(
        &mut self,
        presenter: &mut impl Presenter,
        token: RoundToken,
    ) {
        if token.0 != self.epoch {
            debug!(?token, epoch = self.epoch, "dropping stale clock tick");
            return;
        }
        if self.busy {
            // A cashout is outstanding; freeze the clock until it settles.
            return;
        }
        match self.round.phase {
            CrashPhase::Cashed | CrashPhase::Crashed => {
                let elapsed = self
                    .resolved_at
                    .map(|at| at.elapsed() >= self.config.round_reset_delay)
                    .unwrap_or(false);
                if elapsed {
                    self.reset_round(presenter);
                }
                return;
            }
            CrashPhase::Waiting => return,
            CrashPhase::Running => {}
        }

        self.round.current_multiplier += self.config.crash_tick_increment;

        // Resolution priority is fixed: the player's own exit preference
        // wins over the house crash when both land on the same tick.
        if self.round.playing
            && let Some(target) = self.round.auto_cashout
            && self.round.current_multiplier >= target
        {
            if let Err(err) = self.do_cashout(presenter).await {
                debug!(error = %err, "automatic cashout attempt failed");
            }
            return;
        }
        if let Some(crash_point) = self.round.crash_point
            && self.round.current_multiplier >= crash_point
        {
            self.on_crashed(presenter, crash_point).await;
            return;
        }
        self.render(presenter);
    }

    /// Manual cashout. A second invocation while a prior call is still
    /// outstanding is a no-op (`Ok(None)`), never a duplicate request.
    pub async fn cashout(
        &mut self,
        presenter: &mut impl Presenter,
    ) -> Result<Option<CashoutReceipt>, GameError> {
        if self.busy {
            return Ok(None);
        }
        if self.round.phase != CrashPhase::Running
            || !self.round.playing
            || self.round.session_id.is_none()
        {
            return Err(GameError::SessionState("no active bet to cash out".into()));
        }
        self.do_cashout(presenter).await
    }

    async fn do_cashout(
        &mut self,
        presenter: &mut impl Presenter,
    ) -> Result<Option<CashoutReceipt>, GameError> {
        let session_id = self
            .round
            .session_id
            .clone()
            .ok_or_else(|| GameError::SessionState("no session to cash out".into()))?;
        // The value sent is the multiplier at the moment of invocation;
        // the server settles with its own clock and may differ slightly.
        let multiplier = self.round.current_multiplier;

        self.busy = true;
        presenter.set_busy(true, "Cashing out...");
        let outcome = self.gateway.crash_cashout(&session_id, multiplier).await;
        self.busy = false;
        presenter.set_busy(false, "");

        match outcome {
            Ok(payout) => {
                self.balance.set(payout.new_balance);
                self.round.playing = false;
                self.round.phase = CrashPhase::Cashed;
                self.resolved_at = Some(Instant::now());
                presenter.notify(
                    &format!("Cashed out: won {}", format_money(payout.profit)),
                    NoticeKind::Success,
                );
                self.render(presenter);
                Ok(Some(CashoutReceipt {
                    multiplier,
                    profit: payout.profit,
                    new_balance: payout.new_balance,
                }))
            }
            Err(err) => {
                // No optimistic mutation was committed; the round is still
                // running and the player may retry.
                presenter.notify(&err.to_string(), NoticeKind::Failure);
                Err(err.into())
            }
        }
    }

    /// The client already knows it lost; no server round-trip is needed
    /// for local state. A best-effort balance refresh follows since the
    /// loss settles server-side.
    async fn on_crashed(&mut self, presenter: &mut impl Presenter, crash_point: f64) {
        self.round.current_multiplier = crash_point;
        self.round.playing = false;
        self.round.phase = CrashPhase::Crashed;
        self.resolved_at = Some(Instant::now());
        presenter.notify(
            &format!("Crashed at {}", format_multiplier(crash_point)),
            NoticeKind::Failure,
        );
        self.balance.refresh(&self.gateway).await;
        self.render(presenter);
    }

    /// Clear the session, rewind the multiplier, reopen the betting
    /// window countdown, and invalidate any ticks scheduled for the old
    /// round.
    pub fn reset_round(&mut self, presenter: &mut impl Presenter) {
        self.round = CrashRound::idle();
        self.epoch += 1;
        self.busy = false;
        self.resolved_at = None;
        self.window.start(self.config.betting_window_secs);
        self.render(presenter);
    }

    /// Drive the betting window; call once per second.
    pub fn on_window_tick(&mut self, presenter: &mut impl Presenter) {
        match self.window.tick() {
            Some(WindowEvent::Opened) => {
                presenter.notify("Place your bets!", NoticeKind::Info);
                self.render(presenter);
            }
            Some(WindowEvent::Counting(_)) => self.render(presenter),
            None => {}
        }
    }
}

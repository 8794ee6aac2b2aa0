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
    },
};
use std::collections::HashSet;
use tracing::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MinesStatus {
    Inactive,
    Active,
    Won,
    Lost,
}

/// What a successful reveal told us.
#[derive(Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    /// The cell was safe; the server reported the new multiplier.
    Safe { multiplier: f64 },
    /// The cell hid a mine; the session is over.
    Mine,
    /// The last safe cell was revealed; the session auto-resolved to won.
    Cleared { profit: f64 },
}

#[derive(Clone, Debug)]
pub struct SessionStarted {
    pub cells: u32,
    pub mine_count: u32,
}

/// Player-visible Mines state, rebuilt after every transition.
#[derive(Clone, Debug)]
pub struct MinesSnapshot {
    pub status: MinesStatus,
    pub multiplier: f64,
    pub bet_amount: f64,
    pub mine_count: u32,
    pub cells: u32,
    pub revealed: HashSet<u32>,
    pub balance: f64,
}

/// Owns a single Mines session's lifecycle: tracks revealed cells and the
/// server-reported multiplier, and resolves to won/lost on mine hit, board
/// clear, or cashout.
pub struct MinesSessionEngine<G> {
    gateway: G,
    config: GameConfig,
    balance: BalanceCache,
    session_id: Option<String>,
    bet_amount: f64,
    mine_count: u32,
    revealed: HashSet<u32>,
    current_multiplier: f64,
    status: MinesStatus,
    busy: bool,
}

impl<G: GameGateway> MinesSessionEngine<G> {
    pub fn new(gateway: G, config: GameConfig, balance: BalanceCache) -> Self {
        Self {
            gateway,
            config,
            balance,
            session_id: None,
            bet_amount: 0.0,
            mine_count: 0,
            revealed: HashSet::new(),
            current_multiplier: 1.0,
            status: MinesStatus::Inactive,
            busy: false,
        }
    }

    pub fn status(&self) -> MinesStatus {
        self.status
    }

    pub fn revealed(&self) -> &HashSet<u32> {
        &self.revealed
    }

    pub fn multiplier(&self) -> f64 {
        self.current_multiplier
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn snapshot(&self) -> MinesSnapshot {
        MinesSnapshot {
            status: self.status,
            multiplier: self.current_multiplier,
            bet_amount: self.bet_amount,
            mine_count: self.mine_count,
            cells: self.config.mines_cells,
            revealed: self.revealed.clone(),
            balance: self.balance.read(),
        }
    }

    fn render(&self, presenter: &mut impl Presenter) {
        let snapshot = self.snapshot();
        presenter.render(GameView::Mines(&snapshot));
    }

    /// Open a fresh session. Starting over a finished (won/lost) session
    /// is allowed and implicitly resets it first; starting over an active
    /// one is not.
    pub async fn start_session(
        &mut self,
        presenter: &mut impl Presenter,
        bet_amount: f64,
        mine_count: u32,
    ) -> Result<SessionStarted, GameError> {
        if let Err(err) = self.check_start_preconditions(bet_amount, mine_count) {
            presenter.notify(&err.to_string(), NoticeKind::Failure);
            return Err(err);
        }

        presenter.set_busy(true, "Starting game...");
        let started = self
            .gateway
            .start_game(GameKind::Mines, bet_amount, Some(mine_count))
            .await;
        presenter.set_busy(false, "");

        let started = match started {
            Ok(started) => started,
            Err(err) => {
                presenter.notify(&err.to_string(), NoticeKind::Failure);
                return Err(err.into());
            }
        };

        self.balance.refresh(&self.gateway).await;

        self.session_id = Some(started.session_id);
        self.bet_amount = bet_amount;
        self.mine_count = mine_count;
        self.revealed.clear();
        self.current_multiplier = 1.0;
        self.status = MinesStatus::Active;
        self.render(presenter);
        Ok(SessionStarted {
            cells: self.config.mines_cells,
            mine_count,
        })
    }

    fn check_start_preconditions(
        &self,
        bet_amount: f64,
        mine_count: u32,
    ) -> Result<(), GameError> {
        if self.status == MinesStatus::Active {
            return Err(GameError::SessionState(
                "a session is already active".into(),
            ));
        }
        if bet_amount < self.config.min_bet {
            return Err(GameError::Validation(format!(
                "minimum bet is {}",
                format_money(self.config.min_bet)
            )));
        }
        if mine_count < self.config.mines_count_min
            || mine_count > self.config.mines_count_max
        {
            return Err(GameError::Validation(format!(
                "mine count must be between {} and {}",
                self.config.mines_count_min, self.config.mines_count_max
            )));
        }
        if bet_amount > self.balance.read() {
            return Err(GameError::Validation("insufficient balance".into()));
        }
        Ok(())
    }

    /// Reveal one cell. Repeat reveals and reveals outside an active
    /// session are rejected locally; no request is issued for them.
    pub async fn reveal(
        &mut self,
        presenter: &mut impl Presenter,
        index: u32,
    ) -> Result<RevealOutcome, GameError> {
        if self.status != MinesStatus::Active {
            return Err(GameError::SessionState("no active session".into()));
        }
        if self.busy {
            return Err(GameError::SessionState(
                "another action is still in flight".into(),
            ));
        }
        if index >= self.config.mines_cells {
            return Err(GameError::Validation(format!(
                "cell index {index} is out of range"
            )));
        }
        if self.revealed.contains(&index) {
            return Err(GameError::SessionState(format!(
                "cell {index} is already revealed"
            )));
        }
        let session_id = self
            .session_id
            .clone()
            .ok_or_else(|| GameError::SessionState("no active session".into()))?;

        self.busy = true;
        let response = self.gateway.mines_reveal(&session_id, index).await;
        self.busy = false;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                // Pre-call state is retained; the player may retry the cell.
                presenter.notify(&err.to_string(), NoticeKind::Failure);
                return Err(err.into());
            }
        };

        if response.is_mine {
            debug!(cell = index, "mine hit; session lost");
            self.status = MinesStatus::Lost;
            self.current_multiplier = 0.0;
            let lost = self.bet_amount;
            self.session_id = None;
            self.balance.refresh(&self.gateway).await;
            presenter.notify(
                &format!("Mine! You lost {}", format_money(lost)),
                NoticeKind::Failure,
            );
            self.render(presenter);
            return Ok(RevealOutcome::Mine);
        }

        self.revealed.insert(index);
        // The payout curve is server-owned; the client never computes it.
        self.current_multiplier = response.current_multiplier;

        if response.game_over.unwrap_or(false)
            && let Some(profit) = response.profit
        {
            debug!(profit, "board cleared; session auto-resolved to won");
            self.status = MinesStatus::Won;
            let stake = self.bet_amount;
            self.session_id = None;
            self.balance.refresh(&self.gateway).await;
            presenter.notify(
                &format!("Board cleared! Won {}", format_money(profit + stake)),
                NoticeKind::Success,
            );
            self.render(presenter);
            return Ok(RevealOutcome::Cleared { profit });
        }

        self.render(presenter);
        Ok(RevealOutcome::Safe {
            multiplier: response.current_multiplier,
        })
    }

    /// Cash out the session at the current multiplier. A zero-reveal
    /// cashout is permitted client-side; the server's verdict is final.
    /// Overlapping invocations are no-ops, never duplicate requests.
    pub async fn cashout(
        &mut self,
        presenter: &mut impl Presenter,
    ) -> Result<Option<CashoutReceipt>, GameError> {
        if self.busy {
            return Ok(None);
        }
        if self.status != MinesStatus::Active {
            return Err(GameError::SessionState("no active session".into()));
        }
        let session_id = self
            .session_id
            .clone()
            .ok_or_else(|| GameError::SessionState("no active session".into()))?;
        let multiplier = self.current_multiplier;

        self.busy = true;
        presenter.set_busy(true, "Cashing out...");
        let outcome = self.gateway.mines_cashout(&session_id, multiplier).await;
        self.busy = false;
        presenter.set_busy(false, "");

        match outcome {
            Ok(payout) => {
                self.balance.set(payout.new_balance);
                self.status = MinesStatus::Won;
                self.session_id = None;
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
                presenter.notify(&err.to_string(), NoticeKind::Failure);
                Err(err.into())
            }
        }
    }

    /// Back to a blank board, ready for a fresh `start_session`.
    pub fn reset_session(&mut self) {
        self.session_id = None;
        self.bet_amount = 0.0;
        self.mine_count = 0;
        self.revealed.clear();
        self.current_multiplier = 1.0;
        self.status = MinesStatus::Inactive;
        self.busy = false;
    }
}

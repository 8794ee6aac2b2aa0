//! Hand-rolled fakes for exercising the engines without a server.

use crate::{
    error::GatewayError,
    gateway::{
        CashoutPayout,
        GameGateway,
        GameKind,
        RevealResponse,
        StartedSession,
        UserInfo,
    },
    presenter::{
        GameView,
        NoticeKind,
        Presenter,
    },
};
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
    },
};

/// Every request an engine issued, in order. Tests assert on these to
/// prove locally-rejected operations produced no network traffic.
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayCall {
    Start {
        kind: GameKind,
        bet_amount: f64,
        mines_count: Option<u32>,
    },
    CrashCashout {
        session_id: String,
        multiplier: f64,
    },
    Reveal {
        session_id: String,
        cell_index: u32,
    },
    MinesCashout {
        session_id: String,
        multiplier: f64,
    },
    Balance,
    UserInfo,
}

#[derive(Default)]
struct FakeGatewayState {
    start_responses: VecDeque<Result<StartedSession, GatewayError>>,
    crash_cashout_responses: VecDeque<Result<CashoutPayout, GatewayError>>,
    reveal_responses: VecDeque<Result<RevealResponse, GatewayError>>,
    mines_cashout_responses: VecDeque<Result<CashoutPayout, GatewayError>>,
    balance_responses: VecDeque<Result<f64, GatewayError>>,
    user_info_responses: VecDeque<Result<UserInfo, GatewayError>>,
    default_balance: Option<f64>,
    calls: Vec<GatewayCall>,
}

/// Scripted gateway: each operation pops the next queued response. The
/// balance query falls back to a default once its queue is drained, since
/// engines refresh the balance opportunistically.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeGatewayState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_start(&self, response: Result<StartedSession, GatewayError>) {
        self.state.lock().unwrap().start_responses.push_back(response);
    }

    pub fn push_crash_cashout(&self, response: Result<CashoutPayout, GatewayError>) {
        self.state
            .lock()
            .unwrap()
            .crash_cashout_responses
            .push_back(response);
    }

    pub fn push_reveal(&self, response: Result<RevealResponse, GatewayError>) {
        self.state.lock().unwrap().reveal_responses.push_back(response);
    }

    pub fn push_mines_cashout(&self, response: Result<CashoutPayout, GatewayError>) {
        self.state
            .lock()
            .unwrap()
            .mines_cashout_responses
            .push_back(response);
    }

    pub fn push_balance(&self, response: Result<f64, GatewayError>) {
        self.state.lock().unwrap().balance_responses.push_back(response);
    }

    pub fn push_user_info(&self, response: Result<UserInfo, GatewayError>) {
        self.state
            .lock()
            .unwrap()
            .user_info_responses
            .push_back(response);
    }

    pub fn set_default_balance(&self, balance: f64) {
        self.state.lock().unwrap().default_balance = Some(balance);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Count of non-balance requests; balance refreshes are best-effort
    /// noise most tests want to ignore.
    pub fn mutating_call_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| {
                !matches!(call, GatewayCall::Balance | GatewayCall::UserInfo)
            })
            .count()
    }

    fn record(&self, call: GatewayCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn unscripted(what: &str) -> GatewayError {
    GatewayError::Transport(format!("no scripted {what} response"))
}

impl GameGateway for FakeGateway {
    async fn start_game(
        &self,
        kind: GameKind,
        bet_amount: f64,
        mines_count: Option<u32>,
    ) -> Result<StartedSession, GatewayError> {
        self.record(GatewayCall::Start {
            kind,
            bet_amount,
            mines_count,
        });
        self.state
            .lock()
            .unwrap()
            .start_responses
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("start")))
    }

    async fn crash_cashout(
        &self,
        session_id: &str,
        multiplier: f64,
    ) -> Result<CashoutPayout, GatewayError> {
        self.record(GatewayCall::CrashCashout {
            session_id: session_id.to_string(),
            multiplier,
        });
        self.state
            .lock()
            .unwrap()
            .crash_cashout_responses
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("crash cashout")))
    }

    async fn mines_reveal(
        &self,
        session_id: &str,
        cell_index: u32,
    ) -> Result<RevealResponse, GatewayError> {
        self.record(GatewayCall::Reveal {
            session_id: session_id.to_string(),
            cell_index,
        });
        self.state
            .lock()
            .unwrap()
            .reveal_responses
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("reveal")))
    }

    async fn mines_cashout(
        &self,
        session_id: &str,
        multiplier: f64,
    ) -> Result<CashoutPayout, GatewayError> {
        self.record(GatewayCall::MinesCashout {
            session_id: session_id.to_string(),
            multiplier,
        });
        self.state
            .lock()
            .unwrap()
            .mines_cashout_responses
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("mines cashout")))
    }

    async fn balance(&self) -> Result<f64, GatewayError> {
        self.record(GatewayCall::Balance);
        let mut state = self.state.lock().unwrap();
        if let Some(response) = state.balance_responses.pop_front() {
            return response;
        }
        state.default_balance.ok_or_else(|| unscripted("balance"))
    }

    async fn user_info(&self) -> Result<UserInfo, GatewayError> {
        self.record(GatewayCall::UserInfo);
        self.state
            .lock()
            .unwrap()
            .user_info_responses
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("user info")))
    }
}

/// Convenience constructors for scripted responses.
pub fn started(session_id: &str, crash_point: Option<f64>) -> StartedSession {
    StartedSession {
        session_id: session_id.to_string(),
        crash_point,
    }
}

pub fn user(id: u64, username: &str, balance: f64) -> UserInfo {
    UserInfo {
        id,
        username: Some(username.to_string()),
        balance: Some(balance),
    }
}

pub fn payout(new_balance: f64, profit: f64) -> CashoutPayout {
    CashoutPayout {
        new_balance,
        profit,
    }
}

pub fn safe_reveal(multiplier: f64) -> RevealResponse {
    RevealResponse {
        is_mine: false,
        current_multiplier: multiplier,
        game_over: None,
        profit: None,
    }
}

pub fn mine_reveal() -> RevealResponse {
    RevealResponse {
        is_mine: true,
        current_multiplier: 0.0,
        game_over: Some(true),
        profit: None,
    }
}

pub fn clearing_reveal(multiplier: f64, profit: f64) -> RevealResponse {
    RevealResponse {
        is_mine: false,
        current_multiplier: multiplier,
        game_over: Some(true),
        profit: Some(profit),
    }
}

/// Presenter that records every signal it receives.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub renders: usize,
    pub notices: Vec<(String, NoticeKind)>,
    pub busy_changes: Vec<(bool, String)>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_notice(&self) -> Option<&(String, NoticeKind)> {
        self.notices.last()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, _view: GameView<'_>) {
        self.renders += 1;
    }

    fn notify(&mut self, message: &str, kind: NoticeKind) {
        self.notices.push((message.to_string(), kind));
    }

    fn set_busy(&mut self, busy: bool, label: &str) {
        self.busy_changes.push((busy, label.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn user_info__pops_the_scripted_response_then_errors() {
        // given
        let gateway = FakeGateway::new();
        gateway.push_user_info(Ok(user(7, "alice", 42.0)));

        // when
        let info = gateway.user_info().await.unwrap();

        // then
        assert_eq!(info.id, 7);
        assert_eq!(info.username.as_deref(), Some("alice"));
        assert_eq!(info.balance, Some(42.0));

        // and the drained queue reports the call as unscripted
        assert!(gateway.user_info().await.is_err());
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::UserInfo, GatewayCall::UserInfo]
        );
    }
}

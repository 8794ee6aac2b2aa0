use crate::error::GatewayError;
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Crash,
    Mines,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Crash => "crash",
            GameKind::Mines => "mines",
        }
    }
}

/// Response to a game-start request. `crash_point` is present for Crash
/// only; it is the local resolution threshold and must never be shown to
/// the player before the round ends.
#[derive(Clone, Debug, Deserialize)]
pub struct StartedSession {
    pub session_id: String,
    #[serde(default)]
    pub crash_point: Option<f64>,
}

/// Authoritative settlement for a cashout.
#[derive(Clone, Debug, Deserialize)]
pub struct CashoutPayout {
    pub new_balance: f64,
    pub profit: f64,
}

/// Settlement echoed back to the caller after either engine confirms a
/// cashout.
#[derive(Clone, Debug)]
pub struct CashoutReceipt {
    /// Multiplier at the moment the request was sent. Display only; the
    /// server's figures are the settlement.
    pub multiplier: f64,
    pub profit: f64,
    pub new_balance: f64,
}

/// Response to a Mines cell reveal.
#[derive(Clone, Debug, Deserialize)]
pub struct RevealResponse {
    pub is_mine: bool,
    pub current_multiplier: f64,
    #[serde(default)]
    pub game_over: Option<bool>,
    #[serde(default)]
    pub profit: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub balance: Option<f64>,
}

/// The remote game server, as seen by the engines. The server alone
/// determines outcomes; everything returned here is ground truth the
/// client defers to.
pub trait GameGateway {
    fn start_game(
        &self,
        kind: GameKind,
        bet_amount: f64,
        mines_count: Option<u32>,
    ) -> impl Future<Output = Result<StartedSession, GatewayError>>;

    fn crash_cashout(
        &self,
        session_id: &str,
        multiplier: f64,
    ) -> impl Future<Output = Result<CashoutPayout, GatewayError>>;

    fn mines_reveal(
        &self,
        session_id: &str,
        cell_index: u32,
    ) -> impl Future<Output = Result<RevealResponse, GatewayError>>;

    fn mines_cashout(
        &self,
        session_id: &str,
        multiplier: f64,
    ) -> impl Future<Output = Result<CashoutPayout, GatewayError>>;

    fn balance(&self) -> impl Future<Output = Result<f64, GatewayError>>;

    fn user_info(&self) -> impl Future<Output = Result<UserInfo, GatewayError>>;
}

//! Client for server-authoritative Crash and Mines wagering sessions.
//!
//! The server alone determines outcomes. This crate owns the per-game
//! session state machines and timing: the Crash multiplier clock and its
//! race between cashout and the undisclosed crash point, the inter-round
//! betting window, and the Mines reveal/cashout lifecycle, all kept
//! consistent with a locally cached balance that only authoritative
//! responses may write.

pub mod api;
pub mod balance;
pub mod config;
pub mod crash;
pub mod error;
pub mod gateway;
pub mod mines;
pub mod presenter;
pub mod test_helpers;
pub mod ui;
pub mod window;

pub use balance::BalanceCache;
pub use config::GameConfig;
pub use crash::{
    CrashPhase,
    CrashRoundEngine,
};
pub use error::{
    GameError,
    GatewayError,
};
pub use gateway::GameGateway;
pub use mines::{
    MinesSessionEngine,
    MinesStatus,
};
pub use presenter::Presenter;
pub use window::BettingWindowTimer;

use thiserror::Error;

/// Failure talking to the game server.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server answered with a non-success status and a message worth
    /// showing to the player.
    #[error("{0}")]
    Server(String),
    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Transport(String),
    /// The response arrived but its body did not match the wire contract.
    #[error("invalid response payload: {0}")]
    Payload(String),
}

/// Engine-level error taxonomy.
///
/// `Validation` and `SessionState` are resolved locally, before any network
/// call, and only ever reach the player as notifications. `Gateway` wraps a
/// server/network failure; the session is left in its pre-call state so the
/// player may retry.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    SessionState(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl GameError {
    pub fn is_validation(&self) -> bool {
        matches!(self, GameError::Validation(_))
    }

    pub fn is_session_state(&self) -> bool {
        matches!(self, GameError::SessionState(_))
    }
}

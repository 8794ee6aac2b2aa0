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
};
use reqwest::StatusCode;
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};

/// HTTP gateway to the game server. Identity travels as an opaque
/// init-data token in the `X-Init-Data` header on every request.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    init_data: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        init_data: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self {
            base_url,
            init_data: init_data.into(),
            http,
        })
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .header("X-Init-Data", &self.init_data)
            .json(body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(url)
            .header("X-Init-Data", &self.init_data)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>, GatewayError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(GatewayError::Server(error_message(status, &bytes)));
        }
        // 204 carries no body and is a void success.
        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_slice(&bytes)
            .map_err(|err| GatewayError::Payload(err.to_string()))?;
        Ok(Some(value))
    }

    fn require<T>(value: Option<T>, what: &str) -> Result<T, GatewayError> {
        value.ok_or_else(|| {
            GatewayError::Payload(format!("{what} response had no body"))
        })
    }
}

/// Surface the server's own message where one exists, falling back to a
/// status-coded one.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<String>,
        error: Option<String>,
    }
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.detail.or(parsed.error))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[derive(Serialize)]
struct StartGameRequest {
    game_type: GameKind,
    bet_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    mines_count: Option<u32>,
}

#[derive(Serialize)]
struct CashoutRequest<'a> {
    session_id: &'a str,
    multiplier: f64,
}

#[derive(Serialize)]
struct RevealRequest<'a> {
    session_id: &'a str,
    cell_index: u32,
}

#[derive(Deserialize)]
struct BalanceBody {
    balance: f64,
}

impl GameGateway for ApiClient {
    async fn start_game(
        &self,
        kind: GameKind,
        bet_amount: f64,
        mines_count: Option<u32>,
    ) -> Result<StartedSession, GatewayError> {
        let body = StartGameRequest {
            game_type: kind,
            bet_amount,
            mines_count,
        };
        let started = self.post("/api/game/start", &body).await?;
        Self::require(started, "game start")
    }

    async fn crash_cashout(
        &self,
        session_id: &str,
        multiplier: f64,
    ) -> Result<CashoutPayout, GatewayError> {
        let body = CashoutRequest {
            session_id,
            multiplier,
        };
        let payout = self.post("/api/game/crash/cashout", &body).await?;
        Self::require(payout, "crash cashout")
    }

    async fn mines_reveal(
        &self,
        session_id: &str,
        cell_index: u32,
    ) -> Result<RevealResponse, GatewayError> {
        let body = RevealRequest {
            session_id,
            cell_index,
        };
        let response = self.post("/api/game/mines/reveal", &body).await?;
        Self::require(response, "mines reveal")
    }

    async fn mines_cashout(
        &self,
        session_id: &str,
        multiplier: f64,
    ) -> Result<CashoutPayout, GatewayError> {
        let body = CashoutRequest {
            session_id,
            multiplier,
        };
        let payout = self.post("/api/game/mines/cashout", &body).await?;
        Self::require(payout, "mines cashout")
    }

    async fn balance(&self) -> Result<f64, GatewayError> {
        let body: Option<BalanceBody> = self.get("/api/user/balance").await?;
        // A bodiless success reads as zero by caller convention.
        Ok(body.map(|b| b.balance).unwrap_or(0.0))
    }

    async fn user_info(&self) -> Result<UserInfo, GatewayError> {
        let info = self.get("/api/user/me").await?;
        Self::require(info, "user info")
    }
}

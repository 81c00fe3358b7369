//! Client for the BPO back office REST API.
//!
//! [`ApiClient::sign_in`] hands out a [`Session`]; every authenticated call
//! takes it explicitly and [`ApiClient::sign_out`] consumes it.

mod board;

pub use board::{BoardController, DropOutcome, ProspectApi};

use crm::{Plan, Stage, StageCard};
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("unexpected response ({status}): {message}")]
    Decode { status: u16, message: String },
    #[error(transparent)]
    Board(#[from] crm::CrmError),
}

impl ClientError {
    /// Stable error code for envelope failures, `None` otherwise.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub org_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<String>,
}

/// A signed-in user. Dropping it forgets the token locally; `sign_out` also
/// clears the server cookie.
#[derive(Clone, Debug)]
pub struct Session {
    token: String,
    pub user: SessionUser,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Deserialize)]
struct SignedIn {
    token: String,
    user: SessionUser,
}

/// A prospect as the board sees it.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Prospect {
    pub id: Uuid,
    pub contact_name: String,
    pub company_name: String,
    pub stage: Stage,
    pub plan: Option<Plan>,
    pub monthly_value_cents: i64,
    #[serde(default)]
    pub service_areas: Vec<String>,
}

impl StageCard for Prospect {
    fn card_id(&self) -> Uuid {
        self.id
    }

    fn card_stage(&self) -> Option<Stage> {
        Some(self.stage)
    }

    fn card_value_cents(&self) -> i64 {
        self.monthly_value_cents
    }
}

#[derive(Deserialize)]
struct BoardPayload {
    columns: Vec<ColumnPayload>,
}

#[derive(Deserialize)]
struct ColumnPayload {
    cards: Vec<Prospect>,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured reqwest client, e.g. with custom timeouts.
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match session {
            Some(session) => builder.bearer_auth(&session.token),
            None => builder,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
            password: &'a str,
        }
        let response = self
            .request(Method::POST, "/api/auth/login", None)
            .json(&Credentials { email, password })
            .send()
            .await?;
        let signed_in: SignedIn = decode(response).await?;
        tracing::debug!(user = %signed_in.user.email, "signed in");
        Ok(Session {
            token: signed_in.token,
            user: signed_in.user,
        })
    }

    pub async fn sign_out(&self, session: Session) -> Result<(), ClientError> {
        let response = self
            .request(Method::POST, "/api/auth/logout", Some(&session))
            .send()
            .await?;
        decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    pub async fn me(&self, session: &Session) -> Result<SessionUser, ClientError> {
        let response = self
            .request(Method::GET, "/api/auth/me", Some(session))
            .send()
            .await?;
        decode(response).await
    }

    /// Every prospect on the board, column by column.
    pub async fn board_cards(&self, session: &Session) -> Result<Vec<Prospect>, ClientError> {
        let response = self
            .request(Method::GET, "/api/prospects/board", Some(session))
            .send()
            .await?;
        let board: BoardPayload = decode(response).await?;
        Ok(board.columns.into_iter().flat_map(|c| c.cards).collect())
    }

    pub async fn move_stage(
        &self,
        session: &Session,
        id: Uuid,
        stage: Stage,
    ) -> Result<Prospect, ClientError> {
        #[derive(Serialize)]
        struct StagePatch {
            stage: Stage,
        }
        let response = self
            .request(Method::PATCH, &format!("/api/prospects/{id}"), Some(session))
            .json(&StagePatch { stage })
            .send()
            .await?;
        decode(response).await
    }

    /// Bind a session for use with [`BoardController`].
    pub fn prospects(&self, session: &Session) -> SessionProspects {
        SessionProspects {
            client: self.clone(),
            session: session.clone(),
        }
    }
}

/// [`ProspectApi`] backed by the REST API under one session.
#[derive(Clone, Debug)]
pub struct SessionProspects {
    client: ApiClient,
    session: Session,
}

impl ProspectApi for SessionProspects {
    async fn board(&self) -> Result<Vec<Prospect>, ClientError> {
        self.client.board_cards(&self.session).await
    }

    async fn move_stage(&self, id: Uuid, stage: Stage) -> Result<Prospect, ClientError> {
        self.client.move_stage(&self.session, id, stage).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let envelope: Envelope<T> =
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode {
            status,
            message: err.to_string(),
        })?;
    if envelope.success {
        return envelope.data.ok_or(ClientError::Decode {
            status,
            message: "success envelope without data".into(),
        });
    }
    match envelope.error {
        Some(error) => Err(ClientError::Api {
            status,
            code: error.code,
            message: error.message,
        }),
        None => Err(ClientError::Decode {
            status,
            message: "failure envelope without error".into(),
        }),
    }
}

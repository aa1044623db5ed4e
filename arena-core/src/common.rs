//! Request and response data types of the arena REST API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Body of `POST /auth/jwt/refresh/`
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RefreshRequest {
    /// The stored refresh token
    pub refresh: String,
}

/// Successful response of `POST /auth/jwt/refresh/`
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RefreshResponse {
    /// The new access token
    pub access: String,
}

/// An access/refresh token pair, as issued on verification
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived bearer token
    pub access: String,
    /// Long-lived token used to get new access tokens
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/users/users/send_otp/`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SendOtpRequest {
    /// Phone number (or email) to send the code to
    pub identifier: String,
}

/// Body of `POST /api/users/users/verify_otp/`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifyOtpRequest {
    /// Where the code was sent
    pub identifier: String,
    /// The code the user entered
    pub code: String,
}

/// Successful response of `POST /api/users/users/verify_otp/`.
///
/// The tokens come either at the top level or nested under `tokens`.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(untagged)]
pub enum VerifyOtpResponse {
    /// `{"access": .., "refresh": ..}`
    Flat(TokenPair),
    /// `{"tokens": {"access": .., "refresh": ..}}`
    Nested {
        /// The issued tokens
        tokens: TokenPair,
    },
}

impl VerifyOtpResponse {
    /// The issued tokens
    pub fn into_tokens(self) -> TokenPair {
        match self {
            VerifyOtpResponse::Flat(tokens) | VerifyOtpResponse::Nested { tokens } => tokens,
        }
    }
}

/// Body of `POST /api/users/users/` (signup)
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    /// Mobile number
    pub phone_number: String,
    /// Chosen password
    pub password: String,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("phone_number", &self.phone_number)
            .finish_non_exhaustive()
    }
}

/// The signed-in user, as returned by `GET /api/auth/users/me`.
///
/// Unknown fields are kept so the cached copy round-trips.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct UserProfile {
    /// Display name
    #[serde(default)]
    pub username: Option<String>,
    /// Mobile number
    #[serde(default, alias = "phone")]
    pub phone_number: Option<String>,
    /// Identity verification level
    #[serde(default)]
    pub verification_level: Option<Value>,
    /// Everything else the server sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A money amount. The API sends these as numbers or decimal strings.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Amount {
    /// JSON number
    Number(serde_json::Number),
    /// Decimal string, e.g. `"1500.00"`
    Text(String),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(n) => n.fmt(f),
            Amount::Text(s) => s.fmt(f),
        }
    }
}

/// A user's wallet
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Wallet {
    /// Current balance
    pub balance: Amount,
    /// Currency, if the server names one
    #[serde(default)]
    pub currency: Option<String>,
}

/// Response of the wallet endpoints: a single wallet, a list or a page.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(untagged)]
pub enum WalletPayload {
    /// Paginated list
    Page(Page<Wallet>),
    /// Plain list
    List(Vec<Wallet>),
    /// Single object
    Single(Wallet),
}

impl WalletPayload {
    /// The user's wallet. Lists yield their first entry.
    pub fn into_wallet(self) -> Option<Wallet> {
        match self {
            WalletPayload::Page(page) => page.results.into_iter().next(),
            WalletPayload::List(list) => list.into_iter().next(),
            WalletPayload::Single(wallet) => Some(wallet),
        }
    }
}

/// A page of a paginated listing
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Page<T> {
    /// Total number of items across all pages
    pub count: u64,
    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page
    #[serde(default)]
    pub previous: Option<String>,
    /// Items on this page
    pub results: Vec<T>,
}

/// How a tournament refers to its game
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum GameRef {
    /// Just the name
    Name(String),
    /// Nested game object
    Detailed {
        /// Game name
        name: String,
    },
    /// Only the id
    Id(u64),
}

impl fmt::Display for GameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameRef::Name(name) | GameRef::Detailed { name } => name.fmt(f),
            GameRef::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// A tournament in the listing
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Tournament {
    /// Tournament id
    pub id: u64,
    /// Tournament name
    #[serde(alias = "title")]
    pub name: String,
    /// The game played
    #[serde(default)]
    pub game: Option<GameRef>,
    /// Lifecycle status, e.g. `upcoming`, `ongoing`, `finished`
    #[serde(default)]
    pub status: Option<String>,
    /// Start time as sent by the server
    #[serde(default)]
    pub start_date: Option<String>,
    /// Entry fee
    #[serde(default)]
    pub entry_fee: Option<Amount>,
    /// Prize pool
    #[serde(default)]
    pub prize_pool: Option<Amount>,
    /// Participant limit
    #[serde(default)]
    pub max_participants: Option<u32>,
}

/// Query parameters of `GET /api/tournaments/tournaments/`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TournamentQuery {
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
    /// Ordering field, `-` prefixed for descending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
    /// Status filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

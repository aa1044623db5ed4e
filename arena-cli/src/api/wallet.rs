use super::ApiClient;
use crate::error::ApiResult;
use arena_core::common::{Wallet, WalletPayload};

/// Where the wallet may live, tried in order until one isn't a 404
pub const WALLET_PATHS: [&str; 2] = ["/api/wallet/", "/api/wallet/wallets/"];

impl ApiClient {
    /// The signed-in user's wallet, `None` if they don't have one yet
    pub async fn fetch_wallet(&self) -> ApiResult<Option<Wallet>> {
        self.session.require_authenticated()?;

        let payload: WalletPayload = self.get_first_found(&WALLET_PATHS).await?.json().await?;
        Ok(payload.into_wallet())
    }
}

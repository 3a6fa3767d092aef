use crate::auth::{RefreshRequest, TokenRequest};
use crate::core::models::RefreshedToken;
use crate::core::types::AccessToken;

use super::{non_empty, Error, SpotifyProvider};

use tracing::{event, Level};

impl SpotifyProvider {
    #[tracing::instrument(skip_all)]
    pub async fn refresh_request(&self, req: RefreshRequest) -> Result<RefreshedToken, Error> {
        let refresh_token =
            non_empty(req.refresh_token).ok_or(Error::MissingParameter("refresh_token"))?;
        let client_id = self.client_id()?;

        let grant = TokenRequest::RefreshToken {
            refresh_token,
            client_id: client_id.clone(),
        };
        let tokens = self.token_request(&grant, "Failed to refresh token").await?;

        event!(Level::DEBUG, expires_in = tokens.expires_in, "Refreshed access token");
        Ok(RefreshedToken {
            access_token: AccessToken(tokens.access_token),
            expires_in: tokens.expires_in,
        })
    }
}

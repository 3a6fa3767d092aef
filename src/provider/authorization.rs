use crate::auth::{pkce, AuthorizationParams, AuthorizeRequest, Redirect, ResponseType};

use super::{non_empty, Error, SpotifyProvider};

use tracing::{event, Level};

impl SpotifyProvider {
    /// Builds the redirect to Spotify's authorization page. Input problems are
    /// reported before configuration problems.
    #[tracing::instrument(skip_all)]
    pub fn authorization_request(
        &self,
        req: AuthorizeRequest,
    ) -> Result<Redirect<AuthorizationParams>, Error> {
        let (challenge, verifier) =
            match (non_empty(req.code_challenge), non_empty(req.code_verifier)) {
                (Some(c), Some(v)) => (c, v),
                _ => return Err(Error::MissingParameter("code_challenge or code_verifier")),
            };

        let (client_id, redirect_uri) = self.credentials()?;
        let uri = Self::endpoint(&self.config.accounts_url, "authorize")?;

        event!(
            Level::DEBUG,
            client_id = ?client_id,
            "Redirecting to provider authorization"
        );
        Ok(Redirect::new(
            uri,
            AuthorizationParams {
                client_id: client_id.clone(),
                response_type: ResponseType::Code,
                redirect_uri: redirect_uri.clone(),
                scope: self.config.scope.clone(),
                challenge: pkce::Challenge::s256(challenge),
                state: verifier,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CodeChallenge, CodeVerifier};
    use crate::provider::testing;

    fn provider() -> SpotifyProvider {
        SpotifyProvider::new(testing::config(testing::unreachable(), testing::unreachable()))
    }

    #[test]
    fn requires_both_pkce_values() {
        let req = AuthorizeRequest {
            code_challenge: Some(CodeChallenge("c".to_string())),
            code_verifier: None,
        };
        assert!(matches!(
            provider().authorization_request(req),
            Err(Error::MissingParameter(_))
        ));

        let req = AuthorizeRequest {
            code_challenge: Some(CodeChallenge("c".to_string())),
            code_verifier: Some(CodeVerifier(String::new())),
        };
        assert!(matches!(
            provider().authorization_request(req),
            Err(Error::MissingParameter(_))
        ));
    }

    #[test]
    fn carries_verifier_in_state() {
        let pair = pkce::PkcePair::generate(128);
        let req = AuthorizeRequest {
            code_challenge: Some(pair.challenge.clone()),
            code_verifier: Some(pair.verifier.clone()),
        };
        let redirect = provider().authorization_request(req).unwrap();
        assert_eq!(redirect.uri.path(), "/authorize");
        assert_eq!(redirect.params.state, pair.verifier);
        assert_eq!(redirect.params.challenge.code, pair.challenge);
        assert_eq!(redirect.params.challenge.method, pkce::Transformation::S256);
    }
}

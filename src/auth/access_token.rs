use crate::core::types::{AuthCode, ClientId, CodeVerifier, RedirectUri, RefreshToken};

/// Form body sent to the provider's token endpoint.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "grant_type")]
pub enum TokenRequest {
    #[serde(rename = "authorization_code")]
    AuthorizationCode {
        code: AuthCode,
        redirect_uri: RedirectUri,
        client_id: ClientId,
        code_verifier: CodeVerifier,
    },
    #[serde(rename = "refresh_token")]
    RefreshToken {
        refresh_token: RefreshToken,
        client_id: ClientId,
    },
}

#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_requests_encode_as_forms() {
        let req = TokenRequest::RefreshToken {
            refresh_token: RefreshToken("rt".to_string()),
            client_id: ClientId("cid".to_string()),
        };
        let form = serde_urlencoded::to_string(&req).unwrap();
        assert_eq!(form, "grant_type=refresh_token&refresh_token=rt&client_id=cid");

        let req = TokenRequest::AuthorizationCode {
            code: AuthCode("abc".to_string()),
            redirect_uri: RedirectUri("http://localhost/cb".to_string()),
            client_id: ClientId("cid".to_string()),
            code_verifier: CodeVerifier("v".to_string()),
        };
        let form = serde_urlencoded::to_string(&req).unwrap();
        assert!(form.starts_with("grant_type=authorization_code&code=abc"));
        assert!(form.contains("redirect_uri=http%3A%2F%2Flocalhost%2Fcb"));
        assert!(form.ends_with("code_verifier=v"));
    }
}

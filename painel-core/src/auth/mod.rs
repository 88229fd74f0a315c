// =============================================================================
// painel-core/src/auth/mod.rs
//   Credential adapter: email/password -> login endpoint -> signed session.
// =============================================================================

use std::sync::Arc;

use tracing::{debug, info, warn};

use painel_common::models::{Credentials, Session};

use crate::api::{AtendimentoApi, LoginOutcome};
use crate::config::ConsoleConfig;
use crate::Error;

pub mod token;

pub use token::{merge_user, project_session, SessionSigner, TokenClaims};

/// Signed token plus the session materialized from it.
#[derive(Debug, Clone)]
pub struct SignedSession {
    pub token: String,
    pub session: Session,
}

pub struct CredentialAdapter {
    api: Arc<AtendimentoApi>,
    signer: SessionSigner,
}

impl CredentialAdapter {
    pub fn new(api: Arc<AtendimentoApi>, config: &ConsoleConfig) -> Self {
        Self {
            api,
            signer: SessionSigner::new(&config.session_secret, config.session_max_age),
        }
    }

    /// Exchanges credentials for the login payload.
    ///
    /// Missing email or password fails before any request is made. A 401 (or
    /// any other refusal) yields `Ok(None)`: no identity.
    pub async fn authorize(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<TokenClaims>, Error> {
        if !credentials.is_complete() {
            return Err(Error::InvalidCredentials("email and password are required".into()));
        }
        info!("Attempting to log in with email={}", credentials.email);

        match self.api.login(credentials).await? {
            LoginOutcome::Accepted(payload) => Ok(Some(payload)),
            LoginOutcome::Unauthorized => {
                info!("login refused (401) for email={}", credentials.email);
                Ok(None)
            }
            LoginOutcome::Rejected { status } => {
                warn!("login rejected, status={}", status);
                Ok(None)
            }
        }
    }

    /// Token callback: merges a new user payload on top of the token.
    pub fn jwt(&self, token: TokenClaims, user: Option<TokenClaims>) -> TokenClaims {
        merge_user(token, user)
    }

    /// Session callback.
    pub fn session(&self, token: &TokenClaims) -> Session {
        project_session(token)
    }

    /// Full sign-in: authorize, merge into a fresh token, sign, materialize.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Option<SignedSession>, Error> {
        let Some(payload) = self.authorize(credentials).await? else {
            return Ok(None);
        };
        let claims = self.jwt(self.signer.fresh_claims(), Some(payload));
        let token = self.signer.sign(&claims)?;
        let session = self.session(&claims);
        debug!("signed session for user id='{}'", session.user.id);
        Ok(Some(SignedSession { token, session }))
    }

    /// Verifies a previously issued token and materializes its session.
    pub fn restore(&self, token: &str) -> Result<SignedSession, Error> {
        let claims = self.signer.verify(token)?;
        Ok(SignedSession {
            token: token.to_string(),
            session: self.session(&claims),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpClient};

    fn adapter(mock: MockHttpClient) -> CredentialAdapter {
        let config = Arc::new(ConsoleConfig {
            session_secret: "test-secret".into(),
            ..ConsoleConfig::default()
        });
        let api = Arc::new(AtendimentoApi::new(Arc::new(mock), config.clone()));
        CredentialAdapter::new(api, &config)
    }

    #[tokio::test]
    async fn missing_fields_never_reach_the_endpoint() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json().times(0);
        let adapter = adapter(mock);

        for creds in [
            Credentials::new("", "x"),
            Credentials::new("a@ifce.edu.br", ""),
            Credentials::default(),
        ] {
            let res = adapter.sign_in(&creds).await;
            assert!(matches!(res, Err(Error::InvalidCredentials(_))), "{:?}", creds);
        }
    }

    #[tokio::test]
    async fn unauthorized_yields_no_identity() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json()
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(401, "")));
        let res = adapter(mock)
            .sign_in(&Credentials::new("a@ifce.edu.br", "x"))
            .await
            .unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn accepted_payload_is_signed_and_projected() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json().times(1).returning(|_, _| {
            Ok(HttpResponse::new(
                200,
                r#"{"user":{"id":"9","email":"a@ifce.edu.br","name":"Ana","role":"ADMIN"},
                    "access_token":"acc","refresh_token":"ref"}"#,
            ))
        });
        let adapter = adapter(mock);
        let signed = adapter
            .sign_in(&Credentials::new("a@ifce.edu.br", "x"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signed.session.access_token, "acc");
        assert_eq!(signed.session.refresh_token, "ref");
        assert_eq!(signed.session.user.id, "9");

        let restored = adapter.restore(&signed.token).unwrap();
        assert_eq!(restored.session, signed.session);
    }
}

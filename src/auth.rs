//! The login gate.
//!
//! Neither path verifies anything: the password form accepts any non-empty
//! pair, and an identity-provider credential is taken as-is. The session is a
//! plain value owned by whoever drives the views; nothing here is global.

use std::fmt;

use tracing::info;

use crate::config::AuthSettings;
use crate::error::{HahnemannError, Result};

/// How the current user got in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Password { username: String },
    /// Unverified token returned by the identity provider.
    IdentityToken { token: String },
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password { username } => write!(f, "{username}"),
            Credential::IdentityToken { .. } => f.write_str("identity provider user"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated(Credential),
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Session::Authenticated(credential) => Some(credential),
            Session::Unauthenticated => None,
        }
    }

    /// Password form submit. Both fields must be non-empty; nothing else is checked.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if username.is_empty() || password.is_empty() {
            return Err(HahnemannError::MissingCredentials);
        }
        info!(username, "signed in with password");
        *self = Session::Authenticated(Credential::Password {
            username: username.to_string(),
        });
        Ok(())
    }

    /// Identity-provider callback. The token is accepted without verification.
    pub fn accept_identity_token(&mut self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(HahnemannError::EmptyCredential);
        }
        info!("signed in with identity provider credential");
        *self = Session::Authenticated(Credential::IdentityToken {
            token: token.to_string(),
        });
        Ok(())
    }

    pub fn logout(&mut self) {
        if self.is_authenticated() {
            info!("signed out");
        }
        *self = Session::Unauthenticated;
    }

    pub fn require_authenticated(&self) -> Result<&Credential> {
        self.credential().ok_or(HahnemannError::NotAuthenticated)
    }
}

/// Instructions for the identity-provider sign-in, shown on the login view.
pub fn sign_in_instructions(settings: &AuthSettings) -> String {
    match &settings.client_id {
        Some(client_id) => format!(
            "Sign in through the identity provider ({}) with client id {},\n\
             then paste the returned credential: token <credential>",
            settings.script_url, client_id
        ),
        None => "Identity-provider sign-in is not configured (set [auth] client_id).".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_login_needs_both_fields() {
        let mut session = Session::new();
        for (user, pass) in [("", "secret"), ("asha", ""), ("", "")] {
            let err = session.login(user, pass).unwrap_err();
            assert_eq!(err.to_string(), "Please enter both username and password.");
            assert_eq!(session, Session::Unauthenticated);
        }

        session.login("asha", "anything").unwrap();
        assert_eq!(
            session.credential(),
            Some(&Credential::Password {
                username: "asha".into()
            })
        );
    }

    #[test]
    fn identity_token_is_accepted_unverified() {
        let mut session = Session::new();
        assert!(session.accept_identity_token("   ").is_err());
        assert!(!session.is_authenticated());

        session.accept_identity_token("eyJhbGciOi.not-a-real.jwt").unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn logout_always_ends_unauthenticated() {
        let mut session = Session::new();
        session.logout();
        assert_eq!(session, Session::Unauthenticated);

        session.login("asha", "pw").unwrap();
        session.logout();
        assert_eq!(session, Session::Unauthenticated);
        assert!(matches!(
            session.require_authenticated(),
            Err(HahnemannError::NotAuthenticated)
        ));
    }

    #[test]
    fn instructions_mention_the_client_id() {
        let settings = AuthSettings {
            client_id: Some("1234.apps.example".into()),
            ..AuthSettings::default()
        };
        assert!(sign_in_instructions(&settings).contains("1234.apps.example"));
        assert!(sign_in_instructions(&AuthSettings::default()).contains("not configured"));
    }
}

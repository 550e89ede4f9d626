use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use secrecy::{ExposeSecret as _, SecretString};

use crate::api::App;
use crate::config::AdminConfig;
use crate::model::{User, UserId};
use crate::prelude::*;

/// Name of the cookie carrying the signed admin session token.
pub const SESSION_COOKIE: &str = "benshi_session";

const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AuthError {
    /// failed to encode the session token
    Encode {
        source: jsonwebtoken::errors::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// failed to decode the session token
    Decode {
        source: jsonwebtoken::errors::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid login for user `{username}`"))]
    SignIn {
        username: String,
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not create the staff user `{username}`"))]
    CreateUser {
        username: String,
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Claims carried by the session cookie. Decoding one is the only way a
/// request proves it belongs to a signed-in staff user; there is no
/// session state anywhere else.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminSession {
    pub exp: i64,
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    secret: SecretString,
    validation: Validation,
    database: Database,
}

impl Authenticator {
    pub fn new(secret: impl Into<String>, database: Database) -> Authenticator {
        Authenticator {
            secret: SecretString::new(secret.into()),
            validation: Validation::new(SESSION_ALGORITHM),
            database,
        }
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.expose_secret().as_ref())
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.expose_secret().as_ref())
    }

    fn expiration(&self) -> i64 {
        (Utc::now() + Duration::days(7)).timestamp()
    }

    pub fn decode(&self, token: &str) -> Result<AdminSession, AuthError> {
        jsonwebtoken::decode(token, &self.decoding_key(), &self.validation)
            .map(|data| data.claims)
            .context(DecodeSnafu)
    }

    pub fn encode(&self, session: &AdminSession) -> Result<String, AuthError> {
        let header = jsonwebtoken::Header::new(SESSION_ALGORITHM);
        jsonwebtoken::encode(&header, session, &self.encoding_key()).context(EncodeSnafu)
    }

    pub fn session_for(&self, user: &User) -> AdminSession {
        AdminSession {
            exp: self.expiration(),
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }

    /// Session cookie for a freshly signed-in user.
    pub fn session_cookie(&self, user: &User) -> Result<Cookie<'static>, AuthError> {
        let token = self.encode(&self.session_for(user))?;

        let mut cookie = Cookie::new(SESSION_COOKIE, token);
        cookie.set_path("/");
        cookie.set_http_only(true);

        Ok(cookie)
    }

    /// Cookie matching [Authenticator::session_cookie], used to clear it.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, "");
        cookie.set_path("/");
        cookie
    }

    /// Verify credentials against staff users. The password comparison
    /// happens inside the database.
    pub async fn signin(&self, username: &str, password: &str) -> Result<User, AuthError> {
        User::find_staff(username.to_string(), password.to_string(), &self.database)
            .await
            .map(|Only(user)| user)
            .context(SignInSnafu { username })
    }

    /// Create the configured staff account unless it already exists.
    pub async fn seed_admin(&self, admin: &AdminConfig) -> Result<(), AuthError> {
        let existing = User::by_username(admin.username.clone(), &self.database)
            .await
            .context(CreateUserSnafu {
                username: admin.username.as_str(),
            })?;

        if existing.is_some() {
            return Ok(());
        }

        let Only(user) = User::create_staff(
            admin.username.clone(),
            admin.password.clone(),
            now(),
            &self.database,
        )
        .await
        .context(CreateUserSnafu {
            username: admin.username.as_str(),
        })?;

        tracing::info!(username = %user.username, "seeded staff user");
        Ok(())
    }
}

/// Admin handlers take this as an extractor; requests without a valid
/// session are redirected to the login form.
#[async_trait]
impl FromRequestParts<App> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let login = || Redirect::to("/admin-login/");

        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| login())?;

        let cookie = jar.get(SESSION_COOKIE).ok_or_else(login)?;

        state.auth.decode(cookie.value()).map_err(|_| login())
    }
}

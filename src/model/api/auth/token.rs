use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, TokenData, Validation};
use log::{debug, error};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, ErrorBody};
use crate::model::common::VoterId;

use super::user::{Rights, User};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

const BEARER_PREFIX: &str = "Bearer ";

/// An authentication token representing a specific user with specific rights,
/// as issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthToken<U> {
    /// Stable identifier of the user.
    #[serde(rename = "sub")]
    pub id: VoterId,
    #[serde(rename = "rgt")]
    pub rights: Rights,
    #[serde(skip)]
    phantom: PhantomData<U>,
}

impl<U> AuthToken<U> {
    /// Does this token permit the given rights?
    pub fn permits(&self, target: Rights) -> bool {
        self.rights == target
    }
}

impl<U> AuthToken<U>
where
    U: User,
{
    /// Decode and verify a raw JWT.
    ///
    /// This checks the signature and expiry only; rights are checked by the
    /// request guard.
    pub fn decode(token: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<U>>| claims.claims.token)?;
        Ok(token)
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<U> {
    #[serde(flatten, bound = "")]
    token: AuthToken<U>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Find the raw token, preferring the cookie over the `Authorization` header.
fn raw_token<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    if let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) {
        return Some(cookie.value());
    }
    req.headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
}

/// Fail the guard, leaving the error body for the catcher to render.
fn fail<T>(req: &Request<'_>, status: Status, err: Error) -> Outcome<T, Error> {
    debug!("Authentication failed: {err}");
    req.local_cache(|| Some(ErrorBody::from(&err)));
    Outcome::Failure((status, err))
}

#[rocket::async_trait]
impl<'r, U> FromRequest<'r> for AuthToken<U>
where
    U: User + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie or bearer header and verify that
    /// it has the correct rights for this user type.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(config) = req.rocket().state::<Config>() else {
            error!("Application config is not managed");
            return fail(
                req,
                Status::InternalServerError,
                Error::Unauthorized("authentication is not configured".to_string()),
            );
        };

        let Some(raw) = raw_token(req) else {
            return fail(
                req,
                Status::Unauthorized,
                Error::Unauthorized("missing authentication token".to_string()),
            );
        };

        // Decode the token.
        let token = match Self::decode(raw, config) {
            Ok(token) => token,
            Err(err) => return fail(req, Status::Unauthorized, err),
        };

        // Check it represents the correct rights.
        if !token.permits(U::RIGHTS) {
            let err = Error::Forbidden(format!("{} rights required", U::RIGHTS));
            return fail(req, Status::Forbidden, err);
        }

        Outcome::Success(token)
    }
}


#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::model::api::auth::{Admin, Voter};

    use super::*;

    fn config() -> Config {
        Config::new("token-test-secret")
    }

    #[test]
    fn decodes_own_tokens() {
        let config = config();
        let jwt = AuthToken::<Voter>::for_id("auth0|42").encode(&config);
        let token = AuthToken::<Voter>::decode(&jwt, &config).unwrap();
        assert_eq!(token.id.as_str(), "auth0|42");
        assert!(token.permits(Rights::Voter));
        assert!(!token.permits(Rights::Admin));
    }

    #[test]
    fn rejects_foreign_signature() {
        let jwt = AuthToken::<Admin>::example().encode(&Config::new("another-secret"));
        assert!(matches!(
            AuthToken::<Admin>::decode(&jwt, &config()),
            Err(Error::Jwt(_))
        ));
    }

    #[test]
    fn rejects_expired_tokens() {
        let config = config();
        let claims = Claims {
            token: AuthToken::<Voter>::example(),
            expire_at: Utc::now() - chrono::Duration::hours(1),
        };
        let jwt = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .unwrap();
        assert!(matches!(
            AuthToken::<Voter>::decode(&jwt, &config),
            Err(Error::Jwt(_))
        ));
    }

    #[test]
    fn claims_layout() {
        let claims = Claims {
            token: AuthToken::<Admin>::for_id("root"),
            expire_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        let value = rocket::serde::json::serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            rocket::serde::json::serde_json::json!({
                "sub": "root",
                "rgt": "admin",
                "exp": 1_700_000_000,
            })
        );
    }
}

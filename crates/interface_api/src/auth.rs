//! JWT authentication and actor resolution

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use core_kernel::{Actor, CustomerId, StaffId};

/// JWT claims carried by authenticated requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the customer or staff UUID
    pub sub: String,
    /// Role: `customer` or `staff`
    pub role: String,
    /// Expiry as a Unix timestamp
    pub exp: usize,
}

impl Claims {
    /// Resolves the claims into a domain actor
    pub fn actor(&self) -> Result<Actor, AuthError> {
        match self.role.as_str() {
            "staff" => {
                let id: StaffId = self
                    .sub
                    .parse()
                    .map_err(|_| AuthError::MalformedSubject)?;
                Ok(Actor::Staff(id))
            }
            "customer" => {
                let id: CustomerId = self
                    .sub
                    .parse()
                    .map_err(|_| AuthError::MalformedSubject)?;
                Ok(Actor::Customer(id))
            }
            _ => Err(AuthError::UnknownRole),
        }
    }
}

/// Authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token subject is not a valid identifier")]
    MalformedSubject,
    #[error("Unknown role")]
    UnknownRole,
}

/// Validates a bearer token and returns its claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

/// Issues a token for an actor; used by the login flow and by tests
pub fn issue_token(
    actor: &Actor,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let (sub, role) = match actor {
        Actor::Customer(id) => (id.as_uuid().to_string(), "customer"),
        Actor::Staff(id) => (id.as_uuid().to_string(), "staff"),
        Actor::System => return Err(AuthError::UnknownRole),
    };

    let claims = Claims {
        sub,
        role: role.to_string(),
        exp: (chrono::Utc::now().timestamp() as usize) + expiration_secs as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

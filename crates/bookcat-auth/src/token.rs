use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;

use bookcat_types::claim::TimeLimited;

use crate::error::Result;

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

/// Issues and validates HMAC-signed API tokens.
pub struct TokenManager {
    keys: Keys,
    default_validity: std::time::Duration,
    header: Header,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: impl AsRef<[u8]>, default_validity: std::time::Duration) -> Self {
        let validation = Validation::default();
        let header = Header::default();
        Self {
            keys: Keys::new(secret),
            default_validity,
            header,
            validation,
        }
    }

    pub fn issue(&self, mut claims: impl serde::Serialize + TimeLimited) -> Result<String> {
        let now = std::time::SystemTime::now();
        let validity = now + self.default_validity;
        claims.set_validity(validity);
        let token = encode(&self.header, &claims, &self.keys.encoding)?;
        Ok(token)
    }

    #[cfg(test)]
    fn issue_expired(&self, mut claims: impl serde::Serialize + TimeLimited) -> Result<String> {
        let now = std::time::SystemTime::now();
        let validity = now - self.default_validity;
        claims.set_validity(validity);
        let token = encode(&self.header, &claims, &self.keys.encoding)?;
        Ok(token)
    }

    pub fn validate<T>(&self, token: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let data = decode::<T>(token, &self.keys.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use bookcat_types::claim::{ApiClaim, Role, TimeLimited as _};

    use super::*;

    #[test]
    fn test_token() {
        let claim = ApiClaim::new("123", [Role::Admin, Role::Editor]);
        let manager = TokenManager::new("secret", std::time::Duration::from_secs(3600));
        let token = manager.issue(claim).unwrap();
        let res = manager.validate::<ApiClaim>(&token);
        assert!(res.is_ok());
        let claim = res.unwrap();
        assert_eq!(claim.sub, "123");
        assert!(claim.check_validity());
    }

    #[test]
    fn test_token_expiration() {
        let claim = ApiClaim::new("123", [Role::Admin]);
        let manager = TokenManager::new("secret", std::time::Duration::from_secs(3600));
        let token = manager.issue_expired(claim).unwrap();
        let res = manager.validate::<ApiClaim>(&token);
        match res.unwrap_err() {
            crate::Error::JwtError(e) => assert!(matches!(
                e.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            )),
        }
    }

    #[test]
    fn test_wrong_secret() {
        let claim = ApiClaim::new("123", [Role::Admin]);
        let manager = TokenManager::new("secret", std::time::Duration::from_secs(3600));
        let token = manager.issue(claim).unwrap();
        let other = TokenManager::new("other-secret", std::time::Duration::from_secs(3600));
        assert!(other.validate::<ApiClaim>(&token).is_err());
    }
}

use crate::config::Config;
use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub access: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct AuthService {
    config: Config,
}

impl AuthService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Выпускает общий токен доступа с фиксированным сроком действия.
    /// Идентичности пользователя в токене нет — пароль один на систему
    pub fn generate_token(&self) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_expiry);

        let claims = Claims {
            sub: "webui-access".to_string(),
            access: "webui".to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(AppError::from)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Номер договора, если клиент его не прислал
    pub fn generate_contract_no() -> String {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        format!(
            "CT-{}-{:06}",
            Utc::now().format("%Y%m%d"),
            rng.gen_range(100000..999999)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(token_expiry: i64) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "postgres://localhost/test".to_string(),
            jwt_secret: "test-secret-key-for-unit-tests-only".to_string(),
            token_expiry,
            access_password: "admin123".to_string(),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let service = AuthService::new(test_config(86400));
        let token = service.generate_token().unwrap();
        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "webui-access");
        assert_eq!(claims.access, "webui");
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = AuthService::new(test_config(86400)).generate_token().unwrap();
        let mut other = test_config(86400);
        other.jwt_secret = "another-secret".to_string();
        assert!(AuthService::new(other).verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // срок истёк заведомо дальше leeway декодера
        let service = AuthService::new(test_config(-300));
        let token = service.generate_token().unwrap();
        assert!(service.verify_token(&token).is_err());
    }

    #[test]
    fn test_contract_no_format() {
        let no = AuthService::generate_contract_no();
        assert!(no.starts_with("CT-"));
        assert_eq!(no.len(), "CT-20240101-123456".len());
    }
}

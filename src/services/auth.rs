// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::Store,
    models::{
        admin::{NewUser, UserChanges},
        auth::{Claims, RegisterUserPayload, UpdateProfilePayload, User, UserRole},
    },
};

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    jwt_secret: String,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, jwt_secret: String, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt_secret,
            bcrypt_cost,
        }
    }

    // bcrypt é CPU-bound: roda fora das threads do runtime
    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;

        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        Ok(hashed)
    }

    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password_clone = password.to_owned();
        let password_hash_clone = password_hash.to_owned();

        let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        Ok(is_valid)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(TOKEN_TTL_HOURS);

        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    /// Assinatura inválida, token malformado ou expirado: tudo vira `InvalidToken`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    /// Auto-registro: o papel é sempre `user`.
    pub async fn register(&self, payload: RegisterUserPayload) -> Result<User, AppError> {
        if self.store.find_user_by_email(&payload.email).await?.is_some() {
            return Err(AppError::Conflict("User with this email already exists".into()));
        }

        let password_hash = self.hash_password(&payload.password).await?;

        let user = self
            .store
            .create_user(NewUser {
                id: Uuid::new_v4(),
                email: payload.email,
                password_hash,
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone: payload.phone,
                role: UserRole::User,
            })
            .await?;

        tracing::info!(user_id = %user.id, "Novo usuário registrado");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::Unauthorized("Account is deactivated".into()));
        }

        if !self.verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, AppError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn update_profile(&self, user_id: Uuid, payload: UpdateProfilePayload) -> Result<User, AppError> {
        let changes = UserChanges {
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            ..Default::default()
        };

        self.store
            .update_user(user_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> Result<(), AppError> {
        let user = self.profile(user_id).await?;

        if !self.verify_password(current, &user.password_hash).await? {
            return Err(AppError::Unauthorized("Current password is incorrect".into()));
        }

        let password_hash = self.hash_password(new).await?;
        self.store.update_password(user_id, &password_hash).await?;
        Ok(())
    }

    /// Garante um super admin inicial (variáveis ADMIN_EMAIL / ADMIN_PASSWORD).
    pub async fn ensure_super_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Ok(());
        }

        let password_hash = self.hash_password(password).await?;
        let admin = self
            .store
            .create_user(NewUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                password_hash,
                first_name: "Super".into(),
                last_name: "Admin".into(),
                phone: None,
                role: UserRole::SuperAdmin,
            })
            .await?;

        tracing::info!(user_id = %admin.id, "👤 Super admin inicial criado");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service(secret: &str) -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), secret.to_string(), 4)
    }

    fn payload(email: &str) -> RegisterUserPayload {
        RegisterUserPayload {
            email: email.into(),
            password: "secret1".into(),
            first_name: "Ana".into(),
            last_name: "Gómez".into(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn token_round_trip_keeps_identity() {
        let auth = service("s3cret");
        let user = auth.register(payload("ana@campo.com")).await.unwrap();

        let token = auth.issue_token(&user).unwrap();
        let claims = auth.verify_token(&token).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, "ana@campo.com");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let issuer = service("one");
        let user = issuer.register(payload("x@campo.com")).await.unwrap();
        let token = issuer.issue_token(&user).unwrap();

        let err = service("two").verify_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
        assert!(matches!(service("two").verify_token("not-a-jwt"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let auth = service("s3cret");
        let past = (Utc::now() - chrono::Duration::hours(48)).timestamp() as usize;
        let claims = Claims {
            user_id: Uuid::new_v4(),
            email: "old@campo.com".into(),
            role: UserRole::User,
            exp: past,
            iat: past - 10,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"s3cret")).unwrap();

        assert!(matches!(auth.verify_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let auth = service("s3cret");
        auth.register(payload("dup@campo.com")).await.unwrap();

        let err = auth.register(payload("dup@campo.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn change_password_requires_the_current_one() {
        let auth = service("s3cret");
        let user = auth.register(payload("pw@campo.com")).await.unwrap();

        let err = auth.change_password(user.id, "wrong", "newpass1").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        auth.change_password(user.id, "secret1", "newpass1").await.unwrap();
        assert!(auth.login("pw@campo.com", "newpass1").await.is_ok());
        assert!(matches!(
            auth.login("pw@campo.com", "secret1").await,
            Err(AppError::InvalidCredentials)
        ));
    }
}

// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use agromax_backend::{
    build_router,
    db::{MemoryStore, Store},
    AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "root@agromax.test";
pub const ADMIN_PASSWORD: &str = "root-secret";
pub const PASSWORD: &str = "secret123";

/// Aplicação completa, por padrão sobre o store em memória.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Usuário comum já vinculado a um estabelecimento próprio.
pub struct Farmer {
    pub token: String,
    pub user_id: String,
    pub establishment_id: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new())).await
    }

    pub async fn with_store(store: Arc<dyn Store>) -> Self {
        // custo mínimo do bcrypt para os testes não demorarem
        let state = AppState::with_store(store, "integration-secret".into(), 4);
        state
            .auth_service
            .ensure_super_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();

        let router = build_router(state.clone(), &[]);
        Self { router, state }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login falhou: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Registra pela rota pública e devolve o id do usuário.
    pub async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "firstName": "Maria",
                    "lastName": "Souza",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registro falhou: {body}");
        body["user"]["id"].as_str().unwrap().to_string()
    }

    /// Registra um usuário e cria, via super admin, um estabelecimento do qual ele é dono.
    pub async fn farmer(&self, email: &str, farm: &str) -> Farmer {
        let user_id = self.register(email).await;
        let admin = self.admin_token().await;

        let (status, body) = self
            .post(
                "/api/admin/establishments",
                &admin,
                json!({ "name": farm, "ownerId": user_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "estabelecimento falhou: {body}");

        Farmer {
            token: self.login(email, PASSWORD).await,
            user_id,
            establishment_id: body["establishment"]["id"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_animal(&self, token: &str, body: Value) -> String {
        let (status, json) = self.post("/api/animals", token, body).await;
        assert_eq!(status, StatusCode::CREATED, "animal falhou: {json}");
        json["animal"]["id"].as_str().unwrap().to_string()
    }

    pub async fn create_rodeo(&self, token: &str, name: &str) -> String {
        let (status, json) = self.post("/api/rodeos", token, json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "rodeo falhou: {json}");
        json["rodeo"]["id"].as_str().unwrap().to_string()
    }
}

// src/services/establishment_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::non_empty},
    db::Store,
    models::establishment::{
        CreateEstablishmentPayload, Establishment, EstablishmentScope, EstablishmentSummary, Membership,
        NewEstablishment,
    },
};

#[derive(Clone)]
pub struct EstablishmentService {
    store: Arc<dyn Store>,
}

impl EstablishmentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// O estabelecimento em nome do qual o usuário opera nesta requisição.
    pub async fn resolve_scope(&self, user_id: Uuid) -> Result<EstablishmentScope, AppError> {
        self.store
            .resolve_scope(user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("User not associated with any establishment".into()))
    }

    pub async fn list(&self) -> Result<Vec<EstablishmentSummary>, AppError> {
        self.store.list_establishments().await
    }

    pub async fn create(&self, payload: CreateEstablishmentPayload) -> Result<Establishment, AppError> {
        if let Some(owner_id) = payload.owner_id {
            self.ensure_user(owner_id).await?;
        }

        let establishment = self
            .store
            .create_establishment(NewEstablishment {
                id: Uuid::new_v4(),
                name: payload.name.trim().to_string(),
                address: non_empty(payload.address),
                phone: non_empty(payload.phone),
                email: non_empty(payload.email),
                owner_id: payload.owner_id,
            })
            .await?;

        tracing::info!(establishment_id = %establishment.id, "Estabelecimento criado");
        Ok(establishment)
    }

    pub async fn assign_member(&self, establishment_id: Uuid, user_id: Uuid) -> Result<Membership, AppError> {
        self.store
            .find_establishment(establishment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Establishment not found".into()))?;
        self.ensure_user(user_id).await?;

        self.store.assign_member(establishment_id, user_id).await
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }
}

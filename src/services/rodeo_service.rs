// src/services/rodeo_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::non_empty},
    db::Store,
    models::{
        activity::{ActivityType, NewActivity},
        animal::AnimalMove,
        establishment::EstablishmentScope,
        rodeo::{MoveAnimalsPayload, MoveAnimalsResponse, Rodeo, RodeoDetail, RodeoPayload, RodeoWithCounts, UpdateRodeoPayload},
    },
};

#[derive(Clone)]
pub struct RodeoService {
    store: Arc<dyn Store>,
}

impl RodeoService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, scope: &EstablishmentScope) -> Result<Vec<RodeoWithCounts>, AppError> {
        self.store.list_rodeos(scope.id).await
    }

    pub async fn detail(&self, scope: &EstablishmentScope, id: Uuid) -> Result<RodeoDetail, AppError> {
        let rodeo = self.find(scope, id).await?;
        let animals = self.store.rodeo_animals(scope.id, rodeo.id).await?;
        Ok(RodeoDetail { rodeo, animals })
    }

    pub async fn create(&self, scope: &EstablishmentScope, actor: Uuid, payload: RodeoPayload) -> Result<Rodeo, AppError> {
        let name = payload.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::field("name", "length", "Rodeo name is required."));
        }
        self.ensure_name_free(scope, &name, None).await?;

        let now = Utc::now();
        let rodeo = Rodeo {
            id: Uuid::new_v4(),
            establishment_id: scope.id,
            name,
            description: non_empty(payload.description),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::RodeoCreated,
            "rodeo",
            rodeo.id,
            format!("Rodeo created: {}", rodeo.name),
        )
        .with_metadata(json!({ "name": rodeo.name }));

        self.store.insert_rodeo(rodeo, activity).await
    }

    pub async fn update(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        id: Uuid,
        payload: UpdateRodeoPayload,
    ) -> Result<Rodeo, AppError> {
        let mut rodeo = self.find(scope, id).await?;

        if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
            if name.is_empty() {
                return Err(AppError::field("name", "length", "Rodeo name is required."));
            }
            if name != rodeo.name {
                self.ensure_name_free(scope, &name, Some(rodeo.id)).await?;
                rodeo.name = name;
            }
        }
        if payload.description.is_some() {
            rodeo.description = non_empty(payload.description);
        }

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::RodeoUpdated,
            "rodeo",
            rodeo.id,
            format!("Rodeo updated: {}", rodeo.name),
        )
        .with_metadata(json!({ "name": rodeo.name }));

        self.store.update_rodeo(rodeo, activity).await
    }

    /// Exclusão lógica, só para rodeo sem animais ativos.
    pub async fn delete(&self, scope: &EstablishmentScope, actor: Uuid, id: Uuid) -> Result<(), AppError> {
        let rodeo = self.find(scope, id).await?;

        if self.store.count_rodeo_animals(rodeo.id).await? > 0 {
            return Err(AppError::BadRequest(
                "Cannot delete rodeo with animals. Move animals to another rodeo first.".into(),
            ));
        }

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::RodeoDeleted,
            "rodeo",
            rodeo.id,
            format!("Rodeo deleted: {}", rodeo.name),
        )
        .with_metadata(json!({ "name": rodeo.name }));

        self.store.deactivate_rodeo(rodeo.id, activity).await
    }

    /// Movimentação em lote. Ids que não são animais ativos do estabelecimento são ignorados.
    pub async fn move_animals(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        payload: MoveAnimalsPayload,
    ) -> Result<MoveAnimalsResponse, AppError> {
        if payload.animal_ids.is_empty() {
            return Err(AppError::BadRequest("Animal IDs array is required".into()));
        }
        let Some(to_rodeo_id) = payload.to_rodeo_id else {
            return Err(AppError::BadRequest("Target rodeo ID is required".into()));
        };

        let target = self
            .store
            .find_rodeo(scope.id, to_rodeo_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Target rodeo not found".into()))?;

        let animals = self.store.find_animals(scope.id, &payload.animal_ids).await?;
        let moves: Vec<AnimalMove> = animals
            .iter()
            .map(|animal| AnimalMove {
                movement_id: Uuid::new_v4(),
                animal_id: animal.id,
                from_rodeo_id: animal.current_rodeo_id,
                to_rodeo_id: Some(target.id),
            })
            .collect();

        let reason = non_empty(payload.reason);
        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::BulkAnimalMovement,
            "rodeo",
            target.id,
            format!("{} animals moved to rodeo: {}", moves.len(), target.name),
        )
        .with_metadata(json!({
            "animal_count": moves.len(),
            "reason": reason,
            "animal_ids": payload.animal_ids,
        }));

        self.store
            .record_moves(&moves, reason.as_deref(), actor, activity)
            .await?;

        tracing::info!(moved = moves.len(), rodeo_id = %target.id, "Movimentação em lote concluída");

        Ok(MoveAnimalsResponse {
            message: format!("{} animals moved successfully", moves.len()),
            moved_animals: moves.len(),
            target_rodeo: target.name,
        })
    }

    async fn find(&self, scope: &EstablishmentScope, id: Uuid) -> Result<Rodeo, AppError> {
        self.store
            .find_rodeo(scope.id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Rodeo not found".into()))
    }

    async fn ensure_name_free(&self, scope: &EstablishmentScope, name: &str, except: Option<Uuid>) -> Result<(), AppError> {
        if self.store.rodeo_name_taken(scope.id, name, except).await? {
            return Err(AppError::Conflict(
                "Rodeo name already exists in this establishment".into(),
            ));
        }
        Ok(())
    }
}

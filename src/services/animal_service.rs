// src/services/animal_service.rs

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{non_empty, PageRequest},
    },
    db::Store,
    models::{
        activity::{ActivityType, NewActivity},
        animal::{
            Animal, AnimalDetail, AnimalFilter, AnimalListQuery, AnimalListResponse, AnimalMove, AnimalPayload,
            MoveAnimalPayload,
        },
        establishment::EstablishmentScope,
        record::{
            Alert, AlertPayload, AnimalPhoto, HealthPayload, HealthRecord, PhotoPayload, ProductionPayload,
            ProductionRecord, ReproductionPayload, ReproductionRecord,
        },
    },
};

fn required<T>(value: Option<T>, field: &'static str, message: &'static str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::field(field, "required", message))
}

#[derive(Clone)]
pub struct AnimalService {
    store: Arc<dyn Store>,
}

impl AnimalService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, scope: &EstablishmentScope, query: AnimalListQuery) -> Result<AnimalListResponse, AppError> {
        let page = PageRequest::new(query.page, query.limit);
        let filter = AnimalFilter {
            search: non_empty(query.search),
            rodeo_id: query.rodeo_id,
        };

        let (animals, total) = self.store.list_animals(scope.id, &filter, page).await?;

        Ok(AnimalListResponse {
            animals,
            pagination: page.describe(total),
        })
    }

    pub async fn detail(&self, scope: &EstablishmentScope, id: Uuid) -> Result<AnimalDetail, AppError> {
        let animal = self
            .store
            .find_animal_view(scope.id, id)
            .await?
            .ok_or_else(animal_not_found)?;

        let history = self.store.animal_history(id).await?;

        Ok(AnimalDetail {
            animal,
            production_records: history.production_records,
            health_records: history.health_records,
            reproduction_records: history.reproduction_records,
            movements: history.movements,
            alerts: history.alerts,
            photos: history.photos,
        })
    }

    pub async fn create(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        payload: AnimalPayload,
    ) -> Result<Animal, AppError> {
        let external_tag = non_empty(payload.external_tag);
        let internal_tag = non_empty(payload.internal_tag);

        if external_tag.is_none() && internal_tag.is_none() {
            return Err(AppError::BadRequest(
                "At least one tag (external or internal) is required".into(),
            ));
        }

        self.ensure_tags_free(scope, external_tag.as_deref(), internal_tag.as_deref(), None)
            .await?;

        if let Some(rodeo_id) = payload.current_rodeo_id {
            self.store
                .find_rodeo(scope.id, rodeo_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Rodeo not found".into()))?;
        }
        if let Some(mother_id) = payload.mother_id {
            self.ensure_mother(scope, mother_id).await?;
        }

        let now = Utc::now();
        let animal = Animal {
            id: Uuid::new_v4(),
            establishment_id: scope.id,
            current_rodeo_id: payload.current_rodeo_id,
            mother_id: payload.mother_id,
            external_tag,
            internal_tag,
            name: non_empty(payload.name),
            birth_date: payload.birth_date,
            breed: non_empty(payload.breed),
            father_name: non_empty(payload.father_name),
            entry_date: payload.entry_date,
            observations: non_empty(payload.observations),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::AnimalCreated,
            "animal",
            animal.id,
            format!("Animal created: {}", animal.label()),
        )
        .with_metadata(json!({ "name": animal.name }));

        self.store.insert_animal(animal, activity).await
    }

    /// Atualização parcial. O rodeo só muda pelos endpoints de movimentação.
    pub async fn update(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        id: Uuid,
        payload: AnimalPayload,
    ) -> Result<Animal, AppError> {
        let mut animal = self
            .store
            .find_animal(scope.id, id)
            .await?
            .ok_or_else(animal_not_found)?;

        if let Some(tag) = non_empty(payload.external_tag) {
            animal.external_tag = Some(tag);
        }
        if let Some(tag) = non_empty(payload.internal_tag) {
            animal.internal_tag = Some(tag);
        }
        if let Some(mother_id) = payload.mother_id {
            self.ensure_mother(scope, mother_id).await?;
            animal.mother_id = Some(mother_id);
        }
        if let Some(name) = non_empty(payload.name) {
            animal.name = Some(name);
        }
        if let Some(breed) = non_empty(payload.breed) {
            animal.breed = Some(breed);
        }
        if let Some(father_name) = non_empty(payload.father_name) {
            animal.father_name = Some(father_name);
        }
        if let Some(observations) = non_empty(payload.observations) {
            animal.observations = Some(observations);
        }
        animal.birth_date = payload.birth_date.or(animal.birth_date);
        animal.entry_date = payload.entry_date.or(animal.entry_date);

        self.ensure_tags_free(
            scope,
            animal.external_tag.as_deref(),
            animal.internal_tag.as_deref(),
            Some(animal.id),
        )
        .await?;

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::AnimalUpdated,
            "animal",
            animal.id,
            format!("Animal updated: {}", animal.label()),
        )
        .with_metadata(json!({ "name": animal.name }));

        self.store.update_animal(animal, activity).await
    }

    /// Move para outro rodeo do mesmo estabelecimento, ou tira de qualquer rodeo (`toRodeoId: null`).
    pub async fn move_to(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        id: Uuid,
        payload: MoveAnimalPayload,
    ) -> Result<AnimalMove, AppError> {
        let animal = self
            .store
            .find_animal(scope.id, id)
            .await?
            .ok_or_else(animal_not_found)?;

        if let Some(rodeo_id) = payload.to_rodeo_id {
            self.store
                .find_rodeo(scope.id, rodeo_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Target rodeo not found".into()))?;
        }

        let reason = non_empty(payload.reason);
        let step = AnimalMove {
            movement_id: Uuid::new_v4(),
            animal_id: animal.id,
            from_rodeo_id: animal.current_rodeo_id,
            to_rodeo_id: payload.to_rodeo_id,
        };

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::AnimalMovement,
            "animal",
            animal.id,
            "Animal moved between rodeos",
        )
        .with_metadata(json!({
            "from_rodeo_id": step.from_rodeo_id,
            "to_rodeo_id": step.to_rodeo_id,
            "reason": reason,
        }));

        self.store
            .record_moves(std::slice::from_ref(&step), reason.as_deref(), actor, activity)
            .await?;

        Ok(step)
    }

    pub async fn add_production(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        id: Uuid,
        payload: ProductionPayload,
    ) -> Result<ProductionRecord, AppError> {
        let animal = self.find(scope, id).await?;

        let record = ProductionRecord {
            id: Uuid::new_v4(),
            animal_id: animal.id,
            record_date: required(payload.record_date, "record_date", "recordDate is required.")?,
            liters_per_day: Some(required(
                payload.liters_per_day,
                "liters_per_day",
                "litersPerDay is required.",
            )?),
            quality_rating: payload.quality_rating,
            notes: non_empty(payload.notes),
            created_by: Some(actor),
            created_at: Utc::now(),
        };

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::ProductionRecordAdded,
            "animal",
            animal.id,
            format!("Production record added for animal: {}", animal.label()),
        )
        .with_metadata(json!({
            "liters_per_day": record.liters_per_day,
            "quality_rating": record.quality_rating,
        }));

        self.store.add_production_record(record, activity).await
    }

    pub async fn add_health(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        id: Uuid,
        payload: HealthPayload,
    ) -> Result<HealthRecord, AppError> {
        let animal = self.find(scope, id).await?;

        let record = HealthRecord {
            id: Uuid::new_v4(),
            animal_id: animal.id,
            record_date: required(payload.record_date, "record_date", "recordDate is required.")?,
            event_type: payload.event_type.trim().to_string(),
            description: non_empty(payload.description),
            treatment: non_empty(payload.treatment),
            cost: payload.cost,
            veterinarian: non_empty(payload.veterinarian),
            notes: non_empty(payload.notes),
            created_by: Some(actor),
            created_at: Utc::now(),
        };

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::HealthRecordAdded,
            "animal",
            animal.id,
            format!("Health record added for animal: {}", animal.label()),
        )
        .with_metadata(json!({ "event_type": record.event_type, "cost": record.cost }));

        self.store.add_health_record(record, activity).await
    }

    pub async fn add_reproduction(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        id: Uuid,
        payload: ReproductionPayload,
    ) -> Result<ReproductionRecord, AppError> {
        let animal = self.find(scope, id).await?;

        let record = ReproductionRecord {
            id: Uuid::new_v4(),
            animal_id: animal.id,
            record_date: required(payload.record_date, "record_date", "recordDate is required.")?,
            record_type: payload.record_type.trim().to_string(),
            bull_id: non_empty(payload.bull_id),
            expected_birth_date: payload.expected_birth_date,
            actual_birth_date: payload.actual_birth_date,
            calf_sex: non_empty(payload.calf_sex),
            calf_weight: payload.calf_weight,
            notes: non_empty(payload.notes),
            created_by: Some(actor),
            created_at: Utc::now(),
        };

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::ReproductionRecordAdded,
            "animal",
            animal.id,
            format!("Reproduction record added for animal: {}", animal.label()),
        )
        .with_metadata(json!({
            "record_type": record.record_type,
            "expected_birth_date": record.expected_birth_date,
        }));

        self.store.add_reproduction_record(record, activity).await
    }

    pub async fn add_alert(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        id: Uuid,
        payload: AlertPayload,
    ) -> Result<Alert, AppError> {
        let animal = self.find(scope, id).await?;
        let now = Utc::now();

        let alert = Alert {
            id: Uuid::new_v4(),
            animal_id: animal.id,
            alert_type: payload.alert_type.trim().to_string(),
            title: payload.title.trim().to_string(),
            description: non_empty(payload.description),
            alert_date: payload.alert_date.unwrap_or_else(|| now.date_naive()),
            is_active: true,
            created_by: Some(actor),
            resolved_by: None,
            resolved_date: None,
            created_at: now,
        };

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::AlertAdded,
            "animal",
            animal.id,
            format!("Alert added for animal: {}", animal.label()),
        )
        .with_metadata(json!({ "alert_type": alert.alert_type, "title": alert.title }));

        self.store.add_alert(alert, activity).await
    }

    /// active -> resolved é terminal: um alerta já resolvido responde 404.
    pub async fn resolve_alert(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        alert_id: Uuid,
    ) -> Result<Alert, AppError> {
        let alert = self
            .store
            .find_active_alert(scope.id, alert_id)
            .await?
            .ok_or_else(alert_not_found)?;

        let today: NaiveDate = Utc::now().date_naive();
        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::AlertResolved,
            "alert",
            alert.id,
            format!("Alert resolved: {}", alert.title),
        )
        .with_metadata(json!({ "alert_type": alert.alert_type, "animal_id": alert.animal_id }));

        self.store
            .resolve_alert(alert.id, actor, today, activity)
            .await?
            .ok_or_else(alert_not_found)
    }

    pub async fn add_photo(
        &self,
        scope: &EstablishmentScope,
        actor: Uuid,
        id: Uuid,
        payload: PhotoPayload,
    ) -> Result<AnimalPhoto, AppError> {
        let animal = self.find(scope, id).await?;

        let photo = AnimalPhoto {
            id: Uuid::new_v4(),
            animal_id: animal.id,
            photo_url: payload.photo_url.trim().to_string(),
            description: non_empty(payload.description),
            is_primary: payload.is_primary,
            created_by: Some(actor),
            created_at: Utc::now(),
        };

        let activity = NewActivity::new(
            scope.id,
            actor,
            ActivityType::PhotoAdded,
            "animal",
            animal.id,
            format!("Photo added for animal: {}", animal.label()),
        )
        .with_metadata(json!({ "photo_id": photo.id, "is_primary": photo.is_primary }));

        self.store.add_photo(photo, activity).await
    }

    async fn find(&self, scope: &EstablishmentScope, id: Uuid) -> Result<Animal, AppError> {
        self.store
            .find_animal(scope.id, id)
            .await?
            .ok_or_else(animal_not_found)
    }

    async fn ensure_mother(&self, scope: &EstablishmentScope, mother_id: Uuid) -> Result<(), AppError> {
        self.store
            .find_animal(scope.id, mother_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Mother not found".into()))
    }

    async fn ensure_tags_free(
        &self,
        scope: &EstablishmentScope,
        external_tag: Option<&str>,
        internal_tag: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(tag) = external_tag {
            if self.store.external_tag_taken(tag, except).await? {
                return Err(AppError::Conflict("External tag already exists".into()));
            }
        }
        if let Some(tag) = internal_tag {
            if self.store.internal_tag_taken(scope.id, tag, except).await? {
                return Err(AppError::Conflict(
                    "Internal tag already exists in this establishment".into(),
                ));
            }
        }
        Ok(())
    }
}

fn animal_not_found() -> AppError {
    AppError::NotFound("Animal not found".into())
}

fn alert_not_found() -> AppError {
    AppError::NotFound("Alert not found".into())
}

//! # Maintenance Workflow
//!
//! Defect intake and repair tracking.
//!
//! ## Room Hold Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  priority     room side effect on raise                                 │
//! │  ─────────    ─────────────────────────────────────────────────────    │
//! │  low/medium   none - tracked in the log, room stays on the market      │
//! │  high/urgent  room forced to `maintenance` and the request marked      │
//! │               holds_room; completing THAT request releases the room    │
//! │                                                                         │
//! │  Exceptions:                                                            │
//! │  • room already held        → new request joins the log, no new hold   │
//! │  • room occupied            → guests are not evicted; the defect is    │
//! │                               logged and the room is taken out of      │
//! │                               service at the next turnaround instead   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{Action, Actor};
use crate::error::OpsResult;
use crate::rooms::RoomStateManager;
use lodge_core::{
    validation, DomainError, DomainEvent, MaintenancePriority, MaintenanceRequest,
    MaintenanceStatus, RoomStatus,
};
use lodge_db::{Database, MaintenanceRepository, OutboxRepository};

/// Intake data for a maintenance request.
#[derive(Debug, Clone)]
pub struct RaiseMaintenanceRequest {
    pub room_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: MaintenancePriority,
}

/// Maintenance request operations.
#[derive(Debug, Clone)]
pub struct MaintenanceWorkflow {
    db: Database,
}

impl MaintenanceWorkflow {
    pub fn new(db: Database) -> Self {
        MaintenanceWorkflow { db }
    }

    /// Loads a maintenance request or fails with `NotFound`.
    pub async fn get(&self, request_id: &str) -> OpsResult<MaintenanceRequest> {
        self.db
            .maintenance()
            .get_by_id(request_id)
            .await?
            .ok_or_else(|| DomainError::not_found("MaintenanceRequest", request_id).into())
    }

    /// Records a defect. High/urgent priority takes the room out of
    /// service immediately (unless occupied or already held).
    pub async fn raise(
        &self,
        actor: &Actor,
        request: RaiseMaintenanceRequest,
    ) -> OpsResult<MaintenanceRequest> {
        actor.require(Action::ManageMaintenance)?;
        let title = validation::validate_title(&request.title).map_err(DomainError::from)?;

        let room = self
            .db
            .rooms()
            .get_by_id(&request.room_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Room", &request.room_id))?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let mut holds_room = false;
        if request.priority.forces_out_of_service() {
            let already_held =
                MaintenanceRepository::holding_request_in(&mut *tx, &room.id).await?.is_some();
            let can_hold = !already_held && room.status != RoomStatus::Occupied;
            if can_hold {
                RoomStateManager::transition_in(
                    &mut *tx,
                    &room.id,
                    room.status,
                    RoomStatus::Maintenance,
                    now,
                )
                .await?;
                holds_room = true;
            }
        }

        let record = MaintenanceRequest {
            id: Uuid::new_v4().to_string(),
            room_id: room.id.clone(),
            title,
            description: request.description,
            priority: request.priority,
            status: MaintenanceStatus::Pending,
            cost_cents: None,
            holds_room,
            created_at: now,
            updated_at: now,
        };
        MaintenanceRepository::insert_in(&mut *tx, &record).await?;

        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::MaintenanceRaised {
                request_id: record.id.clone(),
                room_id: room.id.clone(),
                priority: record.priority.to_string(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            request_id = %record.id,
            room_id = %room.id,
            priority = %record.priority,
            holds_room,
            "Maintenance raised"
        );
        Ok(record)
    }

    /// `pending → in_progress`.
    pub async fn start(&self, actor: &Actor, request_id: &str) -> OpsResult<MaintenanceRequest> {
        actor.require(Action::ManageMaintenance)?;
        let request = self.get(request_id).await?;
        if !request.status.can_transition_to(MaintenanceStatus::InProgress) {
            return Err(DomainError::invalid_transition(
                "MaintenanceRequest",
                &request.id,
                request.status,
                MaintenanceStatus::InProgress,
            )
            .into());
        }

        let mut tx = self.db.begin().await?;
        let swapped =
            MaintenanceRepository::mark_in_progress_in(&mut *tx, &request.id, Utc::now()).await?;
        if !swapped {
            return Err(DomainError::invalid_transition(
                "MaintenanceRequest",
                &request.id,
                request.status,
                MaintenanceStatus::InProgress,
            )
            .into());
        }
        tx.commit().await?;

        info!(request_id, "Maintenance started");
        self.get(request_id).await
    }

    /// Completes a request, recording the final cost. If the request held
    /// its room, the room returns to `available` in the same transaction.
    ///
    /// Allowed from `pending` too - an urgent fix may be closed directly.
    ///
    /// ## Errors
    /// `AlreadyResolved` if the request is already `completed`; the cost
    /// on record is never overwritten by a second completion.
    pub async fn complete(
        &self,
        actor: &Actor,
        request_id: &str,
        cost_cents: Option<i64>,
    ) -> OpsResult<MaintenanceRequest> {
        actor.require(Action::ManageMaintenance)?;
        let request = self.get(request_id).await?;
        if request.status == MaintenanceStatus::Completed {
            return Err(DomainError::AlreadyResolved {
                entity: "MaintenanceRequest",
                id: request.id,
                status: request.status.to_string(),
            }
            .into());
        }
        if let Some(cents) = cost_cents {
            validation::validate_positive_amount(cents, "cost").map_err(DomainError::from)?;
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let swapped =
            MaintenanceRepository::complete_in(&mut *tx, &request.id, cost_cents, now).await?;
        if !swapped {
            return Err(DomainError::AlreadyResolved {
                entity: "MaintenanceRequest",
                id: request.id,
                status: MaintenanceStatus::Completed.to_string(),
            }
            .into());
        }

        if request.holds_room {
            RoomStateManager::transition_in(
                &mut *tx,
                &request.room_id,
                RoomStatus::Maintenance,
                RoomStatus::Available,
                now,
            )
            .await?;
        }

        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::MaintenanceCompleted {
                request_id: request.id.clone(),
                room_id: request.room_id.clone(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(request_id, released = request.holds_room, "Maintenance completed");
        self.get(request_id).await
    }

    /// Open requests for a room, newest first.
    pub async fn open_for_room(&self, room_id: &str) -> OpsResult<Vec<MaintenanceRequest>> {
        Ok(self.db.maintenance().list_open_for_room(room_id).await?)
    }

    /// Maintenance board column: open requests at one priority.
    pub async fn open_by_priority(
        &self,
        priority: MaintenancePriority,
    ) -> OpsResult<Vec<MaintenanceRequest>> {
        Ok(self.db.maintenance().list_open_by_priority(priority).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

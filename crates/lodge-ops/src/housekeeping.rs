//! # Housekeeping Workflow
//!
//! Turnaround pipeline between a departure and the next arrival.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check_out                    start        complete       inspect      │
//! │  room → cleaning ──────────► task ───────► task ─────────► task        │
//! │  (no task yet: the          in_progress   completed       inspected    │
//! │   implicit "pending"                                          │        │
//! │   stage of the pipeline)                                      ▼        │
//! │                                              room cleaning → available │
//! │                                                                         │
//! │  Inspection is the ONLY step that releases the room. A completed-but-  │
//! │  uninspected task keeps the room off the market.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{Action, Actor};
use crate::error::OpsResult;
use crate::rooms::RoomStateManager;
use lodge_core::{
    validation, CleaningStatus, CleaningTask, DomainError, DomainEvent, RoomStatus,
};
use lodge_db::{CleaningRepository, Database, OutboxRepository};

/// Housekeeping turnaround operations.
#[derive(Debug, Clone)]
pub struct HousekeepingWorkflow {
    db: Database,
}

impl HousekeepingWorkflow {
    pub fn new(db: Database) -> Self {
        HousekeepingWorkflow { db }
    }

    /// Loads a cleaning task or fails with `NotFound`.
    pub async fn get(&self, task_id: &str) -> OpsResult<CleaningTask> {
        self.db
            .cleaning()
            .get_by_id(task_id)
            .await?
            .ok_or_else(|| DomainError::not_found("CleaningTask", task_id).into())
    }

    /// Assigns staff to a room awaiting turnaround, opening an
    /// `in_progress` task.
    ///
    /// ## Errors
    /// `RoomUnavailable` if the room is not in `cleaning` - there is
    /// nothing to clean, or the room is out of service.
    pub async fn start_cleaning(
        &self,
        actor: &Actor,
        room_id: &str,
        assignee: &str,
    ) -> OpsResult<CleaningTask> {
        actor.require(Action::ManageHousekeeping)?;
        let assignee = validation::validate_assignee(assignee).map_err(DomainError::from)?;

        let room = self
            .db
            .rooms()
            .get_by_id(room_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Room", room_id))?;
        if room.status != RoomStatus::Cleaning {
            return Err(DomainError::RoomUnavailable {
                room_id: room.id,
                status: room.status.to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let task = CleaningTask {
            id: Uuid::new_v4().to_string(),
            room_id: room.id.clone(),
            assignee,
            status: CleaningStatus::InProgress,
            started_at: now,
            completed_at: None,
            inspected_at: None,
            archived: false,
            created_at: now,
            updated_at: now,
        };
        let mut tx = self.db.begin().await?;
        CleaningRepository::insert_in(&mut *tx, &task).await?;
        tx.commit().await?;

        info!(task_id = %task.id, room_id = %room.id, assignee = %task.assignee, "Cleaning started");
        Ok(task)
    }

    /// `in_progress → completed`. The room stays in `cleaning` until
    /// inspection signs off.
    pub async fn complete_cleaning(&self, actor: &Actor, task_id: &str) -> OpsResult<CleaningTask> {
        actor.require(Action::ManageHousekeeping)?;
        let task = self.get(task_id).await?;
        self.ensure_edge(&task, CleaningStatus::Completed)?;

        let mut tx = self.db.begin().await?;
        let swapped = CleaningRepository::mark_completed_in(&mut *tx, &task.id, Utc::now()).await?;
        if !swapped {
            return Err(DomainError::invalid_transition(
                "CleaningTask",
                &task.id,
                task.status,
                CleaningStatus::Completed,
            )
            .into());
        }
        tx.commit().await?;

        info!(task_id, "Cleaning completed, awaiting inspection");
        self.get(task_id).await
    }

    /// `completed → inspected`, releasing the room back to `available`
    /// once no unresolved task remains for it.
    pub async fn inspect_cleaning(&self, actor: &Actor, task_id: &str) -> OpsResult<CleaningTask> {
        actor.require(Action::ManageHousekeeping)?;
        let task = self.get(task_id).await?;
        self.ensure_edge(&task, CleaningStatus::Inspected)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let swapped = CleaningRepository::mark_inspected_in(&mut *tx, &task.id, now).await?;
        if !swapped {
            return Err(DomainError::invalid_transition(
                "CleaningTask",
                &task.id,
                task.status,
                CleaningStatus::Inspected,
            )
            .into());
        }

        // Release only when this was the last unresolved task; a second
        // crew still working the room keeps it gated.
        let remaining =
            CleaningRepository::unresolved_count_for_room_in(&mut *tx, &task.room_id).await?;
        if remaining == 0 {
            RoomStateManager::transition_in(
                &mut *tx,
                &task.room_id,
                RoomStatus::Cleaning,
                RoomStatus::Available,
                now,
            )
            .await?;
        }

        OutboxRepository::queue_in(
            &mut *tx,
            &DomainEvent::CleaningInspected {
                task_id: task.id.clone(),
                room_id: task.room_id.clone(),
            },
            now,
        )
        .await?;
        tx.commit().await?;

        info!(task_id, room_id = %task.room_id, released = remaining == 0, "Cleaning inspected");
        self.get(task_id).await
    }

    /// Archives all inspected tasks for a room, clearing the active log.
    /// Returns how many were archived.
    ///
    /// ## Errors
    /// `InvalidTransition` while any unresolved task exists - the log is
    /// only cleared once the room's turnaround history is fully signed
    /// off.
    pub async fn clear_log(&self, actor: &Actor, room_id: &str) -> OpsResult<u64> {
        actor.require(Action::ManageHousekeeping)?;

        let unresolved = self.db.cleaning().unresolved_count_for_room(room_id).await?;
        if unresolved > 0 {
            return Err(DomainError::invalid_transition(
                "CleaningTask",
                room_id,
                "unresolved",
                "archived",
            )
            .into());
        }

        let archived = self.db.cleaning().archive_inspected(room_id, Utc::now()).await?;
        info!(room_id, archived, "Housekeeping log cleared");
        Ok(archived)
    }

    /// A room's task log, newest first.
    pub async fn room_log(
        &self,
        room_id: &str,
        include_archived: bool,
    ) -> OpsResult<Vec<CleaningTask>> {
        Ok(self.db.cleaning().list_for_room(room_id, include_archived).await?)
    }

    fn ensure_edge(&self, task: &CleaningTask, next: CleaningStatus) -> OpsResult<()> {
        if !task.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(
                "CleaningTask",
                &task.id,
                task.status,
                next,
            )
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Integration tests for the database layer.
//!
//! These tests verify the lifecycle state machine, the transition ledger,
//! assignment validation, and the overdue sweep using an in-memory SQLite
//! database. Tests are organized by module and functionality.

use task_ledger::db::{now_ms, Database};
use task_ledger::error::{InvariantViolation, TransitionError};
use task_ledger::lifecycle::Operation;
use task_ledger::types::{Task, TaskStatus, SYSTEM_ACTOR};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

/// Helper to create a bare task with no project or deadline.
fn create_task(db: &Database, title: &str) -> Task {
    db.create_task(None, title.to_string(), None, None, vec![], None)
        .expect("Failed to create task")
}

mod entity_tests {
    use super::*;

    #[test]
    fn create_task_starts_not_started_with_created_at() {
        let db = setup_db();
        let before = now_ms();

        let task = create_task(&db, "Write release notes");

        assert_eq!(task.status, TaskStatus::NotStarted);
        assert!(task.created_at >= before);
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn create_task_rejects_empty_title() {
        let db = setup_db();

        let err = db
            .create_task(None, "   ".to_string(), None, None, vec![], None)
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<InvariantViolation>(),
            Some(&InvariantViolation::EmptyTitle)
        );
    }

    #[test]
    fn create_task_rejects_unknown_project() {
        let db = setup_db();

        let result = db.create_task(
            Some("no-such-project".to_string()),
            "Orphan".to_string(),
            None,
            None,
            vec![],
            None,
        );

        assert!(result.is_err());
    }

    #[test]
    fn create_project_rejects_empty_name() {
        let db = setup_db();

        let err = db.create_project("".to_string(), None).unwrap_err();

        assert_eq!(
            err.downcast_ref::<InvariantViolation>(),
            Some(&InvariantViolation::EmptyName)
        );
    }

    #[test]
    fn create_member_rejects_empty_name() {
        let db = setup_db();

        let err = db.create_member(" ".to_string(), vec![], None).unwrap_err();

        assert_eq!(
            err.downcast_ref::<InvariantViolation>(),
            Some(&InvariantViolation::EmptyName)
        );
    }

    #[test]
    fn list_tasks_scopes_to_project() {
        let db = setup_db();
        let project = db.create_project("Atlas".to_string(), None).unwrap();
        db.create_task(
            Some(project.id.clone()),
            "In project".to_string(),
            None,
            None,
            vec![],
            None,
        )
        .unwrap();
        create_task(&db, "Outside project");

        let scoped = db.list_tasks(Some(&project.id)).unwrap();
        let all = db.list_tasks(None).unwrap();

        assert_eq!(scoped.len(), 1);
        assert_eq!(all.len(), 2);
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn start_moves_to_in_progress_and_stamps_started_at() {
        let db = setup_db();
        let task = create_task(&db, "Implement parser");

        let task = db.transition(&task.id, Operation::Start, "alice").unwrap();

        assert_eq!(task.status, TaskStatus::InProgress);
        let started = task.started_at.expect("started_at should be set");
        assert!(started >= task.created_at);
    }

    #[test]
    fn complete_before_start_fails() {
        let db = setup_db();
        let task = create_task(&db, "Premature");

        let err = db
            .transition(&task.id, Operation::Complete, "alice")
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<TransitionError>(),
            Some(&TransitionError::TaskNotStarted)
        );
        // Failure leaves the task untouched.
        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::NotStarted);
    }

    #[test]
    fn start_twice_fails() {
        let db = setup_db();
        let task = create_task(&db, "Busy");
        db.transition(&task.id, Operation::Start, "alice").unwrap();

        let err = db
            .transition(&task.id, Operation::Start, "alice")
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<TransitionError>(),
            Some(&TransitionError::AlreadyInProgress)
        );
    }

    #[test]
    fn complete_is_idempotent_and_keeps_completed_at() {
        let db = setup_db();
        let task = create_task(&db, "Ship it");
        db.transition(&task.id, Operation::Start, "alice").unwrap();
        let done = db
            .transition(&task.id, Operation::Complete, "alice")
            .unwrap();
        let first_completed = done.completed_at.expect("completed_at should be set");

        let again = db
            .transition(&task.id, Operation::Complete, "alice")
            .expect("second complete is a no-op success");

        assert_eq!(again.status, TaskStatus::Done);
        assert_eq!(again.completed_at, Some(first_completed));
    }

    #[test]
    fn done_task_cannot_restart_or_go_overdue() {
        let db = setup_db();
        let task = create_task(&db, "Finished");
        db.transition(&task.id, Operation::Start, "alice").unwrap();
        db.transition(&task.id, Operation::Complete, "alice")
            .unwrap();

        let restart = db
            .transition(&task.id, Operation::Start, "alice")
            .unwrap_err();
        let overdue = db
            .transition(&task.id, Operation::MarkOverdue, "alice")
            .unwrap_err();

        assert_eq!(
            restart.downcast_ref::<TransitionError>(),
            Some(&TransitionError::CannotRestartCompleted)
        );
        assert_eq!(
            overdue.downcast_ref::<TransitionError>(),
            Some(&TransitionError::CannotOverdueCompleted)
        );
    }

    #[test]
    fn reopen_clears_completed_at() {
        let db = setup_db();
        let task = create_task(&db, "Regressed");
        db.transition(&task.id, Operation::Start, "alice").unwrap();
        db.transition(&task.id, Operation::Complete, "alice")
            .unwrap();

        let reopened = db.transition(&task.id, Operation::Reopen, "bob").unwrap();

        assert_eq!(reopened.status, TaskStatus::NotStarted);
        assert!(reopened.completed_at.is_none());
    }

    #[test]
    fn reopen_not_started_is_noop_success() {
        let db = setup_db();
        let task = create_task(&db, "Untouched");

        let result = db.transition(&task.id, Operation::Reopen, "alice").unwrap();

        assert_eq!(result.status, TaskStatus::NotStarted);
        assert!(db.task_history(&task.id).unwrap().is_empty());
    }

    #[test]
    fn reopen_in_progress_fails() {
        let db = setup_db();
        let task = create_task(&db, "Running");
        db.transition(&task.id, Operation::Start, "alice").unwrap();

        let err = db
            .transition(&task.id, Operation::Reopen, "alice")
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<TransitionError>(),
            Some(&TransitionError::IllegalReopen(TaskStatus::InProgress))
        );
    }

    #[test]
    fn start_from_overdue_stamps_started_at_only_once() {
        let db = setup_db();

        // Never started: going overdue then starting stamps started_at.
        let fresh = create_task(&db, "Fresh overdue");
        db.transition(&fresh.id, Operation::MarkOverdue, SYSTEM_ACTOR)
            .unwrap();
        let started = db.transition(&fresh.id, Operation::Start, "alice").unwrap();
        assert!(started.started_at.is_some());

        // Already started: the original stamp survives the overdue detour.
        let resumed = create_task(&db, "Resumed overdue");
        let first = db
            .transition(&resumed.id, Operation::Start, "alice")
            .unwrap();
        let original_started = first.started_at.unwrap();
        db.transition(&resumed.id, Operation::MarkOverdue, SYSTEM_ACTOR)
            .unwrap();
        let second = db
            .transition(&resumed.id, Operation::Start, "alice")
            .unwrap();
        assert_eq!(second.started_at, Some(original_started));
    }

    #[test]
    fn complete_from_overdue_moves_to_done() {
        let db = setup_db();
        let task = create_task(&db, "Late finish");
        db.transition(&task.id, Operation::Start, "alice").unwrap();
        db.transition(&task.id, Operation::MarkOverdue, SYSTEM_ACTOR)
            .unwrap();

        let done = db
            .transition(&task.id, Operation::Complete, "alice")
            .unwrap();

        assert_eq!(done.status, TaskStatus::Done);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn unknown_task_fails_with_task_not_found() {
        let db = setup_db();

        let err = db
            .transition("missing-id", Operation::Start, "alice")
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TransitionError>(),
            Some(TransitionError::TaskNotFound(_))
        ));
    }
}

mod ledger_tests {
    use super::*;

    #[test]
    fn each_successful_transition_appends_exactly_one_entry() {
        let db = setup_db();
        let task = create_task(&db, "Audited");
        assert_eq!(db.task_history(&task.id).unwrap().len(), 0);

        db.transition(&task.id, Operation::Start, "alice").unwrap();
        assert_eq!(db.task_history(&task.id).unwrap().len(), 1);

        db.transition(&task.id, Operation::Complete, "alice")
            .unwrap();
        assert_eq!(db.task_history(&task.id).unwrap().len(), 2);

        // Idempotent complete appends nothing.
        db.transition(&task.id, Operation::Complete, "alice")
            .unwrap();
        assert_eq!(db.task_history(&task.id).unwrap().len(), 2);
    }

    #[test]
    fn failed_transition_appends_nothing() {
        let db = setup_db();
        let task = create_task(&db, "Strict");

        let _ = db.transition(&task.id, Operation::Complete, "alice");

        assert!(db.task_history(&task.id).unwrap().is_empty());
    }

    #[test]
    fn repeated_mark_overdue_is_recorded_as_self_transition() {
        let db = setup_db();
        let task = create_task(&db, "Stale");
        db.transition(&task.id, Operation::MarkOverdue, SYSTEM_ACTOR)
            .unwrap();

        db.transition(&task.id, Operation::MarkOverdue, SYSTEM_ACTOR)
            .unwrap();

        let history = db.task_history(&task.id).unwrap();
        assert_eq!(history.len(), 2);
        let last = history.last().unwrap();
        assert_eq!(last.from_status, TaskStatus::Overdue);
        assert_eq!(last.to_status, TaskStatus::Overdue);
    }

    #[test]
    fn status_matches_newest_ledger_entry() {
        let db = setup_db();
        let task = create_task(&db, "Tracked");

        // Empty ledger means NotStarted.
        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::NotStarted);
        assert!(db.task_history(&task.id).unwrap().is_empty());

        for (op, actor) in [
            (Operation::Start, "alice"),
            (Operation::MarkOverdue, SYSTEM_ACTOR),
            (Operation::Complete, "alice"),
            (Operation::Reopen, "bob"),
        ] {
            db.transition(&task.id, op, actor).unwrap();
            let stored = db.get_task(&task.id).unwrap().unwrap();
            let history = db.task_history(&task.id).unwrap();
            assert_eq!(stored.status, history.last().unwrap().to_status);
        }
    }

    #[test]
    fn entries_record_actor_and_ordered_timestamps() {
        let db = setup_db();
        let task = create_task(&db, "Attributed");
        db.transition(&task.id, Operation::Start, "alice").unwrap();
        db.transition(&task.id, Operation::MarkOverdue, SYSTEM_ACTOR)
            .unwrap();
        db.transition(&task.id, Operation::Complete, "bob").unwrap();

        let history = db.task_history(&task.id).unwrap();

        let actors: Vec<&str> = history.iter().map(|e| e.actor_id.as_str()).collect();
        assert_eq!(actors, vec!["alice", SYSTEM_ACTOR, "bob"]);
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(history.windows(2).all(|w| w[0].id < w[1].id));
    }
}

mod assignment_tests {
    use super::*;

    #[test]
    fn assign_sets_assignee() {
        let db = setup_db();
        let member = db
            .create_member("alice".to_string(), vec!["rust".to_string()], None)
            .unwrap();
        let task = db
            .create_task(
                None,
                "Needs rust".to_string(),
                None,
                None,
                vec!["rust".to_string()],
                None,
            )
            .unwrap();

        let (updated, warnings) = db.assign_task(&task.id, &member.id).unwrap();

        assert_eq!(updated.assignee_id, Some(member.id));
        assert!(warnings.is_empty());
    }

    #[test]
    fn assign_rejects_missing_skill() {
        let db = setup_db();
        let member = db.create_member("bob".to_string(), vec![], None).unwrap();
        let task = db
            .create_task(
                None,
                "Needs sql".to_string(),
                None,
                None,
                vec!["sql".to_string()],
                None,
            )
            .unwrap();

        let err = db.assign_task(&task.id, &member.id).unwrap_err();

        assert!(err.to_string().contains("sql"));
        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert!(stored.assignee_id.is_none());
    }

    #[test]
    fn assign_rejects_member_at_capacity() {
        let db = setup_db();
        let member = db
            .create_member("carol".to_string(), vec![], Some(1))
            .unwrap();
        let busy = create_task(&db, "Current work");
        db.assign_task(&busy.id, &member.id).unwrap();
        db.transition(&busy.id, Operation::Start, "carol").unwrap();

        let next = create_task(&db, "One too many");
        let err = db.assign_task(&next.id, &member.id).unwrap_err();

        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn assign_warns_when_filling_last_slot() {
        let db = setup_db();
        let member = db
            .create_member("dave".to_string(), vec![], Some(1))
            .unwrap();
        let task = create_task(&db, "Last slot");

        let (_, warnings) = db.assign_task(&task.id, &member.id).unwrap();

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("at capacity"));
    }
}

mod sweep_tests {
    use super::*;

    #[test]
    fn sweep_marks_past_deadline_tasks_as_system() {
        let db = setup_db();
        let now = now_ms();
        let late = db
            .create_task(
                None,
                "Past due".to_string(),
                None,
                None,
                vec![],
                Some(now - 1_000),
            )
            .unwrap();
        let ok = db
            .create_task(
                None,
                "Plenty of time".to_string(),
                None,
                None,
                vec![],
                Some(now + 86_400_000),
            )
            .unwrap();
        let no_deadline = create_task(&db, "No deadline");

        let swept = db.sweep_overdue(now).unwrap();

        assert_eq!(swept, vec![late.id.clone()]);
        let late = db.get_task(&late.id).unwrap().unwrap();
        assert_eq!(late.status, TaskStatus::Overdue);
        let history = db.task_history(&late.id).unwrap();
        assert_eq!(history.last().unwrap().actor_id, SYSTEM_ACTOR);

        for id in [&ok.id, &no_deadline.id] {
            let task = db.get_task(id).unwrap().unwrap();
            assert_eq!(task.status, TaskStatus::NotStarted);
        }
    }

    #[test]
    fn sweep_skips_completed_tasks() {
        let db = setup_db();
        let now = now_ms();
        let task = db
            .create_task(
                None,
                "Done late".to_string(),
                None,
                None,
                vec![],
                Some(now - 1_000),
            )
            .unwrap();
        db.transition(&task.id, Operation::Start, "alice").unwrap();
        db.transition(&task.id, Operation::Complete, "alice")
            .unwrap();

        let swept = db.sweep_overdue(now).unwrap();

        assert!(swept.is_empty());
        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Done);
    }

    #[test]
    fn repeated_sweep_extends_the_audit_trail() {
        let db = setup_db();
        let now = now_ms();
        let task = db
            .create_task(
                None,
                "Chronically late".to_string(),
                None,
                None,
                vec![],
                Some(now - 1_000),
            )
            .unwrap();

        db.sweep_overdue(now).unwrap();
        db.sweep_overdue(now).unwrap();

        let history = db.task_history(&task.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].from_status, TaskStatus::Overdue);
        assert_eq!(history[1].to_status, TaskStatus::Overdue);
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn task_and_ledger_round_trip_through_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("ledger.db");

        let task_id = {
            let db = Database::open(&db_path).unwrap();
            let task = create_task(&db, "Durable");
            db.transition(&task.id, Operation::Start, "alice").unwrap();
            db.transition(&task.id, Operation::Complete, "bob").unwrap();
            task.id
        };

        let db = Database::open(&db_path).unwrap();
        let snapshot = db.task_snapshot(&task_id).unwrap().unwrap();

        assert_eq!(snapshot.task.status, TaskStatus::Done);
        assert!(snapshot.task.started_at.is_some());
        assert!(snapshot.task.completed_at.is_some());
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.history[0].to_status, TaskStatus::InProgress);
        assert_eq!(snapshot.history[1].to_status, TaskStatus::Done);
    }
}

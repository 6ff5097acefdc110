//! End-to-end scenarios against the full `voltrek-server` stack:
//! command service, session manager, and broadcast hub wired together
//! the way `main.rs` wires them.

use std::sync::Arc;

use voltrek_core::{ConfigRegistry, Direction};
use voltrek_server::command::CommandService;
use voltrek_server::hub::{BroadcastHub, ForwardOutcome};
use voltrek_server::session::{FsPersistence, SessionManager};

async fn stack() -> (CommandService, Arc<BroadcastHub>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let persistence = Arc::new(FsPersistence::new(dir.path().join("sessions")));
    let registry = Arc::new(ConfigRegistry::new(dir.path().join("configs")));
    let sessions = Arc::new(SessionManager::load(persistence, registry.clone()).await);
    let hub = Arc::new(BroadcastHub::new(16));
    let commands = CommandService::new(sessions, hub.clone(), registry, 50);
    (commands, hub, dir)
}

#[tokio::test]
async fn moving_broadcasts_the_new_state_to_subscribers() {
    let (commands, hub, _dir) = stack().await;
    let info = commands.create_session(None).await.unwrap();
    let session_id = voltrek_server::session::SessionId::parse(&info.id);

    let mut sub = hub.subscribe(&session_id).await;

    commands.mv(&info.id, Direction::Right, false).await.unwrap();

    match sub.next().await {
        ForwardOutcome::Message(envelope) => {
            assert_eq!(envelope.session_id, info.id);
            assert_eq!(envelope.game_state.state.score, 1);
        }
        other => panic!("expected a message, got {other:?}"),
    }
}

#[tokio::test]
async fn subscribers_on_one_session_never_see_another_sessions_moves() {
    let (commands, hub, _dir) = stack().await;
    let a = commands.create_session(None).await.unwrap();
    let b = commands.create_session(None).await.unwrap();

    let b_id = voltrek_server::session::SessionId::parse(&b.id);
    let mut sub_b = hub.subscribe(&b_id).await;

    commands.mv(&a.id, Direction::Right, false).await.unwrap();
    commands.mv(&b.id, Direction::Right, false).await.unwrap();

    match sub_b.next().await {
        ForwardOutcome::Message(envelope) => assert_eq!(envelope.session_id, b.id),
        other => panic!("expected a message, got {other:?}"),
    }
}

#[tokio::test]
async fn e5_bulk_move_truncation_reports_the_limit() {
    let (commands, _hub, _dir) = stack().await;
    let info = commands.create_session(None).await.unwrap();
    let dirs: Vec<Direction> = (0..60)
        .map(|i| if i % 2 == 0 { Direction::Right } else { Direction::Left })
        .collect();

    let result = commands.bulk_move(&info.id, dirs, false).await.unwrap();

    assert_eq!(result.requested_moves, 60);
    assert_eq!(result.limit, 50);
    assert!(result.truncated);
    assert_eq!(result.moves_executed, 50);
}

#[tokio::test]
async fn e6_reset_clears_current_moves_but_not_cumulative_history() {
    let (commands, _hub, _dir) = stack().await;
    let info = commands.create_session(None).await.unwrap();
    commands.mv(&info.id, Direction::Right, false).await.unwrap();
    commands.mv(&info.id, Direction::Left, false).await.unwrap();

    commands.reset(&info.id).await.unwrap();

    let state = commands.get_state(&info.id).await.unwrap();
    assert_eq!(state.current_moves_count, 0);

    let page = commands.history(&info.id, Some(1), Some(10), None).await.unwrap();
    assert_eq!(page.total_moves, 2);
    assert_eq!(page.entries.len(), 2);
}

#[tokio::test]
async fn deleting_a_session_removes_its_broadcast_topic() {
    let (commands, hub, _dir) = stack().await;
    let info = commands.create_session(None).await.unwrap();
    let session_id = voltrek_server::session::SessionId::parse(&info.id);
    let _sub = hub.subscribe(&session_id).await;
    assert_eq!(hub.subscriber_count(&session_id).await, 1);

    commands.delete_session(&info.id).await.unwrap();

    assert_eq!(hub.subscriber_count(&session_id).await, 0);
}

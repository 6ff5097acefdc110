//! The command service: the single mutation entry point every transport
//! goes through. No business logic belongs anywhere else (spec §9).

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use voltrek_core::{CellKind, ConfigRegistry, Direction, GameConfig, MoveEntry, Position, Step, StepFailureReason};

use crate::hub::BroadcastHub;
use crate::session::{now_unix, Session, SessionError, SessionId, SessionManager, SortBy, SortOrder};
use crate::snapshot::{EnrichedState, StateEnvelope};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(id) => CommandError::NotFound(id),
            SessionError::Conflict => CommandError::Conflict(e.to_string()),
            SessionError::Internal(msg) => CommandError::Internal(msg),
        }
    }
}

/// The position a blocked or crashed move was aimed at.
#[derive(Clone, Debug, Serialize)]
pub struct AttemptedTo {
    pub x: i32,
    pub y: i32,
    pub tile_char: char,
    pub tile_kind: CellKind,
    pub passable: bool,
}

impl AttemptedTo {
    fn from_step(step: &Step) -> Self {
        Self {
            x: step.to.x,
            y: step.to.y,
            tile_char: step.tile_char,
            tile_kind: step.tile_kind,
            passable: step.tile_kind.is_passable(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub config_name: String,
    pub created_at: u64,
    pub last_accessed_at: u64,
    pub game_state: EnrichedState,
    pub game_config: GameConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct MoveResult {
    pub success: bool,
    pub step: Step,
    pub attempted_to: Option<AttemptedTo>,
    pub game_state: EnrichedState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReasonCode {
    Blocked,
    WallCrash,
    OutOfBattery,
    GameOver,
    Victory,
}

impl StopReasonCode {
    fn from_failure(reason: StepFailureReason) -> Self {
        match reason {
            StepFailureReason::Blocked => StopReasonCode::Blocked,
            StepFailureReason::WallCrash => StopReasonCode::WallCrash,
            StepFailureReason::OutOfBattery => StopReasonCode::OutOfBattery,
            StepFailureReason::GameOver => StopReasonCode::GameOver,
        }
    }

    fn human(self) -> &'static str {
        match self {
            StopReasonCode::Blocked => "blocked by an obstacle",
            StopReasonCode::WallCrash => "crashed into a wall",
            StopReasonCode::OutOfBattery => "ran out of battery",
            StopReasonCode::GameOver => "the game was already over",
            StopReasonCode::Victory => "every park was collected",
        }
    }
}

/// Only `Final` is wired up in v1 (spec.md explicitly permits this);
/// `Each` is left as a documented extension point rather than built and
/// half-wired (see the Open Questions resolution in DESIGN.md).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastMode {
    Final,
}

#[derive(Clone, Debug, Serialize)]
pub struct BulkMoveResult {
    pub requested_moves: usize,
    pub moves_executed: usize,
    pub truncated: bool,
    pub limit: usize,
    pub stopped_reason: Option<String>,
    pub stop_reason_code: Option<StopReasonCode>,
    pub stopped_on_move: Option<usize>,
    pub steps: Vec<Step>,
    pub attempted_to: Option<AttemptedTo>,
    pub start_pos: Position,
    pub end_pos: Position,
    pub start_battery: u32,
    pub end_battery: u32,
    pub score_delta: i64,
    pub game_state: EnrichedState,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResetResult {
    pub message: String,
    pub game_state: EnrichedState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeleteResult {
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<MoveEntry>,
    pub total_moves: u64,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

pub struct CommandService {
    sessions: Arc<SessionManager>,
    hub: Arc<BroadcastHub>,
    registry: Arc<ConfigRegistry>,
    max_bulk: usize,
}

impl CommandService {
    pub fn new(sessions: Arc<SessionManager>, hub: Arc<BroadcastHub>, registry: Arc<ConfigRegistry>, max_bulk: usize) -> Self {
        Self {
            sessions,
            hub,
            registry,
            max_bulk,
        }
    }

    pub async fn create_session(&self, config_name: Option<&str>) -> Result<SessionInfo, CommandError> {
        let session = self.sessions.create(config_name).await?;
        Ok(self.to_session_info(&session))
    }

    pub async fn get_session(&self, session_id: &str) -> Result<SessionInfo, CommandError> {
        let session = self.sessions.get(session_id).await?;
        Ok(self.to_session_info(&session))
    }

    pub async fn list_sessions(
        &self,
        sort_by: SortBy,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Vec<SessionInfo> {
        self.sessions
            .list(sort_by, order, limit)
            .await
            .iter()
            .map(|s| self.to_session_info(s))
            .collect()
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<DeleteResult, CommandError> {
        self.sessions.delete(session_id).await?;
        self.hub.remove_topic(&SessionId::parse(session_id)).await;
        Ok(DeleteResult {
            message: format!("session {session_id} deleted"),
        })
    }

    pub async fn get_state(&self, session_id: &str) -> Result<EnrichedState, CommandError> {
        let session = self.sessions.get(session_id).await?;
        Ok(EnrichedState::from_state(&session.state))
    }

    /// `move(id, direction, reset?)`: the single-move command.
    pub async fn mv(&self, session_id: &str, dir: Direction, reset_first: bool) -> Result<MoveResult, CommandError> {
        let registry = self.registry.clone();
        let (session, step) = self
            .sessions
            .mutate(session_id, move |session| {
                let config = registry.load_or_default(&session.config_name);
                if reset_first {
                    session.state.reset(&config);
                }
                let from = session.state.player_pos;
                let (new_state, step) = voltrek_core::apply(&session.state, &config, dir);
                session.state = new_state;
                session.state.total_moves += 1;
                let entry = MoveEntry {
                    action: dir,
                    from,
                    to: step.to,
                    battery_after: step.battery_after,
                    unix_ts: now_unix(),
                    success: step.success,
                    move_number: session.state.total_moves,
                };
                session.state.move_history.push(entry);
                session.state.current_moves.push(entry);
                step
            })
            .await?;

        self.publish(&session).await;

        let attempted_to = (!step.success
            && matches!(
                step.reason,
                Some(StepFailureReason::Blocked) | Some(StepFailureReason::WallCrash)
            ))
        .then(|| AttemptedTo::from_step(&step));

        Ok(MoveResult {
            success: step.success,
            step,
            attempted_to,
            game_state: EnrichedState::from_state(&session.state),
        })
    }

    /// `bulk_move(id, moves[], reset?)`.
    pub async fn bulk_move(
        &self,
        session_id: &str,
        dirs: Vec<Direction>,
        reset_first: bool,
    ) -> Result<BulkMoveResult, CommandError> {
        let requested_moves = dirs.len();
        let truncated = requested_moves > self.max_bulk;
        let dirs: Vec<Direction> = dirs.into_iter().take(self.max_bulk).collect();

        let registry = self.registry.clone();
        let (session, outcome) = self
            .sessions
            .mutate(session_id, move |session| {
                run_bulk(session, &registry, reset_first, &dirs)
            })
            .await?;

        self.publish(&session).await;

        let stopped_reason = outcome.stop_reason_code.map(|c| c.human().to_string());

        Ok(BulkMoveResult {
            requested_moves,
            moves_executed: outcome.steps.len(),
            truncated,
            limit: self.max_bulk,
            stopped_reason,
            stop_reason_code: outcome.stop_reason_code,
            stopped_on_move: outcome.stopped_on_move,
            steps: outcome.steps,
            attempted_to: outcome.attempted_to,
            start_pos: outcome.start_pos,
            end_pos: outcome.end_pos,
            start_battery: outcome.start_battery,
            end_battery: outcome.end_battery,
            score_delta: outcome.score_delta,
            game_state: EnrichedState::from_state(&session.state),
        })
    }

    /// `reset(id)`.
    pub async fn reset(&self, session_id: &str) -> Result<ResetResult, CommandError> {
        let registry = self.registry.clone();
        let (session, message) = self
            .sessions
            .mutate(session_id, move |session| {
                let config = registry.load_or_default(&session.config_name);
                session.state.reset(&config);
                session.state.message.clone()
            })
            .await?;

        self.publish(&session).await;

        Ok(ResetResult {
            message,
            game_state: EnrichedState::from_state(&session.state),
        })
    }

    /// `history(id, page?, limit?, order?)`, paginating the cumulative
    /// `move_history`, not `current_moves`.
    pub async fn history(
        &self,
        session_id: &str,
        page: Option<usize>,
        limit: Option<usize>,
        order: Option<HistoryOrder>,
    ) -> Result<HistoryPage, CommandError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(20).min(100);
        let order = order.unwrap_or(HistoryOrder::Desc);

        if page == 0 {
            return Err(CommandError::InvalidArgument("page must be >= 1".into()));
        }
        if limit == 0 {
            return Err(CommandError::InvalidArgument("limit must be >= 1".into()));
        }

        // History doesn't change state, but it is still a command: it
        // touches `last_accessed_at` like every other one (spec §4.C).
        let (session, _) = self.sessions.mutate(session_id, |_| ()).await?;

        let mut entries = session.state.move_history.clone();
        if order == HistoryOrder::Desc {
            entries.reverse();
        }
        let total = entries.len();
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1) * limit;
        let page_entries: Vec<MoveEntry> = entries.into_iter().skip(start).take(limit).collect();

        Ok(HistoryPage {
            entries: page_entries,
            total_moves: session.state.total_moves,
            page,
            page_size: limit,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        })
    }

    async fn publish(&self, session: &Session) {
        let envelope = StateEnvelope {
            session_id: session.id.to_string(),
            game_state: EnrichedState::from_state(&session.state),
        };
        self.hub.publish(&session.id, envelope).await;
    }

    fn to_session_info(&self, session: &Session) -> SessionInfo {
        let config = self.registry.load_or_default(&session.config_name);
        SessionInfo {
            id: session.id.to_string(),
            config_name: session.config_name.clone(),
            created_at: session.created_at,
            last_accessed_at: session.last_accessed_at,
            game_state: EnrichedState::from_state(&session.state),
            game_config: (*config).clone(),
        }
    }
}

struct BulkOutcome {
    steps: Vec<Step>,
    stop_reason_code: Option<StopReasonCode>,
    stopped_on_move: Option<usize>,
    attempted_to: Option<AttemptedTo>,
    start_pos: Position,
    end_pos: Position,
    start_battery: u32,
    end_battery: u32,
    score_delta: i64,
}

fn run_bulk(session: &mut Session, registry: &ConfigRegistry, reset_first: bool, dirs: &[Direction]) -> BulkOutcome {
    let config = registry.load_or_default(&session.config_name);
    if reset_first {
        session.state.reset(&config);
    }

    let start_pos = session.state.player_pos;
    let start_battery = session.state.battery;
    let start_score = session.state.score;

    let mut steps = Vec::with_capacity(dirs.len());
    let mut stop_reason_code = None;
    let mut stopped_on_move = None;
    let mut attempted_to = None;

    for (i, &dir) in dirs.iter().enumerate() {
        let idx = i + 1;
        if session.state.game_over {
            stop_reason_code = Some(StopReasonCode::GameOver);
            stopped_on_move = Some(idx);
            break;
        }

        let from = session.state.player_pos;
        let (new_state, step) = voltrek_core::apply(&session.state, &config, dir);
        session.state = new_state;
        session.state.total_moves += 1;
        let entry = MoveEntry {
            action: dir,
            from,
            to: step.to,
            battery_after: step.battery_after,
            unix_ts: now_unix(),
            success: step.success,
            move_number: session.state.total_moves,
        };
        session.state.move_history.push(entry);
        session.state.current_moves.push(entry);

        let victory = step.victory;
        let failure_reason = step.reason;
        steps.push(step);

        if let Some(reason) = failure_reason {
            stop_reason_code = Some(StopReasonCode::from_failure(reason));
            stopped_on_move = Some(idx);
            attempted_to = Some(AttemptedTo::from_step(steps.last().unwrap()));
            break;
        }
        if victory {
            stop_reason_code = Some(StopReasonCode::Victory);
            stopped_on_move = Some(idx);
            break;
        }
    }

    BulkOutcome {
        steps,
        stop_reason_code,
        stopped_on_move,
        attempted_to,
        start_pos,
        end_pos: session.state.player_pos,
        start_battery,
        end_battery: session.state.battery,
        score_delta: session.state.score as i64 - start_score as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FsPersistence;

    async fn command_service() -> (CommandService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(FsPersistence::new(dir.path().join("sessions")));
        let registry = Arc::new(ConfigRegistry::new(dir.path().join("configs")));
        let sessions = Arc::new(SessionManager::load(persistence, registry.clone()).await);
        let hub = Arc::new(BroadcastHub::new(16));
        (CommandService::new(sessions, hub, registry, 50), dir)
    }

    #[tokio::test]
    async fn e1_move_right_collects_a_park() {
        let (service, _dir) = command_service().await;
        let info = service.create_session(None).await.unwrap();

        let result = service.mv(&info.id, Direction::Right, false).await.unwrap();

        assert!(result.success);
        assert_eq!(result.game_state.state.score, 1);
        assert_eq!(result.game_state.state.battery, 7);
    }

    #[tokio::test]
    async fn e2_blocked_move_reports_attempted_to() {
        let (service, _dir) = command_service().await;
        let info = service.create_session(None).await.unwrap();
        // Home -> Park, then Park -> Building: the second move is blocked.
        service.mv(&info.id, Direction::Right, false).await.unwrap();

        let result = service.mv(&info.id, Direction::Right, false).await.unwrap();

        assert!(!result.success);
        assert!(result.attempted_to.is_some());
        assert_eq!(result.game_state.state.battery, 7);
    }

    #[tokio::test]
    async fn e5_bulk_truncates_at_limit() {
        let (service, _dir) = command_service().await;
        let info = service.create_session(None).await.unwrap();
        // Bounce Home <-> Park forever: never blocked, never game over, so
        // every one of the (truncated) 50 moves actually executes.
        let dirs: Vec<Direction> = (0..60)
            .map(|i| if i % 2 == 0 { Direction::Right } else { Direction::Left })
            .collect();

        let result = service.bulk_move(&info.id, dirs, false).await.unwrap();

        assert_eq!(result.requested_moves, 60);
        assert!(result.truncated);
        assert_eq!(result.limit, 50);
        assert_eq!(result.moves_executed, 50);
        assert!(result.stop_reason_code.is_none());
    }

    #[tokio::test]
    async fn e3_bulk_right_left_right() {
        let (service, _dir) = command_service().await;
        let info = service.create_session(None).await.unwrap();
        let dirs = vec![Direction::Right, Direction::Left, Direction::Right];

        let result = service.bulk_move(&info.id, dirs, false).await.unwrap();

        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.end_battery, 9);
        assert_eq!(result.score_delta, 1);
    }

    #[tokio::test]
    async fn e6_reset_then_history() {
        let (service, _dir) = command_service().await;
        let info = service.create_session(None).await.unwrap();
        service
            .bulk_move(&info.id, vec![Direction::Right, Direction::Left, Direction::Right], false)
            .await
            .unwrap();

        service.reset(&info.id).await.unwrap();

        let state = service.get_state(&info.id).await.unwrap();
        assert_eq!(state.current_moves_count, 0);

        let page = service
            .history(&info.id, Some(1), Some(5), Some(HistoryOrder::Desc))
            .await
            .unwrap();
        assert!(page.total_moves >= 3);
    }

    #[tokio::test]
    async fn sessions_are_isolated_through_the_command_service() {
        let (service, _dir) = command_service().await;
        let a = service.create_session(None).await.unwrap();
        let b = service.create_session(None).await.unwrap();

        service.mv(&a.id, Direction::Right, false).await.unwrap();

        let b_state = service.get_state(&b.id).await.unwrap();
        assert_eq!(b_state.state.score, 0);
    }

    #[tokio::test]
    async fn history_rejects_zero_page() {
        let (service, _dir) = command_service().await;
        let info = service.create_session(None).await.unwrap();
        let err = service.history(&info.id, Some(0), None, None).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (service, _dir) = command_service().await;
        let err = service.mv("zzzz", Direction::Up, false).await.unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
    }
}

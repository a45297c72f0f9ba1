use std::fmt;

use serde::{Deserialize, Serialize};

use super::board::{Board, BoardError, Outcome, Player, CELL_COUNT};
use crate::ai::{eval, Algorithm, EngineConfig, MoveDecision, SearchTree};
use crate::utils;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MoveError {
    GameFinished,
    OutOfRange { position: usize },
    CellOccupied { position: usize },
    NotHumanTurn,
    NotComputerTurn,
    NoMoveAvailable,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::GameFinished => write!(f, "the game is already over"),
            MoveError::OutOfRange { position } => {
                write!(f, "position {position} is outside 0..{CELL_COUNT}")
            }
            MoveError::CellOccupied { position } => write!(f, "cell {position} is occupied"),
            MoveError::NotHumanTurn => write!(f, "it is not X's turn"),
            MoveError::NotComputerTurn => write!(f, "it is not O's turn"),
            MoveError::NoMoveAvailable => write!(f, "the engine found no move"),
        }
    }
}

impl std::error::Error for MoveError {}

/// 最近一次电脑落子的搜索统计。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiStats {
    pub nodes_explored: u64,
    pub algorithm: Algorithm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    pub duration_ms: u64,
}

impl AiStats {
    fn idle(algorithm: Algorithm) -> Self {
        Self {
            nodes_explored: 0,
            algorithm,
            score: None,
            duration_ms: 0,
        }
    }
}

/// 返回给前端的对局快照。对局进行中 `current_player` 由棋盘推出，结束后固定为 X。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub board: Board,
    pub current_player: Player,
    pub game_over: bool,
    pub winner: Option<Outcome>,
    pub ai_stats: AiStats,
}

/// 单局人机对弈：X 为人类，O 由当前选定的搜索引擎落子。
#[derive(Debug, Clone)]
pub struct GameSession {
    config: EngineConfig,
    board: Board,
    algorithm: Algorithm,
    outcome: Option<Outcome>,
    stats: AiStats,
}

impl GameSession {
    pub fn new(config: EngineConfig) -> Self {
        let algorithm = config.algorithm;
        Self {
            config,
            board: Board::new(),
            algorithm,
            outcome: None,
            stats: AiStats::idle(algorithm),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
        self.stats.algorithm = algorithm;
    }

    /// 校验后替换当前棋盘。
    pub fn load_board(&mut self, board: Board) -> Result<(), BoardError> {
        board.validate()?;
        self.board = board;
        self.outcome = eval::outcome(&board);
        self.stats = AiStats::idle(self.algorithm);
        Ok(())
    }

    /// 人类（X）在 `position` 落子。
    pub fn make_move(&mut self, position: usize) -> Result<Option<Outcome>, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameFinished);
        }
        if position >= CELL_COUNT {
            return Err(MoveError::OutOfRange { position });
        }
        if !self.board.is_empty_at(position) {
            return Err(MoveError::CellOccupied { position });
        }
        if self.board.to_move() != Player::X {
            return Err(MoveError::NotHumanTurn);
        }

        self.apply(position, Player::X);
        Ok(self.outcome)
    }

    pub fn ai_move(&mut self) -> Result<MoveDecision, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameFinished);
        }
        if self.board.to_move() != Player::O {
            return Err(MoveError::NotComputerTurn);
        }

        let decision = self.algorithm.engine().best_move(&self.board);
        self.stats = AiStats {
            nodes_explored: decision.nodes_visited,
            algorithm: decision.algorithm,
            score: decision.score,
            duration_ms: decision.duration_ms,
        };
        let position = decision.position.ok_or(MoveError::NoMoveAvailable)?;
        utils::log(&format!(
            "AI({}) 落子 {position}，搜索 {} 个节点，用时 {}ms",
            decision.algorithm, decision.nodes_visited, decision.duration_ms
        ));
        self.apply(position, Player::O);
        Ok(decision)
    }

    /// 人类落子后若对局未结束，电脑立即应手。
    pub fn play_turn(&mut self, position: usize) -> Result<GameSnapshot, MoveError> {
        self.make_move(position)?;
        if !self.is_over() {
            self.ai_move()?;
        }
        Ok(self.snapshot())
    }

    /// 导出当前算法的搜索树，缺省使用本局棋盘。
    pub fn tree(&self, board: Option<&Board>) -> SearchTree {
        let board = board.unwrap_or(&self.board);
        let tree = self
            .algorithm
            .engine()
            .export_tree(board, self.config.tree_depth);
        utils::log(&format!(
            "搜索树导出：{} 个节点，{} 个被剪枝（{}，深度 {}）",
            tree.nodes_explored,
            tree.pruned_count(),
            self.algorithm,
            tree.max_depth
        ));
        tree
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board,
            current_player: if self.is_over() {
                Player::X
            } else {
                self.board.to_move()
            },
            game_over: self.is_over(),
            winner: self.outcome,
            ai_stats: self.stats.clone(),
        }
    }

    /// 清空棋盘，算法恢复为配置中的默认值。
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    fn apply(&mut self, position: usize, player: Player) {
        self.board = self.board.with_mark(position, player);
        self.outcome = eval::outcome(&self.board);
        if let Some(outcome) = self.outcome {
            utils::log(&format!("对局结束：{outcome:?}\n{}", self.board));
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_move_is_answered_by_the_engine() {
        let mut session = GameSession::default();
        let snapshot = session.play_turn(4).expect("opening move is legal");

        assert_eq!(snapshot.board[4], crate::game::Cell::X);
        assert_eq!(snapshot.board.count(crate::game::Cell::O), 1);
        assert_eq!(snapshot.current_player, Player::X);
        assert!(!snapshot.game_over);
        assert!(snapshot.ai_stats.nodes_explored > 0);
        assert_eq!(snapshot.ai_stats.algorithm, Algorithm::Minimax);
    }

    #[test]
    fn rejects_illegal_moves() {
        let mut session = GameSession::default();
        assert_eq!(
            session.make_move(9),
            Err(MoveError::OutOfRange { position: 9 })
        );

        session.make_move(0).expect("legal move");
        assert_eq!(session.make_move(1), Err(MoveError::NotHumanTurn));
        session.ai_move().expect("engine replies");
        assert_eq!(
            session.make_move(0),
            Err(MoveError::CellOccupied { position: 0 })
        );
    }

    #[test]
    fn ai_waits_for_its_turn() {
        let mut session = GameSession::default();
        assert_eq!(session.ai_move(), Err(MoveError::NotComputerTurn));
    }

    #[test]
    fn engine_takes_the_win_and_ends_the_game() {
        let mut session = GameSession::default();
        session.set_algorithm(Algorithm::AlphaBeta);
        session
            .load_board("OO.XX.X..".parse().expect("valid board"))
            .expect("reachable position");

        let decision = session.ai_move().expect("engine moves");
        assert_eq!(decision.position, Some(2));
        assert_eq!(session.outcome(), Some(Outcome::OWins));
        assert_eq!(session.make_move(5), Err(MoveError::GameFinished));

        let snapshot = session.snapshot();
        assert!(snapshot.game_over);
        assert_eq!(snapshot.winner, Some(Outcome::OWins));
        assert_eq!(snapshot.ai_stats.algorithm, Algorithm::AlphaBeta);
    }

    #[test]
    fn filling_the_board_is_a_tie() {
        let mut session = GameSession::default();
        session
            .load_board("XOXXOOOX.".parse().expect("valid board"))
            .expect("reachable position");
        assert_eq!(session.make_move(8), Ok(Some(Outcome::Tie)));
        assert_eq!(session.snapshot().winner, Some(Outcome::Tie));
    }

    #[test]
    fn finished_game_reports_x_as_current_player() {
        let mut session = GameSession::default();
        session
            .load_board("XX.OO....".parse().expect("valid board"))
            .expect("reachable position");
        assert_eq!(session.make_move(2), Ok(Some(Outcome::XWins)));
        assert_eq!(session.board().to_move(), Player::O);
        assert_eq!(session.snapshot().current_player, Player::X);

        session
            .load_board("OO.XX.X..".parse().expect("valid board"))
            .expect("reachable position");
        session.ai_move().expect("engine moves");
        assert_eq!(session.snapshot().current_player, Player::X);
    }

    #[test]
    fn load_board_validates_and_detects_finished_games() {
        let mut session = GameSession::default();
        assert_eq!(
            session.load_board("OOO......".parse().expect("valid board")),
            Err(BoardError::ImpossibleCounts { x: 0, o: 3 })
        );
        session
            .load_board("XXXOO....".parse().expect("valid board"))
            .expect("reachable position");
        assert_eq!(session.outcome(), Some(Outcome::XWins));
    }

    #[test]
    fn tree_uses_configured_depth_and_selected_engine() {
        let config = EngineConfig::default()
            .with_tree_depth(2)
            .expect("depth within range");
        let mut session = GameSession::new(config);
        let tree = session.tree(None);
        assert_eq!(tree.max_depth, 2);
        assert_eq!(tree.nodes_explored, 82);
        assert_eq!(tree.pruned_count(), 0);

        session.set_algorithm(Algorithm::AlphaBeta);
        let position: Board = "OO.XX.X..".parse().expect("valid board");
        let tree = session.tree(Some(&position));
        assert_eq!(tree.pruned_count(), 6);
    }

    #[test]
    fn reset_restores_configured_algorithm() {
        let config = EngineConfig::default().with_algorithm(Algorithm::AlphaBeta);
        let mut session = GameSession::new(config);
        session.set_algorithm(Algorithm::Minimax);
        session.play_turn(0).expect("legal move");

        session.reset();
        assert_eq!(session.board(), &Board::new());
        assert_eq!(session.algorithm(), Algorithm::AlphaBeta);
        assert!(!session.is_over());
    }

    #[test]
    fn snapshot_matches_frontend_field_names() {
        let session = GameSession::default();
        let json = serde_json::to_value(session.snapshot()).expect("snapshot serialises");
        assert_eq!(json["current_player"], "X");
        assert_eq!(json["game_over"], false);
        assert!(json["winner"].is_null());
        assert_eq!(json["ai_stats"]["algorithm"], "minmax");
        assert_eq!(json["ai_stats"]["nodes_explored"], 0);
        assert_eq!(json["board"].as_array().map(Vec::len), Some(CELL_COUNT));
    }
}

//! 对局模块：棋盘模型与人机对局会话。

pub mod board;
pub mod session;

pub use board::{Board, BoardError, Cell, Outcome, Player, BOARD_SIDE, CELL_COUNT, LINES};
pub use session::{AiStats, GameSession, GameSnapshot, MoveError};

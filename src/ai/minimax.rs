use super::engine::{Algorithm, SearchEngine, SearchStats};
use super::eval;
use super::tree::{self, Exhaustive, SearchTree};
use crate::game::{Board, Player};

/// 不剪枝的极小化极大搜索，完整展开到终局。
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimaxEngine;

impl SearchEngine for MinimaxEngine {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Minimax
    }

    fn search(&self, board: &Board, stats: &mut SearchStats) -> (i32, Option<usize>) {
        minimax(*board, 0, true, stats)
    }

    fn export_tree(&self, board: &Board, max_depth: u32) -> SearchTree {
        tree::export_tree(board, max_depth, &Exhaustive)
    }
}

fn minimax(
    board: Board,
    depth: u32,
    maximizing: bool,
    stats: &mut SearchStats,
) -> (i32, Option<usize>) {
    stats.visit(depth);
    if let Some(score) = eval::terminal_score(&board, depth) {
        return (score, None);
    }

    let mover = if maximizing { Player::O } else { Player::X };
    let mut best_score = if maximizing { i32::MIN } else { i32::MAX };
    let mut best_move = None;
    for position in board.empty_indices() {
        let (score, _) = minimax(board.with_mark(position, mover), depth + 1, !maximizing, stats);
        let improves = if maximizing {
            score > best_score
        } else {
            score < best_score
        };
        if improves {
            best_score = score;
            best_move = Some(position);
        }
    }
    (best_score, best_move)
}

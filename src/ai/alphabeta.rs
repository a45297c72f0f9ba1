use super::engine::{Algorithm, SearchEngine, SearchStats};
use super::eval;
use super::tree::{self, AlphaBetaWindow, SearchTree};
use crate::game::{Board, Player};

/// 带 α-β 剪枝的极小化极大搜索。终局估值与着法顺序与 [`MinimaxEngine`] 相同，
/// 因此选出的着法价值一致，访问节点数不会更多。
///
/// [`MinimaxEngine`]: super::minimax::MinimaxEngine
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaBetaEngine;

impl SearchEngine for AlphaBetaEngine {
    fn algorithm(&self) -> Algorithm {
        Algorithm::AlphaBeta
    }

    fn search(&self, board: &Board, stats: &mut SearchStats) -> (i32, Option<usize>) {
        // 根节点由这里的循环展开，不计入访问数。
        if let Some(score) = eval::terminal_score(board, 0) {
            return (score, None);
        }

        // 根节点只提升 alpha，beta 保持开放。
        let mut alpha = i32::MIN;
        let beta = i32::MAX;
        let mut best_score = i32::MIN;
        let mut best_move = None;
        for position in board.empty_indices() {
            let (score, _) = alpha_beta(
                board.with_mark(position, Player::O),
                1,
                alpha,
                beta,
                false,
                stats,
            );
            if score > best_score {
                best_score = score;
                best_move = Some(position);
            }
            alpha = alpha.max(score);
        }
        (best_score, best_move)
    }

    fn export_tree(&self, board: &Board, max_depth: u32) -> SearchTree {
        tree::export_tree(board, max_depth, &AlphaBetaWindow)
    }
}

fn alpha_beta(
    board: Board,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    stats: &mut SearchStats,
) -> (i32, Option<usize>) {
    stats.visit(depth);
    if let Some(score) = eval::terminal_score(&board, depth) {
        return (score, None);
    }

    if maximizing {
        let mut value = i32::MIN;
        let mut best_move = None;
        for position in board.empty_indices() {
            let (score, _) = alpha_beta(
                board.with_mark(position, Player::O),
                depth + 1,
                alpha,
                beta,
                false,
                stats,
            );
            if score > value {
                value = score;
                best_move = Some(position);
            }
            alpha = alpha.max(value);
            if beta <= alpha {
                break;
            }
        }
        (value, best_move)
    } else {
        let mut value = i32::MAX;
        let mut best_move = None;
        for position in board.empty_indices() {
            let (score, _) = alpha_beta(
                board.with_mark(position, Player::X),
                depth + 1,
                alpha,
                beta,
                true,
                stats,
            );
            if score < value {
                value = score;
                best_move = Some(position);
            }
            beta = beta.min(value);
            if beta <= alpha {
                break;
            }
        }
        (value, best_move)
    }
}

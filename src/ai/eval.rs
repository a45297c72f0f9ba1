//! 终局判断与静态估值，两种搜索共用。

use crate::game::{Board, Cell, Outcome, Player, LINES};

/// 终局分值的绝对值；搜索中再按深度修正。
pub const WIN_SCORE: i32 = 10;

const TWO_IN_LINE: i32 = 3;
const ONE_IN_LINE: i32 = 1;

pub fn is_winner(board: &Board, player: Player) -> bool {
    let mark = player.mark();
    LINES
        .iter()
        .any(|line| line.iter().all(|&index| board[index] == mark))
}

pub fn empty_cells(board: &Board) -> Vec<usize> {
    board.empty_indices().collect()
}

pub fn is_terminal(board: &Board) -> bool {
    is_winner(board, Player::O) || is_winner(board, Player::X) || board.is_full()
}

pub fn outcome(board: &Board) -> Option<Outcome> {
    if is_winner(board, Player::O) {
        Some(Outcome::OWins)
    } else if is_winner(board, Player::X) {
        Some(Outcome::XWins)
    } else if board.is_full() {
        Some(Outcome::Tie)
    } else {
        None
    }
}

/// 终局估值，距根 `depth` 步；对局未结束时为 `None`。
pub fn terminal_score(board: &Board, depth: u32) -> Option<i32> {
    let depth = depth as i32;
    if is_winner(board, Player::O) {
        Some(WIN_SCORE - depth)
    } else if is_winner(board, Player::X) {
        Some(depth - WIN_SCORE)
    } else if board.is_full() {
        Some(0)
    } else {
        None
    }
}

/// 静态估值，O 为正。终局为 ±10 / 0；否则逐条连线累加：
/// 两子加一空 ±3，一子加两空 ±1。
pub fn score(board: &Board) -> i32 {
    if is_winner(board, Player::O) {
        return WIN_SCORE;
    }
    if is_winner(board, Player::X) {
        return -WIN_SCORE;
    }
    if board.is_full() {
        return 0;
    }

    LINES.iter().map(|line| line_score(board, line)).sum()
}

fn line_score(board: &Board, line: &[usize; 3]) -> i32 {
    let mut o_count = 0;
    let mut x_count = 0;
    let mut empty = 0;
    for &index in line {
        match board[index] {
            Cell::O => o_count += 1,
            Cell::X => x_count += 1,
            Cell::Empty => empty += 1,
        }
    }

    match (o_count, x_count, empty) {
        (2, _, 1) => TWO_IN_LINE,
        (_, 2, 1) => -TWO_IN_LINE,
        (1, _, 2) => ONE_IN_LINE,
        (_, 1, 2) => -ONE_IN_LINE,
        _ => 0,
    }
}

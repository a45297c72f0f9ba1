use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use crate::ai::eval;

pub const CELL_COUNT: usize = 9;
pub const BOARD_SIDE: usize = 3;

/// 8 条获胜连线：3 行、3 列、2 条对角线，按行优先的格子下标给出。
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 单个格子的状态，序列化为 `""`、`"X"`、`"O"`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            "" => Some(Cell::Empty),
            "X" | "x" => Some(Cell::X),
            "O" | "o" => Some(Cell::O),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// 对局双方：X 为人类，O 为电脑。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    pub fn mark(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }

    pub fn is_maximizing(self) -> bool {
        self == Player::O
    }
}

impl FromStr for Player {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Player::X),
            "O" | "o" => Ok(Player::O),
            other => Err(BoardError::UnknownPlayer {
                value: other.to_string(),
            }),
        }
    }
}

/// 对局结果，序列化为 `"X"`、`"O"` 或 `"Tie"`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    #[serde(rename = "X")]
    XWins,
    #[serde(rename = "O")]
    OWins,
    Tie,
}

impl Outcome {
    pub fn won_by(player: Player) -> Self {
        match player {
            Player::X => Outcome::XWins,
            Player::O => Outcome::OWins,
        }
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            Outcome::XWins => Some(Player::X),
            Outcome::OWins => Some(Player::O),
            Outcome::Tie => None,
        }
    }
}

/// 棋盘校验错误。核心搜索假定输入已通过校验，校验由调用方完成。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardError {
    WrongLength { len: usize },
    InvalidCell { index: usize, value: String },
    ImpossibleCounts { x: usize, o: usize },
    MultipleWinners,
    UnknownPlayer { value: String },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::WrongLength { len } => {
                write!(f, "board must contain {CELL_COUNT} cells, got {len}")
            }
            BoardError::InvalidCell { index, value } => {
                write!(f, "invalid cell {value:?} at index {index}")
            }
            BoardError::ImpossibleCounts { x, o } => {
                write!(f, "impossible mark counts: {x} X vs {o} O")
            }
            BoardError::MultipleWinners => write!(f, "both players own a winning line"),
            BoardError::UnknownPlayer { value } => write!(f, "unknown player {value:?}"),
        }
    }
}

impl std::error::Error for BoardError {}

/// 3×3 棋盘，行优先存储。值类型，搜索时按值复制，不做原地修改。
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "Vec<String>")]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn parse_cells<S: AsRef<str>>(symbols: &[S]) -> Result<Self, BoardError> {
        if symbols.len() != CELL_COUNT {
            return Err(BoardError::WrongLength { len: symbols.len() });
        }
        let mut cells = [Cell::Empty; CELL_COUNT];
        for (index, symbol) in symbols.iter().enumerate() {
            cells[index] =
                Cell::from_symbol(symbol.as_ref()).ok_or_else(|| BoardError::InvalidCell {
                    index,
                    value: symbol.as_ref().to_string(),
                })?;
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        self.get(index).is_some_and(Cell::is_empty)
    }

    /// 返回在 `index` 处落下 `player` 棋子后的新棋盘，原棋盘不变。
    pub fn with_mark(&self, index: usize, player: Player) -> Self {
        debug_assert!(self.is_empty_at(index), "cell {index} is already occupied");
        let mut next = *self;
        next.cells[index] = player.mark();
        next
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// 空格下标，升序。这个顺序决定了两种搜索的着法遍历顺序与平分时的取舍。
    pub fn empty_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// 轮到谁走完全由棋子数推出：X 数不多于 O 数时轮到 X，否则轮到 O。
    pub fn to_move(&self) -> Player {
        if self.count(Cell::X) <= self.count(Cell::O) {
            Player::X
        } else {
            Player::O
        }
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        let x = self.count(Cell::X);
        let o = self.count(Cell::O);
        if x != o && x != o + 1 {
            return Err(BoardError::ImpossibleCounts { x, o });
        }
        if eval::is_winner(self, Player::X) && eval::is_winner(self, Player::O) {
            return Err(BoardError::MultipleWinners);
        }
        Ok(())
    }

    pub fn to_compact(&self) -> String {
        self.cells.iter().map(|cell| cell.symbol()).collect()
    }
}

impl Index<usize> for Board {
    type Output = Cell;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[index]
    }
}

impl TryFrom<Vec<String>> for Board {
    type Error = BoardError;

    fn try_from(symbols: Vec<String>) -> Result<Self, Self::Error> {
        Board::parse_cells(&symbols)
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.cells.serialize(serializer)
    }
}

/// 解析紧凑形式：`.` `_` `-` 与空格表示空格子，`/` 和换行忽略。
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols: Vec<char> = s.chars().filter(|c| !matches!(c, '/' | '\n' | '\r')).collect();
        if symbols.len() != CELL_COUNT {
            return Err(BoardError::WrongLength { len: symbols.len() });
        }
        let mut cells = [Cell::Empty; CELL_COUNT];
        for (index, symbol) in symbols.into_iter().enumerate() {
            cells[index] = match symbol {
                '.' | '_' | '-' | ' ' => Cell::Empty,
                'X' | 'x' => Cell::X,
                'O' | 'o' => Cell::O,
                other => {
                    return Err(BoardError::InvalidCell {
                        index,
                        value: other.to_string(),
                    })
                }
            };
        }
        Ok(Self { cells })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(BOARD_SIDE).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for (col, cell) in chunk.iter().enumerate() {
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", cell.symbol())?;
            }
        }
        Ok(())
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::alphabeta::AlphaBetaEngine;
use super::minimax::MinimaxEngine;
use super::tree::SearchTree;
use crate::game::Board;
use crate::utils::Stopwatch;

/// 导出搜索树时允许的最大深度。
pub const MAX_TREE_DEPTH: u32 = 4;
pub const DEFAULT_TREE_DEPTH: u32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "minmax", alias = "minimax")]
    Minimax,
    #[serde(rename = "alphabeta", alias = "alpha-beta")]
    AlphaBeta,
}

impl Algorithm {
    /// 返回算法对应的搜索引擎，两者调用签名一致，可随时切换。
    pub fn engine(self) -> &'static dyn SearchEngine {
        match self {
            Algorithm::Minimax => &MinimaxEngine,
            Algorithm::AlphaBeta => &AlphaBetaEngine,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Minimax => "minmax",
            Algorithm::AlphaBeta => "alphabeta",
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minmax" | "minimax" => Ok(Algorithm::Minimax),
            "alphabeta" | "alpha-beta" | "alpha_beta" | "ab" => Ok(Algorithm::AlphaBeta),
            _ => Err(ConfigError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ConfigError {
    UnknownAlgorithm { name: String },
    TreeDepthTooLarge { depth: u32, max: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownAlgorithm { name } => write!(f, "unknown algorithm {name:?}"),
            ConfigError::TreeDepthTooLarge { depth, max } => {
                write!(f, "tree depth {depth} exceeds the maximum of {max}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default)]
    pub algorithm: Algorithm,
    /// 导出搜索树的深度上限，不超过 [`MAX_TREE_DEPTH`]。
    #[serde(default = "default_tree_depth")]
    pub tree_depth: u32,
    /// `think_ai` 在开始搜索前的等待时间（毫秒）。
    #[serde(default)]
    pub think_delay_ms: u32,
}

fn default_tree_depth() -> u32 {
    DEFAULT_TREE_DEPTH
}

impl EngineConfig {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_tree_depth(mut self, depth: u32) -> Result<Self, ConfigError> {
        self.tree_depth = depth;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree_depth > MAX_TREE_DEPTH {
            return Err(ConfigError::TreeDepthTooLarge {
                depth: self.tree_depth,
                max: MAX_TREE_DEPTH,
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            tree_depth: default_tree_depth(),
            think_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub depth_reached: u32,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn visit(&mut self, depth: u32) {
        self.nodes += 1;
        if depth > self.depth_reached {
            self.depth_reached = depth;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveDecision {
    #[serde(rename = "move")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    pub nodes_visited: u64,
    pub depth_reached: u32,
    pub algorithm: Algorithm,
    pub duration_ms: u64,
}

/// 搜索引擎的公共接口。电脑方固定为 O，`best_move` 总是为 O 选点。
pub trait SearchEngine {
    fn algorithm(&self) -> Algorithm;

    /// O 方走棋的完整搜索，返回根节点价值与着法。棋盘至少有一个空格。
    fn search(&self, board: &Board, stats: &mut SearchStats) -> (i32, Option<usize>);

    fn export_tree(&self, board: &Board, max_depth: u32) -> SearchTree;

    fn best_move(&self, board: &Board) -> MoveDecision {
        let watch = Stopwatch::start();
        let mut stats = SearchStats::new();
        let (score, position) = if board.is_full() {
            (None, None)
        } else {
            let (score, position) = self.search(board, &mut stats);
            (Some(score), position)
        };

        MoveDecision {
            position,
            score,
            nodes_visited: stats.nodes,
            depth_reached: stats.depth_reached,
            algorithm: self.algorithm(),
            duration_ms: watch.elapsed_ms(),
        }
    }
}

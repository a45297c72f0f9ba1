//! 搜索算法模块：极小化极大、α-β 剪枝与搜索树导出。

pub mod alphabeta;
pub mod engine;
pub mod eval;
pub mod minimax;
pub mod tree;

pub use alphabeta::AlphaBetaEngine;
pub use engine::{
    Algorithm, ConfigError, EngineConfig, MoveDecision, SearchEngine, SearchStats,
    DEFAULT_TREE_DEPTH, MAX_TREE_DEPTH,
};
pub use eval::{empty_cells, is_winner, score};
pub use minimax::MinimaxEngine;
pub use tree::{
    export_tree, AlphaBetaWindow, Bounds, Exhaustive, NodeId, PruningPolicy, SearchEdge,
    SearchNode, SearchTree,
};

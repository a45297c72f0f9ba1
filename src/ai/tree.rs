//! 搜索树导出。极小化极大与 α-β 共用同一个按深度截断的遍历，
//! 区别只在于剪枝策略 [`PruningPolicy`]。

use serde::{Deserialize, Serialize};

use super::eval;
use crate::game::{Board, Player};

/// 节点标识：单次导出内自增，等于节点在 `nodes` 中的下标。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchNode {
    pub id: NodeId,
    pub board: Board,
    pub score: i32,
    pub depth: u32,
    pub is_pruned: bool,
    pub current_player: Player,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub is_pruned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchTree {
    pub nodes: Vec<SearchNode>,
    pub edges: Vec<SearchEdge>,
    pub max_depth: u32,
    pub nodes_explored: usize,
}

impl SearchTree {
    pub fn root(&self) -> Option<&SearchNode> {
        self.nodes.first()
    }

    pub fn node(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(id.index())
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SearchNode> + '_ {
        self.edges
            .iter()
            .filter(move |edge| edge.from == id)
            .filter_map(move |edge| self.node(edge.to))
    }

    pub fn pruned_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_pruned).count()
    }
}

/// 剪枝策略：决定某个子节点返回后，其余兄弟节点是否还需要展开。
pub trait PruningPolicy {
    type Window: Copy;

    fn root_window(&self) -> Self::Window;

    /// 记录子节点价值，返回 `true` 表示剪掉其余兄弟节点。
    fn record(&self, window: &mut Self::Window, mover: Player, value: i32) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive;

impl PruningPolicy for Exhaustive {
    type Window = ();

    fn root_window(&self) -> Self::Window {}

    fn record(&self, _window: &mut Self::Window, _mover: Player, _value: i32) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub alpha: i32,
    pub beta: i32,
}

/// α-β 窗口，与对弈搜索中的更新规则一致。
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaBetaWindow;

impl PruningPolicy for AlphaBetaWindow {
    type Window = Bounds;

    fn root_window(&self) -> Self::Window {
        Bounds {
            alpha: i32::MIN,
            beta: i32::MAX,
        }
    }

    fn record(&self, window: &mut Self::Window, mover: Player, value: i32) -> bool {
        if mover.is_maximizing() {
            window.alpha = window.alpha.max(value);
        } else {
            window.beta = window.beta.min(value);
        }
        window.beta <= window.alpha
    }
}

/// 按深度上限导出搜索树。叶子保留静态估值，内部节点改写为回传值；
/// 被剪掉的兄弟节点作为 `is_pruned` 叶子输出，不参与回传。
pub fn export_tree<P: PruningPolicy>(board: &Board, max_depth: u32, policy: &P) -> SearchTree {
    let mut builder = TreeBuilder {
        policy,
        max_depth,
        nodes: Vec::new(),
        edges: Vec::new(),
    };
    builder.visit(*board, 0, None, policy.root_window());

    let nodes_explored = builder.nodes.len();
    SearchTree {
        nodes: builder.nodes,
        edges: builder.edges,
        max_depth,
        nodes_explored,
    }
}

struct TreeBuilder<'p, P: PruningPolicy> {
    policy: &'p P,
    max_depth: u32,
    nodes: Vec<SearchNode>,
    edges: Vec<SearchEdge>,
}

impl<P: PruningPolicy> TreeBuilder<'_, P> {
    fn visit(
        &mut self,
        board: Board,
        depth: u32,
        parent: Option<NodeId>,
        mut window: P::Window,
    ) -> i32 {
        let id = self.push_node(board, depth, parent, false);
        let static_score = self.nodes[id.index()].score;
        if depth >= self.max_depth || eval::is_terminal(&board) {
            return static_score;
        }

        let mover = board.to_move();
        let mut backed_up: Option<i32> = None;
        let mut moves = board.empty_indices();
        for position in moves.by_ref() {
            let value = self.visit(board.with_mark(position, mover), depth + 1, Some(id), window);
            backed_up = Some(match backed_up {
                Some(best) if mover.is_maximizing() => best.max(value),
                Some(best) => best.min(value),
                None => value,
            });
            if self.policy.record(&mut window, mover, value) {
                break;
            }
        }
        for position in moves {
            self.push_node(board.with_mark(position, mover), depth + 1, Some(id), true);
        }

        let value = backed_up.unwrap_or(static_score);
        self.nodes[id.index()].score = value;
        value
    }

    fn push_node(
        &mut self,
        board: Board,
        depth: u32,
        parent: Option<NodeId>,
        is_pruned: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SearchNode {
            id,
            board,
            score: eval::score(&board),
            depth,
            is_pruned,
            current_player: board.to_move(),
        });
        if let Some(parent) = parent {
            self.edges.push(SearchEdge {
                from: parent,
                to: id,
                is_pruned,
            });
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn board(compact: &str) -> Board {
        compact.parse().expect("valid board")
    }

    fn assert_well_formed(tree: &SearchTree) {
        assert_eq!(tree.nodes_explored, tree.nodes.len());
        assert_eq!(tree.edges.len() + 1, tree.nodes.len(), "every non-root node has one parent");

        let ids: HashSet<NodeId> = tree.nodes.iter().map(|node| node.id).collect();
        assert_eq!(ids.len(), tree.nodes.len(), "ids must be unique");
        for (index, node) in tree.nodes.iter().enumerate() {
            assert_eq!(node.id.index(), index);
            assert!(node.depth <= tree.max_depth);
        }
        for edge in &tree.edges {
            assert!(ids.contains(&edge.from), "dangling edge source {:?}", edge.from);
            assert!(ids.contains(&edge.to), "dangling edge target {:?}", edge.to);
            let child = tree.node(edge.to).expect("edge target exists");
            assert_eq!(edge.is_pruned, child.is_pruned);
        }
    }

    #[test]
    fn depth_zero_exports_only_the_root() {
        for tree in [
            export_tree(&Board::new(), 0, &Exhaustive),
            export_tree(&Board::new(), 0, &AlphaBetaWindow),
        ] {
            assert_eq!(tree.nodes.len(), 1);
            assert_eq!(tree.nodes_explored, 1);
            assert!(tree.edges.is_empty());
            let root = tree.root().expect("root exists");
            assert_eq!(root.score, 0);
            assert_eq!(root.current_player, Player::X);
            assert!(!root.is_pruned);
        }
    }

    #[test]
    fn exhaustive_export_expands_every_move() {
        let tree = export_tree(&Board::new(), 2, &Exhaustive);
        assert_well_formed(&tree);
        assert_eq!(tree.nodes.len(), 1 + 9 + 9 * 8);
        assert_eq!(tree.pruned_count(), 0);
        assert!(tree.edges.iter().all(|edge| !edge.is_pruned));
        assert_eq!(tree.max_depth, 2);
    }

    #[test]
    fn inner_scores_are_backed_up_from_children() {
        let tree = export_tree(&Board::new(), 1, &Exhaustive);
        let root = tree.root().expect("root exists");
        let min_child = tree
            .children(root.id)
            .map(|child| child.score)
            .min()
            .expect("root has children");
        assert_eq!(root.score, min_child);
        assert_eq!(root.score, -4, "centre is X's strongest opening by the heuristic");
    }

    #[test]
    fn terminal_nodes_stay_leaves() {
        // O 走 2 即连成一行。
        let tree = export_tree(&board("OO.XX.X.."), 3, &Exhaustive);
        assert_well_formed(&tree);
        let winning = tree
            .children(NodeId(0))
            .find(|child| child.board[2] == crate::game::Cell::O)
            .expect("winning child exists");
        assert_eq!(winning.score, eval::WIN_SCORE);
        assert_eq!(tree.children(winning.id).count(), 0);
    }

    #[test]
    fn alpha_beta_export_flags_skipped_siblings() {
        let position = board("OO.XX.X..");
        let full = export_tree(&position, 2, &Exhaustive);
        let pruned = export_tree(&position, 2, &AlphaBetaWindow);
        assert_well_formed(&pruned);

        assert_eq!(full.nodes.len(), 14);
        assert_eq!(pruned.nodes.len(), 14);
        // O 未取胜的分支里 X 走 2 即胜，其余两步被剪。
        assert_eq!(pruned.pruned_count(), 6);
        let flagged: Vec<u32> = pruned
            .nodes
            .iter()
            .filter(|node| node.is_pruned)
            .map(|node| node.id.0)
            .collect();
        assert_eq!(flagged, vec![4, 5, 8, 9, 12, 13]);

        let root = pruned.root().expect("root exists");
        assert_eq!(root.score, eval::WIN_SCORE);
        assert!(!root.is_pruned);
    }

    #[test]
    fn pruned_nodes_are_never_expanded_or_counted_in_backup() {
        let tree = export_tree(&Board::new(), 3, &AlphaBetaWindow);
        assert_well_formed(&tree);
        assert!(tree.pruned_count() > 0, "a depth-3 walk from the empty board must cut");

        for node in tree.nodes.iter().filter(|node| node.is_pruned) {
            assert_eq!(tree.children(node.id).count(), 0);
            assert_eq!(node.score, eval::score(&node.board));
        }

        for node in &tree.nodes {
            let live: Vec<i32> = tree
                .children(node.id)
                .filter(|child| !child.is_pruned)
                .map(|child| child.score)
                .collect();
            if live.is_empty() {
                continue;
            }
            let expected = if node.current_player == Player::O {
                live.iter().copied().max()
            } else {
                live.iter().copied().min()
            };
            assert_eq!(Some(node.score), expected, "node {:?}", node.id);
        }

        let full = export_tree(&Board::new(), 3, &Exhaustive);
        assert!(tree.nodes.len() < full.nodes.len());
    }

    #[test]
    fn export_is_deterministic() {
        let position = board("X...O....");
        let first = export_tree(&position, 3, &AlphaBetaWindow);
        let second = export_tree(&position, 3, &AlphaBetaWindow);
        assert_eq!(first, second);
    }

    #[test]
    fn wire_shape_uses_camel_case() {
        let tree = export_tree(&board("OO.XX.X.."), 1, &AlphaBetaWindow);
        let json = serde_json::to_value(&tree).expect("tree serialises");
        assert_eq!(json["maxDepth"], 1);
        assert_eq!(json["nodesExplored"], 5);
        assert_eq!(json["nodes"][0]["id"], 0);
        assert_eq!(json["nodes"][0]["currentPlayer"], "O");
        assert_eq!(json["nodes"][0]["isPruned"], false);
        assert_eq!(json["nodes"][0]["board"][2], "");
        assert_eq!(json["edges"][0]["from"], 0);
        assert_eq!(json["edges"][0]["to"], 1);
    }
}

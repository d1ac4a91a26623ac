//! Depth-limited minimax with alpha-beta pruning.
//!
//! The tree is built in full to the configured depth, leaves are scored, and
//! a depth-first pass over an explicit stack backs the values up to the
//! root. Nodes live in an arena owned by the search call; parent links are
//! arena indices, so the whole tree is dropped at once.

use tracing::{debug, trace};

use crate::board::{Board, Color};
use crate::evaluation::{Evaluator, Terminal};
use crate::movegen::{apply_move, Move, MoveGenerator, RuleOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unvisited,
    Visited,
    Pruned,
    Finalized,
}

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub position: Board,
    /// Move that led here from the parent; `None` at the root.
    pub mv: Option<Move>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub ply: u32,
    pub value: Option<i32>,
    pub state: NodeState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    pub nodes: usize,
    pub leaves_visited: usize,
    pub pruned: usize,
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

struct Frame {
    node: NodeId,
    next_child: usize,
    alpha: i32,
    beta: i32,
}

/// Plies with an even number belong to the searching side and maximize.
fn maximizing(ply: u32) -> bool {
    ply % 2 == 0
}

impl SearchTree {
    pub fn new(root: Board) -> Self {
        Self {
            nodes: vec![SearchNode {
                position: root,
                mv: None,
                parent: None,
                children: Vec::new(),
                ply: 0,
                value: None,
                state: NodeState::Unvisited,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of positions in the tree, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    pub fn add_child(&mut self, parent: NodeId, position: Board, mv: Option<Move>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let ply = self.nodes[parent.0].ply + 1;
        self.nodes.push(SearchNode {
            position,
            mv,
            parent: Some(parent),
            children: Vec::new(),
            ply,
            value: None,
            state: NodeState::Unvisited,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn set_value(&mut self, id: NodeId, value: i32) {
        self.nodes[id.0].value = Some(value);
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|&id| self.is_leaf(id))
            .collect()
    }

    /// Unpruned minimax value of the root from the leaf values alone.
    ///
    /// Children always sit at higher arena indices than their parent, so a
    /// single reverse sweep settles every node after its children.
    pub fn minimax(&self) -> Option<i32> {
        let mut values: Vec<Option<i32>> = vec![None; self.nodes.len()];
        for index in (0..self.nodes.len()).rev() {
            let node = &self.nodes[index];
            values[index] = if node.children.is_empty() {
                node.value
            } else {
                let backed = node.children.iter().filter_map(|child| values[child.0]);
                if maximizing(node.ply) {
                    backed.max()
                } else {
                    backed.min()
                }
            };
        }
        values[0]
    }

    /// Backs leaf values up to the root, skipping subtrees that cannot
    /// change the result. Interior values are overwritten.
    pub fn alpha_beta(&mut self) -> SearchStats {
        let mut stats = SearchStats::default();
        for node in self.nodes.iter_mut() {
            node.state = NodeState::Unvisited;
            if !node.children.is_empty() {
                node.value = None;
            }
        }

        let root = self.root();
        self.nodes[root.0].state = NodeState::Visited;
        stats.nodes += 1;
        let mut stack = vec![Frame {
            node: root,
            next_child: 0,
            alpha: i32::MIN,
            beta: i32::MAX,
        }];

        while let Some(frame) = stack.last_mut() {
            let id = frame.node;
            let child_count = self.nodes[id.0].children.len();

            if child_count == 0 {
                stats.leaves_visited += 1;
            } else if frame.alpha < frame.beta && frame.next_child < child_count {
                let child = self.nodes[id.0].children[frame.next_child];
                frame.next_child += 1;
                let (alpha, beta) = (frame.alpha, frame.beta);
                self.nodes[child.0].state = NodeState::Visited;
                stats.nodes += 1;
                stack.push(Frame {
                    node: child,
                    next_child: 0,
                    alpha,
                    beta,
                });
                continue;
            } else if frame.next_child < child_count {
                trace!(node = id.0, alpha = frame.alpha, beta = frame.beta, "cutoff");
                let remaining = self.nodes[id.0].children[frame.next_child..].to_vec();
                for sibling in remaining {
                    stats.pruned += self.prune_subtree(sibling);
                }
            }

            // Node settled: hand its value to the parent frame
            self.nodes[id.0].state = NodeState::Finalized;
            let value = self.nodes[id.0].value;
            stack.pop();
            if let (Some(value), Some(parent)) = (value, stack.last_mut()) {
                let parent_node = &mut self.nodes[parent.node.0];
                if maximizing(parent_node.ply) {
                    parent_node.value = Some(parent_node.value.map_or(value, |v| v.max(value)));
                    parent.alpha = parent.alpha.max(value);
                } else {
                    parent_node.value = Some(parent_node.value.map_or(value, |v| v.min(value)));
                    parent.beta = parent.beta.min(value);
                }
            }
        }

        stats
    }

    fn prune_subtree(&mut self, id: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = &mut self.nodes[next.0];
            node.state = NodeState::Pruned;
            count += 1;
            stack.extend(node.children.iter().copied());
        }
        count
    }

    /// First child, in generation order, whose value equals the root's.
    pub fn best_child(&self) -> Option<NodeId> {
        let root = &self.nodes[0];
        let target = root.value?;
        root.children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].value == Some(target))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies to look ahead
    pub depth: u32,
    /// Alternate the side to move per ply. When false every ply expands the
    /// searching side's own moves.
    pub alternate_sides: bool,
    pub rules: RuleOptions,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            alternate_sides: true,
            rules: RuleOptions::default(),
        }
    }
}

pub struct Search {
    config: SearchConfig,
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    last_stats: SearchStats,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    /// A depth below one ply is raised to one, so a position with legal
    /// moves always yields a move.
    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            config: SearchConfig {
                depth: config.depth.max(1),
                ..config
            },
            evaluator: Evaluator::new(),
            move_generator: MoveGenerator::with_options(config.rules),
            last_stats: SearchStats::default(),
        }
    }

    pub fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    fn side_to_move(&self, color: Color, ply: u32) -> Color {
        if self.config.alternate_sides && ply % 2 == 1 {
            color.opposite()
        } else {
            color
        }
    }

    /// Expands every node layer by layer down to the configured depth.
    pub fn build_tree(&self, board: &Board, color: Color) -> SearchTree {
        let mut tree = SearchTree::new(board.clone());
        let mut frontier = vec![tree.root()];
        for ply in 0..self.config.depth {
            let mover = self.side_to_move(color, ply);
            let mut next_layer = Vec::new();
            for parent in frontier {
                let position = tree.node(parent).position.clone();
                for mv in self.move_generator.generate_moves(&position, mover) {
                    let child = tree.add_child(parent, apply_move(&position, mv), Some(mv));
                    next_layer.push(child);
                }
            }
            frontier = next_layer;
        }
        tree
    }

    /// Scores every leaf from `color`'s point of view.
    pub fn score_leaves(&self, tree: &mut SearchTree, color: Color) {
        for leaf in tree.leaves() {
            let node = tree.node(leaf);
            let mover = self.side_to_move(color, node.ply);
            let terminal = if self.move_generator.is_checkmate(&node.position, mover) {
                if mover == color {
                    Terminal::Suffered
                } else {
                    Terminal::Delivered
                }
            } else {
                Terminal::None
            };
            let value = self.evaluator.evaluate(&node.position, color, terminal);
            tree.set_value(leaf, value);
        }
    }

    /// Picks a move for `color`, or `None` when there is nothing to play.
    pub fn choose_move(&mut self, board: &Board, color: Color) -> Option<Move> {
        let mut tree = self.build_tree(board, color);
        self.score_leaves(&mut tree, color);
        self.last_stats = tree.alpha_beta();

        let best = tree.best_child().and_then(|child| tree.node(child).mv);
        debug!(
            %color,
            depth = self.config.depth,
            nodes = tree.node_count(),
            visited = self.last_stats.nodes,
            pruned = self.last_stats.pruned,
            value = ?tree.node(tree.root()).value,
            best = ?best,
            "search finished"
        );
        best
    }
}

/// Chooses a move for `color` with default rules and the given depth.
pub fn choose_move(color: Color, board: &Board, depth: u32) -> Option<Move> {
    Search::with_config(SearchConfig {
        depth,
        ..SearchConfig::default()
    })
    .choose_move(board, color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, PieceKind, Square};

    /// Builds a uniform synthetic tree whose leaves take `values` in order.
    fn synthetic(branching: usize, depth: u32, values: &[i32]) -> SearchTree {
        let mut tree = SearchTree::new(Board::empty());
        let mut frontier = vec![tree.root()];
        for _ in 0..depth {
            let mut next = Vec::new();
            for parent in frontier {
                for _ in 0..branching {
                    next.push(tree.add_child(parent, Board::empty(), None));
                }
            }
            frontier = next;
        }
        assert_eq!(frontier.len(), values.len());
        for (leaf, &value) in frontier.iter().zip(values) {
            tree.set_value(*leaf, value);
        }
        tree
    }

    #[test]
    fn alpha_beta_matches_minimax_and_prunes() {
        let mut tree = synthetic(3, 2, &[3, 12, 8, 2, 4, 6, 14, 5, 2]);
        let expected = tree.minimax();
        assert_eq!(expected, Some(3));

        let stats = tree.alpha_beta();
        assert_eq!(tree.node(tree.root()).value, expected);
        assert_eq!(stats.leaves_visited, 7);
        assert!(stats.leaves_visited < tree.leaves().len());
        assert_eq!(stats.pruned, 2);
    }

    #[test]
    fn alpha_beta_matches_minimax_at_depth_three() {
        let values = [
            5, 6, 7, 4, 5, 3, 6, 6, 9, //
            7, 5, 9, 8, 6, 2, 1, 3, 8, //
            2, 4, 1, 6, 7, 5, 0, 9, 4,
        ];
        let mut tree = synthetic(3, 3, &values);
        let expected = tree.minimax();
        let stats = tree.alpha_beta();

        assert_eq!(tree.node(tree.root()).value, expected);
        assert!(stats.leaves_visited < values.len());
        assert!(stats.pruned > 0);
    }

    #[test]
    fn no_pruning_when_best_comes_last() {
        let mut tree = synthetic(2, 2, &[1, 2, 3, 4]);
        let stats = tree.alpha_beta();
        assert_eq!(tree.node(tree.root()).value, Some(3));
        assert_eq!(stats.leaves_visited, 4);
        assert_eq!(stats.pruned, 0);
    }

    #[test]
    fn pruned_nodes_are_marked() {
        let mut tree = synthetic(3, 2, &[3, 12, 8, 2, 4, 6, 14, 5, 2]);
        tree.alpha_beta();
        let second = tree.node(tree.root()).children[1];
        let grandchildren = tree.node(second).children.clone();

        assert_eq!(tree.node(grandchildren[0]).state, NodeState::Finalized);
        assert_eq!(tree.node(grandchildren[1]).state, NodeState::Pruned);
        assert_eq!(tree.node(grandchildren[2]).state, NodeState::Pruned);
        assert_eq!(tree.node(tree.root()).state, NodeState::Finalized);
    }

    #[test]
    fn best_child_takes_first_tie() {
        let mut tree = synthetic(3, 1, &[4, 7, 7]);
        tree.alpha_beta();
        let root_children = tree.node(tree.root()).children.clone();
        assert_eq!(tree.best_child(), Some(root_children[1]));
    }

    #[test]
    fn childless_root_has_no_best_child() {
        let mut tree = SearchTree::new(Board::empty());
        tree.set_value(tree.root(), 0);
        tree.alpha_beta();
        assert_eq!(tree.best_child(), None);
    }

    fn place(board: &mut Board, file: i8, rank: i8, kind: PieceKind, color: Color) {
        board.place(Square::at(file, rank), Piece::new(kind, color)).unwrap();
    }

    #[test]
    fn takes_hanging_queen() {
        let mut board = Board::empty();
        place(&mut board, 1, 1, PieceKind::King, Color::White);
        place(&mut board, 4, 1, PieceKind::Rook, Color::White);
        place(&mut board, 4, 6, PieceKind::Queen, Color::Black);
        place(&mut board, 8, 8, PieceKind::King, Color::Black);

        let mv = choose_move(Color::White, &board, 1);
        assert_eq!(
            mv,
            Some(Move::Capture {
                from: Square::at(4, 1),
                to: Square::at(4, 6),
            })
        );
    }

    #[test]
    fn finds_back_rank_mate() {
        let mut board = Board::empty();
        place(&mut board, 7, 1, PieceKind::King, Color::White);
        place(&mut board, 1, 1, PieceKind::Rook, Color::White);
        place(&mut board, 8, 8, PieceKind::King, Color::Black);
        place(&mut board, 7, 7, PieceKind::Pawn, Color::Black);
        place(&mut board, 8, 7, PieceKind::Pawn, Color::Black);

        let mut search = Search::with_config(SearchConfig {
            depth: 2,
            ..SearchConfig::default()
        });
        let mv = search.choose_move(&board, Color::White);
        assert_eq!(
            mv,
            Some(Move::Advance {
                from: Square::at(1, 1),
                to: Square::at(1, 8),
            })
        );
    }

    #[test]
    fn no_move_when_checkmated() {
        let mut board = Board::empty();
        place(&mut board, 8, 8, PieceKind::King, Color::Black);
        place(&mut board, 7, 7, PieceKind::Pawn, Color::Black);
        place(&mut board, 8, 7, PieceKind::Pawn, Color::Black);
        place(&mut board, 1, 8, PieceKind::Rook, Color::White);
        place(&mut board, 7, 1, PieceKind::King, Color::White);

        assert_eq!(choose_move(Color::Black, &board, 2), None);
    }

    #[test]
    fn search_leaves_input_untouched() {
        let board = Board::new();
        let before = board.clone();
        let mut search = Search::new();
        assert!(search.choose_move(&board, Color::White).is_some());
        assert_eq!(board, before);
        assert!(search.last_stats().nodes > 0);
    }

    #[test]
    fn zero_depth_still_searches_one_ply() {
        let board = Board::new();
        assert!(choose_move(Color::White, &board, 0).is_some());

        let search = Search::with_config(SearchConfig {
            depth: 0,
            ..SearchConfig::default()
        });
        let tree = search.build_tree(&board, Color::White);
        assert_eq!(tree.node_count(), 21);
    }

    /// White can win a pawn that a rook defends. Looking at the reply
    /// shows the queen would be lost; expanding only White's own moves
    /// does not.
    fn defended_pawn_board() -> Board {
        let mut board = Board::empty();
        place(&mut board, 1, 1, PieceKind::King, Color::White);
        place(&mut board, 4, 1, PieceKind::Queen, Color::White);
        place(&mut board, 8, 8, PieceKind::King, Color::Black);
        place(&mut board, 4, 8, PieceKind::Rook, Color::Black);
        board
            .place(Square::at(4, 5), Piece::new(PieceKind::Pawn, Color::Black).moved())
            .unwrap();
        board
    }

    #[test]
    fn alternating_expansion_sees_the_recapture() {
        let board = defended_pawn_board();
        let grab = Move::Capture {
            from: Square::at(4, 1),
            to: Square::at(4, 5),
        };

        let mut search = Search::with_config(SearchConfig {
            depth: 2,
            alternate_sides: true,
            ..SearchConfig::default()
        });
        let mut tree = search.build_tree(&board, Color::White);
        search.score_leaves(&mut tree, Color::White);
        tree.alpha_beta();
        assert_eq!(tree.node(tree.root()).value, Some(3));

        let mv = search.choose_move(&board, Color::White);
        assert!(mv.is_some());
        assert_ne!(mv, Some(grab));
    }

    #[test]
    fn own_moves_only_expansion_grabs_the_pawn() {
        let board = defended_pawn_board();
        let mut search = Search::with_config(SearchConfig {
            depth: 2,
            alternate_sides: false,
            ..SearchConfig::default()
        });

        // Every ply belongs to White
        let tree = search.build_tree(&board, Color::White);
        let first = tree.node(tree.root()).children[0];
        let reply = tree.node(first).children[0];
        let played = tree.node(reply).mv.unwrap();
        let mover = tree.node(first).position.get(played.from()).unwrap().color;
        assert_eq!(mover, Color::White);

        assert_eq!(
            search.choose_move(&board, Color::White),
            Some(Move::Capture {
                from: Square::at(4, 1),
                to: Square::at(4, 5),
            })
        );
    }
}

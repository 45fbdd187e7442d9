use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::Point;
use crate::error::GoError;
use crate::goban::Captures;
use crate::notation::{self, EncodedMove};
use crate::stone::Stone;

pub type NodeId = usize;

/// Board snapshot stored on every node, taken after the node's move.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardState {
    pub board: Vec<i8>,
    /// Player to move after this node.
    pub player: Stone,
    pub captures: Captures,
    pub board_is_repeating: bool,
}

/// `score` marks are either a bare flag or a color name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreMark {
    Flag(bool),
    Color(String),
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Annotations on a single point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marks {
    #[serde(skip_serializing_if = "is_false")]
    pub triangle: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub square: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub circle: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub cross: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreMark>,
    #[serde(skip_serializing_if = "is_false")]
    pub chat_triangle: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub sub_triangle: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub remove: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub stone_removed: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub mark_x: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hint: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub black: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub white: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Marks {
    pub fn is_empty(&self) -> bool {
        *self == Marks::default()
    }

    /// Set every mark that is set in `other`.
    pub fn merge(&mut self, other: &Marks) {
        self.triangle |= other.triangle;
        self.square |= other.square;
        self.circle |= other.circle;
        self.cross |= other.cross;
        self.chat_triangle |= other.chat_triangle;
        self.sub_triangle |= other.sub_triangle;
        self.remove |= other.remove;
        self.stone_removed |= other.stone_removed;
        self.mark_x |= other.mark_x;
        self.hint |= other.hint;
        self.black |= other.black;
        self.white |= other.white;
        if other.letter.is_some() {
            self.letter.clone_from(&other.letter);
        }
        if other.transient_letter.is_some() {
            self.transient_letter.clone_from(&other.transient_letter);
        }
        if other.score.is_some() {
            self.score.clone_from(&other.score);
        }
        if other.color.is_some() {
            self.color.clone_from(&other.color);
        }
    }
}

/// A freehand stroke drawn over the board: a color and a flat list of
/// `x, y` coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenMark {
    pub color: String,
    pub points: Vec<f64>,
}

/// Where a node hangs off its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot {
    Trunk,
    Branch(usize),
}

#[derive(Debug, Clone)]
pub struct MoveNode {
    /// `None` for a pass, and for the root.
    pub pos: Option<Point>,
    /// Color that made the move; `None` for the root and for edits that clear a point.
    pub player: Option<Stone>,
    pub edited: bool,
    pub trunk: bool,
    pub move_number: u32,
    pub state: BoardState,
    pub parent: Option<NodeId>,
    pub trunk_next: Option<NodeId>,
    pub branches: Vec<NodeId>,
    pub text: String,
    pub pen_marks: Vec<PenMark>,
    pub correct_answer: bool,
    pub wrong_answer: bool,
    hint_next: Option<NodeId>,
    /// Keyed by `(row, col)` so iteration is row-major.
    marks: BTreeMap<(u8, u8), Marks>,
    isobranches: Vec<NodeId>,
}

impl MoveNode {
    fn new(pos: Option<Point>, player: Option<Stone>, state: BoardState) -> Self {
        MoveNode {
            pos,
            player,
            edited: false,
            trunk: false,
            move_number: 0,
            state,
            parent: None,
            trunk_next: None,
            branches: Vec::new(),
            text: String::new(),
            pen_marks: Vec::new(),
            correct_answer: false,
            wrong_answer: false,
            hint_next: None,
            marks: BTreeMap::new(),
            isobranches: Vec::new(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.pos.is_none()
    }

    pub fn has_children(&self) -> bool {
        self.trunk_next.is_some() || !self.branches.is_empty()
    }

    /// Trunk child first, then branches.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.trunk_next.into_iter().chain(self.branches.iter().copied())
    }

    pub fn encoded(&self) -> EncodedMove {
        if self.edited {
            EncodedMove::edit(self.pos, self.player)
        } else {
            EncodedMove::play(self.pos)
        }
    }

    // -- Marks --

    pub fn marks(&self, (col, row): Point) -> Option<&Marks> {
        self.marks.get(&(row, col))
    }

    pub fn marks_mut(&mut self, (col, row): Point) -> &mut Marks {
        self.marks.entry((row, col)).or_default()
    }

    pub fn has_marks(&self) -> bool {
        self.marks.values().any(|m| !m.is_empty())
    }

    /// Marked points in row-major order.
    pub fn marked_points(&self) -> impl Iterator<Item = (Point, &Marks)> {
        self.marks
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(&(row, col), m)| ((col, row), m))
    }

    pub fn clear_marks(&mut self) {
        self.marks.clear();
    }
}

/// Parameters of a move recorded in the tree.
#[derive(Debug, Clone)]
pub struct NewMove {
    pub pos: Option<Point>,
    pub player: Option<Stone>,
    pub trunk: bool,
    pub edited: bool,
    pub move_number: u32,
    pub state: BoardState,
}

/// Arena of move nodes. Node 0 is the root and is always trunk. Removed
/// subtrees stay in the arena but are no longer reachable from the root.
#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<MoveNode>,
}

impl MoveTree {
    pub const ROOT: NodeId = 0;

    pub fn new(state: BoardState) -> Self {
        let mut root = MoveNode::new(None, None, state);
        root.trunk = true;
        MoveTree { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node(&self, id: NodeId) -> &MoveNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut MoveNode {
        &mut self.nodes[id]
    }

    /// Number of arena slots, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id < self.nodes.len()
    }

    /// Node ids reachable from the root, parent before children.
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            out.push(id);
            let node = &self.nodes[id];
            stack.extend(node.branches.iter().rev().copied());
            stack.extend(node.trunk_next);
        }
        out
    }

    // -- Building --

    /// Find an existing child of `parent` matching the move exactly.
    pub fn lookup_move(
        &self,
        parent: NodeId,
        pos: Option<Point>,
        player: Option<Stone>,
        edited: bool,
    ) -> Option<NodeId> {
        let matches = |id: NodeId| {
            let n = &self.nodes[id];
            n.pos == pos && n.edited == edited && n.player == player
        };
        self.nodes[parent].children().find(|&id| matches(id))
    }

    /// Record a move under `parent`, reusing a matching child when one exists.
    ///
    /// A trunk move onto a node whose trunk child is already set overwrites
    /// that child, and a branch describing the same move is folded into it.
    pub fn add_move(&mut self, parent: NodeId, mv: NewMove) -> Result<NodeId, GoError> {
        if let Some(existing) = self.lookup_move(parent, mv.pos, mv.player, mv.edited)
            && (self.nodes[existing].trunk || !mv.trunk)
        {
            let node = &mut self.nodes[existing];
            node.state = mv.state;
            node.move_number = mv.move_number;
            return Ok(existing);
        }

        if mv.trunk {
            self.add_trunk_move(parent, mv)
        } else {
            Ok(self.add_branch_move(parent, mv))
        }
    }

    fn add_trunk_move(&mut self, parent: NodeId, mv: NewMove) -> Result<NodeId, GoError> {
        if !self.nodes[parent].trunk {
            return Err(GoError::invariant("attempted trunk move on a non-trunk node"));
        }

        let (pos, player) = (mv.pos, mv.player);
        let id = match self.nodes[parent].trunk_next {
            Some(existing) => {
                let node = &mut self.nodes[existing];
                node.pos = mv.pos;
                node.player = mv.player;
                node.edited = mv.edited;
                node.move_number = mv.move_number;
                node.state = mv.state;
                existing
            }
            None => {
                let id = self.push_node(parent, mv, true);
                self.nodes[parent].trunk_next = Some(id);
                id
            }
        };

        let joined = self.nodes[parent]
            .branches
            .iter()
            .position(|&b| self.nodes[b].pos == pos && self.nodes[b].player == player);
        if let Some(i) = joined {
            let branch = self.nodes[parent].branches.remove(i);
            let grandchildren = std::mem::take(&mut self.nodes[branch].branches);
            for &g in &grandchildren {
                self.nodes[g].parent = Some(id);
            }
            self.nodes[id].branches.extend(grandchildren);
            self.nodes[branch].parent = None;
        }

        Ok(id)
    }

    fn add_branch_move(&mut self, parent: NodeId, mv: NewMove) -> NodeId {
        let same = self.nodes[parent]
            .branches
            .iter()
            .copied()
            .find(|&b| self.nodes[b].pos == mv.pos && self.nodes[b].player == mv.player);
        match same {
            Some(id) => {
                let node = &mut self.nodes[id];
                node.edited = mv.edited;
                node.move_number = mv.move_number;
                node.state = mv.state;
                id
            }
            None => {
                let id = self.push_node(parent, mv, false);
                self.nodes[parent].branches.push(id);
                id
            }
        }
    }

    fn push_node(&mut self, parent: NodeId, mv: NewMove, trunk: bool) -> NodeId {
        let mut node = MoveNode::new(mv.pos, mv.player, mv.state);
        node.edited = mv.edited;
        node.trunk = trunk;
        node.move_number = mv.move_number;
        node.parent = Some(parent);
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Detach a node and its subtree from its parent. Returns the parent.
    pub fn remove(&mut self, id: NodeId) -> Result<NodeId, GoError> {
        let Some(parent) = self.nodes[id].parent else {
            return Err(GoError::invariant("the root of the move tree cannot be removed"));
        };
        if self.nodes[id].trunk {
            return Err(GoError::invariant("trunk nodes cannot be removed"));
        }

        let p = &mut self.nodes[parent];
        if p.trunk_next == Some(id) {
            p.trunk_next = None;
        } else {
            p.branches.retain(|&b| b != id);
        }
        if p.hint_next == Some(id) {
            p.hint_next = None;
        }
        self.nodes[id].parent = None;
        Ok(parent)
    }

    // -- Navigation --

    /// The child followed by default: the trunk child, then the last
    /// branch visited from here, then the first branch.
    pub fn next(&self, id: NodeId, follow_hints: bool) -> Option<NodeId> {
        let node = &self.nodes[id];
        if node.trunk_next.is_some() {
            return node.trunk_next;
        }
        if follow_hints
            && let Some(hint) = node.hint_next
            && node.branches.contains(&hint)
        {
            return Some(hint);
        }
        node.branches.first().copied()
    }

    /// Step to the parent, remembering `id` as the branch to follow back.
    pub fn prev(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        self.nodes[parent].hint_next = Some(id);
        Some(parent)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Walk `offset` steps: backwards through parents when negative, forward
    /// along the default line (ignoring hints) when positive. Stops early at
    /// either end.
    pub fn index(&self, id: NodeId, offset: i32) -> NodeId {
        let mut cur = id;
        let mut remaining = offset;
        while remaining < 0 {
            match self.nodes[cur].parent {
                Some(p) => cur = p,
                None => break,
            }
            remaining += 1;
        }
        while remaining > 0 {
            match self.next(cur, false) {
                Some(n) => cur = n,
                None => break,
            }
            remaining -= 1;
        }
        cur
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id].parent, move |&n| self.nodes[n].parent)
    }

    // -- Queries --

    /// The nearest trunk node at or above `id`.
    pub fn branch_point(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while !self.nodes[cur].trunk {
            match self.nodes[cur].parent {
                Some(p) => cur = p,
                None => break,
            }
        }
        cur
    }

    /// Distance from the root.
    pub fn move_index(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, other: NodeId) -> bool {
        other == ancestor || self.ancestors(other).any(|a| a == ancestor)
    }

    pub fn position_in_parent(&self, id: NodeId) -> Option<ChildSlot> {
        let parent = &self.nodes[self.nodes[id].parent?];
        if parent.trunk_next == Some(id) {
            return Some(ChildSlot::Trunk);
        }
        parent.branches.iter().position(|&b| b == id).map(ChildSlot::Branch)
    }

    /// Nodes from just below the root down to `id`.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = std::iter::once(id).chain(self.ancestors(id)).collect();
        path.pop();
        path.reverse();
        path
    }

    /// Encoded move list leading from the root to `id`.
    pub fn move_string_to(&self, id: NodeId) -> String {
        let moves: Vec<EncodedMove> = self.path_to(id).iter().map(|&n| self.nodes[n].encoded()).collect();
        notation::encode_moves(&moves)
    }

    pub fn root_marks(&self) -> BTreeMap<(u8, u8), Marks> {
        self.nodes[Self::ROOT].marks.clone()
    }

    pub fn set_root_marks(&mut self, marks: BTreeMap<(u8, u8), Marks>) {
        self.nodes[Self::ROOT].marks = marks;
    }

    // -- Puzzles --

    /// Promote the first branch at every level below `id` to trunk.
    pub fn hoist_first_branch_to_trunk(&mut self, id: NodeId) {
        let mut cur = id;
        loop {
            if let Some(next) = self.nodes[cur].trunk_next {
                cur = next;
                continue;
            }
            self.nodes[cur].trunk = true;
            if self.nodes[cur].branches.is_empty() {
                return;
            }
            let first = self.nodes[cur].branches.remove(0);
            self.nodes[cur].trunk_next = Some(first);
            cur = first;
        }
    }

    /// Branches of `id` that lead to a node flagged as a correct answer.
    pub fn find_branches_with_correct_answer(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id]
            .branches
            .iter()
            .copied()
            .filter(|&b| self.leads_to_correct_answer(b))
            .collect()
    }

    fn leads_to_correct_answer(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        node.correct_answer || node.branches.iter().any(|&b| self.leads_to_correct_answer(b))
    }

    // -- Isobranches --

    /// Link every reachable node to the other reachable nodes with the same
    /// board and player to move, skipping its own ancestors and descendants.
    pub fn recompute_isobranches(&mut self) {
        let reachable = self.reachable();
        let mut by_position: HashMap<(&[i8], Stone), Vec<NodeId>> = HashMap::new();
        for &id in &reachable {
            let state = &self.nodes[id].state;
            by_position
                .entry((state.board.as_slice(), state.player))
                .or_default()
                .push(id);
        }

        let mut links: Vec<(NodeId, Vec<NodeId>)> = Vec::with_capacity(reachable.len());
        for &id in &reachable {
            let state = &self.nodes[id].state;
            let same = &by_position[&(state.board.as_slice(), state.player)];
            let iso = same
                .iter()
                .copied()
                .filter(|&n| n != id && !self.is_ancestor_of(id, n) && !self.is_ancestor_of(n, id))
                .collect();
            links.push((id, iso));
        }

        for node in &mut self.nodes {
            node.isobranches.clear();
        }
        for (id, iso) in links {
            self.nodes[id].isobranches = iso;
        }
    }

    /// Isobranches as of the last [`MoveTree::recompute_isobranches`].
    pub fn isobranches(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].isobranches
    }

    /// Isobranches of `id` that continue with further moves.
    pub fn find_strong_isobranches(&mut self, id: NodeId) -> Vec<NodeId> {
        self.recompute_isobranches();
        self.nodes[id]
            .isobranches
            .iter()
            .copied()
            .filter(|&n| self.nodes[n].has_children())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn state(board: &[i8], player: Stone) -> BoardState {
        BoardState {
            board: board.to_vec(),
            player,
            captures: Captures::new(),
            board_is_repeating: false,
        }
    }

    fn mv(pos: Point, player: Stone, trunk: bool, move_number: u32) -> NewMove {
        let mut board = vec![0i8; 9];
        board[pos.1 as usize * 3 + pos.0 as usize] = player.to_int();
        NewMove {
            pos: Some(pos),
            player: Some(player),
            trunk,
            edited: false,
            move_number,
            state: state(&board, player.opp()),
        }
    }

    fn tree() -> MoveTree {
        MoveTree::new(state(&[0; 9], Stone::Black))
    }

    // -- Building --

    #[test]
    fn root_is_trunk() {
        let t = tree();
        assert!(t.node(MoveTree::ROOT).trunk);
        assert_eq!(t.node(MoveTree::ROOT).parent, None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn reuses_matching_child() {
        let mut t = tree();
        let a = t.add_move(0, mv((0, 0), Stone::Black, false, 1)).unwrap();
        let b = t.add_move(0, mv((0, 0), Stone::Black, false, 1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(t.node(0).branches.len(), 1);
    }

    #[test]
    fn lookup_distinguishes_edits_and_colors() {
        let mut t = tree();
        let a = t.add_move(0, mv((1, 1), Stone::Black, false, 1)).unwrap();
        assert_eq!(t.lookup_move(0, Some((1, 1)), Some(Stone::Black), false), Some(a));
        assert_eq!(t.lookup_move(0, Some((1, 1)), Some(Stone::White), false), None);
        assert_eq!(t.lookup_move(0, Some((1, 1)), Some(Stone::Black), true), None);
    }

    #[test]
    fn trunk_requires_trunk_parent() {
        let mut t = tree();
        let a = t.add_move(0, mv((0, 0), Stone::Black, false, 1)).unwrap();
        let err = t.add_move(a, mv((1, 0), Stone::White, true, 2)).unwrap_err();
        assert!(matches!(err, GoError::InvariantViolation(_)));
    }

    #[test]
    fn promoting_branch_folds_it_into_trunk() {
        let mut t = tree();
        let branch = t.add_move(0, mv((0, 0), Stone::Black, false, 1)).unwrap();
        let deeper = t.add_move(branch, mv((1, 0), Stone::White, false, 2)).unwrap();

        let trunk = t.add_move(0, mv((0, 0), Stone::Black, true, 1)).unwrap();
        assert_ne!(trunk, branch);
        assert_eq!(t.node(0).trunk_next, Some(trunk));
        assert!(t.node(0).branches.is_empty());
        assert_eq!(t.node(trunk).branches, vec![deeper]);
        assert_eq!(t.node(deeper).parent, Some(trunk));
    }

    #[test]
    fn trunk_move_overwrites_existing_trunk_child() {
        let mut t = tree();
        let first = t.add_move(0, mv((0, 0), Stone::Black, true, 1)).unwrap();
        let second = t.add_move(0, mv((2, 2), Stone::Black, true, 1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(t.node(first).pos, Some((2, 2)));
    }

    // -- Navigation --

    #[test]
    fn next_prefers_trunk_then_hint() {
        let mut t = tree();
        let trunk = t.add_move(0, mv((0, 0), Stone::Black, true, 1)).unwrap();
        let b1 = t.add_move(trunk, mv((1, 0), Stone::White, false, 2)).unwrap();
        let b2 = t.add_move(trunk, mv((2, 0), Stone::White, false, 2)).unwrap();

        assert_eq!(t.next(0, true), Some(trunk));
        assert_eq!(t.next(trunk, true), Some(b1));
        assert_eq!(t.prev(b2), Some(trunk));
        assert_eq!(t.next(trunk, true), Some(b2));
        assert_eq!(t.next(trunk, false), Some(b1));
    }

    #[test]
    fn stale_hint_is_ignored() {
        let mut t = tree();
        let b1 = t.add_move(0, mv((1, 0), Stone::Black, false, 1)).unwrap();
        let b2 = t.add_move(0, mv((2, 0), Stone::Black, false, 1)).unwrap();
        t.prev(b2);
        t.remove(b2).unwrap();
        assert_eq!(t.next(0, true), Some(b1));
    }

    #[test]
    fn index_walks_both_ways_and_clamps() {
        let mut t = tree();
        let a = t.add_move(0, mv((0, 0), Stone::Black, true, 1)).unwrap();
        let b = t.add_move(a, mv((1, 0), Stone::White, true, 2)).unwrap();
        assert_eq!(t.index(b, -1), a);
        assert_eq!(t.index(b, -5), 0);
        assert_eq!(t.index(0, 2), b);
        assert_eq!(t.index(0, 9), b);
    }

    // -- Removal --

    #[test]
    fn remove_refuses_root_and_trunk() {
        let mut t = tree();
        let a = t.add_move(0, mv((0, 0), Stone::Black, true, 1)).unwrap();
        assert!(t.remove(0).is_err());
        assert!(t.remove(a).is_err());
    }

    #[test]
    fn remove_detaches_branch() {
        let mut t = tree();
        let a = t.add_move(0, mv((0, 0), Stone::Black, false, 1)).unwrap();
        assert_eq!(t.remove(a).unwrap(), 0);
        assert!(!t.node(0).has_children());
        assert_eq!(t.reachable(), vec![0]);
    }

    // -- Queries --

    #[test]
    fn branch_point_and_move_string() {
        let mut t = tree();
        let a = t.add_move(0, mv((0, 0), Stone::Black, true, 1)).unwrap();
        let b = t.add_move(a, mv((1, 0), Stone::White, false, 2)).unwrap();
        let c = t.add_move(b, mv((2, 2), Stone::Black, false, 3)).unwrap();
        assert_eq!(t.branch_point(c), a);
        assert_eq!(t.move_index(c), 3);
        assert_eq!(t.move_string_to(c), "aabacc");
        assert!(t.is_ancestor_of(a, c));
        assert!(!t.is_ancestor_of(c, a));
        assert_eq!(t.position_in_parent(a), Some(ChildSlot::Trunk));
        assert_eq!(t.position_in_parent(b), Some(ChildSlot::Branch(0)));
        assert_eq!(t.position_in_parent(0), None);
    }

    #[test]
    fn marks_iterate_row_major() {
        let mut t = tree();
        let root = t.node_mut(0);
        root.marks_mut((2, 0)).triangle = true;
        root.marks_mut((0, 1)).letter = Some("A".into());
        root.marks_mut((1, 1));
        let points: Vec<Point> = root.marked_points().map(|(p, _)| p).collect();
        assert_eq!(points, vec![(2, 0), (0, 1)]);
        assert!(root.has_marks());
    }

    // -- Puzzles --

    #[test]
    fn hoists_first_branches() {
        let mut t = tree();
        let a = t.add_move(0, mv((0, 0), Stone::Black, false, 1)).unwrap();
        let b = t.add_move(a, mv((1, 0), Stone::White, false, 2)).unwrap();
        t.hoist_first_branch_to_trunk(0);
        assert_eq!(t.node(0).trunk_next, Some(a));
        assert_eq!(t.node(a).trunk_next, Some(b));
        assert!(t.node(b).trunk);
    }

    #[test]
    fn finds_branches_leading_to_correct_answers() {
        let mut t = tree();
        let good = t.add_move(0, mv((0, 0), Stone::Black, false, 1)).unwrap();
        let bad = t.add_move(0, mv((1, 1), Stone::Black, false, 1)).unwrap();
        let end = t.add_move(good, mv((2, 2), Stone::White, false, 2)).unwrap();
        t.node_mut(end).correct_answer = true;
        t.node_mut(bad).wrong_answer = true;
        assert_eq!(t.find_branches_with_correct_answer(0), vec![good]);
    }

    // -- Isobranches --

    #[test]
    fn transpositions_are_isobranches() {
        let mut t = tree();
        let board = [1, -1, 0, 0, 0, 0, 0, 0, 0];
        let a = t.add_move(0, mv((0, 0), Stone::Black, false, 1)).unwrap();
        let mut second = mv((1, 0), Stone::White, false, 2);
        second.state = state(&board, Stone::Black);
        let ab = t.add_move(a, second).unwrap();

        let b = t.add_move(0, mv((1, 0), Stone::Black, false, 1)).unwrap();
        let mut second = mv((0, 0), Stone::White, false, 2);
        second.state = state(&board, Stone::Black);
        let ba = t.add_move(b, second).unwrap();
        t.add_move(ba, mv((2, 2), Stone::Black, false, 3)).unwrap();

        t.recompute_isobranches();
        assert_eq!(t.isobranches(ab), &[ba]);
        assert_eq!(t.isobranches(ba), &[ab]);
        assert!(t.isobranches(a).is_empty());

        assert_eq!(t.find_strong_isobranches(ab), vec![ba]);
        assert!(t.find_strong_isobranches(ba).is_empty());
    }
}

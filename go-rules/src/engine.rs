use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::Point;
use crate::error::{GoError, IllegalMove};
use crate::estimator::EstimationKernel;
use crate::goban::{Captures, Goban};
use crate::ko::{self, Candidate};
use crate::move_tree::{BoardState, MoveTree, NewMove, NodeId};
use crate::notation::{self, EncodedMove};
use crate::portable::{self, PortableNode};
use crate::rules::{GameConfig, InitialState, Rules};
use crate::stone::Stone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    #[serde(rename = "play")]
    Play,
    #[serde(rename = "stone removal")]
    StoneRemoval,
    #[serde(rename = "finished")]
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Play => write!(f, "play"),
            Phase::StoneRemoval => write!(f, "stone removal"),
            Phase::Finished => write!(f, "finished"),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(Phase::Play),
            "stone removal" => Ok(Phase::StoneRemoval),
            "finished" => Ok(Phase::Finished),
            _ => Err(format!("unknown phase: {s}")),
        }
    }
}

/// Which legality checks a placement goes through, and where it is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceOptions {
    pub check_for_ko: bool,
    /// Scan history for a repeated board. A repeat always sets
    /// [`Engine::board_is_repeating`].
    pub check_for_superko: bool,
    /// Refuse a repeated board unless the ruleset allows superko.
    pub error_on_superko: bool,
    /// Accept self-capture even when the ruleset forbids it.
    pub allow_suicide: bool,
    /// Record the move on the trunk.
    pub trunk: bool,
}

impl Default for PlaceOptions {
    fn default() -> Self {
        PlaceOptions {
            check_for_ko: true,
            check_for_superko: true,
            error_on_superko: true,
            allow_suicide: false,
            trunk: false,
        }
    }
}

impl PlaceOptions {
    /// An official game move.
    pub fn trunk() -> Self {
        PlaceOptions {
            trunk: true,
            ..Self::default()
        }
    }

    /// Re-applying moves that were already accepted once: no repetition
    /// checks and self-capture allowed.
    pub fn replay() -> Self {
        PlaceOptions {
            check_for_ko: false,
            check_for_superko: false,
            error_on_superko: false,
            allow_suicide: true,
            trunk: true,
        }
    }
}

/// Receives a notification for every point whose displayed state changes.
pub trait BoardObserver {
    fn cell_changed(&mut self, point: Point, stone: Option<Stone>);

    fn removal_changed(&mut self, _point: Point, _removed: bool) {}
}

/// The rules engine: the live board, its history tree and the phase of the
/// game. Every change of the board goes through here.
pub struct Engine {
    pub(crate) rules: Rules,
    pub(crate) goban: Goban,
    pub(crate) removal: Vec<bool>,
    pub(crate) tree: MoveTree,
    pub(crate) cur: NodeId,
    pub(crate) last_official: NodeId,
    pub(crate) move_before_jump: Option<NodeId>,
    pub(crate) player: Stone,
    pub(crate) initial_player: Stone,
    pub(crate) initial_state: InitialState,
    pub(crate) phase: Phase,
    pub(crate) analyze_mode: bool,
    pub(crate) loading_sgf: bool,
    pub(crate) board_is_repeating: bool,
    pub(crate) winner: Option<Stone>,
    pub(crate) outcome: Option<String>,
    pub(crate) load_errors: Vec<GoError>,
    pub(crate) estimator: Option<Arc<dyn EstimationKernel>>,
    pub(crate) observer: Option<Box<dyn BoardObserver>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rules)
            .field("goban", &self.goban)
            .field("cur", &self.cur)
            .field("player", &self.player)
            .field("phase", &self.phase)
            .field("has_estimator", &self.estimator.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build an engine from a game description: resolve the rules, place
    /// the setup stones, replay `moves` onto the trunk, unpack `move_tree`
    /// and mark `removed` points.
    pub fn new(config: GameConfig) -> Result<Self, GoError> {
        let setup = config.resolve()?;
        let mut goban = Goban::with_dimensions(setup.width, setup.height);
        for stone in [Stone::Black, Stone::White] {
            for point in setup.initial_stones(stone)? {
                goban.set(point, Some(stone));
            }
        }

        let root_state = BoardState {
            board: goban.board().to_vec(),
            player: setup.initial_player,
            captures: Captures::new(),
            board_is_repeating: false,
        };
        let len = goban.board().len();
        let mut engine = Engine {
            rules: setup.rules,
            goban,
            removal: vec![false; len],
            tree: MoveTree::new(root_state),
            cur: MoveTree::ROOT,
            last_official: MoveTree::ROOT,
            move_before_jump: None,
            player: setup.initial_player,
            initial_player: setup.initial_player,
            initial_state: setup.initial_state,
            phase: setup.phase,
            analyze_mode: false,
            loading_sgf: false,
            board_is_repeating: false,
            winner: None,
            outcome: config.outcome.clone(),
            load_errors: Vec::new(),
            estimator: None,
            observer: None,
        };

        if let Some(moves) = &config.moves {
            for mv in moves.decode(engine.width(), engine.height())? {
                engine.replay_official(mv)?;
            }
            engine.last_official = engine.cur;
        }

        if let Some(tree) = &config.move_tree {
            let end = engine.cur;
            engine.goto(MoveTree::ROOT);
            engine.unpack_move_tree(MoveTree::ROOT, tree)?;
            engine.goto(end);
        }

        if let Some(removed) = &config.removed {
            for mv in notation::decode_moves(removed, engine.width(), engine.height())? {
                if let Some(point) = mv.pos {
                    engine.set_removed(point, true);
                }
            }
        }

        debug!(
            rules = %engine.rules.rule_set,
            width = engine.width(),
            height = engine.height(),
            nodes = engine.tree.len(),
            "engine created"
        );
        Ok(engine)
    }

    fn replay_official(&mut self, mv: EncodedMove) -> Result<(), GoError> {
        if mv.edited {
            if mv.pos.is_some() {
                self.edit_node(mv.pos, mv.color, true)?;
            }
            return Ok(());
        }
        if let Err(err) = self.play_move(mv.pos, PlaceOptions::replay()) {
            warn!(
                pos = %notation::encode_point(mv.pos),
                error = %err,
                "recorded move could not be replayed, applying it as an edit"
            );
            self.load_errors.push(err);
            let color = Some(self.player);
            self.edit_node(mv.pos, color, true)?;
        }
        Ok(())
    }

    fn unpack_move_tree(&mut self, at: NodeId, node: &PortableNode) -> Result<(), GoError> {
        let bounds = (self.width(), self.height());
        portable::load_annotations(&mut self.tree, at, node, bounds)?;
        if let Some(next) = node.trunk_next.as_deref() {
            self.replay_portable(next, true)?;
            let child = self.cur;
            self.unpack_move_tree(child, next)?;
            self.goto(at);
        }
        for branch in &node.branches {
            self.replay_portable(branch, false)?;
            let child = self.cur;
            self.unpack_move_tree(child, branch)?;
            self.goto(at);
        }
        Ok(())
    }

    fn replay_portable(&mut self, node: &PortableNode, trunk: bool) -> Result<NodeId, GoError> {
        if node.edited {
            self.edit_node(node.pos(), node.edit_color(), trunk)
        } else {
            self.play_move(node.pos(), PlaceOptions { trunk, ..PlaceOptions::replay() })
        }
    }

    // -- Accessors --

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn width(&self) -> u8 {
        self.goban.cols()
    }

    pub fn height(&self) -> u8 {
        self.goban.rows()
    }

    pub fn goban(&self) -> &Goban {
        &self.goban
    }

    pub fn board(&self) -> &[i8] {
        self.goban.board()
    }

    pub fn stone_at(&self, point: Point) -> Option<Stone> {
        self.goban.stone_at(point)
    }

    pub fn captures(&self) -> &Captures {
        self.goban.captures()
    }

    /// Player to move.
    pub fn player(&self) -> Stone {
        self.player
    }

    pub fn initial_player(&self) -> Stone {
        self.initial_player
    }

    pub fn initial_state(&self) -> &InitialState {
        &self.initial_state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn analyze_mode(&self) -> bool {
        self.analyze_mode
    }

    pub fn board_is_repeating(&self) -> bool {
        self.board_is_repeating
    }

    pub fn winner(&self) -> Option<Stone> {
        self.winner
    }

    pub fn outcome(&self) -> Option<&str> {
        self.outcome.as_deref()
    }

    /// Recorded moves that failed to replay while the engine was loaded.
    pub fn load_errors(&self) -> &[GoError] {
        &self.load_errors
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    /// Mutable access for annotating nodes.
    pub fn tree_mut(&mut self) -> &mut MoveTree {
        &mut self.tree
    }

    pub fn cur_move(&self) -> NodeId {
        self.cur
    }

    pub fn last_official_move(&self) -> NodeId {
        self.last_official
    }

    pub fn move_before_jump(&self) -> Option<NodeId> {
        self.move_before_jump
    }

    /// Move number of the node being shown.
    pub fn move_number(&self) -> u32 {
        self.tree.node(self.cur).move_number
    }

    /// Move number of the last official move.
    pub fn current_move_number(&self) -> u32 {
        self.tree.node(self.last_official).move_number
    }

    pub fn set_observer(&mut self, observer: Box<dyn BoardObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub(crate) fn notify_cell(&mut self, point: Point, stone: Option<Stone>) {
        if let Some(obs) = self.observer.as_mut() {
            obs.cell_changed(point, stone);
        }
    }

    pub(crate) fn notify_removal(&mut self, point: Point, removed: bool) {
        if let Some(obs) = self.observer.as_mut() {
            obs.removal_changed(point, removed);
        }
    }

    fn snapshot(&self) -> BoardState {
        BoardState {
            board: self.goban.board().to_vec(),
            player: self.player,
            captures: *self.goban.captures(),
            board_is_repeating: self.board_is_repeating,
        }
    }

    // -- Playing --

    /// Free placement moves still owed by black before white's first move.
    pub fn handicap_moves_left(&self) -> u32 {
        if self.rules.free_handicap_placement {
            (self.rules.handicap as u32).saturating_sub(self.move_number())
        } else {
            0
        }
    }

    /// Play a stone for the player to move with the default checks, as a
    /// side variation.
    pub fn place(&mut self, point: Point) -> Result<NodeId, GoError> {
        self.place_with(Some(point), PlaceOptions::default())
    }

    pub fn pass(&mut self) -> Result<NodeId, GoError> {
        self.place_with(None, PlaceOptions::default())
    }

    /// Play a stone (or pass with `None`) for the player to move. A refused
    /// move leaves the board, the tree and the player to move untouched.
    pub fn place_with(&mut self, pos: Option<Point>, opts: PlaceOptions) -> Result<NodeId, GoError> {
        self.ensure_playable()?;
        self.play_move(pos, opts)
    }

    /// Set or clear a point outside the normal flow of play. The player to
    /// move does not change.
    pub fn edit_place(&mut self, point: Point, color: Option<Stone>) -> Result<NodeId, GoError> {
        self.edit_place_with(point, color, false)
    }

    pub fn edit_place_with(&mut self, point: Point, color: Option<Stone>, trunk: bool) -> Result<NodeId, GoError> {
        self.ensure_playable()?;
        self.edit_node(Some(point), color, trunk)
    }

    fn ensure_playable(&self) -> Result<(), GoError> {
        if self.phase == Phase::Play || self.analyze_mode {
            Ok(())
        } else {
            Err(GoError::invariant(format!("cannot change the board during {}", self.phase)))
        }
    }

    pub(crate) fn play_move(&mut self, pos: Option<Point>, opts: PlaceOptions) -> Result<NodeId, GoError> {
        let mover = self.player;
        let next_player = if self.handicap_moves_left() < 2 { mover.opp() } else { mover };
        let move_number = self.move_number() + 1;

        let Some(point) = pos else {
            if self.handicap_moves_left() > 0 {
                trace!("pass skipped during free handicap placement");
                return Ok(self.cur);
            }
            let state = BoardState {
                player: next_player,
                ..self.snapshot()
            };
            let id = self.record(pos, Some(mover), false, opts.trunk, move_number, state)?;
            self.player = next_player;
            return Ok(id);
        };

        if let Some(existing) = self.goban.stone_at(point) {
            if self.loading_sgf {
                if existing != mover {
                    warn!(
                        point = %notation::pretty_coords(Some(point), self.height()),
                        "duplicate stone placement, edit placing into a new branch"
                    );
                    let id = self.edit_node(pos, Some(mover), false)?;
                    self.player = mover.opp();
                    self.tree.node_mut(id).state.player = self.player;
                }
                return Ok(self.cur);
            }
            debug!(point = ?point, "refused: point is occupied");
            return Err(IllegalMove::Occupied.into());
        }

        let allow_suicide = self.rules.allow_self_capture || opts.allow_suicide;
        let placement = self.goban.place_stone(point, mover, allow_suicide).inspect_err(|e| {
            debug!(point = ?point, reason = %e, "refused placement");
        })?;

        let candidate = Candidate {
            board: placement.goban.board(),
            next_player,
        };
        if opts.check_for_ko && !self.rules.allow_ko && ko::is_ko(&self.tree, self.cur, &candidate) {
            debug!(point = ?point, "refused: ko");
            return Err(IllegalMove::Ko.into());
        }
        let repeating = opts.check_for_superko
            && ko::is_board_repeating(&self.tree, self.cur, &candidate, self.rules.superko_algorithm);
        if repeating && opts.error_on_superko && !self.rules.allow_superko {
            debug!(point = ?point, "refused: superko");
            return Err(IllegalMove::Superko.into());
        }

        let state = BoardState {
            board: placement.goban.board().to_vec(),
            player: next_player,
            captures: *placement.goban.captures(),
            board_is_repeating: repeating,
        };
        let id = self.record(pos, Some(mover), false, opts.trunk, move_number, state)?;

        self.goban = placement.goban;
        self.player = next_player;
        self.board_is_repeating = repeating;
        if !placement.suicide {
            self.notify_cell(point, Some(mover));
        }
        for p in placement.captured {
            self.notify_cell(p, None);
        }
        Ok(id)
    }

    pub(crate) fn edit_node(&mut self, pos: Option<Point>, color: Option<Stone>, trunk: bool) -> Result<NodeId, GoError> {
        let mut goban = self.goban.clone();
        if let Some(point) = pos {
            if !goban.on_board(point) {
                return Err(IllegalMove::OutOfBounds.into());
            }
            goban.set(point, color);
        }
        let state = BoardState {
            board: goban.board().to_vec(),
            ..self.snapshot()
        };
        let move_number = self.move_number();
        let id = self.record(pos, color, true, trunk, move_number, state)?;
        self.goban = goban;
        if let Some(point) = pos {
            self.notify_cell(point, color);
        }
        Ok(id)
    }

    fn record(
        &mut self,
        pos: Option<Point>,
        player: Option<Stone>,
        edited: bool,
        trunk: bool,
        move_number: u32,
        state: BoardState,
    ) -> Result<NodeId, GoError> {
        let id = self.tree.add_move(
            self.cur,
            NewMove {
                pos,
                player,
                trunk,
                edited,
                move_number,
                state,
            },
        )?;
        self.cur = id;
        Ok(id)
    }

    // -- Setup position --

    /// Change the setup position. The history is discarded; root marks
    /// survive.
    pub fn initial_state_place(&mut self, point: Point, color: Option<Stone>) -> Result<(), GoError> {
        if !self.goban.on_board(point) {
            return Err(IllegalMove::OutOfBounds.into());
        }
        let (w, h) = (self.width(), self.height());
        let player = self.player;
        self.goto(MoveTree::ROOT);
        self.player = player;

        self.goban.set(point, color);
        self.notify_cell(point, color);

        for stone in [Stone::Black, Stone::White] {
            let encoded = self.initial_state.get_mut(stone);
            let mut points: Vec<Point> = notation::decode_moves(encoded, w, h)?
                .into_iter()
                .filter_map(|m| m.pos)
                .filter(|&p| p != point)
                .collect();
            if color == Some(stone) {
                points.push(point);
            }
            *encoded = notation::encode_points(&points);
        }

        self.reset_move_tree();
        Ok(())
    }

    /// Start a fresh tree from the current board.
    pub fn reset_move_tree(&mut self) {
        let marks = self.tree.root_marks();
        self.player = self.initial_player;
        self.tree = MoveTree::new(self.snapshot());
        self.tree.set_root_marks(marks);
        self.cur = MoveTree::ROOT;
        self.last_official = MoveTree::ROOT;
        self.move_before_jump = None;
    }

    /// Setup strings describing the current board, for starting a new game
    /// from this position.
    pub fn compute_initial_state_for_forked_game(&self) -> InitialState {
        let mut state = InitialState::default();
        for point in self.goban.points() {
            if let Some(stone) = self.goban.stone_at(point) {
                state.get_mut(stone).push_str(&notation::encode_point(Some(point)));
            }
        }
        state
    }

    // -- Navigation --

    /// Show a node: restore its snapshot and notify every point that differs
    /// from the board being replaced.
    pub fn jump_to(&mut self, id: NodeId) -> Result<(), GoError> {
        if !self.tree.contains(id) {
            return Err(GoError::invariant(format!("attempted to jump to unknown node {id}")));
        }
        self.goto(id);
        Ok(())
    }

    pub(crate) fn goto(&mut self, id: NodeId) {
        trace!(from = self.cur, to = id, "jump");
        self.move_before_jump = Some(self.cur);
        self.cur = id;

        let node = self.tree.node(id);
        let own = node.pos;
        let changed: Vec<(Point, Option<Stone>)> = self
            .goban
            .points()
            .filter_map(|p| {
                let new = Stone::from_int(node.state.board[self.goban.idx(p)]);
                (self.goban.stone_at(p) != new || own == Some(p)).then_some((p, new))
            })
            .collect();

        let state = &node.state;
        self.goban.load(&state.board, state.captures);
        self.player = state.player;
        self.board_is_repeating = state.board_is_repeating;
        for (p, stone) in changed {
            self.notify_cell(p, stone);
        }
    }

    /// Step back to the parent. Returns `false` at the root.
    pub fn show_previous(&mut self) -> bool {
        match self.tree.prev(self.cur) {
            Some(parent) => {
                self.goto(parent);
                true
            }
            None => false,
        }
    }

    /// Step forward along the trunk or the last followed branch.
    pub fn show_next(&mut self) -> bool {
        match self.tree.next(self.cur, true) {
            Some(next) => {
                self.goto(next);
                true
            }
            None => false,
        }
    }

    pub fn jump_to_last_official_move(&mut self) {
        self.goto(self.last_official);
    }

    pub fn set_last_official_move(&mut self) -> Result<(), GoError> {
        if !self.tree.node(self.cur).trunk {
            return Err(GoError::invariant("attempted to set official move to non-trunk move"));
        }
        self.last_official = self.cur;
        Ok(())
    }

    pub fn is_last_official_move(&self) -> bool {
        self.cur == self.last_official
    }

    /// Rewind to the root, then take `n` steps along the default line.
    pub fn jump_to_official_move_number(&mut self, n: u32) {
        while self.show_previous() {}
        for _ in 0..n {
            match self.tree.next(self.cur, false) {
                Some(next) => self.goto(next),
                None => break,
            }
        }
    }

    /// Remove the node being shown and show its parent.
    pub fn delete_cur_move(&mut self) -> Result<(), GoError> {
        let parent = self.tree.remove(self.cur)?;
        self.goto(parent);
        Ok(())
    }

    /// Walk `moves` (an encoded move string) starting `from_turn` moves down
    /// the trunk, reusing nodes that already exist and playing the rest as a
    /// variation. Returns the nodes created or revisited after the reused
    /// prefix. On failure the engine returns to the last official move.
    pub fn follow_path(&mut self, from_turn: usize, moves: &str) -> Result<Vec<NodeId>, GoError> {
        let decoded = notation::decode_moves(moves, self.width(), self.height())?;

        let from = self.tree.index(MoveTree::ROOT, from_turn as i32);
        let mut cur = if self.tree.move_index(from) == from_turn {
            from
        } else {
            self.last_official
        };

        let mut i = 0;
        while let Some(mv) = decoded.get(i) {
            let player = if mv.edited {
                mv.color
            } else {
                Some(self.tree.node(cur).state.player)
            };
            match self.tree.lookup_move(cur, mv.pos, player, mv.edited) {
                Some(existing) => {
                    cur = existing;
                    i += 1;
                }
                None => break,
            }
        }
        self.goto(cur);

        let mut created = Vec::new();
        for mv in &decoded[i..] {
            let result = if mv.edited {
                self.edit_node(mv.pos, mv.color, false)
            } else {
                self.play_move(mv.pos, PlaceOptions { trunk: false, ..PlaceOptions::replay() })
            };
            match result {
                Ok(id) => created.push(id),
                Err(err) => {
                    warn!(error = %err, "could not follow path, returning to last official move");
                    self.goto(self.last_official);
                    return Err(err);
                }
            }
        }
        Ok(created)
    }

    /// The nearest trunk ancestor's move index, and the encoded moves from
    /// there to the node being shown.
    pub fn get_move_diff(&self) -> (usize, String) {
        let branch_point = self.tree.branch_point(self.cur);
        let mut moves: Vec<EncodedMove> = std::iter::once(self.cur)
            .chain(self.tree.ancestors(self.cur))
            .take_while(|&id| id != branch_point)
            .map(|id| self.tree.node(id).encoded())
            .collect();
        moves.reverse();
        (self.tree.move_index(branch_point), notation::encode_moves(&moves))
    }

    /// The node that played at `point`, looking forward along the followed
    /// line first and then back towards the root.
    pub fn get_move_by_location(&self, point: Point) -> Option<NodeId> {
        let hit = |id: &NodeId| self.tree.node(*id).pos == Some(point);
        let mut forward = std::iter::successors(Some(self.cur), |&id| self.tree.next(id, true));
        let mut backward = self.tree.ancestors(self.cur);
        forward.find(hit).or_else(|| backward.find(hit))
    }

    // -- Phases --

    /// True while the game is young enough to be cancelled instead of resigned.
    pub fn game_can_be_canceled(&self) -> bool {
        if self.phase != Phase::Play {
            return false;
        }
        let handicap_moves = if self.rules.free_handicap_placement {
            self.rules.handicap as u32
        } else {
            1
        };
        self.move_number() < 1 + handicap_moves
    }

    pub fn enter_stone_removal(&mut self) -> Result<(), GoError> {
        if self.phase != Phase::Play {
            return Err(GoError::invariant(format!("cannot enter stone removal from {}", self.phase)));
        }
        self.phase = Phase::StoneRemoval;
        Ok(())
    }

    /// Leave stone removal and continue playing. Removal marks are cleared.
    /// Under rulesets where the opponent moves first after a resumption, the
    /// player who asked to resume waits.
    pub fn resume_play(&mut self, resumer: Option<Stone>) -> Result<(), GoError> {
        if self.phase != Phase::StoneRemoval {
            return Err(GoError::invariant(format!("cannot resume play from {}", self.phase)));
        }
        self.clear_removed();
        if self.rules.opponent_plays_first_after_resume
            && let Some(resumer) = resumer
        {
            self.player = resumer.opp();
        }
        self.phase = Phase::Play;
        Ok(())
    }

    pub fn finish(&mut self, winner: Option<Stone>, outcome: impl Into<String>) -> Result<(), GoError> {
        if self.phase == Phase::Finished {
            return Err(GoError::invariant("game is already finished"));
        }
        self.winner = winner;
        self.outcome = Some(outcome.into());
        self.phase = Phase::Finished;
        Ok(())
    }

    /// In analyze mode the board stays editable in every phase and removed
    /// stones stay on the board when scoring.
    pub fn set_analyze_mode(&mut self, on: bool) {
        self.analyze_mode = on;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::rules::RuleSet;

    fn engine(rules: RuleSet, size: u8) -> Engine {
        Engine::new(GameConfig::with_rules(rules).with_size(size, size)).unwrap()
    }

    fn play_all(engine: &mut Engine, points: &[Point]) {
        for &p in points {
            engine.place_with(Some(p), PlaceOptions::trunk()).unwrap();
        }
    }

    #[derive(Default)]
    struct Recorder {
        cells: Rc<RefCell<Vec<(Point, Option<Stone>)>>>,
    }

    impl BoardObserver for Recorder {
        fn cell_changed(&mut self, point: Point, stone: Option<Stone>) {
            self.cells.borrow_mut().push((point, stone));
        }
    }

    // -- Construction --

    #[test]
    fn starts_at_root_with_black() {
        let e = engine(RuleSet::Japanese, 9);
        assert_eq!(e.cur_move(), MoveTree::ROOT);
        assert_eq!(e.player(), Stone::Black);
        assert_eq!(e.phase(), Phase::Play);
        assert!(e.goban().is_empty());
    }

    #[test]
    fn replays_config_moves_onto_trunk() {
        let config = GameConfig::from_json(r#"{"width": 9, "height": 9, "moves": "ccdd..ee"}"#).unwrap();
        let e = Engine::new(config).unwrap();
        assert_eq!(e.stone_at((2, 2)), Some(Stone::Black));
        assert_eq!(e.stone_at((3, 3)), Some(Stone::White));
        assert_eq!(e.stone_at((4, 4)), Some(Stone::White));
        assert_eq!(e.move_number(), 4);
        assert!(e.tree().node(e.cur_move()).trunk);
        assert!(e.is_last_official_move());
        assert!(e.load_errors().is_empty());
    }

    #[test]
    fn unreplayable_move_becomes_an_edit() {
        let config = GameConfig::from_json(r#"{"width": 9, "height": 9, "moves": "cccc"}"#).unwrap();
        let e = Engine::new(config).unwrap();
        assert_eq!(e.load_errors().len(), 1);
        assert!(e.tree().node(e.cur_move()).edited);
        assert_eq!(e.stone_at((2, 2)), Some(Stone::White));
    }

    #[test]
    fn fixed_handicap_gives_white_the_move() {
        let config = GameConfig {
            handicap: Some(2),
            ..GameConfig::with_rules(RuleSet::Japanese)
        };
        let e = Engine::new(config).unwrap();
        assert_eq!(e.stone_at((15, 3)), Some(Stone::Black));
        assert_eq!(e.stone_at((3, 15)), Some(Stone::Black));
        assert_eq!(e.player(), Stone::White);
    }

    #[test]
    fn removed_points_are_marked() {
        let config = GameConfig::from_json(r#"{"width": 5, "height": 5, "moves": "aa", "removed": "aa"}"#).unwrap();
        let e = Engine::new(config).unwrap();
        assert!(e.is_removed((0, 0)));
    }

    // -- Placement --

    #[test]
    fn place_alternates_players() {
        let mut e = engine(RuleSet::Japanese, 9);
        e.place((4, 4)).unwrap();
        assert_eq!(e.player(), Stone::White);
        e.pass().unwrap();
        assert_eq!(e.player(), Stone::Black);
        assert_eq!(e.move_number(), 2);
        assert!(e.tree().node(e.cur_move()).is_pass());
    }

    #[test]
    fn occupied_point_is_refused() {
        let mut e = engine(RuleSet::Japanese, 9);
        e.place((4, 4)).unwrap();
        let before = e.cur_move();
        assert_eq!(e.place((4, 4)), Err(GoError::IllegalMove(IllegalMove::Occupied)));
        assert_eq!(e.cur_move(), before);
        assert_eq!(e.player(), Stone::White);
    }

    #[test]
    fn suicide_is_refused_without_touching_the_board() {
        let mut e = engine(RuleSet::Japanese, 5);
        play_all(&mut e, &[(1, 0), (4, 4), (0, 1)]);
        let board = e.board().to_vec();
        assert_eq!(e.place((0, 0)), Err(GoError::IllegalMove(IllegalMove::Suicide)));
        assert_eq!(e.board(), board.as_slice());
        assert_eq!(e.player(), Stone::White);
    }

    #[test]
    fn self_capture_under_permissive_rules() {
        let mut e = engine(RuleSet::Nz, 5);
        play_all(&mut e, &[(1, 0), (4, 4), (0, 1)]);
        e.place((0, 0)).unwrap();
        assert_eq!(e.stone_at((0, 0)), None);
        assert_eq!(e.captures().black, 1);
    }

    #[test]
    fn capture_credits_prisoners() {
        let mut e = engine(RuleSet::Japanese, 9);
        play_all(&mut e, &[(2, 2), (2, 3), (3, 3), (1, 2), (8, 8), (2, 1)]);
        assert_eq!(e.stone_at((2, 2)), Some(Stone::Black));
        e.place_with(Some((0, 0)), PlaceOptions::trunk()).unwrap();
        e.place_with(Some((3, 2)), PlaceOptions::trunk()).unwrap();
        assert_eq!(e.stone_at((2, 2)), None);
        assert_eq!(e.captures().white, 1);
    }

    /// Black (1,0) (0,1) (1,2), white (2,0) (3,1) (2,2); black takes at
    /// (2,1) after white plays (1,1).
    fn ko_position(rules: RuleSet) -> Engine {
        let mut e = engine(rules, 5);
        play_all(
            &mut e,
            &[(1, 0), (2, 0), (0, 1), (3, 1), (1, 2), (2, 2), (2, 1), (1, 1)],
        );
        assert_eq!(e.stone_at((2, 1)), None);
        e
    }

    #[test]
    fn immediate_recapture_is_ko() {
        let mut e = ko_position(RuleSet::Japanese);
        assert_eq!(e.place((2, 1)), Err(GoError::IllegalMove(IllegalMove::Ko)));
    }

    #[test]
    fn ko_can_be_disabled() {
        let mut e = ko_position(RuleSet::Japanese);
        e.rules.allow_ko = true;
        e.place((2, 1)).unwrap();
        assert_eq!(e.stone_at((1, 1)), None);
    }

    #[test]
    fn trunk_move_on_a_branch_is_refused() {
        let mut e = engine(RuleSet::Japanese, 9);
        e.place((0, 0)).unwrap();
        let before = e.board().to_vec();
        assert!(matches!(
            e.place_with(Some((1, 1)), PlaceOptions::trunk()),
            Err(GoError::InvariantViolation(_))
        ));
        assert_eq!(e.board(), before.as_slice());
    }

    #[test]
    fn free_handicap_keeps_black_on_move() {
        let config = GameConfig {
            handicap: Some(3),
            ..GameConfig::with_rules(RuleSet::Chinese).with_size(9, 9)
        };
        let mut e = Engine::new(config).unwrap();
        assert_eq!(e.handicap_moves_left(), 3);
        e.place((2, 2)).unwrap();
        assert_eq!(e.player(), Stone::Black);
        let cur = e.cur_move();
        assert_eq!(e.pass().unwrap(), cur);
        e.place((6, 6)).unwrap();
        e.place((2, 6)).unwrap();
        assert_eq!(e.player(), Stone::White);
        assert_eq!(e.handicap_moves_left(), 0);
    }

    #[test]
    fn edit_place_keeps_player() {
        let mut e = engine(RuleSet::Japanese, 9);
        let id = e.edit_place((3, 3), Some(Stone::White)).unwrap();
        assert_eq!(e.player(), Stone::Black);
        assert_eq!(e.stone_at((3, 3)), Some(Stone::White));
        let node = e.tree().node(id);
        assert!(node.edited);
        assert_eq!(node.move_number, 0);
        e.edit_place((3, 3), None).unwrap();
        assert_eq!(e.stone_at((3, 3)), None);
    }

    #[test]
    fn board_changes_need_play_phase_or_analyze_mode() {
        let mut e = engine(RuleSet::Japanese, 9);
        e.enter_stone_removal().unwrap();
        assert!(matches!(e.place((0, 0)), Err(GoError::InvariantViolation(_))));
        e.set_analyze_mode(true);
        e.place((0, 0)).unwrap();
    }

    // -- Observer --

    #[test]
    fn observer_sees_placements_and_captures() {
        let mut e = engine(RuleSet::Japanese, 5);
        let rec = Recorder::default();
        let cells = rec.cells.clone();
        e.set_observer(Box::new(rec));
        play_all(&mut e, &[(0, 0), (1, 0), (4, 4), (0, 1)]);
        let log = cells.borrow();
        assert_eq!(log.last(), Some(&((0, 0), None)));
        assert!(log.contains(&((0, 1), Some(Stone::White))));
    }

    #[test]
    fn jumps_notify_only_changed_points() {
        let mut e = engine(RuleSet::Japanese, 5);
        play_all(&mut e, &[(0, 0), (1, 1), (2, 2)]);
        let rec = Recorder::default();
        let cells = rec.cells.clone();
        e.set_observer(Box::new(rec));
        e.show_previous();
        // (2,2) disappears; (1,1) is the shown node's own move.
        let mut log = cells.borrow().clone();
        log.sort();
        assert_eq!(log, vec![((1, 1), Some(Stone::White)), ((2, 2), None)]);
    }

    // -- Navigation --

    #[test]
    fn navigation_restores_snapshots() {
        let mut e = engine(RuleSet::Japanese, 5);
        play_all(&mut e, &[(0, 0), (1, 1)]);
        let end = e.cur_move();
        assert!(e.show_previous());
        assert_eq!(e.stone_at((1, 1)), None);
        assert_eq!(e.player(), Stone::White);
        assert_eq!(e.move_before_jump(), Some(end));
        assert!(e.show_next());
        assert_eq!(e.cur_move(), end);
        assert_eq!(e.player(), Stone::Black);
        assert!(matches!(e.jump_to(999), Err(GoError::InvariantViolation(_))));
    }

    #[test]
    fn show_next_follows_last_visited_branch() {
        let mut e = engine(RuleSet::Japanese, 5);
        e.place((0, 0)).unwrap();
        e.jump_to(MoveTree::ROOT).unwrap();
        let b = e.place((4, 4)).unwrap();
        e.show_previous();
        e.show_next();
        assert_eq!(e.cur_move(), b);
    }

    #[test]
    fn official_move_bookkeeping() {
        let mut e = engine(RuleSet::Japanese, 5);
        play_all(&mut e, &[(0, 0), (1, 1), (2, 2)]);
        e.set_last_official_move().unwrap();
        e.jump_to_official_move_number(1);
        assert_eq!(e.move_number(), 1);
        assert!(!e.is_last_official_move());
        e.place((3, 3)).unwrap();
        assert!(e.set_last_official_move().is_err());
        e.jump_to_last_official_move();
        assert_eq!(e.move_number(), 3);
        assert_eq!(e.current_move_number(), 3);
    }

    #[test]
    fn delete_cur_move_refuses_trunk() {
        let mut e = engine(RuleSet::Japanese, 5);
        play_all(&mut e, &[(0, 0)]);
        assert!(e.delete_cur_move().is_err());
        let branch = e.place((1, 1)).unwrap();
        e.delete_cur_move().unwrap();
        assert_eq!(e.stone_at((1, 1)), None);
        assert!(e.tree().parent(branch).is_none());
        e.jump_to(MoveTree::ROOT).unwrap();
        assert!(e.delete_cur_move().is_err());
    }

    #[test]
    fn follow_path_reuses_existing_moves() {
        let mut e = engine(RuleSet::Japanese, 9);
        play_all(&mut e, &[(2, 2), (3, 3)]);
        e.set_last_official_move().unwrap();
        let created = e.follow_path(1, "dded").unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(e.move_number(), 3);
        assert_eq!(e.stone_at((4, 3)), Some(Stone::Black));
        assert!(!e.tree().node(e.cur_move()).trunk);
        assert_eq!(e.get_move_diff(), (2, "ed".to_string()));
    }

    #[test]
    fn follow_path_failure_returns_to_official_move() {
        let mut e = engine(RuleSet::Japanese, 9);
        play_all(&mut e, &[(2, 2)]);
        e.set_last_official_move().unwrap();
        let official = e.cur_move();
        assert!(e.follow_path(1, "cc").is_err());
        assert_eq!(e.cur_move(), official);
    }

    #[test]
    fn move_by_location_searches_both_ways() {
        let mut e = engine(RuleSet::Japanese, 5);
        play_all(&mut e, &[(0, 0), (1, 1), (2, 2)]);
        let last = e.cur_move();
        e.jump_to_official_move_number(1);
        assert_eq!(e.get_move_by_location((2, 2)), Some(last));
        assert_eq!(e.get_move_by_location((0, 0)), Some(e.cur_move()));
        assert_eq!(e.get_move_by_location((4, 4)), None);
    }

    // -- Setup position --

    #[test]
    fn initial_state_place_rewrites_setup() {
        let mut e = engine(RuleSet::Japanese, 5);
        e.tree_mut().node_mut(MoveTree::ROOT).marks_mut((4, 4)).triangle = true;
        e.place((0, 0)).unwrap();
        e.initial_state_place((1, 1), Some(Stone::White)).unwrap();
        e.initial_state_place((2, 2), Some(Stone::Black)).unwrap();
        e.initial_state_place((1, 1), Some(Stone::Black)).unwrap();
        assert_eq!(e.initial_state().black, "ccbb");
        assert_eq!(e.initial_state().white, "");
        assert_eq!(e.cur_move(), MoveTree::ROOT);
        assert!(!e.tree().node(MoveTree::ROOT).has_children());
        assert!(e.tree().node(MoveTree::ROOT).marks((4, 4)).is_some_and(|m| m.triangle));
        assert_eq!(e.stone_at((0, 0)), None);
    }

    #[test]
    fn forked_state_lists_every_stone() {
        let mut e = engine(RuleSet::Japanese, 5);
        play_all(&mut e, &[(0, 0), (1, 0), (4, 4)]);
        let s = e.compute_initial_state_for_forked_game();
        assert_eq!(s.black, "aaee");
        assert_eq!(s.white, "ba");
    }

    // -- Phases --

    #[test]
    fn cancel_window_closes_after_first_moves() {
        let mut e = engine(RuleSet::Japanese, 9);
        assert!(e.game_can_be_canceled());
        play_all(&mut e, &[(0, 0)]);
        assert!(e.game_can_be_canceled());
        play_all(&mut e, &[(1, 1)]);
        assert!(!e.game_can_be_canceled());
    }

    #[test]
    fn resume_hands_the_move_to_the_opponent() {
        let mut e = engine(RuleSet::Japanese, 9);
        e.enter_stone_removal().unwrap();
        e.set_removed((0, 0), true);
        e.resume_play(Some(Stone::Black)).unwrap();
        assert_eq!(e.player(), Stone::White);
        assert!(!e.is_removed((0, 0)));
        assert!(e.resume_play(None).is_err());
    }

    #[test]
    fn finishing_records_the_result() {
        let mut e = engine(RuleSet::Japanese, 9);
        e.finish(Some(Stone::White), "W+R").unwrap();
        assert_eq!(e.phase(), Phase::Finished);
        assert_eq!(e.winner(), Some(Stone::White));
        assert_eq!(e.outcome(), Some("W+R"));
        assert!(e.finish(None, "").is_err());
    }

    #[test]
    fn phase_text_round_trips() {
        for phase in [Phase::Play, Phase::StoneRemoval, Phase::Finished] {
            assert_eq!(phase.to_string().parse::<Phase>(), Ok(phase));
        }
        assert!("over".parse::<Phase>().is_err());
    }
}

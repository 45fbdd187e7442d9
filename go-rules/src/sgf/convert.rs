use tracing::{debug, warn};

use crate::Point;
use crate::engine::{Engine, Phase, PlaceOptions};
use crate::error::GoError;
use crate::move_tree::NodeId;
use crate::notation;
use crate::rules::{ColorName, GameConfig, InitialState, RuleSet};
use crate::stone::Stone;

use super::error::SgfError;
use super::parser::{self, MarkKind, SgfAction, SgfHeader};
use super::serialize::serialize;

/// An engine rebuilt from SGF. `error` is set when the text was cut short;
/// everything read before the error is in the engine.
#[derive(Debug)]
pub struct SgfLoad {
    pub engine: Engine,
    pub error: Option<GoError>,
}

impl Engine {
    /// Build an engine from SGF text. Header properties fill the fields
    /// `config` leaves unset. The engine ends on the deepest move loaded, in
    /// the finished phase.
    pub fn from_sgf(text: &str, mut config: GameConfig) -> Result<SgfLoad, GoError> {
        let record = parser::parse(text);
        let nothing_read = record.actions.is_empty() && record.header == SgfHeader::default();
        if let Some(err) = &record.error
            && (nothing_read || *err == SgfError::EmptyCollection)
        {
            return Err(err.clone().into());
        }

        apply_header(&record.header, &mut config);
        let mut engine = Engine::new(config)?;
        engine.loading_sgf = true;
        let applied = engine.apply_sgf_actions(record.actions);
        engine.loading_sgf = false;
        applied?;

        if engine.phase == Phase::Play {
            engine.phase = Phase::Finished;
        }
        if let Some(err) = &record.error {
            warn!(error = %err, "SGF truncated, keeping the moves read before the error");
        }
        debug!(nodes = engine.tree.len(), "SGF loaded");
        Ok(SgfLoad {
            engine,
            error: record.error.map(GoError::from),
        })
    }

    fn apply_sgf_actions(&mut self, actions: Vec<SgfAction>) -> Result<(), GoError> {
        let opts = PlaceOptions {
            check_for_superko: true,
            trunk: false,
            ..PlaceOptions::replay()
        };
        let mut branch_points: Vec<NodeId> = Vec::new();
        let mut farthest = self.cur;

        for action in actions {
            match action {
                SgfAction::Edit { point, color } => {
                    if self.goban.on_board(point) {
                        self.edit_node(Some(point), color, false)?;
                    } else {
                        warn!(point = ?point, "SGF edit outside the board ignored");
                    }
                }
                SgfAction::Play { color, point } => {
                    let pos = point.filter(|&p| self.goban.on_board(p));
                    self.apply_sgf_move(color, pos, opts)?;
                    if self.tree.node(self.cur).move_number > self.tree.node(farthest).move_number {
                        farthest = self.cur;
                    }
                }
                SgfAction::Comment(text) => {
                    let node = self.tree.node_mut(self.cur);
                    if !node.text.is_empty() {
                        node.text.push('\n');
                    }
                    node.text.push_str(&text);
                }
                SgfAction::Mark { point, kind } => {
                    if !self.goban.on_board(point) {
                        continue;
                    }
                    let marks = self.tree.node_mut(self.cur).marks_mut(point);
                    match kind {
                        MarkKind::Triangle => marks.triangle = true,
                        MarkKind::Square => marks.square = true,
                        MarkKind::Circle => marks.circle = true,
                        MarkKind::Cross => marks.cross = true,
                        MarkKind::Label(text) => marks.letter = Some(text),
                    }
                }
                SgfAction::Result { winner, text } => {
                    let outcome = match winner {
                        Some(w) => text
                            .strip_prefix(w.letter())
                            .and_then(|rest| rest.strip_prefix('+'))
                            .map_or_else(|| text.clone(), str::to_string),
                        None => text,
                    };
                    self.winner = winner;
                    self.outcome = Some(outcome);
                }
                SgfAction::SaveBranchPoint => branch_points.push(self.cur),
                SgfAction::RestoreBranchPoint => {
                    if let Some(id) = branch_points.pop() {
                        self.goto(id);
                    }
                }
            }
        }

        self.goto(farthest);
        Ok(())
    }

    /// A move of the right color is played; a stone of the wrong color is
    /// edit placed. A pass of the wrong color hands the move over first.
    fn apply_sgf_move(&mut self, color: Stone, pos: Option<Point>, opts: PlaceOptions) -> Result<(), GoError> {
        let result = if color == self.player {
            self.play_move(pos, opts)
        } else if pos.is_some() {
            self.edit_node(pos, Some(color), false)
        } else {
            self.player = color;
            self.play_move(None, opts)
        };

        if let Err(err) = result {
            warn!(
                color = %color,
                point = %notation::pretty_coords(pos, self.height()),
                error = %err,
                "SGF move could not be played, applying it as an edit"
            );
            self.load_errors.push(err);
            self.edit_node(pos, Some(color), false)?;
        }
        Ok(())
    }

    /// Write the whole move tree as SGF.
    pub fn to_sgf(&self) -> Result<String, GoError> {
        let (w, h) = (self.width(), self.height());
        let mut setup = Vec::new();
        for stone in [Stone::Black, Stone::White] {
            for mv in notation::decode_moves(self.initial_state.get(stone), w, h)? {
                if let Some(point) = mv.pos {
                    setup.push((stone, point));
                }
            }
        }

        let result = match (self.winner, self.outcome.as_deref()) {
            (Some(winner), Some(outcome)) if outcome.starts_with(winner.letter()) => Some(outcome.to_string()),
            (Some(winner), Some(outcome)) => Some(format!("{}+{outcome}", winner.letter())),
            (Some(winner), None) => Some(format!("{}+", winner.letter())),
            (None, outcome) => outcome.map(str::to_string),
        };

        let header = SgfHeader {
            size: Some((w, h)),
            komi: Some(self.rules.komi),
            handicap: Some(self.rules.handicap as u32),
            rules: Some(self.rules.rule_set.to_string()),
            player: (self.initial_player == Stone::White).then_some(Stone::White),
            result,
            setup,
        };
        serialize(&header, &self.tree).map_err(GoError::from)
    }
}

fn apply_header(header: &SgfHeader, config: &mut GameConfig) {
    if let Some((cols, rows)) = header.size {
        config.width.get_or_insert(cols);
        config.height.get_or_insert(rows);
    }
    if let Some(komi) = header.komi {
        config.komi.get_or_insert(komi);
    }
    if let Some(handicap) = header.handicap {
        config.handicap.get_or_insert(u8::try_from(handicap).unwrap_or(u8::MAX));
    }
    if let Some(rules) = &header.rules {
        config.rules.get_or_insert(RuleSet::from(rules.as_str()));
    }
    if let Some(player) = header.player {
        config.initial_player.get_or_insert(ColorName::from(player));
    }
    if !header.setup.is_empty() {
        let state = config.initial_state.get_or_insert_with(InitialState::default);
        for &(stone, point) in &header.setup {
            state.get_mut(stone).push_str(&notation::encode_point(Some(point)));
        }
    }
}

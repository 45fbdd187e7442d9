use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Point;
use crate::engine::Phase;
use crate::error::GoError;
use crate::handicap;
use crate::notation::{self, MAX_ENCODABLE, MoveList};
use crate::portable::PortableNode;
use crate::stone::Stone;

/// A named ruleset. Unrecognized names map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleSet {
    Chinese,
    Aga,
    #[default]
    Japanese,
    Korean,
    Ing,
    Nz,
    Other,
}

impl From<&str> for RuleSet {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "chinese" => RuleSet::Chinese,
            "aga" => RuleSet::Aga,
            "japanese" => RuleSet::Japanese,
            "korean" => RuleSet::Korean,
            "ing" => RuleSet::Ing,
            "nz" => RuleSet::Nz,
            _ => RuleSet::Other,
        }
    }
}

impl From<String> for RuleSet {
    fn from(s: String) -> Self {
        RuleSet::from(s.as_str())
    }
}

impl From<RuleSet> for String {
    fn from(r: RuleSet) -> Self {
        r.to_string()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSet::Chinese => write!(f, "chinese"),
            RuleSet::Aga => write!(f, "aga"),
            RuleSet::Japanese => write!(f, "japanese"),
            RuleSet::Korean => write!(f, "korean"),
            RuleSet::Ing => write!(f, "ing"),
            RuleSet::Nz => write!(f, "nz"),
            RuleSet::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SuperkoAlgorithm {
    /// Board and player to move must both repeat.
    #[default]
    #[serde(rename = "ssk")]
    Situational,
    /// Board repetition alone counts.
    #[serde(rename = "psk")]
    Positional,
}

/// Every rule parameter a ruleset fixes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleDefaults {
    pub komi: f64,
    pub allow_self_capture: bool,
    pub allow_ko: bool,
    pub allow_superko: bool,
    pub superko_algorithm: SuperkoAlgorithm,
    pub free_handicap_placement: bool,
    pub aga_handicap_scoring: bool,
    pub score_territory: bool,
    pub score_territory_in_seki: bool,
    pub score_stones: bool,
    pub score_handicap: bool,
    pub score_prisoners: bool,
    pub score_passes: bool,
    pub white_must_pass_last: bool,
    pub opponent_plays_first_after_resume: bool,
}

impl RuleDefaults {
    const BASE: RuleDefaults = RuleDefaults {
        komi: 0.0,
        allow_self_capture: false,
        allow_ko: false,
        allow_superko: false,
        superko_algorithm: SuperkoAlgorithm::Situational,
        free_handicap_placement: false,
        aga_handicap_scoring: false,
        score_territory: true,
        score_territory_in_seki: true,
        score_stones: true,
        score_handicap: false,
        score_prisoners: true,
        score_passes: true,
        white_must_pass_last: false,
        opponent_plays_first_after_resume: false,
    };
}

impl RuleSet {
    pub fn defaults(self) -> RuleDefaults {
        let base = RuleDefaults::BASE;
        match self {
            RuleSet::Chinese => RuleDefaults {
                komi: 7.5,
                score_prisoners: false,
                free_handicap_placement: true,
                score_handicap: true,
                ..base
            },
            RuleSet::Aga => RuleDefaults {
                komi: 7.5,
                score_prisoners: false,
                white_must_pass_last: true,
                aga_handicap_scoring: true,
                score_handicap: true,
                ..base
            },
            RuleSet::Japanese | RuleSet::Korean => RuleDefaults {
                komi: 6.5,
                allow_superko: true,
                score_territory_in_seki: false,
                score_stones: false,
                opponent_plays_first_after_resume: true,
                ..base
            },
            RuleSet::Ing => RuleDefaults {
                komi: 8.0,
                score_prisoners: false,
                free_handicap_placement: true,
                allow_self_capture: true,
                ..base
            },
            RuleSet::Nz => RuleDefaults {
                komi: 7.0,
                score_prisoners: false,
                free_handicap_placement: true,
                allow_self_capture: true,
                ..base
            },
            RuleSet::Other => RuleDefaults {
                komi: 0.0,
                score_prisoners: false,
                allow_superko: true,
                free_handicap_placement: true,
                allow_self_capture: true,
                ..base
            },
        }
    }
}

/// Fully resolved rule parameters of a game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    pub rule_set: RuleSet,
    pub handicap: u8,
    pub strict_seki_mode: bool,
    #[serde(flatten)]
    pub params: RuleDefaults,
}

impl std::ops::Deref for Rules {
    type Target = RuleDefaults;

    fn deref(&self) -> &RuleDefaults {
        &self.params
    }
}

impl std::ops::DerefMut for Rules {
    fn deref_mut(&mut self) -> &mut RuleDefaults {
        &mut self.params
    }
}

/// Color names as they appear in configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    Black,
    White,
}

impl From<ColorName> for Stone {
    fn from(c: ColorName) -> Self {
        match c {
            ColorName::Black => Stone::Black,
            ColorName::White => Stone::White,
        }
    }
}

impl From<Stone> for ColorName {
    fn from(s: Stone) -> Self {
        match s {
            Stone::Black => ColorName::Black,
            Stone::White => ColorName::White,
        }
    }
}

/// Setup stones as encoded move strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialState {
    #[serde(default)]
    pub black: String,
    #[serde(default)]
    pub white: String,
}

impl InitialState {
    pub fn get(&self, stone: Stone) -> &str {
        match stone {
            Stone::Black => &self.black,
            Stone::White => &self.white,
        }
    }

    pub fn get_mut(&mut self, stone: Stone) -> &mut String {
        match stone {
            Stone::Black => &mut self.black,
            Stone::White => &mut self.white,
        }
    }
}

/// A game description as received from a caller. Absent fields take the
/// ruleset defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rules: Option<RuleSet>,
    pub komi: Option<f64>,
    pub handicap: Option<u8>,
    pub width: Option<u8>,
    pub height: Option<u8>,
    pub phase: Option<Phase>,
    pub initial_player: Option<ColorName>,
    pub initial_state: Option<InitialState>,
    pub moves: Option<MoveList>,
    pub removed: Option<String>,
    pub move_tree: Option<PortableNode>,
    pub outcome: Option<String>,

    pub allow_self_capture: Option<bool>,
    pub allow_ko: Option<bool>,
    pub allow_superko: Option<bool>,
    pub superko_algorithm: Option<SuperkoAlgorithm>,
    pub free_handicap_placement: Option<bool>,
    pub aga_handicap_scoring: Option<bool>,
    pub score_territory: Option<bool>,
    pub score_territory_in_seki: Option<bool>,
    pub score_stones: Option<bool>,
    pub score_handicap: Option<bool>,
    pub score_prisoners: Option<bool>,
    pub score_passes: Option<bool>,
    pub white_must_pass_last: Option<bool>,
    pub opponent_plays_first_after_resume: Option<bool>,
    pub strict_seki_mode: Option<bool>,
}

/// The outcome of resolving a [`GameConfig`]: everything an engine needs
/// before the first node exists.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSetup {
    pub rules: Rules,
    pub width: u8,
    pub height: u8,
    pub phase: Phase,
    pub initial_player: Stone,
    pub initial_state: InitialState,
}

impl GameSetup {
    /// Decoded setup stones for one color.
    pub fn initial_stones(&self, stone: Stone) -> Result<Vec<Point>, GoError> {
        let moves = notation::decode_moves(self.initial_state.get(stone), self.width, self.height)?;
        Ok(moves.into_iter().filter_map(|m| m.pos).collect())
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, GoError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, GoError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        GameConfig {
            rules: Some(rules),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u8, height: u8) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Merge the ruleset defaults with the overrides in this config and lay
    /// out fixed handicap stones when the ruleset asks for them.
    pub fn resolve(&self) -> Result<GameSetup, GoError> {
        let width = self.width.unwrap_or(19);
        let height = self.height.unwrap_or(19);
        for (name, v) in [("width", width), ("height", height)] {
            if v == 0 || v > MAX_ENCODABLE {
                return Err(GoError::malformed(format!(
                    "{name} must be between 1 and {MAX_ENCODABLE}, got {v}"
                )));
            }
        }

        let phase = self.phase.unwrap_or_default();
        let rule_set = self.rules.unwrap_or_default();
        let handicap = self.handicap.unwrap_or(0);
        let defaults = rule_set.defaults();

        let komi = match self.komi {
            Some(k) => k,
            None if handicap > 0 => defaults.komi.fract(),
            None => defaults.komi,
        };

        let params = RuleDefaults {
            komi,
            allow_self_capture: self.allow_self_capture.unwrap_or(defaults.allow_self_capture),
            allow_ko: self.allow_ko.unwrap_or(defaults.allow_ko),
            allow_superko: self.allow_superko.unwrap_or(defaults.allow_superko),
            superko_algorithm: self.superko_algorithm.unwrap_or(defaults.superko_algorithm),
            free_handicap_placement: self
                .free_handicap_placement
                .unwrap_or(defaults.free_handicap_placement),
            aga_handicap_scoring: self.aga_handicap_scoring.unwrap_or(defaults.aga_handicap_scoring),
            score_territory: self.score_territory.unwrap_or(defaults.score_territory),
            score_territory_in_seki: self
                .score_territory_in_seki
                .unwrap_or(defaults.score_territory_in_seki),
            score_stones: self.score_stones.unwrap_or(defaults.score_stones),
            score_handicap: self.score_handicap.unwrap_or(defaults.score_handicap),
            score_prisoners: self.score_prisoners.unwrap_or(defaults.score_prisoners),
            score_passes: self.score_passes.unwrap_or(defaults.score_passes),
            white_must_pass_last: self.white_must_pass_last.unwrap_or(defaults.white_must_pass_last),
            opponent_plays_first_after_resume: self
                .opponent_plays_first_after_resume
                .unwrap_or(defaults.opponent_plays_first_after_resume),
        };

        let mut rules = Rules {
            rule_set,
            handicap,
            strict_seki_mode: self.strict_seki_mode.unwrap_or(phase == Phase::Finished),
            params,
        };
        let mut initial_player = self.initial_player.map_or(Stone::Black, Stone::from);

        let initial_state = match &self.initial_state {
            Some(state) => state.clone(),
            None => {
                if !handicap::has_fixed_layout(width, height) {
                    rules.free_handicap_placement = true;
                }
                let mut state = InitialState::default();
                if handicap > 0 && !rules.free_handicap_placement {
                    match handicap::handicap_points(width, height, handicap) {
                        Some(points) => {
                            state.black = notation::encode_points(&points);
                            initial_player = Stone::White;
                        }
                        None => rules.free_handicap_placement = true,
                    }
                }
                state
            }
        };

        Ok(GameSetup {
            rules,
            width,
            height,
            phase,
            initial_player,
            initial_state,
        })
    }
}

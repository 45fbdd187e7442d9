use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::GoError;
use crate::goban::Goban;
use crate::groups::GroupAnalysis;
use crate::notation;
use crate::stone::Stone;

/// One player's side of a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub total: f64,
    pub stones: u32,
    pub territory: u32,
    pub prisoners: u32,
    /// Encoded points that contributed stones or territory.
    pub scoring_positions: String,
    pub handicap: u32,
    pub komi: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub black: PlayerScore,
    pub white: PlayerScore,
}

impl ScoreBreakdown {
    pub fn get(&self, stone: Stone) -> &PlayerScore {
        match stone {
            Stone::Black => &self.black,
            Stone::White => &self.white,
        }
    }

    fn get_mut(&mut self, stone: Stone) -> &mut PlayerScore {
        match stone {
            Stone::Black => &mut self.black,
            Stone::White => &mut self.white,
        }
    }

    /// `"B+3.5"`, `"W+0.5"` or `"Draw"`.
    pub fn result(&self) -> String {
        format_result(self.black.total, self.white.total)
    }
}

/// Format the game result string from final scores.
pub fn format_result(black_score: f64, white_score: f64) -> String {
    let diff = black_score - white_score;
    if diff > 0.0 {
        format!("B+{diff}")
    } else if diff < 0.0 {
        format!("W+{}", -diff)
    } else {
        "Draw".to_string()
    }
}

/// Games scored before AGA handicap scoring was fixed gave white one point
/// per handicap stone instead of one per stone after the first. When the
/// recorded `outcome` margin is exactly one more than the computed margin,
/// the old count is restored so the breakdown adds up to the recorded result.
pub fn legacy_aga_handicap_correction(score: &mut ScoreBreakdown, outcome: &str) {
    let Some(recorded) = leading_number(outcome) else {
        return;
    };
    if recorded - 1.0 == (score.white.total - score.black.total).abs() {
        score.white.handicap += 1;
    }
}

/// The numeric prefix of `s`, as in `"3.5 points"`.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

impl Engine {
    /// Score the board being shown. Points marked removed are taken off the
    /// board first (except in analyze mode) and credited as prisoners when
    /// the ruleset counts prisoners. `only_prisoners` skips stones and
    /// territory and always counts prisoners.
    pub fn compute_score(&self, only_prisoners: bool) -> Result<ScoreBreakdown, GoError> {
        let rules = &self.rules;
        let mut score = ScoreBreakdown::default();
        score.white.komi = rules.komi;
        score.white.handicap = rules.handicap as u32;
        if rules.aga_handicap_scoring && score.white.handicap > 0 {
            score.white.handicap -= 1;
        }

        let mut cleared = self.goban.clone();
        let (mut removed_black, mut removed_white) = (0, 0);
        if !self.analyze_mode {
            for point in self.goban.points() {
                if !self.removal[self.goban.idx(point)] {
                    continue;
                }
                match self.goban.stone_at(point) {
                    Some(Stone::Black) => removed_black += 1,
                    Some(Stone::White) => removed_white += 1,
                    None => {}
                }
                cleared.set(point, None);
            }
        }

        if !only_prisoners && rules.score_territory {
            self.score_territory(&cleared, &mut score)?;
        }

        if !only_prisoners && rules.score_stones {
            for point in cleared.points() {
                if let Some(stone) = cleared.stone_at(point) {
                    let side = score.get_mut(stone);
                    side.stones += 1;
                    side.scoring_positions.push_str(&notation::encode_point(Some(point)));
                }
            }
        }

        if only_prisoners || rules.score_prisoners {
            let captures = self.goban.captures();
            score.black.prisoners = captures.black + removed_white;
            score.white.prisoners = captures.white + removed_black;
        }

        for side in [&mut score.black, &mut score.white] {
            side.total = (side.stones + side.territory + side.prisoners) as f64 + side.komi;
            if rules.score_handicap {
                side.total += side.handicap as f64;
            }
        }
        Ok(score)
    }

    fn score_territory(&self, cleared: &Goban, score: &mut ScoreBreakdown) -> Result<(), GoError> {
        let reference = &self.tree.node(self.cur).state.board;
        let analysis = GroupAnalysis::new(cleared, &self.removal, Some(reference))?;

        for group in analysis.territory() {
            let Some(color) = group.territory_color else {
                continue;
            };
            if !self.rules.score_territory_in_seki && group.is_territory_in_seki && self.rules.strict_seki_mode {
                continue;
            }
            let side = score.get_mut(color);
            side.scoring_positions.push_str(&notation::encode_points(&group.points));
            let counted = group
                .points
                .iter()
                .filter(|&&p| {
                    let i = cleared.idx(p);
                    !self.removal[i] || reference[i] != 0
                })
                .count();
            side.territory += counted as u32;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{GameConfig, InitialState, RuleSet};

    fn engine_with(rules: RuleSet, black: &str, white: &str, width: u8, height: u8) -> Engine {
        let config = GameConfig {
            initial_state: Some(InitialState {
                black: black.into(),
                white: white.into(),
            }),
            ..GameConfig::with_rules(rules).with_size(width, height)
        };
        Engine::new(config).unwrap()
    }

    /// Black wall on column c, white wall on column d, a dead white stone at
    /// a3 inside black's area.
    fn walls(rules: RuleSet) -> Engine {
        let mut e = engine_with(rules, "cacbcccdce", "acdadbdcdddd", 5, 5);
        e.set_removed((0, 2), true);
        e
    }

    // -- Territory scoring --

    #[test]
    fn japanese_counts_territory_and_prisoners() {
        let score = walls(RuleSet::Japanese).compute_score(false).unwrap();
        assert_eq!(score.black.territory, 10);
        assert_eq!(score.black.prisoners, 1);
        assert_eq!(score.black.stones, 0);
        assert_eq!(score.white.territory, 5);
        assert_eq!(score.white.komi, 6.5);
        assert_eq!(score.black.total, 11.0);
        assert_eq!(score.white.total, 11.5);
        assert_eq!(score.result(), "W+0.5");
    }

    #[test]
    fn chinese_counts_stones_instead_of_prisoners() {
        let score = walls(RuleSet::Chinese).compute_score(false).unwrap();
        assert_eq!(score.black.stones, 5);
        assert_eq!(score.black.prisoners, 0);
        assert_eq!(score.black.total, 15.0);
        assert_eq!(score.white.stones, 5);
        assert_eq!(score.white.total, 17.5);
        assert_eq!(score.result(), "W+2.5");
    }

    #[test]
    fn analyze_mode_keeps_removed_stones() {
        let mut e = walls(RuleSet::Japanese);
        e.set_analyze_mode(true);
        let score = e.compute_score(false).unwrap();
        assert_eq!(score.black.territory, 0);
        assert_eq!(score.black.prisoners, 0);
    }

    #[test]
    fn removed_empty_points_are_not_counted() {
        let mut e = walls(RuleSet::Japanese);
        e.set_removed((0, 0), true);
        let score = e.compute_score(false).unwrap();
        assert_eq!(score.black.territory, 9);
    }

    #[test]
    fn scoring_positions_list_counted_points() {
        let score = walls(RuleSet::Chinese).compute_score(false).unwrap();
        let positions = notation::decode_moves(&score.white.scoring_positions, 5, 5).unwrap();
        assert_eq!(positions.len(), 10);
    }

    #[test]
    fn only_prisoners_skips_board() {
        let score = walls(RuleSet::Chinese).compute_score(true).unwrap();
        assert_eq!(score.black.prisoners, 1);
        assert_eq!(score.black.territory, 0);
        assert_eq!(score.black.stones, 0);
    }

    // -- Seki --

    #[test]
    fn strict_seki_drops_territory_in_seki() {
        let config = |strict| GameConfig {
            initial_state: Some(InitialState {
                black: "ba".into(),
                white: "da".into(),
            }),
            strict_seki_mode: Some(strict),
            ..GameConfig::with_rules(RuleSet::Japanese).with_size(5, 1)
        };
        let strict = Engine::new(config(true)).unwrap().compute_score(false).unwrap();
        assert_eq!((strict.black.territory, strict.white.territory), (0, 0));
        let lenient = Engine::new(config(false)).unwrap().compute_score(false).unwrap();
        assert_eq!((lenient.black.territory, lenient.white.territory), (1, 1));
    }

    // -- Handicap --

    #[test]
    fn aga_counts_one_less_handicap_point() {
        let config = GameConfig {
            handicap: Some(3),
            ..GameConfig::with_rules(RuleSet::Aga).with_size(9, 9)
        };
        let score = Engine::new(config).unwrap().compute_score(false).unwrap();
        assert_eq!(score.white.handicap, 2);
        assert_eq!(score.white.komi, 0.5);
        assert_eq!(score.black.handicap, 0);
        assert_eq!(score.black.stones, 3);
    }

    #[test]
    fn legacy_correction_matches_recorded_margin() {
        let mut score = ScoreBreakdown::default();
        score.black.total = 5.5;
        score.white.total = 10.0;
        legacy_aga_handicap_correction(&mut score, "5.5");
        assert_eq!(score.white.handicap, 1);
        legacy_aga_handicap_correction(&mut score, "W+R");
        legacy_aga_handicap_correction(&mut score, "7 points");
        assert_eq!(score.white.handicap, 1);
    }

    // -- Result formatting --

    #[test]
    fn format_result_black_wins() {
        assert_eq!(format_result(10.0, 5.5), "B+4.5");
    }

    #[test]
    fn format_result_white_wins() {
        assert_eq!(format_result(5.0, 11.5), "W+6.5");
    }

    #[test]
    fn format_result_draw() {
        assert_eq!(format_result(5.0, 5.0), "Draw");
    }
}

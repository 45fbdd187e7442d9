//! Stone-removal marks used while the players agree on dead stones.
//!
//! A removal flag on a stone means the stone is dead and will be counted as a
//! prisoner. A flag on an empty point marks it as dame so it never joins
//! surrounding territory.

use tracing::debug;

use crate::Point;
use crate::engine::Engine;
use crate::error::GoError;
use crate::groups::GroupAnalysis;
use crate::notation;

impl Engine {
    pub fn is_removed(&self, point: Point) -> bool {
        self.goban.on_board(point) && self.removal[self.goban.idx(point)]
    }

    /// Flags of every point in row-major order.
    pub fn removal(&self) -> &[bool] {
        &self.removal
    }

    pub fn set_removed(&mut self, point: Point, removed: bool) {
        if !self.goban.on_board(point) {
            return;
        }
        let i = self.goban.idx(point);
        self.removal[i] = removed;
        self.notify_removal(point, removed);
    }

    pub fn clear_removed(&mut self) {
        let marked: Vec<Point> = self
            .goban
            .points()
            .filter(|&p| self.removal[self.goban.idx(p)])
            .collect();
        for p in marked {
            self.set_removed(p, false);
        }
    }

    /// Removed points as a sorted encoded move list.
    pub fn stone_removal_string(&self) -> Result<String, GoError> {
        let points: Vec<Point> = self
            .goban
            .points()
            .filter(|&p| self.removal[self.goban.idx(p)])
            .collect();
        notation::sort_moves(&notation::encode_points(&points))
    }

    /// Mark (`Some(true)`), unmark (`Some(false)`) or toggle (`None`) the
    /// region of equal cells at `point`. Returns the state applied and the
    /// points touched.
    pub fn set_group_for_removal(&mut self, point: Point, set: Option<bool>) -> (bool, Vec<Point>) {
        if !self.goban.on_board(point) {
            return (false, Vec::new());
        }
        let removing = set.unwrap_or_else(|| !self.is_removed(point));
        let group = self.goban.region(point);
        for &p in &group {
            self.set_removed(p, removing);
        }
        (removing, group)
    }

    /// Toggle the group at `point` together with every group of the same
    /// color reachable through the open space around it. When removing, the
    /// open space crossed is unmarked and reported as a second entry.
    pub fn toggle_meta_group_removal(&mut self, point: Point) -> Vec<(bool, Vec<Point>)> {
        if !self.goban.on_board(point) {
            return Vec::new();
        }
        let removing = !self.is_removed(point);
        let (_, mut stones) = self.set_group_for_removal(point, Some(removing));
        let mut empty_spaces = Vec::new();

        if let Some(color) = self.goban.stone_at(point) {
            let len = self.goban.board().len();
            let mut seen_space = vec![false; len];
            let mut seen_stone = vec![false; len];
            for &p in &stones {
                seen_stone[self.goban.idx(p)] = true;
            }

            let mut space: Vec<Point> = self.goban.adjacent_regions(&stones, 0).concat();
            let mut i = 0;
            while let Some(&pt) = space.get(i) {
                i += 1;
                let pi = self.goban.idx(pt);
                if seen_space[pi] {
                    continue;
                }
                seen_space[pi] = true;

                for n in self.goban.neighbors(pt) {
                    if self.goban.stone_at(n) != Some(color) || seen_stone[self.goban.idx(n)] {
                        continue;
                    }
                    let (_, group) = self.set_group_for_removal(n, Some(removing));
                    for &g in &group {
                        seen_stone[self.goban.idx(g)] = true;
                    }
                    space.extend(self.goban.adjacent_regions(&group, 0).concat());
                    stones.extend(group);
                }
                empty_spaces.push(pt);
            }
        }

        if !removing {
            return vec![(removing, stones)];
        }
        for &p in &empty_spaces {
            self.set_removed(p, false);
        }
        vec![(removing, stones), (false, empty_spaces)]
    }

    /// Groups that look dead or neutral on the current board.
    pub fn compute_auto_removed_groups(&self) -> Vec<Vec<Point>> {
        GroupAnalysis::of(&self.goban)
            .groups()
            .iter()
            .filter(|g| g.is_probably_dead || g.is_probably_dame)
            .map(|g| g.points.clone())
            .collect()
    }

    /// Mark every automatically detected dead or neutral group removed.
    pub fn auto_score_removal(&mut self) {
        let groups = self.compute_auto_removed_groups();
        debug!(groups = groups.len(), "auto removal");
        for group in groups {
            for p in group {
                self.set_removed(p, true);
            }
        }
    }
}

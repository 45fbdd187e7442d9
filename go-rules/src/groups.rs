//! Connected-component analysis of a board snapshot.
//!
//! Every point belongs to exactly one group: a maximal 4-connected region of
//! equal cell value. Empty regions are groups too, and carry the territory,
//! seki and eye classification used by scoring and automatic dead-stone
//! detection.
//!
//! When a reference board is supplied, points marked for removal that were
//! empty on the reference form their own "dame" groups so that neutral points
//! the players agreed on never merge into surrounding territory.

use crate::Point;
use crate::error::GoError;
use crate::goban::Goban;
use crate::stone::Stone;

pub type GroupId = usize;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoneGroup {
    pub id: GroupId,
    /// `None` for an empty (open-area) group.
    pub color: Option<Stone>,
    /// Empty points marked removed that were empty on the reference board.
    pub dame: bool,
    pub points: Vec<Point>,
    /// Orthogonally adjacent groups, in discovery order.
    pub neighbors: Vec<GroupId>,
    /// Diagonally adjacent groups that are not this group.
    pub diagonal_neighbors: Vec<GroupId>,
    pub is_territory: bool,
    pub territory_color: Option<Stone>,
    pub is_territory_in_seki: bool,
    pub is_eye: bool,
    pub is_strong_eye: bool,
    pub is_strong_string: bool,
    pub adjacent_black: u32,
    pub adjacent_white: u32,
    pub probable_color: Option<Stone>,
    pub is_probably_dead: bool,
    pub is_probably_dame: bool,
}

impl StoneGroup {
    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty_area(&self) -> bool {
        self.color.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct GroupAnalysis {
    cols: u8,
    rows: u8,
    groups: Vec<StoneGroup>,
    group_id_map: Vec<GroupId>,
}

impl GroupAnalysis {
    /// Analyze a board with no removal marks.
    pub fn of(goban: &Goban) -> Self {
        let removal = vec![false; goban.board().len()];
        Self::build(goban, &removal, None)
    }

    /// Analyze a board. `removal` flags points marked for removal; `reference`
    /// is the board before removed stones were cleared.
    pub fn new(goban: &Goban, removal: &[bool], reference: Option<&[i8]>) -> Result<Self, GoError> {
        let len = goban.board().len();
        if removal.len() != len {
            return Err(GoError::malformed(format!(
                "removal map has {} points, board has {len}",
                removal.len()
            )));
        }
        if let Some(reference) = reference
            && reference.len() != len
        {
            return Err(GoError::malformed(format!(
                "reference board has {} points, board has {len}",
                reference.len()
            )));
        }
        Ok(Self::build(goban, removal, reference))
    }

    fn build(goban: &Goban, removal: &[bool], reference: Option<&[i8]>) -> Self {
        let mut analysis = GroupAnalysis {
            cols: goban.cols(),
            rows: goban.rows(),
            groups: Vec::new(),
            group_id_map: vec![usize::MAX; goban.board().len()],
        };

        analysis.flood_groups(goban, removal, reference);
        analysis.link_neighbors(goban);

        for id in 0..analysis.groups.len() {
            analysis.compute_territory(id);
        }
        for id in 0..analysis.groups.len() {
            analysis.compute_territory_in_seki(id, removal);
        }
        for group in &mut analysis.groups {
            group.is_eye = group.is_territory && group.size() == 1;
        }
        for id in 0..analysis.groups.len() {
            analysis.compute_strong_eye(id, goban);
        }
        for id in 0..analysis.groups.len() {
            let strong_eyes = analysis.groups[id]
                .neighbors
                .iter()
                .filter(|&&n| analysis.groups[n].is_strong_eye)
                .count();
            analysis.groups[id].is_strong_string = strong_eyes >= 2;
        }

        for id in 0..analysis.groups.len() {
            analysis.compute_probable_color(id, goban);
        }
        for id in 0..analysis.groups.len() {
            analysis.compute_probably_dead(id);
        }
        for group in &mut analysis.groups {
            group.is_probably_dame = !group.is_territory && group.is_empty_area() && group.size() < 2;
        }

        analysis
    }

    // -- Accessors --

    pub fn groups(&self) -> &[StoneGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> &StoneGroup {
        &self.groups[id]
    }

    pub fn group_at(&self, (col, row): Point) -> Option<&StoneGroup> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let id = self.group_id_map[row as usize * self.cols as usize + col as usize];
        self.groups.get(id)
    }

    pub fn territory(&self) -> impl Iterator<Item = &StoneGroup> {
        self.groups.iter().filter(|g| g.is_territory)
    }

    fn id_at(&self, goban: &Goban, point: Point) -> GroupId {
        self.group_id_map[goban.idx(point)]
    }

    // -- Construction passes --

    fn flood_groups(&mut self, goban: &Goban, removal: &[bool], reference: Option<&[i8]>) {
        let board = goban.board();
        let is_dame = |i: usize| reference.is_some_and(|r| removal[i] && r[i] == 0);

        for seed in 0..board.len() {
            if self.group_id_map[seed] != usize::MAX {
                continue;
            }
            let id = self.groups.len();
            let value = board[seed];
            let dame = is_dame(seed);

            let mut points = Vec::new();
            let mut stack = vec![goban.point_of(seed)];
            while let Some(p) = stack.pop() {
                let i = goban.idx(p);
                if self.group_id_map[i] != usize::MAX || board[i] != value {
                    continue;
                }
                if reference.is_some() && is_dame(i) != dame {
                    continue;
                }
                self.group_id_map[i] = id;
                points.push(p);
                stack.extend(goban.neighbors(p));
            }
            points.sort_by_key(|&(c, r)| (r, c));

            self.groups.push(StoneGroup {
                id,
                color: Stone::from_int(value),
                dame,
                points,
                ..Default::default()
            });
        }
    }

    fn link_neighbors(&mut self, goban: &Goban) {
        for id in 0..self.groups.len() {
            let mut neighbors = Vec::new();
            let mut diagonals = Vec::new();
            for &(col, row) in &self.groups[id].points {
                for n in goban.neighbors((col, row)) {
                    let nid = self.id_at(goban, n);
                    if nid != id && !neighbors.contains(&nid) {
                        neighbors.push(nid);
                    }
                }
                for d in diagonals_of(goban, (col, row)) {
                    let did = self.id_at(goban, d);
                    if did != id && !diagonals.contains(&did) {
                        diagonals.push(did);
                    }
                }
            }
            self.groups[id].neighbors = neighbors;
            self.groups[id].diagonal_neighbors = diagonals;
        }
    }

    fn compute_territory(&mut self, id: GroupId) {
        let group = &self.groups[id];
        if !group.is_empty_area() {
            return;
        }

        let mut colors = group.neighbors.iter().filter_map(|&n| self.groups[n].color);
        let Some(first) = colors.next() else {
            return;
        };
        if colors.all(|c| c == first) {
            let group = &mut self.groups[id];
            group.is_territory = true;
            group.territory_color = Some(first);
        }
    }

    /// Territory whose border stones also touch open area that is neither
    /// territory nor fully marked for removal is in seki.
    fn compute_territory_in_seki(&mut self, id: GroupId, removal: &[bool]) {
        if !self.groups[id].is_territory {
            return;
        }

        let cols = self.cols as usize;
        let in_seki = self.groups[id].neighbors.iter().any(|&border| {
            self.groups[border].neighbors.iter().any(|&beyond| {
                let b = &self.groups[beyond];
                b.is_empty_area()
                    && !b.is_territory
                    && b.points
                        .iter()
                        .any(|&(c, r)| !removal[r as usize * cols + c as usize])
            })
        });
        self.groups[id].is_territory_in_seki = in_seki;
    }

    /// A one-point eye is strong when its diagonals are held by its owner:
    /// at most one foreign diagonal in the middle of the board, none on the
    /// edge or in the corner.
    fn compute_strong_eye(&mut self, id: GroupId, goban: &Goban) {
        let group = &self.groups[id];
        if !group.is_eye {
            return;
        }
        let Some(color) = group.territory_color else {
            return;
        };
        let (col, row) = group.points[0];

        let diagonals = diagonals_of(goban, (col, row));
        let foreign = diagonals
            .iter()
            .filter(|&&d| {
                let owner = &self.groups[self.id_at(goban, d)];
                goban.stone_at(d) != Some(color)
                    && !(owner.is_territory && owner.territory_color == Some(color))
            })
            .count();

        let interior = diagonals.len() == 4;
        self.groups[id].is_strong_eye = if interior { foreign <= 1 } else { foreign == 0 };
    }

    /// Weight of each color among the stones bordering this group.
    fn compute_probable_color(&mut self, id: GroupId, goban: &Goban) {
        let mut seen = vec![false; goban.board().len()];
        for &p in &self.groups[id].points {
            seen[goban.idx(p)] = true;
        }

        let (mut black, mut white) = (0, 0);
        for &p in &self.groups[id].points {
            for n in goban.neighbors(p) {
                let ni = goban.idx(n);
                if seen[ni] {
                    continue;
                }
                seen[ni] = true;
                match goban.stone_at(n) {
                    Some(Stone::Black) => black += 1,
                    Some(Stone::White) => white += 1,
                    None => {}
                }
            }
        }

        let group = &mut self.groups[id];
        group.adjacent_black = black;
        group.adjacent_white = white;
        group.probable_color = if black + white == 0 {
            None
        } else if black >= white * 3 {
            Some(Stone::Black)
        } else if white >= black * 3 {
            Some(Stone::White)
        } else {
            None
        };
    }

    fn compute_probably_dead(&mut self, id: GroupId) {
        let Some(color) = self.groups[id].color else {
            return;
        };
        let alive = self.groups[id].neighbors.iter().any(|&n| {
            let area = &self.groups[n];
            area.is_empty_area()
                && ((area.is_territory && area.territory_color == Some(color))
                    || (!area.is_territory && area.probable_color == Some(color)))
        });
        self.groups[id].is_probably_dead = !alive;
    }
}

fn diagonals_of(goban: &Goban, (col, row): Point) -> Vec<Point> {
    let mut result = Vec::with_capacity(4);
    for (dc, dr) in [(-1i16, -1i16), (1, -1), (-1, 1), (1, 1)] {
        let c = col as i16 + dc;
        let r = row as i16 + dr;
        if c >= 0 && r >= 0 && c < goban.cols() as i16 && r < goban.rows() as i16 {
            result.push((c as u8, r as u8));
        }
    }
    result
}

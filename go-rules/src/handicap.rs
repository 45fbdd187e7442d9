use crate::Point;

/// Hoshi coordinates along one axis for the board sizes with a fixed layout.
fn star_lines(size: u8) -> Option<[u8; 3]> {
    match size {
        19 => Some([3, 9, 15]),
        13 => Some([3, 6, 9]),
        9 => Some([2, 4, 6]),
        _ => None,
    }
}

/// Whether a board of this size has a fixed handicap layout at all. Other
/// sizes always use free placement.
pub fn has_fixed_layout(cols: u8, rows: u8) -> bool {
    cols == rows && star_lines(cols).is_some()
}

/// Fixed handicap stone placement on 9x9, 13x13 and 19x19.
///
/// Returns `None` when the board has no fixed layout or the count is outside
/// `2..=9`; the handicap is then placed freely by black.
pub fn handicap_points(cols: u8, rows: u8, count: u8) -> Option<Vec<Point>> {
    if !has_fixed_layout(cols, rows) || !(2..=9).contains(&count) {
        return None;
    }
    let [near, mid, far] = star_lines(cols)?;

    let tl = (near, near);
    let tr = (far, near);
    let bl = (near, far);
    let br = (far, far);
    let cc = (mid, mid);

    let ml = (near, mid);
    let mr = (far, mid);
    let tc = (mid, near);
    let bc = (mid, far);

    let pts = match count {
        2 => vec![tr, bl],
        3 => vec![br, tr, bl],
        4 => vec![tl, br, tr, bl],
        5 => vec![cc, tl, br, tr, bl],
        6 => vec![ml, mr, tl, br, tr, bl],
        7 => vec![ml, mr, cc, tl, br, tr, bl],
        8 => vec![tc, bc, ml, mr, tl, br, tr, bl],
        _ => vec![tc, bc, ml, mr, cc, tl, br, tr, bl],
    };

    Some(pts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_without_fixed_layout() {
        assert!(handicap_points(7, 7, 2).is_none());
        assert!(handicap_points(11, 11, 2).is_none());
        assert!(handicap_points(9, 13, 2).is_none());
        assert!(!has_fixed_layout(15, 15));
        assert!(has_fixed_layout(13, 13));
    }

    #[test]
    fn returns_none_for_invalid_count() {
        assert!(handicap_points(19, 19, 0).is_none());
        assert!(handicap_points(19, 19, 1).is_none());
        assert!(handicap_points(19, 19, 10).is_none());
    }

    #[test]
    fn returns_correct_count() {
        for size in [9, 13, 19] {
            for n in 2..=9 {
                let pts = handicap_points(size, size, n).unwrap();
                assert_eq!(pts.len(), n as usize, "{size}x{size} handicap {n}");
            }
        }
    }

    #[test]
    fn two_stones_take_opposite_corners() {
        let pts = handicap_points(19, 19, 2).unwrap();
        assert_eq!(pts, vec![(15, 3), (3, 15)]);
    }

    #[test]
    fn nineteen_hoshi_positions() {
        let pts = handicap_points(19, 19, 9).unwrap();
        let expected = [
            (3, 3),
            (15, 3),
            (3, 9),
            (15, 9),
            (3, 15),
            (15, 15),
            (9, 3),
            (9, 15),
            (9, 9),
        ];
        for p in &expected {
            assert!(pts.contains(p), "19x19: missing hoshi {p:?}");
        }
    }

    #[test]
    fn nine_by_nine_allows_full_layout() {
        let pts = handicap_points(9, 9, 9).unwrap();
        for p in [(2, 2), (6, 2), (2, 6), (6, 6), (4, 4), (2, 4), (6, 4), (4, 2), (4, 6)] {
            assert!(pts.contains(&p), "9x9: missing hoshi {p:?}");
        }
    }

    #[test]
    fn even_counts_leave_center_empty() {
        for n in [2, 4, 6, 8] {
            let pts = handicap_points(13, 13, n).unwrap();
            assert!(!pts.contains(&(6, 6)), "handicap {n} should not use tengen");
        }
    }
}

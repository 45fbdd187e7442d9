//! Compact move-list encoding.
//!
//! A move is two letters (`a` = 0 ... `z` = 25) for column and row, with `.`
//! standing in for a pass. Edit placements carry a `!<color>` prefix where the
//! color digit is `1` for black, `2` for white and `0` for clearing the point.
//! A move list is the plain concatenation of its moves. Human input in the
//! `D4` style (column letters without `I`, rows counted from the bottom) is
//! also accepted when decoding.

use serde::{Deserialize, Serialize};

use crate::Point;
use crate::error::GoError;
use crate::stone::Stone;

const LETTERS: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";
const PRETTY_LETTERS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Largest board side the letter encoding can address.
pub const MAX_ENCODABLE: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedMove {
    /// `None` is a pass (or a coordinate that fell off the board).
    pub pos: Option<Point>,
    pub edited: bool,
    /// Color of an edit placement; `None` clears the point.
    pub color: Option<Stone>,
}

impl EncodedMove {
    pub fn play(pos: Option<Point>) -> Self {
        EncodedMove {
            pos,
            edited: false,
            color: None,
        }
    }

    pub fn edit(pos: Option<Point>, color: Option<Stone>) -> Self {
        EncodedMove {
            pos,
            edited: true,
            color,
        }
    }

    fn sort_key(&self) -> i32 {
        let (x, y) = match self.pos {
            Some((x, y)) => (x as i32, y as i32),
            None => (-1, -1),
        };
        (self.edited as i32) * 10000 + x + y * 100
    }
}

/// Moves as they arrive in a game config: either the encoded string or the
/// array form `[[x, y, timedelta, color?], ...]`, where a trailing color marks
/// an edit placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveList {
    Encoded(String),
    Arrays(Vec<Vec<f64>>),
}

impl Default for MoveList {
    fn default() -> Self {
        MoveList::Encoded(String::new())
    }
}

impl MoveList {
    pub fn decode(&self, width: u8, height: u8) -> Result<Vec<EncodedMove>, GoError> {
        match self {
            MoveList::Encoded(s) => decode_moves(s, width, height),
            MoveList::Arrays(arrays) => arrays
                .iter()
                .map(|arr| decode_move_array(arr, width, height))
                .collect(),
        }
    }
}

fn decode_move_array(arr: &[f64], width: u8, height: u8) -> Result<EncodedMove, GoError> {
    if arr.len() < 2 {
        return Err(GoError::malformed(format!("move array too short: {arr:?}")));
    }
    let (x, y) = (arr[0], arr[1]);
    let pos = if x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64 {
        Some((x as u8, y as u8))
    } else {
        None
    };
    match arr.get(3) {
        Some(&c) => Ok(EncodedMove::edit(pos, Stone::from_code(c as u8))),
        None => Ok(EncodedMove::play(pos)),
    }
}

fn letter(c: Option<u8>) -> char {
    match c {
        Some(c) if (c as usize) < LETTERS.len() => LETTERS[c as usize] as char,
        _ => '.',
    }
}

pub fn encode_point(pos: Option<Point>) -> String {
    let mut s = String::with_capacity(2);
    s.push(letter(pos.map(|p| p.0)));
    s.push(letter(pos.map(|p| p.1)));
    s
}

pub fn encode_points(points: &[Point]) -> String {
    points.iter().map(|&p| encode_point(Some(p))).collect()
}

pub fn encode_move(mv: &EncodedMove) -> String {
    if mv.edited {
        let code = mv.color.map_or(0, Stone::code);
        format!("!{code}{}", encode_point(mv.pos))
    } else {
        encode_point(mv.pos)
    }
}

pub fn encode_moves(moves: &[EncodedMove]) -> String {
    moves.iter().map(encode_move).collect()
}

fn char_to_coord(ch: u8) -> Result<Option<u8>, GoError> {
    match ch {
        b'.' => Ok(None),
        b'a'..=b'z' => Ok(Some(ch - b'a')),
        _ => Err(GoError::malformed(format!(
            "unexpected character '{}' in move string",
            ch as char
        ))),
    }
}

/// Decode a move list, accepting either the letter form or the `D4` form.
pub fn decode_moves(s: &str, width: u8, height: u8) -> Result<Vec<EncodedMove>, GoError> {
    if is_pretty_form(s) {
        decode_pretty(s, width, height)
    } else {
        decode_letters(s, width, height)
    }
}

fn is_pretty_form(s: &str) -> bool {
    s.as_bytes()
        .windows(2)
        .any(|w| w[0].is_ascii_alphabetic() && w[1].is_ascii_digit())
}

fn decode_letters(s: &str, width: u8, height: u8) -> Result<Vec<EncodedMove>, GoError> {
    let bytes = s.as_bytes();
    let mut moves = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let mut edited = false;
        let mut color = None;
        if bytes[i] == b'!' {
            let code = bytes
                .get(i + 1)
                .filter(|b| b.is_ascii_digit())
                .ok_or_else(|| GoError::malformed(format!("bad edit prefix in '{s}'")))?;
            edited = true;
            color = Stone::from_code(code - b'0');
            i += 2;
        }
        if i + 1 >= bytes.len() {
            return Err(GoError::malformed(format!("dangling coordinate in '{s}'")));
        }

        let x = char_to_coord(bytes[i])?;
        let y = char_to_coord(bytes[i + 1])?;
        let pos = match (x, y) {
            (Some(x), Some(y)) if x < width && y < height => Some((x, y)),
            _ => None,
        };
        moves.push(EncodedMove { pos, edited, color });
        i += 2;
    }

    Ok(moves)
}

fn decode_pretty(s: &str, width: u8, height: u8) -> Result<Vec<EncodedMove>, GoError> {
    let bytes = s.as_bytes();
    let mut moves = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'.' && bytes.get(i + 1) == Some(&b'.') {
            moves.push(EncodedMove::play(None));
            i += 2;
            continue;
        }

        let unparsed = || {
            GoError::malformed(format!(
                "unparsed move input: {}",
                String::from_utf8_lossy(&bytes[i..])
            ))
        };
        let col = PRETTY_LETTERS
            .iter()
            .position(|&c| c == bytes[i].to_ascii_uppercase())
            .ok_or_else(unparsed)?;
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == start {
            return Err(unparsed());
        }
        let row: i32 = s[start..end]
            .parse()
            .map_err(|_| GoError::malformed(format!("bad row in '{s}'")))?;

        let y = height as i32 - row;
        let pos = if col < width as usize && y >= 0 && y < height as i32 {
            Some((col as u8, y as u8))
        } else {
            None
        };
        moves.push(EncodedMove::play(pos));
        i = end;
    }

    Ok(moves)
}

/// Sorts an encoded list: plain moves before edits, then row-major.
pub fn sort_moves(s: &str) -> Result<String, GoError> {
    let mut moves = decode_moves(s, LETTERS.len() as u8, LETTERS.len() as u8)?;
    moves.sort_by_key(EncodedMove::sort_key);
    Ok(encode_moves(&moves))
}

/// Human readable coordinate such as `D16`; empty for a pass.
pub fn pretty_coords(pos: Option<Point>, height: u8) -> String {
    match pos {
        Some((x, y)) if (x as usize) < PRETTY_LETTERS.len() => {
            format!("{}{}", PRETTY_LETTERS[x as usize] as char, height as i32 - y as i32)
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Letter form --

    #[test]
    fn decodes_plain_moves() {
        let moves = decode_moves("aadd..", 19, 19).unwrap();
        assert_eq!(moves.len(), 3);
        assert_eq!(moves[0].pos, Some((0, 0)));
        assert_eq!(moves[1].pos, Some((3, 3)));
        assert_eq!(moves[2].pos, None);
        assert!(moves.iter().all(|m| !m.edited));
    }

    #[test]
    fn decodes_edit_prefix() {
        let moves = decode_moves("!1cd!2ef!0gh", 19, 19).unwrap();
        assert_eq!(moves[0], EncodedMove::edit(Some((2, 3)), Some(Stone::Black)));
        assert_eq!(moves[1], EncodedMove::edit(Some((4, 5)), Some(Stone::White)));
        assert_eq!(moves[2], EncodedMove::edit(Some((6, 7)), None));
    }

    #[test]
    fn off_board_coordinates_become_passes() {
        let moves = decode_moves("jj", 9, 9).unwrap();
        assert_eq!(moves[0].pos, None);
    }

    #[test]
    fn round_trips_well_formed_strings() {
        for s in ["", "aa", "ddpp..qq", "!1aa!2bbcc", "!0..ab"] {
            let moves = decode_moves(s, 19, 19).unwrap();
            assert_eq!(encode_moves(&moves), s);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_moves("a", 19, 19).is_err());
        assert!(decode_moves("a#", 19, 19).is_err());
        assert!(decode_moves("!xaa", 19, 19).is_err());
    }

    // -- Coordinate form --

    #[test]
    fn decodes_pretty_coordinates() {
        let moves = decode_moves("D4Q16..", 19, 19).unwrap();
        assert_eq!(moves[0].pos, Some((3, 15)));
        assert_eq!(moves[1].pos, Some((15, 3)));
        assert_eq!(moves[2].pos, None);
    }

    #[test]
    fn pretty_coordinates_skip_i() {
        let moves = decode_moves("J1", 9, 9).unwrap();
        assert_eq!(moves[0].pos, Some((8, 8)));
        assert_eq!(pretty_coords(Some((8, 8)), 9), "J1");
        assert_eq!(pretty_coords(None, 9), "");
    }

    // -- Array form --

    #[test]
    fn decodes_array_form() {
        let list: MoveList = serde_json::from_str("[[3, 3, -1], [-1, -1, 500], [4, 4, -1, 2]]").unwrap();
        let moves = list.decode(19, 19).unwrap();
        assert_eq!(moves[0], EncodedMove::play(Some((3, 3))));
        assert_eq!(moves[1], EncodedMove::play(None));
        assert_eq!(moves[2], EncodedMove::edit(Some((4, 4)), Some(Stone::White)));
    }

    #[test]
    fn move_list_accepts_strings() {
        let list: MoveList = serde_json::from_str("\"ddpp\"").unwrap();
        assert_eq!(list.decode(19, 19).unwrap().len(), 2);
    }

    // -- Sorting --

    #[test]
    fn sorts_row_major_with_edits_last() {
        assert_eq!(sort_moves("baab!1aaab").unwrap(), "baabab!1aa");
    }
}

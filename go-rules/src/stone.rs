use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;
use std::ops::Neg;

/// A stone color. The board stores it as a signed cell value (empty is `0`),
/// which is also the layout the estimation kernel expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize_repr, Deserialize_repr)]
#[repr(i8)]
pub enum Stone {
    Black = 1,
    White = -1,
}

impl Stone {
    pub fn from_int(v: i8) -> Option<Self> {
        match v.signum() {
            1 => Some(Stone::Black),
            -1 => Some(Stone::White),
            _ => None,
        }
    }

    pub fn to_int(self) -> i8 {
        self as i8
    }

    /// Cell value for an optional stone, `0` meaning empty.
    pub fn cell(stone: Option<Stone>) -> i8 {
        stone.map_or(0, Stone::to_int)
    }

    /// Color digit used by the move encoding: `1` black, `2` white.
    pub fn code(self) -> u8 {
        match self {
            Stone::Black => 1,
            Stone::White => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Stone::Black),
            2 => Some(Stone::White),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "black" | "b" => Some(Stone::Black),
            "white" | "w" => Some(Stone::White),
            _ => None,
        }
    }

    pub fn opp(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }

    /// SGF property letter.
    pub fn letter(self) -> &'static str {
        match self {
            Stone::Black => "B",
            Stone::White => "W",
        }
    }
}

impl Neg for Stone {
    type Output = Self;

    fn neg(self) -> Self {
        self.opp()
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::Black => write!(f, "Black"),
            Stone::White => write!(f, "White"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_values() {
        assert_eq!(Stone::from_int(1), Some(Stone::Black));
        assert_eq!(Stone::from_int(-3), Some(Stone::White));
        assert_eq!(Stone::from_int(0), None);
        assert_eq!(Stone::cell(None), 0);
        assert_eq!(Stone::cell(Some(Stone::White)), -1);
    }

    #[test]
    fn color_codes() {
        assert_eq!(Stone::Black.code(), 1);
        assert_eq!(Stone::White.code(), 2);
        assert_eq!(Stone::from_code(2), Some(Stone::White));
        assert_eq!(Stone::from_code(0), None);
        assert_eq!(Stone::from_code(3), None);
    }

    #[test]
    fn names() {
        assert_eq!(Stone::from_name("White"), Some(Stone::White));
        assert_eq!(Stone::from_name("b"), Some(Stone::Black));
        assert_eq!(Stone::from_name("red"), None);
    }

    #[test]
    fn opponent_and_negation() {
        assert_eq!(Stone::Black.opp(), Stone::White);
        assert_eq!(-Stone::White, Stone::Black);
    }

    #[test]
    fn serializes_as_cell_value() {
        assert_eq!(serde_json::to_string(&Stone::White).unwrap(), "-1");
        let s: Stone = serde_json::from_str("1").unwrap();
        assert_eq!(s, Stone::Black);
    }
}

use crate::Point;
use crate::stone::Stone;

use super::error::SgfError;

/// Root properties that configure the game rather than the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SgfHeader {
    /// `(cols, rows)` from `SZ`.
    pub size: Option<(u8, u8)>,
    pub komi: Option<f64>,
    pub handicap: Option<u32>,
    pub rules: Option<String>,
    pub player: Option<Stone>,
    /// Text of `RE`.
    pub result: Option<String>,
    /// `AB`/`AW` stones of the root node.
    pub setup: Vec<(Stone, Point)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkKind {
    Triangle,
    Square,
    Circle,
    Cross,
    Label(String),
}

/// One step of rebuilding a move tree from SGF. Actions are applied in
/// order against an engine once parsing stops.
#[derive(Debug, Clone, PartialEq)]
pub enum SgfAction {
    /// Out-of-sequence placement. `None` clears the point.
    Edit { point: Point, color: Option<Stone> },
    /// `None` is a pass. Coordinates are not checked against the board size.
    Play { color: Stone, point: Option<Point> },
    Comment(String),
    Mark { point: Point, kind: MarkKind },
    Result { winner: Option<Stone>, text: String },
    /// Remember the current node before a variation starts.
    SaveBranchPoint,
    /// Return to the node saved by the matching `SaveBranchPoint`.
    RestoreBranchPoint,
}

/// Everything read from an SGF text. When `error` is set the actions stop
/// where parsing stopped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SgfRecord {
    pub header: SgfHeader,
    pub actions: Vec<SgfAction>,
    pub error: Option<SgfError>,
}

impl SgfRecord {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Parse an SGF string. Never fails outright: a syntax error is stored in
/// the record together with the actions read before it.
pub fn parse(input: &str) -> SgfRecord {
    let mut p = Parser::new(input);
    let mut error = p.collection().err();
    if error.is_none() && p.trees == 0 {
        error = Some(SgfError::EmptyCollection);
    }
    SgfRecord {
        header: p.header,
        actions: p.actions,
        error,
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    trees: usize,
    /// Still inside the root node of the first game tree.
    in_root: bool,
    header: SgfHeader,
    actions: Vec<SgfAction>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        // Skip a UTF-8 byte order mark.
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Parser {
            bytes: input.as_bytes(),
            pos: 0,
            depth: 0,
            trees: 0,
            in_root: true,
            header: SgfHeader::default(),
            actions: Vec::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.bytes.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, ch: u8) -> Result<(), SgfError> {
        self.skip_whitespace();
        match self.advance() {
            Some(b) if b == ch => Ok(()),
            Some(b) => Err(SgfError::UnexpectedChar {
                expected: expected_str(ch),
                found: b as char,
                pos: self.pos - 1,
            }),
            None => Err(SgfError::UnexpectedEof),
        }
    }

    // Collection = GameTree+
    fn collection(&mut self) -> Result<(), SgfError> {
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'(') {
                return Ok(());
            }
            self.game_tree()?;
            self.trees += 1;
            self.in_root = false;
        }
    }

    // GameTree = '(' Sequence GameTree* ')'
    fn game_tree(&mut self) -> Result<(), SgfError> {
        self.expect(b'(')?;
        self.depth += 1;

        self.sequence()?;
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'(') {
                break;
            }
            self.actions.push(SgfAction::SaveBranchPoint);
            self.game_tree()?;
            self.actions.push(SgfAction::RestoreBranchPoint);
        }

        self.expect(b')')?;
        self.depth -= 1;
        Ok(())
    }

    // Sequence = Node+
    fn sequence(&mut self) -> Result<(), SgfError> {
        self.skip_whitespace();
        if self.peek() != Some(b';') {
            return match self.peek() {
                Some(b) => Err(SgfError::UnexpectedChar {
                    expected: "';'",
                    found: b as char,
                    pos: self.pos,
                }),
                None => Err(SgfError::UnexpectedEof),
            };
        }
        while self.peek() == Some(b';') {
            self.node()?;
            self.in_root = false;
            self.skip_whitespace();
        }
        Ok(())
    }

    // Node = ';' Property*
    fn node(&mut self) -> Result<(), SgfError> {
        self.expect(b';')?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b) if b.is_ascii_alphabetic() => {
                    let (ident, values) = self.raw_property()?;
                    self.property(&ident, values)?;
                }
                _ => return Ok(()),
            }
        }
    }

    // Property = Ident Value+
    // Value = '[' CValueType ']'
    fn raw_property(&mut self) -> Result<(String, Vec<String>), SgfError> {
        let ident = self.prop_ident();
        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'[') {
                values.push(self.prop_value()?);
            } else {
                break;
            }
        }
        if values.is_empty() {
            return match self.peek() {
                Some(b) => Err(SgfError::UnexpectedChar {
                    expected: "'['",
                    found: b as char,
                    pos: self.pos,
                }),
                None => Err(SgfError::UnexpectedEof),
            };
        }
        Ok((ident, values))
    }

    /// Old files spell identifiers with lowercase letters mixed in
    /// (`AddBlack`); only the uppercase letters name the property.
    fn prop_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(b) = self.peek() {
            if !b.is_ascii_alphabetic() {
                break;
            }
            if b.is_ascii_uppercase() {
                ident.push(b as char);
            }
            self.pos += 1;
        }
        ident
    }

    fn prop_value(&mut self) -> Result<String, SgfError> {
        self.expect(b'[')?;
        let mut value = Vec::new();
        loop {
            match self.advance() {
                None => return Err(SgfError::UnexpectedEof),
                Some(b'\\') => match self.advance() {
                    None => return Err(SgfError::UnexpectedEof),
                    // Soft line break, removed entirely.
                    Some(b'\n') => {
                        if self.peek() == Some(b'\r') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\r') => {
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b) => value.push(b),
                },
                Some(b']') => break,
                Some(b) => value.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&value).into_owned())
    }

    fn property(&mut self, ident: &str, values: Vec<String>) -> Result<(), SgfError> {
        match ident {
            "AB" | "AW" => {
                let color = if ident == "AB" { Stone::Black } else { Stone::White };
                for point in parse_point_list(&values)? {
                    if self.in_root {
                        self.header.setup.push((color, point));
                    } else {
                        self.actions.push(SgfAction::Edit {
                            point,
                            color: Some(color),
                        });
                    }
                }
            }
            "AE" => {
                for point in parse_point_list(&values)? {
                    self.actions.push(SgfAction::Edit { point, color: None });
                }
            }
            "B" | "W" => {
                let color = if ident == "B" { Stone::Black } else { Stone::White };
                let point = parse_move_point(&values[0])?;
                self.actions.push(SgfAction::Play { color, point });
            }
            "C" => {
                for text in values {
                    self.actions.push(SgfAction::Comment(text));
                }
            }
            "TR" | "SQ" | "CR" | "MA" | "XX" => {
                let kind = match ident {
                    "TR" => MarkKind::Triangle,
                    "SQ" => MarkKind::Square,
                    "CR" => MarkKind::Circle,
                    _ => MarkKind::Cross,
                };
                for point in parse_point_list(&values)? {
                    self.actions.push(SgfAction::Mark {
                        point,
                        kind: kind.clone(),
                    });
                }
            }
            "LB" => {
                for val in &values {
                    let (point_s, text) =
                        val.split_once(':')
                            .ok_or_else(|| SgfError::InvalidPropertyValue {
                                property: ident.to_string(),
                                value: val.clone(),
                                reason: "expected point:text".to_string(),
                            })?;
                    self.actions.push(SgfAction::Mark {
                        point: parse_point(point_s)?,
                        kind: MarkKind::Label(text.to_string()),
                    });
                }
            }
            "RE" => {
                let text = values[0].clone();
                let winner = match text.chars().next().map(|c| c.to_ascii_lowercase()) {
                    Some('b') => Some(Stone::Black),
                    Some('w') => Some(Stone::White),
                    _ => None,
                };
                if self.in_root {
                    self.header.result = Some(text.clone());
                }
                self.actions.push(SgfAction::Result { winner, text });
            }
            "SZ" if self.in_root => self.header.size = Some(parse_sz(&values[0])?),
            "KM" if self.in_root => self.header.komi = Some(parse_number(ident, &values[0])?),
            "HA" if self.in_root => {
                self.header.handicap = Some(parse_number(ident, &values[0])?)
            }
            "RU" if self.in_root => self.header.rules = Some(values[0].clone()),
            "PL" if self.in_root => {
                self.header.player = match values[0].trim() {
                    "B" | "b" => Some(Stone::Black),
                    "W" | "w" => Some(Stone::White),
                    other => {
                        return Err(SgfError::InvalidPropertyValue {
                            property: ident.to_string(),
                            value: other.to_string(),
                            reason: "expected B or W".to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn expected_str(ch: u8) -> &'static str {
    match ch {
        b'(' => "'('",
        b')' => "')'",
        b';' => "';'",
        b'[' => "'['",
        _ => "character",
    }
}

fn parse_number<T: std::str::FromStr>(ident: &str, value: &str) -> Result<T, SgfError> {
    value
        .trim()
        .parse()
        .map_err(|_| SgfError::InvalidPropertyValue {
            property: ident.to_string(),
            value: value.to_string(),
            reason: "expected a number".to_string(),
        })
}

/// `SZ[19]` or `SZ[19:13]` (columns first).
fn parse_sz(value: &str) -> Result<(u8, u8), SgfError> {
    match value.split_once(':') {
        Some((c, r)) => Ok((parse_number("SZ", c)?, parse_number("SZ", r)?)),
        None => {
            let n = parse_number("SZ", value)?;
            Ok((n, n))
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinate parsing
// ---------------------------------------------------------------------------

/// SGF letter to 0-based index: a=0 .. z=25, A=26 .. Z=51.
fn letter_to_coord(ch: char) -> Result<u8, SgfError> {
    match ch {
        'a'..='z' => Ok(ch as u8 - b'a'),
        'A'..='Z' => Ok(ch as u8 - b'A' + 26),
        _ => Err(SgfError::InvalidCoordinate(ch.to_string())),
    }
}

/// Parse a 2-char coordinate string like "cd" → (2, 3).
/// SGF coordinates are (column, row) with 'a' = 0.
fn parse_point(s: &str) -> Result<Point, SgfError> {
    let mut chars = s.chars();
    let (Some(col_ch), Some(row_ch), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(SgfError::InvalidCoordinate(s.to_string()));
    };
    Ok((letter_to_coord(col_ch)?, letter_to_coord(row_ch)?))
}

/// An empty value is a pass. `tt` is left as (19, 19) and becomes a pass
/// on boards too small to hold it.
fn parse_move_point(value: &str) -> Result<Option<Point>, SgfError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_point(value).map(Some)
}

/// Parse a list of points, with support for compressed point lists [aa:cc].
fn parse_point_list(values: &[String]) -> Result<Vec<Point>, SgfError> {
    let mut points = Vec::new();
    for val in values {
        if val.is_empty() {
            continue;
        }
        if let Some((from, to)) = val.split_once(':') {
            let (c1, r1) = parse_point(from)?;
            let (c2, r2) = parse_point(to)?;
            for r in r1.min(r2)..=r1.max(r2) {
                for c in c1.min(c2)..=c1.max(c2) {
                    points.push((c, r));
                }
            }
        } else {
            points.push(parse_point(val)?);
        }
    }
    Ok(points)
}

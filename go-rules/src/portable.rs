//! Portable JSON form of a move tree.
//!
//! Only the moves and their annotations are stored; board snapshots are
//! rebuilt by replaying the moves when a tree is loaded.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Point;
use crate::error::GoError;
use crate::move_tree::{Marks, MoveTree, NodeId, PenMark};
use crate::stone::Stone;

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableMark {
    pub x: u8,
    pub y: u8,
    pub marks: Marks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableNode {
    /// `-1` for a pass and for the root.
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub edited: bool,
    /// Color code of an edit placement (`0` clears the point).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pen_marks: Vec<PenMark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<PortableMark>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk_next: Option<Box<PortableNode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<PortableNode>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub correct_answer: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub wrong_answer: bool,
}

impl Default for PortableNode {
    fn default() -> Self {
        PortableNode {
            x: -1,
            y: -1,
            edited: false,
            color: None,
            pen_marks: Vec::new(),
            marks: Vec::new(),
            text: String::new(),
            trunk_next: None,
            branches: Vec::new(),
            correct_answer: false,
            wrong_answer: false,
        }
    }
}

impl PortableNode {
    pub fn pos(&self) -> Option<Point> {
        if self.x >= 0 && self.y >= 0 && self.x <= u8::MAX as i32 && self.y <= u8::MAX as i32 {
            Some((self.x as u8, self.y as u8))
        } else {
            None
        }
    }

    /// Color of an edit placement, `None` when it clears the point.
    pub fn edit_color(&self) -> Option<Stone> {
        self.color.and_then(Stone::from_code)
    }

    pub fn from_json(json: &str) -> Result<Self, GoError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, GoError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Serialize the subtree below `id`, parent first.
pub fn to_portable(tree: &MoveTree, id: NodeId) -> PortableNode {
    let node = tree.node(id);
    let (x, y) = match node.pos {
        Some((x, y)) => (x as i32, y as i32),
        None => (-1, -1),
    };

    PortableNode {
        x,
        y,
        edited: node.edited,
        color: node.edited.then(|| node.player.map_or(0, Stone::code)),
        pen_marks: node.pen_marks.clone(),
        marks: node
            .marked_points()
            .map(|((x, y), marks)| PortableMark {
                x,
                y,
                marks: marks.clone(),
            })
            .collect(),
        text: node.text.clone(),
        trunk_next: node.trunk_next.map(|t| Box::new(to_portable(tree, t))),
        branches: node.branches.iter().map(|&b| to_portable(tree, b)).collect(),
        correct_answer: node.correct_answer,
        wrong_answer: node.wrong_answer,
    }
}

/// Copy the annotations of a portable node onto an existing tree node. The
/// node must describe the same move. Marks outside a `cols` x `rows` board
/// are dropped.
pub fn load_annotations(
    tree: &mut MoveTree,
    id: NodeId,
    portable: &PortableNode,
    (cols, rows): (u8, u8),
) -> Result<(), GoError> {
    let node = tree.node_mut(id);
    if node.pos != portable.pos() {
        return Err(GoError::malformed(format!(
            "node mismatch when unpacking move tree: expected {:?}, found ({}, {})",
            node.pos, portable.x, portable.y
        )));
    }

    node.correct_answer = portable.correct_answer;
    node.wrong_answer = portable.wrong_answer;
    node.text.clone_from(&portable.text);
    for mark in &portable.marks {
        if mark.x >= cols || mark.y >= rows {
            debug!(x = mark.x, y = mark.y, "mark outside the board dropped");
            continue;
        }
        node.marks_mut((mark.x, mark.y)).merge(&mark.marks);
    }
    if !portable.pen_marks.is_empty() {
        node.pen_marks.clone_from(&portable.pen_marks);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_tree::NewMove;
    use crate::move_tree::tests::state;

    fn sample_tree() -> (MoveTree, NodeId, NodeId) {
        let mut tree = MoveTree::new(state(&[0; 4], Stone::Black));
        let a = tree
            .add_move(
                0,
                NewMove {
                    pos: Some((1, 0)),
                    player: Some(Stone::Black),
                    trunk: true,
                    edited: false,
                    move_number: 1,
                    state: state(&[0, 1, 0, 0], Stone::White),
                },
            )
            .unwrap();
        let e = tree
            .add_move(
                a,
                NewMove {
                    pos: Some((0, 1)),
                    player: None,
                    trunk: false,
                    edited: true,
                    move_number: 1,
                    state: state(&[0, 1, 0, 0], Stone::White),
                },
            )
            .unwrap();
        tree.node_mut(a).text = "good shape".into();
        tree.node_mut(a).marks_mut((0, 0)).letter = Some("A".into());
        tree.node_mut(e).correct_answer = true;
        (tree, a, e)
    }

    #[test]
    fn writes_nested_structure() {
        let (tree, _, _) = sample_tree();
        let p = to_portable(&tree, 0);
        assert_eq!((p.x, p.y), (-1, -1));
        let a = p.trunk_next.as_deref().unwrap();
        assert_eq!((a.x, a.y), (1, 0));
        assert_eq!(a.text, "good shape");
        assert_eq!(a.marks[0].marks.letter.as_deref(), Some("A"));
        let e = &a.branches[0];
        assert!(e.edited);
        assert_eq!(e.color, Some(0));
        assert!(e.correct_answer);
    }

    #[test]
    fn omits_empty_fields_in_json() {
        let (tree, _, _) = sample_tree();
        let json = to_portable(&tree, 0).to_json().unwrap();
        assert!(json.starts_with(r#"{"x":-1,"y":-1,"trunk_next":{"x":1,"y":0,"marks":"#));
        assert!(!json.contains("wrong_answer"));
        assert!(!json.contains("pen_marks"));
        let back = PortableNode::from_json(&json).unwrap();
        assert_eq!(back, to_portable(&tree, 0));
    }

    #[test]
    fn reads_minimal_nodes() {
        let p = PortableNode::from_json(r#"{"x": 3, "y": 4, "branches": [{"x": -1, "y": -1}]}"#).unwrap();
        assert_eq!(p.pos(), Some((3, 4)));
        assert_eq!(p.branches[0].pos(), None);
        assert!(p.trunk_next.is_none());
    }

    #[test]
    fn loading_annotations_checks_position() {
        let (mut tree, a, _) = sample_tree();
        let wrong = PortableNode {
            x: 2,
            y: 2,
            ..Default::default()
        };
        assert!(load_annotations(&mut tree, a, &wrong, (2, 2)).is_err());

        let right = PortableNode {
            x: 1,
            y: 0,
            text: "replaced".into(),
            wrong_answer: true,
            ..Default::default()
        };
        load_annotations(&mut tree, a, &right, (2, 2)).unwrap();
        assert_eq!(tree.node(a).text, "replaced");
        assert!(tree.node(a).wrong_answer);
    }

    #[test]
    fn marks_off_the_board_are_dropped() {
        let (mut tree, a, _) = sample_tree();
        let portable = PortableNode::from_json(
            r#"{"x": 1, "y": 0, "marks": [{"x": 250, "y": 0, "marks": {"triangle": true}}, {"x": 1, "y": 1, "marks": {"square": true}}]}"#,
        )
        .unwrap();
        load_annotations(&mut tree, a, &portable, (2, 2)).unwrap();
        let node = tree.node(a);
        assert!(node.marks((250, 0)).is_none());
        assert!(node.marks((1, 1)).is_some_and(|m| m.square));
    }
}

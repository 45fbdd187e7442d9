use crate::Point;
use crate::move_tree::{Marks, MoveNode, MoveTree, NodeId};
use crate::stone::Stone;

use super::error::SgfError;
use super::parser::SgfHeader;

/// Write a move tree as a single SGF game tree. The root node carries the
/// header, the setup stones and the root's own annotations. Fails when a
/// point lies beyond the 52 columns SGF letters can address.
pub fn serialize(header: &SgfHeader, tree: &MoveTree) -> Result<String, SgfError> {
    let mut buf = String::from("(;FF[4]GM[1]");
    write_header(header, &mut buf)?;

    let root = tree.node(MoveTree::ROOT);
    write_annotations(root, &mut buf)?;
    buf.push('\n');
    write_children(tree, MoveTree::ROOT, &mut buf)?;
    buf.push_str(")\n");
    Ok(buf)
}

fn write_header(header: &SgfHeader, buf: &mut String) -> Result<(), SgfError> {
    if let Some((cols, rows)) = header.size {
        if cols == rows {
            write_number("SZ", cols, buf);
        } else {
            buf.push_str(&format!("SZ[{cols}:{rows}]"));
        }
    }
    if let Some(komi) = header.komi {
        write_number("KM", komi, buf);
    }
    if let Some(handicap) = header.handicap.filter(|&h| h > 0) {
        write_number("HA", handicap, buf);
    }
    if let Some(rules) = &header.rules {
        write_text("RU", rules, buf);
    }
    if let Some(player) = header.player {
        write_number("PL", player.letter(), buf);
    }
    if let Some(result) = &header.result {
        write_text("RE", result, buf);
    }
    for color in [Stone::Black, Stone::White] {
        let points: Vec<Point> = header
            .setup
            .iter()
            .filter(|(c, _)| *c == color)
            .map(|&(_, p)| p)
            .collect();
        if !points.is_empty() {
            buf.push('A');
            write_point_list(color.letter(), &points, buf)?;
        }
    }
    Ok(())
}

/// Children of `id`, each wrapped in parentheses when there is a choice.
/// Single-child runs are written iteratively so long games do not recurse.
fn write_children(tree: &MoveTree, id: NodeId, buf: &mut String) -> Result<(), SgfError> {
    let mut cur = id;
    loop {
        let children: Vec<NodeId> = tree.node(cur).children().collect();
        match children.as_slice() {
            [] => return Ok(()),
            [only] => {
                write_node(tree.node(*only), buf)?;
                cur = *only;
            }
            many => {
                for &child in many {
                    buf.push('(');
                    write_node(tree.node(child), buf)?;
                    write_children(tree, child, buf)?;
                    buf.push(')');
                }
                return Ok(());
            }
        }
    }
}

fn write_node(node: &MoveNode, buf: &mut String) -> Result<(), SgfError> {
    buf.push(';');
    match (node.edited, node.player) {
        (true, Some(color)) => {
            buf.push('A');
            write_move(color.letter(), node.pos, buf)?;
        }
        (true, None) => write_move("AE", node.pos, buf)?,
        (false, Some(color)) => write_move(color.letter(), node.pos, buf)?,
        (false, None) => {}
    }
    write_annotations(node, buf)?;
    buf.push('\n');
    Ok(())
}

fn write_annotations(node: &MoveNode, buf: &mut String) -> Result<(), SgfError> {
    let marked: Vec<(Point, &Marks)> = node.marked_points().collect();
    let with = |f: fn(&Marks) -> bool| -> Vec<Point> {
        marked.iter().filter(|(_, m)| f(m)).map(|&(p, _)| p).collect()
    };
    for (ident, points) in [
        ("TR", with(|m| m.triangle)),
        ("SQ", with(|m| m.square)),
        ("MA", with(|m| m.cross)),
        ("CR", with(|m| m.circle)),
    ] {
        if !points.is_empty() {
            write_point_list(ident, &points, buf)?;
        }
    }

    let labels: Vec<(Point, &str)> = marked
        .iter()
        .filter_map(|&(p, m)| m.letter.as_deref().map(|l| (p, l)))
        .collect();
    if !labels.is_empty() {
        buf.push_str("LB");
        for (point, label) in labels {
            buf.push('[');
            push_point(buf, point)?;
            buf.push(':');
            push_escaped(buf, label);
            buf.push(']');
        }
    }

    if !node.text.is_empty() {
        write_text("C", &node.text, buf);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const COORD_LETTERS: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn push_point(buf: &mut String, point: Point) -> Result<(), SgfError> {
    let letter = |c: u8| COORD_LETTERS.get(c as usize).map(|&b| b as char);
    match (letter(point.0), letter(point.1)) {
        (Some(x), Some(y)) => {
            buf.push(x);
            buf.push(y);
            Ok(())
        }
        _ => Err(SgfError::InvalidCoordinate(format!(
            "({}, {}) cannot be written as SGF letters",
            point.0, point.1
        ))),
    }
}

fn push_escaped(buf: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            ']' | '\\' => {
                buf.push('\\');
                buf.push(ch);
            }
            _ => buf.push(ch),
        }
    }
}

/// A pass is written as an empty value.
fn write_move(ident: &str, pos: Option<Point>, buf: &mut String) -> Result<(), SgfError> {
    buf.push_str(ident);
    buf.push('[');
    if let Some(p) = pos {
        push_point(buf, p)?;
    }
    buf.push(']');
    Ok(())
}

fn write_number(ident: &str, n: impl std::fmt::Display, buf: &mut String) {
    buf.push_str(ident);
    buf.push('[');
    buf.push_str(&n.to_string());
    buf.push(']');
}

fn write_text(ident: &str, s: &str, buf: &mut String) {
    buf.push_str(ident);
    buf.push('[');
    push_escaped(buf, s);
    buf.push(']');
}

fn write_point_list(ident: &str, points: &[Point], buf: &mut String) -> Result<(), SgfError> {
    buf.push_str(ident);
    for &p in points {
        buf.push('[');
        push_point(buf, p)?;
        buf.push(']');
    }
    Ok(())
}

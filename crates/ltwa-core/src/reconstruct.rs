//! Joining resolved pieces back into a title.

use crate::resolver::{Piece, Role};

/// Join `pieces` into the abbreviated title.
///
/// Articles never appear; stopwords only as the first element. A piece is
/// separated from the previous emitted one by a single space when the source
/// had anything between them, and concatenated otherwise. Returns None when
/// nothing is left.
pub fn reconstruct(pieces: &[Piece]) -> Option<String> {
    let mut emitted: Vec<&Piece> = Vec::with_capacity(pieces.len());

    for (index, piece) in pieces.iter().enumerate() {
        match piece.role {
            Role::Article => continue,
            Role::Stopword if index > 0 => continue,
            _ if piece.text.is_empty() => continue,
            _ => {}
        }

        // "21st" right after a word replaces it
        if piece.role == Role::Ordinal {
            if let Some(previous) = emitted.last() {
                if previous.role == Role::Word && previous.end == piece.start {
                    emitted.pop();
                }
            }
        }

        emitted.push(piece);
    }

    let mut title = String::new();
    let mut previous_end: Option<usize> = None;
    for piece in emitted {
        if previous_end.is_some_and(|end| end < piece.start) {
            title.push(' ');
        }
        title.push_str(&piece.text);
        previous_end = Some(piece.end);
    }

    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

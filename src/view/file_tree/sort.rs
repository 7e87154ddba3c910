//! Explorer-style ordering of entries
//!
//! Names are compared the way the Windows shell compares them: case is
//! ignored and runs of digits compare by numeric value, so `track2` sorts
//! before `track10`. Containers (drives and directories) always come before
//! files.

use super::node::TreeNode;
use crate::primitives::path_utils::path_key;
use crate::services::fs::FsEntry;
use std::cmp::Ordering;
use std::iter::Peekable;
use std::path::Path;

/// Anything that can be placed in a directory-first natural ordering
pub trait NaturalSortKey {
    /// Drives and directories
    fn is_container(&self) -> bool;
    fn sort_name(&self) -> &str;
}

impl NaturalSortKey for TreeNode {
    fn is_container(&self) -> bool {
        TreeNode::is_container(self)
    }

    fn sort_name(&self) -> &str {
        self.display_name()
    }
}

impl NaturalSortKey for FsEntry {
    fn is_container(&self) -> bool {
        self.is_dir()
    }

    fn sort_name(&self) -> &str {
        &self.name
    }
}

/// Directory-first natural ordering
pub fn natural_order<T: NaturalSortKey + ?Sized>(a: &T, b: &T) -> Ordering {
    b.is_container()
        .cmp(&a.is_container())
        .then_with(|| natural_cmp(a.sort_name(), b.sort_name()))
}

/// Ordering of drive roots: plain case-insensitive path comparison
pub fn compare_drive_roots(a: &Path, b: &Path) -> Ordering {
    path_key(a).cmp(&path_key(b))
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    /// Digit run with leading zeros stripped
    Number(String),
    Char(char),
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Token::Number(_), Token::Char(_)) => Ordering::Less,
            (Token::Char(_), Token::Number(_)) => Ordering::Greater,
            (Token::Char(a), Token::Char(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Tokens<I: Iterator<Item = char>> {
    chars: Peekable<I>,
}

impl<I: Iterator<Item = char>> Iterator for Tokens<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let c = self.chars.next()?;
        if !c.is_ascii_digit() {
            return Some(Token::Char(c));
        }
        let mut digits = String::new();
        if c != '0' {
            digits.push(c);
        }
        while let Some(&d) = self.chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            if !(digits.is_empty() && d == '0') {
                digits.push(d);
            }
            self.chars.next();
        }
        Some(Token::Number(digits))
    }
}

fn tokens(s: &str) -> Tokens<impl Iterator<Item = char> + '_> {
    Tokens {
        chars: s.chars().flat_map(char::to_lowercase).peekable(),
    }
}

/// Natural, case-insensitive comparison of two names
///
/// Names that differ only in case or in leading zeros of a number compare
/// equal; the caller's stable sort keeps their original order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    tokens(a).cmp(tokens(b))
}

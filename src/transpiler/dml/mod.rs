//! Statement assembly.
//!
//! Each builder resolves its fragments into a fresh parameter bag and
//! returns owned parts; providers decide the dialect wrapping and commit.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

/// Join non-empty fragments with a single space.
pub fn join_fragments(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use error::FilterError;

/// Identifiers must look like `[A-Za-z_][A-Za-z0-9_]*` before they are quoted into SQL.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

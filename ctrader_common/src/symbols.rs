//! Resolving a human-readable instrument name to its platform symbol id.

use crate::error::SessionError;
use crate::model::SymbolDescriptor;
use crate::result::Result;

/// A symbol the session can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    /// Platform-internal id.
    pub symbol_id: i64,
    /// Canonical name of the matched symbol.
    pub name: String,
}

/// Finds the descriptor matching `target`.
///
/// Two passes over the list, first match wins:
/// 1. exact match of the name or the display name;
/// 2. case-insensitive match of the same fields.
///
/// An exact match anywhere in the list beats a case-insensitive match earlier in it.
pub fn find_symbol<'a>(descriptors: &'a [SymbolDescriptor], target: &str) -> Option<&'a SymbolDescriptor> {
    descriptors
        .iter()
        .find(|s| matches_field(s, |field| field == target))
        .or_else(|| {
            descriptors
                .iter()
                .find(|s| matches_field(s, |field| field.eq_ignore_ascii_case(target)))
        })
}

/// Resolves `target` to a symbol with a usable id.
///
/// Fails with `SymbolNotFound` when nothing matches and with `SymbolMissingId`
/// when the match carries no `symbolId`.
pub fn resolve(descriptors: &[SymbolDescriptor], target: &str) -> Result<ResolvedSymbol> {
    let descriptor =
        find_symbol(descriptors, target).ok_or_else(|| SessionError::SymbolNotFound(target.to_string()))?;
    match descriptor.symbol_id {
        Some(symbol_id) => Ok(ResolvedSymbol {
            symbol_id,
            name: descriptor.name.clone().unwrap_or_else(|| target.to_string()),
        }),
        None => Err(SessionError::SymbolMissingId {
            name: target.to_string(),
            descriptor: serde_json::to_string(descriptor)?,
        }),
    }
}

fn matches_field(descriptor: &SymbolDescriptor, eq: impl Fn(&str) -> bool) -> bool {
    descriptor.name.as_deref().is_some_and(&eq) || descriptor.display_name.as_deref().is_some_and(&eq)
}

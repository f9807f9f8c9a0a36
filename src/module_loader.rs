// ABOUTME: Module loader collaborator stub. Real module loading — mapping a suffix
// ABOUTME: string to a NIF file on disk and maintaining an index file — is explicitly
// ABOUTME: out of scope; this module only provides the contract the core depends on:
// ABOUTME: a successful load positions a cursor at a declaration.

use crate::nif::Cursor;

/// Status of a symbol-load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    LacksModuleName,
    LacksOffset,
    LacksPosition,
    LacksNothing,
}

/// Result of `try_load_sym`: on `LacksNothing`, `decl_cursor` points at the type or
/// routine declaration the caller asked for.
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub status: LoadStatus,
    pub decl_cursor: Option<Cursor>,
}

/// A minimal in-memory stand-in for the on-disk module index: a lookup table from
/// symbol id to a pre-parsed declaration cursor, populated by whatever front end
/// actually reads NIF files from disk (outside this crate's scope).
#[derive(Debug, Default)]
pub struct ModuleLoader {
    declarations: std::collections::HashMap<u32, Cursor>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        ModuleLoader::default()
    }

    /// Register a pre-resolved declaration cursor for `sym_id`, as if a prior on-disk
    /// lookup had already positioned it there.
    pub fn register(&mut self, sym_id: u32, decl_cursor: Cursor) {
        self.declarations.insert(sym_id, decl_cursor);
    }

    /// `try_load_sym(sym_id) -> {status, decl_cursor}`. A successful load
    /// yields a cursor positioned at the type or routine declaration.
    pub fn try_load_sym(&self, sym_id: u32) -> LoadResult {
        match self.declarations.get(&sym_id) {
            Some(cursor) => LoadResult {
                status: LoadStatus::LacksNothing,
                decl_cursor: Some(*cursor),
            },
            None => LoadResult {
                status: LoadStatus::LacksModuleName,
                decl_cursor: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_symbol_lacks_module_name() {
        let loader = ModuleLoader::new();
        let result = loader.try_load_sym(7);
        assert_eq!(result.status, LoadStatus::LacksModuleName);
        assert!(result.decl_cursor.is_none());
    }

    #[test]
    fn registered_symbol_loads_cleanly() {
        let mut loader = ModuleLoader::new();
        loader.register(7, Cursor::new(3));
        let result = loader.try_load_sym(7);
        assert_eq!(result.status, LoadStatus::LacksNothing);
        assert_eq!(result.decl_cursor.unwrap().index(), 3);
    }
}

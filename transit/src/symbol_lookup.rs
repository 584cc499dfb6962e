use std::collections::{BTreeMap, HashMap};

/// Resolves the symbol references found in `%s` slots and channel fields
pub trait SymbolLookup {
    fn symbol(&self, handle: u32) -> Option<String>;
}

impl SymbolLookup for HashMap<u32, String> {
    fn symbol(&self, handle: u32) -> Option<String> {
        self.get(&handle).cloned()
    }
}

impl SymbolLookup for BTreeMap<u32, String> {
    fn symbol(&self, handle: u32) -> Option<String> {
        self.get(&handle).cloned()
    }
}

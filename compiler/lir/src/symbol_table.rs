use std::collections::HashMap;

use crate::AssemblyType;

/// Backend view of every symbol the assembly passes touch: objects carry
/// their width and staticness, functions whether this translation unit
/// defines them.
pub enum AsmEntry {
    Obj { ty: AssemblyType, is_static: bool },
    Func { defined: bool },
}

pub struct AsmTable {
    pub symbols: HashMap<String, AsmEntry>,
}

impl AsmTable {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::with_capacity(20),
        }
    }

    pub fn add_func(&mut self, name: String, defined: bool) {
        self.symbols.insert(name, AsmEntry::Func { defined });
    }

    pub fn add_obj(&mut self, name: String, ty: AssemblyType, is_static: bool) {
        self.symbols.insert(name, AsmEntry::Obj { ty, is_static });
    }

    pub fn get_type(&self, name: &str) -> AssemblyType {
        match self.symbols.get(name) {
            None => {
                panic!("Internal Error: Object '{}' is not in the AsmTable", name);
            }
            Some(AsmEntry::Obj { ty, .. }) => *ty,
            Some(AsmEntry::Func { .. }) => {
                panic!("Internal Error: '{}' is a function, not an object", name);
            }
        }
    }

    pub fn get_size(&self, name: &str) -> i32 {
        match self.get_type(name) {
            AssemblyType::Long => 4,
            AssemblyType::Quad => 8,
        }
    }

    pub fn is_static(&self, name: &str) -> bool {
        match self.symbols.get(name) {
            None => {
                panic!("Internal Error: Object '{}' is not in the AsmTable", name);
            }
            Some(AsmEntry::Obj { is_static, .. }) => *is_static,
            Some(AsmEntry::Func { .. }) => {
                panic!("Internal Error: '{}' is a function, not an object", name);
            }
        }
    }

    pub fn is_defined_func(&self, name: &str) -> bool {
        matches!(self.symbols.get(name), Some(AsmEntry::Func { defined: true }))
    }
}

impl Default for AsmTable {
    fn default() -> Self {
        Self::new()
    }
}

use crate::function::Function;
use crate::layout::DataLayout;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub layout: DataLayout,
    pub functions: IndexMap<String, Function>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: DataLayout::default(),
            functions: IndexMap::new(),
        }
    }

    pub fn with_layout(mut self, layout: DataLayout) -> Self {
        self.layout = layout;
        self
    }

    /// A definition replaces an earlier declaration of the same name.
    pub fn add_function(&mut self, function: Function) {
        self.functions.insert(function.name.clone(), function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values().filter(|f| !f.is_declaration)
    }

    /// Hex SHA-256 of the module's textual form.
    pub fn fingerprint(&self) -> String {
        let text = crate::format::format_module(self);
        let digest = Sha256::digest(text.as_bytes());
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

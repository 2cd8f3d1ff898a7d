use super::FunctionBuilder;
use crate::{
    function::{Function, Parameter},
    layout::DataLayout,
    module::Module,
    types::Type,
};

pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            module: Module::new(name),
        }
    }

    pub fn layout(&mut self, layout: DataLayout) -> &mut Self {
        self.module.layout = layout;
        self
    }

    pub fn declare(&mut self, name: &str, ret: Type, params: Vec<Type>) -> &mut Self {
        let params = params
            .into_iter()
            .enumerate()
            .map(|(i, ty)| Parameter::new(format!("arg{}", i), ty))
            .collect();
        self.module
            .add_function(Function::declaration(name, ret, params));
        self
    }

    pub fn function(&mut self, name: &str, ret: Type) -> FunctionBuilder<'_> {
        FunctionBuilder::new(name, ret, &mut self.module)
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn build(self) -> Module {
        self.module
    }
}

use crate::function::Function;
use crate::module::Module;
use crate::values::InstId;
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

/// Direct-call graph over a module. Callees without a body in the module appear as external nodes.
#[derive(Debug, Clone)]
pub struct CallGraph<'m> {
    module: &'m Module,
    nodes: IndexMap<String, CallGraphNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGraphNode {
    pub name: String,
    pub is_external: bool,
    pub callees: IndexSet<String>,
    pub call_sites: Vec<InstId>,
}

impl CallGraphNode {
    fn new(name: &str, is_external: bool) -> Self {
        Self {
            name: name.to_string(),
            is_external,
            callees: IndexSet::new(),
            call_sites: Vec::new(),
        }
    }
}

impl<'m> CallGraph<'m> {
    pub fn build(module: &'m Module) -> Self {
        let mut nodes: IndexMap<String, CallGraphNode> = IndexMap::new();

        for function in module.functions.values() {
            nodes.insert(
                function.name.clone(),
                CallGraphNode::new(&function.name, function.is_declaration),
            );
        }

        for function in module.definitions() {
            for inst in &function.instructions {
                if let Some(callee) = inst.callee() {
                    if !nodes.contains_key(callee) {
                        nodes.insert(callee.to_string(), CallGraphNode::new(callee, true));
                    }
                    if let Some(node) = nodes.get_mut(&function.name) {
                        node.callees.insert(callee.to_string());
                        node.call_sites.push(inst.id);
                    }
                }
            }
        }

        Self { module, nodes }
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CallGraphNode> {
        self.nodes.values()
    }

    pub fn node(&self, name: &str) -> Option<&CallGraphNode> {
        self.nodes.get(name)
    }

    /// Linear scan over the graph's functions by declared name. Only functions with a body
    /// in the module are returned.
    pub fn lookup(&self, name: &str) -> Option<&'m Function> {
        self.nodes
            .values()
            .filter(|node| !node.is_external)
            .find(|node| node.name == name)
            .and_then(|node| self.module.get_function(&node.name))
    }

    pub fn callees(&self, name: &str) -> Vec<&str> {
        self.nodes
            .get(name)
            .map(|node| node.callees.iter().map(|c| c.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn callers(&self, name: &str) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|node| node.callees.contains(name))
            .map(|node| node.name.as_str())
            .collect()
    }

    /// Breadth-first closure over direct calls, starting with `root` itself.
    pub fn reachable_from(&self, root: &str) -> Vec<&str> {
        let mut seen: IndexSet<&str> = IndexSet::new();
        let mut queue = VecDeque::new();
        if let Some((_, name, _)) = self.nodes.get_full(root) {
            queue.push_back(name.as_str());
        }
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(node) = self.nodes.get(name) {
                queue.extend(node.callees.iter().map(|c| c.as_str()));
            }
        }
        seen.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::InstKind;
    use crate::types::Type;

    fn module_with_calls() -> Module {
        let mut module = Module::new("calls");

        let mut helper = Function::new("helper", Type::Void);
        helper.push(
            InstKind::Call {
                callee: "puts".to_string(),
                ret: Type::Int(32),
                args: vec![],
            },
            None,
        );
        module.add_function(helper);

        let mut main = Function::new("main", Type::Int(32));
        main.push(
            InstKind::Call {
                callee: "helper".to_string(),
                ret: Type::Void,
                args: vec![],
            },
            None,
        );
        module.add_function(main);
        module
    }

    #[test]
    fn test_lookup_by_name() {
        let module = module_with_calls();
        let graph = CallGraph::build(&module);

        assert_eq!(graph.lookup("main").map(|f| f.name()), Some("main"));
        assert!(graph.lookup("puts").is_none());
        assert!(graph.lookup("missing").is_none());
        assert!(graph.node("puts").map(|n| n.is_external).unwrap_or(false));
    }

    #[test]
    fn test_edges_and_reachability() {
        let module = module_with_calls();
        let graph = CallGraph::build(&module);

        assert_eq!(graph.callees("main"), vec!["helper"]);
        assert_eq!(graph.callers("puts"), vec!["helper"]);
        assert_eq!(graph.reachable_from("main"), vec!["main", "helper", "puts"]);
        assert!(graph.reachable_from("nowhere").is_empty());
    }
}

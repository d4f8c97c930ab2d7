use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::expression::{Expression, OperatorDefinition};
use crate::functions;
use crate::{BindError, BindResult, RegistryError};

/// Symbolic spellings that resolve to a canonical operator.
pub const ALIASES: &[(&str, &str)] = &[
    ("add", "+"),
    ("sub", "-"),
    ("mul", "*"),
    ("div", "/"),
    ("exp", "^"),
    ("mod", "%"),
    ("and", "&&"),
    ("or", "||"),
    ("not", "!"),
    ("equals", "=="),
    ("greater", ">"),
    ("greaterOrEquals", ">="),
    ("less", "<"),
    ("lessOrEquals", "<="),
    ("&", "concat"),
];

/// Immutable lookup table from operator name to definition.
///
/// Built once and shared by reference (usually behind an `Arc`); nothing in
/// the engine keeps a global copy. An alias resolves to the very same
/// `Arc<OperatorDefinition>` as its canonical name.
#[derive(Clone, Debug)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<OperatorDefinition>>,
    aliases: BTreeMap<String, String>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FunctionRegistry {
    /// Every builtin operator plus the standard aliases.
    pub fn standard() -> Self {
        let mut functions = HashMap::new();
        for definition in functions::builtins() {
            functions.insert(definition.name().to_string(), definition);
        }
        let aliases = ALIASES
            .iter()
            .map(|(alias, target)| (alias.to_string(), target.to_string()))
            .collect();
        debug!("Registered {} builtin functions", functions.len());
        Self { functions, aliases }
    }

    /// Start from the builtins and add host-defined operators.
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder {
            registry: Self::standard(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<OperatorDefinition>> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.functions.get(canonical).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Canonical names and aliases, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .keys()
            .chain(self.aliases.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// `(alias, canonical name)` pairs.
    pub fn aliases(&self) -> Vec<(String, String)> {
        self.aliases
            .iter()
            .map(|(alias, target)| (alias.clone(), target.clone()))
            .collect()
    }

    /// Bind a call of `name` over `children`.
    ///
    /// Resolves the name (through the aliases) and runs the operator's
    /// validator once. Children are expected to be bound already.
    pub fn make_expression(&self, name: &str, children: Vec<Expression>) -> BindResult<Expression> {
        let definition = self.lookup(name).ok_or_else(|| {
            debug!("Unknown function: {}", name);
            BindError::unknown_function(name)
        })?;
        let expression = Expression::call(definition.clone(), children);
        definition.validate(&expression).inspect_err(|e| {
            debug!("Failed to bind {}: {}", expression, e);
        })?;
        Ok(expression)
    }
}

pub struct FunctionRegistryBuilder {
    registry: FunctionRegistry,
}

impl FunctionRegistryBuilder {
    pub fn register(mut self, definition: OperatorDefinition) -> Result<Self, RegistryError> {
        let name = definition.name().to_string();
        if self.registry.contains(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        debug!("Registering function: {}", name);
        self.registry.functions.insert(name, Arc::new(definition));
        Ok(self)
    }

    pub fn alias<A: Into<String>, T: Into<String>>(
        mut self,
        alias: A,
        target: T,
    ) -> Result<Self, RegistryError> {
        let (alias, target) = (alias.into(), target.into());
        if self.registry.contains(&alias) {
            return Err(RegistryError::Duplicate(alias));
        }
        if !self.registry.functions.contains_key(&target) {
            return Err(RegistryError::UnknownAliasTarget { alias, target });
        }
        self.registry.aliases.insert(alias, target);
        Ok(self)
    }

    pub fn build(self) -> FunctionRegistry {
        self.registry
    }
}

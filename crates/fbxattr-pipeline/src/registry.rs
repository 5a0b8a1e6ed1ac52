//! Filter rule registry
//!
//! Container types declare which models they are generated for through
//! filter rules: a regular expression matched against the model name and a
//! suffix for the generated asset. The registry collects declarations and
//! compiles them into [`FilterRule`]s on first lookup.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use fbxattr_core::{Error, Result};

use crate::container::{Container, ContainerKind};

/// An uncompiled filter declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDeclaration {
    pub pattern: String,
    pub suffix: String,
    pub kind: ContainerKind,
}

impl RuleDeclaration {
    pub fn new(pattern: impl Into<String>, suffix: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            pattern: pattern.into(),
            suffix: suffix.into(),
            kind,
        }
    }

    /// Declaration for container type `C`
    pub fn of<C: Container>(pattern: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::new(pattern, suffix, ContainerKind::of::<C>())
    }
}

/// A compiled filter rule
#[derive(Debug, Clone)]
pub struct FilterRule {
    pub pattern: Regex,
    pub suffix: String,
    pub kind: ContainerKind,
}

impl FilterRule {
    /// Whether the pattern occurs anywhere in `model_name`
    pub fn matches(&self, model_name: &str) -> bool {
        self.pattern.is_match(model_name)
    }
}

/// Rule information for display
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RuleInfo {
    pub pattern: String,
    pub suffix: String,
    pub container: &'static str,
    pub record: &'static str,
    /// Whether the rule takes part in lookups
    pub active: bool,
}

/// Registry of filter rules
pub struct RuleRegistry {
    declarations: RwLock<Vec<RuleDeclaration>>,
    /// Compiled rules; rebuilt on lookup while empty
    compiled: RwLock<Vec<FilterRule>>,
}

impl RuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            declarations: RwLock::new(Vec::new()),
            compiled: RwLock::new(Vec::new()),
        }
    }

    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::new()
    }

    /// Add a declaration; returns `false` for an exact duplicate
    ///
    /// Invalidates the compiled rules so the next lookup sees the addition.
    pub fn declare(&self, declaration: RuleDeclaration) -> bool {
        {
            let mut declarations = self.declarations.write();
            if declarations.contains(&declaration) {
                return false;
            }

            tracing::debug!(
                pattern = %declaration.pattern,
                container = declaration.kind.type_name(),
                "Declared filter rule"
            );
            declarations.push(declaration);
        }

        self.compiled.write().clear();
        true
    }

    /// Declare every filter of container type `C`; returns how many were added
    pub fn register_container<C: Container>(&self) -> usize {
        C::FILTERS
            .iter()
            .filter(|filter| self.declare(RuleDeclaration::of::<C>(filter.pattern, filter.suffix)))
            .count()
    }

    /// The compiled rule set, compiling declarations if needed
    pub fn lookup(&self) -> Vec<FilterRule> {
        {
            let compiled = self.compiled.read();
            if !compiled.is_empty() {
                return compiled.clone();
            }
        }

        let mut compiled = self.compiled.write();
        if compiled.is_empty() {
            *compiled = self.compile();
        }
        compiled.clone()
    }

    fn compile(&self) -> Vec<FilterRule> {
        let declarations = self.declarations.read();
        let mut rules = Vec::with_capacity(declarations.len());

        for declaration in declarations.iter() {
            if declaration.pattern.is_empty() {
                tracing::debug!(
                    container = declaration.kind.type_name(),
                    "Skipping filter rule with empty pattern"
                );
                continue;
            }

            match compile_pattern(&declaration.pattern) {
                Ok(pattern) => rules.push(FilterRule {
                    pattern,
                    suffix: declaration.suffix.clone(),
                    kind: declaration.kind,
                }),
                Err(e) => {
                    tracing::warn!(
                        container = declaration.kind.type_name(),
                        error = %e,
                        "Skipping filter rule"
                    );
                }
            }
        }

        tracing::debug!(rules = rules.len(), declarations = declarations.len(), "Compiled filter rules");
        rules
    }

    /// All declarations, including ones skipped at compile time
    pub fn list(&self) -> Vec<RuleInfo> {
        self.declarations
            .read()
            .iter()
            .map(|d| RuleInfo {
                pattern: d.pattern.clone(),
                suffix: d.suffix.clone(),
                container: d.kind.type_name(),
                record: d.kind.record_name(),
                active: !d.pattern.is_empty() && Regex::new(&d.pattern).is_ok(),
            })
            .collect()
    }

    /// Kind of a declared container type, found by its stored type name
    ///
    /// Declarations with empty or invalid patterns count as registered.
    pub fn kind_by_name(&self, type_name: &str) -> Option<ContainerKind> {
        self.declarations
            .read()
            .iter()
            .find(|d| d.kind.type_name() == type_name)
            .map(|d| d.kind)
    }

    pub fn len(&self) -> usize {
        self.declarations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.read().is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a filter pattern
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Global registry instance
pub static GLOBAL_REGISTRY: Lazy<RuleRegistry> = Lazy::new(RuleRegistry::new);

/// Builder for a populated registry
#[derive(Debug, Default)]
pub struct RuleRegistryBuilder {
    declarations: Vec<RuleDeclaration>,
}

impl RuleRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container<C: Container>(mut self) -> Self {
        self.declarations.extend(
            C::FILTERS
                .iter()
                .map(|f| RuleDeclaration::of::<C>(f.pattern, f.suffix)),
        );
        self
    }

    pub fn rule(mut self, declaration: RuleDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn build(self) -> RuleRegistry {
        let registry = RuleRegistry::new();
        for declaration in self.declarations {
            registry.declare(declaration);
        }
        registry
    }
}

//! `$(scope.key)` substitution against the four lookup scopes
//!
//! A placeholder key is split on its first `.`; the left part picks the scope:
//!
//! | scope        | source                                         |
//! |--------------|------------------------------------------------|
//! | `ext_config` | the adapter's `[uploaders.<id>]` settings      |
//! | `config`     | top-level application configuration            |
//! | `option`     | command-line options of this run               |
//! | `task`       | the task being uploaded                        |
//!
//! Substitution is all-or-nothing: one unresolvable placeholder fails the whole
//! string instead of leaving a literal `$(...)` behind.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::{AdapterConfig, Config, adapter_value};
use crate::options::RunOptions;
use crate::task::Task;

pub const DEFAULT_LEFT_DELIMITER: &str = "$(";
pub const DEFAULT_RIGHT_DELIMITER: &str = ")";

static DEFAULT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\((.*?)\)").expect("placeholder pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unable to resolve placeholder '{placeholder}'")]
pub struct UnresolvedPlaceholder {
    pub placeholder: String,
}

/// Namespace a placeholder key addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    ExtConfig,
    Config,
    Option,
    Task,
}

impl Scope {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ext_config" => Some(Scope::ExtConfig),
            "config" => Some(Scope::Config),
            "option" => Some(Scope::Option),
            "task" => Some(Scope::Task),
            _ => None,
        }
    }
}

/// The value source behind one [`Scope`]
#[derive(Debug, Clone, Copy)]
pub enum ScopeProvider<'a> {
    ExtConfig(&'a AdapterConfig),
    Config(&'a Config),
    Option(&'a RunOptions),
    Task(&'a Task),
}

impl ScopeProvider<'_> {
    pub fn lookup(&self, key: &str) -> Option<String> {
        match self {
            ScopeProvider::ExtConfig(map) => adapter_value(map, key),
            ScopeProvider::Config(config) => config.lookup(key),
            ScopeProvider::Option(options) => options.lookup(key),
            ScopeProvider::Task(task) => task.lookup(key),
        }
    }
}

/// Read-only view of everything a placeholder may address
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub ext_config: &'a AdapterConfig,
    pub config: &'a Config,
    pub options: &'a RunOptions,
    pub task: &'a Task,
}

impl<'a> ResolveContext<'a> {
    pub fn provider(&self, scope: Scope) -> ScopeProvider<'a> {
        match scope {
            Scope::ExtConfig => ScopeProvider::ExtConfig(self.ext_config),
            Scope::Config => ScopeProvider::Config(self.config),
            Scope::Option => ScopeProvider::Option(self.options),
            Scope::Task => ScopeProvider::Task(self.task),
        }
    }

    /// Look up a full `scope.key` string
    pub fn lookup(&self, key: &str) -> Option<String> {
        let (parent, sub) = key.trim().split_once('.')?;
        let scope = Scope::parse(parent)?;
        self.provider(scope).lookup(sub)
    }
}

/// Placeholder substitution engine
#[derive(Debug, Clone)]
pub struct Resolver {
    pattern: Regex,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl Resolver {
    /// Resolver for custom delimiters, e.g. `${` and `}`
    pub fn with_delimiters(left: &str, right: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            "{}(.*?){}",
            regex::escape(left),
            regex::escape(right)
        ))?;
        Ok(Self { pattern })
    }

    pub fn has_placeholder(&self, input: &str) -> bool {
        self.pattern.is_match(input)
    }

    /// Substitute every placeholder in `input`
    pub fn resolve(
        &self,
        input: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<String, UnresolvedPlaceholder> {
        let mut output = String::with_capacity(input.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(input) {
            let Some(whole) = caps.get(0) else { continue };
            let key = caps.get(1).map_or("", |m| m.as_str());

            let value = ctx.lookup(key).ok_or_else(|| UnresolvedPlaceholder {
                placeholder: whole.as_str().to_string(),
            })?;

            output.push_str(&input[last..whole.start()]);
            output.push_str(&value);
            last = whole.end();
        }

        output.push_str(&input[last..]);
        Ok(output)
    }

    /// Substitute inside every string of a JSON tree; other values are kept as-is
    pub fn resolve_value(
        &self,
        value: &Value,
        ctx: &ResolveContext<'_>,
    ) -> Result<Value, UnresolvedPlaceholder> {
        Ok(match value {
            Value::String(s) => Value::String(self.resolve(s, ctx)?),
            Value::Object(map) => Value::Object(self.resolve_map(map, ctx)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_value(item, ctx))
                    .collect::<Result<_, _>>()?,
            ),
            other => other.clone(),
        })
    }

    pub fn resolve_map(
        &self,
        map: &Map<String, Value>,
        ctx: &ResolveContext<'_>,
    ) -> Result<Map<String, Value>, UnresolvedPlaceholder> {
        map.iter()
            .map(|(key, value)| Ok((key.clone(), self.resolve_value(value, ctx)?)))
            .collect()
    }
}

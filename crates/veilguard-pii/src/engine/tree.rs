//! Recursive redaction of JSON prompt-variable trees

use crate::engine::{RedactionEngine, RedactionStrategy};
use crate::error::{Error, Result};
use crate::state::PlaceholderAllocator;
use serde_json::{Map, Value};
use std::fmt::Write;

/// Structural copy of a tree with every string leaf redacted
#[derive(Debug, Clone, PartialEq)]
pub struct RedactedTree {
    pub value: Value,

    /// True iff any string leaf was rewritten
    pub changed: bool,
}

impl RedactionEngine {
    /// Redact every string leaf of `value` with placeholders from `state`.
    ///
    /// Traversal is depth-first pre-order: object entries in insertion order,
    /// array elements by index. Keys and non-string leaves are copied as-is.
    /// Nesting is checked before any leaf is redacted, so a tree that is too
    /// deep leaves `state` untouched.
    pub fn redact_tree<A>(&self, value: &Value, state: &mut A) -> Result<RedactedTree>
    where
        A: PlaceholderAllocator + ?Sized,
    {
        self.redact_tree_with(value, state, RedactionStrategy::Placeholder)
    }

    pub fn redact_tree_with<A>(
        &self,
        value: &Value,
        state: &mut A,
        strategy: RedactionStrategy,
    ) -> Result<RedactedTree>
    where
        A: PlaceholderAllocator + ?Sized,
    {
        DepthCheck {
            limit: self.max_depth,
            path: Vec::new(),
        }
        .visit(value)?;

        let mut walk = TreeWalk {
            engine: self,
            state,
            strategy,
            changed: false,
        };
        let value = walk.visit(value);

        Ok(RedactedTree {
            value,
            changed: walk.changed,
        })
    }
}

enum PathSegment<'v> {
    Key(&'v str),
    Index(usize),
}

/// Fails on the first container nested `limit` levels deep
struct DepthCheck<'v> {
    limit: usize,
    path: Vec<PathSegment<'v>>,
}

impl<'v> DepthCheck<'v> {
    fn visit(&mut self, value: &'v Value) -> Result<()> {
        match value {
            Value::Array(items) => {
                self.enter()?;
                for (index, item) in items.iter().enumerate() {
                    self.path.push(PathSegment::Index(index));
                    let visited = self.visit(item);
                    self.path.pop();
                    visited?;
                }
                Ok(())
            }
            Value::Object(entries) => {
                self.enter()?;
                for (key, item) in entries {
                    self.path.push(PathSegment::Key(key));
                    let visited = self.visit(item);
                    self.path.pop();
                    visited?;
                }
                Ok(())
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
        }
    }

    /// `path` holds the segments leading to the container being entered
    fn enter(&self) -> Result<()> {
        if self.path.len() >= self.limit {
            return Err(Error::NestingTooDeep {
                path: self.render_path(),
                limit: self.limit,
            });
        }
        Ok(())
    }

    fn render_path(&self) -> String {
        let mut rendered = String::from("$");
        for segment in &self.path {
            let _ = match segment {
                PathSegment::Key(key) => write!(rendered, ".{}", key),
                PathSegment::Index(index) => write!(rendered, "[{}]", index),
            };
        }
        rendered
    }
}

struct TreeWalk<'e, 's, A: ?Sized> {
    engine: &'e RedactionEngine,
    state: &'s mut A,
    strategy: RedactionStrategy,
    changed: bool,
}

impl<A> TreeWalk<'_, '_, A>
where
    A: PlaceholderAllocator + ?Sized,
{
    fn visit(&mut self, value: &Value) -> Value {
        match value {
            Value::String(text) => {
                let redacted = self.engine.redact_with(text, &mut *self.state, self.strategy);
                self.changed |= redacted.changed;
                Value::String(redacted.text)
            }
            Value::Array(items) => Value::Array(items.iter().map(|item| self.visit(item)).collect()),
            Value::Object(entries) => {
                let mut out = Map::with_capacity(entries.len());
                for (key, item) in entries {
                    out.insert(key.clone(), self.visit(item));
                }
                Value::Object(out)
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }
}

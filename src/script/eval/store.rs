use std::collections::HashMap;

use crate::runtime::error::ContextError;
use super::value::Value;

/// Normalizes a variable name: surrounding whitespace is dropped, runs of
/// inner whitespace become a single `_` and letters are uppercased. `hp base`,
/// `HP_Base` and ` Hp   base ` all name the same variable.
pub fn normalize_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if pending_separator {
            result.push('_');
            pending_separator = false;
        }
        result.extend(c.to_uppercase());
    }
    result
}

/// The scope chain. `frames[0]` is the global frame and lives as long as the
/// context; every function call pushes a local frame and pops it on return.
/// Lookups walk from the innermost frame outwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Context {
    frames: Vec<HashMap<String, Value>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self{ frames: vec![HashMap::new()] }
    }

    /// Number of frames, 1 when only the global frame exists.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let name = normalize_name(name);
        self.frames.iter().rev().find_map(|frame| frame.get(&name))
    }

    pub fn lookup_global(&self, name: &str) -> Option<&Value> {
        self.frames[0].get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Binds `name` in the innermost frame.
    pub fn assign(&mut self, name: &str, value: Value) {
        let name = normalize_name(name);
        self.innermost().insert(name, value);
    }

    /// Binds `name` in the global frame. Meant for hosts that populate a
    /// context before running scripts.
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.frames[0].insert(normalize_name(name), value);
    }

    /// Overwrites the innermost existing binding of `name`, or binds it in
    /// the innermost frame when it does not exist yet.
    pub fn update(&mut self, name: &str, value: Value) {
        let name = normalize_name(name);
        match self.frames.iter_mut().rev().find(|frame| frame.contains_key(&name)) {
            Some(frame) => { frame.insert(name, value); },
            None => { self.innermost().insert(name, value); },
        }
    }

    /// Writes straight into the global frame. Only existing globals can be
    /// elevated to.
    pub fn elevate(&mut self, name: &str, value: Value) -> Result<(), ContextError> {
        let name = normalize_name(name);
        match self.frames[0].get_mut(&name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            },
            None => Err(ContextError::NoGlobal(name)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let name = normalize_name(name);
        self.innermost().remove(&name)
    }

    pub(crate) fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Drops the innermost local frame and returns its bindings. The global
    /// frame is never popped.
    pub(crate) fn pop_scope(&mut self) -> Option<HashMap<String, Value>> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Names bound in the global frame, sorted.
    pub fn global_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.frames[0].keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    fn innermost(&mut self) -> &mut HashMap<String, Value> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("hp"), "HP");
        assert_eq!(normalize_name("  hp   base "), "HP_BASE");
        assert_eq!(normalize_name("Hp_Base"), "HP_BASE");
    }

    #[test]
    fn test_lookup_walks_outwards() {
        let mut ctx = Context::new();
        ctx.assign("str", Value::Int(16));
        ctx.push_scope();
        assert_eq!(ctx.lookup("STR").and_then(|v| v.as_int()), Some(16));

        ctx.assign("str", Value::Int(3));
        assert_eq!(ctx.lookup("str").and_then(|v| v.as_int()), Some(3));
        ctx.pop_scope();
        assert_eq!(ctx.lookup("str").and_then(|v| v.as_int()), Some(16));
    }

    #[test]
    fn test_elevate_requires_global() {
        let mut ctx = Context::new();
        ctx.push_scope();
        ctx.assign("local", Value::Int(1));
        assert_eq!(ctx.elevate("local", Value::Int(2)), Err(ContextError::NoGlobal("LOCAL".to_string())));

        ctx.set_global("gold", Value::Int(10));
        ctx.assign("gold", Value::Int(11));
        assert!(ctx.elevate("gold", Value::Int(20)).is_ok());
        assert_eq!(ctx.lookup("gold").and_then(|v| v.as_int()), Some(11));
        assert_eq!(ctx.lookup_global("gold").and_then(|v| v.as_int()), Some(20));
    }

    #[test]
    fn test_host_access() {
        let mut ctx = Context::new();
        ctx.set_global("level", Value::Int(3));
        ctx.set_global("Hit Points", Value::Int(20));
        assert_eq!(ctx.global_names(), vec!["HIT_POINTS", "LEVEL"]);
        assert!(ctx.contains("hit_points"));
        assert!(ctx.remove("LEVEL").is_some());
        assert!(!ctx.contains("level"));
    }

    #[test]
    fn test_global_frame_is_never_popped() {
        let mut ctx = Context::new();
        assert!(ctx.pop_scope().is_none());
        assert_eq!(ctx.depth(), 1);
    }
}

//! Lexical scope / context tree.
//!
//! The scope model is a rooted tree of named, string-keyed contexts rather
//! than a flat slot-indexed namespace stack. The *storage* type
//! (`ContextNode`) is kept separate from the *owning tree* that knows about
//! "current" (`ContextTree`), so node lifetime and traversal stay distinct
//! from the bookkeeping of which node is active.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use ahash::AHashMap;

use crate::{errors::Error, value::Value};

/// A single scope node.
#[derive(Debug)]
pub struct ContextNode {
    path_key: String,
    /// Mutable so `ContextTree::exit` can null it out explicitly. A `Weak` alone does not suffice for this: the parent Rc
    /// typically stays alive (e.g. the root), so `upgrade()` would keep
    /// succeeding unless the pointer itself is reset.
    parent: RefCell<Weak<RefCell<ContextNode>>>,
    children: AHashMap<String, Rc<RefCell<ContextNode>>>,
    slots: AHashMap<String, (Value, String)>,
}

/// Shared handle to a context node.
pub type ContextRef = Rc<RefCell<ContextNode>>;

impl ContextNode {
    fn new(path_key: impl Into<String>, parent: Weak<RefCell<ContextNode>>) -> ContextRef {
        Rc::new(RefCell::new(Self {
            path_key: path_key.into(),
            parent: RefCell::new(parent),
            children: AHashMap::new(),
            slots: AHashMap::new(),
        }))
    }

    #[must_use]
    pub fn path_key(&self) -> &str {
        &self.path_key
    }
}

/// Owns the rooted context tree and tracks which node is "current".
#[derive(Debug)]
pub struct ContextTree {
    root: ContextRef,
    current: ContextRef,
}

impl Default for ContextTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextTree {
    /// Creates a tree with only the root context, `path_key` `"global"`.
    #[must_use]
    pub fn new() -> Self {
        let root = ContextNode::new("global", Weak::new());
        Self { root: Rc::clone(&root), current: root }
    }

    #[must_use]
    pub fn root(&self) -> ContextRef {
        Rc::clone(&self.root)
    }

    #[must_use]
    pub fn current(&self) -> ContextRef {
        Rc::clone(&self.current)
    }

    /// Attaches a new child to the current context, sets it as current, and returns it.
    ///
    /// A pre-existing sibling with the same key is replaced.
    pub fn enter(&mut self, key: impl Into<String>) -> ContextRef {
        let key = key.into();
        let child = ContextNode::new(key.clone(), Rc::downgrade(&self.current));
        self.current.borrow_mut().children.insert(key, Rc::clone(&child));
        self.current = Rc::clone(&child);
        child
    }

    /// Enters a specific parent context rather than the tracked "current" one.
    ///
    /// Used by method/function calls, where the new scope's parent
    /// is the *caller's* current context at the moment of the call, which may
    /// differ from `self.current` once the call has been set up.
    pub fn enter_under(&mut self, parent: &ContextRef, key: impl Into<String>) -> ContextRef {
        let key = key.into();
        let child = ContextNode::new(key.clone(), Rc::downgrade(parent));
        parent.borrow_mut().children.insert(key, Rc::clone(&child));
        self.current = Rc::clone(&child);
        child
    }

    /// Detaches the current context from its parent and makes the parent current.
    ///
    /// No-op at the root.
    pub fn exit(&mut self) {
        let parent = self.current.borrow().parent.borrow().upgrade();
        let Some(parent) = parent else {
            return;
        };
        let key = self.current.borrow().path_key.clone();
        parent.borrow_mut().children.remove(&key);
        *self.current.borrow().parent.borrow_mut() = Weak::new();
        self.current = parent;
    }

    /// Walks from `start` to root, returning the first match.
    #[must_use]
    pub fn get_from(start: &ContextRef, name: &str) -> Option<Value> {
        let mut node = Rc::clone(start);
        loop {
            if let Some((value, _)) = node.borrow().slots.get(name) {
                return Some(value.clone());
            }
            let parent = node.borrow().parent.borrow().upgrade();
            match parent {
                Some(p) => node = p,
                None => return None,
            }
        }
    }

    /// Walks from the current context to root, returning the first match.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        Self::get_from(&self.current, name)
    }

    /// Updates an existing binding in the nearest ancestor that owns it.
    ///
    /// Fails with `Error::undefined_variable` if no ancestor owns `name`.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), Error> {
        let mut node = self.current();
        loop {
            let found = {
                let mut node_mut = node.borrow_mut();
                if let Some(slot) = node_mut.slots.get_mut(name) {
                    slot.0 = value.clone();
                    true
                } else {
                    false
                }
            };
            if found {
                return Ok(());
            }
            let parent = node.borrow().parent.borrow().upgrade();
            match parent {
                Some(p) => node = p,
                None => return Err(Error::undefined_variable(name)),
            }
        }
    }

    /// Unconditionally creates or overwrites a binding in the *current* context.
    pub fn create(&mut self, name: impl Into<String>, value: Value, type_tag: impl Into<String>) {
        self.current.borrow_mut().slots.insert(name.into(), (value, type_tag.into()));
    }

    /// Whether `name` is bound in the current context only (no ancestor walk).
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.current.borrow().slots.contains_key(name)
    }

    /// Removes `name` from the current context only, returning its prior value.
    pub fn delete(&mut self, name: &str) -> Option<Value> {
        self.current.borrow_mut().slots.remove(name).map(|(v, _)| v)
    }

    /// Seeds the root context's slots, used to carry host-registered
    /// variables (`Script::add_variable`) into a freshly built tree at the
    /// start of an `Execute`.
    pub fn seed_root(&mut self, vars: impl IntoIterator<Item = (String, Value, String)>) {
        let mut root = self.root.borrow_mut();
        for (name, value, tag) in vars {
            root.slots.insert(name, (value, tag));
        }
    }

    /// Snapshots the root context's slots, used to persist mutations a
    /// script makes to its globals back into the host-facing `Script` after
    /// an `Execute` completes.
    #[must_use]
    pub fn export_root(&self) -> Vec<(String, Value, String)> {
        self.root.borrow().slots.iter().map(|(k, (v, t))| (k.clone(), v.clone(), t.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_parent_and_global_key() {
        let tree = ContextTree::new();
        assert_eq!(tree.root().borrow().path_key(), "global");
        assert!(tree.root().borrow().parent.borrow().upgrade().is_none());
    }

    #[test]
    fn create_is_visible_from_descendant() {
        let mut tree = ContextTree::new();
        tree.create("x", Value::Int(10), "int");
        tree.enter("block.0");
        assert_eq!(tree.get("x"), Some(Value::Int(10)));
    }

    #[test]
    fn set_without_ancestor_binding_fails() {
        let mut tree = ContextTree::new();
        tree.enter("block.0");
        assert!(tree.set("missing", Value::Int(1)).is_err());
    }

    #[test]
    fn set_updates_nearest_ancestor_not_current() {
        let mut tree = ContextTree::new();
        tree.create("x", Value::Int(1), "int");
        tree.enter("block.0");
        tree.set("x", Value::Int(2)).unwrap();
        tree.exit();
        assert_eq!(tree.get("x"), Some(Value::Int(2)));
    }

    #[test]
    fn shadowing_creates_a_new_binding_in_current_scope() {
        let mut tree = ContextTree::new();
        tree.create("x", Value::Int(1), "int");
        tree.enter("block.0");
        tree.create("x", Value::Int(99), "int");
        assert_eq!(tree.get("x"), Some(Value::Int(99)));
        tree.exit();
        assert_eq!(tree.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn exit_detaches_child_and_breaks_reverse_link() {
        let mut tree = ContextTree::new();
        let child = tree.enter("function.f");
        tree.exit();
        assert!(!tree.root().borrow().children.contains_key("function.f"));
        assert!(child.borrow().parent.borrow().upgrade().is_none());
    }

    #[test]
    fn exit_at_root_is_a_no_op() {
        let mut tree = ContextTree::new();
        tree.exit();
        assert_eq!(tree.current().borrow().path_key(), "global");
    }

    #[test]
    fn has_checks_current_context_only() {
        let mut tree = ContextTree::new();
        tree.create("x", Value::Int(1), "int");
        assert!(tree.has("x"));
        tree.enter("block.0");
        assert!(!tree.has("x"), "has must not walk up to an ancestor");
        tree.create("y", Value::Int(2), "int");
        assert!(tree.has("y"));
    }

    #[test]
    fn delete_removes_binding_from_current_context_only() {
        let mut tree = ContextTree::new();
        tree.create("x", Value::Int(1), "int");
        tree.enter("block.0");
        assert_eq!(tree.delete("x"), None, "x is bound in the parent, not current");
        assert!(!tree.has("x"));
        tree.exit();
        assert!(tree.has("x"), "deleting from the child must not touch the parent's binding");

        assert_eq!(tree.delete("x"), Some(Value::Int(1)));
        assert!(!tree.has("x"));
        assert_eq!(tree.delete("x"), None, "deleting a name twice returns None the second time");
    }
}

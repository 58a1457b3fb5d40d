use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::error::RuntimeResult;
use super::function::NativeFunction;
use super::value::Value;

/// One level of variable bindings. Function values keep the scope they were
/// created in alive.
#[derive(Default)]
pub struct Scope {
    vars: RefCell<FxHashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    fn child(parent: Rc<Scope>) -> Self {
        Self {
            vars: RefCell::default(),
            parent: Some(parent),
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref()?.lookup(name)
    }

    /// Overwrites an existing binding in this scope or an ancestor.
    fn update(&self, name: &str, value: Value) -> Result<(), Value> {
        if let Some(slot) = self.vars.borrow_mut().get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.update(name, value),
            None => Err(value),
        }
    }

    fn bind(&self, name: &str, value: Value) {
        self.vars.borrow_mut().insert(name.to_string(), value);
    }

    fn root(self: &Rc<Self>) -> Rc<Scope> {
        let mut scope = self.clone();
        while let Some(parent) = scope.parent.clone() {
            scope = parent;
        }
        scope
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.vars.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("names", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Name resolution for a running program: a chain of scopes from the
/// innermost (current function call) to the outermost (globals).
#[derive(Debug, Clone, Default)]
pub struct Context {
    scope: Rc<Scope>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a function call whose locals live in a fresh child of
    /// the captured scope.
    pub(crate) fn call_frame(captured: &Rc<Scope>) -> Self {
        Self {
            scope: Rc::new(Scope::child(captured.clone())),
        }
    }

    pub(crate) fn scope(&self) -> &Rc<Scope> {
        &self.scope
    }

    /// Value bound to `name`, or `null` when nothing binds it.
    pub fn get(&self, name: &str) -> Value {
        self.lookup(name).unwrap_or_default()
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.scope.lookup(name)
    }

    /// Rebinds `name` in the nearest scope that already has it, otherwise
    /// binds it in the innermost scope.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Err(value) = self.scope.update(name, value) {
            self.scope.bind(name, value);
        }
    }

    /// Binds `name` in the innermost scope, shadowing outer bindings.
    pub fn define(&mut self, name: &str, value: Value) {
        self.scope.bind(name, value);
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.scope.root().bind(name, value);
    }

    /// Registers a host function under `name` in the global scope. `arity`
    /// of `None` accepts any number of arguments.
    pub fn register_native(
        &mut self,
        name: &str,
        arity: Option<usize>,
        callback: impl Fn(&[Value]) -> RuntimeResult<Value> + 'static,
    ) {
        let native = NativeFunction::new(name, arity, callback);
        self.set_global(name, Value::Native(Rc::new(native)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_names_read_as_null() {
        let context = Context::new();
        assert_eq!(context.get("nope"), Value::Null);
        assert!(context.lookup("nope").is_none());
    }

    #[test]
    fn set_updates_nearest_binding_and_define_shadows() {
        let mut globals = Context::new();
        globals.set("x", Value::Number(1.0));

        let mut frame = Context::call_frame(globals.scope());
        frame.set("x", Value::Number(2.0));
        assert_eq!(globals.get("x"), Value::Number(2.0));

        frame.define("x", Value::Number(3.0));
        assert_eq!(frame.get("x"), Value::Number(3.0));
        assert_eq!(globals.get("x"), Value::Number(2.0));

        frame.set("fresh", Value::Boolean(true));
        assert_eq!(globals.get("fresh"), Value::Null);
    }

    #[test]
    fn set_global_writes_outermost_scope() {
        let globals = Context::new();
        let outer = Context::call_frame(globals.scope());
        let mut inner = Context::call_frame(outer.scope());
        inner.set_global("g", Value::string("hi"));
        assert_eq!(globals.get("g"), Value::string("hi"));
    }

    #[test]
    fn registers_native_functions_globally() {
        let mut context = Context::new();
        context.register_native("answer", Some(0), |_| Ok(Value::Number(42.0)));
        assert_eq!(context.get("answer").type_name(), "function");
    }
}

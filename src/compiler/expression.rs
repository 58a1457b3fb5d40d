use std::cell::OnceCell;
use std::rc::Rc;

use tracing::debug;

use crate::ast::{
    Accessor, AssignTail, AssignTarget, Expr, FunctionLiteral, TableEntry, TableKeyExpr,
};
use crate::runtime::{
    Context, Function, FunctionBody, RuntimeResult, Table, TableKey, Value, call, ops,
};

use super::Compiler;
use super::compiled::CompiledExpr;

type Fold<Op> = fn(Op, &Value, &Value) -> RuntimeResult<Value>;

enum CompiledKey {
    Fixed(TableKey),
    Computed(CompiledExpr),
}

enum CompiledAccessor {
    Index(CompiledExpr),
    Member(String),
    Call(Vec<CompiledExpr>),
}

enum CompiledTarget {
    Variable(String),
    Index {
        container: CompiledExpr,
        index: CompiledExpr,
    },
    Member {
        container: CompiledExpr,
        name: String,
    },
}

enum CompiledTail {
    Set(CompiledExpr),
    AddAssign(CompiledExpr),
    SubAssign(CompiledExpr),
    Increment,
    Decrement,
}

impl CompiledTail {
    fn apply(
        &self,
        context: &mut Context,
        current: impl FnOnce(&mut Context) -> RuntimeResult<Value>,
    ) -> RuntimeResult<Value> {
        match self {
            CompiledTail::Set(value) => value.evaluate(context),
            CompiledTail::AddAssign(value) => {
                let current = current(context)?;
                ops::add(&current, &value.evaluate(context)?)
            }
            CompiledTail::SubAssign(value) => {
                let current = current(context)?;
                ops::sub(&current, &value.evaluate(context)?)
            }
            CompiledTail::Increment => ops::add(&current(context)?, &Value::Number(1.0)),
            CompiledTail::Decrement => ops::sub(&current(context)?, &Value::Number(1.0)),
        }
    }
}

fn evaluate_all(exprs: &[CompiledExpr], context: &mut Context) -> RuntimeResult<Vec<Value>> {
    let mut values = Vec::with_capacity(exprs.len());
    for expr in exprs {
        values.push(expr.evaluate(context)?);
    }
    Ok(values)
}

impl Compiler {
    pub fn compile_expr(&self, expr: &Expr) -> CompiledExpr {
        match expr {
            Expr::Null => CompiledExpr::new(|_| Ok(Value::Null)),
            Expr::Boolean(value) => {
                let value = *value;
                CompiledExpr::new(move |_| Ok(Value::Boolean(value)))
            }
            Expr::Number(value) => {
                let value = *value;
                CompiledExpr::new(move |_| Ok(Value::Number(value)))
            }
            Expr::String(text) => {
                let text = text.clone();
                CompiledExpr::new(move |_| Ok(Value::String(text.clone())))
            }
            Expr::Variable(name) => {
                let name = name.clone();
                CompiledExpr::new(move |context| Ok(context.get(&name)))
            }
            Expr::List(elements) => self.compile_list(elements),
            Expr::Table(entries) => self.compile_table(entries),
            Expr::Function(literal) => self.compile_function(literal),
            Expr::Unary { op, operand } => {
                let op = *op;
                let operand = self.compile_expr(operand);
                CompiledExpr::new(move |context| ops::unary(op, &operand.evaluate(context)?))
            }
            Expr::Or { first, rest } => {
                let operands = self.compile_operands(first, rest);
                CompiledExpr::new(move |context| {
                    for operand in &operands {
                        let value = operand.evaluate(context)?;
                        if value.is_truthy() {
                            return Ok(value);
                        }
                    }
                    Ok(Value::Boolean(false))
                })
            }
            Expr::And { first, rest } => {
                let operands = self.compile_operands(first, rest);
                CompiledExpr::new(move |context| {
                    let mut last = Value::Null;
                    for operand in &operands {
                        last = operand.evaluate(context)?;
                        if !last.is_truthy() {
                            return Ok(Value::Boolean(false));
                        }
                    }
                    Ok(last)
                })
            }
            Expr::Compare { first, rest } => self.compile_fold(first, rest, ops::compare),
            Expr::Add { first, rest } => self.compile_fold(first, rest, ops::additive),
            Expr::Mul { first, rest } => self.compile_fold(first, rest, ops::multiplicative),
            Expr::Access { target, chain } => self.compile_access(target, chain),
            Expr::Assign { target, tail } => self.compile_assign(target, tail),
            Expr::Global { name, value } => {
                let name = name.clone();
                let value = self.compile_expr(value);
                CompiledExpr::new(move |context| {
                    let value = value.evaluate(context)?;
                    context.set_global(&name, value.clone());
                    Ok(value)
                })
            }
            Expr::Process(process) => {
                let process = self.compile_process(process);
                CompiledExpr::new(move |context| Ok(process.evaluate(context)?.0))
            }
        }
    }

    fn compile_operands(&self, first: &Expr, rest: &[Expr]) -> Vec<CompiledExpr> {
        std::iter::once(first)
            .chain(rest)
            .map(|operand| self.compile_expr(operand))
            .collect()
    }

    /// Left fold over a flat binary tail.
    fn compile_fold<Op: Copy + 'static>(
        &self,
        first: &Expr,
        rest: &[(Op, Expr)],
        apply: Fold<Op>,
    ) -> CompiledExpr {
        let first = self.compile_expr(first);
        let rest: Vec<(Op, CompiledExpr)> = rest
            .iter()
            .map(|(op, operand)| (*op, self.compile_expr(operand)))
            .collect();
        CompiledExpr::new(move |context| {
            let mut acc = first.evaluate(context)?;
            for (op, operand) in &rest {
                let right = operand.evaluate(context)?;
                acc = apply(*op, &acc, &right)?;
            }
            Ok(acc)
        })
    }

    fn compile_list(&self, elements: &[Expr]) -> CompiledExpr {
        let elements: Vec<CompiledExpr> = elements
            .iter()
            .map(|element| self.compile_expr(element))
            .collect();
        if !self.options.cache_list_literals {
            return CompiledExpr::new(move |context| {
                Ok(Value::list(evaluate_all(&elements, context)?))
            });
        }

        // The first evaluation that completes fills the cache and every later
        // one returns that instance. When an element re-enters this literal
        // (a recursive call), the innermost list completes first and wins;
        // the outer list is discarded. A failed evaluation leaves the cache
        // empty.
        let cache = OnceCell::new();
        CompiledExpr::new(move |context| {
            if let Some(list) = cache.get() {
                return Ok(Value::clone(list));
            }
            let list = Value::list(evaluate_all(&elements, context)?);
            debug!(len = elements.len(), "filled list literal cache");
            Ok(cache.get_or_init(|| list).clone())
        })
    }

    fn compile_table(&self, entries: &[TableEntry]) -> CompiledExpr {
        let entries: Vec<(CompiledKey, CompiledExpr)> = entries
            .iter()
            .map(|entry| {
                let key = match &entry.key {
                    TableKeyExpr::Name(name) => CompiledKey::Fixed(TableKey::from(name.as_str())),
                    TableKeyExpr::Computed(key) => CompiledKey::Computed(self.compile_expr(key)),
                };
                (key, self.compile_expr(&entry.value))
            })
            .collect();
        CompiledExpr::new(move |context| {
            let mut table = Table::new();
            for (key, value) in &entries {
                let key = match key {
                    CompiledKey::Fixed(key) => key.clone(),
                    CompiledKey::Computed(key) => TableKey::from_value(&key.evaluate(context)?)?,
                };
                let value = value.evaluate(context)?;
                if !value.is_null() {
                    table.insert(key, value);
                }
            }
            Ok(Value::table(table))
        })
    }

    /// The body is compiled once and shared by every function value the
    /// literal creates.
    fn compile_function(&self, literal: &FunctionLiteral) -> CompiledExpr {
        let name = literal.name.clone();
        let params = literal.params.clone();
        let body = Rc::new(self.compile_block(&literal.body));
        CompiledExpr::new(move |context| {
            let function = Function::new(
                name.clone(),
                params.clone(),
                FunctionBody::Compiled(body.clone()),
                context,
            );
            let value = Value::Function(Rc::new(function));
            if let Some(name) = &name {
                context.set(name, value.clone());
            }
            Ok(value)
        })
    }

    fn compile_access(&self, target: &Expr, chain: &[Accessor]) -> CompiledExpr {
        let target = self.compile_expr(target);
        let chain: Vec<CompiledAccessor> = chain
            .iter()
            .map(|accessor| match accessor {
                Accessor::Index(index) => CompiledAccessor::Index(self.compile_expr(index)),
                Accessor::Member(name) => CompiledAccessor::Member(name.clone()),
                Accessor::Call(args) => {
                    CompiledAccessor::Call(args.iter().map(|arg| self.compile_expr(arg)).collect())
                }
            })
            .collect();
        CompiledExpr::new(move |context| {
            let mut value = target.evaluate(context)?;
            for accessor in &chain {
                value = match accessor {
                    CompiledAccessor::Index(index) => {
                        ops::index(&value, &index.evaluate(context)?)?
                    }
                    CompiledAccessor::Member(name) => ops::member(&value, name)?,
                    CompiledAccessor::Call(args) => call(&value, evaluate_all(args, context)?)?,
                };
            }
            Ok(value)
        })
    }

    fn compile_assign(&self, target: &AssignTarget, tail: &AssignTail) -> CompiledExpr {
        let tail = match tail {
            AssignTail::Set(value) => CompiledTail::Set(self.compile_expr(value)),
            AssignTail::AddAssign(value) => CompiledTail::AddAssign(self.compile_expr(value)),
            AssignTail::SubAssign(value) => CompiledTail::SubAssign(self.compile_expr(value)),
            AssignTail::Increment => CompiledTail::Increment,
            AssignTail::Decrement => CompiledTail::Decrement,
        };
        let target = match target {
            AssignTarget::Variable(name) => CompiledTarget::Variable(name.clone()),
            AssignTarget::Index { container, index } => CompiledTarget::Index {
                container: self.compile_expr(container),
                index: self.compile_expr(index),
            },
            AssignTarget::Member { container, name } => CompiledTarget::Member {
                container: self.compile_expr(container),
                name: name.clone(),
            },
        };
        CompiledExpr::new(move |context| match &target {
            CompiledTarget::Variable(name) => {
                let value = tail.apply(context, |context| Ok(context.get(name)))?;
                context.set(name, value.clone());
                Ok(value)
            }
            CompiledTarget::Index { container, index } => {
                let container = container.evaluate(context)?;
                let index = index.evaluate(context)?;
                let value = tail.apply(context, |_| ops::index(&container, &index))?;
                ops::set_index(&container, &index, value.clone())?;
                Ok(value)
            }
            CompiledTarget::Member { container, name } => {
                let container = container.evaluate(context)?;
                let value = tail.apply(context, |_| ops::member(&container, name))?;
                ops::set_member(&container, name, value.clone())?;
                Ok(value)
            }
        })
    }
}

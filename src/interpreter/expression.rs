use std::rc::Rc;

use crate::ast::{Accessor, AssignTail, AssignTarget, Expr, FunctionLiteral, TableKeyExpr};
use crate::runtime::{
    Context, Function, FunctionBody, RuntimeResult, Table, TableKey, Value, call, ops,
};

use super::Interpreter;

impl Interpreter {
    /// Evaluates an expression for its value. Processes in value position
    /// lose their signal.
    pub fn eval_expr(&self, expr: &Expr, context: &mut Context) -> RuntimeResult<Value> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Boolean(value) => Ok(Value::Boolean(*value)),
            Expr::Number(value) => Ok(Value::Number(*value)),
            Expr::String(text) => Ok(Value::String(text.clone())),
            Expr::Variable(name) => Ok(context.get(name)),
            Expr::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, context)?);
                }
                Ok(Value::list(values))
            }
            Expr::Table(entries) => {
                let mut table = Table::new();
                for entry in entries {
                    let key = match &entry.key {
                        TableKeyExpr::Name(name) => TableKey::from(name.as_str()),
                        TableKeyExpr::Computed(key) => {
                            TableKey::from_value(&self.eval_expr(key, context)?)?
                        }
                    };
                    let value = self.eval_expr(&entry.value, context)?;
                    if !value.is_null() {
                        table.insert(key, value);
                    }
                }
                Ok(Value::table(table))
            }
            Expr::Function(literal) => Ok(self.eval_function(literal, context)),
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand, context)?;
                ops::unary(*op, &operand)
            }
            Expr::Or { first, rest } => {
                for operand in std::iter::once(first.as_ref()).chain(rest) {
                    let value = self.eval_expr(operand, context)?;
                    if value.is_truthy() {
                        return Ok(value);
                    }
                }
                Ok(Value::Boolean(false))
            }
            Expr::And { first, rest } => {
                let mut last = Value::Null;
                for operand in std::iter::once(first.as_ref()).chain(rest) {
                    last = self.eval_expr(operand, context)?;
                    if !last.is_truthy() {
                        return Ok(Value::Boolean(false));
                    }
                }
                Ok(last)
            }
            Expr::Compare { first, rest } => {
                let mut acc = self.eval_expr(first, context)?;
                for (op, operand) in rest {
                    let right = self.eval_expr(operand, context)?;
                    acc = ops::compare(*op, &acc, &right)?;
                }
                Ok(acc)
            }
            Expr::Add { first, rest } => {
                let mut acc = self.eval_expr(first, context)?;
                for (op, operand) in rest {
                    let right = self.eval_expr(operand, context)?;
                    acc = ops::additive(*op, &acc, &right)?;
                }
                Ok(acc)
            }
            Expr::Mul { first, rest } => {
                let mut acc = self.eval_expr(first, context)?;
                for (op, operand) in rest {
                    let right = self.eval_expr(operand, context)?;
                    acc = ops::multiplicative(*op, &acc, &right)?;
                }
                Ok(acc)
            }
            Expr::Access { target, chain } => {
                let mut value = self.eval_expr(target, context)?;
                for accessor in chain {
                    value = self.eval_accessor(&value, accessor, context)?;
                }
                Ok(value)
            }
            Expr::Assign { target, tail } => self.eval_assign(target, tail, context),
            Expr::Global { name, value } => {
                let value = self.eval_expr(value, context)?;
                context.set_global(name, value.clone());
                Ok(value)
            }
            Expr::Process(process) => Ok(self.eval_process(process, context)?.0),
        }
    }

    fn eval_function(&self, literal: &FunctionLiteral, context: &mut Context) -> Value {
        let function = Function::new(
            literal.name.clone(),
            literal.params.clone(),
            FunctionBody::Tree(literal.body.clone()),
            context,
        );
        let value = Value::Function(Rc::new(function));
        if let Some(name) = &literal.name {
            context.set(name, value.clone());
        }
        value
    }

    fn eval_accessor(
        &self,
        value: &Value,
        accessor: &Accessor,
        context: &mut Context,
    ) -> RuntimeResult<Value> {
        match accessor {
            Accessor::Index(index) => {
                let index = self.eval_expr(index, context)?;
                ops::index(value, &index)
            }
            Accessor::Member(name) => ops::member(value, name),
            Accessor::Call(args) => {
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.eval_expr(arg, context)?);
                }
                call(value, evaluated)
            }
        }
    }

    fn eval_assign(
        &self,
        target: &AssignTarget,
        tail: &AssignTail,
        context: &mut Context,
    ) -> RuntimeResult<Value> {
        match target {
            AssignTarget::Variable(name) => {
                let value = self.eval_assign_tail(tail, context, |context| Ok(context.get(name)))?;
                context.set(name, value.clone());
                Ok(value)
            }
            AssignTarget::Index { container, index } => {
                let container = self.eval_expr(container, context)?;
                let index = self.eval_expr(index, context)?;
                let value =
                    self.eval_assign_tail(tail, context, |_| ops::index(&container, &index))?;
                ops::set_index(&container, &index, value.clone())?;
                Ok(value)
            }
            AssignTarget::Member { container, name } => {
                let container = self.eval_expr(container, context)?;
                let value =
                    self.eval_assign_tail(tail, context, |_| ops::member(&container, name))?;
                ops::set_member(&container, name, value.clone())?;
                Ok(value)
            }
        }
    }

    /// Value to write back; `current` reads the target only for compound
    /// tails.
    fn eval_assign_tail(
        &self,
        tail: &AssignTail,
        context: &mut Context,
        current: impl FnOnce(&mut Context) -> RuntimeResult<Value>,
    ) -> RuntimeResult<Value> {
        match tail {
            AssignTail::Set(value) => self.eval_expr(value, context),
            AssignTail::AddAssign(value) => {
                let current = current(context)?;
                ops::add(&current, &self.eval_expr(value, context)?)
            }
            AssignTail::SubAssign(value) => {
                let current = current(context)?;
                ops::sub(&current, &self.eval_expr(value, context)?)
            }
            AssignTail::Increment => ops::add(&current(context)?, &Value::Number(1.0)),
            AssignTail::Decrement => ops::sub(&current(context)?, &Value::Number(1.0)),
        }
    }
}

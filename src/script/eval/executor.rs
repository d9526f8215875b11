use std::collections::HashMap;

use crate::runtime::logging::Logger;
use crate::runtime::SessionConfig;
use crate::script::ast::*;
use crate::script::parser::parse;
use crate::script::parser::token_parsing::{SYMBOL_COUNT, SYMBOL_RANDOM};
use crate::stats::{Bonus, BonusType, Stat};

use super::builtins::{call_builtin, is_builtin};
use super::dice::{roll_dice, Roller};
use super::error::*;
use super::store::{normalize_name, Context};
use super::value::*;

macro_rules! debug_log {
    ($format:literal) => {
        enabled_debug_print!(false, "exec", $format);
    };
    ($format:literal, $($args:expr),*) => {
        enabled_debug_print!(false, "exec", $format, $($args),*);
    };
}

/// Result of a property or pseudo-method: the value it yields and, for
/// methods that change their target, the updated target.
type MemberResult = Result<(Value, Option<Value>), String>;

/// Tree-walking evaluator. Borrows everything it touches for the duration of
/// one script: the scope chain, the output log and the dice roller.
///
/// Every node increments the depth; once it passes `max_depth` the node
/// evaluates to an error instead of recursing further.
pub(crate) struct Executor<'a> {
    ctx: &'a mut Context,
    log: &'a mut dyn Logger,
    roller: &'a mut dyn Roller,
    max_depth: u32,
    echo_pipes: bool,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(
        ctx: &'a mut Context, log: &'a mut dyn Logger, roller: &'a mut dyn Roller, config: &SessionConfig,
    ) -> Self {
        Self{ ctx, log, roller, max_depth: config.max_depth, echo_pipes: config.echo_pipes }
    }

    pub(crate) fn run(&mut self, ast: &Ast) -> Value {
        self.eval(&ast.heap, ast.root, 0, &Caller::Script)
    }

    fn eval_text(&mut self, text: &str, depth: u32, caller: &Caller) -> Value {
        let ast = parse(text);
        self.eval(&ast.heap, ast.root, depth, caller)
    }

    pub(crate) fn eval(&mut self, heap: &Heap, id: ExpressionId, depth: u32, caller: &Caller) -> Value {
        if depth > self.max_depth {
            debug_log!("{}: depth limit hit at {}", caller, heap[id].kind_name());
            return Value::error(depth_limit(self.max_depth));
        }
        let next = depth + 1;

        match &heap[id] {
            Expression::Empty => Value::Int(0),
            Expression::Number(value) => Value::Int(*value),
            Expression::StringLit(text) => Value::Str(text.clone()),
            Expression::Symbol(text) => Value::Symbol(text.clone()),
            Expression::Stored(text) => Value::Expression(text.clone()),
            Expression::Error(message) => Value::error(message.clone()),
            Expression::Var(name) => self.eval_var(name, next, caller),
            Expression::Dice(spec) => self.roll(spec),
            Expression::Unary{ operation, operand } => {
                let value = self.eval(heap, *operand, next, caller);
                apply_unary_operator(*operation, value)
            },
            Expression::Binary{ left, operation: BinaryOperator::GetBonus, right } => {
                self.eval_get_bonus(heap, *left, *right, next, caller)
            },
            Expression::Binary{ left, operation, right } => {
                let lhs = self.eval(heap, *left, next, caller);
                let rhs = self.eval(heap, *right, next, caller);
                apply_binary_operator(*operation, lhs, rhs)
            },
            Expression::Ternary{ test, then, otherwise } => {
                let test = self.eval(heap, *test, next, caller);
                if test.is_error() {
                    return test;
                }
                let branch = if test.is_truthy() { *then } else { *otherwise };
                self.eval(heap, branch, next, caller)
            },
            Expression::Shift{ left, operation, right } => {
                let lhs = self.eval(heap, *left, next, caller);
                let rhs = self.eval(heap, *right, next, caller);
                self.apply_shift(*operation, lhs, rhs, next)
            },
            Expression::KeyValue{ key, value } => {
                // A bare identifier on the left of ':' is the key itself
                let key = match &heap[*key] {
                    Expression::Var(name) => Value::Str(name.clone()),
                    _ => self.eval(heap, *key, next, caller),
                };
                if key.is_error() {
                    return key;
                }
                let value = self.eval(heap, *value, next, caller);
                if value.is_error() {
                    return value;
                }
                Value::KeyValue(KeyValuePair::new(key, value))
            },
            Expression::DiceMultiplier{ dice, count, operation } => {
                self.eval_dice_multiplier(heap, *dice, *count, *operation, next, caller)
            },
            Expression::Key{ container, index } => {
                let container = self.eval(heap, *container, next, caller);
                let index = self.eval(heap, *index, next, caller);
                self.index_value(container, index)
            },
            Expression::Member{ target, name, args } => {
                self.eval_member(heap, *target, name, args.as_deref(), next, caller)
            },
            Expression::AssignVar{ name, operation, value } => {
                self.assign_var(heap, name, *operation, *value, next, caller)
            },
            Expression::AssignKey{ target, operation, value } => {
                self.assign_key(heap, *target, *operation, *value, next, caller)
            },
            Expression::If{ branches } => {
                for (test, body) in branches {
                    if let Some(test) = test {
                        let test = self.eval(heap, *test, next, caller);
                        if test.is_error() {
                            return test;
                        }
                        if !test.is_truthy() {
                            continue;
                        }
                    }
                    return self.eval(heap, *body, next, caller);
                }
                Value::Int(0)
            },
            Expression::For{ variable, iterable, body } => {
                self.eval_for(heap, variable, *iterable, *body, next, caller)
            },
            // Sequencing is not nesting: chained statements stay at this depth
            Expression::Multi{ first, rest } => {
                let first = self.eval(heap, *first, depth, caller);
                if let Value::Error(message) = &first {
                    self.log.write_line(message);
                }
                self.eval(heap, *rest, next, caller)
            },
            Expression::Pipe{ first, rest } => {
                let first = self.eval(heap, *first, depth, caller);
                if self.echo_pipes {
                    self.log.write_line(&first.to_string());
                }
                self.eval(heap, *rest, next, caller)
            },
            Expression::Call{ name, args } => self.eval_call(heap, name, args, next, caller),
            Expression::CallFunction{ callee, args } => {
                match self.eval(heap, *callee, next, caller) {
                    Value::Function(function) => self.call_function(heap, &function, "function", args, next, caller),
                    Value::Error(message) => Value::Error(message),
                    other => Value::error(not_callable(other.kind_name())),
                }
            },
            Expression::Def{ params, body } => {
                Value::Function(FunctionValue{ params: params.clone(), body: body.clone() })
            },
            Expression::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    let value = self.eval(heap, *element, next, caller);
                    if value.is_error() {
                        return value;
                    }
                    values.push(value);
                }
                Value::Array(ArrayValue::new(values))
            },
            Expression::Bonus{ name, bonus_type, value } => {
                self.eval_bonus(heap, *name, *bonus_type, *value, next, caller)
            },
            Expression::ExpressionWrap(operand) => self.eval_expression_wrap(heap, *operand, next, caller),
            Expression::Event(argument) => {
                let value = self.eval(heap, *argument, next, caller);
                self.log.write_line(&format!("event: {}", value));
                value
            },
        }
    }

    // -------------------------------------------------------------------------
    // Variables
    // -------------------------------------------------------------------------

    /// Reads a variable. A stored expression is reduced on every read, an
    /// unknown name is reported to the log and reads as 0.
    fn eval_var(&mut self, name: &str, depth: u32, caller: &Caller) -> Value {
        match self.ctx.lookup(name).cloned() {
            Some(Value::Expression(text)) => {
                self.eval_text(&text, depth, &Caller::Stored(normalize_name(name)))
            },
            Some(value) => value,
            None => {
                let message = not_found(&normalize_name(name));
                debug_log!("{}: {}", caller, message);
                self.log.write_line(&format!("{}.", message));
                Value::Int(0)
            },
        }
    }

    fn assign_var(
        &mut self, heap: &Heap, name: &str, operation: AssignmentOperator, value: ExpressionId,
        depth: u32, caller: &Caller,
    ) -> Value {
        let rhs = self.eval(heap, value, depth, caller);
        if rhs.is_error() {
            return rhs;
        }

        if operation == AssignmentOperator::Elevated {
            return match self.ctx.elevate(name, rhs.clone()) {
                Ok(()) => rhs,
                Err(error) => Value::error(error.to_string()),
            };
        }

        let current = match self.ctx.lookup(name).cloned() {
            Some(Value::Expression(text)) if operation != AssignmentOperator::Set => {
                Some(self.eval_text(&text, depth, &Caller::Stored(normalize_name(name))))
            },
            current => current,
        };
        let updated = match current {
            Some(current) => apply_assignment_operator(operation, current, rhs),
            None if operation == AssignmentOperator::Set => rhs,
            None => return Value::error(not_found(&normalize_name(name))),
        };
        if updated.is_error() {
            return updated;
        }

        self.ctx.assign(name, updated.clone());
        updated
    }

    /// Assignment through a chain of indices, e.g. `party[0]["hp"] -= 4`. The
    /// root variable is read, updated along the path and stored back whole.
    fn assign_key(
        &mut self, heap: &Heap, target: ExpressionId, operation: AssignmentOperator, value: ExpressionId,
        depth: u32, caller: &Caller,
    ) -> Value {
        if operation == AssignmentOperator::Elevated {
            return Value::error("'^=' only applies to variables");
        }

        let mut path = Vec::new();
        let mut node = target;
        let root = loop {
            match &heap[node] {
                Expression::Key{ container, index } => {
                    path.push(*index);
                    node = *container;
                },
                Expression::Var(name) => break name.clone(),
                other => {
                    return Value::error(format!("cannot assign through a {} expression", other.kind_name()));
                },
            }
        };
        path.reverse();

        let mut indices = Vec::with_capacity(path.len());
        for index in path {
            let index = self.eval(heap, index, depth, caller);
            if index.is_error() {
                return index;
            }
            indices.push(index);
        }
        let rhs = self.eval(heap, value, depth, caller);
        if rhs.is_error() {
            return rhs;
        }

        let container = match self.ctx.lookup(&root) {
            Some(container) => container.clone(),
            None => return Value::error(not_found(&normalize_name(&root))),
        };
        match assign_path(container, &indices, operation, rhs) {
            Ok((updated, assigned)) => {
                self.ctx.assign(&root, updated);
                assigned
            },
            Err(error) => error,
        }
    }

    // -------------------------------------------------------------------------
    // Control flow
    // -------------------------------------------------------------------------

    fn eval_for(
        &mut self, heap: &Heap, variable: &str, iterable: ExpressionId, body: ExpressionId,
        depth: u32, caller: &Caller,
    ) -> Value {
        let items: Box<dyn Iterator<Item = Value>> = match self.eval(heap, iterable, depth, caller) {
            Value::Range(range) => Box::new(range.values().map(Value::Int)),
            Value::Array(array) => Box::new(array.into_elements().into_iter()),
            Value::Int(count) => Box::new((1..=count).map(Value::Int)),
            Value::Error(message) => return Value::Error(message),
            other => return Value::error(format!("cannot iterate over {}", other.kind_name())),
        };

        let mut result = Value::Int(0);
        for item in items {
            self.ctx.assign(variable, item);
            result = self.eval(heap, body, depth, caller);
        }
        result
    }

    // -------------------------------------------------------------------------
    // Functions
    // -------------------------------------------------------------------------

    /// `NAME(args)`: a bound function value wins over the builtin of the same
    /// name.
    fn eval_call(&mut self, heap: &Heap, name: &str, args: &[ExpressionId], depth: u32, caller: &Caller) -> Value {
        let function = self.ctx.lookup(name).and_then(|value| value.as_function()).cloned();
        if let Some(function) = function {
            return self.call_function(heap, &function, &normalize_name(name), args, depth, caller);
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(heap, *arg, depth, caller));
        }
        if !is_builtin(name) {
            debug_log!("{}: no function named {}", caller, name);
        }
        call_builtin(name, &values, &mut *self.roller)
    }

    /// Calls a function value with arguments from the call site. Arguments
    /// that are bare variables receive the final value of their parameter if
    /// the body changed it.
    fn call_function(
        &mut self, heap: &Heap, function: &FunctionValue, name: &str, arg_ids: &[ExpressionId],
        depth: u32, caller: &Caller,
    ) -> Value {
        if arg_ids.len() != function.params.len() {
            return Value::error(argument_count(name, function.params.len(), arg_ids.len()));
        }

        let mut args = Vec::with_capacity(arg_ids.len());
        for arg in arg_ids {
            args.push(self.eval(heap, *arg, depth, caller));
        }
        let (result, frame) = self.invoke(function, name, args.clone(), depth);

        for ((arg_id, param), original) in arg_ids.iter().zip(&function.params).zip(&args) {
            let variable = match &heap[*arg_id] {
                Expression::Var(variable) => variable,
                _ => continue,
            };
            if let Some(updated) = frame.get(&normalize_name(param)) {
                if !updated.same_as(original) {
                    debug_log!("copying {} back into {}", param, variable);
                    self.ctx.update(variable, updated.clone());
                }
            }
        }

        result
    }

    /// Evaluates the body in a fresh local frame seeded with the arguments.
    /// Returns the result and the frame as it was when the body finished.
    fn invoke(
        &mut self, function: &FunctionValue, name: &str, args: Vec<Value>, depth: u32,
    ) -> (Value, HashMap<String, Value>) {
        debug_log!("calling {} with {} arguments at depth {}", name, args.len(), depth);
        self.ctx.push_scope();
        for (param, value) in function.params.iter().zip(args) {
            self.ctx.assign(param, value);
        }
        let result = self.eval_text(&function.body, depth, &Caller::Function(name.to_string()));
        let frame = self.ctx.pop_scope().unwrap_or_default();

        (result, frame)
    }

    /// Calls the function given to `<<` or `>>` for one element. It receives
    /// as many of (value, index) as it has parameters.
    fn call_element_function(
        &mut self, function: &FunctionValue, operation: ShiftOperator, value: Value, index: usize, depth: u32,
    ) -> Value {
        let args = match function.params.len() {
            0 => Vec::new(),
            1 => vec![value],
            2 => vec![value, Value::Int(index as i64)],
            n => return Value::error(format!(
                "function for '{}' takes at most 2 parameters but has {}", operation.symbol(), n
            )),
        };
        self.invoke(function, operation.symbol(), args, depth).0
    }

    // -------------------------------------------------------------------------
    // Dice and bonuses
    // -------------------------------------------------------------------------

    fn roll(&mut self, spec: &DiceSpec) -> Value {
        match roll_dice(spec, &mut *self.roller) {
            Ok(roll) => {
                debug_log!("{} rolled {:?}, kept {:?}", spec, roll.rolls, roll.kept);
                Value::Int(roll.total)
            },
            Err(message) => Value::error(message),
        }
    }

    /// `4d6h3 * 6` repeats the roll six times and sums the results, and so
    /// does `4d6h3 / 6`. Without keep modifiers the total is scaled.
    fn eval_dice_multiplier(
        &mut self, heap: &Heap, dice: ExpressionId, count: ExpressionId, operation: BinaryOperator,
        depth: u32, caller: &Caller,
    ) -> Value {
        let repeated = match &heap[dice] {
            Expression::Dice(spec) if spec.has_keep() => Some(*spec),
            _ => None,
        };
        let spec = match repeated {
            Some(spec) => spec,
            None => {
                let total = self.eval(heap, dice, depth, caller);
                let count = self.eval(heap, count, depth, caller);
                return apply_binary_operator(operation, total, count);
            },
        };

        let count = self.eval(heap, count, depth, caller);
        let times = match count.as_int() {
            Some(times) if times >= 0 => times,
            Some(times) => return Value::error(format!("cannot repeat {} {} times", spec, times)),
            None if count.is_error() => return count,
            None => return Value::error(format!("cannot repeat {} by {}", spec, count.kind_name())),
        };

        let mut total: i64 = 0;
        for _ in 0..times {
            let roll = match self.roll(&spec) {
                Value::Int(roll) => roll,
                other => return other,
            };
            total = match total.checked_add(roll) {
                Some(total) => total,
                None => return Value::error(format!("integer overflow repeating {}", spec)),
            };
        }
        Value::Int(total)
    }

    fn eval_bonus(
        &mut self, heap: &Heap, name: ExpressionId, bonus_type: Option<ExpressionId>, value: Option<ExpressionId>,
        depth: u32, caller: &Caller,
    ) -> Value {
        let name = match self.eval(heap, name, depth, caller) {
            Value::Str(text) => text,
            Value::Error(message) => return Value::Error(message),
            other => other.to_string(),
        };
        let bonus_type = match bonus_type {
            Some(bonus_type) => match parse_bonus_type(self.eval(heap, bonus_type, depth, caller)) {
                Ok(bonus_type) => bonus_type,
                Err(error) => return error,
            },
            None => BonusType::Typeless,
        };
        let value = match value {
            Some(value) => match self.eval(heap, value, depth, caller) {
                Value::Error(message) => return Value::Error(message),
                value => match value.as_int() {
                    Some(value) => value,
                    None => return Value::error(format!("a bonus value must be an integer, got {}", value.kind_name())),
                },
            },
            None => 0,
        };

        Value::Bonus(Bonus::new(name, bonus_type, value))
    }

    /// `STAT $ TYPE`: the highest bonus of that type on the stat.
    fn eval_get_bonus(
        &mut self, heap: &Heap, left: ExpressionId, right: ExpressionId, depth: u32, caller: &Caller,
    ) -> Value {
        let stat = match &heap[left] {
            Expression::Var(name) => match self.ctx.lookup(name) {
                Some(Value::Stat(stat)) => stat.clone(),
                Some(_) => return Value::error(format!("{} is not a stat", normalize_name(name))),
                None => return Value::error(not_found(&normalize_name(name))),
            },
            _ => match self.eval(heap, left, depth, caller) {
                Value::Stat(stat) => stat,
                Value::Error(message) => return Value::Error(message),
                other => return Value::error(format!("cannot read a bonus from {}", other.kind_name())),
            },
        };

        match parse_bonus_type(self.eval(heap, right, depth, caller)) {
            Ok(bonus_type) => Value::Int(stat.bonus_of(bonus_type)),
            Err(error) => error,
        }
    }

    // -------------------------------------------------------------------------
    // Deferred expressions
    // -------------------------------------------------------------------------

    /// `#x` turns a value into an unevaluated expression. A variable holding
    /// one is returned as is instead of being reduced.
    fn eval_expression_wrap(&mut self, heap: &Heap, operand: ExpressionId, depth: u32, caller: &Caller) -> Value {
        if let Expression::Var(name) = &heap[operand] {
            if let Some(Value::Expression(text)) = self.ctx.lookup(name) {
                return Value::Expression(text.clone());
            }
        }

        match self.eval(heap, operand, depth, caller) {
            Value::Str(text) => Value::Expression(text),
            value @ Value::Expression(_) | value @ Value::Error(_) => value,
            other => Value::Expression(other.to_string()),
        }
    }

    // -------------------------------------------------------------------------
    // Indexing and members
    // -------------------------------------------------------------------------

    fn index_value(&mut self, container: Value, index: Value) -> Value {
        if container.is_error() {
            return container;
        }
        if index.is_error() {
            return index;
        }

        match (&container, &index) {
            (_, Value::Symbol(symbol)) => self.index_symbol(&container, symbol),
            (Value::Array(array), Value::Int(i)) => match array.normalize_index(*i) {
                Some(position) => array.elements()[position].clone(),
                None => Value::error(out_of_bounds(*i, array.len())),
            },
            (Value::Array(array), Value::Str(key)) => match array.get_key(key) {
                Some(value) => value.clone(),
                None => Value::error(format!("key {} not found", key)),
            },
            (Value::Array(array), Value::Range(range)) => {
                let mut slice = Vec::new();
                for i in range.values() {
                    match array.normalize_index(i) {
                        Some(position) => slice.push(array.elements()[position].clone()),
                        None => return Value::error(out_of_bounds(i, array.len())),
                    }
                }
                Value::Array(ArrayValue::new(slice))
            },
            (Value::Str(text), Value::Int(i)) => {
                let chars: Vec<char> = text.chars().collect();
                match normalize_position(*i, chars.len()) {
                    Some(position) => Value::Str(chars[position].to_string()),
                    None => Value::error(out_of_bounds(*i, chars.len())),
                }
            },
            (Value::Str(text), Value::Range(range)) => {
                let chars: Vec<char> = text.chars().collect();
                let mut slice = String::new();
                for i in range.values() {
                    match normalize_position(i, chars.len()) {
                        Some(position) => slice.push(chars[position]),
                        None => return Value::error(out_of_bounds(i, chars.len())),
                    }
                }
                Value::Str(slice)
            },
            (Value::Range(range), Value::Int(i)) => match range.get(*i) {
                Some(value) => Value::Int(value),
                None => Value::error(format!("index {} is out of bounds for range {}", i, container)),
            },
            _ => Value::error(format!("cannot index {} with {}", container.kind_name(), index.kind_name())),
        }
    }

    /// `[#]` counts, `[~]` picks at random.
    fn index_symbol(&mut self, container: &Value, symbol: &str) -> Value {
        let len = match container {
            Value::Array(array) => array.len() as i64,
            Value::Str(text) => text.chars().count() as i64,
            Value::Range(range) => match range.len() {
                Some(len) => len,
                None => return Value::error(range_too_large(container)),
            },
            other => return Value::error(format!("cannot index {} with {}", other.kind_name(), symbol)),
        };

        if symbol == SYMBOL_COUNT {
            Value::Int(len)
        } else if symbol == SYMBOL_RANDOM {
            if len == 0 {
                return Value::error(format!("cannot pick from an empty {}", container.kind_name()));
            }
            let position = self.roller.roll(0, len - 1);
            self.index_value(container.clone(), Value::Int(position))
        } else {
            Value::error(format!("unknown index symbol '{}'", symbol))
        }
    }

    fn eval_member(
        &mut self, heap: &Heap, target: ExpressionId, name: &str, args: Option<&[ExpressionId]>,
        depth: u32, caller: &Caller,
    ) -> Value {
        // Members of a variable holding a stored expression apply to the
        // expression, not to what it reduces to
        let stored = match &heap[target] {
            Expression::Var(variable) => match self.ctx.lookup(variable) {
                Some(Value::Expression(text)) => Some(Value::Expression(text.clone())),
                _ => None,
            },
            _ => None,
        };
        let value = match stored {
            Some(value) => value,
            None => self.eval(heap, target, depth, caller),
        };
        if value.is_error() {
            return value;
        }

        let mut arg_values = Vec::new();
        for arg in args.unwrap_or(&[]) {
            let arg = self.eval(heap, *arg, depth, caller);
            if arg.is_error() {
                return arg;
            }
            arg_values.push(arg);
        }

        match self.apply_member(value, &name.to_lowercase(), arg_values, depth) {
            Ok((result, Some(updated))) => {
                if let Expression::Var(variable) = &heap[target] {
                    self.ctx.assign(variable, updated);
                }
                result
            },
            Ok((result, None)) => result,
            Err(message) => Value::error(message),
        }
    }

    fn apply_member(&mut self, target: Value, name: &str, args: Vec<Value>, depth: u32) -> MemberResult {
        match target {
            Value::Array(array) => array_member(array, name, args),
            Value::Stat(stat) => stat_member(stat, name, args),
            Value::Expression(text) => match name {
                "text" => {
                    check_args(name, &args, 0)?;
                    Ok((Value::Str(text), None))
                },
                "eval" => {
                    check_args(name, &args, 0)?;
                    Ok((self.eval_text(&text, depth, &Caller::Stored(String::from("expression"))), None))
                },
                _ => {
                    let reduced = self.eval_text(&text, depth, &Caller::Stored(String::from("expression")));
                    if let Value::Error(message) = reduced {
                        return Err(message);
                    }
                    self.apply_member(reduced, name, args, depth)
                },
            },
            other => {
                let result = match (&other, name) {
                    (Value::KeyValue(pair), "key") => (*pair.key).clone(),
                    (Value::KeyValue(pair), "value") => (*pair.value).clone(),
                    (Value::Range(range), "lower") => Value::Int(range.lower),
                    (Value::Range(range), "upper") => Value::Int(range.upper),
                    (Value::Range(range), "len") => match range.len() {
                        Some(len) => Value::Int(len),
                        None => Value::error(range_too_large(&other)),
                    },
                    (Value::Str(text), "len") => Value::Int(text.chars().count() as i64),
                    (Value::Str(text), "upper") => Value::Str(text.to_uppercase()),
                    (Value::Str(text), "lower") => Value::Str(text.to_lowercase()),
                    (Value::Function(function), "params") => {
                        Value::from(function.params.iter().map(|p| Value::from(p.as_str())).collect::<Vec<_>>())
                    },
                    (Value::Bonus(bonus), "name") | (Value::BonusRemoval(bonus), "name") => Value::Str(bonus.name.clone()),
                    (Value::Bonus(bonus), "type") | (Value::BonusRemoval(bonus), "type") => {
                        Value::Str(bonus.bonus_type.name().to_string())
                    },
                    (Value::Bonus(bonus), "value") | (Value::BonusRemoval(bonus), "value") => Value::Int(bonus.value),
                    _ => return Err(not_a_member(name, other.kind_name())),
                };
                check_args(name, &args, 0)?;
                Ok((result, None))
            },
        }
    }

    // -------------------------------------------------------------------------
    // Array operators
    // -------------------------------------------------------------------------

    fn apply_shift(&mut self, operation: ShiftOperator, lhs: Value, rhs: Value, depth: u32) -> Value {
        if lhs.is_error() {
            return lhs;
        }
        if rhs.is_error() {
            return rhs;
        }

        match operation {
            ShiftOperator::Push => self.map_array(lhs, rhs, depth),
            ShiftOperator::Pull => self.filter_array(lhs, rhs, depth),
            ShiftOperator::Append => append_values(lhs, rhs),
            ShiftOperator::Arrange => arrange_array(lhs, rhs),
        }
    }

    /// `array << f` maps every element through `f`, `array << x` adds `x` to
    /// every element. Keys of key-value elements are kept.
    fn map_array(&mut self, lhs: Value, rhs: Value, depth: u32) -> Value {
        let array = match lhs {
            Value::Array(array) => array,
            other => return invalid_shift_operands(ShiftOperator::Push, &other, &rhs),
        };

        let mut mapped = Vec::with_capacity(array.len());
        for (index, element) in array.into_elements().into_iter().enumerate() {
            let (key, value) = split_pair(element);
            let result = match &rhs {
                Value::Function(function) => {
                    self.call_element_function(function, ShiftOperator::Push, value, index, depth)
                },
                other => apply_binary_operator(BinaryOperator::Add, value, other.clone()),
            };
            if result.is_error() {
                return result;
            }
            mapped.push(join_pair(key, result));
        }

        Value::Array(ArrayValue::new(mapped))
    }

    /// `array >> f` keeps the elements for which `f` is truthy, `array >> x`
    /// keeps the elements equal to `x`.
    fn filter_array(&mut self, lhs: Value, rhs: Value, depth: u32) -> Value {
        let array = match lhs {
            Value::Array(array) => array,
            other => return invalid_shift_operands(ShiftOperator::Pull, &other, &rhs),
        };

        let mut kept = Vec::new();
        for (index, element) in array.into_elements().into_iter().enumerate() {
            let keep = match &rhs {
                Value::Function(function) => {
                    let value = element.unwrap_pair().clone();
                    let result = self.call_element_function(function, ShiftOperator::Pull, value, index, depth);
                    if result.is_error() {
                        return result;
                    }
                    result.is_truthy()
                },
                other => values_equal(element.unwrap_pair(), other),
            };
            if keep {
                kept.push(element);
            }
        }

        Value::Array(ArrayValue::new(kept))
    }
}

// -----------------------------------------------------------------------------
// Helpers that need no evaluation state
// -----------------------------------------------------------------------------

fn parse_bonus_type(value: Value) -> Result<BonusType, Value> {
    match value {
        Value::Str(name) => BonusType::from_name(&name)
            .ok_or_else(|| Value::error(format!("unknown bonus type {}", name))),
        Value::Int(ordinal) => BonusType::from_ordinal(ordinal)
            .ok_or_else(|| Value::error(format!("unknown bonus type {}", ordinal))),
        Value::Error(message) => Err(Value::Error(message)),
        other => Err(Value::error(format!("a bonus type must be a name or a number, got {}", other.kind_name()))),
    }
}

fn split_pair(element: Value) -> (Option<Value>, Value) {
    match element {
        Value::KeyValue(pair) => (Some(*pair.key), *pair.value),
        other => (None, other),
    }
}

fn join_pair(key: Option<Value>, value: Value) -> Value {
    match key {
        Some(key) => Value::KeyValue(KeyValuePair::new(key, value)),
        None => value,
    }
}

/// Walks `indices` into nested arrays and applies the assignment at the end.
/// Returns the updated container and the assigned value.
fn assign_path(
    container: Value, indices: &[Value], operation: AssignmentOperator, rhs: Value,
) -> Result<(Value, Value), Value> {
    let (index, rest) = match indices.split_first() {
        Some(split) => split,
        None => {
            let updated = apply_assignment_operator(operation, container, rhs);
            return if updated.is_error() { Err(updated) } else { Ok((updated.clone(), updated)) };
        },
    };

    let mut array = match container {
        Value::Array(array) => array,
        other => {
            return Err(Value::error(format!("cannot assign into {} with {}", other.kind_name(), index.kind_name())));
        },
    };
    let position = match index {
        Value::Int(i) => match array.normalize_index(*i) {
            Some(position) => position,
            None => return Err(Value::error(out_of_bounds(*i, array.len()))),
        },
        Value::Str(key) => match array.key_index(key) {
            Some(position) => position,
            None if rest.is_empty() && operation == AssignmentOperator::Set => {
                array.push(Value::KeyValue(KeyValuePair::new(Value::Str(key.clone()), rhs.clone())));
                return Ok((Value::Array(array), rhs));
            },
            None => return Err(Value::error(format!("key {} not found", key))),
        },
        other => return Err(Value::error(format!("cannot assign into array with {}", other.kind_name()))),
    };

    let element = array.elements()[position].clone();
    // Setting a slot to a pair replaces the element outright
    let replaces_element = rest.is_empty() && operation == AssignmentOperator::Set && rhs.as_pair().is_some();
    let (key, inner) = if replaces_element { (None, element) } else { split_pair(element) };
    let (updated, assigned) = assign_path(inner, rest, operation, rhs)?;
    array.replace(position, join_pair(key, updated));

    Ok((Value::Array(array), assigned))
}

fn invalid_shift_operands(operation: ShiftOperator, lhs: &Value, rhs: &Value) -> Value {
    Value::error(format!("cannot apply '{}' to {} and {}", operation.symbol(), lhs.kind_name(), rhs.kind_name()))
}

/// `>>*`: joins arrays, or adds a single value at the matching end.
fn append_values(lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::Array(mut lhs), Value::Array(rhs)) => {
            lhs.append(rhs);
            Value::Array(lhs)
        },
        (Value::Array(mut lhs), rhs) => {
            lhs.push(rhs);
            Value::Array(lhs)
        },
        (lhs, Value::Array(rhs)) => {
            let mut array = ArrayValue::new(vec![lhs]);
            array.append(rhs);
            Value::Array(array)
        },
        (lhs, rhs) => Value::Array(ArrayValue::new(vec![lhs, rhs])),
    }
}

/// `<>`: a positive direction sorts ascending, a negative one descending and
/// 0 leaves the order alone.
fn arrange_array(lhs: Value, rhs: Value) -> Value {
    let direction = match rhs.as_int() {
        Some(direction) => direction,
        None => return invalid_shift_operands(ShiftOperator::Arrange, &lhs, &rhs),
    };
    let mut elements = match lhs {
        Value::Array(array) => array.into_elements(),
        other => return invalid_shift_operands(ShiftOperator::Arrange, &other, &rhs),
    };

    if direction > 0 {
        elements.sort_by(arrange_order);
    } else if direction < 0 {
        elements.sort_by(|a, b| arrange_order(b, a));
    }
    Value::Array(ArrayValue::new(elements))
}

fn check_args(name: &str, args: &[Value], expected: usize) -> Result<(), String> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(argument_count(name, expected, args.len()))
    }
}

fn changed(value: Value) -> MemberResult {
    Ok((value.clone(), Some(value)))
}

fn array_member(mut array: ArrayValue, name: &str, mut args: Vec<Value>) -> MemberResult {
    match name {
        "len" => {
            check_args(name, &args, 0)?;
            Ok((Value::Int(array.len() as i64), None))
        },
        "keys" => {
            check_args(name, &args, 0)?;
            Ok((Value::from(array.keys()), None))
        },
        "values" => {
            check_args(name, &args, 0)?;
            let values = array.elements().iter().map(|e| e.unwrap_pair().clone()).collect::<Vec<_>>();
            Ok((Value::from(values), None))
        },
        "first" | "last" => {
            check_args(name, &args, 0)?;
            let element = if name == "first" { array.elements().first() } else { array.elements().last() };
            match element {
                Some(element) => Ok((element.clone(), None)),
                None => Err(format!("{} of an empty array", name)),
            }
        },
        "sum" => {
            check_args(name, &args, 0)?;
            let mut total: i64 = 0;
            for element in array.elements() {
                let value = element.unwrap_pair();
                let number = value.as_int().ok_or_else(|| format!("cannot sum {}", value.kind_name()))?;
                total = total.checked_add(number).ok_or_else(|| "integer overflow in sum".to_string())?;
            }
            Ok((Value::Int(total), None))
        },
        "has" => {
            check_args(name, &args, 1)?;
            let needle = &args[0];
            let found = array.elements().iter()
                .any(|e| values_equal(e, needle) || values_equal(e.unwrap_pair(), needle));
            Ok((Value::from_bool(found), None))
        },
        "insert" => {
            check_args(name, &args, 1)?;
            array.push(args.remove(0));
            changed(Value::Array(array))
        },
        "append" => {
            check_args(name, &args, 1)?;
            match args.remove(0) {
                Value::Array(other) => {
                    array.append(other);
                    changed(Value::Array(array))
                },
                other => Err(format!("append expects an array, got {}", other.kind_name())),
            }
        },
        "remove" => {
            check_args(name, &args, 1)?;
            let index = args[0].as_int().ok_or_else(|| format!("remove expects an index, got {}", args[0].kind_name()))?;
            let position = array.normalize_index(index).ok_or_else(|| out_of_bounds(index, array.len()))?;
            array.remove(position);
            changed(Value::Array(array))
        },
        _ => Err(not_a_member(name, "array")),
    }
}

fn stat_member(mut stat: Stat, name: &str, mut args: Vec<Value>) -> MemberResult {
    match name {
        "base" => {
            check_args(name, &args, 0)?;
            Ok((Value::Int(stat.base), None))
        },
        "value" => {
            check_args(name, &args, 0)?;
            match stat.checked_value() {
                Some(value) => Ok((Value::Int(value), None)),
                None => Err(format!("integer overflow in stat with base {}", stat.base)),
            }
        },
        "bonus" => {
            check_args(name, &args, 0)?;
            match stat.checked_bonus_total() {
                Some(total) => Ok((Value::Int(total), None)),
                None => Err(String::from("integer overflow in bonus total")),
            }
        },
        "bonuses" => {
            check_args(name, &args, 0)?;
            let mut bonuses: Vec<Value> = stat.bonuses().iter().cloned().map(Value::Bonus).collect();
            if let Some(bonus) = stat.override_bonus() {
                bonuses.push(Value::Bonus(bonus.clone()));
            }
            Ok((Value::from(bonuses), None))
        },
        "add" | "remove" => {
            check_args(name, &args, 1)?;
            // A removal flips the meaning: `s.add(-b)` removes `b`
            let (bonus, adding) = match args.remove(0) {
                Value::Bonus(bonus) => (bonus, name == "add"),
                Value::BonusRemoval(bonus) => (bonus, name != "add"),
                other => return Err(format!("{} expects a bonus, got {}", name, other.kind_name())),
            };
            if adding {
                stat.add_bonus(bonus);
            } else {
                stat.remove_bonus(&bonus);
            }
            changed(Value::Stat(stat))
        },
        _ => Err(not_a_member(name, "stat")),
    }
}

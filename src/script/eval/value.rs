use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

use crate::script::ast::{AssignmentOperator, BinaryOperator, UnaryOperator};
use crate::stats::{Bonus, Stat};
use super::store::normalize_name;

/// A runtime value. Values are plain data: evaluation copies them in and out
/// of the context and never shares them.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i64),
    Str(String),
    Array(ArrayValue),
    KeyValue(KeyValuePair),
    Range(RangeValue),
    Function(FunctionValue),
    // Unevaluated script text, reduced by parsing and evaluating it
    Expression(String),
    Symbol(String),
    Stat(Stat),
    Bonus(Bonus),
    // `-bonus`: removes the bonus when applied to a stat
    BonusRemoval(Bonus),
    Error(String),
}

macro_rules! impl_value_accessor {
    ($func_name:ident, $variant_name:path, $return_type:ty) => {
        impl Value {
            pub fn $func_name(&self) -> Option<$return_type> {
                match self {
                    $variant_name(v) => Some(v),
                    _ => None,
                }
            }
        }
    }
}

impl_value_accessor!(as_array,    Value::Array,    &ArrayValue);
impl_value_accessor!(as_pair,     Value::KeyValue, &KeyValuePair);
impl_value_accessor!(as_function, Value::Function, &FunctionValue);
impl_value_accessor!(as_stat,     Value::Stat,     &Stat);
impl_value_accessor!(as_bonus,    Value::Bonus,    &Bonus);

impl Value {
    pub fn error<S: Into<String>>(message: S) -> Value {
        Value::Error(message.into())
    }

    pub(crate) fn from_bool(value: bool) -> Value {
        Value::Int(if value { 1 } else { 0 })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::KeyValue(_) => "pair",
            Value::Range(_) => "range",
            Value::Function(_) => "function",
            Value::Expression(_) => "expression",
            Value::Symbol(_) => "symbol",
            Value::Stat(_) => "stat",
            Value::Bonus(_) => "bonus",
            Value::BonusRemoval(_) => "bonus removal",
            Value::Error(_) => "error",
        }
    }

    /// Integer view of numeric values. A stat coerces to its computed value,
    /// `None` when that overflows.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Stat(stat) => stat.checked_value(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            Value::Error(_) => true,
            _ => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Stat(stat) => stat.value() != 0,
            Value::Str(v) => !v.is_empty(),
            Value::Array(array) => !array.is_empty(),
            Value::Error(_) => false,
            _ => true,
        }
    }

    /// Strips a key-value pair down to its value.
    pub fn unwrap_pair(&self) -> &Value {
        match self {
            Value::KeyValue(pair) => &pair.value,
            other => other,
        }
    }

    /// Strict structural equality: unlike `==` a stat only equals a stat with
    /// the same base and bonuses.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Stat(a), Value::Stat(b)) => {
                a.base == b.base && a.bonuses() == b.bonuses() && a.override_bonus() == b.override_bonus()
            },
            (Value::Stat(_), _) | (_, Value::Stat(_)) => false,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.elements.iter().zip(b.elements.iter()).all(|(a, b)| a.same_as(b))
            },
            (Value::KeyValue(a), Value::KeyValue(b)) => a.key.same_as(&b.key) && a.value.same_as(&b.value),
            _ => values_equal(self, other),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Stat> for Value {
    fn from(value: Stat) -> Self {
        Value::Stat(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(elements: Vec<Value>) -> Self {
        Value::Array(ArrayValue::new(elements))
    }
}

/// Ordered elements with an alias table from normalized key to index. The
/// table is derived from the key-value pairs among the elements and rebuilt
/// after every structural change, the first pair with a given key wins.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ArrayValue {
    elements: Vec<Value>,
    keys: Option<BTreeMap<String, usize>>,
}

impl ArrayValue {
    pub fn new(elements: Vec<Value>) -> Self {
        let mut array = Self{ elements, keys: None };
        array.rebuild_keys();
        array
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Value> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    pub fn has_keys(&self) -> bool {
        self.keys.is_some()
    }

    pub fn key_index(&self, key: &str) -> Option<usize> {
        let keys = self.keys.as_ref()?;
        keys.get(&normalize_name(key)).copied()
    }

    /// The value stored under `key`, without its key.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.key_index(key).map(|index| self.elements[index].unwrap_pair())
    }

    /// Keys of the key-value pairs, in element order.
    pub fn keys(&self) -> Vec<Value> {
        self.elements.iter()
            .filter_map(|e| e.as_pair().map(|pair| (*pair.key).clone()))
            .collect()
    }

    /// Inserts a single element at the end. A key-value pair registers its key
    /// unless the key is already taken.
    pub fn push(&mut self, value: Value) {
        let index = self.elements.len();
        if let Some(pair) = value.as_pair() {
            let key = normalize_name(&pair.key_text());
            self.keys.get_or_insert_with(BTreeMap::new).entry(key).or_insert(index);
        }
        self.elements.push(value);
    }

    /// Appends all elements of `other`, merging the alias tables.
    pub fn append(&mut self, other: ArrayValue) {
        self.elements.extend(other.elements);
        self.rebuild_keys();
    }

    pub fn replace(&mut self, index: usize, value: Value) -> bool {
        match self.elements.get_mut(index) {
            Some(element) => {
                *element = value;
                self.rebuild_keys();
                true
            },
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Value> {
        if index >= self.elements.len() {
            return None;
        }
        let removed = self.elements.remove(index);
        self.rebuild_keys();
        Some(removed)
    }

    /// Converts a possibly negative index into a position in the array.
    pub fn normalize_index(&self, index: i64) -> Option<usize> {
        normalize_position(index, self.elements.len())
    }

    fn rebuild_keys(&mut self) {
        let mut keys = BTreeMap::new();
        for (index, element) in self.elements.iter().enumerate() {
            if let Some(pair) = element.as_pair() {
                keys.entry(normalize_name(&pair.key_text())).or_insert(index);
            }
        }
        self.keys = if keys.is_empty() { None } else { Some(keys) };
    }
}

/// Turns an index that may count from the end into a position below `len`.
pub(crate) fn normalize_position(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };
    if index >= 0 && index < len {
        Some(index as usize)
    } else {
        None
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KeyValuePair {
    pub key: Box<Value>,
    pub value: Box<Value>,
}

impl KeyValuePair {
    pub fn new(key: Value, value: Value) -> Self {
        Self{ key: Box::new(key), value: Box::new(value) }
    }

    /// The key as used in an alias table.
    pub fn key_text(&self) -> String {
        match &*self.key {
            Value::Str(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Inclusive range, descending when `lower > upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RangeValue {
    pub lower: i64,
    pub upper: i64,
}

impl RangeValue {
    /// Number of values, `None` when it does not fit in an `i64`.
    pub fn len(&self) -> Option<i64> {
        i64::try_from(self.span()).ok()
    }

    fn span(&self) -> i128 {
        (self.upper as i128 - self.lower as i128).abs() + 1
    }

    /// The value at `index`, negative indices counting from the end.
    pub fn get(&self, index: i64) -> Option<i64> {
        let len = self.span();
        let index = index as i128;
        let index = if index < 0 { len + index } else { index };
        if index < 0 || index >= len {
            return None;
        }
        let lower = self.lower as i128;
        i64::try_from(if self.lower <= self.upper { lower + index } else { lower - index }).ok()
    }

    pub fn values(&self) -> RangeIter {
        RangeIter{
            next: Some(self.lower),
            end: self.upper,
            step: if self.lower <= self.upper { 1 } else { -1 },
        }
    }
}

pub struct RangeIter {
    next: Option<i64>,
    end: i64,
    step: i64,
}

impl Iterator for RangeIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let current = self.next?;
        self.next = if current == self.end { None } else { Some(current + self.step) };
        Some(current)
    }
}

/// A function defined in a script. The body is kept as text and parsed when
/// the function is called.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FunctionValue {
    pub params: Vec<String>,
    pub body: String,
}

// -----------------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------------

/// Renders a value inside a container, where strings are quoted.
fn fmt_nested(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Str(text) => write!(f, "\"{}\"", text),
        other => write!(f, "{}", other),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Array(array) => {
                f.write_str("[")?;
                for (index, element) in array.elements.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    fmt_nested(element, f)?;
                }
                f.write_str("]")
            },
            Value::KeyValue(pair) => {
                fmt_nested(&pair.key, f)?;
                f.write_str(": ")?;
                fmt_nested(&pair.value, f)
            },
            Value::Range(range) => write!(f, "{}..{}", range.lower, range.upper),
            Value::Function(function) => write!(f, "({}) => {{ {} }}", function.params.join(", "), function.body),
            Value::Expression(text) => write!(f, "`{}`", text),
            Value::Symbol(text) => f.write_str(text),
            Value::Stat(stat) => write!(f, "{}", stat),
            Value::Bonus(bonus) => write!(f, "{}", bonus),
            Value::BonusRemoval(bonus) => write!(f, "-({})", bonus),
            Value::Error(message) => f.write_str(message),
        }
    }
}

// -----------------------------------------------------------------------------
// Operators
// -----------------------------------------------------------------------------

/// `==`: numeric values compare by value, everything else structurally.
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    if let (Some(l), Some(r)) = (lhs.as_int(), rhs.as_int()) {
        return l == r;
    }

    match (lhs, rhs) {
        (Value::Str(l), Value::Str(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.elements.iter().zip(r.elements.iter()).all(|(l, r)| values_equal(l, r))
        },
        (Value::KeyValue(l), Value::KeyValue(r)) => values_equal(&l.key, &r.key) && values_equal(&l.value, &r.value),
        (Value::Range(l), Value::Range(r)) => l == r,
        (Value::Function(l), Value::Function(r)) => l == r,
        (Value::Expression(l), Value::Expression(r)) => l == r,
        (Value::Symbol(l), Value::Symbol(r)) => l == r,
        (Value::Bonus(l), Value::Bonus(r)) => l == r,
        (Value::BonusRemoval(l), Value::BonusRemoval(r)) => l == r,
        (Value::Error(l), Value::Error(r)) => l == r,
        _ => false,
    }
}

/// Ordering for relational operators. Only numbers and strings are ordered.
pub fn compare_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (lhs.as_int(), rhs.as_int()) {
        return Some(l.cmp(&r));
    }
    match (lhs, rhs) {
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Total ordering used when sorting arrays: numbers before strings before
/// everything else, which is ordered by its rendering.
pub(crate) fn arrange_order(lhs: &Value, rhs: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Int(_) | Value::Stat(_) => 0,
            Value::Str(_) => 1,
            _ => 2,
        }
    }

    let (lhs, rhs) = (lhs.unwrap_pair(), rhs.unwrap_pair());
    compare_values(lhs, rhs)
        .unwrap_or_else(|| rank(lhs).cmp(&rank(rhs)).then_with(|| lhs.to_string().cmp(&rhs.to_string())))
}

/// A stat whose value overflows cannot take part in arithmetic.
fn stat_overflow(value: &Value) -> Option<Value> {
    match value {
        Value::Stat(stat) if stat.checked_value().is_none() => {
            Some(Value::error(format!("integer overflow in stat with base {}", stat.base)))
        },
        _ => None,
    }
}

fn invalid_operands(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Value {
    Value::error(format!("cannot apply '{}' to {} and {}", op.symbol(), lhs.kind_name(), rhs.kind_name()))
}

fn apply_arithmetic(op: BinaryOperator, lhs: Value, rhs: Value) -> Value {
    let (l, r) = match (lhs.as_int(), rhs.as_int()) {
        (Some(l), Some(r)) => (l, r),
        _ => return invalid_operands(op, &lhs, &rhs),
    };

    let result = match op {
        BinaryOperator::Add => l.checked_add(r),
        BinaryOperator::Subtract => l.checked_sub(r),
        BinaryOperator::Multiply => l.checked_mul(r),
        BinaryOperator::Divide | BinaryOperator::Remainder if r == 0 => {
            return Value::error("division by zero");
        },
        BinaryOperator::Divide => l.checked_div(r),
        BinaryOperator::Remainder => l.checked_rem(r),
        _ => unreachable!("{:?} is not arithmetic", op),
    };

    match result {
        Some(value) => Value::Int(value),
        None => Value::error(format!("integer overflow in {} {} {}", l, op.symbol(), r)),
    }
}

fn apply_add(lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::Array(mut l), Value::Array(r)) => {
            l.append(r);
            Value::Array(l)
        },
        (Value::Array(mut l), r) => {
            l.push(r);
            Value::Array(l)
        },
        (Value::Stat(mut stat), Value::Bonus(bonus)) | (Value::Bonus(bonus), Value::Stat(mut stat)) => {
            stat.add_bonus(bonus);
            Value::Stat(stat)
        },
        (Value::Stat(mut stat), Value::BonusRemoval(bonus)) | (Value::BonusRemoval(bonus), Value::Stat(mut stat)) => {
            stat.remove_bonus(&bonus);
            Value::Stat(stat)
        },
        (Value::Str(mut l), r) => {
            l.push_str(&r.to_string());
            Value::Str(l)
        },
        (l, Value::Str(r)) => Value::Str(format!("{}{}", l, r)),
        (l, r) => apply_arithmetic(BinaryOperator::Add, l, r),
    }
}

fn apply_subtract(lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::Stat(mut stat), Value::Bonus(bonus)) => {
            stat.remove_bonus(&bonus);
            Value::Stat(stat)
        },
        (Value::Stat(mut stat), Value::BonusRemoval(bonus)) => {
            stat.add_bonus(bonus);
            Value::Stat(stat)
        },
        (l, r) => apply_arithmetic(BinaryOperator::Subtract, l, r),
    }
}

/// Applies a binary operator to two evaluated operands. Error operands are
/// passed through, except by the logical operators which read them as false.
/// `GetBonus` needs the context and is handled by the executor.
pub(crate) fn apply_binary_operator(op: BinaryOperator, lhs: Value, rhs: Value) -> Value {
    use BinaryOperator as BO;

    match op {
        BO::LogicalAnd => return Value::from_bool(lhs.is_truthy() && rhs.is_truthy()),
        BO::LogicalOr => return Value::from_bool(lhs.is_truthy() || rhs.is_truthy()),
        _ => {},
    }
    if lhs.is_error() {
        return lhs;
    }
    if rhs.is_error() {
        return rhs;
    }
    if let Some(error) = stat_overflow(&lhs).or_else(|| stat_overflow(&rhs)) {
        return error;
    }

    match op {
        BO::Add => apply_add(lhs, rhs),
        BO::Subtract => apply_subtract(lhs, rhs),
        BO::Multiply | BO::Divide | BO::Remainder => apply_arithmetic(op, lhs, rhs),
        BO::Equality => Value::from_bool(values_equal(&lhs, &rhs)),
        BO::Inequality => Value::from_bool(!values_equal(&lhs, &rhs)),
        BO::LessThan | BO::GreaterThan | BO::LessThanEqual | BO::GreaterThanEqual => {
            let ordering = match compare_values(&lhs, &rhs) {
                Some(ordering) => ordering,
                None => return invalid_operands(op, &lhs, &rhs),
            };
            Value::from_bool(match op {
                BO::LessThan => ordering == Ordering::Less,
                BO::GreaterThan => ordering == Ordering::Greater,
                BO::LessThanEqual => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        },
        BO::HasFlag => match (lhs.as_int(), rhs.as_int()) {
            (Some(l), Some(r)) => Value::from_bool(l & r != 0),
            _ => invalid_operands(op, &lhs, &rhs),
        },
        BO::Range => match (lhs.as_int(), rhs.as_int()) {
            (Some(lower), Some(upper)) => Value::Range(RangeValue{ lower, upper }),
            _ => invalid_operands(op, &lhs, &rhs),
        },
        BO::GetBonus => invalid_operands(op, &lhs, &rhs),
        BO::LogicalAnd | BO::LogicalOr => unreachable!(),
    }
}

pub(crate) fn apply_unary_operator(op: UnaryOperator, value: Value) -> Value {
    if value.is_error() {
        return value;
    }
    if op == UnaryOperator::Negate {
        if let Some(error) = stat_overflow(&value) {
            return error;
        }
    }

    match op {
        UnaryOperator::Negate => match value {
            Value::Bonus(bonus) => Value::BonusRemoval(bonus),
            Value::BonusRemoval(bonus) => Value::Bonus(bonus),
            other => match other.as_int().and_then(|v| v.checked_neg()) {
                Some(negated) => Value::Int(negated),
                None => Value::error(format!("cannot negate {}", other.kind_name())),
            },
        },
        UnaryOperator::Not => Value::from_bool(!value.is_truthy()),
        UnaryOperator::Stringify => Value::Str(value.to_string()),
        UnaryOperator::BaseOf => match value {
            Value::Stat(stat) => Value::Int(stat.base),
            Value::Int(v) => Value::Int(v),
            other => Value::error(format!("{} has no base", other.kind_name())),
        },
    }
}

/// Combines the current value of an assignment target with the right-hand
/// side. Stats keep their bonuses: integers change the base and bonuses are
/// added or removed.
pub(crate) fn apply_assignment_operator(op: AssignmentOperator, current: Value, rhs: Value) -> Value {
    use AssignmentOperator as AO;

    if let Value::Stat(mut stat) = current {
        return match (op, rhs) {
            (AO::Set, Value::Int(base)) => {
                stat.base = base;
                Value::Stat(stat)
            },
            (AO::Set, rhs) => rhs,
            (AO::Added, Value::Bonus(bonus)) => {
                stat.add_bonus(bonus);
                Value::Stat(stat)
            },
            (AO::Subtracted, Value::Bonus(bonus)) | (AO::Added, Value::BonusRemoval(bonus)) => {
                stat.remove_bonus(&bonus);
                Value::Stat(stat)
            },
            (AO::Subtracted, Value::BonusRemoval(bonus)) => {
                stat.add_bonus(bonus);
                Value::Stat(stat)
            },
            (op, Value::Int(amount)) => match op.binary_operator() {
                Some(bin) => match apply_arithmetic(bin, Value::Int(stat.base), Value::Int(amount)) {
                    Value::Int(base) => {
                        stat.base = base;
                        Value::Stat(stat)
                    },
                    error => error,
                },
                None => Value::error(format!("cannot apply '{}' here", op.symbol())),
            },
            (op, rhs) => Value::error(format!("cannot apply '{}' to stat and {}", op.symbol(), rhs.kind_name())),
        };
    }

    match op.binary_operator() {
        Some(bin) => apply_binary_operator(bin, current, rhs),
        None if op == AO::Set => rhs,
        None => Value::error(format!("cannot apply '{}' here", op.symbol())),
    }
}

use std::fmt;
use std::ops::Index;

use super::arena::{Arena, Id};

pub type ExpressionId = Id<Expression>;

/// Owns every node of a parsed script. Nodes refer to their children by id.
pub struct Heap {
    expressions: Arena<Expression>,
}

impl Heap {
    pub fn new() -> Self {
        Self{ expressions: Arena::new() }
    }

    pub fn alloc_expression(&mut self, expression: Expression) -> ExpressionId {
        self.expressions.alloc(expression)
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }
}

impl Index<ExpressionId> for Heap {
    type Output = Expression;
    fn index(&self, index: ExpressionId) -> &Self::Output {
        &self.expressions[index]
    }
}

/// A parsed script: the node heap and the node evaluation starts at.
pub struct Ast {
    pub heap: Heap,
    pub root: ExpressionId,
}

impl Ast {
    pub fn root(&self) -> &Expression {
        &self.heap[self.root]
    }

    /// Collects the messages of every error node in the tree.
    pub fn errors(&self) -> Vec<&str> {
        self.heap.expressions.iter()
            .filter_map(|(_, expression)| match expression {
                Expression::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
    Stringify,
    BaseOf,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "!",
            UnaryOperator::Stringify => "%",
            UnaryOperator::BaseOf => "@",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    LogicalOr,
    LogicalAnd,
    GetBonus,
    Equality,
    Inequality,
    Range,
    HasFlag,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        use BinaryOperator as BO;
        match self {
            BO::LogicalOr => "||",
            BO::LogicalAnd => "&&",
            BO::GetBonus => "$",
            BO::Equality => "==",
            BO::Inequality => "!=",
            BO::Range => "..",
            BO::HasFlag => "&",
            BO::LessThan => "<",
            BO::GreaterThan => ">",
            BO::LessThanEqual => "<=",
            BO::GreaterThanEqual => ">=",
            BO::Add => "+",
            BO::Subtract => "-",
            BO::Multiply => "*",
            BO::Divide => "/",
            BO::Remainder => "%",
        }
    }
}

/// Array operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOperator {
    Push,
    Pull,
    Append,
    Arrange,
}

impl ShiftOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ShiftOperator::Push => "<<",
            ShiftOperator::Pull => ">>",
            ShiftOperator::Append => ">>*",
            ShiftOperator::Arrange => "<>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    Set,
    Added,
    Subtracted,
    Multiplied,
    Divided,
    Remained,
    Elevated,
}

impl AssignmentOperator {
    pub fn symbol(&self) -> &'static str {
        use AssignmentOperator as AO;
        match self {
            AO::Set => "=",
            AO::Added => "+=",
            AO::Subtracted => "-=",
            AO::Multiplied => "*=",
            AO::Divided => "/=",
            AO::Remained => "%=",
            AO::Elevated => "^=",
        }
    }

    /// The arithmetic a compound assignment applies before storing.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        use AssignmentOperator as AO;
        match self {
            AO::Set | AO::Elevated => None,
            AO::Added => Some(BinaryOperator::Add),
            AO::Subtracted => Some(BinaryOperator::Subtract),
            AO::Multiplied => Some(BinaryOperator::Multiply),
            AO::Divided => Some(BinaryOperator::Divide),
            AO::Remained => Some(BinaryOperator::Remainder),
        }
    }
}

/// Parameters of a dice literal such as `4d6r1h3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
    pub reroll: Option<u32>,
    pub keep_highest: Option<u32>,
    pub keep_lowest: Option<u32>,
}

impl DiceSpec {
    /// Parses the text of a dice token. The tokenizer already validated the
    /// shape, so this only fails on malformed input from elsewhere.
    pub fn from_text(text: &str) -> Option<DiceSpec> {
        let d = text.find('d')?;
        let count = if d == 0 { 1 } else { text[..d].parse().ok()? };

        let rest = &text[d + 1..];
        let sides_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let sides = rest[..sides_end].parse().ok()?;

        let mut spec = DiceSpec{ count, sides, reroll: None, keep_highest: None, keep_lowest: None };
        let mut modifiers = &rest[sides_end..];
        while let Some(marker) = modifiers.chars().next() {
            let amount_text = &modifiers[1..];
            let amount_end = amount_text.find(|c: char| !c.is_ascii_digit()).unwrap_or(amount_text.len());
            let amount = amount_text[..amount_end].parse().ok()?;
            match marker {
                'r' => spec.reroll = Some(amount),
                'h' => spec.keep_highest = Some(amount),
                'l' => spec.keep_lowest = Some(amount),
                _ => return None,
            }
            modifiers = &amount_text[amount_end..];
        }

        Some(spec)
    }

    pub fn has_keep(&self) -> bool {
        self.keep_highest.is_some() || self.keep_lowest.is_some()
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if let Some(reroll) = self.reroll {
            write!(f, "r{}", reroll)?;
        }
        if let Some(highest) = self.keep_highest {
            write!(f, "h{}", highest)?;
        }
        if let Some(lowest) = self.keep_lowest {
            write!(f, "l{}", lowest)?;
        }
        Ok(())
    }
}

/// A single node. Each variant is both the structure and, in the executor,
/// the rule used to evaluate it.
#[derive(Debug, Clone)]
pub enum Expression {
    // Leaves
    Empty,
    Number(i64),
    StringLit(String),
    Symbol(String),
    Var(String),
    Dice(DiceSpec),
    Stored(String),
    Error(String),
    // Operators
    Unary{ operation: UnaryOperator, operand: ExpressionId },
    Binary{ left: ExpressionId, operation: BinaryOperator, right: ExpressionId },
    Ternary{ test: ExpressionId, then: ExpressionId, otherwise: ExpressionId },
    Shift{ left: ExpressionId, operation: ShiftOperator, right: ExpressionId },
    KeyValue{ key: ExpressionId, value: ExpressionId },
    DiceMultiplier{ dice: ExpressionId, count: ExpressionId, operation: BinaryOperator },
    // Access
    Key{ container: ExpressionId, index: ExpressionId },
    Member{ target: ExpressionId, name: String, args: Option<Vec<ExpressionId>> },
    // Assignment, `target` of `AssignKey` is always a `Key` node
    AssignVar{ name: String, operation: AssignmentOperator, value: ExpressionId },
    AssignKey{ target: ExpressionId, operation: AssignmentOperator, value: ExpressionId },
    // Control
    If{ branches: Vec<(Option<ExpressionId>, ExpressionId)> },
    For{ variable: String, iterable: ExpressionId, body: ExpressionId },
    Multi{ first: ExpressionId, rest: ExpressionId },
    Pipe{ first: ExpressionId, rest: ExpressionId },
    // Functions
    Call{ name: String, args: Vec<ExpressionId> },
    CallFunction{ callee: ExpressionId, args: Vec<ExpressionId> },
    Def{ params: Vec<String>, body: String },
    // Composites
    Array(Vec<ExpressionId>),
    Bonus{ name: ExpressionId, bonus_type: Option<ExpressionId>, value: Option<ExpressionId> },
    // Deferred forms
    ExpressionWrap(ExpressionId),
    Event(ExpressionId),
}

impl Expression {
    /// Short name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        use Expression as E;
        match self {
            E::Empty => "empty",
            E::Number(_) => "number",
            E::StringLit(_) => "string",
            E::Symbol(_) => "symbol",
            E::Var(_) => "variable",
            E::Dice(_) => "dice",
            E::Stored(_) => "stored expression",
            E::Error(_) => "error",
            E::Unary{ .. } => "unary",
            E::Binary{ .. } => "binary",
            E::Ternary{ .. } => "ternary",
            E::Shift{ .. } => "shift",
            E::KeyValue{ .. } => "pair",
            E::DiceMultiplier{ .. } => "dice multiplier",
            E::Key{ .. } => "index",
            E::Member{ .. } => "member",
            E::AssignVar{ .. } | E::AssignKey{ .. } => "assignment",
            E::If{ .. } => "if",
            E::For{ .. } => "for",
            E::Multi{ .. } => "sequence",
            E::Pipe{ .. } => "pipe",
            E::Call{ .. } => "call",
            E::CallFunction{ .. } => "function call",
            E::Def{ .. } => "function",
            E::Array(_) => "array",
            E::Bonus{ .. } => "bonus",
            E::ExpressionWrap(_) => "expression",
            E::Event(_) => "event",
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            Expression::Error(_) => true,
            _ => false,
        }
    }
}

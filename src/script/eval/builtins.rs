use std::collections::HashMap;

use super::dice::Roller;
use super::value::Value;

type BuiltinFn = fn(&[i64], &mut dyn Roller) -> Result<i64, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }
}

pub(crate) struct Builtin {
    pub arity: Arity,
    pub call: BuiltinFn,
}

lazy_static::lazy_static! {
    /// Functions callable by name from scripts. All of them take and return
    /// integers.
    pub(crate) static ref BUILTINS: HashMap<&'static str, Builtin> = maplit::hashmap!{
        "abs"   => Builtin{ arity: Arity::Exactly(1), call: builtin_abs },
        "clamp" => Builtin{ arity: Arity::Exactly(3), call: builtin_clamp },
        "if"    => Builtin{ arity: Arity::Exactly(2), call: builtin_if },
        "max"   => Builtin{ arity: Arity::AtLeast(1), call: builtin_max },
        "min"   => Builtin{ arity: Arity::AtLeast(1), call: builtin_min },
        "mod"   => Builtin{ arity: Arity::Exactly(1), call: builtin_mod },
        "rand"  => Builtin{ arity: Arity::Exactly(2), call: builtin_rand },
        "bad"   => Builtin{ arity: Arity::Exactly(1), call: builtin_bad },
        "good"  => Builtin{ arity: Arity::Exactly(1), call: builtin_good },
        "tq"    => Builtin{ arity: Arity::Exactly(1), call: builtin_tq },
        "oh"    => Builtin{ arity: Arity::Exactly(1), call: builtin_oh },
        "th"    => Builtin{ arity: Arity::Exactly(1), call: builtin_th },
    };
}

pub(crate) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains_key(name.to_lowercase().as_str())
}

/// Calls the builtin `name`. Unknown names evaluate to 0.
pub(crate) fn call_builtin(name: &str, args: &[Value], roller: &mut dyn Roller) -> Value {
    let lowered = name.to_lowercase();
    let builtin = match BUILTINS.get(lowered.as_str()) {
        Some(builtin) => builtin,
        None => return Value::Int(0),
    };

    if !builtin.arity.accepts(args.len()) {
        let expected = match builtin.arity {
            Arity::Exactly(n) => format!("{}", n),
            Arity::AtLeast(n) => format!("at least {}", n),
        };
        return Value::error(format!("{} expects {} arguments but got {}", lowered, expected, args.len()));
    }

    let mut numbers = Vec::with_capacity(args.len());
    for arg in args {
        if arg.is_error() {
            return arg.clone();
        }
        match arg.as_int() {
            Some(number) => numbers.push(number),
            None => return Value::error(format!("{} expects integer arguments, got {}", lowered, arg.kind_name())),
        }
    }

    match (builtin.call)(&numbers, roller) {
        Ok(result) => Value::Int(result),
        Err(message) => Value::error(format!("{}: {}", lowered, message)),
    }
}

fn overflow() -> String {
    "integer overflow".to_string()
}

fn builtin_abs(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    args[0].checked_abs().ok_or_else(overflow)
}

fn builtin_clamp(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    let (value, min, max) = (args[0], args[1], args[2]);
    if min > max {
        return Err(format!("minimum {} is greater than maximum {}", min, max));
    }
    Ok(value.max(min).min(max))
}

fn builtin_if(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    Ok(if args[0] == 1 { args[1] } else { 0 })
}

fn builtin_max(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    Ok(args.iter().copied().fold(i64::MIN, i64::max))
}

fn builtin_min(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    Ok(args.iter().copied().fold(i64::MAX, i64::min))
}

fn builtin_mod(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    let score = args[0];
    let modifier = if score >= 10 {
        score.checked_sub(10).ok_or_else(overflow)? / 2
    } else {
        score.checked_sub(11).ok_or_else(overflow)? / 2
    };
    Ok(modifier.max(-5))
}

fn builtin_rand(args: &[i64], roller: &mut dyn Roller) -> Result<i64, String> {
    let (lower, upper) = (args[0], args[1]);
    if lower > upper {
        return Err(format!("lower bound {} is greater than upper bound {}", lower, upper));
    }
    Ok(roller.roll(lower, upper))
}

fn builtin_bad(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    Ok(args[0] / 3)
}

fn builtin_good(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    (args[0] / 2).checked_add(2).ok_or_else(overflow)
}

fn builtin_tq(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    let x = args[0];
    Ok(x.checked_add(x / 2).ok_or_else(overflow)? / 2)
}

fn builtin_oh(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    Ok(args[0] / 2)
}

fn builtin_th(args: &[i64], _: &mut dyn Roller) -> Result<i64, String> {
    let x = args[0];
    x.checked_add(x / 2).ok_or_else(overflow)
}

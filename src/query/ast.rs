use crate::value::DynamicValue;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A bare field name; true when the field exists.
    Field(String),
    Literal(Literal),
    Comparison {
        field: String,
        op: CompareOp,
        value: Operand,
    },
    Not(Box<Expr>),
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    NotContains,
    In,
    NotIn,
    Has,
    NotHas,
    After,
    Before,
    Within,
    StartsWith,
    EndsWith,
    Matches,
    Between,
}

impl CompareOp {
    pub fn from_operator(text: &str) -> Option<Self> {
        Some(match text {
            "=" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            _ => return None,
        })
    }

    pub fn from_keyword(text: &str) -> Option<Self> {
        Some(match text {
            "contains" => CompareOp::Contains,
            "in" => CompareOp::In,
            "has" => CompareOp::Has,
            "after" => CompareOp::After,
            "before" => CompareOp::Before,
            "within" => CompareOp::Within,
            "starts_with" => CompareOp::StartsWith,
            "ends_with" => CompareOp::EndsWith,
            "matches" => CompareOp::Matches,
            "between" => CompareOp::Between,
            _ => return None,
        })
    }

    /// The `not <keyword>` form, for the keywords that have one.
    pub fn negated(self) -> Option<Self> {
        match self {
            CompareOp::Contains => Some(CompareOp::NotContains),
            CompareOp::In => Some(CompareOp::NotIn),
            CompareOp::Has => Some(CompareOp::NotHas),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Contains => "contains",
            CompareOp::NotContains => "not contains",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Has => "has",
            CompareOp::NotHas => "not has",
            CompareOp::After => "after",
            CompareOp::Before => "before",
            CompareOp::Within => "within",
            CompareOp::StartsWith => "starts_with",
            CompareOp::EndsWith => "ends_with",
            CompareOp::Matches => "matches",
            CompareOp::Between => "between",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Literal {
    pub fn to_value(&self) -> DynamicValue {
        match self {
            Literal::String(s) => DynamicValue::String(s.clone()),
            Literal::Integer(i) => DynamicValue::Integer(*i),
            Literal::Float(x) => DynamicValue::Float(*x),
            Literal::Boolean(b) => DynamicValue::Boolean(*b),
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    /// Compared as its name unless function resolution is switched on.
    Call { name: String, args: Vec<Expr> },
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Boolean(b) => write!(f, "{}", b),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expr]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    f.write_str(")")
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(lit) => write!(f, "{}", lit),
            Operand::Call { name, args } => write_call(f, name, args),
        }
    }
}

/// Fully parenthesized rendering, used by `--explain` and in debug logs.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Field(name) => f.write_str(name),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Comparison { field, op, value } => {
                write!(f, "({} {} {})", field, op.as_str(), value)
            }
            Expr::Not(inner) => write!(f, "(NOT {})", inner),
            Expr::Logical { left, op, right } => {
                let op = match op {
                    LogicalOp::And => "AND",
                    LogicalOp::Or => "OR",
                };
                write!(f, "({} {} {})", left, op, right)
            }
            Expr::FunctionCall { name, args } => write_call(f, name, args),
        }
    }
}

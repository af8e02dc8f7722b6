//! Property-value expression AST.

use std::fmt;

use super::selector::Selector;
use crate::expr::format_number;

/// Binary operators, grouped by precedence level in the value grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A parsed property-value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprAst {
    /// A keyword or string value, emitted verbatim.
    Literal(String),
    /// A number with an optional unit suffix (`100px`, `1.6`, `50%`).
    Dimension(f64, Option<String>),
    /// A read of a computed property. Without a selector it reads the current
    /// element's own style scope.
    PropertyRef {
        selector: Option<Selector>,
        property: String,
    },
    /// `Group(var)`: a variable from a `Var` template.
    VarRef { group: String, var: String },
    Binary {
        op: BinaryOp,
        left: Box<ExprAst>,
        right: Box<ExprAst>,
    },
    /// `cond ? if_true : if_false`
    Conditional {
        cond: Box<ExprAst>,
        if_true: Box<ExprAst>,
        if_false: Box<ExprAst>,
    },
}

impl ExprAst {
    pub fn literal(value: impl Into<String>) -> Self {
        ExprAst::Literal(value.into())
    }

    /// A dimension; an empty unit is stored as `None`.
    pub fn dim(value: f64, unit: &str) -> Self {
        let unit = (!unit.is_empty()).then(|| unit.to_owned());
        ExprAst::Dimension(value, unit)
    }

    /// A unitless number.
    pub fn number(value: f64) -> Self {
        ExprAst::Dimension(value, None)
    }

    /// A reference to a property of the current element.
    pub fn prop(property: impl Into<String>) -> Self {
        ExprAst::PropertyRef {
            selector: None,
            property: property.into(),
        }
    }

    /// A reference to a property of the element addressed by `selector`.
    pub fn prop_of(selector: Selector, property: impl Into<String>) -> Self {
        ExprAst::PropertyRef {
            selector: Some(selector),
            property: property.into(),
        }
    }

    pub fn var(group: impl Into<String>, var: impl Into<String>) -> Self {
        ExprAst::VarRef {
            group: group.into(),
            var: var.into(),
        }
    }

    pub fn binary(op: BinaryOp, left: ExprAst, right: ExprAst) -> Self {
        ExprAst::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn conditional(cond: ExprAst, if_true: ExprAst, if_false: ExprAst) -> Self {
        ExprAst::Conditional {
            cond: Box::new(cond),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// Visit this node and every sub-expression, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ExprAst)) {
        visit(self);
        match self {
            ExprAst::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            ExprAst::Conditional {
                cond,
                if_true,
                if_false,
            } => {
                cond.walk(visit);
                if_true.walk(visit);
                if_false.walk(visit);
            }
            ExprAst::Literal(_)
            | ExprAst::Dimension(..)
            | ExprAst::PropertyRef { .. }
            | ExprAst::VarRef { .. } => {}
        }
    }

    /// Every property reference that carries a selector, in source order.
    pub fn cross_refs(&self) -> Vec<(&Selector, &str)> {
        let mut refs = Vec::new();
        self.walk(&mut |node| {
            if let ExprAst::PropertyRef {
                selector: Some(selector),
                property,
            } = node
            {
                refs.push((selector, property.as_str()));
            }
        });
        refs
    }
}

/// Renders the expression back in source form.
impl fmt::Display for ExprAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprAst::Literal(value) => f.write_str(value),
            ExprAst::Dimension(value, unit) => {
                write!(f, "{}{}", format_number(*value), unit.as_deref().unwrap_or(""))
            }
            ExprAst::PropertyRef {
                selector: Some(selector),
                property,
            } => write!(f, "{selector}.{property}"),
            ExprAst::PropertyRef {
                selector: None,
                property,
            } => f.write_str(property),
            ExprAst::VarRef { group, var } => write!(f, "{group}({var})"),
            ExprAst::Binary { op, left, right } => {
                write_operand(f, left)?;
                write!(f, " {op} ")?;
                write_operand(f, right)
            }
            ExprAst::Conditional {
                cond,
                if_true,
                if_false,
            } => write!(f, "{cond} ? {if_true} : {if_false}"),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &ExprAst) -> fmt::Result {
    match operand {
        ExprAst::Binary { .. } | ExprAst::Conditional { .. } => write!(f, "({operand})"),
        _ => write!(f, "{operand}"),
    }
}

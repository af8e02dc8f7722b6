//! `Group(var)` resolution and substitution.

use crate::ast::{DefBody, DefKind, ExprAst, PropertyMap};

use super::expander::{Expander, Frame};
use super::ExpandError;

impl Expander<'_> {
    /// Resolve `Group(var)` from the current scope, substituting any variable
    /// references inside the bound value. Each variable pushes its own frame,
    /// so a variable bound to itself through other variables is a cycle.
    pub fn resolve_var(&mut self, group: &str, var: &str) -> Result<ExprAst, ExpandError> {
        let scope = self.scope().to_vec();
        let Some(resolved) = self.table().lookup_scoped(group, DefKind::Var, &scope) else {
            return Err(ExpandError::UndefinedTemplate {
                name: group.to_owned(),
                kind: DefKind::Var,
                namespace: scope,
            });
        };
        let bound = match resolved.definition.body() {
            DefBody::Var(vars) => vars.get(var),
            DefBody::Style(_) | DefBody::Element(_) => None,
        };
        let Some(bound) = bound else {
            return Err(ExpandError::UndefinedVariable {
                group: group.to_owned(),
                var: var.to_owned(),
            });
        };

        let frame = Frame::new(DefKind::Var, format!("{group}({var})"), resolved.namespace);
        self.with_frame(frame, |this| {
            let mut value = bound.clone();
            this.substitute(&mut value)?;
            Ok(value)
        })
    }

    /// Replace every `VarRef` in `expr` with its resolved value.
    pub(super) fn substitute(&mut self, expr: &mut ExprAst) -> Result<(), ExpandError> {
        match expr {
            ExprAst::VarRef { group, var } => {
                let value = self.resolve_var(group, var)?;
                *expr = value;
            }
            ExprAst::Binary { left, right, .. } => {
                self.substitute(left)?;
                self.substitute(right)?;
            }
            ExprAst::Conditional {
                cond,
                if_true,
                if_false,
            } => {
                self.substitute(cond)?;
                self.substitute(if_true)?;
                self.substitute(if_false)?;
            }
            ExprAst::Literal(_) | ExprAst::Dimension(..) | ExprAst::PropertyRef { .. } => {}
        }
        Ok(())
    }

    pub(super) fn substitute_map(&mut self, properties: &mut PropertyMap) -> Result<(), ExpandError> {
        for expr in properties.values_mut() {
            self.substitute(expr)?;
        }
        Ok(())
    }
}

//! Symbol extraction from expression trees.
//!
//! Shared by rate-law parsing and assignment-rule translation. The walk collects every
//! identifier leaf in left-to-right order, duplicates included, and records the name of
//! every construct it cannot handle instead of failing on the first one.

use crate::sbml::mathml::{Expr, Operator};

/// Result of walking an expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolScan {
    /// Identifier leaves in visiting order
    pub symbols: Vec<String>,
    /// Names of the constructs the walk could not handle
    pub unsupported: Vec<String>,
}

impl SymbolScan {
    /// Whether the whole expression was understood.
    pub fn is_complete(&self) -> bool {
        self.unsupported.is_empty()
    }

    /// One line per unhandled construct.
    pub fn message(&self) -> String {
        self.unsupported
            .iter()
            .map(|operator| format!("operator \"{operator}\" is not handled"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Collects the identifiers an expression refers to.
///
/// Lambdas emit their bound variables before the symbols of their body. Powers are accepted
/// but contribute no symbols. Function calls contribute the symbols of their arguments, not
/// the function name.
///
/// # Arguments
/// * `expr` - The expression to walk
///
/// # Returns
/// A [`SymbolScan`] whose `is_complete()` is false if any unsupported construct was met
pub fn collect_symbols(expr: &Expr) -> SymbolScan {
    let mut scan = SymbolScan::default();
    walk(expr, &mut scan);
    scan
}

fn walk(expr: &Expr, scan: &mut SymbolScan) {
    match expr {
        Expr::Number(_) => {}
        Expr::Name(name) => scan.symbols.push(name.clone()),
        Expr::Apply {
            op: Operator::Power,
            ..
        } => {}
        Expr::Apply { args, .. } => args.iter().for_each(|arg| walk(arg, scan)),
        Expr::Lambda { bvars, body } => {
            scan.symbols.extend(bvars.iter().cloned());
            walk(body, scan);
        }
        Expr::Unsupported(operator) => scan.unsupported.push(operator.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(identifier: &str) -> Expr {
        Expr::Name(identifier.to_string())
    }

    fn apply(op: Operator, args: Vec<Expr>) -> Expr {
        Expr::Apply { op, args }
    }

    #[test]
    fn test_symbols_keep_order_and_duplicates() {
        // kf * A * A - kb * B
        let expr = apply(
            Operator::Minus,
            vec![
                apply(Operator::Times, vec![name("kf"), name("A"), name("A")]),
                apply(Operator::Times, vec![name("kb"), name("B")]),
            ],
        );

        let scan = collect_symbols(&expr);

        assert!(scan.is_complete());
        assert_eq!(scan.symbols, vec!["kf", "A", "A", "kb", "B"]);
    }

    #[test]
    fn test_lambda_emits_bound_variables_first() {
        let expr = Expr::Lambda {
            bvars: vec!["x".to_string(), "y".to_string()],
            body: Box::new(apply(Operator::Divide, vec![name("y"), name("k")])),
        };

        assert_eq!(collect_symbols(&expr).symbols, vec!["x", "y", "y", "k"]);
    }

    #[test]
    fn test_power_and_literals_contribute_nothing() {
        let expr = apply(
            Operator::Plus,
            vec![
                apply(Operator::Power, vec![name("A"), Expr::Number(2.0)]),
                Expr::Number(1.0),
                name("B"),
            ],
        );

        let scan = collect_symbols(&expr);
        assert!(scan.is_complete());
        assert_eq!(scan.symbols, vec!["B"]);
    }

    #[test]
    fn test_function_call_walks_arguments_only() {
        let expr = apply(Operator::Call("f".to_string()), vec![name("A"), name("k")]);
        assert_eq!(collect_symbols(&expr).symbols, vec!["A", "k"]);
    }

    #[test]
    fn test_nested_unsupported_marks_scan_incomplete() {
        let expr = apply(
            Operator::Times,
            vec![name("k"), Expr::Unsupported("piecewise".to_string())],
        );

        let scan = collect_symbols(&expr);

        assert!(!scan.is_complete());
        assert_eq!(scan.symbols, vec!["k"]);
        assert!(scan.message().contains("piecewise"));
    }
}

//! Decoding of MathML content markup into expression trees.
//!
//! Only the restricted grammar found in kinetic laws and assignment rules is decoded into
//! dedicated nodes: numbers, identifiers, the four arithmetic operators, power, calls of
//! function definitions and lambdas. Every other construct is kept as
//! [`Expr::Unsupported`] carrying the MathML element name, so that callers can report it.

use std::fmt;

use thiserror::Error;

use crate::sbml::xml::XmlElement;

/// Errors raised while decoding MathML
#[derive(Debug, Error, PartialEq)]
pub enum MathError {
    #[error("MathML block is empty")]
    Empty,

    #[error("MathML number '{0}' cannot be parsed")]
    InvalidNumber(String),

    #[error("MathML <apply> has no operator")]
    MissingOperator,

    #[error("MathML <lambda> has no body")]
    MissingLambdaBody,
}

/// Arithmetic operators the translator understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    /// Call of a function definition
    Call(String),
}

impl Operator {
    fn precedence(&self) -> u8 {
        match self {
            Operator::Plus | Operator::Minus => 1,
            Operator::Times | Operator::Divide => 2,
            Operator::Power => 3,
            Operator::Call(_) => 4,
        }
    }
}

/// A decoded MathML expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Name(String),
    Apply { op: Operator, args: Vec<Expr> },
    Lambda { bvars: Vec<String>, body: Box<Expr> },
    /// Any construct outside the supported grammar, named after its MathML element
    Unsupported(String),
}

impl TryFrom<&XmlElement> for Expr {
    type Error = MathError;

    fn try_from(element: &XmlElement) -> Result<Self, Self::Error> {
        match element.name.as_str() {
            "math" | "semantics" => element
                .children
                .iter()
                .find(|child| child.name != "annotation" && child.name != "annotation-xml")
                .ok_or(MathError::Empty)
                .and_then(Expr::try_from),
            "cn" => decode_number(element).map(Expr::Number),
            "ci" => Ok(Expr::Name(element.text_content().to_string())),
            "apply" => decode_apply(element),
            "lambda" => decode_lambda(element),
            "csymbol" => Ok(Expr::Unsupported(
                element
                    .attr("definitionURL")
                    .and_then(|url| url.rsplit('/').next())
                    .unwrap_or("csymbol")
                    .to_string(),
            )),
            other => Ok(Expr::Unsupported(other.to_string())),
        }
    }
}

fn decode_number(element: &XmlElement) -> Result<f64, MathError> {
    let text = element.text_content();
    let invalid = || MathError::InvalidNumber(text.to_string());
    let parts: Vec<&str> = text.split_whitespace().collect();

    match (element.attr("type"), parts.as_slice()) {
        (Some("e-notation"), [mantissa, exponent]) => {
            let mantissa: f64 = mantissa.parse().map_err(|_| invalid())?;
            let exponent: i32 = exponent.parse().map_err(|_| invalid())?;
            Ok(mantissa * 10f64.powi(exponent))
        }
        (Some("rational"), [numerator, denominator]) => {
            let numerator: f64 = numerator.parse().map_err(|_| invalid())?;
            let denominator: f64 = denominator.parse().map_err(|_| invalid())?;
            Ok(numerator / denominator)
        }
        (_, [value]) => value.parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn decode_apply(element: &XmlElement) -> Result<Expr, MathError> {
    let (head, rest) = element
        .children
        .split_first()
        .ok_or(MathError::MissingOperator)?;

    let op = match head.name.as_str() {
        "plus" => Operator::Plus,
        "minus" => Operator::Minus,
        "times" => Operator::Times,
        "divide" => Operator::Divide,
        "power" => Operator::Power,
        "ci" => Operator::Call(head.text_content().to_string()),
        other => return Ok(Expr::Unsupported(other.to_string())),
    };

    let args = rest
        .iter()
        .map(Expr::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Expr::Apply { op, args })
}

fn decode_lambda(element: &XmlElement) -> Result<Expr, MathError> {
    let bvars = element
        .children_named("bvar")
        .filter_map(|bvar| bvar.child("ci"))
        .map(|ci| ci.text_content().to_string())
        .collect();

    let body = element
        .children
        .iter()
        .find(|child| child.name != "bvar")
        .ok_or(MathError::MissingLambdaBody)?;

    Ok(Expr::Lambda {
        bvars,
        body: Box::new(Expr::try_from(body)?),
    })
}

// ================================================================================================
// RENDERING
// ================================================================================================

impl Expr {
    /// Renders the expression as infix text, mapping every identifier through `name`.
    ///
    /// Power is written as `^`. Parentheses are only emitted where precedence requires them.
    ///
    /// # Example
    /// ```
    /// # use sbml_chemnet::sbml::mathml::{Expr, Operator};
    /// let expr = Expr::Apply {
    ///     op: Operator::Times,
    ///     args: vec![Expr::Name("k".into()), Expr::Name("A".into())],
    /// };
    /// assert_eq!(expr.render_with(&mut |name| name.to_uppercase()), "K * A");
    /// ```
    pub fn render_with(&self, name: &mut impl FnMut(&str) -> String) -> String {
        self.render(name).0
    }

    fn render(&self, name: &mut impl FnMut(&str) -> String) -> (String, u8) {
        const ATOM: u8 = 4;

        match self {
            Expr::Number(value) => (format!("{value}"), ATOM),
            Expr::Name(identifier) => (name(identifier), ATOM),
            Expr::Unsupported(element) => (element.clone(), ATOM),
            Expr::Lambda { bvars, body } => {
                let mut parts = bvars.clone();
                parts.push(body.render(name).0);
                (format!("lambda({})", parts.join(", ")), ATOM)
            }
            Expr::Apply { op, args } => {
                let precedence = op.precedence();
                match (op, args.as_slice()) {
                    (Operator::Call(function), _) => {
                        let args: Vec<String> = args.iter().map(|arg| arg.render(name).0).collect();
                        (format!("{function}({})", args.join(", ")), ATOM)
                    }
                    (Operator::Plus, []) => ("0".to_string(), ATOM),
                    (Operator::Times, []) => ("1".to_string(), ATOM),
                    (Operator::Plus | Operator::Times, [single]) => single.render(name),
                    (Operator::Minus, [single]) => {
                        (format!("-{}", single.wrapped(name, ATOM)), precedence)
                    }
                    (Operator::Plus, _) | (Operator::Times, _) => {
                        let separator = if *op == Operator::Plus { " + " } else { " * " };
                        let args: Vec<String> = args
                            .iter()
                            .map(|arg| arg.wrapped(name, precedence))
                            .collect();
                        (args.join(separator), precedence)
                    }
                    (Operator::Minus | Operator::Divide | Operator::Power, [left, right]) => {
                        let (symbol, left_min, right_min) = match op {
                            Operator::Minus => (" - ", precedence, precedence + 1),
                            Operator::Divide => (" / ", precedence, precedence + 1),
                            _ => ("^", precedence + 1, precedence),
                        };
                        let left = left.wrapped(name, left_min);
                        let right = right.wrapped(name, right_min);
                        (format!("{left}{symbol}{right}"), precedence)
                    }
                    _ => {
                        let args: Vec<String> = args.iter().map(|arg| arg.render(name).0).collect();
                        let op = format!("{op:?}").to_lowercase();
                        (format!("{op}({})", args.join(", ")), ATOM)
                    }
                }
            }
        }
    }

    /// Renders the expression, parenthesized when it binds weaker than `min_precedence`.
    fn wrapped(&self, name: &mut impl FnMut(&str) -> String, min_precedence: u8) -> String {
        let (text, precedence) = self.render(name);
        if precedence < min_precedence {
            format!("({text})")
        } else {
            text
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_with(&mut |name| name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(math: &str) -> Expr {
        let element = XmlElement::parse(math).unwrap();
        Expr::try_from(&element).unwrap()
    }

    fn name(identifier: &str) -> Expr {
        Expr::Name(identifier.to_string())
    }

    #[test]
    fn test_decode_mass_action_law() {
        let expr = decode(
            r#"<math xmlns="http://www.w3.org/1998/Math/MathML">
                 <apply><minus/>
                   <apply><times/><ci> kf </ci><ci>A</ci></apply>
                   <apply><times/><ci>kb</ci><ci>B</ci></apply>
                 </apply>
               </math>"#,
        );

        assert_eq!(
            expr,
            Expr::Apply {
                op: Operator::Minus,
                args: vec![
                    Expr::Apply {
                        op: Operator::Times,
                        args: vec![name("kf"), name("A")]
                    },
                    Expr::Apply {
                        op: Operator::Times,
                        args: vec![name("kb"), name("B")]
                    },
                ]
            }
        );
        assert_eq!(expr.to_string(), "kf * A - kb * B");
    }

    #[test]
    fn test_decode_numbers() {
        assert_eq!(decode("<cn>2.5</cn>"), Expr::Number(2.5));
        assert_eq!(decode(r#"<cn type="integer"> 3 </cn>"#), Expr::Number(3.0));
        assert_eq!(
            decode(r#"<cn type="e-notation">1<sep/>-3</cn>"#),
            Expr::Number(1e-3)
        );
        assert_eq!(
            decode(r#"<cn type="rational">1<sep/>4</cn>"#),
            Expr::Number(0.25)
        );

        let element = XmlElement::parse("<cn>abc</cn>").unwrap();
        assert_eq!(
            Expr::try_from(&element),
            Err(MathError::InvalidNumber("abc".to_string()))
        );
    }

    #[test]
    fn test_unsupported_constructs_are_named() {
        assert_eq!(
            decode("<math><piecewise><piece><cn>1</cn><true/></piece></piecewise></math>"),
            Expr::Unsupported("piecewise".to_string())
        );
        assert_eq!(
            decode("<apply><exp/><ci>x</ci></apply>"),
            Expr::Unsupported("exp".to_string())
        );
        assert_eq!(
            decode(r#"<csymbol definitionURL="http://www.sbml.org/sbml/symbols/time">t</csymbol>"#),
            Expr::Unsupported("time".to_string())
        );
    }

    #[test]
    fn test_decode_lambda_and_call() {
        let lambda = decode(
            "<lambda><bvar><ci>x</ci></bvar><bvar><ci>y</ci></bvar><apply><plus/><ci>x</ci><ci>y</ci></apply></lambda>",
        );
        assert_eq!(lambda.to_string(), "lambda(x, y, x + y)");

        let call = decode("<apply><ci>f</ci><ci>A</ci><cn>2</cn></apply>");
        assert_eq!(call.to_string(), "f(A, 2)");
    }

    #[test]
    fn test_render_parenthesizes_by_precedence() {
        let sum = Expr::Apply {
            op: Operator::Plus,
            args: vec![name("a"), name("b")],
        };
        let product = Expr::Apply {
            op: Operator::Times,
            args: vec![sum.clone(), name("c")],
        };
        assert_eq!(product.to_string(), "(a + b) * c");

        let difference = Expr::Apply {
            op: Operator::Minus,
            args: vec![name("a"), sum.clone()],
        };
        assert_eq!(difference.to_string(), "a - (a + b)");

        let power = Expr::Apply {
            op: Operator::Power,
            args: vec![sum, Expr::Number(2.0)],
        };
        assert_eq!(power.to_string(), "(a + b)^2");

        let negation = Expr::Apply {
            op: Operator::Minus,
            args: vec![name("a")],
        };
        assert_eq!(negation.to_string(), "-a");
    }

    #[test]
    fn test_render_maps_identifiers() {
        let expr = Expr::Apply {
            op: Operator::Plus,
            args: vec![name("A"), name("B"), name("A")],
        };
        let mut counter = 0;
        let rendered = expr.render_with(&mut |_| {
            let variable = format!("x{counter}");
            counter += 1;
            variable
        });
        assert_eq!(rendered, "x0 + x1 + x2");
    }
}

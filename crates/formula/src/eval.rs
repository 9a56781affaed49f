use std::collections::HashMap;

use thiserror::Error;

/// Variable bindings for one evaluation (`total_fatura`, `percentual_desconto`, ...).
pub type VariableMap = HashMap<String, f64>;

/// Formula evaluation error.
///
/// Never surfaced raw to an end user: the billing calculator catches every
/// variant one layer up and degrades to its built-in default formula.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// The formula references a variable that is not bound in the map.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// The formula is not a syntactically valid arithmetic expression.
    #[error("malformed expression: {0}")]
    Syntax(String),

    /// Evaluation produced NaN or an infinity (e.g. division by zero).
    #[error("expression did not evaluate to a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(formula: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = formula.char_indices().peekable();

    while let Some(&(idx, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                let mut seen_dot = false;
                while let Some(&(_, c)) = chars.peek() {
                    match c {
                        '0'..='9' => literal.push(c),
                        '.' if !seen_dot => {
                            seen_dot = true;
                            literal.push(c);
                        }
                        _ => break,
                    }
                    chars.next();
                }
                let value: f64 = literal
                    .parse()
                    .map_err(|_| FormulaError::Syntax(format!("invalid number literal '{literal}'")))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            _ => {
                return Err(FormulaError::Syntax(format!(
                    "unexpected character '{c}' at offset {idx}"
                )));
            }
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser/evaluator.
///
/// Grammar:
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/') factor)*
/// factor := '-' factor | '(' expr ')' | number | identifier
/// ```
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    vars: &'a VariableMap,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).cloned()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.bump();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.bump();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.bump();
                    value *= self.factor()?;
                }
                Some(Token::Slash) => {
                    self.bump();
                    value /= self.factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, FormulaError> {
        match self.bump() {
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(FormulaError::Syntax("missing closing parenthesis".to_string())),
                }
            }
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Ident(name)) => self
                .vars
                .get(&name)
                .copied()
                .ok_or(FormulaError::UnknownVariable(name)),
            Some(other) => Err(FormulaError::Syntax(format!("unexpected token {other:?}"))),
            None => Err(FormulaError::Syntax("unexpected end of expression".to_string())),
        }
    }
}

/// Evaluate `formula` against the given variable bindings.
///
/// Pure function: no IO, no caching, no side effects. Errors are returned to
/// the caller, never coerced to zero.
pub fn evaluate(formula: &str, vars: &VariableMap) -> Result<f64, FormulaError> {
    let tokens = tokenize(formula)?;
    if tokens.is_empty() {
        return Err(FormulaError::Syntax("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        vars,
    };
    let value = parser.expr()?;

    if parser.pos != tokens.len() {
        return Err(FormulaError::Syntax(format!(
            "trailing input after expression (token {})",
            parser.pos
        )));
    }

    if !value.is_finite() {
        return Err(FormulaError::NonFinite);
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vars(pairs: &[(&str, f64)]) -> VariableMap {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn evaluates_plain_arithmetic() {
        let empty = VariableMap::new();
        assert_eq!(evaluate("2 + 3 * 4", &empty).unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4", &empty).unwrap(), 20.0);
        assert_eq!(evaluate("10 / 4", &empty).unwrap(), 2.5);
        assert_eq!(evaluate("-3 + 5", &empty).unwrap(), 2.0);
        assert_eq!(evaluate("2.5 * 2", &empty).unwrap(), 5.0);
    }

    #[test]
    fn evaluates_the_default_discount_shape() {
        let vars = vars(&[
            ("total_fatura", 1000.0),
            ("iluminacao_publica", 50.0),
            ("outros_valores", 20.0),
            ("percentual_desconto", 20.0),
        ]);
        let result = evaluate(
            "(total_fatura - iluminacao_publica - outros_valores) * (percentual_desconto / 100)",
            &vars,
        )
        .unwrap();
        assert!((result - 186.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_variable_is_an_error_not_zero() {
        let vars = vars(&[("total_fatura", 100.0)]);
        let err = evaluate("total_fatura + valor_inexistente", &vars).unwrap_err();
        assert_eq!(
            err,
            FormulaError::UnknownVariable("valor_inexistente".to_string())
        );
    }

    #[test]
    fn prefix_variable_names_do_not_collide() {
        // `total_fatura` bound, `total_fatura_2` not: whole-token matching must
        // reject the longer name instead of substituting the shorter one.
        let vars = vars(&[("total_fatura", 10.0)]);
        let err = evaluate("total_fatura_2", &vars).unwrap_err();
        assert_eq!(
            err,
            FormulaError::UnknownVariable("total_fatura_2".to_string())
        );
    }

    #[test]
    fn malformed_expressions_are_rejected_as_syntax() {
        let empty = VariableMap::new();
        assert!(matches!(evaluate("", &empty), Err(FormulaError::Syntax(_))));
        assert!(matches!(evaluate("1 +", &empty), Err(FormulaError::Syntax(_))));
        assert!(matches!(evaluate("(1 + 2", &empty), Err(FormulaError::Syntax(_))));
        assert!(matches!(evaluate("1 2", &empty), Err(FormulaError::Syntax(_))));
        assert!(matches!(evaluate("1 ; 2", &empty), Err(FormulaError::Syntax(_))));
        assert!(matches!(evaluate("1..2", &empty), Err(FormulaError::Syntax(_))));
    }

    #[test]
    fn division_by_zero_is_non_finite() {
        let empty = VariableMap::new();
        assert_eq!(evaluate("1 / 0", &empty).unwrap_err(), FormulaError::NonFinite);
        assert_eq!(
            evaluate("(1 / 0) - (1 / 0)", &empty).unwrap_err(),
            FormulaError::NonFinite
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: evaluating the default discount formula textually agrees
        /// with computing it directly, for any reasonable inputs.
        #[test]
        fn textual_and_direct_discount_agree(
            total in 0.0f64..1_000_000.0,
            iluminacao in 0.0f64..10_000.0,
            outros in 0.0f64..10_000.0,
            percentual in 0.0f64..100.0,
        ) {
            let vars = vars(&[
                ("total_fatura", total),
                ("iluminacao_publica", iluminacao),
                ("outros_valores", outros),
                ("percentual_desconto", percentual),
            ]);
            let evaluated = evaluate(
                "(total_fatura - iluminacao_publica - outros_valores) * (percentual_desconto / 100)",
                &vars,
            ).unwrap();
            let direct = (total - iluminacao - outros) * (percentual / 100.0);
            prop_assert!((evaluated - direct).abs() <= 1e-6 * direct.abs().max(1.0));
        }

        /// Property: the evaluator never panics, whatever the input text.
        #[test]
        fn never_panics_on_arbitrary_input(formula in ".{0,64}") {
            let empty = VariableMap::new();
            let _ = evaluate(&formula, &empty);
        }
    }
}

//! Fragment expression parser using nom
//!
//! Grammar:
//! ```text
//! expr       := or_expr
//! or_expr    := and_expr ('or' and_expr)*
//! and_expr   := not_expr ('and' not_expr)*
//! not_expr   := 'not' not_expr | comparison
//! comparison := sum (cmp_op sum)?
//! cmp_op     := '<' | '<=' | '>' | '>=' | '==' | '!=' | 'in' | 'not' 'in'
//! sum        := term (('+' | '-') term)*
//! term       := factor (('*' | '/' | '//' | '%') factor)*
//! factor     := ('-' | '+') factor | power
//! power      := postfix ('**' factor)?
//! postfix    := atom ('[' expr ']')*
//! atom       := number | string | 'True' | 'False' | 'None' | list
//!             | call | identifier | '(' expr ')' | tuple
//! ```
//!
//! Nesting is capped at [`MAX_NESTING`] levels; deeper input is rejected
//! with [`ParseError::TooDeep`] instead of exhausting the stack.

use crate::error::ParseError;
use crate::expr::ast::*;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{map, not, opt, recognize, value, verify},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

const KEYWORDS: &[&str] = &["and", "or", "not", "in", "True", "False", "None"];

/// Deepest nesting of brackets, subscripts, unary signs, `not` and `**`
/// exponents a fragment may use
pub const MAX_NESTING: usize = 32;

/// Parse a fragment expression from a string
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    match expr(input, 0) {
        Ok(("", result)) => Ok(result),
        Ok((remaining, _)) => Err(ParseError::TrailingInput(remaining.to_string())),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => {
            Err(ParseError::TooDeep(MAX_NESTING))
        }
        Err(e) => Err(ParseError::Syntax(format!("{:?}", e))),
    }
}

/// Parse whitespace
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A keyword not followed by an identifier character
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

/// Fail hard once the nesting limit is passed, so no alternative is tried
fn nested(input: &str, depth: usize) -> Result<(), nom::Err<Error<&str>>> {
    if depth > MAX_NESTING {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    Ok(())
}

/// One operand, or a flat node over all of them
fn flatten(first: Expr, rest: Vec<Expr>, node: fn(Vec<Expr>) -> Expr) -> Expr {
    if rest.is_empty() {
        return first;
    }
    let mut operands = Vec::with_capacity(rest.len() + 1);
    operands.push(first);
    operands.extend(rest);
    node(operands)
}

fn arithmetic(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    if rest.is_empty() {
        first
    } else {
        Expr::Binary(Box::new(first), rest)
    }
}

fn expr(input: &str, depth: usize) -> IResult<&str, Expr> {
    nested(input, depth)?;
    or_expr(input, depth)
}

fn or_expr(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input, depth)?;
    let (input, rest) = many0(preceded(ws(keyword("or")), |i| and_expr(i, depth)))(input)?;
    Ok((input, flatten(first, rest, Expr::Or)))
}

fn and_expr(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = not_expr(input, depth)?;
    let (input, rest) = many0(preceded(ws(keyword("and")), |i| not_expr(i, depth)))(input)?;
    Ok((input, flatten(first, rest, Expr::And)))
}

fn not_expr(input: &str, depth: usize) -> IResult<&str, Expr> {
    nested(input, depth)?;
    alt((
        map(preceded(ws(keyword("not")), |i| not_expr(i, depth + 1)), Expr::not),
        |i| comparison(i, depth),
    ))(input)
}

fn comparison(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, lhs) = sum(input, depth)?;
    let (input, rhs) = opt(pair(ws(compare_op), |i| sum(i, depth)))(input)?;
    let result = match rhs {
        Some((op, rhs)) => Expr::compare(lhs, op, rhs),
        None => lhs,
    };
    Ok((input, result))
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Eq, tag("==")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Lt, tag("<")),
        value(CompareOp::Gt, tag(">")),
        value(CompareOp::In, keyword("in")),
        value(
            CompareOp::NotIn,
            pair(keyword("not"), preceded(multispace0, keyword("in"))),
        ),
    ))(input)
}

fn sum(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = term(input, depth)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))),
        |i| term(i, depth),
    ))(input)?;
    Ok((input, arithmetic(first, rest)))
}

fn term(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = factor(input, depth)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::FloorDiv, tag("//")),
            value(BinaryOp::Div, char('/')),
            value(BinaryOp::Mul, terminated(char('*'), not(char('*')))),
            value(BinaryOp::Mod, char('%')),
        ))),
        |i| factor(i, depth),
    ))(input)?;
    Ok((input, arithmetic(first, rest)))
}

fn factor(input: &str, depth: usize) -> IResult<&str, Expr> {
    nested(input, depth)?;
    alt((
        map(preceded(ws(char('-')), |i| factor(i, depth + 1)), |e| {
            Expr::unary(UnaryOp::Neg, e)
        }),
        map(preceded(ws(char('+')), |i| factor(i, depth + 1)), |e| {
            Expr::unary(UnaryOp::Pos, e)
        }),
        |i| power(i, depth),
    ))(input)
}

/// Exponentiation binds tighter than unary minus on its left, so
/// `-2**2` is `-(2**2)`
fn power(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, base) = postfix(input, depth)?;
    let (input, exponent) = opt(preceded(ws(tag("**")), |i| factor(i, depth + 1)))(input)?;
    let result = match exponent {
        Some(exponent) => Expr::binary(base, BinaryOp::Pow, exponent),
        None => base,
    };
    Ok((input, result))
}

/// Each subscript counts as one level, so `v[0][0]...` stays bounded
fn postfix(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (mut input, mut target) = atom(input, depth)?;
    let mut depth = depth;
    loop {
        let (rest, open) = opt(ws(char('[')))(input)?;
        if open.is_none() {
            return Ok((input, target));
        }
        depth += 1;
        let (rest, index) = terminated(move |i| expr(i, depth), ws(char(']')))(rest)?;
        target = Expr::index(target, index);
        input = rest;
    }
}

fn atom(input: &str, depth: usize) -> IResult<&str, Expr> {
    ws(alt((
        map(number, Expr::Literal),
        map(string_literal, |s| Expr::Literal(Literal::Str(s))),
        value(Expr::Literal(Literal::Bool(true)), keyword("True")),
        value(Expr::Literal(Literal::Bool(false)), keyword("False")),
        value(Expr::Literal(Literal::None), keyword("None")),
        map(|i| list_display(i, depth), Expr::List),
        map(|i| function_call(i, depth), Expr::Call),
        map(identifier, Expr::name),
        |i| parenthesized(i, depth),
    )))(input)
}

/// Parse an integer or float literal; a '.' or exponent makes it a float
fn number(input: &str) -> IResult<&str, Literal> {
    let (rest, text) = recognize(pair(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    ))(input)?;

    let literal = if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().ok().map(Literal::Float)
    } else {
        text.parse::<i64>().ok().map(Literal::Int)
    };

    match literal {
        Some(literal) => Ok((rest, literal)),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Digit))),
    }
}

/// Parse a single- or double-quoted string with backslash escapes
fn string_literal(input: &str) -> IResult<&str, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c)) if c == '"' || c == '\'' => c,
        _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
    };

    let mut out = String::new();
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            match c {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' | '\'' | '"' => out.push(c),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Ok((&input[i + c.len_utf8()..], out));
        } else {
            out.push(c);
        }
    }

    // Unterminated string
    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

/// Parse an identifier (starts with letter or underscore, followed by alphanumeric or underscore)
fn identifier(input: &str) -> IResult<&str, &str> {
    verify(
        recognize(pair(take_while1(is_ident_start), take_while(is_ident_char))),
        |name: &str| !KEYWORDS.contains(&name),
    )(input)
}

fn list_display(input: &str, depth: usize) -> IResult<&str, Vec<Expr>> {
    delimited(
        char('['),
        separated_list0(ws(char(',')), |i| expr(i, depth + 1)),
        preceded(opt(ws(char(','))), ws(char(']'))),
    )(input)
}

/// Parenthesized expression, or a tuple when it holds a comma
fn parenthesized(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, _) = char('(')(input)?;
    let (input, mut items) = separated_list0(ws(char(',')), |i| expr(i, depth + 1))(input)?;
    let (input, trailing) = opt(ws(char(',')))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    if items.len() == 1 && trailing.is_none() {
        if let Some(inner) = items.pop() {
            return Ok((input, inner));
        }
    }
    Ok((input, Expr::List(items)))
}

/// Parse a function call
fn function_call(input: &str, depth: usize) -> IResult<&str, FunctionCall> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), |i| expr(i, depth + 1)),
        ws(char(')')),
    )(input)?;

    Ok((input, FunctionCall::new(name, args)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name() {
        assert_eq!(parse_expression("a").unwrap(), Expr::name("a"));
        assert_eq!(parse_expression("  d1 ").unwrap(), Expr::name("d1"));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_expression("42").unwrap(), Expr::int(42));
        assert_eq!(
            parse_expression("2.5").unwrap(),
            Expr::Literal(Literal::Float(2.5))
        );
        assert_eq!(
            parse_expression("1e3").unwrap(),
            Expr::Literal(Literal::Float(1000.0))
        );
        assert_eq!(
            parse_expression(".5").unwrap(),
            Expr::Literal(Literal::Float(0.5))
        );
    }

    #[test]
    fn test_parse_precedence() {
        let result = parse_expression("a+b*c").unwrap();
        assert_eq!(
            result,
            Expr::binary(
                Expr::name("a"),
                BinaryOp::Add,
                Expr::binary(Expr::name("b"), BinaryOp::Mul, Expr::name("c"))
            )
        );
    }

    #[test]
    fn test_parse_nested_parens() {
        let result = parse_expression("(a+b)*(a+b)").unwrap();
        match result {
            Expr::Binary(_, rest) => assert_eq!(rest.len(), 1),
            other => panic!("Expected arithmetic, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_power_and_unary() {
        let result = parse_expression("-2**2").unwrap();
        assert_eq!(
            result,
            Expr::unary(
                UnaryOp::Neg,
                Expr::binary(Expr::int(2), BinaryOp::Pow, Expr::int(2))
            )
        );
    }

    #[test]
    fn test_parse_floor_division() {
        let result = parse_expression("7 // 2").unwrap();
        assert_eq!(result, Expr::binary(Expr::int(7), BinaryOp::FloorDiv, Expr::int(2)));
    }

    #[test]
    fn test_parse_string_with_paren() {
        let result = parse_expression("len(\"ab cd( de\")").unwrap();
        match result {
            Expr::Call(call) => {
                assert_eq!(call.name, "len");
                assert_eq!(
                    call.args,
                    vec![Expr::Literal(Literal::Str("ab cd( de".to_string()))]
                );
            }
            _ => panic!("Expected function call"),
        }
    }

    #[test]
    fn test_parse_string_escapes() {
        assert_eq!(
            parse_expression(r#"'it\'s'"#).unwrap(),
            Expr::Literal(Literal::Str("it's".to_string()))
        );
    }

    #[test]
    fn test_parse_list_and_tuple() {
        assert_eq!(
            parse_expression("[1, 2, 3]").unwrap(),
            Expr::List(vec![Expr::int(1), Expr::int(2), Expr::int(3)])
        );
        assert_eq!(
            parse_expression("(1, 2,)").unwrap(),
            Expr::List(vec![Expr::int(1), Expr::int(2)])
        );
        assert_eq!(parse_expression("[ ]").unwrap(), Expr::List(vec![]));
        assert_eq!(parse_expression("(7)").unwrap(), Expr::int(7));
    }

    #[test]
    fn test_parse_logic() {
        let result = parse_expression("a > 1 and not b or c").unwrap();
        assert!(matches!(result, Expr::Or(ref operands) if operands.len() == 2));
    }

    #[test]
    fn test_parse_membership() {
        assert_eq!(
            parse_expression("x not in v").unwrap(),
            Expr::compare(Expr::name("x"), CompareOp::NotIn, Expr::name("v"))
        );
        // Identifiers that merely start with a keyword are names
        assert_eq!(
            parse_expression("index in nothing").unwrap(),
            Expr::compare(Expr::name("index"), CompareOp::In, Expr::name("nothing"))
        );
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(
            parse_expression("v[-1]").unwrap(),
            Expr::index(Expr::name("v"), Expr::unary(UnaryOp::Neg, Expr::int(1)))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_expression("   "), Err(ParseError::Empty));
        assert!(matches!(
            parse_expression("a b"),
            Err(ParseError::TrailingInput(_))
        ));
        assert!(parse_expression("(a+b").is_err());
        assert!(parse_expression("'open").is_err());
        assert!(parse_expression("*3").is_err());
    }

    #[test]
    fn test_parse_chains_stay_flat() {
        assert_eq!(
            parse_expression("a - b + 1").unwrap(),
            Expr::Binary(
                Box::new(Expr::name("a")),
                vec![(BinaryOp::Sub, Expr::name("b")), (BinaryOp::Add, Expr::int(1))]
            )
        );
        assert_eq!(
            parse_expression("a and b and c").unwrap(),
            Expr::And(vec![Expr::name("a"), Expr::name("b"), Expr::name("c")])
        );

        let long = format!("{}1", "1 + ".repeat(10_000));
        match parse_expression(&long).unwrap() {
            Expr::Binary(_, rest) => assert_eq!(rest.len(), 10_000),
            other => panic!("Expected arithmetic, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nesting_limit() {
        let within = format!("{}a{}", "(".repeat(MAX_NESTING - 1), ")".repeat(MAX_NESTING - 1));
        assert_eq!(parse_expression(&within).unwrap(), Expr::name("a"));

        let too_deep = [
            format!("{}a{}", "(".repeat(500), ")".repeat(500)),
            format!("{}a{}", "[".repeat(500), "]".repeat(500)),
            format!("{}1", "-".repeat(200_000)),
            format!("{}a", "not ".repeat(100)),
            format!("2{}", "**2".repeat(100)),
            format!("v{}", "[0]".repeat(100)),
            format!("len({}1{})", "abs(".repeat(100), ")".repeat(100)),
        ];
        for input in &too_deep {
            assert_eq!(
                parse_expression(input),
                Err(ParseError::TooDeep(MAX_NESTING)),
                "{}",
                &input[..20]
            );
        }
    }
}

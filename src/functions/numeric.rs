//! Numeric functions: `__abs __add __sub __neg __mult __div`.
//!
//! All operands go through the same finite-decimal coercion as the numeric
//! operators. `__add` and `__mult` are variadic and fold left-to-right;
//! both are commutative, so argument order never changes the result.

use crate::expression::error::EvalError;
use crate::expression::evaluator::{format_number, parse_number};

pub(super) fn abs(args: &[String]) -> Result<String, EvalError> {
    Ok(format_number(parse_number(&args[0])?.abs()))
}

pub(super) fn neg(args: &[String]) -> Result<String, EvalError> {
    Ok(format_number(-parse_number(&args[0])?))
}

pub(super) fn add(args: &[String]) -> Result<String, EvalError> {
    let mut sum = 0.0;
    for arg in args {
        sum += parse_number(arg)?;
    }
    Ok(format_number(sum))
}

pub(super) fn mult(args: &[String]) -> Result<String, EvalError> {
    let mut product = 1.0;
    for arg in args {
        product *= parse_number(arg)?;
    }
    Ok(format_number(product))
}

pub(super) fn sub(args: &[String]) -> Result<String, EvalError> {
    Ok(format_number(
        parse_number(&args[0])? - parse_number(&args[1])?,
    ))
}

pub(super) fn div(args: &[String]) -> Result<String, EvalError> {
    let dividend = parse_number(&args[0])?;
    let divisor = parse_number(&args[1])?;
    if divisor == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(format_number(dividend / divisor))
}

#[cfg(test)]
mod tests {
    use crate::functions::call;

    fn f(name: &str, args: &[&str]) -> Result<String, crate::expression::EvalError> {
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        call(name, &owned)
    }

    #[test]
    fn test_abs() {
        assert_eq!(f("__abs", &["-5"]).unwrap(), "5");
        assert_eq!(f("__abs", &["5"]).unwrap(), "5");
        assert_eq!(f("__abs", &["-2.5"]).unwrap(), "2.5");
    }

    #[test]
    fn test_neg() {
        assert_eq!(f("__neg", &["5"]).unwrap(), "-5");
        assert_eq!(f("__neg", &["-5"]).unwrap(), "5");
        assert_eq!(f("__neg", &["0"]).unwrap(), "0");
    }

    #[test]
    fn test_add_folds_all_arguments() {
        assert_eq!(f("__add", &["1"]).unwrap(), "1");
        assert_eq!(f("__add", &["1", "2", "3"]).unwrap(), "6");
        assert_eq!(f("__add", &["1.5", "2.5"]).unwrap(), "4");
    }

    #[test]
    fn test_add_order_does_not_matter() {
        assert_eq!(
            f("__add", &["1", "20", "300"]).unwrap(),
            f("__add", &["300", "1", "20"]).unwrap()
        );
    }

    #[test]
    fn test_mult() {
        assert_eq!(f("__mult", &["7"]).unwrap(), "7");
        assert_eq!(f("__mult", &["2", "3", "4"]).unwrap(), "24");
        assert_eq!(f("__mult", &["0.5", "8"]).unwrap(), "4");
    }

    #[test]
    fn test_sub() {
        assert_eq!(f("__sub", &["10", "4"]).unwrap(), "6");
        assert_eq!(f("__sub", &["4", "10"]).unwrap(), "-6");
    }

    #[test]
    fn test_div() {
        assert_eq!(f("__div", &["10", "4"]).unwrap(), "2.5");
        assert_eq!(f("__div", &["10", "2"]).unwrap(), "5");
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(
            f("__div", &["10", "0"]),
            Err(crate::expression::EvalError::DivisionByZero)
        );
    }

    #[test]
    fn test_non_numeric_argument() {
        assert!(f("__add", &["1", "x"]).is_err());
        assert!(f("__abs", &[""]).is_err());
    }
}

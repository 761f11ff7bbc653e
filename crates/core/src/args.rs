//! Argument parsing for contract functions. Every argument arrives as a UTF-8 string.

use crate::error::{ContractError, ContractResult};

/// Require exactly `N` arguments.
pub fn exact<'a, const N: usize>(function: &str, args: &'a [String]) -> ContractResult<[&'a str; N]> {
    if args.len() != N {
        return Err(ContractError::InvalidArguments(format!(
            "{function} expects {N} argument(s), got {}",
            args.len()
        )));
    }
    Ok(std::array::from_fn(|i| args[i].as_str()))
}

/// Arguments of a create function: `(payload)` or `(id, payload)`.
pub fn create_args<'a>(function: &str, args: &'a [String]) -> ContractResult<(Option<&'a str>, &'a str)> {
    match args {
        [payload] => Ok((None, payload.as_str())),
        [id, payload] => Ok((Some(id.as_str()), payload.as_str())),
        _ => Err(ContractError::InvalidArguments(format!(
            "{function} expects (payload) or (id, payload), got {} argument(s)",
            args.len()
        ))),
    }
}

/// Parse a position into a collection of `len` entries.
///
/// # Errors
///
/// Returns [`ContractError::InvalidIndex`] if `raw` is not a non-negative integer below `len`.
pub fn parse_index(raw: &str, len: usize) -> ContractResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(index) if index < len => Ok(index),
        _ => Err(ContractError::InvalidIndex {
            index: raw.to_string(),
            len,
        }),
    }
}

/// Parse a positive page size.
pub fn parse_page_size(raw: &str) -> ContractResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ContractError::InvalidArguments(format!(
            "page size must be a positive integer, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_checks_count() {
        let args = strings(&["a", "b"]);
        let [first, second] = exact::<2>("F", &args).expect("two args");
        assert_eq!((first, second), ("a", "b"));

        let err = exact::<1>("F", &args).expect_err("wrong count");
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        assert!(err.to_string().contains("F expects 1"));
    }

    #[test]
    fn test_create_args_accepts_one_or_two() {
        let one = strings(&["{}"]);
        assert_eq!(create_args("C", &one).expect("payload only"), (None, "{}"));
        let two = strings(&["P1", "{}"]);
        assert_eq!(create_args("C", &two).expect("id and payload"), (Some("P1"), "{}"));
        assert!(create_args("C", &[]).is_err());
    }

    #[test]
    fn test_parse_index_bounds() {
        assert_eq!(parse_index("1", 2).expect("in range"), 1);
        for bad in ["2", "-1", "x", ""] {
            let err = parse_index(bad, 2).expect_err("out of range");
            assert!(matches!(err, ContractError::InvalidIndex { len: 2, .. }));
        }
    }

    #[test]
    fn test_parse_page_size() {
        assert_eq!(parse_page_size("10").expect("valid"), 10);
        assert!(parse_page_size("0").is_err());
        assert!(parse_page_size("ten").is_err());
    }
}

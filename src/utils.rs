//! Small helper macros shared across the crate.

/// Returns `Err(crate::Error::invalid_parameter(..))` if the value falls outside the given range.
macro_rules! ensure_in_range {
    ($value:expr, $min:expr => $max:expr, $name:expr) => {
        if $value > $max || $value < $min {
            return Err(crate::Error::invalid_parameter($name));
        }
    };
    ($value:ident, $max:expr, $name:expr) => {
        if $value > $max {
            return Err(crate::Error::invalid_parameter($name));
        }
    };
}

/// Truncating division and remainder, i.e. the built-in `/` and `%` operators bundled together.
macro_rules! divrem {
    ($lhs:expr, $rhs:expr) => {{
        let lhs = $lhs;
        let rhs = $rhs;
        (lhs / rhs, lhs % rhs)
    }};
}

/// Euclidean division and remainder: the remainder is always in `[0, rhs)` regardless of sign.
macro_rules! divmod {
    ($lhs:expr, $rhs:expr) => {{
        let lhs = $lhs;
        let rhs = $rhs;
        (lhs.div_euclid(rhs), lhs.rem_euclid(rhs))
    }};
}

pub(crate) use divmod;
pub(crate) use divrem;
pub(crate) use ensure_in_range;

#[cfg(test)]
mod tests {
    #[test]
    fn test_divrem() {
        assert_eq!(divrem!(-23, 12), (-1, -11));
        assert_eq!(divrem!(27, 12), (2, 3));
        assert_eq!(divrem!(23, -12), (-1, 11));
    }

    #[test]
    fn test_divmod() {
        assert_eq!(divmod!(-23, 12), (-2, 1));
        assert_eq!(divmod!(27, 12), (2, 3));
        assert_eq!(divmod!(-1, 7), (-1, 6));
    }
}

use deepeq_canonical::Options;
use serde::Serialize;

use crate::errors::DeepEqualityError;
use crate::set::DeepSet;

/// True when every value is structurally equal to every other one under
/// `options`.
///
/// A single value is trivially equal to itself. Comparing zero values fails
/// with [`DeepEqualityError::InvalidArgument`].
pub fn are_equal<I, T>(values: I, options: &Options) -> Result<bool, DeepEqualityError>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let set = DeepSet::from_values(values, options)?;
    if set.is_empty() {
        return Err(DeepEqualityError::InvalidArgument(
            "Empty values list passed to are_equal".to_string(),
        ));
    }
    Ok(set.len() == 1)
}

/// Alias of [`are_equal`].
pub fn is_equal<I, T>(values: I, options: &Options) -> Result<bool, DeepEqualityError>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    are_equal(values, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_rejected() {
        let err = are_equal(Vec::<i32>::new(), &Options::default()).unwrap_err();
        assert!(matches!(err, DeepEqualityError::InvalidArgument(_)));
        assert!(is_equal(Vec::<i32>::new(), &Options::default()).is_err());
    }

    #[test]
    fn single_value_is_equal_to_itself() {
        assert!(are_equal([f64::NAN], &Options::default()).unwrap());
    }
}

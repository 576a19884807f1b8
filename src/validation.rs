//! Collects option-record validation failures before any SQL is built.
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::ObjectIdentifier;

/// Accumulates validation errors; [`Validator::finish`] folds them into one result.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<SnowflakeError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: SnowflakeError) -> &mut Self {
        self.errors.push(error);
        self
    }

    /// Push `error` when `failed` holds.
    pub fn check(&mut self, failed: bool, error: impl FnOnce() -> SnowflakeError) -> &mut Self {
        if failed {
            self.errors.push(error());
        }
        self
    }

    /// Merge the outcome of a nested validation.
    pub fn nested(&mut self, result: SnowflakeResult<()>) -> &mut Self {
        match result {
            Ok(()) => {}
            Err(SnowflakeError::Multiple(errors)) => self.errors.extend(errors),
            Err(error) => self.errors.push(error),
        }
        self
    }

    pub fn identifier<I: ObjectIdentifier + ?Sized>(&mut self, id: &I) -> &mut Self {
        if !id.is_valid() {
            self.errors
                .push(SnowflakeError::InvalidObjectIdentifier(id.fully_qualified_name()));
        }
        self
    }

    pub fn identifier_opt<I: ObjectIdentifier>(&mut self, id: Option<&I>) -> &mut Self {
        if let Some(id) = id {
            self.identifier(id);
        }
        self
    }

    pub fn identifiers<I: ObjectIdentifier>(&mut self, ids: &[I]) -> &mut Self {
        for id in ids {
            self.identifier(id);
        }
        self
    }

    /// Exactly one of the flagged fields must be set.
    pub fn exactly_one_of(&mut self, fields: &[(&'static str, bool)]) -> &mut Self {
        if fields.iter().filter(|(_, set)| *set).count() != 1 {
            self.errors.push(SnowflakeError::ExactlyOneOf {
                fields: names(fields),
            });
        }
        self
    }

    pub fn at_least_one_of(&mut self, fields: &[(&'static str, bool)]) -> &mut Self {
        if !fields.iter().any(|(_, set)| *set) {
            self.errors.push(SnowflakeError::AtLeastOneOf {
                fields: names(fields),
            });
        }
        self
    }

    /// At most one of the flagged fields may be set.
    pub fn more_than_one_of(&mut self, fields: &[(&'static str, bool)]) -> &mut Self {
        if fields.iter().filter(|(_, set)| *set).count() > 1 {
            self.errors.push(SnowflakeError::MoreThanOneOf {
                fields: names(fields),
            });
        }
        self
    }

    /// Either all of the flagged fields are set or none are.
    pub fn required_together(&mut self, fields: &[(&'static str, bool)]) -> &mut Self {
        let set = fields.iter().filter(|(_, set)| *set).count();
        if set != 0 && set != fields.len() {
            self.errors.push(SnowflakeError::RequiredTogether {
                fields: names(fields),
            });
        }
        self
    }

    pub fn in_range(&mut self, field: &'static str, value: Option<i64>, min: i64, max: i64) -> &mut Self {
        if let Some(value) = value {
            if value < min || value > max {
                self.errors.push(SnowflakeError::invalid_option(
                    field,
                    format!("must be between {min} and {max}, got {value}"),
                ));
            }
        }
        self
    }

    pub fn finish(self) -> SnowflakeResult<()> {
        join_errors(self.errors)
    }
}

fn names(fields: &[(&'static str, bool)]) -> Vec<&'static str> {
    fields.iter().map(|(name, _)| *name).collect()
}

/// No errors is success, one error is returned as is, more are joined.
pub fn join_errors(mut errors: Vec<SnowflakeError>) -> SnowflakeResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(SnowflakeError::Multiple(errors)),
    }
}

/// Check a lone identifier, for statements without options.
pub fn validate_identifier<I: ObjectIdentifier + ?Sized>(id: &I) -> SnowflakeResult<()> {
    let mut validator = Validator::new();
    validator.identifier(id);
    validator.finish()
}

/// Options records that are mandatory for an operation.
pub(crate) fn require<T>(opts: Option<&T>) -> SnowflakeResult<&T> {
    opts.ok_or(SnowflakeError::NilOptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::AccountObjectIdentifier;

    #[test]
    fn exactly_one_of_rejects_zero_and_many() {
        for flags in [[false, false, false], [true, true, false], [true, true, true]] {
            let mut v = Validator::new();
            v.exactly_one_of(&[("A", flags[0]), ("B", flags[1]), ("C", flags[2])]);
            let err = v.finish().unwrap_err();
            assert_eq!(err.to_string(), "exactly one of A, B, C must be set");
        }
        let mut v = Validator::new();
        v.exactly_one_of(&[("A", false), ("B", true), ("C", false)]);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn required_together_accepts_all_or_none() {
        let mut v = Validator::new();
        v.required_together(&[("A", true), ("B", true)])
            .required_together(&[("C", false), ("D", false)]);
        assert!(v.finish().is_ok());

        let mut v = Validator::new();
        v.required_together(&[("A", true), ("B", false)]);
        assert!(matches!(
            v.finish(),
            Err(SnowflakeError::RequiredTogether { .. })
        ));
    }

    #[test]
    fn errors_are_joined() {
        let mut v = Validator::new();
        v.identifier(&AccountObjectIdentifier::new(""))
            .more_than_one_of(&[("A", true), ("B", true)])
            .in_range("N", Some(100), 0, 90);
        match v.finish() {
            Err(SnowflakeError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected joined errors, got {other:?}"),
        }
    }

    #[test]
    fn nested_results_are_flattened() {
        let mut v = Validator::new();
        v.nested(Err(SnowflakeError::Multiple(vec![
            SnowflakeError::NilOptions,
            SnowflakeError::ScopeRequiredForIn,
        ])))
        .nested(Ok(()));
        match v.finish() {
            Err(SnowflakeError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected joined errors, got {other:?}"),
        }
    }

    #[test]
    fn missing_options_are_nil_options() {
        assert!(matches!(
            require::<u8>(None),
            Err(SnowflakeError::NilOptions)
        ));
        assert_eq!(require(Some(&1)).unwrap(), &1);
    }
}

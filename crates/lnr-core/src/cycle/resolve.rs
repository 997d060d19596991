use thiserror::Error;

use crate::graphql::GraphqlError;

use super::CycleRecord;

/// A parsed cycle selector. `all` is not a selector; callers strip it
/// before parsing because it means "no cycle constraint".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSelector {
    Number(u32),
    Current,
    Next,
    Previous,
}

impl CycleSelector {
    pub fn parse(input: &str) -> Result<Self, CycleError> {
        let trimmed = input.trim();
        if let Ok(number) = trimmed.parse::<u32>() {
            return Ok(CycleSelector::Number(number));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "current" => Ok(CycleSelector::Current),
            "next" => Ok(CycleSelector::Next),
            "previous" => Ok(CycleSelector::Previous),
            _ => Err(CycleError::InvalidSelector(input.trim().to_owned())),
        }
    }
}

/// Scan the list in source order and return the first structural match:
/// numeric selectors match on `number` equality, keywords match the
/// corresponding relative-position flag.
pub fn find_cycle<'a>(
    selector: &CycleSelector,
    cycles: &'a [CycleRecord],
) -> Option<&'a CycleRecord> {
    cycles.iter().find(|cycle| match selector {
        CycleSelector::Number(number) => cycle.number == *number,
        CycleSelector::Current => cycle.is_active,
        CycleSelector::Next => cycle.is_next,
        CycleSelector::Previous => cycle.is_previous,
    })
}

/// Errors from cycle selector parsing and resolution.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("invalid cycle selector '{0}': expected a cycle number, 'current', 'next', 'previous', or 'all'")]
    InvalidSelector(String),
    #[error("no cycle matches '{0}'")]
    NotFound(String),
    #[error(transparent)]
    Graphql(#[from] GraphqlError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::test_support::record;

    #[test]
    fn parses_numbers_and_keywords() {
        assert_eq!(CycleSelector::parse("12").unwrap(), CycleSelector::Number(12));
        assert_eq!(CycleSelector::parse(" 0 ").unwrap(), CycleSelector::Number(0));
        assert_eq!(CycleSelector::parse("current").unwrap(), CycleSelector::Current);
        assert_eq!(CycleSelector::parse("NEXT").unwrap(), CycleSelector::Next);
        assert_eq!(CycleSelector::parse("Previous").unwrap(), CycleSelector::Previous);
    }

    #[test]
    fn rejects_everything_else() {
        for input in ["-1", "12.5", "latest", "", "curr ent"] {
            let err = CycleSelector::parse(input).unwrap_err();
            assert!(matches!(err, CycleError::InvalidSelector(_)), "{input}");
        }
    }

    #[test]
    fn numeric_selector_beats_active_flag() {
        let cycles = vec![record(12, false, false, false), record(11, true, false, false)];
        let found = find_cycle(&CycleSelector::Number(12), &cycles).expect("match");
        assert_eq!(found.number, 12);
        assert!(!found.is_active);
    }

    #[test]
    fn keyword_selectors_match_flags() {
        let cycles = vec![
            record(10, false, false, true),
            record(11, true, false, false),
            record(12, false, true, false),
        ];
        assert_eq!(find_cycle(&CycleSelector::Current, &cycles).unwrap().number, 11);
        assert_eq!(find_cycle(&CycleSelector::Next, &cycles).unwrap().number, 12);
        assert_eq!(find_cycle(&CycleSelector::Previous, &cycles).unwrap().number, 10);
    }

    #[test]
    fn first_match_wins_in_list_order() {
        let cycles = vec![record(11, true, false, false), record(12, true, false, false)];
        assert_eq!(find_cycle(&CycleSelector::Current, &cycles).unwrap().number, 11);
    }

    #[test]
    fn no_match_is_none() {
        let cycles = vec![record(11, false, false, false)];
        assert!(find_cycle(&CycleSelector::Current, &cycles).is_none());
        assert!(find_cycle(&CycleSelector::Number(99), &cycles).is_none());
    }
}

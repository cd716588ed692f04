//! The uniform status codes shared by every boundary in the crate.
//!
//! The numeric discriminants are fixed for wire/binding compatibility and
//! must never be renumbered.

/// A status code returned by a component method, a message iterator, a
/// query, or the graph scheduler.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    End = 1,
    NotFound = 2,
    Interrupted = 4,
    NoMatch = 6,
    Again = 11,
    UnknownObject = 42,
    Error = -1,
    UserError = -2,
    MemoryError = -12,
    OverflowError = -75,
}

impl Status {
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// `AGAIN`, `END`, and `CANCELED`-equivalent statuses are not errors;
    /// see spec §7 taxonomy items 6-8.
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Status::Error
                | Status::UserError
                | Status::MemoryError
                | Status::OverflowError
                | Status::UnknownObject
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::End => "END",
            Status::NotFound => "NOT_FOUND",
            Status::Interrupted => "INTERRUPTED",
            Status::NoMatch => "NO_MATCH",
            Status::Again => "AGAIN",
            Status::UnknownObject => "UNKNOWN_OBJECT",
            Status::Error => "ERROR",
            Status::UserError => "USER_ERROR",
            Status::MemoryError => "MEMORY_ERROR",
            Status::OverflowError => "OVERFLOW_ERROR",
        };
        write!(f, "{name}")
    }
}

/// The outcome of a single `run`/`run_once` call on the graph scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    End,
    Again,
    Canceled,
    Error,
}

/// The outcome of a single `next(capacity)` call on a message iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IteratorStatus {
    /// `1 <= n <= capacity` messages were produced.
    Messages(usize),
    Again,
    End,
    Error,
}

/// The outcome of a single `consume` call on a sink (spec §4.8): did
/// this round make progress, should the scheduler retry later, is the
/// sink done, or did it fail. Distinct from [`RunStatus`], which is the
/// graph-wide outcome the scheduler reports to its own caller after
/// folding a whole round of these together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumeStatus {
    Ok,
    Again,
    End,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_match_the_wire_contract() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::End.code(), 1);
        assert_eq!(Status::Again.code(), 11);
        assert_eq!(Status::NotFound.code(), 2);
        assert_eq!(Status::Interrupted.code(), 4);
        assert_eq!(Status::NoMatch.code(), 6);
        assert_eq!(Status::UnknownObject.code(), 42);
        assert_eq!(Status::OverflowError.code(), -75);
        assert_eq!(Status::MemoryError.code(), -12);
        assert_eq!(Status::UserError.code(), -2);
        assert_eq!(Status::Error.code(), -1);
    }

    #[test]
    fn again_end_and_ok_are_not_errors() {
        assert!(!Status::Ok.is_error());
        assert!(!Status::End.is_error());
        assert!(!Status::Again.is_error());
        assert!(Status::Error.is_error());
    }
}

//! Clock classes and clock snapshots (spec §3, §4.5).

use crate::error::GraphError;
use crate::object::{FreezeFlag, Shared};
use std::cmp::Ordering;
use std::rc::Rc;
use uuid::Uuid;

/// Schema for a clock: frequency, offset, and origin.
#[derive(Debug)]
pub struct ClockClass {
    frozen: FreezeFlag,
    name: Option<String>,
    description: Option<String>,
    frequency: u64,
    offset_seconds: i64,
    offset_cycles: u64,
    uuid: Option<Uuid>,
    origin_is_unix_epoch: bool,
}

impl ClockClass {
    /// Builds a clock class with the given frequency (cycles/second).
    /// Zero offset, no UUID, and `origin_is_unix_epoch = false` are the
    /// defaults until set otherwise.
    pub fn new(frequency: u64) -> Shared<ClockClass> {
        Rc::new(ClockClass {
            frozen: FreezeFlag::new(),
            name: None,
            description: None,
            frequency,
            offset_seconds: 0,
            offset_cycles: 0,
            uuid: None,
            origin_is_unix_epoch: false,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn origin_is_unix_epoch(&self) -> bool {
        self.origin_is_unix_epoch
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_frozen()
    }

    pub fn freeze(&self) {
        self.frozen.freeze();
    }

    /// Converts `cycles` since this clock's epoch into nanoseconds from
    /// its origin, per spec §4.5:
    /// `ns = offset_s * 1e9 + (offset_cycles + cycles) * 1e9 / freq`,
    /// using 128-bit intermediates and truncating toward negative
    /// infinity. Fails with [`GraphError::Overflow`] if the result does
    /// not fit in `i64`.
    pub fn cycles_to_ns_from_origin(&self, cycles: u64) -> Result<i64, GraphError> {
        let freq = self.frequency as i128;
        if freq == 0 {
            return Err(GraphError::Overflow);
        }
        let offset_seconds_ns = (self.offset_seconds as i128)
            .checked_mul(1_000_000_000)
            .ok_or(GraphError::Overflow)?;
        let total_cycles = (self.offset_cycles as i128)
            .checked_add(cycles as i128)
            .ok_or(GraphError::Overflow)?;
        let cycles_ns = total_cycles
            .checked_mul(1_000_000_000)
            .ok_or(GraphError::Overflow)?;
        // `freq` is always positive, so Euclidean division floors toward
        // negative infinity exactly as spec.md §4.5 requires.
        let cycles_ns_floored = cycles_ns.div_euclid(freq);
        let ns = offset_seconds_ns
            .checked_add(cycles_ns_floored)
            .ok_or(GraphError::Overflow)?;
        i64::try_from(ns).map_err(|_| GraphError::Overflow)
    }
}

/// Mutable builder handle for a [`ClockClass`] under construction.
pub struct ClockClassBuilder {
    inner: ClockClass,
}

impl ClockClassBuilder {
    pub fn new(frequency: u64) -> Self {
        Self {
            inner: ClockClass {
                frozen: FreezeFlag::new(),
                name: None,
                description: None,
                frequency,
                offset_seconds: 0,
                offset_cycles: 0,
                uuid: None,
                origin_is_unix_epoch: false,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.inner.description = Some(description.into());
        self
    }

    pub fn offset(mut self, seconds: i64, cycles: u64) -> Self {
        self.inner.offset_seconds = seconds;
        self.inner.offset_cycles = cycles;
        self
    }

    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.inner.uuid = Some(uuid);
        self
    }

    pub fn origin_is_unix_epoch(mut self, flag: bool) -> Self {
        self.inner.origin_is_unix_epoch = flag;
        self
    }

    pub fn build(self) -> Shared<ClockClass> {
        Rc::new(self.inner)
    }
}

/// `(clock_class, cycles)`: the value of a clock at a message's
/// conceptual instant.
#[derive(Debug, Clone)]
pub struct ClockSnapshot {
    clock_class: Shared<ClockClass>,
    cycles: u64,
}

impl ClockSnapshot {
    /// Observing a clock does not mutate it, so a snapshot may be taken
    /// whether or not the clock class is frozen yet; freezing only gates
    /// the clock class's own builder-style setters.
    pub fn new(clock_class: Shared<ClockClass>, cycles: u64) -> Self {
        Self { clock_class, cycles }
    }

    pub fn clock_class(&self) -> &Shared<ClockClass> {
        &self.clock_class
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn ns_from_origin(&self) -> Result<i64, GraphError> {
        self.clock_class.cycles_to_ns_from_origin(self.cycles)
    }

    /// Two snapshots are ordered only if they share a clock class, or if
    /// both clock classes have `origin_is_unix_epoch` set (spec §4.5).
    pub fn partial_cmp_ordered(&self, other: &ClockSnapshot) -> Option<Ordering> {
        let comparable = Rc::ptr_eq(&self.clock_class, &other.clock_class)
            || (self.clock_class.origin_is_unix_epoch() && other.clock_class.origin_is_unix_epoch());
        if !comparable {
            return None;
        }
        if Rc::ptr_eq(&self.clock_class, &other.clock_class) {
            Some(self.cycles.cmp(&other.cycles))
        } else {
            let a = self.ns_from_origin().ok()?;
            let b = other.ns_from_origin().ok()?;
            Some(a.cmp(&b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_conversion_matches_exact_rational_arithmetic() {
        let cc = ClockClassBuilder::new(1_000_000_000).build(); // 1 GHz
        assert_eq!(cc.cycles_to_ns_from_origin(5).unwrap(), 5);
        let cc = ClockClassBuilder::new(1_000).offset(1, 0).build(); // 1 kHz, +1s
        // 1 cycle at 1kHz = 1ms = 1_000_000ns, plus 1 second.
        assert_eq!(cc.cycles_to_ns_from_origin(1).unwrap(), 1_001_000_000);
    }

    #[test]
    fn overflowing_conversion_fails_with_overflow_error() {
        let cc = ClockClassBuilder::new(1).offset(i64::MAX, 0).build();
        let err = cc.cycles_to_ns_from_origin(1).unwrap_err();
        assert!(matches!(err, GraphError::Overflow));
    }

    #[test]
    fn conversion_is_monotonic_in_cycles() {
        let cc = ClockClassBuilder::new(7).offset(-3, 2).build();
        let mut prev = cc.cycles_to_ns_from_origin(0).unwrap();
        for cycles in 1..2000u64 {
            let next = cc.cycles_to_ns_from_origin(cycles).unwrap();
            assert!(next >= prev, "cycles={cycles} prev={prev} next={next}");
            prev = next;
        }
    }

    #[test]
    fn snapshots_from_different_non_epoch_clocks_are_unordered() {
        let a = ClockClassBuilder::new(1000).build();
        let b = ClockClassBuilder::new(1000).build();
        let sa = ClockSnapshot::new(a, 10);
        let sb = ClockSnapshot::new(b, 5);
        assert_eq!(sa.partial_cmp_ordered(&sb), None);
    }

    #[test]
    fn snapshots_from_unix_epoch_clocks_are_ordered() {
        let a = ClockClassBuilder::new(1000).origin_is_unix_epoch(true).build();
        let b = ClockClassBuilder::new(1000).origin_is_unix_epoch(true).build();
        let sa = ClockSnapshot::new(a, 10);
        let sb = ClockSnapshot::new(b, 5);
        assert_eq!(sa.partial_cmp_ordered(&sb), Some(Ordering::Greater));
    }

    #[quickcheck_macros::quickcheck]
    fn same_clock_class_snapshots_always_comparable(a: u32, b: u32) -> bool {
        let cc = ClockClassBuilder::new(1_000_000).build();
        let sa = ClockSnapshot::new(cc.clone(), a as u64);
        let sb = ClockSnapshot::new(cc, b as u64);
        sa.partial_cmp_ordered(&sb) == Some((a as u64).cmp(&(b as u64)))
    }
}

//! Whole-store consistency checks
//!
//! [`verify_consistency`] scans the backend from the smallest key and walks
//! the mirror in lockstep. The same lockstep comparison checks the output of
//! every range scan against the mirror's range.

use std::iter::Peekable;

use kvbench_core::Backend;
use tracing::debug;

use crate::error::{BenchError, Result};
use crate::mirror::OracleMirror;
use crate::stage::Stage;

/// Compares an ascending stream of observed pairs against the expected ones
///
/// The first divergence becomes a `CorrectnessViolation`:
/// - a key the backend skipped: expected its value, observed absent
/// - a key the backend should not return here (unknown, repeated or out
///   of order): expected absent, observed its value
/// - a matching key with a different value: both values
pub(crate) struct Lockstep<'m, I>
where
    I: Iterator<Item = (&'m [u8], &'m [u8])>,
{
    stage: Stage,
    expected: Peekable<I>,
    last: Option<Vec<u8>>,
    matched: usize,
}

impl<'m, I> Lockstep<'m, I>
where
    I: Iterator<Item = (&'m [u8], &'m [u8])>,
{
    pub(crate) fn new(stage: Stage, expected: I) -> Self {
        Self {
            stage,
            expected: expected.peekable(),
            last: None,
            matched: 0,
        }
    }

    /// Feed the next observed pair
    pub(crate) fn observe(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some(last) = &self.last {
            if key <= last.as_slice() {
                return Err(BenchError::violation(self.stage, key, None, Some(value)));
            }
        }

        match self.expected.peek() {
            Some(&(ek, ev)) if ek == key => {
                if ev != value {
                    return Err(BenchError::violation(self.stage, key, Some(ev), Some(value)));
                }
                self.expected.next();
                self.matched += 1;
            }
            Some(&(ek, ev)) if ek < key => {
                return Err(BenchError::violation(self.stage, ek, Some(ev), None));
            }
            _ => return Err(BenchError::violation(self.stage, key, None, Some(value))),
        }

        self.last = Some(key.to_vec());
        Ok(())
    }

    /// Fail if any expected pair was never observed; returns pairs matched
    pub(crate) fn finish(mut self) -> Result<usize> {
        match self.expected.next() {
            Some((ek, ev)) => Err(BenchError::violation(self.stage, ek, Some(ev), None)),
            None => Ok(self.matched),
        }
    }
}

/// Scan the whole backend and compare it with the mirror
///
/// Returns the number of keys checked.
///
/// # Errors
///
/// Returns `CorrectnessViolation` at the first divergence, or
/// `BackendFailure` if the iterator reports an error.
pub fn verify_consistency<B: Backend + ?Sized>(
    backend: &B,
    mirror: &OracleMirror,
    stage: Stage,
) -> Result<usize> {
    let mut lockstep = Lockstep::new(stage, mirror.iter());
    let mut it = backend.iter();
    it.seek(b"");
    while it.valid() {
        lockstep.observe(it.key(), it.value())?;
        it.next();
    }
    it.status()
        .map_err(|e| BenchError::backend(Some(stage), "iterator", None, e))?;

    let checked = lockstep.finish()?;
    debug!(target: "kvbench::harness", stage = %stage, keys = checked, "Consistency check passed");
    Ok(checked)
}

//! Shared helpers: the data-parallel map and once-per-scan diagnostics.
use derive_more::Display;

/// Maps `f` over `0..len`, in parallel when the `rayon` feature is on.
///
/// The output is always in index order, regardless of how the range is
/// split across threads.
pub(crate) fn parallel_map<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..len).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..len).map(f).collect()
    }
}

/// Data-quality problems found while scanning a topology.
#[derive(Display, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Diagnostic {
    #[display("degenerated face found")]
    DegenerateFace,
    #[display("numVerts and verts are inconsistent")]
    InconsistentTopology,
    #[display("vertex index is out of the point range")]
    VertexOutOfRange,
    #[display("source.numElements and pointsOffset are inconsistent")]
    ShortSource,
}

/// Collects diagnostics during a scan and emits each kind once.
#[derive(Debug)]
pub(crate) struct Diagnostics<'a> {
    id: &'a str,
    raised: Vec<Diagnostic>,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(id: &'a str) -> Self {
        Self {
            id,
            raised: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn raise(&mut self, diagnostic: Diagnostic) {
        if !self.raised.contains(&diagnostic) {
            self.raised.push(diagnostic);
        }
    }

    pub(crate) fn is_raised(&self, diagnostic: Diagnostic) -> bool {
        self.raised.contains(&diagnostic)
    }

    /// Logs everything raised so far and resets.
    pub(crate) fn report(&mut self) {
        for diagnostic in self.raised.drain(..) {
            if self.id.is_empty() {
                log::warn!("{}", diagnostic);
            } else {
                log::warn!("{} [{}]", diagnostic, self.id);
            }
        }
    }
}

impl Drop for Diagnostics<'_> {
    fn drop(&mut self) {
        self.report();
    }
}

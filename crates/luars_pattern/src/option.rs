use crate::limits::LUA_MAXCAPTURES;

/// Knobs for compiling and running patterns.
#[derive(Debug, Clone)]
pub struct MatchOption {
    /// Matcher steps allowed per search call. `None` runs until the
    /// backtracking alternatives are exhausted.
    pub step_limit: Option<usize>,
    /// Capture ceiling for compiled patterns, clamped to `LUA_MAXCAPTURES`.
    pub max_captures: usize,
}

impl Default for MatchOption {
    fn default() -> Self {
        Self {
            step_limit: None,
            max_captures: LUA_MAXCAPTURES,
        }
    }
}

impl MatchOption {
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_max_captures(mut self, max: usize) -> Self {
        self.max_captures = max.min(LUA_MAXCAPTURES);
        self
    }

    #[inline]
    pub(crate) fn capture_ceiling(&self) -> usize {
        self.max_captures.min(LUA_MAXCAPTURES)
    }
}

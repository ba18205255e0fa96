//! Window function context.
//!
//! A [`WindowContext`] carries the partition/order/frame description of the
//! window function being compiled. It is validated when it is bound, so a
//! malformed frame is rejected before any row is read.

use std::fmt;

use common_error::{QuarryError, QuarryResult};

/// Lower bound meaning `UNBOUNDED PRECEDING`.
pub const UNBOUNDED_PRECEDING: i64 = i64::MIN;
/// Upper bound meaning `UNBOUNDED FOLLOWING`.
pub const UNBOUNDED_FOLLOWING: i64 = i64::MAX;
/// Frame bound meaning `CURRENT ROW`.
pub const CURRENT_ROW: i64 = 0;

/// How frame bounds are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingMode {
    /// Physical row offsets.
    #[default]
    Rows,
    /// Value distance on the designated timestamp.
    Range,
    /// Peer groups.
    Groups,
}

/// Rows removed from the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExclusionKind {
    /// `EXCLUDE NO OTHERS`
    #[default]
    NoOthers,
    /// `EXCLUDE CURRENT ROW`
    CurrentRow,
    /// `EXCLUDE GROUP`
    Group,
    /// `EXCLUDE TIES`
    Ties,
}

/// Direction of the window `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending.
    #[default]
    Ascending,
    /// Descending.
    Descending,
}

/// Frame specification of one window function.
///
/// Bounds are signed row (or value) offsets relative to the current row:
/// negative values precede it. The `*_pos` fields are statement positions
/// used for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    /// `PARTITION BY` column indexes.
    pub partition_by: Vec<usize>,
    /// Whether the window has an `ORDER BY`.
    pub ordered: bool,
    /// Direction of the `ORDER BY`.
    pub order_direction: OrderDirection,
    /// Position of the `ORDER BY` clause.
    pub order_by_pos: i32,
    /// Framing mode.
    pub framing_mode: FramingMode,
    /// Frame start.
    pub rows_lo: i64,
    /// Position of the frame start.
    pub rows_lo_pos: i32,
    /// Frame end.
    pub rows_hi: i64,
    /// Position of the frame end.
    pub rows_hi_pos: i32,
    /// Exclusion clause.
    pub exclusion: ExclusionKind,
    /// Position of the exclusion clause.
    pub exclusion_pos: i32,
    /// Designated timestamp column of the base cursor.
    pub timestamp_index: Option<usize>,
    /// `IGNORE NULLS`.
    pub ignore_nulls: bool,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            partition_by: Vec::new(),
            ordered: false,
            order_direction: OrderDirection::Ascending,
            order_by_pos: 0,
            framing_mode: FramingMode::Rows,
            rows_lo: UNBOUNDED_PRECEDING,
            rows_lo_pos: 0,
            rows_hi: CURRENT_ROW,
            rows_hi_pos: 0,
            exclusion: ExclusionKind::NoOthers,
            exclusion_pos: 0,
            timestamp_index: None,
            ignore_nulls: false,
        }
    }
}

impl WindowSpec {
    /// Frame is `UNBOUNDED PRECEDING .. UNBOUNDED FOLLOWING`.
    pub fn is_whole_partition(&self) -> bool {
        self.rows_lo == UNBOUNDED_PRECEDING && self.rows_hi == UNBOUNDED_FOLLOWING
    }

    /// Frame has at least one finite bound.
    pub fn is_bounded(&self) -> bool {
        self.rows_lo != UNBOUNDED_PRECEDING || self.rows_hi != UNBOUNDED_FOLLOWING
    }

    /// Frame ends at the current row and starts at the partition start.
    pub fn is_default_frame(&self) -> bool {
        self.rows_lo == UNBOUNDED_PRECEDING && self.rows_hi == CURRENT_ROW
    }

    fn validate(&self) -> QuarryResult<()> {
        if self.rows_lo > self.rows_hi {
            return Err(QuarryError::bind(
                self.rows_lo_pos,
                "start of window frame cannot be after its end",
            ));
        }
        match self.framing_mode {
            FramingMode::Range if self.is_bounded() => {
                if !self.ordered {
                    return Err(QuarryError::bind(
                        self.rows_lo_pos,
                        "RANGE with offset PRECEDING/FOLLOWING requires exactly one ORDER BY column",
                    ));
                }
                if self.timestamp_index.is_none() {
                    return Err(QuarryError::bind(
                        self.order_by_pos,
                        "RANGE is supported only for queries ordered by designated timestamp",
                    ));
                }
            }
            FramingMode::Groups if !self.ordered => {
                return Err(QuarryError::bind(
                    self.rows_lo_pos,
                    "GROUPS mode requires an ORDER BY clause",
                ));
            }
            _ => {}
        }
        if self.exclusion != ExclusionKind::NoOthers && self.framing_mode != FramingMode::Rows {
            return Err(QuarryError::bind(
                self.exclusion_pos,
                "only EXCLUDE NO OTHERS is supported outside ROWS framing",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |v: i64| match v {
            UNBOUNDED_PRECEDING => "unbounded preceding".to_string(),
            UNBOUNDED_FOLLOWING => "unbounded following".to_string(),
            CURRENT_ROW => "current row".to_string(),
            v if v < 0 => format!("{} preceding", v.unsigned_abs()),
            v => format!("{v} following"),
        };
        let mode = match self.framing_mode {
            FramingMode::Rows => "rows",
            FramingMode::Range => "range",
            FramingMode::Groups => "groups",
        };
        write!(
            f,
            "{mode} between {} and {}",
            bound(self.rows_lo),
            bound(self.rows_hi)
        )
    }
}

/// Window state of the function currently being compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowContext {
    spec: Option<WindowSpec>,
}

impl WindowContext {
    /// Validate and bind `spec`.
    pub fn configure(&mut self, spec: WindowSpec) -> QuarryResult<()> {
        spec.validate()?;
        self.spec = Some(spec);
        Ok(())
    }

    /// Drop the bound spec.
    pub fn clear(&mut self) {
        self.spec = None;
    }

    /// Whether no spec is bound.
    pub fn is_empty(&self) -> bool {
        self.spec.is_none()
    }

    /// The bound spec.
    pub fn spec(&self) -> Option<&WindowSpec> {
        self.spec.as_ref()
    }
}

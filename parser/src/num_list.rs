//! Compact numeric index selectors, such as `[0,5:15:2]`.

use std::{error, fmt};

/// Arithmetic progression of `count` numbers starting from `base` with the step `stride`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumRange {
    /// First number in the range.
    pub base: f64,
    /// Number of elements in the range. Always positive.
    pub count: u64,
    /// Difference between the consecutive numbers. Never negative.
    pub stride: f64,
}

impl NumRange {
    /// Creates a range with a single number.
    pub fn single(value: f64) -> Self {
        Self {
            base: value,
            count: 1,
            stride: 1.0,
        }
    }

    /// Returns the last number in this range.
    pub fn last(&self) -> f64 {
        self.base + (self.count - 1) as f64 * self.stride
    }

    /// Iterates over numbers in this range.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(move |i| self.base + i as f64 * self.stride)
    }

    /// Finds an exclusive end that is read back as this range in the bounded syntax.
    fn bounded_end(&self) -> Option<f64> {
        if self.stride == 0.0 {
            return None;
        }
        let count = self.count as f64;
        let candidates = [
            self.base + count * self.stride,
            self.base + (count - 0.5) * self.stride,
        ];
        candidates
            .into_iter()
            .find(|&end| bounded_count(self.base, end, self.stride) == count)
    }

    fn contains(&self, value: f64) -> bool {
        if value == self.base {
            return true;
        }
        if value < self.base || value > self.last() || self.stride == 0.0 {
            return false;
        }
        ((value - self.base) / self.stride).fract() == 0.0
    }
}

/// Interpretation of the middle number in `a:b:c` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSyntax {
    /// `base:end:stride`, with `end` exclusive. `5:15:2` selects 5, 7, 9, 11 and 13.
    Bounded,
    /// `base:count:stride`. `5:3:2` selects 5, 7 and 9.
    Counted,
}

/// Policy for indices exceeding the number of columns when resolving a [`NumList`]
/// against column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnBounds {
    /// Indices beyond the last column are capped at the column count, so that a reference
    /// one past the end surfaces as a single distinct index.
    #[default]
    Capped,
    /// Indices beyond the last column are an error.
    Strict,
    /// Indices beyond the last column are silently dropped.
    Ignore,
}

/// Errors constructing or resolving a [`NumList`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum NumListError {
    /// Range count is not a positive integer.
    NonPositiveCount(f64),
    /// Range stride is negative.
    NegativeStride(f64),
    /// Explicit stride other than 1 for a range with a single element.
    SingleElementStride(f64),
    /// Zero stride in a bounded range.
    ZeroStride,
    /// Bounded range `base:end` selects nothing.
    EmptyRange {
        /// Range start.
        base: f64,
        /// Exclusive range end.
        end: f64,
    },
    /// Range bases do not increase monotonically.
    NonIncreasingBases {
        /// Base of the previous range.
        previous: f64,
        /// Offending base.
        next: f64,
    },
    /// Two ranges select the same number.
    OverlappingRanges {
        /// Last number of the previous range.
        previous_last: f64,
        /// Base of the next range.
        next: f64,
    },
    /// Index is not a non-negative integer.
    NonIntegerIndex(f64),
    /// Index exceeds the number of columns.
    ColumnOutOfRange {
        /// Requested index.
        index: f64,
        /// Number of columns.
        len: usize,
    },
    /// Selector mixes non-negative indices and negative exclusions.
    MixedSigns,
}

impl fmt::Display for NumListError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveCount(count) => {
                write!(formatter, "count must be a positive integer, got {}", count)
            }
            Self::NegativeStride(stride) => {
                write!(formatter, "stride must be non-negative, got {}", stride)
            }
            Self::SingleElementStride(stride) => {
                write!(formatter, "if count is 1, stride must be 1, got {}", stride)
            }
            Self::ZeroStride => formatter.write_str("stride of a bounded range must be positive"),
            Self::EmptyRange { base, end } => {
                write!(formatter, "range {}:{} selects nothing", base, end)
            }
            Self::NonIncreasingBases { previous, next } => write!(
                formatter,
                "bases must be monotonically increasing, got {} after {}",
                next, previous
            ),
            Self::OverlappingRanges {
                previous_last,
                next,
            } => write!(
                formatter,
                "ranges overlap: range starting at {} begins before {}",
                next, previous_last
            ),
            Self::NonIntegerIndex(index) => {
                write!(formatter, "index {} is not an integer", index)
            }
            Self::ColumnOutOfRange { index, len } => write!(
                formatter,
                "column index {} is out of range for {} column(s)",
                index, len
            ),
            Self::MixedSigns => formatter.write_str("cannot mix selected and excluded indices"),
        }
    }
}

impl error::Error for NumListError {}

/// Clause of a number list literal as written in code: `a`, `a:b` or `a:b:c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumClause {
    /// First number.
    pub base: f64,
    /// Second number, which is a range end or count depending on [`RangeSyntax`].
    pub second: Option<f64>,
    /// Third number, the stride.
    pub stride: Option<f64>,
}

/// Compact representation of a numeric selector: a sequence of [`NumRange`]s.
///
/// Unless every range has a single element, ranges are sorted by their bases and
/// do not overlap; this allows [`Self::has()`] to use binary search. A list consisting only
/// of single numbers may be in arbitrary order and contain repetitions.
///
/// A selector whose numbers are all negative is an *exclusion*: `-v - 1` is excluded for
/// every listed `v`, so `[-1]` excludes index 0.
///
/// # Examples
///
/// ```
/// # use rapids_parser::num_list::{NumClause, NumList, RangeSyntax};
/// let clauses = [
///     NumClause { base: 0.0, second: None, stride: None },
///     NumClause { base: 5.0, second: Some(15.0), stride: Some(2.0) },
/// ];
/// let list = NumList::from_clauses(&clauses, RangeSyntax::Bounded)?;
/// assert_eq!(list.expand(), [0.0, 5.0, 7.0, 9.0, 11.0, 13.0]);
/// assert!(list.has(9.0));
/// assert!(!list.has(10.0));
/// assert_eq!(list.to_string(), "[0,5:15:2]");
/// # Ok::<_, rapids_parser::num_list::NumListError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumList {
    ranges: Vec<NumRange>,
    is_list: bool,
}

impl NumList {
    /// Creates a selector from the provided ranges, checking their ordering.
    pub fn new(ranges: Vec<NumRange>) -> Result<Self, NumListError> {
        for range in &ranges {
            if range.count == 0 {
                return Err(NumListError::NonPositiveCount(0.0));
            }
            if range.stride.is_nan() || range.stride < 0.0 {
                return Err(NumListError::NegativeStride(range.stride));
            }
        }

        let is_list = ranges.iter().all(|range| range.count == 1);
        if !is_list {
            for pair in ranges.windows(2) {
                let (prev, next) = (&pair[0], &pair[1]);
                if next.base <= prev.base {
                    return Err(NumListError::NonIncreasingBases {
                        previous: prev.base,
                        next: next.base,
                    });
                }
                if next.base <= prev.last() {
                    return Err(NumListError::OverlappingRanges {
                        previous_last: prev.last(),
                        next: next.base,
                    });
                }
            }
        }
        Ok(Self { ranges, is_list })
    }

    /// Creates a selector with a single range `base, base + 1, .., base + count - 1`.
    pub fn span(base: f64, count: u64) -> Self {
        if count == 0 {
            return Self::default();
        }
        Self {
            ranges: vec![NumRange {
                base,
                count,
                stride: 1.0,
            }],
            is_list: count == 1,
        }
    }

    /// Creates a selector listing the provided numbers in order.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            ranges: values.iter().copied().map(NumRange::single).collect(),
            is_list: true,
        }
    }

    /// Creates a selector from clauses of a list literal.
    pub fn from_clauses(clauses: &[NumClause], syntax: RangeSyntax) -> Result<Self, NumListError> {
        let ranges = clauses
            .iter()
            .map(|clause| Self::range_from_clause(clause, syntax))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(ranges)
    }

    fn range_from_clause(clause: &NumClause, syntax: RangeSyntax) -> Result<NumRange, NumListError> {
        let stride = clause.stride.unwrap_or(1.0);
        if stride.is_nan() || stride < 0.0 {
            return Err(NumListError::NegativeStride(stride));
        }
        let Some(second) = clause.second else {
            return Ok(NumRange::single(clause.base));
        };

        let count = match syntax {
            RangeSyntax::Counted => second,
            RangeSyntax::Bounded => {
                if stride == 0.0 {
                    return Err(NumListError::ZeroStride);
                }
                let count = bounded_count(clause.base, second, stride);
                if !(count >= 1.0) {
                    return Err(NumListError::EmptyRange {
                        base: clause.base,
                        end: second,
                    });
                }
                count
            }
        };
        if !(count >= 1.0) || count.fract() != 0.0 || count > u64::MAX as f64 {
            return Err(NumListError::NonPositiveCount(count));
        }

        if count == 1.0 {
            // In the bounded syntax, the count is derived from the end, so any stride fits.
            if syntax == RangeSyntax::Counted && stride != 1.0 {
                return Err(NumListError::SingleElementStride(stride));
            }
            return Ok(NumRange::single(clause.base));
        }
        Ok(NumRange {
            base: clause.base,
            count: count as u64,
            stride,
        })
    }

    /// Returns ranges in this selector.
    pub fn ranges(&self) -> &[NumRange] {
        &self.ranges
    }

    /// Checks whether this selector consists solely of single numbers (and thus may be unsorted).
    pub fn is_list(&self) -> bool {
        self.is_list
    }

    /// Total number of selected numbers.
    pub fn count(&self) -> u64 {
        self.ranges
            .iter()
            .fold(0, |acc, range| acc.saturating_add(range.count))
    }

    /// Checks whether the selector is empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Checks whether this selector is a single contiguous range with unit stride.
    pub fn is_dense(&self) -> bool {
        match self.ranges.as_slice() {
            [range] => range.count == 1 || range.stride == 1.0,
            _ => false,
        }
    }

    /// Checks whether this selector lists negative exclusions.
    pub fn is_exclusion(&self) -> bool {
        self.min().map_or(false, |min| min < 0.0)
    }

    /// Minimum selected number.
    pub fn min(&self) -> Option<f64> {
        if self.is_list {
            self.ranges.iter().map(|range| range.base).reduce(f64::min)
        } else {
            self.ranges.first().map(|range| range.base)
        }
    }

    /// Maximum selected number.
    pub fn max(&self) -> Option<f64> {
        if self.is_list {
            self.ranges.iter().map(|range| range.base).reduce(f64::max)
        } else {
            self.ranges.last().map(NumRange::last)
        }
    }

    /// Expands this selector into the list of selected numbers, in order.
    pub fn expand(&self) -> Vec<f64> {
        self.ranges.iter().flat_map(NumRange::iter).collect()
    }

    /// Expands this selector into indices. Errors if any selected number is not
    /// a non-negative integer.
    pub fn expand_indices(&self) -> Result<Vec<usize>, NumListError> {
        self.ranges
            .iter()
            .flat_map(NumRange::iter)
            .map(to_index)
            .collect()
    }

    /// Checks whether `value` is selected. For exclusions, checks whether `value`
    /// is *not* excluded.
    pub fn has(&self, value: f64) -> bool {
        if self.is_exclusion() {
            !self.has_exact(-value - 1.0)
        } else {
            self.has_exact(value)
        }
    }

    fn has_exact(&self, value: f64) -> bool {
        if self.is_list {
            return self.ranges.iter().any(|range| range.base == value);
        }
        let idx = self.ranges.partition_point(|range| range.base <= value);
        idx > 0 && self.ranges[idx - 1].contains(value)
    }

    /// Resolves this selector against `len` columns.
    ///
    /// For a plain selector, indices are returned in the listed order. With
    /// [`ColumnBounds::Capped`], the first index beyond the last column is replaced with `len`
    /// and later out-of-range indices are dropped, so `len` occurs at most once. Ranges stop
    /// expanding once they leave `0..len`. An exclusion selector resolves to all indices
    /// in `0..len` that are not excluded.
    pub fn columns(&self, len: usize, bounds: ColumnBounds) -> Result<Vec<usize>, NumListError> {
        if self.is_exclusion() {
            return self.excluded_columns(len);
        }

        let mut indices = Vec::new();
        let mut capped = false;
        for range in &self.ranges {
            for value in range.iter() {
                let index = to_index(value)?;
                if index < len {
                    indices.push(index);
                    continue;
                }
                match bounds {
                    ColumnBounds::Strict => {
                        return Err(NumListError::ColumnOutOfRange { index: value, len });
                    }
                    ColumnBounds::Capped => {
                        if !capped {
                            indices.push(len);
                            capped = true;
                        }
                        break;
                    }
                    ColumnBounds::Ignore => break,
                }
            }
        }
        Ok(indices)
    }

    fn excluded_columns(&self, len: usize) -> Result<Vec<usize>, NumListError> {
        if self.max().map_or(false, |max| max >= 0.0) {
            return Err(NumListError::MixedSigns);
        }
        // Integer base and stride make every number in the range an integer.
        for range in &self.ranges {
            if range.base.fract() != 0.0 {
                return Err(NumListError::NonIntegerIndex(-range.base - 1.0));
            }
            if range.count > 1 && range.stride.fract() != 0.0 {
                return Err(NumListError::NonIntegerIndex(-(range.base + range.stride) - 1.0));
            }
        }
        Ok((0..len)
            .filter(|&idx| !self.has_exact(-(idx as f64) - 1.0))
            .collect())
    }
}

fn to_index(value: f64) -> Result<usize, NumListError> {
    if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
        Err(NumListError::NonIntegerIndex(value))
    } else {
        Ok(value as usize)
    }
}

/// Formats the selector as a list literal in the [`RangeSyntax::Bounded`] syntax.
impl fmt::Display for NumList {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("[")?;
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                formatter.write_str(",")?;
            }
            if range.count == 1 {
                write!(formatter, "{}", range.base)?;
            } else if let Some(end) = range.bounded_end() {
                write!(formatter, "{}:{}", range.base, end)?;
                if range.stride != 1.0 {
                    write!(formatter, ":{}", range.stride)?;
                }
            } else {
                for (j, value) in range.iter().enumerate() {
                    if j > 0 {
                        formatter.write_str(",")?;
                    }
                    write!(formatter, "{}", value)?;
                }
            }
        }
        formatter.write_str("]")
    }
}

/// Number of elements in the bounded range `base:end:stride`.
fn bounded_count(base: f64, end: f64, stride: f64) -> f64 {
    ((end - base) / stride).ceil()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;

    fn clause(base: f64, second: Option<f64>, stride: Option<f64>) -> NumClause {
        NumClause {
            base,
            second,
            stride,
        }
    }

    #[test]
    fn bounded_and_counted_ranges() {
        let clauses = [clause(5.0, Some(15.0), Some(2.0))];
        let bounded = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap();
        assert_eq!(bounded.expand(), [5.0, 7.0, 9.0, 11.0, 13.0]);

        let clauses = [clause(5.0, Some(3.0), Some(2.0))];
        let counted = NumList::from_clauses(&clauses, RangeSyntax::Counted).unwrap();
        assert_eq!(counted.expand(), [5.0, 7.0, 9.0]);
        assert_eq!(counted.count(), 3);
        assert!(!counted.is_dense());
    }

    #[test]
    fn invalid_ranges() {
        let err = NumList::from_clauses(&[clause(0.0, Some(0.0), None)], RangeSyntax::Counted)
            .unwrap_err();
        assert_matches!(err, NumListError::NonPositiveCount(count) if count == 0.0);

        let err = NumList::from_clauses(&[clause(0.0, Some(2.5), None)], RangeSyntax::Counted)
            .unwrap_err();
        assert_matches!(err, NumListError::NonPositiveCount(_));

        let err = NumList::from_clauses(&[clause(0.0, Some(3.0), Some(-1.0))], RangeSyntax::Counted)
            .unwrap_err();
        assert_matches!(err, NumListError::NegativeStride(_));

        let err = NumList::from_clauses(&[clause(4.0, Some(2.0), None)], RangeSyntax::Bounded)
            .unwrap_err();
        assert_matches!(err, NumListError::EmptyRange { .. });

        let err = NumList::from_clauses(&[clause(4.0, Some(8.0), Some(0.0))], RangeSyntax::Bounded)
            .unwrap_err();
        assert_matches!(err, NumListError::ZeroStride);
    }

    #[test]
    fn stride_of_single_element_range() {
        let err = NumList::from_clauses(&[clause(5.0, Some(1.0), Some(2.0))], RangeSyntax::Counted)
            .unwrap_err();
        assert_matches!(err, NumListError::SingleElementStride(stride) if stride == 2.0);
        assert_eq!(err.to_string(), "if count is 1, stride must be 1, got 2");

        let list = NumList::from_clauses(&[clause(5.0, Some(1.0), Some(1.0))], RangeSyntax::Counted)
            .unwrap();
        assert_eq!(list.expand(), [5.0]);
        let list = NumList::from_clauses(&[clause(5.0, Some(6.0), Some(2.0))], RangeSyntax::Bounded)
            .unwrap();
        assert_eq!(list.expand(), [5.0]);
    }

    #[test]
    fn ranges_must_be_ordered() {
        let clauses = [clause(5.0, Some(8.0), None), clause(1.0, None, None)];
        let err = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap_err();
        assert_matches!(err, NumListError::NonIncreasingBases { .. });
        assert!(err.to_string().contains("bases must be monotonically increasing"));

        let clauses = [clause(0.0, Some(5.0), None), clause(3.0, None, None)];
        let err = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap_err();
        assert_matches!(err, NumListError::OverlappingRanges { .. });
    }

    #[test]
    fn single_numbers_may_be_unsorted() {
        let list = NumList::from_values(&[8.0, 1.0, 1.0, 7.0]);
        assert!(list.is_list());
        assert_eq!(list.expand(), [8.0, 1.0, 1.0, 7.0]);
        assert!(list.has(7.0));
        assert!(!list.has(2.0));
        assert_eq!(list.min(), Some(1.0));
        assert_eq!(list.max(), Some(8.0));
    }

    #[test]
    fn membership_with_strides() {
        let clauses = [clause(0.0, None, None), clause(5.0, Some(15.0), Some(2.0))];
        let list = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap();
        for value in [0.0, 5.0, 7.0, 13.0] {
            assert!(list.has(value), "{}", value);
        }
        for value in [-1.0, 1.0, 6.0, 15.0, 100.0] {
            assert!(!list.has(value), "{}", value);
        }
    }

    #[test]
    fn negative_exclusions() {
        let list = NumList::from_values(&[-1.0]);
        assert!(list.is_exclusion());
        assert!(!list.has(0.0));
        assert!(list.has(1.0));
        assert_eq!(list.columns(3, ColumnBounds::Capped).unwrap(), [1, 2]);

        let mixed = NumList::from_values(&[-1.0, 2.0]);
        assert_matches!(
            mixed.columns(3, ColumnBounds::Capped),
            Err(NumListError::MixedSigns)
        );
        let fractional = NumList::from_values(&[-1.5]);
        assert_matches!(
            fractional.columns(3, ColumnBounds::Capped),
            Err(NumListError::NonIntegerIndex(_))
        );
    }

    #[test]
    fn huge_exclusion_range() {
        // Excludes indices 1..=2_999_999_999.
        let clauses = [clause(-3_000_000_000.0, Some(-1.0), None)];
        let list = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap();
        assert_eq!(list.count(), 2_999_999_999);
        assert_eq!(list.columns(3, ColumnBounds::Capped).unwrap(), [0]);
        assert_eq!(list.columns(0, ColumnBounds::Capped).unwrap(), Vec::<usize>::new());

        let clauses = [clause(-7.0, Some(-1.0), Some(2.0))];
        let list = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap();
        // Excludes indices 6, 4 and 2.
        assert_eq!(list.columns(8, ColumnBounds::Capped).unwrap(), [0, 1, 3, 5, 7]);
    }

    #[test]
    fn column_bounds() {
        let list = NumList::span(1.0, 1_000_000);
        assert_eq!(list.columns(3, ColumnBounds::Capped).unwrap(), [1, 2, 3]);
        assert_eq!(list.columns(3, ColumnBounds::Ignore).unwrap(), [1, 2]);
        assert_matches!(
            list.columns(3, ColumnBounds::Strict),
            Err(NumListError::ColumnOutOfRange { len: 3, .. })
        );

        let fractional = NumList::from_values(&[0.5]);
        assert_matches!(
            fractional.columns(3, ColumnBounds::Capped),
            Err(NumListError::NonIntegerIndex(_))
        );
    }

    #[test]
    fn capped_index_occurs_once() {
        let scalars = NumList::from_values(&[0.0, 5.0, 6.0]);
        assert_eq!(scalars.columns(3, ColumnBounds::Capped).unwrap(), [0, 3]);
        assert_eq!(scalars.columns(3, ColumnBounds::Ignore).unwrap(), [0]);

        let clauses = [clause(2.0, Some(5.0), None), clause(10.0, Some(20.0), None)];
        let ranges = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap();
        assert_eq!(ranges.columns(3, ColumnBounds::Capped).unwrap(), [2, 3]);
    }

    #[test]
    fn display_uses_bounded_syntax() {
        let clauses = [
            clause(0.0, None, None),
            clause(5.0, Some(15.0), Some(2.0)),
            clause(20.0, Some(23.0), None),
        ];
        let list = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap();
        assert_eq!(list.to_string(), "[0,5:15:2,20:23]");
        assert_eq!(NumList::default().to_string(), "[]");
    }

    #[test]
    fn display_with_fractional_stride() {
        let range = NumRange {
            base: 0.0,
            count: 3,
            stride: 0.1,
        };
        let list = NumList::new(vec![range]).unwrap();
        let text = list.to_string();
        assert_eq!(text, "[0:0.25:0.1]");

        let clauses = [clause(0.0, Some(0.25), Some(0.1))];
        let parsed = NumList::from_clauses(&clauses, RangeSyntax::Bounded).unwrap();
        assert_eq!(parsed, list);
    }

    #[test]
    fn display_without_bounded_form() {
        let range = NumRange {
            base: 1.0,
            count: 3,
            stride: 0.0,
        };
        let list = NumList::new(vec![range]).unwrap();
        assert_eq!(list.to_string(), "[1,1,1]");
    }

    fn sorted_ranges() -> impl Strategy<Value = Vec<NumRange>> {
        prop::collection::vec((0_u32..5, 1_u64..6, 1_u32..4), 0..6).prop_map(|specs| {
            let mut base = 0.0;
            specs
                .into_iter()
                .map(|(gap, count, stride)| {
                    let range = NumRange {
                        base: base + f64::from(gap),
                        count,
                        stride: f64::from(stride),
                    };
                    base = range.last() + 1.0;
                    range
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn membership_matches_expansion(ranges in sorted_ranges(), probe in 0_u32..80) {
            let list = NumList::new(ranges).unwrap();
            let expanded = list.expand();
            let probe = f64::from(probe);
            prop_assert_eq!(list.has(probe), expanded.contains(&probe));
            prop_assert_eq!(list.count() as usize, expanded.len());
        }

        #[test]
        fn expansion_survives_scalar_reencoding(ranges in sorted_ranges()) {
            let list = NumList::new(ranges).unwrap();
            let expanded = list.expand();
            let scalars = NumList::from_values(&expanded);
            prop_assert_eq!(scalars.expand(), expanded);
        }
    }
}

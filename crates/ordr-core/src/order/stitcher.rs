//! Cross-page resolution of schedule dates.
//!
//! Works on the flattened, globally ordered element list of one document:
//!
//! 1. A schedule marker whose date row did not follow it on the same page
//!    is bound to the next element when that element is a bare schedule
//!    date on a later page.
//! 2. Every data row takes the date of the first schedule marker after it.
//!    Consecutive data rows before one marker share that marker. A row with
//!    no marker after it keeps no date.
//!
//! Both passes are linear; page boundaries need no special casing.

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::models::{ClassifiedElement, DataRow};

/// A data row with the date the stitcher attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchedRow {
    pub row: DataRow,
    pub schedule_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CrossPageStitcher;

impl CrossPageStitcher {
    pub fn new() -> Self {
        Self
    }

    pub fn stitch(&self, elements: Vec<ClassifiedElement>) -> Vec<StitchedRow> {
        let mut elements: Vec<ClassifiedElement> =
            elements.into_iter().filter(|e| !e.is_noise()).collect();

        debug_assert!(
            elements
                .windows(2)
                .all(|w| w[0].position() <= w[1].position()),
            "elements must be in scan order"
        );

        self.bind_split_markers(&mut elements);

        // Walk backwards carrying the date of the nearest marker seen so far
        let mut carried: Option<Option<NaiveDate>> = None;
        let mut stitched = Vec::new();
        for element in elements.into_iter().rev() {
            match element {
                ClassifiedElement::ScheduleMarker { resolved_date, .. } => {
                    carried = Some(resolved_date);
                }
                ClassifiedElement::DataRow(row) => {
                    stitched.push(StitchedRow {
                        row,
                        schedule_date: carried.flatten(),
                    });
                }
                _ => {}
            }
        }
        stitched.reverse();

        for (i, item) in stitched.iter_mut().enumerate() {
            item.row.ordinal = i + 1;
            trace!(
                "Row {} (page {} row {}) -> {:?}",
                item.row.ordinal,
                item.row.page_index + 1,
                item.row.row_index,
                item.schedule_date
            );
        }

        debug!(
            "Stitched {} data rows, {} with a schedule date",
            stitched.len(),
            stitched.iter().filter(|s| s.schedule_date.is_some()).count()
        );
        stitched
    }

    fn bind_split_markers(&self, elements: &mut [ClassifiedElement]) {
        for i in 0..elements.len().saturating_sub(1) {
            let (head, tail) = elements.split_at_mut(i + 1);
            let ClassifiedElement::ScheduleMarker {
                resolved_date: resolved,
                page_index: marker_page,
                ..
            } = &mut head[i]
            else {
                continue;
            };
            if resolved.is_some() {
                continue;
            }
            if let ClassifiedElement::ScheduleDate {
                date, page_index, ..
            } = &tail[0]
            {
                if *page_index > *marker_page {
                    debug!(
                        "Bound schedule marker on page {} to date {} on page {}",
                        *marker_page + 1,
                        date,
                        page_index + 1
                    );
                    *resolved = Some(*date);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn data(page: usize, row: usize) -> ClassifiedElement {
        ClassifiedElement::DataRow(DataRow::new(page, row, format!("{page}:{row}")))
    }

    fn marker(page: usize, row: usize, date: Option<NaiveDate>) -> ClassifiedElement {
        ClassifiedElement::ScheduleMarker {
            raw_date_text: date.map(|d| d.to_string()).unwrap_or_default(),
            resolved_date: date,
            page_index: page,
            row_index: row,
        }
    }

    fn bare_date(page: usize, row: usize, date: NaiveDate) -> ClassifiedElement {
        ClassifiedElement::ScheduleDate {
            raw_date_text: date.to_string(),
            date,
            page_index: page,
            row_index: row,
        }
    }

    fn dates(stitched: &[StitchedRow]) -> Vec<Option<NaiveDate>> {
        stitched.iter().map(|s| s.schedule_date).collect()
    }

    #[test]
    fn test_same_page_markers() {
        let stitched = CrossPageStitcher::new().stitch(vec![
            data(0, 1),
            marker(0, 2, Some(ymd(10, 7))),
            data(0, 4),
            marker(0, 5, Some(ymd(10, 14))),
        ]);
        assert_eq!(dates(&stitched), vec![Some(ymd(10, 7)), Some(ymd(10, 14))]);
        assert_eq!(stitched[0].row.ordinal, 1);
        assert_eq!(stitched[1].row.ordinal, 2);
    }

    #[test]
    fn test_marker_on_next_page() {
        let stitched = CrossPageStitcher::new().stitch(vec![
            data(0, 8),
            ClassifiedElement::Noise,
            marker(1, 0, Some(ymd(11, 3))),
        ]);
        assert_eq!(dates(&stitched), vec![Some(ymd(11, 3))]);
    }

    #[test]
    fn test_marker_and_date_split_by_page_break() {
        let stitched = CrossPageStitcher::new().stitch(vec![
            data(0, 7),
            marker(0, 9, None),
            bare_date(1, 0, ymd(12, 1)),
            data(1, 3),
            marker(1, 4, Some(ymd(12, 8))),
        ]);
        assert_eq!(dates(&stitched), vec![Some(ymd(12, 1)), Some(ymd(12, 8))]);
    }

    #[test]
    fn test_bare_date_on_same_page_is_not_bound() {
        let stitched = CrossPageStitcher::new().stitch(vec![
            data(0, 1),
            marker(0, 2, None),
            bare_date(0, 5, ymd(12, 1)),
        ]);
        assert_eq!(dates(&stitched), vec![None]);
    }

    #[test]
    fn test_adjacent_rows_share_following_marker() {
        let stitched = CrossPageStitcher::new().stitch(vec![
            data(0, 1),
            data(0, 2),
            marker(0, 3, Some(ymd(10, 7))),
            data(0, 5),
        ]);
        assert_eq!(
            dates(&stitched),
            vec![Some(ymd(10, 7)), Some(ymd(10, 7)), None]
        );
    }

    #[test]
    fn test_unresolved_marker_gives_null() {
        let stitched = CrossPageStitcher::new().stitch(vec![
            data(0, 1),
            marker(0, 2, None),
            marker(0, 3, Some(ymd(10, 7))),
        ]);
        assert_eq!(dates(&stitched), vec![None]);
    }

    #[test]
    fn test_no_elements() {
        assert!(CrossPageStitcher::new().stitch(Vec::new()).is_empty());
    }
}

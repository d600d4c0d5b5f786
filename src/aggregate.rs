//! Reduction of per-sample score rows into per-lot category means.

use log::debug;

use crate::error::ReportError;
use crate::model::{LotAggregate, Lookup, ScoreTable};

/// Averages the scores of `lot_id` per category.
///
/// Rows are matched by exact, case-sensitive lot identifier.  Cells without a
/// numeric value are left out of their category's mean; a category that has
/// no value in any matching row cannot be averaged and fails the request with
/// [`ReportError::IncompleteCategory`].
///
/// Returns [`Lookup::NotFound`] when no row matches, never an empty or
/// zero-filled aggregate.
pub fn aggregate(table: &ScoreTable, lot_id: &str) -> Result<Lookup<LotAggregate>, ReportError> {
    let categories = table.categories();
    let mut sums = vec![0.0_f64; categories.len()];
    let mut counts = vec![0_usize; categories.len()];
    let mut rows = 0;

    for row in table.rows_for(lot_id) {
        rows += 1;
        for (index, score) in row.scores().iter().enumerate() {
            if let Some(score) = score {
                sums[index] += score;
                counts[index] += 1;
            }
        }
    }

    if rows == 0 {
        debug!("No score rows for lot '{}'", lot_id);
        return Ok(Lookup::NotFound);
    }

    let means = categories
        .iter()
        .zip(sums.iter().zip(&counts))
        .map(|(category, (&sum, &count))| {
            if count == 0 {
                Err(ReportError::IncompleteCategory {
                    lot_id: lot_id.to_owned(),
                    category: category.clone(),
                })
            } else {
                Ok((category.clone(), sum / count as f64))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Aggregated {} score rows for lot '{}'", rows, lot_id);
    Ok(Lookup::Found(LotAggregate::new(lot_id, means, rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScoreRow;

    fn sample_table() -> ScoreTable {
        let first = [8.0, 7.5, 7.25, 8.0, 7.75, 10.0, 10.0, 10.0, 7.5, 8.5];
        let second = [8.5, 7.75, 7.5, 7.5, 8.0, 10.0, 10.0, 10.0, 7.75, 8.0];
        let other = [6.0; 10];

        ScoreTable::with_default_categories()
            .with_row(ScoreRow::complete("Lote - 1", &first))
            .and_then(|t| t.with_row(ScoreRow::complete("Lote - 2", &other)))
            .and_then(|t| t.with_row(ScoreRow::complete("Lote - 1", &second)))
            .unwrap()
    }

    #[test]
    fn averages_matching_rows_per_category() {
        let aggregate = aggregate(&sample_table(), "Lote - 1").unwrap().found().unwrap();

        assert_eq!(aggregate.lot_id(), "Lote - 1");
        assert_eq!(aggregate.sample_count(), 2);
        assert_eq!(aggregate.len(), 10);
        assert_eq!(aggregate.mean("Fragrance"), Some(8.25));
        assert_eq!(aggregate.mean("Acidity"), Some(7.75));
        assert_eq!(aggregate.mean("Overall"), Some(8.25));
        assert_eq!(aggregate.mean("Uniformity"), Some(10.0));
    }

    #[test]
    fn keeps_category_order() {
        let aggregate = aggregate(&sample_table(), "Lote - 2").unwrap().found().unwrap();
        let names: Vec<&str> = aggregate.means().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, crate::model::DEFAULT_CATEGORIES);
        assert!(aggregate.means().iter().all(|(_, mean)| *mean == 6.0));
    }

    #[test]
    fn unknown_lot_is_not_found() {
        assert_eq!(aggregate(&sample_table(), "Lote - 99").unwrap(), Lookup::NotFound);
        assert_eq!(aggregate(&sample_table(), "lote - 1").unwrap(), Lookup::NotFound);
    }

    #[test]
    fn skips_missing_cells() {
        let table = ScoreTable::new(["Body", "Balance"])
            .with_row(ScoreRow::new("L", vec![Some(8.0), None]))
            .and_then(|t| t.with_row(ScoreRow::new("L", vec![Some(7.0), Some(9.0)])))
            .unwrap();

        let aggregate = aggregate(&table, "L").unwrap().found().unwrap();
        assert_eq!(aggregate.mean("Body"), Some(7.5));
        assert_eq!(aggregate.mean("Balance"), Some(9.0));
    }

    #[test]
    fn category_without_values_is_an_error() {
        let table = ScoreTable::new(["Body", "Balance"])
            .with_row(ScoreRow::new("L", vec![Some(8.0), None]))
            .unwrap();

        let err = aggregate(&table, "L").unwrap_err();
        assert!(matches!(
            err,
            ReportError::IncompleteCategory { ref category, .. } if category == "Balance"
        ));
    }
}

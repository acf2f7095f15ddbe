//! Sub-batch sizing under a bound-parameter limit
//!
//! A multi-row insert binds `rows * columns` values, and the storage engine
//! rejects statements above its variable limit.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("rows must have at least one column")]
    ZeroColumns,

    #[error("limit of {max_parameters} bound parameters cannot fit one row of {column_count} columns")]
    LimitBelowRowWidth {
        max_parameters: usize,
        column_count: usize,
    },
}

/// `floor(max_parameters / column_count)`, refusing sizes that would be zero.
pub fn rows_per_batch(max_parameters: usize, column_count: usize) -> Result<usize, PartitionError> {
    if column_count == 0 {
        return Err(PartitionError::ZeroColumns);
    }
    match max_parameters / column_count {
        0 => Err(PartitionError::LimitBelowRowWidth {
            max_parameters,
            column_count,
        }),
        rows => Ok(rows),
    }
}

/// Split `rows` into consecutive sub-batches that each fit in one statement.
pub fn partition<T>(
    rows: &[T],
    max_parameters: usize,
    column_count: usize,
) -> Result<std::slice::Chunks<'_, T>, PartitionError> {
    let size = rows_per_batch(max_parameters, column_count)?;
    Ok(rows.chunks(size))
}

use crate::error::{AppError, AppResult};

/// Split `items` into consecutive groups of at most `max_batch_size`.
///
/// Order is preserved and only the last group may be shorter.
pub fn partition<T>(items: &[T], max_batch_size: usize) -> AppResult<Vec<&[T]>> {
    if max_batch_size == 0 {
        return Err(AppError::InvalidInput(
            "batch size must be greater than zero".to_string(),
        ));
    }

    Ok(items.chunks(max_batch_size).collect())
}

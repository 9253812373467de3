use tracing::error;

use crate::error::LedgerError;
use crate::ports::LedgerUnit;

/// Commits the unit on success and rolls it back on failure.
///
/// A failed commit is reported as Internal regardless of the store error.
pub(crate) async fn finish<T>(
    unit: Box<dyn LedgerUnit>,
    outcome: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            unit.commit().await.map_err(|e| {
                error!(error = %e, "Failed to commit ledger unit");
                LedgerError::internal(format!("commit failed: {}", e))
            })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                error!(error = %rollback_err, "Failed to roll back ledger unit");
            }
            Err(err)
        }
    }
}

use crate::{AppError, AppState};
use backend_domain::{OperatorId, ScanStatus};

pub async fn get_last_scan(state: &AppState, operator_id: &str) -> Result<Option<ScanStatus>, AppError> {
    let operator_id = OperatorId::parse(operator_id)?;
    Ok(state.last_scans.read().await.get(operator_id.as_str()).cloned())
}

use crate::domain::ports::Storage;
use crate::utils::error::{PipelineError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes rows to CSV; the header comes from the first row's field names.
pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| PipelineError::ProcessingError {
            message: format!("Failed to flush CSV writer: {}", e),
        })
}

pub fn from_csv<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_reader(data);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub async fn write_records<S: Storage, T: Serialize>(
    storage: &S,
    path: &str,
    rows: &[T],
) -> Result<String> {
    let data = to_csv(rows)?;
    storage.write_file(path, &data).await?;
    tracing::debug!("Wrote {} rows to {}", rows.len(), path);
    Ok(storage.full_path(path))
}

/// 讀取前一階段的輸出；檔案不存在時提示先執行哪個階段
pub async fn read_records<S: Storage, T: DeserializeOwned>(
    storage: &S,
    path: &str,
    produced_by: &str,
) -> Result<Vec<T>> {
    if !storage.exists(path).await {
        return Err(PipelineError::DataNotFoundError {
            message: format!(
                "{} not found. Run {} first.",
                storage.full_path(path),
                produced_by
            ),
        });
    }
    let data = storage.read_file(path).await?;
    from_csv(&data)
}

//! 테이블 파일 보관.
//!
//! 수집한 테이블을 JSON 파일로 저장하고 되읽습니다. 데이터베이스가
//! 없는 환경에서 수집 결과를 남겨 두는 용도입니다.

use std::path::Path;
use tracing::info;

use krstock_core::error::{Result, StockError};
use krstock_core::frame::RawFrame;

/// 테이블을 JSON 파일로 저장합니다.
pub async fn save_frame<P: AsRef<Path>>(frame: &RawFrame, path: P) -> Result<()> {
    let path = path.as_ref();
    let body = serde_json::to_string_pretty(frame)
        .map_err(|e| StockError::Database(format!("테이블 직렬화 실패: {}", e)))?;

    tokio::fs::write(path, body)
        .await
        .map_err(|e| StockError::Database(format!("파일 쓰기 실패 ({}): {}", path.display(), e)))?;

    info!(path = %path.display(), rows = frame.len(), "테이블 저장 완료");
    Ok(())
}

/// JSON 파일에서 테이블을 되읽습니다.
pub async fn load_frame<P: AsRef<Path>>(path: P) -> Result<RawFrame> {
    let path = path.as_ref();
    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StockError::Database(format!("파일 읽기 실패 ({}): {}", path.display(), e)))?;

    serde_json::from_str(&body)
        .map_err(|e| StockError::Database(format!("테이블 역직렬화 실패: {}", e)))
}

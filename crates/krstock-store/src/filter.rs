//! 거래 대상이 아닌 종목을 걸러내는 필터.

use krstock_core::frame::{columns, DailyKey, Frame, Value};

/// 거래 대상이 아닌 행을 제거한 사본을 반환합니다.
///
/// - 종목명이 숫자+'호'로 끝나는 행 (선박·부동산 투자회사 등)
/// - 종목명에 '스팩'이 들어간 행
/// - 종목코드가 '0'으로 끝나지 않는 행 (우선주)
/// - 시장ID 컬럼이 있으면 STK/KSQ 외 시장의 행
pub fn drop_untradable(frame: &Frame<DailyKey>) -> Frame<DailyKey> {
    let name_idx = frame.column_index(columns::NAME);
    let market_id_idx = frame.column_index(columns::MARKET_ID);

    frame.filtered(|key, row| {
        if !key.symbol.ends_with('0') {
            return false;
        }
        if let Some(idx) = name_idx {
            if let Value::Text(name) = &row[idx] {
                if name.contains("스팩") || is_numbered_series(name) {
                    return false;
                }
            }
        }
        if let Some(idx) = market_id_idx {
            match &row[idx] {
                Value::Text(id) => {
                    if !id.contains("STK") && !id.contains("KSQ") {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    })
}

fn is_numbered_series(name: &str) -> bool {
    match name.strip_suffix('호') {
        Some(head) => head.chars().next_back().is_some_and(|c| c.is_ascii_digit()),
        None => false,
    }
}

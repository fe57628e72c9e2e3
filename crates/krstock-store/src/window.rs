//! 최근 일자 범위로 테이블을 좁히는 순수 함수.

use krstock_core::frame::{DailyKey, Frame};

/// 가장 최근 `days`개 일자의 행만 남긴 사본을 반환합니다.
///
/// 서로 다른 일자 수가 `days` 이하이면 그대로 복사해 돌려주고,
/// `days`가 0이면 빈 테이블을 돌려줍니다.
pub fn recent_window(frame: &Frame<DailyKey>, days: usize) -> Frame<DailyKey> {
    if days == 0 {
        return frame.filtered(|_, _| false);
    }
    let dates = frame.distinct_dates();
    if dates.len() <= days {
        return frame.clone();
    }
    let cutoff = dates[dates.len() - days];
    frame.filtered(|key, _| key.date >= cutoff)
}

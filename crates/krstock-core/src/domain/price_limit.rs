//! 가격 라운딩과 상·하한가 계산 모듈.
//!
//! KRX 가격제한폭(정규장 ±30%, 시간외 단일가 ±10%)을 호가단위에 맞춰
//! 계산합니다. 상한은 배율 적용 후 내림, 하한은 올림을 써서 밴드가
//! 규정 퍼센트 안쪽에 머물도록 합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{MarketRegime, Side, TradingSession};

use super::price_unit::{price_unit, UnitTable};

/// 올림 라운딩의 보정값. 올림 전에 이 값을 빼므로 이미 호가단위에
/// 맞는 정수 가격은 제자리에 머뭅니다.
const ROUND_UP_FUDGE: Decimal = dec!(0.1);

/// 가격을 호가단위의 배수로 내립니다.
pub fn round_down(price: Decimal, regime: MarketRegime) -> Decimal {
    let unit = price_unit(price, regime);
    (price / unit).floor() * unit
}

/// 가격을 호가단위의 배수로 올립니다. 호가단위에 이미 맞는 정수
/// 가격은 그대로 돌려줍니다.
pub fn round_up(price: Decimal, regime: MarketRegime) -> Decimal {
    let unit = price_unit(price, regime);
    ((price.ceil() + unit - ROUND_UP_FUDGE) / unit).floor() * unit
}

/// 여러 가격을 한 번에 내림합니다. 호가단위 구간표는 호출 전체에
/// 하나로 고정됩니다.
pub fn round_down_all(prices: &[Decimal], regime: MarketRegime) -> Vec<Decimal> {
    let table = UnitTable::for_regime(regime);
    prices
        .iter()
        .map(|&price| {
            let unit = table.unit(price);
            (price / unit).floor() * unit
        })
        .collect()
}

/// 여러 가격을 한 번에 올림합니다.
pub fn round_up_all(prices: &[Decimal], regime: MarketRegime) -> Vec<Decimal> {
    let table = UnitTable::for_regime(regime);
    prices
        .iter()
        .map(|&price| {
            let unit = table.unit(price);
            ((price.ceil() + unit - ROUND_UP_FUDGE) / unit).floor() * unit
        })
        .collect()
}

fn upper_ratio(session: TradingSession) -> Decimal {
    match session {
        TradingSession::Regular => dec!(1.30),
        TradingSession::AfterHours => dec!(1.10),
    }
}

fn lower_ratio(session: TradingSession) -> Decimal {
    match session {
        TradingSession::Regular => dec!(0.70),
        TradingSession::AfterHours => dec!(0.90),
    }
}

/// 기준가로부터 상한가를 계산합니다.
///
/// 밴드 계산은 항상 현행 호가단위 구간표를 사용합니다.
pub fn upper_limit(reference: Decimal, session: TradingSession) -> Decimal {
    round_down(reference * upper_ratio(session), MarketRegime::Current)
}

/// 기준가로부터 하한가를 계산합니다.
pub fn lower_limit(reference: Decimal, session: TradingSession) -> Decimal {
    round_up(reference * lower_ratio(session), MarketRegime::Current)
}

/// 주문 방향에 해당하는 한계 가격. 매수는 상한가, 매도는 하한가입니다.
pub fn price_limit(reference: Decimal, side: Side, session: TradingSession) -> Decimal {
    match side {
        Side::Buy => upper_limit(reference, session),
        Side::Sell => lower_limit(reference, session),
    }
}

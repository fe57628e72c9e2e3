//! 가격대별 호가단위(최소 호가 간격) 조회 모듈.
//!
//! 2023-01-25 호가단위 통합 개편 이후의 공통 구간표와, 개편 이전의
//! 코스피/코스닥 구간표를 함께 제공합니다. 과거 일자 데이터를 다룰 때는
//! 해당 시점의 구간표를 골라 써야 합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::MarketRegime;

/// 2023-01-25 개편 이후 공통 구간표
const CURRENT_STEPS: &[(Decimal, Decimal)] = &[
    (dec!(0), dec!(1)),
    (dec!(2_000), dec!(5)),
    (dec!(5_000), dec!(10)),
    (dec!(20_000), dec!(50)),
    (dec!(50_000), dec!(100)),
    (dec!(200_000), dec!(500)),
    (dec!(500_000), dec!(1_000)),
];

/// 개편 이전 코스피 구간표
const LEGACY_KOSPI_STEPS: &[(Decimal, Decimal)] = &[
    (dec!(0), dec!(1)),
    (dec!(1_000), dec!(5)),
    (dec!(5_000), dec!(10)),
    (dec!(10_000), dec!(50)),
    (dec!(50_000), dec!(100)),
    (dec!(100_000), dec!(500)),
    (dec!(500_000), dec!(1_000)),
];

/// 개편 이전 코스닥 구간표
const LEGACY_KOSDAQ_STEPS: &[(Decimal, Decimal)] = &[
    (dec!(0), dec!(1)),
    (dec!(1_000), dec!(5)),
    (dec!(5_000), dec!(10)),
    (dec!(10_000), dec!(50)),
    (dec!(50_000), dec!(100)),
];

/// 호가단위 구간표. (구간 하한, 호가단위) 쌍의 오름차순 목록입니다.
///
/// 구간은 하한 포함, 상한 미포함입니다. 경계값과 정확히 같은 가격은
/// 윗구간에 속합니다.
#[derive(Debug, Clone, Copy)]
pub struct UnitTable {
    steps: &'static [(Decimal, Decimal)],
}

impl UnitTable {
    /// 적용할 구간표를 선택합니다.
    pub fn for_regime(regime: MarketRegime) -> UnitTable {
        let steps = match regime {
            MarketRegime::Current => CURRENT_STEPS,
            MarketRegime::LegacyKospi => LEGACY_KOSPI_STEPS,
            MarketRegime::LegacyKosdaq => LEGACY_KOSDAQ_STEPS,
        };
        UnitTable { steps }
    }

    /// 가격이 속한 구간의 호가단위를 반환합니다.
    pub fn unit(&self, price: Decimal) -> Decimal {
        let mut unit = self.steps[0].1;
        for &(lower, step) in self.steps {
            if price < lower {
                break;
            }
            unit = step;
        }
        unit
    }

    /// 여러 가격의 호가단위를 한 번에 조회합니다.
    pub fn units(&self, prices: &[Decimal]) -> Vec<Decimal> {
        prices.iter().map(|&p| self.unit(p)).collect()
    }
}

/// 단일 가격의 호가단위를 반환합니다.
///
/// `UnitTable`을 거치지 않는 단순 분기 경로이며, 모든 가격에서
/// `UnitTable::unit`과 같은 값을 돌려줍니다.
pub fn price_unit(price: Decimal, regime: MarketRegime) -> Decimal {
    match regime {
        MarketRegime::Current => current_unit(price),
        MarketRegime::LegacyKospi => legacy_kospi_unit(price),
        MarketRegime::LegacyKosdaq => legacy_kosdaq_unit(price),
    }
}

/// 2023-01-25 개편 이후 공통 호가단위:
/// - 2,000원 미만: 1원
/// - 2,000원 이상 ~ 5,000원 미만: 5원
/// - 5,000원 이상 ~ 20,000원 미만: 10원
/// - 20,000원 이상 ~ 50,000원 미만: 50원
/// - 50,000원 이상 ~ 200,000원 미만: 100원
/// - 200,000원 이상 ~ 500,000원 미만: 500원
/// - 500,000원 이상: 1,000원
fn current_unit(price: Decimal) -> Decimal {
    if price < dec!(2_000) {
        dec!(1)
    } else if price < dec!(5_000) {
        dec!(5)
    } else if price < dec!(20_000) {
        dec!(10)
    } else if price < dec!(50_000) {
        dec!(50)
    } else if price < dec!(200_000) {
        dec!(100)
    } else if price < dec!(500_000) {
        dec!(500)
    } else {
        dec!(1_000)
    }
}

/// 개편 이전 코스피 호가단위:
/// - 1,000원 미만: 1원
/// - 1,000원 이상 ~ 5,000원 미만: 5원
/// - 5,000원 이상 ~ 10,000원 미만: 10원
/// - 10,000원 이상 ~ 50,000원 미만: 50원
/// - 50,000원 이상 ~ 100,000원 미만: 100원
/// - 100,000원 이상 ~ 500,000원 미만: 500원
/// - 500,000원 이상: 1,000원
fn legacy_kospi_unit(price: Decimal) -> Decimal {
    if price < dec!(1_000) {
        dec!(1)
    } else if price < dec!(5_000) {
        dec!(5)
    } else if price < dec!(10_000) {
        dec!(10)
    } else if price < dec!(50_000) {
        dec!(50)
    } else if price < dec!(100_000) {
        dec!(100)
    } else if price < dec!(500_000) {
        dec!(500)
    } else {
        dec!(1_000)
    }
}

/// 개편 이전 코스닥 호가단위:
/// - 1,000원 미만: 1원
/// - 1,000원 이상 ~ 5,000원 미만: 5원
/// - 5,000원 이상 ~ 10,000원 미만: 10원
/// - 10,000원 이상 ~ 50,000원 미만: 50원
/// - 50,000원 이상: 100원
fn legacy_kosdaq_unit(price: Decimal) -> Decimal {
    if price < dec!(1_000) {
        dec!(1)
    } else if price < dec!(5_000) {
        dec!(5)
    } else if price < dec!(10_000) {
        dec!(10)
    } else if price < dec!(50_000) {
        dec!(50)
    } else {
        dec!(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_unit_brackets() {
        let regime = MarketRegime::Current;

        // 각 구간 경계 테스트
        assert_eq!(price_unit(dec!(0), regime), dec!(1));
        assert_eq!(price_unit(dec!(1_500), regime), dec!(1));
        assert_eq!(price_unit(dec!(1_999), regime), dec!(1));
        assert_eq!(price_unit(dec!(2_000), regime), dec!(5));
        assert_eq!(price_unit(dec!(4_999), regime), dec!(5));
        assert_eq!(price_unit(dec!(5_000), regime), dec!(10));
        assert_eq!(price_unit(dec!(19_999), regime), dec!(10));
        assert_eq!(price_unit(dec!(20_000), regime), dec!(50));
        assert_eq!(price_unit(dec!(49_999), regime), dec!(50));
        assert_eq!(price_unit(dec!(50_000), regime), dec!(100));
        assert_eq!(price_unit(dec!(199_999), regime), dec!(100));
        assert_eq!(price_unit(dec!(200_000), regime), dec!(500));
        assert_eq!(price_unit(dec!(499_999), regime), dec!(500));
        assert_eq!(price_unit(dec!(500_000), regime), dec!(1_000));
        assert_eq!(price_unit(dec!(1_000_000), regime), dec!(1_000));
    }

    #[test]
    fn test_legacy_kospi_unit_brackets() {
        let regime = MarketRegime::LegacyKospi;

        assert_eq!(price_unit(dec!(999), regime), dec!(1));
        assert_eq!(price_unit(dec!(1_000), regime), dec!(5));
        assert_eq!(price_unit(dec!(1_500), regime), dec!(5));
        assert_eq!(price_unit(dec!(4_999), regime), dec!(5));
        assert_eq!(price_unit(dec!(5_000), regime), dec!(10));
        assert_eq!(price_unit(dec!(9_999), regime), dec!(10));
        assert_eq!(price_unit(dec!(10_000), regime), dec!(50));
        assert_eq!(price_unit(dec!(49_999), regime), dec!(50));
        assert_eq!(price_unit(dec!(50_000), regime), dec!(100));
        assert_eq!(price_unit(dec!(99_999), regime), dec!(100));
        assert_eq!(price_unit(dec!(100_000), regime), dec!(500));
        assert_eq!(price_unit(dec!(499_999), regime), dec!(500));
        assert_eq!(price_unit(dec!(500_000), regime), dec!(1_000));
    }

    #[test]
    fn test_legacy_kosdaq_unit_brackets() {
        let regime = MarketRegime::LegacyKosdaq;

        assert_eq!(price_unit(dec!(999), regime), dec!(1));
        assert_eq!(price_unit(dec!(1_000), regime), dec!(5));
        assert_eq!(price_unit(dec!(1_500), regime), dec!(5));
        assert_eq!(price_unit(dec!(9_999), regime), dec!(10));
        assert_eq!(price_unit(dec!(49_999), regime), dec!(50));
        // 코스닥 과거 구간표는 50,000원 이상이 전부 100원
        assert_eq!(price_unit(dec!(50_000), regime), dec!(100));
        assert_eq!(price_unit(dec!(500_000), regime), dec!(100));
        assert_eq!(price_unit(dec!(1_000_000), regime), dec!(100));
    }

    #[test]
    fn test_table_matches_branch_chain() {
        let boundaries = [
            dec!(0),
            dec!(999),
            dec!(1_000),
            dec!(1_999),
            dec!(2_000),
            dec!(4_999),
            dec!(5_000),
            dec!(9_999),
            dec!(10_000),
            dec!(19_999),
            dec!(20_000),
            dec!(49_999),
            dec!(50_000),
            dec!(99_999),
            dec!(100_000),
            dec!(199_999),
            dec!(200_000),
            dec!(499_999),
            dec!(500_000),
            dec!(2_000_000),
        ];
        for regime in [
            MarketRegime::Current,
            MarketRegime::LegacyKospi,
            MarketRegime::LegacyKosdaq,
        ] {
            let table = UnitTable::for_regime(regime);
            for price in boundaries {
                assert_eq!(
                    table.unit(price),
                    price_unit(price, regime),
                    "{} @ {}",
                    regime,
                    price
                );
            }
            assert_eq!(table.units(&boundaries).len(), boundaries.len());
        }
    }

    #[test]
    fn test_negative_price_uses_lowest_bracket() {
        // 결측 표시로 -1이 흘러들어와도 두 경로가 같은 값을 돌려줘야 한다
        let table = UnitTable::for_regime(MarketRegime::Current);
        assert_eq!(table.unit(dec!(-1)), dec!(1));
        assert_eq!(price_unit(dec!(-1), MarketRegime::Current), dec!(1));
    }
}

//! 하루치 시세 스냅샷 저장소.
//!
//! 종목코드를 유일 키로 하는 단일 일자 테이블을 보관하며, 종목코드와
//! 종목명 사이의 조회를 제공합니다. `HistoryStore`가 파생 스냅샷을
//! 유지할 때도 이 타입을 사용합니다.

use chrono::NaiveDate;
use tracing::{info, warn};

use krstock_core::domain::DailyQuoteSource;
use krstock_core::error::{Result, StockError};
use krstock_core::frame::{columns, Frame, RawFrame, Value};
use krstock_core::types::Market;

/// 하루치 시세 스냅샷.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    frame: Frame<String>,
    date: Option<NaiveDate>,
}

impl SnapshotStore {
    /// 빈 스냅샷을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 테이블 전체를 교체합니다.
    ///
    /// - 종목코드 컬럼이 없으면 `Schema` 에러
    /// - 중복된 컬럼 이름은 첫 번째 것만 유지
    /// - 중복된 종목코드는 `Validation` 에러
    /// - 일자 컬럼이 있으면 모든 행이 같은 달력 날짜여야 하며
    ///   그 날짜를 스냅샷 일자로 기억합니다
    ///
    /// 어떤 에러에서도 기존 상태는 바뀌지 않습니다.
    pub fn set(&mut self, raw: &RawFrame) -> Result<()> {
        let mut normalized = raw.clone();
        normalized.normalize_date_column(columns::DATE)?;
        let frame = Frame::<String>::from_raw(&normalized)?;

        let mut date = None;
        if let Some(idx) = frame.column_index(columns::DATE) {
            for (symbol, row) in frame.iter() {
                match &row[idx] {
                    Value::Date(d) => match date {
                        None => date = Some(*d),
                        Some(prev) if prev == *d => {}
                        Some(prev) => {
                            return Err(StockError::Validation(format!(
                                "하루치 테이블에 서로 다른 일자가 섞여 있습니다: {}, {} ({})",
                                prev, d, symbol
                            )))
                        }
                    },
                    other => {
                        return Err(StockError::Validation(format!(
                            "일자 컬럼에 날짜가 아닌 값이 있습니다: '{}' ({})",
                            other, symbol
                        )))
                    }
                }
            }
        }

        self.frame = frame;
        self.date = date;
        info!(rows = self.frame.len(), date = ?self.date, "스냅샷 교체 완료");
        Ok(())
    }

    /// 종목코드로 종목명을 조회합니다.
    pub fn lookup_name(&self, symbol: &str) -> Result<&str> {
        let idx = self
            .frame
            .column_index(columns::NAME)
            .ok_or_else(|| StockError::Schema("종목명 컬럼이 없습니다".to_string()))?;
        let row = self
            .frame
            .get(symbol)
            .ok_or_else(|| StockError::NotFound(format!("종목코드 {}", symbol)))?;
        match &row[idx] {
            Value::Text(name) => Ok(name.as_str()),
            _ => Err(StockError::NotFound(format!(
                "종목코드 {}의 종목명이 비어 있습니다",
                symbol
            ))),
        }
    }

    /// 여러 종목코드의 종목명을 한 번에 조회합니다. 하나라도 없으면
    /// `NotFound` 에러입니다.
    pub fn lookup_names<I, S>(&self, symbols: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        symbols
            .into_iter()
            .map(|s| self.lookup_name(s.as_ref()).map(str::to_string))
            .collect()
    }

    /// 종목명으로 종목코드를 조회합니다.
    ///
    /// 같은 종목명이 여러 건이면 종목코드 오름차순으로 첫 번째 것을
    /// 반환하고 경고를 남깁니다.
    pub fn lookup_symbol(&self, name: &str) -> Result<&str> {
        let idx = self
            .frame
            .column_index(columns::NAME)
            .ok_or_else(|| StockError::Schema("종목명 컬럼이 없습니다".to_string()))?;
        let mut matches = self.frame.iter().filter_map(|(symbol, row)| match &row[idx] {
            Value::Text(n) if n == name => Some(symbol.as_str()),
            _ => None,
        });
        let first = matches
            .next()
            .ok_or_else(|| StockError::NotFound(format!("종목명 {}", name)))?;
        let duplicates = matches.count();
        if duplicates > 0 {
            warn!(
                name,
                total = duplicates + 1,
                "같은 종목명이 여러 건이라 첫 번째 종목코드를 반환합니다"
            );
        }
        Ok(first)
    }

    /// 여러 종목명의 종목코드를 한 번에 조회합니다.
    pub fn lookup_symbols<I, S>(&self, names: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| self.lookup_symbol(n.as_ref()).map(str::to_string))
            .collect()
    }

    /// 종목코드 목록 (오름차순).
    pub fn symbols(&self) -> Vec<String> {
        self.frame.keys().cloned().collect()
    }

    /// 종목명 목록 (종목코드 오름차순). 종목명 컬럼이 없으면 `Schema`
    /// 에러입니다.
    pub fn names(&self) -> Result<Vec<String>> {
        let idx = self
            .frame
            .column_index(columns::NAME)
            .ok_or_else(|| StockError::Schema("종목명 컬럼이 없습니다".to_string()))?;
        Ok(self.frame.iter().map(|(_, row)| row[idx].to_string()).collect())
    }

    /// 스냅샷의 일자.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// 소스에서 가장 최근 거래일 테이블을 받아 스냅샷을 교체합니다.
    pub async fn refresh_from_source(
        &mut self,
        source: &dyn DailyQuoteSource,
        market: Market,
    ) -> Result<()> {
        let raw = source.fetch_recent(market).await?;
        self.set(&raw)
    }

    /// 행과 기억한 일자를 비웁니다. 컬럼 구성은 유지합니다.
    pub fn clear(&mut self) {
        self.frame = Frame::new(self.frame.columns().to_vec());
        self.date = None;
    }

    /// 보관 중인 테이블.
    pub fn frame(&self) -> &Frame<String> {
        &self.frame
    }

    /// 행 수.
    pub fn len(&self) -> usize {
        self.frame.len()
    }

    /// 행이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// 파생 스냅샷을 직접 끼워 넣습니다. `HistoryStore`가 최근 일자
    /// 슬라이스를 만들 때만 사용하며, 일자 컬럼 없이 일자를 따로
    /// 전달받습니다.
    pub(crate) fn replace_derived(&mut self, frame: Frame<String>, date: Option<NaiveDate>) {
        self.frame = frame;
        self.date = date;
    }
}

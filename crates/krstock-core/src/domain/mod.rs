//! 국내 주식 시세를 위한 도메인 모델.

mod daily_quote;
mod price_limit;
mod price_unit;
mod source;

pub use daily_quote::*;
pub use price_limit::*;
pub use price_unit::*;
pub use source::*;

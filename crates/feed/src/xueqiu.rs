//! 雪球行情详情接口的报文解析。

use kabu_core::market::entity::{DIVIDEND_YIELD_TTM, ValuationSnapshot, ValuationValue};
use kabu_core::market::error::MarketError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 访问行情接口所需的 Cookie 名称。
pub const TOKEN_COOKIE: &str = "xq_a_token";

/// 接口字段到估值条目名的映射，顺序即展示顺序。
const ITEMS: [(&str, &str); 11] = [
    ("name", "名称"),
    ("dividend_yield", DIVIDEND_YIELD_TTM),
    ("dividend", "股息(TTM)"),
    ("pe_ttm", "市盈率(TTM)"),
    ("pe_lyr", "市盈率(静)"),
    ("pe_forecast", "市盈率(动)"),
    ("pb", "市净率"),
    ("eps", "每股收益"),
    ("navps", "每股净资产"),
    ("market_capital", "总市值"),
    ("float_market_capital", "流通值"),
];

#[derive(Deserialize, Debug)]
struct XqResponse {
    #[serde(default)]
    data: Option<XqData>,
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_description: String,
}

#[derive(Deserialize, Debug)]
struct XqData {
    #[serde(default)]
    quote: Option<Map<String, Value>>,
}

/// # Summary
/// 从 `Set-Cookie` 头中取出指定 Cookie 的值。
///
/// # Arguments
/// * `headers`: 各条 `Set-Cookie` 头的文本。
/// * `name`: Cookie 名称。
pub fn extract_cookie<'a>(headers: impl IntoIterator<Item = &'a str>, name: &str) -> Option<String> {
    headers.into_iter().find_map(|h| {
        let pair = h.split(';').next()?.trim();
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name && !value.is_empty()).then(|| value.to_string())
    })
}

/// # Summary
/// 解析行情详情响应为估值快照。
///
/// # Logic
/// 1. `error_code` 非 0 时视为数据不可用 (通常是令牌失效)。
/// 2. 按字段映射收集条目，`null` 字段跳过。
///
/// # Returns
/// 估值快照；没有 `quote` 节点时返回空快照。
pub fn parse_quote_detail(body: &str) -> Result<ValuationSnapshot, MarketError> {
    let resp: XqResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;
    if resp.error_code != 0 {
        return Err(MarketError::DataUnavailable(format!(
            "xueqiu error {}: {}",
            resp.error_code, resp.error_description
        )));
    }
    let Some(quote) = resp.data.and_then(|d| d.quote) else {
        return Ok(ValuationSnapshot::default());
    };

    let items: BTreeMap<String, ValuationValue> = ITEMS
        .iter()
        .filter_map(|(field, label)| {
            let value = match quote.get(*field)? {
                Value::Number(n) => ValuationValue::Number(n.as_f64().filter(|v| v.is_finite())?),
                Value::String(s) if !s.is_empty() => ValuationValue::Text(s.clone()),
                _ => return None,
            };
            Some((label.to_string(), value))
        })
        .collect();
    Ok(ValuationSnapshot::new(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_cookie() {
        let headers = [
            "acw_tc=2760827; path=/; HttpOnly",
            "xq_a_token=4bd8b1f9c1a3; domain=.xueqiu.com; path=/; HttpOnly",
        ];
        assert_eq!(
            extract_cookie(headers, TOKEN_COOKIE),
            Some("4bd8b1f9c1a3".to_string())
        );
        assert_eq!(extract_cookie(["xq_a_token=; path=/"], TOKEN_COOKIE), None);
        assert_eq!(extract_cookie(Vec::<&str>::new(), TOKEN_COOKIE), None);
    }

    #[test]
    fn test_parse_quote_detail() {
        let body = r#"{
            "data": {
                "market": {"status": "已收盘"},
                "quote": {
                    "symbol": "SH600519", "name": "贵州茅台", "dividend_yield": 3.46,
                    "pe_ttm": 21.8, "pb": 7.9, "market_capital": 1.93e12, "pe_forecast": null
                }
            },
            "error_code": 0,
            "error_description": ""
        }"#;
        let snapshot = parse_quote_detail(body).unwrap();
        assert_eq!(snapshot.dividend_yield(), Some(3.46));
        assert_eq!(snapshot.number("市盈率(TTM)"), Some(21.8));
        assert_eq!(
            snapshot.get("名称"),
            Some(&ValuationValue::Text("贵州茅台".to_string()))
        );
        assert!(snapshot.get("市盈率(动)").is_none());
    }

    #[test]
    fn test_parse_quote_detail_error_and_empty() {
        let denied = r#"{"data": null, "error_code": 400016, "error_description": "重新登录"}"#;
        assert!(matches!(
            parse_quote_detail(denied),
            Err(MarketError::DataUnavailable(_))
        ));

        let empty = r#"{"data": {"quote": null}, "error_code": 0}"#;
        assert!(parse_quote_detail(empty).unwrap().is_empty());

        assert!(matches!(parse_quote_detail("<html>"), Err(MarketError::Parse(_))));
    }
}

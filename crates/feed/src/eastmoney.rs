use async_trait::async_trait;
use chrono::NaiveDate;
use kabu_core::common::{Adjustment, Exchange, Stock};
use kabu_core::config::FeedConfig;
use kabu_core::market::entity::{
    FinancialReport, FundFlowEntry, PriceBar, QuoteSnapshot, ValuationSnapshot,
};
use kabu_core::market::error::MarketError;
use kabu_core::market::port::MarketDataProvider;
use crate::xueqiu;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// # Summary
/// 东方财富行情数据提供者实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯。
/// - 日 K 线、实时行情、资金流向与财务摘要来自东方财富；估值快照来自雪球行情详情。
#[derive(Clone)]
pub struct EastmoneyProvider {
    client: Client,
    quote_base_url: String,
    history_base_url: String,
    datacenter_base_url: String,
    xueqiu_base_url: String,
    xueqiu_home_url: String,
    xueqiu_token: Option<String>,
}

impl EastmoneyProvider {
    /// # Summary
    /// 创建东方财富数据源。
    ///
    /// # Logic
    /// 1. 按配置设置超时。
    /// 2. 设置浏览器 User-Agent 以减少被拦截风险。
    ///
    /// # Arguments
    /// * `config`: 数据源配置。
    ///
    /// # Returns
    /// 成功返回数据源；HTTP 客户端构建失败返回 `MarketError::Network`。
    pub fn new(config: &FeedConfig) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketError::Network(e.to_string()))?;
        Ok(Self {
            client,
            quote_base_url: config.quote_base_url.trim_end_matches('/').to_string(),
            history_base_url: config.history_base_url.trim_end_matches('/').to_string(),
            datacenter_base_url: config.datacenter_base_url.trim_end_matches('/').to_string(),
            xueqiu_base_url: config.xueqiu_base_url.trim_end_matches('/').to_string(),
            xueqiu_home_url: config.xueqiu_home_url.clone(),
            xueqiu_token: config.xueqiu_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// 发送请求并读取响应正文，非 2xx 状态视为网络错误。
    async fn send_text(&self, request: RequestBuilder, url: &str) -> Result<String, MarketError> {
        let resp = request
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            warn!(url, status = %resp.status(), "Upstream request failed");
            return Err(MarketError::Network(format!("HTTP {}", resp.status())));
        }

        resp.text()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))
    }

    /// 发起 GET 请求并解析 JSON 响应。
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketError> {
        let body = self.send_text(self.client.get(url).query(query), url).await?;
        serde_json::from_str(&body).map_err(|e| MarketError::Parse(e.to_string()))
    }

    /// # Summary
    /// 取得雪球接口令牌。
    ///
    /// # Logic
    /// 1. 优先使用配置中的令牌。
    /// 2. 否则访问雪球首页，从 `Set-Cookie` 中取出 `xq_a_token`。
    async fn xueqiu_token(&self) -> Result<String, MarketError> {
        if let Some(token) = &self.xueqiu_token {
            return Ok(token.clone());
        }
        let resp = self
            .client
            .get(&self.xueqiu_home_url)
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;
        let cookies = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok());
        xueqiu::extract_cookie(cookies, xueqiu::TOKEN_COOKIE).ok_or_else(|| {
            MarketError::DataUnavailable("xueqiu did not issue an access token".to_string())
        })
    }
}

/// 证券在东方财富接口中的 `secid`，上交所为 `1.`，其余为 `0.`。
pub fn secid(stock: &Stock) -> String {
    match stock.exchange {
        Exchange::Sh => format!("1.{}", stock.symbol),
        Exchange::Sz | Exchange::Bj => format!("0.{}", stock.symbol),
    }
}

/// 证券在 F10 数据中心中的 `SECUCODE`，例如 `600519.SH`。
pub fn secucode(stock: &Stock) -> String {
    format!("{}.{}", stock.symbol, stock.exchange.prefix())
}

fn fqt(adjustment: Adjustment) -> &'static str {
    match adjustment {
        Adjustment::None => "0",
        Adjustment::Qfq => "1",
        Adjustment::Hfq => "2",
    }
}

/// # Summary
/// 东方财富接口通用响应外壳。
#[derive(Deserialize, Debug)]
struct EmResponse<T> {
    data: Option<T>,
}

/// # Summary
/// K 线与资金流向接口的数据部分，每行为逗号分隔的文本。
#[derive(Deserialize, Debug)]
struct EmKlines {
    #[serde(default)]
    klines: Vec<String>,
}

/// # Summary
/// 实时行情接口的数据部分。
///
/// # Invariants
/// - 停牌或无数据时数值字段为字符串 `"-"`，统一按 `Value` 接收。
#[derive(Deserialize, Debug)]
struct EmQuote {
    // 最新价
    #[serde(default)]
    f43: Value,
    // 代码
    #[serde(default)]
    f57: Value,
    // 名称
    #[serde(default)]
    f58: Value,
    // 总市值
    #[serde(default)]
    f116: Value,
    // 动态市盈率
    #[serde(default)]
    f162: Value,
    // 市净率
    #[serde(default)]
    f167: Value,
    // 涨跌幅
    #[serde(default)]
    f170: Value,
}

fn value_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// 解析数值文本，`-` 与空串视为缺失。
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    s.parse::<f64>().ok().filter(|x| x.is_finite())
}

fn required(fields: &[&str], idx: usize, line: &str) -> Result<f64, MarketError> {
    fields
        .get(idx)
        .and_then(|s| parse_number(s))
        .ok_or_else(|| MarketError::Parse(format!("bad field {} in line: {}", idx, line)))
}

fn parse_date(raw: Option<&&str>, line: &str) -> Result<NaiveDate, MarketError> {
    raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .ok_or_else(|| MarketError::Parse(format!("bad date in line: {}", line)))
}

/// # Summary
/// 解析一行日 K 线文本。
///
/// # Logic
/// 字段顺序为：日期, 开盘, 收盘, 最高, 最低, 成交量, ...
pub fn parse_kline_line(line: &str) -> Result<PriceBar, MarketError> {
    let fields: Vec<&str> = line.split(',').collect();
    Ok(PriceBar {
        date: parse_date(fields.first(), line)?,
        open: required(&fields, 1, line)?,
        close: required(&fields, 2, line)?,
        high: required(&fields, 3, line)?,
        low: required(&fields, 4, line)?,
        volume: required(&fields, 5, line)?,
    })
}

/// # Summary
/// 解析一行资金流向文本。
///
/// # Logic
/// 字段顺序为：日期, 主力净额, 小单, 中单, 大单, 超大单, 主力净占比, 小单占比, 中单占比,
/// 大单占比, 超大单占比, 收盘价, 涨跌幅, ...
pub fn parse_fund_flow_line(line: &str) -> Result<FundFlowEntry, MarketError> {
    let fields: Vec<&str> = line.split(',').collect();
    let optional = |idx: usize| fields.get(idx).and_then(|s| parse_number(s));
    Ok(FundFlowEntry {
        date: parse_date(fields.first(), line)?,
        main_net_inflow: required(&fields, 1, line)?,
        main_net_ratio: optional(6),
        close: optional(11),
        pct_change: optional(12),
    })
}

/// F10 数据中心响应外壳；无数据时 `result` 为 `null`。
#[derive(Deserialize, Debug)]
struct DcResponse {
    result: Option<DcResult>,
}

#[derive(Deserialize, Debug)]
struct DcResult {
    #[serde(default)]
    data: Vec<Map<String, Value>>,
}

/// 财务主要指标中用于展示的字段。
const FINANCE_EXTRA: [(&str, &str); 6] = [
    ("REPORT_DATE_NAME", "报告期名称"),
    ("TOTALOPERATEREVE", "营业总收入"),
    ("PARENTNETPROFIT", "归母净利润"),
    ("EPSJB", "基本每股收益"),
    ("ROEJQ", "净资产收益率"),
    ("XSMLL", "毛利率"),
];

fn field_text(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// 同比增长率字段转为带百分号的文本，与成长性维度的解析格式一致。
fn yoy_text(row: &Map<String, Value>, field: &str) -> Option<String> {
    row.get(field).and_then(value_f64).map(|v| format!("{:.2}%", v))
}

/// # Summary
/// 解析财务主要指标响应。
///
/// # Logic
/// 1. `result` 为空视为无数据，返回空列表。
/// 2. 报告期取 `REPORT_DATE` 的日期部分，缺失即为格式错误。
/// 3. 营收与归母净利润同比增长率分别取 `TOTALOPERATEREVETZ` 与 `PARENTNETPROFITTZ`。
/// 4. 按报告期降序排列，最近一期在前。
pub fn parse_finance_response(body: &str) -> Result<Vec<FinancialReport>, MarketError> {
    let resp: DcResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;
    let rows = resp.result.map(|r| r.data).unwrap_or_default();

    let mut reports = rows
        .iter()
        .map(|row| {
            let report_period = row
                .get("REPORT_DATE")
                .and_then(Value::as_str)
                .and_then(|s| s.get(..10))
                .ok_or_else(|| MarketError::Parse("missing REPORT_DATE".to_string()))?
                .to_string();
            let extra: BTreeMap<String, String> = FINANCE_EXTRA
                .iter()
                .filter_map(|(field, label)| Some((label.to_string(), field_text(row.get(*field)?)?)))
                .collect();
            Ok(FinancialReport {
                report_period,
                revenue_yoy: yoy_text(row, "TOTALOPERATEREVETZ"),
                profit_yoy: yoy_text(row, "PARENTNETPROFITTZ"),
                extra,
            })
        })
        .collect::<Result<Vec<_>, MarketError>>()?;
    reports.sort_by(|a, b| b.report_period.cmp(&a.report_period));
    Ok(reports)
}

#[async_trait]
impl MarketDataProvider for EastmoneyProvider {
    /// # Summary
    /// 抓取日 K 线。
    ///
    /// # Logic
    /// 1. 按 `secid`、日期区间与复权方式构建请求 (`klt=101` 为日线)。
    /// 2. 逐行解析，任一行格式错误即返回 `MarketError::Parse`。
    /// 3. 结果为空时返回 `MarketError::DataUnavailable`。
    async fn fetch_price_series(
        &self,
        stock: &Stock,
        start: NaiveDate,
        end: NaiveDate,
        adjustment: Adjustment,
    ) -> Result<Vec<PriceBar>, MarketError> {
        let url = format!("{}/api/qt/stock/kline/get", self.history_base_url);
        let query = [
            ("secid", secid(stock)),
            ("fields1", "f1,f2,f3,f4,f5,f6".to_string()),
            ("fields2", "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61".to_string()),
            ("klt", "101".to_string()),
            ("fqt", fqt(adjustment).to_string()),
            ("beg", start.format("%Y%m%d").to_string()),
            ("end", end.format("%Y%m%d").to_string()),
        ];
        let resp: EmResponse<EmKlines> = self.get_json(&url, &query).await?;
        let lines = resp.data.map(|d| d.klines).unwrap_or_default();

        let bars = lines
            .iter()
            .map(|l| parse_kline_line(l))
            .collect::<Result<Vec<_>, _>>()?;
        if bars.is_empty() {
            return Err(MarketError::DataUnavailable(format!(
                "no daily bars for {} between {} and {}",
                stock, start, end
            )));
        }
        debug!(stock = %stock, bars = bars.len(), "Fetched daily bars");
        Ok(bars)
    }

    async fn fetch_quote_snapshot(
        &self,
        stock: &Stock,
    ) -> Result<Option<QuoteSnapshot>, MarketError> {
        let url = format!("{}/api/qt/stock/get", self.quote_base_url);
        let query = [
            ("secid", secid(stock)),
            ("fltt", "2".to_string()),
            ("fields", "f43,f57,f58,f116,f162,f167,f170".to_string()),
        ];
        let resp: EmResponse<EmQuote> = self.get_json(&url, &query).await?;
        let Some(q) = resp.data else {
            return Ok(None);
        };
        Ok(Some(QuoteSnapshot {
            symbol: q
                .f57
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| stock.symbol.clone()),
            name: q.f58.as_str().map(str::to_string),
            price: value_f64(&q.f43),
            pct_change: value_f64(&q.f170),
            pe: value_f64(&q.f162),
            pb: value_f64(&q.f167),
            market_cap: value_f64(&q.f116),
        }))
    }

    /// # Summary
    /// 抓取雪球行情详情作为估值快照 (股息率、市盈率等)。
    ///
    /// # Logic
    /// 1. 取得访问令牌并以 Cookie 方式携带。
    /// 2. 以带交易所前缀的代码请求 `extend=detail` 的行情详情。
    async fn fetch_valuation_snapshot(
        &self,
        stock: &Stock,
    ) -> Result<ValuationSnapshot, MarketError> {
        let token = self.xueqiu_token().await?;
        let url = format!("{}/v5/stock/quote.json", self.xueqiu_base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("symbol", stock.prefixed().as_str()), ("extend", "detail")])
            .header(COOKIE, format!("{}={}", xueqiu::TOKEN_COOKIE, token));
        let body = self.send_text(request, &url).await?;
        let snapshot = xueqiu::parse_quote_detail(&body)?;
        debug!(stock = %stock, items = snapshot.iter().count(), "Fetched valuation snapshot");
        Ok(snapshot)
    }

    /// # Summary
    /// 抓取逐日资金流向。
    ///
    /// # Returns
    /// 按日期升序的记录；接口无数据时返回 `Ok(None)`。
    async fn fetch_fund_flow(
        &self,
        stock: &Stock,
    ) -> Result<Option<Vec<FundFlowEntry>>, MarketError> {
        let url = format!("{}/api/qt/stock/fflow/daykline/get", self.history_base_url);
        let query = [
            ("secid", secid(stock)),
            ("lmt", "0".to_string()),
            ("klt", "101".to_string()),
            ("fields1", "f1,f2,f3,f7".to_string()),
            (
                "fields2",
                "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61,f62,f63,f64,f65".to_string(),
            ),
        ];
        let resp: EmResponse<EmKlines> = self.get_json(&url, &query).await?;
        let lines = resp.data.map(|d| d.klines).unwrap_or_default();
        if lines.is_empty() {
            return Ok(None);
        }
        let entries = lines
            .iter()
            .map(|l| parse_fund_flow_line(l))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(stock = %stock, market = stock.market(), days = entries.len(), "Fetched fund flow");
        Ok(Some(entries))
    }

    /// # Summary
    /// 抓取 F10 财务主要指标，按报告期降序。
    async fn fetch_financial_summary(
        &self,
        stock: &Stock,
    ) -> Result<Vec<FinancialReport>, MarketError> {
        let url = format!("{}/securities/api/data/get", self.datacenter_base_url);
        let query = [
            ("type", "RPT_F10_FINANCE_MAINFINADATA".to_string()),
            ("sty", "APP_F10_MAINFINADATA".to_string()),
            ("quoteColumns", String::new()),
            ("filter", format!("(SECUCODE=\"{}\")", secucode(stock))),
            ("p", "1".to_string()),
            ("ps", "8".to_string()),
            ("sr", "-1".to_string()),
            ("st", "REPORT_DATE".to_string()),
            ("source", "HSF10".to_string()),
            ("client", "PC".to_string()),
        ];
        let body = self
            .send_text(self.client.get(&url).query(&query), &url)
            .await?;
        let reports = parse_finance_response(&body)?;
        debug!(stock = %stock, reports = reports.len(), "Fetched financial summary");
        Ok(reports)
    }
}

//! Rakuten Ichiba product search, price comparison, and point-rate lookup.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::SkillError;
use crate::http;

const ICHIBA_SEARCH_ENDPOINT: &str =
    "https://app.rakuten.co.jp/services/api/IchibaItem/Search/20220601";
const SEARCH_HITS: &str = "30";

/// Optional search constraints. Prices are unsigned, so the "negative
/// price" input error cannot arise; only the min/max ordering is checked.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Rakuten genre (category) id, e.g. "100227".
    pub genre_id: Option<String>,
    /// Lower price bound in yen.
    pub min_price: Option<u32>,
    /// Upper price bound in yen.
    pub max_price: Option<u32>,
}

/// A normalized Ichiba item.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Item {
    pub name: String,
    pub price: i64,
    pub item_code: String,
    pub item_url: String,
    pub shop_name: String,
    pub shop_url: String,
    pub image_url: String,
    pub review_average: f64,
    pub review_count: u64,
    /// Point multiplier ("1" means the standard 1x).
    pub point: i64,
    pub availability: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageInfo {
    pub page: u32,
    pub page_count: u32,
    pub hits: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResults {
    pub items: Vec<Item>,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResults {
    fn unavailable(error: String) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page_info: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceComparison {
    /// Items sorted by ascending price (upstream `sort=+itemPrice`).
    pub items: Vec<Item>,
    pub lowest_price: i64,
    pub highest_price: i64,
    /// Mean over positive prices, rounded to whole yen.
    pub average_price: f64,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PriceComparison {
    fn unavailable(error: String) -> Self {
        Self {
            items: Vec::new(),
            lowest_price: 0,
            highest_price: 0,
            average_price: 0.0,
            total_count: 0,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PointRateInfo {
    pub item_name: String,
    pub price: i64,
    pub base_rate: i64,
    pub bonus_rate: i64,
    pub total_rate: i64,
    pub estimated_points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PointRateInfo {
    fn unavailable(error: String) -> Self {
        Self {
            item_name: String::new(),
            price: 0,
            base_rate: 0,
            bonus_rate: 0,
            total_rate: 0,
            estimated_points: 0,
            error: Some(error),
        }
    }
}

/// Wire shape of the Ichiba search response (formatVersion 2: items are
/// plain objects, not wrapped). Defaulted throughout; partial responses
/// degrade to zeroes instead of failing the parse.
#[derive(Debug, Default, Deserialize)]
struct IchibaResponse {
    #[serde(rename = "Items", default)]
    items: Vec<IchibaItem>,
    #[serde(default)]
    count: u64,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(rename = "pageCount", default)]
    page_count: u32,
    #[serde(default)]
    hits: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IchibaItem {
    item_name: String,
    item_price: i64,
    item_code: String,
    item_url: String,
    shop_name: String,
    shop_url: String,
    /// Strings under formatVersion 2; kept as values for tolerance.
    medium_image_urls: Vec<Value>,
    review_average: f64,
    review_count: u64,
    #[serde(default = "default_point_rate")]
    point_rate: i64,
    /// A timestamp string upstream; only numeric values count as a bonus.
    point_rate_start_time: Value,
    availability: i64,
}

fn default_point_rate() -> i64 {
    1
}

fn normalize(raw: IchibaItem) -> Item {
    let image_url = raw
        .medium_image_urls
        .first()
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Item {
        name: raw.item_name,
        price: raw.item_price,
        item_code: raw.item_code,
        item_url: raw.item_url,
        shop_name: raw.shop_name,
        shop_url: raw.shop_url,
        image_url,
        review_average: raw.review_average,
        review_count: raw.review_count,
        point: raw.point_rate,
        availability: raw.availability == 1,
    }
}

fn bonus_rate(value: &Value) -> i64 {
    value.as_i64().unwrap_or(0)
}

/// (lowest, highest, rounded average) over the positive prices.
fn price_summary(items: &[Item]) -> (i64, i64, f64) {
    let prices: Vec<i64> = items
        .iter()
        .map(|item| item.price)
        .filter(|price| *price > 0)
        .collect();

    if prices.is_empty() {
        return (0, 0, 0.0);
    }

    let lowest = prices.iter().copied().min().unwrap_or(0);
    let highest = prices.iter().copied().max().unwrap_or(0);
    let average = (prices.iter().sum::<i64>() as f64 / prices.len() as f64).round();

    (lowest, highest, average)
}

#[derive(Debug, Clone)]
pub struct RakutenShopping {
    app_id: String,
    affiliate_id: Option<String>,
    http: Client,
}

impl RakutenShopping {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            affiliate_id: None,
            http: http::client(),
        }
    }

    pub fn with_affiliate_id(mut self, affiliate_id: impl Into<String>) -> Self {
        self.affiliate_id = Some(affiliate_id.into());
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, SkillError> {
        let app_id = config.rakuten_app_id().ok_or(SkillError::MissingCredential {
            what: "楽天アプリケーションID",
            env: "RAKUTEN_APP_ID",
        })?;

        let mut skill = Self::new(app_id);
        if let Some(affiliate_id) = config.rakuten_affiliate_id() {
            skill = skill.with_affiliate_id(affiliate_id);
        }

        Ok(skill)
    }

    /// Search Ichiba by keyword, up to 30 hits.
    pub async fn search(
        &self,
        keyword: &str,
        filter: &SearchFilter,
    ) -> Result<SearchResults, SkillError> {
        if keyword.is_empty() {
            return Err(SkillError::EmptyField("検索キーワード"));
        }
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(SkillError::InvertedPriceRange);
            }
        }

        let mut params = self.base_params();
        params.push(("keyword".to_string(), keyword.to_string()));
        params.push(("hits".to_string(), SEARCH_HITS.to_string()));
        if let Some(genre_id) = &filter.genre_id {
            params.push(("genreId".to_string(), genre_id.clone()));
        }
        if let Some(min) = filter.min_price {
            params.push(("minPrice".to_string(), min.to_string()));
        }
        if let Some(max) = filter.max_price {
            params.push(("maxPrice".to_string(), max.to_string()));
        }

        match self.fetch(&params).await {
            Ok(data) => Ok(SearchResults {
                total_count: data.count,
                page_info: Some(PageInfo {
                    page: data.page,
                    page_count: data.page_count,
                    hits: data.hits,
                }),
                items: data.items.into_iter().map(normalize).collect(),
                error: None,
            }),
            Err(err) => {
                tracing::error!("楽天API呼び出しに失敗しました: {err:#}");
                Ok(SearchResults::unavailable(format!("{err:#}")))
            }
        }
    }

    /// Search by keyword sorted cheapest-first and report price statistics.
    pub async fn compare_prices(&self, keyword: &str) -> Result<PriceComparison, SkillError> {
        if keyword.is_empty() {
            return Err(SkillError::EmptyField("検索キーワード"));
        }

        let mut params = self.base_params();
        params.push(("keyword".to_string(), keyword.to_string()));
        params.push(("hits".to_string(), SEARCH_HITS.to_string()));
        params.push(("sort".to_string(), "+itemPrice".to_string()));

        match self.fetch(&params).await {
            Ok(data) => {
                let items: Vec<Item> = data.items.into_iter().map(normalize).collect();
                let (lowest_price, highest_price, average_price) = price_summary(&items);

                Ok(PriceComparison {
                    total_count: items.len(),
                    lowest_price,
                    highest_price,
                    average_price,
                    items,
                    error: None,
                })
            }
            Err(err) => {
                tracing::error!("価格比較に失敗しました: {err:#}");
                Ok(PriceComparison::unavailable(format!("{err:#}")))
            }
        }
    }

    /// Look up one item's point-rate breakdown by its item code.
    pub async fn get_point_rate(&self, item_code: &str) -> Result<PointRateInfo, SkillError> {
        if item_code.is_empty() {
            return Err(SkillError::EmptyField("商品コード"));
        }

        let mut params = self.base_params();
        params.push(("itemCode".to_string(), item_code.to_string()));

        let data = match self.fetch(&params).await {
            Ok(data) => data,
            Err(err) => {
                tracing::error!("ポイント情報の取得に失敗しました: {err:#}");
                return Ok(PointRateInfo::unavailable(format!("{err:#}")));
            }
        };

        let Some(raw) = data.items.into_iter().next() else {
            return Ok(PointRateInfo::unavailable(
                "商品が見つかりませんでした。".to_string(),
            ));
        };

        let base_rate = raw.point_rate;
        let bonus_rate = bonus_rate(&raw.point_rate_start_time);
        let total_rate = base_rate + bonus_rate;
        let estimated_points = raw.item_price * total_rate / 100;

        Ok(PointRateInfo {
            item_name: raw.item_name,
            price: raw.item_price,
            base_rate,
            bonus_rate,
            total_rate,
            estimated_points,
            error: None,
        })
    }

    fn base_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("applicationId".to_string(), self.app_id.clone()),
            ("format".to_string(), "json".to_string()),
            ("formatVersion".to_string(), "2".to_string()),
        ];
        if let Some(affiliate_id) = &self.affiliate_id {
            params.push(("affiliateId".to_string(), affiliate_id.clone()));
        }
        params
    }

    async fn fetch(&self, params: &[(String, String)]) -> Result<IchibaResponse> {
        let res = self
            .http
            .get(ICHIBA_SEARCH_ENDPOINT)
            .query(params)
            .send()
            .await
            .context("Failed to send request to Rakuten Ichiba search")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Rakuten response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Rakuten search request failed with status {}: {}",
                status,
                http::truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).context("Failed to parse Rakuten search JSON")
    }
}

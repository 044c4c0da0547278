//! Mercari listing generator: description templates, category and price
//! heuristics. Fully offline; the only skill without an HTTP client.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::SkillError;

/// Condition grade → (min multiplier, max multiplier, description blurb).
/// First-match order; unknown grades fall back to [`DEFAULT_MULTIPLIERS`].
const CONDITION_GRADES: &[(&str, f64, f64, &str)] = &[
    (
        "新品、未使用",
        0.70,
        0.90,
        "新品・未使用のため、大変綺麗な状態です。",
    ),
    (
        "未使用に近い",
        0.60,
        0.80,
        "ほぼ未使用で、非常に良好な状態です。",
    ),
    (
        "目立った傷や汚れなし",
        0.40,
        0.70,
        "目立った傷や汚れはなく、良好な状態です。",
    ),
    (
        "やや傷や汚れあり",
        0.30,
        0.50,
        "多少の使用感はありますが、問題なくご使用いただけます。",
    ),
    (
        "傷や汚れあり",
        0.15,
        0.35,
        "使用感がありますが、まだご使用いただけます。",
    ),
    (
        "全体的に状態が悪い",
        0.05,
        0.20,
        "全体的に使用感がございます。ご理解の上ご購入ください。",
    ),
];

const DEFAULT_MULTIPLIERS: (f64, f64) = (0.30, 0.50);

/// Category ← keyword lists, scanned in order; the catch-all comes last.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "レディース",
        &["レディース", "ワンピース", "スカート", "ブラウス", "パンプス"],
    ),
    (
        "メンズ",
        &["メンズ", "Tシャツ", "ジーンズ", "スニーカー", "ジャケット"],
    ),
    ("ベビー・キッズ", &["ベビー", "キッズ", "子供", "幼児"]),
    (
        "インテリア・住まい",
        &["インテリア", "家具", "照明", "カーテン", "クッション"],
    ),
    (
        "本・音楽・ゲーム",
        &["本", "漫画", "CD", "DVD", "ゲーム", "PlayStation", "Nintendo", "Switch"],
    ),
    (
        "おもちゃ・ホビー",
        &["おもちゃ", "フィギュア", "プラモデル", "トレカ", "カード"],
    ),
    (
        "コスメ・美容",
        &["コスメ", "化粧品", "美容", "香水", "スキンケア"],
    ),
    (
        "家電・スマホ",
        &[
            "家電", "スマホ", "iPhone", "iPad", "MacBook", "パソコン", "PC", "イヤホン",
            "AirPods", "カメラ", "テレビ",
        ],
    ),
    (
        "スポーツ・レジャー",
        &["スポーツ", "ゴルフ", "テニス", "ランニング", "キャンプ", "アウトドア"],
    ),
    ("ハンドメイド", &["ハンドメイド", "手作り", "手編み"]),
    ("チケット", &["チケット", "入場券", "観戦券"]),
    ("自動車・オートバイ", &["自動車", "バイク", "オートバイ", "カー用品"]),
    ("その他", &[]),
];

const FALLBACK_CATEGORY: &str = "その他";

/// Rough brand → base price reference (yen).
const BRAND_BASE_PRICES: &[(&str, i64)] = &[
    ("apple", 30000),
    ("nike", 8000),
    ("adidas", 7000),
    ("uniqlo", 2000),
    ("gu", 1500),
    ("zara", 3000),
    ("louis vuitton", 50000),
    ("gucci", 40000),
    ("chanel", 60000),
    ("hermes", 80000),
    ("sony", 15000),
    ("nintendo", 20000),
    ("dyson", 25000),
    ("panasonic", 10000),
];

const DEFAULT_BASE_PRICE: i64 = 5000;
/// Mercari's minimum listing price.
const MINIMUM_PRICE: i64 = 300;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListingDescription {
    pub text: String,
    pub hashtags: Vec<String>,
    /// Characters, not bytes.
    pub character_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceSuggestion {
    pub suggested_price: i64,
    pub min_price: i64,
    pub max_price: i64,
    pub base_price: i64,
    /// Human-readable explanation of the applied multiplier band.
    pub condition_factor: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ListingRequest {
    pub item_name: String,
    pub condition: String,
    pub brand: Option<String>,
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Listing {
    pub description: String,
    pub category: String,
    pub price: i64,
    pub price_range: PriceRange,
    pub photo_count: usize,
    pub photos: Vec<String>,
    pub hashtags: Vec<String>,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MercariLister;

impl MercariLister {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the listing description from the section template.
    pub fn generate_description(
        &self,
        item_name: &str,
        condition: &str,
        brand: Option<&str>,
    ) -> Result<ListingDescription, SkillError> {
        ensure_listing_input(item_name, condition)?;

        let blurb = condition_blurb(condition);
        let hashtags = hashtags(item_name, brand);

        let title = match brand {
            Some(brand) => format!("【{brand}】{item_name}"),
            None => item_name.to_string(),
        };

        let mut lines: Vec<String> = vec![
            title,
            String::new(),
            "ご覧いただきありがとうございます。".to_string(),
            String::new(),
            "■ 商品名".to_string(),
            item_name.to_string(),
            String::new(),
        ];

        if let Some(brand) = brand {
            lines.extend([
                "■ ブランド".to_string(),
                brand.to_string(),
                String::new(),
            ]);
        }

        lines.extend([
            "■ 商品の状態".to_string(),
            condition.to_string(),
            String::new(),
            "■ 商品説明".to_string(),
        ]);

        lines.push(match brand {
            Some(brand) => format!("{brand}の{item_name}です。"),
            None => format!("{item_name}です。"),
        });

        lines.extend([
            blurb,
            String::new(),
            "■ 発送について".to_string(),
            "・匿名配送対応".to_string(),
            "・24時間以内に発送予定".to_string(),
            "・丁寧に梱包してお届けします".to_string(),
            String::new(),
            hashtags.join(" "),
        ]);

        let text = lines.join("\n");
        let character_count = text.chars().count();

        Ok(ListingDescription {
            text,
            hashtags,
            character_count,
        })
    }

    /// Suggest a listing price from the brand base price and the condition
    /// multiplier band. Prices round to the nearest 100 yen and never fall
    /// below the 300-yen listing minimum.
    pub fn suggest_price(
        &self,
        item_name: &str,
        condition: &str,
    ) -> Result<PriceSuggestion, SkillError> {
        ensure_listing_input(item_name, condition)?;

        let base_price = estimate_base_price(item_name, None);
        let (min_multiplier, max_multiplier) = condition_multipliers(condition);
        let mid_multiplier = (min_multiplier + max_multiplier) / 2.0;

        Ok(PriceSuggestion {
            suggested_price: rounded_price(base_price as f64 * mid_multiplier),
            min_price: rounded_price(base_price as f64 * min_multiplier),
            max_price: rounded_price(base_price as f64 * max_multiplier),
            base_price,
            condition_factor: format!(
                "状態「{condition}」による価格倍率: {:.0}%-{:.0}%",
                min_multiplier * 100.0,
                max_multiplier * 100.0,
            ),
        })
    }

    /// Produce everything a listing needs in one call: description,
    /// category estimate, price suggestion, and listing tips.
    pub fn generate_listing(&self, request: &ListingRequest) -> Result<Listing, SkillError> {
        ensure_listing_input(&request.item_name, &request.condition)?;

        let brand = request.brand.as_deref();
        let description = self.generate_description(&request.item_name, &request.condition, brand)?;
        let category = estimate_category(&request.item_name, brand);
        let price = self.suggest_price(&request.item_name, &request.condition)?;
        let photo_count = request.photos.len();

        Ok(Listing {
            description: description.text,
            category: category.to_string(),
            price: price.suggested_price,
            price_range: PriceRange {
                min: price.min_price,
                max: price.max_price,
            },
            photo_count,
            photos: request.photos.clone(),
            hashtags: description.hashtags,
            tips: listing_tips(&request.condition, photo_count),
        })
    }
}

fn ensure_listing_input(item_name: &str, condition: &str) -> Result<(), SkillError> {
    if item_name.is_empty() {
        return Err(SkillError::EmptyField("商品名"));
    }
    if condition.is_empty() {
        return Err(SkillError::EmptyField("商品の状態"));
    }
    Ok(())
}

fn condition_blurb(condition: &str) -> String {
    CONDITION_GRADES
        .iter()
        .find(|(grade, ..)| *grade == condition)
        .map_or_else(
            || format!("{condition}の状態です。"),
            |(.., blurb)| (*blurb).to_string(),
        )
}

fn condition_multipliers(condition: &str) -> (f64, f64) {
    CONDITION_GRADES
        .iter()
        .find(|(grade, ..)| *grade == condition)
        .map_or(DEFAULT_MULTIPLIERS, |&(_, min, max, _)| (min, max))
}

/// Word characters for hashtag extraction: ASCII alphanumerics, kana, kanji.
fn keyword_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[A-Za-zぁ-んァ-ヶ一-龥0-9]{2,}").expect("keyword pattern is valid")
    })
}

/// `#brand` plus up to three keywords from the item name, deduplicated.
fn hashtags(item_name: &str, brand: Option<&str>) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(brand) = brand {
        tags.push(format!("#{brand}"));
    }

    for word in keyword_pattern().find_iter(item_name).take(3) {
        let tag = format!("#{}", word.as_str());
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    tags
}

/// Base price from the brand table. The explicit brand matches by substring
/// in either direction; otherwise the item name is scanned for brand names.
fn estimate_base_price(item_name: &str, brand: Option<&str>) -> i64 {
    if let Some(brand) = brand {
        let brand_lower = brand.to_lowercase();
        for (key, price) in BRAND_BASE_PRICES {
            if brand_lower.contains(key) || key.contains(brand_lower.as_str()) {
                return *price;
            }
        }
    }

    let item_lower = item_name.to_lowercase();
    for (key, price) in BRAND_BASE_PRICES {
        if item_lower.contains(key) {
            return *price;
        }
    }

    DEFAULT_BASE_PRICE
}

fn estimate_category(item_name: &str, brand: Option<&str>) -> &'static str {
    let search_text = match brand {
        Some(brand) => format!("{brand} {item_name}").to_lowercase(),
        None => item_name.to_lowercase(),
    };

    for &(category, keywords) in CATEGORY_KEYWORDS {
        for keyword in keywords {
            if search_text.contains(&keyword.to_lowercase()) {
                return category;
            }
        }
    }

    FALLBACK_CATEGORY
}

/// Truncate to yen, round to the nearest 100, floor at the listing minimum.
fn rounded_price(value: f64) -> i64 {
    let yen = value as i64;
    ((yen as f64 / 100.0).round() as i64 * 100).max(MINIMUM_PRICE)
}

fn listing_tips(condition: &str, photo_count: usize) -> Vec<String> {
    let mut tips = Vec::new();

    if photo_count == 0 {
        tips.push(
            "写真を追加してください。写真があると売れやすくなります（推奨: 4枚以上）。".to_string(),
        );
    } else if photo_count < 4 {
        tips.push(format!(
            "現在{photo_count}枚の写真があります。4枚以上あると売れやすくなります。"
        ));
    } else {
        tips.push(format!("{photo_count}枚の写真が設定されています。"));
    }

    if matches!(
        condition,
        "やや傷や汚れあり" | "傷や汚れあり" | "全体的に状態が悪い"
    ) {
        tips.push(
            "傷や汚れがある場合は、該当箇所の写真を追加すると購入者の安心感が高まります。"
                .to_string(),
        );
    }

    tips.push(
        "タイトルにブランド名・サイズ・色を含めると検索に引っかかりやすくなります。".to_string(),
    );
    tips.push("週末（金曜夜〜日曜）に出品すると閲覧数が上がる傾向があります。".to_string());

    tips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_follows_the_section_template() {
        let lister = MercariLister::new();
        let result = lister
            .generate_description("AirPods Pro", "目立った傷や汚れなし", Some("Apple"))
            .expect("description");

        let expected = "\
【Apple】AirPods Pro

ご覧いただきありがとうございます。

■ 商品名
AirPods Pro

■ ブランド
Apple

■ 商品の状態
目立った傷や汚れなし

■ 商品説明
AppleのAirPods Proです。
目立った傷や汚れはなく、良好な状態です。

■ 発送について
・匿名配送対応
・24時間以内に発送予定
・丁寧に梱包してお届けします

#Apple #AirPods #Pro";

        assert_eq!(result.text, expected);
        assert_eq!(result.hashtags, vec!["#Apple", "#AirPods", "#Pro"]);
        assert_eq!(result.character_count, expected.chars().count());
    }

    #[test]
    fn description_without_brand_skips_the_brand_section() {
        let lister = MercariLister::new();
        let result = lister
            .generate_description("手編みマフラー", "新品、未使用", None)
            .expect("description");

        assert!(result.text.starts_with("手編みマフラー\n"));
        assert!(!result.text.contains("■ ブランド"));
        assert!(result.text.contains("手編みマフラーです。"));
        assert!(result.text.contains("新品・未使用のため、大変綺麗な状態です。"));
    }

    #[test]
    fn unknown_condition_gets_a_generic_blurb() {
        let lister = MercariLister::new();
        let result = lister
            .generate_description("謎の品", "ジャンク", None)
            .expect("description");

        assert!(result.text.contains("ジャンクの状態です。"));
    }

    #[test]
    fn hashtags_deduplicate_against_the_brand_tag() {
        let tags = hashtags("Nike エアマックス", Some("Nike"));
        assert_eq!(tags, vec!["#Nike", "#エアマックス"]);
    }

    #[test]
    fn hashtags_skip_single_character_words() {
        let tags = hashtags("本 かばん 3冊セット", None);
        // "本" is one character; "かばん" and "3冊セット" qualify.
        assert_eq!(tags, vec!["#かばん", "#3冊セット"]);
    }

    #[test]
    fn price_uses_the_brand_table_via_the_item_name() {
        let lister = MercariLister::new();
        let price = lister
            .suggest_price("Nintendo Switch 本体", "新品、未使用")
            .expect("price");

        assert_eq!(price.base_price, 20000);
        assert_eq!(price.min_price, 14000);
        assert_eq!(price.max_price, 18000);
        assert_eq!(price.suggested_price, 16000);
        assert!(price.condition_factor.contains("70%-90%"));
    }

    #[test]
    fn price_falls_back_to_the_default_base() {
        let lister = MercariLister::new();
        let price = lister
            .suggest_price("AirPods Pro", "目立った傷や汚れなし")
            .expect("price");

        // "apple" does not occur in the item name, so the default base
        // applies: 5000 * (0.40, 0.55, 0.70).
        assert_eq!(price.base_price, 5000);
        assert_eq!(price.min_price, 2000);
        assert_eq!(price.suggested_price, 2800);
        assert_eq!(price.max_price, 3500);
    }

    #[test]
    fn prices_never_fall_below_the_listing_minimum() {
        let lister = MercariLister::new();
        let price = lister
            .suggest_price("古い雑誌", "全体的に状態が悪い")
            .expect("price");

        // 5000 * 0.05 = 250 would round to 300 via the floor.
        assert_eq!(price.min_price, 300);
        assert!(price.suggested_price >= MINIMUM_PRICE);
    }

    #[test]
    fn unknown_condition_uses_the_fallback_band() {
        let lister = MercariLister::new();
        let price = lister.suggest_price("謎の品", "ジャンク").expect("price");

        // 5000 * (0.30, 0.40, 0.50)
        assert_eq!(price.min_price, 1500);
        assert_eq!(price.suggested_price, 2000);
        assert_eq!(price.max_price, 2500);
        assert!(price.condition_factor.contains("30%-50%"));
    }

    #[test]
    fn category_scan_matches_in_table_order() {
        assert_eq!(estimate_category("ワンピース 花柄", None), "レディース");
        assert_eq!(estimate_category("Switch ソフト", None), "本・音楽・ゲーム");
        assert_eq!(estimate_category("iPhone 15 ケース付き", None), "家電・スマホ");
        assert_eq!(estimate_category("謎の品", None), "その他");
        // The brand joins the searched text.
        assert_eq!(estimate_category("エアマックス", Some("メンズ")), "メンズ");
    }

    #[test]
    fn listing_bundles_description_category_price_and_tips() {
        let lister = MercariLister::new();
        let listing = lister
            .generate_listing(&ListingRequest {
                item_name: "ナイキ エアマックス90 27cm".to_string(),
                condition: "やや傷や汚れあり".to_string(),
                brand: Some("NIKE".to_string()),
                photos: vec!["photo1.jpg".to_string(), "photo2.jpg".to_string()],
            })
            .expect("listing");

        // Price estimation scans the item name only, and the katakana
        // brand never matches the ASCII table: default base 5000 with the
        // 0.30-0.50 band.
        assert_eq!(listing.price_range.min, 1500);
        assert_eq!(listing.price, 2000);
        assert_eq!(listing.price_range.max, 2500);
        assert_eq!(listing.photo_count, 2);
        assert!(listing.description.contains("【NIKE】"));
        assert_eq!(listing.tips.len(), 4);
        assert!(listing.tips[0].contains("現在2枚"));
        assert!(listing.tips[1].contains("傷や汚れがある場合"));
    }

    #[test]
    fn tips_vary_with_photo_count() {
        assert!(listing_tips("新品、未使用", 0)[0].contains("写真を追加してください"));
        assert!(listing_tips("新品、未使用", 5)[0].contains("5枚の写真が設定されています"));
        assert_eq!(listing_tips("新品、未使用", 5).len(), 3);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let lister = MercariLister::new();
        assert_eq!(
            lister.generate_description("", "新品、未使用", None).unwrap_err(),
            SkillError::EmptyField("商品名")
        );
        assert_eq!(
            lister.suggest_price("何か", "").unwrap_err(),
            SkillError::EmptyField("商品の状態")
        );
    }
}

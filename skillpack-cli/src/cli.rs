use std::fmt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use serde_json::to_string_pretty;

use skillpack_core::config::{
    Config, LineConfig, NotionConfig, OpenWeatherConfig, RakutenConfig,
};
use skillpack_core::mercari::{ListingRequest, MercariLister};
use skillpack_core::notion::{NotionLite, PropertyValue};
use skillpack_core::rakuten::{RakutenShopping, SearchFilter};
use skillpack_core::weather::WeatherAdvisor;
use skillpack_core::LineMessenger;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skillpack", version, about = "Assistant skill toolbox")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively store credentials for the external services.
    Configure,

    /// Weather advisories backed by OpenWeatherMap.
    #[command(subcommand)]
    Weather(WeatherCommand),

    /// LINE push messages.
    #[command(subcommand)]
    Line(LineCommand),

    /// Notion pages and databases.
    #[command(subcommand)]
    Notion(NotionCommand),

    /// Rakuten Ichiba product search.
    #[command(subcommand)]
    Rakuten(RakutenCommand),

    /// Mercari listing text generation (offline).
    #[command(subcommand)]
    Mercari(MercariCommand),
}

#[derive(Debug, Subcommand)]
pub enum WeatherCommand {
    /// Current conditions plus the per-day forecast summary.
    Forecast { city: String },
    /// Should you take an umbrella today?
    Umbrella { city: String },
    /// Is today a good day for outdoor drying?
    Laundry { city: String },
    /// Heat-stress level from current conditions.
    Heatstroke { city: String },
}

#[derive(Debug, Subcommand)]
pub enum LineCommand {
    /// Push a text message to a user.
    SendText { to: String, message: String },
    /// Push an image message (HTTPS URL).
    SendImage { to: String, image_url: String },
}

#[derive(Debug, Subcommand)]
pub enum NotionCommand {
    /// Create a child page; content is lightweight Markdown.
    CreatePage {
        parent_id: String,
        title: String,
        #[arg(long)]
        content: Option<String>,
    },
    /// Read a page's metadata and text content.
    ReadPage { page_id: String },
    /// Add a database record; repeat --prop NAME=VALUE, first one is the title.
    AddRecord {
        database_id: String,
        #[arg(long = "prop", value_parser = parse_property)]
        properties: Vec<(String, String)>,
    },
    /// Create today's daily-report record.
    DailyReport { database_id: String },
}

#[derive(Debug, Subcommand)]
pub enum RakutenCommand {
    /// Search items by keyword.
    Search {
        keyword: String,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        min_price: Option<u32>,
        #[arg(long)]
        max_price: Option<u32>,
    },
    /// Compare prices for a keyword, cheapest first.
    Compare { keyword: String },
    /// Point-rate breakdown for one item code.
    Points { item_code: String },
}

#[derive(Debug, Subcommand)]
pub enum MercariCommand {
    /// Generate a listing description.
    Describe {
        item_name: String,
        #[arg(long)]
        condition: String,
        #[arg(long)]
        brand: Option<String>,
    },
    /// Suggest a listing price.
    Price {
        item_name: String,
        #[arg(long)]
        condition: String,
    },
    /// Generate the full listing bundle.
    Listing {
        item_name: String,
        #[arg(long)]
        condition: String,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long = "photo")]
        photos: Vec<String>,
    },
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Weather(cmd) => weather(cmd).await,
            Command::Line(cmd) => line(cmd).await,
            Command::Notion(cmd) => notion(cmd).await,
            Command::Rakuten(cmd) => rakuten(cmd).await,
            Command::Mercari(cmd) => mercari(cmd),
        }
    }
}

async fn weather(cmd: WeatherCommand) -> Result<()> {
    let config = Config::load()?;
    let advisor = WeatherAdvisor::from_config(&config)?;

    match cmd {
        WeatherCommand::Forecast { city } => {
            let report = advisor.get_forecast(&city).await?;
            if let Some(error) = &report.error {
                anyhow::bail!("天気予報を取得できませんでした: {error}");
            }

            if let Some(current) = &report.current {
                println!(
                    "{}: {} {:.1}°C（体感 {:.1}°C） 湿度{}% 風速{:.1}m/s",
                    report.city,
                    current.description,
                    current.temperature,
                    current.feels_like,
                    current.humidity,
                    current.wind_speed,
                );
            }
            for day in &report.daily {
                println!(
                    "{}  {}  {:.1}°C〜{:.1}°C  降水確率{:.0}%",
                    day.date, day.description, day.temp_min, day.temp_max, day.rain_probability,
                );
            }
        }
        WeatherCommand::Umbrella { city } => {
            let advice = advisor.check_umbrella(&city).await?;
            if let Some(error) = &advice.error {
                anyhow::bail!("判定できませんでした: {error}");
            }

            println!("{}", advice.reason);
            println!(
                "傘: {}（降水確率 {:.0}%）",
                if advice.needed { "必要" } else { "不要" },
                advice.rain_probability,
            );
        }
        WeatherCommand::Laundry { city } => {
            let advice = advisor.check_laundry(&city).await?;
            if let Some(error) = &advice.error {
                anyhow::bail!("判定できませんでした: {error}");
            }

            println!("{}", advice.advice);
            println!(
                "外干し: {} / 乾燥指数 {}",
                if advice.recommended { "おすすめ" } else { "見送り" },
                advice.drying_index,
            );
        }
        WeatherCommand::Heatstroke { city } => {
            let advice = advisor.check_heatstroke(&city).await?;
            if let Some(error) = &advice.error {
                anyhow::bail!("判定できませんでした: {error}");
            }

            println!(
                "リスクレベル: {}（推定WBGT {:.1}°C）",
                advice.risk_level, advice.wbgt_estimate,
            );
            println!("{}", advice.advice);
        }
    }

    Ok(())
}

async fn line(cmd: LineCommand) -> Result<()> {
    let config = Config::load()?;
    let messenger = LineMessenger::from_config(&config)?;

    let report = match cmd {
        LineCommand::SendText { to, message } => messenger.send_text(&to, &message).await?,
        LineCommand::SendImage { to, image_url } => messenger.send_image(&to, &image_url).await?,
    };

    println!("{}", to_string_pretty(&report)?);
    Ok(())
}

async fn notion(cmd: NotionCommand) -> Result<()> {
    let config = Config::load()?;
    let notion = NotionLite::from_config(&config)?;

    let output = match cmd {
        NotionCommand::CreatePage {
            parent_id,
            title,
            content,
        } => to_string_pretty(
            &notion
                .create_page(&parent_id, &title, content.as_deref())
                .await?,
        )?,
        NotionCommand::ReadPage { page_id } => {
            to_string_pretty(&notion.read_page(&page_id).await?)?
        }
        NotionCommand::AddRecord {
            database_id,
            properties,
        } => {
            let properties: Vec<(String, PropertyValue)> = properties
                .into_iter()
                .map(|(name, value)| (name, coerce_property(&value)))
                .collect();
            to_string_pretty(&notion.add_database_record(&database_id, &properties).await?)?
        }
        NotionCommand::DailyReport { database_id } => {
            to_string_pretty(&notion.generate_daily_report(&database_id).await?)?
        }
    };

    println!("{output}");
    Ok(())
}

/// Map CLI strings onto typed property values: "true"/"false" become
/// checkboxes, numbers become numbers, everything else stays text (dates
/// are detected downstream).
fn coerce_property(value: &str) -> PropertyValue {
    match value {
        "true" => PropertyValue::Checkbox(true),
        "false" => PropertyValue::Checkbox(false),
        other => other
            .parse::<f64>()
            .map(PropertyValue::Number)
            .unwrap_or_else(|_| PropertyValue::Text(other.to_string())),
    }
}

async fn rakuten(cmd: RakutenCommand) -> Result<()> {
    let config = Config::load()?;
    let shopping = RakutenShopping::from_config(&config)?;

    let output = match cmd {
        RakutenCommand::Search {
            keyword,
            genre,
            min_price,
            max_price,
        } => {
            let filter = SearchFilter {
                genre_id: genre,
                min_price,
                max_price,
            };
            to_string_pretty(&shopping.search(&keyword, &filter).await?)?
        }
        RakutenCommand::Compare { keyword } => {
            to_string_pretty(&shopping.compare_prices(&keyword).await?)?
        }
        RakutenCommand::Points { item_code } => {
            to_string_pretty(&shopping.get_point_rate(&item_code).await?)?
        }
    };

    println!("{output}");
    Ok(())
}

fn mercari(cmd: MercariCommand) -> Result<()> {
    let lister = MercariLister::new();

    let output = match cmd {
        MercariCommand::Describe {
            item_name,
            condition,
            brand,
        } => to_string_pretty(&lister.generate_description(
            &item_name,
            &condition,
            brand.as_deref(),
        )?)?,
        MercariCommand::Price {
            item_name,
            condition,
        } => to_string_pretty(&lister.suggest_price(&item_name, &condition)?)?,
        MercariCommand::Listing {
            item_name,
            condition,
            brand,
            photos,
        } => to_string_pretty(&lister.generate_listing(&ListingRequest {
            item_name,
            condition,
            brand,
            photos,
        })?)?,
    };

    println!("{output}");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    OpenWeather,
    Line,
    Notion,
    Rakuten,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::OpenWeather => "openweather",
            Service::Line => "line",
            Service::Notion => "notion",
            Service::Rakuten => "rakuten",
        };
        f.write_str(name)
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let service = Select::new(
        "設定するサービスを選択してください:",
        vec![
            Service::OpenWeather,
            Service::Line,
            Service::Notion,
            Service::Rakuten,
        ],
    )
    .prompt()?;

    match service {
        Service::OpenWeather => {
            let api_key = Password::new("OpenWeatherMap APIキー:")
                .without_confirmation()
                .prompt()?;
            let lang = Text::new("天気説明の言語コード:").with_default("ja").prompt()?;
            config.openweather = Some(OpenWeatherConfig {
                api_key,
                lang: Some(lang),
            });
        }
        Service::Line => {
            let channel_access_token = Password::new("LINEチャネルアクセストークン:")
                .without_confirmation()
                .prompt()?;
            let secret = Text::new("チャネルシークレット（任意）:").prompt()?;
            config.line = Some(LineConfig {
                channel_access_token,
                channel_secret: Some(secret).filter(|s| !s.is_empty()),
            });
        }
        Service::Notion => {
            let api_key = Password::new("Notion APIキー:")
                .without_confirmation()
                .prompt()?;
            config.notion = Some(NotionConfig { api_key });
        }
        Service::Rakuten => {
            let app_id = Password::new("楽天アプリケーションID:")
                .without_confirmation()
                .prompt()?;
            let affiliate_id = Text::new("アフィリエイトID（任意）:").prompt()?;
            config.rakuten = Some(RakutenConfig {
                app_id,
                affiliate_id: Some(affiliate_id).filter(|s| !s.is_empty()),
            });
        }
    }

    config.save()?;
    println!("設定を保存しました: {}", Config::config_file_path()?.display());

    Ok(())
}

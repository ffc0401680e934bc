use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::runtime::Handle;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use shareprofit_core::portfolio::{NewPosition, PortfolioStore};
use shareprofit_core::quotes::{FetchCoordinator, QuoteCache};
use shareprofit_core::refresh::{ui_channel, ChannelUiExecutor, RefreshOrchestrator, UiEventLoop};
use shareprofit_core::settings::RefreshSettings;
use shareprofit_market_data::{
    DemoProvider, NseProvider, ProviderChain, QuoteProvider, SuffixResolver, Symbol,
    YahooProvider,
};
use shareprofit_storage_sqlite::{self as storage, PortfolioRepository};

use crate::config::Config;
use crate::listener::ConsoleListener;

pub struct App {
    pub orchestrator: RefreshOrchestrator,
    pub executor: ChannelUiExecutor,
    pub ui: UiEventLoop,
    pub listener: Arc<ConsoleListener>,
}

pub fn init_tracing() {
    let log_format = std::env::var("SPT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Live sources in the configured fallback order, or the offline demo table.
pub fn build_providers(settings: &RefreshSettings) -> Vec<Arc<dyn QuoteProvider>> {
    if settings.demo_mode {
        tracing::info!("Demo mode: serving prices from the built-in table");
        return vec![Arc::new(DemoProvider::new())];
    }

    let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();
    for id in &settings.provider_order {
        match id.as_str() {
            "NSE" => providers.push(Arc::new(NseProvider::new())),
            "YAHOO" => providers.push(Arc::new(YahooProvider::new())),
            "DEMO" => providers.push(Arc::new(DemoProvider::new())),
            other => tracing::warn!("Unknown quote provider '{}' ignored", other),
        }
    }
    if providers.is_empty() {
        tracing::warn!("No usable providers configured, falling back to NSE and Yahoo");
        providers.push(Arc::new(NseProvider::new()));
        providers.push(Arc::new(YahooProvider::new()));
    }
    providers
}

pub fn build_chain(settings: &RefreshSettings) -> ProviderChain {
    let resolver = Arc::new(SuffixResolver::with_default_suffix(
        &settings.default_market_suffix,
    ));
    let chain = ProviderChain::new(build_providers(settings), resolver);
    if settings.demo_mode {
        chain
    } else {
        chain.with_order(&settings.provider_order)
    }
}

/// Holdings added to an empty database in demo mode: (symbol, name, qty, price, bought).
const DEMO_POSITIONS: &[(&str, &str, i64, i64, &str)] = &[
    ("RELIANCE", "Reliance Industries", 20, 2300, "2023-04-12"),
    ("TCS", "Tata Consultancy Services", 10, 3350, "2023-09-01"),
    ("INFY", "Infosys", 25, 1510, "2024-01-18"),
    ("ITC", "ITC", 100, 440, "2024-03-05"),
];

pub fn seed_demo_positions(repository: &PortfolioRepository) -> anyhow::Result<()> {
    if !repository.get_all_symbols()?.is_empty() {
        return Ok(());
    }
    for (symbol, name, quantity, price, bought) in DEMO_POSITIONS {
        repository.add_position(NewPosition {
            symbol: Symbol::parse(symbol)?,
            company_name: name.to_string(),
            quantity: Decimal::from(*quantity),
            purchase_price: Decimal::from(*price),
            purchase_date: NaiveDate::parse_from_str(bought, "%Y-%m-%d")?,
            broker: None,
            cash_invested: None,
        })?;
    }
    tracing::info!("Seeded {} demo positions", DEMO_POSITIONS.len());
    Ok(())
}

pub fn build_app(config: &Config, runtime: Handle) -> anyhow::Result<App> {
    let pool = storage::open(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);
    let repository = Arc::new(PortfolioRepository::new(pool));
    if config.refresh.demo_mode {
        seed_demo_positions(&repository)?;
    }

    let settings = config.refresh.clone();
    let cache = Arc::new(QuoteCache::with_capacity(settings.cache_capacity));
    let coordinator = Arc::new(FetchCoordinator::new(
        Arc::new(build_chain(&settings)),
        cache,
        settings.cache_ttl(),
    ));

    let (executor, ui) = ui_channel();
    let listener = Arc::new(ConsoleListener::default());
    let orchestrator = RefreshOrchestrator::new(
        coordinator,
        repository.clone(),
        Arc::new(executor.clone()),
        listener.clone(),
        settings,
        runtime,
    );
    orchestrator.load_portfolio()?;

    Ok(App {
        orchestrator,
        executor,
        ui,
        listener,
    })
}

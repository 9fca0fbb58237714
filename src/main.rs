//! Greengrocer storefront
//!
//! Browse the catalog, or run a scripted order through checkout.
//!
//! Use `products` to list the catalog with the storefront filters
//! Use `checkout <order.yml>` to fill a cart, check out and print the receipt

use std::{
    io::{self, Write},
    path::PathBuf,
    time::Instant,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use humanize_duration::{Truncate, prelude::DurationExt};
use rust_decimal::Decimal;
use rusty_money::{FormattableCurrency, Money, Round, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use greengrocer::{
    cart::Cart,
    catalog::{Catalog, ProductQuery, SortOrder},
    checkout::{Checkout, SimulatedPaymentProcessor},
    pricing::{discount_percentage, effective_price},
    products::Product,
    script::OrderScript,
    settings::StoreSettings,
    shipping::OrderTotals,
};

/// Greengrocer storefront
#[derive(Debug, Parser)]
#[command(name = "greengrocer", about = "Vegetable storefront", long_about = None)]
struct Cli {
    /// Catalog YAML file (defaults to the bundled vegetable catalog)
    #[arg(long, global = true, env = "GREENGROCER_CATALOG")]
    catalog: Option<PathBuf>,

    /// Store settings YAML file
    #[arg(long, global = true, env = "GREENGROCER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error, or a full `EnvFilter` directive)
    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn load() -> Self {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::parse()
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List products
    Products(ProductsArgs),

    /// Run a scripted order through checkout
    Checkout(CheckoutArgs),
}

#[derive(Debug, Args)]
struct ProductsArgs {
    /// Only products in this category
    #[arg(short, long)]
    category: Option<String>,

    /// Only products whose name or description contains this text
    #[arg(short, long)]
    search: Option<String>,

    /// Only products in stock
    #[arg(long)]
    in_stock: bool,

    /// Only featured products
    #[arg(long)]
    featured: bool,

    /// Minimum effective price, in major units
    #[arg(long)]
    min_price: Option<Decimal>,

    /// Maximum effective price, in major units
    #[arg(long)]
    max_price: Option<Decimal>,

    /// Sort order
    #[arg(long, value_enum, default_value_t = SortOrder::Featured)]
    sort: SortOrder,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Order script YAML file
    order: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::load();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&cli.log_level)?)
        .init();

    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::builtin()?,
    };

    let settings = match &cli.settings {
        Some(path) => StoreSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => StoreSettings::default(),
    };

    if catalog.currency() != settings.currency() {
        bail!(
            "catalog is priced in {} but the store uses {}",
            catalog.currency().iso_alpha_code,
            settings.currency().iso_alpha_code
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Products(args) => list_products(&mut out, &catalog, args),
        Command::Checkout(args) => run_checkout(&mut out, &catalog, &settings, args).await,
    }
}

fn list_products(out: &mut impl Write, catalog: &Catalog<'_>, args: &ProductsArgs) -> Result<()> {
    let currency = catalog.currency();
    let mut query = ProductQuery::new().sorted_by(args.sort);

    if let Some(category) = &args.category {
        if catalog.category(category).is_none() {
            bail!("unknown category: {category}");
        }

        query = query.in_category(category.as_str());
    }

    if let Some(search) = &args.search {
        query = query.matching(search.as_str());
    }

    if args.in_stock {
        query = query.in_stock_only();
    }

    if let Some(min) = args.min_price {
        query = query.min_price(major_units(min, currency)?);
    }

    if let Some(max) = args.max_price {
        query = query.max_price(major_units(max, currency)?);
    }

    let products: Vec<&Product<'_>> = catalog
        .browse(&query)
        .into_iter()
        .filter(|product| !args.featured || product.is_featured())
        .collect();

    info!(matched = products.len(), sort = ?args.sort, "listing products");

    if products.is_empty() {
        writeln!(out, "No products found")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Id", "Name", "Category", "Unit", "Price", "Offer", "Stock"]);

    for product in &products {
        let offer = discount_percentage(product).map_or_else(String::new, |percent| {
            format!("{} off {}", percent_points(percent * Decimal::ONE), product.price())
        });

        builder.push_record([
            product.id().to_string(),
            product.name().to_string(),
            category_name(catalog, product),
            product.unit().to_string(),
            effective_price(product).to_string(),
            offer,
            if product.in_stock() { "In stock" } else { "Sold out" }.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(4..5), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(out, " {} of {} products", products.len(), catalog.len())?;

    Ok(())
}

async fn run_checkout(
    out: &mut impl Write,
    catalog: &Catalog<'_>,
    settings: &StoreSettings,
    args: &CheckoutArgs,
) -> Result<()> {
    let script = OrderScript::load(&args.order)
        .with_context(|| format!("loading order script from {}", args.order.display()))?;

    let policy = settings.shipping();
    let mut cart = Cart::new(catalog.currency());

    script.fill_cart(catalog, &mut cart)?;

    let totals = OrderTotals::for_cart(&cart, &policy)?;

    writeln!(
        out,
        "Cart: {} items, subtotal {}",
        cart.item_count(),
        totals.subtotal()
    )?;

    if let Some(remaining) = policy.amount_until_free_shipping(totals.subtotal())? {
        writeln!(out, "Add {remaining} more for free shipping")?;
    }

    let mut checkout =
        Checkout::start(&mut cart, policy)?.with_payment_timeout(settings.payment_timeout());

    checkout.shipping_details_mut().clone_from(&script.shipping);
    checkout.submit_shipping()?;

    checkout.payment_details_mut().clone_from(&script.payment);

    let processor = SimulatedPaymentProcessor::new(settings.payment_delay());
    let start = Instant::now();

    checkout.submit_payment(&processor).await?;

    let elapsed = start.elapsed();
    let order = checkout.complete_order()?;

    order.write_to(&mut *out)?;

    writeln!(
        out,
        "\n Payment confirmed in {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}

fn log_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("invalid log level: {level}"))
}

fn major_units(amount: Decimal, currency: &'static Currency) -> Result<Money<'static, Currency>> {
    let money = Money::from_decimal(amount, currency).round(currency.exponent(), Round::HalfUp);

    money
        .try_to_minor_units()
        .with_context(|| format!("price out of range: {amount}"))?;

    Ok(money)
}

fn category_name(catalog: &Catalog<'_>, product: &Product<'_>) -> String {
    catalog
        .category(product.category())
        .map_or_else(|| product.category().to_string(), |category| category.name.clone())
}

fn percent_points(fraction: Decimal) -> String {
    format!("{}%", (fraction * Decimal::ONE_HUNDRED).round_dp(0))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn log_level_flag_builds_the_filter() -> TestResult {
        let cli = Cli::try_parse_from(["greengrocer", "--log-level", "debug", "products"])?;

        assert_eq!(cli.log_level, "debug");
        assert!(log_filter(&cli.log_level).is_ok());

        Ok(())
    }

    #[test]
    fn price_filters_round_to_minor_units() -> TestResult {
        assert_eq!(
            major_units(Decimal::new(49_995, 3), INR)?,
            Money::from_minor(50_00, INR)
        );
        assert!(major_units(Decimal::MAX, INR).is_err());

        Ok(())
    }
}

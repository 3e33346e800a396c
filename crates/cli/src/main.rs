//! Motoparts CLI - drive the storefront API from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the token is persisted in MOTOPARTS_TOKEN_FILE)
//! mp-cli auth login -e rider@example.com -p secret
//!
//! # Browse the catalog
//! mp-cli catalog parts --model 12 --search "chain kit"
//!
//! # Fill the cart and check out
//! mp-cli cart add 42 --quantity 2
//! mp-cli orders checkout 7 --payment card
//!
//! # Make an address the only default
//! mp-cli account default-address 7
//! ```
//!
//! # Commands
//!
//! - `auth` - Login, registration, password reset
//! - `catalog` - Categories, manufacturers, bike models, parts, merch
//! - `cart` - Cart lines and checkout totals
//! - `account` - Profile, password, avatar, address book
//! - `orders` - History, tracking, cancellation, checkout

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use motoparts_core::ProductType;
use motoparts_storefront::AppState;
use motoparts_storefront::config::StorefrontConfig;
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Motoparts storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, register and manage credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Profile and address book
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Order history and checkout
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Forget the persisted session
    Logout,
    /// Show the logged-in customer
    Me,
    /// Verify an email address
    Verify {
        /// Token from the verification email
        token: String,
    },
    /// Request a password-reset email
    Forgot {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with a reset token
    Reset {
        /// Token from the reset email
        token: String,
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List part categories
    Categories,
    /// List manufacturers
    Manufacturers,
    /// List bike models
    Models {
        /// Only models from this manufacturer
        #[arg(long)]
        manufacturer: Option<String>,
    },
    /// Show one bike model
    Model { id: String },
    /// Search parts
    Parts {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        manufacturer: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        /// Sort key (`price_asc`, `price_desc`, `newest`)
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one part
    Part { id: String },
    /// List merchandise, or show one item
    Merch { id: Option<String> },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product
    Add {
        product_id: String,
        /// `part` or `merch`
        #[arg(long = "type", default_value = "part")]
        product_type: ProductType,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity (0 removes it)
    Update { id: String, quantity: u32 },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
    /// Fetch checkout totals from the server
    Summary,
}

#[derive(Subcommand)]
enum AccountAction {
    /// Show the profile, or update it when any field is given
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List saved addresses
    Addresses,
    /// Save a new address
    AddAddress {
        #[arg(long)]
        label: String,
        #[arg(long)]
        street: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        postal_code: Option<String>,
        /// Make it the default shipping address
        #[arg(long)]
        default: bool,
    },
    /// Make an address the only default
    DefaultAddress { id: String },
    /// Delete an address
    DeleteAddress { id: String },
    /// Change the account password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Upload a new avatar image
    Avatar { path: PathBuf },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List past orders
    List,
    /// Show one order
    Show { id: String },
    /// Show shipment tracking
    Track { id: String },
    /// Request cancellation
    Cancel { id: String },
    /// Place an order for the current cart
    Checkout {
        /// Shipping address id
        address_id: String,
        #[arg(long, default_value = "card")]
        payment: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output on stdout stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "motoparts_storefront=info,motoparts_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let state = AppState::from_config(&config);

    if let Err(e) = run(cli, &state).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, state: &AppState) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(state, &email, &password).await?;
            }
            AuthAction::Register {
                name,
                email,
                password,
                phone,
            } => commands::auth::register(state, name, email, password, phone).await?,
            AuthAction::Logout => commands::auth::logout(state).await,
            AuthAction::Me => commands::auth::me(state).await?,
            AuthAction::Verify { token } => commands::auth::verify(state, &token).await?,
            AuthAction::Forgot { email } => commands::auth::forgot(state, &email).await?,
            AuthAction::Reset { token, password } => {
                commands::auth::reset(state, &token, &password).await?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Categories => commands::catalog::categories(state).await?,
            CatalogAction::Manufacturers => commands::catalog::manufacturers(state).await?,
            CatalogAction::Models { manufacturer } => {
                commands::catalog::models(state, manufacturer).await?;
            }
            CatalogAction::Model { id } => commands::catalog::model(state, id).await?,
            CatalogAction::Parts {
                category,
                manufacturer,
                model,
                search,
                min_price,
                max_price,
                sort,
                page,
                limit,
            } => {
                let filter = motoparts_storefront::store::PartFilter {
                    category_id: category.map(Into::into),
                    manufacturer_id: manufacturer.map(Into::into),
                    model_id: model.map(Into::into),
                    search,
                    min_price,
                    max_price,
                    sort,
                    page,
                    limit,
                };
                commands::catalog::parts(state, &filter).await?;
            }
            CatalogAction::Part { id } => commands::catalog::part(state, id).await?,
            CatalogAction::Merch { id } => commands::catalog::merch(state, id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state).await?,
            CartAction::Add {
                product_id,
                product_type,
                quantity,
            } => commands::cart::add(state, product_type, product_id, quantity).await?,
            CartAction::Update { id, quantity } => {
                commands::cart::update(state, id, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(state, id).await?,
            CartAction::Clear => commands::cart::clear(state).await?,
            CartAction::Summary => commands::cart::summary(state).await?,
        },
        Commands::Account { action } => match action {
            AccountAction::Profile { name, email, phone } => {
                commands::account::profile(state, name, email, phone).await?;
            }
            AccountAction::Addresses => commands::account::addresses(state).await?,
            AccountAction::AddAddress {
                label,
                street,
                city,
                country,
                postal_code,
                default,
            } => {
                let input = motoparts_storefront::models::AddressInput {
                    label,
                    street,
                    city,
                    country,
                    postal_code,
                    is_default: default,
                };
                commands::account::add_address(state, &input).await?;
            }
            AccountAction::DefaultAddress { id } => {
                commands::account::default_address(state, id).await?;
            }
            AccountAction::DeleteAddress { id } => {
                commands::account::delete_address(state, id).await?;
            }
            AccountAction::Password { current, new } => {
                commands::account::password(state, &current, &new).await?;
            }
            AccountAction::Avatar { path } => commands::account::avatar(state, &path).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(state).await?,
            OrdersAction::Show { id } => commands::orders::show(state, id).await?,
            OrdersAction::Track { id } => commands::orders::track(state, id).await?,
            OrdersAction::Cancel { id } => commands::orders::cancel(state, id).await?,
            OrdersAction::Checkout {
                address_id,
                payment,
                notes,
            } => commands::orders::checkout(state, address_id, payment, notes).await?,
        },
    }
    Ok(())
}

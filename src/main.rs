use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod domain;
mod metrics;
mod models;
mod store;
mod utils;

use config::Config;
use domain::order::{ConfirmPayment, CreateOrder, OrderEngine, OrderStatus, PaymentMethod, UpdateStatus};
use models::{Product, Role, User};
use store::{CatalogStore, IdentityProvider, InMemoryStore, StoreError};

/// Create the configured admin account through the identity provider. The
/// seed admin is an explicit provisioning step, never inferred from a
/// caller's email at request time.
async fn provision_seed_admin(
    identity: &dyn IdentityProvider,
    config: &Config,
) -> Result<Option<User>, StoreError> {
    let Some(seed) = &config.seed_admin else {
        return Ok(None);
    };

    let admin = User::new(seed.name.clone(), seed.email.clone(), Role::Admin);
    identity.add_user(admin.clone()).await?;
    tracing::info!(admin_id = %admin.id, "👤 Seed admin provisioned");
    Ok(Some(admin))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,marketplace_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting marketplace order engine");

    let config = Config::from_env();

    // === 1. Wire the stores (in-memory backend for the demo) ===
    let backend = InMemoryStore::new();
    let identity: Arc<InMemoryStore> = Arc::new(backend.clone());
    let catalog: Arc<InMemoryStore> = Arc::new(backend.clone());
    let orders: Arc<InMemoryStore> = Arc::new(backend.clone());

    // === 2. Initialize Prometheus metrics ===
    let engine_metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        engine_metrics.registry().gather().len()
    );

    // Start metrics HTTP server in background thread
    let metrics_registry = Arc::new(engine_metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("metrics runtime");
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 3. Provision the seed admin ===
    provision_seed_admin(identity.as_ref(), &config).await?;

    // === 4. Start the order engine ===
    let engine = OrderEngine::new(
        identity.clone(),
        catalog.clone(),
        orders.clone(),
        engine_metrics,
    );

    // === 5. Demonstrate the full order lifecycle ===
    tracing::info!("📝 Demonstrating the order lifecycle");

    let seller = User::new("Sana", "sana@example.com", Role::Seller);
    let buyer = User::new("Ben", "ben@example.com", Role::User);
    identity.add_user(seller.clone()).await?;
    identity.add_user(buyer.clone()).await?;

    let camera = Product::new("Vintage camera", dec!(100.00), seller.id);
    let bike = Product::new("Road bike", dec!(250.00), seller.id);
    catalog.add_product(camera.clone()).await?;
    catalog.add_product(bike.clone()).await?;

    // A cash-on-delivery order: paid when the courier hands it over
    let cod_order = engine
        .create_order(CreateOrder {
            buyer: buyer.caller(),
            product_id: camera.id,
            payment_method: PaymentMethod::Cod,
            shipping_address: "12 Elm St, Springfield".into(),
            payment_details: None,
        })
        .await?;
    tracing::info!("✅ COD order created: {} (total {})", cod_order.id, cod_order.total);

    engine
        .update_status(UpdateStatus {
            caller: seller.caller(),
            order_id: cod_order.id,
            new_status: OrderStatus::Shipped,
        })
        .await?;

    let delivered = engine
        .update_status(UpdateStatus {
            caller: seller.caller(),
            order_id: cod_order.id,
            new_status: OrderStatus::Delivered,
        })
        .await?;
    tracing::info!(
        "✅ COD order delivered, payment auto-settled: {:?}",
        delivered.payment_status
    );

    // A bank-transfer order: stays pending until the seller confirms
    let transfer_order = engine
        .create_order(CreateOrder {
            buyer: buyer.caller(),
            product_id: bike.id,
            payment_method: PaymentMethod::BankTransfer,
            shipping_address: "12 Elm St, Springfield".into(),
            payment_details: None,
        })
        .await?;
    tracing::info!("✅ Bank-transfer order created: {}", transfer_order.id);

    let confirmed = engine
        .confirm_payment(ConfirmPayment {
            caller: seller.caller(),
            order_id: transfer_order.id,
        })
        .await?;
    tracing::info!("✅ Payment confirmed: {:?}", confirmed.payment_status);

    let view = engine.get_order(buyer.caller(), cod_order.id).await?;
    tracing::info!(
        "🧾 Buyer view: {} from {}",
        view.product.map(|p| p.title).unwrap_or_default(),
        view.seller.map(|s| s.name).unwrap_or_default()
    );

    let history = engine.list_for_buyer(buyer.id).await?;
    tracing::info!("📦 Buyer has {} orders on file", history.len());

    tracing::info!("🎉 Demo complete!");
    Ok(())
}

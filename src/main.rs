use std::process::ExitCode;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use storefront_client::application::auth::require_session;
use storefront_client::domain::advisory::{Advisory, AdvisoryKind};
use storefront_client::domain::lifecycle::OrderAction;
use storefront_client::domain::order::{Order, OrderStatus};
use storefront_client::domain::pagination::PageCursor;
use storefront_client::domain::query::{OrderFilters, ProductFilters};
use storefront_client::domain::session::{Credentials, Session};
use storefront_client::{
    AdminService, AppError, AuthService, ClientConfig, FileSessionStore, HttpBackend,
    StorefrontService,
};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Command-line client for the catalog and order service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List active products
    Products {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        min_price: Option<BigDecimal>,
        #[arg(long)]
        max_price: Option<BigDecimal>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// List categories (requires login)
    Categories,
    Login {
        email: String,
        password: String,
    },
    Register {
        email: String,
        password: String,
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
    Logout,
    Whoami,
    /// Place an order from PRODUCT_ID=QUANTITY pairs
    Buy {
        #[arg(required = true, value_parser = parse_item)]
        items: Vec<(i64, i64)>,
    },
    /// Own orders, or every order when logged in as an administrator
    Orders {
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(long)]
        user: Option<i64>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Replace the items of a pending order with PRODUCT_ID=QUANTITY pairs
    EditOrder {
        id: i64,
        #[arg(required = true, value_parser = parse_item)]
        items: Vec<(i64, i64)>,
    },
    /// confirm, cancel, send or deliver an order
    OrderAction { id: i64, action: OrderAction },
}

fn parse_item(raw: &str) -> Result<(i64, i64), String> {
    let (id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PRODUCT_ID=QUANTITY, got '{}'", raw))?;
    let id = id.trim().parse().map_err(|e| format!("bad product id: {}", e))?;
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|e| format!("bad quantity: {}", e))?;
    Ok((id, quantity))
}

fn report(advisory: Option<&Advisory>) {
    let Some(advisory) = advisory else {
        return;
    };
    match advisory.kind {
        AdvisoryKind::Error => eprintln!("error: {}", advisory.text),
        AdvisoryKind::Info => println!("{}", advisory.text),
        AdvisoryKind::Success => println!("ok: {}", advisory.text),
    }
}

fn print_order(order: &Order) {
    let created = order
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "#{:<6} {:<10} {:>10} {} {}",
        order.id,
        order.status,
        order.total,
        created,
        order.user_email.as_deref().unwrap_or("")
    );
    for line in &order.lines {
        println!(
            "        {} x {} @ {}",
            line.quantity, line.product_name, line.unit_price
        );
    }
}

struct Context {
    config: ClientConfig,
    backend: HttpBackend,
    auth: AuthService<HttpBackend, FileSessionStore>,
}

impl Context {
    fn storefront(&self, session: Option<Session>) -> StorefrontService<HttpBackend> {
        StorefrontService::new(self.backend.clone(), session)
            .with_advisory_ttl(self.config.advisory_ttl)
    }

    fn admin(&self, session: Session) -> Result<AdminService<HttpBackend>, AppError> {
        Ok(AdminService::new(self.backend.clone(), session)?
            .with_advisory_ttl(self.config.advisory_ttl))
    }

    fn session(&self) -> Result<Session, AppError> {
        let current = self.auth.current()?;
        require_session(current.as_ref())?;
        current.ok_or(AppError::NotAuthenticated)
    }
}

async fn run(command: Commands) -> Result<(), AppError> {
    let config = ClientConfig::from_env()?;
    let backend = HttpBackend::new(&config)?;
    let store = FileSessionStore::new(config.session_file.clone());
    let auth = AuthService::new(backend.clone(), store);
    let ctx = Context {
        config,
        backend,
        auth,
    };
    log::debug!("Using API at {}", ctx.config.api_url);

    match command {
        Commands::Products {
            name,
            min_price,
            max_price,
            category,
            page,
        } => {
            let mut shop = ctx.storefront(ctx.auth.current()?);
            let filters = ProductFilters {
                name,
                min_price,
                max_price,
                category_id: category,
                status: None,
            };
            let loaded = shop.apply_filters(filters).await.map(|_| ());
            let loaded = match loaded {
                Ok(()) if page > 0 => shop.go_to_page(page).await.map(|_| ()),
                other => other,
            };
            report(shop.advisory());
            loaded?;

            for p in shop.products() {
                println!(
                    "{:>5}  {:<30} {:>10}  stock {:>4}  {}",
                    p.id,
                    p.name,
                    p.price,
                    p.stock,
                    p.category_name.as_deref().unwrap_or("")
                );
            }
            let cursor = shop.cursor();
            match cursor.range() {
                Some((first, last)) => println!(
                    "{}-{} of {} (page {}/{})",
                    first,
                    last,
                    cursor.total_elements(),
                    cursor.page() + 1,
                    cursor.total_pages()
                ),
                None => println!("No products found"),
            }
        }
        Commands::Categories => {
            let mut shop = ctx.storefront(Some(ctx.session()?));
            for c in shop.load_categories().await {
                println!("{:>5}  {:<24} {}", c.id, c.name, c.description);
            }
        }
        Commands::Login { email, password } => {
            let session = ctx.auth.login(&Credentials::new(email, password)).await?;
            println!("Logged in as {} ({})", session.profile.email, session.role());
        }
        Commands::Register {
            email,
            password,
            admin,
        } => {
            let credentials = Credentials::new(email, password);
            let session = if admin {
                ctx.auth.register_admin(&credentials).await?
            } else {
                ctx.auth.register_customer(&credentials).await?
            };
            println!(
                "Registered {} ({}). You can now log in",
                session.profile.email,
                session.role()
            );
        }
        Commands::Logout => {
            ctx.auth.logout()?;
            println!("Logged out");
        }
        Commands::Whoami => match ctx.auth.current()? {
            Some(session) => println!("{} ({})", session.profile.email, session.role()),
            None => println!("Not logged in"),
        },
        Commands::Buy { items } => {
            let mut shop = ctx.storefront(Some(ctx.session()?));
            for (product_id, quantity) in items {
                let added = shop.add_product(product_id, quantity).await;
                report(shop.advisory());
                added?;
            }
            let cart = shop.cart();
            println!(
                "{} item(s), subtotal {}, of which tax {}",
                cart.total_items(),
                cart.subtotal(),
                cart.tax()
            );
            let placed = shop.checkout().await;
            report(shop.advisory());
            print_order(&placed?);
        }
        Commands::Orders {
            status,
            user,
            from,
            to,
            page,
        } => {
            let session = ctx.session()?;
            if session.is_admin() {
                let mut admin = ctx.admin(session)?;
                let filters = OrderFilters {
                    user_id: user,
                    status,
                    start_date: from,
                    end_date: to,
                };
                let mut cursor = PageCursor::default();
                let mut listed = admin.list_orders(&filters, &mut cursor).await;
                if listed.is_ok() && cursor.go_to(page) {
                    listed = admin.list_orders(&filters, &mut cursor).await;
                }
                report(admin.advisory());
                let orders = listed?;
                for order in &orders.items {
                    print_order(order);
                }
                println!(
                    "page {}/{} ({} orders)",
                    cursor.page() + 1,
                    cursor.total_pages(),
                    cursor.total_elements()
                );
            } else {
                let mut shop = ctx.storefront(Some(session));
                let listed = shop.my_orders().await;
                report(shop.advisory());
                for order in &listed?.items {
                    print_order(order);
                }
            }
        }
        Commands::EditOrder { id, items } => {
            let mut shop = ctx.storefront(Some(ctx.session()?));
            let edited = edit_order(&mut shop, id, &items).await;
            report(shop.advisory());
            print_order(&edited?);
        }
        Commands::OrderAction { id, action } => {
            let session = ctx.session()?;
            if session.is_admin() {
                let mut admin = ctx.admin(session)?;
                let applied = match admin.order(id).await {
                    Ok(order) => admin.apply_action(&order, action).await,
                    Err(e) => Err(e),
                };
                report(admin.advisory());
                applied?;
            } else if action == OrderAction::Cancel {
                let mut shop = ctx.storefront(Some(session));
                let applied = match shop.order(id).await {
                    Ok(order) => shop.cancel_order(&order).await,
                    Err(e) => Err(e),
                };
                report(shop.advisory());
                applied?;
            } else {
                return Err(AppError::NotPermitted(format!(
                    "customers cannot {} orders",
                    action
                )));
            }
        }
    }
    Ok(())
}

async fn edit_order(
    shop: &mut StorefrontService<HttpBackend>,
    id: i64,
    items: &[(i64, i64)],
) -> Result<Order, AppError> {
    let order = shop.order(id).await?;
    let mut draft = shop.begin_edit(&order).await?;

    for &(product_id, quantity) in items {
        let index = match draft.position(product_id) {
            Some(index) => index,
            None => {
                draft.add_item(Some(product_id));
                draft.items().len() - 1
            }
        };
        if let Some(advisory) = draft.set_quantity(index, quantity) {
            report(Some(&advisory));
        }
    }
    // Lines not named on the command line are dropped.
    for index in (0..draft.items().len()).rev() {
        let product_id = draft.items()[index].product_id;
        if !items.iter().any(|(id, _)| *id == product_id) {
            if let Some(advisory) = draft.remove_item(index) {
                report(Some(&advisory));
            }
        }
    }
    shop.save_edit(&draft).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

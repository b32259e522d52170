use canteen_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    domain::{Category, OrderStatus, PaymentMethod, Role, Toggle},
    dto::{
        cart::{AddToCartRequest, SetQuantityRequest},
        dashboard::{ReportQuery, ReportRange},
        orders::{AdvanceOrderRequest, CheckoutRequest, SetOrderStatusRequest},
        products::LowStockQuery,
    },
    entity::products::ActiveModel as ProductActive,
    error::AppError,
    middleware::auth::AuthUser,
    services::{
        admin_service,
        auth_service::{NewAccount, create_account},
        cart_service, dashboard_service, expiration_service, favorite_service, order_service,
        product_service, user_service,
    },
    state::AppState,
};
use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Customer fills a cart and checks out; staff advance the order; admin
// overrides the status and checks stock.
#[tokio::test]
async fn cart_checkout_advance_and_override_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_user(&state, Role::Customer, "student@example.com").await?;
    let staff = create_user(&state, Role::CanteenPersonnel, "kitchen@example.com").await?;
    let admin = create_user(&state, Role::Admin, "admin@example.com").await?;

    let burger = create_product(&state, "Burger", Category::Food, 6000, 10).await?;
    let coffee = create_product(&state, "Coffee", Category::Beverages, 4500, 3).await?;

    // Two adds of the same product merge into one line.
    for quantity in [1, 1] {
        cart_service::add_to_cart(
            &state,
            &customer,
            AddToCartRequest { product_id: burger, quantity },
        )
        .await?;
    }
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest { product_id: coffee, quantity: 1 },
    )
    .await?;

    let over = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest { product_id: burger, quantity: 19 },
    )
    .await;
    assert!(matches!(over, Err(AppError::Validation(_))));

    let cart = cart_service::list_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_amount, 16500);

    // Clamped to the three coffees in stock, then put back to one.
    let clamped = cart_service::set_quantity(
        &state,
        &customer,
        coffee,
        SetQuantityRequest { quantity: 25 },
    )
    .await?;
    assert_eq!(clamped.data.unwrap().quantity, 3);
    cart_service::set_quantity(&state, &customer, coffee, SetQuantityRequest { quantity: 1 })
        .await?;

    // A failed checkout keeps the cart.
    let missing_payment = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            payment_method: None,
            pickup_time: Some("now".into()),
            notes: None,
        },
    )
    .await;
    assert!(matches!(missing_payment, Err(AppError::Validation(_))));
    let cart = cart_service::list_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(cart.items.len(), 2);

    let placed = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            payment_method: Some(PaymentMethod::Cash),
            pickup_time: Some("now".into()),
            notes: Some("  no onions  ".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(placed.order.total_amount, 16500);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.notes.as_deref(), Some("no onions"));
    assert_eq!(placed.items.len(), 2);

    let cart = cart_service::list_cart(&state, &customer).await?.data.unwrap();
    assert!(cart.items.is_empty());

    // Lines come back in the order they were placed.
    let fetched = order_service::get_order(&state, &customer, placed.order.id)
        .await?
        .data
        .unwrap();
    let placed_ids: Vec<Uuid> = placed.items.iter().map(|i| i.id).collect();
    let fetched_ids: Vec<Uuid> = fetched.items.iter().map(|i| i.id).collect();
    assert_eq!(fetched_ids, placed_ids);
    assert_eq!(fetched.items[0].product_id, burger);

    let stock = product_service::get_product(&state, burger).await?.data.unwrap().stock;
    assert_eq!(stock, 8);

    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery { page: None, per_page: None, threshold: Some(8) },
    )
    .await?;
    assert!(low.meta.and_then(|m| m.total).unwrap_or(0) >= 1);
    assert!(low.data.unwrap().items.iter().all(|p| p.stock <= 8));

    let order_id = placed.order.id;
    let queue = order_service::active_queue(&state, &staff).await?.data.unwrap();
    assert!(queue.items.iter().any(|o| o.order.id == order_id));

    let advanced = order_service::advance_order(
        &state,
        &staff,
        order_id,
        AdvanceOrderRequest { expected_status: Some(OrderStatus::Pending) },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(advanced.order.status, OrderStatus::Preparing);

    // Someone else already moved it past pending.
    let stale = order_service::advance_order(
        &state,
        &staff,
        order_id,
        AdvanceOrderRequest { expected_status: Some(OrderStatus::Pending) },
    )
    .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    for expected in [OrderStatus::Ready, OrderStatus::Delivered, OrderStatus::Delivered] {
        let order = order_service::advance_order(
            &state,
            &staff,
            order_id,
            AdvanceOrderRequest::default(),
        )
        .await?
        .data
        .unwrap();
        assert_eq!(order.order.status, expected);
    }

    let report = dashboard_service::admin_report(
        &state,
        &admin,
        ReportQuery { range: Some(ReportRange::Today) },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(report.range, ReportRange::Today);
    assert!(report.since.is_some());
    assert!(report.summary.orders >= 1);
    assert!(report.summary.completed >= 1);
    assert!(report.summary.revenue >= 16500);
    assert!(report.top_products.len() <= 10);
    assert!(
        report
            .top_products
            .windows(2)
            .all(|pair| pair[0].quantity >= pair[1].quantity)
    );
    if let Some(sold) = report.top_products.iter().find(|p| p.product_id == burger) {
        assert_eq!((sold.quantity, sold.revenue), (2, 12000));
    }
    let food = report
        .categories
        .iter()
        .find(|c| c.category == Category::Food)
        .expect("food category");
    assert!(food.product_count >= 1);
    assert!(food.total_stock >= 8);

    let staff_report =
        dashboard_service::admin_report(&state, &staff, ReportQuery::default()).await;
    assert!(matches!(staff_report, Err(AppError::Forbidden)));

    // A customer with orders cannot be deleted.
    let delete = user_service::delete_user(&state, &admin, customer.user_id).await;
    assert!(matches!(delete, Err(AppError::Conflict(_))));

    let overridden = admin_service::force_set_status(
        &state,
        &admin,
        order_id,
        SetOrderStatusRequest { status: OrderStatus::Ready },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(overridden.order.status, OrderStatus::Ready);

    let forbidden = admin_service::force_set_status(
        &state,
        &staff,
        order_id,
        SetOrderStatusRequest { status: OrderStatus::Delivered },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    // Ready with a "now" pickup: expires once window and grace have passed.
    expiration_service::expire_overdue_orders(&state, Utc::now()).await?;
    let still_ready = order_service::get_order(&state, &customer, order_id).await?.data.unwrap();
    assert_eq!(still_ready.order.status, OrderStatus::Ready);

    let later = Utc::now() + Duration::minutes(41);
    let expired = expiration_service::expire_overdue_orders(&state, later).await?;
    assert!(expired >= 1);

    let mine = order_service::get_order(&state, &customer, order_id).await?.data.unwrap();
    assert_eq!(mine.order.status, OrderStatus::Expired);

    Ok(())
}

#[tokio::test]
async fn concurrent_first_adds_merge_into_one_line() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_user(&state, Role::Customer, "rush@example.com").await?;
    let siomai = create_product(&state, "Siomai", Category::Snacks, 3000, 50).await?;

    let request = || AddToCartRequest { product_id: siomai, quantity: 1 };
    let (first, second) = tokio::join!(
        cart_service::add_to_cart(&state, &customer, request()),
        cart_service::add_to_cart(&state, &customer, request()),
    );
    first?;
    second?;

    let cart = cart_service::list_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);

    Ok(())
}

#[tokio::test]
async fn favorite_toggle_twice_restores_state() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_user(&state, Role::Customer, "fan@example.com").await?;
    let fries = create_product(&state, "French Fries", Category::Snacks, 4500, 20).await?;

    let first = favorite_service::toggle_favorite(&state, &customer, fries)
        .await?
        .data
        .unwrap();
    assert_eq!(first.outcome, Toggle::Added);
    assert!(first.is_favorite);

    let listed = favorite_service::list_favorites(&state, &customer, Default::default())
        .await?
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 1);

    let second = favorite_service::toggle_favorite(&state, &customer, fries)
        .await?
        .data
        .unwrap();
    assert_eq!(second.outcome, Toggle::Removed);

    let listed = favorite_service::list_favorites(&state, &customer, Default::default())
        .await?
        .data
        .unwrap();
    assert!(listed.items.is_empty());

    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "flow-test-secret".into(),
        jwt_ttl_hours: 24,
        cors_origin: "http://localhost:3000".into(),
        pickup_now_window_minutes: 10,
        pickup_grace_minutes: 30,
        expiration_sweep_secs: 60,
        business_utc_offset_minutes: 480,
    };

    Ok(Some(AppState::new(pool, config)))
}

// Unique emails and product names keep the two tests independent when they
// share a database.
async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let user = create_account(
        &state.orm,
        NewAccount {
            first_name: "Test".into(),
            last_name: role.label().into(),
            email: format!("{}+{email}", Uuid::new_v4().simple()),
            phone_number: None,
            password: "correct horse".into(),
            role,
        },
    )
    .await?;

    Ok(AuthUser { user_id: user.id, role })
}

async fn create_product(
    state: &AppState,
    name: &str,
    category: Category,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{name} {}", Uuid::new_v4().simple())),
        description: Set(None),
        price: Set(price),
        category: Set(category.as_str().to_string()),
        stock: Set(stock),
        image: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

use anyhow::Context;
use canteen_api::{
    db::{create_pool, run_migrations},
    domain::{Category, Role},
    services::auth_service::{hash_password, normalize_email},
};
use uuid::Uuid;

/// (name, category, price in centavos, stock)
const MENU: &[(&str, Category, i64, i32)] = &[
    ("Chicken Meal", Category::Meals, 9500, 30),
    ("Fish Meal", Category::Meals, 8500, 25),
    ("Beef Steak Meal", Category::Meals, 12000, 15),
    ("Vegetarian Meal", Category::Meals, 7500, 20),
    ("Burger", Category::Food, 6000, 40),
    ("Fried Rice", Category::Food, 6000, 40),
    ("Spaghetti", Category::Food, 7500, 25),
    ("Chicken Adobo", Category::Food, 8500, 25),
    ("French Fries", Category::Snacks, 4500, 50),
    ("Chicken Wings", Category::Snacks, 6500, 30),
    ("Nachos", Category::Snacks, 7000, 20),
    ("Coffee", Category::Beverages, 4500, 60),
    ("Iced Tea", Category::Beverages, 3000, 60),
    ("Mango Shake", Category::Beverages, 5000, 30),
    ("Bottled Water", Category::Others, 2000, 100),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let email = std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@canteen.local".into());
    let password =
        std::env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD is not set")?;

    let admin_id = ensure_admin(&pool, &email, &password).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

/// Creates the admin account, or promotes an existing account with that email.
/// An existing password is left as it is.
async fn ensure_admin(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let email = normalize_email(email);
    let password_hash = hash_password(password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, first_name, last_name, email, password_hash, role)
        VALUES ($1, 'Canteen', 'Admin', $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(password_hash)
    .bind(Role::Admin.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {email}");
    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let mut inserted = 0;
    for &(name, category, price, stock) in MENU {
        let result = sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category, stock)
            VALUES ($1, $2, NULL, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price)
        .bind(category.as_str())
        .bind(stock)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    println!("Seeded {inserted} products");
    Ok(())
}

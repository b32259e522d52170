use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{Category, OrderStatus, PaymentMethod, Role, Toggle},
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartView, SetQuantityRequest},
        dashboard::{
            AdminDashboardStats, AdminReport, CanteenDashboardStats, CategoryBreakdown,
            ReportRange, ReportSummary, TopProduct,
        },
        favorites::{AddFavoriteRequest, FavoriteProductList, ToggleFavoriteResponse},
        orders::{
            AdvanceOrderRequest, CheckoutRequest, OrderList, OrderQueue, OrderWithItems,
            SetOrderStatusRequest,
        },
        products::{CreateProductRequest, InventoryAdjustRequest, ProductList, UpdateProductRequest},
        users::{CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, UserList},
    },
    models::{CartItem, Favorite, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, canteen, cart, favorites, health, orders, params, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::set_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        favorites::toggle_favorite,
        users::get_me,
        users::update_me,
        canteen::active_orders,
        canteen::get_order,
        canteen::advance_order,
        canteen::dashboard_stats,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::set_order_status,
        admin::dashboard_stats,
        admin::reports,
        admin::list_users,
        admin::create_user,
        admin::update_user,
        admin::delete_user,
        admin::list_low_stock,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Product,
            Favorite,
            CartItem,
            Order,
            OrderItem,
            Role,
            Category,
            OrderStatus,
            PaymentMethod,
            Toggle,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            InventoryAdjustRequest,
            AddToCartRequest,
            SetQuantityRequest,
            CheckoutRequest,
            AdvanceOrderRequest,
            SetOrderStatusRequest,
            AddFavoriteRequest,
            UpdateProfileRequest,
            CreateUserRequest,
            UpdateUserRequest,
            ProductList,
            CartView,
            OrderList,
            OrderQueue,
            OrderWithItems,
            FavoriteProductList,
            ToggleFavoriteResponse,
            UserList,
            AdminDashboardStats,
            CanteenDashboardStats,
            ReportRange,
            ReportSummary,
            TopProduct,
            CategoryBreakdown,
            AdminReport,
            params::Pagination,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Products", description = "Menu catalog"),
        (name = "Cart", description = "Server-held shopping cart"),
        (name = "Orders", description = "Checkout and the customer's orders"),
        (name = "Favorites", description = "Favorite products"),
        (name = "Users", description = "The caller's profile"),
        (name = "Canteen", description = "Order queue and dashboard for canteen staff"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

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
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartAction, CartLine, CartView, UpdateCartRequest},
        catalog::{CategoryList, HomePage, ProductDetail, ProductList},
        orders::{
            CheckoutPage, CheckoutPrefill, CheckoutRequest, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
    },
    models::{CartItem, Category, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, catalog, checkout, health, orders},
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
        catalog::home,
        catalog::list_categories,
        catalog::list_products,
        catalog::get_product,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart,
        cart::remove_from_cart,
        checkout::checkout_page,
        checkout::checkout,
        orders::order_history,
        orders::order_success,
        admin::update_order_status
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            CartItem,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            HomePage,
            CategoryList,
            ProductList,
            ProductDetail,
            AddToCartRequest,
            CartAction,
            UpdateCartRequest,
            CartLine,
            CartView,
            CheckoutRequest,
            CheckoutPrefill,
            CheckoutPage,
            OrderList,
            OrderWithItems,
            UpdateOrderStatusRequest,
            Meta,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Catalog", description = "Categories and products"),
        (name = "Cart", description = "Cart of the current visitor, user or anonymous session"),
        (name = "Checkout", description = "Turn the cart into an order"),
        (name = "Orders", description = "Order confirmation and history"),
        (name = "Admin", description = "Operator endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

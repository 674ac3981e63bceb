use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutPage, CheckoutPrefill, CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Model as ProductModel,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::cart_service::{build_cart_view, line_total, load_lines, resolve_user_cart},
    state::AppState,
};

pub const STATUS_PLACED: &str = "placed";

/// One order line as captured at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSnapshot {
    pub product_id: Uuid,
    pub price: i64,
    pub quantity: i32,
}

/// Freezes the current cart lines and their total. Prices come from the
/// product rows as they are right now.
pub fn snapshot_lines(lines: &[(CartItemModel, ProductModel)]) -> (Vec<LineSnapshot>, i64) {
    let snapshot: Vec<LineSnapshot> = lines
        .iter()
        .map(|(item, product)| LineSnapshot {
            product_id: product.id,
            price: product.price,
            quantity: item.quantity,
        })
        .collect();
    let total = snapshot
        .iter()
        .map(|line| line_total(line.price, line.quantity))
        .sum();
    (snapshot, total)
}

/// Trims the submitted details and rejects blank or malformed fields.
pub fn validate_checkout(payload: CheckoutRequest) -> AppResult<CheckoutRequest> {
    fn required(field: &str, value: String) -> AppResult<String> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
        Ok(value)
    }

    let details = CheckoutRequest {
        full_name: required("full_name", payload.full_name)?,
        email: required("email", payload.email)?,
        phone: required("phone", payload.phone)?,
        address: required("address", payload.address)?,
        city: required("city", payload.city)?,
        postal_code: required("postal_code", payload.postal_code)?,
    };

    let valid_email = details
        .email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid_email {
        return Err(AppError::BadRequest("email is invalid".into()));
    }

    Ok(details)
}

pub async fn checkout_page(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CheckoutPage>> {
    let cart = resolve_user_cart(&state.orm, user.user_id).await?;
    let view = build_cart_view(&state.orm, &cart).await?;
    if view.items.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Checkout",
        CheckoutPage {
            cart: view,
            prefill: CheckoutPrefill {
                email: account.email,
                phone: account.phone.unwrap_or_default(),
            },
        },
        Some(Meta::empty()),
    ))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let cart = resolve_user_cart(&txn, user.user_id).await?;
    let lines = load_lines(&txn, cart.id, true).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let details = validate_checkout(payload)?;
    let (snapshot, total) = snapshot_lines(&lines);

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set(STATUS_PLACED.into()),
        total: Set(total),
        full_name: Set(details.full_name),
        email: Set(details.email),
        phone: Set(details.phone),
        address: Set(details.address),
        city: Set(details.city),
        postal_code: Set(details.postal_code),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(snapshot.len());
    for line in &snapshot {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            price: Set(line.price),
            quantity: Set(line.quantity),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    // empty the cart, the cart row itself stays
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total,
        lines = items.len(),
        "order placed"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": total }),
    )
    .await;

    let order = order_from_entity(order);
    Ok(ApiResponse::success(
        format!("Order #{} placed successfully", order.id),
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = find_order_items(state, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn find_order_items(state: &AppState, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect())
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status,
        total: model.total,
        full_name: model.full_name,
        email: model.email,
        phone: model.phone,
        address: model.address,
        city: model.city,
        postal_code: model.postal_code,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        price: model.price,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

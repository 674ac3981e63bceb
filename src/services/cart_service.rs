use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartAction, CartLine, CartView},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems,
            Model as CartItemModel,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        guests::{ActiveModel as GuestActive, Column as GuestCol, Entity as Guests, Model as GuestModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::session::Visitor,
    models::CartItem,
    response::{ApiResponse, Meta},
    services::catalog_service::{find_product, product_from_entity},
    state::AppState,
};

/// Most units of one product a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// Quantity of a line holding `existing` units after `added` more.
pub fn accumulate(existing: i32, added: i32) -> AppResult<i32> {
    if added <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    existing
        .checked_add(added)
        .filter(|total| *total <= MAX_LINE_QUANTITY)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "at most {MAX_LINE_QUANTITY} units of a product per cart"
            ))
        })
}

/// What an update-cart action does to a line currently holding `quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    SetQuantity(i32),
    Delete,
}

pub fn plan_update(action: CartAction, quantity: i32) -> AppResult<ItemChange> {
    match action {
        CartAction::Increase => accumulate(quantity, 1).map(ItemChange::SetQuantity),
        CartAction::Decrease if quantity > 1 => Ok(ItemChange::SetQuantity(quantity - 1)),
        CartAction::Decrease | CartAction::Remove => Ok(ItemChange::Delete),
    }
}

pub fn line_total(price: i64, quantity: i32) -> i64 {
    price * i64::from(quantity)
}

/// Sum of price x quantity over the given lines.
pub fn get_total(lines: &[CartLine]) -> i64 {
    lines
        .iter()
        .map(|line| line_total(line.product.price, line.quantity))
        .sum()
}

/// Chooses which of several carts owned by the same user survives: the first
/// one holding items, otherwise the first one. Returns the survivor and the
/// empty carts to delete; non-empty extras are left alone.
pub fn pick_active_cart(carts: &[(Uuid, u64)]) -> Option<(Uuid, Vec<Uuid>)> {
    let keep = carts
        .iter()
        .find(|(_, items)| *items > 0)
        .or_else(|| carts.first())
        .map(|(id, _)| *id)?;

    let discard = carts
        .iter()
        .filter(|(id, items)| *id != keep && *items == 0)
        .map(|(id, _)| *id)
        .collect();

    Some((keep, discard))
}

pub async fn resolve_cart<C: ConnectionTrait>(conn: &C, visitor: &Visitor) -> AppResult<CartModel> {
    match visitor {
        Visitor::User(user) => resolve_user_cart(conn, user.user_id).await,
        Visitor::Guest { session_token } => resolve_guest_cart(conn, session_token).await,
    }
}

pub async fn resolve_user_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<CartModel> {
    let carts = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(conn)
        .await?;

    if carts.len() > 1 {
        return reconcile_user_carts(conn, user_id, carts).await;
    }
    if let Some(cart) = carts.into_iter().next() {
        return Ok(cart);
    }

    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user_id)),
        guest_id: Set(None),
        session_token: Set(None),
        created_at: NotSet,
    };
    Carts::insert(cart)
        .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await
        .map_err(|err| match err.sql_err() {
            // the token outlived its account
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                tracing::warn!(%user_id, "cart requested for unknown user");
                AppError::Unauthorized("Account no longer exists".into())
            }
            _ => AppError::from(err),
        })?;
    tracing::debug!(%user_id, "opened user cart");

    Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn reconcile_user_carts<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    carts: Vec<CartModel>,
) -> AppResult<CartModel> {
    let mut counted = Vec::with_capacity(carts.len());
    for cart in &carts {
        let items = CartItems::find()
            .filter(CartItemCol::CartId.eq(cart.id))
            .count(conn)
            .await?;
        counted.push((cart.id, items));
    }

    let (keep, discard) = pick_active_cart(&counted).ok_or(AppError::NotFound)?;
    if !discard.is_empty() {
        tracing::warn!(%user_id, discarded = discard.len(), "removing duplicate empty carts");
        Carts::delete_many()
            .filter(CartCol::Id.is_in(discard))
            .exec(conn)
            .await?;
    }

    carts
        .into_iter()
        .find(|cart| cart.id == keep)
        .ok_or(AppError::NotFound)
}

async fn ensure_guest<C: ConnectionTrait>(conn: &C, session_token: &str) -> AppResult<GuestModel> {
    let guest = GuestActive {
        id: Set(Uuid::new_v4()),
        session_token: Set(session_token.to_string()),
        created_at: NotSet,
    };
    Guests::insert(guest)
        .on_conflict(OnConflict::column(GuestCol::SessionToken).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    Guests::find()
        .filter(GuestCol::SessionToken.eq(session_token))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn resolve_guest_cart<C: ConnectionTrait>(
    conn: &C,
    session_token: &str,
) -> AppResult<CartModel> {
    let guest = ensure_guest(conn, session_token).await?;

    let existing = Carts::find()
        .filter(CartCol::GuestId.eq(guest.id))
        .filter(CartCol::SessionToken.eq(session_token))
        .one(conn)
        .await?;
    if let Some(cart) = existing {
        return Ok(cart);
    }

    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(None),
        guest_id: Set(Some(guest.id)),
        session_token: Set(Some(session_token.to_string())),
        created_at: NotSet,
    };
    Carts::insert(cart)
        .on_conflict(
            OnConflict::columns([CartCol::GuestId, CartCol::SessionToken])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    tracing::debug!(guest_id = %guest.id, "opened guest cart");

    Carts::find()
        .filter(CartCol::GuestId.eq(guest.id))
        .filter(CartCol::SessionToken.eq(session_token))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Cart items joined with their products, oldest line first. With `lock`
/// the item rows are held `FOR UPDATE` until the surrounding transaction ends.
pub async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    lock: bool,
) -> AppResult<Vec<(CartItemModel, ProductModel)>> {
    let mut finder = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt);
    if lock {
        finder = finder.lock(LockType::Update);
    }
    let items = finder.all(conn).await?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    let mut products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    items
        .into_iter()
        .map(|item| {
            let product = products
                .remove(&item.product_id)
                .ok_or(AppError::NotFound)?;
            Ok((item, product))
        })
        .collect()
}

pub async fn build_cart_view<C: ConnectionTrait>(conn: &C, cart: &CartModel) -> AppResult<CartView> {
    let items: Vec<CartLine> = load_lines(conn, cart.id, false)
        .await?
        .into_iter()
        .map(|(item, product)| CartLine {
            id: item.id,
            line_total: line_total(product.price, item.quantity),
            product: product_from_entity(product),
            quantity: item.quantity,
        })
        .collect();

    Ok(CartView {
        id: cart.id,
        item_count: items.iter().map(|line| i64::from(line.quantity)).sum(),
        total: get_total(&items),
        items,
    })
}

pub async fn view_cart(state: &AppState, visitor: &Visitor) -> AppResult<ApiResponse<CartView>> {
    let cart = resolve_cart(&state.orm, visitor).await?;
    let view = build_cart_view(&state.orm, &cart).await?;
    Ok(ApiResponse::success("Cart", view, Some(Meta::empty())))
}

pub async fn add_to_cart(
    state: &AppState,
    visitor: &Visitor,
    slug: &str,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let quantity = accumulate(0, payload.quantity.unwrap_or(1))?;

    let product = find_product(state, slug).await?;
    if !product.available {
        return Err(AppError::ProductUnavailable(product.name));
    }

    let cart = resolve_cart(&state.orm, visitor).await?;

    // A repeated add lands on the (cart, product) unique key and bumps the
    // quantity, unless that would push the line past the cap.
    let item = CartItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart.id),
        product_id: Set(product.id),
        quantity: Set(quantity),
        created_at: NotSet,
    };
    let written = CartItems::insert(item)
        .on_conflict(
            OnConflict::columns([CartItemCol::CartId, CartItemCol::ProductId])
                .value(
                    CartItemCol::Quantity,
                    Expr::cust("cart_items.quantity + EXCLUDED.quantity"),
                )
                .action_and_where(Expr::cust(format!(
                    "cart_items.quantity + EXCLUDED.quantity <= {MAX_LINE_QUANTITY}"
                )))
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;
    if written == 0 {
        tracing::debug!(cart_id = %cart.id, product = %product.slug, "line quantity cap reached");
        return Err(AppError::BadRequest(format!(
            "at most {MAX_LINE_QUANTITY} units of a product per cart"
        )));
    }

    let item = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(
        cart_id = %cart.id,
        product = %product.slug,
        added = quantity,
        quantity = item.quantity,
        "added to cart"
    );
    audit::record(
        &state.pool,
        visitor.user_id(),
        "cart_add",
        "cart_items",
        serde_json::json!({ "cart_id": cart.id, "product_id": product.id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} added to cart", product.name),
        cart_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    visitor: &Visitor,
    item_id: Uuid,
    action: CartAction,
) -> AppResult<ApiResponse<CartView>> {
    let cart = resolve_cart(&state.orm, visitor).await?;

    let item = CartItems::find_by_id(item_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if item.cart_id != cart.id {
        tracing::warn!(%item_id, cart_id = %cart.id, "cart item belongs to another cart");
        return Err(AppError::Forbidden);
    }

    let change = plan_update(action, item.quantity)?;
    let message = match change {
        ItemChange::SetQuantity(quantity) => {
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?;
            "Cart updated"
        }
        ItemChange::Delete => {
            item.delete(&state.orm).await?;
            "Product removed from cart"
        }
    };
    tracing::debug!(%item_id, ?action, ?change, "cart item updated");

    audit::record(
        &state.pool,
        visitor.user_id(),
        if change == ItemChange::Delete { "cart_remove" } else { "cart_update" },
        "cart_items",
        serde_json::json!({ "cart_id": cart.id, "item_id": item_id, "action": action }),
    )
    .await;

    let view = build_cart_view(&state.orm, &cart).await?;
    Ok(ApiResponse::success(message, view, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    visitor: &Visitor,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    update_item(state, visitor, item_id, CartAction::Remove).await
}

pub fn cart_item_from_entity(model: CartItemModel) -> CartItem {
    CartItem {
        id: model.id,
        cart_id: model.cart_id,
        product_id: model.product_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

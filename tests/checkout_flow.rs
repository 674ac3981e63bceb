mod common;

use axum_storefront::{
    dto::{
        cart::AddToCartRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
    },
    entity::{
        carts::Entity as Carts,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    },
    error::AppError,
    middleware::{auth::ROLE_ADMIN, session::Visitor},
    routes::params::Pagination,
    services::{admin_service, cart_service, order_service},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use common::{create_product, create_user, customer, set_price, setup_state};

fn details() -> CheckoutRequest {
    CheckoutRequest {
        full_name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        phone: "0600000000".into(),
        address: "12 Analytical Row".into(),
        city: "London".into(),
        postal_code: "N1 9GU".into(),
    }
}

fn qty(quantity: i32) -> AddToCartRequest {
    AddToCartRequest {
        quantity: Some(quantity),
    }
}

#[tokio::test]
async fn empty_cart_never_creates_an_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = customer(&state).await?;

    let err = order_service::checkout_page(&state, &user).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    let err = order_service::checkout(&state, &user, details())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);
    Ok(())
}

#[tokio::test]
async fn checkout_snapshots_cart_and_empties_it() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = customer(&state).await?;
    let visitor = Visitor::User(user.clone());
    let a = create_product(&state, 10, true).await?;
    let b = create_product(&state, 5, true).await?;

    cart_service::add_to_cart(&state, &visitor, &a.slug, qty(2)).await?;
    cart_service::add_to_cart(&state, &visitor, &b.slug, qty(1)).await?;

    let page = order_service::checkout_page(&state, &user).await?.data.unwrap();
    assert_eq!(page.cart.total, 25);
    assert_eq!(page.prefill.phone, "0600000000");

    let placed = order_service::checkout(&state, &user, details())
        .await?
        .data
        .unwrap();
    assert_eq!(placed.order.total, 25);
    assert_eq!(placed.order.status, "placed");
    assert_eq!(placed.items.len(), 2);

    let line_a = placed.items.iter().find(|i| i.product_id == a.id).unwrap();
    let line_b = placed.items.iter().find(|i| i.product_id == b.id).unwrap();
    assert_eq!((line_a.price, line_a.quantity), (10, 2));
    assert_eq!((line_b.price, line_b.quantity), (5, 1));

    // cart is empty but still there
    let cart = cart_service::resolve_cart(&state.orm, &visitor).await?;
    assert!(Carts::find_by_id(cart.id).one(&state.orm).await?.is_some());
    let view = cart_service::view_cart(&state, &visitor).await?.data.unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.total, 0);

    // later price changes leave the order untouched
    set_price(&state, &a, 99).await?;
    let stored = order_service::get_order(&state, &user, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(stored.order.total, 25);
    let stored_a = stored.items.iter().find(|i| i.product_id == a.id).unwrap();
    assert_eq!(stored_a.price, 10);

    // a second checkout on the now empty cart is refused
    let err = order_service::checkout(&state, &user, details())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));
    Ok(())
}

#[tokio::test]
async fn invalid_details_leave_cart_intact() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = customer(&state).await?;
    let visitor = Visitor::User(user.clone());
    let product = create_product(&state, 40, true).await?;
    cart_service::add_to_cart(&state, &visitor, &product.slug, qty(3)).await?;

    let mut payload = details();
    payload.address = "  ".into();
    let err = order_service::checkout(&state, &user, payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let view = cart_service::view_cart(&state, &visitor).await?.data.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.total, 120);
    Ok(())
}

#[tokio::test]
async fn history_is_private_and_newest_first() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = customer(&state).await?;
    let other = customer(&state).await?;
    let visitor = Visitor::User(user.clone());
    let product = create_product(&state, 100, true).await?;

    let mut placed = Vec::new();
    for quantity in [1, 2] {
        cart_service::add_to_cart(&state, &visitor, &product.slug, qty(quantity)).await?;
        let order = order_service::checkout(&state, &user, details())
            .await?
            .data
            .unwrap()
            .order;
        placed.push(order.id);
    }

    let history = order_service::list_orders(&state, &user, Pagination::default())
        .await?;
    assert_eq!(history.meta.as_ref().and_then(|m| m.total), Some(2));
    let ids: Vec<_> = history.data.unwrap().items.into_iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![placed[1], placed[0]]);

    let others = order_service::list_orders(&state, &other, Pagination::default())
        .await?
        .data
        .unwrap();
    assert!(others.items.is_empty());

    let err = order_service::get_order(&state, &other, placed[0])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn only_admins_move_order_status() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = customer(&state).await?;
    let admin = create_user(&state, ROLE_ADMIN).await?;
    let visitor = Visitor::User(user.clone());
    let product = create_product(&state, 100, true).await?;
    cart_service::add_to_cart(&state, &visitor, &product.slug, qty(1)).await?;
    let order = order_service::checkout(&state, &user, details())
        .await?
        .data
        .unwrap()
        .order;

    let err = admin_service::update_order_status(
        &state,
        &user,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let updated = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "Shipped".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.order.status, "shipped");
    assert_eq!(updated.order.total, 100);
    Ok(())
}

#[tokio::test]
async fn history_order_is_stable_for_simultaneous_orders() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = customer(&state).await?;
    let placed_at = chrono::Utc::now().fixed_offset();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let d = details();
        let order = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            status: Set("placed".into()),
            total: Set(100),
            full_name: Set(d.full_name),
            email: Set(d.email),
            phone: Set(d.phone),
            address: Set(d.address),
            city: Set(d.city),
            postal_code: Set(d.postal_code),
            created_at: Set(placed_at),
            updated_at: Set(placed_at),
        }
        .insert(&state.orm)
        .await?;
        ids.push(order.id);
    }
    ids.sort();
    ids.reverse();

    for _ in 0..2 {
        let listed: Vec<Uuid> = order_service::list_orders(&state, &user, Pagination::default())
            .await?
            .data
            .unwrap()
            .items
            .into_iter()
            .map(|order| order.id)
            .collect();
        assert_eq!(listed, ids);
    }
    Ok(())
}

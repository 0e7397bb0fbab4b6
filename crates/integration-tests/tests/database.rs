//! Checkout, cancellation, payment and notification behaviour against Postgres.
//!
//! Each test creates its own customers and products, so the suite can share
//! one scratch database. Run with
//! `TEST_DATABASE_URL=... cargo test -p hardware-store-integration-tests --test database -- --ignored`.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use hardware_store_api::config::TwilioConfig;
use hardware_store_api::db::{
    CancelOutcome, CartRepository, CategoryRepository, ChargeOutcome, NotificationRepository,
    OrderRepository, PaymentRepository, ProductRepository, UserRepository,
};
use hardware_store_api::models::{NewProduct, NewUser, Order, Product, ShippingAddress, User};
use hardware_store_api::services::checkout::{CheckoutError, CheckoutService, PlaceOrder};
use hardware_store_api::services::notifications::{Message, NotificationError, NotificationService};
use hardware_store_core::{
    CategoryId, Email, NotificationChannel, NotificationStatus, OrderStatus, PhoneNumber,
    ProductId, UserId, UserRole,
};
use hardware_store_integration_tests::{migrated_pool, test_config};

struct Store {
    pool: PgPool,
    category: CategoryId,
}

impl Store {
    async fn open() -> Self {
        let pool = migrated_pool().await;
        let category = CategoryRepository::new(&pool)
            .upsert_by_slug("Integration Tools", "integration-tools")
            .await
            .unwrap()
            .id;
        Self { pool, category }
    }

    async fn customer(&self, phone: Option<&str>) -> User {
        let email = format!("db-{}@hardwarestore.com", Uuid::new_v4().simple());
        UserRepository::new(&self.pool)
            .create(&NewUser {
                email: Email::parse(&email).unwrap(),
                password_hash: "$argon2id$unused".to_owned(),
                full_name: "Database Tester".to_owned(),
                phone: phone.map(|p| PhoneNumber::parse(p).unwrap()),
                role: UserRole::Customer,
            })
            .await
            .unwrap()
    }

    async fn product(&self, stock: i32) -> Product {
        let tag = Uuid::new_v4().simple().to_string();
        ProductRepository::new(&self.pool)
            .create(&NewProduct {
                sku: format!("IT-{tag}"),
                name: format!("Claw Hammer {tag}"),
                slug: format!("claw-hammer-{tag}"),
                category_id: self.category,
                description: String::new(),
                price: Decimal::new(1_250, 0),
                stock_quantity: stock,
                images: Vec::new(),
                is_active: true,
            })
            .await
            .unwrap()
    }

    async fn add_to_cart(&self, user: UserId, product: &Product, quantity: i32) {
        let carts = CartRepository::new(&self.pool);
        let cart = carts.get_or_create(user).await.unwrap();
        carts
            .add_item(cart, product.id, quantity, product.price)
            .await
            .unwrap();
    }

    async fn stock(&self, id: ProductId) -> i32 {
        ProductRepository::new(&self.pool)
            .get(id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    async fn order_count(&self, user: UserId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn cart_lines(&self, user: UserId) -> usize {
        CartRepository::new(&self.pool)
            .get_cart(user)
            .await
            .unwrap()
            .items
            .len()
    }

    async fn checkout(&self, user: UserId) -> Result<Order, CheckoutError> {
        CheckoutService::new(&self.pool)
            .place_order(user, &order_request())
            .await
            .map(|placed| placed.order)
    }
}

fn order_request() -> PlaceOrder {
    PlaceOrder {
        address: ShippingAddress {
            label: "Workshop".to_owned(),
            line: "12 Kenyatta Avenue".to_owned(),
            city: "Nairobi".to_owned(),
            country: "Kenya".to_owned(),
        },
        service_request: None,
        payment_method: None,
        shipping_method: Some("standard".to_owned()),
    }
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_checkout_deducts_stock_and_empties_cart() {
    let store = Store::open().await;
    let user = store.customer(None).await;
    let hammer = store.product(10).await;
    let drill = store.product(4).await;
    store.add_to_cart(user.id, &hammer, 2).await;
    store.add_to_cart(user.id, &drill, 1).await;

    let order = store.checkout(user.id).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Decimal::new(3 * 1_250, 0));
    assert_eq!(store.stock(hammer.id).await, 8);
    assert_eq!(store.stock(drill.id).await, 3);
    assert_eq!(store.cart_lines(user.id).await, 0);

    let stored = OrderRepository::new(&store.pool)
        .get_with_items(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.items.len(), 2);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_short_line_rolls_back_whole_checkout() {
    let store = Store::open().await;
    let user = store.customer(None).await;
    let stocked = store.product(2).await;
    let sold_out = store.product(0).await;
    store.add_to_cart(user.id, &stocked, 1).await;
    store.add_to_cart(user.id, &sold_out, 1).await;

    let err = store.checkout(user.id).await.unwrap_err();

    assert!(matches!(err, CheckoutError::InsufficientStock { .. }), "{err:?}");
    assert_eq!(store.stock(stocked.id).await, 2);
    assert_eq!(store.stock(sold_out.id).await, 0);
    assert_eq!(store.order_count(user.id).await, 0);
    assert_eq!(store.cart_lines(user.id).await, 2);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_empty_cart_creates_no_order() {
    let store = Store::open().await;

    let no_cart = store.customer(None).await;
    let err = store.checkout(no_cart.id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart), "{err:?}");

    let empty_cart = store.customer(None).await;
    CartRepository::new(&store.pool)
        .get_or_create(empty_cart.id)
        .await
        .unwrap();
    let err = store.checkout(empty_cart.id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart), "{err:?}");

    assert_eq!(store.order_count(no_cart.id).await, 0);
    assert_eq!(store.order_count(empty_cart.id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_double_submit_places_one_order() {
    let store = Store::open().await;
    let user = store.customer(None).await;
    let hammer = store.product(10).await;
    store.add_to_cart(user.id, &hammer, 1).await;

    let (first, second) = tokio::join!(store.checkout(user.id), store.checkout(user.id));

    let placed = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(placed, 1, "{first:?} / {second:?}");
    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(CheckoutError::EmptyCart)), "{loser:?}");

    assert_eq!(store.order_count(user.id).await, 1);
    assert_eq!(store.stock(hammer.id).await, 9);
    assert_eq!(store.cart_lines(user.id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_last_unit_goes_to_one_buyer_and_stock_never_negative() {
    let store = Store::open().await;
    let last_one = store.product(1).await;
    let alice = store.customer(None).await;
    let bob = store.customer(None).await;
    store.add_to_cart(alice.id, &last_one, 1).await;
    store.add_to_cart(bob.id, &last_one, 1).await;

    let (a, b) = tokio::join!(store.checkout(alice.id), store.checkout(bob.id));

    let winner = match (&a, &b) {
        (Ok(order), Err(CheckoutError::InsufficientStock { .. }))
        | (Err(CheckoutError::InsufficientStock { .. }), Ok(order)) => order.clone(),
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert_eq!(store.stock(last_one.id).await, 0);

    let outcome = OrderRepository::new(&store.pool)
        .cancel(winner.id, Some(winner.user_id))
        .await
        .unwrap();
    assert!(matches!(outcome, CancelOutcome::Cancelled(_)));
    assert_eq!(store.stock(last_one.id).await, 1);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_cancel_restores_exactly_what_was_taken() {
    let store = Store::open().await;
    let user = store.customer(None).await;
    let cement = store.product(5).await;
    let wire = store.product(7).await;
    store.add_to_cart(user.id, &cement, 3).await;
    store.add_to_cart(user.id, &wire, 7).await;

    let order = store.checkout(user.id).await.unwrap();
    assert_eq!(store.stock(cement.id).await, 2);
    assert_eq!(store.stock(wire.id).await, 0);

    let orders = OrderRepository::new(&store.pool);
    let stranger = store.customer(None).await;
    assert!(matches!(
        orders.cancel(order.id, Some(stranger.id)).await.unwrap(),
        CancelOutcome::NotFound
    ));

    match orders.cancel(order.id, Some(user.id)).await.unwrap() {
        CancelOutcome::Cancelled(cancelled) => assert_eq!(cancelled.status, OrderStatus::Cancelled),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(store.stock(cement.id).await, 5);
    assert_eq!(store.stock(wire.id).await, 7);

    assert!(matches!(
        orders.cancel(order.id, Some(user.id)).await.unwrap(),
        CancelOutcome::NotCancellable(OrderStatus::Cancelled)
    ));
    assert_eq!(store.stock(cement.id).await, 5);
    assert_eq!(store.stock(wire.id).await, 7);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_replayed_charge_is_a_no_op() {
    let store = Store::open().await;
    let user = store.customer(None).await;
    let saw = store.product(3).await;
    store.add_to_cart(user.id, &saw, 1).await;
    let order = store.checkout(user.id).await.unwrap();

    let payments = PaymentRepository::new(&store.pool);
    let payment = payments
        .upsert_pending(order.id, user.id, "paystack", order.total)
        .await
        .unwrap();
    let reference = order.id.to_string();

    match payments.apply_charge(&reference, true).await.unwrap() {
        ChargeOutcome::Applied {
            payment: applied,
            order_confirmed,
        } => {
            assert_eq!(applied.id, payment.id);
            assert!(order_confirmed);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(matches!(
        payments.apply_charge(&reference, true).await.unwrap(),
        ChargeOutcome::Duplicate
    ));
    assert!(matches!(
        payments.apply_charge(&reference, false).await.unwrap(),
        ChargeOutcome::Duplicate
    ));
    assert!(matches!(
        payments
            .apply_charge(&Uuid::new_v4().to_string(), true)
            .await
            .unwrap(),
        ChargeOutcome::UnknownReference
    ));

    let order = OrderRepository::new(&store.pool)
        .get(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(store.stock(saw.id).await, 2);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_sms_still_attempted_when_email_fails() {
    let store = Store::open().await;
    let user = store.customer(Some("+254700000002")).await;

    // SendGrid left unconfigured; Twilio credentials are fake, so the SMS
    // attempt is recorded and then fails at the provider.
    let mut config = test_config();
    config.twilio = TwilioConfig {
        account_sid: Some("ACintegration".to_owned()),
        auth_token: Some(SecretString::from("not-a-real-token")),
        phone_number: Some("+15005550006".to_owned()),
    };
    let service = NotificationService::new(store.pool.clone(), &config).unwrap();

    let message = Message::welcome(&user.full_name).unwrap();
    let err = service.send_multi_channel(&user, &message).await.unwrap_err();
    assert!(matches!(err, NotificationError::NotConfigured("SendGrid")), "{err:?}");

    let log = NotificationRepository::new(&store.pool)
        .list_for_user(user.id, 10, 0)
        .await
        .unwrap();
    assert_eq!(log.len(), 2);
    for channel in [NotificationChannel::Email, NotificationChannel::Sms] {
        let entry = log.iter().find(|n| n.channel == channel).unwrap();
        assert_eq!(entry.status, NotificationStatus::Failed);
    }
}

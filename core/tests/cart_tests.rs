// tests/cart_tests.rs
mod common;
use common::*;
use grocer::services::{cart_service, product_image_service};
use grocer::models::MAX_ITEM_QUANTITY;
use grocer::GrocerError;
use uuid::Uuid;

#[tokio::test]
async fn test_adding_same_product_twice_increments_quantity() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "cart@example.com").await;
  let apples = create_product(&pool, "Apples", 250).await;

  let first = cart_service::add_item(&pool, user.id, apples.product.id, 2).await.unwrap();
  let second = cart_service::add_item(&pool, user.id, apples.product.id, 3).await.unwrap();
  assert_eq!(first.id, second.id);
  assert_eq!(second.quantity, 5);

  let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE product_id = ?")
    .bind(apples.product.id)
    .fetch_one(&pool)
    .await
    .unwrap();
  assert_eq!(rows, 1);

  let cart = cart_service::get_cart(&pool, user.id).await.unwrap();
  assert_eq!(cart.items.len(), 1);
  assert_eq!(cart.items[0].quantity, 5);
  assert_eq!(cart.items[0].line_total_cents, 1250);
  assert_eq!(cart.subtotal_cents, 1250);
}

#[tokio::test]
async fn test_removing_missing_item_is_not_an_error() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "remove@example.com").await;

  // No cart at all yet.
  assert!(!cart_service::remove_item(&pool, user.id, Uuid::new_v4()).await.unwrap());

  let milk = create_product(&pool, "Milk", 120).await;
  cart_service::add_item(&pool, user.id, milk.product.id, 1).await.unwrap();
  assert!(!cart_service::remove_item(&pool, user.id, Uuid::new_v4()).await.unwrap());
  assert!(cart_service::remove_item(&pool, user.id, milk.product.id).await.unwrap());
  assert!(cart_service::get_cart(&pool, user.id).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn test_get_or_create_cart_is_idempotent() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "idem@example.com").await;

  let a = cart_service::get_or_create_cart(&pool, user.id).await.unwrap();
  let b = cart_service::get_or_create_cart(&pool, user.id).await.unwrap();
  assert_eq!(a.id, b.id);
}

#[tokio::test]
async fn test_quantity_must_be_positive() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "qty@example.com").await;
  let bread = create_product(&pool, "Bread", 300).await;

  let err = cart_service::add_item(&pool, user.id, bread.product.id, 0).await.unwrap_err();
  assert!(matches!(err, GrocerError::Validation(_)));

  cart_service::add_item(&pool, user.id, bread.product.id, 1).await.unwrap();
  let err = cart_service::update_item(&pool, user.id, bread.product.id, -2).await.unwrap_err();
  assert!(matches!(err, GrocerError::Validation(_)));
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "ghost@example.com").await;
  let err = cart_service::add_item(&pool, user.id, Uuid::new_v4(), 1).await.unwrap_err();
  assert!(matches!(err, GrocerError::NotFound(_)));
}

#[tokio::test]
async fn test_update_sets_quantity_and_requires_existing_row() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "update@example.com").await;
  let eggs = create_product(&pool, "Eggs", 400).await;

  let err = cart_service::update_item(&pool, user.id, eggs.product.id, 3).await.unwrap_err();
  assert!(matches!(err, GrocerError::NotFound(_)));

  cart_service::add_item(&pool, user.id, eggs.product.id, 1).await.unwrap();
  let item = cart_service::update_item(&pool, user.id, eggs.product.id, 6).await.unwrap();
  assert_eq!(item.quantity, 6);
}

#[tokio::test]
async fn test_cart_view_shows_primary_image_and_clear_empties_it() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "view@example.com").await;
  let pears = create_product(&pool, "Pears", 199).await;
  let plums = create_product(&pool, "Plums", 99).await;
  product_image_service::add_image(&pool, pears.product.id, "https://cdn.test/pears.jpg", false)
    .await
    .unwrap();

  cart_service::add_item(&pool, user.id, pears.product.id, 2).await.unwrap();
  cart_service::add_item(&pool, user.id, plums.product.id, 1).await.unwrap();

  let cart = cart_service::get_cart(&pool, user.id).await.unwrap();
  assert_eq!(cart.item_count, 3);
  assert_eq!(cart.subtotal_cents, 2 * 199 + 99);
  let pear_line = cart.items.iter().find(|l| l.product_id == pears.product.id).unwrap();
  assert_eq!(pear_line.primary_image.as_deref(), Some("https://cdn.test/pears.jpg"));

  assert_eq!(cart_service::clear_cart(&pool, user.id).await.unwrap(), 2);
  assert!(cart_service::get_cart(&pool, user.id).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn test_quantity_is_capped_per_product() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "bulk@example.com").await;
  let rice = create_product(&pool, "Rice", 1500).await;

  let err = cart_service::add_item(&pool, user.id, rice.product.id, MAX_ITEM_QUANTITY + 1)
    .await
    .unwrap_err();
  assert!(matches!(err, GrocerError::Validation(_)));

  cart_service::add_item(&pool, user.id, rice.product.id, 600).await.unwrap();
  // The increment would pass the cap, so the row is left as it was.
  let err = cart_service::add_item(&pool, user.id, rice.product.id, 600).await.unwrap_err();
  assert!(matches!(err, GrocerError::Validation(ref m) if m.contains("cannot exceed")));
  let cart = cart_service::get_cart(&pool, user.id).await.unwrap();
  assert_eq!(cart.items[0].quantity, 600);

  let err = cart_service::update_item(&pool, user.id, rice.product.id, MAX_ITEM_QUANTITY + 1)
    .await
    .unwrap_err();
  assert!(matches!(err, GrocerError::Validation(_)));
  let full = cart_service::update_item(&pool, user.id, rice.product.id, MAX_ITEM_QUANTITY)
    .await
    .unwrap();
  assert_eq!(full.quantity, MAX_ITEM_QUANTITY);
}

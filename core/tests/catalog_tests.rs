// tests/catalog_tests.rs
mod common;
use common::*;
use grocer::models::{NewVariant, NutritionFacts, MAX_PRICE_CENTS};
use grocer::services::admin_product_service::{self, NewProduct, ProductUpdate};
use grocer::services::product_service::{self, ProductQuery, ProductSort};
use grocer::services::{cart_service, order_service, product_image_service};
use grocer::models::ShippingAddress;
use grocer::GrocerError;

#[tokio::test]
async fn test_product_without_variants_gets_default_variant() {
  let pool = test_pool().await;
  let detail = create_product(&pool, "Bananas", 150).await;

  assert_eq!(detail.variants.len(), 1);
  assert_eq!(detail.variants[0].stock, 0);
  assert_eq!(detail.variants[0].size_id, None);
  assert!(!detail.product.has_size);

  // An explicit empty list behaves the same on create.
  let mut input = new_product("Kiwis", 80);
  input.variants = Some(vec![]);
  let detail = admin_product_service::create_product(&pool, input).await.unwrap();
  assert_eq!(detail.variants.len(), 1);
  assert_eq!(detail.total_stock(), 0);
}

#[tokio::test]
async fn test_create_with_sized_variants_sets_has_size() {
  let pool = test_pool().await;
  let small = size_id(&pool, "S").await;
  let large = size_id(&pool, "L").await;

  let input = NewProduct {
    name: "Watermelon".to_string(),
    price_cents: 900,
    image_url: Some("https://cdn.test/melon.jpg".to_string()),
    variants: Some(vec![sized(small, 4), sized(large, 2)]),
    nutrition: Some(NutritionFacts {
      calories: Some(30.0),
      ..Default::default()
    }),
    ..Default::default()
  };
  let detail = admin_product_service::create_product(&pool, input).await.unwrap();
  assert!(detail.product.has_size);
  assert_eq!(detail.variants.len(), 2);
  assert_eq!(detail.total_stock(), 6);
  assert_eq!(detail.images.len(), 1);
  assert!(detail.images[0].is_primary);
  assert_eq!(detail.nutrition.unwrap().calories, Some(30.0));
}

#[tokio::test]
async fn test_invalid_variant_rolls_back_whole_create() {
  let pool = test_pool().await;
  let input = NewProduct {
    name: "Cherries".to_string(),
    price_cents: 700,
    variants: Some(vec![NewVariant { size_id: None, stock: Some(3) }, sized(9999, 1)]),
    ..Default::default()
  };
  let err = admin_product_service::create_product(&pool, input).await.unwrap_err();
  assert!(matches!(err, GrocerError::Validation(_)));

  let missing_stock = NewProduct {
    name: "Cherries".to_string(),
    price_cents: 700,
    variants: Some(vec![NewVariant { size_id: None, stock: None }]),
    ..Default::default()
  };
  assert!(admin_product_service::create_product(&pool, missing_stock).await.is_err());

  let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(&pool).await.unwrap();
  assert_eq!(products, 0);
}

#[tokio::test]
async fn test_updating_variants_replaces_previous_set() {
  let pool = test_pool().await;
  let medium = size_id(&pool, "M").await;
  let detail = create_product(&pool, "Oranges", 300).await;
  let old_variant = detail.variants[0].id;

  let update = ProductUpdate {
    price_cents: Some(320),
    variants: Some(vec![sized(medium, 10)]),
    ..Default::default()
  };
  let updated = admin_product_service::update_product(&pool, detail.product.id, update).await.unwrap();
  assert_eq!(updated.product.price_cents, 320);
  assert_eq!(updated.product.name, "Oranges");
  assert_eq!(updated.variants.len(), 1);
  assert_ne!(updated.variants[0].id, old_variant);
  assert_eq!(updated.variants[0].size_name.as_deref(), Some("M"));
  assert!(updated.product.has_size);

  let back_to_unsized = ProductUpdate {
    variants: Some(vec![NewVariant { size_id: None, stock: Some(1) }]),
    ..Default::default()
  };
  let updated = admin_product_service::update_product(&pool, detail.product.id, back_to_unsized)
    .await
    .unwrap();
  assert_eq!(updated.variants.len(), 1);
  assert!(!updated.product.has_size);
}

#[tokio::test]
async fn test_update_with_empty_variants_is_rejected() {
  let pool = test_pool().await;
  let detail = create_product(&pool, "Lemons", 90).await;
  let update = ProductUpdate {
    name: Some("Renamed".to_string()),
    variants: Some(vec![]),
    ..Default::default()
  };
  let err = admin_product_service::update_product(&pool, detail.product.id, update).await.unwrap_err();
  assert!(matches!(err, GrocerError::Validation(_)));

  let unchanged = product_service::get_product(&pool, detail.product.id).await.unwrap();
  assert_eq!(unchanged.product.name, "Lemons");
  assert_eq!(unchanged.variants.len(), 1);
}

#[tokio::test]
async fn test_last_variant_cannot_be_deleted() {
  let pool = test_pool().await;
  let small = size_id(&pool, "S").await;
  let mut input = new_product("Grapes", 500);
  input.variants = Some(vec![sized(small, 3), NewVariant { size_id: None, stock: Some(1) }]);
  let detail = admin_product_service::create_product(&pool, input).await.unwrap();
  assert!(detail.product.has_size);

  let sized_variant = detail.variants.iter().find(|v| v.size_id.is_some()).unwrap().id;
  let plain_variant = detail.variants.iter().find(|v| v.size_id.is_none()).unwrap().id;

  admin_product_service::delete_variant(&pool, sized_variant).await.unwrap();
  let after = product_service::get_product(&pool, detail.product.id).await.unwrap();
  assert!(!after.product.has_size);

  let err = admin_product_service::delete_variant(&pool, plain_variant).await.unwrap_err();
  assert!(matches!(err, GrocerError::Conflict(_)));
}

#[tokio::test]
async fn test_set_variant_stock() {
  let pool = test_pool().await;
  let detail = create_product(&pool, "Yoghurt", 220).await;
  let variant = admin_product_service::set_variant_stock(&pool, detail.variants[0].id, 42).await.unwrap();
  assert_eq!(variant.stock, 42);
  assert!(admin_product_service::set_variant_stock(&pool, detail.variants[0].id, -1).await.is_err());
}

#[tokio::test]
async fn test_delete_product_removes_dependents_unless_ordered() {
  let pool = test_pool().await;
  let user = create_customer(&pool, "del@example.com").await;
  let cheese = create_product(&pool, "Cheese", 1100).await;
  let butter = create_product(&pool, "Butter", 600).await;
  product_image_service::add_image(&pool, cheese.product.id, "https://cdn.test/cheese.jpg", true)
    .await
    .unwrap();
  cart_service::add_item(&pool, user.id, cheese.product.id, 1).await.unwrap();

  admin_product_service::delete_product(&pool, cheese.product.id).await.unwrap();
  let err = product_service::get_product(&pool, cheese.product.id).await.unwrap_err();
  assert!(matches!(err, GrocerError::NotFound(_)));
  assert!(cart_service::get_cart(&pool, user.id).await.unwrap().items.is_empty());

  cart_service::add_item(&pool, user.id, butter.product.id, 1).await.unwrap();
  let address = ShippingAddress {
    full_name: "Del".to_string(),
    phone: "0900".to_string(),
    address_line: "1 Dairy Rd".to_string(),
    city: "Hue".to_string(),
    note: None,
  };
  order_service::place_order(&pool, &test_config(), user.id, address).await.unwrap();
  let err = admin_product_service::delete_product(&pool, butter.product.id).await.unwrap_err();
  assert!(matches!(err, GrocerError::Conflict(_)));
}

#[tokio::test]
async fn test_image_primary_flag_moves_between_images() {
  let pool = test_pool().await;
  let detail = create_product(&pool, "Mango", 350).await;
  let id = detail.product.id;

  let first = product_image_service::add_image(&pool, id, "https://cdn.test/m1.jpg", false).await.unwrap();
  assert!(first.is_primary);
  let second = product_image_service::add_image(&pool, id, "https://cdn.test/m2.jpg", true).await.unwrap();
  assert!(second.is_primary);

  let images = product_image_service::list_images(&pool, id).await.unwrap();
  assert_eq!(images.iter().filter(|i| i.is_primary).count(), 1);
  assert_eq!(images[0].id, second.id);

  product_image_service::set_primary(&pool, first.id).await.unwrap();
  assert!(product_image_service::delete_image(&pool, first.id).await.unwrap());
  let images = product_image_service::list_images(&pool, id).await.unwrap();
  assert_eq!(images.len(), 1);
  assert!(images[0].is_primary);

  assert!(!product_image_service::delete_image(&pool, first.id).await.unwrap());
}

#[tokio::test]
async fn test_listing_filters_sorts_and_pages() {
  let pool = test_pool().await;
  let dairy: i64 = sqlx::query_scalar("SELECT id FROM product_types WHERE name = 'dairy'")
    .fetch_one(&pool)
    .await
    .unwrap();
  for (name, price) in [("Whole Milk", 150), ("Skim Milk", 140), ("Cream", 300)] {
    let mut input = new_product(name, price);
    input.product_type_id = Some(dairy);
    admin_product_service::create_product(&pool, input).await.unwrap();
  }
  create_product(&pool, "Carrots", 60).await;

  let query = ProductQuery {
    product_type_id: Some(dairy),
    sort: Some(ProductSort::PriceAsc),
    ..Default::default()
  };
  let page = product_service::list_products(&pool, &query).await.unwrap();
  assert_eq!(page.total, 3);
  let names: Vec<_> = page.items.iter().map(|s| s.product.name.as_str()).collect();
  assert_eq!(names, ["Skim Milk", "Whole Milk", "Cream"]);
  assert_eq!(page.items[0].type_name.as_deref(), Some("dairy"));

  let query = ProductQuery {
    search: Some("milk".to_string()),
    max_price_cents: Some(145),
    ..Default::default()
  };
  let page = product_service::list_products(&pool, &query).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].product.name, "Skim Milk");

  let query = ProductQuery {
    sort: Some(ProductSort::Name),
    page: Some(2),
    limit: Some(3),
    ..Default::default()
  };
  let page = product_service::list_products(&pool, &query).await.unwrap();
  assert_eq!(page.total, 4);
  assert_eq!(page.total_pages, 2);
  assert_eq!(page.items.len(), 1);
  assert_eq!(page.items[0].product.name, "Whole Milk");

  let bad = ProductQuery {
    min_price_cents: Some(500),
    max_price_cents: Some(100),
    ..Default::default()
  };
  assert!(product_service::list_products(&pool, &bad).await.is_err());
}

#[tokio::test]
async fn test_lookups_can_be_extended() {
  let pool = test_pool().await;
  let before = product_service::list_sizes(&pool).await.unwrap().len();
  let size = admin_product_service::create_size(&pool, "2kg").await.unwrap();
  assert_eq!(size.name, "2kg");
  assert_eq!(product_service::list_sizes(&pool).await.unwrap().len(), before + 1);

  let err = admin_product_service::create_size(&pool, "2kg").await.unwrap_err();
  assert!(matches!(err, GrocerError::Conflict(_)));

  let snacks = admin_product_service::create_product_type(&pool, "snacks").await.unwrap();
  let types = product_service::list_product_types(&pool).await.unwrap();
  assert!(types.contains(&snacks));
}

#[tokio::test]
async fn test_price_above_cap_is_rejected() {
  let pool = test_pool().await;

  let err = admin_product_service::create_product(&pool, new_product("Gold Leaf", MAX_PRICE_CENTS + 1))
    .await
    .unwrap_err();
  assert!(matches!(err, GrocerError::Validation(ref m) if m.contains("Price")));

  let detail = create_product(&pool, "Saffron", MAX_PRICE_CENTS).await;
  let update = ProductUpdate {
    price_cents: Some(i64::MAX),
    ..Default::default()
  };
  let err = admin_product_service::update_product(&pool, detail.product.id, update)
    .await
    .unwrap_err();
  assert!(matches!(err, GrocerError::Validation(_)));
}

#[tokio::test]
async fn test_update_can_clear_optional_fields() {
  let pool = test_pool().await;
  let dairy: i64 = sqlx::query_scalar("SELECT id FROM product_types WHERE name = 'dairy'")
    .fetch_one(&pool)
    .await
    .unwrap();
  let mut input = new_product("Butter", 400);
  input.description = Some("Salted".to_string());
  input.product_type_id = Some(dairy);
  let detail = admin_product_service::create_product(&pool, input).await.unwrap();

  // Fields left out are kept.
  let rename = ProductUpdate {
    name: Some("Salted Butter".to_string()),
    ..Default::default()
  };
  let updated = admin_product_service::update_product(&pool, detail.product.id, rename).await.unwrap();
  assert_eq!(updated.product.description.as_deref(), Some("Salted"));
  assert_eq!(updated.product.product_type_id, Some(dairy));

  let clear: ProductUpdate =
    serde_json::from_value(serde_json::json!({ "description": null, "productTypeId": null })).unwrap();
  let cleared = admin_product_service::update_product(&pool, detail.product.id, clear).await.unwrap();
  assert_eq!(cleared.product.description, None);
  assert_eq!(cleared.product.product_type_id, None);
  assert_eq!(cleared.product.name, "Salted Butter");
}

// grocer_server/src/web/routes.rs

use actix_web::{error, web, HttpRequest, HttpResponse};
use grocer::db;
use serde_json::json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::{
  admin_handlers, auth_handlers, cart_handlers, order_handlers, product_handlers, review_handlers, user_handlers,
};
use crate::web::response;

async fn health_check_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  db::ping(&app_state.db_pool).await?;
  Ok(response::ok("Service is healthy.", json!({ "status": "ok", "database": "ok" })))
}

// Malformed bodies, paths and query strings get the same envelope as
// validation failures.
fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::bad_request(format!("Invalid request body: {}", err)).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
  AppError::bad_request(format!("Invalid path parameter: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::bad_request(format!("Invalid query string: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .app_data(web::JsonConfig::default().error_handler(json_error))
      .app_data(web::PathConfig::default().error_handler(path_error))
      .app_data(web::QueryConfig::default().error_handler(query_error))
      .route("/health", web::get().to(health_check_handler))
      // Authentication Routes
      .service(
        web::scope("/auth")
          .route("/register", web::post().to(auth_handlers::register_handler))
          .route("/login", web::post().to(auth_handlers::login_handler))
          .route(
            "/password-reset/request",
            web::post().to(auth_handlers::request_reset_handler),
          )
          .route(
            "/password-reset/verify",
            web::post().to(auth_handlers::verify_code_handler),
          )
          .route(
            "/password-reset/confirm",
            web::post().to(auth_handlers::confirm_reset_handler),
          ),
      )
      // Profile Routes
      .service(
        web::scope("/users/me")
          .route("", web::get().to(user_handlers::get_me_handler))
          .route("", web::put().to(user_handlers::update_me_handler))
          .route("/password", web::put().to(user_handlers::change_password_handler)),
      )
      // Catalog Routes
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route(
            "/{product_id}/reviews",
            web::get().to(review_handlers::list_reviews_handler),
          )
          .route(
            "/{product_id}/reviews",
            web::post().to(review_handlers::create_review_handler),
          ),
      )
      .route("/product-types", web::get().to(product_handlers::list_product_types_handler))
      .route("/sizes", web::get().to(product_handlers::list_sizes_handler))
      .service(
        web::scope("/reviews")
          .route("/{review_id}", web::put().to(review_handlers::update_review_handler))
          .route("/{review_id}", web::delete().to(review_handlers::delete_review_handler)),
      )
      // Cart Routes
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route(
            "/items/{product_id}",
            web::put().to(cart_handlers::update_cart_item_handler),
          )
          .route(
            "/items/{product_id}",
            web::delete().to(cart_handlers::remove_cart_item_handler),
          ),
      )
      // Order Routes
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler)),
      )
      // Admin Routes
      .service(
        web::scope("/admin")
          .route("/products", web::post().to(admin_handlers::create_product_handler))
          .route("/products/{product_id}", web::put().to(admin_handlers::update_product_handler))
          .route(
            "/products/{product_id}",
            web::delete().to(admin_handlers::delete_product_handler),
          )
          .route(
            "/products/{product_id}/images",
            web::post().to(admin_handlers::add_image_handler),
          )
          .route("/images/{image_id}", web::delete().to(admin_handlers::delete_image_handler))
          .route(
            "/images/{image_id}/primary",
            web::post().to(admin_handlers::set_primary_image_handler),
          )
          .route(
            "/variants/{variant_id}",
            web::put().to(admin_handlers::set_variant_stock_handler),
          )
          .route(
            "/variants/{variant_id}",
            web::delete().to(admin_handlers::delete_variant_handler),
          )
          .route(
            "/product-types",
            web::post().to(admin_handlers::create_product_type_handler),
          )
          .route("/sizes", web::post().to(admin_handlers::create_size_handler))
          .route("/orders", web::get().to(admin_handlers::list_orders_handler))
          .route(
            "/orders/{order_id}/status",
            web::put().to(admin_handlers::update_order_status_handler),
          )
          .route("/users", web::get().to(admin_handlers::list_users_handler))
          .route("/users/{user_id}/role", web::put().to(admin_handlers::set_role_handler))
          .route("/users/{user_id}", web::delete().to(admin_handlers::delete_user_handler)),
      ),
  );
}

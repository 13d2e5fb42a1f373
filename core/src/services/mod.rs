// grocer/src/services/mod.rs

//! One module per entity group. Every function takes the pool (or an open
//! transaction) explicitly and returns `crate::Result`.

pub mod admin_product_service;
pub mod auth_service;
pub mod cart_service;
pub mod mailer;
pub mod order_service;
pub mod password_reset;
pub mod product_image_service;
pub mod product_service;
pub mod review_service;
pub mod user_service;

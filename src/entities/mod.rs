//! sea-orm entities for the catalog, orders and reviews.

pub mod category;
pub mod color;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_color;
pub mod product_image;
pub mod product_size;
pub mod review;
pub mod size;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FurnishFlow API",
        version = "1.0.0",
        description = r#"
# FurnishFlow Storefront API

Catalog, cart pricing, checkout and moderation endpoints for the FurnishFlow
furniture storefront.

## Money

Prices and totals are JSON numbers rounded to cents for display. Tax is 7% of
the subtotal; shipping is free from a 1000 subtotal, otherwise 49.99.

## Error Handling

Failures share one body shape:

```json
{
  "error": "Not Found",
  "message": "Not found: Product 42 not found",
  "request_id": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Catalog and product administration"),
        (name = "Categories", description = "Category administration"),
        (name = "Cart", description = "Cart pricing and the server-side cart session"),
        (name = "Orders", description = "Checkout and order administration"),
        (name = "Reviews", description = "Product reviews and moderation"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::search_products,
        crate::handlers::products::get_product,
        crate::handlers::products::list_category_products,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        // Cart
        crate::handlers::cart::price_cart,
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_cart_item,
        crate::handlers::cart::update_cart_item,
        crate::handlers::cart::remove_cart_item,
        crate::handlers::cart::clear_cart,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::checkout,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,

        // Reviews
        crate::handlers::reviews::list_reviews,
        crate::handlers::reviews::list_product_reviews,
        crate::handlers::reviews::submit_review,
        crate::handlers::reviews::update_review_status,
        crate::handlers::reviews::delete_review,

        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::liveness_check,
        crate::handlers::health::readiness_check,
    ),
    components(
        schemas(
            // Catalog types
            crate::catalog::ProductView,
            crate::catalog::ColorOption,
            crate::catalog::SizeOption,
            crate::catalog::CatalogQuery,
            crate::catalog::SortOption,
            crate::services::products::ProductInput,
            crate::services::products::ColorInput,
            crate::services::products::SizeInput,
            crate::handlers::common::MutationResponse,

            // Category types
            crate::services::categories::CategoryInput,
            crate::services::categories::CategoryView,

            // Cart types
            crate::handlers::cart::CartView,
            crate::handlers::cart::CartLineView,
            crate::handlers::cart::PriceCartRequest,
            crate::handlers::cart::UpdateQuantityRequest,

            // Order types
            crate::services::orders::CheckoutInput,
            crate::services::orders::CheckoutLine,
            crate::services::orders::OrderView,
            crate::services::orders::OrderItemView,
            crate::entities::order::OrderStatus,
            crate::entities::order::ShippingMethod,
            crate::handlers::orders::UpdateOrderStatusRequest,

            // Review types
            crate::services::reviews::ReviewInput,
            crate::services::reviews::ReviewView,
            crate::entities::review::ReviewStatus,
            crate::handlers::reviews::UpdateReviewStatusRequest,

            // Health and error types
            crate::handlers::health::HealthResponse,
            crate::handlers::health::ComponentHealth,
            crate::handlers::health::ComponentStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

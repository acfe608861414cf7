mod common;

use axum::http::{Method, StatusCode, header};
use serde_json::json;

use avtools::infra::http::RequestContext;
use avtools::domain::fields::FieldValue;
use common::{
    APPROVED_FIELD, body_json, body_text, ids, record, router, seeded_store, send, send_form, text,
};

#[tokio::test]
async fn health_is_no_content_and_tagged_with_request_id() {
    let app = router(&seeded_store());
    let response = send(&app, Method::GET, "/_health", None).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let ctx = response
        .extensions()
        .get::<RequestContext>()
        .expect("request context attached");
    assert_eq!(ctx.request_id.len(), 36);
}

#[tokio::test]
async fn api_products_lists_normalized_products() {
    let app = router(&seeded_store());
    let response = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let products = body.as_array().expect("array");
    assert_eq!(products.len(), 3);
    let sky = products
        .iter()
        .find(|p| p["id"] == json!("recProdSky000001"))
        .expect("sky");
    assert_eq!(sky["avgRating"], json!(4.6));
    assert_eq!(sky["reviewCount"], json!(2));
    assert_eq!(sky["categories"], json!(["Scheduling"]));
    assert!(sky.get("logoUrl").is_none());
}

#[tokio::test]
async fn api_products_is_an_empty_array_when_store_is_down() {
    let store = seeded_store();
    store.make_unavailable("Products");
    let app = router(&store);

    let response = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn api_products_debug_flag_returns_diagnostics() {
    let app = router(&seeded_store());
    let body = body_json(send(&app, Method::GET, "/api/products?debug=1", None).await).await;

    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["counts"]["products"], json!(3));
}

#[tokio::test]
async fn api_product_lookup_returns_product_or_not_found_marker() {
    let app = router(&seeded_store());

    let found = body_json(send(&app, Method::GET, "/api/products/sky-and-sea-air", None).await).await;
    assert_eq!(found["name"], json!("Sky & Sea / Air"));

    let response = send(&app, Method::GET, "/api/products/not-a-tool", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "notFound": true }));
}

#[tokio::test]
async fn api_reviews_approved_feed_is_newest_first_without_moderation_fields() {
    let app = router(&seeded_store());
    let body = body_json(send(&app, Method::GET, "/api/reviews?approved=true", None).await).await;

    let reviews = body.as_array().expect("array");
    let dates: Vec<&str> = reviews.iter().filter_map(|r| r["date"].as_str()).collect();
    assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
    assert!(reviews.iter().all(|r| r.get("moderation").is_none()));
    assert_eq!(reviews[0]["fleetSize"], json!("Large"));
}

#[tokio::test]
async fn api_reviews_filters_by_product() {
    let app = router(&seeded_store());

    let body = body_json(
        send(
            &app,
            Method::GET,
            "/api/reviews?productId=recProdQuo000001",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let body = body_json(
        send(
            &app,
            Method::GET,
            "/api/reviews/by-product/recProdSky000001",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn api_create_review_returns_id() {
    let store = seeded_store();
    let app = router(&store);

    let response = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(json!({ "productId": "recProdSky000001", "rating": 5, "approved": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
    assert!(body["id"].as_str().is_some_and(|id| id.starts_with("rec")));
    assert_eq!(store.created().len(), 1);
}

#[tokio::test]
async fn api_create_review_rejects_bad_rating_with_field_list() {
    let store = seeded_store();
    let app = router(&store);

    let response = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(json!({ "productId": "recProdSky000001", "rating": 9 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error"]["code"], json!("validation_failed"));
    assert_eq!(body["error"]["fields"][0]["field"], json!("rating"));
    assert!(store.created().is_empty());
}

#[tokio::test]
async fn api_create_review_rejects_malformed_json() {
    let app = router(&seeded_store());
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/reviews")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("request should build");

    let response = tower::ServiceExt::oneshot(app, request)
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], json!("bad_request"));
}

#[tokio::test]
async fn api_create_review_surfaces_schema_binding_failure() {
    let store = seeded_store();
    for column in ["Product", "Products", "Product Id"] {
        store.reject_column(column);
    }
    let app = router(&store);

    let response = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(json!({ "productId": "recProdSky000001", "rating": 4 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("store_error"));
    assert_eq!(body["error"]["message"], json!("Failed to create review"));
    assert!(
        body["error"]["hint"]
            .as_str()
            .is_some_and(|hint| hint.contains("Product Id"))
    );
}

#[tokio::test]
async fn api_create_lead_validates_email() {
    let store = seeded_store();
    let app = router(&store);

    let response = send(
        &app,
        Method::POST,
        "/api/leads",
        Some(json!({ "name": "Casey", "email": "not-an-email" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["fields"][0]["field"], json!("email"));
    assert!(store.created().is_empty());

    let response = send(
        &app,
        Method::POST,
        "/api/leads",
        Some(json!({ "name": "Casey", "email": "casey@charter.example", "productId": "recProdSky000001" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true }));
}

#[tokio::test]
async fn api_create_lead_hides_store_failure_detail() {
    let store = seeded_store();
    store.make_unavailable("Leads");
    let app = router(&store);

    let response = send(
        &app,
        Method::POST,
        "/api/leads",
        Some(json!({ "name": "Casey", "email": "casey@charter.example" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], json!("Failed to create lead"));
    assert!(!body.to_string().contains("connection refused"));
}

#[tokio::test]
async fn unknown_api_route_is_json_not_found() {
    let app = router(&seeded_store());
    let response = send(&app, Method::GET, "/api/widgets", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn landing_page_lists_vendors() {
    let app = router(&seeded_store());
    let response = send(&app, Method::GET, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("AvTools"));
    assert!(html.contains("Horizon Labs"));
    assert!(html.contains("Jetline"));
}

#[tokio::test]
async fn catalog_page_applies_rating_floor() {
    let app = router(&seeded_store());

    let html = body_text(send(&app, Method::GET, "/products?min_rating=4.5", None).await).await;
    assert!(html.contains("Legacy Planner"));
    assert!(!html.contains("QuoteJet"));

    let html = body_text(send(&app, Method::GET, "/products?min_rating=lots", None).await).await;
    assert!(html.contains("QuoteJet"));
}

#[tokio::test]
async fn detail_page_shows_only_approved_reviews() {
    let app = router(&seeded_store());
    let response = send(&app, Method::GET, "/products/sky-and-sea-air", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Mar 1, 2024"));
    assert!(html.contains("Jan 1, 2024"));
    assert!(!html.contains("Apr 1, 2024"));
}

#[tokio::test]
async fn detail_page_reads_reviews_through_the_fallback_link_column() {
    let store = seeded_store();
    store.reject_column("Product");
    let app = router(&store);

    let response = send_form(&app, "/products/quotejet/reviews", "rating=4&pros=Quick").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let (_, fields) = store.created().pop().expect("review written");
    assert!(fields.contains_key("Products"));

    store.insert(
        "Reviews",
        record(
            "recRevPlural0001",
            &[
                ("Products", ids(&["recProdQuo000001"])),
                ("Star Rating", FieldValue::Number(4.0)),
                ("Date", text("2024-05-01")),
                (APPROVED_FIELD, FieldValue::Bool(true)),
            ],
        ),
    );

    let html = body_text(send(&app, Method::GET, "/products/quotejet", None).await).await;
    assert!(html.contains("May 1, 2024"));
    assert!(html.contains("Feb 1, 2024"));

    let body = body_json(
        send(
            &app,
            Method::GET,
            "/api/reviews/by-product/recProdQuo000001",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn detail_page_drops_non_http_website_links() {
    let store = seeded_store();
    store.insert(
        "Products",
        record(
            "recProdBad000001",
            &[
                ("Product Name", text("Shady Ops")),
                ("Vendor Name", text("Nowhere")),
                ("Website URL", text("javascript:alert(1)")),
            ],
        ),
    );
    store.insert(
        "Products",
        record(
            "recProdGood00001",
            &[
                ("Product Name", text("Clear Ops")),
                ("Website URL", text("https://clearops.example")),
            ],
        ),
    );
    let app = router(&store);

    let html = body_text(send(&app, Method::GET, "/products/recProdBad000001", None).await).await;
    assert!(html.contains("Shady Ops"));
    assert!(!html.contains("javascript:"));
    assert!(!html.contains("Visit website"));

    let html = body_text(send(&app, Method::GET, "/products/recProdGood00001", None).await).await;
    assert!(html.contains("Visit website"));
    assert!(html.contains("clearops.example"));
}

#[tokio::test]
async fn detail_page_for_unknown_product_is_a_neutral_empty_state() {
    let app = router(&seeded_store());
    let response = send(&app, Method::GET, "/products/retired-tool", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Product not found"));
}

#[tokio::test]
async fn detail_page_renders_notice() {
    let app = router(&seeded_store());
    let html = body_text(
        send(
            &app,
            Method::GET,
            "/products/recProdSky000001?notice=review",
            None,
        )
        .await,
    )
    .await;

    assert!(html.contains("will appear once it has been approved"));
}

#[tokio::test]
async fn review_form_redirects_back_with_notice() {
    let store = seeded_store();
    let app = router(&store);

    let response = send_form(
        &app,
        "/products/sky-and-sea-air/reviews",
        "rating=5&pros=Solid&would_recommend=on&role=DOM&fleet_size=Medium",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/products/recProdSky000001?notice=review")
    );

    let (_, fields) = store.created().pop().expect("review written");
    assert_eq!(
        fields.get("Would Recommend"),
        Some(&FieldValue::Bool(true))
    );
    assert_eq!(
        fields.get("Anonymous?"),
        Some(&FieldValue::Bool(false))
    );
}

#[tokio::test]
async fn review_form_with_invalid_rating_rerenders_with_message() {
    let store = seeded_store();
    let app = router(&store);

    let response = send_form(&app, "/products/sky-and-sea-air/reviews", "rating=9&pros=Solid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_text(response).await;
    assert!(html.contains("Rating must be a whole number from 1 to 5"));
    assert!(html.contains("Solid"));
    assert!(store.created().is_empty());
}

#[tokio::test]
async fn lead_form_with_invalid_email_rerenders_with_message() {
    let store = seeded_store();
    let app = router(&store);

    let response = send_form(
        &app,
        "/products/sky-and-sea-air/leads",
        "name=Casey&email=casey",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Email must be a valid email address"));
    assert!(store.created().is_empty());
}

#[tokio::test]
async fn unknown_page_is_not_found() {
    let app = router(&seeded_store());
    let response = send(&app, Method::GET, "/definitely/not/here", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use std::time::Instant;

/// Path label for requests that hit no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = route_label(&req);

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status().as_u16().to_string();

    let labels = [("method", method), ("path", path), ("status", status)];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    response
}

/// The route template (`/inventory/:id`), never the concrete request path,
/// so the label set stays bounded by the router.
fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    async fn label_for(uri: &str) -> String {
        let app = Router::new()
            .route(
                "/items/:id",
                get(|req: Request| async move { route_label(&req) }),
            )
            .fallback(|req: Request| async move { (StatusCode::NOT_FOUND, route_label(&req)) })
            .layer(from_fn(metrics_middleware));

        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn concrete_ids_share_the_route_template() {
        assert_eq!(label_for("/items/1").await, "/items/:id");
        assert_eq!(label_for("/items/2").await, "/items/:id");
    }

    #[tokio::test]
    async fn unknown_paths_collapse_to_one_label() {
        assert_eq!(label_for("/no/such/route/1").await, UNMATCHED_ROUTE);
        assert_eq!(label_for("/no/such/route/2").await, UNMATCHED_ROUTE);
    }
}

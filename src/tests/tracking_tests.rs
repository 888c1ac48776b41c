//! tests/tracking_tests.rs
//! Store de tracking y endpoints HTTP de apertura/click.

#[cfg(test)]
mod tests {
    use actix_rt::test;
    use actix_web::{http::header, http::StatusCode, test as web_test, web, App};
    use futures_util::future::join_all;
    use serde_json::Value;

    use crate::app;
    use crate::config::app_config::AppConfig;
    use crate::services::database;
    use crate::services::template_service::TemplateService;
    use crate::services::tracking_service::TrackingService;
    use crate::tests::support::tracking_service;

    #[test]
    async fn test_second_open_for_same_id_is_ignored() {
        let tracking = tracking_service().await;

        assert!(tracking.record_open("m-1", Some("1.2.3.4")).await.unwrap());
        assert!(!tracking.record_open("m-1", Some("5.6.7.8")).await.unwrap());

        let summary = tracking.summary().await.unwrap();
        assert_eq!(summary.opens, 1);
        assert_eq!(summary.clicks, 0);

        // la primera observación gana
        let doc = tracking.document().await.unwrap();
        assert_eq!(doc.opens["m-1"].ip.as_deref(), Some("1.2.3.4"));
    }

    #[test]
    async fn test_concurrent_opens_store_exactly_one() {
        let tracking = tracking_service().await;

        let results = join_all((0..10).map(|_| tracking.record_open("m-2", None))).await;
        let stored = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();

        assert_eq!(stored, 1);
        assert_eq!(tracking.summary().await.unwrap().opens, 1);
    }

    #[test]
    async fn test_clicks_keep_target_url() {
        let tracking = tracking_service().await;

        assert!(tracking
            .record_click("m-3", None, Some("https://shop.io"))
            .await
            .unwrap());
        assert!(!tracking
            .record_click("m-3", None, Some("https://other.io"))
            .await
            .unwrap());
        tracking.record_click("m-4", None, None).await.unwrap();

        let doc = tracking.document().await.unwrap();
        assert_eq!(doc.clicks.len(), 2);
        assert_eq!(doc.clicks["m-3"].url.as_deref(), Some("https://shop.io"));
        assert_eq!(doc.clicks["m-4"].url, None);
    }

    macro_rules! test_app {
        ($tracking:expr) => {{
            let pool = database::memory_pool().await.unwrap();
            web_test::init_service(
                App::new()
                    .app_data(web::Data::new(AppConfig::default()))
                    .app_data(web::Data::new($tracking.clone()))
                    .app_data(web::Data::new(TemplateService::new(pool)))
                    .configure(app::init_app),
            )
            .await
        }};
    }

    #[test]
    async fn test_open_endpoint_serves_pixel_and_counts_once() {
        let tracking: TrackingService = tracking_service().await;
        let service = test_app!(tracking);

        for _ in 0..2 {
            let req = web_test::TestRequest::get()
                .uri("/track/open/m-5")
                .to_request();
            let resp = web_test::call_service(&service, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                resp.headers().get(header::CONTENT_TYPE).unwrap(),
                "image/gif"
            );
            let body = web_test::read_body(resp).await;
            assert!(body.starts_with(b"GIF89a"));
        }

        let req = web_test::TestRequest::get().uri("/api/tracking").to_request();
        let json: Value = web_test::call_and_read_body_json(&service, req).await;
        assert_eq!(json["opens"], 1);
        assert_eq!(json["clicks"], 0);
    }

    #[test]
    async fn test_click_endpoint_redirects_to_decoded_target() {
        let tracking: TrackingService = tracking_service().await;
        let service = test_app!(tracking);

        let req = web_test::TestRequest::get()
            .uri("/track/click/m-6?url=https%3A%2F%2Fshop.io%2Fp%3Fa%3D1")
            .to_request();
        let resp = web_test::call_service(&service, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "https://shop.io/p?a=1"
        );
        let doc = tracking.document().await.unwrap();
        assert_eq!(doc.clicks["m-6"].url.as_deref(), Some("https://shop.io/p?a=1"));
    }

    #[test]
    async fn test_click_without_url_uses_fallback() {
        let tracking: TrackingService = tracking_service().await;
        let service = test_app!(tracking);

        for uri in ["/track/click/m-7", "/track/click/m-8?url=javascript%3Aalert(1)"] {
            let req = web_test::TestRequest::get().uri(uri).to_request();
            let resp = web_test::call_service(&service, req).await;
            assert_eq!(resp.status(), StatusCode::FOUND);
            assert_eq!(
                resp.headers().get(header::LOCATION).unwrap(),
                "https://google.com"
            );
        }
        assert_eq!(tracking.summary().await.unwrap().clicks, 2);
    }
}

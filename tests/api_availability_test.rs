//! Integration tests for the availability API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{
        LAST_MONDAY, MONDAY, SUNDAY, body_to_json, client, create_employee, create_merchant,
        create_service, request, test_app,
    };

    async fn book(app: &axum::Router, merchant_id: &str, service_id: &str, time: &str) {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/appointments",
                &client("client-1"),
                Some(serde_json::json!({
                    "merchant_id": merchant_id,
                    "service_id": service_id,
                    "date": MONDAY,
                    "time": time,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    /// Tests a free Monday lists every half hour from opening to close
    #[tokio::test]
    #[serial]
    async fn it_lists_all_slots_on_an_empty_day() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;

        let response = app
            .oneshot(request(
                "GET",
                &format!(
                    "/api/availability?merchant_id={}&date={}&duration=30",
                    merchant_id, MONDAY
                ),
                &[],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_json(response.into_body()).await;
        let slots = body["slots"].as_array().unwrap();
        assert_eq!(body["date"], MONDAY);
        assert_eq!(slots.len(), 18);
        assert_eq!(slots[0], "09:00");
        assert_eq!(slots[17], "17:30");
    }

    /// Tests a booking at opening removes only that slot
    #[tokio::test]
    #[serial]
    async fn it_excludes_booked_slots() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;
        let service_id = create_service(&app, &merchant_id, 30).await;
        book(&app, &merchant_id, &service_id, "09:00").await;

        let response = app
            .oneshot(request(
                "GET",
                &format!(
                    "/api/availability?merchant_id={}&date={}&service_id={}",
                    merchant_id, MONDAY, service_id
                ),
                &[],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_json(response.into_body()).await;
        let slots = body["slots"].as_array().unwrap();
        assert_eq!(slots.len(), 17);
        assert_eq!(slots[0], "09:30");
    }

    /// Tests closed and past days have no slots
    #[tokio::test]
    #[serial]
    async fn it_returns_no_slots_for_closed_or_past_days() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;

        for date in [SUNDAY, LAST_MONDAY] {
            let response = app
                .clone()
                .oneshot(request(
                    "GET",
                    &format!(
                        "/api/availability?merchant_id={}&date={}&duration=30",
                        merchant_id, date
                    ),
                    &[],
                    None,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_to_json(response.into_body()).await;
            assert!(body["slots"].as_array().unwrap().is_empty());
        }
    }

    /// Tests the single slot check across a booking and the next slot
    #[tokio::test]
    #[serial]
    async fn it_checks_a_single_slot() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;
        let service_id = create_service(&app, &merchant_id, 90).await;
        book(&app, &merchant_id, &service_id, "10:00").await;

        for (time, expected) in [("10:00", false), ("10:30", true), ("09:00", true)] {
            let response = app
                .clone()
                .oneshot(request(
                    "GET",
                    &format!(
                        "/api/availability/check?merchant_id={}&date={}&time={}&duration=30",
                        merchant_id, MONDAY, time
                    ),
                    &[],
                    None,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_to_json(response.into_body()).await;
            assert_eq!(body["available"], expected, "slot {}", time);
        }
    }

    /// Tests an employee day off blocks the check and empties the list
    #[tokio::test]
    #[serial]
    async fn it_is_unavailable_on_an_employee_day_off() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;
        let employee_id = create_employee(&app, &merchant_id, None).await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/employees/{}/days-off", employee_id),
                &crate::test_utils::merchant(&merchant_id),
                Some(serde_json::json!({ "date": MONDAY })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                &format!(
                    "/api/availability/check?merchant_id={}&employee_id={}&date={}&time=10:00&duration=30",
                    merchant_id, employee_id, MONDAY
                ),
                &[],
                None,
            ))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["available"], false);

        let response = app
            .oneshot(request(
                "GET",
                &format!(
                    "/api/availability?merchant_id={}&employee_id={}&date={}&duration=30",
                    merchant_id, employee_id, MONDAY
                ),
                &[],
                None,
            ))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert!(body["slots"].as_array().unwrap().is_empty());
    }

    /// Tests an employee's own hours replace the merchant's
    #[tokio::test]
    #[serial]
    async fn it_uses_the_employee_schedule() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;
        let employee_id = create_employee(
            &app,
            &merchant_id,
            Some(serde_json::json!({
                "work_days": [1],
                "start_time": "13:00",
                "end_time": "15:00",
            })),
        )
        .await;

        let response = app
            .oneshot(request(
                "GET",
                &format!(
                    "/api/availability?merchant_id={}&employee_id={}&date={}&duration=30",
                    merchant_id, employee_id, MONDAY
                ),
                &[],
                None,
            ))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert_eq!(
            body["slots"],
            serde_json::json!(["13:00", "13:30", "14:00", "14:30"])
        );
    }

    /// Tests an oversized duration is refused and the service keeps working
    #[tokio::test]
    #[serial]
    async fn it_rejects_oversized_durations() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;

        for uri in [
            format!(
                "/api/availability?merchant_id={}&date={}&duration={}",
                merchant_id,
                MONDAY,
                u32::MAX
            ),
            format!(
                "/api/availability/check?merchant_id={}&date={}&time=10:00&duration={}",
                merchant_id,
                MONDAY,
                24 * 60 + 1
            ),
        ] {
            let response = app
                .clone()
                .oneshot(request("GET", &uri, &[], None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }

        let response = app
            .oneshot(request(
                "GET",
                &format!(
                    "/api/availability?merchant_id={}&date={}&duration=30",
                    merchant_id, MONDAY
                ),
                &[],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["slots"].as_array().unwrap().len(), 18);
    }

    /// Tests bad input is rejected before reaching the calculator
    #[tokio::test]
    #[serial]
    async fn it_rejects_bad_queries() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;

        let cases = [
            (
                format!("/api/availability?merchant_id={}&date=19-10-2026&duration=30", merchant_id),
                StatusCode::BAD_REQUEST,
            ),
            (
                format!("/api/availability?merchant_id={}&date={}", merchant_id, MONDAY),
                StatusCode::BAD_REQUEST,
            ),
            (
                format!("/api/availability?merchant_id={}&date={}&duration=0", merchant_id, MONDAY),
                StatusCode::BAD_REQUEST,
            ),
            (
                format!("/api/availability?merchant_id=nope&date={}&duration=30", MONDAY),
                StatusCode::NOT_FOUND,
            ),
            (
                format!(
                    "/api/availability/check?merchant_id={}&date={}&time=25:00&duration=30",
                    merchant_id, MONDAY
                ),
                StatusCode::BAD_REQUEST,
            ),
            (
                "/api/availability?date=2026-10-19&duration=30".to_string(),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (uri, status) in cases {
            let response = app
                .clone()
                .oneshot(request("GET", &uri, &[], None))
                .await
                .unwrap();
            assert_eq!(response.status(), status, "{}", uri);
        }
    }
}

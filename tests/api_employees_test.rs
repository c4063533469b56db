//! Integration tests for the employees and days off API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{
        MONDAY, body_to_json, client, create_employee, create_merchant, merchant, request,
        test_app,
    };

    /// Tests employees are listed with and without their own hours
    #[tokio::test]
    #[serial]
    async fn it_creates_and_lists_employees() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;
        create_employee(&app, &merchant_id, None).await;
        create_employee(
            &app,
            &merchant_id,
            Some(serde_json::json!({
                "work_days": [6],
                "start_time": "10:00",
                "end_time": "14:00",
            })),
        )
        .await;

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/merchants/{}/employees", merchant_id),
                &[],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        let employees = body.as_array().unwrap();
        assert_eq!(employees.len(), 2);
        let with_hours = employees
            .iter()
            .filter(|e| !e["schedule"].is_null())
            .count();
        assert_eq!(with_hours, 1);
    }

    /// Tests clients can't add staff
    #[tokio::test]
    #[serial]
    async fn it_forbids_clients_creating_employees() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;
        let response = app
            .oneshot(request(
                "POST",
                &format!("/api/merchants/{}/employees", merchant_id),
                &client("client-1"),
                Some(serde_json::json!({ "name": "Mallory" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    /// Tests days off can be added, listed and removed
    #[tokio::test]
    #[serial]
    async fn it_manages_days_off() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;
        let employee_id = create_employee(&app, &merchant_id, None).await;
        let uri = format!("/api/employees/{}/days-off", employee_id);

        for date in [MONDAY, "2026-10-21", MONDAY] {
            let response = app
                .clone()
                .oneshot(request(
                    "POST",
                    &uri,
                    &merchant(&merchant_id),
                    Some(serde_json::json!({ "date": date })),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(request("GET", &uri, &merchant(&merchant_id), None))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["dates"], serde_json::json!([MONDAY, "2026-10-21"]));

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("{}/{}", uri, MONDAY),
                &merchant(&merchant_id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("{}/{}", uri, MONDAY),
                &merchant(&merchant_id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(request("GET", &uri, &merchant(&merchant_id), None))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["dates"], serde_json::json!(["2026-10-21"]));
    }

    /// Tests another merchant can't touch this employee's days off
    #[tokio::test]
    #[serial]
    async fn it_forbids_other_merchants_managing_days_off() {
        let app = test_app().await;
        let merchant_id = create_merchant(&app).await;
        let other_id = create_merchant(&app).await;
        let employee_id = create_employee(&app, &merchant_id, None).await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/employees/{}/days-off", employee_id),
                &merchant(&other_id),
                Some(serde_json::json!({ "date": MONDAY })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                "POST",
                "/api/employees/missing/days-off",
                &merchant(&merchant_id),
                Some(serde_json::json!({ "date": MONDAY })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

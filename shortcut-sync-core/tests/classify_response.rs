use shortcut_sync_core::classify::{classify_response, error_message, ResponseClass};
use shortcut_sync_core::contract::ApiResponse;

fn bad_request(detail: &str) -> ApiResponse {
    ApiResponse::new(
        400,
        serde_json::json!({
            "errorCode": "BadRequest",
            "message": "The request could not be processed",
            "moreDetails": [{ "errorCode": "x", "message": detail }]
        })
        .to_string(),
    )
}

struct TestCase {
    name: &'static str,
    response: ApiResponse,
    expected: ResponseClass,
}

#[test]
fn test_classify_response_table_driven() {
    let cases = vec![
        TestCase {
            name: "200 with name",
            response: ApiResponse::new(200, r#"{"name":"orders","path":"Tables/sales"}"#),
            expected: ResponseClass::Created {
                name: Some("orders".into()),
            },
        },
        TestCase {
            name: "201 with auto-renamed name",
            response: ApiResponse::new(201, r#"{"name":"orders_1"}"#),
            expected: ResponseClass::Created {
                name: Some("orders_1".into()),
            },
        },
        TestCase {
            name: "201 with unparseable body",
            response: ApiResponse::new(201, "ok"),
            expected: ResponseClass::Created { name: None },
        },
        TestCase {
            name: "429 with Retry-After",
            response: ApiResponse::new(429, "").with_retry_after(10),
            expected: ResponseClass::RateLimited {
                retry_after_secs: Some(10),
            },
        },
        TestCase {
            name: "429 without Retry-After",
            response: ApiResponse::new(429, ""),
            expected: ResponseClass::RateLimited {
                retry_after_secs: None,
            },
        },
        TestCase {
            name: "400 shortcut already exists",
            response: bad_request(
                "Copy, Rename or Update of shortcuts are not supported by OneLake.",
            ),
            expected: ResponseClass::AlreadyExists,
        },
        TestCase {
            name: "400 access to target denied",
            response: bad_request(
                "Unauthorized. Access to target location https://acct/c denied.",
            ),
            expected: ResponseClass::AccessDenied {
                message: "Unauthorized. Access to target location https://acct/c denied."
                    .into(),
            },
        },
        TestCase {
            name: "400 other detail",
            response: bad_request("Target path is invalid"),
            expected: ResponseClass::Unexpected {
                status: 400,
                detail: "Target path is invalid".into(),
            },
        },
        TestCase {
            name: "400 non-json body",
            response: ApiResponse::new(400, "bad"),
            expected: ResponseClass::Unexpected {
                status: 400,
                detail: "bad".into(),
            },
        },
        TestCase {
            name: "403",
            response: ApiResponse::new(403, "{}"),
            expected: ResponseClass::Forbidden,
        },
        TestCase {
            name: "500",
            response: ApiResponse::new(500, "boom"),
            expected: ResponseClass::Unexpected {
                status: 500,
                detail: "boom".into(),
            },
        },
    ];

    for case in cases {
        assert_eq!(
            classify_response(&case.response),
            case.expected,
            "case '{}'",
            case.name
        );
    }
}

#[test]
fn test_error_message_falls_back_to_top_level_message() {
    let body = r#"{"errorCode":"X","message":"top level"}"#;
    assert_eq!(error_message(body).as_deref(), Some("top level"));
    assert_eq!(error_message("not json"), None);
}

use chrono::{TimeZone, Utc};
use payments_dispatch::domain::health::ProcessorHealth;
use payments_dispatch::domain::payment::{Payment, PaymentRequest, RoutableRequest};
use payments_dispatch::domain::processor::ProcessorName;
use rust_decimal_macros::dec;

#[test]
fn routable_request_uses_the_processor_wire_shape() {
    let requested_at = Utc.with_ymd_and_hms(2025, 7, 1, 12, 30, 5).unwrap()
        + chrono::Duration::milliseconds(42);
    let request = RoutableRequest {
        correlation_id: "4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3".to_string(),
        amount: dec!(19.90),
        requested_at,
        retry_count: 1,
        retry_delay: 250,
    };

    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(
        value["correlationId"],
        "4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3"
    );
    assert_eq!(value["amount"], 19.9);
    assert_eq!(value["requestedAt"], "2025-07-01T12:30:05.042Z");
    assert_eq!(value["retryCount"], 1);
    assert_eq!(value["retryDelay"], 250);
}

#[test]
fn routable_request_roundtrips_through_the_queue_encoding() {
    let request = PaymentRequest {
        correlation_id: "c1".to_string(),
        amount: dec!(100.00),
    }
    .into_routable(Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap());

    let payload = serde_json::to_string(&request).unwrap();
    let decoded: RoutableRequest = serde_json::from_str(&payload).unwrap();

    assert_eq!(decoded.correlation_id, request.correlation_id);
    assert_eq!(decoded.amount, request.amount);
    assert_eq!(decoded.requested_at, request.requested_at);
    assert_eq!(decoded.retry_count, 0);
    assert_eq!(decoded.retry_delay, 0);
}

#[test]
fn missing_retry_fields_default_to_zero() {
    let decoded: RoutableRequest = serde_json::from_str(
        r#"{"correlationId":"c1","amount":10.0,"requestedAt":"2025-07-01T09:00:00.000Z"}"#,
    )
    .unwrap();

    assert_eq!(decoded.retry_count, 0);
    assert_eq!(decoded.retry_delay, 0);
}

#[test]
fn decodes_a_client_submission() {
    let decoded: PaymentRequest =
        serde_json::from_str(r#"{"correlationId":"c1","amount":100.0}"#).unwrap();

    assert_eq!(decoded.correlation_id, "c1");
    assert_eq!(decoded.amount, dec!(100.0));
}

#[test]
fn decodes_a_processor_health_body() {
    let decoded: ProcessorHealth =
        serde_json::from_str(r#"{"failing":false,"minResponseTime":100}"#).unwrap();

    assert_eq!(
        decoded,
        ProcessorHealth {
            failing: false,
            min_response_time: 100
        }
    );
}

#[test]
fn payment_records_roundtrip() {
    let payment = Payment {
        correlation_id: "c1".to_string(),
        processed_by: ProcessorName::Fallback,
        amount: dec!(55.10),
        created_at: Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
    };

    let value = serde_json::to_value(&payment).unwrap();
    assert_eq!(value["processedBy"], "fallback");

    let decoded: Payment = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, payment);
}

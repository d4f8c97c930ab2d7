use chrono::{DateTime, Utc};
use proptest::prelude::*;

use adaptive_expr::Value;

use crate::{call, constant, eval_empty};

fn text(name: &str, args: Vec<Value>) -> String {
    let expr = call(name, args.into_iter().map(constant).collect());
    eval_empty(&expr).unwrap().to_string()
}

#[test]
fn test_timezone_round_trip() {
    let utc = "2021-07-04T18:30:00.000Z";
    for zone in ["Asia/Tokyo", "Europe/Berlin", "America/Los_Angeles", "UTC"] {
        let local = text("convertFromUTC", vec![utc.into(), zone.into()]);
        assert_eq!(
            text("convertToUTC", vec![local.clone().into(), zone.into()]),
            utc,
            "round trip through {} via {}",
            zone,
            local
        );
    }
}

#[test]
fn test_convert_from_utc_with_format() {
    assert_eq!(
        text(
            "convertFromUTC",
            vec!["2021-07-04T18:30:00Z".into(), "Asia/Tokyo".into(), "HH:mm".into()]
        ),
        "03:30"
    );
}

#[test]
fn test_standard_format_names() {
    let ts: Value = "2021-07-04T18:30:05.000Z".into();
    assert_eq!(text("formatDateTime", vec![ts.clone(), "s".into()]), "2021-07-04T18:30:05");
    assert_eq!(text("formatDateTime", vec![ts.clone(), "d".into()]), "7/4/2021");
    assert_eq!(
        text("formatDateTime", vec![ts, "D".into()]),
        "Sunday, July 4, 2021"
    );
}

proptest! {
    #[test]
    fn test_ticks_round_trip(millis in 0i64..4_102_444_800_000) {
        let dt = DateTime::<Utc>::from_timestamp_millis(millis).unwrap();
        let ts = dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        let ticks = eval_empty(&call("ticks", vec![constant(ts.as_str())])).unwrap();
        prop_assert_eq!(
            ticks.clone(),
            Value::Integer(millis * 10_000 + 621_355_968_000_000_000)
        );
        let back = eval_empty(&call("formatTicks", vec![constant(ticks)])).unwrap();
        prop_assert_eq!(back, Value::String(ts));
    }
}

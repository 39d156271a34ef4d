//! Property-based tests using proptest
//!
//! Identifier round trips, enumerated validation and the translator
//! round-trip law on randomized inputs.

use proptest::prelude::*;
use sentry_provider::resource::filter::{Filter, FilterResource};
use sentry_provider::resource::id;
use sentry_provider::resource::metric_alert::{
    expand_metric_alert, flatten_metric_alert, MetricAlert, MetricAlertResource, Trigger, TriggerAction,
};
use sentry_provider::resource::validate::{validate, Constraint, COMPARISON_DELTAS, LEGACY_BROWSERS};
use sentry_provider::resource::Resource;
use sentry_provider::ProviderError;

/// Slugs as Sentry allows them
fn arb_slug() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9_-]{0,31}"
}

fn arb_action() -> impl Strategy<Value = TriggerAction> {
    (
        proptest::option::of("[0-9]{1,6}"),
        prop_oneof!["email", "slack", "pagerduty", "msteams"],
        prop_oneof!["user", "team", "specific"],
        "[a-z0-9#-]{1,12}",
        proptest::option::of(1i64..100_000),
    )
        .prop_map(|(id, type_, target_type, target_identifier, integration_id)| TriggerAction {
            id,
            type_: type_.to_string(),
            target_type: target_type.to_string(),
            target_identifier,
            integration_id,
        })
}

fn arb_trigger() -> impl Strategy<Value = Trigger> {
    (
        proptest::option::of("[0-9]{1,6}"),
        prop_oneof!["critical", "warning"],
        0i64..=1,
        0u32..10_000,
        proptest::option::of(0u32..10_000),
        prop::collection::vec(arb_action(), 0..4),
    )
        .prop_map(|(id, label, threshold_type, alert, resolve, action)| Trigger {
            id,
            label: label.to_string(),
            threshold_type,
            alert_threshold: f64::from(alert),
            resolve_threshold: resolve.map(f64::from),
            action,
        })
}

fn arb_metric_alert() -> impl Strategy<Value = MetricAlert> {
    (
        (arb_slug(), arb_slug(), "[A-Za-z ]{1,30}"),
        proptest::option::of(prop_oneof!["production", "staging"]),
        proptest::option::of(prop_oneof!["events", "transactions"]),
        prop_oneof![Just(1.0), Just(5.0), Just(10.0), Just(60.0), Just(1440.0)],
        0i64..=1,
        proptest::option::of(prop::sample::select(COMPARISON_DELTAS.to_vec())),
        prop::collection::vec(arb_trigger(), 0..4),
    )
        .prop_map(
            |((org, project, name), environment, dataset, time_window, threshold_type, comparison_delta, trigger)| {
                MetricAlert {
                    organization: org,
                    project,
                    name,
                    environment,
                    dataset,
                    query: "level:error".into(),
                    aggregate: "count()".into(),
                    time_window,
                    threshold_type,
                    resolve_threshold: None,
                    comparison_delta,
                    owner: None,
                    trigger,
                    internal_id: None,
                }
            },
        )
}

proptest! {
    /// decode(encode(xs), len(xs)) == xs
    #[test]
    fn identifier_round_trip(segments in prop::collection::vec(arb_slug(), 1..=3)) {
        let encoded = id::encode(&segments).unwrap();
        prop_assert_eq!(id::decode(&encoded, segments.len()).unwrap(), segments);
    }

    /// A composite id never decodes with a different segment count
    #[test]
    fn identifier_wrong_count_fails(
        segments in prop::collection::vec(arb_slug(), 1..=3),
        expected in 1usize..=3,
    ) {
        prop_assume!(expected != segments.len());
        let encoded = id::encode(&segments).unwrap();
        let is_malformed = matches!(
            id::decode(&encoded, expected),
            Err(ProviderError::MalformedIdentifier { .. })
        );
        prop_assert!(is_malformed);
    }

    /// Segments carrying the delimiter are refused
    #[test]
    fn identifier_rejects_embedded_delimiter(a in arb_slug(), b in arb_slug()) {
        let bad = format!("{a}/{b}");
        let is_encoding = matches!(
            id::encode(&[bad.as_str(), "web"]),
            Err(ProviderError::Encoding { .. })
        );
        prop_assert!(is_encoding);
    }

    /// Only the enumerated comparison windows validate
    #[test]
    fn comparison_delta_outside_set_fails(delta in -100_000.0f64..100_000.0) {
        let result = validate("comparison_delta", delta, &Constraint::OneOf(COMPARISON_DELTAS));
        prop_assert_eq!(result.is_ok(), COMPARISON_DELTAS.contains(&delta));
        if let Err(e) = result {
            prop_assert!(e.to_string().contains("5, 15, 60, 1440, 10080, 43200"));
        }
    }

    /// Generated alerts satisfy every static constraint
    #[test]
    fn generated_alerts_validate(alert in arb_metric_alert()) {
        prop_assert!(MetricAlertResource::validate(&alert).is_ok());
    }

    /// flatten(expand(alert)) gives the alert back
    #[test]
    fn metric_alert_round_trip(alert in arb_metric_alert()) {
        let state = flatten_metric_alert(&alert.organization, &alert.project, &expand_metric_alert(&alert));
        prop_assert_eq!(state, alert);
    }

    /// Any subset of the known legacy browsers is accepted
    #[test]
    fn legacy_browser_subsets_validate(browsers in prop::sample::subsequence(LEGACY_BROWSERS.to_vec(), 0..=LEGACY_BROWSERS.len())) {
        let filter = Filter {
            organization: "acme".into(),
            project: "web".into(),
            browser_extension: false,
            legacy_browsers: browsers.into_iter().map(String::from).collect(),
        };
        prop_assert!(FilterResource::validate(&filter).is_ok());
    }
}

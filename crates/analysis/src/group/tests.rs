use super::*;
use chrono::{DateTime, TimeZone, Utc};
use common::types::Field;
use proptest::prelude::*;

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_714_640_400_000 + ms).unwrap()
}

fn sample(host: &str, field: Field, ms: i64, value: f64) -> Sample {
    Sample::new(at(ms), host, field, value)
}

#[test]
fn test_empty_input() {
    let series = group_by_host(Vec::new());
    assert!(series.is_empty());
    assert_eq!(series.len(), 0);
    assert!(series.get("ttgo1").is_none());
}

#[test]
fn test_groups_preserve_arrival_order() {
    let samples = vec![
        sample("ttgo2", Field::Voltage, 5, 1.0),
        sample("ttgo1", Field::Current, 3, 2.0),
        sample("ttgo2", Field::Current, 1, 3.0),
        sample("ttgo1", Field::Voltage, 0, 4.0),
    ];

    let series = group_by_host(samples.clone());

    assert_eq!(series.hosts().collect::<Vec<_>>(), vec!["ttgo2", "ttgo1"]);
    // 時刻順ではなく到着順
    assert_eq!(
        series.get("ttgo2").unwrap(),
        &[samples[0].clone(), samples[2].clone()]
    );
    assert_eq!(
        series.get("ttgo1").unwrap(),
        &[samples[1].clone(), samples[3].clone()]
    );
}

#[test]
fn test_duplicates_are_kept() {
    let s = sample("a", Field::Voltage, 0, 1.0);
    let series = group_by_host(vec![s.clone(), s.clone()]);
    assert_eq!(series.get("a").unwrap().len(), 2);
}

#[test]
fn test_unknown_fields_are_not_filtered() {
    let series = group_by_host(vec![sample("a", Field::Other("x".into()), 0, 1.0)]);
    assert_eq!(series.get("a").unwrap()[0].field, Field::Other("x".into()));
}

#[test]
fn test_into_iter_and_iter_agree() {
    let samples = vec![
        sample("a", Field::Voltage, 0, 1.0),
        sample("b", Field::Voltage, 0, 1.0),
    ];
    let series = group_by_host(samples);
    let borrowed: Vec<(String, usize)> = series
        .iter()
        .map(|(h, s)| (h.to_string(), s.len()))
        .collect();
    let owned: Vec<(String, usize)> = series
        .into_iter()
        .map(|(h, s)| (h, s.len()))
        .collect();
    assert_eq!(borrowed, owned);
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    (0usize..4, 0i64..50, any::<bool>(), -100.0..100.0f64).prop_map(|(h, ms, v, value)| {
        let field = if v { Field::Voltage } else { Field::Current };
        sample(&format!("ttgo{}", h), field, ms, value)
    })
}

proptest! {
    #[test]
    fn test_every_host_is_a_key_with_exactly_its_samples(
        samples in prop::collection::vec(arb_sample(), 0..64)
    ) {
        let series = group_by_host(samples.clone());

        for s in &samples {
            prop_assert!(series.get(&s.host).is_some());
        }

        let mut total = 0;
        for (host, grouped) in series.iter() {
            let expected: Vec<Sample> =
                samples.iter().filter(|s| s.host == host).cloned().collect();
            prop_assert_eq!(grouped, expected.as_slice());
            total += grouped.len();
        }
        prop_assert_eq!(total, samples.len());
    }
}

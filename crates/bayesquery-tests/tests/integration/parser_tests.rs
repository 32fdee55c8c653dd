use bayesquery_frontend::{
    parse_records, parse_spec_json, Edge, FrontendError, Literal, Record, RecordValue,
};

#[test]
fn parses_alarm_fixture() {
    let src = include_str!("../../fixtures/alarm.json");
    let spec = parse_spec_json(src).expect("parse alarm");

    assert_eq!(spec.priors.len(), 2);
    assert_eq!(spec.tables.len(), 3);
    assert_eq!(spec.tables["A"].len(), 8);
    assert_eq!(spec.tables["J"].len(), 4);
    assert_eq!(
        spec.beliefs.values().cloned().collect::<Vec<_>>(),
        vec![Literal::positive("J"), Literal::positive("M")]
    );
    assert_eq!(spec.single_query().unwrap(), &Literal::positive("B"));
    assert_eq!(
        spec.edges,
        vec![
            Edge::new("B", "A"),
            Edge::new("E", "A"),
            Edge::new("A", "J"),
            Edge::new("A", "M"),
        ]
    );
}

#[test]
fn parses_records_built_in_code() {
    let mut prior = Record::new();
    prior.insert("A".into(), RecordValue::Number(0.25));
    let mut table = Record::new();
    table.insert("B|A".into(), RecordValue::Number(0.5));
    table.insert("B|-A".into(), RecordValue::Number(0.75));
    let mut query = Record::new();
    query.insert("QUERY".into(), RecordValue::Text("-B".into()));

    let spec = parse_records(&[prior, table, query]).expect("parse records");
    assert_eq!(spec.priors["A"], 0.25);
    assert_eq!(spec.query, vec![Literal::negative("B")]);
    let complement = spec.tables["B"]
        .iter()
        .find(|row| row.child.is_negated() && row.parents == vec![Literal::negative("A")])
        .expect("synthesized complement row");
    assert_eq!(complement.probability, 0.25);
}

#[test]
fn integer_probabilities_are_accepted() {
    let spec = parse_spec_json(r#"[{"A": 1}, {"B|A": 0, "B|-A": 1}]"#).expect("parse");
    assert_eq!(spec.priors["A"], 1.0);
    assert_eq!(spec.tables["B"][0].probability, 0.0);
}

#[test]
fn multiple_queries_are_rejected_not_truncated() {
    let spec = parse_spec_json(r#"[{"A": 0.5}, {"QUERY": "A"}, {"QUERY": "-A"}]"#).expect("parse");
    assert_eq!(spec.query.len(), 2);
    assert!(matches!(
        spec.single_query(),
        Err(FrontendError::MultipleQueries(2))
    ));
}

#[test]
fn null_and_boolean_values_are_rejected() {
    for src in [r#"[{"A": null}]"#, r#"[{"A": true}]"#, r#"[{"BELIEF": ["A"]}]"#] {
        let err = parse_spec_json(src).expect_err(src);
        assert!(
            matches!(err, FrontendError::UnexpectedValue { .. }),
            "{src}: {err}"
        );
    }
}

#[test]
fn multi_character_names_outside_parent_tokens() {
    let spec = parse_spec_json(
        r#"[{"Rain": 0.2, "A": 0.5}, {"Wet|A": 0.9, "Wet|-A": 0.1}, {"BELIEF": "-Wet"}, {"QUERY": "Rain"}]"#,
    )
    .expect("parse");
    assert_eq!(spec.priors["Rain"], 0.2);
    assert_eq!(spec.tables["Wet"].len(), 4);
    assert_eq!(spec.edges, vec![Edge::new("A", "Wet")]);
    assert_eq!(spec.beliefs["Wet"], Literal::negative("Wet"));
    assert_eq!(spec.single_query().unwrap(), &Literal::positive("Rain"));
}

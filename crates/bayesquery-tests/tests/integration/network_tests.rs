use bayesquery_core::engine::network::Distribution;
use bayesquery_core::{build_network, ExecError, ReferenceKind};
use bayesquery_frontend::{
    parse_spec_json, parse_spec_json_with_options, EdgeDiscovery, Outcome, ParseOptions,
};

use crate::support::assert_close;

#[test]
fn builds_alarm_structure() {
    let spec = parse_spec_json(include_str!("../../fixtures/alarm.json")).unwrap();
    let network = build_network(&spec).expect("build alarm");

    assert_eq!(network.len(), 5);
    assert_eq!(network.edges().len(), 4);
    let names: Vec<&str> = network
        .topological_order()
        .iter()
        .map(|id| network.variable(*id).name.as_str())
        .collect();
    assert_eq!(names, vec!["B", "E", "A", "J", "M"]);

    let a = network.lookup("A").unwrap();
    let parents: Vec<&str> = network
        .parents(a)
        .iter()
        .map(|id| network.variable(*id).name.as_str())
        .collect();
    assert_eq!(parents, vec!["B", "E"]);
}

#[test]
fn every_table_pair_sums_to_one() {
    let spec = parse_spec_json(include_str!("../../fixtures/sprinkler.json")).unwrap();
    let network = build_network(&spec).unwrap();
    for variable in network.variables() {
        match network.distribution(variable.id) {
            Distribution::Prior(prior) => {
                assert_close(prior.p_true() + prior.p_false(), 1.0, 1e-12, &variable.name)
            }
            Distribution::Conditional(table) => {
                for assignment in 0..table.assignment_count() {
                    assert_close(
                        table.probability(Outcome::True, assignment)
                            + table.probability(Outcome::False, assignment),
                        1.0,
                        1e-9,
                        &variable.name,
                    );
                }
                assert_eq!(table.rows().len(), 2 * table.assignment_count());
            }
        }
    }
}

#[test]
fn negated_only_table_is_dropped_unless_gap_closed() {
    let src = r#"[{"A": 0.5}, {"B|-A": 0.3, "B|A": 0.6}, {"C|-B": 0.4}, {"C|B": 0.1}]"#;

    // C's affirmed row lives in a later record, which replaces the group holding "C|-B"
    let spec = parse_spec_json(src).unwrap();
    let err = build_network(&spec).unwrap_err();
    assert!(matches!(err, ExecError::MalformedSpec(_)), "{err}");

    let src = r#"[{"A": 0.5}, {"B|-A": 0.3, "B|A": 0.6}, {"C|-B": 0.4}]"#;
    let network = build_network(&parse_spec_json(src).unwrap()).unwrap();
    assert!(network.lookup("C").is_none());

    let closed = parse_spec_json_with_options(
        src,
        ParseOptions::default().with_edge_discovery(EdgeDiscovery::EveryRow),
    )
    .unwrap();
    let err = build_network(&closed).unwrap_err();
    // the edge now exists, exposing the missing "C|B" row
    assert!(matches!(err, ExecError::MalformedSpec(_)), "{err}");
}

#[test]
fn complete_tables_build_under_both_discovery_modes() {
    let src = r#"[{"A": 0.5}, {"B|-A": 0.3, "B|A": 0.9}]"#;
    for discovery in [EdgeDiscovery::AffirmedRowsOnly, EdgeDiscovery::EveryRow] {
        let spec = parse_spec_json_with_options(
            src,
            ParseOptions::default().with_edge_discovery(discovery),
        )
        .unwrap();
        let network = build_network(&spec).unwrap();
        let b = network.lookup("B").unwrap();
        assert_eq!(network.parents(b).len(), 1, "{discovery:?}");
        assert_eq!(network.edges().len(), 1, "{discovery:?}");
    }
}

#[test]
fn unknown_parent_is_unresolved_reference() {
    let spec = parse_spec_json(r#"[{"A": 0.5}, {"C|AB": 0.2, "C|A-B": 0.2, "C|-AB": 0.2, "C|-A-B": 0.2}]"#)
        .unwrap();
    let err = build_network(&spec).unwrap_err();
    match err {
        ExecError::UnresolvedReference { kind, name } => {
            assert_eq!(kind, ReferenceKind::Parent);
            assert_eq!(name, "B");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn three_cycle_is_rejected() {
    let spec = parse_spec_json(
        r#"[{"A|C": 0.5, "A|-C": 0.5}, {"B|A": 0.5, "B|-A": 0.5}, {"C|B": 0.5, "C|-B": 0.5}]"#,
    )
    .unwrap();
    assert!(matches!(
        build_network(&spec).unwrap_err(),
        ExecError::CyclicStructure(_)
    ));
}

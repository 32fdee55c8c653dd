use bayesquery_core::{
    build_network, infer, infer_all, infer_with_config, Evidence, ExecError, InferenceConfig,
    Network,
};
use bayesquery_frontend::{parse_spec_json, Literal, Outcome, ParsedSpec};

use crate::support::{assert_close, enumerate_posterior};

fn load(src: &str) -> (ParsedSpec, Network) {
    let spec = parse_spec_json(src).expect("parse");
    let network = build_network(&spec).expect("build");
    (spec, network)
}

fn oracle(network: &Network, evidence: &Evidence, query: &str) -> f64 {
    let observed: Vec<_> = evidence.observations().collect();
    enumerate_posterior(network, &observed, network.lookup(query).unwrap()).unwrap()
}

#[test]
fn alarm_burglary_given_both_calls() {
    let (spec, network) = load(include_str!("../../fixtures/alarm.json"));
    let evidence = Evidence::resolve(&network, &spec.beliefs).unwrap();
    let posterior = infer(&network, &evidence, spec.single_query().unwrap()).unwrap();

    assert_close(posterior.outcome_true, 0.284171835, 1e-6, "P(B | J, M)");
    assert_close(
        posterior.outcome_true,
        oracle(&network, &evidence, "B"),
        1e-12,
        "VE vs enumeration",
    );
}

#[test]
fn sprinkler_matches_enumeration_for_every_variable() {
    let (spec, network) = load(include_str!("../../fixtures/sprinkler.json"));
    let evidence = Evidence::resolve(&network, &spec.beliefs).unwrap();

    let all = infer_all(&network, &evidence, InferenceConfig::default()).unwrap();
    for (name, posterior) in &all {
        assert_close(
            posterior.outcome_true,
            oracle(&network, &evidence, name),
            1e-12,
            name,
        );
        assert_close(posterior.outcome_true + posterior.outcome_false, 1.0, 1e-12, name);
    }
    assert_close(all["R"].outcome_false, 0.189 / 0.6471, 1e-9, "P(-R | W)");
}

#[test]
fn explaining_away_lowers_the_other_cause() {
    let (_, network) = load(include_str!("../../fixtures/alarm.json"));
    let alarm_only = Evidence::from_literals(&network, &[Literal::positive("A")]).unwrap();
    let with_quake = Evidence::from_literals(
        &network,
        &[Literal::positive("A"), Literal::positive("E")],
    )
    .unwrap();

    let burglary = Literal::positive("B");
    let before = infer(&network, &alarm_only, &burglary).unwrap();
    let after = infer(&network, &with_quake, &burglary).unwrap();
    assert!(after.outcome_true < before.outcome_true);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let (spec, network) = load(include_str!("../../fixtures/alarm.json"));
    let evidence = Evidence::resolve(&network, &spec.beliefs).unwrap();
    let query = spec.single_query().unwrap();

    let first = infer(&network, &evidence, query).unwrap();
    for _ in 0..10 {
        let again = infer(&network, &evidence, query).unwrap();
        assert_eq!(first.outcome_true.to_bits(), again.outcome_true.to_bits());
        assert_eq!(first.outcome_false.to_bits(), again.outcome_false.to_bits());
    }
}

#[test]
fn pruning_is_invisible_in_results() {
    let (spec, network) = load(include_str!("../../fixtures/alarm.json"));
    let evidence = Evidence::resolve(&network, &spec.beliefs).unwrap();
    let unpruned = InferenceConfig {
        prune_barren: false,
        ..InferenceConfig::default()
    };

    for variable in network.variables() {
        let literal = variable.literal(Outcome::True);
        let pruned = infer(&network, &evidence, &literal).unwrap();
        let full = infer_with_config(&network, &evidence, &literal, unpruned).unwrap();
        assert_close(pruned.outcome_true, full.outcome_true, 1e-12, &variable.name);
    }
}

#[test]
fn root_without_evidence_keeps_its_prior() {
    let (_, network) = load(include_str!("../../fixtures/alarm.json"));
    let posterior = infer(&network, &Evidence::empty(), &Literal::positive("E")).unwrap();
    assert_close(posterior.outcome_true, 0.002, 1e-15, "P(E)");
}

#[test]
fn contradictory_evidence_is_undefined() {
    let (_, network) = load(include_str!("../../fixtures/sprinkler.json"));
    // W is impossible when neither the sprinkler nor the rain is on
    let evidence = Evidence::from_literals(
        &network,
        &[
            Literal::positive("W"),
            Literal::negative("S"),
            Literal::negative("R"),
        ],
    )
    .unwrap();
    let err = infer(&network, &evidence, &Literal::positive("C")).unwrap_err();
    assert!(matches!(err, ExecError::UndefinedPosterior(_)), "{err}");
}

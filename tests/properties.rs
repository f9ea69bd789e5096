//! Property tests for factor algebra, d-separation and exact inference on random networks

use bayesnet::{
    all_assignments, Assignment, BayesBall, BayesError, ConditionalInferenceEngine, DirectedModel,
    DirectedModelBuilder, EnumerationEngine, Factor, Initialization, OperationCount, Variable,
    VariableEliminationEngine,
};
use ndarray::{Array, IxDyn};
use proptest::prelude::*;

use std::collections::HashSet;

const MAX_VARIABLES: usize = 6;

/// Cardinality, parent mask and observed value for each potential variable of a network
type Layout = Vec<(usize, u8, u8)>;

fn network_layout() -> impl Strategy<Value = (usize, Layout, u64)> {
    (
        2usize..=MAX_VARIABLES,
        prop::collection::vec((2usize..4, any::<u8>(), any::<u8>()), MAX_VARIABLES),
        any::<u64>(),
    )
}

/// Variable `i` takes as parents up to three of the earlier variables picked by its mask
fn random_network(n: usize, layout: &Layout, seed: u64) -> (DirectedModel, Vec<Variable>) {
    let mut vars: Vec<Variable> = Vec::with_capacity(n);
    let mut builder = DirectedModelBuilder::new();

    for (i, &(card, mask, _)) in layout.iter().take(n).enumerate() {
        let var = Variable::discrete(card);
        let parents: Vec<Variable> = (0..i)
            .filter(|j| mask & (1 << j) != 0)
            .take(3)
            .map(|j| vars[j])
            .collect();

        builder = builder.with_variable(&var, parents, Initialization::Seeded(seed.wrapping_add(i as u64)));
        vars.push(var);
    }

    (builder.build().unwrap(), vars)
}

/// Like `random_network`, but each CPD is built from `weights`, where a weight divisible by three
/// is a zero. A row of zeros puts all of its mass on the first outcome.
fn sparse_network(n: usize, layout: &Layout, weights: &[Vec<u8>]) -> (DirectedModel, Vec<Variable>) {
    let mut vars: Vec<Variable> = Vec::with_capacity(n);
    let mut builder = DirectedModelBuilder::new();

    for (i, &(card, mask, _)) in layout.iter().take(n).enumerate() {
        let var = Variable::discrete(card);
        let parents: Vec<Variable> = (0..i)
            .filter(|j| mask & (1 << j) != 0)
            .take(3)
            .map(|j| vars[j])
            .collect();

        let mut shape: Vec<usize> = parents.iter().map(|p| p.cardinality()).collect();
        let rows: usize = shape.iter().product();
        shape.push(card);

        let mut values: Vec<f64> = Vec::with_capacity(rows * card);
        for row in weights[i].chunks(card).take(rows) {
            let mut row: Vec<f64> = row.iter().map(|&w| if w % 3 == 0 { 0.0 } else { w as f64 }).collect();
            let z: f64 = row.iter().sum();
            if z == 0.0 {
                row[0] = 1.0;
            } else {
                row.iter_mut().for_each(|w| *w /= z);
            }
            values.extend(row);
        }

        let table = Array::from_shape_vec(IxDyn(&shape), values).unwrap();
        let cpd = Factor::cpd(var, parents.clone(), table).unwrap();

        builder = builder.with_variable(&var, parents, Initialization::Table(cpd));
        vars.push(var);
    }

    (builder.build().unwrap(), vars)
}

/// Observe the variables picked by `mask`, other than `skip`
fn observe(vars: &[Variable], layout: &Layout, mask: u8, skip: &[usize]) -> Assignment {
    vars.iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0 && ! skip.contains(i))
        .map(|(i, v)| (*v, layout[i].2 as usize % v.cardinality()))
        .collect()
}

/// Both engines must give the same distribution, or both find the evidence impossible
fn assert_same_answer(
    expected: bayesnet::Result<Factor>,
    actual: bayesnet::Result<Factor>
) -> Result<(), TestCaseError> {
    match (expected, actual) {
        (Ok(e), Ok(a)) => assert_same_distribution(&e, &a),
        (Err(BayesError::ZeroProbability), Err(BayesError::ZeroProbability)) => Ok(()),
        (e, a) => Err(TestCaseError::fail(format!("enumeration gave {:?}, elimination gave {:?}", e, a)))
    }
}

fn assert_same_distribution(expected: &Factor, actual: &Factor) -> Result<(), TestCaseError> {
    for assn in all_assignments(&expected.scope()) {
        let e = expected.value(&assn).unwrap();
        let a = actual.value(&assn).unwrap();
        prop_assert!((e - a).abs() < 1e-9, "expected {}, got {}", e, a);
    }
    Ok(())
}

fn factor(scope: Vec<Variable>, values: &[f64]) -> Factor {
    let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
    let len: usize = shape.iter().product();
    let table = Array::from_shape_vec(IxDyn(&shape), values[..len].to_vec()).unwrap();
    Factor::new(scope, table).unwrap()
}

proptest! {
    #[test]
    fn product_commutes(values in prop::collection::vec(0f64..1.0, 12)) {
        let a = Variable::binary();
        let b = Variable::discrete(3);
        let c = Variable::binary();

        let f = factor(vec![a, b], &values[..6]);
        let g = factor(vec![b, c], &values[6..]);

        let mut ops = OperationCount::default();
        let fg = f.product_with(&g, &mut ops).unwrap();
        let gf = g.product(&f).unwrap();

        prop_assert_eq!(12, ops.multiplications);
        prop_assert_eq!(vec![a, b, c], fg.scope());
        prop_assert_eq!(vec![b, c, a], gf.scope());
        assert_same_distribution(&fg, &gf)?;
    }

    #[test]
    fn marginalize_keeps_mass(values in prop::collection::vec(0f64..1.0, 12)) {
        let a = Variable::binary();
        let b = Variable::discrete(3);
        let c = Variable::binary();
        let f = factor(vec![a, b, c], &values);

        let mut ops = OperationCount::default();
        let tau = f.marginalize_with(b, &mut ops);

        prop_assert_eq!(vec![a, c], tau.scope());
        prop_assert_eq!(8, ops.additions);
        prop_assert!((f.total() - tau.total()).abs() < 1e-9);
    }

    #[test]
    fn d_separation_is_symmetric((n, layout, seed) in network_layout(), mask in any::<u8>(), x in 0usize..MAX_VARIABLES, y in 0usize..MAX_VARIABLES) {
        let (model, vars) = random_network(n, &layout, seed);
        let (x, y) = (x % n, y % n);
        let observed: HashSet<Variable> = observe(&vars, &layout, mask, &[x, y]).keys().cloned().collect();

        let bb = BayesBall::new(&model);
        prop_assert_eq!(
            bb.is_d_separated(&vars[x], &vars[y], &observed).unwrap(),
            bb.is_d_separated(&vars[y], &vars[x], &observed).unwrap()
        );
    }

    #[test]
    fn d_separation_implies_independence((n, layout, seed) in network_layout(), mask in any::<u8>(), x in 0usize..MAX_VARIABLES, y in 0usize..MAX_VARIABLES) {
        let (model, vars) = random_network(n, &layout, seed);
        let (x, y) = (x % n, y % n);
        prop_assume!(x != y);

        let evidence = observe(&vars, &layout, mask, &[x, y]);
        let observed: HashSet<Variable> = evidence.keys().cloned().collect();
        prop_assume!(BayesBall::new(&model).is_d_separated(&vars[x], &vars[y], &observed).unwrap());

        let mut with_y = evidence.clone();
        with_y.set(&vars[y], 0);

        let query: HashSet<Variable> = vec![vars[x]].into_iter().collect();
        let without = EnumerationEngine::new(&model, &evidence).infer(&query).unwrap();
        let with = EnumerationEngine::new(&model, &with_y).infer(&query).unwrap();
        assert_same_distribution(&without, &with)?;
    }

    #[test]
    fn elimination_matches_enumeration((n, layout, seed) in network_layout(), mask in any::<u8>(), q in 0usize..MAX_VARIABLES) {
        let (model, vars) = random_network(n, &layout, seed);
        let q = q % n;

        let evidence = observe(&vars, &layout, mask, &[q]);
        let query: HashSet<Variable> = vec![vars[q]].into_iter().collect();

        let expected = EnumerationEngine::new(&model, &evidence).infer(&query).unwrap();

        let mut forward = VariableEliminationEngine::new(&model, &evidence);
        assert_same_distribution(&expected, &forward.infer(&query).unwrap())?;

        let reversed: Vec<Variable> = vars.iter().rev().cloned().collect();
        let mut backward = VariableEliminationEngine::new(&model, &evidence).with_order(&reversed);
        assert_same_distribution(&expected, &backward.infer(&query).unwrap())?;
    }

    #[test]
    fn elimination_matches_enumeration_with_zeros(
        (n, layout, _) in network_layout(),
        weights in prop::collection::vec(prop::collection::vec(any::<u8>(), 81), MAX_VARIABLES),
        mask in any::<u8>(),
        q in 0usize..MAX_VARIABLES
    ) {
        let (model, vars) = sparse_network(n, &layout, &weights);
        let (q1, q2) = (q % n, (q + 1) % n);

        let evidence = observe(&vars, &layout, mask, &[q1, q2]);
        let single: HashSet<Variable> = vec![vars[q1]].into_iter().collect();
        let joint: HashSet<Variable> = vec![vars[q1], vars[q2]].into_iter().collect();

        for query in [single, joint].iter() {
            let forward = VariableEliminationEngine::new(&model, &evidence).infer(query);
            assert_same_answer(EnumerationEngine::new(&model, &evidence).infer(query), forward)?;

            let reversed: Vec<Variable> = vars.iter().rev().cloned().collect();
            let backward = VariableEliminationEngine::new(&model, &evidence)
                .with_order(&reversed)
                .infer(query);
            assert_same_answer(EnumerationEngine::new(&model, &evidence).infer(query), backward)?;
        }
    }

    #[test]
    fn joint_queries_match_enumeration((n, layout, seed) in network_layout(), mask in any::<u8>(), q in 0usize..MAX_VARIABLES) {
        let (model, vars) = random_network(n, &layout, seed);
        let (q1, q2) = (q % n, (q + 1) % n);

        let evidence = observe(&vars, &layout, mask, &[q1, q2]);
        let query: HashSet<Variable> = vec![vars[q1], vars[q2]].into_iter().collect();

        let expected = EnumerationEngine::new(&model, &evidence).infer(&query).unwrap();
        let actual = VariableEliminationEngine::new(&model, &evidence).infer(&query).unwrap();
        assert_same_distribution(&expected, &actual)?;
    }
}

//! Provides an example of how to use bayesnet to reason about the burglary alarm network of
//! Russell & Norvig.
//!
//! Run with `cargo run --example inference`.

use bayesnet as bn;
use bn::ConditionalInferenceEngine;
use ndarray::array;

fn main() -> bn::Result<()> {
    let burglary = bn::Variable::binary();
    let earthquake = bn::Variable::binary();
    let alarm = bn::Variable::binary();
    let john = bn::Variable::binary();
    let mary = bn::Variable::binary();

    let scope = AlarmVariables(burglary, earthquake, alarm, john, mary);

    /////////////////////////////////////////////////////
    // Step 1: Build Model
    let model = build_model(scope)?;

    /////////////////////////////////////////////////////
    // Step 2: Ask about independence
    let bb = bn::BayesBall::new(&model);
    let observed = vec![john].into_iter().collect();
    println!(
        "B and E independent given J: {}",
        bb.is_d_separated(&burglary, &earthquake, &observed)?
    );

    /////////////////////////////////////////////////////
    // Step 3: Compile some evidence
    let mut evidence = bn::Assignment::new();
    evidence.set(&john, 0);
    evidence.set(&mary, 0);

    /////////////////////////////////////////////////////
    // Step 4: Run a Conditional Query
    let mut engine = bn::VariableEliminationEngine::new(&model, &evidence).with_order(&[alarm, earthquake]);

    let scope = vec![burglary];
    let query = scope.iter().cloned().collect();
    let p = engine.infer(&query)?;

    for assignment in bn::all_assignments(&scope) {
        println!("P(B = {} | J = T, M = T) = {:.5}", label(&assignment, &burglary), p.value(&assignment)?);
    }

    let ops = engine.operations();
    println!("{} multiplications, {} additions", ops.multiplications, ops.additions);

    Ok(())
}

struct AlarmVariables(bn::Variable, bn::Variable, bn::Variable, bn::Variable, bn::Variable);

fn label(assignment: &bn::Assignment, var: &bn::Variable) -> &'static str {
    match assignment.get(var) {
        Some(0) => "T",
        _ => "F"
    }
}

fn build_model(vars: AlarmVariables) -> bn::Result<bn::DirectedModel> {
    let AlarmVariables(b, e, a, j, m) = vars;

    ///////////////////////////////////////////////////
    // Step 1: Build CPTs for variables with parents. Outcome 0 is T.
    let cpt_a = bn::Factor::cpd(
        a,
        vec![b, e],
        array![
            [[0.95, 0.05], [0.94, 0.06]],
            [[0.29, 0.71], [0.001, 0.999]]
        ].into_dyn()
    )?;

    let cpt_j = bn::Factor::cpd(j, vec![a], array![[0.9, 0.1], [0.05, 0.95]].into_dyn())?;
    let cpt_m = bn::Factor::cpd(m, vec![a], array![[0.7, 0.3], [0.01, 0.99]].into_dyn())?;

    ///////////////////////////////////////////////////
    // Step 2: Build the Model
    let tf = ["T", "F"];
    bn::DirectedModelBuilder::new()
        .with_node(&b, "B", &tf, vec![], bn::Initialization::Binomial(0.001))
        .with_node(&e, "E", &tf, vec![], bn::Initialization::Binomial(0.002))
        .with_node(&a, "A", &tf, vec![b, e], bn::Initialization::Table(cpt_a))
        .with_node(&j, "J", &tf, vec![a], bn::Initialization::Table(cpt_j))
        .with_node(&m, "M", &tf, vec![a], bn::Initialization::Table(cpt_m))
        .build()
}

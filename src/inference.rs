use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::defuzzification::{DefuzzificationOp, Defuzzifier};
use crate::error::{FuzzyError, Result};
use crate::inputs::Inputs;
use crate::math::midpoint;
use crate::membership::Membership;
use crate::outputs::{Outputs, TermOutput};
use crate::rules::{Rule, Rules};
use crate::variable::{Term, Variable, Variables};

/// State of a single inference pass.
pub struct Context<'e> {
    variables: &'e Variables,
    inputs: &'e Inputs,
    outputs: Outputs,
}

impl<'e> Context<'e> {
    pub fn new(variables: &'e Variables, inputs: &'e Inputs) -> Self {
        Self {
            variables,
            inputs,
            outputs: Outputs::new(),
        }
    }

    pub fn variable(&self, name: &str) -> Result<&'e Variable> {
        self.variables.get(name)
    }

    pub fn input(&self, variable: &str) -> Result<f64> {
        self.inputs.get(variable).ok_or_else(|| FuzzyError::ValueNotFound {
            variable: variable.to_owned(),
        })
    }

    /// Clips the term by `truth_degree` and folds it into the running output of `variable`.
    pub fn add_output(&mut self, variable: &str, term: &Term, truth_degree: f64) {
        let clipped = term.membership().clone().clip(truth_degree);
        let terms = self.outputs.0.entry(variable.to_owned()).or_default();

        match terms.get_mut(term.name()) {
            Some(output) => output.merge(truth_degree, clipped),
            None => {
                terms.insert(term.name().to_owned(), TermOutput::new(term.name(), truth_degree, clipped));
            },
        }
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn into_outputs(self) -> Outputs {
        self.outputs
    }
}

/// Owns the rules and variables and runs inference passes over them.
///
/// Definitions are only ever replaced wholesale; `&mut self` setters keep that from overlapping
/// with an in-flight [`Engine::infer`].
pub struct Engine {
    rules: Rules,
    variables: Variables,
    defuzzifier: Box<dyn Defuzzifier + Send + Sync>,
}

impl Engine {
    pub fn new(defuzzifier: impl Defuzzifier + Send + Sync + 'static) -> Self {
        Self {
            rules: Rules::new(),
            variables: Variables::new(),
            defuzzifier: Box::new(defuzzifier),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.defuzzification)
    }

    /// Replaces every variable. Fails with [`FuzzyError::VariableAlreadyExists`] on a duplicate
    /// name, leaving the previous variables in place.
    pub fn variables(&mut self, variables: impl IntoIterator<Item = Variable>) -> Result<&mut Self> {
        self.variables = Variables::try_from(variables.into_iter().collect::<Vec<_>>())?;
        Ok(self)
    }

    /// Replaces every rule.
    pub fn rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> &mut Self {
        self.rules = rules.into_iter().collect();
        self
    }

    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables.get(name)
    }

    pub fn variable_list(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn rule_list(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Fires every rule in declaration order. Any lookup failure aborts the whole pass.
    pub fn infer(&self, inputs: &Inputs) -> Result<Outputs> {
        let mut ctx = Context::new(&self.variables, inputs);

        for (i, rule) in self.rules.iter().enumerate() {
            let conclusion = rule.conclusion();
            let variable = ctx.variable(conclusion.variable())?;
            let term = variable.term(conclusion.term())?;
            let truth_degree = rule.premise().value(&ctx)?;

            trace!(rule = i, conclusion = %conclusion, truth_degree, "rule fired");

            ctx.add_output(conclusion.variable(), term, truth_degree);
        }

        let outputs = ctx.into_outputs();

        debug!(rules = self.rules.len(), variables = outputs.0.len(), "inference done");

        Ok(outputs)
    }

    /// Crisp value of `variable`. Without any output for it, the universe midpoint.
    pub fn defuzzify(&self, variable: &str, outputs: &Outputs) -> Result<f64> {
        let var = self.variables.get(variable)?;
        let (min, max) = var.universe();

        let terms: &BTreeMap<String, TermOutput> = match outputs.get(variable) {
            Some(terms) if !terms.is_empty() => terms,
            _ => return Ok(midpoint(min, max)),
        };

        let aggregated = Membership::max(terms.values().map(|out| out.membership().clone()));

        Ok(self.defuzzifier.defuzzify(&aggregated, min, max))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DefuzzificationOp::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rules)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
fn ac_engine(defuzzification: DefuzzificationOp) -> Engine {
    use crate::expr::Expr;

    let mut engine = Engine::new(defuzzification);

    engine
        .variables([
            Variable::new(
                "temperature",
                [
                    Term::new("cold", Membership::linear(-10., 10.).inverted()),
                    Term::new("comfortable", Membership::trapezoid(5., 18., 22., 25.)),
                    Term::new("hot", Membership::linear(20., 30.)),
                ],
            )
            .expect("temperature terms"),
            Variable::new(
                "ac_mode",
                [
                    Term::new("heating", Membership::linear(0., 100.)),
                    Term::new("off", Membership::triangular(-50., 0., 50.)),
                    Term::new("cooling", Membership::linear(-100., 0.).inverted()),
                ],
            )
            .expect("ac_mode terms"),
        ])
        .expect("distinct variables")
        .rules([
            Expr::is("temperature", "cold").then("ac_mode", "heating"),
            Expr::is("temperature", "comfortable").then("ac_mode", "off"),
            Expr::is("temperature", "hot").then("ac_mode", "cooling"),
        ]);

    engine
}

#[test]
fn test_hot_day() {
    let engine = ac_engine(DefuzzificationOp::centroid(100));
    let outputs = engine.infer(&Inputs::from_iter([("temperature", 30.)])).expect("inference");
    let best = outputs.best("ac_mode").expect("cooling fired");

    assert_eq!(best.term(), "cooling");
    assert_eq!(format!("{:.2}", best.truth_degree()), "1.00");

    let value = engine.defuzzify("ac_mode", &outputs).expect("defined variable");

    assert_eq!(format!("{value:.2}"), "-67.33");
}

#[test]
fn test_every_rule_produces_an_output() {
    let engine = ac_engine(DefuzzificationOp::default());
    let outputs = engine.infer(&Inputs::from_iter([("temperature", 30.)])).expect("inference");
    let degrees: Vec<(&str, f64)> = outputs
        .get("ac_mode")
        .expect("ac_mode concluded")
        .values()
        .map(|out| (out.term(), out.truth_degree()))
        .collect();

    assert_eq!(degrees, [("cooling", 1.), ("heating", 0.), ("off", 0.)]);
    assert_eq!(outputs.variables(), ["ac_mode"]);
}

#[test]
fn test_rules_on_same_term_aggregate_by_max() {
    use crate::expr::Expr;

    let mut engine = ac_engine(DefuzzificationOp::centroid(100));

    engine.rules([
        Expr::is("temperature", "comfortable").then("ac_mode", "off"),
        Expr::is("temperature", "hot").then("ac_mode", "off"),
    ]);

    // comfortable(23.5) = 0.5, hot(23.5) = 0.35
    let outputs = engine.infer(&Inputs::from_iter([("temperature", 23.5)])).expect("inference");
    let off = outputs.term("ac_mode", "off").expect("off concluded");

    assert_eq!(off.truth_degree(), 0.5);
    approx::assert_abs_diff_eq!(off.membership().value(0.), 0.5, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(off.membership().value(40.), 0.2, epsilon = 1e-12);
}

#[test]
fn test_defuzzify_without_outputs_is_midpoint() {
    let mut engine = ac_engine(DefuzzificationOp::centroid(100));

    engine.rules([]);

    let outputs = engine.infer(&Inputs::from_iter([("temperature", 30.)])).expect("inference");

    assert!(outputs.is_empty());
    assert_eq!(engine.defuzzify("ac_mode", &outputs).ok(), Some(0.));
    assert_eq!(engine.defuzzify("temperature", &outputs).ok(), Some(10.));
    assert!(matches!(
        engine.defuzzify("fan", &outputs),
        Err(FuzzyError::UndefinedVariable { name }) if name == "fan"
    ));
}

#[test]
fn test_missing_input_aborts() {
    let engine = ac_engine(DefuzzificationOp::default());
    let res = engine.infer(&Inputs::from_iter([("humidity", 30.)]));

    assert!(matches!(res, Err(FuzzyError::ValueNotFound { variable }) if variable == "temperature"));
}

#[test]
fn test_undefined_conclusion_aborts() {
    use crate::expr::Expr;

    let mut engine = ac_engine(DefuzzificationOp::default());

    engine.rules([
        Expr::is("temperature", "hot").then("ac_mode", "cooling"),
        Expr::is("temperature", "hot").then("ac_mode", "turbo"),
    ]);
    assert!(matches!(
        engine.infer(&Inputs::from_iter([("temperature", 30.)])),
        Err(FuzzyError::UndefinedTerm { term, .. }) if term == "turbo"
    ));

    engine.rules([Expr::is("temperature", "hot").then("fan", "fast")]);
    assert!(matches!(
        engine.infer(&Inputs::from_iter([("temperature", 30.)])),
        Err(FuzzyError::UndefinedVariable { name }) if name == "fan"
    ));

    engine.rules([Expr::is("pressure", "low").then("ac_mode", "off")]);
    assert!(matches!(
        engine.infer(&Inputs::from_iter([("temperature", 30.)])),
        Err(FuzzyError::UndefinedVariable { name }) if name == "pressure"
    ));
}

#[test]
fn test_duplicate_variables_rejected() {
    let mut engine = ac_engine(DefuzzificationOp::default());
    let dup = || Variable::new("fan", [Term::new("fast", Membership::linear(0., 1.))]).expect("single term");

    assert!(matches!(
        engine.variables([dup(), dup()]),
        Err(FuzzyError::VariableAlreadyExists { name }) if name == "fan"
    ));
    // The previous definitions survive the failed replacement
    assert!(engine.variable("temperature").is_ok());
}

#[test]
fn test_logical_premises() {
    use crate::expr::Expr;

    let mut engine = ac_engine(DefuzzificationOp::default());

    engine.rules([
        Expr::is("temperature", "cold")
            .or(Expr::is("temperature", "hot"))
            .then("ac_mode", "heating"),
        Expr::is("temperature", "comfortable")
            .and(Expr::is("temperature", "hot"))
            .then("ac_mode", "off"),
        Expr::is("temperature", "hot").not().then("ac_mode", "cooling"),
    ]);

    let outputs = engine.infer(&Inputs::from_iter([("temperature", 23.5)])).expect("inference");
    let degree = |term| outputs.term("ac_mode", term).map(TermOutput::truth_degree);

    approx::assert_abs_diff_eq!(degree("heating").unwrap_or_default(), 0.35, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(degree("off").unwrap_or_default(), 0.35, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(degree("cooling").unwrap_or_default(), 0.65, epsilon = 1e-12);
}

#[test]
fn test_from_config() {
    let config = EngineConfig {
        defuzzification: DefuzzificationOp::mean_of_maximum(100),
    };
    let reference = ac_engine(DefuzzificationOp::default());
    let mut engine = Engine::from_config(&config);

    engine
        .variables(reference.variable_list().cloned())
        .expect("distinct variables")
        .rules(reference.rule_list().cloned());

    // Only "off" fires, so the maximum sits on its peak
    let outputs = engine.infer(&Inputs::from_iter([("temperature", 20.)])).expect("inference");
    let value = engine.defuzzify("ac_mode", &outputs).expect("defined variable");

    approx::assert_abs_diff_eq!(value, 0., epsilon = 1e-9);
}

#[test]
fn test_closure_defuzzifier() {
    // Crisp value at the upper end of the support of the aggregated membership
    let support_max = |membership: &Membership, min: f64, max: f64| {
        let step = (max - min) / 200.;
        (0..=200)
            .map(|i| min + step * f64::from(i))
            .filter(|x| membership.value(*x) > 0.)
            .fold(min, f64::max)
    };
    let reference = ac_engine(DefuzzificationOp::default());
    let mut engine = Engine::new(support_max);

    engine
        .variables(reference.variable_list().cloned())
        .expect("distinct variables")
        .rules(reference.rule_list().cloned());

    // Only "cooling" fires, and it is zero from 0 upwards
    let outputs = engine.infer(&Inputs::from_iter([("temperature", 30.)])).expect("inference");
    let value = engine.defuzzify("ac_mode", &outputs).expect("defined variable");

    assert_eq!(value, -1.);
}

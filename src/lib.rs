//! Mamdani style fuzzy inference with a small textual rule language.
//!
//! ```
//! use fuzzy_dsl::{parse_rules_and_variables, DefuzzificationOp, Engine, Inputs};
//!
//! let parsed = parse_rules_and_variables(
//!     "DEFINE temperature (TERM cold INVERTED(LINEAR(-10, 10)), TERM hot LINEAR(20, 30));
//!      DEFINE ac_mode (TERM heating LINEAR(0, 100), TERM cooling INVERTED(LINEAR(-100, 0)));
//!      IF temperature IS cold THEN ac_mode IS heating;
//!      IF temperature IS hot THEN ac_mode IS cooling;",
//! )?;
//!
//! let mut engine = Engine::new(DefuzzificationOp::centroid(100));
//! engine.variables(parsed.variables)?.rules(parsed.rules);
//!
//! let mut inputs = Inputs::new();
//! inputs.add("temperature", 30.);
//!
//! let outputs = engine.infer(&inputs)?;
//!
//! assert_eq!(outputs.best("ac_mode").map(|best| best.term()), Some("cooling"));
//! assert!(engine.defuzzify("ac_mode", &outputs)? < 0.);
//! # Ok::<(), fuzzy_dsl::FuzzyError>(())
//! ```

mod config;
mod defuzzification;
pub mod dsl;
mod error;
mod expr;
mod inference;
mod inputs;
mod linspace;
mod math;
mod membership;
mod outputs;
mod rules;
mod variable;

pub use config::EngineConfig;
pub use defuzzification::{DefuzzificationOp, Defuzzifier, InvalidDefuzzification};
pub use dsl::{parse_rules, parse_rules_and_variables, parse_variables, ParseError, ParseErrors, ParseResult, Parser};
pub use error::{FuzzyError, Result};
pub use expr::{Expr, Is};
pub use inference::{Context, Engine};
pub use inputs::Inputs;
pub use membership::Membership;
pub use outputs::{Outputs, TermOutput};
pub use rules::{Rule, Rules};
pub use variable::{Term, Variable, VariableKey, Variables};

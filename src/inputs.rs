use std::collections::HashMap;

/// Crisp input values keyed by variable name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs(pub(crate) HashMap<String, f64>);

impl Inputs {
    pub fn new() -> Self {
        Inputs(HashMap::new())
    }

    pub fn add(&mut self, variable: impl Into<String>, value: f64) -> &mut Self {
        self.0.insert(variable.into(), value);
        self
    }

    pub fn get(&self, variable: &str) -> Option<f64> {
        self.0.get(variable).copied()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Inputs {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Inputs(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<HashMap<String, f64>> for Inputs {
    fn from(values: HashMap<String, f64>) -> Self {
        Inputs(values)
    }
}

#[test]
fn test_inputs() {
    let mut inputs = Inputs::new();

    inputs.add("temperature", 30.).add("humidity", 80.);

    assert_eq!(inputs.get("temperature"), Some(30.));
    assert_eq!(inputs.get("pressure"), None);
    assert_eq!(Inputs::from_iter([("humidity", 80.), ("temperature", 30.)]), inputs);
}

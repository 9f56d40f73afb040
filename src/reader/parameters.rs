use std::collections::HashMap;

use crate::sbml::document::{KineticLaw, Model, Parameter, UnitDefinition};

/// Value and declared units of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValue {
    /// Declared value, 0 when the parameter has none
    pub value: f64,
    pub units: Option<UnitDefinition>,
}

impl ParameterValue {
    fn of(model: &Model, parameter: &Parameter) -> Self {
        ParameterValue {
            value: parameter.value.unwrap_or(0.0),
            units: model.parameter_units(parameter),
        }
    }
}

/// Global parameters of a model, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterRegistry {
    globals: HashMap<String, ParameterValue>,
}

impl ParameterRegistry {
    pub fn from_model(model: &Model) -> Self {
        let globals = model
            .parameters
            .iter()
            .map(|parameter| (parameter.id.clone(), ParameterValue::of(model, parameter)))
            .collect();

        ParameterRegistry { globals }
    }

    pub fn global(&self, id: &str) -> Option<&ParameterValue> {
        self.globals.get(id)
    }

    /// Parameters visible inside a kinetic law: its local parameters shadow the globals.
    pub fn scope<'a>(&'a self, model: &Model, law: Option<&KineticLaw>) -> ParameterScope<'a> {
        let locals = law
            .map(|law| {
                law.parameters
                    .iter()
                    .map(|parameter| (parameter.id.clone(), ParameterValue::of(model, parameter)))
                    .collect()
            })
            .unwrap_or_default();

        ParameterScope {
            locals,
            globals: &self.globals,
        }
    }
}

/// Parameter lookup for one reaction.
#[derive(Debug)]
pub struct ParameterScope<'a> {
    locals: HashMap<String, ParameterValue>,
    globals: &'a HashMap<String, ParameterValue>,
}

impl ParameterScope<'_> {
    pub fn get(&self, id: &str) -> Option<&ParameterValue> {
        self.locals.get(id).or_else(|| self.globals.get(id))
    }
}

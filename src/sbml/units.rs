//! Conversion of SBML units into working units.
//!
//! Working units are cubic metres for volumes, particle counts for amounts of species that
//! only carry substance units, milli-molar for concentrations, and the matching compound
//! concentration units for rate constants.
//!
//! The conversion applied to a unit atom depends on its kind and on the context the value
//! is used in. The closed table is [`conversion`]; each entry turns one atom into a factor
//! `(multiplier * 10^scale')^exponent + offset`, optionally followed by an Avogadro step.

use crate::sbml::document::{Unit, UnitDefinition, UnitKind};

/// Avogadro's number, particles per mole
pub const AVOGADRO: f64 = 6.0221409e23;

/// Factor applied to concentrations whose unit is not declared
pub const DEFAULT_CONCENTRATION_SCALE: f64 = 1e-3;

/// What a converted value is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitContext {
    /// Compartment size
    Compartment,
    /// Initial value of a species; `amount_only` mirrors `hasOnlySubstanceUnits`
    Substance { amount_only: bool },
    /// Rate constant of a reaction
    Rate,
}

impl UnitContext {
    /// Factor used when the unit is not declared.
    pub fn default_factor(self) -> f64 {
        match self {
            UnitContext::Substance { amount_only: true } => AVOGADRO,
            UnitContext::Substance { amount_only: false } => DEFAULT_CONCENTRATION_SCALE,
            UnitContext::Compartment | UnitContext::Rate => 1.0,
        }
    }
}

/// Multiplicative factor derived from a unit definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    pub factor: f64,
    /// False when no usable unit was declared and `factor` is the context default
    pub is_set: bool,
}

impl UnitScale {
    fn unset(context: UnitContext) -> Self {
        UnitScale {
            factor: context.default_factor(),
            is_set: false,
        }
    }
}

/// Conversion step applied to a single unit atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `(multiplier * 10^scale)^exponent + offset`
    Generic,
    /// Generic formula with the decimal scale shifted
    Shift(i32),
    /// Generic formula, then moles to particles
    TimesAvogadro,
    /// Generic formula, then particles to moles
    PerAvogadro,
}

impl Conversion {
    pub fn apply(self, unit: &Unit) -> f64 {
        let generic =
            |scale: i32| (unit.multiplier * 10f64.powi(scale)).powf(unit.exponent) + unit.offset;

        match self {
            Conversion::Generic => generic(unit.scale),
            Conversion::Shift(shift) => generic(unit.scale + shift),
            Conversion::TimesAvogadro => generic(unit.scale) * AVOGADRO,
            Conversion::PerAvogadro => generic(unit.scale) / AVOGADRO,
        }
    }
}

/// The unit-kind by context table.
///
/// | kind \ context | compartment | amount only    | concentration  | rate     |
/// |----------------|-------------|----------------|----------------|----------|
/// | litre          | scale − 3   | generic        | generic        | generic  |
/// | mole           | generic     | × Avogadro     | scale + 3      | scale + 3|
/// | item           | generic     | generic        | ÷ Avogadro     | generic  |
/// | other          | generic     | generic        | generic        | generic  |
pub fn conversion(kind: &UnitKind, context: UnitContext) -> Conversion {
    match (kind, context) {
        (UnitKind::Litre, UnitContext::Compartment) => Conversion::Shift(-3),
        (UnitKind::Mole, UnitContext::Substance { amount_only: true }) => Conversion::TimesAvogadro,
        (UnitKind::Mole, UnitContext::Substance { amount_only: false })
        | (UnitKind::Mole, UnitContext::Rate) => Conversion::Shift(3),
        (UnitKind::Item, UnitContext::Substance { amount_only: false }) => Conversion::PerAvogadro,
        _ => Conversion::Generic,
    }
}

/// Derives the working-unit factor of a unit definition in the given context.
///
/// Compartment and substance contexts use the first litre, mole or item atom of the
/// definition. The rate context multiplies the contributions of all atoms. Without a
/// definition, without atoms, or without a usable atom, the context default is returned
/// with `is_set == false`.
///
/// # Arguments
/// * `definition` - The declared unit, if any
/// * `context` - What the converted value is used for
///
/// # Returns
/// The factor and whether it was derived from a declared unit
pub fn resolve(definition: Option<&UnitDefinition>, context: UnitContext) -> UnitScale {
    let Some(definition) = definition.filter(|definition| !definition.units.is_empty()) else {
        return UnitScale::unset(context);
    };

    match context {
        UnitContext::Rate => UnitScale {
            factor: definition
                .units
                .iter()
                .map(|unit| conversion(&unit.kind, context).apply(unit))
                .product(),
            is_set: true,
        },
        UnitContext::Compartment | UnitContext::Substance { .. } => definition
            .units
            .iter()
            .find(|unit| matches!(unit.kind, UnitKind::Litre | UnitKind::Mole | UnitKind::Item))
            .map(|unit| UnitScale {
                factor: conversion(&unit.kind, context).apply(unit),
                is_set: true,
            })
            .unwrap_or(UnitScale::unset(context)),
    }
}

/// Scale of the model's `substance` definition: its mole atom through the generic formula.
///
/// Used as the base of the order correction for rate constants without declared units.
pub fn substance_scale(substance: Option<&UnitDefinition>) -> f64 {
    substance
        .and_then(|definition| {
            definition
                .units
                .iter()
                .find(|unit| unit.kind == UnitKind::Mole)
        })
        .map(|unit| Conversion::Generic.apply(unit))
        .unwrap_or(1.0)
}

/// Factor for a rate constant.
///
/// A constant with declared units is converted through the rate context. A constant without
/// units belonging to a reaction of order `order > 1` carries compound concentration units
/// and is corrected by `(substance_scale * 1000)^(1 - order)`.
///
/// # Arguments
/// * `units` - Declared units of the parameter, if any
/// * `order` - Number of participants on the side the constant belongs to
/// * `substance_scale` - Result of [`substance_scale`] for the model
pub fn rate_scale(units: Option<&UnitDefinition>, order: f64, substance_scale: f64) -> UnitScale {
    let declared = resolve(units, UnitContext::Rate);
    if declared.is_set {
        return declared;
    }

    if order > 1.0 {
        UnitScale {
            factor: (substance_scale * 1000.0).powf(1.0 - order),
            is_set: false,
        }
    } else {
        declared
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn unit(kind: UnitKind, scale: i32) -> Unit {
        Unit {
            scale,
            ..Unit::of_kind(kind)
        }
    }

    fn definition(units: Vec<Unit>) -> UnitDefinition {
        UnitDefinition {
            id: "u".to_string(),
            name: None,
            units,
        }
    }

    const CONTEXTS: [UnitContext; 4] = [
        UnitContext::Compartment,
        UnitContext::Substance { amount_only: true },
        UnitContext::Substance { amount_only: false },
        UnitContext::Rate,
    ];

    #[test]
    fn test_zero_atoms_return_context_default() {
        let empty = definition(vec![]);
        let expected = [1.0, AVOGADRO, 1e-3, 1.0];

        for (context, expected) in CONTEXTS.into_iter().zip(expected) {
            let scale = resolve(Some(&empty), context);
            assert!(!scale.is_set, "{context:?}");
            assert_eq!(scale.factor, expected, "{context:?}");

            let missing = resolve(None, context);
            assert_eq!(missing, scale, "{context:?}");
        }
    }

    #[test]
    fn test_conversion_table_is_exhaustive() {
        let kinds = [
            UnitKind::Litre,
            UnitKind::Mole,
            UnitKind::Item,
            UnitKind::Other("second".to_string()),
        ];
        let expected = [
            // compartment, amount only, concentration, rate
            [Conversion::Shift(-3), Conversion::Generic, Conversion::Generic, Conversion::Generic],
            [Conversion::Generic, Conversion::TimesAvogadro, Conversion::Shift(3), Conversion::Shift(3)],
            [Conversion::Generic, Conversion::Generic, Conversion::PerAvogadro, Conversion::Generic],
            [Conversion::Generic, Conversion::Generic, Conversion::Generic, Conversion::Generic],
        ];

        for (kind, row) in kinds.iter().zip(expected) {
            for (context, expected) in CONTEXTS.into_iter().zip(row) {
                assert_eq!(conversion(kind, context), expected, "{kind:?} {context:?}");
            }
        }
    }

    #[test]
    fn test_litre_volume_to_cubic_metre() {
        let litre = definition(vec![unit(UnitKind::Litre, 0)]);
        let scale = resolve(Some(&litre), UnitContext::Compartment);
        assert!(scale.is_set);
        assert_relative_eq!(scale.factor, 1e-3);
    }

    #[test]
    fn test_substance_conversions() {
        let millimole = definition(vec![unit(UnitKind::Mole, -3)]);

        let amount = resolve(Some(&millimole), UnitContext::Substance { amount_only: true });
        assert_relative_eq!(amount.factor, 1e-3 * AVOGADRO, max_relative = 1e-12);

        let concentration = resolve(Some(&millimole), UnitContext::Substance { amount_only: false });
        assert_relative_eq!(concentration.factor, 1.0);

        let items = definition(vec![unit(UnitKind::Item, 0)]);
        let per_volume = resolve(Some(&items), UnitContext::Substance { amount_only: false });
        assert_relative_eq!(per_volume.factor, 1.0 / AVOGADRO, max_relative = 1e-12);
    }

    #[test]
    fn test_first_relevant_atom_wins_outside_rate_context() {
        let mixed = definition(vec![
            unit(UnitKind::Other("second".to_string()), 2),
            unit(UnitKind::Litre, -3),
            unit(UnitKind::Mole, 0),
        ]);

        let scale = resolve(Some(&mixed), UnitContext::Compartment);
        assert_relative_eq!(scale.factor, 1e-6);
    }

    #[test]
    fn test_only_unrelated_atoms_count_as_unset() {
        let seconds = definition(vec![unit(UnitKind::Other("second".to_string()), 0)]);
        let scale = resolve(Some(&seconds), UnitContext::Substance { amount_only: false });
        assert!(!scale.is_set);
        assert_eq!(scale.factor, DEFAULT_CONCENTRATION_SCALE);
    }

    #[test]
    fn test_rate_context_multiplies_all_atoms() {
        // per millimolar per second
        let rate = definition(vec![
            Unit {
                exponent: -1.0,
                ..unit(UnitKind::Mole, -3)
            },
            unit(UnitKind::Litre, 0),
            Unit {
                exponent: -1.0,
                ..unit(UnitKind::Other("second".to_string()), 0)
            },
        ]);

        let scale = rate_scale(Some(&rate), 2.0, 1.0);
        assert!(scale.is_set);
        assert_relative_eq!(scale.factor, 1.0);
    }

    #[test]
    fn test_rate_order_correction_without_units() {
        assert_eq!(rate_scale(None, 1.0, 1.0).factor, 1.0);
        assert_relative_eq!(rate_scale(None, 2.0, 1.0).factor, 1e-3);
        assert_relative_eq!(rate_scale(None, 3.0, 1e-3).factor, 1.0);
    }

    #[test]
    fn test_substance_scale_reads_mole_atom() {
        let substance = definition(vec![unit(UnitKind::Mole, -6)]);
        assert_relative_eq!(substance_scale(Some(&substance)), 1e-6);
        assert_eq!(substance_scale(None), 1.0);
    }
}

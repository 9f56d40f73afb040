#[cfg(test)]
mod test_translation {
    use std::path::PathBuf;

    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use sbml_chemnet::prelude::{
        read_sbml, read_sbml_str, ElementKind, NetworkSummary, PoolInit, ReadOptions,
        ReadOptionsBuilder, Reaction, SBMLError, AVOGADRO,
    };

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("data")
            .join(name)
    }

    /// One compartment, an amount-only species of 1000 mol converting into a species
    /// starting at zero concentration.
    #[test]
    fn test_conversion_scenario() {
        // ACT
        let translation = read_sbml(fixture("scenario.xml"), &ReadOptions::default()).unwrap();
        let network = &translation.network;

        // ASSERT
        assert_eq!(
            network.summary(translation.root),
            NetworkSummary {
                compartments: 1,
                pools: 2,
                reactions: 1,
                tables: 2,
                ..Default::default()
            }
        );

        let cell = translation.lookup("cell").unwrap();
        assert_relative_eq!(network.compartment(cell).unwrap().volume, 1e-15);

        let s1 = translation.lookup("cell/S1").unwrap();
        match network.pool(s1).unwrap().init {
            PoolInit::Count(n) => assert_relative_eq!(n, 1000.0 * AVOGADRO, max_relative = 1e-12),
            other => panic!("unexpected initial value {other:?}"),
        }
        let s2 = translation.lookup("cell/S2").unwrap();
        assert_eq!(network.pool(s2).unwrap().init, PoolInit::Concentration(0.0));

        let convert = translation.lookup("cell/convert").unwrap();
        let Reaction::Plain(reac) = network.reaction(convert).unwrap() else {
            panic!("expected a plain reaction");
        };
        assert_relative_eq!(reac.kf, 0.1);
        assert_relative_eq!(reac.kb, 0.0);
        assert_eq!(reac.substrates, vec![s1]);
        assert_eq!(reac.products, vec![s2]);
    }

    #[test]
    fn test_model_annotation_on_root() {
        let translation = read_sbml(fixture("scenario.xml"), &ReadOptions::default()).unwrap();

        let root = translation.network.get(translation.root).unwrap();
        assert_eq!(translation.root_path(), "/model");
        assert_eq!(root.info.model_type.as_deref(), Some("xml"));
        assert_eq!(root.info.solver.as_deref(), Some("gsl"));
        assert_eq!(root.info.run_time, Some(100.0));
        assert!(translation.lookup("data/graph_0/_cell_S1.conc").is_some());
        assert!(translation.lookup("data/graph_0/_cell_S2.conc").is_some());
    }

    #[test]
    fn test_load_path_is_normalized() {
        let options = ReadOptionsBuilder::default()
            .load_path("kinetics/cell_model")
            .build()
            .unwrap();

        let translation = read_sbml(fixture("scenario.xml"), &options).unwrap();

        assert_eq!(translation.root_path(), "/cell_model");
        assert!(translation.network.exists("/cell_model/cell/S1"));
    }

    /// Rate constants declared in milli-molar consistent units pass through unchanged.
    #[test]
    fn test_rate_constants_in_consistent_units_round_trip() {
        let xml = r#"<sbml level="3" version="1"><model id="m">
          <listOfUnitDefinitions>
            <unitDefinition id="per_mM_per_s"><listOfUnits>
              <unit kind="litre" exponent="1" scale="0" multiplier="1"/>
              <unit kind="mole" exponent="-1" scale="-3" multiplier="1"/>
              <unit kind="second" exponent="-1" scale="0" multiplier="1"/>
            </listOfUnits></unitDefinition>
            <unitDefinition id="per_s"><listOfUnits>
              <unit kind="second" exponent="-1" scale="0" multiplier="1"/>
            </listOfUnits></unitDefinition>
          </listOfUnitDefinitions>
          <listOfCompartments><compartment id="cyt" size="1e-15"/></listOfCompartments>
          <listOfSpecies>
            <species id="A" compartment="cyt" initialConcentration="1"/>
            <species id="B" compartment="cyt" initialConcentration="1"/>
            <species id="C" compartment="cyt" initialConcentration="0"/>
          </listOfSpecies>
          <listOfParameters>
            <parameter id="Kf" value="0.75" units="per_mM_per_s"/>
            <parameter id="Kb" value="0.125" units="per_s"/>
          </listOfParameters>
          <listOfReactions>
            <reaction id="bind">
              <listOfReactants>
                <speciesReference species="A"/>
                <speciesReference species="B"/>
              </listOfReactants>
              <listOfProducts><speciesReference species="C"/></listOfProducts>
              <kineticLaw><math xmlns="http://www.w3.org/1998/Math/MathML">
                <apply><minus/>
                  <apply><times/><ci>Kf</ci><ci>A</ci><ci>B</ci></apply>
                  <apply><times/><ci>Kb</ci><ci>C</ci></apply>
                </apply>
              </math></kineticLaw>
            </reaction>
          </listOfReactions>
        </model></sbml>"#;

        let translation = read_sbml_str(xml, &ReadOptions::default()).unwrap();

        let bind = translation.lookup("cyt/bind").unwrap();
        let Reaction::Plain(reac) = translation.network.reaction(bind).unwrap() else {
            panic!("expected a plain reaction");
        };
        assert_relative_eq!(reac.kf, 0.75);
        assert_relative_eq!(reac.kb, 0.125);
    }

    /// Kb declared per molar and second is converted to milli-molar like Kf would be.
    #[test]
    fn test_declared_backward_units_are_converted() {
        let xml = r#"<sbml level="3" version="1"><model id="m">
          <listOfUnitDefinitions>
            <unitDefinition id="per_M_per_s"><listOfUnits>
              <unit kind="litre" exponent="1" scale="0" multiplier="1"/>
              <unit kind="mole" exponent="-1" scale="0" multiplier="1"/>
              <unit kind="second" exponent="-1" scale="0" multiplier="1"/>
            </listOfUnits></unitDefinition>
          </listOfUnitDefinitions>
          <listOfCompartments><compartment id="cyt" size="1e-15"/></listOfCompartments>
          <listOfSpecies>
            <species id="C" compartment="cyt" initialConcentration="1"/>
            <species id="A" compartment="cyt" initialConcentration="0"/>
            <species id="B" compartment="cyt" initialConcentration="0"/>
          </listOfSpecies>
          <listOfParameters>
            <parameter id="Kf" value="0.5" units="second"/>
            <parameter id="Kb" value="2" units="per_M_per_s"/>
          </listOfParameters>
          <listOfReactions>
            <reaction id="split">
              <listOfReactants><speciesReference species="C"/></listOfReactants>
              <listOfProducts>
                <speciesReference species="A"/>
                <speciesReference species="B"/>
              </listOfProducts>
              <kineticLaw><math xmlns="http://www.w3.org/1998/Math/MathML">
                <apply><minus/>
                  <apply><times/><ci>Kf</ci><ci>C</ci></apply>
                  <apply><times/><ci>Kb</ci><ci>A</ci><ci>B</ci></apply>
                </apply>
              </math></kineticLaw>
            </reaction>
          </listOfReactions>
        </model></sbml>"#;

        let translation = read_sbml_str(xml, &ReadOptions::default()).unwrap();

        let split = translation.lookup("cyt/split").unwrap();
        let Reaction::Plain(reac) = translation.network.reaction(split).unwrap() else {
            panic!("expected a plain reaction");
        };
        assert_relative_eq!(reac.kf, 0.5);
        assert_relative_eq!(reac.kb, 2.0e-3);
    }

    /// A single reactant with stoichiometry 2 keeps a unitless Kf as it is.
    #[test]
    fn test_unitless_rate_of_dimerization_is_not_rescaled() {
        let xml = r#"<sbml level="3" version="1"><model id="m">
          <listOfCompartments><compartment id="cyt" size="1e-15"/></listOfCompartments>
          <listOfSpecies>
            <species id="A" compartment="cyt" initialConcentration="1"/>
            <species id="B" compartment="cyt" initialConcentration="0"/>
          </listOfSpecies>
          <listOfReactions>
            <reaction id="dimerize" reversible="false">
              <listOfReactants><speciesReference species="A" stoichiometry="2"/></listOfReactants>
              <listOfProducts><speciesReference species="B"/></listOfProducts>
              <kineticLaw>
                <math xmlns="http://www.w3.org/1998/Math/MathML">
                  <apply><times/><ci>k</ci><ci>A</ci><ci>A</ci></apply>
                </math>
                <listOfLocalParameters><localParameter id="k" value="1"/></listOfLocalParameters>
              </kineticLaw>
            </reaction>
          </listOfReactions>
        </model></sbml>"#;

        let translation = read_sbml_str(xml, &ReadOptions::default()).unwrap();

        let a = translation.lookup("cyt/A").unwrap();
        let dimerize = translation.lookup("cyt/dimerize").unwrap();
        let Reaction::Plain(reac) = translation.network.reaction(dimerize).unwrap() else {
            panic!("expected a plain reaction");
        };
        assert_relative_eq!(reac.kf, 1.0);
        assert_relative_eq!(reac.kb, 0.0);
        assert_eq!(reac.substrates, vec![a, a]);
    }

    #[test]
    fn test_amount_in_sized_compartment_uses_default_concentration_scale() {
        let xml = r#"<sbml level="3" version="1"><model id="m">
          <listOfCompartments><compartment id="cyt" size="2.0"/></listOfCompartments>
          <listOfSpecies>
            <species id="A" compartment="cyt" initialAmount="1.0" hasOnlySubstanceUnits="false"/>
          </listOfSpecies>
        </model></sbml>"#;

        let translation = read_sbml_str(xml, &ReadOptions::default()).unwrap();

        let a = translation.lookup("cyt/A").unwrap();
        match translation.network.pool(a).unwrap().init {
            PoolInit::Concentration(conc) => assert_relative_eq!(conc, 1.0 / 2.0 * 1e-3),
            other => panic!("unexpected initial value {other:?}"),
        }
        assert!(translation.diagnostics.mentions("At least one reaction"));
    }

    #[test]
    fn test_enzyme_is_materialized_only_with_both_stages() {
        let translation = read_sbml(fixture("enzyme.xml"), &ReadOptions::default()).unwrap();
        let network = &translation.network;

        let summary = network.summary(translation.root);
        assert_eq!(summary.enzymes, 1);
        assert_eq!(summary.reactions, 0);

        let enzyme = translation.lookup("cyt/E").unwrap();
        let enz = translation.lookup("cyt/E/E_enz").unwrap();
        let complex = translation.lookup("cyt/E/E_enz/E_S_cplx").unwrap();
        let element = network.get(enz).unwrap();
        assert_eq!(element.info.x, Some(12.0));
        assert_eq!(element.info.y, Some(34.0));

        let ElementKind::Reaction(Reaction::Enzyme(payload)) = &element.kind else {
            panic!("expected an enzyme");
        };
        assert_eq!(payload.enzyme, enzyme);
        assert_eq!(payload.complex, complex);
        assert_eq!(payload.substrates, vec![translation.lookup("cyt/S").unwrap()]);
        assert_eq!(payload.products, vec![translation.lookup("cyt/P").unwrap()]);
        assert_relative_eq!(payload.conc_k1, 0.5);
        assert_relative_eq!(payload.k2, 4.0);
        assert_relative_eq!(payload.k3, 0.1);
        assert_relative_eq!(payload.ratio, 4.0);

        // The original complex is replaced by the copy below the enzyme
        assert!(translation.lookup("cyt/E_S_cplx").is_none());

        // A group stuck at stage 1 produces nothing and keeps its complex in place
        assert!(translation.lookup("cyt/F/F_enz").is_none());
        assert!(translation.lookup("cyt/F_S_cplx").is_some());
        assert!(translation.diagnostics.mentions("F_enz"));
    }

    #[test]
    fn test_translation_is_idempotent() {
        let first = read_sbml(fixture("enzyme.xml"), &ReadOptions::default()).unwrap();
        let second = read_sbml(fixture("enzyme.xml"), &ReadOptions::default()).unwrap();

        assert_eq!(
            first.network.outline(first.root),
            second.network.outline(second.root)
        );
        assert_eq!(
            first.network.summary(first.root),
            second.network.summary(second.root)
        );
    }

    #[test]
    fn test_reaction_without_reactants_is_skipped() {
        let xml = r#"<sbml level="3" version="1"><model id="m">
          <listOfCompartments><compartment id="cyt" size="1e-15"/></listOfCompartments>
          <listOfSpecies>
            <species id="A" compartment="cyt" initialConcentration="1"/>
            <species id="B" compartment="cyt" initialConcentration="0"/>
          </listOfSpecies>
          <listOfReactions>
            <reaction id="r0" name="synthesis">
              <listOfProducts><speciesReference species="A"/></listOfProducts>
            </reaction>
            <reaction id="r1" name="decay">
              <listOfReactants><speciesReference species="A"/></listOfReactants>
              <listOfProducts><speciesReference species="B"/></listOfProducts>
            </reaction>
          </listOfReactions>
        </model></sbml>"#;

        let translation = read_sbml_str(xml, &ReadOptions::default()).unwrap();

        assert!(translation.diagnostics.mentions("synthesis"));
        assert!(translation.lookup("cyt/synthesis").is_none());
        assert!(translation.lookup("cyt/decay").is_some());
        assert!(!translation.diagnostics.mentions("At least one reaction"));
    }

    #[test]
    fn test_endo_mesh_without_surround_is_fatal() {
        let failure =
            read_sbml(fixture("endo_missing.xml"), &ReadOptions::default()).unwrap_err();

        assert!(matches!(
            failure.error,
            SBMLError::MissingSurround { ref compartment, ref surround }
                if compartment == "ER" && surround == "soma"
        ));
        assert!(failure.diagnostics.mentions("ER"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        let failure =
            read_sbml(dir.path().join("absent.xml"), &ReadOptions::default()).unwrap_err();

        assert!(matches!(failure.error, SBMLError::ReadError(_)));
        assert!(failure.diagnostics.is_empty());
    }

    #[test]
    fn test_inconsistent_document_is_not_translated() {
        let xml = r#"<sbml level="3" version="1"><model id="m">
          <listOfCompartments><compartment id="cyt" size="1e-15"/></listOfCompartments>
          <listOfSpecies>
            <species id="A" compartment="cyt" initialConcentration="1"/>
          </listOfSpecies>
          <listOfParameters><parameter id="A" value="2"/></listOfParameters>
        </model></sbml>"#;

        let failure = read_sbml_str(xml, &ReadOptions::default()).unwrap_err();
        assert!(matches!(failure.error, SBMLError::Validation(_)));

        let unchecked = ReadOptionsBuilder::default().validate(false).build().unwrap();
        assert!(read_sbml_str(xml, &unchecked).is_ok());
    }
}

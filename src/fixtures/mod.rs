//! Fixtures

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    config::{ConfigError, PricingPolicy},
    fixtures::scenarios::{Scenario, ScenariosFixture},
    pricing::PricingInput,
};

pub mod scenarios;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid policy, price or percentage
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Price in another currency than the policy's
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Scenario not found
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),
}

/// Loads scenario sets from a fixture directory.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,
}

impl Fixture {
    /// Fixture loader rooted at `./fixtures`
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Fixture loader with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Load `scenarios/{name}.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a
    /// scenario is invalid.
    pub fn load_scenarios(&self, name: &str) -> Result<ScenarioSet, FixtureError> {
        let file_path = self.base_path.join("scenarios").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        ScenarioSet::from_yaml(&contents)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A pricing policy and the bookings priced under it.
#[derive(Debug, Clone)]
pub struct ScenarioSet {
    policy: PricingPolicy,
    scenarios: FxHashMap<String, Scenario>,
}

impl ScenarioSet {
    /// Load a scenario set from the default fixture directory
    ///
    /// # Errors
    ///
    /// Returns an error if the set cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Fixture::new().load_scenarios(name)
    }

    /// Parse a scenario set from YAML
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a scenario is invalid.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        let fixture: ScenariosFixture = serde_norway::from_str(contents)?;
        let policy = PricingPolicy::try_from(fixture.policy)?;

        let scenarios = fixture
            .scenarios
            .into_iter()
            .map(|(name, scenario)| {
                scenario
                    .into_scenario(policy.currency)
                    .map(|scenario| (name, scenario))
            })
            .collect::<Result<FxHashMap<_, _>, FixtureError>>()?;

        Ok(Self { policy, scenarios })
    }

    /// Policy shared by every scenario
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Scenario names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scenarios.keys().map(String::as_str).collect();

        names.sort_unstable();

        names
    }

    /// Get a scenario by name
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario is not found.
    pub fn scenario(&self, name: &str) -> Result<&Scenario, FixtureError> {
        self.scenarios
            .get(name)
            .ok_or_else(|| FixtureError::ScenarioNotFound(name.to_string()))
    }

    /// Number of scenarios
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the set has no scenarios
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl Scenario {
    /// Composer input for this scenario
    pub fn input(&self) -> PricingInput<'_, 'static> {
        PricingInput::new(&self.quote, self.rates)
            .round_trip(self.round_trip)
            .with_code(self.code.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::CLP};
    use testresult::TestResult;

    use super::*;
    use crate::{
        codes::CodeDiscount,
        pricing::PricingComposer,
        rates::{fraction, percent},
    };

    const SET: &str = r#"
policy:
  max_combined_discount: 75%
  deposit: 40%
  currency: CLP

scenarios:
  online:
    base_price: 100000 CLP
    rates:
      base: 10%
      promotion: 5%
    expect:
      combined: 15%
      total: 85000 CLP
      deposit: 34000 CLP

  fixed_code:
    base_price: 100000 CLP
    round_trip: true
    rates:
      round_trip: "0.15"
    code:
      code: diezmil
      type: fixed_amount
      value: 10000 CLP
      expires_on: "2026-12-31"

  pending:
    vehicle: Consultar disponibilidad
    expect:
      available: false
"#;

    #[test]
    fn from_yaml_builds_scenarios() -> TestResult {
        let set = ScenarioSet::from_yaml(SET)?;

        assert_eq!(set.names(), vec!["fixed_code", "online", "pending"]);
        assert_eq!(fraction(set.policy().deposit_fraction), Decimal::new(4, 1));

        let online = set.scenario("online")?;

        assert_eq!(online.quote.base_price(), Some(Money::from_minor(100_000, CLP)));
        assert_eq!(online.rates.promotion, percent(5));

        let expect = online.expect.as_ref().ok_or("Expected an expectation")?;

        assert_eq!(expect.combined_percentage, Some(Decimal::from(15)));
        assert_eq!(expect.total, Some(Money::from_minor(85_000, CLP)));

        Ok(())
    }

    #[test]
    fn from_yaml_parses_codes() -> TestResult {
        let set = ScenarioSet::from_yaml(SET)?;
        let scenario = set.scenario("fixed_code")?;
        let code = scenario.code.as_ref().ok_or("Expected a code")?;

        assert_eq!(code.code(), "DIEZMIL");
        assert_eq!(
            code.discount(),
            CodeDiscount::FixedAmount(Money::from_minor(10_000, CLP))
        );
        assert!(code.expires_on().is_some());
        assert!(scenario.round_trip);

        Ok(())
    }

    #[test]
    fn scenario_input_composes() -> TestResult {
        let set = ScenarioSet::from_yaml(SET)?;
        let composer = PricingComposer::new(*set.policy());

        let fixed = composer.compose(&set.scenario("fixed_code")?.input())?;
        let pending = composer.compose(&set.scenario("pending")?.input())?;

        assert_eq!(fixed.total(), Some(Money::from_minor(75_000, CLP)));
        assert!(!pending.is_available());

        Ok(())
    }

    #[test]
    fn missing_scenario_returns_error() -> TestResult {
        let set = ScenarioSet::from_yaml(SET)?;

        assert!(matches!(
            set.scenario("missing"),
            Err(FixtureError::ScenarioNotFound(name)) if name == "missing"
        ));

        Ok(())
    }

    #[test]
    fn price_in_other_currency_is_rejected() {
        let yaml = "scenarios:\n  usd:\n    base_price: 12.50 USD\n";

        assert!(matches!(
            ScenarioSet::from_yaml(yaml),
            Err(FixtureError::CurrencyMismatch(expected, found)) if expected == "CLP" && found == "USD"
        ));
    }

    #[test]
    fn invalid_percentage_is_rejected() {
        let yaml = "scenarios:\n  bad:\n    base_price: 1000 CLP\n    rates:\n      base: diez\n";

        assert!(matches!(
            ScenarioSet::from_yaml(yaml),
            Err(FixtureError::Config(ConfigError::InvalidPercentage(_)))
        ));
    }

    #[test]
    fn load_scenarios_reads_from_base_path() -> TestResult {
        let dir = tempfile::tempdir()?;
        let scenarios = dir.path().join("scenarios");

        fs::create_dir_all(&scenarios)?;
        fs::write(scenarios.join("custom.yml"), SET)?;

        let set = Fixture::with_base_path(dir.path()).load_scenarios("custom")?;

        assert_eq!(set.len(), 3);

        Ok(())
    }

    #[test]
    fn load_scenarios_missing_file_returns_io_error() -> TestResult {
        let dir = tempfile::tempdir()?;
        let result = Fixture::with_base_path(dir.path()).load_scenarios("absent");

        assert!(matches!(result, Err(FixtureError::Io(_))));

        Ok(())
    }
}

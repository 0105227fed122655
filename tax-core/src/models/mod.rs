mod loan_terms;
mod personal_profile;
mod property;
mod relationship_status;
mod repayment_tier;
mod scenario_state;
mod tax_bracket;
mod tax_year;
mod tax_year_config;

pub use loan_terms::{LoanTerms, LoanType};
pub use personal_profile::{PersonalProfile, PrimaryResidence};
pub use property::{
    NewProperty, Property, PropertyExpenses, PropertyId, RentalIncome, WEEKS_PER_YEAR,
};
pub use relationship_status::RelationshipStatus;
pub use repayment_tier::RepaymentTier;
pub use scenario_state::{ScenarioError, ScenarioState};
pub use tax_bracket::TaxBracket;
pub use tax_year::{ParseTaxYearError, TaxYear};
pub use tax_year_config::{
    CONTINUITY_TOLERANCE, ConfigError, LowIncomeOffsetConfig, MedicareLevyConfig,
    SurchargeConfig, SurchargeRates, SurchargeThresholds, TaxYearConfig,
};

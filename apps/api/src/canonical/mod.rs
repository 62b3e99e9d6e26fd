//! Canonical field schema — the closed set of field meanings the pipeline understands.
//!
//! The table is static and process-wide. Every key maps to at most one structured
//! source (`profile.<attr>` or `preferences.<attr>`) and carries a sensitivity flag.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// One semantic type of form field. `Unknown` is the sentinel for "no mapping".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalKey {
    // Sensitive identifiers
    Ssn,
    DateOfBirth,
    // Demographic / protected class
    RaceEthnicity,
    Gender,
    SexualOrientation,
    DisabilityStatus,
    VeteranStatus,
    CriminalHistory,
    // Contact
    Email,
    Phone,
    // Online presence
    LinkedinUrl,
    GithubUrl,
    PortfolioUrl,
    // Name parts
    FirstName,
    MiddleName,
    LastName,
    PreferredName,
    FullName,
    // Location
    PostalCode,
    City,
    State,
    Country,
    CurrentLocation,
    // Work authorization / relocation
    NeedSponsorship,
    WorkAuthUs,
    WorkAuthCountry,
    WillingToRelocate,
    PreferredLocation,
    OnSiteOk,
    HybridOk,
    TravelPercentMax,
    // Timing / compensation
    NoticePeriod,
    EarliestStartDate,
    HourlyRate,
    SalaryExpectation,
    // Employment
    CurrentCompany,
    CurrentTitle,
    YearsRelevant,
    YearsTotal,
    // Education
    Gpa,
    EducationLevel,
    FieldOfStudy,
    Institution,
    GraduationYear,
    // Long free text
    CoverLetter,
    WhyInterested,
    AdditionalInfo,
    Unknown,
}

impl CanonicalKey {
    pub fn as_str(&self) -> &'static str {
        canonical_field(*self).name
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a canonical key's value lives in the candidate's stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Profile(&'static str),
    Preferences(&'static str),
    None,
}

impl FieldSource {
    pub fn is_none(&self) -> bool {
        matches!(self, FieldSource::None)
    }
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::Profile(attr) => write!(f, "profile.{attr}"),
            FieldSource::Preferences(attr) => write!(f, "preferences.{attr}"),
            FieldSource::None => f.write_str("none"),
        }
    }
}

impl Serialize for FieldSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CanonicalField {
    pub key: CanonicalKey,
    /// Wire name of the key, e.g. `WORK_AUTH_US`.
    pub name: &'static str,
    pub description: &'static str,
    pub source: FieldSource,
    pub sensitive: bool,
}

impl CanonicalField {
    /// Text embedded for nearest-neighbour classification.
    pub fn embedding_text(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

const fn field(
    key: CanonicalKey,
    name: &'static str,
    description: &'static str,
    source: FieldSource,
    sensitive: bool,
) -> CanonicalField {
    CanonicalField {
        key,
        name,
        description,
        source,
        sensitive,
    }
}

use CanonicalKey as K;
use FieldSource::{None as NoSource, Preferences as Pref, Profile as Prof};

pub static CANONICAL_FIELDS: &[CanonicalField] = &[
    field(K::Ssn, "SSN", "A government-issued national identifier such as a US Social Security Number.", NoSource, true),
    field(K::DateOfBirth, "DATE_OF_BIRTH", "The candidate's date of birth.", Prof("dateOfBirth"), true),
    field(K::RaceEthnicity, "RACE_ETHNICITY", "Self-identified race or ethnicity for equal opportunity reporting.", Prof("raceEthnicity"), true),
    field(K::Gender, "GENDER", "Self-identified gender for equal opportunity reporting.", Prof("gender"), true),
    field(K::SexualOrientation, "SEXUAL_ORIENTATION", "Self-identified sexual orientation.", Prof("sexualOrientation"), true),
    field(K::DisabilityStatus, "DISABILITY_STATUS", "Whether the candidate has a disability, for voluntary self-identification.", Prof("disabilityStatus"), true),
    field(K::VeteranStatus, "VETERAN_STATUS", "Whether the candidate is a protected veteran.", Prof("veteranStatus"), true),
    field(K::CriminalHistory, "CRIMINAL_HISTORY", "Questions about criminal convictions or background.", Prof("criminalHistory"), true),
    field(K::Email, "EMAIL", "The candidate's primary email address.", Prof("email"), false),
    field(K::Phone, "PHONE", "The candidate's main phone or mobile number.", Prof("phoneMobile"), false),
    field(K::LinkedinUrl, "LINKEDIN_URL", "The URL of the candidate's LinkedIn profile.", Prof("linkedIn"), false),
    field(K::GithubUrl, "GITHUB_URL", "The URL of the candidate's GitHub profile.", Prof("github"), false),
    field(K::PortfolioUrl, "PORTFOLIO_URL", "The URL of the candidate's personal website or portfolio.", Prof("portfolio"), false),
    field(K::FirstName, "FIRST_NAME", "The candidate's first or given name.", Prof("firstName"), false),
    field(K::MiddleName, "MIDDLE_NAME", "The candidate's middle name.", Prof("middleName"), false),
    field(K::LastName, "LAST_NAME", "The candidate's last name, surname or family name.", Prof("lastName"), false),
    field(K::PreferredName, "PREFERRED_NAME", "The name the candidate prefers to be called.", Prof("preferredName"), false),
    field(K::FullName, "FULL_NAME", "The candidate's full name as one string, e.g. 'John Doe'.", Prof("fullName"), false),
    field(K::PostalCode, "POSTAL_CODE", "The candidate's ZIP or postal code.", Prof("postalCode"), false),
    field(K::City, "CITY", "The city where the candidate lives.", Prof("city"), false),
    field(K::State, "STATE", "The state, province or region where the candidate lives.", Prof("state"), false),
    field(K::Country, "COUNTRY", "The country where the candidate lives.", Prof("country"), false),
    field(K::CurrentLocation, "CURRENT_LOCATION", "The place where the candidate is currently based, usually city and country.", Prof("locationCombined"), false),
    field(K::NeedSponsorship, "NEED_SPONSORSHIP", "Whether the candidate will now or in the future require visa sponsorship.", Pref("needSponsorshipFuture"), false),
    field(K::WorkAuthUs, "WORK_AUTH_US", "Whether the candidate is legally authorized to work in the United States.", Pref("workAuthUS"), false),
    field(K::WorkAuthCountry, "WORK_AUTH_COUNTRY", "The country or countries where the candidate is authorized to work.", Pref("workAuthCountry"), false),
    field(K::WillingToRelocate, "WILLING_TO_RELOCATE", "Whether the candidate is willing to relocate for the role.", Pref("willingToRelocate"), false),
    field(K::PreferredLocation, "PREFERRED_LOCATION", "The location where the candidate would prefer to work.", Pref("preferredLocation"), false),
    field(K::OnSiteOk, "ON_SITE_OK", "Whether the candidate is comfortable working on-site in an office.", Pref("onSiteOk"), false),
    field(K::HybridOk, "HYBRID_OK", "Whether the candidate is comfortable with a hybrid work arrangement.", Pref("hybridOk"), false),
    field(K::TravelPercentMax, "TRAVEL_PERCENT_MAX", "The maximum percentage of time the candidate is willing to travel.", Pref("travelPercentMax"), false),
    field(K::NoticePeriod, "NOTICE_PERIOD", "How much notice the candidate must give their current employer.", Pref("noticePeriod"), false),
    field(K::EarliestStartDate, "EARLIEST_START_DATE", "The earliest date the candidate could start the new job.", Pref("earliestStartDate"), false),
    field(K::HourlyRate, "HOURLY_RATE", "The candidate's expected hourly rate.", Pref("hourlyRateExpectations"), false),
    field(K::SalaryExpectation, "SALARY_EXPECTATION", "The candidate's desired salary or compensation.", Pref("salaryExpectations"), false),
    field(K::CurrentCompany, "CURRENT_COMPANY", "The name of the candidate's current or most recent employer.", Prof("currentCompany"), false),
    field(K::CurrentTitle, "CURRENT_TITLE", "The candidate's current or most recent job title.", Prof("currentTitle"), false),
    field(K::YearsRelevant, "YEARS_RELEVANT", "Years of experience relevant to the role being applied for.", Prof("yearsRelevant"), false),
    field(K::YearsTotal, "YEARS_TOTAL", "Total years of professional experience.", Prof("yearsTotal"), false),
    field(K::Gpa, "GPA", "The candidate's grade point average, e.g. 3.8 out of 4.0.", Prof("gpa"), false),
    field(K::EducationLevel, "EDUCATION_LEVEL", "The highest degree or level of education completed.", Prof("educationLevel"), false),
    field(K::FieldOfStudy, "FIELD_OF_STUDY", "The candidate's major or field of study.", Prof("fieldOfStudy"), false),
    field(K::Institution, "INSTITUTION", "The school, college or university the candidate attended.", Prof("institutionName"), false),
    field(K::GraduationYear, "GRADUATION_YEAR", "The year the candidate graduated or expects to graduate.", Prof("graduationYear"), false),
    field(K::CoverLetter, "COVER_LETTER", "A free-text cover letter written for this application.", NoSource, false),
    field(K::WhyInterested, "WHY_INTERESTED", "A free-text answer explaining interest in the company or role.", NoSource, false),
    field(K::AdditionalInfo, "ADDITIONAL_INFO", "A free-text box for any additional information.", NoSource, false),
    field(K::Unknown, "UNKNOWN", "Field that should not be autofilled or does not map to known profile data.", NoSource, false),
];

static UNMAPPED: CanonicalField = field(K::Unknown, "UNKNOWN", "", NoSource, false);

/// Looks up a key's table row. A key missing from the table behaves as
/// `source = none`, `sensitive = false`.
pub fn canonical_field(key: CanonicalKey) -> &'static CanonicalField {
    CANONICAL_FIELDS
        .iter()
        .find(|f| f.key == key)
        .unwrap_or(&UNMAPPED)
}

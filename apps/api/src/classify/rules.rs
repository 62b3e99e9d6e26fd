//! Rule Matcher — deterministic keyword → canonical key mapping.
//!
//! Rules are evaluated top to bottom and the first hit wins. Ordering is
//! load-bearing: specific predicates ("social security") must sit above
//! generic ones ("name"), and the category blocks follow a fixed sequence:
//!
//! sensitive identifiers → demographics → contact → online presence →
//! name parts → location → work authorization / relocation →
//! timing / compensation → employment → education → long free text.

use crate::canonical::CanonicalKey;
use crate::models::field::FieldDescriptor;

/// One `(predicate, key)` pair.
///
/// The predicate holds when any `phrase` is a substring of the field text or any
/// `word` equals one of its tokens, every `all` phrase is present, and no
/// `unless` phrase is present.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub key: CanonicalKey,
    pub phrases: &'static [&'static str],
    pub words: &'static [&'static str],
    pub all: &'static [&'static str],
    pub unless: &'static [&'static str],
}

impl Rule {
    const fn new(key: CanonicalKey, phrases: &'static [&'static str]) -> Self {
        Self {
            key,
            phrases,
            words: &[],
            all: &[],
            unless: &[],
        }
    }

    const fn words(mut self, words: &'static [&'static str]) -> Self {
        self.words = words;
        self
    }

    const fn all(mut self, all: &'static [&'static str]) -> Self {
        self.all = all;
        self
    }

    const fn unless(mut self, unless: &'static [&'static str]) -> Self {
        self.unless = unless;
        self
    }

    fn matches(&self, text: &FieldText) -> bool {
        let hit = self.phrases.iter().any(|p| text.contains(p))
            || self.words.iter().any(|w| text.has_word(w));
        hit && self.all.iter().all(|p| text.contains(p))
            && !self.unless.iter().any(|p| text.contains(p))
    }
}

/// Lower-cased field text in two spellings: as written, and with `_ - .`
/// separators and camelCase boundaries turned into spaces.
#[derive(Debug)]
struct FieldText {
    raw: String,
    spaced: String,
    tokens: Vec<String>,
}

impl FieldText {
    fn from_descriptor(field: &FieldDescriptor) -> Self {
        let joined = format!("{} {} {}", field.label, field.name, field.placeholder);
        let raw = joined.to_lowercase();
        let spaced = split_identifiers(&joined).to_lowercase();
        let tokens = spaced
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        Self {
            raw,
            spaced,
            tokens,
        }
    }

    fn contains(&self, phrase: &str) -> bool {
        self.raw.contains(phrase) || self.spaced.contains(phrase)
    }

    fn has_word(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t == word)
    }
}

/// `firstName` → `first Name`, `first_name` → `first name`.
fn split_identifiers(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut prev_lower = false;
    for ch in input.chars() {
        if matches!(ch, '_' | '-' | '.') {
            out.push(' ');
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        out.push(ch);
    }
    out
}

use CanonicalKey as K;

const NAME_GUARD: &[&str] = &[
    "company",
    "employer",
    "organization",
    "organisation",
    "school",
    "university",
    "college",
    "institution",
    "reference",
    "emergency",
    "manager",
    "recruiter",
    "referral",
    "referee",
    "user name",
    "username",
    "file name",
    "business",
];

const LOCATION_GUARD: &[&str] = &[
    "authorized",
    "authorised",
    "authorization",
    "eligible",
    "sponsor",
    "relocat",
    "prefer",
    "citizen",
];

/// The ordered rule chain. Do not reorder without updating the tests below.
pub static RULES: &[Rule] = &[
    // Sensitive identifiers
    Rule::new(K::Ssn, &["social security", "social insurance", "national id", "national insurance"])
        .words(&["ssn", "sin", "nin"]),
    Rule::new(K::DateOfBirth, &["date of birth", "birth date", "birthdate", "birthday"]).words(&["dob"]),
    // Demographics / protected class
    Rule::new(K::RaceEthnicity, &["ethnicity", "ethnic", "hispanic", "latino"]).words(&["race", "racial"]),
    Rule::new(K::SexualOrientation, &["sexual orientation", "lgbt"]),
    Rule::new(K::Gender, &["gender", "pronoun"]).words(&["sex"]),
    Rule::new(K::DisabilityStatus, &["disability", "disabled"]),
    Rule::new(K::VeteranStatus, &["veteran", "military service", "armed forces"]),
    Rule::new(K::CriminalHistory, &["criminal", "convicted", "conviction", "felony", "misdemeanor"]),
    // Contact
    Rule::new(K::Email, &["email", "e-mail"]),
    Rule::new(K::Phone, &["phone", "mobile number", "telephone", "contact number"])
        .words(&["tel", "cell", "mobile"]),
    // Online presence
    Rule::new(K::LinkedinUrl, &["linkedin"]),
    Rule::new(K::GithubUrl, &["github"]),
    Rule::new(K::PortfolioUrl, &["portfolio", "personal website", "personal site", "website", "homepage"])
        .unless(&["company website"]),
    // Name parts (guarded against company / school / reference names)
    Rule::new(K::FirstName, &["first name", "firstname", "given name", "forename"]).unless(NAME_GUARD),
    Rule::new(K::MiddleName, &["middle name", "middlename"]).words(&["mi"]).unless(NAME_GUARD),
    Rule::new(K::LastName, &["last name", "lastname", "surname", "family name"]).unless(NAME_GUARD),
    Rule::new(K::PreferredName, &["preferred name", "nickname", "known as"]).unless(NAME_GUARD),
    Rule::new(K::FullName, &["full name", "fullname", "legal name"])
        .words(&["name"])
        .unless(NAME_GUARD),
    // Location
    Rule::new(K::PostalCode, &["postal code", "postcode", "post code", "zip"]).unless(LOCATION_GUARD),
    Rule::new(K::City, &["city", "town"]).unless(LOCATION_GUARD),
    Rule::new(K::State, &["province", "region"]).words(&["state"]).unless(LOCATION_GUARD),
    Rule::new(K::Country, &["country"]).unless(LOCATION_GUARD),
    Rule::new(K::CurrentLocation, &["location", "address", "where are you based", "where do you live"])
        .unless(LOCATION_GUARD),
    // Work authorization / relocation
    Rule::new(K::NeedSponsorship, &["sponsorship", "sponsor", "visa"]),
    Rule::new(K::WorkAuthUs, &["united states", "u.s."])
        .words(&["us", "usa"])
        .all(&["authori"]),
    Rule::new(K::WorkAuthCountry, &["authorized to work", "authorised to work", "work authorization", "right to work", "eligible to work", "legally"]),
    Rule::new(K::WillingToRelocate, &["relocat"]),
    Rule::new(K::PreferredLocation, &["preferred location", "preferred work location", "preferred office", "prefer to work"]),
    Rule::new(K::HybridOk, &["hybrid"]),
    Rule::new(K::OnSiteOk, &["on-site", "onsite", "on site", "in office", "in-office", "in the office"]),
    Rule::new(K::TravelPercentMax, &["travel"]),
    // Timing / compensation
    Rule::new(K::NoticePeriod, &["notice period", "weeks notice", "weeks' notice", "notice required"]),
    Rule::new(K::EarliestStartDate, &["start date", "earliest start", "available to start", "availability", "when can you start"]),
    Rule::new(K::HourlyRate, &["hourly rate", "hourly", "per hour"]),
    Rule::new(K::SalaryExpectation, &["salary", "compensation", "desired pay", "pay expectation", "expected pay"]),
    // Employment
    Rule::new(K::CurrentCompany, &["current company", "current employer", "most recent employer", "company name", "employer"]),
    Rule::new(K::CurrentTitle, &["job title", "current title", "current role", "position title"]).words(&["title"]),
    Rule::new(K::YearsRelevant, &["years of relevant", "relevant experience"]),
    Rule::new(K::YearsTotal, &["years of experience", "years experience", "total experience"]),
    // Education
    Rule::new(K::Gpa, &["grade point", "cumulative gpa"]).words(&["gpa", "cgpa"]),
    Rule::new(K::EducationLevel, &["education level", "level of education", "highest degree", "degree"]),
    Rule::new(K::FieldOfStudy, &["field of study", "area of study", "discipline"]).words(&["major"]),
    Rule::new(K::GraduationYear, &["graduation", "grad year", "year graduated"]),
    Rule::new(K::Institution, &["school", "university", "college", "institution"]),
    // Long free text
    Rule::new(K::CoverLetter, &["cover letter", "coverletter", "motivation letter"]),
    Rule::new(K::WhyInterested, &["why do you want", "why are you interested", "why this", "why us", "interest in"]),
    Rule::new(K::AdditionalInfo, &["additional information", "anything else", "additional comments", "additional info"]),
];

/// Returns the canonical key of the first rule that matches, or `None`.
pub fn match_rules(field: &FieldDescriptor) -> Option<CanonicalKey> {
    let text = FieldText::from_descriptor(field);
    RULES.iter().find(|rule| rule.matches(&text)).map(|rule| rule.key)
}

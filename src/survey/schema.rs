//! Feature schema table: the ordered questionnaire items the prediction
//! model expects.
//!
//! The table is static data. Order of [`FEATURES`] is the order in which
//! questions are asked, and `FeatureId`'s derived `Ord` follows the same
//! order so a `BTreeMap<FeatureId, _>` iterates in question order.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of one questionnaire item.
///
/// Serializes to the wire key used by the prediction endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureId {
    #[serde(rename = "AGEP_A")]
    Age,
    #[serde(rename = "SEX_A")]
    Sex,
    #[serde(rename = "EDUCP_A")]
    Education,
    #[serde(rename = "REGION")]
    Region,
    #[serde(rename = "URBRRL23")]
    UrbanRural,
    #[serde(rename = "PCNTADLT_A")]
    Adults,
    #[serde(rename = "PCNTKIDS_A")]
    Children,
    #[serde(rename = "LEGMSTAT_A")]
    MaritalStatus,
    #[serde(rename = "PHSTAT_A")]
    PhysicalHealth,
    #[serde(rename = "BMICAT_A")]
    Weight,
    #[serde(rename = "DRKSTAT_A")]
    Alcohol,
    #[serde(rename = "SLPHOURS_A")]
    SleepHours,
    #[serde(rename = "SUPPORT_A")]
    Support,
    #[serde(rename = "SLPFLL_A")]
    SleepQuality,
    #[serde(rename = "LONELY_A")]
    Loneliness,
    #[serde(rename = "LSATIS4_A")]
    LifeSatisfaction,
}

impl FeatureId {
    /// Wire key sent to the prediction endpoint.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Age => "AGEP_A",
            Self::Sex => "SEX_A",
            Self::Education => "EDUCP_A",
            Self::Region => "REGION",
            Self::UrbanRural => "URBRRL23",
            Self::Adults => "PCNTADLT_A",
            Self::Children => "PCNTKIDS_A",
            Self::MaritalStatus => "LEGMSTAT_A",
            Self::PhysicalHealth => "PHSTAT_A",
            Self::Weight => "BMICAT_A",
            Self::Alcohol => "DRKSTAT_A",
            Self::SleepHours => "SLPHOURS_A",
            Self::Support => "SUPPORT_A",
            Self::SleepQuality => "SLPFLL_A",
            Self::Loneliness => "LONELY_A",
            Self::LifeSatisfaction => "LSATIS4_A",
        }
    }

    /// Schema entry for this feature.
    pub fn schema(&self) -> &'static FeatureSchema {
        FEATURES
            .iter()
            .find(|s| s.id == *self)
            .unwrap_or(&FEATURES[0])
    }

    /// Position of this feature in the question order.
    pub fn index(&self) -> usize {
        FEATURES.iter().position(|s| s.id == *self).unwrap_or(0)
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for FeatureId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FEATURES
            .iter()
            .map(|schema| schema.id)
            .find(|id| id.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown feature: {s}"))
    }
}

/// One coded answer option of a categorical feature.
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalOption {
    /// Value sent to the model. Codes need not be contiguous or start at 1.
    pub code: i64,
    pub label: &'static str,
    /// Informal phrases mapped to this option.
    pub aliases: &'static [&'static str],
}

/// Validation rule of a feature.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    /// Inclusive `[min, max]` bounds.
    Numeric {
        min: i64,
        max: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<&'static str>,
    },
    Categorical {
        options: &'static [CategoricalOption],
    },
}

/// A questionnaire item.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSchema {
    pub id: FeatureId,
    /// Short human label used in summaries ("sleep hours").
    pub label: &'static str,
    pub question: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<&'static str>,
    #[serde(flatten)]
    pub kind: FeatureKind,
    /// Words that name this feature in an edit request ("change my age").
    #[serde(skip)]
    pub edit_keywords: &'static [&'static str],
}

impl FeatureSchema {
    /// Categorical options, empty for numeric features.
    pub fn options(&self) -> &'static [CategoricalOption] {
        match self.kind {
            FeatureKind::Categorical { options } => options,
            FeatureKind::Numeric { .. } => &[],
        }
    }

    /// Option with the given code, if any.
    pub fn option_for_code(&self, code: i64) -> Option<&'static CategoricalOption> {
        self.options().iter().find(|o| o.code == code)
    }

    /// Human rendering of a recorded value ("7 hours per night", "Married").
    pub fn describe_value(&self, value: i64) -> String {
        match self.kind {
            FeatureKind::Numeric { unit: Some(unit), .. } => format!("{value} {unit}"),
            FeatureKind::Numeric { unit: None, .. } => value.to_string(),
            FeatureKind::Categorical { .. } => match self.option_for_code(value) {
                Some(opt) => opt.label.to_string(),
                None => format!("code {value}"),
            },
        }
    }
}

/// Total number of questionnaire items.
pub const FEATURE_COUNT: usize = 16;

/// The questionnaire, in question order.
pub static FEATURES: [FeatureSchema; FEATURE_COUNT] = [
    FeatureSchema {
        id: FeatureId::Age,
        label: "age",
        question: "Let's start. How old are you (in years)? Please type a number between 18 and 100.",
        info: None,
        kind: FeatureKind::Numeric {
            min: 18,
            max: 100,
            unit: Some("years"),
        },
        edit_keywords: &["age"],
    },
    FeatureSchema {
        id: FeatureId::Sex,
        label: "sex",
        question: "How would you describe your biological sex? You can type the number or the phrase.",
        info: None,
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Male",
                    aliases: &["male", "man", "boy", "guy", "m"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Female",
                    aliases: &["female", "woman", "girl", "f"],
                },
            ],
        },
        edit_keywords: &["sex", "gender"],
    },
    FeatureSchema {
        id: FeatureId::Education,
        label: "education level",
        question: "What is the highest level of education you've completed? You can type the number or the phrase.",
        info: None,
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "No schooling completed",
                    aliases: &["no schooling", "no school", "none"],
                },
                CategoricalOption {
                    code: 2,
                    label: "1st-8th grade",
                    aliases: &["primary school", "elementary", "1 to 8", "middle school"],
                },
                CategoricalOption {
                    code: 3,
                    label: "9th-11th grade (no diploma)",
                    aliases: &["9th", "10th", "11th", "some high school"],
                },
                CategoricalOption {
                    code: 4,
                    label: "High school graduate or GED",
                    aliases: &["high school", "hs", "ged", "secondary school"],
                },
                CategoricalOption {
                    code: 5,
                    label: "Some college, no degree",
                    aliases: &["some college", "college but no degree"],
                },
                CategoricalOption {
                    code: 6,
                    label: "Associate degree (AA, AS)",
                    aliases: &["associate degree", "aa degree", "as degree"],
                },
                CategoricalOption {
                    code: 7,
                    label: "Bachelor's degree (BA, BS)",
                    aliases: &["bachelor", "bachelors", "ba", "bs", "undergraduate"],
                },
                CategoricalOption {
                    code: 8,
                    label: "Master's degree",
                    aliases: &["masters", "master's", "msc", "ma", "ms"],
                },
                CategoricalOption {
                    code: 9,
                    label: "Professional school degree (MD, JD, etc.)",
                    aliases: &["professional degree", "md", "jd", "law degree", "medical"],
                },
                CategoricalOption {
                    code: 10,
                    label: "Doctoral degree (PhD, EdD, etc.)",
                    aliases: &["phd", "doctorate", "doctoral", "edd"],
                },
            ],
        },
        edit_keywords: &["education", "school"],
    },
    FeatureSchema {
        id: FeatureId::Region,
        label: "U.S. region",
        question: "Which region of the United States do you currently live in? You can type the number or the phrase.",
        info: Some(
            "These groups are based on standard U.S. Census regions:\n\n\
             - Northeast: e.g., NY, MA, PA, NJ.\n\
             - Midwest: e.g., IL, OH, MI, MN.\n\
             - South: e.g., TX, FL, GA, NC.\n\
             - West: e.g., CA, WA, AZ, CO.\n\n\
             If you're not sure, just choose the option that sounds closest.",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Northeast",
                    aliases: &["northeast", "ne"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Midwest",
                    aliases: &["midwest", "mw"],
                },
                CategoricalOption {
                    code: 3,
                    label: "South",
                    aliases: &["south"],
                },
                CategoricalOption {
                    code: 4,
                    label: "West",
                    aliases: &["west"],
                },
            ],
        },
        edit_keywords: &["region"],
    },
    FeatureSchema {
        id: FeatureId::UrbanRural,
        label: "urban-rural area type",
        question: "Which best describes the type of area you live in? You can type the number or the phrase.",
        info: Some(
            "This is based on the NCHS Urban-Rural Classification for U.S. counties:\n\n\
             - Large central metro: dense city areas in major metro regions.\n\
             - Large fringe metro: suburbs around large cities.\n\
             - Medium and small metro: smaller cities and surrounding areas.\n\
             - Nonmetropolitan: towns or rural areas outside metro regions.",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Large central metro",
                    aliases: &["large central metro", "city center", "big city"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Large fringe metro",
                    aliases: &["large fringe metro", "suburbs", "suburban"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Medium and small metro",
                    aliases: &["medium metro", "small metro", "small city"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Nonmetropolitan",
                    aliases: &["nonmetropolitan", "rural", "small town"],
                },
            ],
        },
        edit_keywords: &["urban", "rural", "metro"],
    },
    FeatureSchema {
        id: FeatureId::Adults,
        label: "number of adults in household",
        question: "Including you, how many adults (18 or older) live in your household?",
        info: Some(
            "Count adults who usually live in your home:\n\n\
             - 1 adult: you live alone.\n\
             - 2 adults: you plus one other adult.\n\
             - 3+ adults: you plus two or more other adults.",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "1 adult",
                    aliases: &["1 adult", "one adult", "alone"],
                },
                CategoricalOption {
                    code: 2,
                    label: "2 adults",
                    aliases: &["2 adults", "two adults"],
                },
                CategoricalOption {
                    code: 3,
                    label: "3+ adults",
                    aliases: &["3+ adults", "three or more adults", "many adults"],
                },
            ],
        },
        edit_keywords: &["adults"],
    },
    FeatureSchema {
        id: FeatureId::Children,
        label: "number of children in household",
        question: "How many children (under 18) live in your household? You can type the number or the phrase.",
        info: Some(
            "Count children who usually live in your home:\n\n\
             - 0 children: no children live with you.\n\
             - 1 child: one child.\n\
             - 2 children: two children.\n\
             - 3+ children: three or more children.",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 0,
                    label: "0 children",
                    aliases: &["no children", "none", "no kids"],
                },
                CategoricalOption {
                    code: 1,
                    label: "1 child",
                    aliases: &["1 child", "one child"],
                },
                CategoricalOption {
                    code: 2,
                    label: "2 children",
                    aliases: &["2 children", "two children"],
                },
                CategoricalOption {
                    code: 3,
                    label: "3+ children",
                    aliases: &["3+ children", "three or more children", "many children"],
                },
            ],
        },
        edit_keywords: &["children", "kids"],
    },
    FeatureSchema {
        id: FeatureId::MaritalStatus,
        label: "marital status",
        question: "What is your current marital status?",
        info: None,
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Married",
                    aliases: &["married"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Widowed",
                    aliases: &["widowed"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Divorced",
                    aliases: &["divorced"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Separated",
                    aliases: &["separated"],
                },
                CategoricalOption {
                    code: 5,
                    label: "Never married",
                    aliases: &["single", "never married"],
                },
            ],
        },
        edit_keywords: &["marital", "married"],
    },
    FeatureSchema {
        id: FeatureId::PhysicalHealth,
        label: "physical health",
        question: "Overall, how would you rate your physical health? You can type the number or phrase.",
        info: Some(
            "Physical health reflects your daily energy, pain levels, mobility, and how easily you perform everyday activities.\n\n\
             - Excellent: very energetic, few limitations\n\
             - Very good: mostly healthy with minor issues\n\
             - Good: generally okay but some issues\n\
             - Fair: frequent discomfort or limits\n\
             - Poor: major impact on daily life",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Excellent",
                    aliases: &["excellent"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Very good",
                    aliases: &["very good"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Good",
                    aliases: &["good"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Fair",
                    aliases: &["fair"],
                },
                CategoricalOption {
                    code: 5,
                    label: "Poor",
                    aliases: &["poor"],
                },
            ],
        },
        edit_keywords: &["physical health", "health"],
    },
    FeatureSchema {
        id: FeatureId::Weight,
        label: "weight category",
        question: "Which best describes your body weight category? Choose the closest match.",
        info: Some(
            "Based on BMI ranges:\n\n\
             - Underweight: below typical range\n\
             - Healthy weight: typical range\n\
             - Overweight: above typical range\n\
             - Obese: well above typical range",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Underweight",
                    aliases: &["underweight", "very thin"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Healthy weight",
                    aliases: &["healthy", "normal"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Overweight",
                    aliases: &["overweight"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Obese",
                    aliases: &["obese"],
                },
            ],
        },
        edit_keywords: &["weight", "bmi"],
    },
    FeatureSchema {
        id: FeatureId::Alcohol,
        label: "alcohol use",
        question: "Which best describes your alcohol use?",
        info: None,
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Never drink",
                    aliases: &["never", "don't drink", "no alcohol"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Used to drink, not now",
                    aliases: &["used to drink", "former drinker"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Light/occasional drinking",
                    aliases: &["light drinker", "occasionally"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Heavy drinking",
                    aliases: &["heavy", "a lot", "binge"],
                },
            ],
        },
        edit_keywords: &["alcohol", "drink"],
    },
    FeatureSchema {
        id: FeatureId::SleepHours,
        label: "sleep hours",
        question: "On average, how many hours do you sleep per night? (3 to 14 hours)",
        info: None,
        kind: FeatureKind::Numeric {
            min: 3,
            max: 14,
            unit: Some("hours per night"),
        },
        edit_keywords: &["sleep hours"],
    },
    FeatureSchema {
        id: FeatureId::Support,
        label: "emotional support",
        question: "How often do you get the emotional support you need? Type the number or phrase.",
        info: Some(
            "Emotional support includes feeling understood, cared for, and having someone to talk to.\n\n\
             Think about the past month.",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Always",
                    aliases: &["always"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Usually",
                    aliases: &["usually", "most of the time"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Sometimes",
                    aliases: &["sometimes", "occasionally"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Rarely",
                    aliases: &["rarely"],
                },
                CategoricalOption {
                    code: 5,
                    label: "Never",
                    aliases: &["never"],
                },
            ],
        },
        edit_keywords: &["support"],
    },
    FeatureSchema {
        id: FeatureId::SleepQuality,
        label: "how refreshed you feel after sleep",
        question: "After sleeping, how refreshed do you usually feel?",
        info: Some(
            "Think about most days:\n\n\
             - Not at all: still exhausted\n\
             - A little: slightly rested\n\
             - Fairly: okay with some energy\n\
             - Very: energized and clear",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Not at all refreshed",
                    aliases: &["not at all"],
                },
                CategoricalOption {
                    code: 2,
                    label: "A little refreshed",
                    aliases: &["a little"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Fairly refreshed",
                    aliases: &["fairly"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Very refreshed",
                    aliases: &["very refreshed"],
                },
            ],
        },
        edit_keywords: &["refreshed", "sleep quality"],
    },
    FeatureSchema {
        id: FeatureId::Loneliness,
        label: "loneliness",
        question: "How often do you feel lonely?",
        info: Some(
            "Think about the last few weeks. This is about how often you feel emotionally alone or disconnected from others.",
        ),
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Never",
                    aliases: &["never"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Rarely",
                    aliases: &["rarely"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Sometimes",
                    aliases: &["sometimes"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Often",
                    aliases: &["often", "frequently"],
                },
                CategoricalOption {
                    code: 5,
                    label: "Always",
                    aliases: &["always"],
                },
            ],
        },
        edit_keywords: &["lonely", "loneliness"],
    },
    FeatureSchema {
        id: FeatureId::LifeSatisfaction,
        label: "life satisfaction",
        question: "Overall, how satisfied are you with your life right now?",
        info: None,
        kind: FeatureKind::Categorical {
            options: &[
                CategoricalOption {
                    code: 1,
                    label: "Very satisfied",
                    aliases: &["very satisfied"],
                },
                CategoricalOption {
                    code: 2,
                    label: "Satisfied",
                    aliases: &["satisfied"],
                },
                CategoricalOption {
                    code: 3,
                    label: "Dissatisfied",
                    aliases: &["dissatisfied"],
                },
                CategoricalOption {
                    code: 4,
                    label: "Very dissatisfied",
                    aliases: &["very dissatisfied"],
                },
            ],
        },
        edit_keywords: &["life satisfaction", "satisfied"],
    },
];

/// Iterate the schema in question order.
pub fn features() -> impl Iterator<Item = &'static FeatureSchema> {
    FEATURES.iter()
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DataError;

macro_rules! state_codes {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Two-letter postal code of a US state, DC or inhabited territory.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum StateCode {
            $($variant),+
        }

        impl StateCode {
            /// Every code in the set, in alphabetical order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }

            /// Full name, e.g. `"Illinois"` for `IL`.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl FromStr for StateCode {
            type Err = DataError;

            /// Parses a code case-insensitively, ignoring surrounding whitespace.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match normalize_state(s).as_str() {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    _ => Err(DataError::UnknownState(s.to_string())),
                }
            }
        }
    };
}

state_codes! {
    AK => "Alaska", AL => "Alabama", AR => "Arkansas", AS => "American Samoa",
    AZ => "Arizona", CA => "California", CO => "Colorado", CT => "Connecticut",
    DC => "District of Columbia", DE => "Delaware", FL => "Florida", GA => "Georgia",
    GU => "Guam", HI => "Hawaii", IA => "Iowa", ID => "Idaho",
    IL => "Illinois", IN => "Indiana", KS => "Kansas", KY => "Kentucky",
    LA => "Louisiana", MA => "Massachusetts", MD => "Maryland", ME => "Maine",
    MI => "Michigan", MN => "Minnesota", MO => "Missouri", MP => "Northern Mariana Islands",
    MS => "Mississippi", MT => "Montana", NC => "North Carolina", ND => "North Dakota",
    NE => "Nebraska", NH => "New Hampshire", NJ => "New Jersey", NM => "New Mexico",
    NV => "Nevada", NY => "New York", OH => "Ohio", OK => "Oklahoma",
    OR => "Oregon", PA => "Pennsylvania", PR => "Puerto Rico", RI => "Rhode Island",
    SC => "South Carolina", SD => "South Dakota", TN => "Tennessee", TX => "Texas",
    UT => "Utah", VA => "Virginia", VI => "U.S. Virgin Islands", VT => "Vermont",
    WA => "Washington", WI => "Wisconsin", WV => "West Virginia", WY => "Wyoming",
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StateCode {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StateCode> for String {
    fn from(code: StateCode) -> Self {
        code.as_str().to_string()
    }
}

/// Canonical form used when comparing city names: trimmed and lower-cased.
#[must_use]
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

/// Canonical form used when comparing state codes: trimmed and upper-cased.
#[must_use]
pub fn normalize_state(state: &str) -> String {
    state.trim().to_uppercase()
}

/// One entity as it appears in an import file.
///
/// Coordinates may be given either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Explicit identifier. Records without one are numbered on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub city: String,
    pub state: String,
    #[serde(deserialize_with = "coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "coordinate")]
    pub longitude: f64,
}

impl EntityRecord {
    pub fn new(
        name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            city: city.into(),
            state: state.into(),
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Checks the record can be stored, returning its parsed state code.
    pub(crate) fn validate(&self) -> Result<StateCode, String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} is out of range", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} is out of range", self.longitude));
        }
        self.state.parse().map_err(|e: DataError| e.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

fn coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Coordinate::deserialize(deserializer)? {
        Coordinate::Number(value) => Ok(value),
        Coordinate::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

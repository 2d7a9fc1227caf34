//! Static mapping from raw portal columns to output variables
//!
//! Each table entry fixes the canonical variable name, unit metadata, and
//! unit conversion for one raw column. Columns without an entry pass through
//! unchanged with no extra metadata.

/// Unit conversion applied to a numeric column before serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    None,
    /// °C → K
    CelsiusToKelvin,
    /// °F → °C via (F − 32) / 1.8, then °C → K, so both temperature sources
    /// land on the same kelvin variable
    FahrenheitToKelvin,
}

impl Conversion {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Conversion::None => value,
            Conversion::CelsiusToKelvin => value + 273.15,
            Conversion::FahrenheitToKelvin => (value - 32.0) / 1.8 + 273.15,
        }
    }
}

/// Output mapping for one raw column
#[derive(Debug, Clone, Copy)]
pub struct VariableSpec {
    pub raw_name: &'static str,
    /// Canonical output name; `None` keeps the raw name
    pub output_name: Option<&'static str>,
    pub units: Option<&'static str>,
    pub standard_name: Option<&'static str>,
    pub long_name: Option<&'static str>,
    pub conversion: Conversion,
    /// Superseded columns are dropped from output on purpose
    pub omit: bool,
}

impl VariableSpec {
    /// Resolve the output variable name for a raw column
    pub fn resolved_name<'a>(&self, raw_name: &'a str) -> &'a str {
        self.output_name.unwrap_or(raw_name)
    }
}

const fn entry(
    raw_name: &'static str,
    output_name: Option<&'static str>,
    units: Option<&'static str>,
    standard_name: Option<&'static str>,
    long_name: Option<&'static str>,
    conversion: Conversion,
) -> VariableSpec {
    VariableSpec {
        raw_name,
        output_name,
        units,
        standard_name,
        long_name,
        conversion,
        omit: false,
    }
}

const fn omitted(raw_name: &'static str) -> VariableSpec {
    VariableSpec {
        raw_name,
        output_name: None,
        units: None,
        standard_name: None,
        long_name: None,
        conversion: Conversion::None,
        omit: true,
    }
}

/// The known portal columns and their output dispositions
pub const VARIABLE_TABLE: &[VariableSpec] = &[
    entry(
        "TemperatureC",
        Some("temperature"),
        Some("K"),
        Some("air_temperature"),
        Some("air temperature"),
        Conversion::CelsiusToKelvin,
    ),
    entry(
        "TemperatureF",
        Some("temperature"),
        Some("K"),
        Some("air_temperature"),
        Some("air temperature"),
        Conversion::FahrenheitToKelvin,
    ),
    entry(
        "DewpointC",
        None,
        Some("C"),
        Some("dew_point_temperature"),
        Some("dewpoint temperature"),
        Conversion::None,
    ),
    entry(
        "PressurehPa",
        None,
        Some("hPa"),
        Some("surface_air_pressure"),
        Some("surface pressure"),
        Conversion::None,
    ),
    entry("PressureIn", None, None, None, None, Conversion::None),
    entry("WindDirection", None, None, None, None, Conversion::None),
    entry(
        "WindDirectionDegrees",
        None,
        Some("degrees"),
        None,
        None,
        Conversion::None,
    ),
    entry(
        "WindSpeedKMH",
        None,
        Some("km/h"),
        Some("wind_speed"),
        Some("wind speed"),
        Conversion::None,
    ),
    entry(
        "WindSpeedGustKMH",
        None,
        Some("km/h"),
        Some("wind_speed_of_gust"),
        Some("gust wind speed"),
        Conversion::None,
    ),
    entry("Humidity", None, None, None, None, Conversion::None),
    entry(
        "HourlyPrecipMM",
        None,
        Some("mm/h"),
        None,
        Some("hourly precipitation"),
        Conversion::None,
    ),
    entry("Conditions", None, None, None, None, Conversion::None),
    entry("Clouds", None, None, None, None, Conversion::None),
    entry(
        "dailyrainMM",
        None,
        Some("mm/day"),
        None,
        Some("daily precipitation"),
        Conversion::None,
    ),
    entry("SoftwareType", None, None, None, None, Conversion::None),
    // Legacy imperial-units radiation feed, superseded by the metric column
    omitted("SolarRadiation"),
    entry(
        "SolarRadiationWatts/m^2",
        Some("SolarRadiation"),
        Some("Watts/m2"),
        None,
        Some("solar radiation"),
        Conversion::None,
    ),
];

/// Look up the output disposition for a raw column name
pub fn lookup(raw_name: &str) -> Option<&'static VariableSpec> {
    VARIABLE_TABLE.iter().find(|spec| spec.raw_name == raw_name)
}

//! Application constants for the bulletin pipelines
//!
//! This module contains the placeholder convention, source column names,
//! file layout, and the operational station lists, regions and alias tables
//! used by the built-in pipeline profiles.

// =============================================================================
// Output Conventions
// =============================================================================

/// Printable placeholder for a missing value in bulletin tables
pub const PLACEHOLDER: &str = "/";

/// Key column header in every bulletin table
pub const STATION_HEADER: &str = "Station";

// =============================================================================
// Source Column Names
// =============================================================================

/// Columns of the decoded forecast exports and the forecast table
pub mod forecast_columns {
    pub const STATION: &str = "station";
    pub const SID: &str = "SID";
    pub const LONGITUDE: &str = "lon";
    pub const LATITUDE: &str = "lat";
    pub const ALTITUDE: &str = "alt";
    pub const STEP: &str = "step";
    pub const T2M: &str = "t2m";

    /// Prefix of per-lead-time temperature columns (`t2m_30`, `t2m_48`, ...)
    pub const T2M_PREFIX: &str = "t2m_";

    pub fn step_column(step: u32) -> String {
        format!("{}{}", T2M_PREFIX, step)
    }
}

/// Columns of decoded SYNOP exports
pub mod synop_columns {
    pub const STATION: &str = "stationOrSiteName";
    pub const AIR_TEMPERATURE: &str = "airTemperature";
    pub const MIN_TEMPERATURE: &str = "minimumTemperatureAtHeightAndOverPeriodSpecified";
    pub const MAX_TEMPERATURE: &str = "maximumTemperatureAtHeightAndOverPeriodSpecified";
    pub const TOTAL_PRECIPITATION: &str = "totalPrecipitationOrTotalWaterEquivalent";
    pub const TIME_PERIOD: &str = "timePeriod";
    pub const ALTITUDE: &str = "heightOfStationGroundAboveMeanSeaLevel";
    pub const WIND_DIRECTION: &str = "windDirection";
    pub const WIND_SPEED: &str = "windSpeed";
    pub const CLOUD_COVER: &str = "cloudCoverTotal";
    pub const PRESENT_WEATHER: &str = "presentWeather";
    pub const PAST_WEATHER_1: &str = "pastWeather1";
    pub const PAST_WEATHER_2: &str = "pastWeather2";

    /// Every value column the loader knows how to read
    pub const VALUE_COLUMNS: &[&str] = &[
        AIR_TEMPERATURE,
        MIN_TEMPERATURE,
        MAX_TEMPERATURE,
        TOTAL_PRECIPITATION,
        TIME_PERIOD,
        ALTITUDE,
        WIND_DIRECTION,
        WIND_SPEED,
        CLOUD_COVER,
        PRESENT_WEATHER,
        PAST_WEATHER_1,
        PAST_WEATHER_2,
    ];
}

/// Headers of the daily observation bulletin, in output order
pub mod daily_columns {
    pub const STATIONS: &str = "STATIONS";
    pub const ALTITUDE: &str = "ALTITUDE EN METRES";
    pub const DIRECTION: &str = "Dir";
    pub const SPEED: &str = "Vit (m/s)";
    pub const CLOUD_COVER: &str = "Néb (1/8)";
    pub const PRESENT_WEATHER: &str = "ww";
    pub const PRECIPITATION: &str = "Précip (mm)";
    pub const PAST_WEATHER_1: &str = "w1";
    pub const PAST_WEATHER_2: &str = "w2";
    pub const MAX_PREVIOUS_DAY: &str = "Max de la veille";
    pub const MIN_NIGHT: &str = "Min de la nuit";

    pub const ORDER: &[&str] = &[
        STATIONS,
        ALTITUDE,
        DIRECTION,
        SPEED,
        CLOUD_COVER,
        PRESENT_WEATHER,
        PRECIPITATION,
        PAST_WEATHER_1,
        PAST_WEATHER_2,
        MAX_PREVIOUS_DAY,
        MIN_NIGHT,
    ];
}

/// Columns of the observation tables produced by the observation stage
pub mod observation_columns {
    pub const TMIN: &str = "tmin";
    pub const TMAX: &str = "tmax";
    pub const PRECIP_24H: &str = "precip_24h";
    pub const CUMUL: &str = "cumul";
}

/// Absolute zero offset used to convert SYNOP temperatures
pub const KELVIN_OFFSET: f64 = 273.15;

/// Accumulation period of the 24h precipitation group, in hours
pub const PRECIP_24H_PERIOD: f64 = -24.0;

/// Period of the instantaneous groups of the evening report
pub const CURRENT_PERIOD: f64 = 0.0;

// =============================================================================
// File Layout
// =============================================================================

pub mod layout {
    pub const TEMPLATE_DIR: &str = "template";
    pub const STATION_CATALOGUE: &str = "station_onm_officielle.csv";
    pub const TMP_DIR: &str = "tmp";
    pub const OUTPUTS_DIR: &str = "outputs";
    pub const FORECAST_DIR: &str = "arpege";
    pub const OBSERVATIONS_DIR: &str = "observations";
    pub const TABLES_DIR: &str = "tab_reg";
    pub const PRECIP_DIR: &str = "precip";
    pub const LOGS_DIR: &str = "logs";
    pub const SYNOP_ROOT: &str = "bufr_data/observations";
    pub const DAILY_DIR: &str = "bqrm";
    pub const ALL_STATIONS_FILE: &str = "all_stations.csv";
    pub const STATION_MAPPING_FILE: &str = "ListStation.json";

    pub fn forecast_samples(stamp: &str) -> String {
        format!("t2m_samples_{}.csv", stamp)
    }

    pub fn forecast_table(stamp: &str) -> String {
        format!("station_arpege_{}.csv", stamp)
    }

    pub fn hourly_observations(stamp: &str) -> String {
        format!("observations_{}.csv", stamp)
    }

    pub fn min_max_observations(stamp: &str) -> String {
        format!("tmin_tmax_{}.csv", stamp)
    }

    pub fn region_table(region: &str) -> String {
        format!("regions_{}.csv", region)
    }

    pub fn precip_table(stamp: &str, hour: u32) -> String {
        format!("precip_24h_{}_{:02}.csv", stamp, hour)
    }

    pub fn missing_stations(stamp: &str, hour: u32) -> String {
        format!("missing_stations_{}_{:02}.txt", stamp, hour)
    }

    /// One agricultural-year ledger per report hour
    pub fn cumul_ledger(hour: u32) -> String {
        format!("cumul_agri_{:02}.csv", hour)
    }

    pub fn daily_table(stamp: &str) -> String {
        format!("bqrm_{}0600.csv", stamp)
    }
}

/// Temporary files removed by the cleanup stage
pub const DEFAULT_CLEANUP_PATTERNS: &[&str] = &["*.grib", "*.bufr", "t2m_samples_*.csv"];

// =============================================================================
// Operational Station Lists
// =============================================================================

/// Stations of the BMSLA bulletin, in bulletin order
pub const BMSLA_STATIONS: &[&str] = &[
    "NAAMA",
    "EL-BAYADH",
    "LAGHOUAT",
    "DJELFA",
    "MSILA",
    "BISKRA",
    "BATNA",
    "KHENCHELLA",
    "TEBESSA",
    "OULED-DJELLAL",
    "EL-MGHAIR",
    "EL-OUED",
    "TOUGGOURT",
    "OUARGLA",
    "GHARDAIA",
    "EL-GOLEA",
    "TIMIMOUN",
    "BECHAR",
    "BENI-ABBES",
    "TINDOUF",
    "ADRAR",
    "IN-SALAH",
    "ILLIZI",
    "DJANET",
    "TAMANRASSET",
    "B-B-MOKHTAR",
    "IN-GUEZZAM",
];

/// SYNOP station names rewritten to BMSLA bulletin names
pub const BMSLA_ALIASES: &[(&str, &str)] = &[
    ("M'SILA", "MSILA"),
    ("EL BAYADH", "EL-BAYADH"),
    ("OULED DJELLAL", "OULED-DJELLAL"),
    ("EL M'GHAIR", "EL-MGHAIR"),
    ("EL OUED", "EL-OUED"),
    ("EL MENIAA", "EL-GOLEA"),
    ("BENI ABBES", "BENI-ABBES"),
    ("IN SALAH", "IN-SALAH"),
    ("BORDJ BADJI MOKHTARI", "B-B-MOKHTAR"),
    ("IN GUEZZAM", "IN-GUEZZAM"),
];

/// Sonelgaz bulletin regions, each in bulletin order
pub const SONELGAZ_REGIONS: &[(&str, &[&str])] = &[
    (
        "Ouest",
        &[
            "ORAN",
            "TLEMCEN",
            "MASCARA",
            "SAIDA",
            "NAAMA",
            "RELIZANE",
            "SIDI-BEL-ABBES",
            "MECHERIA",
            "EL-BAYADH",
            "EL-KHEITER",
            "BENI-SAF",
            "MOSTAGANEM",
        ],
    ),
    (
        "Centre",
        &[
            "DAR-EL-BEIDA",
            "CHLEF",
            "TIZI-OUZOU",
            "MEDEA",
            "DJELFA",
            "MSILA",
            "BOUIRA",
            "MILIANA",
            "TIARET",
        ],
    ),
    (
        "Est",
        &[
            "ANNABA",
            "BEJAIA",
            "SKIKDA",
            "JIJEL",
            "CONSTANTINE",
            "BATNA",
            "GUELMA",
            "TEBESSA",
            "SETIF",
            "SOUK AHRAS",
            "O-EL-BOUAGHI",
            "B-B-ARRERIDJ",
            "KHENCHELLA",
        ],
    ),
    (
        "Sud",
        &[
            "BECHAR",
            "TINDOUF",
            "GHARDAIA",
            "HASSI-RMEL",
            "LAGHOUAT",
            "BISKRA",
            "EL-OUED",
            "HASSI-MESSAOUD",
            "TOUGGOURT",
            "EL-GOLEA",
            "ILLIZI",
            "TAMANRASSET",
            "ADRAR",
            "IN-SALAH",
        ],
    ),
];

/// SYNOP station names rewritten to Sonelgaz bulletin names
pub const SONELGAZ_ALIASES: &[(&str, &str)] = &[
    ("BEJAIA-AEROPORT", "BEJAIA"),
    ("ORAN-SENIA", "ORAN"),
    ("MASCARA-GHRISS", "MASCARA"),
    ("TLEMCEN-ZENATA", "TLEMCEN"),
    ("JIJEL-ACHOUAT", "JIJEL"),
    ("M'SILA", "MSILA"),
];

/// Sonelgaz forecast lead times shown in the bulletin, keyed by their
/// display hour (`prev_06` is step 30 of the 00 UTC run)
pub const SONELGAZ_FORECAST_SLOTS: &[(u32, &str)] = &[
    (30, "06"),
    (36, "12"),
    (42, "18"),
    (45, "21"),
    (48, "24"),
];

/// Sonelgaz observation slots: (hour, day offset from today, display hour)
pub const SONELGAZ_OBSERVATION_SLOTS: &[(u32, i64, &str)] = &[
    (6, -1, "06"),
    (12, -1, "12"),
    (18, -1, "18"),
    (21, -1, "21"),
    (0, 0, "24"),
];

/// SYNOP report hour carrying the night minimum (today)
pub const TMIN_REPORT_HOUR: u32 = 6;

/// SYNOP report hour carrying the day maximum (yesterday)
pub const TMAX_REPORT_HOUR: u32 = 18;

/// Default SYNOP report hour carrying the 24h precipitation total (today)
pub const PRECIP_REPORT_HOUR: u32 = 6;

/// Morning report of the daily observation bulletin (today)
pub const DAILY_MORNING_HOUR: u32 = 6;

/// Evening report giving the previous day's maximum (yesterday)
pub const DAILY_EVENING_HOUR: u32 = 18;

/// Stations of the daily observation bulletin, spelled as in SYNOP reports
pub const BQRM_STATIONS: &[&str] = &[
    "DAR-EL-BEIDA",
    "ORAN-SENIA",
    "CONSTANTINE",
    "ANNABA",
    "BEJAIA-AEROPORT",
    "JIJEL-ACHOUAT",
    "SKIKDA",
    "CHLEF",
    "TLEMCEN-ZENATA",
    "MOSTAGANEM",
    "TIZI-OUZOU",
    "MEDEA",
    "SETIF",
    "BATNA",
    "TIARET",
    "SAIDA",
    "DJELFA",
    "M'SILA",
    "BISKRA",
    "LAGHOUAT",
    "EL BAYADH",
    "NAAMA",
    "BECHAR",
    "GHARDAIA",
    "EL OUED",
    "OUARGLA",
    "HASSI-MESSAOUD",
    "TOUGGOURT",
    "EL MENIAA",
    "TIMIMOUN",
    "ADRAR",
    "IN SALAH",
    "TINDOUF",
    "ILLIZI",
    "DJANET",
    "TAMANRASSET",
];

/// Stations of the 24h precipitation bulletin, as named on the bulletin
pub const BQCP24H_STATIONS: &[&str] = &[
    "Alger",
    "Oran",
    "Constantine",
    "Annaba",
    "Bejaia",
    "Jijel",
    "Skikda",
    "Chlef",
    "Tlemcen",
    "Mostaganem",
    "Tizi Ouzou",
    "Medea",
    "Miliana",
    "Setif",
    "Bordj Bou Arreridj",
    "Batna",
    "Souk Ahras",
    "Guelma",
    "Tiaret",
    "Saida",
    "Mascara",
    "Relizane",
    "Sidi Bel Abbes",
    "Djelfa",
    "M'sila",
    "Biskra",
    "Laghouat",
    "El Bayadh",
    "Naama",
    "Bechar",
    "Ghardaia",
    "Ouargla",
    "Tamanrasset",
];

/// Bulletin station -> SYNOP station of the precipitation bulletin.
/// Miliana has no reporting station and is always left out.
pub const BQCP24H_MAPPING: &[(&str, &str)] = &[
    ("Alger", "DAR-EL-BEIDA"),
    ("Oran", "ORAN-SENIA"),
    ("Constantine", "CONSTANTINE"),
    ("Annaba", "ANNABA"),
    ("Bejaia", "BEJAIA-AEROPORT"),
    ("Jijel", "JIJEL-ACHOUAT"),
    ("Skikda", "SKIKDA"),
    ("Chlef", "CHLEF"),
    ("Tlemcen", "TLEMCEN-ZENATA"),
    ("Mostaganem", "MOSTAGANEM"),
    ("Tizi Ouzou", "TIZI-OUZOU"),
    ("Medea", "MEDEA"),
    ("Setif", "SETIF"),
    ("Bordj Bou Arreridj", "B-B-ARRERIDJ"),
    ("Batna", "BATNA"),
    ("Souk Ahras", "SOUK AHRAS"),
    ("Guelma", "GUELMA"),
    ("Tiaret", "TIARET"),
    ("Saida", "SAIDA"),
    ("Mascara", "MASCARA-GHRISS"),
    ("Relizane", "RELIZANE"),
    ("Sidi Bel Abbes", "SIDI-BEL-ABBES"),
    ("Djelfa", "DJELFA"),
    ("M'sila", "M'SILA"),
    ("Biskra", "BISKRA"),
    ("Laghouat", "LAGHOUAT"),
    ("El Bayadh", "EL BAYADH"),
    ("Naama", "NAAMA"),
    ("Bechar", "BECHAR"),
    ("Ghardaia", "GHARDAIA"),
    ("Ouargla", "OUARGLA"),
    ("Tamanrasset", "TAMANRASSET"),
];

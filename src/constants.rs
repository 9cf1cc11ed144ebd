//! Application constants for trajectory conversion
//!
//! Attribute names and values of the CF/OceanSITES conventions the
//! converter reads, plus the default styling of the generated KML.

// =============================================================================
// Global Attributes
// =============================================================================

/// Global attribute holding the dataset title
pub const TITLE: &str = "title";

/// Global attribute naming the sampling geometry
pub const FEATURE_TYPE: &str = "featureType";

/// Accepted `featureType` values
pub const FT_TRAJECTORY: &str = "trajectory";
pub const FT_TRAJECTORY_PROFILE: &str = "trajectoryProfile";

/// Document title used when the dataset has no `title` attribute
pub const DEFAULT_TITLE: &str = "Trajectory data";

// =============================================================================
// Variable Attributes
// =============================================================================

pub const ANCILLARY_VARIABLES: &str = "ancillary_variables";
pub const CF_ROLE: &str = "cf_role";
pub const COORDINATES: &str = "coordinates";
pub const STANDARD_NAME: &str = "standard_name";
pub const AXIS: &str = "axis";
pub const POSITIVE: &str = "positive";
pub const UNITS: &str = "units";
pub const FILL_VALUE: &str = "_FillValue";
pub const MISSING_VALUE: &str = "missing_value";
pub const SCALE_FACTOR: &str = "scale_factor";
pub const ADD_OFFSET: &str = "add_offset";

/// Standard names identifying coordinate roles
pub mod standard_names {
    pub const TIME: &str = "time";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const DEPTH: &str = "depth";
    pub const ALTITUDE: &str = "altitude";
    pub const HEIGHT: &str = "height";
}

/// `axis` attribute values
pub mod axis_values {
    pub const TIME: &str = "T";
    pub const LATITUDE: &str = "Y";
    pub const LONGITUDE: &str = "X";
    pub const LEVEL: &str = "Z";
}

/// Units identifying latitude and longitude coordinates
pub const LATITUDE_UNITS: &[&str] = &["degrees_north", "degree_north", "degree_N", "degrees_N"];
pub const LONGITUDE_UNITS: &[&str] = &["degrees_east", "degree_east", "degree_E", "degrees_E"];

/// Units treated as "dimensionless" and never appended to a value
pub const DIMENSIONLESS_UNITS: &str = "1";

// =============================================================================
// Quality Control
// =============================================================================

/// Codes below this value are good or probably good data
pub const PROBABLY_GOOD_DATA: i32 = 2;

pub const QC_PREFIX: &str = "qc_";
pub const QC_SUFFIX: &str = "_qc";
pub const QUALITY_CONTROL_PREFIX: &str = "quality_control_";
pub const QUALITY_CONTROL_SUFFIX: &str = "_quality_control";

/// Displayed instead of a rejected, missing or fill value
pub const NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// KML Styling
// =============================================================================

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TIME_SPAN_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// KML colors are aabbggrr
pub const DEFAULT_LINE_COLOR: &str = "ffdddddd";
pub const DEFAULT_LINE_WIDTH: f64 = 4.0;

pub const DEFAULT_HOME_ICON_URL: &str = "http://www.socib.es/images/gl-gohome-128x128.png";
pub const DEFAULT_REGULAR_ICON_URL: &str = "http://www.socib.es/images/gl-forward-128x128.png";
pub const DEFAULT_END_ICON_URL: &str = "http://www.socib.es/images/gl-down-128x128.png";

pub const HOME_STYLE_ID: &str = "styleForHomeIcon";
pub const REGULAR_STYLE_ID: &str = "styleForRegularIcon";
pub const FINAL_STYLE_ID: &str = "styleForFinalIcon";
pub const LINE_STYLE_ID: &str = "lineStyle";

pub const BALLOON_BG_COLOR: &str = "ffffffff";
pub const BALLOON_TEXT_COLOR: &str = "ff000000";
pub const ICON_COLOR: &str = "ffffffff";
pub const ICON_SCALE: f64 = 1.1;

// =============================================================================
// Input Files
// =============================================================================

/// Extensions accepted when walking input directories
pub const NETCDF_EXTENSIONS: &[&str] = &["nc", "nc4", "cdf"];
pub const JSON_EXTENSION: &str = "json";

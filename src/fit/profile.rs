//! The subset of the Garmin FIT profile this crate understands.
//!
//! Only message names and the fields needed by activity ingestion are listed;
//! anything else decodes as `unknown_<n>` with its raw value.

pub const RECORD: u16 = 20;
pub const TIMESTAMP_FIELD: u8 = 253;

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z).
pub const FIT_EPOCH_OFFSET: i64 = 631_065_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    DateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldProfile {
    pub number: u8,
    pub name: &'static str,
    pub scale: f64,
    pub offset: f64,
    pub units: Option<&'static str>,
    pub kind: FieldKind,
}

impl FieldProfile {
    const fn plain(number: u8, name: &'static str, units: Option<&'static str>) -> Self {
        Self {
            number,
            name,
            scale: 1.0,
            offset: 0.0,
            units,
            kind: FieldKind::Plain,
        }
    }

    const fn scaled(
        number: u8,
        name: &'static str,
        scale: f64,
        offset: f64,
        units: &'static str,
    ) -> Self {
        Self {
            number,
            name,
            scale,
            offset,
            units: Some(units),
            kind: FieldKind::Plain,
        }
    }

    const fn date_time(number: u8, name: &'static str) -> Self {
        Self {
            number,
            name,
            scale: 1.0,
            offset: 0.0,
            units: Some("s"),
            kind: FieldKind::DateTime,
        }
    }

    pub fn is_scaled(&self) -> bool {
        self.scale != 1.0 || self.offset != 0.0
    }
}

const TIMESTAMP: FieldProfile = FieldProfile::date_time(TIMESTAMP_FIELD, "timestamp");

const FILE_ID_FIELDS: &[FieldProfile] = &[
    FieldProfile::plain(0, "type", None),
    FieldProfile::plain(1, "manufacturer", None),
    FieldProfile::plain(2, "product", None),
    FieldProfile::plain(3, "serial_number", None),
    FieldProfile::date_time(4, "time_created"),
    FieldProfile::plain(5, "number", None),
    FieldProfile::plain(8, "product_name", None),
];

const SESSION_FIELDS: &[FieldProfile] = &[
    FieldProfile::plain(0, "event", None),
    FieldProfile::plain(1, "event_type", None),
    FieldProfile::date_time(2, "start_time"),
    FieldProfile::plain(5, "sport", None),
    FieldProfile::plain(6, "sub_sport", None),
    FieldProfile::scaled(7, "total_elapsed_time", 1000.0, 0.0, "s"),
    FieldProfile::scaled(8, "total_timer_time", 1000.0, 0.0, "s"),
    FieldProfile::scaled(9, "total_distance", 100.0, 0.0, "m"),
    FieldProfile::plain(11, "total_calories", Some("kcal")),
    FieldProfile::scaled(14, "avg_speed", 1000.0, 0.0, "m/s"),
    FieldProfile::scaled(15, "max_speed", 1000.0, 0.0, "m/s"),
    FieldProfile::plain(16, "avg_heart_rate", Some("bpm")),
    FieldProfile::plain(17, "max_heart_rate", Some("bpm")),
];

const LAP_FIELDS: &[FieldProfile] = &[
    FieldProfile::plain(0, "event", None),
    FieldProfile::plain(1, "event_type", None),
    FieldProfile::date_time(2, "start_time"),
    FieldProfile::scaled(7, "total_elapsed_time", 1000.0, 0.0, "s"),
    FieldProfile::scaled(8, "total_timer_time", 1000.0, 0.0, "s"),
    FieldProfile::scaled(9, "total_distance", 100.0, 0.0, "m"),
    FieldProfile::plain(11, "total_calories", Some("kcal")),
    FieldProfile::scaled(13, "avg_speed", 1000.0, 0.0, "m/s"),
    FieldProfile::scaled(14, "max_speed", 1000.0, 0.0, "m/s"),
    FieldProfile::plain(15, "avg_heart_rate", Some("bpm")),
    FieldProfile::plain(16, "max_heart_rate", Some("bpm")),
];

const RECORD_FIELDS: &[FieldProfile] = &[
    FieldProfile::plain(0, "position_lat", Some("semicircles")),
    FieldProfile::plain(1, "position_long", Some("semicircles")),
    FieldProfile::scaled(2, "altitude", 5.0, 500.0, "m"),
    FieldProfile::plain(3, "heart_rate", Some("bpm")),
    FieldProfile::plain(4, "cadence", Some("rpm")),
    FieldProfile::scaled(5, "distance", 100.0, 0.0, "m"),
    FieldProfile::scaled(6, "speed", 1000.0, 0.0, "m/s"),
    FieldProfile::plain(7, "power", Some("watts")),
    FieldProfile::scaled(9, "grade", 100.0, 0.0, "%"),
    FieldProfile::plain(13, "temperature", Some("C")),
    FieldProfile::plain(29, "accumulated_power", Some("watts")),
    FieldProfile::plain(31, "gps_accuracy", Some("m")),
    FieldProfile::scaled(32, "vertical_speed", 1000.0, 0.0, "m/s"),
    FieldProfile::plain(33, "calories", Some("kcal")),
    FieldProfile::scaled(39, "vertical_oscillation", 10.0, 0.0, "mm"),
    FieldProfile::scaled(40, "stance_time_percent", 100.0, 0.0, "percent"),
    FieldProfile::scaled(41, "stance_time", 10.0, 0.0, "ms"),
    FieldProfile::scaled(53, "fractional_cadence", 128.0, 0.0, "rpm"),
    FieldProfile::scaled(73, "enhanced_speed", 1000.0, 0.0, "m/s"),
    FieldProfile::scaled(78, "enhanced_altitude", 5.0, 500.0, "m"),
    FieldProfile::scaled(83, "vertical_ratio", 100.0, 0.0, "percent"),
    FieldProfile::scaled(85, "step_length", 10.0, 0.0, "mm"),
];

const EVENT_FIELDS: &[FieldProfile] = &[
    FieldProfile::plain(0, "event", None),
    FieldProfile::plain(1, "event_type", None),
    FieldProfile::plain(3, "data", None),
    FieldProfile::plain(4, "event_group", None),
];

const ACTIVITY_FIELDS: &[FieldProfile] = &[
    FieldProfile::scaled(0, "total_timer_time", 1000.0, 0.0, "s"),
    FieldProfile::plain(1, "num_sessions", None),
    FieldProfile::plain(2, "type", None),
    FieldProfile::plain(3, "event", None),
    FieldProfile::plain(4, "event_type", None),
    FieldProfile::date_time(5, "local_timestamp"),
];

pub fn message_name(global: u16) -> Option<&'static str> {
    let name = match global {
        0 => "file_id",
        1 => "capabilities",
        2 => "device_settings",
        3 => "user_profile",
        12 => "sport",
        18 => "session",
        19 => "lap",
        20 => "record",
        21 => "event",
        23 => "device_info",
        34 => "activity",
        49 => "file_creator",
        78 => "hrv",
        101 => "length",
        206 => "field_description",
        207 => "developer_data_id",
        _ => return None,
    };
    Some(name)
}

pub fn message_number(name: &str) -> Option<u16> {
    (0..=u16::MAX).find(|&n| message_name(n) == Some(name))
}

pub fn field_profile(global: u16, number: u8) -> Option<&'static FieldProfile> {
    if number == TIMESTAMP_FIELD {
        return Some(&TIMESTAMP);
    }

    let fields = match global {
        0 => FILE_ID_FIELDS,
        18 => SESSION_FIELDS,
        19 => LAP_FIELDS,
        20 => RECORD_FIELDS,
        21 => EVENT_FIELDS,
        34 => ACTIVITY_FIELDS,
        _ => return None,
    };
    fields.iter().find(|f| f.number == number)
}

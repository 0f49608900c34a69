//! Session report files.
//!
//! One JSON document per session: the exercise label plus one array per
//! sensor kind. Every array is present, even when it is empty.

use crate::core::SessionRecording;
use crate::device::types::{
    AccelerometerReading, CaloriesReading, DistanceReading, GyroscopeReading, HeartRateReading,
    SkinTemperatureReading,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Label used when the session has none.
pub const UNKNOWN_EXERCISE: &str = "Unknown";

const REPORT_EXTENSION: &str = "json";
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Report I/O errors.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid report {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no free file name for {stem:?} after {} attempts", MAX_NAME_ATTEMPTS)]
    NameExhausted { stem: String },
}

/// A report written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFile {
    pub path: PathBuf,
    pub name: String,
}

impl ReportFile {
    fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }
}

/// Borrowed view used for writing, so buffers are not copied.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReportBody<'a> {
    exercise: &'a str,
    accelerometer: &'a [AccelerometerReading],
    calories: &'a [CaloriesReading],
    distance: &'a [DistanceReading],
    gyroscope: &'a [GyroscopeReading],
    heart_rate: &'a [HeartRateReading],
    skin_temperature: &'a [SkinTemperatureReading],
}

/// A parsed report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportDocument {
    pub exercise: String,
    pub accelerometer: Vec<AccelerometerReading>,
    pub calories: Vec<CaloriesReading>,
    pub distance: Vec<DistanceReading>,
    pub gyroscope: Vec<GyroscopeReading>,
    pub heart_rate: Vec<HeartRateReading>,
    pub skin_temperature: Vec<SkinTemperatureReading>,
}

impl ReportDocument {
    pub fn into_recording(self) -> SessionRecording {
        SessionRecording {
            accelerometer: self.accelerometer,
            calories: self.calories,
            distance: self.distance,
            gyroscope: self.gyroscope,
            heart_rate: self.heart_rate,
            skin_temperature: self.skin_temperature,
        }
    }
}

/// Trimmed label, or [`UNKNOWN_EXERCISE`] when empty or absent.
pub fn normalize_label(label: Option<&str>) -> String {
    match label.map(str::trim) {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => UNKNOWN_EXERCISE.to_string(),
    }
}

/// Characters that cannot appear in a file name on common platforms become `_`.
fn file_name_segment(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `{label}-{yyyyMMdd}`
pub fn report_stem(label: &str, date: NaiveDate) -> String {
    format!("{}-{}", file_name_segment(label), date.format("%Y%m%d"))
}

/// Writes session reports into one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a report dated today (local time).
    pub fn write_today(
        &self,
        label: Option<&str>,
        recording: &SessionRecording,
    ) -> Result<ReportFile, ReportError> {
        self.write(label, recording, Local::now().date_naive())
    }

    /// Write `recording` as `{label}-{yyyyMMdd}.json`, never overwriting.
    ///
    /// If a name is taken the next free `{label}-{yyyyMMdd} (n).json` is used.
    /// A file that fails mid-write is removed.
    pub fn write(
        &self,
        label: Option<&str>,
        recording: &SessionRecording,
        date: NaiveDate,
    ) -> Result<ReportFile, ReportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ReportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let exercise = normalize_label(label);
        let (path, file) = create_unique(&self.dir, &report_stem(&exercise, date))?;

        let body = ReportBody {
            exercise: &exercise,
            accelerometer: &recording.accelerometer,
            calories: &recording.calories,
            distance: &recording.distance,
            gyroscope: &recording.gyroscope,
            heart_rate: &recording.heart_rate,
            skin_temperature: &recording.skin_temperature,
        };

        write_or_remove(BufWriter::new(file), &body, &path)?;

        tracing::info!(path = ?path, readings = recording.total(), "report written");
        Ok(ReportFile::from_path(path))
    }
}

fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File), ReportError> {
    for n in 1..=MAX_NAME_ATTEMPTS {
        let name = if n == 1 {
            format!("{stem}.{REPORT_EXTENSION}")
        } else {
            format!("{stem} ({n}).{REPORT_EXTENSION}")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(ReportError::Io { path, source }),
        }
    }
    Err(ReportError::NameExhausted {
        stem: stem.to_string(),
    })
}

/// Write `body` to the freshly created `path`, removing the file on failure.
fn write_or_remove<W: Write>(
    out: W,
    body: &ReportBody<'_>,
    path: &Path,
) -> Result<(), ReportError> {
    let result = write_body(out, body, path);
    if result.is_err() {
        if let Err(remove_err) = fs::remove_file(path) {
            tracing::warn!(path = ?path, error = %remove_err, "could not remove partial report");
        }
    }
    result
}

fn write_body<W: Write>(
    mut writer: W,
    body: &ReportBody<'_>,
    path: &Path,
) -> Result<(), ReportError> {
    serde_json::to_writer(&mut writer, body).map_err(|source| {
        if source.is_io() {
            ReportError::Io {
                path: path.to_path_buf(),
                source: source.into(),
            }
        } else {
            ReportError::Json {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a report file.
pub fn read_report(path: &Path) -> Result<ReportDocument, ReportError> {
    let content = fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `.json` report in `dir`, sorted by name. A missing directory has none.
pub fn list_reports(dir: &Path) -> Result<Vec<ReportFile>, ReportError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ReportError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut reports: Vec<ReportFile> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| p.extension().map(|e| e == REPORT_EXTENSION).unwrap_or(false))
        .map(ReportFile::from_path)
        .collect();
    reports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Ticks;
    use crate::device::types::{HeartRateQuality, MotionType};

    fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label(None), "Unknown");
        assert_eq!(normalize_label(Some("")), "Unknown");
        assert_eq!(normalize_label(Some("   ")), "Unknown");
        assert_eq!(normalize_label(Some(" Running ")), "Running");
    }

    #[test]
    fn test_report_stem() {
        assert_eq!(report_stem("Running", march_first()), "Running-20240301");
        assert_eq!(report_stem("Bike/Row", march_first()), "Bike_Row-20240301");
    }

    #[test]
    fn test_running_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let file = writer
            .write(Some("Running"), &SessionRecording::new(), march_first())
            .unwrap();
        assert_eq!(file.name, "Running-20240301.json");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&file.path).unwrap()).unwrap();
        assert_eq!(json["Exercise"], "Running");
        for key in [
            "Accelerometer",
            "Calories",
            "Distance",
            "Gyroscope",
            "HeartRate",
            "SkinTemperature",
        ] {
            assert_eq!(json[key], serde_json::json!([]), "{key} should be an empty array");
        }
    }

    #[test]
    fn test_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let file = writer
            .write(None, &SessionRecording::new(), march_first())
            .unwrap();

        let text = fs::read_to_string(&file.path).unwrap();
        assert_eq!(
            text,
            r#"{"Exercise":"Unknown","Accelerometer":[],"Calories":[],"Distance":[],"Gyroscope":[],"HeartRate":[],"SkinTemperature":[]}"#
        );
    }

    #[test]
    fn test_same_label_same_day_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let mut first = SessionRecording::new();
        first.heart_rate.push(HeartRateReading {
            heart_rate: 80,
            quality: HeartRateQuality::Locked,
            timestamp: Ticks(1),
        });

        let a = writer.write(Some("Yoga"), &first, march_first()).unwrap();
        let b = writer
            .write(Some("Yoga"), &SessionRecording::new(), march_first())
            .unwrap();
        let c = writer
            .write(Some("Yoga"), &SessionRecording::new(), march_first())
            .unwrap();

        assert_eq!(a.name, "Yoga-20240301.json");
        assert_eq!(b.name, "Yoga-20240301 (2).json");
        assert_eq!(c.name, "Yoga-20240301 (3).json");
        assert_eq!(read_report(&a.path).unwrap().heart_rate.len(), 1);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let mut recording = SessionRecording::new();
        recording.accelerometer.push(AccelerometerReading {
            acceleration_x: 0.015625,
            acceleration_y: -0.984375,
            acceleration_z: 0.1,
            timestamp: Ticks(638_448_480_001_234_567),
        });
        recording.distance.push(DistanceReading {
            current_motion: MotionType::Walking,
            total_distance: 12345.0,
            speed: 140.25,
            pace: 7130.0,
            timestamp: Ticks(638_448_480_001_234_568),
        });
        recording.calories.push(CaloriesReading {
            calories: 215,
            timestamp: Ticks(638_448_480_001_234_569),
        });

        let file = writer.write(Some("Walk"), &recording, march_first()).unwrap();
        let document = read_report(&file.path).unwrap();
        assert_eq!(document.exercise, "Walk");
        assert_eq!(document.into_recording(), recording);
    }

    #[test]
    fn test_non_finite_readings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let mut recording = SessionRecording::new();
        recording.distance.push(DistanceReading {
            current_motion: MotionType::Idle,
            total_distance: 0.0,
            speed: 0.0,
            pace: f64::INFINITY,
            timestamp: Ticks(638_448_480_000_000_001),
        });

        let file = writer.write(Some("Stretch"), &recording, march_first()).unwrap();
        let text = fs::read_to_string(&file.path).unwrap();
        assert!(text.contains(r#""Pace":"Infinity""#));
        assert_eq!(read_report(&file.path).unwrap().into_recording(), recording);
    }

    /// Accepts a few bytes, then fails as a full disk would.
    struct FillsUp {
        file: File,
        room: usize,
    }

    impl Write for FillsUp {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.room == 0 {
                return Err(std::io::Error::new(ErrorKind::Other, "no space left"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            self.file.write(&buf[..n])
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.file.flush()
        }
    }

    #[test]
    fn test_failed_write_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let (path, file) = create_unique(dir.path(), "Running-20240301").unwrap();
        assert!(path.exists());

        let recording = SessionRecording::new();
        let body = ReportBody {
            exercise: "Running",
            accelerometer: &recording.accelerometer,
            calories: &recording.calories,
            distance: &recording.distance,
            gyroscope: &recording.gyroscope,
            heart_rate: &recording.heart_rate,
            skin_temperature: &recording.skin_temperature,
        };
        let err = write_or_remove(FillsUp { file, room: 16 }, &body, &path).unwrap_err();

        assert!(matches!(err, ReportError::Io { .. }));
        assert!(!path.exists());
        // The name is free again for the next attempt.
        let (retry, _) = create_unique(dir.path(), "Running-20240301").unwrap();
        assert_eq!(retry, path);
    }

    #[test]
    fn test_list_reports() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        writer
            .write(Some("B"), &SessionRecording::new(), march_first())
            .unwrap();
        writer
            .write(Some("A"), &SessionRecording::new(), march_first())
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let names: Vec<String> = list_reports(dir.path())
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["A-20240301.json", "B-20240301.json"]);

        assert!(list_reports(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_read_invalid_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"Exercise\":").unwrap();
        assert!(matches!(read_report(&path), Err(ReportError::Json { .. })));
    }
}
